//! Language detection using whatlang library.
//!
//! Provides the primary language of extracted text as an ISO 639-1 code.

use crate::core::config::LanguageDetectionConfig;
use crate::{DocsiftError, Result};
use whatlang::{Detector, Info, Lang};

/// Detect the primary language of `text`.
///
/// Returns the ISO 639-1 code of the most likely language. Returns `None`
/// when detection is disabled, the text is blank, or the best candidate is
/// below `min_confidence`.
///
/// Without an allowlist, an unreliable guess is re-run restricted to
/// `fallback_languages`.
///
/// # Errors
///
/// Returns `DocsiftError::LanguageDetection` when the detector finds no
/// candidate at all (text without letters, for example), and
/// `DocsiftError::Validation` when the allowlist names an unsupported code.
///
/// # Example
///
/// ```rust
/// use docsift::core::config::LanguageDetectionConfig;
/// use docsift::language_detection::detect_language;
///
/// let text = "Hello world! This is a test of the language detection system.";
/// let language = detect_language(text, &LanguageDetectionConfig::default()).expect("detection succeeded");
/// assert_eq!(language.as_deref(), Some("en"));
/// ```
pub fn detect_language(text: &str, config: &LanguageDetectionConfig) -> Result<Option<String>> {
    if !config.enabled {
        return Ok(None);
    }

    if text.trim().is_empty() {
        return Ok(None);
    }

    let info = match &config.allowed_languages {
        Some(codes) => detect_with(&Detector::with_allowlist(allowlist(codes)?), text)?,
        None => {
            let info = detect_with(&Detector::new(), text)?;
            if info.is_reliable() || config.fallback_languages.is_empty() {
                info
            } else {
                // Short text often scores a rarer neighbour (English read as Afrikaans).
                let fallback = Detector::with_allowlist(allowlist(&config.fallback_languages)?);
                match fallback.detect(text) {
                    Some(retried) => {
                        tracing::debug!(
                            "Unreliable guess {} ({:.2}) replaced by {} from fallback languages",
                            lang_to_iso639_1(info.lang()),
                            info.confidence(),
                            lang_to_iso639_1(retried.lang())
                        );
                        retried
                    }
                    None => info,
                }
            }
        }
    };

    // Apply confidence threshold from config
    if info.confidence() < config.min_confidence {
        tracing::debug!(
            "Language {} rejected: confidence {:.2} below {:.2}",
            lang_to_iso639_1(info.lang()),
            info.confidence(),
            config.min_confidence
        );
        return Ok(None);
    }

    Ok(Some(lang_to_iso639_1(info.lang()).to_string()))
}

fn detect_with(detector: &Detector, text: &str) -> Result<Info> {
    detector
        .detect(text)
        .ok_or_else(|| DocsiftError::LanguageDetection("no language candidate found".to_string()))
}

fn allowlist(codes: &[String]) -> Result<Vec<Lang>> {
    codes
        .iter()
        .map(|code| {
            let code = code.trim().to_lowercase();
            Lang::all()
                .iter()
                .copied()
                .find(|lang| lang_to_iso639_1(*lang) == code)
                .ok_or_else(|| DocsiftError::validation(format!("Unsupported language code in allowlist: {}", code)))
        })
        .collect()
}

fn lang_to_iso639_1(lang: Lang) -> &'static str {
    match lang {
        Lang::Eng => "en",
        Lang::Rus => "ru",
        Lang::Cmn => "zh",
        Lang::Spa => "es",
        Lang::Por => "pt",
        Lang::Ita => "it",
        Lang::Fra => "fr",
        Lang::Deu => "de",
        Lang::Ukr => "uk",
        Lang::Kat => "ka",
        Lang::Ara => "ar",
        Lang::Hin => "hi",
        Lang::Jpn => "ja",
        Lang::Heb => "he",
        Lang::Yid => "yi",
        Lang::Pol => "pl",
        Lang::Amh => "am",
        Lang::Jav => "jv",
        Lang::Kor => "ko",
        Lang::Nob => "nb",
        Lang::Dan => "da",
        Lang::Swe => "sv",
        Lang::Fin => "fi",
        Lang::Tur => "tr",
        Lang::Nld => "nl",
        Lang::Hun => "hu",
        Lang::Ces => "cs",
        Lang::Ell => "el",
        Lang::Bul => "bg",
        Lang::Bel => "be",
        Lang::Mar => "mr",
        Lang::Kan => "kn",
        Lang::Ron => "ro",
        Lang::Slv => "sl",
        Lang::Hrv => "hr",
        Lang::Srp => "sr",
        Lang::Mkd => "mk",
        Lang::Lit => "lt",
        Lang::Lav => "lv",
        Lang::Est => "et",
        Lang::Tam => "ta",
        Lang::Vie => "vi",
        Lang::Urd => "ur",
        Lang::Tha => "th",
        Lang::Guj => "gu",
        Lang::Uzb => "uz",
        Lang::Pan => "pa",
        Lang::Aze => "az",
        Lang::Ind => "id",
        Lang::Tel => "te",
        Lang::Pes => "fa",
        Lang::Mal => "ml",
        Lang::Ori => "or",
        Lang::Mya => "my",
        Lang::Nep => "ne",
        Lang::Sin => "si",
        Lang::Khm => "km",
        Lang::Tuk => "tk",
        Lang::Aka => "ak",
        Lang::Zul => "zu",
        Lang::Sna => "sn",
        Lang::Afr => "af",
        Lang::Lat => "la",
        Lang::Slk => "sk",
        Lang::Cat => "ca",
        Lang::Tgl => "tl",
        Lang::Hye => "hy",
        Lang::Epo => "eo",
        Lang::Ben => "bn",
        Lang::Cym => "cy",
    }
}
