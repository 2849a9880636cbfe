//! docsift command-line interface.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use docsift::{EncodedDocument, ExtractionConfig, RawDocument};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Output format for single-document extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Full artifact as JSON
    Json,
    /// Extracted text only
    Text,
}

#[derive(Parser)]
#[command(name = "docsift")]
#[command(version)]
#[command(about = "Normalize plain text, HTML and PDF documents into clean text", long_about = None)]
struct Cli {
    /// Configuration file (.toml, .yaml, .yml or .json); defaults to a discovered docsift.toml
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract text, metadata and language from a file
    Extract {
        #[arg(value_name = "FILE")]
        path: PathBuf,

        #[arg(short, long, value_enum, default_value = "json")]
        format: OutputFormat,
    },

    /// Process an encoded document record ({"filename", "contents": base64})
    Process {
        /// Read the record from this file instead of stdin
        #[arg(short, long, value_name = "FILE")]
        input: Option<PathBuf>,
    },

    /// Extract many files concurrently, printing a JSON array
    Batch {
        #[arg(value_name = "FILES", required = true)]
        paths: Vec<PathBuf>,
    },

    /// Print the MIME type sniffed from a file's contents
    Detect {
        #[arg(value_name = "FILE")]
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = load_config(cli.config.as_deref())?;
    tracing::debug!("Using configuration: {:?}", config);

    match cli.command {
        Commands::Extract { path, format } => {
            let document = read_document(&path)?;
            let extracted = docsift::extract_document(&document, &config).await;

            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&extracted)?),
                OutputFormat::Text => println!("{}", extracted.text),
            }
        }

        Commands::Process { input } => {
            let raw = match input {
                Some(path) => std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read record from {}", path.display()))?,
                None => {
                    let mut buffer = String::new();
                    std::io::stdin()
                        .read_to_string(&mut buffer)
                        .context("Failed to read record from stdin")?;
                    buffer
                }
            };

            let record: EncodedDocument = serde_json::from_str(&raw).context("Invalid document record")?;
            let document = RawDocument::from_encoded(&record)?;
            let extracted = docsift::extract_document(&document, &config).await;

            println!("{}", serde_json::to_string(&extracted)?);
        }

        Commands::Batch { paths } => {
            let documents = paths
                .iter()
                .map(|path| read_document(path))
                .collect::<Result<Vec<_>>>()?;
            let results = docsift::batch_extract_documents(documents, &config).await;

            println!("{}", serde_json::to_string_pretty(&results)?);
        }

        Commands::Detect { path } => {
            let contents = std::fs::read(&path).with_context(|| format!("Failed to read {}", path.display()))?;
            let mime_type = docsift::detect_mime_type_from_bytes(&contents)?;

            match docsift::detect_mime_type(&path) {
                Ok(claimed) if claimed != mime_type => {
                    println!("{} (extension suggests {})", mime_type, claimed)
                }
                _ => println!("{}", mime_type),
            }
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<ExtractionConfig> {
    match path {
        Some(path) => ExtractionConfig::from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display())),
        None => Ok(ExtractionConfig::discover()?.unwrap_or_default()),
    }
}

fn read_document(path: &Path) -> Result<RawDocument> {
    let contents = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let document = RawDocument::new(contents);

    Ok(match path.file_name() {
        Some(name) => document.with_filename(name.to_string_lossy()),
        None => document,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_extract_with_format() {
        let cli = Cli::try_parse_from(["docsift", "extract", "doc.pdf", "--format", "text", "-v"]).unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::Extract { path, format } => {
                assert_eq!(path, PathBuf::from("doc.pdf"));
                assert_eq!(format, OutputFormat::Text);
            }
            _ => panic!("expected extract command"),
        }
    }

    #[test]
    fn test_batch_requires_files() {
        assert!(Cli::try_parse_from(["docsift", "batch"]).is_err());
    }

    #[test]
    fn test_load_config_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("docsift.toml");
        fs::write(&path, "max_concurrent_extractions = 3\n").unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.max_concurrent_extractions, Some(3));
    }

    #[test]
    fn test_load_config_reports_path() {
        let error = load_config(Some(Path::new("/nonexistent/docsift.toml"))).unwrap_err();
        assert!(error.to_string().contains("/nonexistent/docsift.toml"));
    }

    #[test]
    fn test_read_document_keeps_filename() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("note.txt");
        fs::write(&path, "hello").unwrap();

        let document = read_document(&path).unwrap();
        assert_eq!(document.filename.as_deref(), Some("note.txt"));
        assert_eq!(document.contents, b"hello");
    }
}
