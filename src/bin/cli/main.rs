//! OAR Report CLI
//!
//! Runs the report pipeline on JSON token dumps and extracted photos.
//!
//! # Usage
//!
//! ```bash
//! oar-report kv tokens.json
//! oar-report completeness tokens.json --config report.json
//! oar-report validate --tokens tokens.json --file-name BAUT_jakarta.pdf
//! oar-report photos sessions/s1/proyek_a --index master_index.json --session-root sessions/s1
//! oar-report session manifest.json --sessions-dir sessions --index master_index.json
//! ```

mod cli;
mod config;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "oar-report")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Key-value reconstruction, completeness checks and duplicate photo detection", long_about = None)]
struct Cli {
    /// Pipeline configuration file (JSON)
    #[arg(long, global = true, env = "OAR_REPORT_CONFIG")]
    config: Option<PathBuf>,

    /// Path to the tesseract binary
    #[arg(long, global = true, env = "OAR_REPORT_TESSERACT")]
    tesseract: Option<PathBuf>,

    /// Tesseract language pack (e.g. eng, ind+eng)
    #[arg(long = "lang", global = true, env = "OAR_REPORT_LANG")]
    language: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconstruct key-value pairs from a token JSON file
    Kv {
        /// JSON array of tokens
        tokens: PathBuf,

        /// Drop tokens repeated by overlapping model windows
        #[arg(long)]
        dedup: bool,
    },
    /// Check required phrases in a token JSON file
    Completeness {
        /// JSON array of tokens
        tokens: PathBuf,
    },
    /// Detect the document type and validate its required fields
    Validate {
        /// Structured record (JSON object)
        #[arg(long, conflicts_with = "tokens")]
        record: Option<PathBuf>,

        /// Token JSON file to reconstruct the record from
        #[arg(long, conflicts_with = "record")]
        tokens: Option<PathBuf>,

        /// Original document file name
        #[arg(long = "file-name")]
        file_name: String,
    },
    /// Fingerprint the photos in a directory against the master index
    Photos {
        /// Directory with extracted photos
        dir: PathBuf,

        /// Master index file
        #[arg(long, env = "OAR_REPORT_INDEX")]
        index: PathBuf,

        /// Session root used for relative paths (defaults to DIR)
        #[arg(long = "session-root")]
        session_root: Option<PathBuf>,

        /// Project name recorded in the index (defaults to the name of DIR)
        #[arg(long)]
        project: Option<String>,
    },
    /// Process every document of a manifest in one session
    Session {
        /// JSON array of documents
        manifest: PathBuf,

        /// Directory in which the session directory is created
        #[arg(long = "sessions-dir", default_value = "sessions", env = "OAR_REPORT_SESSIONS_DIR")]
        sessions_dir: PathBuf,

        /// Master index file
        #[arg(long, env = "OAR_REPORT_INDEX")]
        index: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    oar_report::utils::init_tracing();

    let cli = Cli::parse();
    let shared = config::CliConfig {
        config_file: cli.config,
        tesseract: cli.tesseract,
        language: cli.language,
    };

    match cli.command {
        Commands::Kv { tokens, dedup } => cli::run_kv(&shared, &tokens, dedup)?,
        Commands::Completeness { tokens } => cli::run_completeness(&shared, &tokens)?,
        Commands::Validate {
            record,
            tokens,
            file_name,
        } => cli::run_validate(&shared, record.as_deref(), tokens.as_deref(), &file_name)?,
        Commands::Photos {
            dir,
            index,
            session_root,
            project,
        } => cli::run_photos(
            &shared,
            &dir,
            &index,
            session_root.as_deref(),
            project.as_deref(),
        )?,
        Commands::Session {
            manifest,
            sessions_dir,
            index,
        } => cli::run_session(&shared, &manifest, &sessions_dir, &index)?,
    }

    Ok(())
}
