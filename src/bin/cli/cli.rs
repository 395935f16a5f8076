//! Subcommand implementations.

use crate::config::{CliConfig, project_name_for, read_manifest, read_record, read_tokens};
use oar_report::core::config::ReportConfig;
use oar_report::domain::{StructuredRecord, dedup_window_tokens};
use oar_report::predictors::{MetadataRecognizer, TesseractRecognizer};
use oar_report::report::{
    CompletenessChecker, DocumentTypeClassifier, DuplicatePhotoIndex, FieldValidator, MasterIndex,
    PhotoBatch, SessionContext, SpatialKeyValueReconstructor, TokenEntityMerger,
};
use oar_report::utils::collect_images;
use serde::Serialize;
use std::path::Path;
use std::time::Instant;
use tracing::{info, warn};

type CliResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

fn print_json<T: Serialize>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Tokens JSON to a key-value record.
pub fn run_kv(cli: &CliConfig, tokens_path: &Path, dedup: bool) -> CliResult {
    let config = cli.load()?;
    let mut tokens = read_tokens(tokens_path)?;
    if dedup || config.session.dedup_window_tokens {
        tokens = dedup_window_tokens(tokens);
    }
    let entities = TokenEntityMerger::new(config.merge).merge(&tokens);
    let record = SpatialKeyValueReconstructor::new(config.layout).reconstruct(&entities);
    info!(
        "{} tokens, {} entities, {} pairs on {} pages",
        tokens.len(),
        entities.len(),
        record.pair_count(),
        record.page_count()
    );
    print_json(&record)
}

/// Tokens JSON to a completeness report.
pub fn run_completeness(cli: &CliConfig, tokens_path: &Path) -> CliResult {
    let config = cli.load()?;
    let tokens = read_tokens(tokens_path)?;
    let checker = CompletenessChecker::new(config.completeness)
        .with_marker(config.merge.continuation_marker);
    print_json(&checker.check(&tokens))
}

#[derive(Serialize)]
struct ValidationOutput {
    #[serde(rename = "tipe_dokumen")]
    document_type: String,
    #[serde(rename = "nama_tipe_dokumen")]
    display_name: String,
    #[serde(rename = "validasi_isian_data")]
    fields: oar_report::domain::FieldValidationReport,
}

/// Structured record (or tokens) plus file name to a field report.
pub fn run_validate(
    cli: &CliConfig,
    record_path: Option<&Path>,
    tokens_path: Option<&Path>,
    file_name: &str,
) -> CliResult {
    let config = cli.load()?;
    let record: StructuredRecord = match (record_path, tokens_path) {
        (Some(path), _) => read_record(path)?,
        (None, Some(path)) => {
            let tokens = read_tokens(path)?;
            let entities = TokenEntityMerger::new(config.merge.clone()).merge(&tokens);
            SpatialKeyValueReconstructor::new(config.layout.clone())
                .reconstruct(&entities)
                .to_structured_record()
        }
        (None, None) => {
            warn!("no record or tokens given, validating an empty record");
            StructuredRecord::new()
        }
    };

    let classifier = DocumentTypeClassifier::new(config.document_rules)?;
    let rule = classifier.classify(&record, file_name);
    let fields = FieldValidator::new().validate(&record, rule);
    print_json(&ValidationOutput {
        document_type: rule.code.clone(),
        display_name: rule.display_name.clone(),
        fields,
    })
}

fn tesseract_for(config: &ReportConfig) -> Box<dyn MetadataRecognizer> {
    let recognizer = TesseractRecognizer::new(config.tesseract.clone())
        .with_whitelist(config.fingerprint.char_whitelist.clone());
    if !recognizer.is_available() {
        warn!("tesseract does not answer --version; every photo will fail");
    }
    Box::new(recognizer)
}

/// Image directory to a duplicate report, updating the master index file.
pub fn run_photos(
    cli: &CliConfig,
    dir: &Path,
    index_path: &Path,
    session_root: Option<&Path>,
    project: Option<&str>,
) -> CliResult {
    let start = Instant::now();
    let config = cli.load()?;
    let photos = DuplicatePhotoIndex::new(tesseract_for(&config), config.fingerprint);

    let images = collect_images(dir)?;
    let project_name = match project {
        Some(name) => name.to_string(),
        None => project_name_for(dir)?,
    };
    let session_root = session_root.unwrap_or(dir);

    let mut index = MasterIndex::load(index_path)?;
    let report = photos.process_with_progress(
        PhotoBatch {
            images: &images,
            project_name: &project_name,
            session_root,
        },
        &mut index,
        &mut |done, total| info!("fingerprinted {}/{}", done, total),
    );
    index.save(index_path)?;

    info!("done in {:.2}ms", start.elapsed().as_secs_f64() * 1000.0);
    print_json(&report)
}

#[derive(Serialize)]
struct SessionOutput {
    #[serde(rename = "dokumen")]
    documents: Vec<oar_report::domain::DocumentReport>,
    #[serde(rename = "ringkasan_sesi")]
    summary: oar_report::domain::SessionReport,
}

/// Manifest of documents to per-document reports plus the session summary.
pub fn run_session(
    cli: &CliConfig,
    manifest: &Path,
    sessions_dir: &Path,
    index_path: &Path,
) -> CliResult {
    let start = Instant::now();
    let config = cli.load()?;
    let inputs = read_manifest(manifest)?;
    let recognizer = tesseract_for(&config);
    let mut session = SessionContext::create(config, sessions_dir, index_path, recognizer)?;
    info!("session {} with {} documents", session.id(), inputs.len());

    let mut documents = Vec::with_capacity(inputs.len());
    for input in inputs {
        let name = input.file_name.clone();
        documents.push(session.process_document_with_progress(input, &mut |done, total| {
            info!("{}: photo {}/{}", name, done, total)
        }));
    }
    let summary = session.finish()?;

    info!("session done in {:.2}ms", start.elapsed().as_secs_f64() * 1000.0);
    print_json(&SessionOutput { documents, summary })
}
