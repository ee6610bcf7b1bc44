use log::{debug, info, warn};

use snafu::{prelude::*, Snafu};
use survey_scoring::*;

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::report::config_reader::ReportConfig;
use crate::report::io_common::{
    clean_file_name, has_xlsx_extension, simplify_file_name, unique_file_name,
};

pub mod bundle;
pub mod comparison;
pub mod config_reader;
pub mod io_common;
pub mod io_styles;
pub mod io_xlsx;
pub mod layout;
pub mod sheet;

#[derive(Debug, Snafu)]
pub enum ReportError {
    #[snafu(display("{name}: only .xlsx files are supported"))]
    UnsupportedFileType { name: String },
    #[snafu(display("{name}: could not open the spreadsheet"))]
    OpeningExcel {
        source: calamine::XlsxError,
        name: String,
    },
    #[snafu(display("{name}: the spreadsheet has no worksheet"))]
    EmptyExcel { name: String },
    #[snafu(display("{name}: no header found on row {row}"))]
    MissingHeaderRow { name: String, row: u32 },
    #[snafu(display("{name}: this file was already processed (cell {cell} is not empty)"))]
    AlreadyProcessed { name: String, cell: String },
    #[snafu(display("{name}: {source}"))]
    Scoring { source: ScoringError, name: String },
    #[snafu(display("{name}: could not write the spreadsheet"))]
    WritingExcel {
        source: rust_xlsxwriter::XlsxError,
        name: String,
    },
    #[snafu(display("{name}: could not read the cell formats"))]
    ReadingStyles {
        source: zip::result::ZipError,
        name: String,
    },
    #[snafu(display("{name}: could not parse the cell formats"))]
    ParsingStyles {
        source: quick_xml::Error,
        name: String,
    },
    #[snafu(display("{name}: could not build the archive"))]
    Bundling {
        source: zip::result::ZipError,
        name: String,
    },
    #[snafu(display("Error reading file {path}"))]
    ReadingInput {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error writing file {path}"))]
    WritingOutput {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error opening file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing the configuration {path}"))]
    ParsingJson {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Nothing to download: no file could be processed"))]
    EmptyBatch {},

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type ReportResult<T> = Result<T, ReportError>;

/// A file as it was uploaded.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct UploadedFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

/// A written spreadsheet.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct OutputFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug)]
pub struct ProcessedFile {
    pub output: OutputFile,
    pub kind: TemplateKind,
    /// The categorized questions, kept to build the comparison.
    pub rows: Vec<CategorizedRow>,
}

/// A file that could not be processed, when failures are isolated.
#[derive(Debug)]
pub struct FileFailure {
    pub name: String,
    pub error: ReportError,
}

#[derive(Debug, Default)]
pub struct BatchOutcome {
    /// In upload order, the comparison last.
    pub outputs: Vec<OutputFile>,
    pub failures: Vec<FileFailure>,
}

/// Processes one uploaded export: classification, categories, summary
/// blocks, and the new spreadsheet.
pub fn process_file(upload: &UploadedFile, config: &ReportConfig) -> ReportResult<ProcessedFile> {
    let name = upload.name.as_str();
    ensure!(has_xlsx_extension(name), UnsupportedFileTypeSnafu { name });

    let grid = io_xlsx::read_sheet(name, &upload.bytes)?;
    let table = layout::extract_table(name, &grid)?;
    let (kind, rows, summaries) = score_table(&table).context(ScoringSnafu { name })?;
    info!(
        "process_file: {}: {} template, overall average {:.1}",
        name,
        kind.name(),
        summaries.overall
    );

    let sheet = layout::render(name, &rows, &summaries, kind, &grid, &config.style)?;
    let reference = io_styles::read_cell_format(
        name,
        &upload.bytes,
        layout::HEADER_ROW,
        layout::COL_LABEL,
    )
    .unwrap_or_else(|e| {
        warn!("process_file: {}: header format not read, using the style: {}", name, e);
        None
    });
    let out_name = clean_file_name(name, &config.suffix);
    let bytes = io_xlsx::write_workbook(&out_name, &[&sheet], &config.style, reference.as_ref())?;
    debug!("process_file: {} -> {} ({} bytes)", name, out_name, bytes.len());
    Ok(ProcessedFile {
        output: OutputFile {
            name: out_name,
            bytes,
        },
        kind,
        rows,
    })
}

fn keep_rows(
    slot: &mut Option<(String, Vec<CategorizedRow>)>,
    kind: TemplateKind,
    name: &str,
    rows: Vec<CategorizedRow>,
) {
    if let Some((previous, _)) = slot.as_ref() {
        warn!(
            "process_batch: several {} files: {} replaces {} in the comparison",
            kind.name(),
            name,
            previous
        );
    }
    *slot = Some((name.to_string(), rows));
}

/// Processes all the uploads of one request.
///
/// When both a Leader and a Team export are part of the batch, the comparison
/// workbook is added after the other outputs.
pub fn process_batch(files: &[UploadedFile], config: &ReportConfig) -> ReportResult<BatchOutcome> {
    let mut outcome = BatchOutcome::default();
    let mut leader: Option<(String, Vec<CategorizedRow>)> = None;
    let mut team: Option<(String, Vec<CategorizedRow>)> = None;
    let mut taken: HashSet<String> = HashSet::new();

    for upload in files {
        let processed = match process_file(upload, config) {
            Ok(p) => p,
            Err(e) if config.isolate_failures => {
                warn!("process_batch: {} skipped: {}", upload.name, e);
                outcome.failures.push(FileFailure {
                    name: upload.name.clone(),
                    error: e,
                });
                continue;
            }
            Err(e) => return Err(e),
        };
        match processed.kind {
            TemplateKind::Leader => keep_rows(&mut leader, processed.kind, &upload.name, processed.rows),
            TemplateKind::Team => keep_rows(&mut team, processed.kind, &upload.name, processed.rows),
            TemplateKind::Review | TemplateKind::NoLeader => {}
        }
        let mut output = processed.output;
        let name = unique_file_name(&output.name, &taken);
        if name != output.name {
            warn!(
                "process_batch: {} is already in the batch, {} is written as {}",
                output.name, upload.name, name
            );
            output.name = name;
        }
        taken.insert(output.name.clone());
        outcome.outputs.push(output);
    }

    if let (Some((leader_name, leader_rows)), Some((team_name, team_rows))) = (leader, team) {
        info!(
            "process_batch: comparing {} (leader) with {} (team)",
            leader_name, team_name
        );
        let rows = compare(&leader_rows, &team_rows);
        let sheet = comparison::render_comparison(&rows);
        let name = unique_file_name(&format!("{}.xlsx", config.comparison_name), &taken);
        let bytes = io_xlsx::write_workbook(&name, &[&sheet], &config.style, None)?;
        outcome.outputs.push(OutputFile { name, bytes });
    }

    info!(
        "process_batch: {} file(s) uploaded, {} output(s), {} failure(s)",
        files.len(),
        outcome.outputs.len(),
        outcome.failures.len()
    );
    Ok(outcome)
}

/// Runs a batch on files of the local disk and writes the download into `out_dir`.
///
/// Returns the path of the written file.
pub fn run_files(inputs: &[String], out_dir: &str, config: &ReportConfig) -> ReportResult<PathBuf> {
    let mut files: Vec<UploadedFile> = Vec::new();
    for path in inputs {
        let bytes = fs::read(path).context(ReadingInputSnafu { path })?;
        debug!("run_files: read {} ({} bytes)", path, bytes.len());
        files.push(UploadedFile {
            name: simplify_file_name(path),
            bytes,
        });
    }

    let outcome = process_batch(&files, config)?;
    for failure in outcome.failures.iter() {
        warn!("run_files: {} was not processed: {}", failure.name, failure.error);
    }

    let download = bundle::assemble(&outcome.outputs, &config.archive_name)?;
    let out_path = Path::new(out_dir).join(&download.file_name);
    let out_lpath = out_path.display().to_string();
    fs::write(&out_path, &download.bytes).context(WritingOutputSnafu { path: out_lpath.as_str() })?;
    info!(
        "run_files: wrote {} ({}, {} bytes)",
        out_lpath,
        download.mime_type,
        download.bytes.len()
    );
    Ok(out_path)
}
