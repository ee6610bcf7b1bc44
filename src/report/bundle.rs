use std::io::{Cursor, Write};

use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::report::*;

pub const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
pub const ZIP_MIME: &str = "application/zip";

/// What is sent back to the user.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Download {
    pub file_name: String,
    pub mime_type: &'static str,
    pub bytes: Vec<u8>,
}

/// A single output is returned as is, several outputs are put in one zip archive.
pub fn assemble(outputs: &[OutputFile], archive_name: &str) -> ReportResult<Download> {
    match outputs {
        [] => EmptyBatchSnafu {}.fail(),
        [single] => Ok(Download {
            file_name: single.name.clone(),
            mime_type: XLSX_MIME,
            bytes: single.bytes.clone(),
        }),
        _ => {
            let bytes = zip_outputs(outputs).context(BundlingSnafu { name: archive_name })?;
            info!(
                "assemble: {} files in {} ({} bytes)",
                outputs.len(),
                archive_name,
                bytes.len()
            );
            Ok(Download {
                file_name: archive_name.to_string(),
                mime_type: ZIP_MIME,
                bytes,
            })
        }
    }
}

fn zip_outputs(outputs: &[OutputFile]) -> Result<Vec<u8>, ZipError> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    for output in outputs {
        zip.start_file(output.name.as_str(), options)?;
        zip.write_all(&output.bytes).map_err(ZipError::from)?;
        debug!("zip_outputs: {} ({} bytes)", output.name, output.bytes.len());
    }
    Ok(zip.finish()?.into_inner())
}
