//! Browser-style uploads: `data:<mime>;base64,<payload>` plus a file name.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

use crate::dataset::Dataset;
use crate::ingest::{IngestOptions, IngestionError, SourceKind, normalize};

/// Decode the payload of a base64 data URL.
///
/// # Errors
///
/// [`IngestionError::InvalidUpload`] when there is no `,` separator, the
/// header does not declare base64, or the payload does not decode.
pub fn decode_data_url(contents: &str) -> Result<Vec<u8>, IngestionError> {
    let (header, payload) = contents
        .split_once(',')
        .ok_or_else(|| IngestionError::InvalidUpload("missing ',' separator".to_string()))?;
    if !header.ends_with(";base64") {
        return Err(IngestionError::InvalidUpload(format!(
            "expected a base64 data URL, got header '{header}'"
        )));
    }
    STANDARD
        .decode(payload.trim())
        .map_err(|e| IngestionError::InvalidUpload(e.to_string()))
}

/// Decode an upload and normalize it according to its file name.
///
/// # Errors
///
/// [`IngestionError::UnsupportedFileType`] is checked before decoding; then
/// any error from [`decode_data_url`] or [`normalize`].
pub fn ingest_upload(
    contents: &str,
    file_name: &str,
    options: &IngestOptions,
) -> Result<Dataset, IngestionError> {
    let kind = SourceKind::from_file_name(file_name)?;
    let bytes = decode_data_url(contents)?;
    tracing::debug!(file_name, bytes = bytes.len(), "decoded upload");
    normalize(&bytes, kind, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    fn data_url(body: &[u8]) -> String {
        format!("data:text/csv;base64,{}", STANDARD.encode(body))
    }

    #[test]
    fn decodes_and_normalizes_csv_upload() {
        let url = data_url(b"JIRA Key,Assignee\nT-1,Alice\n");
        let ds = ingest_upload(&url, "export.csv", &IngestOptions::default()).expect("upload");
        assert_eq!(ds.len(), 1);
    }

    #[test]
    fn rejects_unsupported_name_and_bad_payloads() {
        let url = data_url(b"irrelevant");
        let err = ingest_upload(&url, "notes.pdf", &IngestOptions::default()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::UnsupportedFileType);

        assert!(matches!(
            decode_data_url("no separator here"),
            Err(IngestionError::InvalidUpload(_))
        ));
        assert!(decode_data_url("data:text/csv,plain").is_err());
        assert!(decode_data_url("data:text/csv;base64,@@@").is_err());
    }
}
