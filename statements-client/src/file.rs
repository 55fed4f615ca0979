use std::path::Path;

use crate::error::ClientError;

/// A statement picked for upload: its name, declared media type and bytes.
#[derive(Clone, PartialEq, Eq)]
pub struct StatementFile {
    pub file_name: String,
    pub media_type: String,
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for StatementFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatementFile")
            .field("file_name", &self.file_name)
            .field("media_type", &self.media_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl StatementFile {
    pub fn new(
        file_name: impl Into<String>,
        media_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            media_type: media_type.into(),
            bytes,
        }
    }

    /// Read a file from disk. The media type is taken from `media_type` when
    /// given, otherwise guessed from the extension.
    pub async fn from_path(path: &Path, media_type: Option<&str>) -> Result<Self, ClientError> {
        let bytes = tokio::fs::read(path).await.map_err(|source| ClientError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "statement.pdf".to_string());
        let media_type = media_type
            .map(str::to_string)
            .unwrap_or_else(|| media_type_for(path).to_string());
        Ok(Self::new(file_name, media_type, bytes))
    }

    pub fn len(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Declared media type by extension, the way a file picker reports it.
pub fn media_type_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("pdf") => "application/pdf",
        Some("csv") => "text/csv",
        Some("txt") => "text/plain",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_type_for() {
        assert_eq!(media_type_for(Path::new("march.PDF")), "application/pdf");
        assert_eq!(media_type_for(Path::new("export.csv")), "text/csv");
        assert_eq!(media_type_for(Path::new("noext")), "application/octet-stream");
    }

    #[tokio::test]
    async fn test_from_path_missing_file() {
        let err = StatementFile::from_path(Path::new("/nonexistent/statement.pdf"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Io { .. }));
    }

    #[tokio::test]
    async fn test_from_path_reads_and_overrides_type() {
        let dir = std::env::temp_dir().join(format!("statements-file-{}", std::process::id()));
        tokio::fs::create_dir_all(&dir).await.unwrap();
        let path = dir.join("scan.bin");
        tokio::fs::write(&path, b"%PDF-1.7").await.unwrap();

        let f = StatementFile::from_path(&path, Some("application/pdf")).await.unwrap();
        assert_eq!(f.file_name, "scan.bin");
        assert_eq!(f.media_type, "application/pdf");
        assert_eq!(f.len(), 8);

        let f = StatementFile::from_path(&path, None).await.unwrap();
        assert_eq!(f.media_type, "application/octet-stream");

        let _ = tokio::fs::remove_dir_all(&dir).await;
    }
}
