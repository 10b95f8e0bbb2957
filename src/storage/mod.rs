//! On-disk document store.
//!
//! Files live under `<root>/<type dir>/<uuid>.pdf`; the database keeps the
//! path relative to the root so the store can move without a data migration.

use std::path::{Component, Path, PathBuf};

use sha2::{Digest, Sha256};
use thiserror::Error;
use uuid::Uuid;

use crate::config;
use crate::database::models::DocumentType;

const PDF_MAGIC: &[u8] = b"%PDF-";
const ACTIVE_CONTENT_MARKERS: &[&str] = &["/JavaScript", "/JS", "/Launch", "/EmbeddedFile", "<?php"];
const HTACCESS: &str = "deny from all\n";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Please select a file to upload.")]
    MissingFile,

    #[error("File size exceeds the maximum limit of {} MB.", .limit / (1024 * 1024))]
    TooLarge { limit: usize },

    #[error("Only PDF files are allowed.")]
    DisallowedExtension,

    #[error("Invalid file type. Only PDF files are allowed.")]
    InvalidContent,

    #[error("File contains disallowed content: {0}")]
    SuspiciousContent(&'static str),

    #[error("Path escapes storage root: {0}")]
    PathEscape(String),

    #[error("File not found: {0}")]
    FileMissing(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// A file written to the store
#[derive(Debug, Clone)]
pub struct StoredFile {
    /// Path relative to the storage root, with `/` separators
    pub relative_path: String,
    pub size: i64,
    pub checksum: String,
}

#[derive(Debug, Clone)]
pub struct DocumentStore {
    root: PathBuf,
    max_file_size: usize,
    allowed_extensions: Vec<String>,
}

impl DocumentStore {
    pub fn new(root: impl Into<PathBuf>, max_file_size: usize, allowed_extensions: Vec<String>) -> Self {
        Self {
            root: root.into(),
            max_file_size,
            allowed_extensions,
        }
    }

    pub fn from_config() -> Self {
        let storage = &config::config().storage;
        Self::new(storage.root.clone(), storage.max_file_size, storage.allowed_extensions.clone())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn max_file_size(&self) -> usize {
        self.max_file_size
    }

    /// Create the root and one directory per document type, each locked down
    pub async fn init(&self) -> Result<(), StorageError> {
        harden_dir(&self.root).await?;
        for doc_type in DocumentType::ALL {
            harden_dir(&self.root.join(doc_type.directory())).await?;
        }
        tracing::info!("Document storage ready at {}", self.root.display());
        Ok(())
    }

    /// Run the upload checks in order: presence, size, extension, magic bytes, active content
    pub fn validate(&self, file_name: Option<&str>, bytes: &[u8]) -> Result<(), StorageError> {
        let file_name = file_name.map(str::trim).filter(|n| !n.is_empty());
        let Some(file_name) = file_name else {
            return Err(StorageError::MissingFile);
        };
        if bytes.is_empty() {
            return Err(StorageError::MissingFile);
        }

        if bytes.len() > self.max_file_size {
            return Err(StorageError::TooLarge { limit: self.max_file_size });
        }

        let extension = Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match extension {
            Some(ext) if self.allowed_extensions.iter().any(|a| a.eq_ignore_ascii_case(&ext)) => {}
            _ => return Err(StorageError::DisallowedExtension),
        }

        if !bytes.starts_with(PDF_MAGIC) {
            return Err(StorageError::InvalidContent);
        }

        for marker in ACTIVE_CONTENT_MARKERS {
            if contains(bytes, marker.as_bytes()) {
                return Err(StorageError::SuspiciousContent(marker));
            }
        }

        Ok(())
    }

    /// Write validated bytes under a fresh name in the type's directory
    pub async fn store(&self, doc_type: DocumentType, bytes: &[u8]) -> Result<StoredFile, StorageError> {
        let dir = self.root.join(doc_type.directory());
        if !tokio::fs::try_exists(&dir).await? {
            harden_dir(&self.root).await?;
            harden_dir(&dir).await?;
        }

        let file_name = format!("{}.pdf", Uuid::new_v4());
        let relative_path = format!("{}/{}", doc_type.directory(), file_name);
        tokio::fs::write(dir.join(&file_name), bytes).await?;

        let checksum = hex::encode(Sha256::digest(bytes));
        tracing::debug!("Stored {} ({} bytes)", relative_path, bytes.len());

        Ok(StoredFile {
            relative_path,
            size: bytes.len() as i64,
            checksum,
        })
    }

    /// Map a stored relative path to a file under the root
    pub fn resolve(&self, relative_path: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(relative_path);
        let escapes = relative_path.is_empty()
            || relative
                .components()
                .any(|c| !matches!(c, Component::Normal(_)));
        if escapes {
            return Err(StorageError::PathEscape(relative_path.to_string()));
        }
        Ok(self.root.join(relative))
    }

    pub async fn read(&self, relative_path: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.resolve(relative_path)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::FileMissing(relative_path.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn remove(&self, relative_path: &str) -> Result<(), StorageError> {
        let path = self.resolve(relative_path)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Keep `[A-Za-z0-9._-]`, collapse anything else into a single `-`, drop leading dots
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let mut out = String::with_capacity(base.len());
    for c in base.chars() {
        if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
            out.push(c);
        } else if !out.ends_with('-') {
            out.push('-');
        }
    }
    let trimmed = out.trim_start_matches('.').trim_matches('-');
    if trimmed.is_empty() {
        "document.pdf".to_string()
    } else {
        trimmed.to_string()
    }
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

async fn harden_dir(dir: &Path) -> Result<(), StorageError> {
    tokio::fs::create_dir_all(dir).await?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tokio::fs::set_permissions(dir, std::fs::Permissions::from_mode(0o750)).await?;
    }

    let htaccess = dir.join(".htaccess");
    if !tokio::fs::try_exists(&htaccess).await? {
        tokio::fs::write(&htaccess, HTACCESS).await?;
    }
    let index = dir.join("index.html");
    if !tokio::fs::try_exists(&index).await? {
        tokio::fs::write(&index, "").await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(root: &Path) -> DocumentStore {
        DocumentStore::new(root, 1024, vec!["pdf".to_string()])
    }

    fn pdf(body: &str) -> Vec<u8> {
        format!("%PDF-1.7\n{}\n%%EOF", body).into_bytes()
    }

    #[test]
    fn validation_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());

        assert!(matches!(store.validate(None, b"x"), Err(StorageError::MissingFile)));
        assert!(matches!(store.validate(Some("a.pdf"), b""), Err(StorageError::MissingFile)));
        assert!(matches!(
            store.validate(Some("a.pdf"), &vec![b'x'; 2048]),
            Err(StorageError::TooLarge { limit: 1024 })
        ));
        assert!(matches!(store.validate(Some("a.docx"), &pdf("")), Err(StorageError::DisallowedExtension)));
        assert!(matches!(store.validate(Some("noext"), &pdf("")), Err(StorageError::DisallowedExtension)));
        assert!(matches!(store.validate(Some("a.pdf"), b"MZ not a pdf"), Err(StorageError::InvalidContent)));
        assert!(matches!(
            store.validate(Some("a.pdf"), &pdf("<< /S /JavaScript /JS (app.alert(1)) >>")),
            Err(StorageError::SuspiciousContent("/JavaScript"))
        ));
        assert!(store.validate(Some("W2 2024.PDF"), &pdf("1 0 obj << >> endobj")).is_ok());
    }

    #[test]
    fn error_messages() {
        assert_eq!(StorageError::TooLarge { limit: 10 * 1024 * 1024 }.to_string(), "File size exceeds the maximum limit of 10 MB.");
        assert_eq!(StorageError::InvalidContent.to_string(), "Invalid file type. Only PDF files are allowed.");
    }

    #[tokio::test]
    async fn init_creates_locked_directories() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("uploads");
        store(&root).init().await.unwrap();

        for doc_type in DocumentType::ALL {
            let sub = root.join(doc_type.directory());
            assert!(sub.is_dir());
            assert_eq!(std::fs::read_to_string(sub.join(".htaccess")).unwrap(), "deny from all\n");
            assert!(sub.join("index.html").exists());
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                let mode = std::fs::metadata(&sub).unwrap().permissions().mode();
                assert_eq!(mode & 0o777, 0o750);
            }
        }
    }

    #[tokio::test]
    async fn store_read_remove() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        let bytes = pdf("hello");

        let stored = store.store(DocumentType::Paystub, &bytes).await.unwrap();
        assert!(stored.relative_path.starts_with("paystubs/"));
        assert!(stored.relative_path.ends_with(".pdf"));
        assert_eq!(stored.size, bytes.len() as i64);
        assert_eq!(stored.checksum.len(), 64);

        assert_eq!(store.read(&stored.relative_path).await.unwrap(), bytes);
        store.remove(&stored.relative_path).await.unwrap();
        assert!(matches!(store.read(&stored.relative_path).await, Err(StorageError::FileMissing(_))));
        // Removing twice is not an error
        store.remove(&stored.relative_path).await.unwrap();
    }

    #[test]
    fn resolve_rejects_escapes() {
        let store = store(Path::new("/srv/uploads"));
        assert!(store.resolve("w2s/a.pdf").is_ok());
        assert!(matches!(store.resolve("../etc/passwd"), Err(StorageError::PathEscape(_))));
        assert!(matches!(store.resolve("/etc/passwd"), Err(StorageError::PathEscape(_))));
        assert!(matches!(store.resolve("w2s/./a.pdf"), Ok(_) | Err(StorageError::PathEscape(_))));
        assert!(store.resolve("").is_err());
    }

    #[test]
    fn sanitizes_names() {
        assert_eq!(sanitize_file_name("W-2 2024 (final).pdf"), "W-2-2024-final-.pdf");
        assert_eq!(sanitize_file_name("../../.hidden.pdf"), "hidden.pdf");
        assert_eq!(sanitize_file_name("C:\\Users\\me\\stub.pdf"), "stub.pdf");
        assert_eq!(sanitize_file_name("???"), "document.pdf");
    }
}
