//! File catalog: the cached shared listing and the pending upload.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use protocol::{
    encode_file_content, format_file_size, DownloadAck, FileRecord, Identity, UploadReceipt,
    UploadRequest, DEFAULT_MIME_TYPE,
};

use crate::error::{ClientError, ClientResult};
use crate::gateway::Gateway;
use crate::view::Action;

// ============================================================================
// Pending Upload
// ============================================================================

/// Where the pending upload's bytes come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadSource {
    /// Content already in memory.
    Bytes(Vec<u8>),
    /// A local file, read fully when the upload starts.
    Path(PathBuf),
}

/// A file chosen for upload but not yet sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingUpload {
    pub name: String,
    pub mime_type: String,
    pub size: u64,
    pub source: UploadSource,
}

impl PendingUpload {
    /// Select in-memory content. An unknown or empty MIME type falls back to
    /// `application/octet-stream`.
    pub fn from_bytes(
        name: impl Into<String>,
        mime_type: Option<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_or_default(mime_type),
            size: bytes.len() as u64,
            source: UploadSource::Bytes(bytes),
        }
    }

    /// Select a local file. Only its metadata is read now.
    pub async fn from_path(path: impl AsRef<Path>, mime_type: Option<String>) -> ClientResult<Self> {
        let path = path.as_ref();
        let metadata = tokio::fs::metadata(path).await?;
        if !metadata.is_file() {
            return Err(ClientError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("{} is not a file", path.display()),
            )));
        }
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(Self {
            name,
            mime_type: mime_or_default(mime_type),
            size: metadata.len(),
            source: UploadSource::Path(path.to_path_buf()),
        })
    }

    /// Human-readable size of the selection.
    pub fn display_size(&self) -> String {
        format_file_size(self.size)
    }

    async fn read(&self) -> std::io::Result<Vec<u8>> {
        match &self.source {
            UploadSource::Bytes(bytes) => Ok(bytes.clone()),
            UploadSource::Path(path) => tokio::fs::read(path).await,
        }
    }
}

fn mime_or_default(mime_type: Option<String>) -> String {
    mime_type
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_MIME_TYPE.to_string())
}

// ============================================================================
// Catalog
// ============================================================================

struct Listing {
    files: Arc<Vec<FileRecord>>,
    /// Ticket of the refresh whose result is shown.
    applied: u64,
}

/// Cached copy of the shared file listing.
///
/// Refreshes replace the whole listing at once. Each refresh takes a ticket
/// when it is issued; its result is applied only if no later ticket has been
/// applied already.
pub struct FileCatalog {
    gateway: Arc<dyn Gateway>,
    listing: RwLock<Listing>,
    issued: AtomicU64,
    pending: Mutex<Option<PendingUpload>>,
}

impl FileCatalog {
    pub fn new(gateway: Arc<dyn Gateway>) -> Self {
        Self {
            gateway,
            listing: RwLock::new(Listing {
                files: Arc::new(Vec::new()),
                applied: 0,
            }),
            issued: AtomicU64::new(0),
            pending: Mutex::new(None),
        }
    }

    /// Snapshot of the cached listing, in server order.
    pub fn files(&self) -> Arc<Vec<FileRecord>> {
        self.listing
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .files
            .clone()
    }

    /// Number of cached records.
    pub fn len(&self) -> usize {
        self.files().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Look up a cached record by id.
    pub fn get(&self, file_id: i64) -> Option<FileRecord> {
        self.files().iter().find(|f| f.id == file_id).cloned()
    }

    /// Fetch the listing and replace the cache.
    ///
    /// Returns `false` when the result was superseded by a later refresh and
    /// dropped.
    pub async fn refresh(&self) -> ClientResult<bool> {
        let ticket = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        let files = self.gateway.list_files().await?;

        let mut listing = self.listing.write().unwrap_or_else(PoisonError::into_inner);
        if ticket < listing.applied {
            tracing::debug!(
                "Dropping stale listing (ticket {}, applied {})",
                ticket,
                listing.applied
            );
            return Ok(false);
        }
        tracing::debug!("Catalog refreshed with {} files", files.len());
        listing.files = Arc::new(files);
        listing.applied = ticket;
        Ok(true)
    }

    /// The current upload selection.
    pub fn pending(&self) -> Option<PendingUpload> {
        self.pending_slot().clone()
    }

    /// Replace the upload selection.
    pub fn select_file(&self, upload: PendingUpload) {
        tracing::debug!("Selected {} ({}) for upload", upload.name, upload.display_size());
        *self.pending_slot() = Some(upload);
    }

    /// Drop the upload selection.
    pub fn clear_selection(&self) {
        *self.pending_slot() = None;
    }

    /// Upload the pending selection as `uploader`.
    ///
    /// On success the selection is cleared and the listing refreshed. On
    /// failure the selection is kept for a retry.
    pub async fn upload(&self, uploader: &Identity) -> ClientResult<UploadReceipt> {
        if !uploader.can_upload() {
            return Err(ClientError::Precondition(Action::Upload));
        }
        let selection = self
            .pending()
            .ok_or(ClientError::Precondition(Action::Upload))?;

        let bytes = selection.read().await?;
        let request = UploadRequest {
            user_id: uploader.user_id,
            filename: selection.name.clone(),
            file_content: encode_file_content(&bytes),
            mime_type: selection.mime_type.clone(),
        };
        tracing::info!("Uploading {} ({} bytes)", selection.name, bytes.len());

        let receipt = self.gateway.upload_file(request).await?;
        tracing::info!("Uploaded {} as file {:?}", selection.name, receipt.file_id);

        {
            let mut pending = self.pending_slot();
            if pending.as_ref() == Some(&selection) {
                *pending = None;
            }
        }

        if let Err(e) = self.refresh().await {
            tracing::warn!("Catalog refresh after upload failed: {}", e);
        }
        Ok(receipt)
    }

    /// Record one download of `file_id`, then refresh so the new count shows.
    ///
    /// Every call counts again on the service. The bytes themselves are
    /// fetched by the platform from the returned `file_url`.
    pub async fn download(&self, file_id: i64) -> ClientResult<DownloadAck> {
        let ack = self.gateway.record_download(file_id).await?;
        tracing::info!("Recorded download of file {}", file_id);

        if let Err(e) = self.refresh().await {
            tracing::warn!("Catalog refresh after download failed: {}", e);
        }
        Ok(ack)
    }

    fn pending_slot(&self) -> std::sync::MutexGuard<'_, Option<PendingUpload>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
