use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::models::{AudioAsset, AudioEncoding};

/// Prefix for per-request scratch directories
pub const WORKSPACE_PREFIX: &str = "call-analyzer-";

/// Scratch directory owning every temporary file of one request
///
/// The directory is named from a fresh UUID, never from the caller's file
/// name, so concurrent requests cannot collide. It is removed when the
/// workspace is dropped, whichever way the request ends.
#[derive(Debug)]
pub struct RequestWorkspace {
    id: Uuid,
    dir: TempDir,
}

impl RequestWorkspace {
    /// Create a fresh workspace under `root`
    pub fn create(root: &Path) -> std::io::Result<Self> {
        let id = Uuid::new_v4();
        let dir = tempfile::Builder::new()
            .prefix(&format!("{}{}-", WORKSPACE_PREFIX, id))
            .tempdir_in(root)?;
        debug!(request_id = %id, dir = ?dir.path(), "Created request workspace");
        Ok(Self { id, dir })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write the uploaded bytes into the workspace
    ///
    /// Only the extension of `original_name` is kept, to hint the codec.
    pub async fn stage_upload(
        &self,
        bytes: &[u8],
        original_name: Option<&str>,
    ) -> std::io::Result<AudioAsset> {
        let format = upload_extension(original_name);
        let path = self.dir.path().join(format!("{}-upload.{}", self.id, format));
        tokio::fs::write(&path, bytes).await?;
        Ok(AudioAsset::new(path, AudioEncoding::unprobed(format)))
    }

    /// Destination for the normalized copy of the upload
    pub fn normalized_path(&self) -> PathBuf {
        self.dir.path().join(format!("{}-16k.wav", self.id))
    }

    /// Remove the workspace now, logging instead of failing on error
    pub fn close(self) {
        let id = self.id;
        if let Err(e) = self.dir.close() {
            warn!(request_id = %id, error = %e, "Failed to remove request workspace");
        }
    }
}

/// Sanitized lower-case extension of an uploaded file name, "bin" if unusable
fn upload_extension(original_name: Option<&str>) -> String {
    original_name
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.len() <= 8)
        .filter(|ext| ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_else(|| "bin".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_extension() {
        assert_eq!(upload_extension(Some("call.MP3")), "mp3");
        assert_eq!(upload_extension(Some("../../etc/passwd")), "bin");
        assert_eq!(upload_extension(Some("weird.ext with space")), "bin");
        assert_eq!(upload_extension(None), "bin");
    }

    #[tokio::test]
    async fn test_workspace_removed_on_drop() {
        let root = tempfile::tempdir().unwrap();
        let path = {
            let workspace = RequestWorkspace::create(root.path()).unwrap();
            let asset = workspace
                .stage_upload(b"RIFF", Some("call.wav"))
                .await
                .unwrap();
            assert!(asset.path().starts_with(workspace.path()));
            assert!(asset.path().exists());
            assert_eq!(asset.encoding.format, "wav");
            workspace.path().to_path_buf()
        };
        assert!(!path.exists());
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_workspaces_do_not_collide() {
        let root = tempfile::tempdir().unwrap();
        let a = RequestWorkspace::create(root.path()).unwrap();
        let b = RequestWorkspace::create(root.path()).unwrap();
        assert_ne!(a.path(), b.path());
        assert_ne!(a.normalized_path(), b.normalized_path());
        a.close();
        b.close();
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
    }
}
