//! Per-batch scratch directory.

use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;
use uuid::Uuid;

/// Characters of the random token appended to workspace and archive names.
pub const TOKEN_LEN: usize = 8;

/// Uniquely named directory owned by one batch.
///
/// Removed recursively when dropped, so every exit path of the owning
/// batch (success, error, or a dropped future) cleans it up.
#[derive(Debug)]
pub struct Workspace {
    path: PathBuf,
    token: String,
}

impl Workspace {
    /// Creates `{output_dir}/{set_name}_{token}`.
    pub async fn create(output_dir: &Path, set_name: &str) -> io::Result<Self> {
        let token = new_token();
        let path = output_dir.join(format!("{}_{}", set_name, token));
        tokio::fs::create_dir(&path).await?;
        debug!(path = %path.display(), "Created workspace");
        Ok(Self { path, token })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// Download destination for the asset at 1-based `position`.
    ///
    /// Carries the declared `.webp` extension until sniffing corrects it.
    pub fn asset_path(&self, position: usize) -> PathBuf {
        self.path.join(format!("{}.webp", position))
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        match std::fs::remove_dir_all(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "Removed workspace"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => debug!(path = %self.path.display(), error = %e, "Failed to remove workspace"),
        }
    }
}

/// Eight lowercase hex characters from a random v4 UUID.
pub fn new_token() -> String {
    let mut token = Uuid::new_v4().simple().to_string();
    token.truncate(TOKEN_LEN);
    token
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_token_shape() {
        let token = new_token();
        assert_eq!(token.len(), TOKEN_LEN);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_ne!(new_token(), new_token());
    }

    #[tokio::test]
    async fn test_removed_on_drop() {
        let dir = TempDir::new().unwrap();
        let ws = Workspace::create(dir.path(), "cats").await.unwrap();
        let path = ws.path().to_path_buf();

        assert!(path.is_dir());
        assert!(path
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("cats_"));
        std::fs::write(ws.asset_path(1), b"x").unwrap();
        assert_eq!(ws.asset_path(1), path.join("1.webp"));

        drop(ws);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_create_fails_without_parent() {
        let dir = TempDir::new().unwrap();
        let result = Workspace::create(&dir.path().join("missing"), "cats").await;
        assert!(result.is_err());
    }
}
