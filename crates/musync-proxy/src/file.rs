//! Atomic file writes.
//!
//! Write to a sibling tmp file, then rename, so the proxy never reads a
//! half-written user list.

use std::path::Path;

use tracing::debug;

use crate::error::ProxyError;

pub(crate) async fn write_atomic(target: &Path, data: &[u8]) -> Result<(), ProxyError> {
    if let Some(dir) = target.parent().filter(|d| !d.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(dir).await?;
    }

    let mut tmp = target.as_os_str().to_owned();
    tmp.push(".tmp");

    tokio::fs::write(&tmp, data).await?;
    tokio::fs::rename(&tmp, target).await?;

    debug!(path = %target.display(), bytes = data.len(), "file written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn creates_parent_and_replaces() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("nested").join("users.json");

        write_atomic(&target, b"first").await.unwrap();
        write_atomic(&target, b"second").await.unwrap();

        assert_eq!(tokio::fs::read(&target).await.unwrap(), b"second");
        assert!(!dir.path().join("nested").join("users.json.tmp").exists());
    }
}
