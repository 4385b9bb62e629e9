//! Artifact persistence — local directory or S3-compatible object store.
//!
//! The driver is indifferent to where migrated bytes land; [`ArtifactSink`]
//! is the seam. Two implementations:
//!
//! - [`LocalDirSink`] — writes `root/folder/filename`, the staging workflow
//!   where a bulk uploader ships the directory afterwards.
//! - [`ObjectStoreSink`] — uploads directly to an S3-compatible store
//!   (custom endpoint, path-style addressing) with the asset's content type
//!   and public-read visibility, which is what the rewritten URLs require.
//!
//! `exists` powers the idempotence pre-check: a target that is already
//! present is skipped without fetching anything.

use crate::config::{StoreConfig, StoreCredentials};
use crate::naming::PlacementTarget;
use s3::creds::Credentials;
use s3::{Bucket, Region};
use std::fs;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SinkError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("object store error: {0}")]
    Store(String),
    #[error("upload rejected with status {0}")]
    UploadStatus(u16),
}

/// Destination for migrated bytes.
pub trait ArtifactSink {
    /// Whether the target is already present (pre-check for skipping).
    fn exists(&self, target: &PlacementTarget) -> Result<bool, SinkError>;

    /// Persist bytes under the target, returning the byte count written.
    fn write(
        &self,
        target: &PlacementTarget,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<u64, SinkError>;
}

/// Filesystem sink rooted at a local directory.
pub struct LocalDirSink {
    root: PathBuf,
}

impl LocalDirSink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, target: &PlacementTarget) -> PathBuf {
        self.root.join(&target.folder).join(&target.filename)
    }
}

impl ArtifactSink for LocalDirSink {
    fn exists(&self, target: &PlacementTarget) -> Result<bool, SinkError> {
        Ok(self.path_for(target).exists())
    }

    fn write(
        &self,
        target: &PlacementTarget,
        bytes: &[u8],
        _content_type: &str,
    ) -> Result<u64, SinkError> {
        let path = self.path_for(target);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, bytes)?;
        Ok(bytes.len() as u64)
    }
}

/// S3-compatible object store sink.
pub struct ObjectStoreSink {
    bucket: Box<Bucket>,
}

impl ObjectStoreSink {
    pub fn connect(config: &StoreConfig, creds: &StoreCredentials) -> Result<Self, SinkError> {
        let region = Region::Custom {
            region: config.region.clone(),
            endpoint: config.endpoint.clone(),
        };
        let credentials = Credentials::new(
            Some(&creds.access_key),
            Some(&creds.secret_key),
            None,
            None,
            None,
        )
        .map_err(|e| SinkError::Store(e.to_string()))?;

        let mut bucket = Bucket::new(&config.bucket, region, credentials)
            .map_err(|e| SinkError::Store(e.to_string()))?
            .with_path_style();
        // Migrated assets are served straight from the bucket
        bucket.add_header("x-amz-acl", "public-read");

        Ok(Self { bucket })
    }
}

impl ArtifactSink for ObjectStoreSink {
    fn exists(&self, target: &PlacementTarget) -> Result<bool, SinkError> {
        // Anything but a clean 200 counts as absent; a transient HEAD
        // failure then causes an idempotent re-upload, never a wrong skip.
        match self.bucket.head_object(target.key()) {
            Ok((_, 200)) => Ok(true),
            _ => Ok(false),
        }
    }

    fn write(
        &self,
        target: &PlacementTarget,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<u64, SinkError> {
        let response = self
            .bucket
            .put_object_with_content_type(target.key(), bytes, content_type)
            .map_err(|e| SinkError::Store(e.to_string()))?;

        match response.status_code() {
            200 => Ok(bytes.len() as u64),
            status => Err(SinkError::UploadStatus(status)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(folder: &str, filename: &str) -> PlacementTarget {
        PlacementTarget {
            folder: folder.to_string(),
            filename: filename.to_string(),
        }
    }

    #[test]
    fn local_sink_writes_and_reports_size() {
        let tmp = tempfile::TempDir::new().unwrap();
        let sink = LocalDirSink::new(tmp.path());
        let t = target("room", "42.jpg");

        let written = sink.write(&t, b"image bytes", "image/jpeg").unwrap();
        assert_eq!(written, 11);
        assert_eq!(
            fs::read(tmp.path().join("room/42.jpg")).unwrap(),
            b"image bytes"
        );
    }

    #[test]
    fn local_sink_exists_after_write() {
        let tmp = tempfile::TempDir::new().unwrap();
        let sink = LocalDirSink::new(tmp.path());
        let t = target("room", "42.jpg");

        assert!(!sink.exists(&t).unwrap());
        sink.write(&t, b"x", "image/jpeg").unwrap();
        assert!(sink.exists(&t).unwrap());
    }

    #[test]
    fn local_sink_creates_nested_folders() {
        let tmp = tempfile::TempDir::new().unwrap();
        let sink = LocalDirSink::new(tmp.path().join("deep"));
        let t = target("accommodation_image", "7.png");

        sink.write(&t, b"png", "image/png").unwrap();
        assert!(tmp.path().join("deep/accommodation_image/7.png").exists());
    }

    #[test]
    fn local_sink_overwrites_existing_target() {
        let tmp = tempfile::TempDir::new().unwrap();
        let sink = LocalDirSink::new(tmp.path());
        let t = target("room", "1.jpg");

        sink.write(&t, b"first", "image/jpeg").unwrap();
        sink.write(&t, b"second", "image/jpeg").unwrap();
        assert_eq!(fs::read(tmp.path().join("room/1.jpg")).unwrap(), b"second");
    }
}
