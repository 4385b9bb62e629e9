//! Local square-thumbnail pass over already-migrated assets.
//!
//! Walks a directory of full-size images (the output of a migration run),
//! center-crops each to a square, bounds it to `size×size`, and writes a
//! jpg next to nothing else — outputs that already exist are skipped, so
//! the pass is re-runnable like the migration itself. Unlike the network
//! pipeline this is CPU-bound local work with no rate-limit concerns, so
//! files process in parallel.

use crate::classify::ImageKind;
use crate::imaging::{Quality, ResizeMode, TransformNote, TransformPolicy, transform};
use log::{info, warn};
use rayon::prelude::*;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File extensions eligible for thumbnailing.
const THUMB_INPUT_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

#[derive(Error, Debug)]
pub enum ThumbsError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("source directory not found: {0}")]
    SourceNotFound(PathBuf),
}

#[derive(Debug, Clone, Copy)]
pub struct ThumbOptions {
    /// Side of the bounding square.
    pub size: u32,
    pub quality: Quality,
}

impl Default for ThumbOptions {
    fn default() -> Self {
        Self {
            size: 400,
            quality: Quality::new(90),
        }
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct ThumbStats {
    pub generated: usize,
    pub skipped: usize,
    pub failed: usize,
}

enum FileOutcome {
    Generated,
    Skipped,
    Failed,
}

/// Generate thumbnails for every image directly inside `source_dir`.
pub fn generate(
    source_dir: &Path,
    dest_dir: &Path,
    options: &ThumbOptions,
) -> Result<ThumbStats, ThumbsError> {
    if !source_dir.is_dir() {
        return Err(ThumbsError::SourceNotFound(source_dir.to_path_buf()));
    }
    fs::create_dir_all(dest_dir)?;

    let policy = TransformPolicy {
        max_width: options.size,
        max_height: options.size,
        mode: ResizeMode::CropSquare,
        sharpen: None,
        quality: options.quality,
    };

    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(source_dir)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| has_image_extension(e.path()))
        .map(|e| e.into_path())
        .collect();
    files.sort();

    info!("{}: {} images", source_dir.display(), files.len());

    let outcomes: Vec<FileOutcome> = files
        .par_iter()
        .map(|path| process_file(path, dest_dir, &policy))
        .collect();

    let mut stats = ThumbStats::default();
    for outcome in outcomes {
        match outcome {
            FileOutcome::Generated => stats.generated += 1,
            FileOutcome::Skipped => stats.skipped += 1,
            FileOutcome::Failed => stats.failed += 1,
        }
    }
    Ok(stats)
}

fn process_file(path: &Path, dest_dir: &Path, policy: &TransformPolicy) -> FileOutcome {
    let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
        return FileOutcome::Failed;
    };
    let dest = dest_dir.join(format!("{stem}.jpg"));

    if dest.exists() {
        return FileOutcome::Skipped;
    }

    let bytes = match fs::read(path) {
        Ok(b) => b,
        Err(e) => {
            warn!("{}: read failed: {e}", path.display());
            return FileOutcome::Failed;
        }
    };

    // Inputs are the full-size migrated assets, so the bounds check fires
    // for anything a thumbnail is worth having for
    let result = transform(&bytes, ImageKind::Jpg, policy);
    if let TransformNote::Recovered(e) = &result.note {
        warn!("{}: {e}", path.display());
        return FileOutcome::Failed;
    }

    match fs::write(&dest, &result.bytes) {
        Ok(()) => {
            info!("{} -> {}", path.display(), dest.display());
            FileOutcome::Generated
        }
        Err(e) => {
            warn!("{}: write failed: {e}", dest.display());
            FileOutcome::Failed
        }
    }
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            THUMB_INPUT_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::codecs::jpeg::JpegEncoder;
    use image::{DynamicImage, RgbImage};
    use std::io::Cursor;

    fn write_jpeg(path: &Path, w: u32, h: u32) {
        let img = RgbImage::from_fn(w, h, |x, y| {
            image::Rgb([(x % 256) as u8, (y % 256) as u8, 100])
        });
        let mut out = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_with_encoder(JpegEncoder::new_with_quality(&mut Cursor::new(&mut out), 85))
            .unwrap();
        fs::write(path, out).unwrap();
    }

    #[test]
    fn generates_square_thumbnails() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("full");
        let dest = tmp.path().join("thumb");
        fs::create_dir_all(&source).unwrap();
        write_jpeg(&source.join("banner.jpg"), 1200, 800);

        let stats = generate(&source, &dest, &ThumbOptions::default()).unwrap();

        assert_eq!(stats.generated, 1);
        let thumb = image::open(dest.join("banner.jpg")).unwrap();
        assert_eq!((thumb.width(), thumb.height()), (400, 400));
    }

    #[test]
    fn existing_outputs_are_skipped() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("full");
        let dest = tmp.path().join("thumb");
        fs::create_dir_all(&source).unwrap();
        write_jpeg(&source.join("a.jpg"), 900, 900);

        let first = generate(&source, &dest, &ThumbOptions::default()).unwrap();
        assert_eq!(first.generated, 1);

        let second = generate(&source, &dest, &ThumbOptions::default()).unwrap();
        assert_eq!(second.generated, 0);
        assert_eq!(second.skipped, 1);
    }

    #[test]
    fn corrupt_file_counts_as_failed() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("full");
        let dest = tmp.path().join("thumb");
        fs::create_dir_all(&source).unwrap();
        fs::write(source.join("broken.png"), b"not an image").unwrap();

        let stats = generate(&source, &dest, &ThumbOptions::default()).unwrap();
        assert_eq!(stats.failed, 1);
        assert!(!dest.join("broken.jpg").exists());
    }

    #[test]
    fn non_image_files_are_ignored() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("full");
        let dest = tmp.path().join("thumb");
        fs::create_dir_all(&source).unwrap();
        fs::write(source.join("mapping.json"), b"{}").unwrap();
        write_jpeg(&source.join("only.jpg"), 800, 600);

        let stats = generate(&source, &dest, &ThumbOptions::default()).unwrap();
        assert_eq!(stats.generated, 1);
        assert_eq!(stats.failed, 0);
    }

    #[test]
    fn missing_source_directory_errors() {
        let tmp = tempfile::TempDir::new().unwrap();
        let result = generate(
            &tmp.path().join("nope"),
            &tmp.path().join("thumb"),
            &ThumbOptions::default(),
        );
        assert!(matches!(result, Err(ThumbsError::SourceNotFound(_))));
    }
}
