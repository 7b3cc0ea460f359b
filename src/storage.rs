// SPDX-License-Identifier: GPL-3.0-only

//! Snapshot files

use std::path::{Path, PathBuf};

use image::{ImageFormat, RgbImage};
use tracing::info;

use crate::constants::APP_DIR_NAME;
use crate::errors::{AppError, AppResult};
use crate::frames::{FrameLayout, StreamKind};

/// `<pictures>/kinect-console`, falling back to the home directory
pub fn default_snapshot_dir() -> PathBuf {
    dirs::picture_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
        .join(APP_DIR_NAME)
}

/// Timestamped file name for a snapshot of `stream`
pub fn snapshot_file_name(stream: StreamKind) -> String {
    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S_%3f");
    format!(
        "KINECT_{}_{}.png",
        stream.to_string().to_lowercase(),
        timestamp
    )
}

/// Write one RGB24 front buffer as PNG into `dir`
pub fn save_snapshot(
    dir: &Path,
    stream: StreamKind,
    layout: FrameLayout,
    rgb: &[u8],
) -> AppResult<PathBuf> {
    if layout.bytes_per_pixel != 3 || rgb.len() != layout.byte_len() {
        return Err(AppError::Storage(format!(
            "{} buffer does not hold a {}x{} RGB frame",
            stream, layout.width, layout.height
        )));
    }

    std::fs::create_dir_all(dir)?;

    let image = RgbImage::from_raw(layout.width as u32, layout.height as u32, rgb.to_vec())
        .ok_or_else(|| AppError::Storage("frame buffer size mismatch".to_string()))?;

    let path = dir.join(snapshot_file_name(stream));
    image.save_with_format(&path, ImageFormat::Png)?;

    info!(path = %path.display(), stream = %stream, "Snapshot saved");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "kinect-console-{}-{}",
            name,
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn test_file_name_names_stream() {
        let name = snapshot_file_name(StreamKind::Color);
        assert!(name.starts_with("KINECT_rgb_"));
        assert!(name.ends_with(".png"));
        assert!(snapshot_file_name(StreamKind::Depth).starts_with("KINECT_depth_"));
    }

    #[test]
    fn test_save_snapshot_writes_png() {
        let dir = scratch_dir("png");
        let layout = FrameLayout {
            width: 4,
            height: 2,
            bytes_per_pixel: 3,
        };
        let rgb: Vec<u8> = (0..24).collect();

        let path = save_snapshot(&dir, StreamKind::Depth, layout, &rgb).unwrap();
        let decoded = image::open(&path).unwrap().to_rgb8();
        assert_eq!(decoded.dimensions(), (4, 2));
        assert_eq!(decoded.as_raw(), &rgb);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_save_snapshot_rejects_wrong_size() {
        let dir = scratch_dir("size");
        let layout = FrameLayout::KINECT_RGB;
        assert!(matches!(
            save_snapshot(&dir, StreamKind::Color, layout, &[0; 12]),
            Err(AppError::Storage(_))
        ));
        assert!(!dir.exists());
    }
}
