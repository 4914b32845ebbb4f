// src/video.rs - Frame sources: live camera and still-frame directories
use std::path::{Path, PathBuf};

use image::RgbImage;
use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{
    ApiBackend, CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType,
    Resolution,
};
use nokhwa::Camera;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("failed to open camera {index}: {reason}")]
    Open { index: u32, reason: String },
    #[error("failed to capture frame: {0}")]
    Frame(String),
    #[error("failed to read frame {path}: {source}")]
    File {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("failed to list {path}: {source}")]
    Directory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Pulls one frame per loop iteration. `Ok(None)` means the stream ended.
pub trait FrameSource {
    fn read(&mut self) -> Result<Option<RgbImage>, CaptureError>;

    fn release(&mut self);
}

impl<T: FrameSource + ?Sized> FrameSource for Box<T> {
    fn read(&mut self) -> Result<Option<RgbImage>, CaptureError> {
        (**self).read()
    }

    fn release(&mut self) {
        (**self).release()
    }
}

/// Lists connected cameras as (index, human name).
pub fn list_cameras() -> Vec<(u32, String)> {
    match nokhwa::query(ApiBackend::Auto) {
        Ok(cameras) => cameras
            .iter()
            .map(|info| {
                let index = match info.index() {
                    CameraIndex::Index(i) => *i,
                    CameraIndex::String(_) => u32::MAX,
                };
                (index, info.human_name())
            })
            .collect(),
        Err(e) => {
            tracing::warn!("Failed to query cameras: {}", e);
            Vec::new()
        }
    }
}

pub struct CameraSource {
    camera: Option<Camera>,
    index: u32,
}

impl CameraSource {
    pub fn open(index: u32, width: u32, height: u32, fps: u32) -> Result<Self, CaptureError> {
        tracing::debug!("Opening camera index {} at {}x{}@{}", index, width, height, fps);

        let format = CameraFormat::new(Resolution::new(width, height), FrameFormat::MJPEG, fps);
        let requested = RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(format));

        let mut camera = Camera::new(CameraIndex::Index(index), requested).map_err(|e| {
            CaptureError::Open {
                index,
                reason: e.to_string(),
            }
        })?;
        camera.open_stream().map_err(|e| CaptureError::Open {
            index,
            reason: e.to_string(),
        })?;

        let resolution = camera.resolution();
        tracing::info!(
            "Camera {} streaming at {}x{}",
            index,
            resolution.width(),
            resolution.height()
        );

        Ok(Self {
            camera: Some(camera),
            index,
        })
    }
}

impl FrameSource for CameraSource {
    fn read(&mut self) -> Result<Option<RgbImage>, CaptureError> {
        let Some(camera) = self.camera.as_mut() else {
            return Ok(None);
        };

        let frame = camera
            .frame()
            .map_err(|e| CaptureError::Frame(e.to_string()))?;
        let decoded = frame
            .decode_image::<RgbFormat>()
            .map_err(|e| CaptureError::Frame(e.to_string()))?;

        Ok(Some(decoded))
    }

    fn release(&mut self) {
        if let Some(mut camera) = self.camera.take() {
            if let Err(e) = camera.stop_stream() {
                tracing::warn!("Failed to stop camera {}: {}", self.index, e);
            }
            tracing::info!("Camera {} released", self.index);
        }
    }
}

impl Drop for CameraSource {
    fn drop(&mut self) {
        self.release();
    }
}

/// Replays the images in a directory in file-name order, then ends.
pub struct FrameDirectory {
    frames: std::vec::IntoIter<PathBuf>,
    width: u32,
    height: u32,
}

impl FrameDirectory {
    pub fn open(dir: impl AsRef<Path>, width: u32, height: u32) -> Result<Self, CaptureError> {
        let dir = dir.as_ref();
        let entries = std::fs::read_dir(dir).map_err(|source| CaptureError::Directory {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut frames: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| is_image(path))
            .collect();
        frames.sort();

        tracing::info!("Loaded {} frames from {}", frames.len(), dir.display());

        Ok(Self {
            frames: frames.into_iter(),
            width,
            height,
        })
    }
}

fn is_image(path: &Path) -> bool {
    matches!(
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .as_deref(),
        Some("png" | "jpg" | "jpeg")
    )
}

impl FrameSource for FrameDirectory {
    fn read(&mut self) -> Result<Option<RgbImage>, CaptureError> {
        let Some(path) = self.frames.next() else {
            return Ok(None);
        };

        let img = image::open(&path).map_err(|source| CaptureError::File { path, source })?;
        let img = if img.width() != self.width || img.height() != self.height {
            img.resize_exact(self.width, self.height, image::imageops::FilterType::Triangle)
        } else {
            img
        };
        Ok(Some(img.to_rgb8()))
    }

    fn release(&mut self) {
        self.frames = Vec::new().into_iter();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("pinch_player_{}_{}", name, std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_frame_directory_order_and_resize() {
        let dir = scratch_dir("frames");
        RgbImage::from_pixel(32, 24, image::Rgb([255, 0, 0]))
            .save(dir.join("frame_0002.png"))
            .unwrap();
        RgbImage::from_pixel(64, 48, image::Rgb([0, 255, 0]))
            .save(dir.join("frame_0001.png"))
            .unwrap();
        std::fs::write(dir.join("notes.txt"), "not a frame").unwrap();

        let mut source = FrameDirectory::open(&dir, 64, 48).unwrap();

        let first = source.read().unwrap().unwrap();
        assert_eq!(first.get_pixel(0, 0), &image::Rgb([0, 255, 0]));

        let second = source.read().unwrap().unwrap();
        assert_eq!(second.dimensions(), (64, 48));
        assert_eq!(second.get_pixel(10, 10), &image::Rgb([255, 0, 0]));

        assert!(source.read().unwrap().is_none());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_missing_directory() {
        assert!(matches!(
            FrameDirectory::open("/no/such/frames", 640, 480),
            Err(CaptureError::Directory { .. })
        ));
    }

    #[test]
    fn test_release_ends_stream() {
        let dir = scratch_dir("release");
        RgbImage::new(8, 8).save(dir.join("a.png")).unwrap();

        let mut source = FrameDirectory::open(&dir, 8, 8).unwrap();
        source.release();
        assert!(source.read().unwrap().is_none());
        let _ = std::fs::remove_dir_all(&dir);
    }
}
