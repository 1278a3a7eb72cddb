//! Image provider abstraction.
//!
//! The overlays only need to open a derived raster and know its pixel
//! dimensions; decoding pixels is the viewer's business.

use std::path::{Path, PathBuf};

use crate::registration::ImageDimensions;

/// Opens images and reports their dimensions.
pub trait ImageProvider {
    /// Handle to an opened image.
    type Image: Clone;

    /// Open the image at `path`, or None if it cannot be read.
    fn open(&self, path: &Path) -> Option<Self::Image>;

    /// Pixel dimensions of an opened image.
    fn dimensions(&self, image: &Self::Image) -> ImageDimensions;
}

/// An image whose header has been read from disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileImage {
    pub path: PathBuf,
    pub dimensions: ImageDimensions,
}

/// Provider backed by the `image` crate. Only headers are decoded.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileImageProvider;

impl ImageProvider for FileImageProvider {
    type Image = FileImage;

    fn open(&self, path: &Path) -> Option<FileImage> {
        match image::image_dimensions(path) {
            Ok((width, height)) => {
                log::debug!("Opened {:?} ({}x{})", path, width, height);
                Some(FileImage {
                    path: path.to_path_buf(),
                    dimensions: ImageDimensions::new(u64::from(width), u64::from(height)),
                })
            }
            Err(e) => {
                log::warn!("Failed to open image {:?}: {}", path, e);
                None
            }
        }
    }

    fn dimensions(&self, image: &FileImage) -> ImageDimensions {
        image.dimensions
    }
}
