//! Boundary to image I/O.
//!
//! Pixel decoding belongs to the caller's image library. This module only
//! reads header dimensions so callers can pair a record with an image
//! handle without decoding pixels.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::VocError;

/// An opened (header-only) image.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ImageHandle {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
}

impl ImageHandle {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}

/// Reads the image header at `path`.
pub fn open_image(path: &Path) -> Result<ImageHandle, VocError> {
    let (width, height) = read_image_dimensions(path)?;
    Ok(ImageHandle {
        path: path.to_path_buf(),
        width,
        height,
    })
}

/// `(width, height)` from the image header.
pub fn read_image_dimensions(path: &Path) -> Result<(u32, u32), VocError> {
    let size = imagesize::size(path).map_err(|source| VocError::ImageDimensionRead {
        path: path.to_path_buf(),
        source,
    })?;

    checked_dimensions(path, size.width, size.height)
}

fn checked_dimensions(path: &Path, width: usize, height: usize) -> Result<(u32, u32), VocError> {
    match (u32::try_from(width), u32::try_from(height)) {
        (Ok(width), Ok(height)) => Ok((width, height)),
        _ => Err(VocError::ImageTooLarge {
            path: path.to_path_buf(),
            width,
            height,
        }),
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_image_reads_header_dimensions() {
        let temp = tempfile::tempdir().expect("create temp dir");
        // VOC corpora name every image `.jpg`; the header decides the format.
        let path = temp.path().join("a.jpg");
        std::fs::write(&path, test_support::bmp_bytes(32, 16)).expect("write bmp");

        let handle = open_image(&path).expect("open image");
        assert_eq!((handle.width(), handle.height()), (32, 16));
        assert_eq!(handle.path, path);
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn oversized_headers_are_an_image_error() {
        let path = Path::new("huge.jpg");
        let too_wide = u32::MAX as usize + 1;
        let err = checked_dimensions(path, too_wide, 10).unwrap_err();
        assert!(matches!(err, VocError::ImageTooLarge { width, height: 10, .. } if width == too_wide));
        assert_eq!(checked_dimensions(path, 640, 480).expect("fits"), (640, 480));
    }

    #[test]
    fn unreadable_images_are_reported() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let path = temp.path().join("broken.jpg");
        std::fs::write(&path, b"not an image").expect("write file");

        let err = open_image(&path).unwrap_err();
        assert!(matches!(err, VocError::ImageDimensionRead { .. }));
    }
}
