// JPEG reader

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use image::codecs::jpeg::JpegDecoder;
use image::{DynamicImage, ImageDecoder};

use crate::error::FormatError;
use crate::frame::Frame;
use crate::raster::frame_from_image;

pub const JPEG_EXTENSIONS: &[&str] = &["jpg", "jpeg", "jpe"];

/// Set to `embedded` when the JPEG carries an ICC profile
pub const TAG_ICC_PROFILE: &str = "ICC_PROFILE";

/// JPEG reading capability
pub trait JpegRead: Send + Sync {
    fn read_jpeg(&self, path: &Path) -> Result<Frame, FormatError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct JpegReader;

impl JpegRead for JpegReader {
    fn read_jpeg(&self, path: &Path) -> Result<Frame, FormatError> {
        let file = File::open(path).map_err(|e| FormatError::io(path, e))?;
        let mut decoder = JpegDecoder::new(BufReader::new(file)).map_err(|e| FormatError::decode(path, e))?;

        // a broken profile is not fatal, the pixels are still usable
        let has_icc = match decoder.icc_profile() {
            Ok(profile) => profile.is_some_and(|p| !p.is_empty()),
            Err(e) => {
                log::warn!("{}: ignoring unreadable ICC profile: {}", path.display(), e);
                false
            }
        };

        let image = DynamicImage::from_decoder(decoder).map_err(|e| FormatError::decode(path, e))?;
        let mut frame = frame_from_image(image)?;
        if has_icc {
            frame.set_tag(TAG_ICC_PROFILE, "embedded");
        }
        Ok(frame)
    }
}
