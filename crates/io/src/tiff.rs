// TIFF reader

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use image::codecs::tiff::TiffDecoder;
use image::DynamicImage;

use crate::error::FormatError;
use crate::frame::Frame;
use crate::raster::frame_from_image;

pub const TIFF_EXTENSIONS: &[&str] = &["tif", "tiff"];

/// TIFF reading capability
pub trait TiffRead: Send + Sync {
    fn read_tiff(&self, path: &Path) -> Result<Frame, FormatError>;
}

/// Reads 8/16-bit TIFFs as display-referred frames and 32-bit float TIFFs as
/// scene-referred frames
#[derive(Debug, Default, Clone, Copy)]
pub struct TiffReader;

impl TiffRead for TiffReader {
    fn read_tiff(&self, path: &Path) -> Result<Frame, FormatError> {
        let file = File::open(path).map_err(|e| FormatError::io(path, e))?;
        let decoder = TiffDecoder::new(BufReader::new(file)).map_err(|e| FormatError::decode(path, e))?;
        let image = DynamicImage::from_decoder(decoder).map_err(|e| FormatError::decode(path, e))?;

        log::debug!(
            "{}: {}x{} {:?}",
            path.display(),
            image.width(),
            image.height(),
            image.color()
        );
        frame_from_image(image)
    }
}
