// LDR output writer

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb, RgbImage};

use crate::error::FormatError;
use crate::frame::{Frame, LUMINANCE_RELATIVE, TAG_LUMINANCE};

/// Options for LDR output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LdrOptions {
    /// JPEG quality, 1-100
    pub quality: u8,
    /// Write 16 bits per sample where the format allows it (PNG, TIFF)
    pub sixteen_bit: bool,
}

impl Default for LdrOptions {
    fn default() -> Self {
        Self {
            quality: 100,
            sixteen_bit: false,
        }
    }
}

/// LDR writing capability
pub trait LdrWrite: Send + Sync {
    fn write_ldr(&self, frame: &Frame, path: &Path, options: &LdrOptions) -> Result<(), FormatError>;
}

/// Writes the R, G, B channels of a frame through `image`
#[derive(Debug, Default, Clone, Copy)]
pub struct LdrWriter;

impl LdrWrite for LdrWriter {
    fn write_ldr(&self, frame: &Frame, path: &Path, options: &LdrOptions) -> Result<(), FormatError> {
        let format = output_format(path)?;
        if frame.tag(TAG_LUMINANCE) == Some(LUMINANCE_RELATIVE) {
            log::debug!("{}: clamping scene-referred frame to [0,1]", path.display());
        }

        let width = u32::try_from(frame.width()).map_err(|e| FormatError::encode(path, e))?;
        let height = u32::try_from(frame.height()).map_err(|e| FormatError::encode(path, e))?;

        let wide = options.sixteen_bit && matches!(format, ImageFormat::Png | ImageFormat::Tiff);
        if options.sixteen_bit && !wide {
            log::warn!("{}: {:?} has no 16-bit output, writing 8-bit", path.display(), format);
        }

        if wide {
            let samples = interleave(frame, quantize16)?;
            let buffer: ImageBuffer<Rgb<u16>, Vec<u16>> = ImageBuffer::from_raw(width, height, samples)
                .ok_or_else(|| FormatError::encode(path, "sample buffer size mismatch"))?;
            return DynamicImage::ImageRgb16(buffer)
                .save_with_format(path, format)
                .map_err(|e| FormatError::encode(path, e));
        }

        let samples = interleave(frame, quantize8)?;
        let buffer = RgbImage::from_raw(width, height, samples)
            .ok_or_else(|| FormatError::encode(path, "sample buffer size mismatch"))?;

        if format == ImageFormat::Jpeg {
            let quality = options.quality.clamp(1, 100);
            let file = File::create(path).map_err(|e| FormatError::io(path, e))?;
            return write_jpeg(file, &buffer, quality, path);
        }

        DynamicImage::ImageRgb8(buffer)
            .save_with_format(path, format)
            .map_err(|e| FormatError::encode(path, e))
    }
}

/// The final flush is where a full disk shows up
fn write_jpeg<W: Write>(out: W, buffer: &RgbImage, quality: u8, path: &Path) -> Result<(), FormatError> {
    let mut writer = BufWriter::new(out);
    JpegEncoder::new_with_quality(&mut writer, quality)
        .encode_image(buffer)
        .map_err(|e| FormatError::encode(path, e))?;
    writer.flush().map_err(|e| FormatError::io(path, e))
}

fn output_format(path: &Path) -> Result<ImageFormat, FormatError> {
    let format = ImageFormat::from_path(path)
        .map_err(|_| FormatError::UnsupportedFormat(path.display().to_string()))?;
    match format {
        ImageFormat::Jpeg | ImageFormat::Png | ImageFormat::Tiff | ImageFormat::Bmp | ImageFormat::Pnm => {
            Ok(format)
        }
        other => Err(FormatError::UnsupportedFormat(format!("{:?} output", other))),
    }
}

pub(crate) fn quantize8(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0 + 0.5) as u8
}

pub(crate) fn quantize16(v: f32) -> u16 {
    (v.clamp(0.0, 1.0) * 65535.0 + 0.5) as u16
}

fn interleave<T>(frame: &Frame, quantize: fn(f32) -> T) -> Result<Vec<T>, FormatError> {
    let (r, g, b) = frame.rgb()?;
    let mut out = Vec::with_capacity(frame.pixel_count() * 3);
    for ((&r, &g), &b) in r.iter().zip(g).zip(b) {
        out.push(quantize(r));
        out.push(quantize(g));
        out.push(quantize(b));
    }
    Ok(out)
}
