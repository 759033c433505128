// Conversion between `image` buffers and frames

use image::{ColorType, DynamicImage};

use crate::error::FormatError;
use crate::frame::{Frame, LUMINANCE_DISPLAY, LUMINANCE_RELATIVE, TAG_LUMINANCE};

pub(crate) const TAG_BITS_PER_SAMPLE: &str = "BITS_PER_SAMPLE";

/// Integer samples are scaled to [0,1]; float samples pass through unchanged.
/// Gray images expand to R=G=B and alpha is dropped.
pub(crate) fn frame_from_image(image: DynamicImage) -> Result<Frame, FormatError> {
    let color = image.color();
    let is_float = matches!(color, ColorType::Rgb32F | ColorType::Rgba32F);
    let bits = color.bits_per_pixel() / u16::from(color.channel_count().max(1));

    let rgb = image.to_rgb32f();
    let (width, height) = rgb.dimensions();
    let mut frame = Frame::from_interleaved_rgb(width as usize, height as usize, rgb.as_raw())?;

    frame.set_tag(
        TAG_LUMINANCE,
        if is_float { LUMINANCE_RELATIVE } else { LUMINANCE_DISPLAY },
    );
    frame.set_tag(TAG_BITS_PER_SAMPLE, &bits.to_string());
    Ok(frame)
}
