//! RAW files as PFS frames
//!
//! Sensor data is decoded by `rawloader`; this module only turns the decoded
//! mosaic into a scene-referred RGB frame: level normalisation, white
//! balance, then either 2x2 binning (`half_size`) or a neighbourhood
//! average demosaic. Conversion options come from the
//! `Raw_Conversion_Options` settings section.

use std::path::Path;

use luminance_config::keys::{
    key_for, SettingsKey, KEY_AUTO_BRIGHT_THR, KEY_BRIGHTNESS, KEY_HALF_SIZE, KEY_HIGHLIGHTS,
    KEY_USER_BLACK, KEY_USER_MUL_0, KEY_USER_MUL_1, KEY_USER_MUL_2, KEY_USER_MUL_3,
    KEY_USER_FLIP, KEY_USER_SAT, KEY_USE_AUTO_BRIGHTNESS, KEY_USE_BLACK, KEY_USE_SAT,
    KEY_WB_METHOD,
};
use luminance_config::SettingsStore;

use crate::error::FormatError;
use crate::frame::{Frame, LUMINANCE_RELATIVE, TAG_LUMINANCE};

pub const RAW_EXTENSIONS: &[&str] = &[
    "3fr", "ari", "arw", "cr2", "crw", "dcr", "dcs", "dng", "erf", "kdc", "mef", "mos", "mrw",
    "nef", "nrw", "orf", "pef", "raf", "raw", "rw2", "rwl", "sr2", "srf", "srw", "x3f",
];

pub const TAG_CAMERA_MAKE: &str = "CAMERA_MAKE";
pub const TAG_CAMERA_MODEL: &str = "CAMERA_MODEL";

const WB_METHOD: &SettingsKey = key_for(KEY_WB_METHOD);
const USER_MUL: [&SettingsKey; 4] = [
    key_for(KEY_USER_MUL_0),
    key_for(KEY_USER_MUL_1),
    key_for(KEY_USER_MUL_2),
    key_for(KEY_USER_MUL_3),
];
const USE_BLACK: &SettingsKey = key_for(KEY_USE_BLACK);
const USER_BLACK: &SettingsKey = key_for(KEY_USER_BLACK);
const USE_SAT: &SettingsKey = key_for(KEY_USE_SAT);
const USER_SAT: &SettingsKey = key_for(KEY_USER_SAT);
const BRIGHTNESS: &SettingsKey = key_for(KEY_BRIGHTNESS);
const USE_AUTO_BRIGHTNESS: &SettingsKey = key_for(KEY_USE_AUTO_BRIGHTNESS);
const AUTO_BRIGHT_THR: &SettingsKey = key_for(KEY_AUTO_BRIGHT_THR);
const HALF_SIZE: &SettingsKey = key_for(KEY_HALF_SIZE);
const HIGHLIGHTS: &SettingsKey = key_for(KEY_HIGHLIGHTS);
const USER_FLIP: &SettingsKey = key_for(KEY_USER_FLIP);

/// How white balance multipliers are chosen
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WhiteBalance {
    /// Multipliers of 1
    None,
    /// As shot, from the camera metadata
    Camera,
    /// Gray world average over the image
    Auto,
    /// User multipliers for R, G, B, G2
    User([f32; 4]),
}

/// Reorientation of a developed frame. Flips are applied in sensor
/// coordinates, then the result is transposed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Flip {
    pub transpose: bool,
    pub flip_x: bool,
    pub flip_y: bool,
}

impl Flip {
    pub const NONE: Flip = Flip { transpose: false, flip_x: false, flip_y: false };

    /// `user_flip` codes: 0 none, 3 180 degrees, 5 90 degrees CCW, 6 90 degrees CW
    pub fn from_user_code(code: i64) -> Option<Flip> {
        let (transpose, flip_x, flip_y) = match code {
            0 => (false, false, false),
            3 => (false, true, true),
            5 => (true, true, false),
            6 => (true, false, true),
            _ => return None,
        };
        Some(Flip { transpose, flip_x, flip_y })
    }

    fn from_camera(orientation: rawloader::Orientation) -> Flip {
        let (transpose, flip_x, flip_y) = orientation.to_flips();
        Flip { transpose, flip_x, flip_y }
    }

    pub fn apply(self, frame: &Frame) -> Result<Frame, FormatError> {
        if self == Flip::NONE {
            return Ok(frame.clone());
        }
        let (src_width, src_height) = (frame.width(), frame.height());
        let (width, height) = if self.transpose {
            (src_height, src_width)
        } else {
            (src_width, src_height)
        };

        let mut out = Frame::new(width, height)?;
        for (name, value) in frame.tags() {
            out.set_tag(name, value);
        }
        for channel in frame.channels() {
            let src = channel.data();
            let mut data = Vec::with_capacity(src.len());
            for row in 0..height {
                for col in 0..width {
                    let (mut r, mut c) = if self.transpose { (col, row) } else { (row, col) };
                    if self.flip_y {
                        r = src_height - 1 - r;
                    }
                    if self.flip_x {
                        c = src_width - 1 - c;
                    }
                    data.push(src[r * src_width + c]);
                }
            }
            let copy = out.add_channel(channel.name(), data)?;
            for (name, value) in channel.tags() {
                copy.set_tag(name, value);
            }
        }
        Ok(out)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawConversionOptions {
    pub white_balance: WhiteBalance,
    /// Overrides the camera black level
    pub user_black: Option<u16>,
    /// Overrides the camera white (saturation) level
    pub user_saturation: Option<u16>,
    pub brightness: f32,
    /// Fraction of brightest pixels allowed to clip when auto brightness is on
    pub auto_bright_threshold: Option<f32>,
    pub half_size: bool,
    /// Clip values above white
    pub clip_highlights: bool,
    /// Overrides the camera orientation
    pub user_flip: Option<Flip>,
}

impl Default for RawConversionOptions {
    fn default() -> Self {
        Self {
            white_balance: WhiteBalance::Camera,
            user_black: None,
            user_saturation: None,
            brightness: 1.0,
            auto_bright_threshold: None,
            half_size: false,
            clip_highlights: true,
            user_flip: None,
        }
    }
}

impl RawConversionOptions {
    /// Read options from the settings store, falling back to defaults per key
    pub fn from_store(store: &SettingsStore) -> Self {
        let defaults = Self::default();

        let white_balance = match store.get_int(WB_METHOD, 1) {
            0 => WhiteBalance::None,
            2 => WhiteBalance::Auto,
            3 => {
                let mut mul = [1.0f32; 4];
                for (m, key) in mul.iter_mut().zip(USER_MUL) {
                    *m = store.get_float(key, 1.0) as f32;
                }
                // the second green defaults to the first
                if !store.contains(USER_MUL[3]) {
                    mul[3] = mul[1];
                }
                WhiteBalance::User(mul)
            }
            _ => WhiteBalance::Camera,
        };

        let level = |flag: &SettingsKey, value: &SettingsKey| {
            if store.get_bool(flag, false) {
                u16::try_from(store.get_int(value, 0)).ok()
            } else {
                None
            }
        };

        let auto_bright_threshold = if store.get_bool(USE_AUTO_BRIGHTNESS, false) {
            Some(store.get_float(AUTO_BRIGHT_THR, 0.01).clamp(0.0, 0.5) as f32)
        } else {
            None
        };

        Self {
            white_balance,
            user_black: level(USE_BLACK, USER_BLACK),
            user_saturation: level(USE_SAT, USER_SAT),
            brightness: store.get_float(BRIGHTNESS, defaults.brightness as f64) as f32,
            auto_bright_threshold,
            half_size: store.get_bool(HALF_SIZE, defaults.half_size),
            // highlight mode 0 clips, every other mode keeps values above white
            clip_highlights: store.get_int(HIGHLIGHTS, 0) == 0,
            user_flip: user_flip(store),
        }
    }
}

/// Negative `user_flip` means "as shot"
fn user_flip(store: &SettingsStore) -> Option<Flip> {
    let code = store.get_int(USER_FLIP, -1);
    if code < 0 {
        return None;
    }
    let flip = Flip::from_user_code(code);
    if flip.is_none() {
        log::warn!("ignoring unknown user_flip {}", code);
    }
    flip
}

/// RAW-as-PFS input capability
pub trait RawRead: Send + Sync {
    fn read_raw(&self, path: &Path, options: &RawConversionOptions) -> Result<Frame, FormatError>;
}

/// Decoded sensor data, already cropped to the active area
#[derive(Debug, Clone)]
pub struct Mosaic {
    pub width: usize,
    pub height: usize,
    /// Color index (0 R, 1 G, 2 B, 3 second G) per position of the repeating pattern
    pub pattern: Vec<usize>,
    pub pattern_width: usize,
    pub pattern_height: usize,
    pub samples: Vec<f32>,
    pub black: [f32; 4],
    pub white: [f32; 4],
    pub camera_wb: [f32; 4],
}

impl Mosaic {
    fn color_at(&self, row: usize, col: usize) -> usize {
        self.pattern[(row % self.pattern_height) * self.pattern_width + col % self.pattern_width]
    }

    /// Output channel for a pattern color; the second green joins green
    fn rgb_index(color: usize) -> usize {
        if color == 3 {
            1
        } else {
            color.min(2)
        }
    }
}

/// Build a scene-referred RGB frame from a mosaic
pub fn develop(mosaic: &Mosaic, options: &RawConversionOptions) -> Result<Frame, FormatError> {
    if mosaic.width == 0 || mosaic.height == 0 {
        return Err(FormatError::EmptyFrame);
    }
    if mosaic.samples.len() != mosaic.width * mosaic.height {
        return Err(FormatError::ChannelLength {
            name: "CFA".to_string(),
            expected: mosaic.width * mosaic.height,
            found: mosaic.samples.len(),
        });
    }
    if mosaic.pattern_width == 0
        || mosaic.pattern_height == 0
        || mosaic.pattern.len() != mosaic.pattern_width * mosaic.pattern_height
        || mosaic.pattern.iter().any(|&c| c > 3)
    {
        return Err(FormatError::UnsupportedFormat("malformed CFA pattern".to_string()));
    }

    let normalized = normalize(mosaic, options);
    let multipliers = white_balance(mosaic, &normalized, options);

    let mut balanced = normalized;
    for row in 0..mosaic.height {
        for col in 0..mosaic.width {
            let i = row * mosaic.width + col;
            balanced[i] *= multipliers[mosaic.color_at(row, col)];
            if options.clip_highlights {
                balanced[i] = balanced[i].min(1.0);
            }
        }
    }

    let (width, height, mut rgb) = if options.half_size {
        bin_half_size(mosaic, &balanced)?
    } else {
        (mosaic.width, mosaic.height, interpolate(mosaic, &balanced))
    };

    let scale = options.brightness * auto_brightness(&rgb, options.auto_bright_threshold);
    if scale != 1.0 {
        rgb.iter_mut().for_each(|v| *v *= scale);
    }

    let mut frame = Frame::from_interleaved_rgb(width, height, &rgb)?;
    frame.set_tag(TAG_LUMINANCE, LUMINANCE_RELATIVE);
    Ok(frame)
}

fn normalize(mosaic: &Mosaic, options: &RawConversionOptions) -> Vec<f32> {
    let mut levels = [(0f32, 1f32); 4];
    for (c, level) in levels.iter_mut().enumerate() {
        let black = options.user_black.map(f32::from).unwrap_or(mosaic.black[c]);
        let white = options.user_saturation.map(f32::from).unwrap_or(mosaic.white[c]);
        let range = if white > black { white - black } else { 1.0 };
        *level = (black, range);
    }

    let mut out = Vec::with_capacity(mosaic.samples.len());
    for row in 0..mosaic.height {
        for col in 0..mosaic.width {
            let (black, range) = levels[mosaic.color_at(row, col)];
            let v = mosaic.samples[row * mosaic.width + col];
            out.push(((v - black) / range).max(0.0));
        }
    }
    out
}

/// Multipliers indexed by pattern color, normalised so green is 1
fn white_balance(mosaic: &Mosaic, normalized: &[f32], options: &RawConversionOptions) -> [f32; 4] {
    let raw = match options.white_balance {
        WhiteBalance::None => [1.0; 4],
        WhiteBalance::Camera => mosaic.camera_wb,
        WhiteBalance::User(mul) => mul,
        WhiteBalance::Auto => {
            let mut sum = [0f64; 4];
            let mut count = [0usize; 4];
            for row in 0..mosaic.height {
                for col in 0..mosaic.width {
                    let c = mosaic.color_at(row, col);
                    sum[c] += normalized[row * mosaic.width + col] as f64;
                    count[c] += 1;
                }
            }
            let mut mul = [1.0f32; 4];
            for c in 0..4 {
                if count[c] > 0 && sum[c] > 0.0 {
                    mul[c] = (count[c] as f64 / sum[c]) as f32;
                }
            }
            mul
        }
    };

    let usable = |v: f32| v.is_finite() && v > 0.0;
    let green = if usable(raw[1]) { raw[1] } else { 1.0 };
    let mut mul = [1.0f32; 4];
    for c in 0..4 {
        let v = if c == 3 && !usable(raw[3]) { raw[1] } else { raw[c] };
        mul[c] = if usable(v) { v / green } else { 1.0 };
    }
    mul
}

/// One output pixel per 2x2 block, each color averaged within the block
fn bin_half_size(mosaic: &Mosaic, balanced: &[f32]) -> Result<(usize, usize, Vec<f32>), FormatError> {
    if mosaic.pattern_width != 2 || mosaic.pattern_height != 2 {
        return Err(FormatError::UnsupportedFormat(format!(
            "half size needs a 2x2 CFA, got {}x{}",
            mosaic.pattern_width, mosaic.pattern_height
        )));
    }
    let (width, height) = (mosaic.width / 2, mosaic.height / 2);
    if width == 0 || height == 0 {
        return Err(FormatError::EmptyFrame);
    }

    let mut rgb = Vec::with_capacity(width * height * 3);
    for y in 0..height {
        for x in 0..width {
            let mut sum = [0f32; 3];
            let mut count = [0u32; 3];
            for (dy, dx) in [(0, 0), (0, 1), (1, 0), (1, 1)] {
                let (row, col) = (y * 2 + dy, x * 2 + dx);
                let c = Mosaic::rgb_index(mosaic.color_at(row, col));
                sum[c] += balanced[row * mosaic.width + col];
                count[c] += 1;
            }
            for c in 0..3 {
                rgb.push(if count[c] > 0 { sum[c] / count[c] as f32 } else { 0.0 });
            }
        }
    }
    Ok((width, height, rgb))
}

/// Full-size RGB: a pixel keeps its own sample and takes the mean of the
/// 3x3 neighbours for the two missing colors
fn interpolate(mosaic: &Mosaic, balanced: &[f32]) -> Vec<f32> {
    let (width, height) = (mosaic.width, mosaic.height);
    let mut rgb = Vec::with_capacity(width * height * 3);
    for row in 0..height {
        for col in 0..width {
            let own = Mosaic::rgb_index(mosaic.color_at(row, col));
            let mut sum = [0f32; 3];
            let mut count = [0u32; 3];
            for r in row.saturating_sub(1)..=(row + 1).min(height - 1) {
                for c in col.saturating_sub(1)..=(col + 1).min(width - 1) {
                    let color = Mosaic::rgb_index(mosaic.color_at(r, c));
                    sum[color] += balanced[r * width + c];
                    count[color] += 1;
                }
            }
            for channel in 0..3 {
                let v = if channel == own {
                    balanced[row * width + col]
                } else if count[channel] > 0 {
                    sum[channel] / count[channel] as f32
                } else {
                    0.0
                };
                rgb.push(v);
            }
        }
    }
    rgb
}

/// Scale that maps the brightest `threshold` fraction of samples to 1.0
fn auto_brightness(rgb: &[f32], threshold: Option<f32>) -> f32 {
    let Some(threshold) = threshold else {
        return 1.0;
    };
    let mut values: Vec<f32> = rgb.iter().copied().filter(|v| v.is_finite()).collect();
    if values.is_empty() {
        return 1.0;
    }
    values.sort_by(f32::total_cmp);
    let index = ((values.len() - 1) as f32 * (1.0 - threshold)).round() as usize;
    let white = values[index.min(values.len() - 1)];
    if white > 0.0 {
        1.0 / white
    } else {
        1.0
    }
}

/// Reads anything `rawloader` can decode
#[derive(Debug, Default, Clone, Copy)]
pub struct RawLoaderReader;

impl RawLoaderReader {
    fn mosaic(path: &Path, image: &rawloader::RawImage) -> Result<Mosaic, FormatError> {
        if image.cpp != 1 {
            return Err(FormatError::UnsupportedFormat(format!(
                "{}: {} components per pixel",
                path.display(),
                image.cpp
            )));
        }

        if image.cfa.width == 0 || image.cfa.height == 0 {
            return Err(FormatError::UnsupportedFormat(format!(
                "{}: no color filter array",
                path.display()
            )));
        }

        let full: Vec<f32> = match &image.data {
            rawloader::RawImageData::Integer(data) => data.iter().map(|&v| f32::from(v)).collect(),
            rawloader::RawImageData::Float(data) => data.clone(),
        };
        let (width, height, samples) = crop_active_area(&full, image.width, image.height, image.crops)
            .ok_or_else(|| FormatError::decode(path, "sensor data shorter than image"))?;

        let [top, _, _, left] = image.crops;
        let (pattern_width, pattern_height) = (image.cfa.width, image.cfa.height);
        let pattern = shifted_pattern(pattern_width, pattern_height, top, left, |row, col| {
            image.cfa.color_at(row, col)
        });

        Ok(Mosaic {
            width,
            height,
            pattern,
            pattern_width,
            pattern_height,
            samples,
            black: image.blacklevels.map(f32::from),
            white: image.whitelevels.map(f32::from),
            camera_wb: image.wb_coeffs,
        })
    }
}

/// Cut `crops` (top, right, bottom, left) off a row-major sensor buffer
fn crop_active_area(
    full: &[f32],
    full_width: usize,
    full_height: usize,
    crops: [usize; 4],
) -> Option<(usize, usize, Vec<f32>)> {
    if full.len() < full_width.checked_mul(full_height)? {
        return None;
    }
    let [top, right, bottom, left] = crops;
    let width = full_width.saturating_sub(left + right);
    let height = full_height.saturating_sub(top + bottom);

    let mut samples = Vec::with_capacity(width * height);
    for row in top..top + height {
        let start = row * full_width + left;
        samples.extend_from_slice(&full[start..start + width]);
    }
    Some((width, height, samples))
}

/// The CFA pattern as seen from the top-left corner of the cropped area
fn shifted_pattern(
    pattern_width: usize,
    pattern_height: usize,
    top: usize,
    left: usize,
    color_at: impl Fn(usize, usize) -> usize,
) -> Vec<usize> {
    let mut pattern = Vec::with_capacity(pattern_width * pattern_height);
    for row in 0..pattern_height {
        for col in 0..pattern_width {
            pattern.push(color_at(row + top, col + left).min(3));
        }
    }
    pattern
}

impl RawRead for RawLoaderReader {
    fn read_raw(&self, path: &Path, options: &RawConversionOptions) -> Result<Frame, FormatError> {
        let image = rawloader::decode_file(path).map_err(|e| FormatError::decode(path, e))?;
        log::debug!(
            "{}: {} {} {}x{} cfa {}",
            path.display(),
            image.clean_make,
            image.clean_model,
            image.width,
            image.height,
            image.cfa.name
        );

        let mosaic = Self::mosaic(path, &image)?;
        let flip = options
            .user_flip
            .unwrap_or_else(|| Flip::from_camera(image.orientation));
        let mut frame = flip.apply(&develop(&mosaic, options)?)?;
        frame.set_tag(TAG_CAMERA_MAKE, &image.clean_make);
        frame.set_tag(TAG_CAMERA_MODEL, &image.clean_model);
        Ok(frame)
    }
}
