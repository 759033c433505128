//! Floating point frame shared by every driver
//!
//! A frame is a set of named `f32` channels of identical size, stored
//! row-major, plus free-form string tags. Readers produce `R`, `G` and `B`
//! channels; the `LUMINANCE` tag says whether the values are display
//! referred (`DISPLAY`, in `[0,1]`) or scene referred (`RELATIVE`).

use std::collections::BTreeMap;

use crate::error::FormatError;

pub const TAG_LUMINANCE: &str = "LUMINANCE";
pub const LUMINANCE_DISPLAY: &str = "DISPLAY";
pub const LUMINANCE_RELATIVE: &str = "RELATIVE";

#[derive(Debug, Clone, PartialEq)]
pub struct Channel {
    name: String,
    data: Vec<f32>,
    tags: BTreeMap<String, String>,
}

impl Channel {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn tags(&self) -> &BTreeMap<String, String> {
        &self.tags
    }

    pub fn set_tag(&mut self, name: &str, value: &str) {
        self.tags.insert(name.to_string(), value.to_string());
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    width: usize,
    height: usize,
    channels: Vec<Channel>,
    tags: BTreeMap<String, String>,
}

impl Frame {
    pub fn new(width: usize, height: usize) -> Result<Self, FormatError> {
        if width == 0 || height == 0 {
            return Err(FormatError::EmptyFrame);
        }
        width.checked_mul(height).ok_or_else(|| {
            FormatError::InvalidHeader(format!("{}x{} overflows", width, height))
        })?;
        Ok(Self {
            width,
            height,
            channels: Vec::new(),
            tags: BTreeMap::new(),
        })
    }

    /// Split interleaved RGB samples into `R`, `G`, `B` channels
    pub fn from_interleaved_rgb(width: usize, height: usize, rgb: &[f32]) -> Result<Self, FormatError> {
        let mut frame = Self::new(width, height)?;
        let pixels = frame.pixel_count();
        if rgb.len() != pixels * 3 {
            return Err(FormatError::ChannelLength {
                name: "RGB".to_string(),
                expected: pixels * 3,
                found: rgb.len(),
            });
        }

        let mut r = Vec::with_capacity(pixels);
        let mut g = Vec::with_capacity(pixels);
        let mut b = Vec::with_capacity(pixels);
        for px in rgb.chunks_exact(3) {
            r.push(px[0]);
            g.push(px[1]);
            b.push(px[2]);
        }
        frame.add_channel("R", r)?;
        frame.add_channel("G", g)?;
        frame.add_channel("B", b)?;
        Ok(frame)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pixel_count(&self) -> usize {
        self.width * self.height
    }

    pub fn add_channel(&mut self, name: &str, data: Vec<f32>) -> Result<&mut Channel, FormatError> {
        if self.channel(name).is_some() {
            return Err(FormatError::DuplicateChannel(name.to_string()));
        }
        if data.len() != self.pixel_count() {
            return Err(FormatError::ChannelLength {
                name: name.to_string(),
                expected: self.pixel_count(),
                found: data.len(),
            });
        }
        self.channels.push(Channel {
            name: name.to_string(),
            data,
            tags: BTreeMap::new(),
        });
        let last = self.channels.len() - 1;
        Ok(&mut self.channels[last])
    }

    pub fn channel(&self, name: &str) -> Option<&Channel> {
        self.channels.iter().find(|c| c.name == name)
    }

    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    /// The `R`, `G`, `B` channel data
    pub fn rgb(&self) -> Result<(&[f32], &[f32], &[f32]), FormatError> {
        let get = |name: &str| {
            self.channel(name)
                .map(Channel::data)
                .ok_or_else(|| FormatError::MissingChannel(name.to_string()))
        };
        Ok((get("R")?, get("G")?, get("B")?))
    }

    pub fn tag(&self, name: &str) -> Option<&str> {
        self.tags.get(name).map(String::as_str)
    }

    pub fn set_tag(&mut self, name: &str, value: &str) {
        self.tags.insert(name.to_string(), value.to_string());
    }

    pub fn tags(&self) -> &BTreeMap<String, String> {
        &self.tags
    }

    /// Smallest and largest finite sample over all channels
    pub fn range(&self) -> Option<(f32, f32)> {
        self.channels
            .iter()
            .flat_map(|c| c.data.iter().copied())
            .filter(|v| v.is_finite())
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}
