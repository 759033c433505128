// Configuration: settings key registry and persisted settings

pub mod error;
pub mod keys;
pub mod recent;
pub mod store;
pub mod version;

pub use error::ConfigError;
pub use keys::{Group, SettingsKey, KEYS, LUMINANCEVERSION, TMOSETTINGSVERSION};
pub use recent::RecentFiles;
pub use store::{SettingValue, SettingsStore};
pub use version::Version;

/// Framework-agnostic RGBA color
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const fn from_rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub fn from_rgba8(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self {
            r: r as f32 / 255.0,
            g: g as f32 / 255.0,
            b: b as f32 / 255.0,
            a: a as f32 / 255.0,
        }
    }

    /// Parse `#rrggbb` or `#rrggbbaa` (leading '#' optional)
    pub fn from_hex_str(hex: &str) -> Option<Self> {
        let hex = hex.trim().trim_start_matches('#');
        if !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        match hex.len() {
            6 => Some(Self::from_rgba8(channel(0)?, channel(2)?, channel(4)?, 255)),
            8 => Some(Self::from_rgba8(channel(0)?, channel(2)?, channel(4)?, channel(6)?)),
            _ => None,
        }
    }

    /// `#rrggbb` for opaque colors, `#rrggbbaa` otherwise
    pub fn to_hex(&self) -> String {
        let q = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        let (r, g, b, a) = (q(self.r), q(self.g), q(self.b), q(self.a));
        if a == 255 {
            format!("#{:02x}{:02x}{:02x}", r, g, b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", r, g, b, a)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_to_color() {
        let color = Color::from_hex_str("#3b82f6").unwrap();
        assert!((color.r - 0.231).abs() < 0.01);
        assert!((color.g - 0.510).abs() < 0.01);
        assert!((color.b - 0.965).abs() < 0.01);
        assert_eq!(color.a, 1.0);
    }

    #[test]
    fn test_hex_with_alpha() {
        let color = Color::from_hex_str("ff000080").unwrap();
        assert_eq!(color.r, 1.0);
        assert!((color.a - 0.502).abs() < 0.01);
        assert_eq!(color.to_hex(), "#ff000080");
    }

    #[test]
    fn test_invalid_hex() {
        assert!(Color::from_hex_str("#fff").is_none());
        assert!(Color::from_hex_str("#gg0000").is_none());
        assert!(Color::from_hex_str("#ééé").is_none());
    }

    #[test]
    fn test_to_hex_opaque() {
        assert_eq!(Color::from_rgb(0.0, 1.0, 0.0).to_hex(), "#00ff00");
    }
}
