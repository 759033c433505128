// Version literals
// Dotted numeric versions with an optional pre-release suffix: "2.1.0-alpha1", "0.5".

use std::cmp::Ordering;
use std::fmt;

use crate::error::ConfigError;
use crate::keys::{LUMINANCEVERSION, TMOSETTINGSVERSION};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
    /// Text after the first '-', e.g. "alpha1"
    pub pre: Option<String>,
}

impl Version {
    /// Parse one to three numeric components, missing ones read as zero.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let invalid = || ConfigError::InvalidVersion(text.to_string());
        let text = text.trim();

        let (numbers, pre) = match text.split_once('-') {
            Some((numbers, pre)) => {
                if pre.is_empty() || !pre.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'.') {
                    return Err(invalid());
                }
                (numbers, Some(pre.to_string()))
            }
            None => (text, None),
        };

        let mut parts = [0u32; 3];
        let mut count = 0;
        for component in numbers.split('.') {
            if count == parts.len() || component.is_empty() || !component.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid());
            }
            parts[count] = component.parse().map_err(|_| invalid())?;
            count += 1;
        }

        Ok(Self {
            major: parts[0],
            minor: parts[1],
            patch: parts[2],
            pre,
        })
    }

    /// Version of this build
    pub fn current() -> Self {
        // LUMINANCEVERSION is covered by the registry validation tests
        Self::parse(LUMINANCEVERSION).unwrap_or(Self {
            major: 0,
            minor: 0,
            patch: 0,
            pre: None,
        })
    }

    pub fn is_prerelease(&self) -> bool {
        self.pre.is_some()
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.major, self.minor, self.patch)
            .cmp(&(other.major, other.minor, other.patch))
            .then_with(|| match (&self.pre, &other.pre) {
                (None, None) => Ordering::Equal,
                // a pre-release sorts before its release
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (Some(a), Some(b)) => a.cmp(b),
            })
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if let Some(pre) = &self.pre {
            write!(f, "-{}", pre)?;
        }
        Ok(())
    }
}

/// True when a tone mapping settings file written as `found` can be read by this build
pub fn tmo_settings_compatible(found: &str) -> bool {
    match (Version::parse(found), Version::parse(TMOSETTINGSVERSION)) {
        (Ok(found), Ok(expected)) => found == expected,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_literals_parse() {
        let app = Version::parse(LUMINANCEVERSION).unwrap();
        assert_eq!((app.major, app.minor, app.patch), (2, 1, 0));
        assert_eq!(app.pre.as_deref(), Some("alpha1"));

        let tmo = Version::parse(TMOSETTINGSVERSION).unwrap();
        assert_eq!((tmo.major, tmo.minor, tmo.patch), (0, 5, 0));
        assert!(!tmo.is_prerelease());
    }

    #[test]
    fn test_rejects_malformed() {
        for text in ["", "1..2", "a.b", "1.2.3.4", "1.2-", "1.2-beta 1", "-alpha", "1.x"] {
            assert!(Version::parse(text).is_err(), "accepted {:?}", text);
        }
    }

    #[test]
    fn test_ordering() {
        let v = |s: &str| Version::parse(s).unwrap();
        assert!(v("2.1.0-alpha1") < v("2.1.0"));
        assert!(v("2.0.2") < v("2.1.0-alpha1"));
        assert!(v("2.1.0-alpha1") < v("2.1.0-alpha2"));
        assert!(v("0.5") < v("0.10"));
        assert_eq!(v("0.5"), v("0.5.0"));
    }

    #[test]
    fn test_display() {
        assert_eq!(Version::parse("0.5").unwrap().to_string(), "0.5.0");
        assert_eq!(Version::current().to_string(), LUMINANCEVERSION);
    }

    #[test]
    fn test_tmo_settings_compatible() {
        assert!(tmo_settings_compatible("0.5"));
        assert!(tmo_settings_compatible("0.5.0"));
        assert!(!tmo_settings_compatible("0.4"));
        assert!(!tmo_settings_compatible("garbage"));
    }
}
