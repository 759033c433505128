//! CLI Exit Code Registry
//!
//! Single source of truth for the exit codes of `luminance`. Scripts rely
//! on them.
//!
//! | Code | Meaning                                              |
//! |------|------------------------------------------------------|
//! | 0    | Success                                              |
//! | 1    | Failure (I/O, decode, failed registry check)         |
//! | 2    | Usage error (bad arguments, unknown key, missing file) |

use luminance_config::ConfigError;
use luminance_io::FormatError;

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - the command ran and failed.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, unknown keys, missing input files.
pub const EXIT_USAGE: u8 = 2;

/// Map a settings error to an exit code.
pub fn config_exit_code(err: &ConfigError) -> u8 {
    match err {
        ConfigError::UnknownKey(_) => EXIT_USAGE,
        _ => EXIT_ERROR,
    }
}

/// Map a format error to an exit code.
pub fn format_exit_code(err: &FormatError) -> u8 {
    match err {
        FormatError::UnsupportedFormat(_) => EXIT_USAGE,
        _ => EXIT_ERROR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_distinct() {
        assert_ne!(EXIT_SUCCESS, EXIT_ERROR);
        assert_ne!(EXIT_ERROR, EXIT_USAGE);
    }

    #[test]
    fn test_mapping() {
        assert_eq!(config_exit_code(&ConfigError::UnknownKey("x".into())), EXIT_USAGE);
        assert_eq!(config_exit_code(&ConfigError::NoConfigDir), EXIT_ERROR);
        assert_eq!(format_exit_code(&FormatError::UnsupportedFormat("x".into())), EXIT_USAGE);
        assert_eq!(format_exit_code(&FormatError::EmptyFrame), EXIT_ERROR);
    }
}
