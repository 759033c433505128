// Format driver bundle

use std::fmt;
use std::path::Path;

use crate::error::FormatError;
use crate::frame::Frame;
use crate::jpeg::{JpegRead, JpegReader, JPEG_EXTENSIONS};
use crate::ldr::{LdrOptions, LdrWrite, LdrWriter};
use crate::pfs;
use crate::raw::{RawConversionOptions, RawLoaderReader, RawRead, RAW_EXTENSIONS};
use crate::tiff::{TiffRead, TiffReader, TIFF_EXTENSIONS};

pub const PFS_EXTENSION: &str = "pfs";

/// Input format, chosen by file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Tiff,
    Jpeg,
    Raw,
    Pfs,
}

impl InputFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        let ext = ext.as_str();
        if TIFF_EXTENSIONS.contains(&ext) {
            Some(InputFormat::Tiff)
        } else if JPEG_EXTENSIONS.contains(&ext) {
            Some(InputFormat::Jpeg)
        } else if RAW_EXTENSIONS.contains(&ext) {
            Some(InputFormat::Raw)
        } else if ext == PFS_EXTENSION {
            Some(InputFormat::Pfs)
        } else {
            None
        }
    }
}

/// The four format capabilities: TIFF reading, LDR output, RAW input and
/// JPEG reading. `Default` wires the built-in drivers.
pub struct FormatDrivers {
    pub tiff: Box<dyn TiffRead>,
    pub pfs_out: Box<dyn LdrWrite>,
    pub raw: Box<dyn RawRead>,
    pub jpeg: Box<dyn JpegRead>,
}

impl Default for FormatDrivers {
    fn default() -> Self {
        Self {
            tiff: Box::new(TiffReader),
            pfs_out: Box::new(LdrWriter),
            raw: Box::new(RawLoaderReader),
            jpeg: Box::new(JpegReader),
        }
    }
}

impl fmt::Debug for FormatDrivers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormatDrivers").finish_non_exhaustive()
    }
}

impl FormatDrivers {
    pub fn with_tiff(mut self, driver: impl TiffRead + 'static) -> Self {
        self.tiff = Box::new(driver);
        self
    }

    pub fn with_pfs_out(mut self, driver: impl LdrWrite + 'static) -> Self {
        self.pfs_out = Box::new(driver);
        self
    }

    pub fn with_raw(mut self, driver: impl RawRead + 'static) -> Self {
        self.raw = Box::new(driver);
        self
    }

    pub fn with_jpeg(mut self, driver: impl JpegRead + 'static) -> Self {
        self.jpeg = Box::new(driver);
        self
    }

    /// Read any supported input into a frame
    pub fn read(&self, path: &Path, raw_options: &RawConversionOptions) -> Result<Frame, FormatError> {
        let format = InputFormat::from_path(path)
            .ok_or_else(|| FormatError::UnsupportedFormat(path.display().to_string()))?;
        log::info!("reading {} as {:?}", path.display(), format);

        match format {
            InputFormat::Tiff => self.tiff.read_tiff(path),
            InputFormat::Jpeg => self.jpeg.read_jpeg(path),
            InputFormat::Raw => self.raw.read_raw(path, raw_options),
            InputFormat::Pfs => pfs::read_file(path),
        }
    }

    /// Write a frame; `.pfs` keeps the float data, anything else goes
    /// through the LDR output driver
    pub fn write_ldr(&self, frame: &Frame, path: &Path, options: &LdrOptions) -> Result<(), FormatError> {
        let is_pfs = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(PFS_EXTENSION));
        log::info!("writing {}", path.display());

        if is_pfs {
            pfs::write_file(frame, path)
        } else {
            self.pfs_out.write_ldr(frame, path, options)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex};

    struct Solid(f32);

    impl Solid {
        fn frame(&self) -> Frame {
            Frame::from_interleaved_rgb(1, 1, &[self.0; 3]).unwrap()
        }
    }

    impl TiffRead for Solid {
        fn read_tiff(&self, _: &Path) -> Result<Frame, FormatError> {
            Ok(self.frame())
        }
    }

    impl JpegRead for Solid {
        fn read_jpeg(&self, _: &Path) -> Result<Frame, FormatError> {
            Ok(self.frame())
        }
    }

    impl RawRead for Solid {
        fn read_raw(&self, _: &Path, _: &RawConversionOptions) -> Result<Frame, FormatError> {
            Ok(self.frame())
        }
    }

    #[derive(Default, Clone)]
    struct Recorder(Arc<Mutex<Vec<PathBuf>>>);

    impl LdrWrite for Recorder {
        fn write_ldr(&self, _: &Frame, path: &Path, _: &LdrOptions) -> Result<(), FormatError> {
            self.0.lock().unwrap().push(path.to_path_buf());
            Ok(())
        }
    }

    fn stubbed() -> FormatDrivers {
        FormatDrivers::default()
            .with_tiff(Solid(0.1))
            .with_jpeg(Solid(0.2))
            .with_raw(Solid(0.3))
    }

    #[test]
    fn test_input_format_from_path() {
        assert_eq!(InputFormat::from_path(Path::new("a.TIF")), Some(InputFormat::Tiff));
        assert_eq!(InputFormat::from_path(Path::new("a.jpeg")), Some(InputFormat::Jpeg));
        assert_eq!(InputFormat::from_path(Path::new("a.CR2")), Some(InputFormat::Raw));
        assert_eq!(InputFormat::from_path(Path::new("a.nef")), Some(InputFormat::Raw));
        assert_eq!(InputFormat::from_path(Path::new("a.pfs")), Some(InputFormat::Pfs));
        assert_eq!(InputFormat::from_path(Path::new("a.hdr")), None);
        assert_eq!(InputFormat::from_path(Path::new("noext")), None);
    }

    #[test]
    fn test_read_dispatches_by_extension() {
        let drivers = stubbed();
        let options = RawConversionOptions::default();
        let value = |name: &str| drivers.read(Path::new(name), &options).unwrap().rgb().unwrap().0[0];
        assert_eq!(value("x.tiff"), 0.1);
        assert_eq!(value("x.jpg"), 0.2);
        assert_eq!(value("x.dng"), 0.3);
    }

    #[test]
    fn test_read_unknown_extension() {
        let err = stubbed()
            .read(Path::new("x.exr"), &RawConversionOptions::default())
            .unwrap_err();
        assert!(matches!(err, FormatError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_write_routes_pfs_and_ldr() {
        let dir = tempfile::TempDir::new().unwrap();
        let recorder = Recorder::default();
        let drivers = stubbed().with_pfs_out(recorder.clone());
        let frame = Solid(0.5).frame();

        let png = dir.path().join("out.png");
        let pfs_path = dir.path().join("out.PFS");
        drivers.write_ldr(&frame, &png, &LdrOptions::default()).unwrap();
        drivers.write_ldr(&frame, &pfs_path, &LdrOptions::default()).unwrap();

        assert_eq!(*recorder.0.lock().unwrap(), vec![png]);
        assert_eq!(drivers.read(&pfs_path, &RawConversionOptions::default()).unwrap(), frame);
    }
}
