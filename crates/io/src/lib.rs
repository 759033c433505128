// File I/O: floating point frames and the format drivers

pub mod drivers;
pub mod error;
pub mod frame;
pub mod jpeg;
pub mod ldr;
pub mod pfs;
mod raster;
pub mod raw;
pub mod tiff;

pub use drivers::{FormatDrivers, InputFormat};
pub use error::FormatError;
pub use frame::{Channel, Frame};
pub use jpeg::{JpegRead, JpegReader};
pub use ldr::{LdrOptions, LdrWrite, LdrWriter};
pub use raw::{RawConversionOptions, RawLoaderReader, RawRead, WhiteBalance};
pub use tiff::{TiffRead, TiffReader};
