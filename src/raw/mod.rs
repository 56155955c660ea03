//! Raw structures that map directly onto the byte layout of las files.
//!
//! These structures are "dumb": they do as little validation as they can get away with. For
//! example:
//!
//! ```
//! let raw_header = las_stream::raw::Header::default();
//! assert_eq!(0, raw_header.point_data_record_length);
//!
//! let header = las_stream::Header::default();
//! assert_eq!(20, header.point_format().len());
//! ```
//!
//! Prefer [crate::Header] over [raw::Header](Header) unless you need to see exactly what's on
//! disk.

pub mod header;
pub mod point;
pub mod vlr;

pub use self::header::Header;
pub use self::point::Point;
pub use self::vlr::Vlr;

/// The file magic number used for all las files.
pub const LASF: [u8; 4] = *b"LASF";

/// The point data start signature required by las 1.0.
pub const POINT_DATA_START_SIGNATURE: [u8; 2] = [0xDD, 0xCC];
