//! Read and write [ASPRS LAS](https://www.asprs.org/committee-general/laser-las-file-format-exchange-activities.html)
//! point clouds, versions 1.0 through 1.4.
//!
//! # Reading
//!
//! Create a [Reader] from anything that implements `Read` and `Seek`:
//!
//! ```
//! use std::io::Cursor;
//! use las_stream::{Header, Point, Reader, Writer};
//!
//! # let mut writer = Writer::new(Cursor::new(Vec::new()), Header::default()).unwrap();
//! # writer.write_point(Point { x: 1., y: 2., z: 3., ..Default::default() }).unwrap();
//! # let bytes = writer.into_inner().unwrap().into_inner();
//! let mut reader = Reader::new(Cursor::new(bytes)).unwrap();
//! for point in reader.points() {
//!     let point = point.unwrap();
//!     println!("({}, {}, {})", point.x, point.y, point.z);
//! }
//! ```
//!
//! [Reader::from_path] opens a file and buffers it. Inputs that can't seek go through
//! [Reader::from_stream].
//!
//! ## Prefer `BufRead`
//!
//! Your performance will be better if your `Read` is actually a `BufRead`. [Reader::from_path]
//! takes care of this for you, but [Reader::new] doesn't.
//!
//! # Writing
//!
//! Create a [Writer] from a `Write` and a [Header]. Use a [Builder] to customize the header:
//!
//! ```
//! use std::io::Cursor;
//! use las_stream::{Builder, Point, Writer, point::Format};
//!
//! let mut builder = Builder::from((1, 4));
//! builder.point_format = Format::new(6).unwrap();
//! let header = builder.into_header().unwrap();
//!
//! let mut writer = Writer::new(Cursor::new(Vec::new()), header).unwrap();
//! writer
//!     .write_point(Point { x: 1., y: 2., z: 3., gps_time: Some(0.), ..Default::default() })
//!     .unwrap();
//! writer.close().unwrap();
//! ```
//!
//! [Writer::from_path] uses the file extension to decide whether to compress: `.laz` files are
//! compressed, everything else isn't. Compression needs the `laz` feature:
//!
//! ```
//! use std::io::Cursor;
//! use las_stream::{Builder, Writer};
//!
//! let mut builder = Builder::from((1, 4));
//! builder.point_format.is_compressed = true;
//! let result = Writer::new(Cursor::new(Vec::new()), builder.into_header().unwrap());
//! assert_eq!(cfg!(feature = "laz"), result.is_ok());
//! ```
//!
//! # Variable length records
//!
//! A header's [VlrStore] keeps each record's raw bytes and, when a [ConverterRegistry] knows the
//! record's key, a decoded value. The default registry understands the coordinate reference
//! system records (see [crs]) and the laszip record (see [compression]).

#![deny(missing_docs, unsafe_code)]
#![warn(
    missing_debug_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unused_import_braces,
    unused_qualifications
)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod compression;
pub mod crs;
pub mod feature;
pub mod header;
pub mod point;
pub mod raw;
pub mod reader;
pub mod vlr;
pub mod writer;

mod bounds;
mod color;
mod error;
mod gps_time_type;
mod transform;
mod utils;
mod vector;
mod version;

pub use crate::{
    bounds::Bounds,
    color::Color,
    error::Error,
    feature::Feature,
    gps_time_type::GpsTimeType,
    header::{Builder, Header},
    point::Point,
    reader::{Reader, ReaderOptions},
    transform::{Quantization, Transform},
    vector::Vector,
    version::Version,
    vlr::{ConverterRegistry, Vlr, VlrStore},
    writer::{Writer, WriterOptions},
};

/// Crate-specific result type.
pub type Result<T> = std::result::Result<T, Error>;
