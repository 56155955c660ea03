use crate::{Transform, Version, crs::GeoTiffData, point::{Classification, Format}};
use thiserror::Error;

/// Crate-specific error enum.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The first four bytes of the input were not `LASF`.
    #[error("the file signature must be LASF, found {0:?}")]
    BadMagic([u8; 4]),

    /// The input ended before a field or record could be read.
    #[error("input ended at byte {offset} while reading {field}")]
    Truncated {
        /// The byte offset where the read started.
        offset: u64,
        /// The field that was being read.
        field: &'static str,
    },

    /// The point format id is outside of zero through ten.
    #[error("point format {0} is not supported")]
    UnsupportedPointFormat(u8),

    /// This version does not support the feature.
    #[error("version {version} does not support {feature}")]
    UnsupportedFeature {
        /// The version that does not support the feature.
        version: Version,
        /// The feature that is not supported.
        feature: &'static str,
    },

    /// This version does not support the point format.
    #[error("version {version} does not support point format {format}")]
    FormatNotSupportedByVersion {
        /// The las version.
        version: Version,
        /// The point format.
        format: Format,
    },

    /// A variable length record claims more bytes than the input holds.
    #[error(
        "vlr {user_id}/{record_id} declares {declared} bytes but only {available} are available"
    )]
    MalformedVlr {
        /// The user id of the record.
        user_id: String,
        /// The record id of the record.
        record_id: u16,
        /// The length in the record header.
        declared: u16,
        /// The number of bytes left before the point data.
        available: u64,
    },

    /// A converter could not decode a variable length record.
    #[error("could not decode vlr {user_id}/{record_id}: {message}")]
    ConverterDecode {
        /// The user id of the record.
        user_id: String,
        /// The record id of the record.
        record_id: u16,
        /// What went wrong.
        message: String,
    },

    /// A converter could not encode a value into a variable length record.
    #[error("could not encode vlr {user_id}/{record_id}: {message}")]
    ConverterEncode {
        /// The user id of the record.
        user_id: String,
        /// The record id of the record.
        record_id: u16,
        /// What went wrong.
        message: String,
    },

    /// The offset to the point data points inside the header or vlrs.
    #[error("the offset to point data ({offset}) is smaller than the end of the vlrs ({minimum})")]
    OffsetToPointDataTooSmall {
        /// The offset in the header.
        offset: u32,
        /// The smallest legal offset.
        minimum: u64,
    },

    /// The number of bytes does not match the point record length.
    #[error("expected a point record of {expected} bytes, got {actual}")]
    RecordLength {
        /// The record length of the point format.
        expected: u16,
        /// The number of bytes provided.
        actual: usize,
    },

    /// The point data record length is shorter than the point format requires.
    #[error("point format {format} requires at least {minimum} bytes per record, the header says {len}")]
    RecordLengthTooShort {
        /// The point format.
        format: u8,
        /// The fixed record length of the format.
        minimum: u16,
        /// The record length in the header.
        len: u16,
    },

    /// A scale factor was zero.
    #[error("the {axis} scale factor is zero")]
    ZeroScale {
        /// The axis, `x`, `y`, or `z`.
        axis: &'static str,
    },

    /// The value can't be represented as an i32 with this transform.
    #[error("the transform {transform} cannot convert {n} into an i32")]
    InverseTransform {
        /// The float that could not be converted.
        n: f64,
        /// The transform that was being applied.
        transform: Transform,
    },

    /// The point's optional attributes don't match the point format.
    #[error("the point attributes do not match point format {0}")]
    PointAttributesDoNotMatch(Format),

    /// The return number doesn't fit into the point format's bits.
    #[error("return number {return_number} does not fit point format {format}")]
    ReturnNumber {
        /// The return number.
        return_number: u8,
        /// The point format id.
        format: u8,
    },

    /// The number of returns doesn't fit into the point format's bits.
    #[error("number of returns {number_of_returns} does not fit point format {format}")]
    NumberOfReturns {
        /// The number of returns.
        number_of_returns: u8,
        /// The point format id.
        format: u8,
    },

    /// The classification doesn't fit into five bits.
    #[error("classification {classification} does not fit point format {format}")]
    Classification {
        /// The classification code.
        classification: u8,
        /// The point format id.
        format: u8,
    },

    /// Legacy formats reserve classification 12 for overlap points, so only an unclassified
    /// point can be marked as overlap and no point can carry class 12 itself.
    #[error(
        "legacy point formats store overlap as class 12, can't write {classification:?} with overlap {is_overlap}"
    )]
    OverlapClassification {
        /// The classification.
        classification: Classification,
        /// The overlap flag.
        is_overlap: bool,
    },

    /// The scan angle rank doesn't fit into an i8.
    #[error("scan angle rank {0} does not fit into a signed byte")]
    ScanAngleRank(i16),

    /// The scanner channel is greater than three.
    #[error("scanner channel {0} is greater than three")]
    ScannerChannel(u8),

    /// The extra bytes on the point don't match the format.
    #[error("point format expects {expected} extra bytes, the point has {actual}")]
    ExtraBytes {
        /// The number of extra bytes in the format.
        expected: u16,
        /// The number of extra bytes on the point.
        actual: usize,
    },

    /// The string is not ASCII.
    #[error("the string is not ascii: {0}")]
    NotAscii(String),

    /// The string is too long for its fixed-width field.
    #[error("the string is too long for a field of {len} bytes: {string}")]
    StringTooLong {
        /// The string.
        string: String,
        /// The width of the field.
        len: usize,
    },

    /// The vlr payload is too long for a u16 length.
    #[error("the vlr payload is too long: {0} bytes")]
    VlrTooLong(usize),

    /// The reader is closed.
    #[error("the reader is closed")]
    ClosedReader,

    /// The writer is closed.
    #[error("the writer is closed")]
    ClosedWriter,

    /// Seeking was requested on an input that can't seek.
    #[error("the input does not support seeking")]
    NotSeekable,

    /// The header says the data are compressed but has no compression vlr.
    #[error("the point data are compressed but there is no laszip vlr")]
    MissingCompressionHeader,

    /// The compression header could not be parsed.
    #[error("invalid compression header: {0}")]
    InvalidCompressionHeader(String),

    /// Compressed point data can't be produced for this point format.
    #[error("compression is not supported for point format {0}")]
    UnsupportedCompressedFormat(u8),

    /// The point data are compressed, but the `laz` feature is not enabled.
    #[error("the point data are compressed but the laz feature is not enabled")]
    LaszipNotEnabled,

    /// The WKT does not contain a readable EPSG code.
    #[error("the WKT CRS could not be read")]
    UnreadableWktCrs,

    /// The GeoTIFF keys could not be read or do not name an EPSG code.
    #[error("the GeoTIFF CRS could not be read")]
    UnreadableGeoTiffCrs,

    /// The GeoTIFF model type is user defined.
    #[error("the CRS is user defined")]
    UserDefinedCrs,

    /// A GeoTIFF key points at a record that isn't a parameter record.
    #[error("GeoTIFF key {0} points at an unknown location")]
    UndefinedDataForGeoTiffKey(u16),

    /// Only short-valued GeoTIFF keys are supported here.
    #[error("GeoTIFF key data {0:?} can only be a short here")]
    UnimplementedForGeoTiffStringAndDoubleData(GeoTiffData),

    /// [std::io::Error]
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// [laz::LasZipError]
    #[cfg(feature = "laz")]
    #[error(transparent)]
    Laszip(#[from] laz::LasZipError),

    /// [std::num::TryFromIntError]
    #[error(transparent)]
    TryFromInt(#[from] std::num::TryFromIntError),
}
