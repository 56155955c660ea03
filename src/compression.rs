//! The laszip vlr, which says how compressed point data were compressed.
//!
//! [CompressionHeader] is a plain view of the vlr payload, parsed here without the `laz`
//! feature so that any reader can tell how a file is compressed. Building the vlr and actually
//! compressing or decompressing points is left to the `laz` crate, behind the feature:
//!
//! ```toml
//! [dependencies]
//! las-stream = { version = "*", features = ["laz"] }
//! ```

use crate::{
    Error, Result,
    vlr::{Context, Converter, DecodedValue},
};
#[cfg(feature = "laz")]
use crate::{Header, Vlr, point::Format};
use byteorder::{LittleEndian, ReadBytesExt};
#[cfg(feature = "laz")]
use laz::{LazItemRecordBuilder, LazItemType, LazVlr};
use std::io::Cursor;

/// The user id of the laszip vlr.
pub const LASZIP_USER_ID: &str = "laszip encoded";
/// The record id of the laszip vlr.
pub const LASZIP_RECORD_ID: u16 = 22204;
/// The description of the laszip vlr.
pub const LASZIP_DESCRIPTION: &str = "http://laszip.org";

const VARIABLE_CHUNK_SIZE: u32 = u32::MAX;

/// How the point records are laid out in the compressed stream.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum CompressionMode {
    /// Not compressed at all.
    #[default]
    None,
    /// One long stream of compressed points.
    PointWise,
    /// Independently compressed chunks of points, legacy point formats.
    PointWiseChunked,
    /// Chunks with each attribute in its own layer, extended point formats.
    LayeredChunked,
}

impl CompressionMode {
    fn from_u16(n: u16) -> Result<CompressionMode> {
        match n {
            0 => Ok(CompressionMode::None),
            1 => Ok(CompressionMode::PointWise),
            2 => Ok(CompressionMode::PointWiseChunked),
            3 => Ok(CompressionMode::LayeredChunked),
            _ => Err(Error::InvalidCompressionHeader(format!(
                "unknown compressor {}",
                n
            ))),
        }
    }

    /// Are the points compressed in chunks?
    pub fn is_chunked(&self) -> bool {
        matches!(
            self,
            CompressionMode::PointWiseChunked | CompressionMode::LayeredChunked
        )
    }
}

/// The kind of data an item compresses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum ItemType {
    Byte,
    Point10,
    GpsTime,
    Rgb12,
    WavePacket13,
    Point14,
    Rgb14,
    RgbNir14,
    WavePacket14,
    Byte14,
    /// An item type this crate doesn't know about.
    Other(u16),
}

impl From<u16> for ItemType {
    fn from(n: u16) -> ItemType {
        match n {
            0 => ItemType::Byte,
            6 => ItemType::Point10,
            7 => ItemType::GpsTime,
            8 => ItemType::Rgb12,
            9 => ItemType::WavePacket13,
            10 => ItemType::Point14,
            11 => ItemType::Rgb14,
            12 => ItemType::RgbNir14,
            13 => ItemType::WavePacket14,
            14 => ItemType::Byte14,
            _ => ItemType::Other(n),
        }
    }
}

/// One compressed attribute group.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Item {
    /// What's compressed.
    pub item_type: ItemType,
    /// The uncompressed size in bytes.
    pub size: u16,
    /// The version of the item's compressor.
    pub version: u16,
}

/// The decoded laszip vlr.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompressionHeader {
    /// How the points are laid out.
    pub mode: CompressionMode,
    /// The entropy coder, zero is arithmetic coding.
    pub coder: u16,
    /// The laszip version that wrote the file.
    pub version: (u8, u8, u16),
    /// Reserved option bits.
    pub options: u32,
    /// Points per chunk, `u32::MAX` for variable-sized chunks.
    pub chunk_size: u32,
    /// Minus one if unused.
    pub number_of_special_evlrs: i64,
    /// Minus one if unused.
    pub offset_to_special_evlrs: i64,
    /// The compressed attribute groups, in record order.
    pub items: Vec<Item>,
}

impl CompressionHeader {
    /// Describes the laszip vlr this crate writes for a point format.
    ///
    /// # Examples
    ///
    /// ```
    /// #[cfg(feature = "laz")]
    /// {
    /// use las_stream::compression::{CompressionHeader, CompressionMode};
    /// use las_stream::point::Format;
    ///
    /// let header = CompressionHeader::for_format(Format::new(3).unwrap()).unwrap();
    /// assert_eq!(CompressionMode::PointWiseChunked, header.mode);
    /// assert_eq!(34, header.record_length());
    /// assert!(CompressionHeader::for_format(Format::new(4).unwrap()).is_err());
    /// }
    /// ```
    #[cfg(feature = "laz")]
    pub fn for_format(format: Format) -> Result<CompressionHeader> {
        CompressionHeader::read_from(&laszip_vlr(format)?.data)
    }

    /// Parses a laszip vlr payload.
    pub fn read_from(data: &[u8]) -> Result<CompressionHeader> {
        let mut read = Cursor::new(data);
        let parse = |read: &mut Cursor<&[u8]>| -> std::io::Result<(u16, CompressionHeader)> {
            let mode = read.read_u16::<LittleEndian>()?;
            let coder = read.read_u16::<LittleEndian>()?;
            let version = (
                read.read_u8()?,
                read.read_u8()?,
                read.read_u16::<LittleEndian>()?,
            );
            let options = read.read_u32::<LittleEndian>()?;
            let chunk_size = read.read_u32::<LittleEndian>()?;
            let number_of_special_evlrs = read.read_i64::<LittleEndian>()?;
            let offset_to_special_evlrs = read.read_i64::<LittleEndian>()?;
            let number_of_items = read.read_u16::<LittleEndian>()?;
            let mut items = Vec::with_capacity(usize::from(number_of_items));
            for _ in 0..number_of_items {
                items.push(Item {
                    item_type: read.read_u16::<LittleEndian>()?.into(),
                    size: read.read_u16::<LittleEndian>()?,
                    version: read.read_u16::<LittleEndian>()?,
                });
            }
            Ok((
                mode,
                CompressionHeader {
                    mode: CompressionMode::None,
                    coder,
                    version,
                    options,
                    chunk_size,
                    number_of_special_evlrs,
                    offset_to_special_evlrs,
                    items,
                },
            ))
        };
        let (mode, mut header) = parse(&mut read)
            .map_err(|err| Error::InvalidCompressionHeader(err.to_string()))?;
        header.mode = CompressionMode::from_u16(mode)?;
        Ok(header)
    }

    /// Returns the uncompressed record length described by the items.
    pub fn record_length(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.size)).sum()
    }

    /// Returns true if chunks have a variable number of points.
    pub fn has_variable_chunks(&self) -> bool {
        self.chunk_size == VARIABLE_CHUNK_SIZE
    }
}

/// Builds the laszip vlr for a point format.
///
/// Legacy formats get version 2 items and point-wise chunks, extended formats get version 3
/// items and layered chunks. Waveform formats can't be compressed.
///
/// # Examples
///
/// ```
/// #[cfg(feature = "laz")]
/// {
/// use las_stream::compression::{self, LASZIP_RECORD_ID};
/// use las_stream::point::Format;
///
/// let vlr = compression::laszip_vlr(Format::new(7).unwrap()).unwrap();
/// assert_eq!(LASZIP_RECORD_ID, vlr.record_id);
/// assert_eq!(46, vlr.data.len());
/// }
/// ```
#[cfg(feature = "laz")]
pub fn laszip_vlr(format: Format) -> Result<Vlr> {
    if format.has_waveform() {
        return Err(Error::UnsupportedCompressedFormat(format.id()));
    }
    let mut laz_items = LazItemRecordBuilder::new();
    if format.is_extended() {
        let _ = laz_items.add_item(LazItemType::Point14);
        if format.has_nir() {
            let _ = laz_items.add_item(LazItemType::RGBNIR14);
        } else if format.has_color() {
            let _ = laz_items.add_item(LazItemType::RGB14);
        }
        if format.extra_bytes > 0 {
            let _ = laz_items.add_item(LazItemType::Byte14(format.extra_bytes));
        }
    } else {
        let _ = laz_items.add_item(LazItemType::Point10);
        if format.has_gps_time() {
            let _ = laz_items.add_item(LazItemType::GpsTime);
        }
        if format.has_color() {
            let _ = laz_items.add_item(LazItemType::RGB12);
        }
        if format.extra_bytes > 0 {
            let _ = laz_items.add_item(LazItemType::Byte(format.extra_bytes));
        }
    }
    let laz_vlr = LazVlr::from_laz_items(laz_items.build());
    let mut data = Vec::new();
    laz_vlr.write_to(&mut data)?;
    let mut vlr = Vlr::new(LazVlr::USER_ID, LazVlr::RECORD_ID, data);
    vlr.description = LazVlr::DESCRIPTION.to_string();
    Ok(vlr)
}

#[cfg(feature = "laz")]
impl TryFrom<&Vlr> for LazVlr {
    type Error = Error;

    fn try_from(vlr: &Vlr) -> Result<LazVlr> {
        LazVlr::from_buffer(&vlr.data).map_err(Error::from)
    }
}

#[cfg(feature = "laz")]
impl Header {
    /// Returns the `laz` crate's view of the laszip vlr.
    pub(crate) fn laz_vlr(&self) -> Result<LazVlr> {
        self.vlrs()
            .get(LASZIP_USER_ID, LASZIP_RECORD_ID)
            .ok_or(Error::MissingCompressionHeader)
            .and_then(LazVlr::try_from)
    }
}

/// Converts the laszip vlr to and from a [CompressionHeader].
///
/// Only the header this crate writes for the context's point format can be encoded, since the
/// payload itself comes from the `laz` crate.
#[derive(Clone, Copy, Debug, Default)]
pub struct CompressionConverter;

impl Converter for CompressionConverter {
    fn decode(&self, _: &Context<'_>, data: &[u8]) -> Result<DecodedValue> {
        CompressionHeader::read_from(data).map(DecodedValue::new)
    }

    #[cfg(feature = "laz")]
    fn encode(&self, context: &Context<'_>, value: &DecodedValue) -> Result<Vec<u8>> {
        let compression = value.downcast_ref::<CompressionHeader>().ok_or_else(|| {
            Error::InvalidCompressionHeader("the value is not a compression header".to_string())
        })?;
        let vlr = laszip_vlr(context.point_format())?;
        if CompressionHeader::read_from(&vlr.data)? == *compression {
            Ok(vlr.data)
        } else {
            Err(Error::InvalidCompressionHeader(format!(
                "only the laszip vlr for point format {} can be written",
                context.point_format()
            )))
        }
    }

    #[cfg(not(feature = "laz"))]
    fn encode(&self, _: &Context<'_>, _: &DecodedValue) -> Result<Vec<u8>> {
        Err(Error::LaszipNotEnabled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// The laszip vlr payload for point format 1.
    const FORMAT_1: [u8; 46] = [
        2, 0, 0, 0, 2, 2, 0, 0, 0, 0, 0, 0, 0x50, 0xc3, 0, 0, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
        0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 2, 0, 6, 0, 20, 0, 2, 0, 7, 0,
        8, 0, 2, 0,
    ];

    #[test]
    fn read_without_laz() {
        let header = CompressionHeader::read_from(&FORMAT_1).unwrap();
        assert_eq!(CompressionMode::PointWiseChunked, header.mode);
        assert_eq!((2, 2, 0), header.version);
        assert_eq!(50_000, header.chunk_size);
        assert!(!header.has_variable_chunks());
        assert_eq!(-1, header.number_of_special_evlrs);
        assert_eq!(
            vec![
                Item {
                    item_type: ItemType::Point10,
                    size: 20,
                    version: 2,
                },
                Item {
                    item_type: ItemType::GpsTime,
                    size: 8,
                    version: 2,
                },
            ],
            header.items
        );
        assert_eq!(28, header.record_length());
    }

    #[test]
    fn bad_payloads() {
        assert!(CompressionHeader::read_from(&[2, 0]).is_err());
        let mut bytes = FORMAT_1;
        bytes[0] = 9;
        assert!(CompressionHeader::read_from(&bytes).is_err());
    }

    #[cfg(not(feature = "laz"))]
    #[test]
    fn encode_needs_laz() {
        let context = Context::new(crate::Version::new(1, 2), crate::point::Format::default());
        let value = DecodedValue::new(CompressionHeader::read_from(&FORMAT_1).unwrap());
        assert!(matches!(
            CompressionConverter.encode(&context, &value),
            Err(Error::LaszipNotEnabled)
        ));
    }

    #[cfg(feature = "laz")]
    mod with_laz {
        use super::*;

        #[test]
        fn payload_comes_from_laz() {
            let vlr = laszip_vlr(Format::new(1).unwrap()).unwrap();
            assert_eq!(LASZIP_USER_ID, vlr.user_id);
            assert_eq!(LASZIP_DESCRIPTION, vlr.description);
            assert_eq!(FORMAT_1.to_vec(), vlr.data);
            assert!(LazVlr::try_from(&vlr).is_ok());
        }

        #[test]
        fn items_match_record_lengths() {
            for format in Format::FORMATS.into_iter().filter(|f| !f.has_waveform()) {
                let mut format = format;
                format.extra_bytes = 3;
                let header = CompressionHeader::for_format(format).unwrap();
                assert_eq!(u64::from(format.len()), header.record_length(), "{}", format);
                let expected = if format.is_extended() {
                    CompressionMode::LayeredChunked
                } else {
                    CompressionMode::PointWiseChunked
                };
                assert_eq!(expected, header.mode);
            }
        }

        #[test]
        fn waveforms_are_unsupported() {
            for id in [4, 5, 9, 10] {
                assert!(matches!(
                    laszip_vlr(Format::new(id).unwrap()),
                    Err(Error::UnsupportedCompressedFormat(n)) if n == id
                ));
            }
        }

        #[test]
        fn encode_only_the_default_header() {
            let format = Format::new(7).unwrap();
            let context = Context::new(crate::Version::new(1, 4), format);
            let header = CompressionHeader::for_format(format).unwrap();
            let bytes = CompressionConverter
                .encode(&context, &DecodedValue::new(header.clone()))
                .unwrap();
            assert_eq!(laszip_vlr(format).unwrap().data, bytes);

            let other = CompressionHeader {
                chunk_size: 10,
                ..header
            };
            assert!(CompressionConverter
                .encode(&context, &DecodedValue::new(other))
                .is_err());
        }
    }
}
