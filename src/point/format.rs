use crate::{Error, Point, Quantization, Result, Version, raw};
use std::{fmt, io::Cursor};

const IS_COMPRESSED_MASK: u8 = 0x80;
const LEGACY_BASE_LEN: u16 = 20;
// Extended records carry their gps time in the base block, which is 30 bytes with it.
const EXTENDED_BASE_LEN: u16 = 22;
const GPS_TIME_LEN: u16 = 8;
const COLOR_LEN: u16 = 6;
const NIR_LEN: u16 = 2;

#[derive(Clone, Copy, Debug)]
struct Layout {
    gps_time: bool,
    color: bool,
    nir: bool,
    waveform: bool,
    extended: bool,
    min_minor: u8,
}

const fn layout(
    gps_time: bool,
    color: bool,
    nir: bool,
    waveform: bool,
    extended: bool,
    min_minor: u8,
) -> Layout {
    Layout {
        gps_time,
        color,
        nir,
        waveform,
        extended,
        min_minor,
    }
}

const LAYOUTS: [Layout; 11] = [
    layout(false, false, false, false, false, 0),
    layout(true, false, false, false, false, 0),
    layout(false, true, false, false, false, 2),
    layout(true, true, false, false, false, 2),
    layout(true, false, false, true, false, 3),
    layout(true, true, false, true, false, 3),
    layout(true, false, false, false, true, 4),
    layout(true, true, false, false, true, 4),
    layout(true, true, true, false, true, 4),
    layout(true, false, false, true, true, 4),
    layout(true, true, true, true, true, 4),
];

/// A point data record format, one of the eleven defined by las 1.4.
///
/// The optional field groups, the record length, and the earliest las version are all fixed by
/// the format id. What can vary is the number of extra bytes tacked onto each record and whether
/// the records are compressed.
///
/// ```
/// use las_stream::point::Format;
///
/// let format = Format::new(3).unwrap();
/// assert!(format.has_gps_time());
/// assert!(format.has_color());
/// assert_eq!(34, format.len());
/// assert!(Format::new(11).is_err());
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Format {
    id: u8,

    /// The number of bytes after the fixed part of each record.
    pub extra_bytes: u16,

    /// Are the point records laszip compressed?
    pub is_compressed: bool,
}

impl Format {
    /// Every point format, indexed by id, with no extra bytes and no compression.
    pub const FORMATS: [Format; 11] = [
        Format::uncompressed(0),
        Format::uncompressed(1),
        Format::uncompressed(2),
        Format::uncompressed(3),
        Format::uncompressed(4),
        Format::uncompressed(5),
        Format::uncompressed(6),
        Format::uncompressed(7),
        Format::uncompressed(8),
        Format::uncompressed(9),
        Format::uncompressed(10),
    ];

    const fn uncompressed(id: u8) -> Format {
        Format {
            id,
            extra_bytes: 0,
            is_compressed: false,
        }
    }

    /// Looks up a point format by id.
    ///
    /// # Examples
    ///
    /// ```
    /// use las_stream::point::Format;
    /// assert_eq!(1, Format::new(1).unwrap().id());
    /// assert!(Format::new(42).is_err());
    /// ```
    pub fn new(id: u8) -> Result<Format> {
        Format::FORMATS
            .get(usize::from(id))
            .copied()
            .ok_or(Error::UnsupportedPointFormat(id))
    }

    /// Resolves the format byte and record length stored in a header.
    ///
    /// The high bit of the format byte is the compression flag. A record length beyond the
    /// format's fixed length is extra bytes.
    ///
    /// # Examples
    ///
    /// ```
    /// use las_stream::point::Format;
    /// let format = Format::from_header_fields(131, 36).unwrap();
    /// assert_eq!(3, format.id());
    /// assert!(format.is_compressed);
    /// assert_eq!(2, format.extra_bytes);
    /// ```
    pub fn from_header_fields(id_byte: u8, record_length: u16) -> Result<Format> {
        let is_compressed = id_byte & IS_COMPRESSED_MASK == IS_COMPRESSED_MASK;
        let mut format = Format::new(id_byte & !IS_COMPRESSED_MASK)?;
        format.is_compressed = is_compressed;
        let fixed_len = format.fixed_len();
        if record_length < fixed_len {
            return Err(Error::RecordLengthTooShort {
                format: format.id,
                minimum: fixed_len,
                len: record_length,
            });
        }
        format.extra_bytes = record_length - fixed_len;
        Ok(format)
    }

    /// Returns the format id, zero through ten.
    pub fn id(&self) -> u8 {
        self.id
    }

    /// Returns the format byte as stored in a header, with the compression bit.
    ///
    /// # Examples
    ///
    /// ```
    /// use las_stream::point::Format;
    /// let mut format = Format::new(1).unwrap();
    /// assert_eq!(1, format.to_u8());
    /// format.is_compressed = true;
    /// assert_eq!(129, format.to_u8());
    /// ```
    pub fn to_u8(&self) -> u8 {
        if self.is_compressed {
            self.id | IS_COMPRESSED_MASK
        } else {
            self.id
        }
    }

    fn layout(&self) -> Layout {
        LAYOUTS[usize::from(self.id)]
    }

    /// Does this format carry gps time?
    pub fn has_gps_time(&self) -> bool {
        self.layout().gps_time
    }

    /// Does this format carry red, green, and blue?
    pub fn has_color(&self) -> bool {
        self.layout().color
    }

    /// Does this format carry near infrared?
    pub fn has_nir(&self) -> bool {
        self.layout().nir
    }

    /// Does this format carry a wave packet block?
    pub fn has_waveform(&self) -> bool {
        self.layout().waveform
    }

    /// Is this one of the las 1.4 extended formats (six through ten)?
    pub fn is_extended(&self) -> bool {
        self.layout().extended
    }

    /// Returns the earliest las version that defines this format.
    ///
    /// # Examples
    ///
    /// ```
    /// use las_stream::{point::Format, Version};
    /// assert_eq!(Version::new(1, 0), Format::new(1).unwrap().min_version());
    /// assert_eq!(Version::new(1, 3), Format::new(5).unwrap().min_version());
    /// ```
    pub fn min_version(&self) -> Version {
        Version::new(1, self.layout().min_minor)
    }

    /// Returns the record length without extra bytes.
    ///
    /// # Examples
    ///
    /// ```
    /// use las_stream::point::Format;
    /// let mut format = Format::new(6).unwrap();
    /// format.extra_bytes = 3;
    /// assert_eq!(30, format.fixed_len());
    /// ```
    pub fn fixed_len(&self) -> u16 {
        let layout = self.layout();
        let mut len = if layout.extended {
            EXTENDED_BASE_LEN
        } else {
            LEGACY_BASE_LEN
        };
        if layout.gps_time {
            len += GPS_TIME_LEN;
        }
        if layout.color {
            len += COLOR_LEN;
        }
        if layout.nir {
            len += NIR_LEN;
        }
        if layout.waveform {
            len += raw::point::Waveform::LEN;
        }
        len
    }

    /// Returns the full record length, extra bytes included.
    ///
    /// # Examples
    ///
    /// ```
    /// use las_stream::point::Format;
    /// let mut format = Format::new(0).unwrap();
    /// assert_eq!(20, format.len());
    /// format.extra_bytes = 2;
    /// assert_eq!(22, format.len());
    /// ```
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> u16 {
        self.fixed_len() + self.extra_bytes
    }

    /// Decodes one point record.
    ///
    /// `bytes` must be exactly one record long.
    ///
    /// # Examples
    ///
    /// ```
    /// use las_stream::{point::Format, Quantization};
    /// let format = Format::new(1).unwrap();
    /// let point = format.decode(&[0; 28], &Quantization::default()).unwrap();
    /// assert_eq!(Some(0.), point.gps_time);
    /// assert!(format.decode(&[0; 27], &Quantization::default()).is_err());
    /// ```
    pub fn decode(&self, bytes: &[u8], quantization: &Quantization) -> Result<Point> {
        if bytes.len() != usize::from(self.len()) {
            return Err(Error::RecordLength {
                expected: self.len(),
                actual: bytes.len(),
            });
        }
        let raw_point = raw::Point::read_from(Cursor::new(bytes), *self)?;
        Ok(Point::new(raw_point, quantization))
    }

    /// Encodes one point record.
    ///
    /// # Examples
    ///
    /// ```
    /// use las_stream::{point::Format, Point, Quantization};
    /// let format = Format::new(0).unwrap();
    /// let bytes = format.encode(&Point::default(), &Quantization::default()).unwrap();
    /// assert_eq!(20, bytes.len());
    /// ```
    pub fn encode(&self, point: &Point, quantization: &Quantization) -> Result<Vec<u8>> {
        let mut bytes = Vec::with_capacity(usize::from(self.len()));
        point
            .to_raw(*self, quantization)?
            .write_to(&mut bytes, *self)?;
        if bytes.len() != usize::from(self.len()) {
            return Err(Error::RecordLength {
                expected: self.len(),
                actual: bytes.len(),
            });
        }
        Ok(bytes)
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)?;
        if self.is_compressed {
            write!(f, " (compressed)")?;
        }
        Ok(())
    }
}
