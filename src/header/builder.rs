use crate::{
    Bounds, Error, GpsTimeType, Header, Quantization, Result, Transform, Vector, Version,
    VlrStore,
    feature::{FileSourceId, GpsStandardTime, SyntheticReturnNumbers, WktCrs},
    point::Format,
    raw::header::Evlr,
    utils::FromLasStr,
};
use chrono::NaiveDate;
use uuid::Uuid;

/// Builds headers.
///
/// Every configurable part of a header is a public field here. [Builder::into_header] checks
/// that the pieces fit together.
///
/// ```
/// use las_stream::{Builder, point::Format};
///
/// let mut builder = Builder::from((1, 2));
/// builder.point_format = Format::new(6).unwrap();
/// assert!(builder.into_header().is_err());
/// ```
#[derive(Clone, Debug)]
pub struct Builder {
    /// The file creation date.
    pub date: Option<NaiveDate>,

    /// The file source id, sometimes the flight line.
    pub file_source_id: u16,

    /// The software that created this file.
    pub generating_software: String,

    /// The type of gps time, either week or standard.
    pub gps_time_type: GpsTimeType,

    /// A globally unique identifier.
    pub guid: Uuid,

    /// Are the return numbers in this file synthetic?
    pub has_synthetic_return_numbers: bool,

    /// Is the coordinate reference system WKT?
    pub has_wkt_crs: bool,

    /// Bytes after the header but before the vlrs.
    pub padding: Vec<u8>,

    /// The format that the points will be written in.
    pub point_format: Format,

    /// The system that generated the points.
    pub system_identifier: String,

    /// The scales and offsets that convert coordinates to the integers stored in the file.
    pub transforms: Vector<Transform>,

    /// The las version.
    pub version: Version,

    /// The variable length records.
    pub vlrs: VlrStore,

    /// **las 1.3 and 1.4**: the byte offset of the waveform data packet record.
    pub start_of_waveform_data_packet_record: Option<u64>,

    bounds: Bounds,
    evlr: Option<Evlr>,
    number_of_points: u64,
    number_of_points_by_return: [u64; 15],
    waveform_encoding: u16,
}

impl Builder {
    /// Converts this builder into a header.
    ///
    /// # Examples
    ///
    /// ```
    /// use las_stream::Builder;
    ///
    /// let mut builder = Builder::from((1, 0));
    /// assert!(builder.clone().into_header().is_ok());
    /// builder.file_source_id = 42;
    /// assert!(builder.into_header().is_err());
    /// ```
    pub fn into_header(self) -> Result<Header> {
        if self.file_source_id != 0 {
            self.version.verify_support_for::<FileSourceId>()?;
        }
        if self.has_synthetic_return_numbers {
            self.version.verify_support_for::<SyntheticReturnNumbers>()?;
        }
        if self.gps_time_type.is_standard() {
            self.version.verify_support_for::<GpsStandardTime>()?;
        }
        if self.has_wkt_crs {
            self.version.verify_support_for::<WktCrs>()?;
        }
        if !self.version.supports_point_format(self.point_format) {
            return Err(Error::FormatNotSupportedByVersion {
                version: self.version,
                format: self.point_format,
            });
        }
        let quantization = Quantization::new(self.transforms)?;
        [0u8; 32].from_las_str(&self.system_identifier)?;
        [0u8; 32].from_las_str(&self.generating_software)?;

        let mut header = Header::default();
        header.bounds = self.bounds;
        header.date = self.date;
        header.evlr = self.evlr;
        header.file_source_id = self.file_source_id;
        header.generating_software = self.generating_software;
        header.gps_time_type = self.gps_time_type;
        header.guid = self.guid;
        header.has_synthetic_return_numbers = self.has_synthetic_return_numbers;
        header.has_wkt_crs = self.has_wkt_crs;
        header.number_of_points = self.number_of_points;
        header.number_of_points_by_return = self.number_of_points_by_return;
        header.padding = self.padding;
        header.point_format = self.point_format;
        header.quantization = quantization;
        header.start_of_waveform_data_packet_record = self.start_of_waveform_data_packet_record;
        header.system_identifier = self.system_identifier;
        header.version = self.version;
        header.vlrs = self.vlrs;
        header.waveform_encoding = self.waveform_encoding;
        let _ = header.header_size()?;
        Ok(header)
    }
}

impl Default for Builder {
    fn default() -> Builder {
        Builder::from(Header::default())
    }
}

impl<V: Into<Version>> From<V> for Builder {
    fn from(version: V) -> Builder {
        Builder {
            version: version.into(),
            ..Default::default()
        }
    }
}

impl From<Header> for Builder {
    fn from(header: Header) -> Builder {
        Builder {
            date: header.date,
            file_source_id: header.file_source_id,
            generating_software: header.generating_software,
            gps_time_type: header.gps_time_type,
            guid: header.guid,
            has_synthetic_return_numbers: header.has_synthetic_return_numbers,
            has_wkt_crs: header.has_wkt_crs,
            padding: header.padding,
            point_format: header.point_format,
            system_identifier: header.system_identifier,
            transforms: *header.quantization.transforms(),
            version: header.version,
            vlrs: header.vlrs,
            start_of_waveform_data_packet_record: header.start_of_waveform_data_packet_record,
            bounds: header.bounds,
            evlr: header.evlr,
            number_of_points: header.number_of_points,
            number_of_points_by_return: header.number_of_points_by_return,
            waveform_encoding: header.waveform_encoding,
        }
    }
}
