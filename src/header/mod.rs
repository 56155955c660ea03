//! A las header describes the points that follow it.
//!
//! Headers come from two places: a [Reader](crate::Reader) parses one from a file, or a
//! [Builder] creates one to hand to a [Writer](crate::Writer). Readers only lend out
//! `&Header`, and writers work on their own copy, so a header you are holding never changes
//! under you.
//!
//! ```
//! use las_stream::{Builder, Header};
//!
//! let mut builder = Builder::from((1, 4));
//! builder.system_identifier = "my scanner".to_string();
//! let header = builder.into_header().unwrap();
//! assert_eq!("my scanner", header.system_identifier());
//! assert_eq!(375, header.offset_to_point_data());
//! ```

mod builder;

pub use self::builder::Builder;

use crate::{
    Bounds, ConverterRegistry, GpsTimeType, Quantization, Result, Transform, Vector,
    Version, Vlr, VlrStore,
    compression::{CompressionHeader, LASZIP_RECORD_ID, LASZIP_USER_ID},
    error::Error,
    feature::LargeFiles,
    point::Format,
    raw::{
        self, POINT_DATA_START_SIGNATURE,
        header::{Evlr, LargeFile},
    },
    utils::{AsLasStr, FromLasStr, TrackedRead},
    vlr::Context,
};
use chrono::{Datelike, NaiveDate, Utc};
use log::warn;
use std::io::{self, Read, Write};
use uuid::Uuid;

const SYNTHETIC_RETURN_NUMBERS_MASK: u16 = 0b1000;
const WKT_CRS_MASK: u16 = 0b1_0000;
// Waveform location bits, kept as they were read.
const WAVEFORM_MASK: u16 = 0b0110;

/// Metadata describing the layout, source, and interpretation of the points.
#[derive(Clone, Debug)]
pub struct Header {
    bounds: Bounds,
    date: Option<NaiveDate>,
    evlr: Option<Evlr>,
    file_source_id: u16,
    generating_software: String,
    gps_time_type: GpsTimeType,
    guid: Uuid,
    has_synthetic_return_numbers: bool,
    has_wkt_crs: bool,
    number_of_points: u64,
    number_of_points_by_return: [u64; 15],
    padding: Vec<u8>,
    point_format: Format,
    quantization: Quantization,
    start_of_waveform_data_packet_record: Option<u64>,
    system_identifier: String,
    version: Version,
    vlrs: VlrStore,
    waveform_encoding: u16,
}

impl Header {
    /// Reads a header and its vlrs, decoding the vlrs with the default converters.
    ///
    /// Afterwards `read` is positioned at the first point record.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::io::Cursor;
    /// use las_stream::Header;
    ///
    /// let mut bytes = Vec::new();
    /// Header::default().write_to(&mut bytes).unwrap();
    /// let header = Header::read_from(Cursor::new(bytes)).unwrap();
    /// assert_eq!(0, header.number_of_points());
    /// ```
    pub fn read_from<R: Read>(read: R) -> Result<Header> {
        Header::read_with(read, &ConverterRegistry::default())
    }

    /// Reads a header, decoding its vlrs with the given converters.
    pub fn read_with<R: Read>(read: R, registry: &ConverterRegistry) -> Result<Header> {
        Header::read_tracked(&mut TrackedRead::new(read), registry)
    }

    pub(crate) fn read_tracked<R: Read>(
        read: &mut TrackedRead<R>,
        registry: &ConverterRegistry,
    ) -> Result<Header> {
        let raw_header = raw::Header::read_tracked(read)?;
        let point_format = Format::from_header_fields(
            raw_header.point_data_record_format,
            raw_header.point_data_record_length,
        )?;
        let quantization = Quantization::new(Vector {
            x: Transform {
                scale: raw_header.x_scale_factor,
                offset: raw_header.x_offset,
            },
            y: Transform {
                scale: raw_header.y_scale_factor,
                offset: raw_header.y_offset,
            },
            z: Transform {
                scale: raw_header.z_scale_factor,
                offset: raw_header.z_offset,
            },
        })?;
        let (number_of_points, number_of_points_by_return) = point_counts(&raw_header);

        let offset_to_point_data = u64::from(raw_header.offset_to_point_data);
        let mut vlrs = VlrStore::default();
        for _ in 0..raw_header.number_of_variable_length_records {
            let available = offset_to_point_data.saturating_sub(read.position());
            let raw_vlr = raw::Vlr::read_tracked(read, available)?;
            vlrs.add(Vlr::from_raw(raw_vlr));
        }
        let position = read.position();
        if position > offset_to_point_data {
            return Err(Error::OffsetToPointDataTooSmall {
                offset: raw_header.offset_to_point_data,
                minimum: position,
            });
        }
        // The las 1.0 start signature lives in these bytes and is written back on demand.
        let gap = offset_to_point_data - position;
        let skipped = read.field("bytes before the point data", |r| {
            io::copy(&mut r.by_ref().take(gap), &mut io::sink())
        })?;
        if skipped < gap {
            return Err(Error::Truncated {
                offset: position + skipped,
                field: "bytes before the point data",
            });
        }

        vlrs.decode_all(registry, Context::new(raw_header.version, point_format));

        Ok(Header {
            bounds: Bounds {
                min: Vector::new(raw_header.min_x, raw_header.min_y, raw_header.min_z),
                max: Vector::new(raw_header.max_x, raw_header.max_y, raw_header.max_z),
            },
            date: NaiveDate::from_yo_opt(
                i32::from(raw_header.file_creation_year),
                u32::from(raw_header.file_creation_day_of_year),
            ),
            evlr: raw_header.evlr,
            file_source_id: raw_header.file_source_id,
            generating_software: raw_header.generating_software.as_las_string(),
            gps_time_type: raw_header.global_encoding.into(),
            guid: Uuid::from_bytes(raw_header.guid),
            has_synthetic_return_numbers: raw_header.global_encoding
                & SYNTHETIC_RETURN_NUMBERS_MASK
                != 0,
            has_wkt_crs: raw_header.global_encoding & WKT_CRS_MASK != 0,
            number_of_points,
            number_of_points_by_return,
            padding: raw_header.padding,
            point_format,
            quantization,
            start_of_waveform_data_packet_record: raw_header.start_of_waveform_data_packet_record,
            system_identifier: raw_header.system_identifier.as_las_string(),
            version: raw_header.version,
            vlrs,
            waveform_encoding: raw_header.global_encoding & WAVEFORM_MASK,
        })
    }

    /// Writes this header, its vlrs, and the las 1.0 start signature.
    ///
    /// The header size and offset to point data are computed from the version, padding, and
    /// vlrs, never taken from what was read.
    ///
    /// # Examples
    ///
    /// ```
    /// use las_stream::{Builder, Vlr};
    ///
    /// let mut builder = Builder::from((1, 0));
    /// builder.vlrs.add(Vlr::new("gadomski", 1, vec![1, 2, 3]));
    /// let header = builder.into_header().unwrap();
    /// let mut bytes = Vec::new();
    /// header.write_to(&mut bytes).unwrap();
    /// assert_eq!(227 + 57 + 2, bytes.len());
    /// assert_eq!(header.offset_to_point_data(), bytes.len() as u64);
    /// ```
    pub fn write_to<W: Write>(&self, mut write: W) -> Result<()> {
        self.to_raw()?.write_to(&mut write)?;
        for vlr in &self.vlrs {
            vlr.to_raw()?.write_to(&mut write)?;
        }
        if self.version.requires_point_data_start_signature() {
            write.write_all(&POINT_DATA_START_SIGNATURE)?;
        }
        Ok(())
    }

    /// Converts this header into a raw header.
    ///
    /// Counts that don't fit into the legacy 32-bit fields are written as zero there. Las 1.4
    /// headers always carry the full 64-bit counts.
    ///
    /// # Examples
    ///
    /// ```
    /// use las_stream::{Builder, Header};
    /// let mut header = Builder::from((1, 4)).into_header().unwrap();
    /// header.record_point(1., 2., 3.);
    /// let raw_header = header.to_raw().unwrap();
    /// assert_eq!(1, raw_header.number_of_point_records);
    /// assert_eq!(1, raw_header.large_file.unwrap().number_of_point_records);
    /// ```
    pub fn to_raw(&self) -> Result<raw::Header> {
        let mut system_identifier = [0; 32];
        system_identifier.from_las_str(&self.system_identifier)?;
        let mut generating_software = [0; 32];
        generating_software.from_las_str(&self.generating_software)?;
        let (file_creation_day_of_year, file_creation_year) = match self.date {
            Some(date) => (u16::try_from(date.ordinal())?, u16::try_from(date.year())?),
            None => (0, 0),
        };
        let mut number_of_points_by_return = [0; 5];
        for (legacy, &n) in number_of_points_by_return
            .iter_mut()
            .zip(&self.number_of_points_by_return)
        {
            *legacy = u32::try_from(n).unwrap_or(0);
        }
        let transforms = self.quantization.transforms();
        let Bounds { min, max } = self.bounds;
        let large_file = self.version.supports::<LargeFiles>().then(|| {
            LargeFile {
                number_of_point_records: self.number_of_points,
                number_of_points_by_return: self.number_of_points_by_return,
            }
        });
        Ok(raw::Header {
            file_signature: raw::LASF,
            file_source_id: self.file_source_id,
            global_encoding: self.global_encoding(),
            guid: *self.guid.as_bytes(),
            version: self.version,
            system_identifier,
            generating_software,
            file_creation_day_of_year,
            file_creation_year,
            header_size: self.header_size()?,
            offset_to_point_data: u32::try_from(self.offset_to_point_data())?,
            number_of_variable_length_records: u32::try_from(self.vlrs.len())?,
            point_data_record_format: self.point_format.to_u8(),
            point_data_record_length: self.point_format.len(),
            number_of_point_records: u32::try_from(self.number_of_points).unwrap_or(0),
            number_of_points_by_return,
            x_scale_factor: transforms.x.scale,
            y_scale_factor: transforms.y.scale,
            z_scale_factor: transforms.z.scale,
            x_offset: transforms.x.offset,
            y_offset: transforms.y.offset,
            z_offset: transforms.z.offset,
            max_x: max.x,
            min_x: min.x,
            max_y: max.y,
            min_y: min.y,
            max_z: max.z,
            min_z: min.z,
            start_of_waveform_data_packet_record: self.start_of_waveform_data_packet_record,
            evlr: self.evlr,
            large_file,
            padding: self.padding.clone(),
        })
    }

    fn global_encoding(&self) -> u16 {
        let mut global_encoding = u16::from(self.gps_time_type) | self.waveform_encoding;
        if self.has_synthetic_return_numbers {
            global_encoding |= SYNTHETIC_RETURN_NUMBERS_MASK;
        }
        if self.has_wkt_crs {
            global_encoding |= WKT_CRS_MASK;
        }
        global_encoding
    }

    /// Counts a point as a first return and grows the bounds around it.
    ///
    /// Writers call this for every point they write.
    ///
    /// # Examples
    ///
    /// ```
    /// use las_stream::Header;
    /// let mut header = Header::default();
    /// header.record_point(1., 2., 3.);
    /// header.record_point(-1., 4., 3.);
    /// assert_eq!(2, header.number_of_points());
    /// assert_eq!(Some(2), header.number_of_points_by_return(1));
    /// assert_eq!(-1., header.bounds().min.x);
    /// assert_eq!(4., header.bounds().max.y);
    /// ```
    pub fn record_point(&mut self, x: f64, y: f64, z: f64) {
        self.number_of_points += 1;
        self.number_of_points_by_return[0] += 1;
        self.bounds.grow(Vector::new(x, y, z));
    }

    /// Resets the point counts, the bounds, and the evlr location.
    pub fn clear(&mut self) {
        self.number_of_points = 0;
        self.number_of_points_by_return = [0; 15];
        self.bounds = Bounds::default();
        self.evlr = None;
    }

    /// Returns the las version.
    pub fn version(&self) -> Version {
        self.version
    }

    /// Returns the file source id, often the flight line.
    pub fn file_source_id(&self) -> u16 {
        self.file_source_id
    }

    /// Returns what the gps times in the points mean.
    pub fn gps_time_type(&self) -> GpsTimeType {
        self.gps_time_type
    }

    /// Returns true if the return numbers were generated synthetically.
    pub fn has_synthetic_return_numbers(&self) -> bool {
        self.has_synthetic_return_numbers
    }

    /// Returns true if the header says its coordinate reference system is WKT.
    pub fn has_wkt_crs(&self) -> bool {
        self.has_wkt_crs
    }

    pub(crate) fn set_has_wkt_crs(&mut self, has_wkt_crs: bool) {
        self.has_wkt_crs = has_wkt_crs;
    }

    /// Returns the project id.
    pub fn guid(&self) -> Uuid {
        self.guid
    }

    /// Returns the system identifier.
    pub fn system_identifier(&self) -> &str {
        &self.system_identifier
    }

    /// Returns the name of the software that wrote the file.
    pub fn generating_software(&self) -> &str {
        &self.generating_software
    }

    /// Returns the file creation date.
    pub fn date(&self) -> Option<NaiveDate> {
        self.date
    }

    /// Returns the point format.
    pub fn point_format(&self) -> &Format {
        &self.point_format
    }

    /// Returns the quantization of the coordinates.
    pub fn quantization(&self) -> &Quantization {
        &self.quantization
    }

    /// Returns the per-axis transforms.
    pub fn transforms(&self) -> &Vector<Transform> {
        self.quantization.transforms()
    }

    /// Returns the bounds, NaN-filled if no point has been counted.
    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Returns the number of points.
    pub fn number_of_points(&self) -> u64 {
        self.number_of_points
    }

    /// Returns the number of points with return number `n`, for returns one through fifteen.
    ///
    /// # Examples
    ///
    /// ```
    /// use las_stream::Header;
    /// let header = Header::default();
    /// assert_eq!(Some(0), header.number_of_points_by_return(1));
    /// assert_eq!(None, header.number_of_points_by_return(0));
    /// assert_eq!(None, header.number_of_points_by_return(16));
    /// ```
    pub fn number_of_points_by_return(&self, n: u8) -> Option<u64> {
        if (1..=15).contains(&n) {
            Some(self.number_of_points_by_return[usize::from(n) - 1])
        } else {
            None
        }
    }

    /// Returns the variable length records.
    pub fn vlrs(&self) -> &VlrStore {
        &self.vlrs
    }

    /// Returns the variable length records, mutably.
    pub fn vlrs_mut(&mut self) -> &mut VlrStore {
        &mut self.vlrs
    }

    /// Returns the bytes between the end of the known header fields and the first vlr.
    pub fn padding(&self) -> &[u8] {
        &self.padding
    }

    /// **las 1.3 and 1.4**: returns the byte offset of the waveform data packet record.
    pub fn start_of_waveform_data_packet_record(&self) -> Option<u64> {
        self.start_of_waveform_data_packet_record
    }

    /// **las 1.4**: returns where the extended vlrs are, as read from the file.
    pub fn evlr(&self) -> Option<Evlr> {
        self.evlr
    }

    /// Returns the size of the header block, padding included.
    ///
    /// # Examples
    ///
    /// ```
    /// use las_stream::Builder;
    /// let mut builder = Builder::from((1, 3));
    /// builder.padding = vec![0; 8];
    /// assert_eq!(243, builder.into_header().unwrap().header_size().unwrap());
    /// ```
    pub fn header_size(&self) -> Result<u16> {
        let header_size = usize::from(self.version.header_size()) + self.padding.len();
        Ok(u16::try_from(header_size)?)
    }

    /// Returns the byte offset of the first point record.
    ///
    /// This is the header size, plus the padding and the vlrs, plus two bytes for the las 1.0
    /// start signature.
    pub fn offset_to_point_data(&self) -> u64 {
        let mut offset =
            u64::from(self.version.header_size()) + self.padding.len() as u64 + self.vlrs.data_len();
        if self.version.requires_point_data_start_signature() {
            offset += POINT_DATA_START_SIGNATURE.len() as u64;
        }
        offset
    }

    /// Returns the compression header, if the point data are compressed.
    ///
    /// # Examples
    ///
    /// ```
    /// #[cfg(feature = "laz")]
    /// {
    /// use las_stream::{Builder, compression};
    ///
    /// let mut builder = Builder::from((1, 2));
    /// builder.point_format.is_compressed = true;
    /// builder.vlrs.add(compression::laszip_vlr(builder.point_format).unwrap());
    /// let header = builder.into_header().unwrap();
    /// assert_eq!(1, header.compression().unwrap().items.len());
    /// }
    /// ```
    pub fn compression(&self) -> Option<CompressionHeader> {
        if !self.point_format.is_compressed {
            return None;
        }
        let vlr = self.vlrs.get(LASZIP_USER_ID, LASZIP_RECORD_ID)?;
        match vlr.value::<CompressionHeader>() {
            Some(compression) => Some(compression.clone()),
            None => CompressionHeader::read_from(&vlr.data).ok(),
        }
    }

    pub(crate) fn set_point_format(&mut self, point_format: Format) {
        self.point_format = point_format;
    }
}

impl Default for Header {
    fn default() -> Header {
        Header {
            bounds: Bounds::default(),
            date: Some(Utc::now().date_naive()),
            evlr: None,
            file_source_id: 0,
            generating_software: format!("las-stream {}", env!("CARGO_PKG_VERSION")),
            gps_time_type: GpsTimeType::Week,
            guid: Uuid::nil(),
            has_synthetic_return_numbers: false,
            has_wkt_crs: false,
            number_of_points: 0,
            number_of_points_by_return: [0; 15],
            padding: Vec::new(),
            point_format: Format::default(),
            quantization: Quantization::default(),
            start_of_waveform_data_packet_record: None,
            system_identifier: String::new(),
            version: Version::default(),
            vlrs: VlrStore::default(),
            waveform_encoding: 0,
        }
    }
}

fn point_counts(raw_header: &raw::Header) -> (u64, [u64; 15]) {
    if let Some(large_file) = raw_header.large_file {
        let legacy = u64::from(raw_header.number_of_point_records);
        if legacy != 0 && legacy != large_file.number_of_point_records {
            warn!(
                "legacy point count ({}) does not match the 64-bit point count ({}), using the 64-bit count",
                legacy, large_file.number_of_point_records
            );
        }
        (
            large_file.number_of_point_records,
            large_file.number_of_points_by_return,
        )
    } else {
        let mut number_of_points_by_return = [0; 15];
        for (n, &legacy) in number_of_points_by_return
            .iter_mut()
            .zip(&raw_header.number_of_points_by_return)
        {
            *n = u64::from(legacy);
        }
        (
            u64::from(raw_header.number_of_point_records),
            number_of_points_by_return,
        )
    }
}
