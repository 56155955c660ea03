//! The public header block, byte for byte.

use crate::{
    Error, Result, Version,
    feature::{Evlrs, LargeFiles, Waveforms},
    utils::TrackedRead,
};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use log::warn;
use std::io::{Read, Write};

/// The header size of a las 1.3 file, which is where the waveform offset ends.
const WAVEFORMS_END: u16 = 235;
/// The header size of a las 1.4 file.
const LARGE_FILES_END: u16 = 375;

/// A las header.
///
/// Fields are in file order. Fields added by las 1.3 and 1.4 are `Option`s, because older files
/// don't have them.
#[derive(Clone, Debug, PartialEq)]
pub struct Header {
    /// Should always be `LASF`.
    pub file_signature: [u8; 4],

    /// Zero means unassigned.
    pub file_source_id: u16,

    /// A bit field of global properties.
    ///
    /// | Bit | Meaning | Versions |
    /// | --- | ------- | -------- |
    /// | 0 | gps time is adjusted standard time | 1.2+ |
    /// | 1 | waveform data packets are internal (deprecated) | 1.3 |
    /// | 2 | waveform data packets are external | 1.3+ |
    /// | 3 | return numbers were generated synthetically | 1.3+ |
    /// | 4 | the coordinate reference system is WKT | 1.4 |
    pub global_encoding: u16,

    /// The project id.
    pub guid: [u8; 16],

    /// The las version.
    pub version: Version,

    /// The hardware or operation that produced the file, nul-filled.
    pub system_identifier: [u8; 32],

    /// The software that produced the file, nul-filled.
    pub generating_software: [u8; 32],

    /// Greenwich day of year, January 1 is day 1.
    pub file_creation_day_of_year: u16,

    /// Four digit year.
    pub file_creation_year: u16,

    /// The size of this header block, including any padding.
    pub header_size: u16,

    /// The byte offset of the first point record.
    pub offset_to_point_data: u32,

    /// The number of vlrs between the header and the points.
    pub number_of_variable_length_records: u32,

    /// The point format id, with the high bit set for compressed data.
    pub point_data_record_format: u8,

    /// The length of one point record, including extra bytes.
    pub point_data_record_length: u16,

    /// The legacy point count, zero when the count doesn't fit.
    pub number_of_point_records: u32,

    /// The legacy per-return counts, for returns one through five.
    pub number_of_points_by_return: [u32; 5],

    #[allow(missing_docs)]
    pub x_scale_factor: f64,
    #[allow(missing_docs)]
    pub y_scale_factor: f64,
    #[allow(missing_docs)]
    pub z_scale_factor: f64,
    #[allow(missing_docs)]
    pub x_offset: f64,
    #[allow(missing_docs)]
    pub y_offset: f64,
    #[allow(missing_docs)]
    pub z_offset: f64,
    #[allow(missing_docs)]
    pub max_x: f64,
    #[allow(missing_docs)]
    pub min_x: f64,
    #[allow(missing_docs)]
    pub max_y: f64,
    #[allow(missing_docs)]
    pub min_y: f64,
    #[allow(missing_docs)]
    pub max_z: f64,
    #[allow(missing_docs)]
    pub min_z: f64,

    /// **las 1.3 and 1.4**: the byte offset of the waveform data packet record, zero if there
    /// isn't one.
    pub start_of_waveform_data_packet_record: Option<u64>,

    /// **las 1.4**: where the extended vlrs are.
    pub evlr: Option<Evlr>,

    /// **las 1.4**: 64-bit point counts.
    pub large_file: Option<LargeFile>,

    /// Bytes between the end of the known fields and `header_size`.
    pub padding: Vec<u8>,
}

/// **las 1.4**: location of the extended vlrs, which sit after the point records.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Evlr {
    /// The byte offset of the first extended vlr.
    pub start_of_first_evlr: u64,

    /// The number of extended vlrs.
    pub number_of_evlrs: u32,
}

/// **las 1.4**: point counts that don't overflow.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LargeFile {
    /// The total number of point records.
    pub number_of_point_records: u64,

    /// Per-return counts for returns one through fifteen.
    pub number_of_points_by_return: [u64; 15],
}

impl Header {
    /// Reads a raw header.
    ///
    /// Fails with [Error::BadMagic] before reading anything else if the first four bytes are not
    /// `LASF`. Version extensions that the declared header size doesn't leave room for are
    /// skipped with a warning.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::io::Cursor;
    /// use las_stream::raw::Header;
    ///
    /// let mut bytes = Vec::new();
    /// Header::default().write_to(&mut bytes).unwrap();
    /// let header = Header::read_from(Cursor::new(bytes)).unwrap();
    /// assert_eq!(227, header.header_size);
    /// assert!(Header::read_from(Cursor::new(b"LASX".to_vec())).is_err());
    /// ```
    pub fn read_from<R: Read>(read: R) -> Result<Header> {
        Header::read_tracked(&mut TrackedRead::new(read))
    }

    pub(crate) fn read_tracked<R: Read>(read: &mut TrackedRead<R>) -> Result<Header> {
        let mut file_signature = [0; 4];
        read.field("file signature", |r| r.read_exact(&mut file_signature))?;
        if file_signature != super::LASF {
            return Err(Error::BadMagic(file_signature));
        }
        let file_source_id = read.field("file source id", |r| r.read_u16::<LittleEndian>())?;
        let global_encoding = read.field("global encoding", |r| r.read_u16::<LittleEndian>())?;
        let mut guid = [0; 16];
        read.field("guid", |r| r.read_exact(&mut guid))?;
        let version = read.field("version", |r| {
            Ok(Version::new(r.read_u8()?, r.read_u8()?))
        })?;
        let mut system_identifier = [0; 32];
        read.field("system identifier", |r| r.read_exact(&mut system_identifier))?;
        let mut generating_software = [0; 32];
        read.field("generating software", |r| {
            r.read_exact(&mut generating_software)
        })?;
        let file_creation_day_of_year =
            read.field("file creation day of year", |r| r.read_u16::<LittleEndian>())?;
        let file_creation_year =
            read.field("file creation year", |r| r.read_u16::<LittleEndian>())?;
        let header_size = read.field("header size", |r| r.read_u16::<LittleEndian>())?;
        let offset_to_point_data =
            read.field("offset to point data", |r| r.read_u32::<LittleEndian>())?;
        let number_of_variable_length_records =
            read.field("number of vlrs", |r| r.read_u32::<LittleEndian>())?;
        let point_data_record_format = read.field("point data format", |r| r.read_u8())?;
        let point_data_record_length =
            read.field("point data record length", |r| r.read_u16::<LittleEndian>())?;
        let number_of_point_records =
            read.field("number of point records", |r| r.read_u32::<LittleEndian>())?;
        let mut number_of_points_by_return = [0; 5];
        read.field("number of points by return", |r| {
            for n in &mut number_of_points_by_return {
                *n = r.read_u32::<LittleEndian>()?;
            }
            Ok(())
        })?;
        let mut scale_offset_bounds = [0.; 12];
        read.field("scales, offsets, and bounds", |r| {
            r.read_f64_into::<LittleEndian>(&mut scale_offset_bounds)
        })?;
        let [
            x_scale_factor,
            y_scale_factor,
            z_scale_factor,
            x_offset,
            y_offset,
            z_offset,
            max_x,
            min_x,
            max_y,
            min_y,
            max_z,
            min_z,
        ] = scale_offset_bounds;

        let start_of_waveform_data_packet_record =
            if has_room_for::<Waveforms>(version, header_size, WAVEFORMS_END) {
                Some(read.field("start of waveform data packet record", |r| {
                    r.read_u64::<LittleEndian>()
                })?)
            } else {
                None
            };
        let (evlr, large_file) =
            if has_room_for::<LargeFiles>(version, header_size, LARGE_FILES_END) {
                let evlr = read.field("evlr metadata", |r| {
                    Ok(Evlr {
                        start_of_first_evlr: r.read_u64::<LittleEndian>()?,
                        number_of_evlrs: r.read_u32::<LittleEndian>()?,
                    })
                })?;
                let large_file = read.field("64-bit point counts", |r| {
                    let number_of_point_records = r.read_u64::<LittleEndian>()?;
                    let mut number_of_points_by_return = [0; 15];
                    r.read_u64_into::<LittleEndian>(&mut number_of_points_by_return)?;
                    Ok(LargeFile {
                        number_of_point_records,
                        number_of_points_by_return,
                    })
                })?;
                (Some(evlr), Some(large_file))
            } else {
                (None, None)
            };

        let position = read.position();
        let padding = if u64::from(header_size) > position {
            let mut padding = vec![0; usize::from(header_size) - usize::try_from(position)?];
            read.field("header padding", |r| r.read_exact(&mut padding))?;
            padding
        } else {
            Vec::new()
        };

        Ok(Header {
            file_signature,
            file_source_id,
            global_encoding,
            guid,
            version,
            system_identifier,
            generating_software,
            file_creation_day_of_year,
            file_creation_year,
            header_size,
            offset_to_point_data,
            number_of_variable_length_records,
            point_data_record_format,
            point_data_record_length,
            number_of_point_records,
            number_of_points_by_return,
            x_scale_factor,
            y_scale_factor,
            z_scale_factor,
            x_offset,
            y_offset,
            z_offset,
            max_x,
            min_x,
            max_y,
            min_y,
            max_z,
            min_z,
            start_of_waveform_data_packet_record,
            evlr,
            large_file,
            padding,
        })
    }

    /// Writes a raw header.
    ///
    /// Version extensions are written if and only if the version has them, so a 1.2 header is
    /// always 227 bytes plus padding.
    ///
    /// # Examples
    ///
    /// ```
    /// use las_stream::raw::Header;
    /// let mut bytes = Vec::new();
    /// Header::default().write_to(&mut bytes).unwrap();
    /// assert_eq!(227, bytes.len());
    /// ```
    pub fn write_to<W: Write>(&self, mut write: W) -> Result<()> {
        write.write_all(&self.file_signature)?;
        write.write_u16::<LittleEndian>(self.file_source_id)?;
        write.write_u16::<LittleEndian>(self.global_encoding)?;
        write.write_all(&self.guid)?;
        write.write_u8(self.version.major)?;
        write.write_u8(self.version.minor)?;
        write.write_all(&self.system_identifier)?;
        write.write_all(&self.generating_software)?;
        write.write_u16::<LittleEndian>(self.file_creation_day_of_year)?;
        write.write_u16::<LittleEndian>(self.file_creation_year)?;
        write.write_u16::<LittleEndian>(self.header_size)?;
        write.write_u32::<LittleEndian>(self.offset_to_point_data)?;
        write.write_u32::<LittleEndian>(self.number_of_variable_length_records)?;
        write.write_u8(self.point_data_record_format)?;
        write.write_u16::<LittleEndian>(self.point_data_record_length)?;
        write.write_u32::<LittleEndian>(self.number_of_point_records)?;
        for n in self.number_of_points_by_return {
            write.write_u32::<LittleEndian>(n)?;
        }
        for n in [
            self.x_scale_factor,
            self.y_scale_factor,
            self.z_scale_factor,
            self.x_offset,
            self.y_offset,
            self.z_offset,
            self.max_x,
            self.min_x,
            self.max_y,
            self.min_y,
            self.max_z,
            self.min_z,
        ] {
            write.write_f64::<LittleEndian>(n)?;
        }
        if self.version.supports::<Waveforms>() {
            write.write_u64::<LittleEndian>(self.start_of_waveform_data_packet_record.unwrap_or(0))?;
        }
        if self.version.supports::<Evlrs>() {
            let evlr = self.evlr.unwrap_or_default();
            write.write_u64::<LittleEndian>(evlr.start_of_first_evlr)?;
            write.write_u32::<LittleEndian>(evlr.number_of_evlrs)?;
        }
        if self.version.supports::<LargeFiles>() {
            let large_file = self.large_file.unwrap_or_default();
            write.write_u64::<LittleEndian>(large_file.number_of_point_records)?;
            for n in large_file.number_of_points_by_return {
                write.write_u64::<LittleEndian>(n)?;
            }
        }
        write.write_all(&self.padding)?;
        Ok(())
    }

    /// Returns true if the high bit of the point format id is set.
    ///
    /// # Examples
    ///
    /// ```
    /// use las_stream::raw::Header;
    /// let mut header = Header::default();
    /// assert!(!header.is_compressed());
    /// header.point_data_record_format = 131;
    /// assert!(header.is_compressed());
    /// ```
    pub fn is_compressed(&self) -> bool {
        self.point_data_record_format & 0x80 == 0x80
    }
}

fn has_room_for<F: crate::feature::Feature>(version: Version, header_size: u16, end: u16) -> bool {
    if !version.supports::<F>() {
        false
    } else if header_size < end {
        warn!(
            "las {} header is only {} bytes, skipping {}",
            version,
            header_size,
            F::name()
        );
        false
    } else {
        true
    }
}

impl Default for Header {
    fn default() -> Header {
        let version = Version::new(1, 2);
        Header {
            file_signature: super::LASF,
            file_source_id: 0,
            global_encoding: 0,
            guid: [0; 16],
            version,
            system_identifier: [0; 32],
            generating_software: [0; 32],
            file_creation_day_of_year: 0,
            file_creation_year: 0,
            header_size: version.header_size(),
            offset_to_point_data: u32::from(version.header_size()),
            number_of_variable_length_records: 0,
            point_data_record_format: 0,
            point_data_record_length: 0,
            number_of_point_records: 0,
            number_of_points_by_return: [0; 5],
            x_scale_factor: 0.,
            y_scale_factor: 0.,
            z_scale_factor: 0.,
            x_offset: 0.,
            y_offset: 0.,
            z_offset: 0.,
            max_x: 0.,
            min_x: 0.,
            max_y: 0.,
            min_y: 0.,
            max_z: 0.,
            min_z: 0.,
            start_of_waveform_data_packet_record: None,
            evlr: None,
            large_file: None,
            padding: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    macro_rules! roundtrip {
        ($name:ident, $minor:expr) => {
            #[test]
            fn $name() {
                let version = Version::new(1, $minor);
                let mut header = Header {
                    version,
                    header_size: version.header_size(),
                    ..Default::default()
                };
                if version.supports::<Waveforms>() {
                    header.start_of_waveform_data_packet_record = Some(0);
                }
                if version.supports::<LargeFiles>() {
                    header.evlr = Some(Evlr::default());
                    header.large_file = Some(LargeFile {
                        number_of_point_records: 42,
                        ..Default::default()
                    });
                }
                let mut bytes = Vec::new();
                header.write_to(&mut bytes).unwrap();
                assert_eq!(usize::from(version.header_size()), bytes.len());
                assert_eq!(header, Header::read_from(Cursor::new(bytes)).unwrap());
            }
        };
    }

    roundtrip!(las_1_0, 0);
    roundtrip!(las_1_1, 1);
    roundtrip!(las_1_2, 2);
    roundtrip!(las_1_3, 3);
    roundtrip!(las_1_4, 4);

    #[test]
    fn bad_magic_reads_nothing_more() {
        let mut bytes = b"LASX".to_vec();
        bytes.extend([0; 223]);
        match Header::read_from(Cursor::new(bytes)) {
            Err(Error::BadMagic(magic)) => assert_eq!(*b"LASX", magic),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn truncated() {
        let mut bytes = Vec::new();
        Header::default().write_to(&mut bytes).unwrap();
        bytes.truncate(100);
        match Header::read_from(Cursor::new(bytes)) {
            Err(Error::Truncated { offset, field }) => {
                assert_eq!(100, offset);
                assert_eq!("number of vlrs", field);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn short_1_4_header_skips_extensions() {
        let header = Header {
            version: Version::new(1, 4),
            header_size: 227,
            ..Default::default()
        };
        let mut bytes = Vec::new();
        header.write_to(&mut bytes).unwrap();
        bytes.truncate(227);
        let header = Header::read_from(Cursor::new(bytes)).unwrap();
        assert!(header.start_of_waveform_data_packet_record.is_none());
        assert!(header.large_file.is_none());
    }

    #[test]
    fn padding() {
        let header = Header {
            header_size: 230,
            padding: vec![1, 2, 3],
            ..Default::default()
        };
        let mut bytes = Vec::new();
        header.write_to(&mut bytes).unwrap();
        assert_eq!(230, bytes.len());
        assert_eq!(header, Header::read_from(Cursor::new(bytes)).unwrap());
    }
}
