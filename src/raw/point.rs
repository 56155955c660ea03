//! Raw point records and the bit-packed flag bytes.

use crate::{Color, Error, Result, point::Format};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Read, Write};

/// A raw point, exactly as laid out in a point data record.
///
/// Coordinates are the stored integers, not yet scaled and offset.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Point {
    /// The stored x value.
    pub x: i32,
    #[allow(missing_docs)]
    pub y: i32,
    #[allow(missing_docs)]
    pub z: i32,

    /// The pulse return magnitude, normalized to sixteen bits.
    pub intensity: u16,

    /// Return numbers, classification, and the single-bit flags.
    ///
    /// Point formats zero through five use two bytes, six through ten use three.
    pub flags: Flags,

    /// The scan angle, one signed byte for legacy formats and two for extended formats.
    pub scan_angle: ScanAngle,

    /// Free for the user.
    pub user_data: u8,

    /// The file source id of the file this point came from.
    pub point_source_id: u16,

    /// The GPS time, either week time or adjusted standard time.
    pub gps_time: Option<f64>,

    /// Color channels.
    pub color: Option<Color>,

    /// The near infrared channel.
    pub nir: Option<u16>,

    /// The wave packet block.
    pub waveform: Option<Waveform>,

    /// Bytes after the fixed-length record.
    pub extra_bytes: Vec<u8>,
}

/// The wave packet block that rides along with point formats 4, 5, 9, and 10.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Waveform {
    /// This value plus 99 is the record id of the wave packet descriptor vlr.
    ///
    /// Zero means there is no waveform for this point.
    pub wave_packet_descriptor_index: u8,

    /// Location of the packet, relative to the start of the waveform data.
    pub byte_offset_to_waveform_data: u64,

    /// Size of the packet in bytes.
    pub waveform_packet_size_in_bytes: u32,

    /// Offset in picoseconds from the first digitized value to the return.
    pub return_point_waveform_location: f32,

    /// Parametric line through the anchor point, `X = X0 + X(t)`.
    pub x_t: f32,
    #[allow(missing_docs)]
    pub y_t: f32,
    #[allow(missing_docs)]
    pub z_t: f32,
}

/// Scan angle storage, which changed width with the extended point formats.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScanAngle {
    /// Legacy formats store the rank as a signed byte.
    Rank(i8),
    /// Extended formats store a signed short.
    Scaled(i16),
}

/// The flag bytes of a point record.
///
/// Legacy formats pack everything into two bytes:
///
/// | byte | bits 0-2 | bits 3-5 | bit 6 | bit 7 |
/// | ---- | -------- | -------- | ----- | ----- |
/// | 0 | return number | number of returns | scan direction | edge of flight line |
///
/// | byte | bits 0-4 | bit 5 | bit 6 | bit 7 |
/// | ---- | -------- | ----- | ----- | ----- |
/// | 1 | classification | synthetic | key point | withheld |
///
/// Extended formats spend a third byte on the classification:
///
/// | byte | bits 0-3 | bits 4-7 |
/// | ---- | -------- | -------- |
/// | 0 | return number | number of returns |
///
/// | byte | bit 0 | bit 1 | bit 2 | bit 3 | bits 4-5 | bit 6 | bit 7 |
/// | ---- | ----- | ----- | ----- | ----- | -------- | ----- | ----- |
/// | 1 | synthetic | key point | withheld | overlap | scanner channel | scan direction | edge of flight line |
///
/// ```
/// use las_stream::raw::point::Flags;
/// let flags = Flags::TwoByte(0b0100_1010, 0b0010_0010);
/// assert_eq!(2, flags.return_number());
/// assert_eq!(1, flags.number_of_returns());
/// assert!(flags.is_scan_direction_set());
/// assert_eq!(2, flags.classification());
/// assert!(flags.is_synthetic());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flags {
    /// Two byte flags, used for point formats zero through five.
    TwoByte(u8, u8),
    /// Three byte flags, used for point formats six through ten.
    ThreeByte(u8, u8, u8),
}

impl Point {
    /// Reads a raw point in the given format.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::io::Cursor;
    /// use las_stream::raw::Point;
    /// use las_stream::point::Format;
    ///
    /// let format = Format::new(0).unwrap();
    /// let point = Point::read_from(Cursor::new(vec![0; 20]), format).unwrap();
    /// assert_eq!(0, point.x);
    /// ```
    pub fn read_from<R: Read>(mut read: R, format: Format) -> Result<Point> {
        let x = read.read_i32::<LittleEndian>()?;
        let y = read.read_i32::<LittleEndian>()?;
        let z = read.read_i32::<LittleEndian>()?;
        let intensity = read.read_u16::<LittleEndian>()?;
        let (flags, scan_angle, user_data) = if format.is_extended() {
            let flags = Flags::ThreeByte(read.read_u8()?, read.read_u8()?, read.read_u8()?);
            let user_data = read.read_u8()?;
            let scan_angle = ScanAngle::Scaled(read.read_i16::<LittleEndian>()?);
            (flags, scan_angle, user_data)
        } else {
            let flags = Flags::TwoByte(read.read_u8()?, read.read_u8()?);
            let scan_angle = ScanAngle::Rank(read.read_i8()?);
            let user_data = read.read_u8()?;
            (flags, scan_angle, user_data)
        };
        let point_source_id = read.read_u16::<LittleEndian>()?;
        let gps_time = if format.has_gps_time() {
            Some(read.read_f64::<LittleEndian>()?)
        } else {
            None
        };
        let color = if format.has_color() {
            Some(Color::read_from(&mut read)?)
        } else {
            None
        };
        let nir = if format.has_nir() {
            Some(read.read_u16::<LittleEndian>()?)
        } else {
            None
        };
        let waveform = if format.has_waveform() {
            Some(Waveform::read_from(&mut read)?)
        } else {
            None
        };
        let mut extra_bytes = vec![0; usize::from(format.extra_bytes)];
        read.read_exact(&mut extra_bytes)?;
        Ok(Point {
            x,
            y,
            z,
            intensity,
            flags,
            scan_angle,
            user_data,
            point_source_id,
            gps_time,
            color,
            nir,
            waveform,
            extra_bytes,
        })
    }

    /// Writes a raw point in the given format.
    ///
    /// Fails if the point's flags, scan angle, or optional fields don't fit the format.
    ///
    /// # Examples
    ///
    /// ```
    /// use las_stream::raw::Point;
    /// use las_stream::point::Format;
    ///
    /// let mut bytes = Vec::new();
    /// Point::default().write_to(&mut bytes, Format::new(0).unwrap()).unwrap();
    /// assert_eq!(20, bytes.len());
    /// ```
    pub fn write_to<W: Write>(&self, mut write: W, format: Format) -> Result<()> {
        write.write_i32::<LittleEndian>(self.x)?;
        write.write_i32::<LittleEndian>(self.y)?;
        write.write_i32::<LittleEndian>(self.z)?;
        write.write_u16::<LittleEndian>(self.intensity)?;
        match (self.flags, self.scan_angle, format.is_extended()) {
            (Flags::ThreeByte(a, b, c), ScanAngle::Scaled(scan_angle), true) => {
                write.write_all(&[a, b, c, self.user_data])?;
                write.write_i16::<LittleEndian>(scan_angle)?;
            }
            (Flags::TwoByte(a, b), ScanAngle::Rank(scan_angle), false) => {
                write.write_all(&[a, b])?;
                write.write_i8(scan_angle)?;
                write.write_u8(self.user_data)?;
            }
            _ => return Err(Error::PointAttributesDoNotMatch(format)),
        }
        write.write_u16::<LittleEndian>(self.point_source_id)?;
        match (self.gps_time, format.has_gps_time()) {
            (Some(gps_time), true) => write.write_f64::<LittleEndian>(gps_time)?,
            (None, false) => {}
            _ => return Err(Error::PointAttributesDoNotMatch(format)),
        }
        match (self.color, format.has_color()) {
            (Some(color), true) => color.write_to(&mut write)?,
            (None, false) => {}
            _ => return Err(Error::PointAttributesDoNotMatch(format)),
        }
        match (self.nir, format.has_nir()) {
            (Some(nir), true) => write.write_u16::<LittleEndian>(nir)?,
            (None, false) => {}
            _ => return Err(Error::PointAttributesDoNotMatch(format)),
        }
        match (self.waveform, format.has_waveform()) {
            (Some(waveform), true) => waveform.write_to(&mut write)?,
            (None, false) => {}
            _ => return Err(Error::PointAttributesDoNotMatch(format)),
        }
        if self.extra_bytes.len() != usize::from(format.extra_bytes) {
            return Err(Error::ExtraBytes {
                expected: format.extra_bytes,
                actual: self.extra_bytes.len(),
            });
        }
        write.write_all(&self.extra_bytes)?;
        Ok(())
    }
}

impl Waveform {
    /// The number of bytes in a wave packet block.
    pub const LEN: u16 = 29;

    fn read_from<R: Read>(mut read: R) -> Result<Waveform> {
        Ok(Waveform {
            wave_packet_descriptor_index: read.read_u8()?,
            byte_offset_to_waveform_data: read.read_u64::<LittleEndian>()?,
            waveform_packet_size_in_bytes: read.read_u32::<LittleEndian>()?,
            return_point_waveform_location: read.read_f32::<LittleEndian>()?,
            x_t: read.read_f32::<LittleEndian>()?,
            y_t: read.read_f32::<LittleEndian>()?,
            z_t: read.read_f32::<LittleEndian>()?,
        })
    }

    fn write_to<W: Write>(&self, mut write: W) -> Result<()> {
        write.write_u8(self.wave_packet_descriptor_index)?;
        write.write_u64::<LittleEndian>(self.byte_offset_to_waveform_data)?;
        write.write_u32::<LittleEndian>(self.waveform_packet_size_in_bytes)?;
        write.write_f32::<LittleEndian>(self.return_point_waveform_location)?;
        write.write_f32::<LittleEndian>(self.x_t)?;
        write.write_f32::<LittleEndian>(self.y_t)?;
        write.write_f32::<LittleEndian>(self.z_t)?;
        Ok(())
    }
}

impl Flags {
    /// Returns the return number.
    pub fn return_number(&self) -> u8 {
        match *self {
            Flags::TwoByte(a, _) => a & 0b0000_0111,
            Flags::ThreeByte(a, _, _) => a & 0b0000_1111,
        }
    }

    /// Returns the number of returns for this pulse.
    pub fn number_of_returns(&self) -> u8 {
        match *self {
            Flags::TwoByte(a, _) => (a >> 3) & 0b0000_0111,
            Flags::ThreeByte(a, _, _) => (a >> 4) & 0b0000_1111,
        }
    }

    /// Returns true if the scan direction bit is set.
    pub fn is_scan_direction_set(&self) -> bool {
        match *self {
            Flags::TwoByte(a, _) => a & 0b0100_0000 != 0,
            Flags::ThreeByte(_, b, _) => b & 0b0100_0000 != 0,
        }
    }

    /// Returns true if this point is at the edge of a flight line.
    pub fn is_edge_of_flight_line(&self) -> bool {
        match *self {
            Flags::TwoByte(a, _) => a & 0b1000_0000 != 0,
            Flags::ThreeByte(_, b, _) => b & 0b1000_0000 != 0,
        }
    }

    /// Returns the raw classification code.
    pub fn classification(&self) -> u8 {
        match *self {
            Flags::TwoByte(_, b) => b & 0b0001_1111,
            Flags::ThreeByte(_, _, c) => c,
        }
    }

    /// Returns true if the synthetic bit is set.
    pub fn is_synthetic(&self) -> bool {
        match *self {
            Flags::TwoByte(_, b) => b & 0b0010_0000 != 0,
            Flags::ThreeByte(_, b, _) => b & 0b0000_0001 != 0,
        }
    }

    /// Returns true if the key point bit is set.
    pub fn is_key_point(&self) -> bool {
        match *self {
            Flags::TwoByte(_, b) => b & 0b0100_0000 != 0,
            Flags::ThreeByte(_, b, _) => b & 0b0000_0010 != 0,
        }
    }

    /// Returns true if the withheld bit is set.
    pub fn is_withheld(&self) -> bool {
        match *self {
            Flags::TwoByte(_, b) => b & 0b1000_0000 != 0,
            Flags::ThreeByte(_, b, _) => b & 0b0000_0100 != 0,
        }
    }

    /// Returns true if the overlap bit is set.
    ///
    /// Two byte flags have no overlap bit, so this is always false for them. Legacy formats mark
    /// overlap with classification 12 instead.
    pub fn is_overlap(&self) -> bool {
        match *self {
            Flags::TwoByte(_, _) => false,
            Flags::ThreeByte(_, b, _) => b & 0b0000_1000 != 0,
        }
    }

    /// Returns the scanner channel, always zero for two byte flags.
    pub fn scanner_channel(&self) -> u8 {
        match *self {
            Flags::TwoByte(_, _) => 0,
            Flags::ThreeByte(_, b, _) => (b >> 4) & 0b0000_0011,
        }
    }
}

impl Default for Flags {
    fn default() -> Flags {
        Flags::TwoByte(0, 0)
    }
}

impl Default for ScanAngle {
    fn default() -> ScanAngle {
        ScanAngle::Rank(0)
    }
}

impl From<ScanAngle> for i16 {
    fn from(scan_angle: ScanAngle) -> i16 {
        match scan_angle {
            ScanAngle::Rank(n) => i16::from(n),
            ScanAngle::Scaled(n) => n,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    macro_rules! roundtrip {
        ($name:ident, $format:expr) => {
            #[test]
            fn $name() {
                let mut format = Format::new($format).unwrap();
                format.extra_bytes = 1;
                let mut point = Point {
                    extra_bytes: vec![42],
                    ..Default::default()
                };
                if format.is_extended() {
                    point.flags = Flags::ThreeByte(0, 0, 0);
                    point.scan_angle = ScanAngle::Scaled(0);
                }
                if format.has_gps_time() {
                    point.gps_time = Some(0.);
                }
                if format.has_color() {
                    point.color = Some(Color::new(1, 2, 3));
                }
                if format.has_nir() {
                    point.nir = Some(4);
                }
                if format.has_waveform() {
                    point.waveform = Some(Waveform::default());
                }
                let mut bytes = Vec::new();
                point.write_to(&mut bytes, format).unwrap();
                assert_eq!(usize::from(format.len()), bytes.len());
                assert_eq!(point, Point::read_from(Cursor::new(bytes), format).unwrap());
            }
        };
    }

    roundtrip!(format_0, 0);
    roundtrip!(format_1, 1);
    roundtrip!(format_2, 2);
    roundtrip!(format_3, 3);
    roundtrip!(format_4, 4);
    roundtrip!(format_5, 5);
    roundtrip!(format_6, 6);
    roundtrip!(format_7, 7);
    roundtrip!(format_8, 8);
    roundtrip!(format_9, 9);
    roundtrip!(format_10, 10);

    #[test]
    fn two_byte_bits() {
        assert_eq!(7, Flags::TwoByte(0b0000_0111, 0).return_number());
        assert_eq!(7, Flags::TwoByte(0b0011_1000, 0).number_of_returns());
        assert!(Flags::TwoByte(0b0100_0000, 0).is_scan_direction_set());
        assert!(Flags::TwoByte(0b1000_0000, 0).is_edge_of_flight_line());
        assert_eq!(31, Flags::TwoByte(0, 0b1111_1111).classification());
        assert!(Flags::TwoByte(0, 0b0010_0000).is_synthetic());
        assert!(Flags::TwoByte(0, 0b0100_0000).is_key_point());
        assert!(Flags::TwoByte(0, 0b1000_0000).is_withheld());
        assert!(!Flags::TwoByte(0xff, 0xff).is_overlap());
        assert_eq!(0, Flags::TwoByte(0xff, 0xff).scanner_channel());
    }

    #[test]
    fn three_byte_bits() {
        assert_eq!(15, Flags::ThreeByte(0b0000_1111, 0, 0).return_number());
        assert_eq!(15, Flags::ThreeByte(0b1111_0000, 0, 0).number_of_returns());
        assert!(Flags::ThreeByte(0, 0b0000_0001, 0).is_synthetic());
        assert!(Flags::ThreeByte(0, 0b0000_0010, 0).is_key_point());
        assert!(Flags::ThreeByte(0, 0b0000_0100, 0).is_withheld());
        assert!(Flags::ThreeByte(0, 0b0000_1000, 0).is_overlap());
        assert_eq!(3, Flags::ThreeByte(0, 0b0011_0000, 0).scanner_channel());
        assert!(Flags::ThreeByte(0, 0b0100_0000, 0).is_scan_direction_set());
        assert!(Flags::ThreeByte(0, 0b1000_0000, 0).is_edge_of_flight_line());
        assert_eq!(255, Flags::ThreeByte(0, 0, 255).classification());
    }

    #[test]
    fn extended_field_order() {
        let format = Format::new(6).unwrap();
        let point = Point {
            flags: Flags::ThreeByte(1, 2, 3),
            scan_angle: ScanAngle::Scaled(-2),
            user_data: 4,
            point_source_id: 5,
            gps_time: Some(0.),
            ..Default::default()
        };
        let mut bytes = Vec::new();
        point.write_to(&mut bytes, format).unwrap();
        assert_eq!(&[1, 2, 3, 4, 0xfe, 0xff, 5, 0], &bytes[14..22]);
    }

    #[test]
    fn mismatched_flags() {
        let point = Point {
            gps_time: Some(0.),
            ..Default::default()
        };
        assert!(point.write_to(Vec::new(), Format::new(6).unwrap()).is_err());
    }

    #[test]
    fn short_read() {
        assert!(Point::read_from(Cursor::new(vec![0; 19]), Format::new(0).unwrap()).is_err());
    }
}
