//! Three-dimensional points with additional attributes.
//!
//! A [Point] is one flat struct for all eleven point formats. The attributes that only some
//! formats carry (gps time, color, near infrared, waveform) are `Option`s, and the [Format]
//! decides which of them must be present.

mod classification;
mod format;
mod scan_direction;

pub use self::classification::Classification;
pub use self::format::Format;
pub use self::scan_direction::ScanDirection;
pub use crate::raw::point::Waveform;

use self::classification::OVERLAP_CLASSIFICATION_CODE;
use crate::{
    Color, Error, Quantization, Result, Vector,
    raw::{
        self,
        point::{Flags, ScanAngle},
    },
};

/// A point.
///
/// Coordinates are world coordinates, already scaled and offset.
///
/// ```
/// use las_stream::Point;
/// let point = Point { x: 1., y: 2., z: 3., ..Default::default() };
/// assert_eq!(2., point.coordinates().y);
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Point {
    /// The x coordinate.
    pub x: f64,
    /// The y coordinate.
    pub y: f64,
    /// The z coordinate.
    pub z: f64,

    /// The pulse return magnitude.
    pub intensity: u16,

    /// The return number of this point for its pulse.
    ///
    /// Three bits in legacy formats, four in extended formats.
    pub return_number: u8,

    /// The total number of returns for this point's pulse.
    pub number_of_returns: u8,

    /// The direction of the scanner mirror.
    pub scan_direction: ScanDirection,

    /// True if this is the last point on a scan line before it changes direction.
    pub is_edge_of_flight_line: bool,

    /// The ASPRS classification.
    ///
    /// Legacy formats only have room for codes 0 through 31.
    pub classification: Classification,

    /// Created by something other than lidar collection.
    pub is_synthetic: bool,

    /// A model key point that should survive thinning.
    pub is_key_point: bool,

    /// Should be left out of processing.
    pub is_withheld: bool,

    /// In the overlap region of two or more swaths.
    pub is_overlap: bool,

    /// The channel of a multi-channel scanner, zero through three.
    ///
    /// Only extended formats store a channel.
    pub scanner_channel: u8,

    /// The scan angle as stored: a signed byte in legacy formats, a signed short in extended
    /// formats.
    pub scan_angle_rank: i16,

    /// Free for the user.
    pub user_data: u8,

    /// The file source id of the file this point came from.
    pub point_source_id: u16,

    /// The gps time.
    pub gps_time: Option<f64>,

    /// Red, green, and blue.
    pub color: Option<Color>,

    /// Near infrared.
    pub nir: Option<u16>,

    /// The wave packet block.
    pub waveform: Option<Waveform>,

    /// Bytes after the fixed-length record.
    pub extra_bytes: Vec<u8>,
}

impl Point {
    /// Creates a point from a raw point.
    ///
    /// # Examples
    ///
    /// ```
    /// use las_stream::{raw, Point, Quantization};
    /// let raw_point = raw::Point { x: 1000, ..Default::default() };
    /// let point = Point::new(raw_point, &Quantization::default());
    /// assert_eq!(1., point.x);
    /// ```
    pub fn new(raw_point: raw::Point, quantization: &Quantization) -> Point {
        let coordinates = quantization.to_world(Vector::new(raw_point.x, raw_point.y, raw_point.z));
        let flags = raw_point.flags;
        let (classification, is_overlap) = match flags {
            Flags::TwoByte(_, _) if flags.classification() == OVERLAP_CLASSIFICATION_CODE => {
                (Classification::Unclassified, true)
            }
            _ => (
                Classification::from(flags.classification()),
                flags.is_overlap(),
            ),
        };
        Point {
            x: coordinates.x,
            y: coordinates.y,
            z: coordinates.z,
            intensity: raw_point.intensity,
            return_number: flags.return_number(),
            number_of_returns: flags.number_of_returns(),
            scan_direction: ScanDirection::from(flags.is_scan_direction_set()),
            is_edge_of_flight_line: flags.is_edge_of_flight_line(),
            classification,
            is_synthetic: flags.is_synthetic(),
            is_key_point: flags.is_key_point(),
            is_withheld: flags.is_withheld(),
            is_overlap,
            scanner_channel: flags.scanner_channel(),
            scan_angle_rank: raw_point.scan_angle.into(),
            user_data: raw_point.user_data,
            point_source_id: raw_point.point_source_id,
            gps_time: raw_point.gps_time,
            color: raw_point.color,
            nir: raw_point.nir,
            waveform: raw_point.waveform,
            extra_bytes: raw_point.extra_bytes,
        }
    }

    /// Converts this point into a raw point for the given format.
    ///
    /// Fails if a field doesn't fit into the format's bits or the coordinates can't be quantized.
    ///
    /// # Examples
    ///
    /// ```
    /// use las_stream::{point::Format, Point, Quantization};
    /// let point = Point { return_number: 8, ..Default::default() };
    /// let quantization = Quantization::default();
    /// assert!(point.to_raw(Format::new(0).unwrap(), &quantization).is_err());
    /// ```
    pub fn to_raw(&self, format: Format, quantization: &Quantization) -> Result<raw::Point> {
        let stored = quantization.to_stored(self.coordinates())?;
        let (flags, scan_angle) = if format.is_extended() {
            (self.three_byte_flags(format)?, ScanAngle::Scaled(self.scan_angle_rank))
        } else {
            let scan_angle = i8::try_from(self.scan_angle_rank)
                .map_err(|_| Error::ScanAngleRank(self.scan_angle_rank))?;
            (self.two_byte_flags(format)?, ScanAngle::Rank(scan_angle))
        };
        Ok(raw::Point {
            x: stored.x,
            y: stored.y,
            z: stored.z,
            intensity: self.intensity,
            flags,
            scan_angle,
            user_data: self.user_data,
            point_source_id: self.point_source_id,
            gps_time: self.gps_time,
            color: self.color,
            nir: self.nir,
            waveform: self.waveform,
            extra_bytes: self.extra_bytes.clone(),
        })
    }

    /// Returns true if this point's optional attributes are exactly the ones the format carries.
    ///
    /// # Examples
    ///
    /// ```
    /// use las_stream::{point::Format, Point};
    /// let mut point = Point::default();
    /// assert!(point.matches(&Format::new(0).unwrap()));
    /// assert!(!point.matches(&Format::new(1).unwrap()));
    /// point.gps_time = Some(42.);
    /// assert!(point.matches(&Format::new(1).unwrap()));
    /// ```
    pub fn matches(&self, format: &Format) -> bool {
        self.gps_time.is_some() == format.has_gps_time()
            && self.color.is_some() == format.has_color()
            && self.nir.is_some() == format.has_nir()
            && self.waveform.is_some() == format.has_waveform()
            && self.extra_bytes.len() == usize::from(format.extra_bytes)
    }

    /// Returns the coordinates of this point.
    pub fn coordinates(&self) -> Vector<f64> {
        Vector::new(self.x, self.y, self.z)
    }

    fn two_byte_flags(&self, format: Format) -> Result<Flags> {
        if self.return_number > 0b111 {
            return Err(Error::ReturnNumber {
                return_number: self.return_number,
                format: format.id(),
            });
        }
        if self.number_of_returns > 0b111 {
            return Err(Error::NumberOfReturns {
                number_of_returns: self.number_of_returns,
                format: format.id(),
            });
        }
        if self.scanner_channel != 0 {
            return Err(Error::ScannerChannel(self.scanner_channel));
        }
        let classification = match (self.is_overlap, self.classification) {
            (true, Classification::Unclassified) => OVERLAP_CLASSIFICATION_CODE,
            (false, classification)
                if u8::from(classification) != OVERLAP_CLASSIFICATION_CODE =>
            {
                u8::from(classification)
            }
            _ => {
                return Err(Error::OverlapClassification {
                    classification: self.classification,
                    is_overlap: self.is_overlap,
                });
            }
        };
        if classification > 0b1_1111 {
            return Err(Error::Classification {
                classification,
                format: format.id(),
            });
        }
        let a = self.return_number
            | (self.number_of_returns << 3)
            | (u8::from(bool::from(self.scan_direction)) << 6)
            | (u8::from(self.is_edge_of_flight_line) << 7);
        let b = classification
            | (u8::from(self.is_synthetic) << 5)
            | (u8::from(self.is_key_point) << 6)
            | (u8::from(self.is_withheld) << 7);
        Ok(Flags::TwoByte(a, b))
    }

    fn three_byte_flags(&self, format: Format) -> Result<Flags> {
        if self.return_number > 0b1111 {
            return Err(Error::ReturnNumber {
                return_number: self.return_number,
                format: format.id(),
            });
        }
        if self.number_of_returns > 0b1111 {
            return Err(Error::NumberOfReturns {
                number_of_returns: self.number_of_returns,
                format: format.id(),
            });
        }
        if self.scanner_channel > 0b11 {
            return Err(Error::ScannerChannel(self.scanner_channel));
        }
        let a = self.return_number | (self.number_of_returns << 4);
        let b = u8::from(self.is_synthetic)
            | (u8::from(self.is_key_point) << 1)
            | (u8::from(self.is_withheld) << 2)
            | (u8::from(self.is_overlap) << 3)
            | (self.scanner_channel << 4)
            | (u8::from(bool::from(self.scan_direction)) << 6)
            | (u8::from(self.is_edge_of_flight_line) << 7);
        Ok(Flags::ThreeByte(a, b, u8::from(self.classification)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(point: &Point, id: u8) -> Point {
        let format = Format::new(id).unwrap();
        let quantization = Quantization::default();
        let bytes = format.encode(point, &quantization).unwrap();
        format.decode(&bytes, &quantization).unwrap()
    }

    fn legacy_point() -> Point {
        Point {
            x: 1.,
            y: -2.,
            z: 3.5,
            intensity: u16::MAX,
            return_number: 7,
            number_of_returns: 7,
            scan_direction: ScanDirection::LeftToRight,
            is_edge_of_flight_line: true,
            classification: Classification::Reserved(31),
            is_synthetic: true,
            is_key_point: true,
            is_withheld: true,
            scan_angle_rank: i16::from(i8::MIN),
            user_data: 255,
            point_source_id: u16::MAX,
            ..Default::default()
        }
    }

    #[test]
    fn legacy_boundaries() {
        let point = legacy_point();
        assert_eq!(point, roundtrip(&point, 0));

        let point = Point {
            classification: Classification::CreatedNeverClassified,
            scan_angle_rank: i16::from(i8::MAX),
            return_number: 0,
            number_of_returns: 0,
            ..legacy_point()
        };
        assert_eq!(point, roundtrip(&point, 0));
    }

    #[test]
    fn extended_boundaries() {
        let point = Point {
            return_number: 15,
            number_of_returns: 15,
            classification: Classification::UserDefinable(255),
            is_overlap: true,
            scanner_channel: 3,
            scan_angle_rank: i16::MIN,
            gps_time: Some(f64::MAX),
            ..legacy_point()
        };
        assert_eq!(point, roundtrip(&point, 6));

        let point = Point {
            classification: Classification::CreatedNeverClassified,
            scan_angle_rank: i16::MAX,
            scanner_channel: 0,
            ..point
        };
        assert_eq!(point, roundtrip(&point, 6));
    }

    #[test]
    fn legacy_overlap() {
        let point = Point {
            classification: Classification::Unclassified,
            is_overlap: true,
            ..Default::default()
        };
        let format = Format::new(0).unwrap();
        let bytes = format.encode(&point, &Quantization::default()).unwrap();
        assert_eq!(12, bytes[15] & 0b1_1111);
        assert_eq!(point, roundtrip(&point, 0));
    }

    #[test]
    fn legacy_class_twelve_is_reserved_for_overlap() {
        let format = Format::new(0).unwrap();
        let quantization = Quantization::default();
        let point = Point {
            classification: Classification::Reserved(12),
            ..Default::default()
        };
        assert!(matches!(
            format.encode(&point, &quantization),
            Err(Error::OverlapClassification {
                classification: Classification::Reserved(12),
                is_overlap: false,
            })
        ));
    }

    #[test]
    fn legacy_overlap_must_be_unclassified() {
        let format = Format::new(3).unwrap();
        let quantization = Quantization::default();
        for classification in [
            Classification::Ground,
            Classification::CreatedNeverClassified,
            Classification::Reserved(12),
        ] {
            let point = Point {
                classification,
                is_overlap: true,
                gps_time: Some(0.),
                color: Some(Color::default()),
                ..Default::default()
            };
            assert!(matches!(
                format.encode(&point, &quantization),
                Err(Error::OverlapClassification {
                    is_overlap: true,
                    ..
                })
            ));
        }
    }

    #[test]
    fn extended_class_twelve_is_ordinary() {
        let point = Point {
            classification: Classification::Reserved(12),
            gps_time: Some(1.),
            ..Default::default()
        };
        assert_eq!(point, roundtrip(&point, 6));
    }

    #[test]
    fn too_wide_for_legacy() {
        let format = Format::new(0).unwrap();
        let quantization = Quantization::default();
        let cases = [
            Point {
                return_number: 8,
                ..Default::default()
            },
            Point {
                number_of_returns: 8,
                ..Default::default()
            },
            Point {
                classification: Classification::Reserved(32),
                ..Default::default()
            },
            Point {
                scan_angle_rank: 128,
                ..Default::default()
            },
            Point {
                scanner_channel: 1,
                ..Default::default()
            },
        ];
        for point in cases {
            assert!(format.encode(&point, &quantization).is_err(), "{:?}", point);
        }
    }

    #[test]
    fn too_wide_for_extended() {
        let format = Format::new(6).unwrap();
        let quantization = Quantization::default();
        let point = Point {
            return_number: 16,
            gps_time: Some(0.),
            ..Default::default()
        };
        assert!(format.encode(&point, &quantization).is_err());
        let point = Point {
            scanner_channel: 4,
            gps_time: Some(0.),
            ..Default::default()
        };
        assert!(format.encode(&point, &quantization).is_err());
    }

    #[test]
    fn every_format() {
        for format in Format::FORMATS {
            let point = Point {
                x: 10.,
                gps_time: format.has_gps_time().then_some(100.5),
                color: format.has_color().then(|| Color::new(1, 2, 3)),
                nir: format.has_nir().then_some(4),
                waveform: format.has_waveform().then(|| Waveform {
                    wave_packet_descriptor_index: 1,
                    byte_offset_to_waveform_data: 2,
                    waveform_packet_size_in_bytes: 3,
                    return_point_waveform_location: 4.,
                    x_t: 5.,
                    y_t: 6.,
                    z_t: 7.,
                }),
                ..Default::default()
            };
            assert_eq!(point, roundtrip(&point, format.id()));
        }
    }
}
