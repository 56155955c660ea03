const GPS_TIME_TYPE_MASK: u16 = 1;

/// The meaning of GPS time in the point records.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum GpsTimeType {
    /// GPS Week Time (the same as las 1.0 and 1.1).
    #[default]
    Week,
    /// Standard GPS Time minus 1e9.
    Standard,
}

impl GpsTimeType {
    /// Returns true if this time type is gps standard time.
    ///
    /// # Examples
    ///
    /// ```
    /// use las_stream::GpsTimeType;
    /// assert!(!GpsTimeType::Week.is_standard());
    /// assert!(GpsTimeType::Standard.is_standard());
    /// ```
    pub fn is_standard(&self) -> bool {
        *self == GpsTimeType::Standard
    }
}

impl From<u16> for GpsTimeType {
    fn from(global_encoding: u16) -> GpsTimeType {
        if global_encoding & GPS_TIME_TYPE_MASK == GPS_TIME_TYPE_MASK {
            GpsTimeType::Standard
        } else {
            GpsTimeType::Week
        }
    }
}

impl From<GpsTimeType> for u16 {
    fn from(gps_time_type: GpsTimeType) -> u16 {
        match gps_time_type {
            GpsTimeType::Week => 0,
            GpsTimeType::Standard => GPS_TIME_TYPE_MASK,
        }
    }
}
