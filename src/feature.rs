//! Version gates for optional header and point fields.
//!
//! Each feature is a zero-sized type implementing [Feature]. Ask a [Version] about it with
//! [Version::supports] or [Version::verify_support_for]:
//!
//! ```
//! use las_stream::feature::LargeFiles;
//! use las_stream::Version;
//!
//! assert!(!Version::new(1, 3).supports::<LargeFiles>());
//! assert!(Version::new(1, 4).supports::<LargeFiles>());
//! assert!(Version::new(1, 2).verify_support_for::<LargeFiles>().is_err());
//! ```

use crate::Version;

/// A field or flag that only exists in some las versions.
pub trait Feature {
    /// Returns true if the version carries this feature.
    ///
    /// # Examples
    ///
    /// ```
    /// use las_stream::feature::{Feature, Waveforms};
    /// use las_stream::Version;
    /// assert!(Waveforms::is_supported_by(Version::new(1, 3)));
    /// ```
    fn is_supported_by(version: Version) -> bool;

    /// Returns the name of this feature, used in error messages.
    fn name() -> &'static str;
}

macro_rules! features {
    (   $(
            $(#[$meta:meta])*
            $name:ident since $minor:literal;
        )+
    ) => {
        $(
            $(#[$meta])*
            #[derive(Clone, Copy, Debug)]
            pub struct $name;

            impl Feature for $name {
                fn is_supported_by(version: Version) -> bool {
                    version.major == 1 && version.minor >= $minor
                }

                fn name() -> &'static str {
                    stringify!($name)
                }
            }
        )+
    }
}

features! {
    /// The file source id field, reserved in las 1.0.
    FileSourceId since 1;
    /// The global encoding bit for adjusted standard gps time.
    GpsStandardTime since 2;
    /// The waveform data packet offset in the header.
    Waveforms since 3;
    /// The global encoding bit for synthetic return numbers.
    SyntheticReturnNumbers since 3;
    /// 64-bit point counts and fifteen returns.
    LargeFiles since 4;
    /// Extended variable length records after the points.
    Evlrs since 4;
    /// Coordinate reference systems stored as well known text.
    WktCrs since 4;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gates() {
        assert!(!FileSourceId::is_supported_by(Version::new(1, 0)));
        assert!(FileSourceId::is_supported_by(Version::new(1, 1)));
        assert!(!GpsStandardTime::is_supported_by(Version::new(1, 1)));
        assert!(GpsStandardTime::is_supported_by(Version::new(1, 2)));
        assert!(!Evlrs::is_supported_by(Version::new(1, 3)));
        assert!(WktCrs::is_supported_by(Version::new(1, 4)));
        assert!(!LargeFiles::is_supported_by(Version::new(2, 4)));
    }

    #[test]
    fn name() {
        assert_eq!("Waveforms", Waveforms::name());
    }
}
