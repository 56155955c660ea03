use crate::{Error, Result, feature::Feature, point::Format};
use std::fmt;

/// LAS version.
///
/// Versions are ordered by major, then minor:
///
/// ```
/// use las_stream::Version;
/// assert!(Version::new(1, 2) < Version::new(1, 4));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    /// The major version.
    ///
    /// Should always be 1.
    pub major: u8,

    /// The minor version.
    ///
    /// Should be between 0 and 4.
    pub minor: u8,
}

impl Version {
    /// Creates a new version.
    ///
    /// # Examples
    ///
    /// ```
    /// # use las_stream::Version;
    /// let version = Version::new(1, 2);
    /// ```
    pub fn new(major: u8, minor: u8) -> Version {
        Version { major, minor }
    }

    /// Returns the size of the fixed header block for this version.
    ///
    /// # Examples
    ///
    /// ```
    /// # use las_stream::Version;
    /// assert_eq!(227, Version::new(1, 2).header_size());
    /// assert_eq!(235, Version::new(1, 3).header_size());
    /// assert_eq!(375, Version::new(1, 4).header_size());
    /// ```
    pub fn header_size(&self) -> u16 {
        if *self < Version::new(1, 3) {
            227
        } else if *self < Version::new(1, 4) {
            235
        } else {
            375
        }
    }

    /// Does this version require the two byte point data start signature?
    ///
    /// # Examples
    ///
    /// ```
    /// # use las_stream::Version;
    /// assert!(Version::new(1, 0).requires_point_data_start_signature());
    /// assert!(!Version::new(1, 1).requires_point_data_start_signature());
    /// ```
    pub fn requires_point_data_start_signature(&self) -> bool {
        *self == Version::new(1, 0)
    }

    /// Checks whether this version supports the feature.
    ///
    /// # Examples
    ///
    /// ```
    /// # use las_stream::Version;
    /// use las_stream::feature::Waveforms;
    /// assert!(!Version::new(1, 2).supports::<Waveforms>());
    /// assert!(Version::new(1, 4).supports::<Waveforms>());
    /// ```
    pub fn supports<F: Feature>(&self) -> bool {
        F::is_supported_by(*self)
    }

    /// Returns an error if this version doesn't support the feature.
    ///
    /// # Examples
    ///
    /// ```
    /// # use las_stream::Version;
    /// use las_stream::feature::Waveforms;
    /// assert!(Version::new(1, 2).verify_support_for::<Waveforms>().is_err());
    /// assert!(Version::new(1, 4).verify_support_for::<Waveforms>().is_ok());
    /// ```
    pub fn verify_support_for<F: Feature>(&self) -> Result<()> {
        if self.supports::<F>() {
            Ok(())
        } else {
            Err(Error::UnsupportedFeature {
                version: *self,
                feature: F::name(),
            })
        }
    }

    /// Checks whether this version supports the given point format.
    ///
    /// # Examples
    ///
    /// ```
    /// # use las_stream::Version;
    /// use las_stream::point::Format;
    /// let format = Format::new(6).unwrap();
    /// assert!(!Version::new(1, 2).supports_point_format(format));
    /// assert!(Version::new(1, 4).supports_point_format(format));
    /// ```
    pub fn supports_point_format(&self, format: Format) -> bool {
        *self >= format.min_version()
    }
}

impl Default for Version {
    fn default() -> Version {
        Version::new(1, 2)
    }
}

impl From<(u8, u8)> for Version {
    fn from((major, minor): (u8, u8)) -> Version {
        Version { major, minor }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering() {
        assert!(Version::new(1, 0) < Version::new(1, 1));
        assert!(Version::new(1, 4) > Version::new(1, 3));
        assert!(Version::new(2, 0) > Version::new(1, 4));
    }

    #[test]
    fn header_sizes() {
        for minor in 0..3 {
            assert_eq!(227, Version::new(1, minor).header_size());
        }
        assert_eq!(235, Version::new(1, 3).header_size());
        assert_eq!(375, Version::new(1, 4).header_size());
    }

    #[test]
    fn point_formats() {
        let version = Version::new(1, 3);
        for id in 0..=5 {
            assert!(version.supports_point_format(Format::new(id).unwrap()));
        }
        for id in 6..=10 {
            assert!(!version.supports_point_format(Format::new(id).unwrap()));
        }
        assert!(!Version::new(1, 1).supports_point_format(Format::new(2).unwrap()));
    }
}
