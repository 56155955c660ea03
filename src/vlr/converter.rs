use super::{Vlr, VlrStore};
use crate::{
    Result, Version,
    compression::{CompressionConverter, LASZIP_RECORD_ID, LASZIP_USER_ID},
    crs::{
        GEOTIFF_KEY_DIRECTORY_RECORD_ID, GeoTiffConverter, PROJECTION_USER_ID, WKT_RECORD_ID,
        WktConverter,
    },
    point::Format,
};
use std::{any::Any, collections::HashMap, fmt, sync::Arc};

/// Turns a vlr payload into a typed value and back.
///
/// # Examples
///
/// ```
/// use las_stream::{vlr::{Context, Converter, DecodedValue}, Result};
///
/// struct Text;
///
/// impl Converter for Text {
///     fn decode(&self, _: &Context<'_>, data: &[u8]) -> Result<DecodedValue> {
///         Ok(DecodedValue::new(String::from_utf8_lossy(data).into_owned()))
///     }
///
///     fn encode(&self, _: &Context<'_>, value: &DecodedValue) -> Result<Vec<u8>> {
///         Ok(value
///             .downcast_ref::<String>()
///             .map(|s| s.as_bytes().to_vec())
///             .unwrap_or_default())
///     }
/// }
/// ```
pub trait Converter: Send + Sync {
    /// Decodes a payload.
    fn decode(&self, context: &Context<'_>, data: &[u8]) -> Result<DecodedValue>;

    /// Encodes a value into a payload.
    fn encode(&self, context: &Context<'_>, value: &DecodedValue) -> Result<Vec<u8>>;
}

/// What a converter knows about the file around the record it converts.
#[derive(Clone, Copy, Debug)]
pub struct Context<'a> {
    version: Version,
    point_format: Format,
    vlrs: Option<&'a VlrStore>,
}

impl Context<'static> {
    /// Creates a context with no sibling records.
    pub fn new(version: Version, point_format: Format) -> Context<'static> {
        Context {
            version,
            point_format,
            vlrs: None,
        }
    }
}

impl<'a> Context<'a> {
    pub(crate) fn with_vlrs<'b>(self, vlrs: &'b VlrStore) -> Context<'b> {
        Context {
            version: self.version,
            point_format: self.point_format,
            vlrs: Some(vlrs),
        }
    }

    /// Returns the las version of the file.
    pub fn version(&self) -> Version {
        self.version
    }

    /// Returns the point format of the file.
    pub fn point_format(&self) -> Format {
        self.point_format
    }

    /// Returns a sibling record, e.g. the GeoTIFF double parameters that go with a key directory.
    pub fn vlr(&self, user_id: &str, record_id: u16) -> Option<&'a Vlr> {
        self.vlrs.and_then(|vlrs| vlrs.get(user_id, record_id))
    }
}

/// A decoded vlr value of any type.
///
/// Cloning is cheap, the value itself is shared.
#[derive(Clone)]
pub struct DecodedValue(Arc<dyn Any + Send + Sync>);

impl DecodedValue {
    /// Wraps a value.
    ///
    /// # Examples
    ///
    /// ```
    /// use las_stream::vlr::DecodedValue;
    /// let value = DecodedValue::new(42u16);
    /// assert_eq!(Some(&42), value.downcast_ref::<u16>());
    /// assert!(value.downcast_ref::<u8>().is_none());
    /// ```
    pub fn new<T: Any + Send + Sync>(value: T) -> DecodedValue {
        DecodedValue(Arc::new(value))
    }

    /// Returns the value if it is a `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref()
    }
}

impl fmt::Debug for DecodedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DecodedValue").finish_non_exhaustive()
    }
}

/// Converters keyed by user id and record id.
///
/// The registry is a plain value that readers and writers take through their options, so two
/// readers can decode the same file differently.
///
/// ```
/// use las_stream::ConverterRegistry;
///
/// assert!(ConverterRegistry::new().get("LASF_Projection", 2112).is_none());
/// assert!(ConverterRegistry::default().get("LASF_Projection", 2112).is_some());
/// ```
#[derive(Clone)]
pub struct ConverterRegistry {
    converters: HashMap<(String, u16), Arc<dyn Converter>>,
}

impl ConverterRegistry {
    /// Creates a registry with no converters.
    pub fn new() -> ConverterRegistry {
        ConverterRegistry {
            converters: HashMap::new(),
        }
    }

    /// Registers a converter, returning the one it replaced.
    pub fn register<C: Converter + 'static>(
        &mut self,
        user_id: impl Into<String>,
        record_id: u16,
        converter: C,
    ) -> Option<Arc<dyn Converter>> {
        self.converters
            .insert((user_id.into(), record_id), Arc::new(converter))
    }

    /// Removes the converter for this key.
    pub fn unregister(&mut self, user_id: &str, record_id: u16) -> Option<Arc<dyn Converter>> {
        self.converters.remove(&(user_id.to_string(), record_id))
    }

    /// Returns the converter for this key.
    pub fn get(&self, user_id: &str, record_id: u16) -> Option<&Arc<dyn Converter>> {
        self.converters.get(&(user_id.to_string(), record_id))
    }
}

impl Default for ConverterRegistry {
    /// The GeoTIFF key directory, WKT, and laszip converters.
    fn default() -> ConverterRegistry {
        let mut registry = ConverterRegistry::new();
        let _ = registry.register(
            PROJECTION_USER_ID,
            GEOTIFF_KEY_DIRECTORY_RECORD_ID,
            GeoTiffConverter,
        );
        let _ = registry.register(PROJECTION_USER_ID, WKT_RECORD_ID, WktConverter);
        let _ = registry.register(LASZIP_USER_ID, LASZIP_RECORD_ID, CompressionConverter);
        registry
    }
}

impl fmt::Debug for ConverterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<_> = self.converters.keys().collect();
        keys.sort();
        f.debug_struct("ConverterRegistry")
            .field("keys", &keys)
            .finish()
    }
}
