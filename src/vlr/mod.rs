//! Variable length records store metadata that doesn't fit into the header.
//!
//! Every record is keyed by its user id and record id. A [VlrStore] keeps the records of one
//! header in file order:
//!
//! ```
//! use las_stream::{Vlr, VlrStore};
//!
//! let mut vlrs = VlrStore::default();
//! vlrs.add(Vlr::new("gadomski", 42, vec![1, 2, 3]));
//! vlrs.add(Vlr::new("gadomski", 43, vec![4]));
//! vlrs.add(Vlr::new("gadomski", 42, vec![5]));
//! assert_eq!(2, vlrs.len());
//! assert_eq!(vec![5], vlrs.get("gadomski", 42).unwrap().data);
//! ```
//!
//! Registered [Converter]s turn payloads into typed values and back. See [ConverterRegistry].

mod converter;

pub use self::converter::{Context, Converter, ConverterRegistry, DecodedValue};

use crate::{
    Error, Result, raw,
    utils::{AsLasStr, FromLasStr},
};
use log::warn;
use std::any::Any;

/// A variable length record.
#[derive(Clone, Debug, Default)]
pub struct Vlr {
    /// The namespace of this record, e.g. `LASF_Projection`.
    pub user_id: String,

    /// The type of this record within its namespace.
    pub record_id: u16,

    /// Free text.
    pub description: String,

    /// The payload.
    pub data: Vec<u8>,

    decoded: Option<DecodedValue>,
    pending: bool,
}

impl Vlr {
    /// The number of bytes in a record header.
    pub const HEADER_LEN: usize = 54;

    /// Creates a new record with an empty description.
    ///
    /// # Examples
    ///
    /// ```
    /// use las_stream::Vlr;
    /// let vlr = Vlr::new("gadomski", 42, vec![1, 2, 3]);
    /// assert_eq!("gadomski", vlr.user_id);
    /// ```
    pub fn new(user_id: impl Into<String>, record_id: u16, data: Vec<u8>) -> Vlr {
        Vlr {
            user_id: user_id.into(),
            record_id,
            data,
            ..Default::default()
        }
    }

    /// Creates a record whose payload will be produced from `value` by the registered
    /// converter when the record is written.
    ///
    /// # Examples
    ///
    /// ```
    /// use las_stream::{crs::Wkt, Vlr};
    /// let vlr = Vlr::with_value("LASF_Projection", 2112, Wkt::new("GEOGCS[]"));
    /// assert!(vlr.data.is_empty());
    /// assert_eq!("GEOGCS[]", vlr.value::<Wkt>().unwrap().as_str());
    /// ```
    pub fn with_value<T: Any + Send + Sync>(
        user_id: impl Into<String>,
        record_id: u16,
        value: T,
    ) -> Vlr {
        let mut vlr = Vlr::new(user_id, record_id, Vec::new());
        vlr.set_value(value);
        vlr
    }

    pub(crate) fn from_raw(raw_vlr: raw::Vlr) -> Vlr {
        Vlr {
            user_id: raw_vlr.user_id.as_las_string(),
            record_id: raw_vlr.record_id,
            description: raw_vlr.description.as_las_string(),
            data: raw_vlr.data,
            decoded: None,
            pending: false,
        }
    }

    /// Converts this record into a raw record.
    ///
    /// # Examples
    ///
    /// ```
    /// use las_stream::Vlr;
    /// let raw_vlr = Vlr::new("gadomski", 42, vec![1]).to_raw().unwrap();
    /// assert_eq!(1, raw_vlr.record_length_after_header);
    /// assert!(Vlr::new("gadomski", 42, vec![0; 65536]).to_raw().is_err());
    /// ```
    pub fn to_raw(&self) -> Result<raw::Vlr> {
        let mut user_id = [0; 16];
        user_id.from_las_str(&self.user_id)?;
        let mut description = [0; 32];
        description.from_las_str(&self.description)?;
        let record_length_after_header =
            u16::try_from(self.data.len()).map_err(|_| Error::VlrTooLong(self.data.len()))?;
        Ok(raw::Vlr {
            reserved: 0,
            user_id,
            record_id: self.record_id,
            record_length_after_header,
            description,
            data: self.data.clone(),
        })
    }

    /// Returns the number of bytes this record takes up on disk, header included.
    ///
    /// # Examples
    ///
    /// ```
    /// use las_stream::Vlr;
    /// assert_eq!(54, Vlr::default().len());
    /// assert_eq!(57, Vlr::new("gadomski", 1, vec![1, 2, 3]).len());
    /// ```
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        Vlr::HEADER_LEN + self.data.len()
    }

    /// Returns true if this record has the given key.
    pub fn is(&self, user_id: &str, record_id: u16) -> bool {
        self.user_id == user_id && self.record_id == record_id
    }

    /// Sets the typed value of this record.
    ///
    /// The payload is re-encoded by the registered converter before the record is written.
    pub fn set_value<T: Any + Send + Sync>(&mut self, value: T) {
        self.decoded = Some(DecodedValue::new(value));
        self.pending = true;
    }

    /// Returns the typed value of this record, if it has been decoded as a `T`.
    pub fn value<T: Any>(&self) -> Option<&T> {
        self.decoded.as_ref().and_then(|decoded| decoded.downcast_ref())
    }

    /// Returns the decoded value of this record, whatever its type.
    pub fn decoded(&self) -> Option<&DecodedValue> {
        self.decoded.as_ref()
    }

    /// Returns true if this record's value was set and hasn't been encoded yet.
    pub fn is_pending(&self) -> bool {
        self.pending
    }
}

impl PartialEq for Vlr {
    fn eq(&self, other: &Vlr) -> bool {
        self.user_id == other.user_id
            && self.record_id == other.record_id
            && self.description == other.description
            && self.data == other.data
    }
}

/// The variable length records of a header, in file order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VlrStore {
    vlrs: Vec<Vlr>,
}

impl VlrStore {
    /// Adds a record, replacing any record with the same key in place.
    pub fn add(&mut self, vlr: Vlr) {
        if let Some(existing) = self.get_mut(&vlr.user_id, vlr.record_id) {
            *existing = vlr;
        } else {
            self.vlrs.push(vlr);
        }
    }

    /// Returns the record with this key.
    pub fn get(&self, user_id: &str, record_id: u16) -> Option<&Vlr> {
        self.vlrs.iter().find(|vlr| vlr.is(user_id, record_id))
    }

    /// Returns the record with this key, mutably.
    pub fn get_mut(&mut self, user_id: &str, record_id: u16) -> Option<&mut Vlr> {
        self.vlrs.iter_mut().find(|vlr| vlr.is(user_id, record_id))
    }

    /// Iterates over the records in file order.
    pub fn iter(&self) -> std::slice::Iter<'_, Vlr> {
        self.vlrs.iter()
    }

    /// Returns the number of records.
    pub fn len(&self) -> usize {
        self.vlrs.len()
    }

    /// Returns true if there are no records.
    pub fn is_empty(&self) -> bool {
        self.vlrs.is_empty()
    }

    /// Removes and returns the record with this key.
    pub fn remove(&mut self, user_id: &str, record_id: u16) -> Option<Vlr> {
        let index = self.vlrs.iter().position(|vlr| vlr.is(user_id, record_id))?;
        Some(self.vlrs.remove(index))
    }

    /// Removes every record under `user_id`, returning how many were removed.
    ///
    /// # Examples
    ///
    /// ```
    /// use las_stream::{Vlr, VlrStore};
    /// let mut vlrs: VlrStore = [
    ///     Vlr::new("LASF_Projection", 34735, Vec::new()),
    ///     Vlr::new("gadomski", 1, Vec::new()),
    ///     Vlr::new("LASF_Projection", 34736, Vec::new()),
    /// ]
    /// .into_iter()
    /// .collect();
    /// assert_eq!(2, vlrs.remove_all("LASF_Projection"));
    /// assert_eq!(1, vlrs.len());
    /// ```
    pub fn remove_all(&mut self, user_id: &str) -> usize {
        let before = self.vlrs.len();
        self.vlrs.retain(|vlr| vlr.user_id != user_id);
        before - self.vlrs.len()
    }

    /// Returns the number of bytes the records take up on disk.
    pub fn data_len(&self) -> u64 {
        self.vlrs.iter().map(|vlr| vlr.len() as u64).sum()
    }

    /// Decodes every record that has a registered converter.
    ///
    /// A record that fails to decode is logged and left without a value. It never fails the
    /// whole header.
    pub fn decode_all(&mut self, registry: &ConverterRegistry, context: Context<'_>) {
        let context = context.with_vlrs(self);
        let decoded: Vec<(usize, DecodedValue)> = self
            .vlrs
            .iter()
            .enumerate()
            .filter_map(|(index, vlr)| {
                let converter = registry.get(&vlr.user_id, vlr.record_id)?;
                match converter.decode(&context, &vlr.data) {
                    Ok(value) => Some((index, value)),
                    Err(err) => {
                        warn!(
                            "{}",
                            Error::ConverterDecode {
                                user_id: vlr.user_id.clone(),
                                record_id: vlr.record_id,
                                message: err.to_string(),
                            }
                        );
                        None
                    }
                }
            })
            .collect();
        for (index, value) in decoded {
            self.vlrs[index].decoded = Some(value);
        }
    }

    /// Encodes the payload of every record whose value was set with [Vlr::set_value].
    ///
    /// Records without a registered converter keep their payload as is.
    pub fn encode_pending(
        &mut self,
        registry: &ConverterRegistry,
        context: Context<'_>,
    ) -> Result<()> {
        let context = context.with_vlrs(self);
        let mut encoded = Vec::new();
        for (index, vlr) in self.vlrs.iter().enumerate() {
            if !vlr.pending {
                continue;
            }
            let (Some(converter), Some(value)) =
                (registry.get(&vlr.user_id, vlr.record_id), vlr.decoded.as_ref())
            else {
                warn!(
                    "no converter for pending vlr {}/{}, keeping its payload",
                    vlr.user_id, vlr.record_id
                );
                continue;
            };
            let data = converter
                .encode(&context, value)
                .map_err(|err| Error::ConverterEncode {
                    user_id: vlr.user_id.clone(),
                    record_id: vlr.record_id,
                    message: err.to_string(),
                })?;
            encoded.push((index, data));
        }
        for (index, data) in encoded {
            self.vlrs[index].data = data;
        }
        for vlr in &mut self.vlrs {
            vlr.pending = false;
        }
        Ok(())
    }
}

impl FromIterator<Vlr> for VlrStore {
    fn from_iter<I: IntoIterator<Item = Vlr>>(iter: I) -> VlrStore {
        let mut store = VlrStore::default();
        for vlr in iter {
            store.add(vlr);
        }
        store
    }
}

impl<'a> IntoIterator for &'a VlrStore {
    type Item = &'a Vlr;
    type IntoIter = std::slice::Iter<'a, Vlr>;

    fn into_iter(self) -> Self::IntoIter {
        self.vlrs.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Version, point::Format};

    #[derive(Debug)]
    struct Doubled(Vec<u8>);

    struct DoublingConverter;

    impl Converter for DoublingConverter {
        fn decode(&self, _: &Context<'_>, data: &[u8]) -> Result<DecodedValue> {
            if data.is_empty() {
                return Err(Error::InvalidCompressionHeader("empty".to_string()));
            }
            Ok(DecodedValue::new(Doubled(
                data.iter().map(|n| n * 2).collect(),
            )))
        }

        fn encode(&self, _: &Context<'_>, value: &DecodedValue) -> Result<Vec<u8>> {
            let doubled = value
                .downcast_ref::<Doubled>()
                .ok_or_else(|| Error::InvalidCompressionHeader("wrong type".to_string()))?;
            Ok(doubled.0.iter().map(|n| n / 2).collect())
        }
    }

    fn registry() -> ConverterRegistry {
        let mut registry = ConverterRegistry::new();
        let _ = registry.register("test", 1, DoublingConverter);
        registry
    }

    fn context() -> Context<'static> {
        Context::new(Version::new(1, 4), Format::default())
    }

    #[test]
    fn len() {
        assert_eq!(55, Vlr::new("", 0, vec![0]).len());
    }

    #[test]
    fn add_replaces_in_place() {
        let mut vlrs = VlrStore::default();
        vlrs.add(Vlr::new("a", 1, vec![1]));
        vlrs.add(Vlr::new("b", 1, vec![2]));
        vlrs.add(Vlr::new("a", 1, vec![3]));
        let data: Vec<_> = vlrs.iter().map(|vlr| vlr.data.clone()).collect();
        assert_eq!(vec![vec![3], vec![2]], data);
        assert!(vlrs.remove("a", 1).is_some());
        assert!(vlrs.remove("a", 1).is_none());
    }

    #[test]
    fn decode_failure_is_isolated() {
        let mut vlrs: VlrStore = [
            Vlr::new("test", 1, Vec::new()),
            Vlr::new("other", 1, vec![1]),
        ]
        .into_iter()
        .collect();
        vlrs.decode_all(&registry(), context());
        assert!(vlrs.get("test", 1).unwrap().decoded().is_none());

        let mut vlrs: VlrStore = [Vlr::new("test", 1, vec![1, 2])].into_iter().collect();
        vlrs.decode_all(&registry(), context());
        assert_eq!(
            vec![2, 4],
            vlrs.get("test", 1).unwrap().value::<Doubled>().unwrap().0
        );
    }

    #[test]
    fn encode_pending() {
        let mut vlrs = VlrStore::default();
        vlrs.add(Vlr::with_value("test", 1, Doubled(vec![8, 10])));
        vlrs.add(Vlr::with_value("unregistered", 1, Doubled(vec![1])));
        vlrs.encode_pending(&registry(), context()).unwrap();
        assert_eq!(vec![4, 5], vlrs.get("test", 1).unwrap().data);
        assert!(!vlrs.get("test", 1).unwrap().is_pending());
        assert!(vlrs.get("unregistered", 1).unwrap().data.is_empty());
    }

    #[test]
    fn encode_failure_is_returned() {
        let mut vlrs = VlrStore::default();
        vlrs.add(Vlr::with_value("test", 1, 42u8));
        assert!(matches!(
            vlrs.encode_pending(&registry(), context()),
            Err(Error::ConverterEncode { record_id: 1, .. })
        ));
    }
}
