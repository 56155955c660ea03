//! Coordinate reference system records.
//!
//! A CRS is stored in `LASF_Projection` vlrs, either as [WKT](Wkt) or as
//! [GeoTIFF keys](GeoTiffCrs). This crate treats both as opaque descriptions. The only
//! interpretation it does is [Header::epsg_crs], a best-effort search for
//! [EPSG](https://en.wikipedia.org/wiki/EPSG_Geodetic_Parameter_Dataset) codes.
//!
//! Only WKT can be set through the header:
//!
//! ```
//! use las_stream::{Builder, crs::Crs};
//!
//! let mut header = Builder::from((1, 4)).into_header().unwrap();
//! header.set_wkt_crs(b"PROJCS[\"NAD83 / Oregon GIC Lambert (ft)\",AUTHORITY[\"EPSG\",\"2992\"]]".to_vec()).unwrap();
//! assert!(header.has_wkt_crs());
//! assert!(matches!(header.crs().unwrap(), Some(Crs::Wkt(_))));
//! assert_eq!(2992, header.epsg_crs().unwrap().unwrap().horizontal);
//! ```

use crate::{
    Error, Header, Result, Vlr,
    feature::WktCrs,
    vlr::{Context, Converter, DecodedValue},
};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use log::warn;
use std::io::{Cursor, Seek, SeekFrom};

/// The user id of every CRS record.
pub const PROJECTION_USER_ID: &str = "LASF_Projection";
/// The GeoTIFF key directory.
pub const GEOTIFF_KEY_DIRECTORY_RECORD_ID: u16 = 34735;
/// Double parameters referenced by the key directory.
pub const GEOTIFF_DOUBLE_PARAMS_RECORD_ID: u16 = 34736;
/// ASCII parameters referenced by the key directory.
pub const GEOTIFF_ASCII_PARAMS_RECORD_ID: u16 = 34737;
/// OGC well known text.
pub const WKT_RECORD_ID: u16 = 2112;

const EPSG_RANGE: std::ops::RangeInclusive<u16> = 1024..=(i16::MAX as u16);

/// A coordinate reference system as found in a header.
#[derive(Clone, Debug, PartialEq)]
pub enum Crs {
    /// Well known text.
    Wkt(Wkt),
    /// GeoTIFF keys.
    GeoTiff(GeoTiffCrs),
}

/// Well known text, without its nul terminator.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Wkt(String);

impl Wkt {
    /// Wraps a WKT string.
    pub fn new(wkt: impl Into<String>) -> Wkt {
        Wkt(wkt.into())
    }

    fn from_bytes(bytes: &[u8]) -> Wkt {
        let end = bytes.iter().position(|&n| n == 0).unwrap_or(bytes.len());
        Wkt(String::from_utf8_lossy(&bytes[..end]).into_owned())
    }

    fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = self.0.as_bytes().to_vec();
        bytes.push(0);
        bytes
    }

    /// Returns the text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Horizontal and optional vertical CRS given by EPSG code(s).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EpsgCrs {
    /// EPSG code for the horizontal CRS.
    pub horizontal: u16,

    /// Optional EPSG code for the vertical CRS.
    pub vertical: Option<u16>,
}

/// GeoTIFF CRS data.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GeoTiffCrs {
    /// The key entries.
    pub entries: Vec<GeoTiffKeyEntry>,
}

/// The value of a GeoTIFF key.
#[derive(Clone, Debug, PartialEq)]
pub enum GeoTiffData {
    /// A short stored in the key itself.
    U16(u16),
    /// A string from the ascii parameters record.
    String(String),
    /// Doubles from the double parameters record.
    Doubles(Vec<f64>),
}

/// A single GeoTIFF key entry.
#[derive(Clone, Debug, PartialEq)]
pub struct GeoTiffKeyEntry {
    /// The key id.
    pub id: u16,
    /// The key's value.
    pub data: GeoTiffData,
}

impl GeoTiffCrs {
    /// Reads a key directory and resolves its parameters.
    pub fn read_from(
        key_directory: &[u8],
        double_params: Option<&[u8]>,
        ascii_params: Option<&[u8]>,
    ) -> Result<GeoTiffCrs> {
        let mut key_directory = Cursor::new(key_directory);
        // key directory version, key revision, minor revision
        for _ in 0..3 {
            let _ = key_directory.read_u16::<LittleEndian>()?;
        }
        let number_of_keys = key_directory.read_u16::<LittleEndian>()?;
        let mut entries = Vec::with_capacity(usize::from(number_of_keys));
        for _ in 0..number_of_keys {
            entries.push(GeoTiffKeyEntry::read_from(
                &mut key_directory,
                double_params,
                ascii_params,
            )?);
        }
        Ok(GeoTiffCrs { entries })
    }

    /// Writes a key directory.
    ///
    /// Only keys with short values can be written, since doubles and strings would need their
    /// own records.
    pub fn to_key_directory(&self) -> Result<Vec<u8>> {
        let mut bytes = Vec::with_capacity(8 + 8 * self.entries.len());
        for n in [1, 1, 0, u16::try_from(self.entries.len())?] {
            bytes.write_u16::<LittleEndian>(n)?;
        }
        for entry in &self.entries {
            let GeoTiffData::U16(value) = entry.data else {
                return Err(Error::UnimplementedForGeoTiffStringAndDoubleData(
                    entry.data.clone(),
                ));
            };
            for n in [entry.id, 0, 1, value] {
                bytes.write_u16::<LittleEndian>(n)?;
            }
        }
        Ok(bytes)
    }
}

impl GeoTiffKeyEntry {
    fn read_from(
        key_directory: &mut Cursor<&[u8]>,
        double_params: Option<&[u8]>,
        ascii_params: Option<&[u8]>,
    ) -> Result<GeoTiffKeyEntry> {
        let id = key_directory.read_u16::<LittleEndian>()?;
        let location = key_directory.read_u16::<LittleEndian>()?;
        let count = key_directory.read_u16::<LittleEndian>()?;
        let offset = key_directory.read_u16::<LittleEndian>()?;
        let data = match location {
            0 => GeoTiffData::U16(offset),
            GEOTIFF_DOUBLE_PARAMS_RECORD_ID => {
                let mut cursor = Cursor::new(double_params.ok_or(Error::UnreadableGeoTiffCrs)?);
                // offset is an index into the doubles
                let _ = cursor.seek(SeekFrom::Start(u64::from(offset) * 8))?;
                let mut doubles = vec![0.; usize::from(count)];
                cursor.read_f64_into::<LittleEndian>(&mut doubles)?;
                GeoTiffData::Doubles(doubles)
            }
            GEOTIFF_ASCII_PARAMS_RECORD_ID => {
                let ascii_params = ascii_params.ok_or(Error::UnreadableGeoTiffCrs)?;
                let start = usize::from(offset);
                let end = start + usize::from(count);
                let bytes = ascii_params
                    .get(start..end)
                    .ok_or(Error::UnreadableGeoTiffCrs)?;
                GeoTiffData::String(bytes.iter().map(|&b| char::from(b)).collect())
            }
            _ => return Err(Error::UndefinedDataForGeoTiffKey(id)),
        };
        Ok(GeoTiffKeyEntry { id, data })
    }
}

/// Converts the GeoTIFF key directory, pulling parameters from its sibling records.
#[derive(Clone, Copy, Debug, Default)]
pub struct GeoTiffConverter;

impl Converter for GeoTiffConverter {
    fn decode(&self, context: &Context<'_>, data: &[u8]) -> Result<DecodedValue> {
        let double_params = context
            .vlr(PROJECTION_USER_ID, GEOTIFF_DOUBLE_PARAMS_RECORD_ID)
            .map(|vlr| vlr.data.as_slice());
        let ascii_params = context
            .vlr(PROJECTION_USER_ID, GEOTIFF_ASCII_PARAMS_RECORD_ID)
            .map(|vlr| vlr.data.as_slice());
        GeoTiffCrs::read_from(data, double_params, ascii_params).map(DecodedValue::new)
    }

    fn encode(&self, _: &Context<'_>, value: &DecodedValue) -> Result<Vec<u8>> {
        value
            .downcast_ref::<GeoTiffCrs>()
            .ok_or(Error::UnreadableGeoTiffCrs)?
            .to_key_directory()
    }
}

/// Converts the WKT record.
#[derive(Clone, Copy, Debug, Default)]
pub struct WktConverter;

impl Converter for WktConverter {
    fn decode(&self, _: &Context<'_>, data: &[u8]) -> Result<DecodedValue> {
        Ok(DecodedValue::new(Wkt::from_bytes(data)))
    }

    fn encode(&self, _: &Context<'_>, value: &DecodedValue) -> Result<Vec<u8>> {
        value
            .downcast_ref::<Wkt>()
            .map(Wkt::to_bytes)
            .ok_or(Error::UnreadableWktCrs)
    }
}

impl Header {
    /// Returns the coordinate reference system, if the header has one.
    ///
    /// WKT wins over GeoTIFF if a file has both. Values decoded when the header was read are
    /// reused, otherwise the payloads are parsed here.
    pub fn crs(&self) -> Result<Option<Crs>> {
        let vlrs = self.vlrs();
        if let Some(vlr) = vlrs.get(PROJECTION_USER_ID, WKT_RECORD_ID) {
            if !self.has_wkt_crs() {
                warn!("WKT CRS vlr found, but the header says it does not exist");
            }
            let wkt = vlr
                .value::<Wkt>()
                .cloned()
                .unwrap_or_else(|| Wkt::from_bytes(&vlr.data));
            Ok(Some(Crs::Wkt(wkt)))
        } else if let Some(vlr) = vlrs.get(PROJECTION_USER_ID, GEOTIFF_KEY_DIRECTORY_RECORD_ID) {
            if self.has_wkt_crs() {
                warn!("only GeoTIFF CRS vlrs found, but the header says WKT exists");
            }
            let geotiff = match vlr.value::<GeoTiffCrs>() {
                Some(geotiff) => geotiff.clone(),
                None => GeoTiffCrs::read_from(
                    &vlr.data,
                    param_data(vlrs.get(PROJECTION_USER_ID, GEOTIFF_DOUBLE_PARAMS_RECORD_ID)),
                    param_data(vlrs.get(PROJECTION_USER_ID, GEOTIFF_ASCII_PARAMS_RECORD_ID)),
                )?,
            };
            Ok(Some(Crs::GeoTiff(geotiff)))
        } else {
            if self.has_wkt_crs() {
                warn!("no WKT CRS vlr found, but the header says it exists");
            }
            Ok(None)
        }
    }

    /// Replaces every CRS record with a WKT record.
    ///
    /// Only las 1.4 can flag its CRS as WKT.
    ///
    /// # Examples
    ///
    /// ```
    /// use las_stream::Header;
    /// let mut header = Header::default();
    /// assert!(header.set_wkt_crs(b"GEOGCS[]".to_vec()).is_err());
    /// ```
    pub fn set_wkt_crs(&mut self, wkt: Vec<u8>) -> Result<()> {
        self.version().verify_support_for::<WktCrs>()?;
        if wkt.len() > usize::from(u16::MAX) {
            return Err(Error::VlrTooLong(wkt.len()));
        }
        let _ = self.vlrs_mut().remove_all(PROJECTION_USER_ID);
        let mut vlr = Vlr::new(PROJECTION_USER_ID, WKT_RECORD_ID, wkt);
        vlr.description = "OGC WKT Coordinate System".to_string();
        self.vlrs_mut().add(vlr);
        self.set_has_wkt_crs(true);
        Ok(())
    }

    /// Removes every CRS record and clears the WKT flag.
    pub fn remove_crs_vlrs(&mut self) {
        let _ = self.vlrs_mut().remove_all(PROJECTION_USER_ID);
        self.set_has_wkt_crs(false);
    }

    /// Tries to find EPSG code(s) in the CRS records.
    ///
    /// This is not a CRS parser: it looks for the authority codes at the end of the horizontal
    /// and vertical WKT pieces, or for the projected, geographic, and vertical GeoTIFF keys. The
    /// codes are not validated.
    pub fn epsg_crs(&self) -> Result<Option<EpsgCrs>> {
        match self.crs()? {
            Some(Crs::Wkt(wkt)) => epsg_from_wkt(wkt.as_str()).map(Some),
            Some(Crs::GeoTiff(geotiff)) => epsg_from_geotiff(&geotiff).map(Some),
            None => Ok(None),
        }
    }
}

fn param_data(vlr: Option<&Vlr>) -> Option<&[u8]> {
    vlr.map(|vlr| vlr.data.as_slice())
}

/// Parses EPSG code(s) from the ends of the horizontal and vertical WKT pieces.
///
/// # Examples
///
/// ```
/// use las_stream::crs::epsg_from_wkt;
/// let wkt = r#"COMPD_CS[PROJCS[AUTHORITY["EPSG","2992"]],VERT_CS[AUTHORITY["EPSG","6360"]]]"#;
/// let epsg = epsg_from_wkt(wkt).unwrap();
/// assert_eq!(2992, epsg.horizontal);
/// assert_eq!(Some(6360), epsg.vertical);
/// ```
pub fn epsg_from_wkt(wkt: &str) -> Result<EpsgCrs> {
    // VERT_CS for WKT 1, VERTCRS or VERTICALCRS for WKT 2
    let pieces: Vec<&str> = ["VERTCRS", "VERTICALCRS", "VERT_CS"]
        .iter()
        .find_map(|keyword| wkt.split_once(keyword))
        .map(|(horizontal, vertical)| vec![horizontal, vertical])
        .unwrap_or_else(|| vec![wkt]);
    let mut codes = pieces.iter().map(|piece| trailing_code(piece));
    let horizontal = codes
        .next()
        .flatten()
        .ok_or(Error::UnreadableWktCrs)?;
    Ok(EpsgCrs {
        horizontal,
        vertical: codes.next().flatten(),
    })
}

// The code is the last run of digits within the last ten bytes of a piece.
fn trailing_code(piece: &str) -> Option<u16> {
    let tail: Vec<u8> = piece.bytes().rev().take(10).collect();
    let digits: String = tail
        .iter()
        .skip_while(|b| !b.is_ascii_digit())
        .take_while(|b| b.is_ascii_digit())
        .map(|&b| char::from(b))
        .collect::<String>()
        .chars()
        .rev()
        .collect();
    digits
        .parse::<u16>()
        .ok()
        .filter(|code| EPSG_RANGE.contains(code))
}

/// Gets the EPSG code(s) from GeoTIFF keys.
pub fn epsg_from_geotiff(geotiff: &GeoTiffCrs) -> Result<EpsgCrs> {
    let mut horizontal = 0;
    let mut vertical = None;
    for entry in &geotiff.entries {
        match (entry.id, &entry.data) {
            // GTModelTypeGeoKey
            (1024, GeoTiffData::U16(0)) => return Err(Error::UnreadableGeoTiffCrs),
            (1024, GeoTiffData::U16(1..=3)) => {}
            (1024, GeoTiffData::U16(32_767)) => return Err(Error::UserDefinedCrs),
            (1024, data) => {
                return Err(Error::UnimplementedForGeoTiffStringAndDoubleData(
                    data.clone(),
                ));
            }
            // ProjectedCSTypeGeoKey and GeographicTypeGeoKey
            (2048 | 3072, GeoTiffData::U16(code)) => horizontal = *code,
            // VerticalCSTypeGeoKey
            (4096, GeoTiffData::U16(code)) => vertical = Some(*code),
            _ => {}
        }
    }
    if !EPSG_RANGE.contains(&horizontal) {
        return Err(Error::UnreadableGeoTiffCrs);
    }
    Ok(EpsgCrs {
        horizontal,
        vertical,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Builder, ConverterRegistry, Version, point::Format, vlr::VlrStore};

    fn key_directory(keys: &[[u16; 4]]) -> Vec<u8> {
        let mut bytes = Vec::new();
        for n in [1, 1, 0, keys.len() as u16] {
            bytes.write_u16::<LittleEndian>(n).unwrap();
        }
        for key in keys {
            for &n in key {
                bytes.write_u16::<LittleEndian>(n).unwrap();
            }
        }
        bytes
    }

    #[test]
    fn geotiff_with_params() {
        let keys = key_directory(&[
            [1024, 0, 1, 1],
            [3072, 0, 1, 25832],
            [4096, 0, 1, 5941],
            [2049, GEOTIFF_ASCII_PARAMS_RECORD_ID, 5, 0],
            [2057, GEOTIFF_DOUBLE_PARAMS_RECORD_ID, 1, 1],
        ]);
        let mut doubles = Vec::new();
        for n in [1., 6378137.] {
            doubles.write_f64::<LittleEndian>(n).unwrap();
        }
        let vlrs: VlrStore = [
            Vlr::new(PROJECTION_USER_ID, GEOTIFF_KEY_DIRECTORY_RECORD_ID, keys),
            Vlr::new(PROJECTION_USER_ID, GEOTIFF_DOUBLE_PARAMS_RECORD_ID, doubles),
            Vlr::new(PROJECTION_USER_ID, GEOTIFF_ASCII_PARAMS_RECORD_ID, b"ETRS|".to_vec()),
        ]
        .into_iter()
        .collect();
        let mut builder = Builder::from((1, 2));
        builder.vlrs = vlrs.clone();
        let header = builder.into_header().unwrap();
        let Some(Crs::GeoTiff(geotiff)) = header.crs().unwrap() else {
            panic!("expected a GeoTIFF CRS");
        };
        assert_eq!(GeoTiffData::String("ETRS|".to_string()), geotiff.entries[3].data);
        assert_eq!(GeoTiffData::Doubles(vec![6378137.]), geotiff.entries[4].data);
        let epsg = header.epsg_crs().unwrap().unwrap();
        assert_eq!(25832, epsg.horizontal);
        assert_eq!(Some(5941), epsg.vertical);

        let mut vlrs = vlrs;
        vlrs.decode_all(
            &ConverterRegistry::default(),
            Context::new(Version::new(1, 2), Format::default()),
        );
        let decoded = vlrs
            .get(PROJECTION_USER_ID, GEOTIFF_KEY_DIRECTORY_RECORD_ID)
            .unwrap()
            .value::<GeoTiffCrs>()
            .unwrap();
        assert_eq!(&geotiff, decoded);
    }

    #[test]
    fn user_defined_geotiff() {
        let geotiff = GeoTiffCrs {
            entries: vec![GeoTiffKeyEntry {
                id: 1024,
                data: GeoTiffData::U16(32_767),
            }],
        };
        assert!(matches!(
            epsg_from_geotiff(&geotiff),
            Err(Error::UserDefinedCrs)
        ));
    }

    #[test]
    fn geotiff_key_directory_roundtrip() {
        let geotiff = GeoTiffCrs {
            entries: vec![
                GeoTiffKeyEntry {
                    id: 1024,
                    data: GeoTiffData::U16(1),
                },
                GeoTiffKeyEntry {
                    id: 3072,
                    data: GeoTiffData::U16(32610),
                },
            ],
        };
        let bytes = geotiff.to_key_directory().unwrap();
        assert_eq!(geotiff, GeoTiffCrs::read_from(&bytes, None, None).unwrap());

        let geotiff = GeoTiffCrs {
            entries: vec![GeoTiffKeyEntry {
                id: 2049,
                data: GeoTiffData::String("WGS 84|".to_string()),
            }],
        };
        assert!(geotiff.to_key_directory().is_err());
    }

    #[test]
    fn wkt_2() {
        let wkt = r#"COMPOUNDCRS["x",PROJCRS["y",ID["EPSG",25833]],VERTCRS["z",ID["EPSG",5941]]]"#;
        let epsg = epsg_from_wkt(wkt).unwrap();
        assert_eq!(25833, epsg.horizontal);
        assert_eq!(Some(5941), epsg.vertical);
        assert!(epsg_from_wkt("LOCAL_CS[]").is_err());
    }

    #[test]
    fn set_wkt_replaces_projection_records() {
        let mut builder = Builder::from((1, 4));
        builder.vlrs.add(Vlr::new(
            PROJECTION_USER_ID,
            GEOTIFF_KEY_DIRECTORY_RECORD_ID,
            key_directory(&[[3072, 0, 1, 4326]]),
        ));
        builder.vlrs.add(Vlr::new("other", 1, Vec::new()));
        let mut header = builder.into_header().unwrap();
        header.set_wkt_crs(b"GEOGCS[\"WGS 84\",AUTHORITY[\"EPSG\",\"4326\"]]\0".to_vec())
            .unwrap();
        assert_eq!(2, header.vlrs().len());
        assert!(header.has_wkt_crs());
        let Some(Crs::Wkt(wkt)) = header.crs().unwrap() else {
            panic!("expected a WKT CRS");
        };
        assert!(wkt.as_str().ends_with("]]"));
        assert_eq!(4326, header.epsg_crs().unwrap().unwrap().horizontal);

        header.remove_crs_vlrs();
        assert!(!header.has_wkt_crs());
        assert!(header.crs().unwrap().is_none());
        assert_eq!(1, header.vlrs().len());
    }

    #[test]
    fn wkt_needs_1_4() {
        let mut header = Builder::from((1, 3)).into_header().unwrap();
        assert!(matches!(
            header.set_wkt_crs(b"GEOGCS[]".to_vec()),
            Err(Error::UnsupportedFeature { .. })
        ));
    }
}
