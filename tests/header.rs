//! Header metadata that has to survive a trip through a file.

use las_stream::{
    Builder, Header, Point, Reader, Vlr, Writer,
    crs::{
        Crs, GEOTIFF_KEY_DIRECTORY_RECORD_ID, GeoTiffCrs, GeoTiffData, GeoTiffKeyEntry,
        PROJECTION_USER_ID, Wkt,
    },
};
use std::io::Cursor;

fn reread(header: Header) -> Header {
    let mut writer = Writer::new(Cursor::new(Vec::new()), header).unwrap();
    writer.write_point(Point::default()).unwrap();
    let reader = Reader::new(writer.into_inner().unwrap()).unwrap();
    reader.header().clone()
}

#[test]
fn wkt_crs() {
    let mut header = Builder::from((1, 4)).into_header().unwrap();
    header.vlrs_mut().add(Vlr::new(PROJECTION_USER_ID, 34735, vec![1; 8]));
    header
        .set_wkt_crs(br#"PROJCS["NAD83",AUTHORITY["EPSG","2992"]]"#.to_vec())
        .unwrap();
    let header = reread(header);
    assert!(header.has_wkt_crs());
    assert_eq!(1, header.vlrs().len());
    let Some(Crs::Wkt(wkt)) = header.crs().unwrap() else {
        panic!("expected a WKT CRS");
    };
    assert!(wkt.as_str().ends_with("]]"));
    assert_eq!(2992, header.epsg_crs().unwrap().unwrap().horizontal);
}

#[test]
fn wkt_value_is_encoded_on_write() {
    let mut builder = Builder::from((1, 4));
    builder.has_wkt_crs = true;
    builder.vlrs.add(Vlr::with_value(
        PROJECTION_USER_ID,
        2112,
        Wkt::new(r#"GEOGCS["WGS 84",AUTHORITY["EPSG","4326"]]"#),
    ));
    let header = reread(builder.into_header().unwrap());
    let vlr = header.vlrs().get(PROJECTION_USER_ID, 2112).unwrap();
    assert_eq!(Some(&0), vlr.data.last());
    assert_eq!(
        r#"GEOGCS["WGS 84",AUTHORITY["EPSG","4326"]]"#,
        vlr.value::<Wkt>().unwrap().as_str()
    );
}

#[test]
fn geotiff_crs() {
    let geotiff = GeoTiffCrs {
        entries: vec![
            GeoTiffKeyEntry {
                id: 1024,
                data: GeoTiffData::U16(1),
            },
            GeoTiffKeyEntry {
                id: 3072,
                data: GeoTiffData::U16(32611),
            },
            GeoTiffKeyEntry {
                id: 4096,
                data: GeoTiffData::U16(5703),
            },
        ],
    };
    let mut builder = Builder::from((1, 2));
    builder.vlrs.add(Vlr::with_value(
        PROJECTION_USER_ID,
        GEOTIFF_KEY_DIRECTORY_RECORD_ID,
        geotiff.clone(),
    ));
    let header = reread(builder.into_header().unwrap());
    assert_eq!(Some(Crs::GeoTiff(geotiff)), header.crs().unwrap());
    let epsg = header.epsg_crs().unwrap().unwrap();
    assert_eq!(32611, epsg.horizontal);
    assert_eq!(Some(5703), epsg.vertical);
}

#[test]
fn remove_crs() {
    let mut header = Builder::from((1, 4)).into_header().unwrap();
    header.set_wkt_crs(b"GEOGCS[]".to_vec()).unwrap();
    header.vlrs_mut().add(Vlr::new("gadomski", 1, Vec::new()));
    header.remove_crs_vlrs();
    let header = reread(header);
    assert!(!header.has_wkt_crs());
    assert!(header.crs().unwrap().is_none());
    assert_eq!(1, header.vlrs().len());
}

#[test]
fn builder_from_read_header() {
    let mut builder = Builder::from((1, 3));
    builder.file_source_id = 7;
    builder.system_identifier = "gadomski".to_string();
    let header = reread(builder.into_header().unwrap());

    let mut builder = Builder::from(header);
    builder.version = (1, 4).into();
    let header = reread(builder.into_header().unwrap());
    assert_eq!(7, header.file_source_id());
    assert_eq!("gadomski", header.system_identifier());
    assert_eq!(375, header.header_size().unwrap());
    assert_eq!(1, header.number_of_points());
}
