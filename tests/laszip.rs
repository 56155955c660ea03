use las_stream::{Builder, Error, Writer, point::Format};
use std::io::Cursor;

fn compressed_header(id: u8) -> las_stream::Header {
    let mut builder = Builder::from((1, 4));
    builder.point_format = Format::new(id).unwrap();
    builder.point_format.is_compressed = true;
    builder.into_header().unwrap()
}

#[test]
fn detect_laszip() {
    let result = Writer::new(Cursor::new(Vec::new()), compressed_header(3));
    if cfg!(feature = "laz") {
        assert!(result.is_ok());
    } else {
        assert!(matches!(result, Err(Error::LaszipNotEnabled)));
    }
}

#[cfg(feature = "laz")]
mod laz_compression_test {
    use super::*;
    use las_stream::{Color, Point, Reader};

    fn points(format: Format, n: u32) -> Vec<Point> {
        (0..n)
            .map(|i| Point {
                x: f64::from(i),
                y: f64::from(i) * 2.,
                z: -f64::from(i),
                intensity: u16::try_from(i % 1000).unwrap(),
                return_number: 1,
                number_of_returns: 1,
                gps_time: format.has_gps_time().then_some(f64::from(i) / 10.),
                color: format
                    .has_color()
                    .then(|| Color::new(1, 2, u16::try_from(i % 1000).unwrap())),
                nir: format.has_nir().then_some(42),
                ..Default::default()
            })
            .collect()
    }

    /// Writes compressed points, reads them back, and compares.
    fn test_compression_does_not_corrupt(id: u8, n: u32) {
        let header = compressed_header(id);
        let points = points(*header.point_format(), n);
        let mut writer = Writer::new(Cursor::new(Vec::new()), header).unwrap();
        writer.write_points(&points).unwrap();
        let cursor = writer.into_inner().unwrap();

        let mut reader = Reader::new(cursor).unwrap();
        assert!(reader.header().point_format().is_compressed);
        assert!(reader.header().compression().unwrap().mode.is_chunked());
        let read: Vec<Point> = reader.points().map(|point| point.unwrap()).collect();
        assert_eq!(points, read);
    }

    #[test]
    fn format_1() {
        test_compression_does_not_corrupt(1, 100);
    }

    #[test]
    fn format_3() {
        test_compression_does_not_corrupt(3, 100);
    }

    #[test]
    fn format_6_across_chunks() {
        test_compression_does_not_corrupt(6, 120_000);
    }

    #[test]
    fn format_8() {
        test_compression_does_not_corrupt(8, 10);
    }

    #[test]
    fn seek() {
        let header = compressed_header(1);
        let points = points(*header.point_format(), 60_000);
        let mut writer = Writer::new(Cursor::new(Vec::new()), header).unwrap();
        writer.write_points(&points).unwrap();
        let mut reader = Reader::new(writer.into_inner().unwrap()).unwrap();
        reader.seek(55_000).unwrap();
        assert_eq!(points[55_000], reader.read_point().unwrap().unwrap());
        reader.seek(3).unwrap();
        assert_eq!(points[3], reader.read_point().unwrap().unwrap());
    }

    #[test]
    fn path_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("points.LAZ");
        let mut writer = Writer::from_path(&path, Default::default()).unwrap();
        writer.write_point(Point::default()).unwrap();
        writer.close().unwrap();
        drop(writer);
        let mut reader = Reader::from_path(&path).unwrap();
        assert!(reader.header().point_format().is_compressed);
        assert_eq!(Point::default(), reader.read_point().unwrap().unwrap());
    }
}
