//! Read las points.
//!
//! A [Reader] parses the header when it is created, then hands out points in file order:
//!
//! ```
//! use std::io::Cursor;
//! use las_stream::{Header, Point, Reader, Writer};
//!
//! let mut writer = Writer::new(Cursor::new(Vec::new()), Header::default()).unwrap();
//! writer.write_point(Point { x: 1., y: 2., z: 3., ..Default::default() }).unwrap();
//! let bytes = writer.into_inner().unwrap().into_inner();
//!
//! let mut reader = Reader::new(Cursor::new(bytes)).unwrap();
//! assert_eq!(1, reader.header().number_of_points());
//! let point = reader.read_point().unwrap().unwrap();
//! assert_eq!(2., point.y);
//! assert!(reader.read_point().unwrap().is_none());
//! ```
//!
//! [Reader::from_path] wraps the file in a `BufReader`. Inputs that can't seek, like stdin or a
//! socket, go through [Reader::from_stream].
//!
//! # Compression
//!
//! Compressed points need the `laz` feature. Chunked files are decompressed a batch of records
//! at a time, everything else one record at a time.

mod las;
#[cfg(feature = "laz")]
mod laz;

use crate::{
    ConverterRegistry, Error, Header, Point, Result,
    compression::{CompressionHeader, CompressionMode},
    utils::TrackedRead,
};
use log::debug;
use std::{
    fs::File,
    io::{BufReader, Read, Seek},
    path::Path,
};

/// The most records decompressed at once.
#[cfg(feature = "laz")]
const MAX_BATCH_SIZE: u64 = 50_000;

trait ReadRecords: Send {
    /// Fills the buffer with whole records.
    fn read_records(&mut self, buffer: &mut [u8]) -> Result<()>;

    /// Moves to the record at `index`.
    fn seek(&mut self, index: u64) -> Result<()>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    Streaming,
    Exhausted,
    Closed,
}

/// Options for [Reader].
///
/// ```
/// use las_stream::{ConverterRegistry, ReaderOptions};
/// // Keep every vlr payload as bytes.
/// let options = ReaderOptions::default().with_registry(ConverterRegistry::new());
/// ```
#[derive(Clone, Debug, Default)]
pub struct ReaderOptions {
    registry: ConverterRegistry,
}

impl ReaderOptions {
    /// Sets the converters used to decode the vlrs.
    pub fn with_registry(mut self, registry: ConverterRegistry) -> ReaderOptions {
        self.registry = registry;
        self
    }
}

/// Reads las points.
#[allow(missing_debug_implementations)]
pub struct Reader {
    header: Header,
    state: State,
    index: u64,
    batch: Vec<u8>,
    batch_position: usize,
    batch_size: u64,
    records: Option<Box<dyn ReadRecords>>,
}

impl Reader {
    /// Creates a reader with the default converters.
    ///
    /// This does *not* wrap the `Read` in a `BufRead`, so if you're concerned about performance
    /// you should do that wrapping yourself (or use [Reader::from_path]).
    pub fn new<R: Read + Seek + Send + Sync + 'static>(read: R) -> Result<Reader> {
        Reader::with_options(read, ReaderOptions::default())
    }

    /// Creates a reader with custom options.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::io::Cursor;
    /// use las_stream::{ConverterRegistry, Header, Reader, ReaderOptions};
    ///
    /// let mut bytes = Vec::new();
    /// Header::default().write_to(&mut bytes).unwrap();
    /// let options = ReaderOptions::default().with_registry(ConverterRegistry::new());
    /// let reader = Reader::with_options(Cursor::new(bytes), options).unwrap();
    /// assert_eq!(0, reader.header().number_of_points());
    /// ```
    pub fn with_options<R: Read + Seek + Send + Sync + 'static>(
        read: R,
        options: ReaderOptions,
    ) -> Result<Reader> {
        let mut read = TrackedRead::new(read);
        let header = Header::read_tracked(&mut read, &options.registry)?;
        let read = read.into_inner();
        if header.number_of_points() == 0 {
            return Ok(Reader::empty(header));
        }
        let compression = header.compression();
        if header.point_format().is_compressed && compression.is_none() {
            return Err(Error::MissingCompressionHeader);
        }
        let mode = compression
            .as_ref()
            .map_or(CompressionMode::None, |compression| compression.mode);
        debug!(
            "reading {} points of format {} ({:?})",
            header.number_of_points(),
            header.point_format(),
            mode
        );
        let (records, batch_size): (Box<dyn ReadRecords>, u64) = match compression {
            Some(compression) if mode != CompressionMode::None => {
                compressed(read, &header, &compression)?
            }
            _ => {
                let record_len = header.point_format().len();
                (Box::new(las::PointReader::new(read, record_len)?), 1)
            }
        };
        Ok(Reader::streaming(header, records, batch_size))
    }

    /// Creates a reader for an input that can't seek.
    ///
    /// Compressed data need to seek to their chunk table, so only uncompressed points can be
    /// streamed. [Reader::seek] always fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use las_stream::{Header, Reader};
    ///
    /// let mut bytes = Vec::new();
    /// Header::default().write_to(&mut bytes).unwrap();
    /// let reader = Reader::from_stream(std::io::Cursor::new(bytes)).unwrap();
    /// ```
    pub fn from_stream<R: Read + Send + 'static>(read: R) -> Result<Reader> {
        Reader::from_stream_with_options(read, ReaderOptions::default())
    }

    /// Creates a reader for an input that can't seek, with custom options.
    pub fn from_stream_with_options<R: Read + Send + 'static>(
        read: R,
        options: ReaderOptions,
    ) -> Result<Reader> {
        let mut read = TrackedRead::new(read);
        let header = Header::read_tracked(&mut read, &options.registry)?;
        if header.number_of_points() == 0 {
            return Ok(Reader::empty(header));
        }
        if header.point_format().is_compressed {
            return Err(Error::NotSeekable);
        }
        let position = read.position();
        let records = Box::new(las::StreamReader::new(read.into_inner(), position));
        Ok(Reader::streaming(header, records, 1))
    }

    /// Creates a reader from a path.
    ///
    /// The underlying `File` is wrapped in a `BufReader` for performance reasons.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Reader> {
        File::open(path)
            .map_err(Error::from)
            .and_then(|file| Reader::new(BufReader::new(file)))
    }

    fn empty(header: Header) -> Reader {
        debug!("no points to read, the input is left alone");
        Reader {
            header,
            state: State::Exhausted,
            index: 0,
            batch: Vec::new(),
            batch_position: 0,
            batch_size: 0,
            records: None,
        }
    }

    fn streaming(header: Header, records: Box<dyn ReadRecords>, batch_size: u64) -> Reader {
        Reader {
            header,
            state: State::Streaming,
            index: 0,
            batch: Vec::new(),
            batch_position: 0,
            batch_size,
            records: Some(records),
        }
    }

    /// Returns this reader's header.
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Reads the next point, or `None` if there are no more.
    ///
    /// An error ends the reading. Every later call returns `Ok(None)`.
    pub fn read_point(&mut self) -> Result<Option<Point>> {
        match self.state {
            State::Closed => return Err(Error::ClosedReader),
            State::Exhausted => return Ok(None),
            State::Streaming => {}
        }
        if self.index >= self.header.number_of_points() {
            self.state = State::Exhausted;
            return Ok(None);
        }
        match self.next_point() {
            Ok(point) => {
                self.index += 1;
                Ok(Some(point))
            }
            Err(err) => {
                self.state = State::Exhausted;
                Err(err)
            }
        }
    }

    fn next_point(&mut self) -> Result<Point> {
        let record_len = usize::from(self.header.point_format().len());
        if self.batch_position >= self.batch.len() {
            let remaining = self.header.number_of_points() - self.index;
            let n = usize::try_from(remaining.min(self.batch_size))?;
            self.batch.resize(n * record_len, 0);
            self.batch_position = 0;
            self.records
                .as_mut()
                .ok_or(Error::ClosedReader)?
                .read_records(&mut self.batch)?;
        }
        let record = &self.batch[self.batch_position..self.batch_position + record_len];
        self.batch_position += record_len;
        self.header
            .point_format()
            .decode(record, self.header.quantization())
    }

    /// Returns an iterator over the remaining points.
    ///
    /// The iterator stops after the first error.
    pub fn points(&mut self) -> PointIterator<'_> {
        PointIterator {
            reader: self,
            failed: false,
        }
    }

    /// Reads up to `n` points.
    pub fn read_points(&mut self, n: u64) -> Result<Vec<Point>> {
        let remaining = self.header.number_of_points().saturating_sub(self.index);
        let mut points = Vec::with_capacity(usize::try_from(n.min(remaining))?);
        let _ = self.read_points_into(n, &mut points)?;
        Ok(points)
    }

    /// Reads up to `n` points into a vector, returning the number of points read.
    pub fn read_points_into(&mut self, n: u64, points: &mut Vec<Point>) -> Result<u64> {
        let mut count = 0;
        while count < n {
            match self.read_point()? {
                Some(point) => points.push(point),
                None => break,
            }
            count += 1;
        }
        Ok(count)
    }

    /// Reads every remaining point into a vector, returning the number of points read.
    pub fn read_all_points_into(&mut self, points: &mut Vec<Point>) -> Result<u64> {
        let remaining = self.header.number_of_points().saturating_sub(self.index);
        self.read_points_into(remaining, points)
    }

    /// Moves to the point at `index`, zero-based.
    ///
    /// Uncompressed inputs jump straight to the record. Compressed inputs jump to the chunk
    /// holding the record and decompress up to it. Streams can't seek at all.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::io::Cursor;
    /// use las_stream::{Header, Point, Reader, Writer};
    ///
    /// let mut writer = Writer::new(Cursor::new(Vec::new()), Header::default()).unwrap();
    /// for x in 0..3 {
    ///     writer.write_point(Point { x: f64::from(x), ..Default::default() }).unwrap();
    /// }
    /// let bytes = writer.into_inner().unwrap().into_inner();
    /// let mut reader = Reader::new(Cursor::new(bytes)).unwrap();
    /// reader.seek(2).unwrap();
    /// assert_eq!(2., reader.read_point().unwrap().unwrap().x);
    /// reader.seek(0).unwrap();
    /// assert_eq!(0., reader.read_point().unwrap().unwrap().x);
    /// ```
    pub fn seek(&mut self, index: u64) -> Result<()> {
        if self.state == State::Closed {
            return Err(Error::ClosedReader);
        }
        let number_of_points = self.header.number_of_points();
        if let Some(records) = self.records.as_mut() {
            records.seek(index.min(number_of_points))?;
            self.state = State::Streaming;
        }
        self.index = index;
        self.batch.clear();
        self.batch_position = 0;
        Ok(())
    }

    /// Releases the input. Closing twice does nothing.
    pub fn close(&mut self) {
        if self.state != State::Closed {
            debug!("closing reader after {} points", self.index);
        }
        self.state = State::Closed;
        self.records = None;
        self.batch = Vec::new();
    }
}

/// An iterator over the points in a [Reader].
#[allow(missing_debug_implementations)]
pub struct PointIterator<'a> {
    reader: &'a mut Reader,
    failed: bool,
}

impl Iterator for PointIterator<'_> {
    type Item = Result<Point>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let next = self.reader.read_point().transpose();
        self.failed = matches!(next, Some(Err(_)));
        next
    }
}

#[cfg(feature = "laz")]
fn compressed<R: Read + Seek + Send + Sync + 'static>(
    read: R,
    header: &Header,
    compression: &CompressionHeader,
) -> Result<(Box<dyn ReadRecords>, u64)> {
    let batch_size = if !compression.mode.is_chunked() {
        1
    } else if compression.has_variable_chunks() {
        MAX_BATCH_SIZE
    } else {
        u64::from(compression.chunk_size).clamp(1, MAX_BATCH_SIZE)
    };
    let records = laz::PointReader::new(
        read,
        header.laz_vlr()?,
        header.number_of_points(),
        header.point_format().len(),
    )?;
    Ok((Box::new(records), batch_size))
}

#[cfg(not(feature = "laz"))]
fn compressed<R: Read + Seek + Send + Sync + 'static>(
    _: R,
    _: &Header,
    _: &CompressionHeader,
) -> Result<(Box<dyn ReadRecords>, u64)> {
    Err(Error::LaszipNotEnabled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Builder, Writer, point::Format};
    use std::io::Cursor;

    fn bytes(n: u32) -> Vec<u8> {
        let mut builder = Builder::from((1, 2));
        builder.point_format = Format::new(1).unwrap();
        let mut writer = Writer::new(Cursor::new(Vec::new()), builder.into_header().unwrap())
            .unwrap();
        for i in 0..n {
            writer
                .write_point(Point {
                    x: f64::from(i),
                    gps_time: Some(f64::from(i)),
                    ..Default::default()
                })
                .unwrap();
        }
        writer.into_inner().unwrap().into_inner()
    }

    #[test]
    fn seek() {
        let mut reader = Reader::new(Cursor::new(bytes(5))).unwrap();
        reader.seek(3).unwrap();
        assert_eq!(3., reader.read_point().unwrap().unwrap().x);
        reader.seek(5).unwrap();
        assert!(reader.read_point().unwrap().is_none());
        reader.seek(1).unwrap();
        let points = reader.read_points(10).unwrap();
        assert_eq!(4, points.len());
    }

    #[test]
    fn stream_cant_seek() {
        let mut reader = Reader::from_stream(Cursor::new(bytes(2))).unwrap();
        assert!(matches!(reader.seek(1), Err(Error::NotSeekable)));
        assert_eq!(2, reader.points().count());
    }

    #[test]
    fn close() {
        let mut reader = Reader::new(Cursor::new(bytes(2))).unwrap();
        reader.close();
        reader.close();
        assert!(matches!(reader.read_point(), Err(Error::ClosedReader)));
        assert!(matches!(reader.seek(0), Err(Error::ClosedReader)));
        assert_eq!(1, reader.points().count());
    }

    #[test]
    fn truncated_points() {
        let mut bytes = bytes(3);
        let _ = bytes.split_off(bytes.len() - 10);
        let mut reader = Reader::new(Cursor::new(bytes)).unwrap();
        let mut points = Vec::new();
        assert!(matches!(
            reader.read_all_points_into(&mut points),
            Err(Error::Truncated {
                field: "point record",
                ..
            })
        ));
        assert_eq!(2, points.len());
        assert!(reader.read_point().unwrap().is_none());
    }

    #[test]
    fn read_points_into() {
        let mut reader = Reader::new(Cursor::new(bytes(5))).unwrap();
        let mut points = Vec::new();
        assert_eq!(2, reader.read_points_into(2, &mut points).unwrap());
        assert_eq!(3, reader.read_all_points_into(&mut points).unwrap());
        assert_eq!(4., points[4].x);
    }

    #[test]
    fn compressed_without_laszip_vlr() {
        let mut builder = Builder::from((1, 2));
        builder.point_format.is_compressed = true;
        let mut header = builder.into_header().unwrap();
        header.record_point(0., 0., 0.);
        let mut bytes = Vec::new();
        header.write_to(&mut bytes).unwrap();
        assert!(matches!(
            Reader::new(Cursor::new(bytes)),
            Err(Error::MissingCompressionHeader)
        ));
    }
}
