//! Write las points.
//!
//! A [Writer] takes a [Header] as its template. The point counts and bounds of a seekable
//! writer's header are reset on open and filled in as points are written:
//!
//! ```
//! use std::io::Cursor;
//! use las_stream::{Builder, Color, Point, Writer, point::Format};
//!
//! let mut builder = Builder::from((1, 2));
//! builder.point_format = Format::new(1).unwrap();
//! let mut writer = Writer::new(Cursor::new(Vec::new()), builder.into_header().unwrap()).unwrap();
//!
//! let mut point = Point::default(); // default points don't have any optional attributes
//! assert!(writer.write_point(point.clone()).is_err());
//!
//! point.gps_time = Some(42.); // point format 1 requires gps time
//! writer.write_point(point.clone()).unwrap();
//!
//! point.color = Some(Color::new(1, 2, 3));
//! assert!(writer.write_point(point).is_err()); // the point's color would be lost
//! assert_eq!(1, writer.header().number_of_points());
//! ```
//!
//! # Streams
//!
//! [Writer::from_stream] writes to outputs that can't seek. The header can't be rewritten at the
//! end, so it goes out exactly as given, before the first point. Its counts and bounds should
//! already describe the points.

mod las;
#[cfg(feature = "laz")]
mod laz;

use crate::{
    ConverterRegistry, Error, Header, Point, Result,
    compression::{LASZIP_RECORD_ID, LASZIP_USER_ID},
    vlr::Context,
};
#[cfg(feature = "laz")]
use crate::compression::laszip_vlr;
use log::{debug, error, warn};
use std::{
    ffi::OsStr,
    fs::File,
    io::{BufWriter, Seek, SeekFrom, Write},
    path::Path,
};

trait WriteRecords<W>: Send {
    /// Writes whole encoded records.
    fn write_records(&mut self, records: &[u8]) -> Result<()>;

    /// Finishes the point data. Must only be called once, and the writer flushes afterwards.
    fn done(&mut self) -> Result<()>;

    fn get_mut(&mut self) -> &mut W;

    fn into_inner(self: Box<Self>) -> W;
}

/// Rewrites the header of a seekable output.
type Rewrite<W> = fn(&mut W, u64, &Header) -> Result<()>;

/// Options for [Writer].
#[derive(Clone, Debug, Default)]
pub struct WriterOptions {
    registry: ConverterRegistry,
}

impl WriterOptions {
    /// Sets the converters used to encode vlr values.
    pub fn with_registry(mut self, registry: ConverterRegistry) -> WriterOptions {
        self.registry = registry;
        self
    }
}

/// Writes las points.
///
/// Closing a writer finishes the point data and, for seekable outputs, rewrites the header with
/// the final counts and bounds. Dropping an open writer closes it and logs any error, so call
/// [Writer::close] yourself if you care about the result.
#[allow(missing_debug_implementations)]
pub struct Writer<W: Write + Send + 'static> {
    closed: bool,
    header: Header,
    header_written: bool,
    points_written: u64,
    records_done: bool,
    rewrite: Option<Rewrite<W>>,
    start: u64,
    records: Option<Box<dyn WriteRecords<W>>>,
}

impl<W: Write + Seek + Send + 'static> Writer<W> {
    /// Creates a writer with the default converters.
    ///
    /// The header is written immediately and rewritten on close.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::io::Cursor;
    /// use las_stream::Writer;
    /// let writer = Writer::new(Cursor::new(Vec::new()), Default::default()).unwrap();
    /// ```
    pub fn new(write: W, header: Header) -> Result<Writer<W>> {
        Writer::with_options(write, header, WriterOptions::default())
    }

    /// Creates a writer with custom options.
    pub fn with_options(mut write: W, header: Header, options: WriterOptions) -> Result<Writer<W>> {
        let start = write.stream_position()?;
        let header = prepare(header, &options, true)?;
        header.write_to(&mut write)?;
        let records: Box<dyn WriteRecords<W>> = if header.point_format().is_compressed {
            compressed(write, &header)?
        } else {
            Box::new(las::PointWriter::new(write))
        };
        debug!(
            "writing las {} points of format {} starting at byte {}",
            header.version(),
            header.point_format(),
            start
        );
        Ok(Writer {
            closed: false,
            header,
            header_written: true,
            records_done: false,
            points_written: 0,
            rewrite: Some(rewrite_header::<W>),
            start,
            records: Some(records),
        })
    }
}

impl<W: Write + Send + 'static> Writer<W> {
    /// Creates a writer for an output that can't seek.
    ///
    /// The header goes out as given before the first point (or on close, if there are no
    /// points). It is never rewritten. Compressed output needs to seek, so it isn't supported.
    ///
    /// # Examples
    ///
    /// ```
    /// use las_stream::{Header, Point, Writer};
    ///
    /// let mut header = Header::default();
    /// header.record_point(1., 2., 3.);
    /// let mut writer = Writer::from_stream(Vec::new(), header).unwrap();
    /// writer.write_point(Point { x: 1., y: 2., z: 3., ..Default::default() }).unwrap();
    /// let bytes = writer.into_inner().unwrap();
    /// assert_eq!(227 + 20, bytes.len());
    /// ```
    pub fn from_stream(write: W, header: Header) -> Result<Writer<W>> {
        Writer::from_stream_with_options(write, header, WriterOptions::default())
    }

    /// Creates a writer for an output that can't seek, with custom options.
    pub fn from_stream_with_options(
        write: W,
        header: Header,
        options: WriterOptions,
    ) -> Result<Writer<W>> {
        if header.point_format().is_compressed {
            return Err(Error::NotSeekable);
        }
        let header = prepare(header, &options, false)?;
        debug!(
            "streaming las {} points of format {}",
            header.version(),
            header.point_format()
        );
        Ok(Writer {
            closed: false,
            header,
            header_written: false,
            records_done: false,
            points_written: 0,
            rewrite: None,
            start: 0,
            records: Some(Box::new(las::PointWriter::new(write))),
        })
    }

    /// Returns this writer's header.
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Writes a point.
    ///
    /// The point must have exactly the optional attributes of the header's point format.
    pub fn write_point(&mut self, point: Point) -> Result<()> {
        self.write(&point)
    }

    /// Writes a slice of points.
    pub fn write_points(&mut self, points: &[Point]) -> Result<()> {
        for point in points {
            self.write(point)?;
        }
        Ok(())
    }

    /// Writes every point from an iterator.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::io::Cursor;
    /// use las_stream::{Point, Writer};
    ///
    /// let mut writer = Writer::new(Cursor::new(Vec::new()), Default::default()).unwrap();
    /// writer.write_all((0..10).map(|i| Point { x: f64::from(i), ..Default::default() })).unwrap();
    /// assert_eq!(10, writer.header().number_of_points());
    /// ```
    pub fn write_all<I: IntoIterator<Item = Point>>(&mut self, points: I) -> Result<()> {
        for point in points {
            self.write(&point)?;
        }
        Ok(())
    }

    fn write(&mut self, point: &Point) -> Result<()> {
        if self.closed || self.records_done {
            return Err(Error::ClosedWriter);
        }
        let format = *self.header.point_format();
        if !point.matches(&format) {
            return Err(Error::PointAttributesDoNotMatch(format));
        }
        let record = format.encode(point, self.header.quantization())?;
        self.write_header_once()?;
        self.records
            .as_mut()
            .ok_or(Error::ClosedWriter)?
            .write_records(&record)?;
        if self.rewrite.is_some() {
            self.header.record_point(point.x, point.y, point.z);
        }
        self.points_written += 1;
        Ok(())
    }

    fn write_header_once(&mut self) -> Result<()> {
        if !self.header_written {
            let records = self.records.as_mut().ok_or(Error::ClosedWriter)?;
            self.header.write_to(records.get_mut())?;
            self.header_written = true;
        }
        Ok(())
    }

    /// Closes this writer.
    ///
    /// Closing twice does nothing. Writing after a close fails. A failed close can be retried,
    /// and the retry (or the drop) picks up the steps that did not finish.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::io::Cursor;
    /// use las_stream::{Point, Writer};
    /// let mut writer = Writer::new(Cursor::new(Vec::new()), Default::default()).unwrap();
    /// writer.close().unwrap();
    /// writer.close().unwrap();
    /// assert!(writer.write_point(Point::default()).is_err());
    /// ```
    pub fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.write_header_once()?;
        let records = self.records.as_mut().ok_or(Error::ClosedWriter)?;
        if !self.records_done {
            records.done()?;
            self.records_done = true;
        }
        match self.rewrite {
            Some(rewrite) => rewrite(records.get_mut(), self.start, &self.header)?,
            None => {
                if self.points_written != self.header.number_of_points() {
                    warn!(
                        "the streamed header says {} points but {} were written",
                        self.header.number_of_points(),
                        self.points_written
                    );
                }
            }
        }
        records.get_mut().flush()?;
        self.closed = true;
        debug!("closed writer after {} points", self.points_written);
        Ok(())
    }

    /// Closes this writer and returns the output.
    pub fn into_inner(mut self) -> Result<W> {
        self.close()?;
        let records = self.records.take().ok_or(Error::ClosedWriter)?;
        Ok(records.into_inner())
    }
}

impl Writer<BufWriter<File>> {
    /// Creates a writer for a path.
    ///
    /// A `.laz` extension compresses the points, any other extension doesn't. The file is
    /// wrapped in a `BufWriter`.
    ///
    /// # Examples
    ///
    /// ```
    /// use las_stream::Writer;
    /// let dir = tempfile::tempdir().unwrap();
    /// let writer = Writer::from_path(dir.path().join("points.las"), Default::default()).unwrap();
    /// ```
    pub fn from_path<P: AsRef<Path>>(path: P, mut header: Header) -> Result<Writer<BufWriter<File>>> {
        let compress = path
            .as_ref()
            .extension()
            .and_then(OsStr::to_str)
            .is_some_and(|extension| extension.eq_ignore_ascii_case("laz"));
        let mut point_format = *header.point_format();
        point_format.is_compressed = compress;
        header.set_point_format(point_format);
        File::create(path)
            .map_err(Error::from)
            .and_then(|file| Writer::new(BufWriter::new(file), header))
    }
}

impl<W: Write + Send + 'static> Drop for Writer<W> {
    fn drop(&mut self) {
        if !self.closed {
            if let Err(err) = self.close() {
                error!("error while closing a dropped writer: {}", err);
            }
        }
    }
}

/// Readies a header template for writing.
fn prepare(mut header: Header, options: &WriterOptions, clear: bool) -> Result<Header> {
    if clear {
        header.clear();
    }
    let context = Context::new(header.version(), *header.point_format());
    header
        .vlrs_mut()
        .encode_pending(&options.registry, context)?;
    if header.point_format().is_compressed {
        let vlr = laszip_vlr(*header.point_format())?;
        header.vlrs_mut().add(vlr);
    } else {
        let _ = header.vlrs_mut().remove(LASZIP_USER_ID, LASZIP_RECORD_ID);
    }
    Ok(header)
}

fn rewrite_header<W: Write + Seek>(write: &mut W, start: u64, header: &Header) -> Result<()> {
    let _ = write.seek(SeekFrom::Start(start))?;
    header.to_raw()?.write_to(&mut *write)?;
    let _ = write.seek(SeekFrom::Start(start))?;
    Ok(())
}

#[cfg(not(feature = "laz"))]
fn laszip_vlr(_: crate::point::Format) -> Result<crate::Vlr> {
    Err(Error::LaszipNotEnabled)
}

#[cfg(feature = "laz")]
fn compressed<W: Write + Seek + Send + 'static>(
    write: W,
    header: &Header,
) -> Result<Box<dyn WriteRecords<W>>> {
    Ok(Box::new(laz::PointWriter::new(
        write,
        header.laz_vlr()?,
        header.point_format().len(),
    )?))
}

#[cfg(not(feature = "laz"))]
fn compressed<W: Write + Seek + Send + 'static>(
    _: W,
    _: &Header,
) -> Result<Box<dyn WriteRecords<W>>> {
    Err(Error::LaszipNotEnabled)
}
