use super::ReadRecords;
use crate::{Error, Result, utils::truncated};
use std::io::{Read, Seek, SeekFrom};

/// Uncompressed records from a seekable input.
pub(crate) struct PointReader<R> {
    read: R,
    start: u64,
    position: u64,
    record_len: u64,
}

impl<R: Read + Seek> PointReader<R> {
    pub(crate) fn new(mut read: R, record_len: u16) -> Result<PointReader<R>> {
        let start = read.stream_position()?;
        Ok(PointReader {
            read,
            start,
            position: start,
            record_len: u64::from(record_len),
        })
    }
}

impl<R: Read + Seek + Send> ReadRecords for PointReader<R> {
    fn read_records(&mut self, buffer: &mut [u8]) -> Result<()> {
        self.read
            .read_exact(buffer)
            .map_err(|err| truncated(err, self.position, "point record"))?;
        self.position += buffer.len() as u64;
        Ok(())
    }

    fn seek(&mut self, index: u64) -> Result<()> {
        self.position = self.start + index * self.record_len;
        let _ = self.read.seek(SeekFrom::Start(self.position))?;
        Ok(())
    }
}

/// Uncompressed records from an input that only goes forward.
pub(crate) struct StreamReader<R> {
    read: R,
    position: u64,
}

impl<R: Read> StreamReader<R> {
    pub(crate) fn new(read: R, position: u64) -> StreamReader<R> {
        StreamReader { read, position }
    }
}

impl<R: Read + Send> ReadRecords for StreamReader<R> {
    fn read_records(&mut self, buffer: &mut [u8]) -> Result<()> {
        self.read
            .read_exact(buffer)
            .map_err(|err| truncated(err, self.position, "point record"))?;
        self.position += buffer.len() as u64;
        Ok(())
    }

    fn seek(&mut self, _: u64) -> Result<()> {
        Err(Error::NotSeekable)
    }
}
