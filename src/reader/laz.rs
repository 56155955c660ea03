use super::ReadRecords;
use crate::Result;
use laz::{LasZipDecompressor, LazVlr};
use std::io::{Read, Seek};

/// Compressed records, decompressed one record or one batch at a time.
pub(crate) struct PointReader<R: Read + Seek + Send + Sync + 'static> {
    decompressor: LasZipDecompressor<'static, R>,
    number_of_points: u64,
    record_len: usize,
}

impl<R: Read + Seek + Send + Sync + 'static> PointReader<R> {
    pub(crate) fn new(
        read: R,
        laz_vlr: LazVlr,
        number_of_points: u64,
        record_len: u16,
    ) -> Result<PointReader<R>> {
        let decompressor = LasZipDecompressor::new(read, laz_vlr)?;
        Ok(PointReader {
            decompressor,
            number_of_points,
            record_len: usize::from(record_len),
        })
    }
}

impl<R: Read + Seek + Send + Sync + 'static> ReadRecords for PointReader<R> {
    fn read_records(&mut self, buffer: &mut [u8]) -> Result<()> {
        if buffer.len() == self.record_len {
            self.decompressor.decompress_one(buffer)?;
        } else {
            self.decompressor.decompress_many(buffer)?;
        }
        Ok(())
    }

    fn seek(&mut self, index: u64) -> Result<()> {
        // Past the end there's nothing left to decompress.
        if index < self.number_of_points {
            self.decompressor.seek(index)?;
        }
        Ok(())
    }
}
