use super::WriteRecords;
use crate::Result;
use laz::{LasZipCompressor, LazVlr};
use std::io::{Seek, Write};

/// Compressed records. The chunk table is written by [WriteRecords::done].
pub(crate) struct PointWriter<W: Write + Seek + Send + 'static> {
    compressor: LasZipCompressor<'static, W>,
    record_len: usize,
}

impl<W: Write + Seek + Send + 'static> PointWriter<W> {
    pub(crate) fn new(
        write: W,
        laz_vlr: LazVlr,
        record_len: u16,
    ) -> Result<PointWriter<W>> {
        let compressor = LasZipCompressor::new(write, laz_vlr)?;
        Ok(PointWriter {
            compressor,
            record_len: usize::from(record_len),
        })
    }
}

impl<W: Write + Seek + Send + 'static> WriteRecords<W> for PointWriter<W> {
    fn write_records(&mut self, records: &[u8]) -> Result<()> {
        if records.len() == self.record_len {
            self.compressor.compress_one(records)?;
        } else {
            self.compressor.compress_many(records)?;
        }
        Ok(())
    }

    fn done(&mut self) -> Result<()> {
        self.compressor.done()?;
        Ok(())
    }

    fn get_mut(&mut self) -> &mut W {
        self.compressor.get_mut()
    }

    fn into_inner(self: Box<Self>) -> W {
        self.compressor.into_inner()
    }
}
