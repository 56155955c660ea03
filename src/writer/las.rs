use super::WriteRecords;
use crate::Result;
use std::io::Write;

/// Uncompressed records, written as they come.
pub(crate) struct PointWriter<W> {
    write: W,
}

impl<W: Write> PointWriter<W> {
    pub(crate) fn new(write: W) -> PointWriter<W> {
        PointWriter { write }
    }
}

impl<W: Write + Send> WriteRecords<W> for PointWriter<W> {
    fn write_records(&mut self, records: &[u8]) -> Result<()> {
        self.write.write_all(records)?;
        Ok(())
    }

    fn done(&mut self) -> Result<()> {
        Ok(())
    }

    fn get_mut(&mut self) -> &mut W {
        &mut self.write
    }

    fn into_inner(self: Box<Self>) -> W {
        self.write
    }
}
