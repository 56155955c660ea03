//! Variable length records, byte for byte.

use crate::{Error, Result, utils::TrackedRead};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Read, Write};

/// A raw vlr: a 54 byte header followed by its payload.
#[derive(Clone, Debug, PartialEq, Eq)]
#[allow(missing_docs)]
pub struct Vlr {
    pub reserved: u16,
    pub user_id: [u8; 16],
    pub record_id: u16,
    pub record_length_after_header: u16,
    pub description: [u8; 32],
    pub data: Vec<u8>,
}

impl Vlr {
    /// The length of the record header.
    pub const HEADER_LEN: u64 = 54;

    /// Reads a raw vlr.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::io::Cursor;
    /// use las_stream::raw::Vlr;
    ///
    /// let mut bytes = Vec::new();
    /// Vlr { data: vec![42], record_length_after_header: 1, ..Default::default() }
    ///     .write_to(&mut bytes)
    ///     .unwrap();
    /// let vlr = Vlr::read_from(Cursor::new(bytes)).unwrap();
    /// assert_eq!(vec![42], vlr.data);
    /// ```
    pub fn read_from<R: Read>(read: R) -> Result<Vlr> {
        Vlr::read_tracked(&mut TrackedRead::new(read), u64::MAX)
    }

    /// Reads a vlr that must fit into `available` bytes, header included.
    pub(crate) fn read_tracked<R: Read>(
        read: &mut TrackedRead<R>,
        available: u64,
    ) -> Result<Vlr> {
        let reserved = read.field("vlr reserved", |r| r.read_u16::<LittleEndian>())?;
        let mut user_id = [0; 16];
        read.field("vlr user id", |r| r.read_exact(&mut user_id))?;
        let record_id = read.field("vlr record id", |r| r.read_u16::<LittleEndian>())?;
        let record_length_after_header =
            read.field("vlr record length", |r| r.read_u16::<LittleEndian>())?;
        let mut description = [0; 32];
        read.field("vlr description", |r| r.read_exact(&mut description))?;
        let available = available.saturating_sub(Vlr::HEADER_LEN);
        if u64::from(record_length_after_header) > available {
            use crate::utils::AsLasStr;
            return Err(Error::MalformedVlr {
                user_id: user_id.as_las_string(),
                record_id,
                declared: record_length_after_header,
                available,
            });
        }
        let mut data = vec![0; usize::from(record_length_after_header)];
        read.field("vlr data", |r| r.read_exact(&mut data))?;
        Ok(Vlr {
            reserved,
            user_id,
            record_id,
            record_length_after_header,
            description,
            data,
        })
    }

    /// Writes a raw vlr.
    ///
    /// # Examples
    ///
    /// ```
    /// use las_stream::raw::Vlr;
    /// let mut bytes = Vec::new();
    /// Vlr::default().write_to(&mut bytes).unwrap();
    /// assert_eq!(54, bytes.len());
    /// ```
    pub fn write_to<W: Write>(&self, mut write: W) -> Result<()> {
        write.write_u16::<LittleEndian>(self.reserved)?;
        write.write_all(&self.user_id)?;
        write.write_u16::<LittleEndian>(self.record_id)?;
        write.write_u16::<LittleEndian>(self.record_length_after_header)?;
        write.write_all(&self.description)?;
        write.write_all(&self.data)?;
        Ok(())
    }
}

impl Default for Vlr {
    fn default() -> Vlr {
        Vlr {
            reserved: 0,
            user_id: [0; 16],
            record_id: 0,
            record_length_after_header: 0,
            description: [0; 32],
            data: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn declared_length_exceeds_available() {
        let vlr = Vlr {
            record_length_after_header: 10,
            data: vec![0; 10],
            ..Default::default()
        };
        let mut bytes = Vec::new();
        vlr.write_to(&mut bytes).unwrap();
        let mut read = TrackedRead::new(Cursor::new(bytes));
        match Vlr::read_tracked(&mut read, 60) {
            Err(Error::MalformedVlr {
                declared,
                available,
                ..
            }) => {
                assert_eq!(10, declared);
                assert_eq!(6, available);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn truncated_payload() {
        let vlr = Vlr {
            record_length_after_header: 10,
            data: vec![0; 4],
            ..Default::default()
        };
        let mut bytes = Vec::new();
        vlr.write_to(&mut bytes).unwrap();
        match Vlr::read_from(Cursor::new(bytes)) {
            Err(Error::Truncated { offset, field }) => {
                assert_eq!(54, offset);
                assert_eq!("vlr data", field);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
