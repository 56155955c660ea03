use crate::{Error, Result};
use std::io::{self, Read};

/// Interprets a fixed-width las string field.
///
/// Las strings should be nul-filled ASCII, but plenty of writers pad with spaces or leave junk
/// after the first nul, so everything from the first nul on is dropped along with trailing
/// spaces.
pub(crate) trait AsLasStr {
    fn as_las_string(&self) -> String;
}

impl AsLasStr for [u8] {
    fn as_las_string(&self) -> String {
        let end = self.iter().position(|&n| n == 0).unwrap_or(self.len());
        String::from_utf8_lossy(&self[..end])
            .trim_end_matches(' ')
            .to_string()
    }
}

/// Fills a fixed-width las string field, padding with nuls.
pub(crate) trait FromLasStr {
    fn from_las_str(&mut self, s: &str) -> Result<()>;
}

impl<T: AsMut<[u8]>> FromLasStr for T {
    fn from_las_str(&mut self, s: &str) -> Result<()> {
        let bytes = self.as_mut();
        if !s.is_ascii() {
            return Err(Error::NotAscii(s.to_string()));
        }
        if s.len() > bytes.len() {
            return Err(Error::StringTooLong {
                string: s.to_string(),
                len: bytes.len(),
            });
        }
        bytes.fill(0);
        bytes[..s.len()].copy_from_slice(s.as_bytes());
        Ok(())
    }
}

/// A `Read` that knows how far into the file it is.
///
/// Used while parsing headers so that a short read can report the byte offset and the field it
/// happened in.
#[derive(Debug)]
pub(crate) struct TrackedRead<R> {
    inner: R,
    position: u64,
}

impl<R: Read> TrackedRead<R> {
    pub(crate) fn new(inner: R) -> TrackedRead<R> {
        TrackedRead { inner, position: 0 }
    }

    pub(crate) fn position(&self) -> u64 {
        self.position
    }

    /// Runs `f`, turning an unexpected end of file into [Error::Truncated].
    pub(crate) fn field<T, F>(&mut self, field: &'static str, f: F) -> Result<T>
    where
        F: FnOnce(&mut Self) -> io::Result<T>,
    {
        let offset = self.position;
        f(self).map_err(|err| truncated(err, offset, field))
    }

    pub(crate) fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> Read for TrackedRead<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.position += n as u64;
        Ok(n)
    }
}

pub(crate) fn truncated(err: io::Error, offset: u64, field: &'static str) -> Error {
    if err.kind() == io::ErrorKind::UnexpectedEof {
        Error::Truncated { offset, field }
    } else {
        Error::Io(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use byteorder::{LittleEndian, ReadBytesExt};
    use std::io::Cursor;

    #[test]
    fn permissive_strings() {
        assert_eq!("LiDAR", [76u8, 105, 68, 65, 82, 0, 33].as_las_string());
        assert_eq!("LiDAR", b"LiDAR   ".as_las_string());
        assert_eq!("", [0u8; 4].as_las_string());
    }

    #[test]
    fn from_las_str() {
        let mut bytes = [1u8; 5];
        bytes.from_las_str("Beer").unwrap();
        assert_eq!([66, 101, 101, 114, 0], bytes);
        assert!(bytes.from_las_str("Beers!").is_err());
        assert!(bytes.from_las_str("Bière").is_err());
    }

    #[test]
    fn truncated_offset() {
        let mut read = TrackedRead::new(Cursor::new(vec![1, 0, 2]));
        assert_eq!(1, read.field("a", |r| r.read_u16::<LittleEndian>()).unwrap());
        match read.field("b", |r| r.read_u16::<LittleEndian>()) {
            Err(Error::Truncated { offset, field }) => {
                assert_eq!(2, offset);
                assert_eq!("b", field);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
