use std::fs::File;
use std::io::{self, Cursor, Read, Seek, SeekFrom, Write};

/// The minimal capability set the transform needs from the resource it
/// wraps: read, write, seek, flush, length and position.
pub trait ByteSource: Read + Write + Seek {
    fn len(&self) -> io::Result<u64>;

    fn set_len(&mut self, len: u64) -> io::Result<()>;

    fn is_empty(&self) -> io::Result<bool> {
        Ok(self.len()? == 0)
    }

    fn can_read(&self) -> bool {
        true
    }

    fn can_write(&self) -> bool {
        true
    }

    fn can_seek(&self) -> bool {
        true
    }
}

impl ByteSource for File {
    fn len(&self) -> io::Result<u64> {
        Ok(self.metadata()?.len())
    }

    fn set_len(&mut self, len: u64) -> io::Result<()> {
        File::set_len(self, len)
    }
}

impl ByteSource for Cursor<Vec<u8>> {
    fn len(&self) -> io::Result<u64> {
        Ok(self.get_ref().len() as u64)
    }

    fn set_len(&mut self, len: u64) -> io::Result<()> {
        self.get_mut().resize(len as usize, 0);
        Ok(())
    }
}

/// An in-memory resource of fixed capacity. Reads and in-place overwrites
/// are allowed; anything that would grow the buffer is not.
#[derive(Debug)]
pub struct FixedBuffer {
    data: Box<[u8]>,
    pos: u64,
}

impl FixedBuffer {
    pub fn new<T: Into<Box<[u8]>>>(data: T) -> FixedBuffer {
        FixedBuffer {
            data: data.into(),
            pos: 0,
        }
    }

    #[inline(always)]
    pub fn position(&self) -> u64 {
        self.pos
    }

    pub fn into_inner(self) -> Box<[u8]> {
        self.data
    }
}

impl Read for FixedBuffer {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.pos >= self.data.len() as u64 {
            return Ok(0);
        }

        let start = self.pos as usize;
        let n = buf.len().min(self.data.len() - start);
        buf[..n].copy_from_slice(&self.data[start..start + n]);
        self.pos += n as u64;
        Ok(n)
    }
}

impl Write for FixedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        let end = self
            .pos
            .checked_add(buf.len() as u64)
            .filter(|&end| end <= self.data.len() as u64)
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::Unsupported,
                    "write past the end of a fixed-capacity buffer",
                )
            })?;

        let start = self.pos as usize;
        self.data[start..start + buf.len()].copy_from_slice(buf);
        self.pos = end;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Seek for FixedBuffer {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let (base, offset) = match pos {
            SeekFrom::Start(n) => {
                self.pos = n;
                return Ok(n);
            }
            SeekFrom::End(n) => (self.data.len() as u64, n),
            SeekFrom::Current(n) => (self.pos, n),
        };

        let new_pos = if offset >= 0 {
            base.checked_add(offset as u64)
        } else {
            base.checked_sub(offset.unsigned_abs())
        };

        match new_pos {
            Some(n) => {
                self.pos = n;
                Ok(n)
            }
            None => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "seek before the start of the buffer",
            )),
        }
    }
}

impl ByteSource for FixedBuffer {
    fn len(&self) -> io::Result<u64> {
        Ok(self.data.len() as u64)
    }

    fn set_len(&mut self, _len: u64) -> io::Result<()> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "a fixed-capacity buffer cannot be resized",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_buffer_read_and_seek() {
        let mut buf = FixedBuffer::new(vec![1u8, 2, 3, 4]);

        let mut out = [0u8; 2];
        assert_eq!(buf.read(&mut out).unwrap(), 2);
        assert_eq!(out, [1, 2]);

        buf.seek(SeekFrom::Current(-1)).unwrap();
        assert_eq!(buf.read(&mut out).unwrap(), 2);
        assert_eq!(out, [2, 3]);

        buf.seek(SeekFrom::End(-1)).unwrap();
        assert_eq!(buf.read(&mut out).unwrap(), 1);
        assert_eq!(out[0], 4);
        assert_eq!(buf.read(&mut out).unwrap(), 0);
    }

    #[test]
    fn fixed_buffer_seek_before_start_fails() {
        let mut buf = FixedBuffer::new(vec![1u8, 2]);
        assert!(buf.seek(SeekFrom::Current(-1)).is_err());
    }

    #[test]
    fn fixed_buffer_overwrites_in_place() {
        let mut buf = FixedBuffer::new(vec![0u8; 4]);
        buf.write_all(&[9, 8]).unwrap();
        assert_eq!(buf.position(), 2);
        assert_eq!(&*buf.into_inner(), &[9, 8, 0, 0]);
    }

    #[test]
    fn fixed_buffer_rejects_growth() {
        let mut buf = FixedBuffer::new(vec![0u8; 2]);
        buf.seek(SeekFrom::Start(1)).unwrap();

        let err = buf.write(&[1, 2]).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::Unsupported);

        let err = buf.set_len(8).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::Unsupported);
    }

    #[test]
    fn cursor_len_and_set_len() {
        let mut cursor = Cursor::new(b"abc".to_vec());
        assert_eq!(ByteSource::len(&cursor).unwrap(), 3);
        assert!(!cursor.is_empty().unwrap());

        cursor.set_len(5).unwrap();
        assert_eq!(cursor.get_ref(), &vec![b'a', b'b', b'c', 0, 0]);
    }

    #[test]
    fn file_len_and_set_len() {
        let mut file = tempfile::tempfile().unwrap();
        file.write_all(b"hello").unwrap();
        assert_eq!(ByteSource::len(&file).unwrap(), 5);

        ByteSource::set_len(&mut file, 2).unwrap();
        assert_eq!(ByteSource::len(&file).unwrap(), 2);
    }
}
