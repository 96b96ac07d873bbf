use std::io::{self, Read, Seek, SeekFrom};

use byteorder::{BigEndian, LittleEndian, ReadBytesExt};

pub fn read_u8<R: Read>(reader: &mut R) -> io::Result<u8> {
    reader.read_u8()
}

pub fn read_u16_le<R: Read>(reader: &mut R) -> io::Result<u16> {
    reader.read_u16::<LittleEndian>()
}

pub fn read_u32_le<R: Read>(reader: &mut R) -> io::Result<u32> {
    reader.read_u32::<LittleEndian>()
}

pub fn read_u16_be<R: Read>(reader: &mut R) -> io::Result<u16> {
    reader.read_u16::<BigEndian>()
}

pub fn read_u32_be<R: Read>(reader: &mut R) -> io::Result<u32> {
    reader.read_u32::<BigEndian>()
}

/// Skip `count` bytes forward from the current position
pub fn skip<S: Seek>(stream: &mut S, count: u64) -> io::Result<u64> {
    let offset = i64::try_from(count).map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("Cannot skip {} bytes", count),
        )
    })?;
    stream.seek(SeekFrom::Current(offset))
}

pub fn seek_to<S: Seek>(stream: &mut S, position: u64) -> io::Result<()> {
    stream.seek(SeekFrom::Start(position))?;
    Ok(())
}

pub fn read_bytes<R: Read>(reader: &mut R, length: usize) -> io::Result<Vec<u8>> {
    let mut buffer = vec![0u8; length];
    reader.read_exact(&mut buffer)?;
    Ok(buffer)
}

/// Read a fixed-width text field. The field always consumes `width` bytes;
/// the text stops at the first NUL and surrounding whitespace is trimmed.
pub fn read_fixed_string<R: Read>(reader: &mut R, width: usize) -> io::Result<String> {
    let raw = read_bytes(reader, width)?;
    let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
    Ok(String::from_utf8_lossy(&raw[..end]).trim().to_string())
}

/// A read-only window of `len` bytes starting at `start` in the inner stream.
///
/// Positions are relative to the window: `SeekFrom::Start(0)` is the first
/// byte of the window, and reads stop at its end even when the inner stream
/// keeps going. Seeking past the end clamps to the end.
#[derive(Debug)]
pub struct SubReader<R> {
    inner: R,
    start: u64,
    len: u64,
    pos: u64,
}

impl<R: Seek> SubReader<R> {
    pub fn new(mut inner: R, start: u64, len: u64) -> io::Result<Self> {
        inner.seek(SeekFrom::Start(start))?;
        Ok(SubReader {
            inner,
            start,
            len,
            pos: 0,
        })
    }
}

impl<R> SubReader<R> {
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

}

impl<R: Read> Read for SubReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let remaining = self.len.saturating_sub(self.pos);
        if remaining == 0 || buf.is_empty() {
            return Ok(0);
        }

        let max = remaining.min(buf.len() as u64) as usize;
        let n = self.inner.read(&mut buf[..max])?;
        self.pos += n as u64;
        Ok(n)
    }
}

impl<R: Seek> Seek for SubReader<R> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let target = match pos {
            SeekFrom::Start(n) => i128::from(n),
            SeekFrom::Current(delta) => i128::from(self.pos) + i128::from(delta),
            SeekFrom::End(delta) => i128::from(self.len) + i128::from(delta),
        };

        if target < 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("Cannot seek to {} (before start of window)", target),
            ));
        }

        let target = (target as u64).min(self.len);
        self.inner.seek(SeekFrom::Start(self.start + target))?;
        self.pos = target;
        Ok(target)
    }
}
