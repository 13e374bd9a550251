use crate::foundation::error::{ParseError, ParseResult};

/// Bounds-checked big-endian cursor over an in-memory container.
///
/// Every read checks the remaining length first, so malformed length fields surface as
/// [`ParseError::Malformed`] instead of panics or oversized allocations.
#[derive(Clone, Debug)]
pub(crate) struct ByteReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub(crate) fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub(crate) fn position(&self) -> usize {
        self.pos
    }

    pub(crate) fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    pub(crate) fn take(&mut self, n: usize, what: &str) -> ParseResult<&'a [u8]> {
        if n > self.remaining() {
            return Err(ParseError::malformed(format!(
                "{what}: needs {n} bytes at offset {}, only {} left",
                self.pos,
                self.remaining()
            )));
        }
        let out = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    pub(crate) fn skip(&mut self, n: usize, what: &str) -> ParseResult<()> {
        self.take(n, what).map(|_| ())
    }

    fn array<const N: usize>(&mut self, what: &str) -> ParseResult<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N, what)?);
        Ok(out)
    }

    pub(crate) fn u8(&mut self, what: &str) -> ParseResult<u8> {
        Ok(self.array::<1>(what)?[0])
    }

    pub(crate) fn u16(&mut self, what: &str) -> ParseResult<u16> {
        Ok(u16::from_be_bytes(self.array(what)?))
    }

    pub(crate) fn i16(&mut self, what: &str) -> ParseResult<i16> {
        Ok(i16::from_be_bytes(self.array(what)?))
    }

    pub(crate) fn u32(&mut self, what: &str) -> ParseResult<u32> {
        Ok(u32::from_be_bytes(self.array(what)?))
    }

    pub(crate) fn i32(&mut self, what: &str) -> ParseResult<i32> {
        Ok(i32::from_be_bytes(self.array(what)?))
    }

    pub(crate) fn u64(&mut self, what: &str) -> ParseResult<u64> {
        Ok(u64::from_be_bytes(self.array(what)?))
    }

    pub(crate) fn sig(&mut self, what: &str) -> ParseResult<[u8; 4]> {
        self.array(what)
    }

    /// Read a 4-byte (or 8-byte when `long`) length and check it against the remaining input.
    pub(crate) fn length(&mut self, long: bool, what: &str) -> ParseResult<usize> {
        let raw = if long {
            self.u64(what)?
        } else {
            u64::from(self.u32(what)?)
        };
        let len = usize::try_from(raw)
            .ok()
            .filter(|&n| n <= self.remaining())
            .ok_or_else(|| {
                ParseError::malformed(format!(
                    "{what}: declared length {raw} exceeds the {} bytes left",
                    self.remaining()
                ))
            })?;
        Ok(len)
    }

    /// Read a length prefix and split off that many bytes as a nested reader.
    pub(crate) fn section(&mut self, long: bool, what: &str) -> ParseResult<ByteReader<'a>> {
        let len = self.length(long, what)?;
        Ok(ByteReader::new(self.take(len, what)?))
    }

    /// Pascal string whose total size (length byte included) is padded to `pad` bytes.
    pub(crate) fn pascal_string(&mut self, pad: usize, what: &str) -> ParseResult<String> {
        let len = usize::from(self.u8(what)?);
        let bytes = self.take(len, what)?;
        let consumed = 1 + len;
        let padding = (pad - consumed % pad) % pad;
        // Some writers drop the trailing padding on the last field of a record.
        self.skip(padding.min(self.remaining()), what)?;
        // Latin-1 is a superset-compatible reading of the legacy Mac Roman names.
        Ok(bytes.iter().map(|&b| char::from(b)).collect())
    }

    /// Consume up to three zero bytes of alignment filler.
    pub(crate) fn skip_zero_padding(&mut self) {
        let mut n = 0;
        while n < 3 && self.buf.get(self.pos) == Some(&0) {
            self.pos += 1;
            n += 1;
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/container/reader.rs"]
mod tests;
