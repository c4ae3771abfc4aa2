//! Binary primitives for segment files.
//!
//! All counts are little-endian `u32`, strings are `u32`-length-prefixed
//! UTF-8, and doc ids / frequencies are LEB128 varints. Doc id lists are
//! delta-encoded against the previous id in ascending order.

/// Encode a u32 as a variable-length integer
pub fn encode_varint(mut value: u32, buf: &mut Vec<u8>) {
    loop {
        if value < 0x80 {
            buf.push(value as u8);
            break;
        }
        buf.push((value as u8) | 0x80);
        value >>= 7;
    }
}

/// Decode a variable-length integer from a slice
/// Returns (value, bytes_consumed)
pub fn decode_varint(buf: &[u8]) -> Option<(u32, usize)> {
    let (value, consumed) = decode_varint_u64(buf)?;
    u32::try_from(value).ok().map(|v| (v, consumed))
}

/// Encode a u64 as a variable-length integer
pub fn encode_varint_u64(mut value: u64, buf: &mut Vec<u8>) {
    loop {
        if value < 0x80 {
            buf.push(value as u8);
            break;
        }
        buf.push((value as u8) | 0x80);
        value >>= 7;
    }
}

/// Decode a u64 variable-length integer
pub fn decode_varint_u64(buf: &[u8]) -> Option<(u64, usize)> {
    let mut result: u64 = 0;
    let mut shift = 0;

    for (i, &byte) in buf.iter().enumerate() {
        if shift >= 64 {
            return None;
        }

        result |= ((byte & 0x7F) as u64) << shift;

        if byte & 0x80 == 0 {
            return Some((result, i + 1));
        }

        shift += 7;
    }

    None
}

/// Append a u32 in little-endian format
pub fn put_u32_le(buf: &mut Vec<u8>, value: u32) {
    buf.extend_from_slice(&value.to_le_bytes());
}

/// Append a length-prefixed UTF-8 string
pub fn put_string(buf: &mut Vec<u8>, value: &str) {
    put_u32_le(buf, value.len() as u32);
    buf.extend_from_slice(value.as_bytes());
}

/// Delta-encode doc ids with their associated value, ids ascending
pub fn delta_encode_pairs<I>(pairs: I, buf: &mut Vec<u8>)
where
    I: IntoIterator<Item = (u64, u32)>,
{
    let mut prev = 0u64;
    for (id, value) in pairs {
        encode_varint_u64(id - prev, buf);
        encode_varint(value, buf);
        prev = id;
    }
}

/// Cursor over an encoded buffer. Every accessor returns `None` on
/// truncated or malformed input instead of panicking.
pub struct ByteReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn is_exhausted(&self) -> bool {
        self.pos >= self.buf.len()
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn u32_le(&mut self) -> Option<u32> {
        let bytes = self.take(4)?;
        Some(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub fn varint(&mut self) -> Option<u32> {
        let (value, consumed) = decode_varint(&self.buf[self.pos..])?;
        self.pos += consumed;
        Some(value)
    }

    pub fn varint_u64(&mut self) -> Option<u64> {
        let (value, consumed) = decode_varint_u64(&self.buf[self.pos..])?;
        self.pos += consumed;
        Some(value)
    }

    pub fn string(&mut self) -> Option<String> {
        let len = self.u32_le()? as usize;
        let bytes = self.take(len)?;
        std::str::from_utf8(bytes).ok().map(str::to_owned)
    }

    /// Read `count` delta-encoded (id, value) pairs
    pub fn delta_pairs(&mut self, count: usize) -> Option<Vec<(u64, u32)>> {
        // Each pair needs at least two bytes; reject counts the buffer cannot hold
        if count > (self.buf.len() - self.pos) / 2 {
            return None;
        }
        let mut out = Vec::with_capacity(count);
        let mut prev = 0u64;
        for _ in 0..count {
            let delta = self.varint_u64()?;
            let value = self.varint()?;
            prev = prev.checked_add(delta)?;
            out.push((prev, value));
        }
        Some(out)
    }

    fn take(&mut self, len: usize) -> Option<&'a [u8]> {
        let end = self.pos.checked_add(len)?;
        if end > self.buf.len() {
            return None;
        }
        let slice = &self.buf[self.pos..end];
        self.pos = end;
        Some(slice)
    }
}
