//! Little-endian integer packing for the truncated widths used on the LoRaWAN wire, plus the
//! small signed field helpers.
use crate::error::Error;

/// Largest value that fits into `width` bytes.
pub const fn max_for_width(width: usize) -> u64 {
    if width >= 8 {
        u64::MAX
    } else {
        (1u64 << (8 * width)) - 1
    }
}

/// Writes `value` into the first `width` bytes of `dst`, least significant byte first.
///
/// Fails if `value` does not fit in `width` bytes or if `dst` is shorter than `width`.
pub fn put_uint_le(dst: &mut [u8], value: u64, width: usize) -> Result<(), Error> {
    if width > 8 || value > max_for_width(width) {
        return Err(Error::FieldOutOfRange { field: "uint", value });
    }
    if dst.len() < width {
        return Err(Error::BufferTooShort { required: width, available: dst.len() });
    }
    dst[..width].copy_from_slice(&value.to_le_bytes()[..width]);
    Ok(())
}

/// Reads a `width` byte little-endian integer from `src`.
///
/// Missing bytes read as zero; callers that need the full width check the length first.
pub fn get_uint_le(src: &[u8], width: usize) -> u64 {
    let mut buf = [0u8; 8];
    let n = width.min(8).min(src.len());
    buf[..n].copy_from_slice(&src[..n]);
    u64::from_le_bytes(buf)
}

/// Sign-extends the low `bits` bits of `raw` (two's-complement) into an `i8`.
///
/// A width of zero yields zero; widths above eight read the whole byte.
pub fn sign_extend(raw: u8, bits: u32) -> i8 {
    let bits = bits.min(8);
    if bits == 0 {
        return 0;
    }
    let shift = 8 - bits;
    ((raw << shift) as i8) >> shift
}

/// Packs `value` as a `bits` wide two's-complement number, `bits` in `1..=8`.
pub fn to_twos_complement(value: i8, bits: u32, field: &'static str) -> Result<u8, Error> {
    if !(1..=8).contains(&bits) {
        return Err(Error::FieldOutOfRange { field: "bits", value: u64::from(bits) });
    }
    let min = -(1i16 << (bits - 1));
    let max = (1i16 << (bits - 1)) - 1;
    let v = i16::from(value);
    if v < min || v > max {
        return Err(Error::FieldOutOfRange { field, value: value as u8 as u64 });
    }
    Ok((v as u8) & (((1u16 << bits) - 1) as u8))
}

/// Fails with `FieldOutOfRange` unless `value` fits in `bits` bits.
pub(crate) fn check_bits(field: &'static str, value: u8, bits: u32) -> Result<u8, Error> {
    if u16::from(value) >> bits != 0 {
        return Err(Error::out_of_range(field, value));
    }
    Ok(value)
}

/// Cursor writing into a caller supplied slice.
pub struct Writer<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> Writer<'a> {
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Number of bytes written so far.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// The bytes written so far.
    pub fn written(&self) -> &[u8] {
        &self.buf[..self.pos]
    }

    /// Claims the next `len` bytes of the buffer.
    pub fn reserve(&mut self, len: usize) -> Result<&mut [u8], Error> {
        let available = self.buf.len() - self.pos;
        if available < len {
            return Err(Error::BufferTooShort { required: self.pos + len, available: self.buf.len() });
        }
        let start = self.pos;
        self.pos += len;
        Ok(&mut self.buf[start..start + len])
    }

    pub fn put_u8(&mut self, v: u8) -> Result<(), Error> {
        self.reserve(1)?[0] = v;
        Ok(())
    }

    pub fn put_slice(&mut self, v: &[u8]) -> Result<(), Error> {
        self.reserve(v.len())?.copy_from_slice(v);
        Ok(())
    }

    /// Appends `value` as exactly `width` little-endian bytes.
    pub fn put_uint_le(&mut self, field: &'static str, value: u64, width: usize) -> Result<(), Error> {
        if value > max_for_width(width) {
            return Err(Error::FieldOutOfRange { field, value });
        }
        put_uint_le(self.reserve(width)?, value, width)
    }
}

/// Runs `encode` against the spare capacity of `dst` and keeps what it wrote.
///
/// On error `dst` is left as it was.
pub(crate) fn append_with<const N: usize, F>(
    dst: &mut heapless::Vec<u8, N>,
    encode: F,
) -> Result<usize, Error>
where
    F: FnOnce(&mut Writer<'_>) -> Result<(), Error>,
{
    let start = dst.len();
    // resize_default only fails when growing past N, which this never does.
    let _ = dst.resize_default(N);
    let res = {
        let mut w = Writer::new(&mut dst[start..]);
        encode(&mut w).map(|_| w.position())
    };
    match res {
        Ok(n) => {
            dst.truncate(start + n);
            Ok(n)
        }
        Err(e) => {
            dst.truncate(start);
            Err(e)
        }
    }
}
