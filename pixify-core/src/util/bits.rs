//! Bit-level access to packed byte buffers.
//!
//! Bits are addressed MSB-first: bit 0 is the high bit of byte 0. `Bits` is a
//! borrowed view and `BitWriter` an append-only packer; neither stores one
//! value per bit.

/// View `bytes` as a bit sequence, most significant bit of each byte first.
/// The view has exactly `8 * bytes.len()` bits.
pub fn bytes_to_bits(bytes: &[u8]) -> Bits<'_> {
    Bits::new(bytes)
}

/// Expand one raster sample into its 8 bits, MSB first.
pub fn sample_to_bits(sample: u8) -> [bool; 8] {
    let mut out = [false; 8];
    for (i, bit) in out.iter_mut().enumerate() {
        *bit = (sample >> (7 - i)) & 1 == 1;
    }
    out
}

/// Pack up to 8 bits, MSB first, into one raster sample.
///
/// A short group (end of stream) is right-padded with zero bits. Bits past
/// the eighth are ignored.
pub fn bits_to_sample(bits: &[bool]) -> u8 {
    bits.iter()
        .take(8)
        .enumerate()
        .fold(0u8, |acc, (i, &bit)| if bit { acc | (0x80 >> i) } else { acc })
}

/// Borrowed, bit-indexed window over a byte slice.
#[derive(Clone, Copy, Debug)]
pub struct Bits<'a> {
    bytes: &'a [u8],
    /// Absolute bit offset of this view inside `bytes`
    start: usize,
    len: usize,
}

impl<'a> Bits<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            start: 0,
            len: bytes.len() * 8,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn get(&self, index: usize) -> Option<bool> {
        if index >= self.len {
            return None;
        }
        let abs = self.start + index;
        Some(sample_to_bits(self.bytes[abs / 8])[abs % 8])
    }

    /// Sub-view of up to `len` bits starting at `start`, clamped to this view.
    pub fn slice(&self, start: usize, len: usize) -> Bits<'a> {
        let start = start.min(self.len);
        let len = len.min(self.len - start);
        Bits {
            bytes: self.bytes,
            start: self.start + start,
            len,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        (0..self.len).filter_map(move |i| self.get(i))
    }

    /// Read `width` bits (at most 64) from `start` as a big-endian unsigned
    /// integer. `None` if the range leaves the view.
    pub fn read_uint(&self, start: usize, width: usize) -> Option<u64> {
        if width > 64 || start.checked_add(width)? > self.len {
            return None;
        }
        let mut value = 0u64;
        for i in start..start + width {
            value = (value << 1) | u64::from(self.get(i)?);
        }
        Some(value)
    }

    fn is_byte_aligned(&self) -> bool {
        self.start % 8 == 0
    }

    /// Whole bytes covered by an aligned view; trailing partial byte excluded.
    fn whole_bytes(&self) -> &'a [u8] {
        let first = self.start / 8;
        &self.bytes[first..first + self.len / 8]
    }
}

/// Appends bits MSB-first into a growing byte buffer.
///
/// Bits past `bit_len` in the last byte are always zero, so `finish` yields a
/// zero-padded buffer without extra work.
#[derive(Debug, Clone, Default)]
pub struct BitWriter {
    bytes: Vec<u8>,
    bit_len: usize,
}

impl BitWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity_bits(bits: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(bits.div_ceil(8)),
            bit_len: 0,
        }
    }

    pub fn bit_len(&self) -> usize {
        self.bit_len
    }

    pub fn push(&mut self, bit: bool) {
        let offset = self.bit_len % 8;
        if offset == 0 {
            self.bytes.push(0);
        }
        if bit {
            if let Some(last) = self.bytes.last_mut() {
                *last |= 0x80 >> offset;
            }
        }
        self.bit_len += 1;
    }

    /// Write the low `width` bits of `value`, most significant first.
    pub fn write_uint(&mut self, value: u64, width: usize) {
        debug_assert!(width <= 64);
        for shift in (0..width.min(64)).rev() {
            self.push((value >> shift) & 1 == 1);
        }
    }

    pub fn extend_bits(&mut self, bits: Bits<'_>) {
        if self.bit_len % 8 != 0 {
            for bit in bits.iter() {
                self.push(bit);
            }
            return;
        }

        if bits.is_byte_aligned() {
            let whole = bits.whole_bytes();
            self.bytes.extend_from_slice(whole);
            self.bit_len += whole.len() * 8;
            for bit in bits.slice(whole.len() * 8, bits.len()).iter() {
                self.push(bit);
            }
            return;
        }

        // Unaligned source into an aligned writer: regroup into samples.
        let mut group = [false; 8];
        let mut filled = 0;
        for bit in bits.iter() {
            group[filled] = bit;
            filled += 1;
            if filled == 8 {
                self.bytes.push(bits_to_sample(&group));
                self.bit_len += 8;
                filled = 0;
            }
        }
        if filled > 0 {
            self.bytes.push(bits_to_sample(&group[..filled]));
            self.bit_len += filled;
        }
    }

    /// Zero-fill up to `bits` total bits. No-op if already that long.
    pub fn pad_to(&mut self, bits: usize) {
        if bits <= self.bit_len {
            return;
        }
        self.bytes.resize(bits.div_ceil(8), 0);
        self.bit_len = bits;
    }

    pub fn finish(self) -> Vec<u8> {
        self.bytes
    }
}
