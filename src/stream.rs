use crate::error::FormatError;

/// Iterates over unsigned integers packed big-endian at `size` bits each.
#[derive(Clone)]
pub(crate) struct NBitwiseIterator<T> {
    data: T,
    size: usize,
    pos: usize,
    offset: usize,
}

impl<T> NBitwiseIterator<T> {
    pub(crate) fn new(data: T, size: usize) -> Self {
        Self {
            data,
            size,
            pos: 0,
            offset: 0,
        }
    }
}

impl<T> Iterator for NBitwiseIterator<T>
where
    T: AsRef<[u8]>,
{
    type Item = u32;

    fn next(&mut self) -> Option<Self::Item> {
        let new_offset = self.offset + self.size;
        let (new_pos, new_offset) = (self.pos + new_offset / 8, new_offset % 8);
        let slice = self.data.as_ref();

        if self.size == 0
            || self.pos >= slice.len()
            || new_pos > slice.len()
            || (new_pos == slice.len() && new_offset > 0)
        {
            return None;
        }

        let val = slice[self.pos] << self.offset >> self.offset;
        let mut val: u32 = u32::from(val);
        if new_pos == self.pos {
            val >>= 8 - new_offset;
        } else {
            let mut pos = self.pos + 1;
            while pos < new_pos {
                val = (val << 8) | u32::from(slice[pos]);
                pos += 1;
            }
            if new_offset > 0 {
                let shift = 8 - new_offset;
                let last_val = u32::from(slice[pos]) >> shift;
                val = (val << new_offset) | last_val;
            }
        }

        self.pos = new_pos;
        self.offset = new_offset;
        Some(val)
    }
}

/// Number of bytes needed to hold `count` samples of `bpp` bits.
pub(crate) fn packed_len(bpp: u8, count: usize) -> usize {
    (count * usize::from(bpp)).div_ceil(8)
}

/// Unpacks `count` raw samples of `bpp` bits from a segment data field.
pub(crate) fn unpack_samples(data: &[u8], bpp: u8, count: usize) -> Result<Vec<u16>, FormatError> {
    if !(1..=16).contains(&bpp) {
        return Err(FormatError::UnsupportedBitsPerPixel(bpp));
    }
    let needed = packed_len(bpp, count);
    if data.len() < needed {
        return Err(FormatError::ShortPayload(needed, data.len()));
    }

    let samples = match bpp {
        8 => data[..count].iter().map(|b| u16::from(*b)).collect(),
        16 => data[..needed]
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect(),
        _ => NBitwiseIterator::new(&data[..needed], usize::from(bpp))
            .take(count)
            .map(|v| v as u16)
            .collect(),
    };
    Ok(samples)
}

/// Packs samples big-endian at `bpp` bits each, zero-padding the last byte.
pub(crate) fn pack_samples(samples: &[u16], bpp: u8) -> Vec<u8> {
    let bpp = u32::from(bpp);
    let mask = if bpp >= 16 { u32::MAX } else { (1 << bpp) - 1 };
    let mut out = Vec::with_capacity(packed_len(bpp as u8, samples.len()));
    let mut acc: u32 = 0;
    let mut nbits = 0;
    for s in samples {
        acc = (acc << bpp) | (u32::from(*s) & mask);
        nbits += bpp;
        while nbits >= 8 {
            nbits -= 8;
            out.push((acc >> nbits) as u8);
        }
        acc &= (1 << nbits) - 1;
    }
    if nbits > 0 {
        out.push((acc << (8 - nbits)) as u8);
    }
    out
}
