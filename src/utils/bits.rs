use roaring::RoaringBitmap;

/// Random-access view of a set of documents, used for live (non-deleted) docs.
pub trait Bits: Send + Sync {
    fn get(&self, index: u32) -> bool;

    fn len(&self) -> u32;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Live docs as a roaring bitmap of the surviving document ids.
impl Bits for RoaringBitmap {
    fn get(&self, index: u32) -> bool {
        self.contains(index)
    }

    fn len(&self) -> u32 {
        self.max().map(|m| m + 1).unwrap_or(0)
    }
}

/// Dense bitset over `0..len`.
#[derive(Debug, Clone)]
pub struct FixedBits {
    words: Vec<u64>,
    len: u32,
}

impl FixedBits {
    /// All bits set.
    pub fn all(len: u32) -> Self {
        let mut bits = Self {
            words: vec![!0u64; (len as usize).div_ceil(64)],
            len,
        };
        let tail = len % 64;
        if tail != 0 {
            if let Some(last) = bits.words.last_mut() {
                *last = (1u64 << tail) - 1;
            }
        }
        bits
    }

    pub fn clear(&mut self, index: u32) {
        if index < self.len {
            self.words[(index / 64) as usize] &= !(1u64 << (index % 64));
        }
    }

    pub fn set(&mut self, index: u32) {
        if index < self.len {
            self.words[(index / 64) as usize] |= 1u64 << (index % 64);
        }
    }

    pub fn count_ones(&self) -> u32 {
        self.words.iter().map(|w| w.count_ones()).sum()
    }
}

impl Bits for FixedBits {
    fn get(&self, index: u32) -> bool {
        index < self.len && self.words[(index / 64) as usize] & (1u64 << (index % 64)) != 0
    }

    fn len(&self) -> u32 {
        self.len
    }
}
