//! Word-addressed data memory with a byte view
use crate::{dialect::Addressing, vm::FaultKind};
use std::collections::BTreeMap;

/// Bounded data memory
///
/// Storage is sparse: only non-zero words are kept, so a machine with a
/// large address space only pays for what it touches, and reads of
/// never-written words return zero.  Bytes are packed little-endian within
/// each word.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Memory {
    /// Non-zero words, keyed by word index
    words: BTreeMap<u64, u64>,

    /// Total number of addressable words
    limit: u64,

    /// Words `0..read_only` are write-protected
    read_only: u64,

    /// Bytes per word, used for byte addressing
    word_bytes: u64,

    /// Mask applied to every stored word
    mask: u64,
}

impl Memory {
    /// Builds a zero-filled memory of `limit` words
    pub fn new(limit: u64, word_bytes: u64, mask: u64) -> Self {
        Self {
            words: BTreeMap::new(),
            limit,
            read_only: 0,
            word_bytes,
            mask,
        }
    }

    /// Loads a segment at the bottom of memory
    ///
    /// If `protect` is set, the segment becomes read-only.  Words past
    /// `limit` are dropped; callers are expected to check the size first.
    pub fn preload(&mut self, data: &[u64], protect: bool) {
        let limit = usize::try_from(self.limit).unwrap_or(usize::MAX);
        let n = data.len().min(limit);
        let mask = self.mask;
        self.words = (0..)
            .zip(&data[..n])
            .map(|(i, w)| (i, w & mask))
            .filter(|&(_, w)| w != 0)
            .collect();
        self.read_only = if protect { n as u64 } else { 0 };
    }

    /// Number of addressable words
    pub fn limit(&self) -> u64 {
        self.limit
    }

    /// Size of the read-only segment, in words
    pub fn read_only(&self) -> u64 {
        self.read_only
    }

    /// Iterates over non-zero words as `(index, value)`, in index order
    pub fn words(&self) -> impl Iterator<Item = (u64, u64)> + '_ {
        self.words.iter().map(|(&i, &w)| (i, w))
    }

    /// Returns the non-zero words, keyed by index
    pub fn to_map(&self) -> BTreeMap<u64, u64> {
        self.words.clone()
    }

    /// Converts an address operand into a word index
    pub fn word_index(
        &self,
        addr: u64,
        mode: Addressing,
    ) -> Result<u64, FaultKind> {
        match mode {
            Addressing::Word => Ok(addr),
            Addressing::Byte if addr % self.word_bytes != 0 => {
                Err(FaultKind::MisalignedAccess { address: addr })
            }
            Addressing::Byte => Ok(addr / self.word_bytes),
        }
    }

    /// Reads the word at the given index
    pub fn read_word(&self, index: u64) -> Result<u64, FaultKind> {
        if index >= self.limit {
            return Err(FaultKind::MemoryOutOfBounds { address: index });
        }
        Ok(self.words.get(&index).copied().unwrap_or(0))
    }

    /// Writes the word at the given index
    pub fn write_word(&mut self, index: u64, v: u64) -> Result<(), FaultKind> {
        if index >= self.limit {
            return Err(FaultKind::MemoryOutOfBounds { address: index });
        }
        if index < self.read_only {
            return Err(FaultKind::ReadOnlyWrite { address: index });
        }
        match v & self.mask {
            0 => self.words.remove(&index),
            v => self.words.insert(index, v),
        };
        Ok(())
    }

    /// Reads a single byte, addressed by byte offset
    pub fn read_byte(&self, addr: u64) -> Result<u8, FaultKind> {
        let (index, shift) = self.split(addr)?;
        let w = self.read_word(index)?;
        Ok((w >> shift) as u8)
    }

    /// Writes a single byte, addressed by byte offset
    ///
    /// When `W` is not a multiple of 8, the top byte of each word is only
    /// partially backed; writing a value that does not fit in it faults with
    /// [`FaultKind::ByteOverflow`].
    pub fn write_byte(&mut self, addr: u64, v: u8) -> Result<(), FaultKind> {
        let (index, shift) = self.split(addr)?;
        let byte = u64::from(v) << shift;
        if byte & !self.mask != 0 {
            return Err(FaultKind::ByteOverflow { address: addr });
        }
        let w = self.read_word(index)?;
        self.write_word(index, (w & !(0xff << shift)) | byte)
    }

    /// Splits a byte address into a word index and bit shift
    fn split(&self, addr: u64) -> Result<(u64, u64), FaultKind> {
        let index = addr / self.word_bytes;
        if index >= self.limit {
            return Err(FaultKind::MemoryOutOfBounds { address: addr });
        }
        Ok((index, (addr % self.word_bytes) * 8))
    }
}
