//! Sequential input tapes

/// Index of the primary (deterministic) input tape
pub const PRIMARY: usize = 0;

/// Index of the auxiliary (advice) input tape
pub const AUXILIARY: usize = 1;

/// Read-only input tape, consumed left to right
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Tape {
    words: Vec<u64>,
    pos: usize,
}

impl Tape {
    /// Builds a tape positioned at its first word
    pub fn new(words: Vec<u64>) -> Self {
        Self { words, pos: 0 }
    }

    /// Consumes the next word, or returns `None` if the tape is exhausted
    pub fn next_word(&mut self) -> Option<u64> {
        let w = self.words.get(self.pos).copied()?;
        self.pos += 1;
        Some(w)
    }

    /// Number of words consumed so far
    pub fn consumed(&self) -> usize {
        self.pos
    }

    /// Words that have not been read yet
    pub fn remaining(&self) -> &[u64] {
        &self.words[self.pos..]
    }

    /// Moves the cursor back to the start of the tape
    pub fn rewind(&mut self) {
        self.pos = 0;
    }
}

impl From<Vec<u64>> for Tape {
    fn from(words: Vec<u64>) -> Self {
        Self::new(words)
    }
}
