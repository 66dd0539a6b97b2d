//! Execution transcripts
//!
//! A transcript is a SHA3-256 digest over a run's inputs (program text and
//! tapes) followed by the machine state after every step.  Two runs with
//! equal digests went through the same sequence of states.
use crate::{
    machine::Machine,
    vm::{Halt, Vm},
};
use sha3::{Digest as _, Sha3_256};
use std::fmt;

/// Transcript digest length in bytes
pub const DIGEST_LEN: usize = 32;

/// Finished transcript digest
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Digest(pub [u8; DIGEST_LEN]);

impl Digest {
    /// Returns the digest as a byte slice
    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

/// Incremental transcript builder
#[derive(Clone, Default)]
pub struct Transcript {
    hasher: Sha3_256,
    states: u64,
}

impl Transcript {
    /// Builds an empty transcript
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds raw bytes, e.g. the program source
    pub fn update(&mut self, data: &[u8]) {
        self.hasher.update(data);
    }

    /// Feeds a sequence of words, length-prefixed, e.g. an input tape
    pub fn absorb_words(&mut self, words: &[u64]) {
        self.hasher.update((words.len() as u64).to_be_bytes());
        for w in words {
            self.hasher.update(w.to_be_bytes());
        }
    }

    /// Feeds one machine state
    ///
    /// Covers the program counter, flag, every register, and the non-zero
    /// memory words as `(index, value)` pairs; integers are big-endian.
    pub fn absorb_state(&mut self, m: &Machine) {
        self.hasher.update((m.pc() as u64).to_be_bytes());
        self.hasher.update([u8::from(m.flag())]);
        for r in m.registers() {
            self.hasher.update(r.to_be_bytes());
        }
        for (i, w) in m.memory().words() {
            self.hasher.update(i.to_be_bytes());
            self.hasher.update(w.to_be_bytes());
        }
        self.states += 1;
    }

    /// Runs the machine to completion, absorbing the state after each step
    pub fn record(&mut self, vm: &mut Vm<'_>) -> Halt {
        loop {
            let halt = vm.run_until(|m, _| {
                self.absorb_state(m);
                false
            });
            if let Some(h) = halt {
                self.absorb_state(vm.machine());
                break h;
            }
        }
    }

    /// Number of states absorbed so far
    pub fn states(&self) -> u64 {
        self.states
    }

    /// Consumes the builder and returns the digest
    pub fn finalize(self) -> Digest {
        Digest(self.hasher.finalize().into())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{asm::assemble, vm::Config};

    const SRC: &str = "; TinyRAM V=1.000 W=16 K=2
        read r0, 0
        add r1, r0, 1
        store 3, r1
        answer r1";

    fn digest(tape: Vec<u64>) -> (Halt, u64, Digest) {
        let p = assemble(SRC).unwrap();
        let mut t = Transcript::new();
        t.update(SRC.as_bytes());
        t.absorb_words(&tape);
        let mut vm = Vm::new(&p, Config::from(&p), tape, vec![]).unwrap();
        let halt = t.record(&mut vm);
        (halt, t.states(), t.finalize())
    }

    #[test]
    fn empty() {
        assert_eq!(
            Transcript::new().finalize().to_string(),
            "a7ffc6f8bf1ed76651c14756a061d662f580ff4de43b49fa82d80a4b80f8434a"
        );
    }

    #[test]
    fn one_state_per_step() {
        let (halt, states, _) = digest(vec![41]);
        assert_eq!(halt, Halt::Answer(42));
        assert_eq!(states, 4);
    }

    #[test]
    fn deterministic() {
        let (_, _, a) = digest(vec![41]);
        let (_, _, b) = digest(vec![41]);
        assert_eq!(a, b);
        assert_eq!(a.to_string().len(), 2 * DIGEST_LEN);

        let (_, _, c) = digest(vec![40]);
        assert_ne!(a, c);
    }

    #[test]
    fn trailing_tape_words_count() {
        // The run is identical, but the unread tape word is part of the input
        let (_, _, a) = digest(vec![41]);
        let (_, _, b) = digest(vec![41, 0]);
        assert_ne!(a, b);
    }

    #[test]
    fn already_halted() {
        let p = assemble("; TinyRAM V=1.000 W=8 K=1\nanswer 3").unwrap();
        let mut vm = Vm::new(&p, Config::from(&p), vec![], vec![]).unwrap();
        vm.run();
        let mut t = Transcript::new();
        assert_eq!(t.record(&mut vm), Halt::Answer(3));
        assert_eq!(t.states(), 1);
    }
}
