//! Machine parameters and the differences between TinyRAM versions
use crate::isa::Opcode;
use std::fmt;

/// Largest supported register count
pub const MAX_REGISTERS: u16 = 1024;

/// TinyRAM instruction set version
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum Dialect {
    /// `V=1.000`: compare-and-`cjmp` branches, word-addressed `store`/`load`
    V1,
    /// `V=2.00`: adds `cnjmp` and the byte-addressed `.w` / `.b` memory
    /// operations
    V2,
}

impl Dialect {
    /// Parses the value of a `V=` header field
    #[allow(clippy::float_cmp)]
    pub fn parse(s: &str) -> Option<Self> {
        match s.parse::<f64>().ok()? {
            v if v == 1.0 => Some(Dialect::V1),
            v if v == 2.0 => Some(Dialect::V2),
            _ => None,
        }
    }

    /// Checks whether the given opcode exists in this dialect
    pub fn allows(self, op: Opcode) -> bool {
        match self {
            Dialect::V2 => true,
            Dialect::V1 => !matches!(
                op,
                Opcode::Cnjmp
                    | Opcode::StoreW
                    | Opcode::LoadW
                    | Opcode::StoreB
                    | Opcode::LoadB
            ),
        }
    }

    /// Canonical version string, as written in a header
    pub const fn as_str(self) -> &'static str {
        match self {
            Dialect::V1 => "1.000",
            Dialect::V2 => "2.00",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "V={}", self.as_str())
    }
}

/// Memory layout
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum MemoryModel {
    /// `M=vn`: a single flat, writable memory
    #[default]
    Flat,
    /// `M=hv`: a read-only segment (preloaded by the caller) at the bottom of
    /// memory, followed by writable data
    Harvard,
}

impl MemoryModel {
    /// Parses the value of an `M=` header field
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "vn" => Some(MemoryModel::Flat),
            "hv" => Some(MemoryModel::Harvard),
            _ => None,
        }
    }

    /// Header tag for this model
    pub const fn as_str(self) -> &'static str {
        match self {
            MemoryModel::Flat => "vn",
            MemoryModel::Harvard => "hv",
        }
    }
}

/// How an address operand is turned into a word index
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum Addressing {
    /// The operand is a word index
    Word,
    /// The operand is a byte offset, which must be a multiple of the word
    /// size in bytes
    #[default]
    Byte,
}

/// Machine parameters, normally read from the program header
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Params {
    /// Instruction set version
    pub dialect: Dialect,
    /// Memory layout
    pub memory: MemoryModel,
    /// `W`: word width in bits
    pub word_bits: u32,
    /// `K`: number of registers
    pub registers: u16,
}

impl Params {
    /// Builds a set of parameters with a flat memory model
    pub const fn new(dialect: Dialect, word_bits: u32, registers: u16) -> Self {
        Self {
            dialect,
            memory: MemoryModel::Flat,
            word_bits,
            registers,
        }
    }

    /// Returns a copy with the given memory model
    pub const fn with_memory(self, memory: MemoryModel) -> Self {
        Self { memory, ..self }
    }

    /// Checks that `W` and `K` are within supported bounds
    pub fn check(&self) -> Result<(), HeaderError> {
        if !(1..=64).contains(&self.word_bits) {
            return Err(HeaderError::WordBits(self.word_bits));
        }
        if !(1..=MAX_REGISTERS).contains(&self.registers) {
            return Err(HeaderError::Registers(u32::from(self.registers)));
        }
        Ok(())
    }

    /// Parses a `; TinyRAM V=.. [M=..] W=.. K=..` header line
    ///
    /// Returns `Ok(None)` if the line is not a header at all (i.e. it does
    /// not start with `; TinyRAM`).
    pub fn from_header(line: &str) -> Result<Option<Self>, HeaderError> {
        let Some(rest) = line.trim().strip_prefix(';') else {
            return Ok(None);
        };
        let mut words = rest.split_whitespace();
        if words.next() != Some("TinyRAM") {
            return Ok(None);
        }

        let mut dialect = None;
        let mut memory = None;
        let mut word_bits = None;
        let mut registers = None;
        for w in words {
            let (key, value) = w
                .split_once('=')
                .ok_or_else(|| HeaderError::Field(w.to_owned()))?;
            match key {
                "V" => {
                    let d = Dialect::parse(value).ok_or_else(|| {
                        HeaderError::Version(value.to_owned())
                    })?;
                    dialect = Some(d);
                }
                "M" => {
                    let m = MemoryModel::parse(value).ok_or_else(|| {
                        HeaderError::MemoryModel(value.to_owned())
                    })?;
                    memory = Some(m);
                }
                "W" => {
                    let v = value
                        .parse()
                        .map_err(|_| HeaderError::Field(w.to_owned()))?;
                    word_bits = Some(v);
                }
                "K" => {
                    let v: u32 = value
                        .parse()
                        .map_err(|_| HeaderError::Field(w.to_owned()))?;
                    let v = u16::try_from(v)
                        .map_err(|_| HeaderError::Registers(v))?;
                    registers = Some(v);
                }
                _ => return Err(HeaderError::Field(w.to_owned())),
            }
        }

        let params = Params {
            dialect: dialect.ok_or(HeaderError::Missing("V"))?,
            memory: memory.unwrap_or_default(),
            word_bits: word_bits.ok_or(HeaderError::Missing("W"))?,
            registers: registers.ok_or(HeaderError::Missing("K"))?,
        };
        params.check()?;
        Ok(Some(params))
    }
}

impl fmt::Display for Params {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "; TinyRAM {}", self.dialect)?;
        if self.memory == MemoryModel::Harvard {
            write!(f, " M={}", self.memory.as_str())?;
        }
        write!(f, " W={} K={}", self.word_bits, self.registers)
    }
}

/// Problems with a header line
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum HeaderError {
    /// A field is not of the form `KEY=value`, or has an unknown key
    #[error("malformed header field `{0}`")]
    Field(String),
    /// A required field is absent
    #[error("header is missing the `{0}=` field")]
    Missing(&'static str),
    /// Unknown `V=` value
    #[error("unsupported TinyRAM version `{0}`")]
    Version(String),
    /// Unknown `M=` value
    #[error("unknown memory model `{0}`")]
    MemoryModel(String),
    /// `W` is out of range
    #[error("word width {0} is outside 1..=64")]
    WordBits(u32),
    /// `K` is out of range
    #[error("register count {0} is outside 1..={MAX_REGISTERS}")]
    Registers(u32),
}
