//! Two-pass assembler for TinyRAM source text
//!
//! The first pass strips comments, records label definitions and parses each
//! instruction line into an opcode plus unresolved operands.  The second pass
//! resolves label references against the finished symbol table, so forward
//! references are legal.  Any error fails the whole unit.
use crate::{
    alu::Alu,
    dialect::{Dialect, HeaderError, Params},
    isa::{Args, Instruction, Opcode, Operand, Reg, Shape},
};
use log::debug;
use std::collections::HashMap;

/// A label bound to an instruction index
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Symbol {
    /// Label name (case-sensitive)
    pub name: String,
    /// Index of the instruction following the label definition
    pub address: usize,
    /// Source line of the definition (1-indexed)
    pub line: usize,
}

/// Label definitions, in source order
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SymbolTable {
    symbols: Vec<Symbol>,
    index: HashMap<String, usize>,
}

impl SymbolTable {
    /// Adds a symbol, returning the existing definition if the name is taken
    fn insert(&mut self, sym: Symbol) -> Result<(), &Symbol> {
        if let Some(&i) = self.index.get(&sym.name) {
            return Err(&self.symbols[i]);
        }
        self.index.insert(sym.name.clone(), self.symbols.len());
        self.symbols.push(sym);
        Ok(())
    }

    /// Looks up a symbol by name
    pub fn get(&self, name: &str) -> Option<&Symbol> {
        self.index.get(name).map(|&i| &self.symbols[i])
    }

    /// Looks up a label's instruction index
    pub fn address(&self, name: &str) -> Option<usize> {
        self.get(name).map(|s| s.address)
    }

    /// Iterates over symbols in definition order
    pub fn iter(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.iter()
    }

    /// Number of symbols
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Checks whether the table is empty
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

/// An assembled program
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Program {
    params: Params,
    instructions: Vec<Instruction>,
    symbols: SymbolTable,

    /// Source line (1-indexed) of each instruction
    lines: Vec<usize>,
}

impl Program {
    /// Parameters the program was assembled for
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Instruction sequence, indexed by program counter
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Label definitions
    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    /// Source line of the instruction at `pc`
    pub fn line(&self, pc: usize) -> Option<usize> {
        self.lines.get(pc).copied()
    }

    /// Number of instructions
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    /// Checks whether the program has no instructions
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }
}

/// An assembly failure, tagged with its source line
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("line {line}: {kind}")]
pub struct AsmError {
    /// Source line (1-indexed); 0 if the error is not tied to a line
    pub line: usize,
    /// What went wrong
    pub kind: AsmErrorKind,
}

/// Classification of assembly errors
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum AsmErrorKind {
    /// No header line, and no parameters supplied by the caller
    #[error("missing `; TinyRAM V=.. W=.. K=..` header")]
    MissingHeader,
    /// The header line is malformed
    #[error(transparent)]
    Header(#[from] HeaderError),
    /// Unrecognized mnemonic
    #[error("unknown mnemonic `{0}`")]
    UnknownMnemonic(String),
    /// Mnemonic exists, but not in this dialect
    #[error("`{op}` is not available in TinyRAM {dialect}")]
    IllegalInDialect {
        /// Offending opcode
        op: Opcode,
        /// Dialect being assembled
        dialect: Dialect,
    },
    /// Wrong number of operands
    #[error("`{op}` takes {expected} operands, got {actual}")]
    Arity {
        /// Opcode being assembled
        op: Opcode,
        /// Operands required
        expected: usize,
        /// Operands supplied
        actual: usize,
    },
    /// A register operand was required
    #[error("expected a register, got `{0}`")]
    ExpectedRegister(String),
    /// Register index is not below `K`
    #[error("register r{index} does not exist (K = {count})")]
    RegisterOutOfRange {
        /// Index as written
        index: u64,
        /// Register count
        count: u16,
    },
    /// Immediate does not fit in a word
    #[error("immediate `{value}` does not fit in {bits} bits")]
    ImmediateOutOfRange {
        /// Immediate as written
        value: String,
        /// Word width
        bits: u32,
    },
    /// Operand is not a register, immediate, or label
    #[error("malformed operand `{0}`")]
    BadOperand(String),
    /// Label definition is not a valid identifier
    #[error("malformed label `{0}`")]
    BadLabel(String),
    /// Label defined twice
    #[error("label `{name}` is already defined on line {first}")]
    DuplicateLabel {
        /// Label name
        name: String,
        /// Line of the first definition
        first: usize,
    },
    /// Reference to a label that is never defined
    #[error("undefined label `{0}`")]
    UndefinedLabel(String),
    /// Label address does not fit in a word
    #[error("label `{name}` is at instruction {address}, past {bits}-bit range")]
    LabelOutOfRange {
        /// Label name
        name: String,
        /// Instruction index of the label
        address: usize,
        /// Word width
        bits: u32,
    },
}

impl AsmErrorKind {
    fn at(self, line: usize) -> AsmError {
        AsmError { line, kind: self }
    }
}

/// Operand before label resolution
#[derive(Clone, Debug, PartialEq, Eq)]
enum Arg {
    Reg(Reg),
    Imm(u64),
    Label(String),
}

/// Instruction from the first pass, waiting for label resolution
struct Pending {
    op: Opcode,
    args: Vec<Arg>,
    line: usize,
}

/// Assembles a program, reading parameters from its header line
pub fn assemble(source: &str) -> Result<Program, AsmError> {
    assemble_with(source, None)
}

/// Assembles a program
///
/// If `params` is provided, it takes precedence over the header line (which
/// is then treated as an ordinary comment).
pub fn assemble_with(
    source: &str,
    params: Option<Params>,
) -> Result<Program, AsmError> {
    let params = match params {
        Some(p) => {
            p.check().map_err(|e| AsmErrorKind::from(e).at(0))?;
            p
        }
        None => header(source)?,
    };
    let alu = Alu::new(params.word_bits);

    // First pass: collect labels and unresolved instructions
    let mut symbols = SymbolTable::default();
    let mut pending = vec![];
    for (i, line) in source.lines().enumerate() {
        let line_no = i + 1;
        let text = strip_comment(line).trim();
        if text.is_empty() {
            continue;
        }
        if let Some(name) = text.strip_suffix(':') {
            let name = name.trim_end();
            if !is_label(name) {
                return Err(AsmErrorKind::BadLabel(name.to_owned()).at(line_no));
            }
            let sym = Symbol {
                name: name.to_owned(),
                address: pending.len(),
                line: line_no,
            };
            if let Err(prev) = symbols.insert(sym) {
                let kind = AsmErrorKind::DuplicateLabel {
                    name: name.to_owned(),
                    first: prev.line,
                };
                return Err(kind.at(line_no));
            }
            continue;
        }
        let p = parse_instruction(text, &params, &alu)
            .map_err(|k| k.at(line_no))?;
        pending.push(Pending { line: line_no, ..p });
    }

    // Second pass: resolve labels and build instructions
    let mut instructions = Vec::with_capacity(pending.len());
    let mut lines = Vec::with_capacity(pending.len());
    for p in pending {
        let mut operands = Vec::with_capacity(p.args.len());
        for a in p.args {
            let o = match a {
                Arg::Reg(r) => Operand::Reg(r),
                Arg::Imm(v) => Operand::Imm(v),
                Arg::Label(name) => match symbols.address(&name) {
                    Some(addr) if addr as u64 <= alu.mask() => {
                        Operand::Imm(addr as u64)
                    }
                    Some(address) => {
                        let kind = AsmErrorKind::LabelOutOfRange {
                            name,
                            address,
                            bits: alu.bits(),
                        };
                        return Err(kind.at(p.line));
                    }
                    None => {
                        return Err(
                            AsmErrorKind::UndefinedLabel(name).at(p.line)
                        );
                    }
                },
            };
            operands.push(o);
        }
        instructions.push(build(p.op, &operands).map_err(|k| k.at(p.line))?);
        lines.push(p.line);
    }

    debug!(
        "assembled {} instructions and {} labels for `{params}`",
        instructions.len(),
        symbols.len(),
    );
    Ok(Program {
        params,
        instructions,
        symbols,
        lines,
    })
}

/// Finds and parses the header, which must be the first non-blank line
fn header(source: &str) -> Result<Params, AsmError> {
    let Some((i, line)) = source
        .lines()
        .enumerate()
        .find(|(_, line)| !line.trim().is_empty())
    else {
        return Err(AsmErrorKind::MissingHeader.at(0));
    };
    match Params::from_header(line) {
        Ok(Some(p)) => Ok(p),
        Ok(None) => Err(AsmErrorKind::MissingHeader.at(i + 1)),
        Err(e) => Err(AsmErrorKind::from(e).at(i + 1)),
    }
}

/// Removes everything from the first `;` onwards
fn strip_comment(line: &str) -> &str {
    line.split_once(';').map(|(code, _)| code).unwrap_or(line)
}

/// Parses a register token of the form `r<digits>`
///
/// Returns `None` if the token is not shaped like a register at all.
fn register(s: &str) -> Option<u64> {
    let digits = s.strip_prefix('r')?;
    if digits.is_empty() || !digits.bytes().all(|c| c.is_ascii_digit()) {
        return None;
    }
    // Too many digits to fit in a u64 is still a register token
    Some(digits.parse().unwrap_or(u64::MAX))
}

/// Checks whether a string is a valid label name
fn is_label(s: &str) -> bool {
    let mut chars = s.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first.is_ascii_alphabetic() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        && register(s).is_none()
}

/// Parses a decimal immediate, wrapping negative values to `W` bits
fn immediate(s: &str, alu: &Alu) -> Result<u64, AsmErrorKind> {
    let out_of_range = || AsmErrorKind::ImmediateOutOfRange {
        value: s.to_owned(),
        bits: alu.bits(),
    };
    let digits = s.strip_prefix('-').unwrap_or(s);
    if digits.is_empty() || !digits.bytes().all(|c| c.is_ascii_digit()) {
        return Err(AsmErrorKind::BadOperand(s.to_owned()));
    }
    let v: i128 = s.parse().map_err(|_| out_of_range())?;
    let min = -(1i128 << (alu.bits() - 1));
    if v > i128::from(alu.mask()) || v < min {
        return Err(out_of_range());
    }
    Ok(alu.truncate(v as u64))
}

/// Classifies a single operand token
fn operand(s: &str, params: &Params, alu: &Alu) -> Result<Arg, AsmErrorKind> {
    if let Some(index) = register(s) {
        return if index < u64::from(params.registers) {
            Ok(Arg::Reg(Reg(index as u16)))
        } else {
            Err(AsmErrorKind::RegisterOutOfRange {
                index,
                count: params.registers,
            })
        };
    }
    match s.as_bytes().first() {
        Some(c) if c.is_ascii_digit() || *c == b'-' => {
            immediate(s, alu).map(Arg::Imm)
        }
        _ if is_label(s) => Ok(Arg::Label(s.to_owned())),
        _ => Err(AsmErrorKind::BadOperand(s.to_owned())),
    }
}

/// Parses `mnemonic operand, operand, ...` into an unresolved instruction
fn parse_instruction(
    text: &str,
    params: &Params,
    alu: &Alu,
) -> Result<Pending, AsmErrorKind> {
    let (mnemonic, rest) = text
        .split_once(char::is_whitespace)
        .map(|(m, r)| (m, r.trim()))
        .unwrap_or((text, ""));
    let op = Opcode::from_mnemonic(mnemonic)
        .ok_or_else(|| AsmErrorKind::UnknownMnemonic(mnemonic.to_owned()))?;
    if !params.dialect.allows(op) {
        return Err(AsmErrorKind::IllegalInDialect {
            op,
            dialect: params.dialect,
        });
    }

    let tokens: Vec<&str> = if rest.is_empty() {
        vec![]
    } else {
        rest.split(',').map(str::trim).collect()
    };
    let expected = op.shape().arity();
    if tokens.len() != expected {
        return Err(AsmErrorKind::Arity {
            op,
            expected,
            actual: tokens.len(),
        });
    }

    let args = tokens
        .iter()
        .map(|t| operand(t, params, alu))
        .collect::<Result<Vec<_>, _>>()?;

    // Register slots must hold registers
    let reg_slots: &[usize] = match op.shape() {
        Shape::Ternary => &[0, 1],
        Shape::Binary => &[0],
        Shape::Unary => &[],
        Shape::Store => &[1],
    };
    for &i in reg_slots {
        if !matches!(args[i], Arg::Reg(..)) {
            return Err(AsmErrorKind::ExpectedRegister(tokens[i].to_owned()));
        }
    }

    Ok(Pending { op, args, line: 0 })
}

/// Builds an instruction from resolved operands
fn build(
    op: Opcode,
    operands: &[Operand],
) -> Result<Instruction, AsmErrorKind> {
    let reg = |i: usize| match operands[i] {
        Operand::Reg(r) => Ok(r),
        Operand::Imm(v) => Err(AsmErrorKind::ExpectedRegister(v.to_string())),
    };
    let args = match op.shape() {
        Shape::Ternary => Args::Ternary(reg(0)?, reg(1)?, operands[2]),
        Shape::Binary => Args::Binary(reg(0)?, operands[1]),
        Shape::Unary => Args::Unary(operands[0]),
        Shape::Store => Args::Store(operands[0], reg(1)?),
    };
    op.build(args).ok_or(AsmErrorKind::Arity {
        op,
        expected: op.shape().arity(),
        actual: operands.len(),
    })
}
