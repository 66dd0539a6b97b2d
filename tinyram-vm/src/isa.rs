//! Instruction set
use std::fmt;

/// A register index, checked against `K` when the program is assembled
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Reg(pub u16);

impl fmt::Display for Reg {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "r{}", self.0)
    }
}

/// Source operand, with labels already resolved to instruction indices
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Operand {
    /// Value held in a register
    Reg(Reg),
    /// Immediate word, already truncated to `W` bits
    Imm(u64),
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Operand::Reg(r) => r.fmt(f),
            Operand::Imm(v) => v.fmt(f),
        }
    }
}

/// Operand layout of an opcode
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Shape {
    /// `op ri, rj, A`
    Ternary,
    /// `op ri, A`
    Binary,
    /// `op A`
    Unary,
    /// `op A, ri` (memory writes put the address first)
    Store,
}

impl Shape {
    /// Number of operands
    pub const fn arity(self) -> usize {
        match self {
            Shape::Ternary => 3,
            Shape::Binary | Shape::Store => 2,
            Shape::Unary => 1,
        }
    }
}

/// Operands of a single instruction, grouped by [`Shape`]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Args {
    /// `ri, rj, A`
    Ternary(Reg, Reg, Operand),
    /// `ri, A`
    Binary(Reg, Operand),
    /// `A`
    Unary(Operand),
    /// `A, ri`
    Store(Operand, Reg),
}

macro_rules! opcodes {
    ($($name:ident => $mnemonic:literal, $shape:ident;)*) => {
        /// Instruction mnemonic
        #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
        pub enum Opcode {
            $(
                #[doc = concat!("`", $mnemonic, "`")]
                $name,
            )*
        }

        impl Opcode {
            /// Every opcode, in encoding order
            pub const ALL: &'static [Opcode] = &[$(Opcode::$name),*];

            /// Lower-case mnemonic
            pub const fn mnemonic(self) -> &'static str {
                match self {
                    $(Opcode::$name => $mnemonic,)*
                }
            }

            /// Operand layout
            pub const fn shape(self) -> Shape {
                match self {
                    $(Opcode::$name => Shape::$shape,)*
                }
            }
        }
    };
}

opcodes! {
    And => "and", Ternary;
    Or => "or", Ternary;
    Xor => "xor", Ternary;
    Not => "not", Binary;
    Add => "add", Ternary;
    Sub => "sub", Ternary;
    Mull => "mull", Ternary;
    Umulh => "umulh", Ternary;
    Smulh => "smulh", Ternary;
    Udiv => "udiv", Ternary;
    Umod => "umod", Ternary;
    Shl => "shl", Ternary;
    Shr => "shr", Ternary;
    Cmpe => "cmpe", Binary;
    Cmpa => "cmpa", Binary;
    Cmpae => "cmpae", Binary;
    Cmpg => "cmpg", Binary;
    Cmpge => "cmpge", Binary;
    Mov => "mov", Binary;
    Cmov => "cmov", Binary;
    Jmp => "jmp", Unary;
    Cjmp => "cjmp", Unary;
    Cnjmp => "cnjmp", Unary;
    Store => "store", Store;
    Load => "load", Binary;
    StoreW => "store.w", Store;
    LoadW => "load.w", Binary;
    StoreB => "store.b", Store;
    LoadB => "load.b", Binary;
    Read => "read", Binary;
    Answer => "answer", Unary;
}

impl Opcode {
    /// Looks up an opcode by mnemonic, ignoring case
    pub fn from_mnemonic(s: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|op| op.mnemonic().eq_ignore_ascii_case(s))
    }

    /// Builds an instruction from this opcode and its operands
    ///
    /// Returns `None` if the operands do not match [`Opcode::shape`].
    pub fn build(self, args: Args) -> Option<Instruction> {
        use Instruction as I;
        let i = match (self, args) {
            (Opcode::And, Args::Ternary(d, a, b)) => I::And(d, a, b),
            (Opcode::Or, Args::Ternary(d, a, b)) => I::Or(d, a, b),
            (Opcode::Xor, Args::Ternary(d, a, b)) => I::Xor(d, a, b),
            (Opcode::Not, Args::Binary(d, a)) => I::Not(d, a),
            (Opcode::Add, Args::Ternary(d, a, b)) => I::Add(d, a, b),
            (Opcode::Sub, Args::Ternary(d, a, b)) => I::Sub(d, a, b),
            (Opcode::Mull, Args::Ternary(d, a, b)) => I::Mull(d, a, b),
            (Opcode::Umulh, Args::Ternary(d, a, b)) => I::Umulh(d, a, b),
            (Opcode::Smulh, Args::Ternary(d, a, b)) => I::Smulh(d, a, b),
            (Opcode::Udiv, Args::Ternary(d, a, b)) => I::Udiv(d, a, b),
            (Opcode::Umod, Args::Ternary(d, a, b)) => I::Umod(d, a, b),
            (Opcode::Shl, Args::Ternary(d, a, b)) => I::Shl(d, a, b),
            (Opcode::Shr, Args::Ternary(d, a, b)) => I::Shr(d, a, b),
            (Opcode::Cmpe, Args::Binary(a, b)) => I::Cmpe(a, b),
            (Opcode::Cmpa, Args::Binary(a, b)) => I::Cmpa(a, b),
            (Opcode::Cmpae, Args::Binary(a, b)) => I::Cmpae(a, b),
            (Opcode::Cmpg, Args::Binary(a, b)) => I::Cmpg(a, b),
            (Opcode::Cmpge, Args::Binary(a, b)) => I::Cmpge(a, b),
            (Opcode::Mov, Args::Binary(d, a)) => I::Mov(d, a),
            (Opcode::Cmov, Args::Binary(d, a)) => I::Cmov(d, a),
            (Opcode::Jmp, Args::Unary(t)) => I::Jmp(t),
            (Opcode::Cjmp, Args::Unary(t)) => I::Cjmp(t),
            (Opcode::Cnjmp, Args::Unary(t)) => I::Cnjmp(t),
            (Opcode::Store, Args::Store(a, s)) => I::Store(a, s),
            (Opcode::Load, Args::Binary(d, a)) => I::Load(d, a),
            (Opcode::StoreW, Args::Store(a, s)) => I::StoreW(a, s),
            (Opcode::LoadW, Args::Binary(d, a)) => I::LoadW(d, a),
            (Opcode::StoreB, Args::Store(a, s)) => I::StoreB(a, s),
            (Opcode::LoadB, Args::Binary(d, a)) => I::LoadB(d, a),
            (Opcode::Read, Args::Binary(d, t)) => I::Read(d, t),
            (Opcode::Answer, Args::Unary(c)) => I::Answer(c),
            _ => return None,
        };
        Some(i)
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// A single decoded instruction
///
/// In the descriptions below, `A` is an operand that may be a register or an
/// immediate, and `[x]` is the value of `x`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Instruction {
    /// Bitwise and
    ///
    /// ```text
    /// and ri, rj, A      ri = [rj] & [A]      flag = 0
    /// ```
    And(Reg, Reg, Operand),
    /// Bitwise or
    ///
    /// ```text
    /// or ri, rj, A       ri = [rj] | [A]      flag = 0
    /// ```
    Or(Reg, Reg, Operand),
    /// Bitwise exclusive or
    ///
    /// ```text
    /// xor ri, rj, A      ri = [rj] ^ [A]      flag = 0
    /// ```
    Xor(Reg, Reg, Operand),
    /// Bitwise complement
    ///
    /// ```text
    /// not ri, A          ri = ~[A]            flag = 0
    /// ```
    Not(Reg, Operand),
    /// Addition
    ///
    /// ```text
    /// add ri, rj, A      ri = [rj] + [A]      flag = carry
    /// ```
    Add(Reg, Reg, Operand),
    /// Subtraction
    ///
    /// ```text
    /// sub ri, rj, A      ri = [rj] - [A]      flag = borrow
    /// ```
    Sub(Reg, Reg, Operand),
    /// Unsigned multiplication, low bits
    ///
    /// ```text
    /// mull ri, rj, A     ri = low([rj] * [A])    flag = high bits non-zero
    /// ```
    Mull(Reg, Reg, Operand),
    /// Unsigned multiplication, high bits
    ///
    /// ```text
    /// umulh ri, rj, A    ri = high([rj] * [A])   flag = high bits non-zero
    /// ```
    Umulh(Reg, Reg, Operand),
    /// Signed multiplication, high bits
    ///
    /// ```text
    /// smulh ri, rj, A    ri = high([rj] * [A])   flag = signed overflow
    /// ```
    Smulh(Reg, Reg, Operand),
    /// Unsigned division
    ///
    /// ```text
    /// udiv ri, rj, A     ri = [rj] / [A]
    /// ```
    ///
    /// Dividing by zero halts the machine with a fault.
    Udiv(Reg, Reg, Operand),
    /// Unsigned remainder
    ///
    /// ```text
    /// umod ri, rj, A     ri = [rj] % [A]
    /// ```
    ///
    /// Dividing by zero halts the machine with a fault.
    Umod(Reg, Reg, Operand),
    /// Logical shift left
    ///
    /// ```text
    /// shl ri, rj, A      ri = [rj] << [A]     flag = msb([rj])
    /// ```
    Shl(Reg, Reg, Operand),
    /// Logical shift right
    ///
    /// ```text
    /// shr ri, rj, A      ri = [rj] >> [A]     flag = lsb([rj])
    /// ```
    Shr(Reg, Reg, Operand),
    /// Compare equal
    ///
    /// ```text
    /// cmpe ri, A         flag = [ri] == [A]
    /// ```
    Cmpe(Reg, Operand),
    /// Compare above (unsigned)
    ///
    /// ```text
    /// cmpa ri, A         flag = [ri] > [A]
    /// ```
    Cmpa(Reg, Operand),
    /// Compare above or equal (unsigned)
    ///
    /// ```text
    /// cmpae ri, A        flag = [ri] >= [A]
    /// ```
    Cmpae(Reg, Operand),
    /// Compare greater (signed)
    Cmpg(Reg, Operand),
    /// Compare greater or equal (signed)
    Cmpge(Reg, Operand),
    /// Move
    ///
    /// ```text
    /// mov ri, A          ri = [A]
    /// ```
    Mov(Reg, Operand),
    /// Conditional move, taken if the flag is set
    Cmov(Reg, Operand),
    /// Unconditional jump to an instruction index
    Jmp(Operand),
    /// Jump if the flag is set
    Cjmp(Operand),
    /// Jump if the flag is clear
    Cnjmp(Operand),
    /// Word store, addressed by word index
    ///
    /// ```text
    /// store A, ri        mem[[A]] = [ri]
    /// ```
    Store(Operand, Reg),
    /// Word load, addressed by word index
    Load(Reg, Operand),
    /// Word store, addressed by byte offset (by default)
    StoreW(Operand, Reg),
    /// Word load, addressed by byte offset (by default)
    LoadW(Reg, Operand),
    /// Byte store of the low 8 bits of a register
    StoreB(Operand, Reg),
    /// Byte load, zero-extended
    LoadB(Reg, Operand),
    /// Reads the next word from a tape
    ///
    /// ```text
    /// read ri, A         ri = next word of tape [A]   flag = 0
    ///                    ri = 0 if exhausted          flag = 1
    /// ```
    Read(Reg, Operand),
    /// Halts the machine with the given exit code
    Answer(Operand),
}

impl Instruction {
    /// Splits the instruction into its opcode and operands
    pub fn parts(&self) -> (Opcode, Args) {
        use Instruction as I;
        match *self {
            I::And(d, a, b) => (Opcode::And, Args::Ternary(d, a, b)),
            I::Or(d, a, b) => (Opcode::Or, Args::Ternary(d, a, b)),
            I::Xor(d, a, b) => (Opcode::Xor, Args::Ternary(d, a, b)),
            I::Not(d, a) => (Opcode::Not, Args::Binary(d, a)),
            I::Add(d, a, b) => (Opcode::Add, Args::Ternary(d, a, b)),
            I::Sub(d, a, b) => (Opcode::Sub, Args::Ternary(d, a, b)),
            I::Mull(d, a, b) => (Opcode::Mull, Args::Ternary(d, a, b)),
            I::Umulh(d, a, b) => (Opcode::Umulh, Args::Ternary(d, a, b)),
            I::Smulh(d, a, b) => (Opcode::Smulh, Args::Ternary(d, a, b)),
            I::Udiv(d, a, b) => (Opcode::Udiv, Args::Ternary(d, a, b)),
            I::Umod(d, a, b) => (Opcode::Umod, Args::Ternary(d, a, b)),
            I::Shl(d, a, b) => (Opcode::Shl, Args::Ternary(d, a, b)),
            I::Shr(d, a, b) => (Opcode::Shr, Args::Ternary(d, a, b)),
            I::Cmpe(a, b) => (Opcode::Cmpe, Args::Binary(a, b)),
            I::Cmpa(a, b) => (Opcode::Cmpa, Args::Binary(a, b)),
            I::Cmpae(a, b) => (Opcode::Cmpae, Args::Binary(a, b)),
            I::Cmpg(a, b) => (Opcode::Cmpg, Args::Binary(a, b)),
            I::Cmpge(a, b) => (Opcode::Cmpge, Args::Binary(a, b)),
            I::Mov(d, a) => (Opcode::Mov, Args::Binary(d, a)),
            I::Cmov(d, a) => (Opcode::Cmov, Args::Binary(d, a)),
            I::Jmp(t) => (Opcode::Jmp, Args::Unary(t)),
            I::Cjmp(t) => (Opcode::Cjmp, Args::Unary(t)),
            I::Cnjmp(t) => (Opcode::Cnjmp, Args::Unary(t)),
            I::Store(a, s) => (Opcode::Store, Args::Store(a, s)),
            I::Load(d, a) => (Opcode::Load, Args::Binary(d, a)),
            I::StoreW(a, s) => (Opcode::StoreW, Args::Store(a, s)),
            I::LoadW(d, a) => (Opcode::LoadW, Args::Binary(d, a)),
            I::StoreB(a, s) => (Opcode::StoreB, Args::Store(a, s)),
            I::LoadB(d, a) => (Opcode::LoadB, Args::Binary(d, a)),
            I::Read(d, t) => (Opcode::Read, Args::Binary(d, t)),
            I::Answer(c) => (Opcode::Answer, Args::Unary(c)),
        }
    }

    /// Returns the instruction's opcode
    pub fn opcode(&self) -> Opcode {
        self.parts().0
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let (op, args) = self.parts();
        match args {
            Args::Ternary(d, a, b) => write!(f, "{op} {d}, {a}, {b}"),
            Args::Binary(d, a) => write!(f, "{op} {d}, {a}"),
            Args::Unary(a) => write!(f, "{op} {a}"),
            Args::Store(a, s) => write!(f, "{op} {a}, {s}"),
        }
    }
}
