//! Execution engine
use crate::{
    alu::Alu,
    asm::Program,
    dialect::{Addressing, Dialect, HeaderError, MemoryModel, Params},
    isa::{Instruction, Opcode, Operand, Reg},
    machine::Machine,
    memory::Memory,
    tape::Tape,
};
use log::{debug, trace, warn};
use std::{collections::BTreeMap, fmt};

/// Run-time configuration
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Machine parameters (`W`, `K`, dialect, memory model)
    pub params: Params,

    /// Maximum number of instructions to execute before faulting
    pub step_limit: Option<u64>,

    /// Address interpretation for `store.w` and `load.w`
    ///
    /// Bare `store` / `load` always address words, and `.b` forms always
    /// address bytes.
    pub wide_addressing: Addressing,

    /// Size of data memory, in words
    pub memory_words: u64,

    /// Initial contents of the bottom of memory
    ///
    /// With [`MemoryModel::Harvard`], this segment is read-only.
    pub preload: Vec<u64>,
}

impl Config {
    /// Builds a default configuration for the given parameters
    ///
    /// Memory holds `2^min(W, 16)` words, there is no step limit, and `.w`
    /// operations use byte addressing.
    pub fn new(params: Params) -> Self {
        Self {
            params,
            step_limit: None,
            wide_addressing: Addressing::default(),
            memory_words: 1 << params.word_bits.min(16),
            preload: vec![],
        }
    }

    /// Sets the step limit
    pub fn with_step_limit(self, limit: u64) -> Self {
        Self {
            step_limit: Some(limit),
            ..self
        }
    }

    /// Sets the addressing mode for `.w` memory operations
    pub fn with_wide_addressing(self, wide_addressing: Addressing) -> Self {
        Self {
            wide_addressing,
            ..self
        }
    }

    /// Sets the memory size, in words
    pub fn with_memory_words(self, memory_words: u64) -> Self {
        Self {
            memory_words,
            ..self
        }
    }

    /// Sets the preloaded memory segment
    pub fn with_preload(self, preload: Vec<u64>) -> Self {
        Self { preload, ..self }
    }

    fn memory(&self) -> Memory {
        let alu = Alu::new(self.params.word_bits);
        let mut mem =
            Memory::new(self.memory_words, alu.word_bytes(), alu.mask());
        mem.preload(
            &self.preload,
            self.params.memory == MemoryModel::Harvard,
        );
        mem
    }
}

impl From<&Program> for Config {
    fn from(p: &Program) -> Self {
        Self::new(*p.params())
    }
}

/// A configuration that cannot run the given program
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// `W` or `K` is out of range
    #[error(transparent)]
    Params(#[from] HeaderError),
    /// The program uses registers that the configuration does not provide
    #[error("program uses {program} registers, but only {config} are configured")]
    Registers {
        /// Register count the program was assembled for
        program: u16,
        /// Configured register count
        config: u16,
    },
    /// The program uses an opcode outside of the configured dialect
    #[error("`{op}` is not available in TinyRAM {dialect}")]
    Dialect {
        /// Offending opcode
        op: Opcode,
        /// Configured dialect
        dialect: Dialect,
    },
    /// The preloaded segment does not fit in memory
    #[error("preload of {len} words does not fit in {limit} words of memory")]
    Preload {
        /// Preload size
        len: usize,
        /// Memory size
        limit: u64,
    },
}

/// Reason for an abnormal halt
#[derive(Copy, Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum FaultKind {
    /// `udiv` or `umod` with a zero divisor
    #[error("division by zero")]
    DivideByZero,
    /// Memory access past the end of memory
    #[error("memory access out of bounds (address {address})")]
    MemoryOutOfBounds {
        /// Address as given to the instruction
        address: u64,
    },
    /// Byte-addressed word access that is not word-aligned
    #[error("misaligned word access (address {address})")]
    MisalignedAccess {
        /// Byte address
        address: u64,
    },
    /// Byte write into the partial top byte of a word that does not hold
    /// the whole value (only possible when `W` is not a multiple of 8)
    #[error("byte does not fit in the top of the word (address {address})")]
    ByteOverflow {
        /// Byte address
        address: u64,
    },
    /// Write into the read-only segment
    #[error("write to read-only memory (word {address})")]
    ReadOnlyWrite {
        /// Word index
        address: u64,
    },
    /// The program counter does not point at an instruction
    #[error("program counter outside of the program")]
    PcOutOfBounds,
    /// The configured step limit was reached without halting
    #[error("step limit of {limit} exceeded")]
    StepLimitExceeded {
        /// Configured limit
        limit: u64,
    },
}

/// A run-time fault, along with where it happened
#[derive(Copy, Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{kind} at pc {pc}")]
pub struct Fault {
    /// Program counter of the faulting instruction
    pub pc: usize,
    /// What went wrong
    pub kind: FaultKind,
}

/// How a run ended
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Halt {
    /// The program executed `answer` with the given code
    Answer(u64),
    /// The machine faulted
    Fault(Fault),
}

impl fmt::Display for Halt {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Halt::Answer(code) => write!(f, "answer {code}"),
            Halt::Fault(fault) => write!(f, "fault: {fault}"),
        }
    }
}

/// Observable result of a finished run
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Outcome {
    /// How the run ended
    pub halt: Halt,
    /// Final register values
    pub registers: Vec<u64>,
    /// Final non-zero memory words, keyed by word index
    pub memory: BTreeMap<u64, u64>,
    /// Final flag
    pub flag: bool,
    /// Program counter of the last instruction executed
    pub pc: usize,
    /// Number of instructions executed
    pub steps: u64,
}

impl Outcome {
    /// Returns the `answer` code, if the program halted normally
    pub fn answer(&self) -> Option<u64> {
        match self.halt {
            Halt::Answer(code) => Some(code),
            Halt::Fault(..) => None,
        }
    }

    /// Returns the fault, if the program halted abnormally
    pub fn fault(&self) -> Option<Fault> {
        match self.halt {
            Halt::Answer(..) => None,
            Halt::Fault(f) => Some(f),
        }
    }

    /// Reads a memory word from the final snapshot
    pub fn mem(&self, index: u64) -> u64 {
        self.memory.get(&index).copied().unwrap_or(0)
    }
}

/// Result of executing a single instruction
enum Step {
    Next(usize),
    Halt(u64),
}

/// The virtual machine itself
///
/// A `Vm` owns a fresh [`Machine`] and borrows the program it runs, so any
/// number of independent runs can share a single assembled [`Program`].
pub struct Vm<'a> {
    program: &'a Program,
    config: Config,
    machine: Machine,
    steps: u64,
    halt: Option<Halt>,
}

impl<'a> Vm<'a> {
    /// Builds a new machine, ready to run `program` on the given tapes
    pub fn new(
        program: &'a Program,
        config: Config,
        tape0: Vec<u64>,
        tape1: Vec<u64>,
    ) -> Result<Self, ConfigError> {
        let params = config.params;
        params.check()?;
        let needed = program.params().registers;
        if needed > params.registers {
            return Err(ConfigError::Registers {
                program: needed,
                config: params.registers,
            });
        }
        if let Some(op) = program
            .instructions()
            .iter()
            .map(Instruction::opcode)
            .find(|op| !params.dialect.allows(*op))
        {
            return Err(ConfigError::Dialect {
                op,
                dialect: params.dialect,
            });
        }
        if config.preload.len() as u64 > config.memory_words {
            return Err(ConfigError::Preload {
                len: config.preload.len(),
                limit: config.memory_words,
            });
        }

        debug!(
            "starting `{params}` with {} + {} tape words",
            tape0.len(),
            tape1.len()
        );
        let machine = Machine::new(
            Alu::new(params.word_bits),
            params.registers,
            config.memory(),
            [Tape::new(tape0), Tape::new(tape1)],
        );
        Ok(Self {
            program,
            config,
            machine,
            steps: 0,
            halt: None,
        })
    }

    /// Restores the initial state, with new tapes
    pub fn reset(&mut self, tape0: Vec<u64>, tape1: Vec<u64>) {
        self.machine.reset(
            self.config.memory(),
            [Tape::new(tape0), Tape::new(tape1)],
        );
        self.steps = 0;
        self.halt = None;
    }

    /// Current machine state
    pub fn machine(&self) -> &Machine {
        &self.machine
    }

    /// Program being executed
    pub fn program(&self) -> &Program {
        self.program
    }

    /// Number of instructions executed so far
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Returns how the machine halted, or `None` if it is still running
    pub fn halted(&self) -> Option<Halt> {
        self.halt
    }

    /// Runs until the machine halts
    pub fn run(&mut self) -> Halt {
        loop {
            if let Some(h) = self.step() {
                break h;
            }
        }
    }

    /// Runs until the machine halts or the callback returns `true`
    ///
    /// The callback is invoked after every instruction that does not halt
    /// the machine, with the current state and step count.
    ///
    /// Returns `None` if the callback stopped the run early.
    pub fn run_until<F>(&mut self, mut f: F) -> Option<Halt>
    where
        F: FnMut(&Machine, u64) -> bool,
    {
        loop {
            if let Some(h) = self.step() {
                break Some(h);
            } else if f(&self.machine, self.steps) {
                break None;
            }
        }
    }

    /// Executes a single instruction
    ///
    /// Returns `Some(..)` once the machine has halted; further calls leave
    /// the state untouched and return the same value.
    pub fn step(&mut self) -> Option<Halt> {
        if self.halt.is_none() {
            self.halt = self.advance();
            if let Some(h) = self.halt {
                match h {
                    Halt::Answer(..) => debug!("{h} after {} steps", self.steps),
                    Halt::Fault(..) => warn!("{h} after {} steps", self.steps),
                }
            }
        }
        self.halt
    }

    /// Builds the observable result, if the machine has halted
    pub fn outcome(&self) -> Option<Outcome> {
        self.halt.map(|halt| self.snapshot(halt))
    }

    pub(crate) fn snapshot(&self, halt: Halt) -> Outcome {
        Outcome {
            halt,
            registers: self.machine.registers().to_vec(),
            memory: self.machine.memory().to_map(),
            flag: self.machine.flag(),
            pc: self.machine.pc(),
            steps: self.steps,
        }
    }

    fn advance(&mut self) -> Option<Halt> {
        let pc = self.machine.pc();
        if let Some(limit) = self.config.step_limit {
            if self.steps >= limit {
                let kind = FaultKind::StepLimitExceeded { limit };
                return Some(Halt::Fault(Fault { pc, kind }));
            }
        }
        let Some(&i) = self.program.instructions().get(pc) else {
            let kind = FaultKind::PcOutOfBounds;
            return Some(Halt::Fault(Fault { pc, kind }));
        };
        self.steps += 1;
        trace!("{pc:>6}: {i} (flag = {})", self.machine.flag() as u8);

        match self.execute(i) {
            Ok(Step::Next(next)) => {
                self.machine.set_pc(next);
                None
            }
            Ok(Step::Halt(code)) => Some(Halt::Answer(code)),
            Err(kind) => Some(Halt::Fault(Fault { pc, kind })),
        }
    }

    #[inline]
    fn resolve(&self, a: Operand) -> u64 {
        match a {
            Operand::Reg(r) => self.machine.reg(r),
            Operand::Imm(v) => self.machine.alu().truncate(v),
        }
    }

    /// Applies a two-input ALU operation, writing both result and flag
    #[inline]
    fn op_bin(
        &mut self,
        d: Reg,
        a: Reg,
        b: Operand,
        f: fn(&Alu, u64, u64) -> (u64, bool),
    ) {
        let m = &self.machine;
        let (v, flag) = f(m.alu(), m.reg(a), self.resolve(b));
        self.machine.set_reg(d, v);
        self.machine.set_flag(flag);
    }

    /// Applies a division, faulting on a zero divisor
    #[inline]
    fn op_div(
        &mut self,
        d: Reg,
        a: Reg,
        b: Operand,
        f: fn(&Alu, u64, u64) -> Option<u64>,
    ) -> Result<(), FaultKind> {
        let m = &self.machine;
        let v = f(m.alu(), m.reg(a), self.resolve(b))
            .ok_or(FaultKind::DivideByZero)?;
        self.machine.set_reg(d, v);
        self.machine.set_flag(false);
        Ok(())
    }

    #[inline]
    fn op_cmp(&mut self, a: Reg, b: Operand, f: fn(&Alu, u64, u64) -> bool) {
        let m = &self.machine;
        let flag = f(m.alu(), m.reg(a), self.resolve(b));
        self.machine.set_flag(flag);
    }

    fn wide_index(&self, a: Operand) -> Result<u64, FaultKind> {
        self.machine
            .memory()
            .word_index(self.resolve(a), self.config.wide_addressing)
    }

    fn execute(&mut self, i: Instruction) -> Result<Step, FaultKind> {
        use Instruction as I;
        let pc = self.machine.pc();
        let jump = |t: u64| Step::Next(usize::try_from(t).unwrap_or(usize::MAX));

        match i {
            I::And(d, a, b) => self.op_bin(d, a, b, Alu::and),
            I::Or(d, a, b) => self.op_bin(d, a, b, Alu::or),
            I::Xor(d, a, b) => self.op_bin(d, a, b, Alu::xor),
            I::Not(d, a) => {
                let (v, flag) = self.machine.alu().not(self.resolve(a));
                self.machine.set_reg(d, v);
                self.machine.set_flag(flag);
            }
            I::Add(d, a, b) => self.op_bin(d, a, b, Alu::add),
            I::Sub(d, a, b) => self.op_bin(d, a, b, Alu::sub),
            I::Mull(d, a, b) => self.op_bin(d, a, b, Alu::mull),
            I::Umulh(d, a, b) => self.op_bin(d, a, b, Alu::umulh),
            I::Smulh(d, a, b) => self.op_bin(d, a, b, Alu::smulh),
            I::Udiv(d, a, b) => self.op_div(d, a, b, Alu::udiv)?,
            I::Umod(d, a, b) => self.op_div(d, a, b, Alu::umod)?,
            I::Shl(d, a, b) => self.op_bin(d, a, b, Alu::shl),
            I::Shr(d, a, b) => self.op_bin(d, a, b, Alu::shr),

            I::Cmpe(a, b) => self.op_cmp(a, b, Alu::cmpe),
            I::Cmpa(a, b) => self.op_cmp(a, b, Alu::cmpa),
            I::Cmpae(a, b) => self.op_cmp(a, b, Alu::cmpae),
            I::Cmpg(a, b) => self.op_cmp(a, b, Alu::cmpg),
            I::Cmpge(a, b) => self.op_cmp(a, b, Alu::cmpge),

            I::Mov(d, a) => {
                let v = self.resolve(a);
                self.machine.set_reg(d, v);
            }
            I::Cmov(d, a) => {
                if self.machine.flag() {
                    let v = self.resolve(a);
                    self.machine.set_reg(d, v);
                }
            }

            I::Jmp(t) => return Ok(jump(self.resolve(t))),
            I::Cjmp(t) if self.machine.flag() => {
                return Ok(jump(self.resolve(t)));
            }
            I::Cnjmp(t) if !self.machine.flag() => {
                return Ok(jump(self.resolve(t)));
            }
            I::Cjmp(..) | I::Cnjmp(..) => (),

            I::Store(a, s) => {
                let (index, v) = (self.resolve(a), self.machine.reg(s));
                self.machine.memory_mut().write_word(index, v)?;
            }
            I::Load(d, a) => {
                let v = self.machine.memory().read_word(self.resolve(a))?;
                self.machine.set_reg(d, v);
            }
            I::StoreW(a, s) => {
                let (index, v) = (self.wide_index(a)?, self.machine.reg(s));
                self.machine.memory_mut().write_word(index, v)?;
            }
            I::LoadW(d, a) => {
                let index = self.wide_index(a)?;
                let v = self.machine.memory().read_word(index)?;
                self.machine.set_reg(d, v);
            }
            I::StoreB(a, s) => {
                let (addr, v) = (self.resolve(a), self.machine.reg(s));
                self.machine.memory_mut().write_byte(addr, v as u8)?;
            }
            I::LoadB(d, a) => {
                let v = self.machine.memory().read_byte(self.resolve(a))?;
                self.machine.set_reg(d, u64::from(v));
            }

            I::Read(d, t) => {
                let t = self.resolve(t);
                let v = self.machine.tape_mut(t).and_then(Tape::next_word);
                self.machine.set_reg(d, v.unwrap_or(0));
                self.machine.set_flag(v.is_none());
            }

            I::Answer(c) => return Ok(Step::Halt(self.resolve(c))),
        }
        Ok(Step::Next(pc + 1))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        asm::assemble,
        tape::{AUXILIARY, PRIMARY},
    };

    fn exec(src: &str, tape0: Vec<u64>) -> Outcome {
        let p = assemble(src).unwrap();
        let cfg = Config::from(&p).with_step_limit(10_000);
        let mut vm = Vm::new(&p, cfg, tape0, vec![]).unwrap();
        vm.run();
        vm.outcome().unwrap()
    }

    /// Runs a line of the form `W | instr | instr ... | r0 flag`
    fn parse_and_test(line: &str) {
        let line = line.trim();
        if line.is_empty() {
            return;
        }
        let mut parts: Vec<&str> = line.split('|').map(str::trim).collect();
        let expected = parts.pop().unwrap();
        let w = parts.remove(0);

        let mut src = format!("; TinyRAM V=2.00 W={w} K=2\n");
        for i in parts {
            src += i;
            src += "\n";
        }
        src += "answer 0\n";
        let out = exec(&src, vec![]);
        assert_eq!(out.answer(), Some(0), "{line}");

        let mut e = expected.split_whitespace();
        let r0: u64 = e.next().unwrap().parse().unwrap();
        let flag = e.next().unwrap() == "1";
        assert_eq!(out.registers[0], r0, "bad r0 in `{line}`");
        assert_eq!(out.flag, flag, "bad flag in `{line}`");
    }

    #[test]
    fn opcodes() {
        const TEST_SUITE: &str = "
            8 | mov r1, 200 | add r0, r1, 100           | 44 1
            8 | mov r1, 20 | add r0, r1, 100            | 120 0
            8 | mov r1, 5 | sub r0, r1, 6               | 255 1
            8 | mov r1, 6 | sub r0, r1, 6               | 0 0
            8 | mov r1, 16 | mull r0, r1, 16            | 0 1
            8 | mov r1, 15 | mull r0, r1, 17            | 255 0
            8 | mov r1, 16 | umulh r0, r1, 32           | 2 1
            8 | mov r1, 15 | umulh r0, r1, 17           | 0 0
            8 | mov r1, -2 | smulh r0, r1, 64           | 255 0
            8 | mov r1, 64 | smulh r0, r1, 2            | 0 1
            8 | mov r1, 200 | cmpe r1, 200 | udiv r0, r1, 7 | 28 0
            8 | mov r1, 200 | cmpe r1, 200 | umod r0, r1, 7 | 4 0
            8 | mov r1, 129 | shl r0, r1, 1             | 2 1
            8 | mov r1, 64 | shl r0, r1, 2              | 0 1
            8 | mov r1, 3 | shl r0, r1, 6               | 192 0
            8 | mov r1, 129 | cmpe r1, 129 | shl r0, r1, 0 | 129 0
            8 | mov r1, 1 | shl r0, r1, 8               | 0 1
            8 | mov r1, 1 | shl r0, r1, 9               | 0 0
            8 | mov r1, 3 | shr r0, r1, 1               | 1 1
            8 | mov r1, 2 | shr r0, r1, 2               | 0 1
            8 | mov r1, 12 | shr r0, r1, 3              | 1 1
            8 | mov r1, 12 | shr r0, r1, 2              | 3 0
            8 | mov r1, 3 | cmpe r1, 3 | shr r0, r1, 0  | 3 0
            8 | mov r1, 128 | shr r0, r1, 8             | 0 1
            8 | mov r1, 128 | shr r0, r1, 9             | 0 0
            8 | cmpe r0, 0 | mov r1, 12 | and r0, r1, 10 | 8 0
            8 | cmpe r0, 0 | mov r1, 12 | or r0, r1, 10  | 14 0
            8 | cmpe r0, 0 | mov r1, 12 | xor r0, r1, 10 | 6 0
            8 | cmpe r0, 0 | not r0, 15                 | 240 0
            8 | mov r1, 255 | cmpa r1, 1                | 0 1
            8 | mov r1, 255 | cmpae r1, 255             | 0 1
            8 | cmpae r0, 1                             | 0 0
            8 | mov r1, 255 | cmpg r1, 1                | 0 0
            8 | mov r1, 1 | cmpg r1, 255                | 0 1
            8 | cmpge r0, 0                             | 0 1
            8 | cmpe r0, 0 | cmov r0, 7                 | 7 1
            8 | cmpe r0, 1 | cmov r0, 7                 | 0 0
            8 | cmpe r0, 0 | mov r0, 7                  | 7 1
            1 | mov r1, 1 | add r0, r1, 1               | 0 1
            12 | mov r1, 4095 | add r0, r1, 2           | 1 1
            64 | mov r1, -1 | add r0, r1, 1             | 0 1
            64 | mov r1, -1 | umulh r0, r1, r1          | 18446744073709551614 1
            64 | mov r1, -1 | shr r0, r1, 63            | 1 1
        ";
        for line in TEST_SUITE.lines() {
            parse_and_test(line);
        }
    }

    #[test]
    fn jumps() {
        let out = exec(
            "; TinyRAM V=2.00 W=16 K=2
            mov r1, 4
            cmpe r0, 1
            cnjmp r1
            answer 1
            cjmp 6
            answer 2
            answer 3",
            vec![],
        );
        assert_eq!(out.answer(), Some(2));
        assert_eq!(out.steps, 5);
        assert_eq!(out.pc, 5);
    }

    #[test]
    fn tapes() {
        let src = "; TinyRAM V=1.000 W=16 K=4
            read r0, 0
            read r1, 1
            read r2, 7
            read r3, 0
            answer r0";
        let p = assemble(src).unwrap();
        let mut vm =
            Vm::new(&p, Config::from(&p), vec![5], vec![6, 7]).unwrap();
        assert_eq!(vm.run(), Halt::Answer(5));
        assert_eq!(vm.machine().registers(), &[5, 6, 0, 0]);
        assert!(vm.machine().flag());
        let m = vm.machine();
        assert_eq!(m.tape(PRIMARY).unwrap().consumed(), 1);
        assert_eq!(m.tape(AUXILIARY).unwrap().remaining(), &[7]);
    }

    #[test]
    fn halted_machine_stays_halted() {
        let src = "; TinyRAM V=1.000 W=16 K=1\nadd r0, r0, 1\nanswer r0";
        let p = assemble(src).unwrap();
        let mut vm = Vm::new(&p, Config::from(&p), vec![], vec![]).unwrap();
        assert_eq!(vm.step(), None);
        assert_eq!(vm.halted(), None);
        assert!(vm.outcome().is_none());
        assert_eq!(vm.step(), Some(Halt::Answer(1)));
        assert_eq!(vm.step(), Some(Halt::Answer(1)));
        assert_eq!(vm.steps(), 2);
        assert_eq!(vm.machine().reg(Reg(0)), 1);
    }

    #[test]
    fn run_until() {
        let src = "; TinyRAM V=1.000 W=16 K=1
            _loop:
            add r0, r0, 1
            jmp _loop";
        let p = assemble(src).unwrap();
        let mut vm = Vm::new(&p, Config::from(&p), vec![], vec![]).unwrap();
        let r = vm.run_until(|m, _| m.reg(Reg(0)) == 10);
        assert_eq!(r, None);
        assert_eq!(vm.steps(), 19);
        assert_eq!(vm.halted(), None);

        vm.reset(vec![], vec![]);
        assert_eq!(vm.steps(), 0);
        assert_eq!(vm.machine().reg(Reg(0)), 0);
        let r = vm.run_until(|_, steps| steps == 4);
        assert_eq!(r, None);
        assert_eq!(vm.machine().reg(Reg(0)), 2);
    }

    #[test]
    fn reset_restores_memory() {
        let src = "; TinyRAM V=1.000 W=16 K=1
            read r0, 0
            store 0, r0
            answer 0";
        let p = assemble(src).unwrap();
        let cfg = Config::from(&p).with_preload(vec![9, 9]);
        let mut vm = Vm::new(&p, cfg, vec![4], vec![]).unwrap();
        fn words(vm: &Vm) -> Vec<(u64, u64)> {
            vm.machine().memory().words().collect()
        }
        vm.run();
        assert_eq!(words(&vm), [(0, 4), (1, 9)]);
        vm.reset(vec![], vec![]);
        assert_eq!(words(&vm), [(0, 9), (1, 9)]);
        vm.run();
        assert_eq!(words(&vm), [(1, 9)]);
    }
}
