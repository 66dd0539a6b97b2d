//! Machine state: registers, flag, program counter, memory and tapes
use crate::{
    alu::Alu,
    isa::Reg,
    memory::Memory,
    tape::Tape,
};

/// Complete state of a TinyRAM machine
///
/// Anyone may inspect the state, but only the execution engine
/// ([`crate::Vm`]) writes to it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Machine {
    alu: Alu,
    registers: Vec<u64>,
    flag: bool,
    pc: usize,
    memory: Memory,
    tapes: [Tape; 2],
}

impl Machine {
    pub(crate) fn new(
        alu: Alu,
        registers: u16,
        memory: Memory,
        tapes: [Tape; 2],
    ) -> Self {
        Self {
            alu,
            registers: vec![0; usize::from(registers)],
            flag: false,
            pc: 0,
            memory,
            tapes,
        }
    }

    /// Word arithmetic for this machine's word width
    pub fn alu(&self) -> &Alu {
        &self.alu
    }

    /// Register file
    pub fn registers(&self) -> &[u64] {
        &self.registers
    }

    /// Reads a single register
    ///
    /// # Panics
    /// If the register index is out of range; the assembler rejects such
    /// programs, so this only happens for hand-built instructions.
    #[inline]
    pub fn reg(&self, r: Reg) -> u64 {
        self.registers[usize::from(r.0)]
    }

    /// Condition flag
    pub fn flag(&self) -> bool {
        self.flag
    }

    /// Index of the next instruction to execute
    pub fn pc(&self) -> usize {
        self.pc
    }

    /// Data memory
    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    /// Input tape `i` ([`crate::PRIMARY`] or [`crate::AUXILIARY`])
    pub fn tape(&self, i: usize) -> Option<&Tape> {
        self.tapes.get(i)
    }

    #[inline]
    pub(crate) fn set_reg(&mut self, r: Reg, v: u64) {
        self.registers[usize::from(r.0)] = self.alu.truncate(v);
    }

    #[inline]
    pub(crate) fn set_flag(&mut self, flag: bool) {
        self.flag = flag;
    }

    #[inline]
    pub(crate) fn set_pc(&mut self, pc: usize) {
        self.pc = pc;
    }

    pub(crate) fn memory_mut(&mut self) -> &mut Memory {
        &mut self.memory
    }

    pub(crate) fn tape_mut(&mut self, i: u64) -> Option<&mut Tape> {
        usize::try_from(i).ok().and_then(|i| self.tapes.get_mut(i))
    }

    /// Clears registers, flag and program counter, and installs new tapes
    pub(crate) fn reset(&mut self, memory: Memory, tapes: [Tape; 2]) {
        self.registers.fill(0);
        self.flag = false;
        self.pc = 0;
        self.memory = memory;
        self.tapes = tapes;
    }
}
