//! TinyRAM assembler and interpreter
//!
//! Programs are assembled from text with [`assemble`] (or [`assemble_with`],
//! to supply machine parameters instead of reading them from the header),
//! then executed by a [`Vm`] against a pair of input tapes.  A
//! [`Transcript`] can follow a run and digest every state it passes through.
//!
//! ```
//! let program = tinyram_vm::assemble(
//!     "; TinyRAM V=1.000 W=16 K=2
//!     read r0, 0
//!     add r1, r0, r0
//!     answer r1",
//! )
//! .unwrap();
//! let config = tinyram_vm::Config::from(&program);
//! let out = tinyram_vm::run(&program, config, vec![21], vec![]).unwrap();
//! assert_eq!(out.answer(), Some(42));
//! assert_eq!(out.steps, 3);
//! ```
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod alu;
mod asm;
mod dialect;
mod isa;
mod machine;
mod memory;
mod tape;
mod transcript;
mod vm;

pub use alu::Alu;
pub use asm::{
    assemble, assemble_with, AsmError, AsmErrorKind, Program, Symbol,
    SymbolTable,
};
pub use dialect::{
    Addressing, Dialect, HeaderError, MemoryModel, Params, MAX_REGISTERS,
};
pub use isa::{Args, Instruction, Opcode, Operand, Reg, Shape};
pub use machine::Machine;
pub use memory::Memory;
pub use tape::{Tape, AUXILIARY, PRIMARY};
pub use transcript::{Digest, Transcript, DIGEST_LEN};
pub use vm::{Config, ConfigError, Fault, FaultKind, Halt, Outcome, Vm};

/// Runs a program to completion and returns its observable result
///
/// The `Err` branch only covers configurations that cannot run the program
/// at all; run-time faults are reported through [`Outcome::halt`].
pub fn run(
    program: &Program,
    config: Config,
    tape0: Vec<u64>,
    tape1: Vec<u64>,
) -> Result<Outcome, ConfigError> {
    let mut vm = Vm::new(program, config, tape0, tape1)?;
    let halt = vm.run();
    Ok(vm.snapshot(halt))
}
