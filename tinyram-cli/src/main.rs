use std::path::{Path, PathBuf};

use tinyram::{
    assemble_with, Addressing, Config, Dialect, Halt, Machine, MemoryModel,
    Params, Transcript, Vm, AUXILIARY, PRIMARY,
};

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::{debug, info};

/// TinyRAM runner
#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Program to assemble and execute
    program: PathBuf,

    /// Primary input tape (whitespace-separated decimal words)
    #[clap(short = 't', long)]
    tape0: Option<PathBuf>,

    /// Auxiliary input tape (whitespace-separated decimal words)
    #[clap(short = 'a', long)]
    tape1: Option<PathBuf>,

    /// Fault after executing this many instructions
    #[clap(long)]
    step_limit: Option<u64>,

    /// Override the dialect from the program header
    #[clap(long, value_enum)]
    dialect: Option<Dialect>,

    /// Override `W` from the program header
    #[clap(long)]
    word_bits: Option<u32>,

    /// Override `K` from the program header
    #[clap(long)]
    registers: Option<u16>,

    /// Use the Harvard memory model, with `--preload` as read-only memory
    #[clap(long)]
    harvard: bool,

    /// Words loaded into the bottom of memory before the run
    #[clap(long)]
    preload: Option<PathBuf>,

    /// Address interpretation for `store.w` / `load.w`
    #[clap(long, value_enum, default_value_t = Addressing::Byte)]
    wide_addressing: Addressing,

    /// Data memory size, in words
    #[clap(long)]
    memory_words: Option<u64>,

    /// Print a SHA3-256 digest of the program, tapes and every machine state
    #[clap(long)]
    trace_digest: bool,
}

/// Reads a file of whitespace-separated decimal words
fn read_words(path: &Path) -> Result<Vec<u64>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {path:?}"))?;
    text.split_whitespace()
        .enumerate()
        .map(|(i, w)| {
            w.parse::<u64>().with_context(|| {
                format!("bad word `{w}` at position {i} in {path:?}")
            })
        })
        .collect()
}

/// Logs the flag, program counter, registers and non-zero memory
fn log_state(m: &Machine) {
    info!("flag: {}, pc: {}", m.flag() as u8, m.pc());
    info!("registers: {:?}", m.registers());
    for (i, w) in m.memory().words() {
        info!("  mem[{i}] = {w}");
    }
}

/// Logs how much of each input tape the program left unread
fn log_tapes(m: &Machine) {
    for (name, i) in [("primary", PRIMARY), ("auxiliary", AUXILIARY)] {
        if let Some(t) = m.tape(i) {
            debug!(
                "{name} tape: {} words read, {} unread",
                t.consumed(),
                t.remaining().len()
            );
        }
    }
}

/// Merges command-line overrides with the program header
fn params(args: &Args, src: &str) -> Result<Option<Params>> {
    let overridden = args.dialect.is_some()
        || args.word_bits.is_some()
        || args.registers.is_some()
        || args.harvard;
    if !overridden {
        return Ok(None);
    }
    let header = match src.lines().find(|line| !line.trim().is_empty()) {
        Some(line) => Params::from_header(line)?,
        None => None,
    };
    let (dialect, word_bits, registers) = match header {
        Some(h) => (
            args.dialect.unwrap_or(h.dialect),
            args.word_bits.unwrap_or(h.word_bits),
            args.registers.unwrap_or(h.registers),
        ),
        None => match (args.dialect, args.word_bits, args.registers) {
            (Some(d), Some(w), Some(k)) => (d, w, k),
            _ => bail!(
                "program has no header; \
                 --dialect, --word-bits and --registers are all required"
            ),
        },
    };
    let memory = match header {
        Some(h) if !args.harvard => h.memory,
        _ if args.harvard => MemoryModel::Harvard,
        _ => MemoryModel::Flat,
    };
    Ok(Some(
        Params::new(dialect, word_bits, registers).with_memory(memory),
    ))
}

fn main() -> Result<()> {
    let env = env_logger::Env::default()
        .filter_or("TINYRAM_LOG", "info")
        .write_style_or("TINYRAM_LOG", "always");
    env_logger::init_from_env(env);

    let args = Args::parse();
    let src = std::fs::read_to_string(&args.program)
        .with_context(|| format!("failed to read {:?}", args.program))?;
    let program = assemble_with(&src, params(&args, &src)?)
        .with_context(|| format!("failed to assemble {:?}", args.program))?;
    info!(
        "assembled {} instructions for `{}`",
        program.len(),
        program.params()
    );

    let tape0 = args.tape0.as_deref().map(read_words).transpose()?;
    let tape0 = tape0.unwrap_or_default();
    let tape1 = args.tape1.as_deref().map(read_words).transpose()?;
    let tape1 = tape1.unwrap_or_default();
    let preload = args.preload.as_deref().map(read_words).transpose()?;

    let mut cfg = Config::from(&program)
        .with_wide_addressing(args.wide_addressing)
        .with_preload(preload.unwrap_or_default());
    if let Some(n) = args.step_limit {
        cfg = cfg.with_step_limit(n);
    }
    if let Some(n) = args.memory_words {
        cfg = cfg.with_memory_words(n);
    }

    let mut transcript = args.trace_digest.then(|| {
        let mut t = Transcript::new();
        t.update(src.as_bytes());
        t.absorb_words(&tape0);
        t.absorb_words(&tape1);
        t
    });

    let mut vm = Vm::new(&program, cfg, tape0, tape1)?;
    let start = std::time::Instant::now();
    let halt = match transcript.as_mut() {
        Some(t) => t.record(&mut vm),
        None => vm.run(),
    };
    debug!("ran {} steps in {:?}", vm.steps(), start.elapsed());
    log_tapes(vm.machine());
    log_state(vm.machine());
    if let Some(t) = transcript {
        let states = t.states();
        println!("{}", t.finalize());
        debug!("transcript covers {states} states");
    }

    match halt {
        Halt::Answer(code) => {
            info!("answer {code} after {} steps", vm.steps());
            std::process::exit((code & 0xff) as i32)
        }
        Halt::Fault(f) => {
            let line = program
                .line(f.pc)
                .map(|n| format!(" (line {n})"))
                .unwrap_or_default();
            Err(f).with_context(|| {
                format!("{:?} faulted{line}", args.program)
            })
        }
    }
}
