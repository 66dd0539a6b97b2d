use tinyram_vm::{
    assemble, run, Addressing, Config, ConfigError, Dialect, Fault, FaultKind,
    Halt, HeaderError, Opcode, Outcome, Params,
};

use std::collections::BTreeMap;

fn exec(src: &str, f: impl FnOnce(Config) -> Config) -> Outcome {
    let p = assemble(src).unwrap();
    let cfg = f(Config::from(&p));
    run(&p, cfg, vec![], vec![]).unwrap()
}

fn fault(src: &str, f: impl FnOnce(Config) -> Config) -> Fault {
    exec(src, f).fault().expect("program should fault")
}

#[test]
fn divide_by_zero() {
    let src = "; TinyRAM V=1.000 W=16 K=2
        mov r0, 7
        umod r1, r0, 0
        answer 1";
    let out = exec(src, |c| c);
    assert_eq!(
        out.halt,
        Halt::Fault(Fault {
            pc: 1,
            kind: FaultKind::DivideByZero
        })
    );
    assert_eq!(out.answer(), None);
    assert_eq!(out.steps, 2);

    // State at the fault point is preserved
    assert_eq!(out.registers, [7, 0]);
    assert_eq!(out.pc, 1);

    let f = fault("; TinyRAM V=1.000 W=16 K=2\nudiv r1, r0, r0", |c| c);
    assert_eq!(f.kind, FaultKind::DivideByZero);
}

#[test]
fn fault_is_not_an_answer() {
    // Whatever code the program picks, a fault never compares equal
    for code in [0, 1, 255] {
        let src = format!(
            "; TinyRAM V=1.000 W=8 K=1
            cmpe r0, 0
            cjmp 3
            answer {code}
            umod r0, r0, 0"
        );
        let out = exec(&src, |c| c);
        assert_ne!(out.halt, Halt::Answer(code));
        assert!(matches!(out.halt, Halt::Fault(..)));
    }
}

#[test]
fn read_only_segment() {
    let src = "; TinyRAM V=2.00 M=hv W=16 K=2
        load r1, 1
        store 2, r1
        store 1, r0
        answer 0";
    let out = exec(src, |c| c.with_preload(vec![5, 6]));
    assert_eq!(
        out.fault(),
        Some(Fault {
            pc: 2,
            kind: FaultKind::ReadOnlyWrite { address: 1 }
        })
    );
    assert_eq!(out.memory, BTreeMap::from([(0, 5), (1, 6), (2, 6)]));

    // The same program under the flat model may overwrite its preload
    let src = src.replace(" M=hv", "");
    let out = exec(&src, |c| c.with_preload(vec![5, 6]));
    assert_eq!(out.answer(), Some(0));
    assert_eq!(out.memory, BTreeMap::from([(0, 5), (2, 6)]));
}

#[test]
fn step_limit() {
    let src = "; TinyRAM V=1.000 W=8 K=1
        _spin:
        jmp _spin";
    let out = exec(src, |c| c.with_step_limit(100));
    assert_eq!(
        out.halt,
        Halt::Fault(Fault {
            pc: 0,
            kind: FaultKind::StepLimitExceeded { limit: 100 }
        })
    );
    assert_eq!(out.steps, 100);

    // A program that answers exactly at the limit is fine
    let out = exec("; TinyRAM V=1.000 W=8 K=1\nanswer 3", |c| {
        c.with_step_limit(1)
    });
    assert_eq!(out.answer(), Some(3));
    assert_eq!(out.steps, 1);
}

#[test]
fn pc_out_of_bounds() {
    let f = fault("; TinyRAM V=1.000 W=8 K=1\nmov r0, 1", |c| c);
    assert_eq!(
        f,
        Fault {
            pc: 1,
            kind: FaultKind::PcOutOfBounds
        }
    );

    let f = fault("; TinyRAM V=1.000 W=16 K=1\njmp 1000", |c| c);
    assert_eq!(f.pc, 1000);
    assert_eq!(f.kind, FaultKind::PcOutOfBounds);

    let f = fault("; TinyRAM V=1.000 W=16 K=1", |c| c);
    assert_eq!(f.pc, 0);
}

#[test]
fn memory_bounds() {
    let src = "; TinyRAM V=1.000 W=8 K=1
        store 255, r0
        answer 0";
    assert_eq!(exec(src, |c| c).answer(), Some(0));

    let src = "; TinyRAM V=1.000 W=8 K=1
        store 3, r0
        store 4, r0
        answer 0";
    let f = fault(src, |c| c.with_memory_words(4));
    assert_eq!(
        f,
        Fault {
            pc: 1,
            kind: FaultKind::MemoryOutOfBounds { address: 4 }
        }
    );

    let src = "; TinyRAM V=1.000 W=8 K=1\nload r0, 4";
    let f = fault(src, |c| c.with_memory_words(4));
    assert_eq!(f.kind, FaultKind::MemoryOutOfBounds { address: 4 });
}

#[test]
fn huge_memory() {
    // Only touched words are stored, so the whole 64-bit space is usable
    let src = "; TinyRAM V=1.000 W=64 K=2
        mov r0, 9
        store 4611686018427387904, r0
        load r1, 4611686018427387904
        store 18446744073709551614, r1
        load r1, 18446744073709551615
        answer 0";
    let f = fault(src, |c| c.with_memory_words(u64::MAX));
    assert_eq!(
        f,
        Fault {
            pc: 4,
            kind: FaultKind::MemoryOutOfBounds { address: u64::MAX }
        }
    );
    let out = exec(src, |c| c.with_memory_words(u64::MAX));
    assert_eq!(out.registers, [9, 9]);
    assert_eq!(
        out.memory,
        BTreeMap::from([(1u64 << 62, 9), (u64::MAX - 1, 9)])
    );
}

#[test]
fn partial_top_byte() {
    let src = "; TinyRAM V=2.00 W=63 K=2
        mov r0, 127
        store.b 7, r0
        load.b r1, 7
        mov r0, 255
        store.b 7, r0
        answer r1";
    let out = exec(src, |c| c);
    assert_eq!(
        out.fault(),
        Some(Fault {
            pc: 4,
            kind: FaultKind::ByteOverflow { address: 7 }
        })
    );
    assert_eq!(out.registers, [255, 127]);
    assert_eq!(out.mem(0), 0x7f00_0000_0000_0000);
}

#[test]
fn wide_addressing() {
    let src = "; TinyRAM V=2.00 W=32 K=2
        mov r0, 77
        store.w 8, r0
        load.w r1, 8
        answer r1";
    let out = exec(src, |c| c);
    assert_eq!(out.answer(), Some(77));
    assert_eq!(out.memory, BTreeMap::from([(2, 77)]));

    let out = exec(src, |c| c.with_wide_addressing(Addressing::Word));
    assert_eq!(out.answer(), Some(77));
    assert_eq!(out.mem(8), 77);

    let src = "; TinyRAM V=2.00 W=32 K=2\nstore.w 6, r0";
    let f = fault(src, |c| c);
    assert_eq!(f.kind, FaultKind::MisalignedAccess { address: 6 });
}

#[test]
fn byte_access() {
    let src = "; TinyRAM V=2.00 W=16 K=2
        mov r0, 4660        ; 0x1234
        store.w 0, r0
        load.b r1, 1
        store.b 3, r0
        answer r1";
    let out = exec(src, |c| c);
    assert_eq!(out.answer(), Some(0x12));
    assert_eq!(out.memory, BTreeMap::from([(0, 0x1234), (1, 0x3400)]));

    let src = "; TinyRAM V=2.00 W=16 K=2\nload.b r0, 8";
    let f = fault(src, |c| c.with_memory_words(4));
    assert_eq!(f.kind, FaultKind::MemoryOutOfBounds { address: 8 });
}

#[test]
fn answer_codes_are_words() {
    let out = exec("; TinyRAM V=1.000 W=8 K=1\nanswer -1", |c| c);
    assert_eq!(out.answer(), Some(255));
}

#[test]
fn config_errors() {
    let p = assemble("; TinyRAM V=2.00 W=16 K=4\ncnjmp 0").unwrap();

    let cfg = Config::new(Params::new(Dialect::V2, 16, 2));
    assert_eq!(
        run(&p, cfg, vec![], vec![]).unwrap_err(),
        ConfigError::Registers {
            program: 4,
            config: 2
        }
    );

    let cfg = Config::new(Params::new(Dialect::V1, 16, 4));
    assert_eq!(
        run(&p, cfg, vec![], vec![]).unwrap_err(),
        ConfigError::Dialect {
            op: Opcode::Cnjmp,
            dialect: Dialect::V1
        }
    );

    let cfg = Config::from(&p)
        .with_memory_words(2)
        .with_preload(vec![1, 2, 3]);
    assert_eq!(
        run(&p, cfg, vec![], vec![]).unwrap_err(),
        ConfigError::Preload { len: 3, limit: 2 }
    );

    let cfg = Config::new(Params::new(Dialect::V2, 65, 4));
    assert_eq!(
        run(&p, cfg, vec![], vec![]).unwrap_err(),
        ConfigError::Params(HeaderError::WordBits(65))
    );
}

#[test]
fn fault_messages() {
    let f = Fault {
        pc: 3,
        kind: FaultKind::ReadOnlyWrite { address: 1 },
    };
    assert_eq!(f.to_string(), "write to read-only memory (word 1) at pc 3");
    assert_eq!(
        Halt::Fault(f).to_string(),
        "fault: write to read-only memory (word 1) at pc 3"
    );
    assert_eq!(Halt::Answer(7).to_string(), "answer 7");
}
