#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use tinyram::{assemble, run, Config, Halt};

#[derive(Arbitrary, Debug)]
struct Input {
    header: Header,
    body: String,
    tape0: Vec<u64>,
    tape1: Vec<u64>,
}

#[derive(Arbitrary, Debug)]
enum Header {
    V1,
    V2,
    Harvard,
    Raw(String),
}

const STEP_LIMIT: u64 = 65536;

fuzz_target!(|input: Input| {
    let header = match input.header {
        Header::V1 => "; TinyRAM V=1.000 W=16 K=8".to_owned(),
        Header::V2 => "; TinyRAM V=2.00 W=32 K=8".to_owned(),
        Header::Harvard => "; TinyRAM V=2.00 M=hv W=64 K=4".to_owned(),
        Header::Raw(s) => s,
    };
    let src = format!("{header}\n{}", input.body);

    // Most inputs won't assemble, which is fine as long as we don't panic
    let Ok(program) = assemble(&src) else {
        return;
    };

    let cfg = Config::from(&program).with_step_limit(STEP_LIMIT);
    let a = run(&program, cfg.clone(), input.tape0.clone(), input.tape1.clone())
        .expect("program's own params must be a valid config");
    let b = run(&program, cfg, input.tape0, input.tape1)
        .expect("program's own params must be a valid config");
    assert_eq!(a, b, "run is not deterministic");

    assert!(a.steps <= STEP_LIMIT);
    let mask = match program.params().word_bits {
        64 => u64::MAX,
        w => (1 << w) - 1,
    };
    for r in &a.registers {
        assert_eq!(r & mask, *r, "register out of range: {:?}", a.registers);
    }
    for w in a.memory.values() {
        assert_eq!(w & mask, *w, "memory word out of range");
    }
    if let Halt::Answer(code) = a.halt {
        assert_eq!(code & mask, code);
    }
});
