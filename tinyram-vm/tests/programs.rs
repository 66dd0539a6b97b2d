use std::path::Path;
use tinyram_vm::{assemble, run, Config, Dialect, Halt, MemoryModel, Outcome};

fn load(name: &str) -> tinyram_vm::Program {
    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR")
        .expect("CARGO_MANIFEST_DIR not set");
    let path = Path::new(&manifest_dir)
        .parent()
        .expect("missing parent directory")
        .join(format!("programs/{name}.tr"));
    let src = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("could not read {path:?}: {e}"));
    assemble(&src).unwrap_or_else(|e| panic!("{name}.tr: {e}"))
}

fn run_with(name: &str, tape0: Vec<u64>) -> Outcome {
    let p = load(name);
    let cfg = Config::from(&p).with_step_limit(1_000_000);
    run(&p, cfg, tape0, vec![]).expect("invalid configuration")
}

mod programs {
    use super::*;

    #[test]
    fn collatz() {
        let p = load("collatz");
        assert_eq!(p.params().dialect, Dialect::V1);
        assert_eq!(p.params().word_bits, 64);
        assert_eq!(p.params().registers, 5);

        let out = run_with("collatz", vec![6]);
        assert_eq!(out.halt, Halt::Answer(0));
        assert_eq!(out.mem(0), 1);
        assert_eq!(out.mem(1), 8);
        assert_eq!(out.steps, 75);

        let out = run_with("collatz", vec![27]);
        assert_eq!(out.answer(), Some(0));
        assert_eq!(out.mem(1), 111);
    }

    #[test]
    fn collatz_is_deterministic() {
        let a = run_with("collatz", vec![97]);
        let b = run_with("collatz", vec![97]);
        assert_eq!(a, b);
    }

    #[test]
    fn fib() {
        let p = load("fib");
        assert_eq!(p.params().dialect, Dialect::V2);
        assert_eq!(p.params().memory, MemoryModel::Harvard);

        let out = run_with("fib", vec![5]);
        assert_eq!(out.answer(), Some(0));
        assert_eq!(out.mem(0), 8);
        assert_eq!(out.steps, 35);

        let out = run_with("fib", vec![39]);
        assert_eq!(out.mem(0), 102_334_155);

        // An empty tape reads as zero, so the loop never runs
        let out = run_with("fib", vec![]);
        assert_eq!(out.mem(0), 1);
        assert!(!out.flag);
    }

    #[test]
    fn fib_label_table() {
        let p = load("fib");
        let syms: Vec<_> = p
            .symbols()
            .iter()
            .map(|s| (s.name.as_str(), s.address))
            .collect();
        assert_eq!(syms, [("_loop", 3), ("_end", 10)]);
    }

    #[test]
    fn reverse() {
        let out = run_with("reverse", vec![10, 20, 30]);
        assert_eq!(out.answer(), Some(0));
        assert_eq!(out.mem(0), 4);
        assert_eq!([out.mem(2), out.mem(3), out.mem(4)], [30, 20, 10]);

        let out = run_with("reverse", vec![]);
        assert_eq!(out.answer(), Some(0));
        assert_eq!(out.mem(0), 1);
    }

    #[test]
    fn reverse_narrow_words() {
        // Tape words are truncated to W = 8 bits when read
        let out = run_with("reverse", vec![0x1ff, 2]);
        assert_eq!([out.mem(2), out.mem(3)], [2, 0xff]);
    }
}
