use criterion::{black_box, criterion_group, criterion_main, Criterion};

use termline::{ArgKind, Engine, TokenDict, TokenEntry};

const T_HELP: u32 = 10;
const T_SHOW: u32 = 11;
const T_VERSION: u32 = 12;
const T_SET: u32 = 13;
const T_RATE: u32 = 14;

const DICT: TokenDict<'static> = TokenDict::new(&[
    (T_HELP, "help"),
    (T_SHOW, "show"),
    (T_VERSION, "version"),
    (T_SET, "set"),
    (T_RATE, "rate"),
]);

const SHOW_TOKENS: &[TokenEntry<'static>] = &[TokenEntry::new(T_VERSION)];
const SET_TOKENS: &[TokenEntry<'static>] =
    &[TokenEntry::new(T_RATE).with_arg(ArgKind::Int)];
const ROOT: &[TokenEntry<'static>] = &[
    TokenEntry::new(T_HELP).with_arg(ArgKind::Help),
    TokenEntry::new(T_SHOW).with_subtokens(SHOW_TOKENS),
    TokenEntry::new(T_SET).with_subtokens(SET_TOKENS),
];

/// Discards everything; isolates engine cost from sink cost.
struct NullSink;

impl std::io::Write for NullSink {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        Ok(buf.len())
    }
    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

fn bench_engine(c: &mut Criterion) {
    let mut g = c.benchmark_group("engine");

    g.bench_function("submit_leaf_command", |b| {
        let mut engine = Engine::new(ROOT, DICT, NullSink);
        engine.set_prompt("> ");
        b.iter(|| {
            for &byte in black_box(b"show version\r".as_slice()) {
                engine.feed(byte);
            }
        })
    });

    g.bench_function("submit_int_argument", |b| {
        let mut engine = Engine::new(ROOT, DICT, NullSink);
        engine.set_prompt("> ");
        b.iter(|| {
            for &byte in black_box(b"set rate 0x2A\r".as_slice()) {
                engine.feed(byte);
            }
        })
    });

    g.bench_function("interior_editing", |b| {
        let mut engine = Engine::new(ROOT, DICT, NullSink);
        engine.set_prompt("> ");
        b.iter(|| {
            for &byte in black_box(b"show version".as_slice()) {
                engine.feed(byte);
            }
            // Walk home, retype the first word, abandon the line.
            for _ in 0..12 {
                engine.feed(0x1b);
                engine.feed(b'[');
                engine.feed(b'D');
            }
            for &byte in b"XY" {
                engine.feed(byte);
            }
            engine.feed(0x03);
        })
    });

    g.bench_function("history_churn", |b| {
        let mut engine = Engine::new(ROOT, DICT, NullSink);
        engine.set_prompt("> ");
        b.iter(|| {
            for i in 0..16u32 {
                for &byte in format!("set rate {i}\r").as_bytes() {
                    engine.feed(byte);
                }
            }
            // Walk back through what fits, then return to the live line.
            for _ in 0..8 {
                engine.feed(0x10);
            }
            for _ in 0..8 {
                engine.feed(0x0e);
            }
        })
    });

    g.finish();
}

criterion_group!(benches, bench_engine);
criterion_main!(benches);
