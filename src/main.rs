//! Interactive demo shell: a small device console grammar driven over
//! the real terminal, one byte at a time.
//!
//! The terminal is switched to raw mode so every keystroke reaches the
//! engine immediately; a thin sink adapter expands the engine's `\n`
//! into `\r\n` on the way out, which is all a raw-mode terminal needs.
//! Exit with Ctrl-D on an empty line.

use std::io::{self, Read, Write};

use termline::{ArgKind, Engine, ParsedLine, Status, TokenDict, TokenEntry};

// ── Demo grammar ──────────────────────────────────────────────────────────────

const T_HELP: u32 = 10;
const T_SHOW: u32 = 11;
const T_VERSION: u32 = 12;
const T_STATS: u32 = 13;
const T_CONFIG: u32 = 14;
const T_SET: u32 = 15;
const T_RATE: u32 = 16;
const T_SCALE: u32 = 17;
const T_NAME: u32 = 18;
const T_MODE: u32 = 19;
const T_FAST: u32 = 20;
const T_SLOW: u32 = 21;
const T_AUTO: u32 = 22;
const T_MEASURE: u32 = 23;
const T_START: u32 = 24;
const T_STOP: u32 = 25;

const DICT: TokenDict<'static> = TokenDict::new(&[
    (T_HELP, "help"),
    (T_SHOW, "show"),
    (T_VERSION, "version"),
    (T_STATS, "stats"),
    (T_CONFIG, "config"),
    (T_SET, "set"),
    (T_RATE, "rate"),
    (T_SCALE, "scale"),
    (T_NAME, "name"),
    (T_MODE, "mode"),
    (T_FAST, "fast"),
    (T_SLOW, "slow"),
    (T_AUTO, "auto"),
    (T_MEASURE, "measure"),
    (T_START, "start"),
    (T_STOP, "stop"),
]);

const SHOW_TOKENS: &[TokenEntry<'static>] = &[
    TokenEntry::new(T_VERSION).with_help("Firmware version"),
    TokenEntry::new(T_STATS).with_help("Sample statistics"),
    TokenEntry::new(T_CONFIG).with_help("Active configuration"),
];

const MODE_VALUES: &[TokenEntry<'static>] = &[
    TokenEntry::new(T_FAST),
    TokenEntry::new(T_SLOW),
    TokenEntry::new(T_AUTO),
];

const SET_TOKENS: &[TokenEntry<'static>] = &[
    TokenEntry::new(T_RATE)
        .with_arg(ArgKind::Int)
        .with_help("Sample rate in hertz"),
    TokenEntry::new(T_SCALE)
        .with_arg(ArgKind::Float)
        .with_help("Scale factor applied to samples"),
    TokenEntry::new(T_NAME)
        .with_arg(ArgKind::Str)
        .with_help("Device name (quote to include spaces)"),
    TokenEntry::new(T_MODE)
        .with_arg(ArgKind::Token)
        .with_subtokens(MODE_VALUES)
        .with_help("Acquisition mode"),
];

const MEASURE_TOKENS: &[TokenEntry<'static>] = &[
    TokenEntry::new(T_START).with_help("Start acquiring"),
    TokenEntry::new(T_STOP).with_help("Stop acquiring"),
];

const ROOT_TOKENS: &[TokenEntry<'static>] = &[
    TokenEntry::new(T_HELP)
        .with_arg(ArgKind::Help)
        .with_help("Available commands"),
    TokenEntry::new(T_SHOW)
        .with_subtokens(SHOW_TOKENS)
        .with_help("Show device information"),
    TokenEntry::new(T_SET)
        .with_subtokens(SET_TOKENS)
        .with_help("Change a setting"),
    TokenEntry::new(T_MEASURE)
        .with_subtokens(MEASURE_TOKENS)
        .with_help("Control acquisition"),
];

// ── Sink adapter ──────────────────────────────────────────────────────────────

/// Expands `\n` to `\r\n` and flushes every write, so echo appears
/// immediately on a raw-mode terminal.
struct CrlfWriter<W: Write> {
    inner: W,
}

impl<W: Write> Write for CrlfWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        for &b in buf {
            if b == b'\n' {
                self.inner.write_all(b"\r\n")?;
            } else {
                self.inner.write_all(&[b])?;
            }
        }
        self.inner.flush()?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

// ── Raw mode ──────────────────────────────────────────────────────────────────

/// RAII guard: disables raw mode when dropped.
struct RawModeGuard(());

impl RawModeGuard {
    fn enable() -> io::Result<Self> {
        crossterm::terminal::enable_raw_mode()?;
        Ok(RawModeGuard(()))
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = crossterm::terminal::disable_raw_mode();
    }
}

// ── Callback ──────────────────────────────────────────────────────────────────

/// Pretty-print a parsed line: token names, with typed arguments
/// decoded from argument storage.
fn print_parsed(parsed: &ParsedLine<'_>) {
    let tokens = parsed.tokens();
    let mut rendered = String::from("parsed:");
    let mut i = 0;
    while i < tokens.len() && tokens[i] != 0 {
        let t = tokens[i];
        if t == ArgKind::Int.tag() {
            let offset = tokens[i + 1] as usize;
            rendered.push_str(&format!(" {}", parsed.arg_int(offset)));
            i += 2;
        } else if t == ArgKind::Float.tag() {
            let offset = tokens[i + 1] as usize;
            rendered.push_str(&format!(" {}", parsed.arg_float(offset)));
            i += 2;
        } else if t == ArgKind::Str.tag() {
            let offset = tokens[i + 1] as usize;
            rendered.push_str(&format!(" {:?}", parsed.arg_str(offset)));
            i += 2;
        } else {
            rendered.push(' ');
            rendered.push_str(DICT.display(t));
            i += 1;
        }
    }
    print!("{rendered}\r\n");
    let _ = io::stdout().flush();
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn usage() {
    eprintln!("Usage: termline [--prompt <text>]");
}

fn main() {
    let mut prompt = String::from("> ");
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--prompt" => match args.next() {
                Some(text) => prompt = text,
                None => {
                    usage();
                    std::process::exit(1);
                }
            },
            "-h" | "--help" => {
                usage();
                return;
            }
            _ => {
                usage();
                std::process::exit(1);
            }
        }
    }

    let guard = match RawModeGuard::enable() {
        Ok(guard) => guard,
        Err(err) => {
            eprintln!("termline: cannot enter raw mode: {err}");
            std::process::exit(1);
        }
    };

    let sink = CrlfWriter {
        inner: io::stdout().lock(),
    };
    let mut engine = Engine::new(ROOT_TOKENS, DICT, sink);
    engine.set_callback(print_parsed);
    engine.set_prompt(&prompt);

    let mut stdin = io::stdin().lock();
    let mut byte = [0u8; 1];
    loop {
        match stdin.read(&mut byte) {
            Ok(0) => break,
            Ok(_) => {
                if engine.feed(byte[0]) == Status::Exit {
                    break;
                }
            }
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(_) => break,
        }
    }

    drop(engine);
    drop(guard);
    println!();
}
