//! termline — a byte-streamed interactive command line editor with a
//! grammar-driven tokenizer.
//!
//! The engine is built for hosts that talk to a terminal one byte at a
//! time over a dumb transport (serial console, USB-CDC, a JTAG monitor,
//! a test harness) and have no hosted line-editing library available.
//! The host feeds bytes into [`Engine::feed`]; the engine keeps an
//! editable line buffer, renders every visible change by writing
//! VT100-subset escape sequences to a caller-supplied sink, records
//! submitted lines in a fixed-size byte ring, offers tab completion and
//! inline help against a caller-supplied command grammar, and delivers
//! each successfully parsed line to a callback as a flat stream of token
//! IDs and typed arguments.
//!
//! ## Architecture
//!
//! | Module | Responsibility |
//! |--------|----------------|
//! | [`line`] | fixed-capacity line buffer with cursor and logical length |
//! | [`ansi`] | output escape sequences and the input escape recognizer |
//! | [`history`] | NUL-terminated entries packed in a fixed byte ring |
//! | [`split`] | destructive in-place word splitter and its inverse |
//! | [`grammar`] | token tree, display dictionary, exact-or-prefix matcher |
//! | [`parse`] | grammar walker producing the parsed token stream |
//! | [`engine`] | per-byte dispatcher, echo renderer, completion, help |
//!
//! Everything is sized at compile time; the engine performs no
//! allocation while running (the sole heap use is the boxed parse
//! callback installed at setup). The dispatcher is fully synchronous:
//! every call to [`Engine::feed`] runs to completion before the next
//! byte is accepted, which is what makes the engine embeddable on bare
//! metal.
//!
//! ## Driving the engine
//!
//! ```
//! use termline::{Engine, Status, TokenDict, TokenEntry};
//!
//! const T_HELLO: u32 = 10;
//! const ROOT: &[TokenEntry<'static>] =
//!     &[TokenEntry::new(T_HELLO).with_help("Print a greeting")];
//! const DICT: TokenDict<'static> = TokenDict::new(&[(T_HELLO, "hello")]);
//!
//! let mut engine = Engine::new(ROOT, DICT, Vec::<u8>::new());
//! engine.set_prompt("> ");
//! engine.set_callback(|parsed| {
//!     assert_eq!(parsed.tokens(), &[T_HELLO, 0]);
//! });
//! for &b in b"hello\r" {
//!     assert_eq!(engine.feed(b), Status::Continue);
//! }
//! ```

pub mod ansi;
pub mod engine;
pub mod grammar;
pub mod history;
pub mod line;
pub mod parse;
pub mod split;

pub use engine::{Engine, Status};
pub use grammar::{ArgKind, TokenDict, TokenEntry, TokenId};
pub use history::HistoryRing;
pub use line::LineBuffer;
pub use parse::{Completion, ParseError, ParsedLine};
pub use split::{SplitError, Words};

/// Line buffer capacity in bytes, including the terminating NUL.
pub const MAX_LINE: usize = 128;

/// Maximum number of words on one line. A line reaching this count is
/// rejected with [`SplitError::TooManyWords`].
pub const MAX_WORDS: usize = 16;

/// Escape accumulator capacity. Larger unrecognized sequences are
/// silently discarded.
pub const MAX_ESCAPE: usize = 8;

/// Default history ring capacity in bytes.
pub const MAX_HISTORY: usize = 1024;

/// Maximum grammar nesting depth, counting both host-entered levels and
/// descent during a single parse.
pub const MAX_LEVELS: usize = 8;
