//! The grammar walker — turns the split word list into the parsed token
//! stream, and reports what could legally come next for completion.
//!
//! The walker descends the grammar one word at a time, keeping a small
//! stack of levels. Matching a token with subtokens pushes a level;
//! matching one with an argument kind arms that kind for the following
//! word; matching a leaf marks the command done, after which any further
//! word is an error. The same walk serves two callers: line submission
//! (strict, every failure is an error) and completion / inline help
//! (lenient, failures are silent and the interesting output is the
//! [`Completion`] describing the legal next element).

use core::fmt;

use crate::grammar::{find_token, ArgKind, TokenDict, TokenEntry};
use crate::line::LineBuffer;
use crate::{MAX_LEVELS, MAX_LINE, MAX_WORDS};

/// Parsed stream capacity: each word contributes at most two entries,
/// plus the terminator.
pub const MAX_PARSED: usize = 2 * MAX_WORDS + 1;

/// Argument storage capacity: string arguments copy at most a full line
/// plus one terminator per word; numeric arguments are far smaller.
pub const MAX_ARG_BYTES: usize = MAX_LINE + MAX_WORDS;

// ── ParseError ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    /// No entry at the current level matched the word.
    InvalidCommand,
    /// An argument word failed its type parse or token match.
    InvalidValue,
    /// The line ended while an argument was still expected.
    MissingArgument,
    /// A word followed a completed command.
    TooManyArguments,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::InvalidCommand => write!(f, "Invalid command."),
            ParseError::InvalidValue => write!(f, "Invalid value."),
            ParseError::MissingArgument => write!(f, "Missing argument."),
            ParseError::TooManyArguments => write!(f, "Too many arguments."),
        }
    }
}

impl std::error::Error for ParseError {}

// ── Completion ────────────────────────────────────────────────────────────────

/// What may legally follow the words consumed so far.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Completion<'g> {
    /// Candidate tokens for the next word: the armed [`ArgKind::Token`]
    /// value list if one is pending, otherwise the current grammar
    /// level. `None` once the command is complete.
    pub tokens: Option<&'g [TokenEntry<'g>]>,
    /// The pending argument kind, [`ArgKind::None`] when a token is
    /// expected instead.
    pub arg: ArgKind,
}

// ── ParsedLine ────────────────────────────────────────────────────────────────

/// The result of a successful walk, delivered to the parse callback.
///
/// `tokens()` is a flat `u32` stream terminated by 0. Each element is a
/// grammar token ID, except that a typed argument appears as its
/// [`ArgKind`] tag followed by the offset in argument storage where the
/// value is serialized in native representation.
#[derive(Debug, Clone)]
pub struct ParsedLine<'g> {
    tokens: [u32; MAX_PARSED],
    num_tokens: usize,
    buf: [u8; MAX_ARG_BYTES],
    buf_len: usize,
    last_entry: Option<&'g TokenEntry<'g>>,
}

impl<'g> ParsedLine<'g> {
    pub const fn new() -> Self {
        Self {
            tokens: [0; MAX_PARSED],
            num_tokens: 0,
            buf: [0; MAX_ARG_BYTES],
            buf_len: 0,
            last_entry: None,
        }
    }

    /// The token stream, including the trailing 0 after a successful
    /// walk.
    pub fn tokens(&self) -> &[u32] {
        &self.tokens[..self.num_tokens]
    }

    /// The grammar entry matched last, for help rendering.
    pub fn last_entry(&self) -> Option<&'g TokenEntry<'g>> {
        self.last_entry
    }

    /// Decode the integer argument serialized at `offset`.
    pub fn arg_int(&self, offset: usize) -> i32 {
        match self.buf.get(offset..offset + 4) {
            Some(b) => i32::from_ne_bytes([b[0], b[1], b[2], b[3]]),
            None => 0,
        }
    }

    /// Decode the float argument serialized at `offset`.
    pub fn arg_float(&self, offset: usize) -> f32 {
        match self.buf.get(offset..offset + 4) {
            Some(b) => f32::from_ne_bytes([b[0], b[1], b[2], b[3]]),
            None => 0.0,
        }
    }

    /// Decode the string argument serialized at `offset`.
    pub fn arg_str(&self, offset: usize) -> &str {
        let bytes = &self.buf[offset.min(self.buf.len())..];
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        core::str::from_utf8(&bytes[..end]).unwrap_or("")
    }

    fn reset(&mut self) {
        self.num_tokens = 0;
        self.buf_len = 0;
        self.last_entry = None;
    }

    fn push_token(&mut self, t: u32) {
        // Capacity covers the worst case of MAX_WORDS words; see
        // MAX_PARSED.
        if self.num_tokens < MAX_PARSED {
            self.tokens[self.num_tokens] = t;
            self.num_tokens += 1;
        }
    }

    fn push_bytes(&mut self, bytes: &[u8]) -> usize {
        let offset = self.buf_len;
        self.buf[offset..offset + bytes.len()].copy_from_slice(bytes);
        self.buf_len += bytes.len();
        offset
    }

    fn push_str_arg(&mut self, word: &[u8]) -> usize {
        let offset = self.push_bytes(word);
        self.buf[self.buf_len] = 0;
        self.buf_len += 1;
        offset
    }
}

impl Default for ParsedLine<'_> {
    fn default() -> Self {
        Self::new()
    }
}

// ── Walker ────────────────────────────────────────────────────────────────────

/// Walk `words` (start offsets into `line`) against the grammar level
/// `top`, filling `parsed`.
///
/// With `completing` false this is the submission path: any failure is
/// an error and a pending argument at end of input is
/// [`ParseError::MissingArgument`]. With `completing` true failures are
/// reported the same way but a pending argument is fine — the caller
/// wants the returned [`Completion`].
pub fn tokenize<'g>(
    line: &LineBuffer,
    words: &[usize],
    top: &'g [TokenEntry<'g>],
    dict: &TokenDict<'g>,
    parsed: &mut ParsedLine<'g>,
    completing: bool,
) -> Result<Completion<'g>, ParseError> {
    parsed.reset();
    let mut stack = [top; MAX_LEVELS];
    let mut depth = 0;
    let mut done = false;
    let mut pending = ArgKind::None;
    let mut value_tokens: Option<&'g [TokenEntry<'g>]> = None;

    for &start in words {
        let word = line.word_at(start);
        if done {
            return Err(ParseError::TooManyArguments);
        }
        if pending == ArgKind::None {
            let Some(idx) = find_token(stack[depth], dict, word) else {
                return Err(ParseError::InvalidCommand);
            };
            let entry = &stack[depth][idx];
            parsed.push_token(entry.id);
            parsed.last_entry = Some(entry);
            match entry.arg {
                ArgKind::Help => {
                    // Documentation-only: no descent, no argument.
                }
                ArgKind::None => {
                    if let Some(sub) = entry.subtokens {
                        if depth + 1 < MAX_LEVELS {
                            depth += 1;
                            stack[depth] = sub;
                        }
                    } else {
                        done = true;
                    }
                }
                kind => {
                    pending = kind;
                    if kind == ArgKind::Token {
                        value_tokens = entry.subtokens;
                    }
                }
            }
        } else {
            match pending {
                ArgKind::Int => {
                    let Some(value) = parse_int(word) else {
                        return Err(ParseError::InvalidValue);
                    };
                    parsed.push_token(ArgKind::Int.tag());
                    let offset = parsed.push_bytes(&value.to_ne_bytes());
                    parsed.push_token(offset as u32);
                }
                ArgKind::Float => {
                    let Some(value) = parse_float(word) else {
                        return Err(ParseError::InvalidValue);
                    };
                    parsed.push_token(ArgKind::Float.tag());
                    let offset = parsed.push_bytes(&value.to_ne_bytes());
                    parsed.push_token(offset as u32);
                }
                ArgKind::Str => {
                    parsed.push_token(ArgKind::Str.tag());
                    let offset = parsed.push_str_arg(word);
                    parsed.push_token(offset as u32);
                }
                _ => {
                    // ArgKind::Token: the word names one of the value
                    // tokens.
                    let list = value_tokens.unwrap_or(&[]);
                    let Some(idx) = find_token(list, dict, word) else {
                        return Err(ParseError::InvalidValue);
                    };
                    parsed.push_token(list[idx].id);
                    parsed.last_entry = Some(&list[idx]);
                }
            }
            pending = ArgKind::None;
        }
    }

    if pending != ArgKind::None && !completing {
        return Err(ParseError::MissingArgument);
    }
    parsed.push_token(0);

    let tokens = if done {
        None
    } else if pending == ArgKind::Token {
        value_tokens
    } else {
        Some(stack[depth])
    };
    Ok(Completion {
        tokens,
        arg: pending,
    })
}

// ── Scalar scanners ───────────────────────────────────────────────────────────

/// C-style integer scan: optional sign, then decimal, `0x`/`0X` hex, or
/// leading-`0` octal. The whole word must be consumed.
pub(crate) fn parse_int(word: &[u8]) -> Option<i32> {
    let s = core::str::from_utf8(word).ok()?;
    let (negative, rest) = if let Some(r) = s.strip_prefix('-') {
        (true, r)
    } else if let Some(r) = s.strip_prefix('+') {
        (false, r)
    } else {
        (false, s)
    };
    let (radix, digits) = if let Some(hex) = rest.strip_prefix("0x").or_else(|| rest.strip_prefix("0X")) {
        (16, hex)
    } else if rest.len() > 1 && rest.starts_with('0') {
        (8, &rest[1..])
    } else {
        (10, rest)
    };
    if digits.is_empty() || digits.starts_with(&['+', '-'][..]) {
        return None;
    }
    let magnitude = i64::from_str_radix(digits, radix).ok()?;
    let value = if negative { -magnitude } else { magnitude };
    i32::try_from(value).ok()
}

/// Float scan; the whole word must be consumed.
pub(crate) fn parse_float(word: &[u8]) -> Option<f32> {
    core::str::from_utf8(word).ok()?.parse().ok()
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const T_SHOW: u32 = 10;
    const T_VERSION: u32 = 11;
    const T_SET: u32 = 12;
    const T_NAME: u32 = 13;
    const T_MODE: u32 = 14;
    const T_FAST: u32 = 15;
    const T_SLOW: u32 = 16;
    const T_HELP: u32 = 17;
    const T_RATE: u32 = 18;
    const T_SCALE: u32 = 19;

    const DICT: TokenDict<'static> = TokenDict::new(&[
        (T_SHOW, "show"),
        (T_VERSION, "version"),
        (T_SET, "set"),
        (T_NAME, "name"),
        (T_MODE, "mode"),
        (T_FAST, "fast"),
        (T_SLOW, "slow"),
        (T_HELP, "help"),
        (T_RATE, "rate"),
        (T_SCALE, "scale"),
    ]);

    const MODE_VALUES: &[TokenEntry<'static>] =
        &[TokenEntry::new(T_FAST), TokenEntry::new(T_SLOW)];
    const SHOW_TOKENS: &[TokenEntry<'static>] = &[TokenEntry::new(T_VERSION)];
    const SET_TOKENS: &[TokenEntry<'static>] = &[
        TokenEntry::new(T_RATE).with_arg(ArgKind::Int),
        TokenEntry::new(T_SCALE).with_arg(ArgKind::Float),
        TokenEntry::new(T_NAME).with_arg(ArgKind::Str),
        TokenEntry::new(T_MODE)
            .with_arg(ArgKind::Token)
            .with_subtokens(MODE_VALUES),
    ];
    const ROOT: &[TokenEntry<'static>] = &[
        TokenEntry::new(T_HELP).with_arg(ArgKind::Help).with_help("Commands"),
        TokenEntry::new(T_SHOW).with_subtokens(SHOW_TOKENS),
        TokenEntry::new(T_SET).with_subtokens(SET_TOKENS),
    ];

    /// Build a split line and run the walker over all its words.
    fn walk<'g>(
        text: &str,
        parsed: &mut ParsedLine<'g>,
        completing: bool,
    ) -> Result<Completion<'g>, ParseError> {
        let mut line = LineBuffer::new();
        for &b in text.as_bytes() {
            assert!(line.insert(b));
        }
        let words = crate::split::split(line.bytes_mut()).expect("split");
        let starts: Vec<usize> = words.starts().to_vec();
        // The walker borrows the line, so run it in place.
        tokenize(&line, &starts, ROOT, &DICT, parsed, completing)
    }

    // ── Submission walks ──────────────────────────────────────────────────────

    #[test]
    fn leaf_command_parses_and_terminates() {
        let mut parsed = ParsedLine::new();
        walk("show version", &mut parsed, false).unwrap();
        assert_eq!(parsed.tokens(), &[T_SHOW, T_VERSION, 0]);
        assert_eq!(parsed.last_entry().map(|e| e.id), Some(T_VERSION));
    }

    #[test]
    fn prefix_words_resolve() {
        let mut parsed = ParsedLine::new();
        walk("sh ver", &mut parsed, false).unwrap();
        assert_eq!(parsed.tokens(), &[T_SHOW, T_VERSION, 0]);
    }

    #[test]
    fn int_argument_serialized() {
        let mut parsed = ParsedLine::new();
        walk("set rate 0x2A", &mut parsed, false).unwrap();
        let toks = parsed.tokens();
        assert_eq!(toks[0], T_SET);
        assert_eq!(toks[1], T_RATE);
        assert_eq!(toks[2], ArgKind::Int.tag());
        let offset = toks[3] as usize;
        assert_eq!(parsed.arg_int(offset), 42);
        assert_eq!(toks[4], 0);
    }

    #[test]
    fn float_argument_serialized() {
        let mut parsed = ParsedLine::new();
        walk("set scale 2.5", &mut parsed, false).unwrap();
        let toks = parsed.tokens();
        assert_eq!(toks[2], ArgKind::Float.tag());
        let offset = toks[3] as usize;
        assert!((parsed.arg_float(offset) - 2.5).abs() < f32::EPSILON);
    }

    #[test]
    fn string_argument_serialized() {
        let mut parsed = ParsedLine::new();
        walk("set name \"hi there\"", &mut parsed, false).unwrap();
        let toks = parsed.tokens();
        assert_eq!(toks[2], ArgKind::Str.tag());
        let offset = toks[3] as usize;
        assert_eq!(parsed.arg_str(offset), "hi there");
    }

    #[test]
    fn token_argument_emits_value_id() {
        let mut parsed = ParsedLine::new();
        walk("set mode fast", &mut parsed, false).unwrap();
        assert_eq!(parsed.tokens(), &[T_SET, T_MODE, T_FAST, 0]);
        assert_eq!(parsed.last_entry().map(|e| e.id), Some(T_FAST));
    }

    #[test]
    fn help_entry_does_not_descend() {
        let mut parsed = ParsedLine::new();
        walk("help show", &mut parsed, false).unwrap();
        // "help" matched at root, then "show" matched at the same level.
        assert_eq!(parsed.tokens(), &[T_HELP, T_SHOW, 0]);
    }

    #[test]
    fn incomplete_descent_still_succeeds() {
        let mut parsed = ParsedLine::new();
        let c = walk("set", &mut parsed, false).unwrap();
        assert_eq!(parsed.tokens(), &[T_SET, 0]);
        // Completion reports the pushed level.
        assert_eq!(c.tokens.map(|t| t.len()), Some(SET_TOKENS.len()));
    }

    // ── Errors ────────────────────────────────────────────────────────────────

    #[test]
    fn unknown_word_is_invalid_command() {
        let mut parsed = ParsedLine::new();
        assert_eq!(
            walk("frobnicate", &mut parsed, false),
            Err(ParseError::InvalidCommand)
        );
    }

    #[test]
    fn bad_int_is_invalid_value() {
        let mut parsed = ParsedLine::new();
        assert_eq!(
            walk("set rate 12abc", &mut parsed, false),
            Err(ParseError::InvalidValue)
        );
    }

    #[test]
    fn bad_token_value_is_invalid_value() {
        let mut parsed = ParsedLine::new();
        assert_eq!(
            walk("set mode warp", &mut parsed, false),
            Err(ParseError::InvalidValue)
        );
    }

    #[test]
    fn pending_arg_at_end_is_missing_argument() {
        let mut parsed = ParsedLine::new();
        assert_eq!(
            walk("set rate", &mut parsed, false),
            Err(ParseError::MissingArgument)
        );
    }

    #[test]
    fn word_after_leaf_is_too_many_arguments() {
        let mut parsed = ParsedLine::new();
        assert_eq!(
            walk("show version extra", &mut parsed, false),
            Err(ParseError::TooManyArguments)
        );
    }

    #[test]
    fn error_messages() {
        assert_eq!(ParseError::InvalidCommand.to_string(), "Invalid command.");
        assert_eq!(ParseError::InvalidValue.to_string(), "Invalid value.");
        assert_eq!(ParseError::MissingArgument.to_string(), "Missing argument.");
        assert_eq!(
            ParseError::TooManyArguments.to_string(),
            "Too many arguments."
        );
    }

    // ── Completion walks ──────────────────────────────────────────────────────

    #[test]
    fn completion_tolerates_pending_arg() {
        let mut parsed = ParsedLine::new();
        let c = walk("set rate", &mut parsed, true).unwrap();
        assert_eq!(c.arg, ArgKind::Int);
    }

    #[test]
    fn completion_reports_value_tokens_for_pending_token_arg() {
        let mut parsed = ParsedLine::new();
        let c = walk("set mode", &mut parsed, true).unwrap();
        assert_eq!(c.arg, ArgKind::Token);
        assert_eq!(c.tokens.map(|t| t.len()), Some(MODE_VALUES.len()));
    }

    #[test]
    fn completion_after_leaf_reports_done() {
        let mut parsed = ParsedLine::new();
        let c = walk("show version", &mut parsed, true).unwrap();
        assert!(c.tokens.is_none());
        assert_eq!(c.arg, ArgKind::None);
    }

    #[test]
    fn completion_on_empty_input_reports_root() {
        let mut parsed = ParsedLine::new();
        let line = LineBuffer::new();
        let c = tokenize(&line, &[], ROOT, &DICT, &mut parsed, true).unwrap();
        assert_eq!(c.tokens.map(|t| t.len()), Some(ROOT.len()));
        assert_eq!(parsed.tokens(), &[0]);
    }

    #[test]
    fn last_entry_reset_between_walks() {
        let mut parsed = ParsedLine::new();
        walk("show version", &mut parsed, false).unwrap();
        assert!(parsed.last_entry().is_some());
        let _ = walk("frobnicate", &mut parsed, true);
        assert!(parsed.last_entry().is_none());
    }

    // ── parse_int ─────────────────────────────────────────────────────────────

    #[test]
    fn parse_int_bases() {
        assert_eq!(parse_int(b"42"), Some(42));
        assert_eq!(parse_int(b"0x2A"), Some(42));
        assert_eq!(parse_int(b"0X2a"), Some(42));
        assert_eq!(parse_int(b"052"), Some(42));
        assert_eq!(parse_int(b"0"), Some(0));
    }

    #[test]
    fn parse_int_signs() {
        assert_eq!(parse_int(b"-42"), Some(-42));
        assert_eq!(parse_int(b"+42"), Some(42));
        assert_eq!(parse_int(b"-0x10"), Some(-16));
    }

    #[test]
    fn parse_int_rejects_suffix() {
        assert_eq!(parse_int(b"42x"), None);
        assert_eq!(parse_int(b"0x"), None);
        assert_eq!(parse_int(b"08"), None);
        assert_eq!(parse_int(b""), None);
        assert_eq!(parse_int(b"-"), None);
        assert_eq!(parse_int(b"--5"), None);
        assert_eq!(parse_int(b"0x+5"), None);
    }

    #[test]
    fn parse_float_accepts_common_forms() {
        assert_eq!(parse_float(b"2.5"), Some(2.5));
        assert_eq!(parse_float(b"-1e3"), Some(-1000.0));
        assert_eq!(parse_float(b"3."), Some(3.0));
        assert_eq!(parse_float(b"2.5x"), None);
    }
}
