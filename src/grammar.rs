//! The command grammar — a caller-owned tree of token definitions the
//! engine walks word by word.
//!
//! A grammar level is a plain slice of [`TokenEntry`] values. An entry
//! may demand a typed argument, document itself with a help string, and
//! point at a child level as a borrowed slice, so a whole grammar can be
//! built from `const` tables:
//!
//! ```
//! use termline::{ArgKind, TokenDict, TokenEntry};
//!
//! const T_SET: u32 = 10;
//! const T_RATE: u32 = 11;
//!
//! const SET_TOKENS: &[TokenEntry<'static>] =
//!     &[TokenEntry::new(T_RATE).with_arg(ArgKind::Int).with_help("Sample rate")];
//! const ROOT: &[TokenEntry<'static>] =
//!     &[TokenEntry::new(T_SET).with_subtokens(SET_TOKENS)];
//! const DICT: TokenDict<'static> =
//!     TokenDict::new(&[(T_SET, "set"), (T_RATE, "rate")]);
//! ```
//!
//! Display strings live in a separate [`TokenDict`] keyed by token ID,
//! so the same ID can appear at several levels without repeating its
//! spelling.

// ── Token IDs and argument kinds ──────────────────────────────────────────────

/// A small positive integer naming a command word. ID 0 is reserved: it
/// terminates the parsed token stream.
pub type TokenId = u32;

/// What an entry expects after its own word.
///
/// The discriminants of [`ArgKind::Int`], [`ArgKind::Float`] and
/// [`ArgKind::Str`] double as the tags written into the parsed token
/// stream ahead of each serialized argument; pick token IDs outside
/// that range (10 and up is conventional) if the stream is consumed
/// without grammar knowledge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u32)]
pub enum ArgKind {
    /// No argument.
    #[default]
    None = 0,
    /// One integer, C-style: decimal, `0x` hex, or leading-`0` octal.
    Int = 1,
    /// One floating point number.
    Float = 2,
    /// One string; quote it to include spaces.
    Str = 3,
    /// One word drawn from the entry's subtokens.
    Token = 4,
    /// The entry only documents; matching it neither descends nor
    /// demands an argument.
    Help = 5,
}

impl ArgKind {
    /// The tag value written to the parsed stream for this kind.
    pub const fn tag(self) -> u32 {
        self as u32
    }
}

// ── TokenEntry ────────────────────────────────────────────────────────────────

/// One node of the grammar tree.
///
/// `subtokens` is the next grammar level under this entry — except when
/// `arg` is [`ArgKind::Token`], in which case it enumerates the legal
/// values for that single argument and no descent happens.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TokenEntry<'g> {
    pub id: TokenId,
    pub arg: ArgKind,
    pub help: Option<&'g str>,
    pub subtokens: Option<&'g [TokenEntry<'g>]>,
}

impl<'g> TokenEntry<'g> {
    pub const fn new(id: TokenId) -> Self {
        Self {
            id,
            arg: ArgKind::None,
            help: None,
            subtokens: None,
        }
    }

    pub const fn with_arg(mut self, arg: ArgKind) -> Self {
        self.arg = arg;
        self
    }

    pub const fn with_help(mut self, help: &'g str) -> Self {
        self.help = Some(help);
        self
    }

    pub const fn with_subtokens(mut self, subtokens: &'g [TokenEntry<'g>]) -> Self {
        self.subtokens = Some(subtokens);
        self
    }
}

// ── TokenDict ─────────────────────────────────────────────────────────────────

/// Maps token IDs to their display strings.
#[derive(Debug, Clone, Copy)]
pub struct TokenDict<'g> {
    entries: &'g [(TokenId, &'g str)],
}

impl<'g> TokenDict<'g> {
    pub const fn new(entries: &'g [(TokenId, &'g str)]) -> Self {
        Self { entries }
    }

    /// The display string for `id`, or `""` when unknown.
    pub fn display(&self, id: TokenId) -> &'g str {
        self.entries
            .iter()
            .find(|&&(t, _)| t == id)
            .map_or("", |&(_, s)| s)
    }
}

// ── Matcher ───────────────────────────────────────────────────────────────────

/// Resolve `word` against `list`: an exact display-string match wins
/// outright; otherwise the word must be a strict prefix of exactly one
/// entry. Returns the index into `list`, or `None` on no match or an
/// ambiguous prefix.
pub fn find_token(list: &[TokenEntry<'_>], dict: &TokenDict<'_>, word: &[u8]) -> Option<usize> {
    for (i, entry) in list.iter().enumerate() {
        if dict.display(entry.id).as_bytes() == word {
            return Some(i);
        }
    }

    let mut partial = None;
    for (i, entry) in list.iter().enumerate() {
        let name = dict.display(entry.id).as_bytes();
        if word.len() < name.len() && name.starts_with(word) {
            if partial.is_some() {
                // Not unique.
                return None;
            }
            partial = Some(i);
        }
    }
    partial
}

// ── Tests ─────────────────────────────────────────────────────────────────────
