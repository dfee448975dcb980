//! Escape sequences — the byte strings the engine emits to keep the
//! terminal in sync, and the recognizer for multi-byte key sequences
//! arriving from it.
//!
//! Output is hardcoded to a VT100 subset; there is no capability
//! discovery. Input recognition is greedy at lengths 3 and 4: the
//! three-byte arrow/home/end sequences fire as soon as their final byte
//! arrives, an unknown three-byte prefix waits for a fourth byte (the
//! delete key is `ESC [ 3 ~`), and an unknown four-byte sequence is
//! dropped without echo. Escape bytes arrive contiguously over a
//! line-speed transport, so no timeout is needed to disambiguate a bare
//! ESC from a sequence prefix.

use crate::MAX_ESCAPE;

/// Escape introducer.
pub const ESC: u8 = 0x1b;

// ── Output sequences ──────────────────────────────────────────────────────────

/// Move the cursor right one column.
pub const CURSOR_RIGHT: &[u8] = b"\x1b[C";
/// Move the cursor left one column.
pub const CURSOR_LEFT: &[u8] = b"\x1b[D";
/// Move right one column, explicit-count form.
pub const CURSOR_RIGHT_ONE: &[u8] = b"\x1b[1C";
/// Move left one column, explicit-count form.
pub const CURSOR_LEFT_ONE: &[u8] = b"\x1b[1D";
/// Erase the glyph left of the cursor: left, space, left.
pub const ERASE_LAST: &[u8] = b"\x1b[D \x1b[D";
/// Clear the screen and home the cursor.
pub const CLEAR_AND_HOME: &[u8] = b"\x1b[2J\x1b[H";

// ── Input sequences ───────────────────────────────────────────────────────────

const SEQ_UP: &[u8] = b"\x1b[A";
const SEQ_DOWN: &[u8] = b"\x1b[B";
const SEQ_RIGHT: &[u8] = b"\x1b[C";
const SEQ_LEFT: &[u8] = b"\x1b[D";
const SEQ_HOME: &[u8] = b"\x1bOH";
const SEQ_END: &[u8] = b"\x1bOF";
const SEQ_DELETE: &[u8] = b"\x1b[3~";

/// Editor action named by a completed escape sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscapeAction {
    /// Up arrow.
    HistoryPrevious,
    /// Down arrow.
    HistoryNext,
    /// Right arrow.
    CursorRight,
    /// Left arrow.
    CursorLeft,
    /// Home key.
    Home,
    /// End key.
    End,
    /// Delete key.
    DeleteForward,
}

/// Result of feeding one byte to the accumulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscapeStatus {
    /// Sequence still in progress; keep feeding bytes.
    Pending,
    /// A known sequence completed.
    Matched(EscapeAction),
    /// Unrecognized sequence dropped.
    Discarded,
}

// ── EscapeBuffer ──────────────────────────────────────────────────────────────

/// Accumulates the bytes of an in-progress escape sequence.
#[derive(Debug, Clone)]
pub struct EscapeBuffer {
    buf: [u8; MAX_ESCAPE],
    len: usize,
}

impl EscapeBuffer {
    pub const fn new() -> Self {
        Self {
            buf: [0; MAX_ESCAPE],
            len: 0,
        }
    }

    /// True while a sequence is being accumulated.
    pub fn is_active(&self) -> bool {
        self.len > 0
    }

    /// Begin a new sequence with the ESC byte just received.
    pub fn begin(&mut self) {
        self.buf[0] = ESC;
        self.len = 1;
    }

    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// Append `byte` and try to recognize the sequence so far.
    ///
    /// On [`EscapeStatus::Matched`] and [`EscapeStatus::Discarded`] the
    /// accumulator is reset.
    pub fn push(&mut self, byte: u8) -> EscapeStatus {
        if self.len >= MAX_ESCAPE {
            // Backstop; recognition terminates at length 4 before this.
            self.len = 0;
            return EscapeStatus::Discarded;
        }
        self.buf[self.len] = byte;
        self.len += 1;

        let status = match self.len {
            3 => match self.recognize_short() {
                Some(action) => EscapeStatus::Matched(action),
                None => EscapeStatus::Pending,
            },
            4 => {
                if &self.buf[..4] == SEQ_DELETE {
                    EscapeStatus::Matched(EscapeAction::DeleteForward)
                } else {
                    EscapeStatus::Discarded
                }
            }
            n if n == MAX_ESCAPE => EscapeStatus::Discarded,
            _ => EscapeStatus::Pending,
        };
        if status != EscapeStatus::Pending {
            self.len = 0;
        }
        status
    }

    fn recognize_short(&self) -> Option<EscapeAction> {
        let seq = &self.buf[..3];
        if seq == SEQ_UP {
            Some(EscapeAction::HistoryPrevious)
        } else if seq == SEQ_DOWN {
            Some(EscapeAction::HistoryNext)
        } else if seq == SEQ_RIGHT {
            Some(EscapeAction::CursorRight)
        } else if seq == SEQ_LEFT {
            Some(EscapeAction::CursorLeft)
        } else if seq == SEQ_HOME {
            Some(EscapeAction::Home)
        } else if seq == SEQ_END {
            Some(EscapeAction::End)
        } else {
            None
        }
    }
}

impl Default for EscapeBuffer {
    fn default() -> Self {
        Self::new()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
