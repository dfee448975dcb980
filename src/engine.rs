//! The engine — per-byte input dispatch, echo rendering, completion,
//! inline help, history arrows, and line submission.
//!
//! One [`Engine::feed`] call handles exactly one input byte and runs to
//! completion: there are no internal tasks, timers, or suspension
//! points, and all sink writes caused by a byte finish before the next
//! byte is accepted. The sink is treated as a blocking device write;
//! errors are discarded.
//!
//! ## Echo discipline
//!
//! Every visible terminal change is produced by the engine's own writes:
//! after any action the terminal shows `prompt ‖ line` with the hardware
//! cursor at the logical cursor position. Interior edits re-echo the
//! shifted tail and then walk the cursor back with per-column escapes.

use std::io::Write;

use crate::ansi::{self, EscapeAction, EscapeBuffer, EscapeStatus};
use crate::grammar::{ArgKind, TokenDict, TokenEntry};
use crate::history::HistoryRing;
use crate::line::LineBuffer;
use crate::parse::{tokenize, ParsedLine};
use crate::split;
use crate::{MAX_LEVELS, MAX_LINE};

const INDENT: &[u8] = b"   ";
const NO_HELP: &[u8] = b"No help available.\n";
/// Column where inline help text starts in listings.
const HELP_COLUMN: usize = 15;

// ── Status ────────────────────────────────────────────────────────────────────

/// Verdict of feeding one byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Keep feeding input.
    Continue,
    /// Ctrl-D on an empty line: the host should stop driving the
    /// engine. Nothing is torn down; feeding may resume.
    Exit,
}

/// Best-effort sink write; the engine never surfaces I/O errors.
fn emit<W: Write>(out: &mut W, bytes: &[u8]) {
    let _ = out.write_all(bytes);
}

// ── Engine ────────────────────────────────────────────────────────────────────

/// A command line engine bound to a grammar, a display dictionary, and
/// a print sink.
///
/// The grammar and dictionary are borrowed for the engine's lifetime
/// and never mutated. All buffers live inline; the engine allocates
/// nothing while running.
pub struct Engine<'g, W: Write> {
    out: W,
    prompt: &'g str,
    callback: Option<Box<dyn FnMut(&ParsedLine<'g>) + 'g>>,
    /// Grammar stack: `levels[0]` is the root and never changes;
    /// deeper levels are host-entered nested modes.
    levels: [&'g [TokenEntry<'g>]; MAX_LEVELS],
    depth: usize,
    dict: TokenDict<'g>,
    line: LineBuffer,
    history: HistoryRing,
    /// Current history walk position, `None` when not walking.
    hist_step: Option<usize>,
    escape: EscapeBuffer,
    parsed: ParsedLine<'g>,
}

impl<'g, W: Write> Engine<'g, W> {
    pub fn new(root: &'g [TokenEntry<'g>], dict: TokenDict<'g>, out: W) -> Self {
        Self {
            out,
            prompt: "",
            callback: None,
            levels: [root; MAX_LEVELS],
            depth: 0,
            dict,
            line: LineBuffer::new(),
            history: HistoryRing::new(),
            hist_step: None,
            escape: EscapeBuffer::new(),
            parsed: ParsedLine::new(),
        }
    }

    /// Store the prompt and emit it once.
    pub fn set_prompt(&mut self, prompt: &'g str) {
        self.prompt = prompt;
        emit(&mut self.out, prompt.as_bytes());
    }

    /// Register the sink invoked with each successfully parsed line.
    pub fn set_callback(&mut self, callback: impl FnMut(&ParsedLine<'g>) + 'g) {
        self.callback = Some(Box::new(callback));
    }

    // ── Inspection ────────────────────────────────────────────────────────────

    /// The current line buffer.
    pub fn line(&self) -> &LineBuffer {
        &self.line
    }

    /// The last successful parse.
    pub fn parsed(&self) -> &ParsedLine<'g> {
        &self.parsed
    }

    /// The print sink, e.g. to drain captured output in tests.
    pub fn sink_mut(&mut self) -> &mut W {
        &mut self.out
    }

    // ── Nested modes ──────────────────────────────────────────────────────────

    /// Push a grammar level; subsequent lines parse against `tokens`.
    /// Returns `false` when the level stack is full.
    pub fn enter_level(&mut self, tokens: &'g [TokenEntry<'g>]) -> bool {
        if self.depth + 1 >= MAX_LEVELS {
            return false;
        }
        self.depth += 1;
        self.levels[self.depth] = tokens;
        true
    }

    /// Pop back one grammar level. Returns `false` at the root.
    pub fn leave_level(&mut self) -> bool {
        if self.depth == 0 {
            return false;
        }
        self.depth -= 1;
        true
    }

    // ── Input dispatch ────────────────────────────────────────────────────────

    /// Process one input byte.
    pub fn feed(&mut self, byte: u8) -> Status {
        if self.escape.is_active() {
            if let EscapeStatus::Matched(action) = self.escape.push(byte) {
                self.apply_escape(action);
            }
            return Status::Continue;
        }

        match byte {
            ansi::ESC => self.escape.begin(),
            b'\r' | b'\n' => self.process_line(),
            b'\t' => {
                if self.line.at_end() {
                    self.complete();
                }
            }
            0x08 | 0x7f => {
                if self.line.cursor() > 0 {
                    self.backspace();
                }
            }
            0x01 => self.cursor_home(),
            0x03 => {
                emit(&mut self.out, b"^C");
                self.line.clear();
                self.process_line();
            }
            0x05 => self.cursor_end(),
            0x0b => self.kill_to_end(),
            0x0c => self.redraw(),
            0x0e => self.history_down(),
            0x10 => self.history_up(),
            0x17 => self.kill_word(),
            0x04 => {
                if self.line.is_empty() {
                    return Status::Exit;
                }
            }
            c if (0x20..=0x7e).contains(&c) => {
                if self.line.len() < MAX_LINE - 1 {
                    self.add_char(c);
                }
                self.hist_step = None;
            }
            _ => {}
        }
        Status::Continue
    }

    fn apply_escape(&mut self, action: EscapeAction) {
        match action {
            EscapeAction::HistoryPrevious => self.history_up(),
            EscapeAction::HistoryNext => self.history_down(),
            EscapeAction::CursorRight => {
                if self.line.cursor_right() {
                    emit(&mut self.out, ansi::CURSOR_RIGHT_ONE);
                }
            }
            EscapeAction::CursorLeft => {
                if self.line.cursor_left() {
                    emit(&mut self.out, ansi::CURSOR_LEFT_ONE);
                }
            }
            EscapeAction::Home => self.cursor_home(),
            EscapeAction::End => self.cursor_end(),
            EscapeAction::DeleteForward => self.delete_forward(),
        }
    }

    // ── Echoed edits ──────────────────────────────────────────────────────────

    /// Insert `c` at the cursor with echo.
    fn add_char(&mut self, c: u8) {
        if self.line.at_end() {
            if self.line.insert(c) {
                emit(&mut self.out, &[c]);
            }
        } else {
            let tail = self.line.tail_len();
            if !self.line.insert(c) {
                return;
            }
            // Re-echo from the inserted byte to the end, then walk the
            // cursor back over the shifted tail.
            let pos = self.line.cursor();
            emit(&mut self.out, &self.line.as_bytes()[pos - 1..]);
            for _ in 0..tail {
                emit(&mut self.out, ansi::CURSOR_LEFT);
            }
        }
    }

    /// Delete left of the cursor with echo. Caller checks `cursor > 0`.
    fn backspace(&mut self) {
        if self.line.at_end() {
            self.line.remove_before();
            emit(&mut self.out, ansi::ERASE_LAST);
        } else {
            let tail = self.line.tail_len();
            self.line.remove_before();
            emit(&mut self.out, ansi::CURSOR_LEFT);
            let pos = self.line.cursor();
            emit(&mut self.out, &self.line.as_bytes()[pos..]);
            emit(&mut self.out, b" ");
            for _ in 0..tail + 1 {
                emit(&mut self.out, ansi::CURSOR_LEFT);
            }
        }
    }

    /// Delete under the cursor with echo.
    fn delete_forward(&mut self) {
        if self.line.at_end() {
            return;
        }
        let tail = self.line.tail_len();
        self.line.remove_at();
        let pos = self.line.cursor();
        emit(&mut self.out, &self.line.as_bytes()[pos..]);
        emit(&mut self.out, b" ");
        for _ in 0..tail {
            emit(&mut self.out, ansi::CURSOR_LEFT);
        }
    }

    fn cursor_home(&mut self) {
        while self.line.cursor_left() {
            emit(&mut self.out, ansi::CURSOR_LEFT);
        }
    }

    fn cursor_end(&mut self) {
        while self.line.cursor_right() {
            emit(&mut self.out, ansi::CURSOR_RIGHT);
        }
    }

    /// Ctrl-K: blank the visible tail and drop it from the buffer.
    fn kill_to_end(&mut self) {
        let tail = self.line.tail_len();
        if tail == 0 {
            return;
        }
        for _ in 0..tail {
            emit(&mut self.out, b" ");
        }
        for _ in 0..tail {
            emit(&mut self.out, ansi::CURSOR_LEFT);
        }
        self.line.truncate_at_cursor();
    }

    /// Ctrl-W: delete trailing whitespace, then the word before it.
    fn kill_word(&mut self) {
        while self.line.byte_before_cursor() == Some(b' ') {
            self.backspace();
        }
        while self.line.byte_before_cursor().is_some_and(|b| b != b' ') {
            self.backspace();
        }
    }

    /// Ctrl-L: clear the screen and repaint prompt, line, and cursor.
    fn redraw(&mut self) {
        emit(&mut self.out, ansi::CLEAR_AND_HOME);
        emit(&mut self.out, self.prompt.as_bytes());
        emit(&mut self.out, self.line.as_bytes());
        for _ in 0..self.line.tail_len() {
            emit(&mut self.out, ansi::CURSOR_LEFT);
        }
    }

    /// Clear the visible line: walk to the end, then backspace it away.
    fn delete_line(&mut self) {
        while self.line.cursor_right() {
            emit(&mut self.out, ansi::CURSOR_RIGHT);
        }
        while self.line.cursor() > 0 {
            self.backspace();
        }
    }

    /// Replace the (empty) line with a history entry, echoing it.
    fn set_line_from_history(&mut self, at: usize) {
        if self.history.entry_len(at) > MAX_LINE - 1 {
            // Too long to edit; leave a marker instead.
            self.add_char(b'!');
            return;
        }
        let (head, rest) = self.history.entry(at);
        emit(&mut self.out, head);
        emit(&mut self.out, rest);
        self.line.append(head);
        self.line.append(rest);
    }

    // ── History arrows ────────────────────────────────────────────────────────

    fn history_up(&mut self) {
        let from = match self.hist_step {
            None => self.history.end(),
            Some(step) => step,
        };
        let Some(entry) = self.history.previous(from) else {
            return;
        };
        self.delete_line();
        self.set_line_from_history(entry);
        self.hist_step = Some(entry);
    }

    fn history_down(&mut self) {
        let Some(step) = self.hist_step else {
            return;
        };
        self.delete_line();
        if step == self.history.end() {
            self.hist_step = None;
            return;
        }
        let next = self.history.next_start(step);
        self.set_line_from_history(next);
        self.hist_step = Some(next);
    }

    /// Print all stored entries newest-first, skipping the `history`
    /// command line that triggered the listing.
    fn show_history(&mut self) {
        let Some(skip) = self.history.previous(self.history.end()) else {
            return;
        };
        let mut at = self.history.previous(skip);
        while let Some(entry) = at {
            let (head, rest) = self.history.entry(entry);
            emit(&mut self.out, head);
            emit(&mut self.out, rest);
            emit(&mut self.out, b"\n");
            at = self.history.previous(entry);
        }
    }

    // ── Submission ────────────────────────────────────────────────────────────

    fn process_line(&mut self) {
        emit(&mut self.out, b"\n");
        if !self.line.is_empty() {
            tracing::trace!(line = %self.line.as_str(), "line submitted");
            self.history.push(self.line.as_bytes());
            match split::split(self.line.bytes_mut()) {
                Err(err) => {
                    let _ = writeln!(self.out, "{err}");
                }
                Ok(words) if words.is_empty() => {}
                Ok(words) => {
                    let starts = words.starts();
                    let level = self.levels[self.depth];
                    if self.line.word_at(starts[0]) == b"help".as_slice() {
                        // Walk leniently just to find the help target.
                        let _ = tokenize(
                            &self.line,
                            starts,
                            level,
                            &self.dict,
                            &mut self.parsed,
                            true,
                        );
                        if self.parsed.last_entry().is_some() {
                            self.show_help(words.len());
                        }
                    } else if self.line.word_at(starts[0]) == b"history".as_slice() {
                        self.show_history();
                    } else {
                        match tokenize(
                            &self.line,
                            starts,
                            level,
                            &self.dict,
                            &mut self.parsed,
                            false,
                        ) {
                            Ok(_) => {
                                if let Some(callback) = self.callback.as_mut() {
                                    callback(&self.parsed);
                                }
                            }
                            Err(err) => {
                                tracing::debug!(%err, "parse failed");
                                let _ = writeln!(self.out, "{err}");
                            }
                        }
                    }
                }
            }
        }
        self.line.clear();
        self.escape.clear();
        emit(&mut self.out, self.prompt.as_bytes());
    }

    /// Render help for the entry the lenient walk landed on.
    fn show_help(&mut self, num_words: usize) {
        let Some(entry) = self.parsed.last_entry() else {
            return;
        };
        if let Some(text) = entry.help {
            emit(&mut self.out, text.as_bytes());
            emit(&mut self.out, b"\n");
        }
        // Bare `help` lists the root level; `help <cmd>` lists the
        // target's subcommands.
        let tokens = if num_words == 1 {
            Some(self.levels[0])
        } else {
            entry.subtokens
        };
        if let Some(tokens) = tokens {
            for token in tokens {
                emit(&mut self.out, INDENT);
                let name = self.dict.display(token.id);
                emit(&mut self.out, name.as_bytes());
                if let Some(text) = token.help {
                    for _ in 0..HELP_COLUMN.saturating_sub(name.len()) {
                        emit(&mut self.out, b" ");
                    }
                    emit(&mut self.out, text.as_bytes());
                }
                emit(&mut self.out, b"\n");
            }
        }
        if entry.help.is_none() && tokens.is_none() {
            emit(&mut self.out, NO_HELP);
        }
    }

    // ── Completion ────────────────────────────────────────────────────────────

    /// TAB at end of line.
    fn complete(&mut self) {
        let mut reprompt = false;
        if self.line.cursor() == 0 {
            // Empty line: list every top-level command.
            emit(&mut self.out, b"\n");
            for token in self.levels[0] {
                emit(&mut self.out, INDENT);
                emit(&mut self.out, self.dict.display(token.id).as_bytes());
                emit(&mut self.out, b"\n");
            }
            reprompt = true;
        } else if self.line.byte_before_cursor() != Some(b' ') {
            // Complete the word under the cursor against what the
            // preceding words allow.
            let Ok(words) = split::split(self.line.bytes_mut()) else {
                return;
            };
            if words.is_empty() {
                return;
            }
            let starts = words.starts();
            let level = self.levels[self.depth];
            let walk = tokenize(
                &self.line,
                &starts[..starts.len() - 1],
                level,
                &self.dict,
                &mut self.parsed,
                true,
            );
            if let Ok(completion) = walk {
                if let Some(tokens) = completion.tokens {
                    reprompt = self.complete_word(tokens, starts[starts.len() - 1]);
                }
            }
        } else {
            // Cursor after a space: show what may come next.
            let Ok(words) = split::split(self.line.bytes_mut()) else {
                return;
            };
            if words.is_empty() {
                return;
            }
            let level = self.levels[self.depth];
            let walk = tokenize(
                &self.line,
                words.starts(),
                level,
                &self.dict,
                &mut self.parsed,
                true,
            );
            if let Ok(completion) = walk {
                match completion.arg {
                    ArgKind::Int => {
                        emit(&mut self.out, b"   \n<integer>\n");
                        reprompt = true;
                    }
                    ArgKind::Float => {
                        emit(&mut self.out, b"   \n<float>\n");
                        reprompt = true;
                    }
                    ArgKind::Str => {
                        emit(&mut self.out, b"   \n<string>\n");
                        reprompt = true;
                    }
                    _ => {
                        if let Some(tokens) = completion.tokens {
                            emit(&mut self.out, b"\n");
                            for token in tokens {
                                emit(&mut self.out, INDENT);
                                emit(&mut self.out, self.dict.display(token.id).as_bytes());
                                emit(&mut self.out, b"\n");
                                reprompt = true;
                            }
                        }
                    }
                }
            }
        }
        split::unsplit(self.line.bytes_mut());
        if reprompt {
            emit(&mut self.out, self.prompt.as_bytes());
            emit(&mut self.out, self.line.as_bytes());
        }
    }

    /// Complete the partial word starting at `partial_start` against
    /// `tokens`. A unique match is typed into the line; several matches
    /// are listed. Returns whether a fresh prompt is needed.
    fn complete_word(&mut self, tokens: &'g [TokenEntry<'g>], partial_start: usize) -> bool {
        let mut word = [0u8; MAX_LINE];
        let partial = self.line.word_at(partial_start);
        let word_len = partial.len();
        word[..word_len].copy_from_slice(partial);
        let partial = &word[..word_len];

        let mut matched: Option<&'g str> = None;
        let mut multiple = false;
        for token in tokens {
            let name = self.dict.display(token.id);
            if name.as_bytes().starts_with(partial) {
                if let Some(prev) = matched {
                    // A second match: list the one before it.
                    multiple = true;
                    emit(&mut self.out, b"\n");
                    emit(&mut self.out, INDENT);
                    emit(&mut self.out, prev.as_bytes());
                }
                matched = Some(name);
            }
        }
        match matched {
            None => false,
            Some(name) if multiple => {
                emit(&mut self.out, b"\n");
                emit(&mut self.out, INDENT);
                emit(&mut self.out, name.as_bytes());
                emit(&mut self.out, b"\n");
                true
            }
            Some(name) => {
                // Unique: type the missing suffix and a separator.
                for &b in &name.as_bytes()[word_len..] {
                    self.add_char(b);
                }
                self.add_char(b' ');
                false
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
