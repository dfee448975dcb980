//! Word splitter — destructive, in-place partitioning of the line into
//! NUL-terminated words, and the inverse that restores the editable
//! line.
//!
//! No bytes move and nothing is copied: each word terminator (the space
//! after an unquoted word, the closing quote of a quoted one) is
//! overwritten with NUL, and the word start offsets are recorded in a
//! fixed [`Words`] table. A quoted word starts at the byte after its
//! opening quote; the opening quote itself stays in the buffer, which is
//! what lets [`unsplit`] tell a closed quote span from a plain space.
//!
//! On any error the buffer is restored before returning, so the caller
//! always gets back an editable line.

use core::fmt;

use crate::MAX_WORDS;

// ── SplitError ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitError {
    /// The line ended inside a `"…` span.
    UnmatchedQuote,
    /// The word count reached [`MAX_WORDS`].
    TooManyWords,
}

impl fmt::Display for SplitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SplitError::UnmatchedQuote => write!(f, "Unmatched quote."),
            SplitError::TooManyWords => write!(f, "Too many words."),
        }
    }
}

impl std::error::Error for SplitError {}

// ── Words ─────────────────────────────────────────────────────────────────────

/// Start offsets of the words carved out of the line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Words {
    starts: [usize; MAX_WORDS],
    count: usize,
}

impl Words {
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// The recorded start offsets, in line order.
    pub fn starts(&self) -> &[usize] {
        &self.starts[..self.count]
    }
}

// ── split ─────────────────────────────────────────────────────────────────────

/// Partition `buf` into NUL-terminated words.
///
/// Outside a word, spaces are skipped. An unquoted word runs to the next
/// space; a word opened by `"` runs to the matching quote and may
/// contain spaces. On error the buffer is restored via [`unsplit`] and
/// no word table is returned.
pub fn split(buf: &mut [u8]) -> Result<Words, SplitError> {
    let mut words = Words {
        starts: [0; MAX_WORDS],
        count: 0,
    };
    let mut quoted = false;
    let mut in_word = false;
    let mut i = 0;
    while i < buf.len() && words.count < MAX_WORDS {
        let b = buf[i];
        if !in_word {
            // Looking for a new word.
            if b != b' ' {
                if b == b'"' {
                    quoted = true;
                }
                words.starts[words.count] = i + usize::from(quoted);
                words.count += 1;
                in_word = true;
            }
        } else if quoted && b == b'"' {
            quoted = false;
            buf[i] = 0;
            in_word = false;
        } else if !quoted && b == b' ' {
            buf[i] = 0;
            in_word = false;
        }
        i += 1;
    }
    if quoted {
        unsplit(buf);
        return Err(SplitError::UnmatchedQuote);
    }
    if words.count == MAX_WORDS {
        unsplit(buf);
        return Err(SplitError::TooManyWords);
    }
    Ok(words)
}

// ── unsplit ───────────────────────────────────────────────────────────────────

/// Restore a split buffer to a single editable line.
///
/// Each interior NUL becomes the closing quote of the span opened by the
/// most recent `"` still pending, or a space otherwise. Inverse of
/// [`split`] for any well-quoted line it accepted.
pub fn unsplit(buf: &mut [u8]) {
    let mut quoted = false;
    for b in buf.iter_mut() {
        if *b == b'"' {
            quoted = true;
            continue;
        }
        if *b == 0 {
            if quoted {
                *b = b'"';
                quoted = false;
            } else {
                *b = b' ';
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn words_of(buf: &[u8], words: &Words) -> Vec<Vec<u8>> {
        words
            .starts()
            .iter()
            .map(|&s| {
                let end = buf[s..]
                    .iter()
                    .position(|&b| b == 0)
                    .map_or(buf.len(), |n| s + n);
                buf[s..end].to_vec()
            })
            .collect()
    }

    // ── split ─────────────────────────────────────────────────────────────────

    #[test]
    fn splits_on_spaces() {
        let mut buf = b"set rate 100".to_vec();
        let words = split(&mut buf).unwrap();
        assert_eq!(
            words_of(&buf, &words),
            vec![b"set".to_vec(), b"rate".to_vec(), b"100".to_vec()]
        );
    }

    #[test]
    fn skips_runs_of_spaces() {
        let mut buf = b"  show   version ".to_vec();
        let words = split(&mut buf).unwrap();
        assert_eq!(
            words_of(&buf, &words),
            vec![b"show".to_vec(), b"version".to_vec()]
        );
    }

    #[test]
    fn quoted_word_keeps_spaces() {
        let mut buf = b"name \"hi there\"".to_vec();
        let words = split(&mut buf).unwrap();
        assert_eq!(
            words_of(&buf, &words),
            vec![b"name".to_vec(), b"hi there".to_vec()]
        );
    }

    #[test]
    fn empty_quoted_word() {
        let mut buf = b"name \"\"".to_vec();
        let words = split(&mut buf).unwrap();
        assert_eq!(words_of(&buf, &words), vec![b"name".to_vec(), b"".to_vec()]);
    }

    #[test]
    fn all_spaces_yields_no_words() {
        let mut buf = b"    ".to_vec();
        let words = split(&mut buf).unwrap();
        assert!(words.is_empty());
    }

    #[test]
    fn unmatched_quote_restores_and_fails() {
        let mut buf = b"foo \"bar".to_vec();
        assert_eq!(split(&mut buf), Err(SplitError::UnmatchedQuote));
        assert_eq!(buf, b"foo \"bar".to_vec());
    }

    #[test]
    fn too_many_words_restores_and_fails() {
        let line: Vec<u8> = (0..MAX_WORDS)
            .map(|_| "x ")
            .collect::<String>()
            .into_bytes();
        let mut buf = line.clone();
        assert_eq!(split(&mut buf), Err(SplitError::TooManyWords));
        assert_eq!(buf, line);
    }

    #[test]
    fn word_count_just_under_limit_is_accepted() {
        let line: Vec<u8> = (0..MAX_WORDS - 1)
            .map(|_| "x ")
            .collect::<String>()
            .into_bytes();
        let mut buf = line;
        let words = split(&mut buf).unwrap();
        assert_eq!(words.len(), MAX_WORDS - 1);
    }

    // ── unsplit ───────────────────────────────────────────────────────────────

    #[test]
    fn unsplit_inverts_plain_words() {
        let original = b"set rate 100".to_vec();
        let mut buf = original.clone();
        split(&mut buf).unwrap();
        unsplit(&mut buf);
        assert_eq!(buf, original);
    }

    #[test]
    fn unsplit_inverts_quoted_words() {
        let original = b"name \"hi there\" x".to_vec();
        let mut buf = original.clone();
        split(&mut buf).unwrap();
        unsplit(&mut buf);
        assert_eq!(buf, original);
    }

    #[test]
    fn unsplit_inverts_trailing_spaces() {
        let original = b" a  b ".to_vec();
        let mut buf = original.clone();
        split(&mut buf).unwrap();
        unsplit(&mut buf);
        assert_eq!(buf, original);
    }

    // ── Error display ─────────────────────────────────────────────────────────

    #[test]
    fn error_messages() {
        assert_eq!(SplitError::UnmatchedQuote.to_string(), "Unmatched quote.");
        assert_eq!(SplitError::TooManyWords.to_string(), "Too many words.");
    }
}
