use serde::{Deserialize, Serialize};

use super::Token;

/// What to do with characters that decode to an empty string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlankPolicy {
    /// Blank characters never enter the buffer, so they cannot cause an emission.
    #[default]
    Drop,
    /// Blank characters count as typed: a scan made only of blanks emits `""`.
    Keep,
}

/// Joins decoded characters into one string per scan.
#[derive(Debug, Default)]
pub struct Assembler {
    buffer: String,
    pending: usize,
    blank: BlankPolicy,
}

impl Assembler {
    pub fn new(blank: BlankPolicy) -> Self {
        Assembler {
            buffer: String::new(),
            pending: 0,
            blank,
        }
    }

    /// Feeds one token, returning the finished scan when a terminator closes a
    /// non-empty buffer.
    pub fn feed(&mut self, token: Token<'_>) -> Option<String> {
        match token {
            Token::Char(c) => {
                if !c.is_empty() || self.blank == BlankPolicy::Keep {
                    self.buffer.push_str(c);
                    self.pending += 1;
                }
                None
            }
            Token::ShiftPressed => None,
            Token::Terminator if self.pending == 0 => None,
            Token::Terminator => {
                self.pending = 0;
                Some(std::mem::take(&mut self.buffer))
            }
        }
    }

    /// Drops the in-progress scan without emitting it.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.pending = 0;
    }

    /// Number of characters buffered for the current scan.
    pub fn pending(&self) -> usize {
        self.pending
    }

    pub fn is_empty(&self) -> bool {
        self.pending == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed_all<'a>(assembler: &mut Assembler, tokens: &[Token<'a>]) -> Vec<String> {
        tokens.iter().filter_map(|t| assembler.feed(*t)).collect()
    }

    #[test]
    fn terminator_flushes_and_resets() {
        let mut assembler = Assembler::default();
        let out = feed_all(
            &mut assembler,
            &[Token::Char("a"), Token::Char("b"), Token::Char("c"), Token::Terminator],
        );
        assert_eq!(out, vec!["abc".to_string()]);
        assert!(assembler.is_empty());
    }

    #[test]
    fn lone_terminator_emits_nothing() {
        let mut assembler = Assembler::default();
        assert_eq!(assembler.feed(Token::Terminator), None);
        assert_eq!(assembler.feed(Token::Terminator), None);
    }

    #[test]
    fn shift_does_not_touch_the_buffer() {
        let mut assembler = Assembler::default();
        let out = feed_all(
            &mut assembler,
            &[
                Token::Char("x"),
                Token::ShiftPressed,
                Token::Char("Y"),
                Token::ShiftPressed,
                Token::Terminator,
            ],
        );
        assert_eq!(out, vec!["xY".to_string()]);
    }

    #[test]
    fn consecutive_scans_are_independent() {
        let mut assembler = Assembler::default();
        let out = feed_all(
            &mut assembler,
            &[
                Token::Char("1"),
                Token::Terminator,
                Token::Terminator,
                Token::Char("2"),
                Token::Char("3"),
                Token::Terminator,
            ],
        );
        assert_eq!(out, vec!["1".to_string(), "23".to_string()]);
    }

    #[test]
    fn blanks_are_dropped_by_default() {
        let mut assembler = Assembler::default();
        assert_eq!(assembler.feed(Token::Char("")), None);
        assert_eq!(assembler.pending(), 0);
        assert_eq!(assembler.feed(Token::Terminator), None);
    }

    #[test]
    fn kept_blanks_count_as_characters() {
        let mut assembler = Assembler::new(BlankPolicy::Keep);
        assembler.feed(Token::Char(""));
        assert_eq!(assembler.pending(), 1);
        assert_eq!(assembler.feed(Token::Terminator), Some(String::new()));
    }

    #[test]
    fn reset_discards_partial_scan() {
        let mut assembler = Assembler::default();
        assembler.feed(Token::Char("z"));
        assembler.reset();
        assert_eq!(assembler.feed(Token::Terminator), None);
    }
}
