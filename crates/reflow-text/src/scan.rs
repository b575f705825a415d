#![forbid(unsafe_code)]

//! Token scanner.
//!
//! Walks the source left to right and classifies every position. The first
//! matching rule wins:
//!
//! 1. an ANSI CSI sequence (`ESC [ <params> <letter>`),
//! 2. a non-breaking space (U+00A0),
//! 3. white space (space, tab, newline, or any other Unicode white space),
//! 4. an extended grapheme cluster.
//!
//! Each cluster is segmented starting at the current position, so an escape
//! sequence in front of it never influences where the cluster ends.
//!
//! # Example
//! ```
//! use reflow_text::scan::{Scanner, Token, Whitespace};
//!
//! let tokens: Vec<_> = Scanner::new("\x1b[1mhi\tyo").map(|s| s.token).collect();
//! assert_eq!(tokens[0], Token::Ansi("\x1b[1m"));
//! assert_eq!(tokens[3], Token::Whitespace(Whitespace::Tab));
//! ```

use std::ops::Range;

use unicode_segmentation::UnicodeSegmentation;

use crate::width::grapheme_width;

/// Non-breaking space.
pub const NBSP: char = '\u{00A0}';

const ESC: u8 = 0x1b;

/// White space kinds the wrapper reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Whitespace {
    /// `' '`
    Space,
    /// `'\t'`, expanded to the next tab stop.
    Tab,
    /// `'\n'`, a hard break.
    Newline,
    /// Any other white space code point (`'\r'`, form feed, U+2003, ...).
    /// Ends a word but is never written to the output.
    Other(char),
}

impl Whitespace {
    fn classify(c: char) -> Option<Self> {
        match c {
            ' ' => Some(Self::Space),
            '\t' => Some(Self::Tab),
            '\n' => Some(Self::Newline),
            c if c.is_whitespace() => Some(Self::Other(c)),
            _ => None,
        }
    }
}

/// A classified piece of the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    /// A complete CSI escape sequence, copied through verbatim.
    Ansi(&'a str),
    /// U+00A0; one column wide and never a break point.
    Nbsp,
    /// A break point.
    Whitespace(Whitespace),
    /// One extended grapheme cluster and its display width.
    Cluster { text: &'a str, width: usize },
}

impl Token<'_> {
    /// Display width contributed to a word; zero for everything but clusters
    /// and non-breaking spaces.
    #[must_use]
    pub fn width(&self) -> usize {
        match self {
            Token::Nbsp => 1,
            Token::Cluster { width, .. } => *width,
            Token::Ansi(_) | Token::Whitespace(_) => 0,
        }
    }
}

/// A token together with the byte range it occupies in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spanned<'a> {
    pub token: Token<'a>,
    pub range: Range<usize>,
}

/// Length in bytes of the CSI sequence at the start of `text`, if any.
///
/// Accepts `ESC '['`, any number of parameter bytes (`0x30..=0x3F`, which
/// covers digits, `;`, `:` and the private markers `<=>?`), and a final ASCII
/// letter. Anything else is not an escape sequence as far as wrapping is
/// concerned.
#[must_use]
pub fn csi_len(text: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    if bytes.len() < 3 || bytes[0] != ESC || bytes[1] != b'[' {
        return None;
    }
    let params = bytes[2..]
        .iter()
        .take_while(|b| (0x30..=0x3F).contains(*b))
        .count();
    let last = 2 + params;
    match bytes.get(last) {
        Some(b) if b.is_ascii_alphabetic() => Some(last + 1),
        _ => None,
    }
}

/// Iterator over the tokens of a source string.
#[derive(Debug, Clone)]
pub struct Scanner<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    #[must_use]
    pub fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }
}

impl<'a> Iterator for Scanner<'a> {
    type Item = Spanned<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let rest = &self.text[self.pos..];
        let c = rest.chars().next()?;
        let start = self.pos;

        let (token, len) = if let Some(len) = csi_len(rest) {
            (Token::Ansi(&rest[..len]), len)
        } else if c == NBSP {
            (Token::Nbsp, c.len_utf8())
        } else if let Some(ws) = Whitespace::classify(c) {
            (Token::Whitespace(ws), c.len_utf8())
        } else {
            let cluster = rest.graphemes(true).next().unwrap_or(&rest[..c.len_utf8()]);
            let token = Token::Cluster {
                text: cluster,
                width: grapheme_width(cluster),
            };
            (token, cluster.len())
        };

        self.pos += len;
        Some(Spanned {
            token,
            range: start..self.pos,
        })
    }
}
