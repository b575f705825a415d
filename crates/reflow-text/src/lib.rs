#![forbid(unsafe_code)]

//! Visual-width-aware line wrapping.
//!
//! This crate reflows text to a column limit the way a terminal would show
//! it:
//! - widths are measured per grapheme cluster (CJK and emoji take two
//!   columns, combining marks none),
//! - ANSI CSI sequences pass through untouched and take no room,
//! - tabs expand to the next tab stop,
//! - U+00A0 never breaks and keeps its word from being split.
//!
//! Alongside the wrapped text, every output line gets a [`WrappedString`]
//! record pointing back into the source.
//!
//! # Example
//! ```
//! use reflow_text::{WrapOptions, wrap, wrap_with_options};
//!
//! let (text, seq) = wrap("Hello world!\nbye", 8, 4, true).unwrap();
//! assert_eq!(text, "Hello\nworld!\nbye");
//! assert!(seq.lines[1].is_hard_break);
//! assert_eq!(seq.lines[2].orig_line_num, 2);
//!
//! // Split long words with a hyphen.
//! let opts = WrapOptions::new(6).split_words(true);
//! let (text, _) = wrap_with_options("wrapping", &opts).unwrap();
//! assert_eq!(text, "wrapp-\ning");
//!
//! // Limits below two columns are rejected.
//! assert!(wrap("text", 1, 4, true).is_err());
//! ```

pub mod scan;
pub mod seq;
mod state;
pub mod width;
pub mod wrap;

pub use scan::{Scanner, Token, Whitespace};
pub use seq::{LineOffset, WrappedString, WrappedStringSeq};
pub use width::{display_width, grapheme_width};
pub use wrap::{MIN_LIMIT, WrapError, WrapOptions, wrap, wrap_split, wrap_with_options};
