#![forbid(unsafe_code)]

//! Terminal display width of grapheme clusters.
//!
//! Every cluster the scanner produces is measured here, so the rules are kept
//! small and predictable: a cluster is 0, 1 or 2 columns wide.
//!
//! # Example
//! ```
//! use reflow_text::width::{display_width, grapheme_width};
//!
//! assert_eq!(grapheme_width("a"), 1);
//! assert_eq!(grapheme_width("\u{4F60}"), 2);
//! assert_eq!(grapheme_width("e\u{0301}"), 1);
//! assert_eq!(display_width("hi\u{4F60}\u{597D}"), 6);
//! ```

use unicode_normalization::char::is_combining_mark;
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

/// Widest a single cluster can be.
pub const MAX_CLUSTER_WIDTH: usize = 2;

#[inline]
fn ascii_display_width(text: &str) -> usize {
    text.bytes().filter(|b| (0x20..=0x7E).contains(b)).count()
}

#[inline]
fn is_zero_width_codepoint(c: char) -> bool {
    let u = c as u32;
    matches!(u, 0x0000..=0x001F | 0x007F..=0x009F)
        || matches!(u, 0x0300..=0x036F | 0x1AB0..=0x1AFF | 0x1DC0..=0x1DFF | 0x20D0..=0x20FF)
        || matches!(u, 0xFE20..=0xFE2F)
        || matches!(u, 0xFE00..=0xFE0F | 0xE0100..=0xE01EF)
        || matches!(
            u,
            0x00AD
                | 0x034F
                | 0x180E
                | 0x200B
                | 0x200C
                | 0x200D
                | 0x200E
                | 0x200F
                | 0x2060
                | 0xFEFF
        )
        || matches!(u, 0x202A..=0x202E | 0x2066..=0x2069 | 0x206A..=0x206F)
}

/// Clusters requesting emoji presentation (`U+FE0F`) are drawn two columns
/// wide even when the base character is narrow on its own.
#[inline]
fn has_emoji_presentation(grapheme: &str) -> bool {
    grapheme.contains('\u{FE0F}')
}

/// Display width of a single extended grapheme cluster.
///
/// Clusters made only of zero-width code points (controls, combining marks,
/// joiners, variation selectors, bidi controls) measure 0. Clusters with an
/// emoji presentation selector measure 2. Everything else uses the
/// East-Asian-width aware `unicode-width` tables, clamped to
/// [`MAX_CLUSTER_WIDTH`]: text-presentation symbols such as U+2713 stay one
/// column while ZWJ sequences and flags stay two.
#[must_use]
pub fn grapheme_width(grapheme: &str) -> usize {
    if grapheme.is_ascii() {
        return ascii_display_width(grapheme).min(MAX_CLUSTER_WIDTH);
    }
    if grapheme.chars().all(is_zero_width_codepoint) {
        return 0;
    }
    if has_emoji_presentation(grapheme) {
        return MAX_CLUSTER_WIDTH;
    }
    grapheme.width().min(MAX_CLUSTER_WIDTH)
}

/// Display width of a string, summed cluster by cluster.
///
/// The string must not contain ANSI escape sequences; the wrapper strips
/// those out of its accounting before it ever measures anything.
#[must_use]
pub fn display_width(text: &str) -> usize {
    if text.bytes().all(|b| (0x20..=0x7E).contains(&b)) {
        return text.len();
    }
    text.graphemes(true).map(grapheme_width).sum()
}

/// Whether a cluster is plausible to hyphenate next to.
///
/// True when the cluster's first code point is a letter, a number or a
/// combining mark.
#[must_use]
pub fn is_wordy(grapheme: &str) -> bool {
    grapheme
        .chars()
        .next()
        .is_some_and(|c| c.is_alphanumeric() || is_combining_mark(c))
}
