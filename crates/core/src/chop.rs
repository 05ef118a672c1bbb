//! Line neutralization.
//!
//! A chopped line keeps its position and its tab depth, loses its annotation
//! sigils and gains a marker comment, so the verifier ignores it and every
//! other line keeps its number.

use crate::{MinifyError, Result};

/// Sigil that opens an annotation inside a line comment.
pub const ANNOTATION_SIGIL: char = '@';

/// Replacement for [`ANNOTATION_SIGIL`]; never opens an annotation.
pub const NEUTRAL_SIGIL: char = '#';

/// Tag prepended to every chopped line.
pub const CHOP_MARKER: &str = "//chop! ";

const INDENT: char = '\t';

/// Neutralize a single line's text.
pub fn chop_text(text: &str) -> String {
    let depth = text.chars().filter(|c| *c == INDENT).count();
    let body: String = text
        .chars()
        .filter(|c| *c != INDENT)
        .map(|c| if c == ANNOTATION_SIGIL { NEUTRAL_SIGIL } else { c })
        .collect();

    let mut out = String::with_capacity(depth + CHOP_MARKER.len() + body.len());
    out.extend(std::iter::repeat(INDENT).take(depth));
    out.push_str(CHOP_MARKER);
    out.push_str(&body);
    out
}

/// Return `content` with line `index` chopped. All other bytes are kept.
pub fn chop(content: &str, index: usize) -> Result<String> {
    let mut lines: Vec<&str> = content.split('\n').collect();
    let len = lines.len();
    let Some(target) = lines.get(index).copied() else {
        return Err(MinifyError::LineOutOfRange { index, len });
    };

    let chopped = chop_text(target);
    lines[index] = &chopped;
    Ok(lines.join("\n"))
}

/// Number of lines as seen by [`chop`]; a trailing newline counts as a final
/// empty line.
pub fn line_count(content: &str) -> usize {
    content.split('\n').count()
}
