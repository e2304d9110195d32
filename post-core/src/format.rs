//! Number formatting and word assembly shared by every dialect.

/// Format `value` with `decimals` fixed digits, then drop trailing zeros and
/// a dangling decimal point.
///
/// `1.5` at 3 decimals gives `"1.5"`, `2.0` gives `"2"`, and values that
/// round to zero never come out as `"-0"`.
pub fn format_number(value: f64, decimals: usize) -> String {
    let mut text = format!("{:.*}", decimals, value);
    if text.contains('.') {
        let trimmed = text.trim_end_matches('0').trim_end_matches('.').len();
        text.truncate(trimmed);
    }
    if text == "-0" {
        text.remove(0);
    }
    text
}

/// Accumulates the fragments of one block and joins the non-empty ones with
/// the dialect separator (`""` when condensed, `" "` otherwise).
#[derive(Debug, Clone)]
pub struct Words<'a> {
    separator: &'a str,
    parts: Vec<String>,
}

impl<'a> Words<'a> {
    pub fn new(separator: &'a str) -> Self {
        Self { separator, parts: Vec::new() }
    }

    /// Push a fragment; empty fragments (suppressed modal words) are skipped.
    pub fn push(&mut self, fragment: impl Into<String>) -> &mut Self {
        let fragment = fragment.into();
        if !fragment.is_empty() {
            self.parts.push(fragment);
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    pub fn finish(&self) -> String {
        self.parts.join(self.separator)
    }
}
