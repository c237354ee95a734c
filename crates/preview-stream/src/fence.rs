//! Markdown code-fence removal for display text.

use once_cell::sync::Lazy;
use regex::Regex;

static OPENING_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"```[A-Za-z0-9_+.-]*\n").expect("opening fence pattern"));
static CLOSING_FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"```").expect("closing fence pattern"));

/// Derives display text from accumulated text.
///
/// Removes every opening fence (triple backtick, optional language tag,
/// newline) and then every bare triple backtick, anywhere in the input.
/// Always run against the full accumulated text so a fence split across
/// records is removed once both halves have arrived.
pub fn display_text(accumulated: &str) -> String {
    let without_opening = OPENING_FENCE.replace_all(accumulated, "");
    CLOSING_FENCE.replace_all(&without_opening, "").into_owned()
}
