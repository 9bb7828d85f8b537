//! Line classification for chat log lines
//!
//! Every log line is one of: a teleport notice (changes the current land),
//! the header of an owner block (starts a shop listing), or anything else.

use crate::record::UNKNOWN;
use regex::Regex;
use std::sync::LazyLock;

/// Phrase printed by the game after a land teleport
pub const TELEPORT_PHRASE: &str = "Successfully teleported to the spawn of land";

/// Marker for the first line of an owner block
pub const OWNER_MARKER: &str = "[CHAT] Owner:";

/// Game color/format code: section sign plus one hex digit or format letter
pub const COLOR_CODE_PATTERN: &str = r"§[0-9a-fk-or]";

const TELEPORT_PATTERN: &str = r"Successfully teleported to the spawn of land (\S+)";
const OWNER_PATTERN: &str = r"Owner:\s*(.+)";

static COLOR_CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(COLOR_CODE_PATTERN).expect("valid color code regex"));
static TELEPORT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(TELEPORT_PATTERN).expect("valid teleport regex"));
static OWNER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(OWNER_PATTERN).expect("valid owner regex"));

/// Classification of a single log line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind {
    /// Teleport notice; carries the land name with apostrophes removed
    Teleport(String),
    /// Owner block header; carries the trimmed owner name
    OwnerHeader(String),
    /// Anything else
    Other,
}

/// Classify one (already trimmed) log line
///
/// A line containing the teleport phrase is never an owner header. If the
/// land token cannot be extracted the line is `Other` and the current land
/// stays as it was.
pub fn classify(line: &str) -> LineKind {
    if line.contains(TELEPORT_PHRASE) {
        return match teleport_land(line) {
            Some(land) => LineKind::Teleport(land),
            None => LineKind::Other,
        };
    }

    if is_owner_header(line) {
        return LineKind::OwnerHeader(owner_name(line));
    }

    LineKind::Other
}

/// True if the line opens an owner block
pub fn is_owner_header(line: &str) -> bool {
    line.contains(OWNER_MARKER)
}

/// Land token from a teleport notice, apostrophes stripped
pub fn teleport_land(line: &str) -> Option<String> {
    TELEPORT_RE
        .captures(line)
        .map(|caps| caps[1].replace('\'', ""))
}

/// Owner name from a header line, or [`UNKNOWN`]
pub fn owner_name(line: &str) -> String {
    OWNER_RE
        .captures(line)
        .map(|caps| caps[1].trim().to_string())
        .unwrap_or_else(|| UNKNOWN.to_string())
}

/// Remove all color/format codes from `text`
pub fn strip_color_codes(text: &str) -> String {
    COLOR_CODE_RE.replace_all(text, "").into_owned()
}
