//! Response framing and echo filtering.
//!
//! Turns a raw accumulated burst into discrete response lines, and removes
//! the device's echoed copy of the last sent command when asked.

/// Line terminator appended to outgoing commands.
pub const LINE_TERMINATOR: &str = if cfg!(windows) { "\r\n" } else { "\n" };

/// Frame a raw byte accumulation into ordered response lines.
///
/// The burst is decoded lossily as UTF-8, surrounding whitespace is trimmed,
/// and the text is split on newlines. Each fragment sheds one trailing
/// carriage return so CRLF-speaking devices frame identically on every
/// platform. Empty fragments are dropped; order is preserved.
pub fn frame_lines(raw: &[u8]) -> Vec<String> {
    let text = String::from_utf8_lossy(raw);
    text.trim()
        .split('\n')
        .map(|fragment| fragment.strip_suffix('\r').unwrap_or(fragment))
        .filter(|fragment| !fragment.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Remove the first exact occurrence of `command` from `lines`.
///
/// At most one occurrence is removed; when none matches, the lines come back
/// unchanged. The remainder keeps its original order and is contiguously
/// re-indexed by construction.
pub fn strip_echo(mut lines: Vec<String>, command: &str) -> Vec<String> {
    if let Some(index) = lines.iter().position(|line| line == command) {
        lines.remove(index);
    }
    lines
}
