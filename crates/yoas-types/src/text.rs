/// Canonical form of a reported message text.
///
/// Line breaks become spaces, byte-order marks are dropped and each pair of
/// spaces is folded into one (single pass, so longer runs only shrink).
/// Stored texts and lookup texts both go through this, so a search matches
/// regardless of how the client wrapped the original message.
pub fn normalize_message_text(text: &str) -> String {
    let mapped: String = text
        .chars()
        .filter(|&c| c != '\u{feff}')
        .map(|c| if c == '\n' { ' ' } else { c })
        .collect();
    mapped.replace("  ", " ")
}
