//! Utilities for sanitizing error messages and user input.
//!
//! Removes control characters from anything echoed back to callers or written
//! to the history store, and bounds its length.

/// Sanitizes an error message by removing control characters.
///
/// Control characters (0x00-0x1F, except newline/tab/carriage return) can cause
/// issues when stored in databases or displayed in logs.
pub fn sanitize_error_message(message: &str) -> String {
    message
        .chars()
        .filter(|c| {
            let code = *c as u32;
            code >= 0x20 // Printable ASCII starts at 0x20 (space)
                || code == 0x09 // Tab
                || code == 0x0A // Newline
                || code == 0x0D // Carriage return
        })
        .filter(|c| *c != '\u{7f}')
        .collect()
}

/// Sanitizes and truncates an error message to `MAX_ERROR_MESSAGE_LENGTH`.
///
/// Truncation happens on a character boundary and appends a note with the
/// original length.
pub fn sanitize_and_truncate_error_message(message: &str) -> String {
    let sanitized = sanitize_error_message(message);
    let max = crate::config::MAX_ERROR_MESSAGE_LENGTH;

    let char_count = sanitized.chars().count();
    if char_count > max {
        let keep = max.saturating_sub(50);
        let truncated: String = sanitized.chars().take(keep).collect();
        format!(
            "{}... (truncated, original length: {} chars)",
            truncated, char_count
        )
    } else {
        sanitized
    }
}

/// Strips control characters from user input and trims surrounding whitespace.
///
/// Interior whitespace is kept so the caller can reject it explicitly.
pub fn strip_control_chars(input: &str) -> String {
    input
        .chars()
        .filter(|c| !c.is_control())
        .collect::<String>()
        .trim()
        .to_string()
}
