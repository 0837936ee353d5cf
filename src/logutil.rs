//! Keeps wire payloads readable in logs: one payload, one log line.

const MAX_PREVIEW: usize = 200;

/// Escape control characters (`\n`, `\r`, `\t`, others as `\xNN`) and
/// backslashes, truncating long payloads with an ellipsis.
pub fn wire_preview(s: &str) -> String {
    let mut out = String::with_capacity(s.len().min(MAX_PREVIEW) + 8);
    for (count, ch) in s.chars().enumerate() {
        if count >= MAX_PREVIEW {
            out.push('…');
            break;
        }
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                use std::fmt::Write;
                let _ = write!(&mut out, "\\x{:02X}", c as u32);
            }
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::wire_preview;

    #[test]
    fn multi_line_payload_stays_on_one_line() {
        assert_eq!(
            wire_preview("{\"function\":\n\t\"startup\"}\u{1}"),
            "{\"function\":\\n\\t\"startup\"}\\x01"
        );
    }

    #[test]
    fn long_payload_is_truncated() {
        let long = "x".repeat(500);
        let preview = wire_preview(&long);
        assert_eq!(preview.chars().count(), 201);
        assert!(preview.ends_with('…'));
    }
}
