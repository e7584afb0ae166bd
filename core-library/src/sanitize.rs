//! Display-text sanitization.
//!
//! Every string that can reach a chat message goes through [`sanitize_text`]:
//! HTML-significant characters are escaped, ASCII control characters are
//! dropped and the result is capped at [`MAX_TEXT_LEN`] characters.
//!
//! Escapes already present in the input are kept as they are, which makes the
//! function idempotent: `sanitize_text(&sanitize_text(s)) == sanitize_text(s)`.

/// Upper bound on sanitized text, in characters (one chat message).
pub const MAX_TEXT_LEN: usize = 4096;

/// Entities produced by this module.
const ENTITIES: &[&str] = &["&amp;", "&lt;", "&gt;", "&quot;", "&#x27;"];

pub fn sanitize_text(input: &str) -> String {
    let mut out = String::with_capacity(input.len().min(MAX_TEXT_LEN));
    let mut len = 0usize;
    let mut rest = input;

    while let Some(ch) = rest.chars().next() {
        let (token, consumed): (&str, usize) = match ch {
            '&' => match ENTITIES.iter().find(|e| rest.starts_with(**e)) {
                Some(entity) => (*entity, entity.len()),
                None => ("&amp;", 1),
            },
            '<' => ("&lt;", 1),
            '>' => ("&gt;", 1),
            '"' => ("&quot;", 1),
            '\'' => ("&#x27;", 1),
            c if is_stripped_control(c) => ("", c.len_utf8()),
            c => (&rest[..c.len_utf8()], c.len_utf8()),
        };
        rest = &rest[consumed..];

        // Entities count as a unit so truncation never splits one.
        let token_len = token.chars().count();
        if len + token_len > MAX_TEXT_LEN {
            break;
        }
        out.push_str(token);
        len += token_len;
    }

    out
}

fn is_stripped_control(c: char) -> bool {
    matches!(c, '\u{00}'..='\u{1F}' | '\u{7F}')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escapes_markup() {
        assert_eq!(sanitize_text("<script>&"), "&lt;script&gt;&amp;");
        assert_eq!(
            sanitize_text(r#"Say "hi" it's"#),
            "Say &quot;hi&quot; it&#x27;s"
        );
    }

    #[test]
    fn test_strips_control_characters() {
        assert_eq!(sanitize_text("a\u{0}b\tc\nd\u{7f}e"), "abcde");
    }

    #[test]
    fn test_keeps_unicode() {
        assert_eq!(sanitize_text("Beyoncé – 夜に駆ける"), "Beyoncé – 夜に駆ける");
    }

    #[test]
    fn test_idempotent() {
        let samples = [
            "<script>&",
            "Tom & Jerry's \"Theme\"",
            "&amp;&lt;already&gt;",
            "&bogus; & &#x27",
            "plain",
        ];
        for sample in samples {
            let once = sanitize_text(sample);
            assert_eq!(sanitize_text(&once), once, "sample: {sample}");
        }
    }

    #[test]
    fn test_caps_length_without_splitting_entities() {
        let long = "a".repeat(MAX_TEXT_LEN - 2) + "&&";
        let out = sanitize_text(&long);

        assert_eq!(out.chars().count(), MAX_TEXT_LEN - 2);
        assert!(!out.ends_with('&'));
        assert_eq!(sanitize_text(&out), out);

        let huge = "é".repeat(MAX_TEXT_LEN * 2);
        assert_eq!(sanitize_text(&huge).chars().count(), MAX_TEXT_LEN);
    }

    #[test]
    fn test_empty_stays_empty() {
        assert_eq!(sanitize_text(""), "");
    }
}
