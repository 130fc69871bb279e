use std::borrow::Cow;

const ESC: char = '\x1b';
const BEL: char = '\x07';

fn is_stripped_control(c: char) -> bool {
    c == '\x7f' || (c.is_ascii_control() && !matches!(c, '\t' | '\n' | '\r'))
}

/// Removes terminal control characters and ANSI escape sequences.
///
/// Feed text ends up in log lines and the plain-text artifact, so anything
/// that could move the cursor or retitle a terminal is dropped. Tab, LF and
/// CR survive. CSI sequences (`ESC [` .. final byte in `@`..=`~`) and OSC
/// sequences (`ESC ]` .. BEL or `ESC \`) are removed whole.
///
/// Borrows when there is nothing to strip.
pub fn strip_control_chars(s: &str) -> Cow<'_, str> {
    if !s.chars().any(is_stripped_control) {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c == ESC {
            match chars.peek() {
                Some('[') => {
                    chars.next();
                    for c in chars.by_ref() {
                        if ('@'..='~').contains(&c) {
                            break;
                        }
                    }
                }
                Some(']') => {
                    chars.next();
                    while let Some(c) = chars.next() {
                        if c == BEL {
                            break;
                        }
                        if c == ESC && chars.peek() == Some(&'\\') {
                            chars.next();
                            break;
                        }
                    }
                }
                _ => {}
            }
        } else if !is_stripped_control(c) {
            out.push(c);
        }
    }

    Cow::Owned(out)
}

/// Strips control characters and surrounding whitespace.
pub fn clean_text(s: &str) -> String {
    strip_control_chars(s).trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_text_borrows() {
        let input = "Markets rally, bonds slip";
        assert!(matches!(strip_control_chars(input), Cow::Borrowed(_)));
    }

    #[test]
    fn test_keeps_tabs_and_newlines() {
        let input = "line1\nline2\tcol\r\n";
        assert_eq!(strip_control_chars(input), input);
    }

    #[test]
    fn test_removes_c0_controls_and_del() {
        assert_eq!(strip_control_chars("he\x00ll\x07o\x7f!"), "hello!");
    }

    #[test]
    fn test_removes_ansi_sequences() {
        assert_eq!(strip_control_chars("\x1b[1;31mAlert\x1b[0m"), "Alert");
        assert_eq!(strip_control_chars("\x1b]0;pwned\x07Title"), "Title");
        assert_eq!(strip_control_chars("\x1b]0;pwned\x1b\\Title"), "Title");
        assert_eq!(strip_control_chars("bare\x1bescape"), "bareescape");
    }

    #[test]
    fn test_unicode_survives() {
        assert_eq!(strip_control_chars("Zürich \x1b[32m日本\x1b[0m"), "Zürich 日本");
    }

    #[test]
    fn test_clean_text_trims() {
        assert_eq!(clean_text("  \x00 Headline \n"), "Headline");
        assert_eq!(clean_text(""), "");
    }
}
