use std::io::Write;

use crossterm::{queue, style};

/// Print a menu item, bolding the key inside `[...]` and dimming the rest.
pub fn print_menu_item<W: Write>(out: &mut W, item: &str) -> anyhow::Result<()> {
    let mut rest = item;
    while let Some(open) = rest.find('[') {
        let Some(close) = rest[open..].find(']').map(|c| open + c) else {
            break;
        };
        print_dim(out, &rest[..open])?;
        queue!(
            out,
            style::SetAttribute(style::Attribute::Bold),
            style::Print(&rest[open..=close]),
            style::SetAttribute(style::Attribute::Reset),
        )?;
        rest = &rest[close + 1..];
    }
    print_dim(out, rest)
}

fn print_dim<W: Write>(out: &mut W, text: &str) -> anyhow::Result<()> {
    if !text.is_empty() {
        queue!(
            out,
            style::SetAttribute(style::Attribute::Dim),
            style::Print(text),
            style::SetAttribute(style::Attribute::Reset),
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strip_ansi(bytes: &[u8]) -> String {
        let text = String::from_utf8_lossy(bytes);
        let mut out = String::new();
        let mut chars = text.chars();
        while let Some(c) = chars.next() {
            if c == '\x1b' {
                // CSI sequences end with an ASCII letter.
                for c in chars.by_ref() {
                    if c.is_ascii_alphabetic() {
                        break;
                    }
                }
            } else {
                out.push(c);
            }
        }
        out
    }

    #[test]
    fn keeps_text_and_brackets() {
        let mut buf = Vec::new();
        print_menu_item(&mut buf, "[F5] run [q] quit").unwrap();
        assert_eq!(strip_ansi(&buf), "[F5] run [q] quit");
    }

    #[test]
    fn unclosed_bracket_is_printed_verbatim() {
        let mut buf = Vec::new();
        print_menu_item(&mut buf, "loop [x").unwrap();
        assert_eq!(strip_ansi(&buf), "loop [x");
    }
}
