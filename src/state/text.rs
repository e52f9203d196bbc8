//! Rendering helpers for stored message templates.

/// Marker token operators put into stored templates to force a line break.
pub const NEWLINE_TOKEN: &str = "%NEWLINE%";

/// Placeholder substituted with the remaining minutes in timer broadcasts.
pub const TIME_TOKEN: &str = "%TIME%";

/// Translate `&`-prefixed color markup into the section-sign form clients
/// understand. Applied at read time so the stored value stays portable.
pub fn colorize(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '&'
            && chars
                .peek()
                .is_some_and(|next| "0123456789abcdefklmnor".contains(*next))
        {
            out.push('\u{00a7}');
        } else {
            out.push(c);
        }
    }
    out
}

/// Render a stored template for delivery: color translation plus line-break
/// expansion.
pub fn render(input: &str) -> String {
    colorize(&input.replace(NEWLINE_TOKEN, "\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translates_color_codes() {
        assert_eq!(colorize("&cAlert"), "\u{00a7}cAlert");
        assert_eq!(colorize("&6a &ab &rc"), "\u{00a7}6a \u{00a7}ab \u{00a7}rc");
    }

    #[test]
    fn leaves_non_markup_ampersands_alone() {
        assert_eq!(colorize("you & me"), "you & me");
        assert_eq!(colorize("&&c"), "&\u{00a7}c");
        assert_eq!(colorize("trailing &"), "trailing &");
    }

    #[test]
    fn render_expands_newline_marker() {
        assert_eq!(render("&cline1%NEWLINE%line2"), "\u{00a7}cline1\nline2");
    }
}
