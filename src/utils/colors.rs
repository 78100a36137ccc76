/// ANSI color helper utilities for terminal output.
pub const RESET: &str = "\x1b[0m";

pub const GREY: &str = "\x1b[90m";

/// Paint `value` with a `#rrggbb` tag color (truecolor terminals); anything
/// else is returned unchanged.
pub fn paint_hex(value: &str, hex: &str) -> String {
    match parse_hex(hex) {
        Some((r, g, b)) => format!("\x1b[38;2;{r};{g};{b}m{value}{RESET}"),
        None => value.to_string(),
    }
}

fn parse_hex(hex: &str) -> Option<(u8, u8, u8)> {
    let h = hex.strip_prefix('#')?;
    if h.len() != 6 {
        return None;
    }
    let r = u8::from_str_radix(&h[0..2], 16).ok()?;
    let g = u8::from_str_radix(&h[2..4], 16).ok()?;
    let b = u8::from_str_radix(&h[4..6], 16).ok()?;
    Some((r, g, b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paint_hex_ignores_bad_colors() {
        assert_eq!(paint_hex("x", "blue"), "x");
        assert_eq!(paint_hex("x", "#00ff00"), "\x1b[38;2;0;255;0mx\x1b[0m");
    }
}
