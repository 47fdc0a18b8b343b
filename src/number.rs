//! Lua numeral lexing. Unlike later Lua versions, this dialect has no
//! integer/float split, every numeral is a `lua_Number` (`f64`), matching
//! `original_source/lparser.c` (`TK_NUMBER` carries a single `lua_Number`).

/// Parse a Lua numeral starting at `text` (already isolated by the lexer).
/// Accepts decimal literals with optional fraction/exponent and `0x`/`0X`
/// hexadecimal integer literals.
pub fn parse_number(text: &str) -> Option<f64> {
    if let Some(hex) = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
    {
        return u64::from_str_radix(hex, 16).ok().map(|v| v as f64);
    }
    text.parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_decimal() {
        assert_eq!(parse_number("123"), Some(123.0));
        assert_eq!(parse_number("3.14"), Some(3.14));
        assert_eq!(parse_number("1e10"), Some(1e10));
        assert_eq!(parse_number(".5"), Some(0.5));
    }

    #[test]
    fn parses_hex() {
        assert_eq!(parse_number("0xff"), Some(255.0));
        assert_eq!(parse_number("0X10"), Some(16.0));
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(parse_number("abc"), None);
    }
}
