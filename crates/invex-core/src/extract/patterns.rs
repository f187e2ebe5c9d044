//! Common regex patterns for line-item extraction.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Row-major table line: number, description, DD/MM/YYYY, qty, rate, amount
    pub static ref HORIZONTAL_ROW: Regex = Regex::new(
        r"^\d+\s+(.+?)\s+\d{2}/\d{2}/\d{4}\s+(\d+)\s+([\d.]+)\s+([\d.]+)"
    ).unwrap();

    // Whole-line integer (quantity cell)
    pub static ref INTEGER_LINE: Regex = Regex::new(r"^[0-9]+$").unwrap();

    // Whole-line two-decimal number (rate or amount cell)
    pub static ref MONEY_LINE: Regex = Regex::new(r"^[0-9]+\.[0-9]{2}$").unwrap();

    // DD/MM/YYYY anywhere in a line
    pub static ref DATE_DMY: Regex = Regex::new(r"\d{2}/\d{2}/\d{4}").unwrap();

    // Medicine form and unit tokens that open a new item
    pub static ref ITEM_TOKEN: Regex = Regex::new(r"(?i)(tab|cap|syp|inj|mg|ml)").unwrap();
}

/// Shape of a single trimmed line, as seen by the column heuristics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineShape {
    /// Only digits.
    Integer,
    /// Digits, a dot, two digits.
    Money,
    /// Anything else.
    Text,
}

impl LineShape {
    pub fn of(line: &str) -> Self {
        if INTEGER_LINE.is_match(line) {
            Self::Integer
        } else if MONEY_LINE.is_match(line) {
            Self::Money
        } else {
            Self::Text
        }
    }
}

/// Trimmed, non-empty lines in source order.
pub fn content_lines(text: &str) -> impl Iterator<Item = &str> {
    text.lines().map(str::trim).filter(|l| !l.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_shapes() {
        assert_eq!(LineShape::of("10"), LineShape::Integer);
        assert_eq!(LineShape::of("25.00"), LineShape::Money);
        assert_eq!(LineShape::of("25.0"), LineShape::Text);
        assert_eq!(LineShape::of("1,250.00"), LineShape::Text);
        assert_eq!(LineShape::of("Paracetamol"), LineShape::Text);
    }

    #[test]
    fn test_item_token_is_case_insensitive_substring() {
        assert!(ITEM_TOKEN.is_match("PARACETAMOL TAB"));
        assert!(ITEM_TOKEN.is_match("Amoxicillin 250MG"));
        assert!(ITEM_TOKEN.is_match("Cough Syp"));
        assert!(!ITEM_TOKEN.is_match("Consultation fee"));
    }

    #[test]
    fn test_content_lines_skips_blank() {
        let lines: Vec<&str> = content_lines("  a \n\n   \n b").collect();
        assert_eq!(lines, vec!["a", "b"]);
    }
}
