//! Script-based text direction detection.

use crate::model::Direction;

/// True for characters in the right-to-left script blocks we recognize
/// (Hebrew, Arabic and its supplements, plus the presentation forms).
fn is_rtl_char(c: char) -> bool {
    matches!(
        c,
        '\u{0590}'..='\u{08FF}' | '\u{FB1D}'..='\u{FDFF}' | '\u{FE70}'..='\u{FEFF}'
    )
}

/// Classify an ordered list of text fields (primary field first) by
/// majority script, counted per character across all fields. Returns
/// `fallback` when no classifiable text is present.
pub fn detect<'a, I>(fields: I, fallback: Direction) -> Direction
where
    I: IntoIterator<Item = &'a str>,
{
    let mut rtl = 0usize;
    let mut ltr = 0usize;
    for field in fields {
        for c in field.chars() {
            if is_rtl_char(c) {
                rtl += 1;
            } else if c.is_alphabetic() {
                ltr += 1;
            }
        }
    }
    if rtl == 0 && ltr == 0 {
        fallback
    } else if rtl > ltr {
        Direction::Rtl
    } else {
        Direction::Ltr
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arabic_majority_is_rtl() {
        let direction = detect(["شركة النور للتجارة", "Ltd"], Direction::Ltr);
        assert_eq!(direction, Direction::Rtl);
    }

    #[test]
    fn test_latin_majority_is_ltr() {
        let direction = detect(["Acme Metals Incorporated", "ش"], Direction::Rtl);
        assert_eq!(direction, Direction::Ltr);
    }

    #[test]
    fn test_no_text_uses_fallback() {
        assert_eq!(detect(["", "123 - 456"], Direction::Rtl), Direction::Rtl);
        assert_eq!(detect([], Direction::Ltr), Direction::Ltr);
    }
}
