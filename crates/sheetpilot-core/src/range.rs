//! A1-style cell addressing.
//!
//! Cell references are column letters followed by a 1-indexed row number
//! (`B5`, `AA1`). Internally every coordinate is 0-indexed; the conversion
//! happens only here so the write pipeline and the highlight lookup agree.

use std::fmt;

/// A single cell position, 0-indexed on both axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellRef {
    /// 0-indexed row (`"B5"` has row 4).
    pub row: u32,
    /// 0-indexed column (`"B5"` has column 1).
    pub col: u32,
}

impl CellRef {
    #[must_use]
    pub const fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }

    /// Renders the reference back into A1 notation.
    #[must_use]
    pub fn to_a1(self) -> String {
        format!("{}{}", column_letters(self.col), u64::from(self.row) + 1)
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_a1())
    }
}

/// Parses a single-cell reference such as `"B5"` or `"aa10"`.
///
/// Letters are read as a bijective base-26 numeral (`A` = 1, `Z` = 26,
/// `AA` = 27) and digits as a 1-indexed row. Returns `None` for anything
/// else: missing letters or digits, a zero row, trailing characters,
/// whitespace, or values that overflow.
#[must_use]
pub fn parse_cell_ref(reference: &str) -> Option<CellRef> {
    let split = reference
        .find(|c: char| !c.is_ascii_alphabetic())
        .unwrap_or(reference.len());
    let (letters, digits) = reference.split_at(split);

    if letters.is_empty() || digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let mut column: u32 = 0;
    for byte in letters.bytes() {
        let value = u32::from(byte.to_ascii_uppercase() - b'A' + 1);
        column = column.checked_mul(26)?.checked_add(value)?;
    }

    let row: u32 = digits.parse().ok()?;
    if row == 0 {
        return None;
    }

    Some(CellRef {
        row: row - 1,
        col: column - 1,
    })
}

/// Converts a 0-indexed column into its letters (0 = `A`, 26 = `AA`).
#[must_use]
pub fn column_letters(col: u32) -> String {
    let mut letters = Vec::new();
    let mut n = u64::from(col) + 1;
    while n > 0 {
        let remainder = (n - 1) % 26;
        // remainder < 26
        letters.push(b'A' + u8::try_from(remainder).unwrap_or(0));
        n = (n - 1) / 26;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

/// Quotes a tab name for use in an A1 range (`'Q3 Plan'`).
#[must_use]
pub fn quote_tab(tab: &str) -> String {
    format!("'{}'", tab.replace('\'', "''"))
}

/// Builds a tab-qualified range such as `'Pipeline'!B5` or `'Receipts'!A:A`.
#[must_use]
pub fn qualified_range(tab: &str, range: &str) -> String {
    format!("{}!{range}", quote_tab(tab))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cell_ref_single_letter() {
        assert_eq!(parse_cell_ref("B5"), Some(CellRef::new(4, 1)));
        assert_eq!(parse_cell_ref("A1"), Some(CellRef::new(0, 0)));
        assert_eq!(parse_cell_ref("Z1"), Some(CellRef::new(0, 25)));
    }

    #[test]
    fn test_parse_cell_ref_multi_letter_columns() {
        assert_eq!(parse_cell_ref("AA1"), Some(CellRef::new(0, 26)));
        assert_eq!(parse_cell_ref("AZ3"), Some(CellRef::new(2, 51)));
        assert_eq!(parse_cell_ref("BA3"), Some(CellRef::new(2, 52)));
    }

    #[test]
    fn test_parse_cell_ref_is_case_insensitive() {
        assert_eq!(parse_cell_ref("b5"), parse_cell_ref("B5"));
        assert_eq!(parse_cell_ref("aA12"), Some(CellRef::new(11, 26)));
    }

    #[test]
    fn test_parse_cell_ref_rejects_malformed_input() {
        for input in [
            "", "5B", "B", "5", "B5C", "B-5", " B5", "B5 ", "B0", "A1:B2", "Sheet!A1", "É5",
        ] {
            assert_eq!(parse_cell_ref(input), None, "input: {input:?}");
        }
    }

    #[test]
    fn test_parse_cell_ref_rejects_overflowing_values() {
        assert_eq!(parse_cell_ref("A99999999999"), None);
        assert_eq!(parse_cell_ref("ZZZZZZZZZZZZ1"), None);
    }

    #[test]
    fn test_column_letters_matches_parse() {
        for col in [0, 1, 25, 26, 27, 51, 52, 701, 702, 16_383] {
            let reference = format!("{}7", column_letters(col));
            assert_eq!(parse_cell_ref(&reference), Some(CellRef::new(6, col)));
        }
    }

    #[test]
    fn test_cell_ref_to_a1_reconstructs_reference() {
        assert_eq!(CellRef::new(4, 1).to_a1(), "B5");
        assert_eq!(CellRef::new(0, 26).to_string(), "AA1");
    }

    #[test]
    fn test_qualified_range_escapes_quotes() {
        assert_eq!(qualified_range("Pipeline", "B5"), "'Pipeline'!B5");
        assert_eq!(qualified_range("Bob's Tab", "A:A"), "'Bob''s Tab'!A:A");
    }
}
