use lazy_static::lazy_static;
use regex::Regex;
use std::fmt;
use std::str::FromStr;

lazy_static! {
    static ref RANGE_REGEX: Regex =
        Regex::new(r"^([A-Za-z]+)([0-9]*)(?::([A-Za-z]+)([0-9]*))?$").unwrap();
}

/// Convert a 1-based column index to its letter form (1 = A, 27 = AA)
pub fn col_to_letter(col: u32) -> String {
    let mut col = col;
    let mut result = String::new();
    while col > 0 {
        col -= 1;
        result.push(((col % 26) as u8 + b'A') as char);
        col /= 26;
    }
    result.chars().rev().collect()
}

/// Convert column letters to a 1-based column index
///
/// Returns `None` for an empty string, non-alphabetic input, or a column
/// too large to fit in a `u32`.
///
/// # Examples
/// ```
/// use delivery_verification::a1::letter_to_col;
///
/// assert_eq!(letter_to_col("B"), Some(2));
/// assert_eq!(letter_to_col("fa"), Some(157));
/// assert_eq!(letter_to_col("B5"), None);
/// ```
pub fn letter_to_col(letters: &str) -> Option<u32> {
    if letters.is_empty() {
        return None;
    }
    letters.chars().try_fold(0u32, |acc, c| {
        if !c.is_ascii_alphabetic() {
            return None;
        }
        let digit = c.to_ascii_uppercase() as u32 - 'A' as u32 + 1;
        acc.checked_mul(26)?.checked_add(digit)
    })
}

pub fn cell_name(row: u32, col: u32) -> String {
    format!("{}{}", col_to_letter(col), row)
}

/// A rectangular block in A1 notation
///
/// Rows are optional so that open-ended blocks such as `B5:FA` (row 5 to the
/// last populated row) and whole columns such as `W:AV` can be expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct A1Range {
    pub start_col: u32,
    pub start_row: Option<u32>,
    pub end_col: u32,
    pub end_row: Option<u32>,
}

impl A1Range {
    pub fn new(
        start_col: u32,
        start_row: Option<u32>,
        end_col: u32,
        end_row: Option<u32>,
    ) -> Self {
        A1Range {
            start_col,
            start_row,
            end_col,
            end_row,
        }
    }

    /// A block covering `first_col..=last_col` on exactly one row
    pub fn row(row: u32, first_col: u32, last_col: u32) -> Self {
        A1Range::new(first_col, Some(row), last_col, Some(row))
    }

    pub fn cell(row: u32, col: u32) -> Self {
        A1Range::row(row, col, col)
    }

    pub fn width(&self) -> u32 {
        self.end_col.saturating_sub(self.start_col) + 1
    }
}

impl fmt::Display for A1Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", col_to_letter(self.start_col))?;
        if let Some(row) = self.start_row {
            write!(f, "{}", row)?;
        }
        if self.start_col == self.end_col
            && self.start_row == self.end_row
            && self.start_row.is_some()
        {
            return Ok(());
        }
        write!(f, ":{}", col_to_letter(self.end_col))?;
        if let Some(row) = self.end_row {
            write!(f, "{}", row)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid A1 range '{0}'")]
pub struct InvalidRange(pub String);

impl FromStr for A1Range {
    type Err = InvalidRange;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidRange(s.to_string());
        let caps = RANGE_REGEX.captures(s.trim()).ok_or_else(invalid)?;

        let parse_row = |m: Option<regex::Match<'_>>| -> Result<Option<u32>, InvalidRange> {
            match m.map(|m| m.as_str()).filter(|digits| !digits.is_empty()) {
                None => Ok(None),
                Some(digits) => match digits.parse::<u32>() {
                    Ok(0) | Err(_) => Err(invalid()),
                    Ok(row) => Ok(Some(row)),
                },
            }
        };

        let start_col = letter_to_col(&caps[1]).ok_or_else(invalid)?;
        let start_row = parse_row(caps.get(2))?;

        let range = match caps.get(3) {
            Some(end) => {
                let end_col = letter_to_col(end.as_str()).ok_or_else(invalid)?;
                A1Range::new(start_col, start_row, end_col, parse_row(caps.get(4))?)
            }
            // A lone reference names a single cell, or a single column if it has no row
            None => A1Range::new(start_col, start_row, start_col, start_row),
        };

        if range.end_col < range.start_col {
            return Err(invalid());
        }
        if let (Some(start), Some(end)) = (range.start_row, range.end_row) {
            if end < start {
                return Err(invalid());
            }
        }
        Ok(range)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_letters_round_trip_at_boundaries() {
        assert_eq!(col_to_letter(1), "A");
        assert_eq!(col_to_letter(26), "Z");
        assert_eq!(col_to_letter(27), "AA");
        assert_eq!(col_to_letter(157), "FA");
        assert_eq!(letter_to_col("Z"), Some(26));
        assert_eq!(letter_to_col("AV"), Some(48));
        assert_eq!(letter_to_col("BB"), Some(54));
        assert_eq!(letter_to_col(""), None);
    }

    #[test]
    fn parses_open_ended_and_bounded_ranges() {
        let open: A1Range = "B5:FA".parse().unwrap();
        assert_eq!(open, A1Range::new(2, Some(5), 157, None));
        assert_eq!(open.to_string(), "B5:FA");

        let row: A1Range = "BB12:CA12".parse().unwrap();
        assert_eq!(row, A1Range::row(12, 54, 79));
        assert_eq!(row.width(), 26);

        let cols: A1Range = "W:AV".parse().unwrap();
        assert_eq!(cols.start_row, None);
        assert_eq!(cols.to_string(), "W:AV");
    }

    #[test]
    fn single_cell_formats_without_colon() {
        let cell = A1Range::cell(7, 3);
        assert_eq!(cell.to_string(), "C7");
        assert_eq!("c7".parse::<A1Range>().unwrap(), cell);
        assert_eq!(cell_name(7, 3), "C7");
    }

    #[test]
    fn rejects_reversed_and_malformed_ranges() {
        assert!("C1:A1".parse::<A1Range>().is_err());
        assert!("A5:A2".parse::<A1Range>().is_err());
        assert!("A0".parse::<A1Range>().is_err());
        assert!("5A".parse::<A1Range>().is_err());
        assert!("A1:".parse::<A1Range>().is_err());
    }
}
