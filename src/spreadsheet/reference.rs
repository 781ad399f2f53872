//! Conversions between 0-based (row, column) indexes and `A1` style references.

/// Rows in a worksheet (`1048576`)
pub const MAX_ROWS: usize = 1 << 20;
/// Columns in a worksheet (`XFD`)
pub const MAX_COLUMNS: usize = 1 << 14;

/// Returns true if the 0-based position lies within the worksheet limits.
pub fn in_bounds(row: usize, col: usize) -> bool {
    row < MAX_ROWS && col < MAX_COLUMNS
}

/// Converts 0-based indexes to an `A1` reference, e.g. (0, 27) to `AB1`.
pub fn index_to_reference(row: usize, col: usize) -> String {
    let mut letters = Vec::<u8>::new();
    let mut number = col + 1;
    while number > 0 {
        number -= 1;
        letters.push(b'A' + (number % 26) as u8);
        number /= 26;
    }
    letters.reverse();
    let mut reference = String::from_utf8_lossy(&letters).into_owned();
    reference.push_str(&(row + 1).to_string());
    reference
}

/// Converts column letters (`A`, `AB`) to a 0-based column index; `None` past `XFD`.
pub fn col_to_index(letters: &str) -> Option<usize> {
    if letters.is_empty() {
        return None;
    }
    letters.bytes().try_fold(0usize, |index, letter| {
        let letter = letter.to_ascii_uppercase();
        if !letter.is_ascii_uppercase() {
            return None;
        }
        index.checked_mul(26)?.checked_add((letter - b'A') as usize + 1)
    })
    .filter(|number| *number <= MAX_COLUMNS)
    .map(|number| number - 1)
}

/// Converts a 1-based row number (`12`) to a 0-based row index; `None` past row `1048576`.
pub fn row_to_index(number: &str) -> Option<usize> {
    number
        .parse::<usize>()
        .ok()
        .filter(|row| (1..=MAX_ROWS).contains(row))
        .map(|row| row - 1)
}

/// Converts an `A1` reference (absolute markers allowed) to 0-based (row, column) indexes.
pub fn reference_to_index(reference: &str) -> Option<(usize, usize)> {
    let reference = reference.replace('$', "");
    let split = reference.find(|c: char| c.is_ascii_digit())?;
    let (letters, digits) = reference.split_at(split);
    Some((row_to_index(digits)?, col_to_index(letters)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_to_reference_letters() {
        assert_eq!(index_to_reference(0, 0), "A1");
        assert_eq!(index_to_reference(9, 25), "Z10");
        assert_eq!(index_to_reference(0, 26), "AA1");
        assert_eq!(index_to_reference(2, 27), "AB3");
        assert_eq!(index_to_reference(0, 701), "ZZ1");
        assert_eq!(index_to_reference(0, 702), "AAA1");
    }

    #[test]
    fn reference_to_index_parsing() {
        assert_eq!(reference_to_index("A1"), Some((0, 0)));
        assert_eq!(reference_to_index("ab3"), Some((2, 27)));
        assert_eq!(reference_to_index("$C$7"), Some((6, 2)));
        assert_eq!(reference_to_index("AAA1"), Some((0, 702)));
        assert_eq!(reference_to_index("A0"), None);
        assert_eq!(reference_to_index("12"), None);
        assert_eq!(reference_to_index("B"), None);
    }

    #[test]
    fn reference_limits() {
        assert_eq!(reference_to_index("XFD1048576"), Some((MAX_ROWS - 1, MAX_COLUMNS - 1)));
        assert_eq!(reference_to_index("XFE1"), None);
        assert_eq!(reference_to_index("A1048577"), None);
        assert_eq!(reference_to_index("AAAAAAAAAAAAAAA1"), None);
        assert_eq!(reference_to_index("A18446744073709551615"), None);
        assert_eq!(reference_to_index("A99999999999999999999999"), None);
        assert!(in_bounds(0, 0));
        assert!(!in_bounds(MAX_ROWS, 0));
        assert!(!in_bounds(0, MAX_COLUMNS));
    }
}
