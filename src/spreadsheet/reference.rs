//! Conversions between A1-style cell references and 0-based indexes.

/// Converts 0-based row & column indexes to an A1-style reference.
pub(crate) fn index_to_reference(row: usize, col: usize) -> String {
    let mut reference = col_to_letters(col);
    reference.push_str(&(row + 1).to_string());
    reference
}

/// Converts a 0-based column index to letters (0 = A, 25 = Z, 26 = AA).
pub(crate) fn col_to_letters(col: usize) -> String {
    let mut column = col + 1;
    let mut letters = Vec::<u8>::new();
    while column > 0 {
        column -= 1;
        letters.push(b'A' + (column % 26) as u8);
        column /= 26;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

/// Converts column letters to a 0-based index, None for an empty or invalid string.
pub(crate) fn col_to_index(letters: &str) -> Option<usize> {
    if letters.is_empty() || !letters.bytes().all(|byte| byte.is_ascii_alphabetic()) {
        return None;
    }
    letters
        .to_ascii_uppercase()
        .bytes()
        .map(|letter| (letter - b'A') as usize + 1)
        .reduce(|index, digit| index * 26 + digit)
        .map(|column| column - 1)
}

/// Converts a 1-based row number to a 0-based index.
pub(crate) fn row_to_index(number: &str) -> Option<usize> {
    number
        .parse::<usize>()
        .ok()
        .filter(|row| *row > 0)
        .map(|row| row - 1)
}

/// Splits an A1-style reference into 0-based (row, column) indexes.
pub(crate) fn reference_to_index(reference: &str) -> Option<(usize, usize)> {
    let split = reference.find(|character: char| character.is_ascii_digit())?;
    let (letters, digits) = reference.split_at(split);
    Some((row_to_index(digits)?, col_to_index(letters)?))
}
