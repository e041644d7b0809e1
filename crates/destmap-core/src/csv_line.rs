// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

//! Line-oriented CSV lexer shared by the reference dataset and the
//! served-airports export.
//!
//! The lexer works on a single physical line. A quoted field that spans a
//! newline is not supported: callers split the document on `\n` first, so
//! such a field ends up broken across two records.

/// Splits one CSV line into trimmed fields.
///
/// A `"` toggles the in-quotes state and is never part of the value. A `,`
/// outside quotes ends the field. A `\r` always ends the field, so Windows
/// line endings leave a trailing empty field rather than a stray `\r`.
pub fn split_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for c in line.chars() {
        match c {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                fields.push(current.trim().to_string());
                current.clear();
            }
            '\r' => {
                fields.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(c),
        }
    }
    fields.push(current.trim().to_string());

    fields
}

/// Iterates the non-empty lines of a document, with any trailing `\r` removed.
pub fn data_lines(text: &str) -> impl Iterator<Item = &str> {
    text.split('\n')
        .map(|l| l.strip_suffix('\r').unwrap_or(l))
        .filter(|l| !l.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_fields_are_trimmed() {
        assert_eq!(split_line(" WMKK , Kuala Lumpur ,,TRUE"), vec!["WMKK", "Kuala Lumpur", "", "TRUE"]);
    }

    #[test]
    fn test_quoted_comma_stays_in_one_field() {
        let fields = split_line(r#"2434,"EGLL","London Heathrow, Greater London",51.47"#);
        assert_eq!(fields.len(), 4);
        assert_eq!(fields[1], "EGLL");
        assert_eq!(fields[2], "London Heathrow, Greater London");
    }

    #[test]
    fn test_carriage_return_terminates_field() {
        let fields = split_line("VTBS,Bangkok,,FALSE\r");
        assert_eq!(fields, vec!["VTBS", "Bangkok", "", "FALSE", ""]);
    }

    #[test]
    fn test_empty_line_yields_single_empty_field() {
        assert_eq!(split_line(""), vec![String::new()]);
    }

    #[test]
    fn test_doubled_quotes_toggle_twice() {
        // `""` flips in and straight back out, leaving no quote in the value.
        assert_eq!(split_line(r#"a""b,c"#), vec!["ab", "c"]);
    }

    #[test]
    fn test_data_lines_skips_blank_and_strips_cr() {
        let text = "h1,h2\r\n\r\nWMKK,KL\r\n\nVTBS,BKK";
        let lines: Vec<&str> = data_lines(text).collect();
        assert_eq!(lines, vec!["h1,h2", "WMKK,KL", "VTBS,BKK"]);
    }
}
