//! Row parser - Turns uploaded CSV files and pasted text into string rows.
//!
//! Both parsers are deliberately thin: they only split text into trimmed cells. Deciding
//! what a column means is the loader's job.

/// Parses CSV text into rows of trimmed cells.
///
/// Supports double-quoted fields with `""` escapes, `,` as separator and `\n`, `\r` or
/// `\r\n` as row terminators. Rows whose cells are all empty are dropped.
#[must_use]
pub fn parse_csv(text: &str) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut cell = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        if in_quotes {
            match ch {
                '"' if chars.peek() == Some(&'"') => {
                    cell.push('"');
                    chars.next();
                }
                '"' => in_quotes = false,
                _ => cell.push(ch),
            }
            continue;
        }

        match ch {
            '"' => in_quotes = true,
            ',' => row.push(std::mem::take(&mut cell).trim().to_string()),
            '\n' | '\r' => {
                if !cell.is_empty() || !row.is_empty() {
                    row.push(std::mem::take(&mut cell).trim().to_string());
                    rows.push(std::mem::take(&mut row));
                }
            }
            _ => cell.push(ch),
        }
    }
    if !cell.is_empty() || !row.is_empty() {
        row.push(cell.trim().to_string());
        rows.push(row);
    }

    rows.retain(|r| r.iter().any(|c| !c.is_empty()));
    rows
}

/// Parses pasted text, one row per non-empty line.
///
/// Each line is split on the first delimiter it contains, checked in the order
/// `,` `\t` `|` `;`. A line with none of them is a single-column row.
#[must_use]
pub fn parse_pasted(text: &str) -> Vec<Vec<String>> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(split_line)
        .filter(|row| row.iter().any(|c| !c.is_empty()))
        .collect()
}

fn split_line(line: &str) -> Vec<String> {
    [',', '\t', '|', ';']
        .into_iter()
        .find(|d| line.contains(*d))
        .map_or_else(
            || vec![line.to_string()],
            |d| line.split(d).map(|c| c.trim().to_string()).collect(),
        )
}
