//! Output formatting utilities.

use serde::Serialize;

/// Pretty JSON for any serializable value.
pub fn format_json<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(value)
}

/// Prints a two-line table header over the given columns.
pub fn print_table_header(columns: &[(&str, usize)]) {
    let mut line = String::new();
    for (name, width) in columns {
        line.push_str(&format!("{:<width$} ", name, width = width));
    }
    let line = line.trim_end();
    println!("{}", line);
    println!("{}", "-".repeat(line.len()));
}

/// Shortens long hex strings for tables.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        s.to_string()
    } else {
        format!("{}...", &s[..max_len.saturating_sub(3)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_keeps_short_strings() {
        assert_eq!(truncate("abc", 5), "abc");
        assert_eq!(truncate("abcdefgh", 6), "abc...");
    }
}
