//! Terminal output helpers: highlighted JSON, tables and small formatters.

use std::fmt::Write as _;

use chrono::{DateTime, FixedOffset};
use colored::Colorize;
use serde_json::Value;
use tabled::settings::Style;
use tabled::{Table, Tabled};

/// Prints `value` as indented JSON with keys, strings, numbers and literals
/// in different colours.
pub fn print_highlighted_json(value: &Value) {
    let mut out = String::new();
    write_value(&mut out, value, 0);
    println!("{out}");
}

fn write_value(out: &mut String, value: &Value, depth: usize) {
    match value {
        Value::Null => out.push_str(&"null".magenta().to_string()),
        Value::Bool(b) => out.push_str(&b.to_string().magenta().to_string()),
        Value::Number(n) => out.push_str(&n.to_string().yellow().to_string()),
        Value::String(s) => out.push_str(&quoted(s).green().to_string()),
        Value::Array(items) if items.is_empty() => out.push_str("[]"),
        Value::Array(items) => {
            out.push_str(&"[".bold().to_string());
            for (i, item) in items.iter().enumerate() {
                out.push_str(if i == 0 { "\n" } else { ",\n" });
                indent(out, depth + 1);
                write_value(out, item, depth + 1);
            }
            out.push('\n');
            indent(out, depth);
            out.push_str(&"]".bold().to_string());
        }
        Value::Object(map) if map.is_empty() => out.push_str("{}"),
        Value::Object(map) => {
            out.push_str(&"{".bold().to_string());
            for (i, (key, item)) in map.iter().enumerate() {
                out.push_str(if i == 0 { "\n" } else { ",\n" });
                indent(out, depth + 1);
                let _ = write!(out, "{}: ", quoted(key).cyan());
                write_value(out, item, depth + 1);
            }
            out.push('\n');
            indent(out, depth);
            out.push_str(&"}".bold().to_string());
        }
    }
}

fn quoted(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| format!("\"{s}\""))
}

fn indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push_str("  ");
    }
}

/// Prints `rows` as a rounded table under a bold `title (count)` heading.
pub fn print_table<T: Tabled>(title: &str, rows: Vec<T>) {
    let count = rows.len();
    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{}", format!("{title} ({count})").bold());
    println!("{table}");
}

/// Shortens `s` to at most `max_chars` characters, ending with an ellipsis
/// when something was cut.
#[must_use]
pub fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let kept: String = s.chars().take(max_chars.saturating_sub(1)).collect();
    format!("{kept}…")
}

/// Formats a boolean as a coloured check mark or cross.
#[must_use]
pub fn format_bool(value: bool) -> String {
    if value { "✓".green().to_string() } else { "✗".red().to_string() }
}

/// Formats a timestamp as `YYYY-MM-DD HH:MM`, or a dash when absent.
#[must_use]
pub fn format_time(value: Option<DateTime<FixedOffset>>) -> String {
    value.map_or_else(|| "-".dimmed().to_string(), |at| at.format("%Y-%m-%d %H:%M").to_string())
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn plain(value: &Value) -> String {
        colored::control::set_override(false);
        let mut out = String::new();
        write_value(&mut out, value, 0);
        out
    }

    #[test]
    fn test_highlighted_json_layout() {
        let value = serde_json::json!({ "name": "Morning", "entries": [1, 2], "settings": {} });
        let out = plain(&value);
        assert!(out.contains("\"name\": \"Morning\""));
        assert!(out.contains("\"settings\": {}"));
        assert!(out.contains("  \"entries\": [\n    1,\n    2\n  ]"));
    }

    #[test]
    fn test_highlighted_json_escapes_strings() {
        let out = plain(&serde_json::json!("say \"hi\""));
        assert_eq!(out, r#""say \"hi\"""#);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello", 5), "hello");
        assert_eq!(truncate("hello world", 8), "hello w…");
        assert_eq!(truncate("hello", 1), "…");
    }

    #[test]
    fn test_truncate_multibyte() {
        assert_eq!(truncate("café au lait", 5), "café…");
        assert_eq!(truncate("hello 🌍 world", 8), "hello 🌍…");
    }

    #[test]
    fn test_format_bool() {
        assert!(format_bool(true).contains('✓'));
        assert!(format_bool(false).contains('✗'));
    }

    #[test]
    fn test_format_time() {
        let at = FixedOffset::east_opt(0).unwrap().with_ymd_and_hms(2026, 3, 2, 9, 5, 0).unwrap();
        assert_eq!(format_time(Some(at)), "2026-03-02 09:05");
        assert!(format_time(None).contains('-'));
    }
}
