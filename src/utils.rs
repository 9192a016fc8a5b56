use colored::Colorize;
use std::io::{self, BufRead, Write};
use std::path::Path;

use crate::lookup::DeviceRecord;

/// Show only the last four characters of an API key
pub fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 4 {
        "*".repeat(chars.len())
    } else {
        let visible: String = chars[chars.len() - 4..].iter().collect();
        format!("{}{}", "*".repeat(chars.len() - 4), visible)
    }
}

/// Format an IMEI, marking whether its check digit passes Luhn
pub fn format_imei(record: &DeviceRecord) -> String {
    if record.has_valid_check_digit() {
        format!("{} {}", record.imei, "✓".green())
    } else {
        format!("{} {}", record.imei, "≠luhn".yellow())
    }
}

/// Format timestamp in human-readable format
pub fn format_timestamp(timestamp: &chrono::DateTime<chrono::Utc>) -> String {
    timestamp.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// Read one identifier per line from a file, or from stdin when `path` is "-"
pub fn read_identifier_lines(path: &Path) -> io::Result<Vec<String>> {
    if path == Path::new("-") {
        return io::stdin().lock().lines().collect();
    }
    let content = std::fs::read_to_string(path)?;
    Ok(content.lines().map(str::to_string).collect())
}

/// Prompt user for yes/no confirmation
pub fn confirm_action(prompt: &str) -> io::Result<bool> {
    print!("{} (y/N): ", prompt);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    Ok(matches!(input.trim().to_lowercase().as_str(), "y" | "yes"))
}

/// Print a formatted table border
pub fn print_table_border(width: usize) {
    println!("{}", "=".repeat(width));
}

/// Print a table row with columns
pub fn print_table_row(columns: &[&str], widths: &[usize]) {
    let mut row = String::new();
    for (i, col) in columns.iter().enumerate() {
        if i < widths.len() {
            row.push_str(&format!("{:<width$}  ", col, width = widths[i]));
        }
    }
    println!("{}", row.trim_end());
}
