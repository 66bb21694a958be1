//! Status lines for the templar CLI, colored with [`console`].

use console::style;

/// Command banner, e.g. `templar list`, underlined.
pub fn print_header(text: &str) {
    println!("\n{}", style(text).bold().cyan());
    println!("{}", style("-".repeat(text.chars().count())).dim());
}

/// Template group label in `templar list`.
pub fn print_group(text: &str) {
    println!("{}", style(text).bold().underlined());
}

/// A completed change to the store or a created file.
pub fn print_success(text: &str) {
    println!("{} {}", style("done").green().bold(), text);
}

/// Something the user should know about, but that did not fail the command.
pub fn print_warning(text: &str) {
    println!("{} {}", style("note").yellow().bold(), text);
}

/// One indented `key: value` field of a template record.
pub fn print_key_value(key: &str, value: &str) {
    println!("  {:>8}: {}", style(key).dim(), value);
}
