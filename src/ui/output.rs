use crate::output::is_quiet;
use crate::record::Record;
use crate::ui::{theme, Icons};
use owo_colors::OwoColorize;

pub fn header(text: &str) {
    if is_quiet() {
        return;
    }
    println!("{} {}", Icons::ROCKET, text.style(theme().header.clone()));
}

pub fn success(label: &str) {
    if is_quiet() {
        return;
    }
    println!("{} {}", Icons::CHECK, label.style(theme().success.clone()));
}

/// Report a failed command on stderr; printed even when quiet
pub fn error(label: &str) {
    eprintln!("{}", error_line(label));
}

fn error_line(label: &str) -> String {
    format!("{} {}", Icons::CROSS, label.style(theme().error.clone()))
}

pub fn warn(label: &str) {
    eprintln!("{} {}", Icons::WARN, label.style(theme().warn.clone()));
}

pub fn info(label: &str, value: &str) {
    if is_quiet() {
        return;
    }
    println!("{} {}: {}", Icons::INFO, label.style(theme().dim.clone()), value);
}

pub fn section(title: &str) {
    if is_quiet() {
        return;
    }
    println!();
    println!("━{}━", title.style(theme().header.clone()));
}

/// One record on one line: `icon #id [second_id=n] name`
pub fn record(icon: &str, record: &Record) {
    if is_quiet() {
        return;
    }
    println!(
        "{} {} {} {}",
        icon,
        format!("#{}", record.id).style(theme().key.clone()),
        format!("[second_id={}]", record.second_id).style(theme().dim.clone()),
        record.name
    );
}
