//! User-facing output. Errors go to stderr, everything else to stdout;
//! diagnostics belong to `tracing`, not here.

use crate::utils::colors::{GREY, RESET};
use std::fmt;

const BOLD: &str = "\x1b[1m";

#[derive(Clone, Copy)]
enum Tone {
    Info,
    Success,
    Warning,
    Error,
}

impl Tone {
    fn style(self) -> (&'static str, &'static str) {
        match self {
            Tone::Info => ("\x1b[34m", "ℹ️"),
            Tone::Success => ("\x1b[32m", "✅"),
            Tone::Warning => ("\x1b[33m", "⚠️"),
            Tone::Error => ("\x1b[31m", "❌"),
        }
    }
}

fn line(tone: Tone, msg: impl fmt::Display) -> String {
    let (color, icon) = tone.style();
    format!("{color}{BOLD}{icon} {RESET}{msg}")
}

pub fn info<T: fmt::Display>(msg: T) {
    println!("{}", line(Tone::Info, msg));
}

pub fn success<T: fmt::Display>(msg: T) {
    println!("{}", line(Tone::Success, msg));
}

pub fn warning<T: fmt::Display>(msg: T) {
    println!("{}", line(Tone::Warning, msg));
}

pub fn error<T: fmt::Display>(msg: T) {
    eprintln!("{}", line(Tone::Error, msg));
}

/// Section title for multi-part reports.
pub fn header<T: fmt::Display>(msg: T) {
    let (color, _) = Tone::Info.style();
    println!("{color}{BOLD}── {msg} ──{RESET}\n");
}

/// Indented `label: value` line under a message.
pub fn detail<L: fmt::Display, V: fmt::Display>(label: L, value: V) {
    println!("   {GREY}{label}:{RESET} {value}");
}
