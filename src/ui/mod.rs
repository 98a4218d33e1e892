//! Terminal output helpers.

pub mod progress;

use std::path::Path;

use console::style;

use crate::types::Mode;

pub fn show_success(mode: Mode, output: &Path) {
    println!("{} {}: {}", style("✓").green().bold(), mode.label(), output.display());
}
