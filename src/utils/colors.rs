// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pcaflow contributors

//! Terminal color utilities
//!
//! Provides consistent styling for the submission summary.

use colored::Colorize;

/// Print a styled header
pub fn print_header(title: &str) {
    println!("{}", title.bold());
    println!("{}", "═".repeat(title.chars().count().max(40)));
}

/// Print a submitted job
pub fn print_submitted(stage: &str, handle: &str, detail: &str) {
    if detail.is_empty() {
        println!("  {} {} {}", "✓".green(), stage.bold(), handle.dimmed());
    } else {
        println!(
            "  {} {} {} {}",
            "✓".green(),
            stage.bold(),
            handle.dimmed(),
            detail.dimmed()
        );
    }
}

/// Print a stage that is not part of this run
pub fn print_skipped(stage: &str) {
    println!("  {} {} (skipped)", "○".dimmed(), stage.dimmed());
}

/// Print an info item
pub fn print_info(msg: &str) {
    println!("  {} {}", "→".blue(), msg);
}
