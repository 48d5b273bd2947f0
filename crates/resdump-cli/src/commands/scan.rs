//! Scan command implementation.

use std::path::Path;

use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use resdump_core::{Pattern, find_all};

use super::hex_utils::{format_bytes, format_with_rva};
use super::{ImageSource, open_image};

/// Bytes of context printed after each match
const CONTEXT_LEN: usize = 16;

/// Run the scan command
pub fn run(module: &Path, pattern: &str, limit: usize, source: ImageSource) -> Result<()> {
    let pattern: Pattern = pattern
        .parse()
        .with_context(|| format!("Invalid pattern {:?}", pattern))?;
    let image = open_image(module, source)?;

    println!("Searching for pattern: {} ({} bytes)", pattern, pattern.len());
    println!();

    let matches = find_all(&*image, &pattern);
    for (i, address) in matches.iter().take(limit).enumerate() {
        println!(
            "[{}] {}",
            i + 1,
            format_with_rva(*address, image.base_address()).green()
        );
        if let Some(bytes) = image.slice_from(*address) {
            println!("     {}", format_bytes(&bytes[..bytes.len().min(CONTEXT_LEN)]));
        }
    }

    println!();
    match matches.len() {
        0 => println!("{}", "No matches".red()),
        1 => println!("Found 1 result (unique)"),
        n => println!("Found {} results {}", n, "(not unique)".yellow()),
    }
    if matches.len() > limit {
        println!("(limit reached, use --limit to increase)");
    }

    Ok(())
}
