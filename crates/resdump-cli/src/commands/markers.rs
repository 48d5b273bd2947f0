//! Markers command implementation.

use std::path::Path;

use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use resdump_core::{MarkerCatalog, load_markers};

use super::hex_utils::format_with_rva;
use super::{ImageSource, open_image};

/// Run the markers command
pub fn run(module: &Path, markers: &Path, source: ImageSource) -> Result<()> {
    let patterns = load_markers(markers)
        .with_context(|| format!("Failed to load marker catalog {}", markers.display()))?;
    let image = open_image(module, source)?;

    let catalog = MarkerCatalog::resolve(&patterns, &*image)?;

    println!("Build: {}", patterns.build.bold());
    println!();
    for (role, address) in catalog.iter() {
        println!(
            "  {:<14} {}",
            role.name(),
            format_with_rva(address, image.base_address()).green()
        );
    }

    Ok(())
}
