//! CLI command implementations.
//!
//! This module contains the implementation of each CLI command.

pub mod dump;
pub mod hex_utils;
pub mod markers;
pub mod scan;

use std::path::Path;

use anyhow::Result;
use clap::ValueEnum;
use resdump_core::{ModuleImage, PeFileImage};
use tracing::info;

/// Where the module image comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ImageSource {
    /// Map the PE file from disk at its preferred base
    #[default]
    File,
    /// Load the DLL into this process (Windows only; handles packed modules)
    Load,
}

/// Open the module image for analysis
pub fn open_image(path: &Path, source: ImageSource) -> Result<Box<dyn ModuleImage>> {
    if !path.exists() {
        anyhow::bail!("Module not found: {}", path.display());
    }

    let image: Box<dyn ModuleImage> = match source {
        ImageSource::File => Box::new(PeFileImage::open(path)?),
        ImageSource::Load => load_module(path)?,
    };

    info!(
        "Module {} at 0x{:X} ({:#x} bytes)",
        path.display(),
        image.base_address(),
        image.size()
    );
    Ok(image)
}

#[cfg(target_os = "windows")]
fn load_module(path: &Path) -> Result<Box<dyn ModuleImage>> {
    use resdump_core::LoadedModule;

    // Dependencies of the module are looked up next to it
    let path = path.canonicalize()?;
    if let Some(dir) = path.parent() {
        std::env::set_current_dir(dir)?;
    }
    Ok(Box::new(LoadedModule::load(&path)?))
}

#[cfg(not(target_os = "windows"))]
fn load_module(_path: &Path) -> Result<Box<dyn ModuleImage>> {
    anyhow::bail!("--source load is only available on Windows; use --source file")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_missing_module() {
        let err = open_image(Path::new("/nonexistent/SoulWorker64.dll"), ImageSource::File)
            .err()
            .unwrap();
        assert!(err.to_string().contains("Module not found"));
    }

    #[test]
    fn test_open_non_pe_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), b"not a module").unwrap();
        assert!(open_image(file.path(), ImageSource::File).is_err());
    }
}
