//! PE files mapped from disk into their in-memory layout.

use std::fs;
use std::path::Path;

use goblin::pe::PE;
use tracing::debug;

use super::ModuleImage;
use crate::error::{Error, Result};

/// A PE file laid out the way the loader would map it, at its preferred base.
///
/// Headers and every section's raw data are copied to their RVAs inside a
/// zero-filled buffer of `SizeOfImage` bytes. Relocations are not applied:
/// RIP-relative code references resolve correctly at any base.
#[derive(Debug, Clone)]
pub struct PeFileImage {
    base: u64,
    data: Vec<u8>,
}

/// File range of one section and where it lands in the image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SectionMapping {
    virtual_address: usize,
    virtual_size: usize,
    raw_offset: usize,
    raw_size: usize,
}

impl PeFileImage {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = fs::read(path)?;
        let image = Self::from_bytes(&file)?;
        debug!(
            "Mapped {} at 0x{:X} ({:#x} bytes)",
            path.display(),
            image.base,
            image.data.len()
        );
        Ok(image)
    }

    pub fn from_bytes(file: &[u8]) -> Result<Self> {
        let pe = PE::parse(file).map_err(|e| Error::ModuleLoad(format!("Invalid PE file: {}", e)))?;
        let optional = pe
            .header
            .optional_header
            .ok_or_else(|| Error::ModuleLoad("PE file has no optional header".to_string()))?;

        let size_of_image = optional.windows_fields.size_of_image as usize;
        let size_of_headers = optional.windows_fields.size_of_headers as usize;

        let sections: Vec<SectionMapping> = pe
            .sections
            .iter()
            .map(|section| SectionMapping {
                virtual_address: section.virtual_address as usize,
                virtual_size: section.virtual_size as usize,
                raw_offset: section.pointer_to_raw_data as usize,
                raw_size: section.size_of_raw_data as usize,
            })
            .collect();

        Ok(Self {
            base: pe.image_base as u64,
            data: map_sections(file, size_of_image, size_of_headers, &sections),
        })
    }
}

impl ModuleImage for PeFileImage {
    fn base_address(&self) -> u64 {
        self.base
    }

    fn bytes(&self) -> &[u8] {
        &self.data
    }
}

fn map_sections(
    file: &[u8],
    size_of_image: usize,
    size_of_headers: usize,
    sections: &[SectionMapping],
) -> Vec<u8> {
    let mut data = vec![0u8; size_of_image];

    let headers = size_of_headers.min(file.len()).min(size_of_image);
    data[..headers].copy_from_slice(&file[..headers]);

    for section in sections {
        // Raw data beyond the virtual size is file alignment padding
        let mut len = if section.virtual_size == 0 {
            section.raw_size
        } else {
            section.raw_size.min(section.virtual_size)
        };
        len = len
            .min(file.len().saturating_sub(section.raw_offset))
            .min(size_of_image.saturating_sub(section.virtual_address));
        if len == 0 {
            continue;
        }

        data[section.virtual_address..section.virtual_address + len]
            .copy_from_slice(&file[section.raw_offset..section.raw_offset + len]);
    }

    data
}
