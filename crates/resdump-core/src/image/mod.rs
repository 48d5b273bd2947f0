//! Module images: read-only byte spans addressed by absolute virtual address.
//!
//! The analysis never touches a process directly. Everything it needs is a
//! [`ModuleImage`], which can come from a synthetic buffer ([`ByteImage`]),
//! a PE file mapped from disk ([`PeFileImage`]), or, on Windows, a DLL
//! loaded into the current process ([`LoadedModule`]).

mod pe;
#[cfg(target_os = "windows")]
mod loaded;

#[cfg(test)]
pub mod mock;

pub use pe::PeFileImage;
#[cfg(target_os = "windows")]
pub use loaded::LoadedModule;

#[cfg(test)]
pub use mock::MockImageBuilder;

/// A contiguous, readable module image.
pub trait ModuleImage {
    /// Absolute address of the first byte
    fn base_address(&self) -> u64;

    /// The whole image, starting at [`base_address`](Self::base_address)
    fn bytes(&self) -> &[u8];

    fn size(&self) -> usize {
        self.bytes().len()
    }

    /// One past the last mapped address
    fn end_address(&self) -> u64 {
        self.base_address() + self.size() as u64
    }

    fn contains(&self, address: u64) -> bool {
        address >= self.base_address() && address < self.end_address()
    }

    /// Bytes from `address` to the end of the image
    fn slice_from(&self, address: u64) -> Option<&[u8]> {
        if !self.contains(address) {
            return None;
        }
        let offset = (address - self.base_address()) as usize;
        Some(&self.bytes()[offset..])
    }

    /// Read a NUL-terminated string of at most `max_len` bytes.
    ///
    /// Returns `None` if the address is outside the image, the terminator is
    /// not found within `max_len` bytes, or the string is empty.
    fn read_c_string(&self, address: u64, max_len: usize) -> Option<String> {
        let bytes = self.slice_from(address)?;
        let window = &bytes[..bytes.len().min(max_len.saturating_add(1))];
        let len = window.iter().position(|&b| b == 0)?;
        if len == 0 {
            return None;
        }
        Some(String::from_utf8_lossy(&window[..len]).into_owned())
    }
}

/// An owned image buffer placed at a fixed base address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ByteImage {
    base: u64,
    data: Vec<u8>,
}

impl ByteImage {
    pub fn new(base: u64, data: Vec<u8>) -> Self {
        Self { base, data }
    }
}

impl ModuleImage for ByteImage {
    fn base_address(&self) -> u64 {
        self.base
    }

    fn bytes(&self) -> &[u8] {
        &self.data
    }
}

impl<T: ModuleImage + ?Sized> ModuleImage for &T {
    fn base_address(&self) -> u64 {
        (**self).base_address()
    }

    fn bytes(&self) -> &[u8] {
        (**self).bytes()
    }
}
