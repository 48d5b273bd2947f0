//! Synthetic image builder for tests.

use super::ByteImage;

/// Builds a [`ByteImage`] by placing byte runs at absolute addresses.
///
/// Unwritten bytes are filled with `0xCC` (int3 padding, as between functions).
pub struct MockImageBuilder {
    base: u64,
    data: Vec<u8>,
}

impl MockImageBuilder {
    pub fn new(base: u64, size: usize) -> Self {
        Self {
            base,
            data: vec![0xCC; size],
        }
    }

    pub fn write(mut self, address: u64, bytes: &[u8]) -> Self {
        let offset = (address - self.base) as usize;
        self.data[offset..offset + bytes.len()].copy_from_slice(bytes);
        self
    }

    pub fn write_c_string(self, address: u64, value: &str) -> Self {
        let mut bytes = value.as_bytes().to_vec();
        bytes.push(0);
        self.write(address, &bytes)
    }

    pub fn build(self) -> ByteImage {
        ByteImage::new(self.base, self.data)
    }
}
