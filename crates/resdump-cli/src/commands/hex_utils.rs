//! Hex address formatting utilities.

/// Format an address as a hex string with 0x prefix.
pub fn format_hex_address(addr: u64) -> String {
    format!("0x{:X}", addr)
}

/// Format an address together with its offset from the module base.
pub fn format_with_rva(addr: u64, base: u64) -> String {
    format!("{} (RVA 0x{:X})", format_hex_address(addr), addr.wrapping_sub(base))
}

/// Hex bytes separated by spaces, as in a pattern string
pub fn format_bytes(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}
