//! End-to-end analysis: resolve markers, then walk the module.
//!
//! ## Example
//!
//! ```ignore
//! use resdump_core::{AnalysisOptions, PeFileImage, analyze, load_markers};
//!
//! let image = PeFileImage::open("SoulWorker64.dll")?;
//! let markers = load_markers("markers.json")?;
//! let options = AnalysisOptions::builder().bitness(64).build();
//!
//! let analysis = analyze(&image, &markers, &options)?;
//! for record in &analysis.schema {
//!     println!("{}: {:?}", record.name, record.fields);
//! }
//! ```

use tracing::info;

use crate::decode::{Decoder, X86Decoder};
use crate::error::Result;
use crate::image::ModuleImage;
use crate::marker::{MarkerCatalog, MarkerPatterns};
use crate::schema::SchemaModel;
use crate::walker::{DEFAULT_MAX_NAME_LEN, StructWalker, WalkOptions, WalkStats};

/// Options for [`analyze`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisOptions {
    /// Instruction set width of the module (16, 32 or 64)
    pub bitness: u32,
    /// Longest struct name accepted, excluding the terminator
    pub max_name_len: usize,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            bitness: 64,
            max_name_len: DEFAULT_MAX_NAME_LEN,
        }
    }
}

impl AnalysisOptions {
    /// Create a new options builder
    pub fn builder() -> AnalysisOptionsBuilder {
        AnalysisOptionsBuilder::default()
    }

    fn walk_options(&self) -> WalkOptions {
        WalkOptions {
            max_name_len: self.max_name_len,
        }
    }
}

/// Builder for AnalysisOptions
#[derive(Debug, Clone, Default)]
pub struct AnalysisOptionsBuilder {
    bitness: Option<u32>,
    max_name_len: Option<usize>,
}

impl AnalysisOptionsBuilder {
    pub fn bitness(mut self, bitness: u32) -> Self {
        self.bitness = Some(bitness);
        self
    }

    pub fn max_name_len(mut self, len: usize) -> Self {
        self.max_name_len = Some(len);
        self
    }

    pub fn build(self) -> AnalysisOptions {
        let default = AnalysisOptions::default();
        AnalysisOptions {
            bitness: self.bitness.unwrap_or(default.bitness),
            max_name_len: self.max_name_len.unwrap_or(default.max_name_len),
        }
    }
}

/// Result of a complete analysis
#[derive(Debug, Clone)]
pub struct Analysis {
    pub markers: MarkerCatalog,
    pub schema: SchemaModel,
    pub stats: WalkStats,
}

/// Resolve markers and reconstruct structs using the iced-x86 decoder.
pub fn analyze<I: ModuleImage + ?Sized>(
    image: &I,
    patterns: &MarkerPatterns,
    options: &AnalysisOptions,
) -> Result<Analysis> {
    let decoder = X86Decoder::new(options.bitness)?;
    analyze_with(image, patterns, decoder, options)
}

/// Resolve markers and reconstruct structs with a caller-supplied decoder.
///
/// Marker resolution failures abort before any instruction is decoded.
pub fn analyze_with<I: ModuleImage + ?Sized, D: Decoder>(
    image: &I,
    patterns: &MarkerPatterns,
    decoder: D,
    options: &AnalysisOptions,
) -> Result<Analysis> {
    info!(
        "Resolving markers for build {:?} in module at 0x{:X} ({:#x} bytes)",
        patterns.build,
        image.base_address(),
        image.size()
    );
    let markers = MarkerCatalog::resolve(patterns, image)?;

    let (schema, stats) = StructWalker::new(image, &markers, decoder)
        .with_options(options.walk_options())
        .walk();

    Ok(Analysis {
        markers,
        schema,
        stats,
    })
}
