//! # resdump-core
//!
//! Recovers resource table layouts from a game module's machine code.
//!
//! This crate provides:
//! - Module images (synthetic buffers, PE files mapped from disk, DLLs loaded in-process)
//! - Masked byte pattern scanning
//! - Marker function resolution from a per-build pattern catalog
//! - A linear instruction walk that rebuilds struct definitions from reader calls
//! - Schema output (C# classes, JSON)

pub mod analysis;
pub mod decode;
pub mod emit;
pub mod error;
pub mod image;
pub mod marker;
pub mod pattern;
pub mod schema;
pub mod walker;

pub use analysis::{Analysis, AnalysisOptions, AnalysisOptionsBuilder, analyze, analyze_with};
pub use decode::{DecodedInstruction, Decoder, Mnemonic, Operand, X86Decoder};
pub use emit::{
    CSharpEmitter, DEFAULT_NAMESPACE, EmitFormat, JsonEmitter, SchemaEmitter, file_stem,
    write_schema,
};
pub use error::{Error, Result};
#[cfg(target_os = "windows")]
pub use image::LoadedModule;
pub use image::{ByteImage, ModuleImage, PeFileImage};
pub use marker::{
    MarkerCatalog, MarkerPattern, MarkerPatterns, MarkerRole, load_markers, save_markers,
};
pub use pattern::{Pattern, find_all, find_first};
pub use schema::{FieldKind, SchemaModel, StructRecord};
pub use walker::{StructWalker, WalkContext, WalkOptions, WalkStats, WalkerState};
