//! Struct reconstruction from the instruction stream.
//!
//! The target reads each resource table with the same compiled shape:
//!
//! ```text
//! lea  rdx, [rip+"tb_Item"]   ; name string
//! call BeginStruct
//! call ReadUInt32             ; one call per field, in storage order
//! call ReadString
//! ...
//! call EndStruct              ; checksum, closes the struct
//! ```
//!
//! Reads never nest, so a two-state machine is enough: [`WalkerState::Idle`]
//! until a begin call names a struct, [`WalkerState::Building`] until the end
//! call seals it. A struct still open when the image ends is dropped.

use serde::Serialize;
use tracing::{debug, info, trace};

use crate::decode::{DecodedInstruction, Decoder, Mnemonic};
use crate::image::ModuleImage;
use crate::marker::{MarkerCatalog, MarkerRole};
use crate::schema::{SchemaModel, StructRecord};

/// Longest struct name read from the image, excluding the terminator
pub const DEFAULT_MAX_NAME_LEN: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalkOptions {
    pub max_name_len: usize,
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self {
            max_name_len: DEFAULT_MAX_NAME_LEN,
        }
    }
}

/// Counters collected during a walk
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WalkStats {
    /// Instructions decoded successfully
    pub decoded: usize,
    /// Single-byte advances after a failed decode
    pub resync_bytes: usize,
    /// Immediate calls whose target is a marker
    pub marker_calls: usize,
    /// Marker calls that did not change state (no name, no open struct)
    pub ignored_calls: usize,
    /// Structs opened but never sealed
    pub discarded: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum WalkerState {
    #[default]
    Idle,
    Building(StructRecord),
}

/// Mutable state threaded through one walk.
#[derive(Debug, Default)]
pub struct WalkContext {
    last_string: Option<u64>,
    state: WalkerState,
    completed: SchemaModel,
    stats: WalkStats,
    options: WalkOptions,
}

impl WalkContext {
    pub fn new(options: WalkOptions) -> Self {
        Self {
            options,
            ..Default::default()
        }
    }

    /// Address of the most recent `LEA` target
    pub fn last_string(&self) -> Option<u64> {
        self.last_string
    }

    pub fn state(&self) -> &WalkerState {
        &self.state
    }

    pub fn completed(&self) -> &SchemaModel {
        &self.completed
    }

    pub fn stats(&self) -> &WalkStats {
        &self.stats
    }

    /// Apply one decoded instruction.
    pub fn observe<I: ModuleImage + ?Sized>(
        &mut self,
        instr: &DecodedInstruction,
        catalog: &MarkerCatalog,
        image: &I,
    ) {
        self.stats.decoded += 1;

        match instr.mnemonic {
            Mnemonic::Lea if instr.operands.len() >= 2 => {
                if let Some(address) = instr.absolute_address(1) {
                    self.last_string = Some(address);
                }
            }
            Mnemonic::Call => {
                let Some(first) = instr.operands.first() else {
                    return;
                };
                if !first.is_immediate() {
                    return;
                }
                let Some(target) = instr.absolute_address(0) else {
                    return;
                };
                let roles = catalog.classify(target);
                if roles.is_empty() {
                    return;
                }
                self.stats.marker_calls += 1;
                trace!("0x{:X}: call {:?}", instr.address, roles);

                // A begin marker opens a struct even when folded with another role;
                // otherwise the first role at the address decides
                let rest = match roles.split_first() {
                    Some((MarkerRole::BeginStruct, rest)) => {
                        self.on_marker_call(MarkerRole::BeginStruct, image);
                        rest
                    }
                    _ => roles,
                };
                if let Some(role) = rest.first() {
                    self.on_marker_call(*role, image);
                }
            }
            _ => {}
        }
    }

    fn on_marker_call<I: ModuleImage + ?Sized>(&mut self, role: MarkerRole, image: &I) {
        match role {
            MarkerRole::BeginStruct => {
                let max_len = self.options.max_name_len;
                let name = self
                    .last_string
                    .and_then(|address| image.read_c_string(address, max_len));
                let Some(name) = name else {
                    self.stats.ignored_calls += 1;
                    return;
                };

                let building = WalkerState::Building(StructRecord::new(name));
                if let WalkerState::Building(open) = std::mem::replace(&mut self.state, building) {
                    debug!(
                        "Discarding unsealed struct {} ({} fields)",
                        open.name,
                        open.fields.len()
                    );
                    self.stats.discarded += 1;
                }
            }
            MarkerRole::EndStruct => match std::mem::take(&mut self.state) {
                WalkerState::Building(record) => {
                    debug!("  {} ({} fields)", record.name, record.fields.len());
                    self.completed.push(record);
                }
                WalkerState::Idle => self.stats.ignored_calls += 1,
            },
            _ => match (&mut self.state, role.field_kind()) {
                (WalkerState::Building(record), Some(kind)) => record.fields.push(kind),
                _ => self.stats.ignored_calls += 1,
            },
        }
    }

    /// Close the walk, dropping any struct that was never sealed
    pub fn finish(mut self) -> (SchemaModel, WalkStats) {
        if let WalkerState::Building(open) = std::mem::take(&mut self.state) {
            debug!(
                "Discarding unsealed struct {} at end of image ({} fields)",
                open.name,
                open.fields.len()
            );
            self.stats.discarded += 1;
        }
        (self.completed, self.stats)
    }
}

/// Single forward pass over a module image.
pub struct StructWalker<'a, I: ?Sized, D> {
    image: &'a I,
    catalog: &'a MarkerCatalog,
    decoder: D,
    options: WalkOptions,
}

impl<'a, I: ModuleImage + ?Sized, D: Decoder> StructWalker<'a, I, D> {
    pub fn new(image: &'a I, catalog: &'a MarkerCatalog, decoder: D) -> Self {
        Self {
            image,
            catalog,
            decoder,
            options: WalkOptions::default(),
        }
    }

    pub fn with_options(mut self, options: WalkOptions) -> Self {
        self.options = options;
        self
    }

    /// Decode from the first byte to the last, returning every sealed struct.
    ///
    /// A failed decode advances the cursor by one byte and tries again, so the
    /// walk performs at most `size` decode attempts.
    pub fn walk(mut self) -> (SchemaModel, WalkStats) {
        let base = self.image.base_address();
        let bytes = self.image.bytes();
        let mut context = WalkContext::new(self.options);

        info!(
            "Walking instructions 0x{:X} - 0x{:X}",
            base,
            self.image.end_address()
        );

        let mut offset = 0usize;
        while offset < bytes.len() {
            let address = base + offset as u64;
            match self.decoder.decode(address, &bytes[offset..]) {
                Some(instr) if instr.length > 0 => {
                    context.observe(&instr, self.catalog, self.image);
                    offset += instr.length;
                }
                _ => {
                    context.stats.resync_bytes += 1;
                    offset += 1;
                }
            }
        }

        let (schema, stats) = context.finish();
        info!(
            "Found {} structs ({} instructions, {} marker calls, {} discarded)",
            schema.len(),
            stats.decoded,
            stats.marker_calls,
            stats.discarded
        );
        (schema, stats)
    }
}
