//! Marker functions and the catalog that locates them.
//!
//! A marker is a function in the target module whose role is known: it opens
//! a struct read, closes it (the checksum call), or reads one primitive field.
//! Markers are found by masked byte patterns, which are specific to one build
//! of the target and supplied as a JSON file:
//!
//! ```json
//! {
//!   "build": "SoulWorker64 2024-05",
//!   "markers": [
//!     { "role": "begin_struct", "pattern": "40 53 48 83 EC 20 48 8B D9 E8 ?? ?? ?? ??" },
//!     { "role": "end_struct",   "pattern": "48 89 5C 24 08 57 48 83 EC 20 8B 41 ??" }
//!   ]
//! }
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::image::ModuleImage;
use crate::pattern::{Pattern, find_first};
use crate::schema::FieldKind;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    EnumIter,
    EnumString,
    IntoStaticStr,
    Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MarkerRole {
    BeginStruct,
    EndStruct,
    #[strum(serialize = "read_uint8")]
    #[serde(rename = "read_uint8")]
    ReadUInt8,
    ReadInt16,
    #[strum(serialize = "read_uint16")]
    #[serde(rename = "read_uint16")]
    ReadUInt16,
    ReadInt32,
    #[strum(serialize = "read_uint32")]
    #[serde(rename = "read_uint32")]
    ReadUInt32,
    ReadSingle,
    ReadString,
}

impl MarkerRole {
    /// Field kind produced by a call to this marker, if it is a reader
    pub fn field_kind(&self) -> Option<FieldKind> {
        match self {
            Self::BeginStruct | Self::EndStruct => None,
            Self::ReadUInt8 => Some(FieldKind::UInt8),
            Self::ReadInt16 => Some(FieldKind::Int16),
            Self::ReadUInt16 => Some(FieldKind::UInt16),
            Self::ReadInt32 => Some(FieldKind::Int32),
            Self::ReadUInt32 => Some(FieldKind::UInt32),
            Self::ReadSingle => Some(FieldKind::Single),
            Self::ReadString => Some(FieldKind::String),
        }
    }

    pub fn name(&self) -> &'static str {
        self.into()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerPattern {
    pub role: MarkerRole,
    pub pattern: Pattern,
}

/// Pattern definitions for every marker role of one target build.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerPatterns {
    #[serde(default)]
    pub build: String,
    pub markers: Vec<MarkerPattern>,
}

impl MarkerPatterns {
    pub fn pattern(&self, role: MarkerRole) -> Option<&Pattern> {
        self.markers
            .iter()
            .find(|marker| marker.role == role)
            .map(|marker| &marker.pattern)
    }

    /// Require exactly one pattern per role
    pub fn validate(&self) -> Result<()> {
        let mut counts: HashMap<MarkerRole, usize> = HashMap::new();
        for marker in &self.markers {
            *counts.entry(marker.role).or_default() += 1;
        }

        for role in MarkerRole::iter() {
            match counts.get(&role).copied().unwrap_or(0) {
                0 => return Err(Error::MissingMarkerPattern(role)),
                1 => {}
                _ => return Err(Error::DuplicateMarkerPattern(role)),
            }
        }
        Ok(())
    }
}

pub fn load_markers<P: AsRef<Path>>(path: P) -> Result<MarkerPatterns> {
    let content = fs::read_to_string(&path)?;
    let data = serde_json::from_str(&content)?;
    Ok(data)
}

pub fn save_markers<P: AsRef<Path>>(path: P, markers: &MarkerPatterns) -> Result<()> {
    let content = serde_json::to_string_pretty(markers)?;
    fs::write(path, content)?;
    Ok(())
}

/// Resolved marker addresses. Immutable once built.
///
/// Several roles may share one address when the linker folds identical
/// function bodies. Roles at an address are kept in declaration order, which
/// is also the order a call is classified in.
#[derive(Debug, Clone)]
pub struct MarkerCatalog {
    addresses: Vec<(MarkerRole, u64)>,
    by_address: HashMap<u64, Vec<MarkerRole>>,
}

impl MarkerCatalog {
    /// Locate every marker role in `image`.
    ///
    /// Fails on the first role without exactly one pattern, or whose pattern
    /// does not occur in the image.
    pub fn resolve<I: ModuleImage + ?Sized>(patterns: &MarkerPatterns, image: &I) -> Result<Self> {
        patterns.validate()?;

        let mut resolved = Vec::new();
        for role in MarkerRole::iter() {
            let pattern = patterns
                .pattern(role)
                .ok_or(Error::MissingMarkerPattern(role))?;

            let address = find_first(image, pattern).ok_or_else(|| Error::MarkerNotFound {
                role,
                pattern: pattern.to_string(),
            })?;
            debug!("  {}: 0x{:X}", role, address);
            resolved.push((role, address));
        }

        let catalog = Self::from_addresses(resolved)?;
        info!("Resolved {} markers", catalog.addresses.len());
        Ok(catalog)
    }

    /// Build a catalog from already known addresses; every role must be present once.
    pub fn from_addresses<T>(addresses: T) -> Result<Self>
    where
        T: IntoIterator<Item = (MarkerRole, u64)>,
    {
        let mut by_role: HashMap<MarkerRole, u64> = HashMap::new();
        for (role, address) in addresses {
            if by_role.insert(role, address).is_some() {
                return Err(Error::DuplicateMarkerPattern(role));
            }
        }

        let mut resolved = Vec::new();
        let mut by_address: HashMap<u64, Vec<MarkerRole>> = HashMap::new();
        for role in MarkerRole::iter() {
            let address = by_role
                .get(&role)
                .copied()
                .ok_or(Error::MissingMarkerPattern(role))?;
            resolved.push((role, address));
            by_address.entry(address).or_default().push(role);
        }

        let mut shared: Vec<(&u64, &Vec<MarkerRole>)> =
            by_address.iter().filter(|(_, roles)| roles.len() > 1).collect();
        shared.sort_unstable_by_key(|(address, _)| **address);
        for (address, roles) in shared {
            let names: Vec<&str> = roles.iter().map(MarkerRole::name).collect();
            warn!(
                "Markers {} share address 0x{:X}; calls there count as {}",
                names.join(", "),
                address,
                roles[0]
            );
        }

        Ok(Self {
            addresses: resolved,
            by_address,
        })
    }

    pub fn address(&self, role: MarkerRole) -> u64 {
        self.addresses
            .iter()
            .find(|(r, _)| *r == role)
            .map(|(_, address)| *address)
            .unwrap_or_default()
    }

    /// Roles of the markers at `address` in classification order; empty if none
    pub fn classify(&self, address: u64) -> &[MarkerRole] {
        self.by_address
            .get(&address)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Roles and addresses in role order
    pub fn iter(&self) -> impl Iterator<Item = (MarkerRole, u64)> + '_ {
        self.addresses.iter().copied()
    }
}
