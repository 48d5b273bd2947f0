//! Rendering recovered structs to source files.

mod csharp;
mod json;

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};
use tracing::debug;

use crate::error::Result;
use crate::schema::{SchemaModel, StructRecord};

pub use csharp::{CSharpEmitter, DEFAULT_NAMESPACE};
pub use json::JsonEmitter;

/// Trait for schema output formats
///
/// Each struct renders to one standalone file.
pub trait SchemaEmitter {
    /// File extension without the dot
    fn extension(&self) -> &'static str;

    /// Render a single struct
    fn render(&self, record: &StructRecord) -> String;
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    EnumIter,
    EnumString,
    IntoStaticStr,
    Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum EmitFormat {
    #[default]
    #[strum(to_string = "cs", serialize = "csharp")]
    #[serde(rename = "cs", alias = "csharp")]
    CSharp,
    Json,
}

impl EmitFormat {
    pub fn emitter(&self, namespace: Option<&str>) -> Box<dyn SchemaEmitter> {
        match self {
            Self::CSharp => Box::new(CSharpEmitter::new(namespace.unwrap_or(DEFAULT_NAMESPACE))),
            Self::Json => Box::new(JsonEmitter),
        }
    }
}

/// File name stem for a struct, restricted to `[A-Za-z0-9_.-]`
pub fn file_stem(name: &str) -> String {
    let stem: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();

    match stem.trim_matches('.') {
        "" => "_".to_string(),
        trimmed => trimmed.to_string(),
    }
}

/// Write one file per struct into `dir`, creating it if needed.
///
/// Returns the written paths in schema order.
pub fn write_schema<P: AsRef<Path>>(
    dir: P,
    schema: &SchemaModel,
    emitter: &dyn SchemaEmitter,
) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;

    let mut written = Vec::with_capacity(schema.len());
    for record in schema {
        let path = dir.join(format!("{}.{}", file_stem(&record.name), emitter.extension()));
        fs::write(&path, emitter.render(record))?;
        debug!("Wrote {}", path.display());
        written.push(path);
    }

    Ok(written)
}
