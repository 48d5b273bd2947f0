//! Dump command implementation.

use std::collections::HashMap;
use std::fmt::Display;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Local, TimeZone};
use owo_colors::OwoColorize;
use resdump_core::{AnalysisOptions, EmitFormat, SchemaModel, analyze, load_markers, write_schema};
use tracing::{info, warn};

use super::{ImageSource, open_image};

pub struct DumpArgs {
    pub module: PathBuf,
    pub markers: PathBuf,
    pub output: Option<PathBuf>,
    pub format: EmitFormat,
    pub namespace: Option<String>,
    pub source: ImageSource,
    pub bits: u32,
}

/// Run the dump command
pub fn run(args: DumpArgs) -> Result<()> {
    let current_version = env!("CARGO_PKG_VERSION");
    println!("resdump {} - Dump Mode", current_version);

    let patterns = load_markers(&args.markers)
        .with_context(|| format!("Failed to load marker catalog {}", args.markers.display()))?;
    info!(
        "Loaded {} marker patterns (build: {})",
        patterns.markers.len(),
        patterns.build
    );

    // Resolve before opening the module: in-process loading changes the working directory
    let output = match args.output {
        Some(path) => std::path::absolute(path)?,
        None => default_output_dir()?,
    };

    let image = open_image(&args.module, args.source)?;

    let options = AnalysisOptions::builder().bitness(args.bits).build();
    println!("Finding markers and looking for structs...");
    let analysis = analyze(&*image, &patterns, &options)?;

    warn_duplicate_names(&analysis.schema);

    let emitter = args.format.emitter(args.namespace.as_deref());
    println!("Dumping structs to files...");
    let written = write_schema(&output, &analysis.schema, emitter.as_ref())?;

    println!(
        "Dumped {} structs to {}",
        written.len().to_string().green(),
        output.display()
    );
    if analysis.stats.discarded > 0 {
        println!(
            "{}",
            format!(
                "{} structs were opened but never closed and were skipped",
                analysis.stats.discarded
            )
            .yellow()
        );
    }

    Ok(())
}

/// `<exe dir>/<dd-mm-YYYY HH.MM.SS>`
fn default_output_dir() -> Result<PathBuf> {
    let exe = std::env::current_exe()?;
    let dir = exe.parent().map(Path::to_path_buf).unwrap_or_default();
    Ok(dir.join(timestamp_dir_name(&Local::now())))
}

pub fn timestamp_dir_name<Tz: TimeZone>(now: &DateTime<Tz>) -> String
where
    Tz::Offset: Display,
{
    now.format("%d-%m-%Y %H.%M.%S").to_string()
}

/// Later structs with the same name overwrite earlier files
fn warn_duplicate_names(schema: &SchemaModel) {
    for (name, count) in duplicate_names(schema) {
        warn!("Struct {} was found {} times; only the last one is written", name, count);
    }
}

/// Names occurring more than once, with their counts, sorted by name
fn duplicate_names(schema: &SchemaModel) -> Vec<(&str, usize)> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for record in schema {
        *counts.entry(record.name.as_str()).or_default() += 1;
    }

    let mut duplicates: Vec<(&str, usize)> = counts.into_iter().filter(|(_, n)| *n > 1).collect();
    duplicates.sort_unstable();
    duplicates
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_timestamp_dir_name() {
        let now = Utc.with_ymd_and_hms(2024, 5, 3, 14, 7, 9).unwrap();
        assert_eq!(timestamp_dir_name(&now), "03-05-2024 14.07.09");
    }

    #[test]
    fn test_duplicate_names() {
        let schema: SchemaModel = serde_json::from_str(
            r#"[
                {"name": "tb_Item", "fields": ["uint8"]},
                {"name": "tb_Npc", "fields": []},
                {"name": "tb_Item", "fields": ["string"]},
                {"name": "tb_Buff", "fields": []},
                {"name": "tb_Buff", "fields": []},
                {"name": "tb_Item", "fields": []}
            ]"#,
        )
        .unwrap();

        assert_eq!(duplicate_names(&schema), vec![("tb_Buff", 2), ("tb_Item", 3)]);
        warn_duplicate_names(&schema);
    }

    #[test]
    fn test_no_duplicate_names() {
        let schema: SchemaModel =
            serde_json::from_str(r#"[{"name": "tb_Item", "fields": []}]"#).unwrap();
        assert!(duplicate_names(&schema).is_empty());
        assert!(duplicate_names(&SchemaModel::new()).is_empty());
    }

    #[test]
    fn test_default_output_dir_is_next_to_executable() {
        let dir = default_output_dir().unwrap();
        let exe_dir = std::env::current_exe().unwrap().parent().unwrap().to_path_buf();
        assert_eq!(dir.parent(), Some(exe_dir.as_path()));
    }
}
