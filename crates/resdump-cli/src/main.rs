mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use resdump_core::EmitFormat;
use tracing_subscriber::EnvFilter;

use commands::ImageSource;

#[derive(Parser)]
#[command(name = "resdump")]
#[command(about = "Recover resource table structs from a game module")]
#[command(version)]
struct Args {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Recover structs and write one schema file per struct
    Dump {
        /// Path to the module (e.g. SoulWorker64.dll)
        module: PathBuf,

        /// Marker pattern catalog (JSON)
        #[arg(short, long, env = "RESDUMP_MARKERS")]
        markers: PathBuf,

        /// Output directory (default: timestamped folder next to the executable)
        #[arg(short, long, env = "RESDUMP_OUTPUT")]
        output: Option<PathBuf>,

        /// Output format (cs, json)
        #[arg(short, long, default_value = "cs")]
        format: EmitFormat,

        /// Namespace for generated C# classes
        #[arg(long)]
        namespace: Option<String>,

        /// How to obtain the module image
        #[arg(long, value_enum, default_value_t = ImageSource::default())]
        source: ImageSource,

        /// Instruction set width of the module
        #[arg(long, default_value_t = 64)]
        bits: u32,
    },

    /// Resolve marker patterns and print their addresses
    Markers {
        module: PathBuf,

        #[arg(short, long, env = "RESDUMP_MARKERS")]
        markers: PathBuf,

        #[arg(long, value_enum, default_value_t = ImageSource::default())]
        source: ImageSource,
    },

    /// Search the module for a byte pattern (e.g. "48 8B ?? E8")
    Scan {
        module: PathBuf,

        #[arg(short, long)]
        pattern: String,

        /// Maximum number of matches to print
        #[arg(short, long, default_value_t = 20)]
        limit: usize,

        #[arg(long, value_enum, default_value_t = ImageSource::default())]
        source: ImageSource,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive(format!("resdump={}", level).parse()?)
                .add_directive(format!("resdump_core={}", level).parse()?),
        )
        .init();

    match args.command {
        Command::Dump {
            module,
            markers,
            output,
            format,
            namespace,
            source,
            bits,
        } => commands::dump::run(commands::dump::DumpArgs {
            module,
            markers,
            output,
            format,
            namespace,
            source,
            bits,
        }),
        Command::Markers {
            module,
            markers,
            source,
        } => commands::markers::run(&module, &markers, source),
        Command::Scan {
            module,
            pattern,
            limit,
            source,
        } => commands::scan::run(&module, &pattern, limit, source),
    }
}
