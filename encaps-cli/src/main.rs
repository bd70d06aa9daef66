use anyhow::Result;
use clap::{Parser, Subcommand};
use encaps_cli::{commands, pack::PackOptions, OutputFormat};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "encaps")]
#[command(about = "Encaps - Inspect and build encapsulated pixel data", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the offset table, fragments and frames of an encapsulated value
    Inspect {
        /// Input file ("-" for stdin)
        #[arg(short, long)]
        input: String,

        /// Number of frames, needed when the offset table is empty
        #[arg(short = 'n', long)]
        frames: Option<usize>,

        /// Fail on unrecognised tags and truncated items
        #[arg(long)]
        strict: bool,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Write each frame to its own file
    Extract {
        /// Input file ("-" for stdin)
        #[arg(short, long)]
        input: String,

        /// Directory for the frame files
        #[arg(short, long)]
        output_dir: String,

        /// Number of frames, needed when the offset table is empty
        #[arg(short = 'n', long)]
        frames: Option<usize>,

        /// Fail on unrecognised tags and truncated items
        #[arg(long)]
        strict: bool,

        /// Show a progress bar
        #[arg(long)]
        progress: bool,
    },

    /// Encapsulate frame files, one frame per file
    Pack {
        /// Frame files, in order
        #[arg(required = true)]
        inputs: Vec<String>,

        /// Output file for the encapsulated value
        #[arg(short, long)]
        output: String,

        /// Fragments per frame
        #[arg(long, default_value = "1")]
        fragments: usize,

        /// Leave the Basic Offset Table empty
        #[arg(long)]
        no_offset_table: bool,

        /// Write an Extended Offset Table to <output>.eot and <output>.eotl
        #[arg(long, conflicts_with = "no_offset_table")]
        extended: bool,
    },

    /// Join all fragments into one buffer
    Defrag {
        /// Input file ("-" for stdin)
        #[arg(short, long)]
        input: String,

        /// Output file
        #[arg(short, long)]
        output: String,

        /// Fail on unrecognised tags and truncated items
        #[arg(long)]
        strict: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    // Execute command
    match cli.command {
        Commands::Inspect {
            input,
            frames,
            strict,
            format,
        } => commands::inspect::execute(&input, frames, strict, format).map(|_| ()),

        Commands::Extract {
            input,
            output_dir,
            frames,
            strict,
            progress,
        } => commands::extract::execute(&input, &output_dir, frames, strict, progress).map(|_| ()),

        Commands::Pack {
            inputs,
            output,
            fragments,
            no_offset_table,
            extended,
        } => commands::pack::execute(
            &inputs,
            &output,
            PackOptions {
                fragments_per_frame: fragments,
                offset_table: !no_offset_table,
                extended,
            },
        )
        .map(|_| ()),

        Commands::Defrag {
            input,
            output,
            strict,
        } => commands::defrag::execute(&input, &output, strict).map(|_| ()),
    }
}
