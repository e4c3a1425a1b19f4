//! Command-line arguments.

use clap::{Parser, Subcommand, ValueEnum};
use page_stream::{Options, Width};
use std::path::PathBuf;

/// Format of the verbose report.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub(crate) enum Format {
    #[default]
    Text,
    Json,
    Csv,
}

#[derive(Debug, Parser)]
#[command(about, version)]
pub(crate) struct Args {
    #[command(subcommand)]
    pub(crate) command: Command,

    /// Print channel statistics to stderr.
    #[arg(short = 'v', long, global = true)]
    pub(crate) verbose: bool,

    /// Verbose report format.
    #[arg(
        short = 'f',
        long,
        default_value_t,
        value_enum,
        value_name = "FORMAT",
        global = true
    )]
    pub(crate) format: Format,

    /// Window alignment in bytes [env: PAGE_STREAM_PAGE_SIZE].
    #[arg(long, value_name = "BYTES", global = true)]
    pub(crate) page_size: Option<usize>,

    /// Initial buffer size in bytes [env: PAGE_STREAM_ALLOC_SIZE].
    #[arg(long, value_name = "BYTES", global = true)]
    pub(crate) alloc_size: Option<usize>,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Command {
    /// Print each record of a file on its own line.
    Lines {
        /// File to scan.
        #[arg(value_name = "PATH")]
        input: PathBuf,

        /// Code unit width in bytes: 1, 2 or 4.
        #[arg(short, long, default_value = "1", value_parser = parse_width)]
        width: Width,

        /// Split on this unit value instead of line terminators (decimal or 0x hex).
        #[arg(short, long, value_name = "VALUE", value_parser = parse_unit)]
        delimiter: Option<u32>,

        /// Print only the number of records.
        #[arg(short, long)]
        count: bool,
    },

    /// Copy a file through a reading and a writing channel.
    Copy {
        /// Source file.
        #[arg(value_name = "SOURCE")]
        input: PathBuf,

        /// Destination file.
        #[arg(value_name = "DEST")]
        output: PathBuf,

        /// Bytes requested per read.
        #[arg(short, long, default_value = "8192", value_parser = parse_chunk)]
        chunk: usize,

        /// Append to the destination instead of truncating it.
        #[arg(short, long)]
        append: bool,
    },

    /// Print the leading bits of a file, 64 per line.
    Bits {
        /// File to dump.
        #[arg(value_name = "PATH")]
        input: PathBuf,

        /// Number of bits to print.
        #[arg(short = 'n', long, default_value_t = 64)]
        count: u64,
    },
}

impl Args {
    /// Options from the environment with command-line overrides applied.
    pub(crate) fn options(&self) -> page_stream::Result<Options> {
        let mut options = Options::from_env();
        if let Some(page_size) = self.page_size {
            options = options.with_page_size(page_size);
        }
        if let Some(alloc_size) = self.alloc_size {
            options = options.with_alloc_size(alloc_size);
        }

        options.validate()?;
        Ok(options)
    }
}

fn parse_width(s: &str) -> Result<Width, String> {
    s.parse::<usize>()
        .ok()
        .and_then(Width::from_bytes)
        .ok_or_else(|| format!("width must be 1, 2 or 4, not {s:?}"))
}

fn parse_unit(s: &str) -> Result<u32, String> {
    let parsed = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .map_or_else(|| s.parse(), |hex| u32::from_str_radix(hex, 16));

    parsed.map_err(|err| format!("invalid delimiter {s:?}: {err}"))
}

fn parse_chunk(s: &str) -> Result<usize, String> {
    match s.parse::<usize>() {
        Ok(0) => Err("chunk size must be at least 1".to_string()),
        Ok(chunk) => Ok(chunk),
        Err(err) => Err(format!("invalid chunk size {s:?}: {err}")),
    }
}
