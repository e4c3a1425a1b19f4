//! `page-stream` scans, copies and dumps files through windowed channels.

pub(crate) mod args;
pub(crate) mod output;
pub(crate) mod verbose;

use std::path::Path;
use std::process;

use anyhow::{Context, Result};
use args::{Args, Command};
use clap::Parser;
use output::Output;
use page_stream::{BitChannel, Channel, ExitCode, Options, Width};
use verbose::{Report, Verbose};

fn main() -> process::ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) => {
            let code = ExitCode::from(&err);
            err.print().ok();
            return code.into();
        }
    };

    match run(&args) {
        Ok(()) => ExitCode::Success.into(),
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::from(&err).into()
        }
    }
}

fn run(args: &Args) -> Result<()> {
    let options = args.options()?;

    let reports = match &args.command {
        Command::Lines {
            input,
            width,
            delimiter,
            count,
        } => lines(input, *width, *delimiter, *count, options)?,
        Command::Copy {
            input,
            output,
            chunk,
            append,
        } => copy(input, output, *chunk, *append, options)?,
        Command::Bits { input, count } => bits(input, *count, options)?,
    };

    if args.verbose {
        Verbose::default().write_reports(&reports, args.format)?;
    }

    Ok(())
}

fn open(path: &Path, mode: &str, options: Options) -> Result<Channel> {
    Channel::with_options(path, mode, options)
        .with_context(|| format!("failed to open {} with mode {mode:?}", path.display()))
}

/// Writes each record on its own line, or just the record count.
fn lines(
    path: &Path,
    width: Width,
    delimiter: Option<u32>,
    count: bool,
    options: Options,
) -> Result<Vec<Report>> {
    let mut channel = open(path, "r", options)?;
    let mut output = Output::stdout();
    let mut records = 0_u64;

    loop {
        let record = match delimiter {
            Some(delimiter) => channel.get_delim(delimiter, width)?,
            None => channel.read_line(width)?,
        };
        let Some(record) = record else {
            break;
        };

        records += 1;
        if !count {
            output.write_chunk(record)?;
            output.write_chunk(b"\n")?;
        }
    }

    if count {
        output.write_chunk(format!("{records}\n").as_bytes())?;
    }
    output.flush()?;
    channel.close()?;

    Ok(vec![Report::from_channel(&channel, Some(records))])
}

/// Streams `input` into `output` in `chunk`-sized reads.
fn copy(
    input: &Path,
    output: &Path,
    chunk: usize,
    append: bool,
    options: Options,
) -> Result<Vec<Report>> {
    let mut source = open(input, "r", options)?;
    let mut dest = open(output, if append { "a" } else { "w" }, options)?;

    while let Some(bytes) = source.read(chunk)? {
        dest.write_all(bytes)
            .with_context(|| format!("failed to write {}", output.display()))?;
    }

    source.close()?;
    dest.close()
        .with_context(|| format!("failed to flush {}", output.display()))?;

    Ok(vec![
        Report::from_channel(&source, None),
        Report::from_channel(&dest, None),
    ])
}

/// Prints up to `count` bits, 64 per line.
fn bits(path: &Path, count: u64, options: Options) -> Result<Vec<Report>> {
    let channel = open(path, "r", options)?;
    let mut bits = BitChannel::new(channel);
    let mut line = String::new();
    let mut read = 0_u64;

    while read < count {
        let Some(bit) = bits.read_bit()? else {
            break;
        };
        line.push(if bit { '1' } else { '0' });
        read += 1;
        if read % 64 == 0 {
            line.push('\n');
        }
    }
    if !line.is_empty() && !line.ends_with('\n') {
        line.push('\n');
    }

    let mut output = Output::stdout();
    output.write_chunk(line.as_bytes())?;
    output.flush()?;
    bits.close()?;

    Ok(vec![Report::from_channel(bits.channel(), Some(read))])
}
