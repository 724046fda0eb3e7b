//! Xtract CLI

use std::fmt::Write as _;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{bail, Context};
use tracing_subscriber::EnvFilter;

use xtract::config::{Config, OutputConfig};
use xtract::extraction::{ExtractionFile, Values};

fn usage() -> ! {
    eprintln!("Xtract v{}", env!("CARGO_PKG_VERSION"));
    eprintln!();
    eprintln!("Usage: xtract <command> <file> [options]");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  info <file>                Show header, fields and timestep count");
    eprintln!("  times <file>               List timestep values");
    eprintln!("  dump <file> <timestep>     Print every site of one timestep");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --config <path>            TOML file with [limits] and [output]");
    eprintln!();
    eprintln!("Set RUST_LOG=debug for decoding details.");
    process::exit(1);
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    if let Err(e) = run() {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let mut args: Vec<String> = std::env::args().skip(1).collect();

    let config = match args.iter().position(|a| a == "--config") {
        Some(i) => {
            if i + 1 >= args.len() {
                usage();
            }
            let path = PathBuf::from(args.remove(i + 1));
            args.remove(i);
            Config::from_file(&path)
                .with_context(|| format!("loading config {}", path.display()))?
        }
        None => Config::default(),
    };

    if args.len() < 2 {
        usage();
    }

    let path = PathBuf::from(&args[1]);
    let extraction = open(&path, &config)?;

    match args[0].as_str() {
        "info" => show_info(&extraction),
        "times" => show_times(&extraction),
        "dump" => {
            let Some(time_step) = args.get(2) else {
                usage();
            };
            let time_step: u64 = time_step
                .parse()
                .with_context(|| format!("invalid timestep '{time_step}'"))?;
            dump(&extraction, time_step, &config.output)
        }
        other => {
            eprintln!("Unknown command: {other}");
            eprintln!("Run 'xtract' for usage information.");
            process::exit(1);
        }
    }
}

fn open(path: &Path, config: &Config) -> anyhow::Result<ExtractionFile> {
    if !path.exists() {
        bail!("file not found: {}", path.display());
    }
    ExtractionFile::open_with_limits(path, &config.limits)
        .with_context(|| format!("opening {}", path.display()))
}

fn show_info(extraction: &ExtractionFile) -> anyhow::Result<()> {
    let metadata = extraction.metadata();
    let mut out = BufWriter::new(io::stdout().lock());

    writeln!(out, "File:        {}", extraction.path().display())?;
    writeln!(out, "Version:     {}", u32::from(metadata.version))?;
    writeln!(out, "Voxel size:  {} m", metadata.voxel_size_metres)?;
    writeln!(
        out,
        "Origin:      ({}, {}, {}) m",
        metadata.origin_metres[0], metadata.origin_metres[1], metadata.origin_metres[2]
    )?;
    writeln!(out, "Sites:       {}", metadata.site_count)?;
    writeln!(out, "Timesteps:   {}", extraction.time_count())?;
    writeln!(out, "Record size: {} bytes", extraction.record_length())?;
    writeln!(out)?;
    writeln!(
        out,
        "{:<16} {:>6} {:>6} {:>6} {:>8}",
        "field", "disk", "memory", "length", "offset"
    )?;

    for field in extraction.field_spec().iter() {
        let disk = field
            .disk_type
            .map_or_else(|| "-".to_string(), |ty| ty.to_string());
        let offset = field
            .offset
            .map_or_else(|| "-".to_string(), |o| o.to_string());
        writeln!(
            out,
            "{:<16} {:>6} {:>6} {:>6} {:>8}",
            field.name, disk, field.memory_type, field.length, offset
        )?;
    }

    out.flush()?;
    Ok(())
}

fn show_times(extraction: &ExtractionFile) -> anyhow::Result<()> {
    let mut out = BufWriter::new(io::stdout().lock());
    for t in extraction.time_index().times() {
        writeln!(out, "{t}")?;
    }
    out.flush()?;
    Ok(())
}

fn dump(extraction: &ExtractionFile, time_step: u64, output: &OutputConfig) -> anyhow::Result<()> {
    let record = extraction.lookup_by_time_step(time_step)?;
    let sep = output.delimiter.as_str();
    let precision = output.precision;
    let mut out = BufWriter::new(io::stdout().lock());

    let mut header = format!("id{sep}x{sep}y{sep}z{sep}i{sep}j{sep}k");
    for column in record.columns() {
        if column.length == 1 {
            write!(header, "{sep}{}", column.name)?;
        } else {
            for i in 0..column.length {
                write!(header, "{sep}{}[{i}]", column.name)?;
            }
        }
    }
    writeln!(out, "{header}")?;

    let mut line = String::new();
    for site in record.sites() {
        line.clear();
        let [x, y, z] = site.position();
        let [i, j, k] = site.grid();
        write!(
            line,
            "{}{sep}{x:.precision$}{sep}{y:.precision$}{sep}{z:.precision$}{sep}{i}{sep}{j}{sep}{k}",
            site.id()
        )?;
        for (_, values) in site.values() {
            push_values(&mut line, values, sep, precision)?;
        }
        writeln!(out, "{line}")?;
    }

    out.flush()?;
    Ok(())
}

fn push_values(
    line: &mut String,
    values: Values<'_>,
    sep: &str,
    precision: usize,
) -> std::fmt::Result {
    for value in values.to_f64_vec() {
        write!(line, "{sep}{value:.precision$}")?;
    }
    Ok(())
}
