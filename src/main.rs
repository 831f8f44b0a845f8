use clap::Parser;
use cli::{Cli, MainCommand};
use memmap2::Mmap;
use std::fs::File;
use std::io::{self, IsTerminal};
use std::path::Path;
use std::process;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;
mod decoder;
mod dwarf;
mod elf;
mod error;
mod layout;
mod output;
mod utils;

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(format!("elfwalk={level}")));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .without_time()
        .init();
}

fn map_file(path: &Path) -> io::Result<Mmap> {
    let file = File::open(path)?;
    // The map is read only and we never hand out references that outlive it.
    unsafe { Mmap::map(&file) }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    utils::set_plain(cli.plain || !io::stdout().is_terminal());

    let bytes = match map_file(&cli.file) {
        Ok(bytes) => bytes,
        Err(err) => {
            utils::warn(&format!("couldn't load {}: {err}", cli.file.display()));
            process::exit(1);
        }
    };
    let decoded = match decoder::decode(&bytes, &cli.limits()) {
        Ok(decoded) => decoded,
        Err(err) => {
            utils::warn(&format!("couldn't decode {}: {err}", cli.file.display()));
            process::exit(1);
        }
    };

    let out = io::stdout().lock();
    match &cli.command {
        None => commands::summary(out, &decoded),
        Some(MainCommand::Header(args)) => commands::elf_header(out, &decoded, args),
        Some(MainCommand::Segments(args)) => commands::elf_segments(out, &decoded, args),
        Some(MainCommand::Sections(args)) => commands::elf_sections(out, &decoded, args),
        Some(MainCommand::Symbols(args)) => commands::elf_symbols(out, &decoded, args),
        Some(MainCommand::Dynamic(args)) => commands::elf_dynamic(out, &decoded, args),
        Some(MainCommand::Strings(args)) => commands::elf_strings(out, &decoded, args),
        Some(MainCommand::Frames(args)) => commands::frames(out, &decoded, args),
        Some(MainCommand::Layout(args)) => commands::layout(out, &decoded, args),
        Some(MainCommand::Fields(args)) => commands::fields(out, &decoded, args),
        Some(MainCommand::Diagnostics(args)) => commands::diagnostics(out, &decoded, args),
    }
}
