//! Command line definitions.
use crate::decoder::Limits;
use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(version, about = "Walks the structure of an ELF file", long_about = None)]
#[command(infer_subcommands(true))] // allow abreviations
pub struct Cli {
    /// Path to the file to decode
    pub file: PathBuf,

    /// Don't color output
    #[arg(long, global = true)]
    pub plain: bool,

    /// Log more, repeat for even more (RUST_LOG overrides this)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Most entries to read from any one table
    #[arg(long, global = true, default_value_t = Limits::default().max_entries)]
    pub max_entries: usize,

    /// Defaults to a summary of the header, layout, and diagnostics
    #[command(subcommand)]
    pub command: Option<MainCommand>,
}

impl Cli {
    pub fn limits(&self) -> Limits {
        Limits {
            max_entries: self.max_entries,
        }
    }
}

#[derive(Subcommand)]
pub enum MainCommand {
    /// Show the ELF header
    Header(ExplainArgs),

    /// Show program headers
    Segments(TableArgs),

    /// Show section headers
    Sections(TableArgs),

    /// Show symbols from .symtab and .dynsym
    Symbols(ListArgs),

    /// Show .dynamic entries
    Dynamic(ListArgs),

    /// Dump string tables
    Strings(StringsArgs),

    /// Show CIEs and FDEs from .eh_frame and the .eh_frame_hdr search table
    Frames(ListArgs),

    /// Show blackholes, overlaps, and how much of the file is accounted for
    Layout(TableArgs),

    /// Dump every decoded field with its offset and size
    Fields(FieldsArgs),

    /// Show warnings, errors, and notes found while decoding
    Diagnostics(DiagnosticsArgs),
}

#[derive(Args)]
pub struct ExplainArgs {
    /// Explain columns, fields, etc.
    #[arg(short, long)]
    pub explain: bool,
}

#[derive(Args)]
pub struct TableArgs {
    /// Explain columns, fields, etc.
    #[arg(short, long)]
    pub explain: bool,

    /// Add column headers
    #[arg(short, long)]
    pub titles: bool,
}

#[derive(Args)]
pub struct ListArgs {
    /// Explain columns, fields, etc.
    #[arg(short, long)]
    pub explain: bool,

    /// Add column headers
    #[arg(short, long)]
    pub titles: bool,

    /// Max number of rows to report for each table, 0 for unlimited
    #[arg(short, long, default_value_t = 0)]
    pub max_results: usize,
}

#[derive(Args)]
pub struct StringsArgs {
    /// Section index used to dump just one table
    #[arg(short, long)]
    pub index: Option<u32>,

    /// Max number of results to report for each table, 0 for unlimited
    #[arg(short, long, default_value_t = 10)]
    pub max_results: usize,
}

#[derive(Args)]
pub struct FieldsArgs {
    /// Skip fields nested deeper than this
    #[arg(short, long)]
    pub depth: Option<u8>,

    /// Max number of fields to report, 0 for unlimited
    #[arg(short, long, default_value_t = 0)]
    pub max_results: usize,
}

#[derive(Args)]
pub struct DiagnosticsArgs {
    /// Skip notes
    #[arg(short, long)]
    pub quiet: bool,
}

/// Max results of zero means no limit.
pub fn limit(max_results: usize) -> usize {
    if max_results == 0 { usize::MAX } else { max_results }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse() {
        let cli = Cli::try_parse_from(["elfwalk", "a.out", "sym", "-t", "-m", "5", "--plain"]).unwrap();
        assert!(cli.plain);
        assert_eq!(cli.limits(), Limits::default());
        match cli.command {
            Some(MainCommand::Symbols(args)) => {
                assert!(args.titles);
                assert_eq!(args.max_results, 5);
            }
            _ => panic!("expected symbols"),
        }

        let cli = Cli::try_parse_from(["elfwalk", "-vv", "--max-entries", "8", "a.out"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.limits().max_entries, 8);
        assert!(cli.command.is_none());
    }
}
