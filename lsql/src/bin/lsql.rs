//! Command-line front end: `lsql <query> [directory]`.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use lsql::present::colorize;
use lsql_eval::Table;

/// SQL-flavored queries over the filesystem.
#[derive(Parser)]
#[command(name = "lsql", version, about = "SQL-flavored queries over the filesystem")]
struct Cli {
    /// The query to run, e.g. "select name, size where size > 1m"
    query: String,

    /// Working directory the query runs against; overridden by an explicit FROM
    directory: Option<PathBuf>,

    /// Disable ANSI colorization of tagged columns (name, path, ...)
    #[arg(long)]
    no_color: bool,

    /// Increase log verbosity (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress warnings, e.g. permission-denied paths skipped during the walk
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.quiet {
        log::LevelFilter::Error
    } else {
        match cli.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        }
    };
    env_logger::Builder::new().filter_level(level).init();

    let root = cli
        .directory
        .as_deref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| ".".to_string());

    match lsql::run_in(&cli.query, &root) {
        Ok(table) => {
            print_table(&table, !cli.no_color);
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("lsql: {}", err);
            ExitCode::FAILURE
        }
    }
}

fn print_table(table: &Table, color: bool) {
    for row in &table.rows {
        let cells: Vec<String> = row
            .iter()
            .map(|v| {
                let text = v.to_string();
                if color {
                    colorize(v, &text)
                } else {
                    text
                }
            })
            .collect();
        println!("{}", cells.join("\t"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }
}
