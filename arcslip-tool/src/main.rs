use std::path::PathBuf;

use arcslip_lib::{BuildError, BuildRequest, ErrorKind};
use clap::Parser;
use tracing::Level;

mod process;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Create an archive with a directory traversal on one file",
    long_about = None
)]
pub struct Cli {
    /// Traversal path to apply (e.g. "../../../../test")
    #[arg(short, long)]
    pub path: String,

    /// File that will receive the traversal path (must be among the input files)
    #[arg(short, long)]
    pub target: PathBuf,

    /// Output archive name [zip|jar|tar|tar.gz|tgz|tar.bz2]
    #[arg(short = 'f', long)]
    pub output: PathBuf,

    /// Deflate zip/jar entries instead of storing them
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub compress: bool,

    /// Dry run (print the planned entries, write nothing)
    #[arg(short, long, action = clap::ArgAction::SetTrue)]
    pub dry: bool,

    /// More log output (repeatable)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, action = clap::ArgAction::SetTrue, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Files to include in the archive
    #[arg(required = true, num_args = 1..)]
    pub files: Vec<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let request = cli_to_request(&cli);
    if let Err(err) = process::run(&request, cli.dry) {
        if let Some(build_err) = err.downcast_ref::<BuildError>() {
            eprintln!("Error: {err:#}");
            std::process::exit(exit_code(build_err.kind()));
        }
        return Err(err);
    }
    Ok(())
}

fn init_tracing(verbose: u8, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn exit_code(kind: ErrorKind) -> i32 {
    match kind {
        ErrorKind::Validation => 2,
        ErrorKind::UnsupportedFormat => 3,
        ErrorKind::ArchiveWrite => 1,
    }
}

/// Converts CLI struct into a build request
fn cli_to_request(cli: &Cli) -> BuildRequest {
    BuildRequest {
        files: cli.files.clone(),
        target: cli.target.clone(),
        traversal: cli.path.clone(),
        output: cli.output.clone(),
        compress: cli.compress,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_short_flags() {
        let cli = Cli::try_parse_from([
            "arcslip", "-p", "../../tmp/evil", "-t", "a.txt", "-f", "x.zip", "a.txt", "b.txt",
        ])
        .unwrap();

        let request = cli_to_request(&cli);
        assert_eq!(request.traversal, "../../tmp/evil");
        assert_eq!(request.target, PathBuf::from("a.txt"));
        assert_eq!(request.output, PathBuf::from("x.zip"));
        assert_eq!(request.files, [PathBuf::from("a.txt"), PathBuf::from("b.txt")]);
        assert!(!request.compress);
        assert!(!cli.dry);
    }

    #[test]
    fn parses_long_flags() {
        let cli = Cli::try_parse_from([
            "arcslip",
            "--path",
            "../x",
            "--target",
            "a.txt",
            "--output",
            "x.tar.gz",
            "--compress",
            "--dry",
            "-vv",
            "a.txt",
        ])
        .unwrap();

        assert!(cli.compress);
        assert!(cli.dry);
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn requires_files_and_flags() {
        assert!(Cli::try_parse_from(["arcslip", "-p", "../x", "-t", "a", "-f", "x.zip"]).is_err());
        assert!(Cli::try_parse_from(["arcslip", "-t", "a", "-f", "x.zip", "a"]).is_err());
        assert!(Cli::try_parse_from(["arcslip", "-p", "../x", "-f", "x.zip", "a"]).is_err());
        assert!(Cli::try_parse_from(["arcslip", "-p", "../x", "-t", "a", "a"]).is_err());
    }

    #[test]
    fn exit_codes_distinguish_error_kinds() {
        assert_eq!(exit_code(ErrorKind::Validation), 2);
        assert_eq!(exit_code(ErrorKind::UnsupportedFormat), 3);
        assert_eq!(exit_code(ErrorKind::ArchiveWrite), 1);
    }
}
