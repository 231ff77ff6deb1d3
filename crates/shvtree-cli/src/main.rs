//! Command line tools for SHV tree descriptions.
//!
//! Usage:
//!   shvtree size [FILE] [--json]
//!   shvtree check [FILE]... [--disable CHECK]... [--list]
//!
//! Without a file (or with `-`) the tree is read from stdin as YAML.

mod check;
mod size;

use std::io::{IsTerminal, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use shvtree::Tree;

use check::Check;

/// Silicon Heaven tree description tools
#[derive(Parser, Debug)]
#[command(name = "shvtree", version)]
struct Cli {
    /// log debug messages to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// print maximal chainpack size of every custom type
    Size {
        /// tree description file, stdin if omitted
        file: Option<PathBuf>,

        /// print the sizes as a JSON object
        #[arg(short, long)]
        json: bool,
    },
    /// look for style issues in tree descriptions
    Check {
        /// tree description files, stdin if none given
        files: Vec<PathBuf>,

        /// checks to skip (repeatable or comma separated)
        #[arg(short, long, value_enum, value_delimiter = ',')]
        disable: Vec<Check>,

        /// list available checks instead of checking
        #[arg(short, long)]
        list: bool,
    },
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.cmd {
        Command::Size { file, json } => {
            let tree = read_tree(file.as_deref())?;
            let sizes = size::sizes(&tree);
            if json {
                println!("{}", size::to_json(&sizes));
            } else {
                for line in size::to_lines(&sizes) {
                    println!("{line}");
                }
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Check {
            files,
            disable,
            list,
        } => {
            if list {
                for check in Check::ALL {
                    println!("{}", check.name());
                }
                return Ok(ExitCode::SUCCESS);
            }
            let enabled: Vec<Check> = Check::ALL
                .into_iter()
                .filter(|c| !disable.contains(c))
                .collect();
            let paths = if files.is_empty() {
                vec![None]
            } else {
                files.iter().map(|f| Some(f.as_path())).collect()
            };

            let mut clean = true;
            for path in paths {
                let tree = read_tree(path)?;
                let issues = check::check(&tree, &enabled);
                if !issues.is_empty() {
                    clean = false;
                    println!("Issues for '{}':", display_path(path));
                    for issue in issues {
                        println!("{issue}");
                    }
                }
            }
            if !clean {
                return Ok(ExitCode::FAILURE);
            }
            if std::io::stdout().is_terminal() {
                println!("No issues found.");
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn is_stdin(path: Option<&Path>) -> bool {
    path.is_none_or(|p| p == Path::new("-"))
}

fn display_path(path: Option<&Path>) -> String {
    match path {
        Some(p) if !is_stdin(path) => p.display().to_string(),
        _ => "-".to_string(),
    }
}

/// Loads a tree from a file, or YAML from stdin.
fn read_tree(path: Option<&Path>) -> Result<Tree> {
    match path {
        Some(p) if !is_stdin(path) => {
            shvtree::load(p).with_context(|| format!("Invalid input: {}", p.display()))
        }
        _ => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("failed to read stdin")?;
            shvtree::load_yaml(&text).context("Invalid input: -")
        }
    }
}
