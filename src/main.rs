use clap::{Parser, Subcommand};
use serde::Serialize;
use std::io::{self, Write};
use std::path::PathBuf;
use svnview::config::Config;
use svnview::svn::create_repository;
use svnview::{AppResult, Repository, Revision, SvnExecutor, SvnVersion};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "svnview", about = "Read-only JSON view of a Subversion repository")]
struct Cli {
    /// Absolute path of the repository on disk
    #[arg(long, global = true)]
    repo: Option<PathBuf>,

    /// Config file to use instead of ~/.config/svnview/config.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List branches, trunk last
    Branches,
    /// Resolve a path to a file or a directory listing
    Tree {
        #[arg(default_value = "")]
        path: String,
        #[arg(long, default_value = "HEAD")]
        rev: String,
    },
    /// Print the raw contents of a file
    Show {
        path: String,
        #[arg(long, default_value = "HEAD")]
        rev: String,
    },
    /// List commits with their diffs
    Log {
        #[arg(long, default_value = "HEAD")]
        rev: String,
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long, default_value_t = 0)]
        offset: usize,
        #[arg(long, default_value = "")]
        path: String,
    },
    /// Show one commit with its diff
    Commit { rev: String },
    /// Show the diff of one revision
    Diff {
        rev: String,
        #[arg(long)]
        parent: Option<String>,
    },
    /// Create a repository, optionally with trunk/tags/branches
    Create {
        path: PathBuf,
        #[arg(long)]
        layout: bool,
    },
    /// Print the installed svn version
    Version,
}

fn main() {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load_or_default(),
    };
    let config = match config {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    if let Err(e) = run(cli, &config) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli, config: &Config) -> AppResult<()> {
    let executor = config.executor();

    match cli.command {
        Command::Version => {
            let version = SvnVersion::validate(&executor)?;
            println!("{}", version);
            Ok(())
        }
        Command::Create { path, layout } => {
            let location = create_repository(&executor, &path, layout)?;
            println!("{}", location);
            Ok(())
        }
        command => {
            let repo = match cli.repo {
                Some(path) => Repository::open(path, executor)?,
                None => Repository::unloaded(executor),
            };
            query(&repo, command, config)
        }
    }
}

fn query(repo: &Repository<SvnExecutor>, command: Command, config: &Config) -> AppResult<()> {
    match command {
        Command::Branches => print_json(&repo.branches()?),
        Command::Tree { path, rev } => {
            print_json(&repo.tree("HEAD", &path, Revision::sanitize(&rev))?)
        }
        Command::Show { path, rev } => {
            let content = repo.show(&path, Revision::sanitize(&rev))?;
            io::stdout().write_all(&content)?;
            Ok(())
        }
        Command::Log {
            rev,
            limit,
            offset,
            path,
        } => {
            let limit = limit.unwrap_or(config.log.default_limit);
            print_json(&repo.log(&rev, limit, offset, &path)?)
        }
        Command::Commit { rev } => print_json(&repo.show_commit(Revision::sanitize(&rev))?),
        Command::Diff { rev, parent } => {
            let parent = parent.as_deref().map(Revision::sanitize);
            print_json(&repo.diff(Revision::sanitize(&rev), parent)?)
        }
        Command::Version | Command::Create { .. } => Ok(()),
    }
}

fn print_json<T: Serialize>(value: &T) -> AppResult<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{}", json);
    Ok(())
}
