// Copyright 2025 AgentReplay (https://github.com/agentreplay)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Revfs CLI - browse a repository snapshot as a revision filesystem

mod commands;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use commands::Snapshot;
use revfs_core::{ChecksumKind, FsConfig, Revision};
use std::io::Write;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "revfs")]
#[command(about = "Revfs - commit graph as a revision filesystem", long_about = None)]
struct Cli {
    /// Snapshot directory (objects.bin + revisions.json)
    #[arg(long, default_value = "./revfs-data")]
    repo: PathBuf,

    /// Layout and limits (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Verbose mode
    #[arg(short, long)]
    verbose: bool,

    /// Output as JSON (machine-readable)
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the youngest revision, object counts and live branches
    Info,

    /// List a directory
    Ls {
        /// Directory path
        #[arg(default_value = "/")]
        path: String,

        /// Revision (defaults to youngest)
        #[arg(short, long)]
        revision: Option<Revision>,
    },

    /// Print a file's contents
    Cat {
        /// File path
        path: String,

        /// Revision (defaults to youngest)
        #[arg(short, long)]
        revision: Option<Revision>,

        /// Print the checksum instead of the contents (sha256 or blake3,
        /// defaults to the configured kind)
        #[arg(long)]
        checksum: Option<Option<ChecksumKind>>,
    },

    /// List the paths changed in a revision
    Changed {
        /// Revision (defaults to youngest)
        #[arg(short, long)]
        revision: Option<Revision>,
    },

    /// Show where and when a node's content was created
    Created {
        /// Node path
        path: String,

        /// Revision (defaults to youngest)
        #[arg(short, long)]
        revision: Option<Revision>,
    },

    /// Walk a node's history backwards
    Log {
        /// Node path
        path: String,

        /// Revision (defaults to youngest)
        #[arg(short, long)]
        revision: Option<Revision>,

        /// Maximum number of entries
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Relate two nodes
    Relation {
        /// First revision
        rev_a: Revision,
        /// First path
        path_a: String,
        /// Second revision
        rev_b: Revision,
        /// Second path
        path_b: String,
    },
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load_config(path: Option<&PathBuf>) -> Result<FsConfig> {
    match path {
        Some(path) => {
            FsConfig::load(path).with_context(|| format!("Failed to load config {:?}", path))
        }
        None => Ok(FsConfig::default()),
    }
}

fn run(cli: Cli, out: &mut dyn Write) -> Result<()> {
    let config = load_config(cli.config.as_ref())?;
    let default_checksum = config.default_checksum;
    let snapshot = Snapshot::open(&cli.repo, config).context("Failed to open snapshot")?;
    let json = cli.json;

    match cli.command {
        Commands::Info => commands::info(&snapshot, json, out),
        Commands::Ls { path, revision } => commands::ls(&snapshot, revision, &path, json, out),
        Commands::Cat {
            path,
            revision,
            checksum,
        } => {
            let checksum = checksum.map(|kind| kind.unwrap_or(default_checksum));
            commands::cat(&snapshot, revision, &path, checksum, out)
        }
        Commands::Changed { revision } => commands::changed(&snapshot, revision, json, out),
        Commands::Created { path, revision } => commands::created(&snapshot, revision, &path, out),
        Commands::Log {
            path,
            revision,
            limit,
        } => commands::log(&snapshot, revision, &path, limit, out),
        Commands::Relation {
            rev_a,
            path_a,
            rev_b,
            path_b,
        } => commands::relation(&snapshot, rev_a, &path_a, rev_b, &path_b, out),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    run(cli, &mut out)?;
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use revfs_storage::{
        MemoryObjectStore, MemoryRevisionMap, RepositoryBuilder, OBJECTS_FILE, REVISIONS_FILE,
    };
    use std::sync::Arc;

    fn write_snapshot(dir: &std::path::Path) {
        write_snapshot_with_tags(dir, "tags");
    }

    fn write_snapshot_with_tags(dir: &std::path::Path, tags_root: &str) {
        let mut builder = RepositoryBuilder::with_stores(
            Arc::new(MemoryObjectStore::new()),
            Arc::new(MemoryRevisionMap::with_tags_root(tags_root)),
        );
        builder.commit_files("trunk", &[("a.txt", "hello")]).unwrap();
        builder.objects().save_to_file(&dir.join(OBJECTS_FILE)).unwrap();
        builder.revisions().save_to_file(&dir.join(REVISIONS_FILE)).unwrap();
    }

    fn run_args(args: &[&str]) -> Result<String> {
        let cli = Cli::try_parse_from(args)?;
        let mut buf = Vec::new();
        run(cli, &mut buf)?;
        Ok(String::from_utf8(buf)?)
    }

    #[test]
    fn test_cli_parses_subcommands() {
        let cli = Cli::try_parse_from(["revfs", "--repo", "/tmp/x", "cat", "/trunk/a", "-r", "3"]).unwrap();
        assert_eq!(cli.repo, PathBuf::from("/tmp/x"));
        match cli.command {
            Commands::Cat { path, revision, checksum } => {
                assert_eq!(path, "/trunk/a");
                assert_eq!(revision, Some(3));
                assert_eq!(checksum, None);
            }
            _ => panic!("expected cat"),
        }

        let cli = Cli::try_parse_from(["revfs", "cat", "a", "--checksum", "blake3"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Cat { checksum: Some(Some(ChecksumKind::Blake3)), .. }
        ));
        let cli = Cli::try_parse_from(["revfs", "cat", "a", "--checksum"]).unwrap();
        assert!(matches!(cli.command, Commands::Cat { checksum: Some(None), .. }));
        assert!(Cli::try_parse_from(["revfs", "cat", "a", "--checksum", "md5"]).is_err());
    }

    #[test]
    fn test_run_against_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        write_snapshot(dir.path());
        let repo = dir.path().to_str().unwrap();

        let text = run_args(&["revfs", "--repo", repo, "cat", "/trunk/a.txt"]).unwrap();
        assert_eq!(text, "hello");

        let text = run_args(&["revfs", "--repo", repo, "ls", "/trunk"]).unwrap();
        assert_eq!(text, "a.txt\n");

        let text = run_args(&["revfs", "--repo", repo, "cat", "/trunk/a.txt", "--checksum"]).unwrap();
        assert!(text.starts_with("sha256:2cf24dba"));
    }

    #[test]
    fn test_config_layout_is_applied() {
        let dir = tempfile::tempdir().unwrap();
        write_snapshot_with_tags(dir.path(), "releases");
        let config_path = dir.path().join("revfs.toml");
        std::fs::write(&config_path, "[layout]\ntags = \"releases\"\n").unwrap();

        let text = run_args(&[
            "revfs",
            "--repo",
            dir.path().to_str().unwrap(),
            "--config",
            config_path.to_str().unwrap(),
            "ls",
        ])
        .unwrap();
        assert_eq!(text, "branches/\nreleases/\ntrunk/\n");
    }

    #[test]
    fn test_layout_must_match_tags_root() {
        let dir = tempfile::tempdir().unwrap();
        write_snapshot(dir.path());
        let config_path = dir.path().join("revfs.toml");
        std::fs::write(&config_path, "[layout]\ntags = \"releases\"\n").unwrap();

        let err = run_args(&[
            "revfs",
            "--repo",
            dir.path().to_str().unwrap(),
            "--config",
            config_path.to_str().unwrap(),
            "ls",
        ])
        .unwrap_err();
        assert!(format!("{:#}", err).contains("lists tags under 'tags'"));
    }

    #[test]
    fn test_missing_snapshot_fails() {
        let dir = tempfile::tempdir().unwrap();
        let repo = dir.path().join("missing");
        let err = run_args(&["revfs", "--repo", repo.to_str().unwrap(), "info"]).unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to open snapshot"));
    }
}
