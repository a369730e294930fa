//! Command-line entry point over the note repository.
//!
//! # Responsibility
//! - Resolve configuration from flags and environment.
//! - Open the SQLite document store, scope to a tenant and run one command.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use notorious_core::db::{open_db, open_db_in_memory};
use notorious_core::{
    default_log_level, init_logging, Builder, Entity, Filter, LogSettings, Note, NoteBuilder,
    NoteFilter, NoteRepository, Repository, SqliteDocumentStore, TenantRepository,
};
use std::io::{self, Write};
use std::path::PathBuf;
use uuid::Uuid;

#[derive(Debug, Parser)]
#[command(name = "notorious", version, about = "Store and query tagged notes")]
struct Cli {
    /// SQLite database file. Uses an in-memory database when omitted.
    #[arg(long, env = "NOTORIOUS_DB")]
    db: Option<PathBuf>,

    /// Tenant user id every read and write is scoped to.
    #[arg(long, env = "NOTORIOUS_TENANT")]
    tenant: Option<Uuid>,

    #[arg(long, env = "NOTORIOUS_LOG_LEVEL")]
    log_level: Option<String>,

    /// Absolute directory for rotated log files. Logging is off when omitted.
    #[arg(long, env = "NOTORIOUS_LOG_DIR")]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Stage and save one note, printing its id.
    AddNote { content: String },
    /// List one page of notes.
    ListNotes {
        #[arg(long, default_value_t = 0)]
        skip: u64,
        #[arg(long, default_value_t = 10)]
        take: u64,
        /// Only notes whose content matches exactly.
        #[arg(long)]
        content: Option<String>,
    },
    /// Print one note by id.
    GetNote { id: Uuid },
    /// Print the core version.
    Version,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let stdout = io::stdout();
    run(cli, &mut stdout.lock())
}

fn run(cli: Cli, out: &mut impl Write) -> Result<()> {
    if let Some(dir) = cli.log_dir.as_ref() {
        let level = cli.log_level.as_deref().unwrap_or(default_log_level());
        let settings = LogSettings::new(level, dir).map_err(anyhow::Error::msg)?;
        init_logging(&settings).map_err(anyhow::Error::msg)?;
    }

    if let Command::Version = cli.command {
        writeln!(out, "notorious_core version={}", notorious_core::core_version())?;
        return Ok(());
    }

    let conn = match cli.db.as_ref() {
        Some(path) => open_db(path).with_context(|| format!("opening {}", path.display()))?,
        None => open_db_in_memory().context("opening in-memory database")?,
    };
    let store = SqliteDocumentStore::try_new(&conn)?;
    let mut notes: NoteRepository<_> = NoteRepository::new(&store);
    let tenant = cli.tenant.unwrap_or_else(Uuid::new_v4);
    notes.set_tenancy(tenant)?;
    info!("event=cli_start module=cli status=ok tenant={tenant}");

    match cli.command {
        Command::AddNote { content } => {
            let note = NoteBuilder::new().with_content(content).build()?;
            notes.add(&note)?;
            notes.save_changes()?;
            writeln!(out, "{}", note.id())?;
        }
        Command::ListNotes {
            skip,
            take,
            content,
        } => {
            let filter = NoteFilter {
                page: Filter::new(skip, take),
                content,
            };
            for note in notes.get(&filter)? {
                print_note(out, &note)?;
            }
        }
        Command::GetNote { id } => match notes.get_by_id(id)? {
            Some(note) => print_note(out, &note)?,
            None => anyhow::bail!("note not found: {id}"),
        },
        Command::Version => {}
    }

    Ok(())
}

fn print_note(out: &mut impl Write, note: &Note) -> io::Result<()> {
    let tags = note
        .tags()
        .iter()
        .map(|tag| tag.name())
        .collect::<Vec<_>>()
        .join(",");
    writeln!(out, "{}\t{}\t[{tags}]", note.id(), note.content())
}

#[cfg(test)]
mod tests {
    use super::{run, Cli, Command};
    use clap::{CommandFactory, Parser};
    use uuid::Uuid;

    fn run_args(args: &[&str]) -> String {
        let cli = Cli::try_parse_from(args.iter().copied()).unwrap();
        let mut out = Vec::new();
        run(cli, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn list_notes_parses_paging_and_content() {
        let cli = Cli::try_parse_from([
            "notorious",
            "list-notes",
            "--skip",
            "5",
            "--take",
            "3",
            "--content",
            "abc",
        ])
        .unwrap();

        match cli.command {
            Command::ListNotes {
                skip,
                take,
                content,
            } => {
                assert_eq!((skip, take), (5, 3));
                assert_eq!(content.as_deref(), Some("abc"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn get_note_rejects_malformed_id() {
        assert!(Cli::try_parse_from(["notorious", "get-note", "not-a-uuid"]).is_err());
    }

    #[test]
    fn add_note_requires_content() {
        assert!(Cli::try_parse_from(["notorious", "add-note"]).is_err());
    }

    #[test]
    fn added_note_is_listed_and_fetched_from_the_same_database() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("cli.db");
        let db = db.to_str().unwrap();
        let tenant = Uuid::new_v4().to_string();

        let id = run_args(&["notorious", "--db", db, "--tenant", &tenant, "add-note", "abc"]);
        let id = id.trim();
        let listed = run_args(&["notorious", "--db", db, "--tenant", &tenant, "list-notes"]);
        let fetched = run_args(&["notorious", "--db", db, "--tenant", &tenant, "get-note", id]);

        assert_eq!(listed, format!("{id}\tabc\t[]\n"));
        assert_eq!(fetched, listed);
    }

    #[test]
    fn version_prints_core_version() {
        let output = run_args(&["notorious", "version"]);
        assert_eq!(
            output,
            format!("notorious_core version={}\n", notorious_core::core_version())
        );
    }
}
