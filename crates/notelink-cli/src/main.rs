use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use notelink_config::{Config, LoggingConfig};
use notelink_engine::cache::{FsNoteSource, MemoryNoteSource, NoteSource};
use notelink_engine::reference::COMMAND_NAME;
use notelink_engine::{
    CommandArgs, Editor, NoteCache, NoteMetadata, ReferenceLink, ResourceCache, Selection,
    referenced_identifiers,
};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tokio::task::LocalSet;

#[derive(Parser)]
#[command(version, about = "Render and insert note references", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Config file to use instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Notes directory; overrides `notes_path` from the config file
    #[arg(long, global = true)]
    notes: Option<PathBuf>,

    /// Known note title, may be repeated
    #[arg(long = "note", value_name = "IDENTIFIER=TITLE", value_parser = parse_note, global = true)]
    note_overrides: Vec<NoteMetadata>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List every note identifier with its title
    List,
    /// Print a document with every reference titled
    Render {
        /// Serialized document to read
        file: PathBuf,
    },
    /// Append a reference to the end of a document and print the result
    Insert {
        /// Serialized document to read
        file: PathBuf,

        /// Path of the referenced note, e.g. `projects/roadmap`
        target_path: String,
    },
}

fn parse_note(raw: &str) -> Result<NoteMetadata, String> {
    match raw.split_once('=') {
        Some((identifier, title)) if !identifier.trim().is_empty() => Ok(NoteMetadata {
            identifier: identifier.trim().to_string(),
            title: title.trim().to_string(),
        }),
        _ => Err(format!("expected IDENTIFIER=TITLE, got `{raw}`")),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from_path(path)?,
        None => Config::load()?,
    };
    init_logging(config.as_ref());

    let notes_path = cli
        .notes
        .clone()
        .or_else(|| config.as_ref().map(|config| config.notes_path.clone()));
    let preload = config.as_ref().is_some_and(|config| config.cache.preload);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    // Widget title resolutions are spawned with `spawn_local`.
    LocalSet::new().block_on(&runtime, run(cli, notes_path, preload))
}

/// Config filter first, `RUST_LOG` on top.
fn init_logging(config: Option<&Config>) {
    let filter = config
        .map(|config| config.logging.filter.clone())
        .unwrap_or_else(|| LoggingConfig::default().filter);
    env_logger::Builder::new()
        .parse_filters(&filter)
        .parse_default_env()
        .init();
}

async fn run(cli: Cli, notes_path: Option<PathBuf>, preload: bool) -> Result<()> {
    let source: Rc<dyn NoteSource> = match &notes_path {
        Some(path) => {
            let source = FsNoteSource::new(path.clone())
                .with_context(|| format!("notes path '{}' is invalid", path.display()))?;
            log::info!("using notes in {}", path.display());
            Rc::new(source)
        }
        None if !cli.note_overrides.is_empty() => Rc::new(memory_source(&cli.note_overrides)),
        None => {
            let config_path = cli.config.clone().unwrap_or_else(Config::config_path);
            bail!(
                "no notes path given and no config file found at {}",
                config_path.display()
            );
        }
    };

    let cache = Rc::new(NoteCache::new(Rc::clone(&source)));
    for note in &cli.note_overrides {
        cache.insert(note.clone());
    }
    if preload {
        cache.preload().await?;
    }

    match cli.command {
        Commands::List => {
            for identifier in source.identifiers()? {
                match cache.resolve_title(&identifier).await {
                    Ok(title) => println!("{identifier}\t{title}"),
                    Err(err) => log::warn!("skipping `{identifier}`: {err}"),
                }
            }
        }
        Commands::Render { file } => {
            println!("{}", render_file(&cache, &file).await?);
        }
        Commands::Insert { file, target_path } => {
            println!("{}", insert_into_file(&cache, &file, &target_path).await?);
        }
    }
    Ok(())
}

fn memory_source(notes: &[NoteMetadata]) -> MemoryNoteSource {
    notes.iter().fold(MemoryNoteSource::new(), |source, note| {
        source.with_note(&note.identifier, &note.title)
    })
}

fn open(cache: &Rc<NoteCache>, file: &Path) -> Result<Editor> {
    let data = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let editor = Editor::new();
    let cache: Rc<dyn ResourceCache> = cache.clone();
    editor.use_plugin(&ReferenceLink::new(cache))?;
    editor.set_data(&data);
    Ok(editor)
}

/// Serialized output only carries cached titles, so load them first.
async fn export(cache: &NoteCache, editor: &Editor) -> String {
    let identifiers = referenced_identifiers(&editor.model());
    for identifier in identifiers {
        if let Err(err) = cache.ensure_loaded(&identifier).await {
            log::warn!("reference `{identifier}` stays untitled: {err}");
        }
    }
    editor.get_data()
}

async fn render_file(cache: &Rc<NoteCache>, file: &Path) -> Result<String> {
    let editor = open(cache, file)?;
    Ok(export(cache, &editor).await)
}

async fn insert_into_file(cache: &Rc<NoteCache>, file: &Path, target_path: &str) -> Result<String> {
    let editor = open(cache, file)?;
    let end = editor.model().end_position();
    editor.set_selection(Selection::collapsed(end))?;

    let enabled = editor
        .command(COMMAND_NAME)
        .is_some_and(|command| command.is_enabled());
    if !enabled {
        log::warn!("{} has no block that accepts a reference", file.display());
    }
    editor
        .execute(COMMAND_NAME, CommandArgs::TargetPath(target_path.to_string()))
        .await?;

    Ok(export(cache, &editor).await)
}
