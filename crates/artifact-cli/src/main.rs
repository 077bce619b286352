//! Artifacts CLI
//!
//! Command-line interface for the artifact catalog: save artifacts, organize
//! them into collections and tags, share them publicly, and move catalogs
//! between machines as JSON.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use artifact_core::{Config, SortOrder, Store, StoreError};

mod commands;
mod output;

use output::{Output, OutputFormat};

#[derive(Parser)]
#[command(name = "artifacts")]
#[command(about = "Artifacts - catalog, organize and share saved artifacts")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Owner identity (defaults to the configured owner)
    #[arg(long, global = true)]
    owner: Option<String>,

    /// Path to an alternate config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database and the default collections
    Init,
    /// Manage artifacts
    Artifact {
        #[command(subcommand)]
        command: ArtifactCommands,
    },
    /// Manage collections
    Collection {
        #[command(subcommand)]
        command: CollectionCommands,
    },
    /// Manage tags
    Tag {
        #[command(subcommand)]
        command: TagCommands,
    },
    /// Find and fix placeholder artifact names
    Cleanup {
        #[command(subcommand)]
        command: CleanupCommands,
    },
    /// Export the catalog as JSON
    Export {
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Import a JSON catalog document
    Import {
        /// Path to the document
        file: PathBuf,
    },
    /// Render the public page of a shared artifact
    Render {
        /// Artifact share token
        token: String,
        /// Write the page to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Render the public page of a shared collection
    Public {
        /// Collection share token
        token: String,
        /// Write the page to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Show catalog statistics
    Stats,
    /// Show or set configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand)]
enum ArtifactCommands {
    /// Save a new artifact
    #[command(alias = "create")]
    Add(commands::artifact::AddArgs),
    /// List artifacts
    #[command(alias = "ls")]
    List {
        /// Only artifacts in this collection (slug)
        #[arg(short, long)]
        collection: Option<String>,
        /// Only artifacts with this tag
        #[arg(short, long)]
        tag: Option<String>,
        /// Only artifacts of this type
        #[arg(long = "type")]
        artifact_type: Option<String>,
        /// Only artifacts from this source (published, downloaded)
        #[arg(long)]
        source: Option<String>,
        /// Only favorites
        #[arg(short, long)]
        favorites: bool,
        /// Text search over name, description, notes, language and file name
        #[arg(short, long)]
        search: Option<String>,
        /// Sort order (newest, oldest, name, updated, type)
        #[arg(long, default_value_t = SortOrder::Newest)]
        sort: SortOrder,
    },
    /// Show artifact details
    Show {
        /// Artifact ID
        id: i64,
    },
    /// Edit an artifact
    Edit(commands::artifact::EditArgs),
    /// Delete an artifact
    #[command(alias = "rm")]
    Delete {
        /// Artifact ID
        id: i64,
    },
    /// Toggle the favorite flag
    #[command(alias = "fav")]
    Favorite {
        /// Artifact ID
        id: i64,
    },
    /// Publish an artifact under a fresh share token
    Share {
        /// Artifact ID
        id: i64,
    },
    /// Revoke an artifact's share token
    Unshare {
        /// Artifact ID
        id: i64,
    },
    /// Show whether an artifact is shared
    ShareStatus {
        /// Artifact ID
        id: i64,
    },
}

#[derive(Subcommand)]
enum CollectionCommands {
    /// List collections
    #[command(alias = "ls")]
    List,
    /// Create a collection
    #[command(alias = "add")]
    Create(commands::collection::CreateArgs),
    /// Edit a collection
    Edit(commands::collection::EditArgs),
    /// Delete a collection (its artifacts are kept, uncollected)
    #[command(alias = "rm")]
    Delete {
        /// Collection slug
        slug: String,
    },
    /// Publish a collection page
    Share {
        /// Collection slug
        slug: String,
        /// Page layout (grouped, grid, list)
        #[arg(long, default_value = "grouped")]
        layout: String,
        /// Hide thumbnails on the page
        #[arg(long)]
        no_thumbnails: bool,
    },
    /// Make a collection private again
    Unshare {
        /// Collection slug
        slug: String,
    },
    /// Show whether a collection is public
    ShareStatus {
        /// Collection slug
        slug: String,
    },
}

#[derive(Subcommand)]
enum TagCommands {
    /// List tags with usage counts
    #[command(alias = "ls")]
    List,
    /// Delete a tag and unlink it from every artifact
    #[command(alias = "rm")]
    Delete {
        /// Tag name
        name: String,
    },
}

#[derive(Subcommand)]
enum CleanupCommands {
    /// List artifacts with placeholder names
    Scan,
    /// Rename placeholder artifacts after their type
    Fix,
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (data_dir, owner, base_url, log_file)
        key: String,
        /// Configuration value
        value: String,
    },
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {:?}", err);
            let store_error = find_store_error(&err);
            if let Some(hint) = store_error.and_then(StoreError::recovery_suggestion) {
                eprintln!("Hint: {}", hint);
            }
            ExitCode::from(exit_status(store_error))
        }
    }
}

/// The catalog error behind a command failure, if any
fn find_store_error(err: &anyhow::Error) -> Option<&StoreError> {
    err.chain().find_map(|cause| cause.downcast_ref::<StoreError>())
}

/// 2 when the input was at fault, 1 otherwise
fn exit_status(store_error: Option<&StoreError>) -> u8 {
    match store_error {
        Some(err) if err.is_caller_error() => 2,
        _ => 1,
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));

    // Config commands work without a database or owner
    if let Commands::Config { command } = &cli.command {
        return handle_config_command(command.clone(), cli.config.as_ref(), &output);
    }

    let config = Config::load_with_cli_override(cli.config.as_ref())
        .context("Failed to load configuration")?;
    init_logging(&config, cli.verbose)?;

    let mut store = Store::open_with_config(config).context("Failed to open catalog")?;
    debug!("Catalog opened at {:?}", store.config().sqlite_path());

    match cli.command {
        // Public pages are addressed by token alone
        Commands::Render { token, output: path } => {
            commands::share::render_artifact(&store, &token, path, &output)
        }
        Commands::Public { token, output: path } => {
            commands::share::render_collection(&store, &token, path, &output)
        }
        Commands::Config { .. } => unreachable!(), // Handled above
        command => {
            let owner = resolve_owner(cli.owner.as_deref(), store.config())?;
            debug!("Running command as {}", owner);
            handle_owner_command(command, &mut store, &owner, &output)
        }
    }
}

fn handle_owner_command(
    command: Commands,
    store: &mut Store,
    owner: &str,
    output: &Output,
) -> Result<()> {
    match command {
        Commands::Init => commands::stats::init(store, owner, output),
        Commands::Artifact { command } => handle_artifact_command(command, store, owner, output),
        Commands::Collection { command } => {
            handle_collection_command(command, store, owner, output)
        }
        Commands::Tag { command } => handle_tag_command(command, store, owner, output),
        Commands::Cleanup { command } => match command {
            CleanupCommands::Scan => commands::cleanup::scan(store, owner, output),
            CleanupCommands::Fix => commands::cleanup::fix(store, owner, output),
        },
        Commands::Export { output: path } => commands::transfer::export(store, owner, path, output),
        Commands::Import { file } => commands::transfer::import(store, owner, file, output),
        Commands::Stats => commands::stats::show(store, owner, output),
        Commands::Render { .. } | Commands::Public { .. } | Commands::Config { .. } => {
            unreachable!() // Handled in main
        }
    }
}

fn handle_artifact_command(
    command: ArtifactCommands,
    store: &mut Store,
    owner: &str,
    output: &Output,
) -> Result<()> {
    match command {
        ArtifactCommands::Add(args) => commands::artifact::add(store, owner, args, output),
        ArtifactCommands::List {
            collection,
            tag,
            artifact_type,
            source,
            favorites,
            search,
            sort,
        } => {
            let filter = commands::artifact::build_filter(
                collection,
                tag,
                artifact_type,
                source,
                favorites,
                search,
            )?;
            commands::artifact::list(store, owner, &filter, sort, output)
        }
        ArtifactCommands::Show { id } => commands::artifact::show(store, owner, id, output),
        ArtifactCommands::Edit(args) => commands::artifact::edit(store, owner, args, output),
        ArtifactCommands::Delete { id } => commands::artifact::delete(store, owner, id, output),
        ArtifactCommands::Favorite { id } => {
            commands::artifact::favorite(store, owner, id, output)
        }
        ArtifactCommands::Share { id } => commands::share::share_artifact(store, owner, id, output),
        ArtifactCommands::Unshare { id } => {
            commands::share::unshare_artifact(store, owner, id, output)
        }
        ArtifactCommands::ShareStatus { id } => {
            commands::share::share_status(store, owner, id, output)
        }
    }
}

fn handle_collection_command(
    command: CollectionCommands,
    store: &mut Store,
    owner: &str,
    output: &Output,
) -> Result<()> {
    match command {
        CollectionCommands::List => commands::collection::list(store, owner, output),
        CollectionCommands::Create(args) => commands::collection::create(store, owner, args, output),
        CollectionCommands::Edit(args) => commands::collection::edit(store, owner, args, output),
        CollectionCommands::Delete { slug } => {
            commands::collection::delete(store, owner, &slug, output)
        }
        CollectionCommands::Share {
            slug,
            layout,
            no_thumbnails,
        } => commands::share::share_collection(store, owner, &slug, &layout, !no_thumbnails, output),
        CollectionCommands::Unshare { slug } => {
            commands::share::unshare_collection(store, owner, &slug, output)
        }
        CollectionCommands::ShareStatus { slug } => {
            commands::share::collection_share_status(store, owner, &slug, output)
        }
    }
}

fn handle_tag_command(
    command: TagCommands,
    store: &mut Store,
    owner: &str,
    output: &Output,
) -> Result<()> {
    match command {
        TagCommands::List => commands::tag::list(store, owner, output),
        TagCommands::Delete { name } => commands::tag::delete(store, owner, &name, output),
    }
}

fn handle_config_command(
    command: Option<ConfigCommands>,
    config_path: Option<&PathBuf>,
    output: &Output,
) -> Result<()> {
    match command {
        Some(ConfigCommands::Show) | None => commands::config::show(config_path, output),
        Some(ConfigCommands::Set { key, value }) => {
            commands::config::set(key, value, config_path, output)
        }
    }
}

/// Pick the owner identity: `--owner` flag, then config (which already
/// folds in ARTIFACTS_OWNER).
fn resolve_owner(flag: Option<&str>, config: &Config) -> Result<String> {
    let owner = flag
        .or(config.owner.as_deref())
        .map(str::trim)
        .filter(|s| !s.is_empty());

    match owner {
        Some(owner) => Ok(owner.to_string()),
        None => bail!(
            "No owner configured.\n\
             Pass --owner, set ARTIFACTS_OWNER, or run: artifacts config set owner you@example.com"
        ),
    }
}

/// Initialize tracing. RUST_LOG wins; otherwise warn, or debug with --verbose.
fn init_logging(config: &Config, verbose: bool) -> Result<()> {
    let default_level = if verbose { "debug" } else { "warn" };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "artifact_core={level},artifact_cli={level}",
            level = default_level
        ))
    });

    match &config.log_file {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create log directory: {:?}", parent))?;
            }
            let log_file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file: {:?}", path))?;

            let _ = tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_ansi(false)
                .with_writer(log_file)
                .try_init();
        }
        None => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .try_init();
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_resolve_owner_prefers_flag() {
        let config = Config {
            owner: Some("config@example.com".into()),
            ..Config::default()
        };
        assert_eq!(
            resolve_owner(Some("flag@example.com"), &config).unwrap(),
            "flag@example.com"
        );
        assert_eq!(
            resolve_owner(None, &config).unwrap(),
            "config@example.com"
        );
    }

    #[test]
    fn test_resolve_owner_requires_some_owner() {
        let config = Config {
            owner: None,
            ..Config::default()
        };
        assert!(resolve_owner(None, &config).is_err());
        assert!(resolve_owner(Some("   "), &config).is_err());
    }

    #[test]
    fn test_parse_list_flags() {
        let cli = Cli::try_parse_from([
            "artifacts",
            "--json",
            "artifact",
            "list",
            "--tag",
            "rust",
            "--favorites",
            "--sort",
            "name",
        ])
        .unwrap();
        assert!(cli.json);
        match cli.command {
            Commands::Artifact {
                command:
                    ArtifactCommands::List {
                        tag,
                        favorites,
                        sort,
                        ..
                    },
            } => {
                assert_eq!(tag.as_deref(), Some("rust"));
                assert!(favorites);
                assert_eq!(sort, SortOrder::Name);
            }
            _ => panic!("expected artifact list"),
        }
    }

    #[test]
    fn test_parse_collection_share_status() {
        let cli = Cli::try_parse_from(["artifacts", "collection", "share-status", "work"]).unwrap();
        match cli.command {
            Commands::Collection {
                command: CollectionCommands::ShareStatus { slug },
            } => assert_eq!(slug, "work"),
            _ => panic!("expected collection share-status"),
        }
    }

    #[test]
    fn test_store_error_found_through_context() {
        let err = Err::<(), _>(StoreError::Conflict("Slug taken".into()))
            .context("Failed to create collection")
            .unwrap_err();
        let store_error = find_store_error(&err);
        assert!(matches!(store_error, Some(StoreError::Conflict(_))));
        assert_eq!(
            store_error.and_then(StoreError::recovery_suggestion),
            Some("Choose a different name and try again.")
        );
        assert_eq!(exit_status(store_error), 2);
    }

    #[test]
    fn test_exit_status_for_other_failures() {
        let err = anyhow::anyhow!("Collection not found: work");
        assert!(find_store_error(&err).is_none());
        assert_eq!(exit_status(None), 1);

        let corrupt = StoreError::from(serde_json::from_str::<i64>("{").unwrap_err());
        assert_eq!(exit_status(Some(&corrupt)), 1);
        assert_eq!(exit_status(Some(&StoreError::NotFound)), 2);
    }
}
