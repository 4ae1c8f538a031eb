//! CLI entry point for the Hello World playground.
//!
//! Assemble, run, export and save playground projects from the terminal.

mod project;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use content::ContentProvider;
use core_types::ContentKind;
use sandbox::{HeadlessBoundary, HeadlessReport, RenderedOutput, SandboxController};
use services::logging::{LogConfig, init_logging};
use services::{ExternalServices, ServicesConfig};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use store::SnapshotStore;
use tracing::debug;

use project::{SourceArgs, write_project};

/// hello-world: live-preview playground for HTML, CSS and JavaScript
#[derive(Parser)]
#[command(name = "hello-world")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to a TOML config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the preview document for a project
    Assemble {
        #[command(flatten)]
        sources: SourceArgs,

        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Execute a project's scripts headlessly and report what happened
    Run {
        #[command(flatten)]
        sources: SourceArgs,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write a project as a standalone HTML file
    Export {
        #[command(flatten)]
        sources: SourceArgs,

        /// Project title, also used for the filename
        #[arg(short, long, default_value = "Hello World")]
        title: String,

        /// Output directory (default: <data_dir>/exports)
        #[arg(short, long)]
        out_dir: Option<PathBuf>,
    },

    /// Save a project as a new snapshot
    Save {
        #[command(flatten)]
        sources: SourceArgs,

        /// Project title
        #[arg(short, long, default_value = "Hello World")]
        title: String,
    },

    /// Inspect saved snapshots
    Snapshots {
        #[command(subcommand)]
        command: SnapshotCommands,
    },

    /// Write a default config file and optionally a starter project
    Init {
        /// Config file to create
        #[arg(long, default_value = "hello-world.toml")]
        path: PathBuf,

        /// Also write the starter template into this directory
        #[arg(long)]
        project: Option<PathBuf>,

        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },

    /// Browse achievements, challenges and curricula
    Content {
        #[command(subcommand)]
        command: ContentCommands,
    },
}

#[derive(Subcommand)]
enum SnapshotCommands {
    /// List snapshots, newest first
    List {
        /// Show at most this many
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Show one snapshot
    Show {
        /// Snapshot key
        key: String,

        /// Write the snapshot's sources into this project directory
        #[arg(long)]
        restore_to: Option<PathBuf>,
    },

    /// Export all snapshots to JSONL
    Export {
        /// Output file
        #[arg(short, long, default_value = "snapshots.jsonl")]
        output: PathBuf,
    },
}

#[derive(Subcommand)]
enum ContentCommands {
    /// List content items
    List {
        /// Filter by kind (achievement, challenge, curriculum)
        #[arg(short, long)]
        kind: Option<String>,

        /// Filter by track
        #[arg(short, long)]
        track: Option<String>,
    },

    /// Show one content item
    Show {
        /// Content ID
        id: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = ServicesConfig::load(cli.config.as_deref()).context("loading config")?;
    init_logging(
        &LogConfig::from_verbosity(cli.verbose)
            .with_format(config.logging.format)
            .with_log_file(config.logging.file.clone()),
    )
    .context("initializing logging")?;

    match cli.command {
        Commands::Assemble { sources, output } => {
            assemble_project(&sources, output.as_deref())?;
        }
        Commands::Run { sources, json } => {
            run_project(&config, &sources, json).await?;
        }
        Commands::Export {
            sources,
            title,
            out_dir,
        } => {
            let out_dir = out_dir.unwrap_or_else(|| config.export_dir());
            export_project(&sources, &title, &out_dir)?;
        }
        Commands::Save { sources, title } => {
            let services = ExternalServices::connect(config)?;
            save_project(&services, &sources, &title)?;
        }
        Commands::Snapshots { command } => {
            let services = ExternalServices::connect(config)?;
            match command {
                SnapshotCommands::List { limit } => list_snapshots(services.snapshots(), limit)?,
                SnapshotCommands::Show { key, restore_to } => {
                    show_snapshot(services.snapshots(), &key, restore_to.as_deref())?;
                }
                SnapshotCommands::Export { output } => {
                    export_snapshots(services.snapshots(), &output)?;
                }
            }
        }
        Commands::Init {
            path,
            project,
            force,
        } => {
            init_config(&config, &path, project.as_deref(), force)?;
        }
        Commands::Content { command } => {
            let services = ExternalServices::in_memory(config)?;
            match command {
                ContentCommands::List { kind, track } => {
                    list_content(services.content(), kind.as_deref(), track.as_deref())?;
                }
                ContentCommands::Show { id } => show_content(services.content(), &id)?,
            }
        }
    }

    Ok(())
}

fn assemble_project(sources: &SourceArgs, output: Option<&Path>) -> Result<()> {
    let buffers = sources.load()?;
    let document = assembler::AssembledDocument::from_buffers(&buffers);

    match output {
        Some(path) => {
            fs::write(path, document.as_str())
                .with_context(|| format!("writing {}", path.display()))?;
            println!("Wrote {} ({} bytes)", path.display(), document.len());
        }
        None => print!("{document}"),
    }
    Ok(())
}

async fn run_project(config: &ServicesConfig, sources: &SourceArgs, json: bool) -> Result<()> {
    let buffers = sources.load()?;
    let policy = config.sandbox.policy()?;
    // The terminal has no browser, so always execute headlessly
    let boundary = Arc::new(HeadlessBoundary::new(config.sandbox.headless.clone()));
    let controller = SandboxController::new(boundary, policy)?;

    let id = controller.run(assembler::AssembledDocument::from_buffers(&buffers));
    let rendered = controller.wait_for(id).await?;
    debug!(session = %id, "run finished");

    let RenderedOutput::Headless(report) = &rendered.output else {
        bail!("headless boundary produced no report");
    };

    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        print_report(report);
    }
    Ok(())
}

fn print_report(report: &HeadlessReport) {
    println!(
        "Scripts: {} executed, {} skipped",
        report.scripts_executed, report.scripts_skipped
    );

    if !report.console.is_empty() {
        println!();
        println!("Console:");
        for line in &report.console {
            println!("  [{}] {}", line.level, line.text);
        }
    }

    let banners = report.error_banners();
    if !banners.is_empty() {
        println!();
        println!("Errors shown in the page:");
        for banner in banners {
            println!("  {banner}");
        }
    }

    if !report.uncaught.is_empty() {
        println!();
        println!("Uncaught:");
        for error in &report.uncaught {
            println!("  {error}");
        }
    }
}

fn export_project(sources: &SourceArgs, title: &str, out_dir: &Path) -> Result<()> {
    let buffers = sources.load()?;
    let artifact = export::export_buffers(&buffers, title);
    let path = artifact.write_into(out_dir)?;

    println!("Exported {} ({} bytes)", path.display(), artifact.len());
    Ok(())
}

fn save_project(services: &ExternalServices, sources: &SourceArgs, title: &str) -> Result<()> {
    let buffers = sources.load()?;
    let snapshot = export::save_snapshot(services.snapshots(), &buffers, title)?;

    println!("Saved snapshot {} ({})", snapshot.key, snapshot.record.title);
    Ok(())
}

fn list_snapshots(store: &dyn SnapshotStore, limit: Option<usize>) -> Result<()> {
    let snapshots = store.list(limit)?;

    println!("Snapshots ({}):", snapshots.len());
    println!();
    for snapshot in &snapshots {
        println!(
            "  {}  {}  {}",
            snapshot.key,
            snapshot.created_at.format("%Y-%m-%d %H:%M:%S"),
            snapshot.record.title
        );
    }
    Ok(())
}

fn show_snapshot(store: &dyn SnapshotStore, key: &str, restore_to: Option<&Path>) -> Result<()> {
    let snapshot = store
        .get(key)?
        .with_context(|| format!("Snapshot not found: {key}"))?;

    println!("Snapshot: {}", snapshot.key);
    println!("Title: {}", snapshot.record.title);
    println!("Saved: {}", snapshot.created_at.to_rfc3339());
    println!();
    println!("--- index.html ---");
    println!("{}", snapshot.record.html);
    println!("--- style.css ---");
    println!("{}", snapshot.record.css);
    println!("--- script.js ---");
    println!("{}", snapshot.record.js);

    if let Some(dir) = restore_to {
        write_project(dir, &snapshot.record.to_buffers())?;
        println!();
        println!("Restored into {}", dir.display());
    }
    Ok(())
}

fn export_snapshots(store: &dyn SnapshotStore, output: &Path) -> Result<()> {
    if let Some(parent) = output.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    let file = File::create(output).with_context(|| format!("creating {}", output.display()))?;
    let mut writer = BufWriter::new(file);

    let count = store.export_jsonl(&mut writer)?;
    writer.flush()?;
    println!("Exported {count} snapshots to {}", output.display());
    Ok(())
}

fn init_config(
    config: &ServicesConfig,
    path: &Path,
    project: Option<&Path>,
    force: bool,
) -> Result<()> {
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    fs::write(path, config.to_toml()?).with_context(|| format!("writing {}", path.display()))?;
    println!("Wrote {}", path.display());

    if let Some(dir) = project {
        write_project(dir, &core_types::SourceBuffers::defaults())?;
        println!("Wrote starter project to {}", dir.display());
    }
    Ok(())
}

fn parse_kind(kind: Option<&str>) -> Result<Option<ContentKind>> {
    kind.map(|k| k.parse::<ContentKind>().map_err(anyhow::Error::msg))
        .transpose()
}

fn list_content(
    provider: &dyn ContentProvider,
    kind: Option<&str>,
    track: Option<&str>,
) -> Result<()> {
    let items = provider.filter(parse_kind(kind)?, track);

    println!("Content ({} items):", items.len());
    println!();
    for item in items {
        let kind = format!("{:?}", item.kind);
        println!("  {:<22} {:<12} {:<14} {}", item.id, kind, item.track, item.title);
    }
    Ok(())
}

fn show_content(provider: &dyn ContentProvider, id: &str) -> Result<()> {
    let item = provider
        .get(id)
        .with_context(|| format!("Content not found: {id}"))?;

    println!("ID: {}", item.id);
    println!("Kind: {:?}", item.kind);
    println!("Track: {}", item.track);
    println!("Title: {}", item.title);
    println!();
    println!("{}", item.description);

    if let Some(starter) = &item.starter {
        println!();
        println!("--- starter markup ---");
        println!("{}", starter.markup);
        if !starter.style.is_empty() {
            println!("--- starter style ---");
            println!("{}", starter.style);
        }
        if !starter.script.is_empty() {
            println!("--- starter script ---");
            println!("{}", starter.script);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use store::MemorySnapshotStore;
    use tempfile::tempdir;

    #[test]
    fn test_parse_kind() {
        assert_eq!(
            parse_kind(Some("challenges")).unwrap(),
            Some(ContentKind::Challenge)
        );
        assert_eq!(parse_kind(None).unwrap(), None);
        assert!(parse_kind(Some("quiz")).is_err());
    }

    #[test]
    fn test_cli_parse_assemble() {
        let cli =
            Cli::try_parse_from(["hello-world", "assemble", "--dir", "proj", "-o", "out.html"])
                .unwrap();

        match cli.command {
            Commands::Assemble { sources, output } => {
                assert_eq!(sources.dir, Some(PathBuf::from("proj")));
                assert_eq!(output, Some(PathBuf::from("out.html")));
            }
            _ => panic!("Expected Assemble command"),
        }
    }

    #[test]
    fn test_cli_parse_export_with_global_flags() {
        let cli = Cli::try_parse_from([
            "hello-world",
            "export",
            "--template",
            "--title",
            "My Cool Project!",
            "-v",
            "--config",
            "hw.toml",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 1);
        assert_eq!(cli.config, Some(PathBuf::from("hw.toml")));
        match cli.command {
            Commands::Export { sources, title, .. } => {
                assert!(sources.template);
                assert_eq!(title, "My Cool Project!");
            }
            _ => panic!("Expected Export command"),
        }
    }

    #[test]
    fn test_cli_parse_snapshots_show() {
        let cli =
            Cli::try_parse_from(["hello-world", "snapshots", "show", "1700000000000"]).unwrap();

        match cli.command {
            Commands::Snapshots {
                command: SnapshotCommands::Show { key, restore_to },
            } => {
                assert_eq!(key, "1700000000000");
                assert!(restore_to.is_none());
            }
            _ => panic!("Expected snapshots show"),
        }
    }

    #[test]
    fn test_cli_parse_content_list() {
        let cli =
            Cli::try_parse_from(["hello-world", "content", "list", "--kind", "challenge"]).unwrap();

        assert!(matches!(
            cli.command,
            Commands::Content {
                command: ContentCommands::List { .. }
            }
        ));
    }

    #[test]
    fn test_export_project_writes_file() {
        let temp = tempdir().unwrap();
        let sources = SourceArgs {
            template: true,
            ..SourceArgs::default()
        };

        export_project(&sources, "My Cool Project!", temp.path()).unwrap();

        let written = fs::read_to_string(temp.path().join("my-cool-project.html")).unwrap();
        assert!(written.contains("<title>My Cool Project!</title>"));
    }

    #[test]
    fn test_snapshot_restore_and_export() {
        let temp = tempdir().unwrap();
        let store = MemorySnapshotStore::new();
        let snapshot = export::save_snapshot(
            &store,
            &core_types::SourceBuffers::new("<p>x</p>", "p{}", "go()"),
            "Saved",
        )
        .unwrap();

        let restore_dir = temp.path().join("restored");
        show_snapshot(&store, &snapshot.key, Some(&restore_dir)).unwrap();
        assert_eq!(
            fs::read_to_string(restore_dir.join("script.js")).unwrap(),
            "go()"
        );

        let output = temp.path().join("out").join("snapshots.jsonl");
        export_snapshots(&store, &output).unwrap();
        assert_eq!(fs::read_to_string(output).unwrap().lines().count(), 1);
    }

    #[test]
    fn test_init_refuses_to_overwrite() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("hello-world.toml");
        let config = ServicesConfig::default();

        init_config(&config, &path, Some(&temp.path().join("starter")), false).unwrap();
        assert!(init_config(&config, &path, None, false).is_err());
        assert!(init_config(&config, &path, None, true).is_ok());
        assert!(temp.path().join("starter").join("index.html").exists());

        let written = ServicesConfig::from_file(&path).unwrap();
        assert_eq!(written, config);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_run_project_reports() {
        let temp = tempdir().unwrap();
        write_project(
            temp.path(),
            &core_types::SourceBuffers::new("", "", r#"throw new Error("x")"#),
        )
        .unwrap();
        let sources = SourceArgs {
            dir: Some(temp.path().to_path_buf()),
            ..SourceArgs::default()
        };

        run_project(&ServicesConfig::default(), &sources, true)
            .await
            .unwrap();
    }
}
