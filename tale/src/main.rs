//! Command-line player and authoring tool for tale story libraries.
//!
//! The library lives under `$TALE_DATA_DIR` (default: the platform data
//! directory). Set `RUST_LOG` to see what the library is doing.
//!
//! ```bash
//! cargo run -p tale -- create --title "The Lighthouse"
//! cargo run -p tale -- list workspace
//! cargo run -p tale -- play <story-dir>
//! ```

mod headless;

use std::path::{Path, PathBuf};
use tale_core::scene::{resolve_scenes_from_fs, SceneText};
use tale_core::story::{resolve_stories_from_fs, resolve_story_info};
use tale_core::{
    Destination, LibraryConfig, Navigation, Platform, ProgressTracker, StoryCreator,
    StoryLocation, StoryPlayback, StorySaveManager, END_SENTINEL,
};
use tracing_subscriber::EnvFilter;

type CliResult = Result<(), Box<dyn std::error::Error>>;

/// A parsed command line.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    List(Option<StoryLocation>),
    Create {
        title: String,
        description: String,
        author: String,
    },
    Scenes(PathBuf),
    Play {
        story_dir: PathBuf,
        restart: bool,
    },
    Continue,
    Export {
        story_dir: PathBuf,
        archive: PathBuf,
    },
    Import {
        archive: PathBuf,
        location: StoryLocation,
    },
    Move {
        story_dir: PathBuf,
        location: StoryLocation,
    },
    Delete(PathBuf),
    Help,
}

#[tokio::main]
async fn main() -> CliResult {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = match parse_command(&args) {
        Ok(command) => command,
        Err(message) => {
            eprintln!("Error: {message}");
            eprintln!("Run `tale help` for usage.");
            std::process::exit(2);
        }
    };

    if command == Command::Help {
        print_help();
        return Ok(());
    }

    let config = LibraryConfig::from_env().await?;
    tracing::debug!(root = %config.app_data_dir.display(), ?command, "running command");
    run(command, &config).await
}

/// Parse arguments (without the program name) into a command.
fn parse_command(args: &[String]) -> Result<Command, String> {
    let Some(name) = args.first() else {
        return Ok(Command::Help);
    };
    let rest = &args[1..];

    let path_arg = |i: usize, what: &str| {
        rest.get(i)
            .map(PathBuf::from)
            .ok_or_else(|| format!("{name}: missing {what}"))
    };
    let location_arg = |i: usize, default: Option<StoryLocation>| match rest.get(i) {
        Some(value) => StoryLocation::parse(value)
            .ok_or_else(|| format!("unknown location '{value}' (collections or workspace)")),
        None => default.ok_or_else(|| format!("{name}: missing location")),
    };

    match name.as_str() {
        "list" => match rest.first() {
            Some(_) => Ok(Command::List(Some(location_arg(0, None)?))),
            None => Ok(Command::List(None)),
        },
        "create" => {
            let mut title = None;
            let mut description = String::new();
            let mut author = String::new();

            let mut i = 0;
            while i < rest.len() {
                match rest[i].as_str() {
                    "--title" => {
                        title = rest.get(i + 1).cloned();
                        i += 1;
                    }
                    "--description" => {
                        description = rest.get(i + 1).cloned().unwrap_or_default();
                        i += 1;
                    }
                    "--author" => {
                        author = rest.get(i + 1).cloned().unwrap_or_default();
                        i += 1;
                    }
                    other => return Err(format!("create: unexpected argument '{other}'")),
                }
                i += 1;
            }

            let title = title
                .filter(|t| !t.trim().is_empty())
                .ok_or_else(|| "create: --title is required".to_string())?;
            Ok(Command::Create {
                title,
                description,
                author,
            })
        }
        "scenes" => Ok(Command::Scenes(path_arg(0, "story directory")?)),
        "play" => Ok(Command::Play {
            story_dir: path_arg(0, "story directory")?,
            restart: rest.iter().any(|a| a == "--restart"),
        }),
        "continue" => Ok(Command::Continue),
        "export" => Ok(Command::Export {
            story_dir: path_arg(0, "story directory")?,
            archive: path_arg(1, "archive path")?,
        }),
        "import" => Ok(Command::Import {
            archive: path_arg(0, "archive path")?,
            location: location_arg(1, Some(StoryLocation::Collections))?,
        }),
        "move" => Ok(Command::Move {
            story_dir: path_arg(0, "story directory")?,
            location: location_arg(1, None)?,
        }),
        "delete" => Ok(Command::Delete(path_arg(0, "story directory")?)),
        "help" | "--help" | "-h" => Ok(Command::Help),
        other => Err(format!("unknown command '{other}'")),
    }
}

async fn run(command: Command, config: &LibraryConfig) -> CliResult {
    let tracker = ProgressTracker::new(config);

    match command {
        Command::List(location) => {
            let locations = match location {
                Some(location) => vec![location],
                None => vec![StoryLocation::Collections, StoryLocation::Workspace],
            };
            for location in locations {
                let dir = config.dir_for(location);
                println!("[{}] {}", location.name(), dir.display());
                for story in resolve_stories_from_fs(config, location).await? {
                    let marker = if tracker.story_has_progress(&story).await? {
                        " (in progress)"
                    } else {
                        ""
                    };
                    println!("  {} by {}{marker}", story.title, story.author);
                    println!("    {}", story.base_dir.display());
                }
            }
            println!();
            println!(
                "Open these folders in your {} to add resources.",
                Platform::current().file_manager_name()
            );
        }
        Command::Create {
            title,
            description,
            author,
        } => {
            let mut creator = StoryCreator::new(config.clone()).await?;
            let dir = creator
                .create_new_story(&title, &description, &author)
                .await?;
            println!("[CREATED] {title}");
            println!("{}", dir.display());
        }
        Command::Scenes(story_dir) => {
            let story = resolve_story_info(&story_dir).await?;
            println!("[STORY] {}", story.title);
            for info in resolve_scenes_from_fs(&story.base_dir).await? {
                let entry = if info.scene_path == story.entry_point {
                    " (entry point)"
                } else {
                    ""
                };
                let kind = match info.scene.text {
                    SceneText::Attention(_) => "attention",
                    SceneText::Narration(_) => "narration",
                };
                println!("  {} [{kind}]{entry}", info.scene_name);

                let edges: Vec<(Option<&str>, String)> = match &info.scene.navigation {
                    Navigation::Single(destination) => vec![(None, describe(destination))],
                    Navigation::Multiple(choices) => choices
                        .iter()
                        .map(|c| (Some(c.action.as_str()), describe(&c.destination)))
                        .collect(),
                };
                for (action, target) in edges {
                    match action {
                        Some(action) => println!("    \"{action}\" -> {target}"),
                        None => println!("    -> {target}"),
                    }
                }
            }
        }
        Command::Play { story_dir, restart } => {
            play(&story_dir, restart, &tracker).await?;
        }
        Command::Continue => match tracker.continuable_story().await? {
            Some(story_dir) => play(&story_dir, false, &tracker).await?,
            None => println!("Nothing to continue."),
        },
        Command::Export { story_dir, archive } => {
            let story = resolve_story_info(&story_dir).await?;
            let manager = StorySaveManager::with_zip(config.clone());
            let archive = manager.export_story(&story, &archive).await?;
            println!("[EXPORTED] {}", archive.display());
        }
        Command::Import { archive, location } => {
            let manager = StorySaveManager::with_zip(config.clone());
            let story = manager.import_story(&archive, location).await?;
            println!("[IMPORTED] {}", story.title);
            println!("{}", story.base_dir.display());
        }
        Command::Move {
            story_dir,
            location,
        } => {
            let story = resolve_story_info(&story_dir).await?;
            let manager = StorySaveManager::with_zip(config.clone());
            let moved = manager.move_story(&story, location).await?;
            println!("[MOVED] {}", moved.display());
        }
        Command::Delete(story_dir) => {
            let story = resolve_story_info(&story_dir).await?;
            let mut creator = StoryCreator::new(config.clone()).await?;
            creator.delete_story(&story).await?;
            println!("[DELETED] {}", story.title);
        }
        Command::Help => print_help(),
    }

    Ok(())
}

async fn play(story_dir: &Path, restart: bool, tracker: &ProgressTracker) -> CliResult {
    let story = resolve_story_info(story_dir).await?;
    tracker
        .update_last_played(Some(story.base_dir.as_path()))
        .await?;

    let playback = if restart {
        StoryPlayback::begin(story, tracker.clone()).await?
    } else {
        StoryPlayback::resume(story, tracker.clone()).await?
    };
    headless::run_headless(playback).await?;
    Ok(())
}

fn describe(destination: &Destination) -> String {
    destination
        .scene_name()
        .unwrap_or_else(|| END_SENTINEL.to_string())
}

fn print_help() {
    println!("tale - play and author branching stories");
    println!();
    println!("Usage: tale <command> [args]");
    println!();
    println!("Commands:");
    println!("  list [collections|workspace]       List stories");
    println!("  create --title T [--description D] [--author A]");
    println!("                                     Create a story in the workspace");
    println!("  scenes <story-dir>                 Show the scenes of a story");
    println!("  play <story-dir> [--restart]       Play a story");
    println!("  continue                           Continue the last played story");
    println!("  export <story-dir> <archive>       Export a story to a zip archive");
    println!("  import <archive> [location]        Import a story (default: collections)");
    println!("  move <story-dir> <location>        Move a story to another location");
    println!("  delete <story-dir>                 Delete a story");
    println!("  help                               Show this help");
}
