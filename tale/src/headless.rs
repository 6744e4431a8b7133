//! Line-oriented story player.
//!
//! Scenes are printed as tagged blocks; input is read one line at a time:
//! - an empty line continues a single-choice scene
//! - a number picks that choice of a multiple-choice scene
//! - lines starting with `#` are commands (quit, status, help)

use std::io::{self, BufRead, Write};
use tale_core::{
    Navigation, PlaybackError, PlaybackStep, SceneBackground, SceneText, StoryPlayback,
};

/// Play `playback` on stdin/stdout until the story ends or the user quits.
pub async fn run_headless(mut playback: StoryPlayback) -> Result<(), PlaybackError> {
    let story = playback.story().clone();
    println!("=== {} ===", story.title);
    println!("by {}", story.author);
    println!();
    print_help();
    println!();
    print_scene(&playback);

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                eprintln!("Error reading input: {e}");
                break;
            }
        };
        let line = line.trim();

        if let Some(command) = line.strip_prefix('#') {
            match command.trim() {
                "quit" | "exit" => {
                    println!("Progress saved. Goodbye!");
                    break;
                }
                "status" => {
                    println!("[STATUS]");
                    println!("  Story: {}", story.title);
                    println!(
                        "  Scene: {}",
                        playback.current_scene_name().unwrap_or_default()
                    );
                }
                "help" => print_help(),
                _ => println!("[ERROR] Unknown command. Type #help for help."),
            }
            stdout.flush().ok();
            continue;
        }

        let result = if line.is_empty() {
            playback.advance().await
        } else {
            match line.parse::<usize>() {
                Ok(n) if n >= 1 => playback.choose(n - 1).await,
                _ => {
                    println!("[ERROR] Enter a choice number, or an empty line to continue.");
                    continue;
                }
            }
        };

        match result {
            Ok(PlaybackStep::Scene { .. }) => print_scene(&playback),
            Ok(PlaybackStep::Ended) => {
                println!("[END] Thanks for playing.");
                break;
            }
            Err(
                e @ (PlaybackError::NoSuchChoice { .. } | PlaybackError::WrongNavigation { .. }),
            ) => println!("[ERROR] {e}"),
            Err(e) => return Err(e),
        }
        stdout.flush().ok();
    }

    Ok(())
}

fn print_help() {
    println!("Commands:");
    println!("  <enter>  - Continue (single-choice scenes)");
    println!("  <n>      - Pick choice n (multiple-choice scenes)");
    println!("  #status  - Show where you are");
    println!("  #quit    - Stop playing; progress is kept");
    println!("  #help    - Show this help");
}

fn print_scene(playback: &StoryPlayback) {
    let Some(scene) = playback.current_scene() else {
        return;
    };

    println!(
        "[SCENE] {}",
        playback.current_scene_name().unwrap_or_default()
    );
    match &scene.background {
        SceneBackground::Color(color) => println!("[BACKGROUND] {color}"),
        SceneBackground::Media(path) => println!("[BACKGROUND] {}", path.display()),
    }
    match &scene.text {
        SceneText::Attention(text) => println!("[ATTENTION] {text}"),
        SceneText::Narration(text) => {
            println!("[NARRATION]");
            for para in text.split("\n\n") {
                println!("{para}");
            }
        }
    }
    match &scene.navigation {
        Navigation::Single(destination) if destination.is_end() => {
            println!("(press enter to finish)");
        }
        Navigation::Single(_) => println!("(press enter to continue)"),
        Navigation::Multiple(choices) => {
            for (i, choice) in choices.iter().enumerate() {
                println!("  {}) {}", i + 1, choice.action);
            }
        }
    }
    println!();
}
