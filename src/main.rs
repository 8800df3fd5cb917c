// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use songcast::session::{MemorySessionStore, SessionController, SessionStore};
use songcast::song::{parse_with, part_label};
use songcast::sync::{StoreWatcher, SyncHub};
use songcast::views::{DirectorView, LiveView};
use songcast::Config;

const DEFAULT_CONFIG: &str = "songcast.yaml";

fn print_usage() {
    println!("songcast - Lyrics presentation with director and live displays");
    println!();
    println!("Usage: songcast [--config <FILE>] [--verbose] <COMMAND>");
    println!();
    println!("Commands:");
    println!("  parse <FILE.md>            Parse a song and print its parts");
    println!("  import <FILES...>          Add songs from .md/.markdown/.json files");
    println!("  list                       List songs in the session");
    println!("  select <SONG-ID>           Put a song live");
    println!("  part <INDEX>               Put a part of the live song live");
    println!("  next                       Advance to the next part");
    println!("  prev                       Go back one part");
    println!("  export <DIR>               Export the collection as JSON");
    println!("  export-song <SONG-ID> <DIR>  Export one song as markdown");
    println!("  reset                      Clear all songs");
    println!("  live                       Follow the session and print the live part");
    println!("  --help                     Show this help message");
}

fn init_logging(config: &Config, verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        config.tracing_level()
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn controller(config: &Config) -> SessionController {
    SessionController::new(Box::new(config.store()), None)
        .with_heading_policy(config.unrecognized_headings)
}

fn parse_file(config: &Config, path: &Path) -> Result<()> {
    let markdown = fs::read_to_string(path)
        .with_context(|| format!("Failed to read song file: {:?}", path))?;
    let song = parse_with(&markdown, "preview", config.unrecognized_headings);

    println!("{}", song.title);
    for (i, part) in song.parts.iter().enumerate() {
        println!();
        println!("{}. {}", i + 1, part_label(part));
        println!("{}", part.lyrics);
    }
    Ok(())
}

fn list_songs(director: &DirectorView) {
    let session = director.session();
    if session.songs.is_empty() {
        println!("No songs. Use `songcast import <FILES...>` to add some.");
        return;
    }
    for song in &session.songs {
        let marker = if session.current_song_id.as_deref() == Some(song.id.as_str()) {
            "*"
        } else {
            " "
        };
        println!("{} {}  {} ({} parts)", marker, song.id, song.title, song.parts.len());
    }
    for part in director.part_list() {
        let marker = if part.live { ">" } else { " " };
        println!("    {} {}: {}", marker, part.index, part.label);
    }
}

fn run_live(config: &Config) -> Result<()> {
    let store = config.store();
    let watcher = StoreWatcher::new(store.path(), Some(config.watch_debounce_ms))?;

    let hub = SyncHub::new();
    let bridge = hub.open(&config.channel_name);
    let mut subscription = hub.open(&config.channel_name).subscribe();

    // The live context keeps its own copy of the session; only the director writes the file
    let mut local = MemorySessionStore::new();
    match store.load() {
        Ok(Some(session)) => local.save(&session)?,
        Ok(None) => {}
        Err(e) => tracing::warn!("Failed to load session: {}", e),
    }
    let mut view = LiveView::new(SessionController::new(Box::new(local), None));
    println!("Following {:?} (press Ctrl+C to stop)...", store.path());
    print!("{}", view.frame().render_text());

    loop {
        if let Some(event) = watcher.recv_timeout(Duration::from_millis(200)) {
            if let Some(message) = event.into_message() {
                bridge.send(message);
            }
        }
        watcher.forward(&bridge);

        let messages = subscription.recv_all();
        if messages.is_empty() {
            continue;
        }
        for message in messages {
            view.apply(message);
        }
        println!("----------------------------------------");
        print!("{}", view.frame().render_text());
    }
}

fn require<'a>(args: &'a [String], index: usize, what: &str) -> Result<&'a str> {
    args.get(index)
        .map(String::as_str)
        .ok_or_else(|| anyhow!("Missing {}", what))
}

fn main() -> Result<()> {
    let mut args: Vec<String> = env::args().skip(1).collect();

    let mut config_path = PathBuf::from(DEFAULT_CONFIG);
    let mut verbose = false;
    while let Some(first) = args.first().cloned() {
        match first.as_str() {
            "--config" => {
                if args.len() < 2 {
                    eprintln!("Error: --config requires a file path");
                    std::process::exit(1);
                }
                config_path = PathBuf::from(args.remove(1));
                args.remove(0);
            }
            "--verbose" | "-v" => {
                verbose = true;
                args.remove(0);
            }
            _ => break,
        }
    }

    let config = Config::load_or_default(&config_path)?;
    init_logging(&config, verbose);

    if args.is_empty() {
        println!("songcast - Lyrics presentation with director and live displays");
        println!("Run with --help for usage information");
        return Ok(());
    }

    match args[0].as_str() {
        "parse" => {
            let file = require(&args, 1, "song file")?;
            parse_file(&config, Path::new(file))?;
        }
        "import" => {
            if args.len() < 2 {
                eprintln!("Error: import requires at least one file");
                std::process::exit(1);
            }
            let mut director = DirectorView::new(controller(&config));
            let report = director.files_selected(&args[1..]);
            for error in &report.errors {
                eprintln!("{}", error);
            }
            for skipped in &report.skipped {
                eprintln!("Skipped unsupported file: {}", skipped);
            }
            println!("Added {} song(s)", report.songs.len());
        }
        "list" => {
            list_songs(&DirectorView::new(controller(&config)));
        }
        "select" => {
            let id = require(&args, 1, "song id")?;
            let mut director = DirectorView::new(controller(&config));
            if director.session().song(id).is_none() {
                return Err(anyhow!("No song with id {}", id));
            }
            director.select_song(id);
            list_songs(&director);
        }
        "part" => {
            let index: usize = require(&args, 1, "part index")?
                .parse()
                .map_err(|_| anyhow!("Invalid part index: {}", args[1]))?;
            let mut director = DirectorView::new(controller(&config));
            director.show_part(index);
            list_songs(&director);
        }
        "next" => {
            let mut director = DirectorView::new(controller(&config));
            director.next_part();
            list_songs(&director);
        }
        "prev" => {
            let mut director = DirectorView::new(controller(&config));
            director.previous_part();
            list_songs(&director);
        }
        "export" => {
            let dir = require(&args, 1, "output directory")?;
            let director = DirectorView::new(controller(&config));
            let path = director.export_collection(dir)?;
            println!("Exported {} song(s) to {:?}", director.session().songs.len(), path);
        }
        "export-song" => {
            let id = require(&args, 1, "song id")?;
            let dir = require(&args, 2, "output directory")?;
            let director = DirectorView::new(controller(&config));
            let path = director.export_song(id, dir)?;
            println!("Exported {:?}", path);
        }
        "reset" => {
            let mut director = DirectorView::new(controller(&config));
            director.new_session();
            println!("Session cleared");
        }
        "live" => {
            run_live(&config)?;
        }
        "--help" | "-h" => {
            print_usage();
        }
        _ => {
            eprintln!("Unknown command: {}", args[0]);
            print_usage();
            std::process::exit(1);
        }
    }

    Ok(())
}
