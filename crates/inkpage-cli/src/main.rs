//! Command-line inspector for stored pages.
//!
//! ```text
//! inkpage <storage-dir> <page-id> [stats|undo|redo|insert <n>]
//! ```

use inkpage_core::{DrawingManager, EditorConfig, FileStorage, PersistenceWorker};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

const USAGE: &str = "usage: inkpage <storage-dir> <page-id> [stats|undo|redo|insert <n>]";

enum Command {
    Stats,
    Undo,
    Redo,
    Insert(usize),
}

impl Command {
    fn parse(args: &[String]) -> Option<Self> {
        match args {
            [] => Some(Command::Stats),
            [cmd] if cmd == "stats" => Some(Command::Stats),
            [cmd] if cmd == "undo" => Some(Command::Undo),
            [cmd] if cmd == "redo" => Some(Command::Redo),
            [cmd, n] if cmd == "insert" => n.parse().ok().map(Command::Insert),
            _ => None,
        }
    }
}

fn main() -> ExitCode {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (Some(dir), Some(page_id)) = (args.first(), args.get(1)) else {
        eprintln!("{USAGE}");
        return ExitCode::FAILURE;
    };
    let Some(command) = Command::parse(&args[2..]) else {
        eprintln!("{USAGE}");
        return ExitCode::FAILURE;
    };

    let config = EditorConfig::default();
    let storage = match FileStorage::new(PathBuf::from(dir)) {
        Ok(storage) => Arc::new(storage),
        Err(e) => {
            log::error!("Failed to open storage at {}: {}", dir, e);
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };
    let worker = PersistenceWorker::spawn(storage.clone());
    let mut manager = DrawingManager::open(page_id, &config, &*storage, worker.handle());
    log::info!("Opened page {} with {} strokes", page_id, manager.page().len());

    let ok = match command {
        Command::Stats => true,
        Command::Undo => manager.undo(),
        // The redo stack is not persisted; a fresh process has nothing to redo.
        Command::Redo => manager.redo(),
        Command::Insert(n) => match manager.insert_page(n) {
            Ok(insertion) => {
                println!("inserted page {} ({} strokes shifted)", n, insertion.shifted.len());
                true
            }
            Err(e) => {
                eprintln!("{e}");
                false
            }
        },
    };
    worker.handle().flush();
    print_stats(&manager);

    if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE }
}

fn print_stats(manager: &DrawingManager) {
    let pages = manager.viewport().pagination();
    println!("page:      {}", manager.page().page_id());
    println!("strokes:   {}", manager.page().len());
    println!("pages:     {}", pages.total_page_count());
    for number in 1..=pages.total_page_count() {
        println!("  page {:>3}: {} strokes", number, manager.page().stroke_count_on_page(pages, number));
    }
    println!("height:    {:.0}", pages.document_height());
    println!(
        "history:   {} undo / {} redo",
        manager.history().undo_depth(),
        manager.history().redo_depth()
    );
}
