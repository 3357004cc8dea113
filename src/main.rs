use std::path::PathBuf;

use clap::{CommandFactory, Parser};
use log::info;

use encore::config;
use encore::document::ScoreDocument;

#[derive(Parser)]
#[command(
    name = "encore",
    version = encore::VERSION,
    long_version = encore::LONG_VERSION,
    about = "Sheet-music PDF viewer for the terminal (Kitty graphics)"
)]
struct Cli {
    /// PDF score to open
    input: Option<PathBuf>,

    /// Start in single-page mode instead of two-page spreads
    #[arg(long)]
    single: bool,

    /// Start with the status bar visible
    #[arg(long)]
    windowed: bool,

    /// Disable automatic reload when the file changes on disk
    #[arg(long)]
    no_watch: bool,

    /// Log output file path (enables logging when specified)
    #[arg(long)]
    log: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();

    // The viewer owns the terminal, so logging only goes to a file.
    if let Some(log_path) = &cli.log {
        match std::fs::File::create(log_path) {
            Ok(file) => env_logger::Builder::from_default_env()
                .target(env_logger::Target::Pipe(Box::new(file)))
                .init(),
            Err(e) => {
                eprintln!("Error: failed to open log file {}: {e}", log_path.display());
                std::process::exit(1);
            }
        }
    }

    let Some(input) = cli.input else {
        eprintln!("{}", Cli::command().render_usage());
        std::process::exit(1);
    };

    // Load config file and merge CLI overrides
    let mut cfg = match config::load_config() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {e:#}");
            std::process::exit(1);
        }
    };
    cfg.merge_cli(
        cli.single.then_some(false),
        cli.windowed.then_some(false),
    );
    let config = cfg.resolve();

    // Open before touching the terminal: a bad file never shows the UI.
    let doc = match ScoreDocument::open(&input) {
        Ok(doc) => doc,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };
    info!("encore {}: {}", encore::LONG_VERSION, doc.path().display());

    if let Err(e) = encore::viewer::run(doc, &config, !cli.no_watch) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
