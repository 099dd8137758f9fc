use clap::Parser;
use match3_engine::autoplay::play_with_hints;
use match3_engine::config::EngineConfig;
use match3_engine::engine::{Board, RandomTiles, BOARD_SIZE};
use match3_engine::resolver::Resolver;
use match3_engine::utils::board_from_str_array;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Maximum number of swaps to play
    #[clap(short, long, default_value_t = 50)]
    moves: u32,

    /// Seed for the board and refills (overrides the config file)
    #[clap(short, long)]
    seed: Option<u64>,

    /// Path to a TOML config file
    #[clap(short, long)]
    config: Option<PathBuf>,

    /// Optional starting board (8x8 grid, one row per line)
    board_file: Option<PathBuf>,
}

fn read_board_file(path: &Path) -> Result<Board, String> {
    let content = fs::read_to_string(path).map_err(|e| format!("Failed to read file: {}", e))?;

    let lines: Vec<&str> = content
        .lines()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect();

    if lines.len() != BOARD_SIZE {
        return Err(format!(
            "Expected {} lines in board file, found {}",
            BOARD_SIZE,
            lines.len()
        ));
    }

    for (i, line) in lines.iter().enumerate() {
        if line.chars().count() != BOARD_SIZE {
            return Err(format!(
                "Line {} has {} characters (expected {})",
                i + 1,
                line.chars().count(),
                BOARD_SIZE
            ));
        }
    }

    board_from_str_array(&lines).map_err(|e| format!("Invalid board format: {}", e))
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => match EngineConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Failed to load config: {}", e);
                return ExitCode::FAILURE;
            }
        },
        None => EngineConfig::default(),
    };
    if args.seed.is_some() {
        config.seed = args.seed;
    }

    let created = match &args.board_file {
        Some(path) => match read_board_file(path) {
            Ok(board) => {
                println!("Loaded board from {}\n", path.display());
                let source = RandomTiles::from_config(&config);
                Resolver::with_board(board, source, config)
            }
            Err(e) => {
                eprintln!("{}", e);
                return ExitCode::FAILURE;
            }
        },
        None => Resolver::new(config),
    };
    let mut resolver = match created {
        Ok(resolver) => resolver,
        Err(e) => {
            eprintln!("Invalid config: {}", e);
            return ExitCode::FAILURE;
        }
    };

    println!("Initial board state:\n{}\n", resolver.board());
    println!("Playing up to {} moves with hints...\n", args.moves);

    match play_with_hints(&mut resolver, args.moves) {
        Ok(summary) => {
            println!("Moves played:    {}", summary.moves);
            println!("Total score:     {}", summary.total_score);
            println!("Time bonus:      {}", summary.time_bonus);
            println!("Match groups:    {}", summary.match_groups);
            println!("Longest cascade: {}", summary.longest_cascade);
            if summary.stalled {
                println!("Stopped early: no swap on the board makes a match.");
            }
            println!("\nFinal board state:\n{}\n", resolver.board());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Engine error: {}", e);
            ExitCode::FAILURE
        }
    }
}
