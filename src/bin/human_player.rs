use clap::Parser;
use match3_engine::config::EngineConfig;
use match3_engine::engine::{Position, BOARD_SIZE};
use match3_engine::error::EngineError;
use match3_engine::resolver::Resolver;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Seed for the board and refills (overrides the config file)
    #[clap(short, long)]
    seed: Option<u64>,

    /// Path to a TOML config file
    #[clap(short, long)]
    config: Option<PathBuf>,
}

fn parse_swap(input: &str) -> Option<(Position, Position)> {
    let numbers: Vec<usize> = input
        .split_whitespace()
        .map(str::parse)
        .collect::<Result<_, _>>()
        .ok()?;
    match numbers.as_slice() {
        [r1, c1, r2, c2] => Some((Position::new(*r1, *c1), Position::new(*r2, *c2))),
        _ => None,
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
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

    let mut hints_left = config.hints_per_level;
    let mut resolver = match Resolver::new(config) {
        Ok(resolver) => resolver,
        Err(e) => {
            eprintln!("Invalid config: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let mut score = 0u32;
    let mut time_bonus = 0u32;
    let mut highlight: Vec<Position> = Vec::new();

    println!("Welcome to Match-3!");

    loop {
        println!("---------------------");
        println!("Score: {}, Time bonus: {}, Hints left: {}", score, time_bonus, hints_left);
        println!("{}", resolver.board().to_string_with_highlight(&highlight));
        highlight.clear();

        print!("Enter a swap (r1 c1 r2 c2), 'h' for a hint, or 'q' to quit: ");
        if io::stdout().flush().is_err() {
            return ExitCode::FAILURE;
        }

        let mut input = String::new();
        match io::stdin().read_line(&mut input) {
            Ok(0) => break,
            Ok(_) => {}
            Err(_) => {
                println!("Error reading input. Please try again.");
                continue;
            }
        }

        let trimmed_input = input.trim();

        if trimmed_input == "q" {
            println!("Thanks for playing! Final score: {}", score);
            break;
        }

        if trimmed_input == "h" {
            if hints_left == 0 {
                println!("No hints left for this level.");
                continue;
            }
            hints_left -= 1;
            match resolver.find_hint() {
                Some((a, b)) => {
                    println!("Try swapping {} with {}.", a.position(), b.position());
                    highlight = vec![a.position(), b.position()];
                }
                None => println!("No swap on this board makes a match."),
            }
            continue;
        }

        let Some((a, b)) = parse_swap(trimmed_input) else {
            println!("Invalid input format. Use 'r1 c1 r2 c2', 'h', or 'q'.");
            continue;
        };

        match resolver.play_move(a, b) {
            Ok(report) if report.is_empty() => println!("No match."),
            Ok(report) => {
                score = score.saturating_add(report.total_score_delta);
                time_bonus = time_bonus.saturating_add(report.time_bonus_count);
                println!(
                    "Matched {} group(s) over {} cascade step(s) for {} points.",
                    report.match_group_count,
                    report.cascade_depth(),
                    report.total_score_delta
                );
            }
            Err(EngineError::InvalidSwap { reason, .. }) => {
                // Treated as a deselect: nothing on the board changed.
                println!(
                    "Swap ignored ({}). Coordinates run from 0 to {}.",
                    reason,
                    BOARD_SIZE - 1
                );
            }
            Err(e) => {
                eprintln!("Engine error: {}", e);
                return ExitCode::FAILURE;
            }
        }
    }

    ExitCode::SUCCESS
}
