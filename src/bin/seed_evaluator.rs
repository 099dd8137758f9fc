use clap::Parser;
use match3_engine::autoplay::play_with_hints;
use match3_engine::config::EngineConfig;
use match3_engine::resolver::Resolver;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Number of seeded boards to evaluate
    #[clap(short, long, default_value_t = 20)]
    boards: u64,

    /// First seed; boards use consecutive seeds from here
    #[clap(long, default_value_t = 0)]
    start_seed: u64,

    /// Maximum swaps per board
    #[clap(short, long, default_value_t = 30)]
    moves: u32,

    /// Path to a TOML config file; its seed is replaced by each board's seed
    #[clap(short, long)]
    config: Option<PathBuf>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let base_config = match &args.config {
        Some(path) => match EngineConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Failed to load config: {}", e);
                return ExitCode::FAILURE;
            }
        },
        None => EngineConfig::default(),
    };

    println!("Starting hint-player evaluation for {} boards...", args.boards);

    let mut scores: Vec<u32> = Vec::new();
    let mut stalled_boards = 0u32;
    let mut deepest_cascade = 0usize;

    for board_idx in 0..args.boards {
        let seed = args.start_seed + board_idx;
        let config = EngineConfig {
            seed: Some(seed),
            ..base_config.clone()
        };
        let mut resolver = match Resolver::new(config) {
            Ok(resolver) => resolver,
            Err(e) => {
                eprintln!("Invalid config: {}", e);
                return ExitCode::FAILURE;
            }
        };

        let summary = match play_with_hints(&mut resolver, args.moves) {
            Ok(summary) => summary,
            Err(e) => {
                eprintln!("Engine error on board {} (Seed: {}): {}", board_idx, seed, e);
                return ExitCode::FAILURE;
            }
        };

        println!(
            "  Board {:<3} (Seed: {:<4}) Score: {:<6} Moves: {:<3} Longest cascade: {}{}",
            board_idx,
            seed,
            summary.total_score,
            summary.moves,
            summary.longest_cascade,
            if summary.stalled { "  [stalled]" } else { "" }
        );

        scores.push(summary.total_score);
        deepest_cascade = deepest_cascade.max(summary.longest_cascade);
        if summary.stalled {
            stalled_boards += 1;
        }
    }

    println!("\n--- Evaluation Complete ---");
    println!("Number of boards evaluated: {}", scores.len());
    if scores.is_empty() {
        println!("No scores recorded.");
        return ExitCode::SUCCESS;
    }

    let total_score: u64 = scores.iter().map(|&s| u64::from(s)).sum();
    let avg_score = total_score as f64 / scores.len() as f64;
    println!("Average score:   {:.2}", avg_score);
    println!("Best score:      {}", scores.iter().max().copied().unwrap_or(0));
    println!("Stalled boards:  {}", stalled_boards);
    println!("Deepest cascade: {}", deepest_cascade);

    ExitCode::SUCCESS
}
