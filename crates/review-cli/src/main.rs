mod config;
mod report;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use chess_analysis::{
    bootstrap, format_score, EngineClient, EngineConfig, GameAnalyzer, GameReview,
    ReviewNavigator,
};
use chess_core::{parse_pgn, Board};
use chess_puzzles::{MoveOutcome, PuzzleCatalog, PuzzleEvent, PuzzleRunner, PuzzleStatus};
use clap::{Parser, Subcommand};
use config::ReviewConfig;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "chess-review")]
#[command(about = "Engine-backed chess game review and puzzle trainer")]
struct Cli {
    /// Configuration file
    #[arg(long, global = true, default_value = "review.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze every move of a PGN game
    Analyze {
        /// PGN file (first game is used)
        pgn: PathBuf,
        /// Search depth per position
        #[arg(short, long)]
        depth: Option<u32>,
        /// Where to write the review JSON
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Evaluate one position, printing each depth as it arrives
    Eval {
        /// Position in FEN
        fen: String,
        #[arg(short, long)]
        depth: Option<u32>,
    },
    /// Show a saved review at a move
    Review {
        /// Review JSON written by `analyze`
        file: PathBuf,
        /// Move index, -1 for the initial position
        #[arg(short = 'm', long = "move", allow_negative_numbers = true)]
        index: Option<isize>,
    },
    /// List the puzzle catalog
    Puzzles {
        /// Only puzzles with this theme
        #[arg(short, long)]
        theme: Option<String>,
    },
    /// Solve a puzzle interactively
    Puzzle {
        /// Puzzle id (defaults to the first)
        id: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = ReviewConfig::load(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    debug!(path = %cli.config.display(), depth = config.depth, "configuration loaded");

    match cli.command {
        Commands::Analyze { pgn, depth, output } => {
            analyze(&config, &pgn, depth.unwrap_or(config.depth), output).await
        }
        Commands::Eval { fen, depth } => eval(&config, &fen, depth.unwrap_or(config.depth)).await,
        Commands::Review { file, index } => review(&file, index),
        Commands::Puzzles { theme } => {
            let catalog = config.puzzles.catalog()?;
            let puzzles: Vec<_> = match &theme {
                Some(theme) => catalog.by_theme(theme),
                None => catalog.all().iter().collect(),
            };
            for p in puzzles {
                println!("{}", report::puzzle_line(p));
            }
            Ok(())
        }
        Commands::Puzzle { id } => puzzle(&config, id).await,
    }
}

async fn start_engine(config: &EngineConfig) -> anyhow::Result<EngineClient> {
    let engine = bootstrap::launch(
        &config.providers(),
        &config.retry_policy(),
        &config.engine_options(),
        config.bootstrap_timeout(),
    )
    .await?;
    eprintln!("Engine: {} ({})", engine.name(), engine.source());
    Ok(engine)
}

async fn analyze(
    config: &ReviewConfig,
    pgn: &Path,
    depth: u32,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let text =
        std::fs::read_to_string(pgn).with_context(|| format!("reading {}", pgn.display()))?;
    // Reject bad input before starting an engine
    let game = parse_pgn(&text)?;
    info!(moves = game.moves.len(), depth, "game loaded");

    let engine = start_engine(&config.engine).await?;
    let analyzer = GameAnalyzer::new(engine.clone(), depth);
    let result = analyzer
        .analyze(&game, |p| eprint!("\rAnalyzing... {:>3}%", p.percent))
        .await;
    eprintln!();
    engine.shutdown().await;
    let review = result?;

    print!("{}", report::summary(&review));
    println!();
    print!("{}", report::move_list(&review));

    let output = output.unwrap_or_else(|| pgn.with_extension("review.json"));
    std::fs::write(&output, review.to_json()?)
        .with_context(|| format!("writing {}", output.display()))?;
    eprintln!("Review written to {}", output.display());
    Ok(())
}

async fn eval(config: &ReviewConfig, fen: &str, depth: u32) -> anyhow::Result<()> {
    let board = Board::from_fen(fen)?;
    if board.is_game_over() {
        let result = if board.is_checkmate() {
            format!("{} is checkmated", board.side_to_move())
        } else {
            "stalemate".to_string()
        };
        println!("{result}, nothing to search");
        return Ok(());
    }
    let engine = start_engine(&config.engine).await?;
    let result = engine
        .stream(fen, depth, |s| {
            println!(
                "depth {:>2}  {:>6}  {}",
                s.depth,
                format_score(s.score),
                s.pv.iter().take(5).cloned().collect::<Vec<_>>().join(" ")
            )
        })
        .await;
    engine.shutdown().await;
    let sample = result?;
    match sample.best_move.as_deref() {
        Some(uci) => match board.san_of(uci) {
            Ok(san) => println!("best move: {san} ({uci})"),
            Err(_) => println!("best move: {uci}"),
        },
        None => println!("best move: (none)"),
    }
    Ok(())
}

fn review(file: &Path, index: Option<isize>) -> anyhow::Result<()> {
    let json =
        std::fs::read_to_string(file).with_context(|| format!("reading {}", file.display()))?;
    let review = GameReview::from_json(&json)?;
    let mut nav = ReviewNavigator::new(&review)?;

    match index {
        Some(k) => {
            let frame = nav.jump_to(k)?;
            print!("{}", report::frame(&frame));
        }
        None => {
            print!("{}", report::summary(&review));
            println!();
            print!("{}", report::move_list(&review));
        }
    }
    Ok(())
}

async fn puzzle(config: &ReviewConfig, id: Option<String>) -> anyhow::Result<()> {
    let catalog: PuzzleCatalog = config.puzzles.catalog()?;
    let first = match &id {
        Some(id) => catalog.get(id).with_context(|| format!("no puzzle {id}"))?,
        None => match catalog.all().first() {
            Some(p) => p,
            None => bail!("puzzle catalog is empty"),
        },
    };

    let (mut runner, mut events) = PuzzleRunner::new(first.clone(), config.puzzles.reply_delay())?;
    show_puzzle(&runner).await;
    println!("Commands: <move> | hint | retry | next | quit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            Some(event) = events.recv() => match event {
                PuzzleEvent::ReplyPlayed { played, .. } => {
                    println!("Opponent plays {}", played.san);
                    println!("{}", report::puzzle_state(&runner.state().await));
                }
                PuzzleEvent::ReplySkipped { mv, .. } => {
                    println!("Opponent reply {mv} is not playable here; your move");
                }
            },
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let input = line.trim();
                match input {
                    "" => {}
                    "quit" | "exit" => break,
                    "hint" => match runner.hint().await {
                        Ok(square) => println!("Move the piece on {square}"),
                        Err(e) => println!("{e}"),
                    },
                    "retry" => match runner.retry().await {
                        Ok(()) => println!("{}", report::puzzle_state(&runner.state().await)),
                        Err(e) => println!("{e}"),
                    },
                    "next" => {
                        let current = runner.puzzle().await.id;
                        if let Some(next) = catalog.next_after(&current) {
                            runner.load(next.clone()).await?;
                            show_puzzle(&runner).await;
                        }
                    }
                    mv => match runner.submit_move(mv).await {
                        MoveOutcome::Rejected(e) => println!("Not playable: {e}"),
                        MoveOutcome::Ignored => println!("Not your move right now"),
                        MoveOutcome::Correct { played, .. } => println!("{} - correct!", played.san),
                        MoveOutcome::Solved { played } => {
                            println!("{} - solved! Type 'next' for another puzzle.", played.san)
                        }
                        MoveOutcome::Failed { played } => {
                            println!("{} is not the solution. Type 'retry' to try again.", played.san)
                        }
                    },
                }
            }
        }
    }

    if runner.state().await.status == PuzzleStatus::Solving {
        eprintln!("Puzzle left unsolved");
    }
    Ok(())
}

async fn show_puzzle(runner: &PuzzleRunner) {
    let puzzle = runner.puzzle().await;
    println!();
    println!("{}", report::puzzle_line(&puzzle));
    if !puzzle.description.is_empty() {
        println!("{}", puzzle.description);
    }
    println!("{} to move", puzzle.player_color());
    println!("{}", report::puzzle_state(&runner.state().await));
}
