use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use glassbot::board::Position;
use glassbot::eval::DEFAULT_EVAL_SOURCE;
use glassbot::search::driver::{analyze, validate_eval};

#[derive(Parser, Debug)]
#[command(author, version, about = "Search a chess position and dump the recorded tree", long_about = None)]
struct Args {
    /// Starting FEN (defaults to the initial position)
    #[arg(long)]
    fen: Option<String>,

    /// Search depth, capped at 4
    #[arg(long, default_value_t = 3)]
    depth: u32,

    /// Path to a Rhai script defining evaluate(board)
    #[arg(long)]
    eval: Option<PathBuf>,

    /// Compile and run the script once against the position, then exit
    #[arg(long)]
    validate: bool,

    /// Print the full annotated tree as JSON instead of a summary
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut pos = match &args.fen {
        Some(fen) => Position::from_fen(fen).map_err(|e| anyhow::anyhow!(e))?,
        None => Position::startpos(),
    };

    let source = match &args.eval {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?,
        None => DEFAULT_EVAL_SOURCE.to_string(),
    };

    if args.validate {
        let report = validate_eval(&source, &pos);
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let depth = args.depth.min(4);
    if depth != args.depth {
        eprintln!("depth capped at 4 (requested {})", args.depth);
    }

    let response = analyze(&mut pos, &source, depth);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    match (&response.ai_move_san, &response.stats) {
        (Some(san), Some(stats)) => {
            println!(
                "best move: {} ({})",
                san,
                response.ai_move.as_deref().unwrap_or("?")
            );
            if let Some(err) = &response.eval_error {
                println!("script rejected, scored with the built-in material count: {err}");
            }
            if let Some(tree) = &response.tree {
                if let Some(value) = &tree.value {
                    println!("root value: {value}");
                }
            }
            println!(
                "nodes explored: {}  pruned: {}  depth: {}  time: {}ms",
                stats.nodes_explored, stats.nodes_pruned, stats.max_depth, stats.search_time_ms
            );
        }
        _ => println!("game over: {}", pos.game_status()),
    }

    Ok(())
}
