use std::{env, fs, process};

use crossfill::{render_grid, solve, GridConfig, SolveFailure, SolveOptions};

const USAGE: &str = "Usage: crossfill <structure> <words> [--interleave]";

/// Load a word list with one word per line, skipping blank lines.
fn load_word_list(path: &str) -> Result<Vec<String>, std::io::Error> {
    Ok(fs::read_to_string(path)?
        .lines()
        .map(|line| line.trim().to_string())
        .filter(|line| !line.is_empty())
        .collect())
}

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().skip(1).collect();
    let interleave = args.iter().any(|arg| arg == "--interleave");
    let paths: Vec<&String> = args.iter().filter(|arg| !arg.starts_with("--")).collect();

    let [structure_path, words_path] = paths.as_slice() else {
        eprintln!("{}", USAGE);
        process::exit(2);
    };

    let template = fs::read_to_string(structure_path).unwrap_or_else(|err| {
        eprintln!("Failed to read {}: {}", structure_path, err);
        process::exit(1);
    });
    let word_list = load_word_list(words_path).unwrap_or_else(|err| {
        eprintln!("Failed to read {}: {}", words_path, err);
        process::exit(1);
    });

    let grid = GridConfig::from_template(&word_list, &template).unwrap_or_else(|err| {
        eprintln!("Invalid puzzle: {}", err);
        process::exit(1);
    });

    let options = SolveOptions { interleave_ac3: interleave, ..SolveOptions::default() };

    match solve(&grid, &options) {
        Ok(success) => {
            println!("{:?}", success.statistics);
            println!("{}", render_grid(&grid, &success.assignment));
        }
        Err(SolveFailure::NoSolution { statistics }) => {
            println!("{:?}", statistics);
            println!("No solution.");
            process::exit(1);
        }
        Err(SolveFailure::DeadlineExceeded { statistics }) => {
            println!("{:?}", statistics);
            println!("Timed out before finding a solution.");
            process::exit(1);
        }
    }
}
