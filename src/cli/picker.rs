//! Fallback prompt for the sales CSV.
//!
//! When the configured data file does not exist and stdin is a terminal, the
//! user can pick one of the `*.csv` files found under the working directory
//! instead of re-running with `--data`.

use std::fs;
use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};

use crate::error::AppError;

/// How deep to look for CSV files below the working directory.
const SEARCH_DEPTH: usize = 4;

/// Return `path` if it is a CSV file, otherwise ask for one (interactive only).
pub fn resolve_data_path(path: &Path) -> Result<PathBuf, AppError> {
    match validate_csv_path(path) {
        Ok(p) => Ok(p),
        Err(err) if !path.exists() && io::stdin().is_terminal() => {
            println!("{}", err.message());
            prompt_for_csv_path(Path::new("."))
        }
        Err(err) => Err(err),
    }
}

/// Prompt the user to select a CSV file found under `root`.
///
/// Accepts a list number or an explicit path; `q` cancels.
pub fn prompt_for_csv_path(root: &Path) -> Result<PathBuf, AppError> {
    let files = find_csv_files(root, SEARCH_DEPTH);
    if files.is_empty() {
        return Err(AppError::new(
            2,
            "No .csv files found. Provide the sales table with `sales --data <file.csv>`.",
        ));
    }

    println!("Found {} CSV file(s):", files.len());
    for (idx, path) in files.iter().enumerate() {
        println!("{:>3}) {}", idx + 1, display_path(path));
    }

    let stdin = io::stdin();
    loop {
        print!("Sales data file (1-{}, a path, or q): ", files.len());
        io::stdout()
            .flush()
            .map_err(|e| AppError::new(2, format!("Failed to write prompt: {e}")))?;

        let mut input = String::new();
        let bytes = stdin
            .read_line(&mut input)
            .map_err(|e| AppError::new(2, format!("Failed to read input: {e}")))?;
        if bytes == 0 {
            return Err(AppError::new(2, "No sales data file selected."));
        }

        match parse_choice(input.trim(), &files) {
            Choice::Quit => return Err(AppError::new(2, "Canceled.")),
            Choice::File(path) => match validate_csv_path(&path) {
                Ok(path) => return Ok(path),
                Err(err) => println!("{}", err.message()),
            },
            Choice::OutOfRange(n) => {
                println!("Invalid choice: {n}. Enter a number between 1 and {}.", files.len());
            }
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Choice {
    Quit,
    File(PathBuf),
    OutOfRange(usize),
}

fn parse_choice(input: &str, files: &[PathBuf]) -> Choice {
    if input.eq_ignore_ascii_case("q") {
        return Choice::Quit;
    }
    match input.parse::<usize>() {
        Ok(n) if (1..=files.len()).contains(&n) => Choice::File(files[n - 1].clone()),
        Ok(n) => Choice::OutOfRange(n),
        Err(_) => Choice::File(PathBuf::from(input)),
    }
}

/// Check that `path` is an existing `.csv` file.
pub fn validate_csv_path(path: &Path) -> Result<PathBuf, AppError> {
    if !path.exists() {
        return Err(AppError::new(2, format!("Sales data file not found: {}", path.display())));
    }
    if path.is_dir() {
        return Err(AppError::new(
            2,
            format!("Expected a file, got a directory: {}", path.display()),
        ));
    }
    if !has_csv_extension(path) {
        return Err(AppError::new(2, format!("Expected a .csv file, got: {}", path.display())));
    }
    Ok(path.to_path_buf())
}

fn has_csv_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
}

/// `*.csv` files under `root`, sorted by display path.
pub fn find_csv_files(root: &Path, max_depth: usize) -> Vec<PathBuf> {
    let mut out = Vec::new();
    walk(root, 0, max_depth, &mut out);
    out.sort_by_key(|p| display_path(p));
    out
}

fn walk(dir: &Path, depth: usize, max_depth: usize, out: &mut Vec<PathBuf>) {
    if depth > max_depth {
        return;
    }
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        let Ok(file_type) = entry.file_type() else {
            continue;
        };
        if file_type.is_dir() {
            let name = path.file_name().and_then(|s| s.to_str()).unwrap_or("");
            if !matches!(name, ".git" | "target" | "output") {
                walk(&path, depth + 1, max_depth, out);
            }
        } else if file_type.is_file() && has_csv_extension(&path) {
            out.push(path);
        }
    }
}

fn display_path(path: &Path) -> String {
    path.strip_prefix("./").unwrap_or(path).display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_rejects_missing_and_non_csv_paths() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("train.csv");
        assert_eq!(validate_csv_path(&missing).unwrap_err().exit_code(), 2);
        assert!(validate_csv_path(dir.path()).is_err());

        let txt = dir.path().join("train.txt");
        std::fs::write(&txt, "x").unwrap();
        assert!(validate_csv_path(&txt).is_err());

        let csv = dir.path().join("TRAIN.CSV");
        std::fs::write(&csv, "x").unwrap();
        assert_eq!(validate_csv_path(&csv).unwrap(), csv);
    }

    #[test]
    fn finds_csv_files_and_skips_output_dirs() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("data")).unwrap();
        std::fs::create_dir_all(dir.path().join("output")).unwrap();
        std::fs::write(dir.path().join("data").join("train.csv"), "x").unwrap();
        std::fs::write(dir.path().join("output").join("a_forecast.csv"), "x").unwrap();
        std::fs::write(dir.path().join("notes.md"), "x").unwrap();

        let files = find_csv_files(dir.path(), SEARCH_DEPTH);
        assert_eq!(files, vec![dir.path().join("data").join("train.csv")]);
    }

    #[test]
    fn parses_numbers_paths_and_quit() {
        let files = vec![PathBuf::from("a.csv"), PathBuf::from("b.csv")];
        assert_eq!(parse_choice("Q", &files), Choice::Quit);
        assert_eq!(parse_choice("2", &files), Choice::File(PathBuf::from("b.csv")));
        assert_eq!(parse_choice("9", &files), Choice::OutOfRange(9));
        assert_eq!(parse_choice("data/x.csv", &files), Choice::File(PathBuf::from("data/x.csv")));
    }
}
