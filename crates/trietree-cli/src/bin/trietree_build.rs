// trietree-build: Build a trie file from keys on stdin.
//
// Reads keys from stdin (one per line, blank lines skipped), builds a keyed
// trie whose value for each key is the key itself, freezes it and writes
// it to the trie file.
//
// Usage:
//   trietree-build -f FILE
//
// Options:
//   -f, --file PATH   Output trie file (default: $TRIETREE_FILE)
//   -h, --help        Print help

use std::io::{self, BufRead};

use tracing::info;
use trietree::KeyedTrie;

const TOOL: &str = "trietree-build";

fn main() {
    trietree_cli::init_logging();
    let inv = trietree_cli::parse_args(std::env::args().skip(1), &[])
        .unwrap_or_else(|e| trietree_cli::usage_error(TOOL, e));

    if inv.help {
        println!("trietree-build: Build a trie file from keys on stdin.");
        println!();
        println!("Usage: trietree-build -f FILE");
        println!();
        println!("Reads one key per line; blank lines are skipped.");
        println!();
        println!("Options:");
        println!("  -f, --file PATH   Output trie file (default: ${})", trietree_cli::FILE_ENV);
        println!("  -h, --help        Print this help");
        return;
    }
    if let Err(e) = inv.no_operands() {
        trietree_cli::usage_error(TOOL, e);
    }

    let path = trietree_cli::resolve_file(inv.file).unwrap_or_else(|e| trietree_cli::fatal(e));

    let mut trie = KeyedTrie::new();
    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => trietree_cli::fatal(format!("error reading stdin: {e}")),
        };
        if line.is_empty() {
            continue;
        }
        trie.insert(&line, line.clone());
    }

    let keys = trie.len();
    trietree_cli::save_trie(&path, &trie.into_frozen())
        .unwrap_or_else(|e| trietree_cli::fatal(e));
    info!(keys, path = %path.display(), "built trie");
}
