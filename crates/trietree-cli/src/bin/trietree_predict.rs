// trietree-predict: List the stored keys found inside each query line.
//
// For each input line, prints one line per prediction:
//   START<TAB>END<TAB>KEY
// with byte offsets into the line, in the order keys complete.
//
// Usage:
//   trietree-predict -f FILE [QUERY...]
//
// Options:
//   -f, --file PATH   Trie file (default: $TRIETREE_FILE)
//   -h, --help        Print help
//
// A query that starts with `-` must follow `--`.

use std::io::{self, BufRead, Write};

const TOOL: &str = "trietree-predict";

fn predict_line(trie: &trietree_cli::KeyTrie, query: &str, out: &mut impl Write) {
    for p in trie.predict(query) {
        let _ = writeln!(out, "{}\t{}\t{}", p.start, p.end, p.value);
    }
}

fn main() {
    trietree_cli::init_logging();
    let inv = trietree_cli::parse_args(std::env::args().skip(1), &[])
        .unwrap_or_else(|e| trietree_cli::usage_error(TOOL, e));

    if inv.help {
        println!("trietree-predict: List stored keys found inside queries.");
        println!();
        println!("Usage: trietree-predict -f FILE [QUERY...]");
        println!();
        println!("If QUERY arguments are given, predicts over each of them.");
        println!("Otherwise reads queries from stdin (one per line).");
        println!("Put queries starting with '-' after '--'.");
        println!("Prints START<TAB>END<TAB>KEY per prediction.");
        println!();
        println!("Options:");
        println!("  -f, --file PATH   Trie file (default: ${})", trietree_cli::FILE_ENV);
        println!("  -h, --help        Print this help");
        return;
    }

    let path = trietree_cli::resolve_file(inv.file).unwrap_or_else(|e| trietree_cli::fatal(e));
    let trie = trietree_cli::load_trie(&path).unwrap_or_else(|e| trietree_cli::fatal(e));

    let stdout = io::stdout();
    let mut out = io::BufWriter::new(stdout.lock());

    if !inv.operands.is_empty() {
        for query in &inv.operands {
            predict_line(&trie, query, &mut out);
        }
        return;
    }

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        match line {
            Ok(query) => predict_line(&trie, &query, &mut out),
            Err(e) => {
                eprintln!("error reading stdin: {e}");
                break;
            }
        }
    }
}
