// trietree-scan: Report every stored key occurring in lines from stdin.
//
// For each input line, prints one line per match:
//   INDEX<TAB>KEY
// where INDEX is the byte offset of the key's last character in the line.
// Matches at the same position are printed longest first.
//
// Usage:
//   trietree-scan -f FILE [OPTIONS]
//
// Options:
//   -f, --file PATH         Trie file (default: $TRIETREE_FILE)
//   -l, --longest-prefix    Print only the longest stored prefix of each line
//   -h, --help              Print help

use std::io::{self, BufRead, Write};

use trietree::{Automaton, ScanEvent};
use trietree_cli::Switch;

const TOOL: &str = "trietree-scan";

const LONGEST_PREFIX: Switch = Switch {
    short: "-l",
    long: "--longest-prefix",
};

fn main() {
    trietree_cli::init_logging();
    let inv = trietree_cli::parse_args(std::env::args().skip(1), &[LONGEST_PREFIX])
        .unwrap_or_else(|e| trietree_cli::usage_error(TOOL, e));

    if inv.help {
        println!("trietree-scan: Report stored keys occurring in lines from stdin.");
        println!();
        println!("Usage: trietree-scan -f FILE [OPTIONS]");
        println!();
        println!("Prints INDEX<TAB>KEY per match, INDEX being the byte offset of the");
        println!("key's last character.");
        println!();
        println!("Options:");
        println!("  -f, --file PATH         Trie file (default: ${})", trietree_cli::FILE_ENV);
        println!("  -l, --longest-prefix    Print only the longest stored prefix of each line");
        println!("  -h, --help              Print this help");
        return;
    }

    if let Err(e) = inv.no_operands() {
        trietree_cli::usage_error(TOOL, e);
    }
    let longest_prefix = inv.has(LONGEST_PREFIX);

    let path = trietree_cli::resolve_file(inv.file).unwrap_or_else(|e| trietree_cli::fatal(e));
    let trie = trietree_cli::load_trie(&path).unwrap_or_else(|e| trietree_cli::fatal(e));
    let automaton = trie.automaton();
    let values = trie.values();

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = io::BufWriter::new(stdout.lock());

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                eprintln!("error reading stdin: {e}");
                break;
            }
        };

        if longest_prefix {
            if let Some((prefix, _)) = trie.longest_prefix(&line) {
                let _ = writeln!(out, "{prefix}");
            }
            continue;
        }

        let result = automaton.scan(&line, |ev: &ScanEvent<'_>| {
            for m in ev.matches {
                if let Some(key) = values.get(m.edge_id - 1) {
                    let _ = writeln!(out, "{}\t{key}", ev.index);
                }
            }
        });
        if let Err(e) = result {
            trietree_cli::fatal(e);
        }
    }
}
