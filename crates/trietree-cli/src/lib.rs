// trietree-cli: shared utilities for CLI tools.

use std::fmt;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process;

use tracing::debug;
use tracing_subscriber::EnvFilter;
use trietree::FrozenKeyedTrie;

/// Environment variable naming the trie file when `-f` is not given.
pub const FILE_ENV: &str = "TRIETREE_FILE";

/// Environment variable holding the log filter (default `warn`).
pub const LOG_ENV: &str = "TRIETREE_LOG";

/// Trie file as written by `trietree-build`: every value is its own key.
pub type KeyTrie = FrozenKeyedTrie<String>;

/// Install a stderr subscriber filtered by `TRIETREE_LOG`.
pub fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// A boolean option a tool accepts besides `-f` and `-h`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Switch {
    pub short: &'static str,
    pub long: &'static str,
}

/// A parsed command line.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Invocation {
    /// Value of `-f PATH`, `--file PATH` or `--file=PATH`; the last one wins.
    pub file: Option<String>,
    pub help: bool,
    /// Long names of the switches that were given.
    pub switches: Vec<&'static str>,
    /// Arguments that are not options. Everything after `--` lands here.
    pub operands: Vec<String>,
}

impl Invocation {
    pub fn has(&self, switch: Switch) -> bool {
        self.switches.contains(&switch.long)
    }

    /// Fail unless no operands were given.
    pub fn no_operands(&self) -> Result<(), String> {
        match self.operands.first() {
            Some(arg) => Err(format!("unexpected argument: {arg}")),
            None => Ok(()),
        }
    }
}

/// Parse `args` (program name excluded) against the tool's `switches`.
///
/// Any other argument starting with `-` is rejected, so a mistyped option
/// never turns into an operand. A lone `-` is an operand.
pub fn parse_args<I>(args: I, switches: &[Switch]) -> Result<Invocation, String>
where
    I: IntoIterator<Item = String>,
{
    let mut inv = Invocation::default();
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--" => {
                inv.operands.extend(args);
                break;
            }
            "-h" | "--help" => inv.help = true,
            "-f" | "--file" => {
                let path = args.next().ok_or_else(|| format!("{arg} requires a path"))?;
                inv.file = Some(path);
            }
            _ => {
                if let Some(path) = arg.strip_prefix("--file=") {
                    inv.file = Some(path.to_string());
                } else if let Some(sw) = switches.iter().find(|s| arg == s.short || arg == s.long)
                {
                    if !inv.has(*sw) {
                        inv.switches.push(sw.long);
                    }
                } else if arg.len() > 1 && arg.starts_with('-') {
                    return Err(format!("unknown option: {arg}"));
                } else {
                    inv.operands.push(arg);
                }
            }
        }
    }
    Ok(inv)
}

/// The trie file path: the explicit argument, else `TRIETREE_FILE`.
pub fn resolve_file(file: Option<String>) -> Result<PathBuf, String> {
    file.or_else(|| std::env::var(FILE_ENV).ok())
        .filter(|p| !p.is_empty())
        .map(PathBuf::from)
        .ok_or_else(|| format!("no trie file given (use -f PATH or set {FILE_ENV})"))
}

pub fn load_trie(path: &Path) -> Result<KeyTrie, String> {
    let file =
        File::open(path).map_err(|e| format!("failed to open {}: {e}", path.display()))?;
    let trie = KeyTrie::read(&mut BufReader::new(file))
        .map_err(|e| format!("failed to read {}: {e}", path.display()))?;
    debug!(path = %path.display(), keys = trie.values().len(), "loaded trie");
    Ok(trie)
}

pub fn save_trie(path: &Path, trie: &KeyTrie) -> Result<(), String> {
    let file =
        File::create(path).map_err(|e| format!("failed to create {}: {e}", path.display()))?;
    let mut out = BufWriter::new(file);
    trie.write(&mut out)
        .map_err(|e| format!("failed to write {}: {e}", path.display()))?;
    out.flush()
        .map_err(|e| format!("failed to write {}: {e}", path.display()))?;
    debug!(path = %path.display(), keys = trie.values().len(), "saved trie");
    Ok(())
}

/// Print an error message and exit with code 1.
pub fn fatal(msg: impl fmt::Display) -> ! {
    eprintln!("error: {msg}");
    process::exit(1);
}

/// Like [`fatal`], but points at `tool --help` and exits with code 2.
pub fn usage_error(tool: &str, msg: impl fmt::Display) -> ! {
    eprintln!("error: {msg}");
    eprintln!("try '{tool} --help' for usage");
    process::exit(2);
}
