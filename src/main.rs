use std::borrow::Cow;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use deepgrep::{CompiledPattern, PatternError, compile, init_global_cache};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Pattern to search for
    #[arg(value_name = "PATTERN")]
    pattern: String,

    /// Files to search (standard input when absent or `-`)
    #[arg(value_name = "FILE")]
    files: Vec<String>,

    /// Print only the matched parts of each line
    #[arg(short = 'o', long)]
    only_matching: bool,

    /// Print only a count of matching lines per input
    #[arg(short = 'c', long)]
    count: bool,

    /// Prefix each output line with its line number
    #[arg(short = 'n', long)]
    line_number: bool,

    /// Prefix each output line with the file name
    #[arg(short = 'H', long)]
    with_filename: bool,

    /// Number of compiled patterns to keep cached
    #[arg(long, value_name = "N", default_value_t = deepgrep::DEFAULT_CACHE_CAPACITY)]
    cache_capacity: usize,

    /// Print the compiled form of the pattern and exit
    #[arg(long)]
    explain: bool,

    /// Enable debug logging
    #[arg(short = 'v', long)]
    verbose: bool,
}

/// Outcome of a search, mapped onto grep's exit statuses.
enum Outcome {
    Matched,
    NoMatch,
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    match run(&args) {
        Ok(Outcome::Matched) => ExitCode::SUCCESS,
        Ok(Outcome::NoMatch) => ExitCode::from(1),
        Err(err) => {
            if let Some(pattern_err) = err.downcast_ref::<PatternError>() {
                eprintln!("deepgrep: invalid pattern {:?}: {}", args.pattern, pattern_err);
            } else {
                eprintln!("deepgrep: {:#}", err);
            }
            ExitCode::from(2)
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(args: &Args) -> Result<Outcome> {
    if !init_global_cache(args.cache_capacity) {
        warn!("pattern cache was already initialized; --cache-capacity ignored");
    }
    let pattern = compile(&args.pattern)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();

    if args.explain {
        writeln!(out, "{}", pattern.matcher())?;
        writeln!(out, "groups: {}", pattern.group_count())?;
        return Ok(Outcome::Matched);
    }

    let inputs: Vec<&str> = if args.files.is_empty() {
        vec!["-"]
    } else {
        args.files.iter().map(String::as_str).collect()
    };
    let show_names = args.with_filename || inputs.len() > 1;

    let mut any_match = false;
    for name in inputs {
        debug!(input = name, "searching");
        let reader: Box<dyn BufRead> = if name == "-" {
            Box::new(io::stdin().lock())
        } else {
            let file = File::open(name).with_context(|| format!("Failed to open {name}"))?;
            Box::new(BufReader::new(file))
        };
        let label = if name == "-" { "(standard input)" } else { name };
        let prefix = show_names.then_some(label);
        any_match |= search(&pattern, reader, prefix, args, &mut out)
            .with_context(|| format!("Failed to read {label}"))?;
    }

    Ok(if any_match {
        Outcome::Matched
    } else {
        Outcome::NoMatch
    })
}

/// Search one input line by line. Returns whether any line matched.
///
/// Lines that are not valid UTF-8 are decoded lossily rather than ending
/// the search.
fn search(
    pattern: &CompiledPattern,
    mut reader: impl BufRead,
    name: Option<&str>,
    args: &Args,
    out: &mut impl Write,
) -> Result<bool> {
    let mut matching_lines = 0usize;
    let mut buf = Vec::new();
    let mut line_number = 0usize;

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        line_number += 1;
        let line = decode_line(&buf);
        let line = line.as_ref();

        if args.only_matching {
            let found = pattern.find_all(line);
            if found.is_empty() {
                continue;
            }
            matching_lines += 1;
            if !args.count {
                for m in found {
                    write_line(out, name, args.line_number.then_some(line_number), &m)?;
                }
            }
        } else if pattern.is_match(line) {
            matching_lines += 1;
            if !args.count {
                write_line(out, name, args.line_number.then_some(line_number), line)?;
            }
        }
    }

    if args.count {
        match name {
            Some(name) => writeln!(out, "{name}:{matching_lines}")?,
            None => writeln!(out, "{matching_lines}")?,
        }
    }
    debug!(matching_lines, "input done");
    Ok(matching_lines > 0)
}

/// Strip a trailing `\n` or `\r\n` and decode, replacing invalid UTF-8.
fn decode_line(raw: &[u8]) -> Cow<'_, str> {
    let raw = raw.strip_suffix(b"\n").unwrap_or(raw);
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    String::from_utf8_lossy(raw)
}

fn write_line(
    out: &mut impl Write,
    name: Option<&str>,
    line_number: Option<usize>,
    text: &str,
) -> io::Result<()> {
    if let Some(name) = name {
        write!(out, "{name}:")?;
    }
    if let Some(n) = line_number {
        write!(out, "{n}:")?;
    }
    writeln!(out, "{text}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn run_search(argv: &[&str], input: &[u8]) -> (bool, String) {
        let args = Args::parse_from(argv);
        let pattern = CompiledPattern::new(&args.pattern).unwrap();
        let mut out = Vec::new();
        let matched = search(&pattern, Cursor::new(input), None, &args, &mut out).unwrap();
        (matched, String::from_utf8(out).unwrap())
    }

    #[test]
    fn decode_line_strips_line_endings() {
        assert_eq!(decode_line(b"plain\n"), "plain");
        assert_eq!(decode_line(b"dos\r\n"), "dos");
        assert_eq!(decode_line(b"last"), "last");
        assert_eq!(decode_line(b"caf\xe9\n"), "caf\u{fffd}");
    }

    #[test]
    fn invalid_utf8_does_not_stop_the_search() {
        let (matched, out) = run_search(&["deepgrep", "hello"], b"caf\xe9 one\nhello two\n");
        assert!(matched);
        assert_eq!(out, "hello two\n");
    }

    #[test]
    fn line_numbers_count_undecodable_lines() {
        let (_, out) = run_search(&["deepgrep", "-n", "\\d+"], b"\xff\xfe\r\nx 42\r\n");
        assert_eq!(out, "2:x 42\n");
    }

    #[test]
    fn count_and_only_matching() {
        let (_, out) = run_search(&["deepgrep", "-c", "a"], b"a\nb\naa\n");
        assert_eq!(out, "2\n");
        let (_, out) = run_search(&["deepgrep", "-o", "\\d+"], b"1 and 22\n");
        assert_eq!(out, "1\n22\n");
        let (matched, out) = run_search(&["deepgrep", "zzz"], b"a\n");
        assert!(!matched);
        assert!(out.is_empty());
    }
}
