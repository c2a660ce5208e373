//! Result presentation for the command line.

use crate::index::{ResultSet, SearchResult};
use crate::index::tokenize::find_ignore_ascii_case;
use std::fs;
use std::io::{self, Write};
use std::time::Duration;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// Verified line matches shown per file.
const MAX_SHOWN_MATCHES: usize = 10;

fn stream(color: bool) -> StandardStream {
    let choice = if color {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    };
    StandardStream::stdout(choice)
}

/// Print the ranked result list and how far the index narrowed the search.
pub fn print_result_set(
    result_set: &ResultSet,
    elapsed: Duration,
    color: bool,
) -> io::Result<()> {
    let mut stdout = stream(color);

    let percent = if result_set.total_files > 0 {
        result_set.files_considered as f64 / result_set.total_files as f64 * 100.0
    } else {
        0.0
    };
    writeln!(
        stdout,
        "Narrowed search to {} of {} files ({:.1}%) in {:.1}ms",
        result_set.files_considered,
        result_set.total_files,
        percent,
        elapsed.as_secs_f64() * 1000.0
    )?;

    if result_set.results.is_empty() {
        writeln!(stdout, "No matches.")?;
        return Ok(());
    }

    stdout.set_color(ColorSpec::new().set_fg(Some(Color::Green)))?;
    writeln!(stdout, "Found matches in:")?;
    stdout.reset()?;

    for (i, result) in result_set.results.iter().enumerate() {
        writeln!(stdout, "#{} - {}", i, result.path)?;
    }

    Ok(())
}

/// Verify one result and print its matching lines, highlighting the
/// query tokens.
pub fn print_file_matches(result: &SearchResult, color: bool) -> anyhow::Result<()> {
    let matches = result.matches.collect()?;
    let mut stdout = stream(color);

    if matches.is_empty() {
        writeln!(stdout, "{}: no literal matches", result.path)?;
        return Ok(());
    }

    stdout.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)))?;
    writeln!(stdout, "{}", result.path)?;
    stdout.reset()?;

    let content = fs::read(&result.path)?;
    let text = String::from_utf8_lossy(&content);
    let lines: Vec<&str> = text.lines().collect();

    let mut shown = 0;
    let mut last_line = 0;
    for line_match in &matches {
        // Several tokens can hit one line; print it once.
        if line_match.line_number == last_line {
            continue;
        }
        last_line = line_match.line_number;

        if shown == MAX_SHOWN_MATCHES {
            writeln!(stdout, "  ... and {} more", matches.len() - shown)?;
            break;
        }
        shown += 1;

        let Some(line) = lines.get(line_match.line_number - 1) else {
            continue;
        };
        write!(stdout, "  {:>5}: ", line_match.line_number)?;
        print_highlighted(&mut stdout, line, result.matches.tokens())?;
        writeln!(stdout)?;
    }

    Ok(())
}

/// Print `line` with every case-insensitive token occurrence highlighted.
fn print_highlighted(
    stdout: &mut StandardStream,
    line: &str,
    tokens: &[String],
) -> io::Result<()> {
    let mut pos = 0;

    while pos < line.len() {
        // Earliest occurrence of any token at or after pos.
        let mut next: Option<(usize, usize)> = None;
        for token in tokens {
            if let Some(start) = find_ignore_ascii_case(line, token, pos) {
                let candidate = (start, start + token.len());
                if next.map(|(s, _)| candidate.0 < s).unwrap_or(true) {
                    next = Some(candidate);
                }
            }
        }

        // Byte-offset segments; lossy printing avoids slicing panics on
        // lines mixing multi-byte text with ASCII matches.
        let bytes = line.as_bytes();
        let Some((start, end)) = next else {
            write!(stdout, "{}", String::from_utf8_lossy(&bytes[pos..]))?;
            break;
        };

        write!(stdout, "{}", String::from_utf8_lossy(&bytes[pos..start]))?;
        stdout.set_color(
            ColorSpec::new()
                .set_bg(Some(Color::Yellow))
                .set_fg(Some(Color::Black)),
        )?;
        write!(stdout, "{}", String::from_utf8_lossy(&bytes[start..end]))?;
        stdout.reset()?;
        pos = end;
    }

    Ok(())
}
