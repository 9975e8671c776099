//! Logging setup and helpers for keeping player-supplied strings on one log line.

use std::fmt::Write as _;

use crate::config::Config;

/// Longest identity or clan name echoed into a log line before truncation.
const MAX_PREVIEW: usize = 80;

/// Escape a player-supplied string (identity, clan name) for single-line logging.
///
/// Backslashes and control characters are escaped (`\n`, `\r`, `\t`, otherwise `\xNN`)
/// and anything past [`MAX_PREVIEW`] characters is replaced by an ellipsis.
pub fn escape_log(s: &str) -> String {
    let mut out = String::with_capacity(s.len().min(MAX_PREVIEW) + 4);
    for (count, ch) in s.chars().enumerate() {
        if count == MAX_PREVIEW {
            out.push('…');
            break;
        }
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                let _ = write!(out, "\\x{:02X}", c as u32);
            }
            c => out.push(c),
        }
    }
    out
}

fn level_from_name(name: &str) -> log::LevelFilter {
    match name.to_ascii_lowercase().as_str() {
        "off" => log::LevelFilter::Off,
        "error" => log::LevelFilter::Error,
        "warn" | "warning" => log::LevelFilter::Warn,
        "debug" => log::LevelFilter::Debug,
        "trace" => log::LevelFilter::Trace,
        _ => log::LevelFilter::Info,
    }
}

/// Initialise `env_logger`.
///
/// The base level comes from `[logging].level`; each `-v` on the command line raises it
/// (one step to debug, two to trace). When `[logging].file` is set, lines are appended
/// there and mirrored to the console only if stdout is a TTY.
pub fn init_logging(config: Option<&Config>, verbosity: u8) {
    use std::io::Write;

    let configured = config
        .map(|cfg| level_from_name(&cfg.logging.level))
        .unwrap_or(log::LevelFilter::Info);
    let level = match verbosity {
        0 => configured,
        1 => configured.max(log::LevelFilter::Debug),
        _ => log::LevelFilter::Trace,
    };

    let mut builder = env_logger::Builder::new();
    builder.filter_level(level);

    let log_file = config
        .and_then(|cfg| cfg.logging.file.as_ref())
        .and_then(|path| {
            std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .ok()
        });

    match log_file {
        Some(file) => {
            let file = std::sync::Mutex::new(file);
            let is_tty = atty::is(atty::Stream::Stdout);
            builder.format(move |fmt, record| {
                let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
                let line = format!("{} [{}] {}", ts, record.level(), record.args());
                if let Ok(mut guard) = file.lock() {
                    let _ = writeln!(guard, "{}", line);
                }
                if is_tty {
                    writeln!(fmt, "{}", line)
                } else {
                    Ok(())
                }
            });
        }
        None => {
            builder.format(|fmt, record| {
                let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
                writeln!(fmt, "{} [{}] {}", ts, record.level(), record.args())
            });
        }
    }
    let _ = builder.try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_control_characters() {
        assert_eq!(escape_log("Raptors\nadmin"), "Raptors\\nadmin");
        assert_eq!(escape_log("a\\b\t\u{7}"), "a\\\\b\\t\\x07");
    }

    #[test]
    fn truncates_long_names() {
        let long = "x".repeat(MAX_PREVIEW + 20);
        let esc = escape_log(&long);
        assert_eq!(esc.chars().count(), MAX_PREVIEW + 1);
        assert!(esc.ends_with('…'));
    }

    #[test]
    fn level_names() {
        assert_eq!(level_from_name("WARN"), log::LevelFilter::Warn);
        assert_eq!(level_from_name("bogus"), log::LevelFilter::Info);
    }
}
