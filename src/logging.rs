//! Log setup: timestamped lines on stderr, copied to a log file.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

use chrono::{DateTime, Local};
use log::LevelFilter;

/// Writes everything to stderr and, when open, to the log file.
struct Tee {
    file: Option<File>,
}

impl Write for Tee {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::stderr().write_all(buf)?;
        if let Some(file) = &mut self.file {
            // A full disk must not stop the scanner.
            let _ = file.write_all(buf);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()?;
        if let Some(file) = &mut self.file {
            let _ = file.flush();
        }
        Ok(())
    }
}

/// `[HH:MM:SS.mmm] LEVEL message`
pub fn format_line(time: DateTime<Local>, level: log::Level, message: &str) -> String {
    format!("[{}] {:<5} {}", time.format("%H:%M:%S%.3f"), level, message)
}

/// Installs the global logger.
///
/// Info and above by default, this crate at debug when `verbose`. `RUST_LOG`
/// overrides both.
pub fn init(log_file: &Path, verbose: bool) {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)
        .ok();

    let mut builder = env_logger::Builder::new();
    builder.filter_level(LevelFilter::Info);
    if verbose {
        builder.filter_module(env!("CARGO_CRATE_NAME"), LevelFilter::Debug);
    }
    builder
        .parse_default_env()
        .format(|buf, record| {
            writeln!(
                buf,
                "{}",
                format_line(Local::now(), record.level(), &record.args().to_string())
            )
        })
        .target(env_logger::Target::Pipe(Box::new(Tee { file })));

    if builder.try_init().is_err() {
        eprintln!("Logger already initialized");
    }
}
