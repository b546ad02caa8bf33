// Copyright (C) 2024 Ethan Uppal. All rights reserved.

//! A stderr logger for the `log` facade, coloured by level.

use std::io::Write;

use log::{Level, LevelFilter, Log, Metadata, Record};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

pub const LEVEL_VARIABLE: &str = "IRVM_LOG";

struct StderrLogger;

static LOGGER: StderrLogger = StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let mut stderr = StandardStream::stderr(ColorChoice::Auto);
        let mut spec = ColorSpec::new();
        match record.level() {
            Level::Error => {
                spec.set_fg(Some(Color::Red)).set_bold(true);
            }
            Level::Warn => {
                spec.set_fg(Some(Color::Yellow)).set_bold(true);
            }
            Level::Info => {
                spec.set_fg(Some(Color::Green));
            }
            Level::Debug | Level::Trace => {
                spec.set_dimmed(true);
            }
        }
        // logging must never fail the run
        let _ = stderr.set_color(&spec);
        let _ = write!(stderr, "{:5}", record.level());
        let _ = stderr.reset();
        let _ = writeln!(stderr, " {}: {}", record.target(), record.args());
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

/// Reads a level filter, `warn` when absent or unrecognized.
pub fn level_from(value: Option<&str>) -> LevelFilter {
    value
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(LevelFilter::Warn)
}

/// Installs the logger at the level named by [`LEVEL_VARIABLE`].
pub fn init() {
    let level = level_from(std::env::var(LEVEL_VARIABLE).ok().as_deref());
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level);
    }
}
