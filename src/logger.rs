use std::io::{self, Write};

use clap::builder::styling::{AnsiColor, Style};
use concolor_clap::ColorChoice;
use env_logger::{fmt::Formatter, WriteStyle};
use log::{Level, LevelFilter, Record};

pub fn init(level: LevelFilter, color: ColorChoice) {
    env_logger::Builder::new()
        .format(format)
        .filter_level(level)
        .write_style(write_style(color))
        .init();
}

/// `-v` and `-q` cancel each other out; the default is `Info`.
pub fn level_from_counts(verbose: u8, quiet: u8) -> LevelFilter {
    match i16::from(verbose) - i16::from(quiet) {
        i16::MIN..=-3 => LevelFilter::Off,
        -2 => LevelFilter::Error,
        -1 => LevelFilter::Warn,
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

fn write_style(color: ColorChoice) -> WriteStyle {
    match color {
        ColorChoice::Auto => WriteStyle::Auto,
        ColorChoice::Always => WriteStyle::Always,
        ColorChoice::Never => WriteStyle::Never,
    }
}

fn format(f: &mut Formatter, record: &Record) -> io::Result<()> {
    let args = record.args();
    let level = record.level();
    match level_prefix(level) {
        Some(prefix) => {
            let style = f.default_level_style(level);
            writeln!(f, "{style}{prefix}{style:#}{args}")
        }
        None if level == Level::Trace => {
            let style = Style::new().fg_color(Some(AnsiColor::BrightBlack.into()));
            writeln!(f, "{style}{args}{style:#}")
        }
        None => writeln!(f, "{args}"),
    }
}

fn level_prefix(level: Level) -> Option<&'static str> {
    match level {
        Level::Debug | Level::Trace | Level::Info => None,
        Level::Warn => Some("warning: "),
        Level::Error => Some("error: "),
    }
}
