//! # Logging
//!
//! Installs the process-wide `tracing` subscriber: human readable events on
//! the console (INFO unless `RUST_LOG` says otherwise) and every DEBUG event
//! appended to the query log as `time | LEVEL | message` lines.
use std::fs::File;
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use thiserror::Error;
use tracing::Event;
use tracing::Subscriber;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::FmtContext;
use tracing_subscriber::fmt::FormatEvent;
use tracing_subscriber::fmt::FormatFields;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Layer;

#[derive(Error, Debug)]
pub enum LoggingError {
    #[error("Cannot open log file {0}: {1}")]
    LogFileError(String, std::io::Error),

    #[error("Cannot install logger: {0}")]
    InitError(String),
}

/// Query log line layout.
struct PipeFormat;

impl<S, N> FormatEvent<S, N> for PipeFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(&self, ctx: &FmtContext<'_, S, N>, mut writer: Writer<'_>, event: &Event<'_>) -> std::fmt::Result {
        let time = chrono::Local::now().format("%Y-%m-%d %H:%M:%S,%3f");
        write!(writer, "{} | {} | ", time, event.metadata().level())?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

fn file_layer<S>(file: File) -> impl Layer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fmt::layer()
        .with_ansi(false)
        .event_format(PipeFormat)
        .with_writer(Mutex::new(file))
        .with_filter(LevelFilter::DEBUG)
}

fn open_log(log_file: &Path) -> Result<File, LoggingError> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)
        .map_err(|error| LoggingError::LogFileError(log_file.display().to_string(), error))
}

/// Installs the console and query log layers.
///
/// Fails instead of panicking when a subscriber is already installed.
pub fn init(log_file: &Path) -> Result<(), LoggingError> {
    let file = open_log(log_file)?;
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_filter(env))
        .with(file_layer(file))
        .try_init()
        .map_err(|error| LoggingError::InitError(error.to_string()))
}
