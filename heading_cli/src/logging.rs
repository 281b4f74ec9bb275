//! Tracing setup: console layer plus optional rolling JSON file sink.

use std::path::Path;

use heading_config::Logging;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

use crate::cli::FILE_GUARD;

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

fn filter(level: &str) -> EnvFilter {
    EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Console logs go to stderr; `RUST_LOG` wins over `--log-level`.
pub fn init_tracing(json: bool, level: &str, logging: &Logging) {
    let console_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| filter(level));
    let console: BoxedLayer = if json {
        fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_filter(console_filter)
            .boxed()
    } else {
        fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr)
            .with_filter(console_filter)
            .boxed()
    };

    let mut layers = vec![console];
    if let Some(file) = logging.file.as_deref() {
        let file_level = logging.level.as_deref().unwrap_or(level);
        match file_layer(file, logging.rotation.as_deref(), file_level) {
            Ok(layer) => layers.push(layer),
            Err(e) => eprintln!("warning: file logging disabled ({file}): {e}"),
        }
    }

    // A second init (tests) is harmless.
    let _ = tracing_subscriber::registry().with(layers).try_init();
}

fn file_layer(file: &str, rotation: Option<&str>, level: &str) -> eyre::Result<BoxedLayer> {
    let path = Path::new(file);
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| eyre::eyre!("logging.file has no file name"))?;
    let rotation = match rotation {
        Some("daily") => Rotation::DAILY,
        Some("hourly") => Rotation::HOURLY,
        _ => Rotation::NEVER,
    };
    let appender = RollingFileAppender::builder()
        .rotation(rotation)
        .filename_prefix(name)
        .build(dir)
        .map_err(|e| eyre::eyre!("{e}"))?;
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let _ = FILE_GUARD.set(guard);
    Ok(fmt::layer()
        .json()
        .with_ansi(false)
        .with_writer(writer)
        .with_filter(filter(level))
        .boxed())
}
