//! Sinks receiving scalar metrics and rendered images during a run.

use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};

use image::RgbImage;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

/// Errors raised while writing metrics.
#[derive(Debug, Error)]
pub enum MetricsError {
    /// The metrics file could not be written.
    #[error("failed to write metrics")]
    Io(#[from] io::Error),
    /// A metric could not be encoded.
    #[error("failed to encode metric")]
    Json(#[from] serde_json::Error),
    /// An image could not be encoded.
    #[error("failed to write image")]
    Image(#[from] image::ImageError),
}

/// Destination for training metrics.
pub trait MetricsSink {
    /// Records a scalar value at the provided step.
    fn emit(&mut self, key: &str, value: f64, step: u64) -> Result<(), MetricsError>;

    /// Records a rendered image.
    fn emit_image(&mut self, name: &str, image: &RgbImage) -> Result<(), MetricsError>;
}

#[derive(Serialize)]
struct ScalarLine<'a> {
    key: &'a str,
    value: f64,
    step: u64,
}

#[derive(Serialize)]
struct ImageLine<'a> {
    image: &'a str,
    path: &'a Path,
}

/// Writes one JSON object per line and saves images as PNG files beside it.
#[derive(Debug)]
pub struct JsonlMetrics {
    dir: PathBuf,
    writer: BufWriter<File>,
}

impl JsonlMetrics {
    /// Name of the metrics file created inside the output directory.
    pub const FILE_NAME: &'static str = "metrics.jsonl";

    /// Creates `metrics.jsonl` inside `dir`, truncating any previous run.
    pub fn create(dir: impl Into<PathBuf>) -> Result<Self, MetricsError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        let file = File::create(dir.join(Self::FILE_NAME))?;
        Ok(Self {
            dir,
            writer: BufWriter::new(file),
        })
    }

    fn write_line<T: Serialize>(&mut self, line: &T) -> Result<(), MetricsError> {
        serde_json::to_writer(&mut self.writer, line)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }
}

impl MetricsSink for JsonlMetrics {
    fn emit(&mut self, key: &str, value: f64, step: u64) -> Result<(), MetricsError> {
        self.write_line(&ScalarLine { key, value, step })
    }

    fn emit_image(&mut self, name: &str, image: &RgbImage) -> Result<(), MetricsError> {
        let path = self.dir.join(format!("{name}.png"));
        image.save(&path)?;
        self.write_line(&ImageLine {
            image: name,
            path: &path,
        })
    }
}

/// Forwards metrics to `tracing` at debug level.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingMetrics;

impl MetricsSink for TracingMetrics {
    fn emit(&mut self, key: &str, value: f64, step: u64) -> Result<(), MetricsError> {
        debug!(key, value, step, "metric");
        Ok(())
    }

    fn emit_image(&mut self, name: &str, image: &RgbImage) -> Result<(), MetricsError> {
        debug!(
            name,
            width = image.width(),
            height = image.height(),
            "image metric"
        );
        Ok(())
    }
}
