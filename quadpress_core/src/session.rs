//! Compression session controller
//!
//! Owns one compression run end to end: configuration through validated
//! setters, then `run()` drives load, precompute, optional threshold
//! search, tree build, flatten, save and optional GIF export. Invalid
//! configuration is rejected at the setter boundary, never clamped.

use crate::app_error::AppError;
use crate::metrics::{ErrorMetric, MetricKind};
use crate::quadtree::Quadtree;
use crate::raster::{Raster, RasterFormat};
use crate::tuner::find_target_threshold;
use crate::types::Threshold;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Where a running session currently is. Reported through the stage sink
/// so a frontend can narrate progress without polling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Loading,
    Precompute,
    FindingTarget,
    BuildingTree,
    TransformingImage,
    SavingImage,
    CreatingGif,
    Finished,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Stage::Loading => "Loading image",
            Stage::Precompute => "Computing prefix tables",
            Stage::FindingTarget => "Searching for target threshold",
            Stage::BuildingTree => "Building quadtree",
            Stage::TransformingImage => "Flattening image",
            Stage::SavingImage => "Saving image",
            Stage::CreatingGif => "Writing animation",
            Stage::Finished => "Finished",
        };
        write!(f, "{}", label)
    }
}

/// Everything a finished run reports, serializable for machine output.
#[derive(Debug, Clone, Serialize)]
pub struct CompressionReport {
    pub original_size: u64,
    pub compressed_size: u64,
    /// `(1 - compressed/original) * 100`; negative when the output grew.
    pub compression_percentage: f64,
    pub threshold: f64,
    pub metric: String,
    pub tuner_iterations: Option<u32>,
    pub quadtree_depth: u32,
    pub quadtree_node_count: usize,
    pub output_path: PathBuf,
    pub gif_output_path: Option<PathBuf>,
    pub elapsed_secs: f64,
}

/// One configured compression run.
#[derive(Default)]
pub struct CompressionSession {
    input_path: Option<PathBuf>,
    input_format: Option<RasterFormat>,
    metric: Option<MetricKind>,
    threshold: Option<f64>,
    target_compression: Option<f64>,
    min_block_size: Option<u32>,
    output_path: Option<PathBuf>,
    gif_output_path: Option<PathBuf>,
}

impl CompressionSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Input must exist and carry an accepted raster extension. The parsed
    /// format is remembered; the output extension is checked against it.
    pub fn set_input_path(&mut self, path: &Path) -> Result<(), AppError> {
        if !path.exists() {
            return Err(AppError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let format = RasterFormat::from_path(path).ok_or_else(|| AppError::UnsupportedExtension {
            path: path.to_path_buf(),
        })?;
        self.input_path = Some(path.to_path_buf());
        self.input_format = Some(format);
        Ok(())
    }

    pub fn set_metric(&mut self, metric: MetricKind) {
        self.metric = Some(metric);
    }

    /// Requires a metric first: the valid range is the metric's. Setting a
    /// threshold clears any target-compression request.
    pub fn set_threshold(&mut self, value: f64) -> Result<(), AppError> {
        let kind = self.metric.ok_or(AppError::MissingConfiguration {
            what: "error metric (set it before the threshold)",
        })?;
        let metric = kind.create();
        let validated = Threshold::new(value, metric.lower_bound(), metric.upper_bound())?;
        self.threshold = Some(validated.value());
        self.target_compression = None;
        Ok(())
    }

    /// Fraction of the original size to shave off, in [0, 1]. Clears any
    /// explicit threshold; the tuner derives one during `run`.
    pub fn set_target_compression(&mut self, fraction: f64) -> Result<(), AppError> {
        if !fraction.is_finite() || !(0.0..=1.0).contains(&fraction) {
            return Err(AppError::InvalidTargetCompression { value: fraction });
        }
        self.target_compression = Some(fraction);
        self.threshold = None;
        Ok(())
    }

    /// Minimum leaf area in pixels; zero is rejected.
    pub fn set_min_block_size(&mut self, area: u32) -> Result<(), AppError> {
        if area == 0 {
            return Err(AppError::InvalidMinBlockSize { value: area });
        }
        self.min_block_size = Some(area);
        Ok(())
    }

    /// Output must stay in the input's format family; requires the input
    /// path to be set first.
    pub fn set_output_path(&mut self, path: &Path) -> Result<(), AppError> {
        let input_format = self.input_format.ok_or(AppError::MissingConfiguration {
            what: "input path (set it before the output path)",
        })?;
        match RasterFormat::from_path(path) {
            Some(format) if format == input_format => {
                self.output_path = Some(path.to_path_buf());
                Ok(())
            }
            other => Err(AppError::OutputExtensionMismatch {
                expected: input_format.extension().to_string(),
                actual: other
                    .map(|f| f.extension().to_string())
                    .unwrap_or_else(|| {
                        path.extension()
                            .and_then(|e| e.to_str())
                            .unwrap_or("")
                            .to_string()
                    }),
            }),
        }
    }

    /// Optional refinement animation; the path must end in `.gif`.
    /// `None` clears a previously set path.
    pub fn set_gif_output_path(&mut self, path: Option<&Path>) -> Result<(), AppError> {
        match path {
            None => {
                self.gif_output_path = None;
                Ok(())
            }
            Some(p) => {
                let is_gif = p
                    .extension()
                    .and_then(|e| e.to_str())
                    .map(|e| e.eq_ignore_ascii_case("gif"))
                    .unwrap_or(false);
                if !is_gif {
                    return Err(AppError::UnsupportedExtension {
                        path: p.to_path_buf(),
                    });
                }
                self.gif_output_path = Some(p.to_path_buf());
                Ok(())
            }
        }
    }

    /// Execute the configured run. `stage_sink` is called once as each
    /// stage begins, and once with `Stage::Finished` at the end.
    pub fn run(&self, mut stage_sink: impl FnMut(Stage)) -> Result<CompressionReport, AppError> {
        let started = Instant::now();

        let input_path = self.input_path.as_ref().ok_or(AppError::MissingConfiguration {
            what: "input path",
        })?;
        let format = self.input_format.ok_or(AppError::MissingConfiguration {
            what: "input format",
        })?;
        let output_path = self.output_path.as_ref().ok_or(AppError::MissingConfiguration {
            what: "output path",
        })?;
        let kind = self.metric.ok_or(AppError::MissingConfiguration {
            what: "error metric",
        })?;
        let min_block_size = self.min_block_size.ok_or(AppError::MissingConfiguration {
            what: "minimum block size",
        })?;
        if self.threshold.is_none() && self.target_compression.is_none() {
            return Err(AppError::MissingConfiguration {
                what: "threshold or target compression",
            });
        }

        let metric = kind.create();

        stage_sink(Stage::Loading);
        let mut raster = Raster::load(input_path)?;
        let original_size = raster.file_size();

        stage_sink(Stage::Precompute);
        raster.compute_summed_area_table();
        if metric.needs_square_table() {
            raster.compute_summed_square_table();
        }

        let (threshold, tuner_iterations) = match (self.threshold, self.target_compression) {
            (Some(t), _) => (t, None),
            (None, Some(fraction)) => {
                stage_sink(Stage::FindingTarget);
                let target_size = ((1.0 - fraction) * original_size as f64) as u64;
                let outcome = find_target_threshold(
                    &raster,
                    metric.as_ref(),
                    min_block_size,
                    target_size,
                    format,
                )?;
                tracing::info!(
                    threshold = outcome.threshold,
                    iterations = outcome.iterations,
                    achieved_size = outcome.achieved_size,
                    target_size,
                    "Threshold search complete"
                );
                (outcome.threshold, Some(outcome.iterations))
            }
            (None, None) => unreachable!("checked above"),
        };

        stage_sink(Stage::BuildingTree);
        let tree = Quadtree::build(&raster, metric.as_ref(), threshold, min_block_size);

        stage_sink(Stage::TransformingImage);
        let flattened = tree.apply(&raster);

        stage_sink(Stage::SavingImage);
        let compressed_size = flattened.save(output_path)?;

        if let Some(gif_path) = &self.gif_output_path {
            stage_sink(Stage::CreatingGif);
            tree.apply_animation(&raster).save(gif_path)?;
        }

        stage_sink(Stage::Finished);
        let compression_percentage = if original_size == 0 {
            0.0
        } else {
            (1.0 - compressed_size as f64 / original_size as f64) * 100.0
        };

        Ok(CompressionReport {
            original_size,
            compressed_size,
            compression_percentage,
            threshold,
            metric: kind.identifier().to_string(),
            tuner_iterations,
            quadtree_depth: tree.depth(),
            quadtree_node_count: tree.node_count(),
            output_path: output_path.clone(),
            gif_output_path: self.gif_output_path.clone(),
            elapsed_secs: started.elapsed().as_secs_f64(),
        })
    }
}
