//! Run every (preset, scoring mode) combination and score each with RMSE.

use crate::config::PredictorConfig;
use crate::evaluation::{RmseReport, evaluate_files};
use crate::orchestrator::{RunSummary, StreamOrchestrator};
use crate::scoring::ScoringMode;
use anyhow::{Context, Result};
use data_loader::EvaluationTargets;
use features::{FeaturePreset, FeatureStore};
use std::path::{Path, PathBuf};
use tracing::info;

/// Inputs shared by every run of a sweep
pub struct SweepInputs<'a> {
    /// Store holding at least every group of the largest preset
    pub store: &'a FeatureStore,
    pub targets: &'a EvaluationTargets,
    pub ratings: &'a Path,
    pub truth: &'a Path,
    /// Directory receiving one `<PRESET>_<MODE>_Evaluate.csv` per run
    pub output_dir: &'a Path,
}

/// Result of one configuration
#[derive(Debug, Clone)]
pub struct SweepEntry {
    pub preset: FeaturePreset,
    pub mode: ScoringMode,
    pub output: PathBuf,
    pub summary: RunSummary,
    pub report: RmseReport,
}

/// Run every preset × mode pair. Learning rate, epochs, max rate and the
/// update rule come from `base`.
pub fn run_sweep(
    inputs: &SweepInputs<'_>,
    presets: &[FeaturePreset],
    modes: &[ScoringMode],
    base: &PredictorConfig,
) -> Result<Vec<SweepEntry>> {
    base.validate()?;
    let mut entries = Vec::with_capacity(presets.len() * modes.len());

    for &preset in presets {
        // Selection and normalization are shared by every mode of a preset
        let mut store = inputs
            .store
            .select_preset(preset)
            .with_context(|| format!("Failed to select {} features", preset))?;
        store.normalize_rows();

        for &mode in modes {
            let config = PredictorConfig {
                preset,
                mode,
                ..*base
            };
            let output = inputs.output_dir.join(config.evaluation_file_name());
            let summary = StreamOrchestrator::new(&store, inputs.targets, &config)
                .run_files(inputs.ratings, &output)?;
            let report = evaluate_files(&output, inputs.truth)?;
            info!("{} {}: RMSE {:.4}", preset, mode, report.rmse);

            entries.push(SweepEntry {
                preset,
                mode,
                output,
                summary,
                report,
            });
        }
    }
    Ok(entries)
}
