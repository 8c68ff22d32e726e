use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use data_loader::{load_evaluation_targets, load_metadata};
use features::{ArtifactPaths, FeatureMatrixBuilder, FeaturePreset, FeatureStore, persist};
use predictor::{
    PredictorConfig, RunSummary, ScoringMode, StreamOrchestrator, SweepInputs, UpdateRule,
    evaluate_files, run_sweep, write_distance_file,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;

/// ReelPredict - Content-based movie rating predictor
#[derive(Parser)]
#[command(name = "reel-predict")]
#[command(about = "Predict movie ratings from movie metadata and past ratings", long_about = None)]
struct Cli {
    /// Directory holding the feature artifacts
    #[arg(short, long, default_value = "artifacts", global = true)]
    artifacts_dir: PathBuf,

    /// Log at debug level (RUST_LOG still takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build feature artifacts from the movie metadata file
    Build {
        /// Movie metadata CSV
        #[arg(long, default_value = "movies_metadata.csv")]
        metadata: PathBuf,

        /// Feature groups to compute; runs can select any subset of them
        #[arg(long, default_value = "ALL")]
        preset: FeaturePreset,
    },

    /// Predict ratings for the evaluation targets
    Predict {
        /// Ratings stream, sorted by user id
        #[arg(long, default_value = "ratings.csv")]
        ratings: PathBuf,

        /// (user, movie) pairs to predict
        #[arg(long, default_value = "evaluation_ratings.csv")]
        targets: PathBuf,

        /// Prediction output file
        #[arg(long, default_value = "predicted_ratings.csv")]
        output: PathBuf,

        /// Feature preset (BASIC, INTERMEDIATE, ADVANCED, ALL)
        #[arg(long, default_value = "INTERMEDIATE")]
        preset: FeaturePreset,

        /// Scoring mode (DOTPRODUCT, COSINE, BRAYCURTIS)
        #[arg(long, default_value = "DOTPRODUCT")]
        mode: ScoringMode,

        #[command(flatten)]
        model: ModelArgs,
    },

    /// Compute the RMSE of a prediction file
    Evaluate {
        /// Prediction file (user_id,movie_id,ratings)
        #[arg(long)]
        predictions: PathBuf,

        /// Ground truth with userId, movieId and rating columns
        #[arg(long)]
        truth: PathBuf,
    },

    /// Predict and evaluate every preset × mode combination
    Sweep {
        #[arg(long, default_value = "ratings.csv")]
        ratings: PathBuf,

        #[arg(long, default_value = "evaluation_ratings.csv")]
        targets: PathBuf,

        /// Ground truth with userId, movieId and rating columns
        #[arg(long)]
        truth: PathBuf,

        /// Comma-separated presets
        #[arg(long, value_delimiter = ',', default_value = "INTERMEDIATE")]
        presets: Vec<FeaturePreset>,

        /// Comma-separated scoring modes
        #[arg(long, value_delimiter = ',', default_value = "DOTPRODUCT,COSINE,BRAYCURTIS")]
        modes: Vec<ScoringMode>,

        /// Where the <PRESET>_<MODE>_Evaluate.csv files go
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,

        #[command(flatten)]
        model: ModelArgs,
    },

    /// Write pairwise cosine distances between all movies
    Distances {
        #[arg(long, default_value = "INTERMEDIATE")]
        preset: FeaturePreset,

        #[arg(long, default_value = "movie_distance.csv")]
        output: PathBuf,
    },
}

/// Training and scoring parameters
#[derive(Args)]
struct ModelArgs {
    #[arg(long, default_value = "0.5")]
    learning_rate: f64,

    #[arg(long, default_value = "5")]
    epochs: usize,

    /// Highest rating; targets are divided by it and predictions capped at it
    #[arg(long, default_value = "5.0")]
    max_rate: f64,

    /// ELEMENTWISE (default) or DOTPRODUCT, which gives different predictions
    #[arg(long, default_value = "ELEMENTWISE")]
    update_rule: UpdateRule,
}

impl ModelArgs {
    fn config(&self, preset: FeaturePreset, mode: ScoringMode) -> PredictorConfig {
        PredictorConfig {
            preset,
            mode,
            learning_rate: self.learning_rate,
            epochs: self.epochs,
            max_rate: self.max_rate,
            update_rule: self.update_rule,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();

    let paths = ArtifactPaths::in_dir(&cli.artifacts_dir);

    // Dispatch to appropriate command handler
    match cli.command {
        Commands::Build { metadata, preset } => {
            handle_build(&metadata, preset, &cli.artifacts_dir, &paths)?
        }
        Commands::Predict {
            ratings,
            targets,
            output,
            preset,
            mode,
            model,
        } => handle_predict(&paths, &ratings, &targets, &output, model.config(preset, mode))?,
        Commands::Evaluate { predictions, truth } => handle_evaluate(&predictions, &truth)?,
        Commands::Sweep {
            ratings,
            targets,
            truth,
            presets,
            modes,
            output_dir,
            model,
        } => {
            let inputs = SweepArgs {
                ratings,
                targets,
                truth,
                output_dir,
            };
            handle_sweep(&paths, &inputs, &presets, &modes, &model)?
        }
        Commands::Distances { preset, output } => handle_distances(&paths, preset, &output)?,
    }

    Ok(())
}

/// Handle the 'build' command
fn handle_build(metadata: &Path, preset: FeaturePreset, dir: &Path, paths: &ArtifactPaths) -> Result<()> {
    let start = Instant::now();
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create artifact directory {}", dir.display()))?;

    let load = load_metadata(metadata).context("Failed to load movie metadata")?;
    let built = FeatureMatrixBuilder::new(preset)
        .build(&load.records)
        .context("Failed to build the feature matrix")?;
    persist(&built, paths).context("Failed to write feature artifacts")?;

    println!("{}", "Feature artifacts:".bold().blue());
    println!("{}Movies: {}", "• ".green(), built.matrix.n_rows());
    println!("{}Columns: {}", "• ".green(), built.matrix.n_cols());
    println!(
        "{}Rows skipped: {} ({} duplicates)",
        "• ".yellow(),
        load.rows_skipped,
        load.duplicates
    );
    println!("{} Built in {:?} -> {}", "✓".green(), start.elapsed(), dir.display());
    Ok(())
}

/// Load the stored features, keep the preset's groups and normalize rows
fn load_store(paths: &ArtifactPaths, preset: FeaturePreset) -> Result<FeatureStore> {
    let mut store = FeatureStore::load(paths)
        .context("Failed to load feature artifacts (run `reel-predict build` first)")?
        .select_preset(preset)
        .with_context(|| format!("Stored features do not cover preset {}", preset))?;
    store.normalize_rows();
    Ok(store)
}

/// Handle the 'predict' command
fn handle_predict(
    paths: &ArtifactPaths,
    ratings: &Path,
    targets: &Path,
    output: &Path,
    config: PredictorConfig,
) -> Result<()> {
    config.validate()?;
    info!(
        "Predicting with preset {}, mode {}, learning rate {}, {} epochs",
        config.preset, config.mode, config.learning_rate, config.epochs
    );

    let store = load_store(paths, config.preset)?;
    let (targets, report) =
        load_evaluation_targets(targets).context("Failed to load evaluation targets")?;
    info!(
        "{} users to evaluate ({} targets, {} rows skipped)",
        targets.user_count(),
        targets.target_count(),
        report.rows_skipped
    );

    let summary = StreamOrchestrator::new(&store, &targets, &config).run_files(ratings, output)?;
    print_summary(&summary);
    println!("{} Predictions written to {}", "✓".green(), output.display());
    Ok(())
}

/// Handle the 'evaluate' command
fn handle_evaluate(predictions: &Path, truth: &Path) -> Result<()> {
    let report = evaluate_files(predictions, truth)?;
    println!("{}", "Evaluation:".bold().blue());
    println!("{}RMSE: {:.4}", "• ".green(), report.rmse);
    println!("{}Matched predictions: {}", "• ".cyan(), report.matched);
    println!("{}Without ground truth: {}", "• ".cyan(), report.unmatched);
    println!("{}Rows skipped: {}", "• ".yellow(), report.rows_skipped);
    Ok(())
}

struct SweepArgs {
    ratings: PathBuf,
    targets: PathBuf,
    truth: PathBuf,
    output_dir: PathBuf,
}

/// Handle the 'sweep' command
fn handle_sweep(
    paths: &ArtifactPaths,
    args: &SweepArgs,
    presets: &[FeaturePreset],
    modes: &[ScoringMode],
    model: &ModelArgs,
) -> Result<()> {
    let base = model.config(FeaturePreset::default(), ScoringMode::default());
    base.validate()?;

    let store = FeatureStore::load(paths)
        .context("Failed to load feature artifacts (run `reel-predict build` first)")?;
    let (targets, _) =
        load_evaluation_targets(&args.targets).context("Failed to load evaluation targets")?;
    fs::create_dir_all(&args.output_dir)?;

    let inputs = SweepInputs {
        store: &store,
        targets: &targets,
        ratings: &args.ratings,
        truth: &args.truth,
        output_dir: &args.output_dir,
    };
    let entries = run_sweep(&inputs, presets, modes, &base)?;

    println!("{}", "Result (rmse):".bold().blue());
    for entry in &entries {
        println!(
            "  {:<14} {:<11} {}  ({} predictions)",
            entry.preset.to_string(),
            entry.mode.to_string(),
            format!("{:.4}", entry.report.rmse).green(),
            entry.summary.predictions_written
        );
    }
    Ok(())
}

/// Handle the 'distances' command
fn handle_distances(paths: &ArtifactPaths, preset: FeaturePreset, output: &Path) -> Result<()> {
    let store = load_store(paths, preset)?;
    let pairs = write_distance_file(&store, output)?;
    println!(
        "{} {} distances between {} movies written to {}",
        "✓".green(),
        pairs,
        store.len(),
        output.display()
    );
    Ok(())
}

/// Print the counts of a prediction run
fn print_summary(summary: &RunSummary) {
    println!("{}", "Run summary:".bold().blue());
    println!("{}Rows processed: {}", "• ".green(), summary.rows_processed);
    println!("{}Rows skipped: {}", "• ".yellow(), summary.rows_skipped);
    println!("{}Users seen: {}", "• ".cyan(), summary.users_seen);
    println!("{}Users scored: {}", "• ".cyan(), summary.users_scored);
    println!("{}Predictions: {}", "• ".cyan(), summary.predictions_written);
    println!(
        "{}Ratings of unknown movies: {}",
        "• ".cyan(),
        summary.unknown_ratings
    );
}
