use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use log::info;
use persona_predict::{ArtifactManager, FileStatus, Outcome, Predictor, RawInput};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Answer {
    #[value(name = "Yes", alias = "yes")]
    Yes,
    #[value(name = "No", alias = "no")]
    No,
}

impl Answer {
    fn as_str(&self) -> &'static str {
        match self {
            Answer::Yes => "Yes",
            Answer::No => "No",
        }
    }
}

/// Classify whether someone is an introvert or an extrovert based on behavior patterns
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Time spent alone (hours/day)
    #[arg(long, default_value_t = 3, value_parser = clap::value_parser!(u32).range(0..=10))]
    time_alone: u32,

    /// Social events attended per week
    #[arg(long, default_value_t = 3, value_parser = clap::value_parser!(u32).range(0..=10))]
    social_events: u32,

    /// Friends circle size
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u32).range(0..=20))]
    friends_size: u32,

    /// Social media posts per week
    #[arg(long, default_value_t = 5, value_parser = clap::value_parser!(u32).range(0..=10))]
    post_freq: u32,

    /// Stage fear?
    #[arg(long, value_enum, default_value_t = Answer::Yes)]
    stage_fear: Answer,

    /// Days going outside per week
    #[arg(long, default_value_t = 3, value_parser = clap::value_parser!(u32).range(0..=7))]
    going_outside: u32,

    /// Drained after socializing?
    #[arg(long, value_enum, default_value_t = Answer::Yes)]
    drained_social: Answer,

    /// Directory holding the fitted artifacts (defaults to $PERSONA_ARTIFACTS or the user cache)
    #[arg(long)]
    artifacts_dir: Option<PathBuf>,

    /// Download missing or corrupt artifacts listed in the manifest before predicting
    #[arg(long)]
    fetch: bool,

    /// Remove the listed artifacts and download them again
    #[arg(short, long)]
    fresh: bool,

    /// Only check the artifacts against the manifest and report
    #[arg(long)]
    verify: bool,
}

impl Args {
    fn raw_input(&self) -> RawInput {
        RawInput {
            time_alone: self.time_alone,
            social_events: self.social_events,
            friends_size: self.friends_size,
            post_freq: self.post_freq,
            stage_fear: self.stage_fear.as_str().to_string(),
            going_outside: self.going_outside,
            drained_social: self.drained_social.as_str().to_string(),
        }
    }
}

async fn prepare_artifacts(manager: &ArtifactManager, fresh: bool) -> anyhow::Result<()> {
    if fresh {
        info!("Fresh download requested - removing existing artifact files...");
        manager.remove_downloads()?;
    }
    manager
        .ensure_artifacts()
        .await
        .context("Failed to fetch artifacts")?;
    Ok(())
}

fn report_verification(manager: &ArtifactManager) -> anyhow::Result<ExitCode> {
    let statuses = manager.verify_artifacts()?;
    if statuses.is_empty() {
        println!("No manifest in {}; nothing to verify", manager.artifacts_dir().display());
        return Ok(ExitCode::FAILURE);
    }
    for (file, status) in &statuses {
        println!("  {:<24} {:?}", file, status);
    }
    if statuses.iter().all(|(_, s)| *s == FileStatus::Verified) {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    env_logger::init();
    let args = Args::parse();

    let artifacts_dir = args
        .artifacts_dir
        .clone()
        .unwrap_or_else(ArtifactManager::get_default_artifacts_dir);

    if args.verify {
        let manager = ArtifactManager::open(&artifacts_dir)
            .with_context(|| format!("Cannot verify artifact directory {}", artifacts_dir.display()))?;
        return report_verification(&manager);
    }

    if args.fetch || args.fresh {
        let manager = ArtifactManager::new(&artifacts_dir)
            .with_context(|| format!("Cannot use artifact directory {}", artifacts_dir.display()))?;
        prepare_artifacts(&manager, args.fresh).await?;
    }

    let start_time = Instant::now();
    let predictor = Predictor::from_dir(&artifacts_dir)
        .with_context(|| format!("Failed to load artifacts from {}", artifacts_dir.display()))?;
    let pipeline_info = predictor.info();
    info!(
        "Artifacts loaded in {:.2?} (scaler: {:?}, model: {}, classes: {:?})",
        start_time.elapsed(),
        pipeline_info.scaler_kind,
        pipeline_info.model_kind,
        pipeline_info.class_labels
    );

    let input = args.raw_input();
    info!("Input: {:?}", input);

    match predictor.respond(&input) {
        outcome @ Outcome::Label(_) => {
            println!("{}", outcome);
            Ok(ExitCode::SUCCESS)
        }
        outcome @ Outcome::Error(_) => {
            eprintln!("{}", outcome);
            Ok(ExitCode::FAILURE)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_library_defaults() {
        let args = Args::parse_from(["persona_predict_bin"]);
        assert_eq!(args.raw_input(), RawInput::default());
    }

    #[test]
    fn test_flags_out_of_range_rejected() {
        assert!(Args::try_parse_from(["persona_predict_bin", "--going-outside", "8"]).is_err());
        assert!(Args::try_parse_from(["persona_predict_bin", "--friends-size", "21"]).is_err());
        assert!(Args::try_parse_from(["persona_predict_bin", "--stage-fear", "Maybe"]).is_err());
    }

    #[test]
    fn test_flags_parsed() {
        let args = Args::parse_from([
            "persona_predict_bin",
            "--time-alone", "0",
            "--friends-size", "20",
            "--stage-fear", "No",
            "--drained-social", "no",
        ]);
        let input = args.raw_input();
        assert_eq!(input.time_alone, 0);
        assert_eq!(input.friends_size, 20);
        assert_eq!(input.stage_fear, "No");
        assert_eq!(input.drained_social, "No");
    }
}
