use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use pitchtrack::{
    config::Config, detection::RecordedDetections, team::JerseyColorAssigner, video, Pipeline,
};

/// Football video analysis: aggregates a recorded detector+tracker run into
/// per-entity trajectories and renders player, ball and possession overlays.
#[derive(Parser)]
#[command(name = "pitchtrack", author, version, about)]
struct Args {
    /// Input video path
    #[arg(short, long)]
    input: PathBuf,

    /// JSON dump of the per-frame detector+tracker run to replay
    #[arg(short, long)]
    detections: PathBuf,

    /// Annotated output video path
    #[arg(short, long, default_value = "output.mp4")]
    output: PathBuf,

    /// Path to configuration JSON; defaults apply when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Track-table cache path; reused when present, written after a fresh run
    #[arg(long)]
    cache: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pitchtrack=info".into()),
        )
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::from_file(&path.to_string_lossy())?,
        None => Config::default(),
    };

    let frames = video::read_video(&args.input)?;

    let recorded = RecordedDetections::from_file(&args.detections)?;
    if recorded.len() != frames.len() {
        anyhow::bail!(
            "recorded run covers {} frames but the video has {}",
            recorded.len(),
            frames.len()
        );
    }
    let tracker = recorded.clone();

    let mut assigner = JerseyColorAssigner::new(config.team_one_color, config.team_two_color);
    let mut pipeline = Pipeline::new(recorded, tracker, config.clone());

    info!("running track aggregation and annotation");
    let annotated = pipeline.run(&frames, &mut assigner, args.cache.as_deref())?;

    video::save_video(&annotated, &args.output, config.output_fps)?;
    info!("annotated video written to {:?}", args.output);
    Ok(())
}
