use std::path::Path;

use anyhow::Result;
use opencv::prelude::*;
use tracing::{debug, info};

use crate::annotation::annotate_frames;
use crate::cache;
use crate::config::Config;
use crate::detection::{merge_goalkeepers, Detector, Tracker};
use crate::interpolation::interpolate_ball;
use crate::possession::attribute_possession;
use crate::team::{apply_teams, TeamAssigner};
use crate::tracks::{FrameObservations, TrackTable};

/// The full aggregation-and-rendering pipeline. Detector and tracker handles
/// are caller-owned and passed in at construction; the pipeline holds no
/// process-wide state of its own.
pub struct Pipeline<D: Detector, T: Tracker> {
    detector: D,
    tracker: T,
    config: Config,
}

impl<D: Detector, T: Tracker> Pipeline<D, T> {
    pub fn new(detector: D, tracker: T, config: Config) -> Self {
        Self {
            detector,
            tracker,
            config,
        }
    }

    /// Build the track table for the video, reusing a cached snapshot when
    /// one exists at `cache_path`. Detection runs in fixed-size batches;
    /// batching is a throughput knob only and does not affect output values
    /// or ordering. The ball sub-table comes back interpolated.
    pub fn object_tracks(&mut self, frames: &[Mat], cache_path: Option<&Path>) -> Result<TrackTable> {
        if let Some(path) = cache_path {
            if let Some(table) = cache::load(path)? {
                return Ok(table);
            }
        }

        let mut observations = Vec::with_capacity(frames.len());
        let batch_size = self.config.detection_batch_size.max(1);

        for batch in frames.chunks(batch_size) {
            let detected = self.detector.detect(batch)?;
            for frame_dets in &detected {
                let remapped = merge_goalkeepers(frame_dets, self.detector.vocabulary())?;
                let tracks = self.tracker.update(&remapped)?;
                debug!(
                    detections = remapped.len(),
                    tracks = tracks.len(),
                    "processed frame"
                );
                observations.push(FrameObservations {
                    detections: remapped,
                    tracks,
                });
            }
        }

        let mut table = TrackTable::build(&observations, self.detector.vocabulary())?;
        table.ball = interpolate_ball(&table.ball);
        info!(frames = table.frame_count(), "built track table");

        if let Some(path) = cache_path {
            cache::save(path, &table)?;
        }
        Ok(table)
    }

    /// Run the whole pipeline: aggregate tracks, assign teams, attribute
    /// possession, render overlays. Returns one annotated frame per input
    /// frame; the inputs are never modified.
    pub fn run(
        &mut self,
        frames: &[Mat],
        assigner: &mut dyn TeamAssigner,
        cache_path: Option<&Path>,
    ) -> Result<Vec<Mat>> {
        let table = self.object_tracks(frames, cache_path)?;

        let players = apply_teams(&table.players, frames, assigner)?;
        let (players, possession) =
            attribute_possession(&players, &table.ball, self.config.possession_max_distance);
        info!(frames = possession.len(), "attributed ball possession");

        annotate_frames(
            frames,
            &players,
            &table.referees,
            &table.ball,
            &possession,
            &self.config,
        )
    }
}
