use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::Result;
use nalgebra::SVector;
use opencv::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Bounding box in pixel coordinates, `[x1, y1, x2, y2]` with `x1 < x2`, `y1 < y2`.
pub type BBox = SVector<f32, 4>;

pub const CLASS_PLAYER: &str = "player";
pub const CLASS_GOALKEEPER: &str = "goalkeeper";
pub const CLASS_REFEREE: &str = "referee";
pub const CLASS_BALL: &str = "ball";

#[derive(Debug, Error)]
pub enum VocabularyError {
    #[error("detector vocabulary has no \"{0}\" class")]
    MissingClass(&'static str),
}

/// A single pre-tracking detection as produced by the detector collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDetection {
    pub bbox: BBox,
    pub class_id: i32,
    pub confidence: f32,
}

impl RawDetection {
    pub fn new(bbox: BBox, class_id: i32, confidence: f32) -> Self {
        Self {
            bbox,
            class_id,
            confidence,
        }
    }
}

/// A detection the tracker collaborator stamped with a persistent identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedDetection {
    pub bbox: BBox,
    pub class_id: i32,
    pub confidence: f32,
    pub track_id: u32,
}

/// Class-id to class-name mapping for one detector run, with the inverse
/// lookup built up front.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassVocabulary {
    names: BTreeMap<i32, String>,
    #[serde(skip)]
    ids: BTreeMap<String, i32>,
}

impl ClassVocabulary {
    pub fn new(names: BTreeMap<i32, String>) -> Self {
        let ids = names.iter().map(|(&id, name)| (name.clone(), id)).collect();
        Self { names, ids }
    }

    pub fn name_of(&self, class_id: i32) -> Option<&str> {
        self.names.get(&class_id).map(String::as_str)
    }

    pub fn id_of(&self, name: &str) -> Option<i32> {
        self.ids.get(name).copied()
    }

    /// Rebuild the inverse map after deserialization (it is not persisted).
    pub fn rebuild_index(&mut self) {
        self.ids = self
            .names
            .iter()
            .map(|(&id, name)| (name.clone(), id))
            .collect();
    }
}

/// Rewrite every goalkeeper detection to the player class so downstream
/// aggregation treats the two uniformly. Pure and order-preserving.
///
/// Fails fast if the vocabulary has no "player" entry; the domain guarantees
/// a fixed four-class vocabulary, so a missing entry is a configuration
/// error, not something to recover from.
pub fn merge_goalkeepers(
    detections: &[RawDetection],
    vocab: &ClassVocabulary,
) -> Result<Vec<RawDetection>, VocabularyError> {
    let player_id = vocab
        .id_of(CLASS_PLAYER)
        .ok_or(VocabularyError::MissingClass(CLASS_PLAYER))?;

    Ok(detections
        .iter()
        .map(|det| {
            let mut det = det.clone();
            if vocab.name_of(det.class_id) == Some(CLASS_GOALKEEPER) {
                det.class_id = player_id;
            }
            det
        })
        .collect())
}

/// Detector collaborator: batched per-frame detection with a shared class
/// vocabulary for the run. Handles are caller-owned and passed into the
/// pipeline explicitly.
pub trait Detector {
    fn detect(&mut self, frames: &[Mat]) -> Result<Vec<Vec<RawDetection>>>;
    fn vocabulary(&self) -> &ClassVocabulary;
}

/// Tracker collaborator: consumes one frame's detections, returns the subset
/// it follows with persistent identities attached. Balls pass through this
/// boundary without a stable identity in this design.
pub trait Tracker {
    fn update(&mut self, detections: &[RawDetection]) -> Result<Vec<TrackedDetection>>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RecordedFrame {
    #[serde(default)]
    detections: Vec<RawDetection>,
    #[serde(default)]
    tracks: Vec<TrackedDetection>,
}

/// Replay of a previous detector+tracker run, loaded from a JSON dump.
/// Implements both collaborator traits so the pipeline can run end to end
/// without an in-process neural network.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordedDetections {
    vocabulary: ClassVocabulary,
    frames: Vec<RecordedFrame>,
    #[serde(skip)]
    detect_cursor: usize,
    #[serde(skip)]
    track_cursor: usize,
}

impl RecordedDetections {
    pub fn from_file(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read detections file {:?}: {}", path, e))?;
        let mut recorded: RecordedDetections = serde_json::from_str(&data)
            .map_err(|e| anyhow::anyhow!("failed to parse detections file {:?}: {}", path, e))?;
        recorded.vocabulary.rebuild_index();
        Ok(recorded)
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl Detector for RecordedDetections {
    fn detect(&mut self, frames: &[Mat]) -> Result<Vec<Vec<RawDetection>>> {
        let start = self.detect_cursor;
        let end = start + frames.len();
        if end > self.frames.len() {
            anyhow::bail!(
                "recorded run has {} frames, requested up to {}",
                self.frames.len(),
                end
            );
        }
        self.detect_cursor = end;
        Ok(self.frames[start..end]
            .iter()
            .map(|f| f.detections.clone())
            .collect())
    }

    fn vocabulary(&self) -> &ClassVocabulary {
        &self.vocabulary
    }
}

impl Tracker for RecordedDetections {
    fn update(&mut self, _detections: &[RawDetection]) -> Result<Vec<TrackedDetection>> {
        let frame = self.frames.get(self.track_cursor).ok_or_else(|| {
            anyhow::anyhow!("recorded run exhausted at frame {}", self.track_cursor)
        })?;
        self.track_cursor += 1;
        Ok(frame.tracks.clone())
    }
}
