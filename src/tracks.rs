use std::collections::BTreeMap;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::detection::{
    BBox, ClassVocabulary, RawDetection, TrackedDetection, CLASS_BALL, CLASS_PLAYER, CLASS_REFEREE,
};

/// Fixed key for the ball entry in every frame's ball map. Only one ball is
/// tracked at a time, by presence rather than identity continuity.
pub const BALL_TRACK_ID: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub bbox: BBox,
    #[serde(default)]
    pub team: Option<u8>,
    /// BGR team color, filled in by team assignment.
    #[serde(default)]
    pub team_color: Option<[f64; 3]>,
    #[serde(default)]
    pub has_ball: bool,
}

impl PlayerRecord {
    pub fn new(bbox: BBox) -> Self {
        Self {
            bbox,
            team: None,
            team_color: None,
            has_ball: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefereeRecord {
    pub bbox: BBox,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BallRecord {
    pub bbox: BBox,
}

pub type PlayerFrame = BTreeMap<u32, PlayerRecord>;
pub type RefereeFrame = BTreeMap<u32, RefereeRecord>;
pub type BallFrame = BTreeMap<u32, BallRecord>;

/// One frame's worth of collaborator output: the post-remap raw detection
/// set (the ball is picked from here) and the tracked subset.
#[derive(Debug, Clone, Default)]
pub struct FrameObservations {
    pub detections: Vec<RawDetection>,
    pub tracks: Vec<TrackedDetection>,
}

/// The pipeline's central data product: per-frame mappings from track id to
/// entity record, one sequence per class, all of identical length.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackTable {
    pub players: Vec<PlayerFrame>,
    pub referees: Vec<RefereeFrame>,
    pub ball: Vec<BallFrame>,
}

impl TrackTable {
    /// Fold the per-frame observation sequence into the three mapping
    /// sequences. Tracked detections populate players and referees by track
    /// id; the highest-confidence untracked ball detection lands under the
    /// fixed key [`BALL_TRACK_ID`]. Classes outside {player, referee, ball}
    /// are ignored. Empty frames yield empty maps, never an error.
    pub fn build(frames: &[FrameObservations], vocab: &ClassVocabulary) -> Result<TrackTable> {
        let player_id = vocab.id_of(CLASS_PLAYER);
        let referee_id = vocab.id_of(CLASS_REFEREE);
        let ball_id = vocab.id_of(CLASS_BALL);

        let mut table = TrackTable::default();

        for frame in frames {
            let mut players = PlayerFrame::new();
            let mut referees = RefereeFrame::new();
            let mut ball = BallFrame::new();

            for track in &frame.tracks {
                if Some(track.class_id) == player_id {
                    players.insert(track.track_id, PlayerRecord::new(track.bbox));
                } else if Some(track.class_id) == referee_id {
                    referees.insert(track.track_id, RefereeRecord { bbox: track.bbox });
                }
            }

            let best_ball = frame
                .detections
                .iter()
                .filter(|det| Some(det.class_id) == ball_id)
                .max_by(|a, b| a.confidence.total_cmp(&b.confidence));
            if let Some(det) = best_ball {
                ball.insert(BALL_TRACK_ID, BallRecord { bbox: det.bbox });
            }

            table.players.push(players);
            table.referees.push(referees);
            table.ball.push(ball);
        }

        Ok(table)
    }

    pub fn frame_count(&self) -> usize {
        self.players.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::{CLASS_GOALKEEPER, merge_goalkeepers};

    fn football_vocab() -> ClassVocabulary {
        ClassVocabulary::new(BTreeMap::from([
            (0, CLASS_BALL.to_string()),
            (1, CLASS_GOALKEEPER.to_string()),
            (2, CLASS_PLAYER.to_string()),
            (3, CLASS_REFEREE.to_string()),
        ]))
    }

    fn tracked(bbox: [f32; 4], class_id: i32, track_id: u32) -> TrackedDetection {
        TrackedDetection {
            bbox: BBox::from(bbox),
            class_id,
            confidence: 0.9,
            track_id,
        }
    }

    fn raw(bbox: [f32; 4], class_id: i32, confidence: f32) -> RawDetection {
        RawDetection::new(BBox::from(bbox), class_id, confidence)
    }

    #[test]
    fn test_sequences_have_frame_count_length() {
        let vocab = football_vocab();
        for n in [0usize, 1, 5] {
            let frames = vec![FrameObservations::default(); n];
            let table = TrackTable::build(&frames, &vocab).unwrap();
            assert_eq!(table.players.len(), n);
            assert_eq!(table.referees.len(), n);
            assert_eq!(table.ball.len(), n);
        }
    }

    #[test]
    fn test_players_and_referees_keyed_by_track_id() {
        let vocab = football_vocab();
        let frames = vec![FrameObservations {
            detections: vec![],
            tracks: vec![
                tracked([10.0, 10.0, 50.0, 90.0], 2, 7),
                tracked([200.0, 10.0, 240.0, 90.0], 2, 9),
                tracked([400.0, 10.0, 440.0, 90.0], 3, 4),
            ],
        }];

        let table = TrackTable::build(&frames, &vocab).unwrap();

        assert_eq!(table.players[0].len(), 2);
        assert!(table.players[0].contains_key(&7));
        assert!(table.players[0].contains_key(&9));
        assert_eq!(table.referees[0].len(), 1);
        assert!(table.referees[0].contains_key(&4));
        assert!(table.ball[0].is_empty());
    }

    #[test]
    fn test_highest_confidence_ball_wins() {
        let vocab = football_vocab();
        let frames = vec![FrameObservations {
            detections: vec![
                raw([40.0, 40.0, 50.0, 50.0], 0, 0.3),
                raw([400.0, 400.0, 410.0, 410.0], 0, 0.8),
            ],
            tracks: vec![],
        }];

        let table = TrackTable::build(&frames, &vocab).unwrap();

        let ball = &table.ball[0][&BALL_TRACK_ID];
        assert_eq!(ball.bbox, BBox::new(400.0, 400.0, 410.0, 410.0));
    }

    #[test]
    fn test_goalkeeper_never_appears_as_own_class() {
        let vocab = football_vocab();
        let keeper = raw([10.0, 10.0, 50.0, 90.0], 1, 0.9);
        let remapped = merge_goalkeepers(&[keeper], &vocab).unwrap();

        // after the remap the tracker sees a player, so the table does too
        let frames = vec![FrameObservations {
            detections: remapped.clone(),
            tracks: vec![TrackedDetection {
                bbox: remapped[0].bbox,
                class_id: remapped[0].class_id,
                confidence: remapped[0].confidence,
                track_id: 11,
            }],
        }];
        let table = TrackTable::build(&frames, &vocab).unwrap();

        assert_eq!(table.players[0].len(), 1);
        assert!(table.referees[0].is_empty());
    }

    #[test]
    fn test_unknown_classes_ignored() {
        let mut names = BTreeMap::from([
            (0, CLASS_BALL.to_string()),
            (2, CLASS_PLAYER.to_string()),
            (3, CLASS_REFEREE.to_string()),
        ]);
        names.insert(4, "ball boy".to_string());
        let vocab = ClassVocabulary::new(names);

        let frames = vec![FrameObservations {
            detections: vec![raw([0.0, 0.0, 10.0, 10.0], 4, 0.9)],
            tracks: vec![tracked([0.0, 0.0, 10.0, 10.0], 4, 3)],
        }];
        let table = TrackTable::build(&frames, &vocab).unwrap();

        assert!(table.players[0].is_empty());
        assert!(table.referees[0].is_empty());
        assert!(table.ball[0].is_empty());
    }
}
