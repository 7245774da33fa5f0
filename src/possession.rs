use serde::{Deserialize, Serialize};

use crate::detection::BBox;
use crate::team::TeamId;
use crate::tracks::{BallFrame, PlayerFrame, BALL_TRACK_ID};

/// Per-frame ball-control attribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Possession {
    None,
    Team(TeamId),
}

/// Running per-frame possession history, appended monotonically as frames
/// are attributed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PossessionLog {
    entries: Vec<Possession>,
}

impl PossessionLog {
    pub fn push(&mut self, entry: Possession) {
        self.entries.push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, frame: usize) -> Option<Possession> {
        self.entries.get(frame).copied()
    }

    /// Cumulative possession shares for (team 1, team 2) over frames
    /// `0..=upto`, as percentages of the frames attributed so far. While no
    /// frame has any possession both shares are 0.0, never a division fault.
    pub fn percentages(&self, upto: usize) -> (f32, f32) {
        let mut team_one = 0usize;
        let mut team_two = 0usize;
        for entry in self.entries.iter().take(upto + 1) {
            match entry {
                Possession::Team(1) => team_one += 1,
                Possession::Team(2) => team_two += 1,
                _ => {}
            }
        }
        let attributed = team_one + team_two;
        if attributed == 0 {
            return (0.0, 0.0);
        }
        (
            100.0 * team_one as f32 / attributed as f32,
            100.0 * team_two as f32 / attributed as f32,
        )
    }
}

fn ball_center(bbox: &BBox) -> (f32, f32) {
    ((bbox[0] + bbox[2]) / 2.0, (bbox[1] + bbox[3]) / 2.0)
}

/// Distance from a point to the nearer of the player's two bottom bbox
/// corners, the closest thing to foot position a box gives us.
fn foot_distance(bbox: &BBox, point: (f32, f32)) -> f32 {
    let left = ((bbox[0] - point.0).powi(2) + (bbox[3] - point.1).powi(2)).sqrt();
    let right = ((bbox[2] - point.0).powi(2) + (bbox[3] - point.1).powi(2)).sqrt();
    left.min(right)
}

/// Mark the ball holder per frame and accumulate the possession history.
///
/// For each frame the player whose foot position is nearest the ball center
/// qualifies iff that distance is below `max_distance`; at most one player
/// per frame gets `has_ball`. Frames with no visible ball or no qualifying
/// player log [`Possession::None`]. Pure: returns a new player sequence, the
/// team-augmented input is not mutated.
pub fn attribute_possession(
    players: &[PlayerFrame],
    ball: &[BallFrame],
    max_distance: f32,
) -> (Vec<PlayerFrame>, PossessionLog) {
    let mut log = PossessionLog::default();
    let mut augmented = Vec::with_capacity(players.len());

    for (player_frame, ball_frame) in players.iter().zip(ball) {
        let mut out = player_frame.clone();

        let holder = ball_frame.get(&BALL_TRACK_ID).and_then(|ball_rec| {
            let center = ball_center(&ball_rec.bbox);
            player_frame
                .iter()
                .map(|(&id, rec)| (id, foot_distance(&rec.bbox, center)))
                .filter(|&(_, dist)| dist < max_distance)
                .min_by(|a, b| a.1.total_cmp(&b.1))
                .map(|(id, _)| id)
        });

        match holder.and_then(|id| out.get_mut(&id)) {
            Some(record) => {
                record.has_ball = true;
                match record.team {
                    Some(team) => log.push(Possession::Team(team)),
                    None => log.push(Possession::None),
                }
            }
            None => log.push(Possession::None),
        }

        augmented.push(out);
    }

    (augmented, log)
}
