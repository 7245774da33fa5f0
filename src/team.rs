use std::collections::BTreeMap;

use anyhow::Result;
use opencv::{
    core::{self, Rect},
    prelude::*,
};
use tracing::debug;

use crate::tracks::PlayerFrame;

pub type TeamId = u8;

pub const TEAM_ONE: TeamId = 1;
pub const TEAM_TWO: TeamId = 2;

/// Team-assignment collaborator: maps each player track id in a frame to one
/// of two teams. Must be idempotent for identical inputs.
pub trait TeamAssigner {
    fn assign(&mut self, frame: &Mat, players: &PlayerFrame) -> Result<BTreeMap<u32, TeamId>>;
    /// Representative BGR color for a team.
    fn color_of(&self, team: TeamId) -> [f64; 3];
}

/// Assigns teams by jersey color: the mean BGR of the upper half of the
/// player's box is matched against the two configured team colors.
///
/// Assignment is sticky: once a track id has a team it keeps it for the rest
/// of the video, so per-frame color flicker cannot flip a player's team.
pub struct JerseyColorAssigner {
    colors: [[f64; 3]; 2],
    assigned: BTreeMap<u32, TeamId>,
}

impl JerseyColorAssigner {
    pub fn new(team_one: [f64; 3], team_two: [f64; 3]) -> Self {
        Self {
            colors: [team_one, team_two],
            assigned: BTreeMap::new(),
        }
    }

    fn nearest_team(&self, sample: [f64; 3]) -> TeamId {
        let dist = |color: [f64; 3]| -> f64 {
            color
                .iter()
                .zip(sample.iter())
                .map(|(a, b)| (a - b) * (a - b))
                .sum()
        };
        if dist(self.colors[0]) <= dist(self.colors[1]) {
            TEAM_ONE
        } else {
            TEAM_TWO
        }
    }
}

impl TeamAssigner for JerseyColorAssigner {
    fn assign(&mut self, frame: &Mat, players: &PlayerFrame) -> Result<BTreeMap<u32, TeamId>> {
        let mut teams = BTreeMap::new();
        for (&track_id, record) in players {
            if let Some(&team) = self.assigned.get(&track_id) {
                teams.insert(track_id, team);
                continue;
            }

            // jersey region: upper half of the box, clamped to the frame
            let x = (record.bbox[0] as i32).clamp(0, frame.cols() - 1);
            let y = (record.bbox[1] as i32).clamp(0, frame.rows() - 1);
            let w = ((record.bbox[2] - record.bbox[0]) as i32).clamp(1, frame.cols() - x);
            let h = (((record.bbox[3] - record.bbox[1]) / 2.0) as i32).clamp(1, frame.rows() - y);

            let roi = Mat::roi(frame, Rect::new(x, y, w, h))?.try_clone()?;
            let mean = core::mean(&roi, &core::no_array())?;
            let team = self.nearest_team([mean[0], mean[1], mean[2]]);
            debug!(track_id, team, "assigned team from jersey color");

            self.assigned.insert(track_id, team);
            teams.insert(track_id, team);
        }
        Ok(teams)
    }

    fn color_of(&self, team: TeamId) -> [f64; 3] {
        self.colors[if team == TEAM_ONE { 0 } else { 1 }]
    }
}

/// Produce a new player sequence with `team`/`team_color` populated from the
/// assigner, one call per frame. The input table is left untouched.
pub fn apply_teams(
    players: &[PlayerFrame],
    frames: &[Mat],
    assigner: &mut dyn TeamAssigner,
) -> Result<Vec<PlayerFrame>> {
    let mut augmented = Vec::with_capacity(players.len());
    for (frame, player_frame) in frames.iter().zip(players) {
        let teams = assigner.assign(frame, player_frame)?;
        let mut out = player_frame.clone();
        for (track_id, record) in out.iter_mut() {
            if let Some(&team) = teams.get(track_id) {
                record.team = Some(team);
                record.team_color = Some(assigner.color_of(team));
            }
        }
        augmented.push(out);
    }
    Ok(augmented)
}
