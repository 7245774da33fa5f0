use serde::Deserialize;
use std::fs;

/// Pipeline configuration, loaded from a JSON file. Colors are BGR.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Frames per detector batch.
    pub detection_batch_size: usize,
    /// Max distance in pixels from ball center to a player's foot position
    /// for the player to count as ball holder.
    pub possession_max_distance: f32,
    pub team_one_color: [f64; 3],
    pub team_two_color: [f64; 3],
    pub referee_color: [f64; 3],
    pub output_fps: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            detection_batch_size: 20,
            possession_max_distance: 70.0,
            team_one_color: [255.0, 255.0, 255.0],
            team_two_color: [50.0, 50.0, 200.0],
            referee_color: [0.0, 255.0, 255.0],
            output_fps: 24.0,
        }
    }
}

impl Config {
    /// Load from a JSON file.
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let data = fs::read_to_string(path)?;
        let cfg: Config = serde_json::from_str(&data)?;
        Ok(cfg)
    }
}
