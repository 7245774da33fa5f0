use std::path::Path;

use anyhow::Result;
use opencv::{
    core::Size,
    prelude::*,
    videoio::{self, VideoCapture, VideoWriter},
};
use tracing::info;

/// Read every frame of a video into memory, in order.
pub fn read_video(path: &Path) -> Result<Vec<Mat>> {
    let mut cap = VideoCapture::from_file(&path.to_string_lossy(), videoio::CAP_ANY)?;
    if !cap.is_opened()? {
        anyhow::bail!("failed to open video file {:?}", path);
    }

    let mut frames = Vec::new();
    let mut frame = Mat::default();
    while cap.read(&mut frame)? {
        if frame.empty() {
            break;
        }
        frames.push(frame.try_clone()?);
    }
    info!(frames = frames.len(), "read video {:?}", path);
    Ok(frames)
}

/// Write an ordered frame sequence out as an mp4v video. All frames must
/// share the dimensions of the first one.
pub fn save_video(frames: &[Mat], path: &Path, fps: f64) -> Result<()> {
    let first = match frames.first() {
        Some(f) => f,
        None => anyhow::bail!("no frames to write to {:?}", path),
    };

    let fourcc = VideoWriter::fourcc('m', 'p', '4', 'v')?;
    let mut writer = VideoWriter::new(
        &path.to_string_lossy(),
        fourcc,
        fps,
        Size::new(first.cols(), first.rows()),
        true,
    )?;
    if !writer.is_opened()? {
        anyhow::bail!("failed to open video writer for {:?}", path);
    }

    for frame in frames {
        writer.write(frame)?;
    }
    writer.release()?;
    info!(frames = frames.len(), "wrote video {:?}", path);
    Ok(())
}
