use crate::detection::BBox;
use crate::tracks::{BallFrame, BallRecord, BALL_TRACK_ID};

/// Repair frames where the ball was not detected.
///
/// Interior gaps bounded by two known boxes are bridged with component-wise
/// linear interpolation, proportional to the index position inside the gap.
/// A leading gap is backward-filled with the first known box so the ball has
/// a rendered position from frame 0 once it has been seen at all; a trailing
/// gap holds the last known box forward. With no known box anywhere the
/// sequence is returned all-empty, no position is fabricated.
///
/// Idempotent: a fully-populated sequence comes back unchanged.
pub fn interpolate_ball(frames: &[BallFrame]) -> Vec<BallFrame> {
    let boxes: Vec<Option<BBox>> = frames
        .iter()
        .map(|f| f.get(&BALL_TRACK_ID).map(|rec| rec.bbox))
        .collect();

    let known: Vec<usize> = boxes
        .iter()
        .enumerate()
        .filter_map(|(i, b)| b.is_some().then_some(i))
        .collect();
    if known.is_empty() {
        return frames.to_vec();
    }

    let mut filled = boxes.clone();

    // leading gap: backward fill from the first known box
    let first = known[0];
    for slot in filled.iter_mut().take(first) {
        *slot = boxes[first];
    }

    // interior gaps: linear bridge between consecutive known boxes
    for pair in known.windows(2) {
        let (lo, hi) = (pair[0], pair[1]);
        if hi - lo < 2 {
            continue;
        }
        let a = boxes[lo].unwrap();
        let b = boxes[hi].unwrap();
        for i in lo + 1..hi {
            let t = (i - lo) as f32 / (hi - lo) as f32;
            filled[i] = Some(a + (b - a) * t);
        }
    }

    // trailing gap: hold the last known box
    let last = *known.last().unwrap();
    for slot in filled.iter_mut().skip(last + 1) {
        *slot = boxes[last];
    }

    filled
        .into_iter()
        .map(|b| match b {
            Some(bbox) => BallFrame::from([(BALL_TRACK_ID, BallRecord { bbox })]),
            None => BallFrame::new(),
        })
        .collect()
}
