use anyhow::Result;
use opencv::{
    core::{self, Point, Rect, Scalar, Size, Vector},
    imgproc,
    prelude::*,
};

use crate::config::Config;
use crate::detection::BBox;
use crate::possession::PossessionLog;
use crate::tracks::{BallFrame, PlayerFrame, RefereeFrame, BALL_TRACK_ID};

const BALL_MARKER_COLOR: Scalar = Scalar::new(0.0, 255.0, 0.0, 0.0);
const HOLDER_MARKER_COLOR: Scalar = Scalar::new(0.0, 0.0, 255.0, 0.0);
const PANEL_ALPHA: f64 = 0.4;

fn bgr(color: [f64; 3]) -> Scalar {
    Scalar::new(color[0], color[1], color[2], 0.0)
}

fn bottom_center(bbox: &BBox) -> Point {
    Point::new(((bbox[0] + bbox[2]) / 2.0) as i32, bbox[3] as i32)
}

/// Ellipse marker under an entity's feet, the footprint-style marker used for
/// players and referees. With `track_id` set, a small id pill is drawn below.
pub fn draw_ellipse(
    frame: &mut Mat,
    bbox: &BBox,
    color: Scalar,
    track_id: Option<u32>,
) -> Result<()> {
    let center = bottom_center(bbox);
    let width = (bbox[2] - bbox[0]) as i32;

    imgproc::ellipse(
        frame,
        center,
        Size::new(width, (0.35 * width as f64) as i32),
        0.0,
        -45.0,
        235.0,
        color,
        2,
        imgproc::LINE_4,
        0,
    )?;

    if let Some(track_id) = track_id {
        let rect_w = 40;
        let rect_h = 20;
        let rect = Rect::new(center.x - rect_w / 2, center.y + 5, rect_w, rect_h);
        imgproc::rectangle(frame, rect, color, -1, imgproc::LINE_8, 0)?;

        let text = track_id.to_string();
        let mut x_text = rect.x + 12;
        if track_id > 99 {
            x_text -= 10;
        }
        imgproc::put_text(
            frame,
            &text,
            Point::new(x_text, rect.y + 15),
            imgproc::FONT_HERSHEY_SIMPLEX,
            0.6,
            Scalar::new(0.0, 0.0, 0.0, 0.0),
            2,
            imgproc::LINE_8,
            false,
        )?;
    }

    Ok(())
}

/// Filled triangle pointing down at the top edge of a box. Marks the ball
/// itself and the current ball holder.
pub fn draw_triangle(frame: &mut Mat, bbox: &BBox, color: Scalar) -> Result<()> {
    let x = ((bbox[0] + bbox[2]) / 2.0) as i32;
    let y = bbox[1] as i32;

    let mut pts = Vector::<Vector<Point>>::new();
    pts.push(Vector::from_iter([
        Point::new(x, y),
        Point::new(x - 10, y - 20),
        Point::new(x + 10, y - 20),
    ]));

    imgproc::fill_poly(frame, &pts, color, imgproc::LINE_8, 0, Point::new(0, 0))?;
    imgproc::polylines(
        frame,
        &pts,
        true,
        Scalar::new(0.0, 0.0, 0.0, 0.0),
        2,
        imgproc::LINE_8,
        0,
    )?;

    Ok(())
}

/// Translucent possession panel in the lower-right frame region, showing the
/// cumulative possession split up to and including this frame.
pub fn draw_possession_panel(
    frame: &mut Mat,
    log: &PossessionLog,
    frame_idx: usize,
) -> Result<()> {
    let (w, h) = (frame.cols(), frame.rows());
    let panel = Rect::new(
        (w as f64 * 0.70) as i32,
        (h as f64 * 0.79) as i32,
        (w as f64 * 0.29) as i32,
        (h as f64 * 0.11) as i32,
    );

    let mut overlay = frame.try_clone()?;
    imgproc::rectangle(
        &mut overlay,
        panel,
        Scalar::new(255.0, 255.0, 255.0, 0.0),
        -1,
        imgproc::LINE_8,
        0,
    )?;
    let mut blended = Mat::default();
    core::add_weighted(&overlay, PANEL_ALPHA, frame, 1.0 - PANEL_ALPHA, 0.0, &mut blended, -1)?;
    blended.copy_to(frame)?;

    let (team_one, team_two) = log.percentages(frame_idx);
    let lines = [
        format!("Team 1 Ball Control: {:.2}%", team_one),
        format!("Team 2 Ball Control: {:.2}%", team_two),
    ];
    for (i, line) in lines.iter().enumerate() {
        imgproc::put_text(
            frame,
            line,
            Point::new(panel.x + 15, panel.y + 40 + 45 * i as i32),
            imgproc::FONT_HERSHEY_SIMPLEX,
            0.8,
            Scalar::new(0.0, 0.0, 0.0, 0.0),
            2,
            imgproc::LINE_8,
            false,
        )?;
    }

    Ok(())
}

/// Render the analytic overlays for the whole video. Each output frame is a
/// clone; the input sequence is never mutated, so it stays available for
/// re-rendering or comparison.
pub fn annotate_frames(
    frames: &[Mat],
    players: &[PlayerFrame],
    referees: &[RefereeFrame],
    ball: &[BallFrame],
    log: &PossessionLog,
    config: &Config,
) -> Result<Vec<Mat>> {
    let mut output = Vec::with_capacity(frames.len());

    for (idx, frame) in frames.iter().enumerate() {
        let mut out = frame.try_clone()?;

        if let Some(player_frame) = players.get(idx) {
            for (&track_id, record) in player_frame {
                let color = record
                    .team_color
                    .map(bgr)
                    .unwrap_or_else(|| bgr(config.team_one_color));
                draw_ellipse(&mut out, &record.bbox, color, Some(track_id))?;
                if record.has_ball {
                    draw_triangle(&mut out, &record.bbox, HOLDER_MARKER_COLOR)?;
                }
            }
        }

        if let Some(referee_frame) = referees.get(idx) {
            for record in referee_frame.values() {
                draw_ellipse(&mut out, &record.bbox, bgr(config.referee_color), None)?;
            }
        }

        if let Some(ball_rec) = ball.get(idx).and_then(|f| f.get(&BALL_TRACK_ID)) {
            draw_triangle(&mut out, &ball_rec.bbox, BALL_MARKER_COLOR)?;
        }

        draw_possession_panel(&mut out, log, idx)?;
        output.push(out);
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::possession::Possession;
    use crate::tracks::{BallRecord, PlayerRecord};
    use opencv::core::CV_8UC3;

    fn blank_frame() -> Mat {
        Mat::new_size_with_default(
            Size::new(640, 360),
            CV_8UC3,
            Scalar::new(20.0, 120.0, 20.0, 0.0),
        )
        .unwrap()
    }

    #[test]
    fn test_annotate_leaves_input_frames_untouched() {
        let frames = vec![blank_frame()];
        let mut players = PlayerFrame::new();
        let mut rec = PlayerRecord::new(BBox::new(100.0, 50.0, 140.0, 160.0));
        rec.team_color = Some([255.0, 0.0, 0.0]);
        rec.has_ball = true;
        players.insert(7, rec);
        let ball = BallFrame::from([(
            BALL_TRACK_ID,
            BallRecord {
                bbox: BBox::new(130.0, 150.0, 140.0, 160.0),
            },
        )]);
        let mut log = PossessionLog::default();
        log.push(Possession::Team(1));

        let before = frames[0].try_clone().unwrap();
        let out = annotate_frames(
            &frames,
            &[players],
            &[RefereeFrame::new()],
            &[ball],
            &log,
            &Config::default(),
        )
        .unwrap();

        assert_eq!(out.len(), 1);
        // input unchanged, output differs from input
        let diff_in = core::norm2(&frames[0], &before, core::NORM_L1, &core::no_array()).unwrap();
        assert_eq!(diff_in, 0.0);
        let diff_out = core::norm2(&out[0], &before, core::NORM_L1, &core::no_array()).unwrap();
        assert!(diff_out > 0.0);
    }

    #[test]
    fn test_missing_ball_frame_renders_without_marker() {
        let frames = vec![blank_frame()];
        let result = annotate_frames(
            &frames,
            &[PlayerFrame::new()],
            &[RefereeFrame::new()],
            &[BallFrame::new()],
            &PossessionLog::default(),
            &Config::default(),
        );
        assert!(result.is_ok());
    }
}
