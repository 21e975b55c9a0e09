use std::convert::Infallible;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;
use tracing::{debug, info, warn};
use tracing_subscriber::filter::LevelFilter;

use ducktrack::tracker::BoxDetection;
use ducktrack::integration::Report;
use ducktrack::{Config, DetectionSource, GridLine, TrackerPipeline};

/// Replay recorded per-frame detections through the tracker and report trajectories and speeds.
#[derive(Parser)]
#[command(name = "ducktrack", version, about)]
struct Args {
    /// JSON Lines file, one frame per line
    #[arg(short, long)]
    input: PathBuf,

    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Where to write the JSON report (stdout if omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Override the frame rate from the config
    #[arg(long)]
    fps: Option<f32>,

    /// Log every frame's tracks
    #[arg(short, long)]
    verbose: bool,
}

/// One line of the input file.
#[derive(Debug, Deserialize)]
struct FrameRecord {
    #[serde(default)]
    frame: Option<u64>,
    #[serde(default)]
    detections: Vec<BoxDetection>,
    #[serde(default)]
    grid_lines: Option<Vec<GridLine>>,
}

/// Detector stand-in that hands back the boxes stored in each record.
struct Recorded;

impl DetectionSource for Recorded {
    type Frame = FrameRecord;
    type Error = Infallible;

    fn detect(&mut self, frame: &FrameRecord) -> Result<Vec<BoxDetection>, Infallible> {
        Ok(frame.detections.clone())
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .init();

    let mut config = match &args.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(fps) = args.fps {
        config.fps = fps;
    }

    let mut pipeline = TrackerPipeline::new(Recorded, &config).context("invalid configuration")?;

    let input = File::open(&args.input)
        .with_context(|| format!("opening {}", args.input.display()))?;
    let report = replay(BufReader::new(input), &mut pipeline)?;

    match &args.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("creating {}", path.display()))?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, &report)?;
            writer.flush()?;
        }
        None => {
            let stdout = io::stdout();
            let mut writer = stdout.lock();
            serde_json::to_writer_pretty(&mut writer, &report)?;
            writeln!(writer)?;
        }
    }
    Ok(())
}

/// Feed every non-blank JSON line through the pipeline and build the final report.
///
/// Grid lines on a record are offered to the calibrator before that record's frame is tracked,
/// and only while no scale is known yet.
fn replay<R: BufRead>(reader: R, pipeline: &mut TrackerPipeline<Recorded>) -> Result<Report> {
    for (idx, line) in reader.lines().enumerate() {
        let lineno = idx + 1;
        let line = line.with_context(|| format!("reading line {lineno}"))?;
        if line.trim().is_empty() {
            continue;
        }
        let record: FrameRecord = serde_json::from_str(&line)
            .with_context(|| format!("parsing frame record on line {lineno}"))?;

        if !pipeline.calibrator().is_calibrated() {
            if let Some(lines) = &record.grid_lines {
                pipeline.calibrate(lines);
            }
        }

        let frame = pipeline
            .process_frame(&record)
            .with_context(|| format!("processing frame on line {lineno}"))?;
        for track in &frame.tracks {
            debug!(
                frame = frame.frame,
                source_frame = record.frame,
                id = track.id,
                state = ?track.state,
                x = track.pixel[0],
                y = track.pixel[1],
                speed = track.speed,
                "track"
            );
        }
    }

    let report = pipeline.report();
    if report.is_empty() {
        warn!("no trajectories could be produced (missing calibration or too few matches)");
    } else {
        info!(
            frames = report.frames,
            trajectories = report.trajectories.len(),
            "tracking finished"
        );
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    use approx::assert_relative_eq;
    use serde_json::{Value, json};

    fn pipeline() -> TrackerPipeline<Recorded> {
        TrackerPipeline::new(Recorded, &Config::default()).unwrap()
    }

    /// A 30x30 box with its top-left corner at (`x`, 100).
    fn duck(x: f32) -> Value {
        json!([{"bbox": [x, 100.0, x + 30.0, 130.0], "confidence": 0.9}])
    }

    /// Two horizontal grid rows `pitch` pixels apart.
    fn grid(pitch: f32) -> Value {
        json!([
            {"rho": 0.0, "theta": std::f32::consts::FRAC_PI_2},
            {"rho": pitch, "theta": std::f32::consts::FRAC_PI_2},
        ])
    }

    fn jsonl(records: &[Value]) -> String {
        records.iter().map(|r| format!("{r}\n")).collect()
    }

    #[test]
    fn test_replay_calibrates_before_tracking_the_frame() {
        // 30 px rows over 10 unit squares give 3 px per unit. The later 50 px grid must not
        // replace that scale.
        let input = format!(
            "{}\n{}",
            jsonl(&[json!({"detections": duck(100.0)})]),
            jsonl(&[
                json!({"frame": 7, "detections": duck(106.0), "grid_lines": grid(30.0)}),
                json!({"frame": 8, "detections": duck(112.0), "grid_lines": grid(50.0)}),
            ])
        );
        let mut pipeline = pipeline();
        let report = replay(Cursor::new(input), &mut pipeline).unwrap();

        assert_eq!(report.frames, 3);
        assert_eq!(report.pixels_per_unit, Some(3.0));
        let traj = &report.trajectories[&0];
        assert_eq!(traj.len(), 2);
        assert_eq!((traj[0].frame, traj[1].frame), (2, 3));
        assert_relative_eq!(traj[0].x, 121.0 / 3.0, epsilon = 1e-4);
        assert_relative_eq!(traj[1].x, 127.0 / 3.0, epsilon = 1e-4);
        assert_relative_eq!(traj[1].y, 115.0 / 3.0, epsilon = 1e-4);
    }

    #[test]
    fn test_replay_without_grid_lines_gives_empty_report() {
        let input = jsonl(&[
            json!({"frame": 1, "detections": duck(100.0)}),
            json!({"frame": 2, "detections": duck(106.0)}),
            json!({"frame": 3, "detections": duck(112.0)}),
        ]);
        let mut pipeline = pipeline();
        let report = replay(Cursor::new(input), &mut pipeline).unwrap();

        assert!(report.is_empty());
        assert_eq!(report.pixels_per_unit, None);
        assert_eq!(report.frames, 3);
        assert_eq!(pipeline.tracker().get(0).map(|t| t.hits()), Some(3));
    }

    #[test]
    fn test_replay_reports_the_bad_line() {
        let input = "{\"detections\": []}\nnot json\n";
        let err = replay(Cursor::new(input), &mut pipeline()).unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }
}
