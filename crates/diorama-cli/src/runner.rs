//! Render-loop hosts: a deterministic virtual-time run and a real-time loop.

use anyhow::{Context, Result};
use serde::Serialize;
use tokio::time::MissedTickBehavior;
use tracing::info;

use diorama_core::{DioramaConfig, Duration, Timestamp};
use diorama_scene::{FrameSnapshot, Stage};

/// Result of a simulated run.
#[derive(Debug, Serialize)]
pub struct SimulationReport {
    pub seconds: f64,
    pub fps: u32,
    pub frames: u64,
    pub cues: usize,
    pub snapshot: FrameSnapshot,
}

/// Run `seconds` of virtual time at `fps`, frame by frame, starting at zero.
pub fn simulate(config: &DioramaConfig, seconds: f64, fps: u32) -> Result<SimulationReport> {
    if !seconds.is_finite() || seconds < 0.0 {
        anyhow::bail!("--seconds must be a non-negative number, got {}", seconds);
    }
    if fps == 0 {
        anyhow::bail!("--fps must be positive");
    }

    let mut stage = Stage::new(config).context("failed to build the diorama")?;
    stage.start(Timestamp::zero())?;

    let last = Duration::from_seconds(seconds).frame_count(fps as f64);
    let mut cues = 0;
    for frame in 0..=last {
        let now = Timestamp::from_seconds(frame as f64 / fps as f64);
        cues += stage
            .frame(now)
            .with_context(|| format!("frame {} at {} failed", frame, now))?
            .len();
    }

    let snapshot = stage.snapshot(Timestamp::from_seconds(seconds));
    stage.stop();
    Ok(SimulationReport {
        seconds,
        fps,
        frames: stage.frames(),
        cues,
        snapshot,
    })
}

/// One human-readable line per actor.
pub fn describe(snapshot: &FrameSnapshot) -> Vec<String> {
    snapshot
        .actors
        .iter()
        .map(|actor| {
            let parts: Vec<String> = actor
                .parts
                .iter()
                .map(|(part, p)| format!("{}=({:.3}, {:.3}, {:.3})", part, p.x, p.y, p.z))
                .collect();
            let actions: Vec<String> = actor
                .actions
                .iter()
                .map(|(name, n)| format!("{} x{}", name, n))
                .collect();
            let state = match (&actor.door_state, actor.floor) {
                (Some(state), _) => state.to_string(),
                (None, Some(floor)) => format!("floor {}", floor),
                (None, None) => "moving".to_string(),
            };
            format!(
                "{:<10} {:<10} {:<8} {}  [{}]",
                actor.id,
                actor.kind.to_string(),
                state,
                parts.join(" "),
                actions.join(", ")
            )
        })
        .collect()
}

/// Drive the stage from the wall clock until `seconds` elapse or Ctrl-C.
pub async fn run_live(config: DioramaConfig, seconds: Option<f64>, report_every: f64) -> Result<()> {
    let mut stage = Stage::new(&config).context("failed to build the diorama")?;

    let mut ticker = tokio::time::interval(config.render.frame_interval().to_std());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let origin = tokio::time::Instant::now();
    stage.start(Timestamp::zero())?;
    info!("running at {} fps, Ctrl-C to stop", config.render.fps);

    let mut next_report = report_every;
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let now = Timestamp::from_seconds(origin.elapsed().as_secs_f64());
                stage.frame(now)?;
                if report_every > 0.0 && now.as_seconds() >= next_report {
                    let snapshot = stage.snapshot(now);
                    info!("t={} frame {}", now, snapshot.frame);
                    for line in describe(&snapshot) {
                        info!("  {}", line);
                    }
                    next_report += report_every;
                }
                if seconds.is_some_and(|limit| now.as_seconds() >= limit) {
                    break;
                }
            }
            result = &mut ctrl_c => {
                result.context("failed to listen for Ctrl-C")?;
                info!("interrupted");
                break;
            }
        }
    }

    stage.stop();
    info!("stopped after {} frames", stage.frames());
    Ok(())
}
