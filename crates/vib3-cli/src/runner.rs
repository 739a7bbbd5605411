//! Frame loop for headless playback.
//!
//! The simulated clock advances a fixed step per frame with no sleeping, so
//! output is deterministic. The real-time clock drives the same loop from a
//! `tokio` interval and stops on Ctrl-C.

use std::time::Duration;

use vib3_core::{ChoreographyPlayer, ParameterTimeline};

use crate::host::HeadlessEngine;

/// Something that can be started and then ticked with the host time.
pub trait Playback {
    fn start(&mut self, now: f64, engine: &mut HeadlessEngine) -> bool;

    /// Returns false once playback has finished.
    fn advance(&mut self, now: f64, engine: &mut HeadlessEngine) -> bool;

    /// Position within the playback in milliseconds.
    fn position(&self) -> f64;
}

impl Playback for ParameterTimeline {
    fn start(&mut self, now: f64, _engine: &mut HeadlessEngine) -> bool {
        self.play(now, None);
        self.is_playing()
    }

    fn advance(&mut self, now: f64, engine: &mut HeadlessEngine) -> bool {
        self.tick(now, engine)
    }

    fn position(&self) -> f64 {
        self.current_time()
    }
}

impl Playback for ChoreographyPlayer {
    fn start(&mut self, now: f64, engine: &mut HeadlessEngine) -> bool {
        self.play(now, engine)
    }

    fn advance(&mut self, now: f64, engine: &mut HeadlessEngine) -> bool {
        self.tick(now, engine)
    }

    fn position(&self) -> f64 {
        self.current_time()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Clock {
    Simulated,
    Realtime,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RunSummary {
    pub frames: u64,
    /// Host time elapsed in milliseconds.
    pub elapsed_ms: f64,
    /// True when playback ended on its own rather than hitting the limit.
    pub finished: bool,
    pub interrupted: bool,
}

/// Drive `playback` until it finishes or `limit_ms` of host time elapses.
pub async fn run<P: Playback>(
    playback: &mut P,
    engine: &mut HeadlessEngine,
    clock: Clock,
    frame_ms: f64,
    limit_ms: f64,
) -> RunSummary {
    match clock {
        Clock::Simulated => run_simulated(playback, engine, frame_ms, limit_ms),
        Clock::Realtime => run_realtime(playback, engine, frame_ms, limit_ms).await,
    }
}

pub fn run_simulated<P: Playback>(
    playback: &mut P,
    engine: &mut HeadlessEngine,
    frame_ms: f64,
    limit_ms: f64,
) -> RunSummary {
    let step = frame_ms.max(1.0);
    let mut summary = RunSummary {
        frames: 0,
        elapsed_ms: 0.0,
        finished: false,
        interrupted: false,
    };
    if !playback.start(0.0, engine) {
        summary.finished = true;
        return summary;
    }

    let mut now = 0.0;
    while now < limit_ms {
        now = (now + step).min(limit_ms);
        summary.frames += 1;
        if !playback.advance(now, engine) {
            summary.finished = true;
            break;
        }
    }
    summary.elapsed_ms = now;
    tracing::debug!(frames = summary.frames, position = playback.position(), "simulated run done");
    summary
}

async fn run_realtime<P: Playback>(
    playback: &mut P,
    engine: &mut HeadlessEngine,
    frame_ms: f64,
    limit_ms: f64,
) -> RunSummary {
    let mut summary = RunSummary {
        frames: 0,
        elapsed_ms: 0.0,
        finished: false,
        interrupted: false,
    };
    let origin = tokio::time::Instant::now();
    if !playback.start(0.0, engine) {
        summary.finished = true;
        return summary;
    }

    let mut interval = tokio::time::interval(Duration::from_secs_f64(frame_ms.max(1.0) / 1000.0));
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let now = origin.elapsed().as_secs_f64() * 1000.0;
                summary.frames += 1;
                summary.elapsed_ms = now;
                if !playback.advance(now.min(limit_ms), engine) {
                    summary.finished = true;
                    break;
                }
                if now >= limit_ms {
                    break;
                }
            }
            _ = &mut ctrl_c => {
                tracing::info!("interrupted, stopping playback");
                summary.interrupted = true;
                break;
            }
        }
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use vib3_core::{Easing, LoopMode, Parameter, ParameterSink};

    fn ramp() -> ParameterTimeline {
        let mut tl = ParameterTimeline::new(1000.0);
        tl.add_keyframe(Parameter::Chaos, 0.0, 0.0, Easing::Linear);
        tl.add_keyframe(Parameter::Chaos, 1000.0, 1.0, Easing::Linear);
        tl
    }

    #[test]
    fn test_simulated_once_finishes() {
        let mut tl = ramp();
        let mut engine = HeadlessEngine::with_defaults();
        let summary = run_simulated(&mut tl, &mut engine, 100.0, 5000.0);

        assert!(summary.finished);
        assert_eq!(summary.frames, 10);
        assert_eq!(engine.get_parameter(Parameter::Chaos), Some(1.0));
    }

    #[test]
    fn test_simulated_loop_hits_limit() {
        let mut tl = ramp();
        tl.set_loop_mode(LoopMode::Loop);
        let mut engine = HeadlessEngine::with_defaults();
        let summary = run_simulated(&mut tl, &mut engine, 100.0, 1250.0);

        assert!(!summary.finished);
        assert_eq!(summary.elapsed_ms, 1250.0);
        let chaos = engine.get_parameter(Parameter::Chaos).unwrap();
        assert!((chaos - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_empty_choreography_does_not_start() {
        let mut player = ChoreographyPlayer::new();
        let mut engine = HeadlessEngine::with_defaults();
        let summary = run_simulated(&mut player, &mut engine, 16.0, 1000.0);
        assert!(summary.finished);
        assert_eq!(summary.frames, 0);
    }

    #[tokio::test]
    async fn test_realtime_respects_limit() {
        let mut tl = ramp();
        tl.set_loop_mode(LoopMode::Loop);
        let mut engine = HeadlessEngine::with_defaults();
        let summary = run(&mut tl, &mut engine, Clock::Realtime, 50.0, 300.0).await;
        assert!(!summary.finished);
        assert!(summary.elapsed_ms >= 300.0);
        assert!(!summary.interrupted);
    }
}
