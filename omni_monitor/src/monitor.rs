//! Poll loop: send the force command, refresh the device state, report it.

use crate::settings::MonitorSettings;
use omni_common::prelude::*;
use omni_shm::{EulerAngles, MessageManager, OrientationExt, ShmResult, UpdateStatus};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Human-oriented view of one device state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    /// Joint state stamp.
    pub stamp: u64,
    /// Stylus position.
    pub position: Vector3d,
    /// Stylus orientation in degrees, from the device transform.
    pub rpy_deg: EulerAngles,
    /// Waist to wrist3 angles.
    pub joints: [f64; 6],
    /// Pressed buttons.
    pub buttons: Buttons,
    /// Position lock engaged.
    pub locked: bool,
}

impl Sample {
    /// Summarize a decoded read block.
    pub fn from_state(state: &ReadMessage) -> Self {
        let omni = &state.omnistate;
        Self {
            stamp: state.jointstate.stamp,
            position: omni.position,
            rpy_deg: omni.orientation().to_degrees(),
            joints: state.jointstate.angles(),
            buttons: state.buttonevent.pressed(),
            locked: omni.is_locked(),
        }
    }
}

/// Loop timing statistics.
#[derive(Debug, Clone, Default)]
pub struct LoopStats {
    /// Completed cycles.
    pub cycle_count: u64,
    /// Longest cycle in microseconds.
    pub max_cycle_time_us: u64,
    /// Cycles that exceeded the poll period.
    pub overruns: u64,
}

/// Device monitor bound to one segment.
pub struct Monitor {
    manager: MessageManager,
    settings: MonitorSettings,
    running: Arc<AtomicBool>,
    stats: LoopStats,
}

impl Monitor {
    /// Attach to the configured segment.
    pub fn attach(settings: MonitorSettings) -> ShmResult<Self> {
        let manager = MessageManager::attach(settings.segment.clone())?;
        Ok(Self::with_manager(manager, settings))
    }

    /// Wrap an existing manager.
    pub fn with_manager(manager: MessageManager, settings: MonitorSettings) -> Self {
        Self {
            manager,
            settings,
            running: Arc::new(AtomicBool::new(true)),
            stats: LoopStats::default(),
        }
    }

    /// Flag that keeps [`run`](Self::run) going; clear it to stop. Set at
    /// construction, so clearing it before `run` makes `run` return at once.
    pub fn running_flag(&self) -> Arc<AtomicBool> {
        self.running.clone()
    }

    /// Loop statistics so far.
    pub fn stats(&self) -> &LoopStats {
        &self.stats
    }

    /// Underlying message manager.
    pub fn manager(&self) -> &MessageManager {
        &self.manager
    }

    /// One cycle: queue the force, exchange, summarize.
    ///
    /// Returns `None` once the manager is detached.
    pub fn step(&mut self) -> ShmResult<Option<Sample>> {
        self.manager.set_force(self.settings.force);
        match self.manager.update()? {
            UpdateStatus::Synced => Ok(Some(Sample::from_state(self.manager.state()))),
            UpdateStatus::Detached => Ok(None),
        }
    }

    /// Poll until the running flag clears, the cycle limit is reached, or
    /// the manager detaches.
    pub fn run(&mut self) -> ShmResult<()> {
        let period = self.settings.period;
        let report_every = self.settings.report_every();
        info!(
            "Starting monitor loop (segment={}, period={}us)",
            self.settings.segment,
            period.as_micros()
        );

        while self.running.load(Ordering::SeqCst) {
            if self
                .settings
                .max_cycles
                .is_some_and(|max| self.stats.cycle_count >= max)
            {
                break;
            }

            let cycle_start = Instant::now();
            let Some(sample) = self.step()? else {
                warn!("Segment detached, stopping monitor loop");
                break;
            };
            self.stats.cycle_count += 1;

            if self.stats.cycle_count % report_every == 1 || report_every == 1 {
                report(&sample);
            } else {
                debug!(stamp = sample.stamp, "Sample");
            }

            self.pace(cycle_start, period);
        }

        info!(
            "Monitor loop stopped after {} cycles (max {}us, {} overruns)",
            self.stats.cycle_count, self.stats.max_cycle_time_us, self.stats.overruns
        );
        Ok(())
    }

    fn pace(&mut self, cycle_start: Instant, period: Duration) {
        let elapsed = cycle_start.elapsed();
        let cycle_time_us = elapsed.as_micros() as u64;
        self.stats.max_cycle_time_us = self.stats.max_cycle_time_us.max(cycle_time_us);

        if elapsed < period {
            std::thread::sleep(period - elapsed);
        } else {
            self.stats.overruns += 1;
            if self.stats.overruns <= 10 || self.stats.overruns % 1000 == 0 {
                warn!(
                    "Overrun #{}: cycle took {}us (period {}us)",
                    self.stats.overruns,
                    cycle_time_us,
                    period.as_micros()
                );
            }
        }
    }

    /// Zero the force, run a final cycle and detach.
    pub fn shutdown(&mut self) -> ShmResult<()> {
        self.running.store(false, Ordering::SeqCst);
        self.manager.shutdown()
    }
}

fn report(sample: &Sample) {
    let p = sample.position;
    let rpy = sample.rpy_deg;
    let j = sample.joints;
    info!(
        stamp = sample.stamp,
        locked = sample.locked,
        "pos=({:.2}, {:.2}, {:.2}) rpy=({:.1}, {:.1}, {:.1}) joints=[{:.3}, {:.3}, {:.3}, {:.3}, {:.3}, {:.3}] buttons={:?}",
        p.x,
        p.y,
        p.z,
        rpy.roll,
        rpy.pitch,
        rpy.yaw,
        j[0],
        j[1],
        j[2],
        j[3],
        j[4],
        j[5],
        sample.buttons
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> ReadMessage {
        let mut msg = ReadMessage::default();
        msg.jointstate = JointState {
            stamp: 7,
            waist: 0.1,
            shoulder: 0.2,
            elbow: 0.3,
            wrist1: 0.4,
            wrist2: 0.5,
            wrist3: 0.6,
        };
        msg.buttonevent = ButtonEvent {
            grey_button: 0,
            white_button: 1,
        };
        msg.omnistate.position = Vector3d::new(1.0, 2.0, 3.0);
        // Identity transform.
        for i in 0..4 {
            msg.omnistate.transform[i * 5] = 1.0;
        }
        msg
    }

    #[test]
    fn sample_summarizes_state() {
        let sample = Sample::from_state(&state());
        assert_eq!(sample.stamp, 7);
        assert_eq!(sample.position, Vector3d::new(1.0, 2.0, 3.0));
        assert_eq!(sample.joints, [0.1, 0.2, 0.3, 0.4, 0.5, 0.6]);
        assert_eq!(sample.buttons, Buttons::WHITE);
        assert!(!sample.locked);
        assert_eq!(sample.rpy_deg, EulerAngles::default());
    }

    #[test]
    fn zero_transform_does_not_panic() {
        let sample = Sample::from_state(&ReadMessage::default());
        assert!(sample.rpy_deg.roll.is_finite());
        assert!(sample.rpy_deg.pitch.is_finite());
        assert_eq!(sample.buttons, Buttons::empty());
    }
}
