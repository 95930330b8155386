// lib/src/simulator/mod.rs

//! Tick loop that evolves every patient and pushes the snapshot to a sink.

pub mod scheduler;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use log::{debug, info, warn};
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use crate::config::SimulationConfig;
use crate::errors::{SimulationError, SimulationResult};
use crate::registry::PatientRegistry;
use crate::vitals;
use models::{PatientRecord, VitalReading};

pub use scheduler::RepeatingTask;

/// Receives the full snapshot once per tick.
///
/// Errors are logged by the simulator and otherwise ignored.
pub trait SnapshotSink: Send + Sync {
    fn on_snapshot(&self, patients: &[PatientRecord]) -> SimulationResult<()>;
}

/// Per-patient step function.
pub trait VitalModel: Send + Sync {
    fn step(&self, current: &VitalReading, captured_at: DateTime<Utc>) -> SimulationResult<VitalReading>;
}

/// The damped/undamped bounded random walk from [`crate::vitals`].
#[derive(Debug, Clone, Copy, Default)]
pub struct BoundedRandomWalk;

impl VitalModel for BoundedRandomWalk {
    fn step(&self, current: &VitalReading, captured_at: DateTime<Utc>) -> SimulationResult<VitalReading> {
        vitals::next_reading(current, &mut rand::thread_rng(), captured_at)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulatorState {
    Idle,
    Running,
}

/// Outcome of one completed tick.
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    pub sequence: u64,
    pub captured_at: DateTime<Utc>,
    pub updated: usize,
    /// Patients that kept their previous reading this tick.
    pub failed: Vec<String>,
    pub sink_delivered: bool,
}

struct TickCore {
    registry: Arc<PatientRegistry>,
    model: Arc<dyn VitalModel>,
    in_progress: AtomicBool,
    last_stamp: Mutex<DateTime<Utc>>,
    ticks: AtomicU64,
}

/// Clears the tick-in-progress flag on every exit path, panics included.
struct InProgress<'a>(&'a AtomicBool);

impl Drop for InProgress<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl TickCore {
    /// Strictly later than every stamp issued before, and than the initial readings.
    fn next_stamp(&self) -> DateTime<Utc> {
        let mut last = self.last_stamp.lock().unwrap_or_else(PoisonError::into_inner);
        let stamp = Utc::now().max(*last + ChronoDuration::milliseconds(1));
        *last = stamp;
        stamp
    }

    fn run(&self, sink: &dyn SnapshotSink) -> Option<TickReport> {
        if self
            .in_progress
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("Tick skipped: previous tick still in progress");
            return None;
        }
        let _guard = InProgress(&self.in_progress);

        let captured_at = self.next_stamp();
        let ids: Vec<&str> = self.registry.ids().collect();
        let failed: Vec<String> = ids
            .par_iter()
            .filter_map(|id| match self.advance(id, captured_at) {
                Ok(()) => None,
                Err(e) => {
                    warn!("Patient {} kept its previous reading this tick: {}", id, e);
                    Some(id.to_string())
                }
            })
            .collect();

        let snapshot = self.registry.all();
        let sink_delivered = match sink.on_snapshot(&snapshot) {
            Ok(()) => true,
            Err(e) => {
                warn!("Snapshot delivery failed: {}", e);
                false
            }
        };

        let sequence = self.ticks.fetch_add(1, Ordering::AcqRel) + 1;
        Some(TickReport {
            sequence,
            captured_at,
            updated: ids.len() - failed.len(),
            failed,
            sink_delivered,
        })
    }

    fn advance(&self, id: &str, captured_at: DateTime<Utc>) -> SimulationResult<()> {
        let current = self
            .registry
            .reading(id)
            .ok_or_else(|| SimulationError::PatientNotFound(id.to_string()))?;
        let next = self.model.step(&current, captured_at)?;
        let status = vitals::classify(&next);
        self.registry.apply_update(id, next, status)
    }
}

/// Drives the fixed-period tick over a shared [`PatientRegistry`].
///
/// `Idle -> Running -> Idle`; at most one tick runs at any time.
pub struct Simulator {
    core: Arc<TickCore>,
    period: Duration,
    task: Mutex<Option<RepeatingTask>>,
}

impl Simulator {
    pub fn new(registry: Arc<PatientRegistry>, period: Duration) -> Self {
        Self::with_model(registry, period, Arc::new(BoundedRandomWalk))
    }

    pub fn from_config(registry: Arc<PatientRegistry>, config: &SimulationConfig) -> SimulationResult<Self> {
        config.validate()?;
        Ok(Self::new(registry, config.tick_period()))
    }

    pub fn with_model(registry: Arc<PatientRegistry>, period: Duration, model: Arc<dyn VitalModel>) -> Self {
        let seed_stamp = registry.latest_capture().unwrap_or_else(Utc::now);
        Simulator {
            core: Arc::new(TickCore {
                registry,
                model,
                in_progress: AtomicBool::new(false),
                last_stamp: Mutex::new(seed_stamp),
                ticks: AtomicU64::new(0),
            }),
            period,
            task: Mutex::new(None),
        }
    }

    /// Ticks completed so far.
    pub fn ticks(&self) -> u64 {
        self.core.ticks.load(Ordering::Acquire)
    }

    pub fn state(&self) -> SimulatorState {
        match *self.task.lock().unwrap_or_else(PoisonError::into_inner) {
            Some(_) => SimulatorState::Running,
            None => SimulatorState::Idle,
        }
    }

    /// Begins ticking into `sink`. Returns `false`, leaving the current tick
    /// stream untouched, if already running. Must be called inside a tokio runtime.
    pub fn start(&self, sink: Arc<dyn SnapshotSink>) -> bool {
        let mut task = self.task.lock().unwrap_or_else(PoisonError::into_inner);
        if task.is_some() {
            debug!("Simulator already running; start ignored");
            return false;
        }

        let core = Arc::clone(&self.core);
        *task = Some(RepeatingTask::spawn(self.period, move || {
            core.run(sink.as_ref());
        }));
        info!(
            "Patient simulator started: {} patients, {}ms interval",
            self.core.registry.len(),
            self.period.as_millis()
        );
        true
    }

    /// Cancels future ticks. Returns `false` if already idle.
    pub fn stop(&self) -> bool {
        let task = self.task.lock().unwrap_or_else(PoisonError::into_inner).take();
        match task {
            Some(mut task) => {
                task.cancel();
                info!("Patient simulator stopped");
                true
            }
            None => false,
        }
    }

    /// Like [`Simulator::stop`], but also waits for an in-flight tick to finish.
    pub async fn shutdown(&self) {
        let task = self.task.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(task) = task {
            task.cancel_and_join().await;
            info!("Patient simulator stopped");
        }
    }

    /// Runs one tick on the calling thread. Returns `None` if a tick is
    /// already in progress.
    pub fn tick_now(&self, sink: &dyn SnapshotSink) -> Option<TickReport> {
        self.core.run(sink)
    }
}

impl Drop for Simulator {
    fn drop(&mut self) {
        self.stop();
    }
}
