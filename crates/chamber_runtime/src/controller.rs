//! Run supervision.
//!
//! [`RunController::start`] spawns one OS thread per worker slot of every
//! processor. The returned [`RunHandle`] drives the pause gate, forwards
//! control events, issues kills and collects the outcome. The first stage
//! failure kills the whole run; later failures are ignored.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::error::{SpawnError, StageFailure};
use crate::gate::PauseGate;
use crate::graph::Graph;
use crate::monitor::{RunOutcome, RunReport, StageSummary};
use crate::processor::{Processor, Step};

/// State shared by the handle and every worker
#[derive(Debug)]
struct Supervisor {
    stages: Vec<Arc<Processor>>,
    gate: PauseGate,
    killed: AtomicBool,
    failure: Mutex<Option<StageFailure>>,
}

impl Supervisor {
    /// Global kill; returns false if one already happened
    fn kill(&self) -> bool {
        if self.killed.swap(true, Ordering::SeqCst) {
            return false;
        }
        tracing::warn!(stages = self.stages.len(), "killing run");
        self.gate.release();
        for stage in &self.stages {
            stage.begin_kill();
        }
        for stage in &self.stages {
            stage.cancel();
            stage.flush();
        }
        true
    }

    fn fail(&self, failure: StageFailure) {
        if self.killed.load(Ordering::SeqCst) {
            tracing::debug!(line = failure.line, "failure after kill ignored");
            return;
        }
        {
            let mut slot = self.failure.lock();
            if slot.is_some() {
                return;
            }
            tracing::debug!(
                line = failure.line,
                command = %failure.command,
                message = %failure.message,
                "stage failed"
            );
            *slot = Some(failure);
        }
        self.kill();
    }

    fn work(&self, stage: &Processor, worker: usize) {
        tracing::debug!(line = stage.line(), command = stage.command(), worker, "worker started");
        loop {
            if stage.is_killing() {
                break;
            }
            match stage.run_unit(worker) {
                Ok(Step::Continue) => {}
                Ok(Step::Finished) => break,
                Err(failure) => {
                    self.fail(failure);
                    break;
                }
            }
            self.gate.wait_open();
        }
        tracing::debug!(line = stage.line(), command = stage.command(), worker, "worker exited");
    }
}

/// Launches a compiled graph
#[derive(Debug)]
pub struct RunController {
    graph: Graph,
}

impl RunController {
    /// Wrap a compiled graph
    #[must_use]
    pub const fn new(graph: Graph) -> Self {
        Self { graph }
    }

    /// Graph about to run
    #[must_use]
    pub const fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Spawn every worker
    ///
    /// # Errors
    ///
    /// Returns error if a thread cannot be spawned; workers already started
    /// are killed and joined first
    pub fn start(self) -> Result<RunHandle, SpawnError> {
        let supervisor = Arc::new(Supervisor {
            stages: self.graph.stages().to_vec(),
            gate: PauseGate::new(),
            killed: AtomicBool::new(false),
            failure: Mutex::new(None),
        });

        let mut workers = Vec::with_capacity(self.graph.worker_count());
        for stage in &supervisor.stages {
            for worker in 0..stage.workers() {
                let spawned = {
                    let supervisor = Arc::clone(&supervisor);
                    let stage = Arc::clone(stage);
                    thread::Builder::new()
                        .name(format!("chamber-{}-{}", stage.line(), worker))
                        .spawn(move || supervisor.work(&stage, worker))
                };
                match spawned {
                    Ok(handle) => workers.push(handle),
                    Err(err) => {
                        supervisor.kill();
                        for handle in workers {
                            let _ = handle.join();
                        }
                        return Err(SpawnError {
                            line: stage.line(),
                            message: err.to_string(),
                        });
                    }
                }
            }
        }

        tracing::info!(stages = supervisor.stages.len(), workers = workers.len(), "run started");
        Ok(RunHandle { supervisor, workers })
    }
}

/// Cloneable trigger for a global kill, usable from signal handlers
#[derive(Debug, Clone)]
pub struct KillSwitch {
    supervisor: Arc<Supervisor>,
}

impl KillSwitch {
    /// Kill the run; returns false if it was already killed
    pub fn kill(&self) -> bool {
        self.supervisor.kill()
    }
}

/// Handle to a running graph
#[derive(Debug)]
pub struct RunHandle {
    supervisor: Arc<Supervisor>,
    workers: Vec<JoinHandle<()>>,
}

impl RunHandle {
    /// Hold workers at their next unit boundary; false if already paused
    pub fn pause(&self) -> bool {
        self.supervisor.gate.pause()
    }

    /// Let paused workers continue; false if not paused
    pub fn resume(&self) -> bool {
        self.supervisor.gate.resume()
    }

    /// Whether the pause gate is closed
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.supervisor.gate.is_paused()
    }

    /// Kill the run; returns false if it was already killed
    pub fn kill(&self) -> bool {
        self.supervisor.kill()
    }

    /// Whether a kill has been issued
    #[must_use]
    pub fn is_killed(&self) -> bool {
        self.supervisor.killed.load(Ordering::SeqCst)
    }

    /// Detached kill trigger
    #[must_use]
    pub fn kill_switch(&self) -> KillSwitch {
        KillSwitch {
            supervisor: Arc::clone(&self.supervisor),
        }
    }

    /// Whether any worker thread is still alive
    #[must_use]
    pub fn is_working(&self) -> bool {
        self.workers.iter().any(|w| !w.is_finished())
    }

    /// Forward a tokenized control line to every stage
    pub fn control(&self, tokens: &[String]) {
        for stage in &self.supervisor.stages {
            stage.control(tokens);
        }
    }

    /// Join every worker and report how the run ended
    #[must_use]
    pub fn wait(self) -> RunReport {
        for handle in self.workers {
            if handle.join().is_err() {
                tracing::warn!("worker thread panicked outside stage logic");
            }
        }

        let stages: Vec<StageSummary> = self.supervisor.stages.iter().map(|s| StageSummary::of(s)).collect();
        let outcome = match self.supervisor.failure.lock().take() {
            Some(failure) => RunOutcome::Failed(failure),
            None if self.supervisor.killed.load(Ordering::SeqCst) => RunOutcome::Killed,
            None => RunOutcome::Completed,
        };
        for stage in &stages {
            tracing::info!(
                line = stage.line,
                command = %stage.command,
                completed = stage.completed,
                "stage summary"
            );
        }
        tracing::info!(?outcome, "run finished");
        RunReport { outcome, stages }
    }
}
