use std::rc::Rc;

use super::wait::Wait;
use crate::error::PlaybackError;
use crate::gate::{GateGuard, LoadGate};
use crate::media::backend::MediaBackend;
use crate::media::types::{MediaState, MediaType, RendererKind};
use crate::registry::ObjectId;

/// Inputs of a load sequence, fixed when the task starts.
#[derive(Debug, Clone)]
pub struct LoadRequest {
    pub id: ObjectId,
    pub renderer: RendererKind,
    pub locator: String,
    pub media_type: MediaType,
    pub gate_poll_secs: f32,
    pub settle_secs: f32,
}

/// Outcome of one step.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskStep {
    Pending,
    /// The player left `NotReady`; carries the state it reported.
    Prepared(MediaState),
    Failed(PlaybackError),
}

#[derive(Debug)]
enum Phase {
    Init,
    AfterInit(Wait),
    AwaitGate { backoff: Option<Wait> },
    Settle { guard: GateGuard, wait: Wait },
    Prepare,
    Done,
}

#[derive(Debug)]
pub struct LoadTask {
    request: LoadRequest,
    gate: Rc<LoadGate>,
    phase: Phase,
}

impl LoadTask {
    pub fn new(request: LoadRequest, gate: Rc<LoadGate>) -> Self {
        Self {
            request,
            gate,
            phase: Phase::Init,
        }
    }

    pub fn holds_gate(&self) -> bool {
        matches!(self.phase, Phase::Settle { .. })
    }

    /// Waiting on the gate, either backing off or about to retry.
    pub fn is_waiting_for_gate(&self) -> bool {
        matches!(self.phase, Phase::AwaitGate { .. })
    }

    pub fn is_preparing(&self) -> bool {
        matches!(self.phase, Phase::Prepare)
    }

    pub fn step(&mut self, backend: &mut dyn MediaBackend, dt: f32) -> TaskStep {
        loop {
            match std::mem::replace(&mut self.phase, Phase::Done) {
                Phase::Init => {
                    if !backend.init(self.request.renderer) {
                        return TaskStep::Failed(PlaybackError::InitializationFailure {
                            renderer: self.request.renderer,
                        });
                    }
                    log::debug!("{} initialized", self.request.id);
                    self.phase = Phase::AfterInit(Wait::Frames(1));
                    return TaskStep::Pending;
                }
                Phase::AfterInit(mut wait) => {
                    if !wait.step(dt) {
                        self.phase = Phase::AfterInit(wait);
                        return TaskStep::Pending;
                    }
                    self.phase = Phase::AwaitGate { backoff: None };
                }
                Phase::AwaitGate { backoff } => {
                    if let Some(mut wait) = backoff {
                        if !wait.step(dt) {
                            self.phase = Phase::AwaitGate {
                                backoff: Some(wait),
                            };
                            return TaskStep::Pending;
                        }
                    }
                    let Some(guard) = self.gate.try_acquire(self.request.id) else {
                        self.phase = Phase::AwaitGate {
                            backoff: Some(Wait::Seconds(self.request.gate_poll_secs)),
                        };
                        return TaskStep::Pending;
                    };

                    let loaded = backend.load(
                        &self.request.locator,
                        self.request.media_type,
                        false,
                        0.0,
                    );
                    if !loaded {
                        drop(guard);
                        return TaskStep::Failed(PlaybackError::LoadFailure {
                            locator: self.request.locator.clone(),
                            media_type: self.request.media_type,
                        });
                    }
                    log::info!("{} loaded '{}'", self.request.id, self.request.locator);

                    if self.request.settle_secs > 0.0 {
                        self.phase = Phase::Settle {
                            guard,
                            wait: Wait::Seconds(self.request.settle_secs),
                        };
                        return TaskStep::Pending;
                    }
                    drop(guard);
                    self.phase = Phase::Prepare;
                }
                Phase::Settle { guard, mut wait } => {
                    if !wait.step(dt) {
                        self.phase = Phase::Settle { guard, wait };
                        return TaskStep::Pending;
                    }
                    drop(guard);
                    self.phase = Phase::Prepare;
                }
                Phase::Prepare => {
                    let state = match MediaState::try_from(backend.status()) {
                        Ok(state) => state,
                        Err(e) => return TaskStep::Failed(e),
                    };
                    return match state {
                        MediaState::NotReady => {
                            self.phase = Phase::Prepare;
                            TaskStep::Pending
                        }
                        MediaState::Error => TaskStep::Failed(PlaybackError::LoadFailure {
                            locator: self.request.locator.clone(),
                            media_type: self.request.media_type,
                        }),
                        other => TaskStep::Prepared(other),
                    };
                }
                Phase::Done => return TaskStep::Pending,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::simulated::{SimOptions, SimulatedBackend};

    const DT: f32 = 0.1;

    fn request(id: u32, settle_secs: f32) -> LoadRequest {
        LoadRequest {
            id: ObjectId(id),
            renderer: RendererKind::Gl30,
            locator: "clip.mp4".into(),
            media_type: MediaType::OnTexture,
            gate_poll_secs: 0.5,
            settle_secs,
        }
    }

    fn backend(prepare_polls: u32) -> SimulatedBackend {
        SimulatedBackend::new(SimOptions {
            prepare_polls,
            ..SimOptions::default()
        })
    }

    #[test]
    fn init_then_load_on_next_frame() {
        let gate = LoadGate::new();
        let mut be = backend(2);
        let sim = be.handle();
        let mut task = LoadTask::new(request(1, 0.0), Rc::clone(&gate));

        assert_eq!(task.step(&mut be, DT), TaskStep::Pending);
        assert!(sim.is_inited());
        assert_eq!(sim.counters().load_calls, 0);

        // Loads and takes the first poll in the same frame
        assert_eq!(task.step(&mut be, DT), TaskStep::Pending);
        assert_eq!(sim.counters().load_calls, 1);
        assert!(task.is_preparing());
        assert!(!gate.is_locked());

        assert_eq!(task.step(&mut be, DT), TaskStep::Prepared(MediaState::Ready));
    }

    #[test]
    fn init_failure() {
        let gate = LoadGate::new();
        let mut be = backend(1);
        be.handle().fail_init();
        let mut task = LoadTask::new(request(1, 0.0), gate);
        assert!(matches!(
            task.step(&mut be, DT),
            TaskStep::Failed(PlaybackError::InitializationFailure { .. })
        ));
    }

    #[test]
    fn load_failure_releases_gate() {
        let gate = LoadGate::new();
        let mut be = backend(1);
        be.handle().fail_load();
        let mut task = LoadTask::new(request(1, 0.0), Rc::clone(&gate));
        task.step(&mut be, DT);
        assert!(matches!(
            task.step(&mut be, DT),
            TaskStep::Failed(PlaybackError::LoadFailure { .. })
        ));
        assert!(!gate.is_locked());
    }

    #[test]
    fn prepare_error_status_fails() {
        let gate = LoadGate::new();
        let mut be = backend(1);
        be.handle().fail_prepare();
        let mut task = LoadTask::new(request(1, 0.0), gate);
        task.step(&mut be, DT);
        assert!(matches!(
            task.step(&mut be, DT),
            TaskStep::Failed(PlaybackError::LoadFailure { .. })
        ));
    }

    #[test]
    fn unknown_status_is_poll_error() {
        let gate = LoadGate::new();
        let mut be = backend(5);
        be.handle().inject_status(Some(42));
        let mut task = LoadTask::new(request(1, 0.0), gate);
        task.step(&mut be, DT);
        assert_eq!(
            task.step(&mut be, DT),
            TaskStep::Failed(PlaybackError::TransientPollError(42))
        );
    }

    #[test]
    fn busy_gate_backs_off() {
        let gate = LoadGate::new();
        let blocker = gate.try_acquire(ObjectId(99)).unwrap();
        let mut be = backend(1);
        let sim = be.handle();
        let mut task = LoadTask::new(request(1, 0.0), Rc::clone(&gate));

        task.step(&mut be, DT);
        task.step(&mut be, DT);
        assert!(task.is_waiting_for_gate());
        drop(blocker);

        // Backoff of 0.5s must elapse before retrying
        for _ in 0..4 {
            assert_eq!(task.step(&mut be, DT), TaskStep::Pending);
            assert_eq!(sim.counters().load_calls, 0);
        }
        task.step(&mut be, DT);
        assert_eq!(sim.counters().load_calls, 1);
    }

    #[test]
    fn settle_keeps_gate_held() {
        let gate = LoadGate::new();
        let mut be = backend(1);
        let sim = be.handle();
        let mut task = LoadTask::new(request(1, 0.3), Rc::clone(&gate));

        task.step(&mut be, DT);
        task.step(&mut be, DT);
        assert!(task.holds_gate());
        assert_eq!(gate.holder(), Some(ObjectId(1)));

        task.step(&mut be, DT);
        task.step(&mut be, DT);
        assert!(gate.is_locked());
        // Released and first poll in the same frame
        assert_eq!(task.step(&mut be, DT), TaskStep::Prepared(MediaState::Ready));
        assert!(!gate.is_locked());
        assert_eq!(sim.counters().load_calls, 1);
    }

    #[test]
    fn dropping_task_mid_settle_releases_gate() {
        let gate = LoadGate::new();
        let mut be = backend(1);
        let mut task = LoadTask::new(request(1, 1.0), Rc::clone(&gate));
        task.step(&mut be, DT);
        task.step(&mut be, DT);
        assert!(gate.is_locked());
        drop(task);
        assert!(!gate.is_locked());
    }
}
