use serde::{Deserialize, Serialize};

use crate::media::types::MediaState;
use crate::playback::wait::Wait;
use crate::registry::{ObjectId, Registry};
use crate::settings::{Capabilities, Timings};

/// Screen orientation hint handed to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    Portrait,
    LandscapeLeft,
    AutoRotation,
}

/// Display-level controls owned by the host application.
pub trait DisplayHost {
    fn set_orientation(&mut self, orientation: Orientation);

    /// Pause or resume the outer tracking subsystem while full-screen
    /// playback covers the scene.
    fn set_tracking_enabled(&mut self, enabled: bool);
}

/// Platform-dependent parameters of a full-screen hand-off.
#[derive(Debug, Clone, PartialEq)]
pub struct FullscreenPlan {
    pub orientation: Option<Orientation>,
    pub settle_secs: f32,
    pub return_frames: u32,
    pub restore_orientation: bool,
    pub restore_secs: f32,
}

impl FullscreenPlan {
    pub fn new(caps: &Capabilities, timings: &Timings) -> Self {
        Self {
            orientation: caps.fullscreen_orientation,
            settle_secs: timings.orientation_settle_secs,
            return_frames: timings.fullscreen_return_frames,
            restore_orientation: caps.restore_orientation_after_fullscreen,
            restore_secs: timings.orientation_restore_secs,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Phase {
    Start,
    AwaitFrame(Wait),
    Settle(Wait),
    Play,
    AfterPlay(Wait),
    Restore(Wait),
    ShowPlayIcon,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestStep {
    Pending,
    Done,
    /// Target vanished or became unusable.
    Dropped,
}

/// One queued full-screen hand-off, resumed every tick until done.
#[derive(Debug, Clone)]
pub struct FullscreenRequest {
    target: ObjectId,
    plan: FullscreenPlan,
    phase: Phase,
}

impl FullscreenRequest {
    pub fn new(target: ObjectId, plan: FullscreenPlan) -> Self {
        Self {
            target,
            plan,
            phase: Phase::Start,
        }
    }

    pub fn target(&self) -> ObjectId {
        self.target
    }

    /// Full-screen play has not been issued yet.
    pub fn is_before_play(&self) -> bool {
        matches!(
            self.phase,
            Phase::Start | Phase::AwaitFrame(_) | Phase::Settle(_) | Phase::Play
        )
    }

    pub fn step(
        &mut self,
        registry: &mut Registry,
        display: &mut dyn DisplayHost,
        dt: f32,
    ) -> RequestStep {
        let Some(object) = registry.get_mut(self.target) else {
            log::debug!("Full-screen target {} is gone", self.target);
            return RequestStep::Dropped;
        };
        if !object.is_enabled() {
            return RequestStep::Dropped;
        }

        loop {
            match self.phase {
                Phase::Start => {
                    if let Some(orientation) = self.plan.orientation {
                        display.set_orientation(orientation);
                    }
                    self.phase = Phase::AwaitFrame(Wait::Frames(1));
                    return RequestStep::Pending;
                }
                Phase::AwaitFrame(mut wait) => {
                    if !wait.step(dt) {
                        self.phase = Phase::AwaitFrame(wait);
                        return RequestStep::Pending;
                    }
                    self.phase = Phase::Settle(Wait::Seconds(self.plan.settle_secs));
                    return RequestStep::Pending;
                }
                Phase::Settle(mut wait) => {
                    if !wait.step(dt) {
                        self.phase = Phase::Settle(wait);
                        return RequestStep::Pending;
                    }
                    self.phase = Phase::Play;
                }
                Phase::Play => {
                    // Still loading or suspended, try again next frame
                    if object.state() == MediaState::NotReady {
                        return RequestStep::Pending;
                    }
                    if !object.play_fullscreen() {
                        log::warn!("{} could not start full-screen playback", self.target);
                    }
                    self.phase =
                        Phase::AfterPlay(Wait::Frames(self.plan.return_frames.max(1)));
                    return RequestStep::Pending;
                }
                Phase::AfterPlay(mut wait) => {
                    if !wait.step(dt) {
                        self.phase = Phase::AfterPlay(wait);
                        return RequestStep::Pending;
                    }
                    if self.plan.restore_orientation {
                        display.set_orientation(Orientation::LandscapeLeft);
                        self.phase = Phase::Restore(Wait::Seconds(self.plan.restore_secs));
                        return RequestStep::Pending;
                    }
                    self.phase = Phase::ShowPlayIcon;
                }
                Phase::Restore(mut wait) => {
                    if !wait.step(dt) {
                        self.phase = Phase::Restore(wait);
                        return RequestStep::Pending;
                    }
                    display.set_orientation(Orientation::Portrait);
                    self.phase = Phase::ShowPlayIcon;
                }
                Phase::ShowPlayIcon => {
                    object.show_play_icon();
                    self.phase = Phase::Done;
                    return RequestStep::Done;
                }
                Phase::Done => return RequestStep::Done,
            }
        }
    }
}
