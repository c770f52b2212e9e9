use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Raw pointer input in screen pixels, origin top-left.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Down(Vec2),
    Move(Vec2),
    Up(Vec2),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Gesture {
    SingleTap(Vec2),
    DoubleTap(Vec2),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GestureConfig {
    /// Pixels a touch may travel from its start and still be a tap.
    #[serde(default = "default_max_tap_movement")]
    pub max_tap_movement: f32,
    /// A touch lasting this long or longer is not a tap.
    #[serde(default = "default_max_tap_duration")]
    pub max_tap_duration: f32,
    /// Window after a tap in which a second tap makes a double tap.
    #[serde(default = "default_double_tap_window")]
    pub double_tap_window: f32,
}

fn default_max_tap_movement() -> f32 {
    40.0
}

fn default_max_tap_duration() -> f32 {
    1.0
}

fn default_double_tap_window() -> f32 {
    0.5
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            max_tap_movement: default_max_tap_movement(),
            max_tap_duration: default_max_tap_duration(),
            double_tap_window: default_double_tap_window(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Touch {
    start: Vec2,
    elapsed: f32,
    dragged: bool,
}

#[derive(Debug, Clone, Copy)]
struct PendingTap {
    position: Vec2,
    elapsed: f32,
}

/// Turns pointer events into single and double taps.
///
/// A single tap is only reported once the double-tap window has passed
/// without a second tap, so it always arrives from `update`.
pub struct TapDetector {
    config: GestureConfig,
    touch: Option<Touch>,
    pending: Option<PendingTap>,
}

impl TapDetector {
    pub fn new(config: GestureConfig) -> Self {
        Self {
            config,
            touch: None,
            pending: None,
        }
    }

    pub fn config(&self) -> &GestureConfig {
        &self.config
    }

    pub fn has_pending_tap(&self) -> bool {
        self.pending.is_some()
    }

    pub fn on_pointer(&mut self, event: PointerEvent) -> Option<Gesture> {
        match event {
            PointerEvent::Down(position) => {
                self.touch = Some(Touch {
                    start: position,
                    elapsed: 0.0,
                    dragged: false,
                });
                None
            }
            PointerEvent::Move(position) => {
                if let Some(touch) = self.touch.as_mut() {
                    if touch.start.distance(position) > self.config.max_tap_movement {
                        touch.dragged = true;
                    }
                }
                None
            }
            PointerEvent::Up(position) => {
                let touch = self.touch.take()?;
                let is_tap = !touch.dragged
                    && touch.start.distance(position) <= self.config.max_tap_movement
                    && touch.elapsed < self.config.max_tap_duration;
                if !is_tap {
                    log::debug!("Touch rejected as drag or hold");
                    return None;
                }
                if self.pending.take().is_some() {
                    return Some(Gesture::DoubleTap(position));
                }
                self.pending = Some(PendingTap {
                    position,
                    elapsed: 0.0,
                });
                None
            }
        }
    }

    /// Advance timers. Fires a buffered single tap once its window ends.
    pub fn update(&mut self, dt: f32) -> Option<Gesture> {
        if let Some(touch) = self.touch.as_mut() {
            touch.elapsed += dt;
        }
        let pending = self.pending.as_mut()?;
        pending.elapsed += dt;
        if pending.elapsed < self.config.double_tap_window {
            return None;
        }
        let position = pending.position;
        self.pending = None;
        Some(Gesture::SingleTap(position))
    }
}
