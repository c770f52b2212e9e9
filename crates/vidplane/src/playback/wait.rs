/// Suspension condition of a cooperative task.
///
/// A wait created during tick N is first stepped on tick N+1, so
/// `Frames(1)` resumes on the very next frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Wait {
    Frames(u32),
    Seconds(f32),
}

/// Absorbs accumulated float error from summing frame deltas.
const SECONDS_EPSILON: f32 = 1e-4;

impl Wait {
    /// Advance by one frame of `dt` seconds. Returns true once satisfied.
    pub fn step(&mut self, dt: f32) -> bool {
        match self {
            Wait::Frames(n) => {
                *n = n.saturating_sub(1);
                *n == 0
            }
            Wait::Seconds(remaining) => {
                *remaining -= dt;
                *remaining <= SECONDS_EPSILON
            }
        }
    }
}
