use std::cell::Cell;
use std::rc::Rc;

use crate::registry::ObjectId;

/// Scene-wide lock around the native load step. Dropping the
/// [`GateGuard`] releases it.
#[derive(Debug, Default)]
pub struct LoadGate {
    holder: Cell<Option<ObjectId>>,
    acquisitions: Cell<u64>,
}

impl LoadGate {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn is_locked(&self) -> bool {
        self.holder.get().is_some()
    }

    pub fn holder(&self) -> Option<ObjectId> {
        self.holder.get()
    }

    /// Total successful acquisitions since creation.
    pub fn acquisitions(&self) -> u64 {
        self.acquisitions.get()
    }

    /// Take the gate for `id`, or `None` if anyone (including `id`) holds it.
    pub fn try_acquire(self: &Rc<Self>, id: ObjectId) -> Option<GateGuard> {
        if let Some(holder) = self.holder.get() {
            log::debug!("Load gate busy ({holder} holds it), {id} waits");
            return None;
        }
        self.holder.set(Some(id));
        self.acquisitions.set(self.acquisitions.get() + 1);
        log::debug!("Load gate acquired by {id}");
        Some(GateGuard {
            gate: Rc::clone(self),
            id,
        })
    }
}

/// Proof of holding the load gate. Releases on drop.
#[derive(Debug)]
#[must_use = "dropping the guard releases the load gate immediately"]
pub struct GateGuard {
    gate: Rc<LoadGate>,
    id: ObjectId,
}

impl GateGuard {
    pub fn holder(&self) -> ObjectId {
        self.id
    }

    pub fn release(self) {
        drop(self);
    }
}

impl Drop for GateGuard {
    fn drop(&mut self) {
        if self.gate.holder.get() == Some(self.id) {
            self.gate.holder.set(None);
            log::debug!("Load gate released by {}", self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_fails_while_held() {
        let gate = LoadGate::new();
        let guard = gate.try_acquire(ObjectId(1)).unwrap();
        assert!(gate.is_locked());
        assert!(gate.try_acquire(ObjectId(2)).is_none());
        assert!(gate.try_acquire(ObjectId(1)).is_none());
        assert_eq!(gate.holder(), Some(ObjectId(1)));
        guard.release();
        assert!(!gate.is_locked());
        assert!(gate.try_acquire(ObjectId(2)).is_some());
    }

    #[test]
    fn drop_releases() {
        let gate = LoadGate::new();
        {
            let _guard = gate.try_acquire(ObjectId(3)).unwrap();
            assert!(gate.is_locked());
        }
        assert!(!gate.is_locked());
        assert_eq!(gate.acquisitions(), 1);
    }

    #[test]
    fn guard_dropped_with_owner() {
        struct Task {
            _guard: Option<GateGuard>,
        }
        let gate = LoadGate::new();
        let task = Task {
            _guard: gate.try_acquire(ObjectId(4)),
        };
        assert!(gate.is_locked());
        drop(task);
        assert!(!gate.is_locked());
    }
}
