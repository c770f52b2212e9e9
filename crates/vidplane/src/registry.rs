use std::fmt;

use crate::playback::PlaybackObject;

/// Stable identity of a playback object within a scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub u32);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "video#{}", self.0)
    }
}

/// Live playback objects of a scene, in registration order.
///
/// Registration order is the tie-breaker when several objects are hit by one
/// pick, and the order objects are ticked in.
pub struct Registry {
    objects: Vec<PlaybackObject>,
    next_id: u32,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            objects: Vec::new(),
            next_id: 1,
        }
    }

    pub fn allocate_id(&mut self) -> ObjectId {
        let id = ObjectId(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn register(&mut self, object: PlaybackObject) {
        log::debug!("Registered {}", object.id());
        self.objects.push(object);
    }

    pub fn deregister(&mut self, id: ObjectId) -> Option<PlaybackObject> {
        let index = self.objects.iter().position(|o| o.id() == id)?;
        log::debug!("Deregistered {id}");
        Some(self.objects.remove(index))
    }

    pub fn get(&self, id: ObjectId) -> Option<&PlaybackObject> {
        self.objects.iter().find(|o| o.id() == id)
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut PlaybackObject> {
        self.objects.iter_mut().find(|o| o.id() == id)
    }

    /// Registration rank of `id`, lower registered earlier.
    pub fn rank(&self, id: ObjectId) -> Option<usize> {
        self.objects.iter().position(|o| o.id() == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PlaybackObject> {
        self.objects.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut PlaybackObject> {
        self.objects.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}
