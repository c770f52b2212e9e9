//! Screen-point picking of video surfaces.
//!
//! 1. Unproject the screen point through the inverse view-projection at the
//!    near and far depth to get a world ray.
//! 2. For each surface, move the ray into the surface's local space and
//!    intersect the z = 0 plane.
//! 3. Keep hits inside the unit quad [-0.5, 0.5]² within `max_distance`,
//!    nearest first.

use glam::{Mat4, Vec2, Vec3};

use crate::registry::ObjectId;

/// Default ray length, in world units.
pub const MAX_PICK_DISTANCE: f32 = 10_000.0;

/// Maps a screen point to the playback objects under it, nearest first.
pub trait HitTester {
    fn pick(&self, point: Vec2) -> Vec<ObjectId>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    /// Unit length.
    pub direction: Vec3,
}

impl Ray {
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    /// Projection with a 0..1 depth range.
    pub view_proj: Mat4,
    /// Viewport size in pixels.
    pub viewport: Vec2,
}

impl Camera {
    pub fn new(view: Mat4, projection: Mat4, viewport: Vec2) -> Self {
        Self {
            view_proj: projection * view,
            viewport,
        }
    }

    /// Screen position of a world point, `None` when behind the camera.
    pub fn world_to_screen(&self, point: Vec3) -> Option<Vec2> {
        let clip = self.view_proj * point.extend(1.0);
        if clip.w <= 0.0 {
            return None;
        }
        let ndc = clip.truncate() / clip.w;
        Some(Vec2::new(
            (ndc.x + 1.0) * 0.5 * self.viewport.x,
            (1.0 - ndc.y) * 0.5 * self.viewport.y,
        ))
    }

    /// Ray through a screen point (pixels, origin top-left, Y down).
    pub fn screen_point_to_ray(&self, point: Vec2) -> Option<Ray> {
        if self.viewport.x <= 0.0 || self.viewport.y <= 0.0 {
            return None;
        }
        let ndc = Vec2::new(
            2.0 * point.x / self.viewport.x - 1.0,
            1.0 - 2.0 * point.y / self.viewport.y,
        );
        let inverse = self.view_proj.inverse();
        let near = inverse.project_point3(ndc.extend(0.0));
        let far = inverse.project_point3(ndc.extend(1.0));
        let direction = (far - near).normalize_or_zero();
        if direction == Vec3::ZERO || !near.is_finite() {
            return None;
        }
        Some(Ray {
            origin: near,
            direction,
        })
    }
}

/// Distance along `ray` to the unit quad placed by `transform`, if hit.
pub fn intersect_quad(ray: &Ray, transform: &Mat4) -> Option<f32> {
    let inverse = transform.inverse();
    let origin = inverse.transform_point3(ray.origin);
    let direction = inverse.transform_vector3(ray.direction);
    if direction.z.abs() < 1e-6 {
        return None;
    }
    let t = -origin.z / direction.z;
    if t < 0.0 {
        return None;
    }
    let local = origin + direction * t;
    if local.x.abs() > 0.5 || local.y.abs() > 0.5 {
        return None;
    }
    let world = transform.transform_point3(local);
    Some(world.distance(ray.origin))
}

/// Ray picker over unit quads, one per video surface.
pub struct QuadPicker {
    camera: Camera,
    quads: Vec<(ObjectId, Mat4)>,
    max_distance: f32,
}

impl QuadPicker {
    pub fn new(camera: Camera) -> Self {
        Self {
            camera,
            quads: Vec::new(),
            max_distance: MAX_PICK_DISTANCE,
        }
    }

    pub fn set_camera(&mut self, camera: Camera) {
        self.camera = camera;
    }

    /// Place or move the surface of `id`.
    pub fn set_quad(&mut self, id: ObjectId, transform: Mat4) {
        match self.quads.iter_mut().find(|(q, _)| *q == id) {
            Some((_, t)) => *t = transform,
            None => self.quads.push((id, transform)),
        }
    }

    pub fn remove(&mut self, id: ObjectId) {
        self.quads.retain(|(q, _)| *q != id);
    }
}

impl HitTester for QuadPicker {
    fn pick(&self, point: Vec2) -> Vec<ObjectId> {
        let Some(ray) = self.camera.screen_point_to_ray(point) else {
            return Vec::new();
        };
        let mut hits: Vec<(f32, ObjectId)> = self
            .quads
            .iter()
            .filter_map(|(id, transform)| {
                let distance = intersect_quad(&ray, transform)?;
                (distance <= self.max_distance).then_some((distance, *id))
            })
            .collect();
        hits.sort_by(|a, b| a.0.total_cmp(&b.0));
        log::debug!("Pick at {point:?} hit {} surfaces", hits.len());
        hits.into_iter().map(|(_, id)| id).collect()
    }
}
