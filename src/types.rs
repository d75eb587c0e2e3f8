// Shared value types: identities, collision categories, bounding volumes, queued commands

use glam::{Mat4, Vec3};
use std::fmt;

/// Stable identity of an actor within one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActorId(pub u32);

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Collision category tag, selects the narrow-phase test and resolution policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    NonColliding,
    PlayerTank,
    AiTank,
    Building,
    Shell,
    Missile,
}

impl Category {
    pub fn is_projectile(self) -> bool {
        matches!(self, Category::Shell | Category::Missile)
    }
}

/// Which weapon a projectile came from. Fixes its damage and speed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectileKind {
    Shell,
    Missile,
}

/// World-space bounding sphere of a dynamic actor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingSphere {
    pub center: Vec3,
    pub radius: f32,
}

impl BoundingSphere {
    pub fn intersects(&self, other: &BoundingSphere) -> bool {
        let reach = self.radius + other.radius;
        self.center.distance_squared(other.center) <= reach * reach
    }
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(a: Vec3, b: Vec3) -> Self {
        Aabb {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Smallest box containing both boxes.
    pub fn merge(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// The eight corners, bottom face first, each face ordered min-x/min-z first.
    pub fn corners(&self) -> [Vec3; 8] {
        let (lo, hi) = (self.min, self.max);
        [
            Vec3::new(lo.x, lo.y, lo.z),
            Vec3::new(hi.x, lo.y, lo.z),
            Vec3::new(hi.x, lo.y, hi.z),
            Vec3::new(lo.x, lo.y, hi.z),
            Vec3::new(lo.x, hi.y, lo.z),
            Vec3::new(hi.x, hi.y, lo.z),
            Vec3::new(hi.x, hi.y, hi.z),
            Vec3::new(lo.x, hi.y, hi.z),
        ]
    }

    /// Box enclosing this box after an affine transform.
    pub fn transformed(&self, transform: &Mat4) -> Aabb {
        let corners = self.corners();
        let first = transform.transform_point3(corners[0]);
        corners[1..].iter().fold(Aabb::new(first, first), |acc, c| {
            let p = transform.transform_point3(*c);
            Aabb {
                min: acc.min.min(p),
                max: acc.max.max(p),
            }
        })
    }

    /// Point-in-rectangle test on the XZ plane with the rectangle grown by `inflate`.
    pub fn contains_xz_inflated(&self, point: Vec3, inflate: f32) -> bool {
        point.x >= self.min.x - inflate
            && point.x <= self.max.x + inflate
            && point.z >= self.min.z - inflate
            && point.z <= self.max.z + inflate
    }

    /// Slab test for the segment `from -> to`. Returns true if any part of the
    /// segment lies inside the box.
    pub fn intersects_segment(&self, from: Vec3, to: Vec3) -> bool {
        let dir = to - from;
        let mut t_min = 0.0_f32;
        let mut t_max = 1.0_f32;

        for axis in 0..3 {
            let origin = from[axis];
            let delta = dir[axis];
            let (lo, hi) = (self.min[axis], self.max[axis]);
            if delta.abs() < 1e-9 {
                // Parallel to this slab: must already be inside it
                if origin < lo || origin > hi {
                    return false;
                }
                continue;
            }
            let inv = 1.0 / delta;
            let t1 = (lo - origin) * inv;
            let t2 = (hi - origin) * inv;
            t_min = t_min.max(t1.min(t2));
            t_max = t_max.min(t1.max(t2));
            if t_min > t_max {
                return false;
            }
        }
        true
    }
}

/// Plane in Hessian normal form: `normal . p == offset` for points on the plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    pub normal: Vec3,
    pub offset: f32,
}

impl Plane {
    /// Plane through three points, `None` if they are (nearly) collinear.
    pub fn from_points(a: Vec3, b: Vec3, c: Vec3) -> Option<Plane> {
        let normal = (b - a).cross(c - a);
        if normal.length_squared() < 1e-12 {
            return None;
        }
        let normal = normal.normalize();
        Some(Plane {
            normal,
            offset: normal.dot(a),
        })
    }

    pub fn signed_distance(&self, point: Vec3) -> f32 {
        self.normal.dot(point) - self.offset
    }

    /// Same plane with the normal pointing away from `point`.
    pub fn away_from(self, point: Vec3) -> Plane {
        if self.signed_distance(point) > 0.0 {
            Plane {
                normal: -self.normal,
                offset: -self.offset,
            }
        } else {
            self
        }
    }
}

/// Work produced during a tick that must be carried out once the pass that
/// produced it has finished.
#[derive(Debug, Clone, PartialEq)]
pub enum ArenaCommand {
    Fire { shooter: ActorId, kind: ProjectileKind, direction: Vec3 },
    TankDestroyed { id: ActorId, category: Category },
}

/// Notifications for the audio/particle/HUD collaborators.
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    ProjectileFired { shooter: ActorId, kind: ProjectileKind, position: Vec3 },
    Explosion { position: Vec3, kind: ProjectileKind },
    TankDamaged { id: ActorId, health: f32 },
    TankDestroyed { id: ActorId, category: Category, position: Vec3 },
    PlayerRespawned { id: ActorId },
}
