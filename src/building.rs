// Static obstacles: world AABB merged from per-mesh boxes at load time

use crate::config;
use crate::types::Aabb;
use glam::{Mat4, Vec3};

/// Model-space bounds of one mesh plus the bone transform that places it in the model
#[derive(Debug, Clone, Copy)]
pub struct MeshBounds {
    pub aabb: Aabb,
    pub bone: Mat4,
}

/// Immutable static obstacle
#[derive(Debug, Clone, PartialEq)]
pub struct Building {
    aabb: Aabb,
}

impl Building {
    pub fn from_aabb(aabb: Aabb) -> Self {
        Building { aabb }
    }

    /// Merges every mesh box after its bone transform, then moves the result
    /// into the world. Returns `None` for a model without meshes.
    pub fn from_meshes(world: &Mat4, meshes: &[MeshBounds]) -> Option<Self> {
        let model_box = meshes
            .iter()
            .map(|mesh| mesh.aabb.transformed(&mesh.bone))
            .reduce(|acc, b| acc.merge(&b))?;
        Some(Building {
            aabb: model_box.transformed(world),
        })
    }

    pub fn aabb(&self) -> &Aabb {
        &self.aabb
    }

    pub fn center(&self) -> Vec3 {
        (self.aabb.min + self.aabb.max) * 0.5
    }

    /// Half diagonal, radius of the sphere enclosing the box
    pub fn enclosing_radius(&self) -> f32 {
        (self.aabb.max - self.aabb.min).length() * 0.5
    }

    /// Box corners a ground vehicle can touch. Roof corners above
    /// `ROOF_CORNER_HEIGHT` are left out.
    pub fn wall_corners(&self) -> Vec<Vec3> {
        self.aabb
            .corners()
            .into_iter()
            .filter(|c| c.y <= config::ROOF_CORNER_HEIGHT)
            .collect()
    }
}
