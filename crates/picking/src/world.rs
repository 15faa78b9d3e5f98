//! Static collision world built from scene meshes.

use anyhow::{bail, Result};
use engine_core::{Mat4, Node};
use rapier3d::prelude::*;

/// World-space triangle meshes of everything that can be picked.
///
/// Nothing here is simulated: the rigid-body set stays empty and only the
/// query pipeline is used.
pub struct PickingWorld {
    pub rigid_body_set: RigidBodySet,
    pub collider_set: ColliderSet,
    pub query_pipeline: QueryPipeline,
}

impl Default for PickingWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl PickingWorld {
    pub fn new() -> Self {
        Self {
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            query_pipeline: QueryPipeline::new(),
        }
    }

    /// Add one trimesh collider per mesh node under `root`, baked to world space.
    /// Returns the number of colliders added.
    pub fn insert_subtree(&mut self, root: &Node) -> Result<usize> {
        let mut pending = Vec::new();
        root.walk_world(Mat4::IDENTITY, |node, world| {
            if let Some(mesh) = &node.mesh {
                if mesh.indices.len() >= 3 && !mesh.positions.is_empty() {
                    pending.push((node.name.clone(), world, mesh.clone()));
                }
            }
        });

        // Validate everything first so a bad mesh leaves the world untouched.
        for (name, _, mesh) in &pending {
            let count = mesh.positions.len();
            if let Some(&index) = mesh.indices.iter().find(|&&i| i as usize >= count) {
                bail!(
                    "mesh {:?} indexes vertex {} but has only {} vertices",
                    name.as_deref().unwrap_or("<unnamed>"),
                    index,
                    count
                );
            }
        }

        let added = pending.len();
        for (_, world, mesh) in pending {
            let vertices: Vec<Point<Real>> = mesh
                .positions
                .iter()
                .map(|p| {
                    let w = world.transform_point3(*p);
                    point![w.x, w.y, w.z]
                })
                .collect();
            let indices: Vec<[u32; 3]> = mesh
                .indices
                .chunks_exact(3)
                .map(|t| [t[0], t[1], t[2]])
                .collect();
            let collider = ColliderBuilder::trimesh(vertices, indices).build();
            self.collider_set.insert(collider);
        }

        self.update_query_pipeline();
        log::debug!(
            "Picking world: +{} colliders ({} total)",
            added,
            self.collider_set.len()
        );
        Ok(added)
    }

    /// Update query pipeline for raycasting.
    pub fn update_query_pipeline(&mut self) {
        self.query_pipeline.update(&self.collider_set);
    }

    pub fn collider_count(&self) -> usize {
        self.collider_set.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine_core::{Material, MeshData, Vec3};
    use std::sync::Arc;

    fn triangle(indices: Vec<u32>) -> Node {
        let mesh = MeshData {
            positions: vec![Vec3::ZERO, Vec3::X, Vec3::Z],
            normals: vec![Vec3::Y; 3],
            indices,
        };
        Node::named("tri").with_mesh(Arc::new(mesh), Material::default())
    }

    #[test]
    fn out_of_range_index_is_rejected() {
        let mut world = PickingWorld::new();
        let mut root = Node::new();
        root.add(triangle(vec![0, 1, 2]));
        root.add(triangle(vec![0, 1, 7]));

        let err = world.insert_subtree(&root).unwrap_err();
        assert!(err.to_string().contains("vertex 7"));
        assert_eq!(world.collider_count(), 0);
    }

    #[test]
    fn valid_meshes_each_get_a_collider() {
        let mut world = PickingWorld::new();
        let mut root = triangle(vec![0, 1, 2]);
        root.add(triangle(vec![0, 2, 1]));
        assert_eq!(world.insert_subtree(&root).unwrap(), 2);
        assert_eq!(world.collider_count(), 2);
    }
}
