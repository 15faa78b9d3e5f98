//! Raycasting for pointer picking.

use crate::PickingWorld;
use engine_core::Vec3;
use rapier3d::prelude::*;

/// Result of a raycast query.
#[derive(Debug, Clone, Copy)]
pub struct RaycastHit {
    /// The collider that was hit.
    pub collider: ColliderHandle,
    /// Distance along the ray to the hit point.
    pub distance: f32,
    /// World position of the hit.
    pub point: Vec3,
    /// Surface normal at the hit point.
    pub normal: Vec3,
}

impl PickingWorld {
    /// Every hit along the ray up to `max_distance`, nearest first.
    pub fn raycast_all(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Vec<RaycastHit> {
        let ray = Ray::new(
            point![origin.x, origin.y, origin.z],
            vector![direction.x, direction.y, direction.z],
        );

        let mut hits = Vec::new();
        self.query_pipeline.intersections_with_ray(
            &self.rigid_body_set,
            &self.collider_set,
            &ray,
            max_distance,
            true,
            QueryFilter::default(),
            |collider, intersection: RayIntersection| {
                let point = ray.point_at(intersection.time_of_impact);
                hits.push(RaycastHit {
                    collider,
                    distance: intersection.time_of_impact,
                    point: Vec3::new(point.x, point.y, point.z),
                    normal: Vec3::new(
                        intersection.normal.x,
                        intersection.normal.y,
                        intersection.normal.z,
                    ),
                });
                true
            },
        );

        hits.sort_by(|a, b| a.distance.partial_cmp(&b.distance).unwrap_or(std::cmp::Ordering::Equal));
        hits
    }

    /// Nearest hit along the ray, if any.
    pub fn raycast(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<RaycastHit> {
        self.raycast_all(origin, direction, max_distance).into_iter().next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine_core::{Material, MeshData, Node, Transform};
    use std::sync::Arc;

    fn quad() -> Arc<MeshData> {
        Arc::new(MeshData {
            positions: vec![
                Vec3::new(-1.0, 0.0, -1.0),
                Vec3::new(1.0, 0.0, -1.0),
                Vec3::new(1.0, 0.0, 1.0),
                Vec3::new(-1.0, 0.0, 1.0),
            ],
            normals: vec![Vec3::Y; 4],
            indices: vec![0, 2, 1, 0, 3, 2],
        })
    }

    fn floor_at(y: f32) -> Node {
        Node::new()
            .with_mesh(quad(), Material::default())
            .with_transform(Transform::from_position(Vec3::new(0.0, y, 0.0)))
    }

    #[test]
    fn ray_hits_floor_below() {
        let mut world = PickingWorld::new();
        let mut root = Node::new();
        root.add(floor_at(0.0));
        assert_eq!(world.insert_subtree(&root).unwrap(), 1);

        let hit = world.raycast(Vec3::new(0.2, 5.0, 0.3), -Vec3::Y, 100.0).unwrap();
        assert!((hit.distance - 5.0).abs() < 1e-4);
        assert!((hit.point - Vec3::new(0.2, 0.0, 0.3)).length() < 1e-4);
        assert!((hit.normal.y.abs() - 1.0).abs() < 1e-4);
    }

    #[test]
    fn hits_are_sorted_nearest_first() {
        let mut world = PickingWorld::new();
        let mut root = Node::new();
        root.add(floor_at(-3.0));
        root.add(floor_at(1.0));
        world.insert_subtree(&root).unwrap();

        let hits = world.raycast_all(Vec3::new(0.0, 10.0, 0.0), -Vec3::Y, 100.0);
        assert_eq!(hits.len(), 2);
        assert!((hits[0].distance - 9.0).abs() < 1e-4);
        assert!((hits[1].distance - 13.0).abs() < 1e-4);
    }

    #[test]
    fn miss_and_range_limit() {
        let mut world = PickingWorld::new();
        world.insert_subtree(&floor_at(0.0)).unwrap();
        assert!(world.raycast(Vec3::new(5.0, 5.0, 5.0), -Vec3::Y, 100.0).is_none());
        assert!(world.raycast(Vec3::new(0.0, 5.0, 0.0), -Vec3::Y, 2.0).is_none());
    }

    #[test]
    fn nodes_without_meshes_are_skipped() {
        let mut world = PickingWorld::new();
        assert_eq!(world.insert_subtree(&Node::named("empty")).unwrap(), 0);
        assert!(world.raycast_all(Vec3::Y, -Vec3::Y, 10.0).is_empty());
    }
}
