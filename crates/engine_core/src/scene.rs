//! Scene graph: a tree of nodes carrying transforms, meshes and materials.
//!
//! Every traversal is an explicit stack walk so deep imported hierarchies never
//! grow the call stack, and so each concern (shadow flags, material overrides,
//! world-space gathering) is a visitor rather than its own recursive function.

use crate::Transform;
use glam::{Mat4, Vec3};
use std::sync::Arc;

/// Convert a `0xRRGGBB` sRGB colour to linear RGB.
pub fn color_from_hex(hex: u32) -> Vec3 {
    let channel = |shift: u32| {
        let c = ((hex >> shift) & 0xff) as f32 / 255.0;
        if c <= 0.04045 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        }
    };
    Vec3::new(channel(16), channel(8), channel(0))
}

/// CPU-side triangle mesh.
#[derive(Debug, Clone, Default)]
pub struct MeshData {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub indices: Vec<u32>,
}

impl MeshData {
    /// Fill in flat-ish vertex normals when the source had none.
    pub fn compute_normals(&mut self) {
        let mut normals = vec![Vec3::ZERO; self.positions.len()];
        for tri in self.indices.chunks_exact(3) {
            let (a, b, c) = (tri[0] as usize, tri[1] as usize, tri[2] as usize);
            if a >= normals.len() || b >= normals.len() || c >= normals.len() {
                continue;
            }
            let n = (self.positions[b] - self.positions[a])
                .cross(self.positions[c] - self.positions[a]);
            normals[a] += n;
            normals[b] += n;
            normals[c] += n;
        }
        self.normals = normals
            .into_iter()
            .map(|n| n.try_normalize().unwrap_or(Vec3::Y))
            .collect();
    }
}

/// How a surface combines with what is already in the framebuffer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Blending {
    #[default]
    Normal,
    Additive,
}

/// Surface description, a subset of glTF metallic-roughness.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub name: Option<String>,
    /// Linear RGB base colour.
    pub color: Vec3,
    pub opacity: f32,
    pub metalness: f32,
    pub roughness: f32,
    /// Linear RGB emissive colour.
    pub emissive: Vec3,
    pub blending: Blending,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: None,
            color: Vec3::ONE,
            opacity: 1.0,
            metalness: 0.0,
            roughness: 1.0,
            emissive: Vec3::ZERO,
            blending: Blending::Normal,
        }
    }
}

impl Material {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }
}

/// One node of the scene tree.
#[derive(Debug, Clone, Default)]
pub struct Node {
    pub name: Option<String>,
    pub transform: Transform,
    pub mesh: Option<Arc<MeshData>>,
    pub material: Option<Material>,
    pub cast_shadow: bool,
    pub receive_shadow: bool,
    pub children: Vec<Node>,
}

impl Node {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn with_mesh(mut self, mesh: Arc<MeshData>, material: Material) -> Self {
        self.mesh = Some(mesh);
        self.material = Some(material);
        self
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn add(&mut self, child: Node) {
        self.children.push(child);
    }

    /// Visit this node and every descendant, parents before children.
    pub fn walk(&self, mut visit: impl FnMut(&Node)) {
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            visit(node);
            stack.extend(node.children.iter().rev());
        }
    }

    /// Mutable visit of this node and every descendant, parents before children.
    pub fn walk_mut(&mut self, mut visit: impl FnMut(&mut Node)) {
        let mut stack: Vec<&mut Node> = vec![self];
        while let Some(node) = stack.pop() {
            visit(&mut *node);
            stack.extend(node.children.iter_mut().rev());
        }
    }

    /// Visit every node with its world matrix, given the matrix of this node's parent.
    pub fn walk_world(&self, parent: Mat4, mut visit: impl FnMut(&Node, Mat4)) {
        let mut stack = vec![(self, parent)];
        while let Some((node, parent)) = stack.pop() {
            let world = parent * node.transform.to_matrix();
            visit(node, world);
            for child in node.children.iter().rev() {
                stack.push((child, world));
            }
        }
    }

    /// Set shadow flags on this node and the whole subtree below it.
    pub fn set_shadow(&mut self, cast: bool, receive: bool) {
        self.walk_mut(|node| {
            node.cast_shadow = cast;
            node.receive_shadow = receive;
        });
    }

    /// Number of nodes in this subtree, including this one.
    pub fn node_count(&self) -> usize {
        let mut count = 0;
        self.walk(|_| count += 1);
        count
    }
}

/// The root of everything drawn by the viewer.
#[derive(Debug, Clone)]
pub struct Scene {
    pub root: Node,
    /// Linear RGB clear colour.
    pub background: Vec3,
    revision: u64,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    pub fn new() -> Self {
        Self {
            root: Node::named("scene"),
            background: Vec3::ZERO,
            revision: 0,
        }
    }

    /// Attach a subtree under the root.
    pub fn add(&mut self, node: Node) {
        self.root.add(node);
        self.revision += 1;
    }

    /// Bumped on every structural change; GPU caches compare against it.
    pub fn revision(&self) -> u64 {
        self.revision
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deep_tree(depth: usize) -> Node {
        let mut node = Node::named(format!("n{depth}"));
        if depth > 0 {
            node.add(deep_tree(depth - 1));
            node.add(Node::named(format!("leaf{depth}")));
        }
        node
    }

    #[test]
    fn set_shadow_reaches_every_node() {
        let mut root = deep_tree(6);
        root.set_shadow(false, true);
        let mut visited = 0;
        root.walk(|n| {
            assert!(!n.cast_shadow);
            assert!(n.receive_shadow);
            visited += 1;
        });
        assert_eq!(visited, root.node_count());
        assert_eq!(visited, 13);
    }

    #[test]
    fn walk_handles_very_deep_hierarchies() {
        let mut root = Node::named("root");
        {
            let mut cursor = &mut root;
            for i in 0..50_000 {
                cursor.add(Node::named(format!("{i}")));
                cursor = &mut cursor.children[0];
            }
        }
        assert_eq!(root.node_count(), 50_001);
        // Dropping a 50k-deep tree recursively would itself overflow; flatten first.
        let mut stack = std::mem::take(&mut root.children);
        while let Some(mut node) = stack.pop() {
            stack.append(&mut node.children);
        }
    }

    #[test]
    fn walk_world_composes_parent_transforms() {
        let mut root = Node::new().with_transform(Transform::from_position(Vec3::X));
        root.add(Node::named("child").with_transform(Transform::from_position(Vec3::Y)));

        let mut child_origin = None;
        root.walk_world(Mat4::IDENTITY, |node, world| {
            if node.name.as_deref() == Some("child") {
                child_origin = Some(world.transform_point3(Vec3::ZERO));
            }
        });
        let origin = child_origin.expect("child visited");
        assert!((origin - Vec3::new(1.0, 1.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn hex_colors_convert_to_linear() {
        assert_eq!(color_from_hex(0x000000), Vec3::ZERO);
        assert!((color_from_hex(0xffffff) - Vec3::ONE).length() < 1e-6);
        let mid = color_from_hex(0x808080);
        assert!((mid.x - 0.2158).abs() < 1e-3);
    }

    #[test]
    fn computed_normals_face_out_of_triangle() {
        let mut mesh = MeshData {
            positions: vec![Vec3::ZERO, Vec3::X, Vec3::Z],
            normals: Vec::new(),
            indices: vec![0, 2, 1],
        };
        mesh.compute_normals();
        for n in &mesh.normals {
            assert!((*n - Vec3::Y).length() < 1e-6);
        }
    }

    #[test]
    fn adding_to_scene_bumps_revision() {
        let mut scene = Scene::new();
        let before = scene.revision();
        scene.add(Node::named("tile"));
        assert_eq!(scene.revision(), before + 1);
        assert_eq!(scene.root.children.len(), 1);
    }
}
