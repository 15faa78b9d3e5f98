//! glTF binary import into the viewer's scene tree.

use crate::AssetError;
use engine_core::{Material, MeshData, Node, Transform};
use glam::{Mat4, Vec3};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// Import a self-contained `.glb` file as one subtree. The returned root is named
/// after the file and holds the default scene's root nodes as children.
pub fn load_glb(path: &Path) -> Result<Node, AssetError> {
    let bytes = std::fs::read(path).map_err(|e| AssetError::Import {
        path: path.to_path_buf(),
        source: gltf::Error::Io(e),
    })?;
    load_glb_bytes(path, &bytes)
}

/// Import an in-memory `.glb`. `path` only names the root and labels errors.
pub fn load_glb_bytes(path: &Path, bytes: &[u8]) -> Result<Node, AssetError> {
    let (document, buffers, _images) = gltf::import_slice(bytes).map_err(|source| AssetError::Import {
        path: path.to_path_buf(),
        source,
    })?;

    let scene = document
        .default_scene()
        .or_else(|| document.scenes().next())
        .ok_or_else(|| AssetError::NoScene {
            path: path.to_path_buf(),
        })?;

    let mut meshes: HashMap<(usize, usize), Arc<MeshData>> = HashMap::new();
    let mut built: Vec<Option<Node>> = vec![None; document.nodes().len()];

    // Preorder walk from the scene roots; building in reverse preorder
    // guarantees every child exists before its parent is assembled.
    let mut order = Vec::new();
    let mut stack: Vec<gltf::Node> = scene.nodes().collect();
    stack.reverse();
    while let Some(node) = stack.pop() {
        let mut children: Vec<gltf::Node> = node.children().collect();
        children.reverse();
        order.push(node);
        stack.extend(children);
    }

    for gnode in order.iter().rev() {
        let mut node = Node {
            name: gnode.name().map(str::to_owned),
            transform: Transform::from_matrix(Mat4::from_cols_array_2d(&gnode.transform().matrix())),
            ..Default::default()
        };

        if let Some(mesh) = gnode.mesh() {
            let mut parts = Vec::new();
            for primitive in mesh.primitives() {
                let key = (mesh.index(), primitive.index());
                let data = match meshes.get(&key) {
                    Some(data) => data.clone(),
                    None => {
                        let data = Arc::new(read_primitive(path, &primitive, &buffers, key)?);
                        meshes.insert(key, data.clone());
                        data
                    }
                };
                parts.push((data, convert_material(&primitive.material())));
            }
            if parts.len() == 1 {
                let (data, material) = parts.remove(0);
                node.mesh = Some(data);
                node.material = Some(material);
            } else {
                for (data, material) in parts {
                    node.add(Node::new().with_mesh(data, material));
                }
            }
        }

        for child in gnode.children() {
            if let Some(child) = built[child.index()].take() {
                node.add(child);
            }
        }
        built[gnode.index()] = Some(node);
    }

    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("asset")
        .to_string();
    let mut root = Node::named(name);
    for gnode in scene.nodes() {
        if let Some(node) = built[gnode.index()].take() {
            root.add(node);
        }
    }

    log::debug!(
        "Imported {:?}: {} nodes, {} meshes",
        path,
        root.node_count(),
        meshes.len()
    );
    Ok(root)
}

fn read_primitive(
    path: &Path,
    primitive: &gltf::Primitive,
    buffers: &[gltf::buffer::Data],
    (mesh, index): (usize, usize),
) -> Result<MeshData, AssetError> {
    let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));

    let positions: Vec<Vec3> = reader
        .read_positions()
        .ok_or_else(|| AssetError::MissingPositions {
            path: path.to_path_buf(),
            mesh,
            primitive: index,
        })?
        .map(Vec3::from)
        .collect();

    let indices: Vec<u32> = match reader.read_indices() {
        Some(indices) => indices.into_u32().collect(),
        None => (0..positions.len() as u32).collect(),
    };

    let mut data = MeshData {
        positions,
        normals: Vec::new(),
        indices,
    };
    match reader.read_normals() {
        Some(normals) => data.normals = normals.map(Vec3::from).collect(),
        None => data.compute_normals(),
    }
    Ok(data)
}

/// glTF metallic-roughness material; factors are already linear.
pub fn convert_material(material: &gltf::Material) -> Material {
    let pbr = material.pbr_metallic_roughness();
    let [r, g, b, a] = pbr.base_color_factor();
    Material {
        name: material.name().map(str::to_owned),
        color: Vec3::new(r, g, b),
        opacity: a,
        metalness: pbr.metallic_factor(),
        roughness: pbr.roughness_factor(),
        emissive: Vec3::from(material.emissive_factor()),
        ..Default::default()
    }
}
