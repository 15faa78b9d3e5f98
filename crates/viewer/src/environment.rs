//! Scene setup: background, starting camera, and per-asset fix-ups on load.

use assets::{apply_material_overrides, AssetEntry};
use engine_core::{color_from_hex, Node, Scene};
use glam::Vec3;
use renderer::Camera;

pub const BACKGROUND: u32 = 0x50638e;
pub const CAMERA_START: Vec3 = Vec3::new(5.0, 5.0, 5.0);

pub fn create_scene() -> Scene {
    let mut scene = Scene::new();
    scene.background = color_from_hex(BACKGROUND);
    scene
}

pub fn create_camera(width: u32, height: u32) -> Camera {
    let mut camera = Camera::new(CAMERA_START);
    camera.set_aspect(width, height);
    camera.look_at(Vec3::ZERO);
    camera
}

/// Shadow flags by asset kind, then material overrides, over the whole subtree.
pub fn prepare_asset(entry: &AssetEntry, root: &mut Node) {
    root.set_shadow(entry.kind.cast_shadow(), entry.kind.receive_shadow());
    let changed = apply_material_overrides(root);
    if changed > 0 {
        log::debug!("{}: {} material overrides", entry.file, changed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assets::AssetKind;
    use engine_core::{Material, MeshData};
    use std::sync::Arc;

    fn nested() -> Node {
        let mut leaf_parent = Node::named("inner");
        leaf_parent.add(Node::named("leaf").with_mesh(Arc::new(MeshData::default()), Material::named("Water")));
        let mut root = Node::named("root");
        root.add(leaf_parent);
        root.add(Node::named("sibling"));
        root
    }

    #[test]
    fn tiles_receive_but_never_cast() {
        let mut root = nested();
        root.walk_mut(|n| n.cast_shadow = true);
        prepare_asset(&AssetEntry::new("tiles_global.glb", AssetKind::Tiles), &mut root);
        root.walk(|n| {
            assert!(!n.cast_shadow);
            assert!(n.receive_shadow);
        });
    }

    #[test]
    fn props_get_no_shadows_and_overrides_apply() {
        let mut root = nested();
        root.walk_mut(|n| n.receive_shadow = true);
        prepare_asset(&AssetEntry::new("props_caelid.glb", AssetKind::Props), &mut root);
        let mut water_opacity = None;
        root.walk(|n| {
            assert!(!n.cast_shadow && !n.receive_shadow);
            if let Some(m) = &n.material {
                water_opacity = Some(m.opacity);
            }
        });
        assert_eq!(water_opacity, Some(2.0));
    }

    #[test]
    fn starting_view_looks_at_origin() {
        let camera = create_camera(1280, 720);
        assert_eq!(camera.position(), CAMERA_START);
        assert!((camera.forward() - (-CAMERA_START).normalize()).length() < 1e-5);
        assert_eq!(camera.fov_degrees, 65.0);
        assert_eq!(camera.far, 400.0);
        let scene = create_scene();
        assert_eq!(scene.background, color_from_hex(BACKGROUND));
    }
}
