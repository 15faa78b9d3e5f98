//! Per-material colour fix-ups applied to freshly loaded map subtrees.

use engine_core::{color_from_hex, Blending, Material, Node};

pub const ERDTREE_LEAVES: &str = "Erdtree Minor Leaves";
pub const WATER: &str = "Water";

/// Rewrite `material` in place if its name has an override. Returns true when it did.
pub fn override_material(material: &mut Material) -> bool {
    match material.name.as_deref() {
        Some(ERDTREE_LEAVES) => {
            material.color = color_from_hex(0xFFFEB6);
            true
        }
        Some(WATER) => {
            log::debug!("Water material before override: {:?}", material);
            material.blending = Blending::Additive;
            material.opacity = 2.0;
            material.color = color_from_hex(0x2E86B4);
            material.metalness = 0.65;
            material.roughness = 0.25;
            true
        }
        _ => false,
    }
}

/// Apply material overrides to every node below `root`. Returns how many materials changed.
pub fn apply_material_overrides(root: &mut Node) -> usize {
    let mut changed = 0;
    root.walk_mut(|node| {
        if let Some(material) = node.material.as_mut() {
            if override_material(material) {
                changed += 1;
            }
        }
    });
    changed
}
