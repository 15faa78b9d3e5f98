//! The list of map files the viewer loads at startup.

use std::path::PathBuf;

pub const TILES: [&str; 5] = [
    "tiles_limgrave.glb",
    "tiles_weeping.glb",
    "tiles_caelid.glb",
    "tiles_liurnia.glb",
    "tiles_global.glb",
];

pub const PROPS: [&str; 4] = [
    "props_limgrave.glb",
    "props_weeping.glb",
    "props_caelid.glb",
    "props_liurnia.glb",
];

pub const LEGACY_DUNGEONS: [&str; 1] = ["legacy_dungeons.glb"];

/// What a file contains; decides its shadow flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    Tiles,
    Props,
    LegacyDungeon,
}

impl AssetKind {
    pub fn cast_shadow(self) -> bool {
        false
    }

    /// Only terrain tiles receive the sun's shadow.
    pub fn receive_shadow(self) -> bool {
        matches!(self, AssetKind::Tiles)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetEntry {
    pub file: String,
    pub kind: AssetKind,
}

impl AssetEntry {
    pub fn new(file: impl Into<String>, kind: AssetKind) -> Self {
        Self {
            file: file.into(),
            kind,
        }
    }
}

/// Files to load, resolved against `dir`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetManifest {
    pub dir: PathBuf,
    pub entries: Vec<AssetEntry>,
}

impl AssetManifest {
    /// The full map: tiles, then props, then legacy dungeons.
    pub fn map(dir: impl Into<PathBuf>) -> Self {
        let entries = TILES
            .iter()
            .map(|f| AssetEntry::new(*f, AssetKind::Tiles))
            .chain(PROPS.iter().map(|f| AssetEntry::new(*f, AssetKind::Props)))
            .chain(
                LEGACY_DUNGEONS
                    .iter()
                    .map(|f| AssetEntry::new(*f, AssetKind::LegacyDungeon)),
            )
            .collect();
        Self {
            dir: dir.into(),
            entries,
        }
    }

    pub fn path(&self, entry: &AssetEntry) -> PathBuf {
        self.dir.join(&entry.file)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
