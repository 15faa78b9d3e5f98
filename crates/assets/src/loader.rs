//! Background loading of the map manifest.
//!
//! Each file is imported on its own thread and reported back over a channel.
//! The scene tree is only touched by whoever drains [`AssetLoader::poll`].

use crate::{load_glb, AssetEntry, AssetError, AssetManifest};
use anyhow::{Context, Result};
use engine_core::Node;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

#[derive(Debug)]
pub enum LoadEvent {
    Loaded { entry: AssetEntry, root: Node },
    Failed { entry: AssetEntry, error: AssetError },
}

impl LoadEvent {
    pub fn entry(&self) -> &AssetEntry {
        match self {
            LoadEvent::Loaded { entry, .. } | LoadEvent::Failed { entry, .. } => entry,
        }
    }
}

pub struct AssetLoader {
    receiver: Receiver<LoadEvent>,
    pending: Vec<AssetEntry>,
    total: usize,
    finished: usize,
    manifest: AssetManifest,
}

impl AssetLoader {
    /// Start one loader thread per manifest entry.
    pub fn spawn(manifest: &AssetManifest) -> Result<Self> {
        let (sender, receiver) = mpsc::channel();
        for entry in &manifest.entries {
            let path = manifest.path(entry);
            let label = path.display().to_string();
            let entry = entry.clone();
            let sender = sender.clone();
            thread::Builder::new()
                .name(format!("load {}", entry.file))
                .spawn(move || {
                    let event = match load_glb(&path) {
                        Ok(root) => LoadEvent::Loaded { entry, root },
                        Err(error) => LoadEvent::Failed { entry, error },
                    };
                    // The viewer may have shut down already.
                    let _ = sender.send(event);
                })
                .with_context(|| format!("spawning loader thread for {label}"))?;
        }
        log::info!("Loading {} assets from {:?}", manifest.len(), manifest.dir);
        Ok(Self {
            receiver,
            pending: manifest.entries.clone(),
            total: manifest.len(),
            finished: 0,
            manifest: manifest.clone(),
        })
    }

    /// Drain every event that has arrived, without blocking.
    pub fn poll(&mut self) -> Vec<LoadEvent> {
        let mut events = Vec::new();
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    self.record(&event);
                    events.push(event);
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    // A thread died without sending; count what is left as failed.
                    for entry in std::mem::take(&mut self.pending) {
                        let event = LoadEvent::Failed {
                            error: AssetError::Disconnected {
                                path: self.manifest.path(&entry),
                            },
                            entry,
                        };
                        self.record(&event);
                        events.push(event);
                    }
                    break;
                }
            }
        }
        events
    }

    fn record(&mut self, event: &LoadEvent) {
        self.finished += 1;
        if let Some(i) = self.pending.iter().position(|e| e == event.entry()) {
            self.pending.swap_remove(i);
        }
        match event {
            LoadEvent::Loaded { entry, root } => {
                log::info!("Loaded {} ({} nodes)", entry.file, root.node_count())
            }
            LoadEvent::Failed { entry, error } => log::warn!("Failed to load {}: {}", entry.file, error),
        }
        if self.is_complete() {
            log::info!("Asset loading complete ({} files)", self.total);
        }
    }

    /// Fraction of entries that have reported, failures included. 1.0 for an empty manifest.
    pub fn progress(&self) -> f32 {
        if self.total == 0 {
            1.0
        } else {
            self.finished as f32 / self.total as f32
        }
    }

    pub fn is_complete(&self) -> bool {
        self.finished >= self.total
    }
}
