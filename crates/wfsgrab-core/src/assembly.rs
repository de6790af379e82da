//! Ordered folding of window results into one layer collection.
//!
//! Records either stay in memory or, with a spool directory, are parked as
//! `<stem>_chunk_<start>.geojson` files until [`Assembly::finish`] reads them
//! back. Chunk files never outlive the assembly that created them.

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, warn};

use wfsgrab_store::collection::{read_features, write_features};
use wfsgrab_store::output_stem;

use crate::domain::{LayerName, Window};

enum Staged {
    Memory(Vec<Value>),
    Chunk { window: Window, path: PathBuf },
}

/// Result of folding every pushed window.
#[derive(Debug, Default)]
pub struct Assembled {
    pub features: Vec<Value>,
    /// Windows whose chunk file could not be written or read back.
    pub lost: Vec<Window>,
}

pub struct Assembly {
    layer: LayerName,
    spool_dir: Option<PathBuf>,
    staged: Vec<Staged>,
    collected: u64,
    lost: Vec<Window>,
}

impl Assembly {
    pub fn in_memory(layer: LayerName) -> Self {
        Self::new(layer, None)
    }

    pub fn spooled(layer: LayerName, spool_dir: impl Into<PathBuf>) -> Self {
        Self::new(layer, Some(spool_dir.into()))
    }

    pub fn new(layer: LayerName, spool_dir: Option<PathBuf>) -> Self {
        Self {
            layer,
            spool_dir,
            staged: Vec::new(),
            collected: 0,
            lost: Vec::new(),
        }
    }

    /// Records staged so far, not counting lost chunks.
    pub fn collected(&self) -> u64 {
        self.collected
    }

    /// Stages `features` fetched for `window`. Must be called in window order.
    pub fn push(&mut self, window: Window, features: Vec<Value>) {
        if features.is_empty() {
            return;
        }
        let len = features.len() as u64;

        let Some(dir) = self.spool_dir.as_deref() else {
            self.collected += len;
            self.staged.push(Staged::Memory(features));
            return;
        };

        let path = dir.join(format!(
            "{}_chunk_{}.geojson",
            output_stem(self.layer.as_str()),
            window.start
        ));
        let written = std::fs::create_dir_all(dir)
            .map_err(|error| error.to_string())
            .and_then(|()| write_features(&path, &features).map_err(|error| error.to_string()));

        match written {
            Ok(()) => {
                debug!(layer = %self.layer, %window, path = %path.display(), "chunk spooled");
                self.collected += len;
                self.staged.push(Staged::Chunk { window, path });
            }
            Err(error) => {
                warn!(layer = %self.layer, %window, %error, "failed to spool chunk");
                remove_chunk(&path);
                self.lost.push(window);
            }
        }
    }

    /// Concatenates every staged window in push order and removes the chunk
    /// files.
    pub fn finish(mut self) -> Assembled {
        let mut assembled = Assembled {
            features: Vec::with_capacity(usize::try_from(self.collected).unwrap_or(0)),
            lost: std::mem::take(&mut self.lost),
        };

        for staged in std::mem::take(&mut self.staged) {
            match staged {
                Staged::Memory(features) => assembled.features.extend(features),
                Staged::Chunk { window, path } => {
                    match read_features(&path) {
                        Ok(features) => assembled.features.extend(features),
                        Err(error) => {
                            warn!(layer = %self.layer, %window, %error, "failed to read back chunk");
                            assembled.lost.push(window);
                        }
                    }
                    remove_chunk(&path);
                }
            }
        }

        assembled.lost.sort_unstable();
        assembled
    }
}

impl Drop for Assembly {
    fn drop(&mut self) {
        for staged in &self.staged {
            if let Staged::Chunk { path, .. } = staged {
                remove_chunk(path);
            }
        }
    }
}

fn remove_chunk(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => {}
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => {}
        Err(error) => warn!(path = %path.display(), %error, "failed to remove chunk file"),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn layer() -> LayerName {
        LayerName::parse("ns:roads").expect("valid")
    }

    fn records(range: std::ops::Range<u64>) -> Vec<Value> {
        range.map(|id| json!({ "id": id })).collect()
    }

    fn spool_entries(dir: &Path) -> usize {
        std::fs::read_dir(dir).map(|entries| entries.count()).unwrap_or(0)
    }

    #[test]
    fn memory_assembly_keeps_window_order() {
        let mut assembly = Assembly::in_memory(layer());
        assembly.push(Window::new(0, 3), records(0..3));
        assembly.push(Window::new(3, 3), Vec::new());
        assembly.push(Window::new(6, 2), records(6..8));
        assert_eq!(assembly.collected(), 5);

        let assembled = assembly.finish();
        let mut expected = records(0..3);
        expected.extend(records(6..8));
        assert_eq!(assembled.features, expected);
        assert!(assembled.lost.is_empty());
    }

    #[test]
    fn spooled_chunks_are_folded_then_removed() {
        let dir = tempfile::tempdir().expect("tempdir");
        let spool = dir.path().join("spool");
        let mut assembly = Assembly::spooled(layer(), &spool);
        assembly.push(Window::new(0, 4), records(0..4));
        assembly.push(Window::new(4, 4), records(4..8));
        assert_eq!(spool_entries(&spool), 2);

        let assembled = assembly.finish();

        assert_eq!(assembled.features, records(0..8));
        assert!(assembled.lost.is_empty());
        assert_eq!(spool_entries(&spool), 0);
    }

    #[test]
    fn unreadable_chunk_is_lost_and_still_removed() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut assembly = Assembly::spooled(layer(), dir.path());
        assembly.push(Window::new(0, 2), records(0..2));
        assembly.push(Window::new(2, 2), records(2..4));
        std::fs::write(dir.path().join("ns_roads_chunk_2.geojson"), "{broken")
            .expect("corrupt chunk");

        let assembled = assembly.finish();

        assert_eq!(assembled.features, records(0..2));
        assert_eq!(assembled.lost, vec![Window::new(2, 2)]);
        assert_eq!(spool_entries(dir.path()), 0);
    }

    #[test]
    fn unwritable_spool_loses_the_window() {
        let dir = tempfile::tempdir().expect("tempdir");
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "").expect("create file");
        let mut assembly = Assembly::spooled(layer(), &blocker);

        assembly.push(Window::new(0, 2), records(0..2));

        assert_eq!(assembly.collected(), 0);
        let assembled = assembly.finish();
        assert!(assembled.features.is_empty());
        assert_eq!(assembled.lost, vec![Window::new(0, 2)]);
    }

    #[test]
    fn dropped_assembly_cleans_up_chunks() {
        let dir = tempfile::tempdir().expect("tempdir");
        {
            let mut assembly = Assembly::spooled(layer(), dir.path());
            assembly.push(Window::new(0, 2), records(0..2));
            assert_eq!(spool_entries(dir.path()), 1);
        }
        assert_eq!(spool_entries(dir.path()), 0);
    }
}
