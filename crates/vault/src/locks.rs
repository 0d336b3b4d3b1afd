use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

// Per-directory mutexes serializing the check-then-write sequences (dedup
// probe + move, prefix scan + link, cover probe + write). Slots are never
// evicted; the set of distinct album and playlist directories stays small.
#[derive(Clone, Default)]
pub struct DirLocks {
    inner: Arc<Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>>,
}

impl DirLocks {
    pub fn new() -> Self {
        DirLocks::default()
    }

    pub fn slot(&self, dir: &Path) -> Arc<Mutex<()>> {
        let mut map = self.inner.lock();
        map.entry(dir.to_path_buf()).or_default().clone()
    }
}
