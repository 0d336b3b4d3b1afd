use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use common::{clean_logical_path, join_relpath, path_segments};

use crate::organize::VaultWriter;
use crate::roots::{reserved_root, GENERAL_DIR};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkOutcome {
    Linked(PathBuf),
    AlreadyLinked(PathBuf),
    PlaylistMissing,
}

impl VaultWriter {
    pub fn playlist_dir(&self, target: &str) -> Option<PathBuf> {
        let cleaned = clean_logical_path(target)?;
        // check the first segment as the join will see it, or "./users_db"
        // slips past the reserved-name refusal
        let parts: Vec<&str> = path_segments(&cleaned).collect();
        let first = *parts.first()?;
        if reserved_root(first) && first != GENERAL_DIR {
            return None;
        }
        Some(join_relpath(self.roots.base(), &parts.join("/")))
    }

    pub fn link_into_playlist(
        &self,
        playlist_dir: &Path,
        vault_path: &Path,
    ) -> io::Result<LinkOutcome> {
        if !playlist_dir.is_dir() {
            debug!("Playlist {:?} does not exist, skipping link", playlist_dir);
            return Ok(LinkOutcome::PlaylistMissing);
        }
        let base_name = match vault_path.file_name().and_then(|n| n.to_str()) {
            Some(name) => name,
            None => return Ok(LinkOutcome::PlaylistMissing),
        };

        let slot = self.locks.slot(playlist_dir);
        let _guard = slot.lock();
        let prefix = next_prefix(playlist_dir)?;
        let link_path = playlist_dir.join(format!("{}_{}", prefix, base_name));
        if link_path.exists() {
            return Ok(LinkOutcome::AlreadyLinked(link_path));
        }
        make_reference(vault_path, &link_path)?;
        Ok(LinkOutcome::Linked(link_path))
    }
}

fn next_prefix(dir: &Path) -> io::Result<String> {
    let mut max = 0u32;
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        let head = name.split('_').next().unwrap_or(name);
        if head.len() == 4 && head.chars().all(|c| c.is_ascii_digit()) {
            if let Ok(value) = head.parse::<u32>() {
                max = max.max(value);
            }
        }
    }
    Ok(format!("{:04}", max + 1))
}

#[cfg(unix)]
fn make_reference(target: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(not(unix))]
fn make_reference(target: &Path, link: &Path) -> io::Result<()> {
    fs::hard_link(target, link)
}
