use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use common::ALBUM_COVER;
use metadata::{read_cover, read_tags, TrackMetadata};

use crate::locks::DirLocks;
use crate::roots::Roots;

pub const QUARANTINE_SEGMENT: &str = "Unknown";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrganizeOutcome {
    Organized(PathBuf),
    Duplicate(PathBuf),
    Quarantined(PathBuf),
}

impl OrganizeOutcome {
    pub fn path(&self) -> &Path {
        match self {
            OrganizeOutcome::Organized(path)
            | OrganizeOutcome::Duplicate(path)
            | OrganizeOutcome::Quarantined(path) => path,
        }
    }
}

// All vault mutations go through here, so the per-directory locks cover
// every check-then-write.
#[derive(Clone)]
pub struct VaultWriter {
    pub(crate) roots: Roots,
    pub(crate) locks: DirLocks,
}

impl VaultWriter {
    pub fn new(roots: Roots) -> Self {
        VaultWriter { roots, locks: DirLocks::new() }
    }

    pub fn roots(&self) -> &Roots {
        &self.roots
    }

    // never errors: anything that cannot be placed is quarantined instead
    pub fn organize(&self, temp: &Path) -> OrganizeOutcome {
        match read_tags(temp) {
            Ok(info) => {
                let meta = TrackMetadata::from_tags(&info, temp);
                self.place(temp, &meta)
            }
            Err(err) => {
                warn!("Unreadable tags in {:?} ({:?}), quarantining", temp, err);
                self.quarantine(temp)
            }
        }
    }

    fn place(&self, temp: &Path, meta: &TrackMetadata) -> OrganizeOutcome {
        let album_dir = self.roots.vault().join(&meta.artist).join(&meta.album);
        match self.place_locked(temp, meta, &album_dir) {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!("Failed to place {:?} under {:?}: {}", temp, album_dir, err);
                self.quarantine(temp)
            }
        }
    }

    fn place_locked(
        &self,
        temp: &Path,
        meta: &TrackMetadata,
        album_dir: &Path,
    ) -> io::Result<OrganizeOutcome> {
        fs::create_dir_all(album_dir)?;
        let dest = album_dir.join(meta.vault_file_name());
        let slot = self.locks.slot(album_dir);
        let _guard = slot.lock();
        if dest.exists() {
            debug!("Duplicate upload for {:?}, discarding", dest);
            if let Err(err) = fs::remove_file(temp) {
                warn!("Failed to discard duplicate {:?}: {}", temp, err);
            }
            return Ok(OrganizeOutcome::Duplicate(dest));
        }
        move_file(temp, &dest)?;
        self.ensure_cover(album_dir, &dest);
        Ok(OrganizeOutcome::Organized(dest))
    }

    // first cover wins; called with the album directory lock held
    fn ensure_cover(&self, album_dir: &Path, track: &Path) {
        let cover_path = album_dir.join(ALBUM_COVER);
        if cover_path.exists() {
            return;
        }
        match read_cover(track) {
            Ok(Some(art)) => {
                if let Err(err) = fs::write(&cover_path, &art.data) {
                    warn!("Failed to write {:?}: {}", cover_path, err);
                }
            }
            Ok(None) => {}
            Err(err) => debug!("No cover extracted from {:?}: {:?}", track, err),
        }
    }

    fn quarantine(&self, temp: &Path) -> OrganizeOutcome {
        let dir = self.roots.vault().join(QUARANTINE_SEGMENT).join(QUARANTINE_SEGMENT);
        let name = temp
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "upload.mp3".into());
        let dest = dir.join(&name);
        if let Err(err) = fs::create_dir_all(&dir) {
            warn!("Failed to create quarantine directory {:?}: {}", dir, err);
            return OrganizeOutcome::Quarantined(dest);
        }
        let slot = self.locks.slot(&dir);
        let _guard = slot.lock();
        if dest.exists() {
            debug!("Quarantine already holds {:?}, leaving the new copy", name);
        } else if let Err(err) = move_file(temp, &dest) {
            warn!("Failed to quarantine {:?}: {}", temp, err);
        }
        OrganizeOutcome::Quarantined(dest)
    }
}

// Scratch space and the vault may sit on different filesystems, so the
// rename fallback stages a copy next to the destination and renames it into
// place; the destination never appears half-written.
fn move_file(from: &Path, to: &Path) -> io::Result<()> {
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(_) => {
            let staged = stage_path(to);
            fs::copy(from, &staged)?;
            if let Err(err) = fs::rename(&staged, to) {
                let _ = fs::remove_file(&staged);
                return Err(err);
            }
            fs::remove_file(from)
        }
    }
}

fn stage_path(to: &Path) -> PathBuf {
    let mut name = std::ffi::OsString::from(".");
    name.push(to.file_name().unwrap_or_else(|| "staged".as_ref()));
    name.push(".part");
    to.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn writer(base: &Path) -> VaultWriter {
        let roots = Roots::new(base.to_path_buf());
        roots.ensure_layout().unwrap();
        VaultWriter::new(roots)
    }

    fn scratch_file(base: &Path, name: &str, contents: &[u8]) -> PathBuf {
        let dir = base.join("tmp_ingest/test");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    fn meta(artist: &str, album: &str, title: &str, track: u32) -> TrackMetadata {
        TrackMetadata {
            artist: artist.to_string(),
            album: album.to_string(),
            title: title.to_string(),
            track,
        }
    }

    #[test]
    fn files_land_at_their_canonical_path() {
        let tmp = tempfile::tempdir().unwrap();
        let w = writer(tmp.path());
        let temp = scratch_file(tmp.path(), "in.mp3", b"bytes-a");

        let outcome = w.place(&temp, &meta("Artist", "Album", "Song", 3));
        let expected = tmp.path().join("Vault/Artist/Album/03 - Song.mp3");
        assert_eq!(outcome, OrganizeOutcome::Organized(expected.clone()));
        assert_eq!(fs::read(expected).unwrap(), b"bytes-a");
        assert!(!temp.exists());
    }

    #[test]
    fn duplicate_destinations_keep_the_first_file() {
        let tmp = tempfile::tempdir().unwrap();
        let w = writer(tmp.path());
        let m = meta("Artist", "Album", "Song", 3);

        let first = scratch_file(tmp.path(), "a.mp3", b"first");
        w.place(&first, &m);

        let second = scratch_file(tmp.path(), "b.mp3", b"second");
        let outcome = w.place(&second, &m);

        let dest = tmp.path().join("Vault/Artist/Album/03 - Song.mp3");
        assert_eq!(outcome, OrganizeOutcome::Duplicate(dest.clone()));
        assert_eq!(fs::read(dest).unwrap(), b"first");
        assert!(!second.exists());
    }

    #[test]
    fn unparseable_files_are_quarantined_under_their_own_name() {
        let tmp = tempfile::tempdir().unwrap();
        let w = writer(tmp.path());
        let temp = scratch_file(tmp.path(), "garbled.mp3", b"not audio at all");

        let outcome = w.organize(&temp);
        let expected = tmp.path().join("Vault/Unknown/Unknown/garbled.mp3");
        assert_eq!(outcome, OrganizeOutcome::Quarantined(expected.clone()));
        assert!(expected.is_file());
        assert!(!temp.exists());
    }

    #[test]
    fn quarantine_never_overwrites() {
        let tmp = tempfile::tempdir().unwrap();
        let w = writer(tmp.path());
        let parked = tmp.path().join("Vault/Unknown/Unknown/track.mp3");
        fs::create_dir_all(parked.parent().unwrap()).unwrap();
        fs::write(&parked, b"already here").unwrap();

        let temp = scratch_file(tmp.path(), "track.mp3", b"newer garbage");
        let outcome = w.organize(&temp);

        assert_eq!(outcome, OrganizeOutcome::Quarantined(parked.clone()));
        assert_eq!(fs::read(parked).unwrap(), b"already here");
        // the incoming copy stays in scratch for the pipeline to sweep
        assert!(temp.exists());
    }

    #[test]
    fn existing_covers_are_never_replaced() {
        let tmp = tempfile::tempdir().unwrap();
        let w = writer(tmp.path());
        let album = tmp.path().join("Vault/Artist/Album");
        fs::create_dir_all(&album).unwrap();
        fs::write(album.join("cover.jpg"), b"original art").unwrap();

        let track = scratch_file(tmp.path(), "t.mp3", b"whatever");
        w.ensure_cover(&album, &track);

        assert_eq!(fs::read(album.join("cover.jpg")).unwrap(), b"original art");
    }

    #[test]
    fn coverless_tracks_write_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let w = writer(tmp.path());
        let album = tmp.path().join("Vault/Artist/Album");
        fs::create_dir_all(&album).unwrap();

        let track = scratch_file(tmp.path(), "t.mp3", b"no tags here");
        w.ensure_cover(&album, &track);

        assert!(!album.join("cover.jpg").exists());
    }

    #[test]
    fn move_file_relocates_and_leaves_no_staging() {
        let tmp = tempfile::tempdir().unwrap();
        let from = tmp.path().join("src.mp3");
        let to = tmp.path().join("nested/dest.mp3");
        fs::write(&from, b"payload").unwrap();
        fs::create_dir_all(to.parent().unwrap()).unwrap();

        move_file(&from, &to).unwrap();
        assert_eq!(fs::read(&to).unwrap(), b"payload");
        assert!(!from.exists());
        assert!(!to.with_file_name(".dest.mp3.part").exists());
    }

    #[test]
    fn stage_names_stay_inside_the_destination_directory() {
        let staged = stage_path(Path::new("/v/Artist/Album/03 - Song.mp3"));
        assert_eq!(staged, PathBuf::from("/v/Artist/Album/.03 - Song.mp3.part"));
    }
}
