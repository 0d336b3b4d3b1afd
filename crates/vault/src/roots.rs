use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::warn;

use common::join_relpath;

pub const VAULT_DIR: &str = "Vault";
pub const GENERAL_DIR: &str = "General";
pub const UPDATES_DIR: &str = "updates";
pub const USERS_DB_DIR: &str = "users_db";
pub const SCRATCH_DIR: &str = "tmp_ingest";

pub fn reserved_root(name: &str) -> bool {
    matches!(name, VAULT_DIR | GENERAL_DIR | UPDATES_DIR | USERS_DB_DIR | SCRATCH_DIR)
}

#[derive(Clone, Debug)]
pub struct Roots {
    base: PathBuf,
}

impl Roots {
    pub fn new(base: PathBuf) -> Self {
        Roots { base }
    }

    pub fn ensure_layout(&self) -> io::Result<()> {
        for dir in [self.vault(), self.general(), self.updates(), self.users_db()] {
            fs::create_dir_all(&dir)?;
        }
        let scratch = self.scratch();
        if scratch.exists() {
            if let Err(err) = fs::remove_dir_all(&scratch) {
                warn!("Failed to sweep scratch directory {:?}: {}", scratch, err);
            }
        }
        Ok(())
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    pub fn vault(&self) -> PathBuf {
        self.base.join(VAULT_DIR)
    }

    pub fn general(&self) -> PathBuf {
        self.base.join(GENERAL_DIR)
    }

    pub fn updates(&self) -> PathBuf {
        self.base.join(UPDATES_DIR)
    }

    pub fn users_db(&self) -> PathBuf {
        self.base.join(USERS_DB_DIR)
    }

    pub fn scratch(&self) -> PathBuf {
        self.base.join(SCRATCH_DIR)
    }

    // usernames may span several segments (alice/phone)
    pub fn user_home(&self, user: &str) -> PathBuf {
        join_relpath(&self.base, user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_is_created_and_scratch_swept() {
        let tmp = tempfile::tempdir().unwrap();
        let roots = Roots::new(tmp.path().to_path_buf());
        let stale = roots.scratch().join("leftover");
        fs::create_dir_all(&stale).unwrap();
        fs::write(stale.join("half.mp3"), b"x").unwrap();

        roots.ensure_layout().unwrap();

        assert!(roots.vault().is_dir());
        assert!(roots.general().is_dir());
        assert!(roots.updates().is_dir());
        assert!(roots.users_db().is_dir());
        assert!(!roots.scratch().exists());
    }

    #[test]
    fn reserved_names_cover_every_system_root() {
        for name in ["Vault", "General", "updates", "users_db", "tmp_ingest"] {
            assert!(reserved_root(name), "{name} should be reserved");
        }
        assert!(!reserved_root("alice"));
        assert!(!reserved_root("vault"));
    }
}
