use std::path::PathBuf;

use common::{clean_logical_path, join_relpath, sanitize_user};

use crate::roots::{reserved_root, Roots, GENERAL_DIR};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootKind {
    General,
    User,
    Vault,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub path: PathBuf,
    pub kind: RootKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveError {
    Traversal,
    BadUser,
}

pub fn sanitize_username(raw: &str) -> Option<String> {
    // sanitize_user has already dropped dot segments, so the first segment
    // here is the one the filesystem join will use
    let user = sanitize_user(raw)?;
    let first = user.split('/').next().unwrap_or(&user);
    if reserved_root(first) {
        return None;
    }
    Some(user)
}

struct Candidate {
    kind: RootKind,
    base: PathBuf,
    rel: String,
}

impl Candidate {
    fn locate(&self) -> Option<PathBuf> {
        let path = join_relpath(&self.base, &self.rel);
        path.exists().then_some(path)
    }
}

#[derive(Clone)]
pub struct Resolver {
    roots: Roots,
}

impl Resolver {
    pub fn new(roots: Roots) -> Self {
        Resolver { roots }
    }

    // A General-prefixed directory is served from the shared root only;
    // anything else tries the user home, then the vault.
    pub fn resolve_dir(&self, user: &str, folder: &str) -> Result<Option<Resolved>, ResolveError> {
        let (user, logical) = self.validate(user, folder)?;
        let chain = match self.shared_candidate(&logical) {
            Some(shared) => vec![shared],
            None => self.private_chain(&user, &logical),
        };
        for candidate in chain {
            if let Some(path) = candidate.locate() {
                if path.is_dir() {
                    return Ok(Some(Resolved { path, kind: candidate.kind }));
                }
            }
        }
        Ok(None)
    }

    pub fn resolve_file(&self, user: &str, path: &str) -> Result<Option<Resolved>, ResolveError> {
        let (user, logical) = self.validate(user, path)?;
        let mut chain = Vec::new();
        if let Some(shared) = self.shared_candidate(&logical) {
            chain.push(shared);
        }
        chain.extend(self.private_chain(&user, &logical));
        for candidate in chain {
            if let Some(path) = candidate.locate() {
                if path.is_file() {
                    return Ok(Some(Resolved { path, kind: candidate.kind }));
                }
            }
        }
        Ok(None)
    }

    // Vault first so organized albums win over stray user copies.
    pub fn resolve_cover_target(&self, user: &str, path: &str) -> Result<Option<Resolved>, ResolveError> {
        let (user, logical) = self.validate(user, path)?;
        let chain = [
            Candidate { kind: RootKind::Vault, base: self.roots.vault(), rel: logical.clone() },
            Candidate { kind: RootKind::User, base: self.roots.user_home(&user), rel: logical },
        ];
        for candidate in chain {
            if let Some(path) = candidate.locate() {
                return Ok(Some(Resolved { path, kind: candidate.kind }));
            }
        }
        Ok(None)
    }

    fn validate(&self, user: &str, logical: &str) -> Result<(String, String), ResolveError> {
        let logical = clean_logical_path(logical).ok_or(ResolveError::Traversal)?;
        let user = sanitize_username(user).ok_or(ResolveError::BadUser)?;
        Ok((user, logical))
    }

    fn shared_candidate(&self, logical: &str) -> Option<Candidate> {
        let rel = if logical == GENERAL_DIR {
            ""
        } else {
            logical.strip_prefix(GENERAL_DIR)?.strip_prefix('/')?
        };
        Some(Candidate {
            kind: RootKind::General,
            base: self.roots.general(),
            rel: rel.to_string(),
        })
    }

    fn private_chain(&self, user: &str, logical: &str) -> Vec<Candidate> {
        vec![
            Candidate {
                kind: RootKind::User,
                base: self.roots.user_home(user),
                rel: logical.to_string(),
            },
            Candidate {
                kind: RootKind::Vault,
                base: self.roots.vault(),
                rel: logical.to_string(),
            },
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;

    fn resolver(base: &Path) -> Resolver {
        let roots = Roots::new(base.to_path_buf());
        roots.ensure_layout().unwrap();
        Resolver::new(roots)
    }

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"data").unwrap();
    }

    #[test]
    fn user_files_shadow_vault_files() {
        let tmp = tempfile::tempdir().unwrap();
        let r = resolver(tmp.path());
        touch(&tmp.path().join("alice/Mix/song.mp3"));
        touch(&tmp.path().join("Vault/Mix/song.mp3"));

        let hit = r.resolve_file("alice", "Mix/song.mp3").unwrap().unwrap();
        assert_eq!(hit.kind, RootKind::User);
        assert_eq!(hit.path, tmp.path().join("alice/Mix/song.mp3"));
    }

    #[test]
    fn vault_serves_when_user_has_no_copy() {
        let tmp = tempfile::tempdir().unwrap();
        let r = resolver(tmp.path());
        touch(&tmp.path().join("Vault/Artist/Album/01 - a.mp3"));

        let hit = r.resolve_file("alice", "Artist/Album/01 - a.mp3").unwrap().unwrap();
        assert_eq!(hit.kind, RootKind::Vault);
    }

    #[test]
    fn general_prefixed_dirs_never_fall_through() {
        let tmp = tempfile::tempdir().unwrap();
        let r = resolver(tmp.path());
        // a vault directory that happens to be named General/Chill
        fs::create_dir_all(tmp.path().join("Vault/General/Chill")).unwrap();

        assert!(r.resolve_dir("alice", "General/Chill").unwrap().is_none());

        fs::create_dir_all(tmp.path().join("General/Chill")).unwrap();
        let hit = r.resolve_dir("alice", "General/Chill").unwrap().unwrap();
        assert_eq!(hit.kind, RootKind::General);
    }

    #[test]
    fn general_root_itself_is_browsable() {
        let tmp = tempfile::tempdir().unwrap();
        let r = resolver(tmp.path());
        let hit = r.resolve_dir("alice", "General").unwrap().unwrap();
        assert_eq!(hit.kind, RootKind::General);
        assert_eq!(hit.path, tmp.path().join("General"));
    }

    #[test]
    fn streams_skip_non_file_hits() {
        let tmp = tempfile::tempdir().unwrap();
        let r = resolver(tmp.path());
        // user has a directory at the logical path, vault has the file
        fs::create_dir_all(tmp.path().join("alice/thing.mp3")).unwrap();
        touch(&tmp.path().join("Vault/thing.mp3"));

        let hit = r.resolve_file("alice", "thing.mp3").unwrap().unwrap();
        assert_eq!(hit.kind, RootKind::Vault);

        // while browse sees the user directory
        let dir = r.resolve_dir("alice", "thing.mp3").unwrap().unwrap();
        assert_eq!(dir.kind, RootKind::User);
    }

    #[test]
    fn traversal_is_rejected_before_any_probe() {
        let tmp = tempfile::tempdir().unwrap();
        let r = resolver(tmp.path());
        assert_eq!(r.resolve_file("alice", "../secret.mp3"), Err(ResolveError::Traversal));
        assert_eq!(r.resolve_dir("alice", "/etc"), Err(ResolveError::Traversal));
        assert_eq!(r.resolve_cover_target("alice", "C:\\x"), Err(ResolveError::Traversal));
    }

    #[test]
    fn reserved_and_empty_usernames_are_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let r = resolver(tmp.path());
        assert_eq!(r.resolve_dir("Vault", ""), Err(ResolveError::BadUser));
        assert_eq!(r.resolve_dir("users_db", ""), Err(ResolveError::BadUser));
        assert_eq!(r.resolve_dir("..", ""), Err(ResolveError::BadUser));
        assert_eq!(r.resolve_dir("", ""), Err(ResolveError::BadUser));
    }

    #[test]
    fn dot_segments_never_alias_reserved_roots() {
        let tmp = tempfile::tempdir().unwrap();
        let r = resolver(tmp.path());
        touch(&tmp.path().join("users_db/alice.txt"));

        // "./users_db" joins to the same place "users_db" does
        assert_eq!(r.resolve_file("./users_db", "alice.txt"), Err(ResolveError::BadUser));
        assert_eq!(r.resolve_dir("./users_db", ""), Err(ResolveError::BadUser));
        assert_eq!(r.resolve_dir("./Vault", ""), Err(ResolveError::BadUser));
        // "." alone would make the whole data root a browsable home
        assert_eq!(r.resolve_dir(".", ""), Err(ResolveError::BadUser));
        assert_eq!(sanitize_username("updates/."), None);
    }

    #[test]
    fn covers_prefer_the_vault_copy() {
        let tmp = tempfile::tempdir().unwrap();
        let r = resolver(tmp.path());
        touch(&tmp.path().join("Vault/A/B/01 - t.mp3"));
        touch(&tmp.path().join("alice/A/B/01 - t.mp3"));

        let hit = r.resolve_cover_target("alice", "A/B/01 - t.mp3").unwrap().unwrap();
        assert_eq!(hit.kind, RootKind::Vault);
    }

    #[test]
    fn missing_paths_resolve_to_none() {
        let tmp = tempfile::tempdir().unwrap();
        let r = resolver(tmp.path());
        assert!(r.resolve_file("alice", "nope.mp3").unwrap().is_none());
        assert!(r.resolve_dir("alice", "nope").unwrap().is_none());
        assert!(r.resolve_cover_target("alice", "nope.mp3").unwrap().is_none());
    }

    #[test]
    fn browse_root_prefers_user_home_when_present() {
        let tmp = tempfile::tempdir().unwrap();
        let r = resolver(tmp.path());
        let hit = r.resolve_dir("bob", "").unwrap().unwrap();
        // no home directory yet: the vault root answers
        assert_eq!(hit.kind, RootKind::Vault);

        fs::create_dir_all(tmp.path().join("bob")).unwrap();
        let hit = r.resolve_dir("bob", "").unwrap().unwrap();
        assert_eq!(hit.kind, RootKind::User);
    }
}
