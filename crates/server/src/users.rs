use std::fs;
use std::io;
use std::path::PathBuf;

use sha2::{Digest, Sha256};

use common::join_relpath;

#[derive(Debug)]
pub enum UserStoreError {
    Io(io::Error),
    AlreadyRegistered,
    NotRegistered,
    WrongPassword,
}

impl std::fmt::Display for UserStoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserStoreError::Io(err) => write!(f, "io error: {}", err),
            UserStoreError::AlreadyRegistered => write!(f, "user already registered"),
            UserStoreError::NotRegistered => write!(f, "user not registered"),
            UserStoreError::WrongPassword => write!(f, "wrong password"),
        }
    }
}

impl std::error::Error for UserStoreError {}

impl From<io::Error> for UserStoreError {
    fn from(err: io::Error) -> Self {
        UserStoreError::Io(err)
    }
}

// one {user}.txt per account, holding the hex digest of the password
#[derive(Clone)]
pub struct UserStore {
    dir: PathBuf,
}

impl UserStore {
    pub fn new(dir: PathBuf) -> Self {
        UserStore { dir }
    }

    // expects an already-sanitized username
    pub fn register(&self, user: &str, password: &str) -> Result<(), UserStoreError> {
        let path = self.credential_path(user);
        if path.exists() {
            return Err(UserStoreError::AlreadyRegistered);
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, hash_password(password))?;
        Ok(())
    }

    pub fn verify(&self, user: &str, password: &str) -> Result<(), UserStoreError> {
        let path = self.credential_path(user);
        if !path.is_file() {
            return Err(UserStoreError::NotRegistered);
        }
        let stored = fs::read_to_string(&path)?;
        if stored.trim() == hash_password(password) {
            Ok(())
        } else {
            Err(UserStoreError::WrongPassword)
        }
    }

    fn credential_path(&self, user: &str) -> PathBuf {
        join_relpath(&self.dir, &format!("{}.txt", user))
    }
}

fn hash_password(password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password);
    format!("{:x}", hasher.finalize())
}
