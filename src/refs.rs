use std::fs;
use std::path::PathBuf;

use crate::error::{Error, IoResultExt, Result};
use crate::hash::Hash;
use crate::repo::Repo;

/// write a branch ref (create or update)
pub fn write_ref(repo: &Repo, name: &str, hash: &Hash) -> Result<()> {
    validate_ref_name(name)?;

    let path = ref_path(repo, name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_path(parent)?;
    }

    fs::write(&path, format!("{}\n", hash.to_hex())).with_path(&path)
}

/// read a branch ref
pub fn read_ref(repo: &Repo, name: &str) -> Result<Hash> {
    let path = ref_path(repo, name);

    let content = fs::read_to_string(&path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::RefNotFound(name.to_string())
        } else {
            Error::Io { path, source: e }
        }
    })?;

    // a trailing newline is tolerated but not required
    Hash::from_hex(content.trim())
}

/// resolve a ref name or hash string to a hash
///
/// if the string looks like a hash (40 hex chars), parse it directly.
/// otherwise, look it up as a branch name.
pub fn resolve_ref(repo: &Repo, ref_or_hash: &str) -> Result<Hash> {
    if ref_or_hash.len() == 40 && ref_or_hash.chars().all(|c| c.is_ascii_hexdigit()) {
        return Hash::from_hex(ref_or_hash);
    }

    read_ref(repo, ref_or_hash)
}

fn validate_ref_name(name: &str) -> Result<()> {
    if name.is_empty() || name.starts_with('/') || name.ends_with('/') || name.contains("..") {
        return Err(Error::InvalidRef(name.to_string()));
    }
    Ok(())
}

fn ref_path(repo: &Repo, name: &str) -> PathBuf {
    repo.refs_path().join(name)
}
