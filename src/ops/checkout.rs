use std::ffi::OsStr;
use std::fs;
use std::os::unix::ffi::OsStrExt;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use crate::error::{Error, IoResultExt, Result};
use crate::hash::Hash;
use crate::object::{self, ObjectKind, Tree};
use crate::repo::Repo;

/// materialize the working tree recorded by a commit
///
/// blobs are written with the permission bits recorded in their tree entry
/// mode. symlink and gitlink entries are skipped with a warning.
pub fn checkout(repo: &Repo, commit: &Hash, target: &Path) -> Result<()> {
    let commit = object::read_commit(repo, commit)?;
    let tree = object::read_tree(repo, &commit.tree)?;

    fs::create_dir_all(target).with_path(target)?;
    checkout_tree(repo, &tree, target)
}

/// materialize one tree level (recursive helper)
fn checkout_tree(repo: &Repo, tree: &Tree, dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).with_path(dir)?;

    for entry in tree.entries() {
        let path = dir.join(OsStr::from_bytes(&entry.name));

        if entry.mode.is_tree() {
            let subtree = object::read_tree(repo, &entry.hash)?;
            checkout_tree(repo, &subtree, &path)?;
        } else if entry.mode.is_symlink() || entry.mode.is_gitlink() {
            eprintln!(
                "warning: skipping unsupported entry {:?} (mode {})",
                path, entry.mode
            );
        } else {
            let (kind, payload) = object::read_object(repo, &entry.hash)?;
            if kind != ObjectKind::Blob {
                return Err(Error::CorruptObject(format!(
                    "expected blob, found {} at {}",
                    kind, entry.hash
                )));
            }
            fs::write(&path, &payload).with_path(&path)?;
            fs::set_permissions(&path, fs::Permissions::from_mode(entry.mode.permissions()))
                .with_path(&path)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::{commit_tree, write_tree};
    use tempfile::tempdir;

    fn test_repo() -> (tempfile::TempDir, Repo) {
        let dir = tempdir().unwrap();
        let repo_path = dir.path().join("repo");
        let repo = Repo::init(&repo_path).unwrap();
        (dir, repo)
    }

    fn snapshot(repo: &Repo) -> Hash {
        let tree = write_tree(repo, repo.path()).unwrap();
        commit_tree(repo, tree, None, "snapshot", None).unwrap()
    }

    #[test]
    fn test_checkout_roundtrip() {
        let (dir, repo) = test_repo();
        fs::create_dir_all(repo.path().join("sub")).unwrap();
        fs::write(repo.path().join("top.txt"), "top contents").unwrap();
        fs::write(repo.path().join("sub/leaf.txt"), "leaf contents").unwrap();
        let commit = snapshot(&repo);

        let target = dir.path().join("restored");
        checkout(&repo, &commit, &target).unwrap();

        assert_eq!(
            fs::read(target.join("top.txt")).unwrap(),
            b"top contents"
        );
        assert_eq!(
            fs::read(target.join("sub/leaf.txt")).unwrap(),
            b"leaf contents"
        );
    }

    #[test]
    fn test_checkout_preserves_executable_bit() {
        let (dir, repo) = test_repo();
        let script = repo.path().join("run.sh");
        fs::write(&script, "#!/bin/sh\n").unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
        let commit = snapshot(&repo);

        let target = dir.path().join("restored");
        checkout(&repo, &commit, &target).unwrap();

        let mode = fs::metadata(target.join("run.sh")).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o755);
    }

    #[test]
    fn test_checkout_empty_commit() {
        let (dir, repo) = test_repo();
        let commit = snapshot(&repo);

        let target = dir.path().join("restored");
        checkout(&repo, &commit, &target).unwrap();

        assert!(target.is_dir());
        assert_eq!(fs::read_dir(&target).unwrap().count(), 0);
    }

    #[test]
    fn test_checkout_missing_commit() {
        let (dir, repo) = test_repo();
        let missing = Hash::from_hex("0000000000000000000000000000000000000000").unwrap();

        let result = checkout(&repo, &missing, &dir.path().join("restored"));
        assert!(matches!(result, Err(Error::ObjectNotFound(_))));
    }

    #[test]
    fn test_checkout_skips_symlink_entries() {
        use crate::object::{EntryMode, Tree, TreeEntry};

        let (dir, repo) = test_repo();

        // hand-build a tree carrying a symlink entry
        let blob = object::write_object(&repo, ObjectKind::Blob, b"real").unwrap();
        let tree = Tree::new(vec![
            TreeEntry::new(EntryMode::blob(0o644), b"real.txt".to_vec(), blob),
            TreeEntry::new(
                EntryMode::from_bytes(b"120000").unwrap(),
                b"link".to_vec(),
                blob,
            ),
        ])
        .unwrap();
        let tree_hash = object::write_tree(&repo, &tree).unwrap();
        let commit = commit_tree(&repo, tree_hash, None, "with link", None).unwrap();

        let target = dir.path().join("restored");
        checkout(&repo, &commit, &target).unwrap();

        assert!(target.join("real.txt").exists());
        assert!(!target.join("link").exists());
    }
}
