use crate::error::{Error, Result};
use crate::object::{self, ObjectKind, Tree, TreeEntry};
use crate::repo::Repo;

/// list the entries of a tree
///
/// `target` may name a tree directly, a commit (whose root tree is listed),
/// or a branch ref resolving to a commit.
pub fn ls_tree(repo: &Repo, target: &str) -> Result<Vec<TreeEntry>> {
    let hash = crate::refs::resolve_ref(repo, target)?;

    let (kind, payload) = object::read_object(repo, &hash)?;
    let tree = match kind {
        ObjectKind::Tree => Tree::decode(&payload)?,
        ObjectKind::Commit => {
            let commit = object::Commit::decode(&payload)?;
            object::read_tree(repo, &commit.tree)?
        }
        other => {
            return Err(Error::CorruptObject(format!(
                "expected tree or commit, found {} at {}",
                other, hash
            )))
        }
    };

    Ok(tree.entries().to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::{commit_tree, write_tree};
    use std::fs;
    use tempfile::tempdir;

    fn test_repo() -> (tempfile::TempDir, Repo) {
        let dir = tempdir().unwrap();
        let repo_path = dir.path().join("repo");
        let repo = Repo::init(&repo_path).unwrap();
        (dir, repo)
    }

    #[test]
    fn test_ls_tree_by_tree_hash() {
        let (_dir, repo) = test_repo();
        fs::write(repo.path().join("b.txt"), "b").unwrap();
        fs::write(repo.path().join("a.txt"), "a").unwrap();
        let tree = write_tree(&repo, repo.path()).unwrap();

        let entries = ls_tree(&repo, &tree.to_hex()).unwrap();

        let names: Vec<_> = entries.iter().map(|e| e.name_lossy().into_owned()).collect();
        assert_eq!(names, vec!["a.txt", "b.txt"]);
    }

    #[test]
    fn test_ls_tree_by_commit_hash() {
        let (_dir, repo) = test_repo();
        fs::write(repo.path().join("file.txt"), "data").unwrap();
        let tree = write_tree(&repo, repo.path()).unwrap();
        let commit = commit_tree(&repo, tree, None, "snap", None).unwrap();

        let entries = ls_tree(&repo, &commit.to_hex()).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, b"file.txt");
    }

    #[test]
    fn test_ls_tree_display_format() {
        let (_dir, repo) = test_repo();
        fs::create_dir(repo.path().join("sub")).unwrap();
        fs::write(repo.path().join("sub/x"), "x").unwrap();
        let tree = write_tree(&repo, repo.path()).unwrap();

        let entries = ls_tree(&repo, &tree.to_hex()).unwrap();
        let line = format!("{}", entries[0]);

        assert!(line.starts_with("040000 tree "));
        assert!(line.ends_with("\tsub"));
    }

    #[test]
    fn test_ls_tree_on_blob_fails() {
        let (_dir, repo) = test_repo();
        let blob = object::write_object(&repo, ObjectKind::Blob, b"x").unwrap();

        let result = ls_tree(&repo, &blob.to_hex());
        assert!(matches!(result, Err(Error::CorruptObject(_))));
    }
}
