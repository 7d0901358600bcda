use chrono::Local;

use crate::error::{Error, Result};
use crate::hash::Hash;
use crate::object::{self, Commit, Signature};
use crate::repo::Repo;

const DEFAULT_AUTHOR: &str = "grit <grit@localhost>";

/// record a commit object for an existing tree, returning its address
///
/// the identity may be given as `"Name <email>"`; timestamp and zone offset
/// are taken from the local clock.
pub fn commit_tree(
    repo: &Repo,
    tree: Hash,
    parent: Option<Hash>,
    message: &str,
    author: Option<&str>,
) -> Result<Hash> {
    // the tree must exist and actually be a tree
    object::read_tree(repo, &tree)?;

    let now = Local::now();
    let (name, email) = parse_identity(author.unwrap_or(DEFAULT_AUTHOR))?;
    let signature = Signature::new(name, email, now.timestamp(), now.format("%z").to_string());

    let commit = Commit::new(tree, parent.into_iter().collect(), signature, message);
    object::write_commit(repo, &commit)
}

/// split `"Name <email>"` into its parts
fn parse_identity(identity: &str) -> Result<(String, String)> {
    let (name, rest) = identity
        .split_once('<')
        .ok_or_else(|| Error::InvalidIdentity(identity.to_string()))?;
    let email = rest
        .strip_suffix('>')
        .ok_or_else(|| Error::InvalidIdentity(identity.to_string()))?;
    Ok((name.trim_end().to_string(), email.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::Tree;
    use tempfile::tempdir;

    fn test_repo() -> (tempfile::TempDir, Repo) {
        let dir = tempdir().unwrap();
        let repo_path = dir.path().join("repo");
        let repo = Repo::init(&repo_path).unwrap();
        (dir, repo)
    }

    fn empty_tree(repo: &Repo) -> Hash {
        object::write_tree(repo, &Tree::empty()).unwrap()
    }

    #[test]
    fn test_commit_tree_root() {
        let (_dir, repo) = test_repo();
        let tree = empty_tree(&repo);

        let hash = commit_tree(&repo, tree, None, "init", None).unwrap();

        let commit = object::read_commit(&repo, &hash).unwrap();
        assert_eq!(commit.tree, tree);
        assert!(commit.is_root());
        assert_eq!(commit.message, "init");
    }

    #[test]
    fn test_commit_tree_payload_shape() {
        let (_dir, repo) = test_repo();
        let tree = empty_tree(&repo);

        let hash = commit_tree(&repo, tree, None, "init", None).unwrap();

        let (_, payload) = object::read_object(&repo, &hash).unwrap();
        let text = String::from_utf8(payload).unwrap();
        assert!(text.starts_with(&format!("tree {}\n", tree)));
        assert!(!text.contains("parent"));
        assert!(text.ends_with("\n\ninit\n"));
    }

    #[test]
    fn test_commit_tree_with_parent() {
        let (_dir, repo) = test_repo();
        let tree = empty_tree(&repo);

        let first = commit_tree(&repo, tree, None, "first", None).unwrap();
        let second = commit_tree(&repo, tree, Some(first), "second", None).unwrap();

        let commit = object::read_commit(&repo, &second).unwrap();
        assert_eq!(commit.parents, vec![first]);
    }

    #[test]
    fn test_commit_tree_custom_author() {
        let (_dir, repo) = test_repo();
        let tree = empty_tree(&repo);

        let hash = commit_tree(
            &repo,
            tree,
            None,
            "by ada",
            Some("Ada Lovelace <ada@example.com>"),
        )
        .unwrap();

        let commit = object::read_commit(&repo, &hash).unwrap();
        assert_eq!(commit.author.name, "Ada Lovelace");
        assert_eq!(commit.author.email, "ada@example.com");
        assert_eq!(commit.committer, commit.author);
    }

    #[test]
    fn test_commit_tree_offset_format() {
        let (_dir, repo) = test_repo();
        let tree = empty_tree(&repo);

        let hash = commit_tree(&repo, tree, None, "zoned", None).unwrap();

        let commit = object::read_commit(&repo, &hash).unwrap();
        let offset = &commit.author.offset;
        assert_eq!(offset.len(), 5);
        assert!(offset.starts_with('+') || offset.starts_with('-'));
        assert!(offset[1..].chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_commit_tree_missing_tree() {
        let (_dir, repo) = test_repo();
        let missing = Hash::from_hex("0000000000000000000000000000000000000000").unwrap();

        let result = commit_tree(&repo, missing, None, "oops", None);
        assert!(matches!(result, Err(Error::ObjectNotFound(_))));
    }
}
