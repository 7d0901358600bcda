use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, IoResultExt, Result};

/// branch pointed at by HEAD in a freshly created repository
pub const DEFAULT_BRANCH: &str = "master";

const CORE_CONFIG: &str = "[core]\n\trepositoryformatversion = 0\n\tfilemode = true\n\tbare = false\n";

/// a grit repository: a working tree with a `.git` directory inside
pub struct Repo {
    path: PathBuf,
}

impl Repo {
    /// initialize a new repository at the given path
    pub fn init(path: &Path) -> Result<Self> {
        let git_dir = path.join(".git");
        if git_dir.exists() {
            return Err(Error::RepoExists(path.to_path_buf()));
        }

        fs::create_dir_all(git_dir.join("objects")).with_path(&git_dir)?;
        fs::create_dir_all(git_dir.join("refs/heads")).with_path(&git_dir)?;

        fs::write(
            git_dir.join("HEAD"),
            format!("ref: refs/heads/{}\n", DEFAULT_BRANCH),
        )
        .with_path(git_dir.join("HEAD"))?;
        fs::write(git_dir.join("config"), CORE_CONFIG).with_path(git_dir.join("config"))?;

        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    /// open an existing repository
    pub fn open(path: &Path) -> Result<Self> {
        if !path.join(".git").is_dir() {
            return Err(Error::NoRepo(path.to_path_buf()));
        }

        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    /// working tree root
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// path to the `.git` directory
    pub fn git_path(&self) -> PathBuf {
        self.path.join(".git")
    }

    /// path to the loose object store
    pub fn objects_path(&self) -> PathBuf {
        self.git_path().join("objects")
    }

    /// path to the branch refs directory
    pub fn refs_path(&self) -> PathBuf {
        self.git_path().join("refs/heads")
    }

    /// path to the HEAD file
    pub fn head_path(&self) -> PathBuf {
        self.git_path().join("HEAD")
    }

    /// path to the config file
    pub fn config_path(&self) -> PathBuf {
        self.git_path().join("config")
    }
}
