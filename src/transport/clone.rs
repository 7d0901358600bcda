//! clone: fetch a remote's head commit as a packfile and expand it

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use reqwest::blocking::Client;

use crate::error::{IoResultExt, Result};
use crate::object;
use crate::ops;
use crate::pack;
use crate::refs;
use crate::repo::{Repo, DEFAULT_BRANCH};
use crate::transport::http;

/// clone a remote repository over smart HTTP into `target`
///
/// fetches the single commit the remote HEAD points at, expands the
/// returned packfile into loose objects, writes the branch ref, records
/// the remote in the config, and materializes the working tree.
pub fn clone(url: &str, target: &Path) -> Result<Repo> {
    let repo = Repo::init(target)?;
    let client = Client::new();

    let head = http::discover_head(&client, url)?;
    let pack_bytes = http::fetch_pack(&client, url, &head)?;

    // every object must be resolved in memory before persisting: ref-deltas
    // only need their base to appear earlier in the pack, persistence order
    // is free
    let objects = pack::unpack(&pack_bytes)?;
    for (_, object) in objects {
        object::write_object(&repo, object.kind, &object.data)?;
    }

    refs::write_ref(&repo, DEFAULT_BRANCH, &head)?;
    record_remote(&repo, url)?;

    ops::checkout(&repo, &head, repo.path())?;

    Ok(repo)
}

/// append the origin remote to the repository config
fn record_remote(repo: &Repo, url: &str) -> Result<()> {
    let config_path = repo.config_path();
    let mut config = OpenOptions::new()
        .append(true)
        .open(&config_path)
        .with_path(&config_path)?;
    write!(config, "[remote \"origin\"]\n\turl = {}\n", url).with_path(&config_path)
}
