//! Backup orchestration: destination directory and the per-repository
//! clone-then-archive loop.

use std::path::{Component, Path, PathBuf};

use chrono::NaiveDateTime;
use tracing::{info, warn};

use crate::archive::{ArchiveStats, Archiver};
use crate::errors::{Error, Result};
use crate::github::Remote;
use crate::mirror::Mirror;

/// Directory generated backups are placed in when none is given.
pub fn project_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
}

/// `backup__<YYMMDD_HHMMSS>__<org>`
pub fn default_dir_name(org: &str, now: NaiveDateTime) -> String {
    format!("backup__{}__{}", now.format("%y%m%d_%H%M%S"), org)
}

/// Expands `~`, `$VAR` and `${VAR}` and makes the path absolute.
///
/// Unset variables expand to the empty string.
pub fn expand_path(raw: &str) -> Result<PathBuf> {
    let expanded = expand_env(raw, |name| std::env::var(name).ok());
    let path = match expanded.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => {
            let home = dirs::home_dir()
                .ok_or_else(|| Error::Config("cannot expand '~': no home directory".into()))?;
            home.join(rest.trim_start_matches('/'))
        }
        _ => PathBuf::from(expanded),
    };
    if path.is_absolute() {
        Ok(path)
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

fn expand_env(raw: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];
        let (name, tail) = if let Some(braced) = after.strip_prefix('{') {
            match braced.find('}') {
                Some(end) => (&braced[..end], &braced[end + 1..]),
                None => {
                    out.push('$');
                    rest = after;
                    continue;
                }
            }
        } else {
            let end = after
                .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                .unwrap_or(after.len());
            (&after[..end], &after[end..])
        };
        if name.is_empty() {
            out.push('$');
            rest = after;
            continue;
        }
        out.push_str(&lookup(name).unwrap_or_default());
        rest = tail;
    }
    out.push_str(rest);
    out
}

/// Removes `path` if it exists, but only when it lies strictly inside `root`.
pub fn remove_within(root: &Path, path: &Path) -> Result<()> {
    let refuse = || Error::UnsafeRemove {
        path: path.to_owned(),
        root: root.to_owned(),
    };
    let meta = match path.symlink_metadata() {
        Ok(meta) => meta,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e.into()),
    };
    let name = match path.components().last() {
        Some(Component::Normal(name)) => name,
        _ => return Err(refuse()),
    };
    let parent = path.parent().ok_or_else(refuse)?;
    let parent = if parent.as_os_str().is_empty() {
        std::env::current_dir()?
    } else {
        parent.canonicalize()?
    };
    let target = parent.join(name);
    let root = root.canonicalize()?;
    if target == root || !target.starts_with(&root) {
        return Err(refuse());
    }

    warn!("Removing existing {}", target.display());
    if meta.is_dir() {
        std::fs::remove_dir_all(&target)?;
    } else {
        std::fs::remove_file(&target)?;
    }
    Ok(())
}

/// Picks and creates the backup directory.
///
/// An explicit directory is used as given after expansion. Otherwise a
/// timestamped directory under `root` is used, replacing whatever sits at
/// that exact path.
pub fn prepare_destination(
    explicit: Option<&str>,
    org: &str,
    root: &Path,
    now: NaiveDateTime,
) -> Result<PathBuf> {
    let dest = match explicit {
        Some(dir) => expand_path(dir)?,
        None => {
            let dest = root.join(default_dir_name(org, now));
            remove_within(root, &dest)?;
            dest
        }
    };
    std::fs::create_dir_all(&dest)?;
    Ok(dest)
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub repositories: usize,
    pub archived: ArchiveStats,
}

pub struct Backup<R, M> {
    remote: R,
    mirror: M,
    archiver: Archiver,
}

impl<R: Remote, M: Mirror> Backup<R, M> {
    pub fn new(remote: R, mirror: M) -> Result<Self> {
        Ok(Self {
            remote,
            mirror,
            archiver: Archiver::new()?,
        })
    }

    /// Clones and archives every repository of `org` into `dest`, stopping at
    /// the first failure.
    pub async fn run(&self, org: &str, dest: &Path) -> Result<Summary> {
        let repos = self.remote.org_repositories(org).await?;
        info!(
            "Backing up {} repositories of {} to {}",
            repos.len(),
            org,
            dest.display()
        );

        let mut summary = Summary::default();
        for repo in &repos {
            info!(
                "Working with {}",
                repo.full_name.as_deref().unwrap_or(&repo.name)
            );
            self.mirror.clone_mirror(repo, dest).await?;
            let stats = self.archiver.archive(&self.remote, repo, dest).await?;
            info!(
                "Archived {} issues and {} pull requests ({} comments) of {}",
                stats.issues, stats.pull_requests, stats.comments, repo.name
            );
            summary.archived += stats;
            summary.repositories += 1;
        }
        Ok(summary)
    }
}
