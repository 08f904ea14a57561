//! Mirror clones through the `git` executable.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use tokio::process::Command;
use tracing::debug;

use crate::errors::{Error, Result};
use crate::model::Repository;

/// Parallel submodule fetch jobs passed to `git clone -j`.
const FETCH_JOBS: u32 = 8;

/// Produces a full mirror clone of a repository below a backup root.
#[allow(async_fn_in_trait)]
pub trait Mirror {
    /// Clones `repo` into `<dest>/<name>.git` and returns that path.
    async fn clone_mirror(&self, repo: &Repository, dest: &Path) -> Result<PathBuf>;
}

pub fn mirror_dir(dest: &Path, repo: &Repository) -> PathBuf {
    dest.join(format!("{}.git", repo.name))
}

pub struct GitMirror {
    program: OsString,
}

impl GitMirror {
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn args(repo: &Repository, target: &Path) -> Vec<OsString> {
        vec![
            "clone".into(),
            "--mirror".into(),
            "--recurse-submodules".into(),
            format!("-j{}", FETCH_JOBS).into(),
            repo.ssh_url.clone().into(),
            target.as_os_str().to_owned(),
        ]
    }
}

impl Mirror for GitMirror {
    async fn clone_mirror(&self, repo: &Repository, dest: &Path) -> Result<PathBuf> {
        let target = mirror_dir(dest, repo);
        debug!("Cloning {} to {}", repo.ssh_url, target.display());

        let output = Command::new(&self.program)
            .args(Self::args(repo, &target))
            .output()
            .await
            .map_err(|e| Error::Clone {
                repo: repo.name.clone(),
                message: format!("could not run {:?}: {}", self.program, e),
            })?;

        if !output.status.success() {
            let mut message = output.status.to_string();
            for stream in [&output.stdout, &output.stderr] {
                let text = String::from_utf8_lossy(stream);
                let text = text.trim();
                if !text.is_empty() {
                    message.push('\n');
                    message.push_str(text);
                }
            }
            return Err(Error::Clone {
                repo: repo.name.clone(),
                message,
            });
        }
        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::repository;

    #[test]
    fn clone_arguments() {
        let repo = repository("acme", "widget");
        let args = GitMirror::args(&repo, Path::new("/backup/widget.git"));
        let args: Vec<_> = args.iter().map(|a| a.to_string_lossy()).collect();
        assert_eq!(
            args,
            [
                "clone",
                "--mirror",
                "--recurse-submodules",
                "-j8",
                "git@github.com:acme/widget.git",
                "/backup/widget.git",
            ]
        );
    }

    #[test]
    fn target_is_named_after_repository() {
        let repo = repository("acme", "widget");
        assert_eq!(
            mirror_dir(Path::new("/backup"), &repo),
            PathBuf::from("/backup/widget.git")
        );
    }

    #[tokio::test]
    async fn missing_executable_is_a_clone_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let mirror = GitMirror::new("org-backup-no-such-git");
        let err = mirror
            .clone_mirror(&repository("acme", "widget"), dir.path())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Clone { ref repo, .. } if repo == "widget"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn non_zero_exit_is_a_clone_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let mirror = GitMirror::new("false");
        let err = mirror
            .clone_mirror(&repository("acme", "widget"), dir.path())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Clone { .. }));
    }
}
