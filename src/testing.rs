//! In-memory stand-ins for GitHub and git used by the unit tests.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::errors::{RemoteError, Result};
use crate::github::Remote;
use crate::mirror::{mirror_dir, Mirror};
use crate::model::{Comment, Issue, Repository, User};

pub fn repository(owner: &str, name: &str) -> Repository {
    Repository {
        name: name.into(),
        full_name: Some(format!("{}/{}", owner, name)),
        owner: User {
            login: owner.into(),
        },
        ssh_url: format!("git@github.com:{}/{}.git", owner, name),
    }
}

pub fn issue(number: u64, title: &str, author: &str) -> Issue {
    Issue {
        number,
        title: title.into(),
        state: "open".into(),
        created_at: "2021-03-04T05:06:07Z".into(),
        user: User {
            login: author.into(),
        },
        labels: None,
        closed_at: None,
        closed_by: None,
        body: None,
        comments: 0,
        pull_request: None,
    }
}

pub fn comment(author: &str, body: &str) -> Comment {
    Comment {
        user: User {
            login: author.into(),
        },
        created_at: "2021-03-05T00:00:00Z".into(),
        body: Some(body.into()),
    }
}

fn simulated_failure(url: &str) -> RemoteError {
    RemoteError::Status {
        url: url.into(),
        status: hyper::StatusCode::SERVICE_UNAVAILABLE,
        body: "simulated network error".into(),
    }
}

#[derive(Default)]
pub struct FakeRemote {
    repositories: Vec<Repository>,
    issues: HashMap<String, Vec<Issue>>,
    comments: HashMap<(String, u64), Vec<Comment>>,
    fail_repositories: bool,
    fail_comments: bool,
    pub calls: Mutex<Vec<String>>,
}

impl FakeRemote {
    pub fn with_repository(mut self, repo: Repository) -> Self {
        self.repositories.push(repo);
        self
    }

    pub fn with_issue(mut self, repo: &str, issue: Issue, comments: Vec<Comment>) -> Self {
        self.comments
            .insert((repo.to_owned(), issue.number), comments);
        self.issues.entry(repo.to_owned()).or_default().push(issue);
        self
    }

    pub fn failing_repositories(mut self) -> Self {
        self.fail_repositories = true;
        self
    }

    pub fn failing_comments(mut self) -> Self {
        self.fail_comments = true;
        self
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

impl Remote for FakeRemote {
    async fn org_repositories(
        &self,
        org: &str,
    ) -> std::result::Result<Vec<Repository>, RemoteError> {
        self.record(format!("repos {}", org));
        if self.fail_repositories {
            return Err(simulated_failure(org));
        }
        Ok(self.repositories.clone())
    }

    async fn issues(
        &self,
        owner: &str,
        repo: &str,
    ) -> std::result::Result<Vec<Issue>, RemoteError> {
        self.record(format!("issues {}/{}", owner, repo));
        Ok(self.issues.get(repo).cloned().unwrap_or_default())
    }

    async fn issue_comments(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
    ) -> std::result::Result<Vec<Comment>, RemoteError> {
        self.record(format!("comments {}/{}#{}", owner, repo, number));
        if self.fail_comments {
            return Err(simulated_failure(repo));
        }
        Ok(self
            .comments
            .get(&(repo.to_owned(), number))
            .cloned()
            .unwrap_or_default())
    }
}

/// Records clone requests and creates an empty `<name>.git` directory
/// instead of running git.
#[derive(Default)]
pub struct RecordingMirror {
    pub cloned: Mutex<Vec<String>>,
    pub fail_on: Option<String>,
}

impl Mirror for RecordingMirror {
    async fn clone_mirror(&self, repo: &Repository, dest: &Path) -> Result<PathBuf> {
        self.cloned.lock().unwrap().push(repo.name.clone());
        if self.fail_on.as_deref() == Some(repo.name.as_str()) {
            return Err(crate::errors::Error::Clone {
                repo: repo.name.clone(),
                message: "exit status: 128".into(),
            });
        }
        let target = mirror_dir(dest, repo);
        std::fs::create_dir_all(&target)?;
        Ok(target)
    }
}
