//! Issue and pull request archive: one text record per issue.

use std::io::Write;
use std::path::{Path, PathBuf};

use handlebars::Handlebars;
use serde::Serialize;
use tracing::debug;

use crate::errors::Result;
use crate::github::Remote;
use crate::model::{Closing, Comment, Issue, Repository};
use crate::template;

pub fn issues_dir(dest: &Path, repo: &Repository) -> PathBuf {
    dest.join(format!("{}__issues", repo.name))
}

/// File name of an issue record: the number zero-padded to six digits.
///
/// Numbers of 1,000,000 and above are written in full (seven or more digits),
/// so names stay unique but no longer share a width or sort lexically.
pub fn issue_file_name(number: u64) -> String {
    format!("{:06}.md", number)
}

#[derive(Serialize)]
struct ClosingRecord<'a> {
    by: &'a str,
    at: &'a str,
}

/// Wrapped so an empty body still counts as present in the template.
#[derive(Serialize)]
struct DescriptionRecord<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct CommentRecord<'a> {
    index: usize,
    author: &'a str,
    created_at: &'a str,
    body: &'a str,
}

#[derive(Serialize)]
struct IssueRecord<'a> {
    number: u64,
    title: &'a str,
    created_at: &'a str,
    author: &'a str,
    labels: Option<String>,
    closing: Option<ClosingRecord<'a>>,
    description: Option<DescriptionRecord<'a>>,
    comments: Vec<CommentRecord<'a>>,
}

impl<'a> IssueRecord<'a> {
    fn new(issue: &'a Issue, comments: &'a [Comment]) -> Self {
        Self {
            number: issue.number,
            title: &issue.title,
            created_at: &issue.created_at,
            author: &issue.user.login,
            labels: issue.label_line(),
            closing: issue.closing().map(|Closing { by, at }| ClosingRecord {
                by,
                at: at.unwrap_or_default(),
            }),
            description: issue.body.as_deref().map(|text| DescriptionRecord { text }),
            comments: comments
                .iter()
                .enumerate()
                .map(|(i, comment)| CommentRecord {
                    index: i + 1,
                    author: &comment.user.login,
                    created_at: &comment.created_at,
                    body: comment.body.as_deref().unwrap_or_default(),
                })
                .collect(),
        }
    }
}

/// Counts of what an archive pass wrote.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ArchiveStats {
    pub issues: usize,
    pub pull_requests: usize,
    pub comments: usize,
}

impl std::ops::AddAssign for ArchiveStats {
    fn add_assign(&mut self, other: Self) {
        self.issues += other.issues;
        self.pull_requests += other.pull_requests;
        self.comments += other.comments;
    }
}

pub struct Archiver {
    registry: Handlebars<'static>,
}

impl Archiver {
    pub fn new() -> Result<Self> {
        let mut registry = Handlebars::new();
        registry.register_escape_fn(handlebars::no_escape);
        registry.register_template_string("issue", template::TEMPLATE)?;
        Ok(Self { registry })
    }

    pub fn render(&self, issue: &Issue, comments: &[Comment]) -> Result<String> {
        Ok(self
            .registry
            .render("issue", &IssueRecord::new(issue, comments))?)
    }

    /// Writes every issue of `repo`, in API order, to `<dest>/<name>__issues`.
    pub async fn archive<R: Remote>(
        &self,
        remote: &R,
        repo: &Repository,
        dest: &Path,
    ) -> Result<ArchiveStats> {
        let dir = issues_dir(dest, repo);
        std::fs::create_dir_all(&dir)?;

        let issues = remote.issues(&repo.owner.login, &repo.name).await?;
        debug!(
            "Backing up {} issues for repo {} to {}",
            issues.len(),
            repo.name,
            dir.display()
        );

        let mut stats = ArchiveStats::default();
        for issue in &issues {
            let path = dir.join(issue_file_name(issue.number));
            let comments = remote
                .issue_comments(&repo.owner.login, &repo.name, issue.number)
                .await?;
            debug!(
                "Writing issue #{} with {} comments to {}",
                issue.number,
                comments.len(),
                path.display()
            );

            let record = self.render(issue, &comments)?;
            let mut f = std::fs::File::create(&path)?;
            f.write_all(record.as_bytes())?;
            f.sync_all()?;

            if issue.is_pull_request() {
                stats.pull_requests += 1;
            } else {
                stats.issues += 1;
            }
            stats.comments += comments.len();
        }
        Ok(stats)
    }
}
