//! Subset of the GitHub REST API payloads the backup needs.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub login: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Label {
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Repository {
    pub name: String,
    #[serde(default)]
    pub full_name: Option<String>,
    pub owner: User,
    pub ssh_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    pub number: u64,
    pub title: String,
    pub state: String,
    pub created_at: String,
    pub user: User,
    #[serde(default)]
    pub labels: Option<Vec<Label>>,
    #[serde(default)]
    pub closed_at: Option<String>,
    #[serde(default)]
    pub closed_by: Option<User>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub comments: u64,
    /// Set by GitHub when the issue is a pull request.
    #[serde(default)]
    pub pull_request: Option<serde_json::Value>,
}

/// Who closed an issue and when.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Closing<'a> {
    pub by: &'a str,
    pub at: Option<&'a str>,
}

impl Issue {
    /// Closing metadata, present only when GitHub recorded the closing actor.
    ///
    /// `state` is deliberately not consulted: an issue can be closed without
    /// a recorded actor, and then no closing lines are written.
    pub fn closing(&self) -> Option<Closing<'_>> {
        self.closed_by.as_ref().map(|user| Closing {
            by: &user.login,
            at: self.closed_at.as_deref(),
        })
    }

    /// Label names joined by `", "`, or `None` when there are no labels.
    pub fn label_line(&self) -> Option<String> {
        let labels = self.labels.as_ref().filter(|labels| !labels.is_empty())?;
        let names: Vec<&str> = labels.iter().map(|label| label.name.as_str()).collect();
        Some(names.join(", "))
    }

    pub fn is_pull_request(&self) -> bool {
        self.pull_request.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub user: User,
    pub created_at: String,
    #[serde(default)]
    pub body: Option<String>,
}
