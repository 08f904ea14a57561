use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("authentication error: {0}")]
    Auth(String),

    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error("mirror clone of '{repo}' failed: {message}")]
    Clone { repo: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid issue template: {0}")]
    Template(#[from] handlebars::TemplateError),

    #[error("could not render issue: {0}")]
    Render(#[from] handlebars::RenderError),

    #[error("refusing to remove '{}': not inside '{}'", path.display(), root.display())]
    UnsafeRemove { path: PathBuf, root: PathBuf },
}

/// Failure of a GitHub API call.
#[derive(Error, Debug)]
pub enum RemoteError {
    #[error("invalid request url '{url}': {message}")]
    Uri { url: String, message: String },

    #[error("request to '{url}' failed: {source}")]
    Http {
        url: String,
        #[source]
        source: hyper::Error,
    },

    #[error("request to '{url}' failed with {status}: '{body}'")]
    Status {
        url: String,
        status: hyper::StatusCode,
        body: String,
    },

    #[error("could not parse response from '{url}': {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
