use headers::authorization::Bearer;
use headers::{Authorization, HeaderMapExt, UserAgent};
use hyper::client::HttpConnector;
use hyper::header::{HeaderValue, ACCEPT, LINK};
use hyper::{Body, Client, Method, Request, Uri};
use hyper_tls::HttpsConnector;
use tracing::debug;

use crate::errors::{Error, RemoteError, Result};
use crate::model;

/// GitHub never returns more than this many items per page.
const PER_PAGE: u32 = 100;

pub const API_ENDPOINT: &str = "https://api.github.com";

/// Listing operations of the hosting API. Implementations hide pagination:
/// every call returns the complete sequence in API order.
#[allow(async_fn_in_trait)]
pub trait Remote {
    async fn org_repositories(
        &self,
        org: &str,
    ) -> std::result::Result<Vec<model::Repository>, RemoteError>;

    async fn issues(
        &self,
        owner: &str,
        repo: &str,
    ) -> std::result::Result<Vec<model::Issue>, RemoteError>;

    async fn issue_comments(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
    ) -> std::result::Result<Vec<model::Comment>, RemoteError>;
}

pub struct Github {
    client: Client<HttpsConnector<HttpConnector>>,
    user_agent: UserAgent,
    token: Authorization<Bearer>,
    endpoint: String,
}

impl Github {
    pub fn new(token: &str, endpoint: &str) -> Result<Self> {
        if token.is_empty() {
            return Err(Error::Auth("empty access token".into()));
        }
        let token = Authorization::bearer(token)
            .map_err(|_| Error::Auth("access token is not a valid header value".into()))?;
        Ok(Self {
            client: Client::builder().build(HttpsConnector::new()),
            user_agent: UserAgent::from_static(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            )),
            token,
            endpoint: endpoint.trim_end_matches('/').to_owned(),
        })
    }

    /// Fetches one page, returning its items and the url of the next page.
    async fn get_page<T>(&self, url: &str) -> std::result::Result<(Vec<T>, Option<String>), RemoteError>
    where
        T: serde::de::DeserializeOwned,
    {
        let uri: Uri = url.parse().map_err(|e: hyper::http::uri::InvalidUri| RemoteError::Uri {
            url: url.to_owned(),
            message: e.to_string(),
        })?;
        let mut req = Request::builder()
            .method(Method::GET)
            .uri(uri)
            .body(Body::empty())
            .map_err(|e| RemoteError::Uri {
                url: url.to_owned(),
                message: e.to_string(),
            })?;
        let headers = req.headers_mut();
        headers.typed_insert(self.user_agent.clone());
        headers.typed_insert(self.token.clone());
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));

        let http_err = |source| RemoteError::Http {
            url: url.to_owned(),
            source,
        };
        let resp = self.client.request(req).await.map_err(http_err)?;
        let status = resp.status();
        let next = resp
            .headers()
            .get(LINK)
            .and_then(|value| value.to_str().ok())
            .and_then(next_link);
        let body = hyper::body::to_bytes(resp.into_body())
            .await
            .map_err(http_err)?;

        if !status.is_success() {
            return Err(RemoteError::Status {
                url: url.to_owned(),
                status,
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }
        let items = serde_json::from_slice(&body).map_err(|source| RemoteError::Decode {
            url: url.to_owned(),
            source,
        })?;
        Ok((items, next))
    }

    /// Follows `rel="next"` links until the listing is exhausted.
    async fn get_all<T>(&self, url: String) -> std::result::Result<Vec<T>, RemoteError>
    where
        T: serde::de::DeserializeOwned,
    {
        let mut items = Vec::new();
        let mut next = Some(url);
        while let Some(url) = next {
            let (page, next_url) = self.get_page::<T>(&url).await?;
            debug!("Fetched {} items from {}", page.len(), url);
            items.extend(page);
            next = next_url;
        }
        Ok(items)
    }

    fn repos_url(&self, org: &str) -> String {
        format!(
            "{}/orgs/{}/repos?type=all&per_page={}",
            self.endpoint, org, PER_PAGE
        )
    }

    fn issues_url(&self, owner: &str, repo: &str) -> String {
        format!(
            "{}/repos/{owner}/{repo}/issues?state=all&per_page={}",
            self.endpoint,
            PER_PAGE,
            owner = owner,
            repo = repo
        )
    }

    fn comments_url(&self, owner: &str, repo: &str, number: u64) -> String {
        format!(
            "{}/repos/{owner}/{repo}/issues/{number}/comments?per_page={}",
            self.endpoint,
            PER_PAGE,
            owner = owner,
            repo = repo,
            number = number
        )
    }
}

impl Remote for Github {
    async fn org_repositories(
        &self,
        org: &str,
    ) -> std::result::Result<Vec<model::Repository>, RemoteError> {
        self.get_all(self.repos_url(org)).await
    }

    async fn issues(
        &self,
        owner: &str,
        repo: &str,
    ) -> std::result::Result<Vec<model::Issue>, RemoteError> {
        self.get_all(self.issues_url(owner, repo)).await
    }

    async fn issue_comments(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
    ) -> std::result::Result<Vec<model::Comment>, RemoteError> {
        self.get_all(self.comments_url(owner, repo, number)).await
    }
}

/// Extracts the `rel="next"` target from a `Link` header value.
fn next_link(header: &str) -> Option<String> {
    header.split(',').find_map(|part| {
        let mut fields = part.split(';');
        let target = fields.next()?.trim();
        let is_next = fields.any(|param| {
            let param = param.trim();
            param == r#"rel="next""# || param == "rel=next"
        });
        if is_next {
            target
                .strip_prefix('<')
                .and_then(|t| t.strip_suffix('>'))
                .map(str::to_owned)
        } else {
            None
        }
    })
}
