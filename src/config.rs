use std::ffi::OsString;

use argh::FromArgs;

use crate::errors::{Error, Result};
use crate::github;

#[derive(FromArgs, Debug)]
/// back up every repository of a GitHub organization as a mirror clone plus its issues and pull requests as markdown files
pub struct Args {
    /// git OAuth2 access token (falls back to the GITHUB_TOKEN environment variable)
    #[argh(option)]
    pub git_access_token: Option<String>,

    /// name of the GitHub organization to back up
    #[argh(option)]
    pub target_organization_name: Option<String>,

    /// backup directory; defaults to a timestamped directory in the project root
    #[argh(option)]
    pub backup_dir: Option<String>,

    /// base url of the GitHub API
    #[argh(option, default = "github::API_ENDPOINT.to_owned()")]
    pub api_url: String,

    /// git executable used for mirror clones
    #[argh(option, default = "String::from(\"git\")")]
    pub git: String,
}

/// Flag spellings of the Go `flag` package, which takes one or two dashes
/// and underscores, mapped to argh's.
const UNDERSCORE_FLAGS: [(&str, &str); 3] = [
    ("git_access_token", "--git-access-token"),
    ("target_organization_name", "--target-organization-name"),
    ("backup_dir", "--backup-dir"),
];

/// Rewrites `-git_access_token`, `--git_access_token` and
/// `-git_access_token=<value>` (likewise for the other underscore flags) into
/// the form argh parses. Option values are passed through untouched.
pub fn normalize_args<I>(args: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut out = Vec::new();
    let mut value_next = false;
    for arg in args {
        if value_next {
            out.push(arg);
            value_next = false;
            continue;
        }
        match underscore_flag(&arg) {
            Some((flag, Some(value))) => {
                out.push(flag.to_owned());
                out.push(value);
            }
            Some((flag, None)) => {
                out.push(flag.to_owned());
                value_next = true;
            }
            None => {
                value_next = arg.starts_with("--") && arg != "--help";
                out.push(arg);
            }
        }
    }
    out
}

/// Maps an underscore flag to argh's spelling, splitting off an inline
/// `=<value>`.
fn underscore_flag(arg: &str) -> Option<(&'static str, Option<String>)> {
    let name = arg.strip_prefix("--").or_else(|| arg.strip_prefix('-'))?;
    let (name, value) = match name.split_once('=') {
        Some((name, value)) => (name, Some(value.to_owned())),
        None => (name, None),
    };
    UNDERSCORE_FLAGS
        .iter()
        .find(|(underscored, _)| *underscored == name)
        .map(|(_, flag)| (*flag, value))
}

impl Args {
    /// Parses the process arguments after `normalize_args`. `command` is the
    /// program name shown in help and error output.
    pub fn parse(command: &str, args: Vec<String>) -> std::result::Result<Self, argh::EarlyExit> {
        let args = normalize_args(args);
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        Self::from_args(&[command], &args)
    }
}

/// Validated run configuration.
#[derive(Clone)]
pub struct Config {
    pub token: String,
    pub organization: String,
    pub backup_dir: Option<String>,
    pub api_url: String,
    pub git: OsString,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("token", &"<redacted>")
            .field("organization", &self.organization)
            .field("backup_dir", &self.backup_dir)
            .field("api_url", &self.api_url)
            .field("git", &self.git)
            .finish()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

impl Config {
    /// `env_token` is the value of `GITHUB_TOKEN`, used when no token flag
    /// was given.
    pub fn from_args(args: Args, env_token: Option<String>) -> Result<Self> {
        let token = non_empty(args.git_access_token)
            .or_else(|| non_empty(env_token))
            .ok_or_else(|| {
                Error::Config(
                    "missing git access token: pass --git-access-token or set GITHUB_TOKEN".into(),
                )
            })?;
        let organization = non_empty(args.target_organization_name).ok_or_else(|| {
            Error::Config("missing organization: pass --target-organization-name".into())
        })?;
        Ok(Self {
            token,
            organization,
            backup_dir: non_empty(args.backup_dir),
            api_url: args.api_url,
            git: args.git.into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        Args::from_args(&["org-backup"], args).unwrap()
    }

    #[test]
    fn parses_all_flags() {
        let args = parse(&[
            "--git-access-token",
            "secret",
            "--target-organization-name",
            "acme",
            "--backup-dir",
            "~/backups",
        ]);
        let config = Config::from_args(args, None).unwrap();
        assert_eq!(config.token, "secret");
        assert_eq!(config.organization, "acme");
        assert_eq!(config.backup_dir.as_deref(), Some("~/backups"));
        assert_eq!(config.api_url, github::API_ENDPOINT);
        assert_eq!(config.git, "git");
    }

    #[test]
    fn accepts_underscore_flag_spellings() {
        let args = Args::parse(
            "org-backup",
            [
                "-git_access_token",
                "secret",
                "--target_organization_name",
                "acme",
                "-backup_dir=~/backups",
            ]
            .map(String::from)
            .to_vec(),
        )
        .unwrap();
        let config = Config::from_args(args, None).unwrap();
        assert_eq!(config.token, "secret");
        assert_eq!(config.organization, "acme");
        assert_eq!(config.backup_dir.as_deref(), Some("~/backups"));
    }

    #[test]
    fn option_values_are_not_rewritten() {
        let args = normalize_args(
            ["--git-access-token", "-backup_dir", "-target_organization_name", "acme"]
                .map(String::from),
        );
        assert_eq!(
            args,
            ["--git-access-token", "-backup_dir", "--target-organization-name", "acme"]
        );
    }

    #[test]
    fn unknown_flags_are_still_rejected() {
        let args = ["-git_acess_token", "secret"].map(String::from).to_vec();
        assert!(Args::parse("org-backup", args).is_err());
    }

    #[test]
    fn flag_token_wins_over_environment() {
        let args = parse(&["--git-access-token", "flag", "--target-organization-name", "acme"]);
        let config = Config::from_args(args, Some("env".into())).unwrap();
        assert_eq!(config.token, "flag");
    }

    #[test]
    fn token_falls_back_to_environment() {
        let args = parse(&["--target-organization-name", "acme"]);
        let config = Config::from_args(args, Some("env".into())).unwrap();
        assert_eq!(config.token, "env");
        assert!(config.backup_dir.is_none());
    }

    #[test]
    fn missing_token_is_a_config_error() {
        let args = parse(&["--target-organization-name", "acme"]);
        assert!(matches!(
            Config::from_args(args, Some(String::new())),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn missing_organization_is_a_config_error() {
        let args = parse(&["--git-access-token", "secret"]);
        assert!(matches!(
            Config::from_args(args, None),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn token_is_not_printed() {
        let args = parse(&["--git-access-token", "secret", "--target-organization-name", "acme"]);
        let config = Config::from_args(args, None).unwrap();
        assert!(!format!("{:?}", config).contains("secret"));
    }
}
