use crate::api::parser;
use crate::app::{Build, BuildAction, LogKind};
use color_eyre::eyre::{eyre, Result};
use reqwest::StatusCode;
use tokio::process::Command;

/// Raw log-endpoint response. Non-2xx statuses are not an error at this
/// layer: the viewer renders them as inline text.
#[derive(Debug)]
pub struct LogResponse {
    pub status: StatusCode,
    pub body: String,
}

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn build_url(&self, name: &str) -> String {
        format!("{}/api/v1/builds/{name}", self.base_url)
    }

    pub async fn fetch_builds(&self, repo: Option<&str>) -> Result<Vec<Build>> {
        let mut req = self.http.get(format!("{}/api/v1/builds", self.base_url));
        if let Some(repo) = repo {
            req = req.query(&[("repo", repo)]);
        }
        let resp = req.send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(eyre!("builds request failed: {status}"));
        }
        let body = resp.text().await?;
        parser::parse_builds(&body)
    }

    /// Issues one lifecycle request. The caller decides whether to look at
    /// the result; the card contract is fire-and-forget.
    pub async fn send_action(&self, name: &str, action: BuildAction) -> Result<()> {
        let resp = match action {
            BuildAction::Delete => self.http.delete(self.build_url(name)).send().await?,
            _ => {
                let url = format!("{}/{}", self.build_url(name), action.as_str());
                self.http.post(url).send().await?
            }
        };
        let status = resp.status();
        if !status.is_success() {
            return Err(eyre!("{} {name} rejected: {status}", action.as_str()));
        }
        Ok(())
    }

    pub async fn fetch_log(&self, name: &str, kind: LogKind) -> reqwest::Result<LogResponse> {
        let url = format!("{}/{}", self.build_url(name), kind.endpoint());
        let resp = self.http.get(url).send().await?;
        let status = resp.status();
        let body = resp.text().await?;
        Ok(LogResponse { status, body })
    }
}

pub async fn open_in_browser(url: &str) -> Result<()> {
    let (cmd, args): (&str, Vec<&str>) = if cfg!(target_os = "macos") {
        ("open", vec![url])
    } else if cfg!(target_os = "windows") {
        ("cmd", vec!["/C", "start", url])
    } else {
        ("xdg-open", vec![url])
    };
    Command::new(cmd)
        .args(&args)
        .spawn()
        .map_err(|e| eyre!("Failed to open browser: {e}"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_trimmed() {
        let client = ApiClient::new("http://localhost:8000/");
        assert_eq!(
            client.build_url("pr-123"),
            "http://localhost:8000/api/v1/builds/pr-123"
        );
    }

    #[test]
    fn log_endpoints_per_kind() {
        let client = ApiClient::new("http://build.example.com");
        assert_eq!(
            format!("{}/{}", client.build_url("pr-1"), LogKind::Deploy.endpoint()),
            "http://build.example.com/api/v1/builds/pr-1/log"
        );
        assert_eq!(
            format!("{}/{}", client.build_url("pr-1"), LogKind::Init.endpoint()),
            "http://build.example.com/api/v1/builds/pr-1/init-log"
        );
    }
}
