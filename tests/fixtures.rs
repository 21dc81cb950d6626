#![allow(dead_code)]

use bdw::app::{AppConfig, AppState, Build, BuildStatus, CommitInfo};
use chrono::Utc;

pub fn build_named(name: &str, status: BuildStatus) -> Build {
    Build {
        name: name.to_string(),
        status,
        ..Build::default()
    }
}

pub fn started_build(name: &str) -> Build {
    Build {
        name: name.to_string(),
        status: BuildStatus::Started,
        commit_info: Some(CommitInfo {
            repo: "acme/widgets".to_string(),
            target_branch: "16.0".to_string(),
            pr: Some(123),
            git_commit: Some("0123456789abcdef".to_string()),
        }),
        created: Some(Utc::now()),
        repo_target_branch_link: Some("https://github.com/acme/widgets/tree/16.0".to_string()),
        repo_pr_link: Some("https://github.com/acme/widgets/pull/123".to_string()),
        repo_commit_link: Some(
            "https://github.com/acme/widgets/commit/0123456789abcdef".to_string(),
        ),
        deploy_link: Some(format!("http://{name}.builds.example.com")),
        deploy_link_mailhog: Some(format!("http://mail.{name}.builds.example.com")),
    }
}

pub fn stopped_build(name: &str) -> Build {
    let mut build = started_build(name);
    build.status = BuildStatus::Stopped;
    build
}

pub fn undeployed_build(name: &str) -> Build {
    Build {
        name: name.to_string(),
        ..Build::default()
    }
}

pub fn make_state_with_builds(builds: Vec<Build>) -> AppState {
    let mut state = AppState::new(AppConfig {
        server_url: "http://localhost:8000".to_string(),
        repo: Some("acme/widgets".to_string()),
        interval: 10,
    });
    state.builds = builds;
    state
}
