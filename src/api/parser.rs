use crate::app::{Build, LogKind};
use color_eyre::eyre::Result;

pub fn parse_builds(json: &str) -> Result<Vec<Build>> {
    let builds: Vec<Build> = serde_json::from_str(json)?;
    Ok(builds)
}

/// Finds the pre-formatted region the log endpoint marks as ANSI-rendered
/// content and returns its inner markup. The scan is case-insensitive and
/// tolerates attributes in any order; only the first matching region counts.
pub fn extract_log_region(html: &str) -> Option<String> {
    // ASCII lowercasing keeps byte offsets valid on the original string.
    let lower = html.to_ascii_lowercase();
    let mut search = 0;
    while let Some(rel) = lower[search..].find("<pre") {
        let tag_start = search + rel;
        let tag_end = tag_start + lower[tag_start..].find('>')?;
        if lower[tag_start..=tag_end].contains("ansi2html-content") {
            let content_start = tag_end + 1;
            let close = content_start + lower[content_start..].find("</pre")?;
            return Some(html[content_start..close].to_string());
        }
        search = tag_end + 1;
    }
    None
}

/// Reduces log-region markup to plain text: tags are dropped (`<br>`
/// becomes a newline), character entities are decoded. Unrecognized
/// entities pass through literally.
pub fn markup_to_text(markup: &str) -> String {
    let mut out = String::with_capacity(markup.len());
    let mut rest = markup;
    while let Some(pos) = rest.find(['<', '&']) {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];
        if rest.starts_with('<') {
            match rest.find('>') {
                Some(end) => {
                    let name = rest[1..end]
                        .trim_start_matches('/')
                        .trim_end_matches('/')
                        .split_whitespace()
                        .next()
                        .unwrap_or("");
                    if name.eq_ignore_ascii_case("br") && !rest.starts_with("</") {
                        out.push('\n');
                    }
                    rest = &rest[end + 1..];
                }
                // Unterminated tag: nothing displayable follows
                None => return out,
            }
        } else {
            match rest[1..].find(';') {
                Some(semi) if semi <= 8 => {
                    let entity = &rest[1..=semi];
                    if let Some(decoded) = decode_entity(entity) {
                        out.push(decoded);
                    } else {
                        out.push('&');
                        out.push_str(entity);
                        out.push(';');
                    }
                    rest = &rest[semi + 2..];
                }
                _ => {
                    out.push('&');
                    rest = &rest[1..];
                }
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(entity: &str) -> Option<char> {
    match entity {
        "lt" => Some('<'),
        "gt" => Some('>'),
        "amp" => Some('&'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some(' '),
        _ => {
            let num = entity.strip_prefix('#')?;
            let code = if let Some(hex) = num.strip_prefix(['x', 'X']) {
                u32::from_str_radix(hex, 16).ok()?
            } else {
                num.parse().ok()?
            };
            char::from_u32(code)
        }
    }
}

/// Display-text fallback chain for a successful log fetch: the marked
/// region if present, otherwise the raw body, otherwise the literal
/// empty-log placeholder.
pub fn log_display_text(body: &str, kind: LogKind) -> String {
    if let Some(region) = extract_log_region(body) {
        markup_to_text(&region)
    } else if body.is_empty() {
        kind.empty_placeholder().to_string()
    } else {
        body.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::BuildStatus;
    use pretty_assertions::assert_eq;

    const BUILDS_JSON: &str = r#"[
        {
            "name": "pr-123",
            "status": "started",
            "commit_info": {
                "repo": "acme/widgets",
                "target_branch": "16.0",
                "pr": 123,
                "git_commit": "0123456789abcdef"
            },
            "created": "2024-03-01T10:00:00Z",
            "repo_target_branch_link": "https://github.com/acme/widgets/tree/16.0",
            "repo_pr_link": "https://github.com/acme/widgets/pull/123",
            "repo_commit_link": "https://github.com/acme/widgets/commit/0123456789abcdef",
            "deploy_link": "http://pr-123.builds.example.com",
            "deploy_link_mailhog": "http://mail.pr-123.builds.example.com"
        },
        {
            "name": "main-old",
            "status": null
        }
    ]"#;

    #[test]
    fn parse_builds_full_record() {
        let builds = parse_builds(BUILDS_JSON).unwrap();
        assert_eq!(builds.len(), 2);
        let b = &builds[0];
        assert_eq!(b.name, "pr-123");
        assert_eq!(b.status, BuildStatus::Started);
        let ci = b.commit_info.as_ref().unwrap();
        assert_eq!(ci.repo, "acme/widgets");
        assert_eq!(ci.target_branch, "16.0");
        assert_eq!(ci.pr, Some(123));
        assert_eq!(ci.git_commit.as_deref(), Some("0123456789abcdef"));
        assert_eq!(
            b.deploy_link.as_deref(),
            Some("http://pr-123.builds.example.com")
        );
    }

    #[test]
    fn parse_builds_null_status_minimal_record() {
        let builds = parse_builds(BUILDS_JSON).unwrap();
        let b = &builds[1];
        assert_eq!(b.status, BuildStatus::Undeployed);
        assert!(b.commit_info.is_none());
        assert!(b.created.is_none());
        assert!(b.deploy_link.is_none());
    }

    #[test]
    fn parse_builds_empty_array() {
        assert!(parse_builds("[]").unwrap().is_empty());
    }

    #[test]
    fn parse_builds_invalid_json_error() {
        assert!(parse_builds("not json").is_err());
    }

    // --- extract_log_region ---

    #[test]
    fn region_extracted() {
        let html = r#"<html><body><pre class="ansi2html-content">hello
world</pre></body></html>"#;
        assert_eq!(extract_log_region(html).unwrap(), "hello\nworld");
    }

    #[test]
    fn region_class_among_others() {
        let html = r#"<pre id="log" class="wide ansi2html-content dark">x</pre>"#;
        assert_eq!(extract_log_region(html).unwrap(), "x");
    }

    #[test]
    fn region_case_insensitive() {
        let html = r#"<PRE CLASS="ANSI2HTML-CONTENT">Mixed</PRE>"#;
        assert_eq!(extract_log_region(html).unwrap(), "Mixed");
    }

    #[test]
    fn plain_pre_is_not_the_region() {
        let html = "<pre>just preformatted</pre>";
        assert_eq!(extract_log_region(html), None);
    }

    #[test]
    fn first_matching_region_wins() {
        let html = concat!(
            r#"<pre>noise</pre>"#,
            r#"<pre class="ansi2html-content">first</pre>"#,
            r#"<pre class="ansi2html-content">second</pre>"#,
        );
        assert_eq!(extract_log_region(html).unwrap(), "first");
    }

    #[test]
    fn unclosed_region_yields_none() {
        let html = r#"<pre class="ansi2html-content">dangling"#;
        assert_eq!(extract_log_region(html), None);
    }

    #[test]
    fn no_region_in_plain_text() {
        assert_eq!(extract_log_region("plain text output"), None);
    }

    // --- markup_to_text ---

    #[test]
    fn spans_stripped_entities_decoded() {
        let markup = r#"<span class="ansi32">ok:</span> 1 &lt; 2 &amp;&amp; 3 &gt; 2"#;
        assert_eq!(markup_to_text(markup), "ok: 1 < 2 && 3 > 2");
    }

    #[test]
    fn br_becomes_newline() {
        assert_eq!(markup_to_text("a<br>b<br/>c"), "a\nb\nc");
    }

    #[test]
    fn numeric_entities() {
        assert_eq!(markup_to_text("&#65;&#x42;"), "AB");
    }

    #[test]
    fn unknown_entity_passes_through() {
        assert_eq!(markup_to_text("&bogus; &amp;"), "&bogus; &");
    }

    #[test]
    fn lone_ampersand_kept() {
        assert_eq!(markup_to_text("fish & chips"), "fish & chips");
    }

    #[test]
    fn unterminated_tag_dropped() {
        assert_eq!(markup_to_text("before<span class="), "before");
    }

    #[test]
    fn plain_text_untouched() {
        assert_eq!(markup_to_text("2024-03-01 INFO ready"), "2024-03-01 INFO ready");
    }

    // --- log_display_text ---

    #[test]
    fn display_prefers_region() {
        let body = r#"<html><pre class="ansi2html-content">line&nbsp;1</pre></html>"#;
        assert_eq!(log_display_text(body, LogKind::Deploy), "line 1");
    }

    #[test]
    fn display_falls_back_to_raw_body() {
        let body = "502 upstream says no";
        assert_eq!(log_display_text(body, LogKind::Deploy), body);
    }

    #[test]
    fn display_empty_body_placeholder_per_kind() {
        assert_eq!(log_display_text("", LogKind::Deploy), "Log is empty");
        assert_eq!(log_display_text("", LogKind::Init), "Init log is empty");
    }
}
