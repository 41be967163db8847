use chrono::{TimeZone, Utc};
use serde::Deserialize;
use std::sync::OnceLock;

/// How many first-level comments the detail view renders.
pub const MAX_COMMENTS: usize = 10;

/// The fixed set of story listings the API exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Top,
    New,
    Best,
    Ask,
    Show,
    Job,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Top,
        Category::New,
        Category::Best,
        Category::Ask,
        Category::Show,
        Category::Job,
    ];

    /// Endpoint name under the API base, e.g. `topstories` -> `{base}/topstories.json`.
    pub fn endpoint(self) -> &'static str {
        match self {
            Category::Top => "topstories",
            Category::New => "newstories",
            Category::Best => "beststories",
            Category::Ask => "askstories",
            Category::Show => "showstories",
            Category::Job => "jobstories",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Category::Top => "Top",
            Category::New => "New",
            Category::Best => "Best",
            Category::Ask => "Ask",
            Category::Show => "Show",
            Category::Job => "Jobs",
        }
    }
}

/// Item object as the API returns it. Almost every field is optional in
/// practice (jobs have no descendants, text posts have no url, deleted items
/// have nothing but an id).
#[derive(Debug, Deserialize)]
pub struct RawItem {
    pub id: u64,
    pub title: Option<String>,
    pub url: Option<String>,
    pub score: Option<i64>,
    pub by: Option<String>,
    pub time: Option<i64>,
    pub descendants: Option<i64>,
    pub kids: Option<Vec<u64>>,
    pub text: Option<String>,
}

/// A story normalized for display: optional fields collapsed to defaults,
/// domain label pre-derived from the url.
#[derive(Debug, Clone)]
pub struct Story {
    pub id: u64,
    pub title: String,
    pub url: String,
    pub domain: String,
    pub by: String,
    pub score: i64,
    pub time: i64,
    pub descendants: i64,
    pub kids: Vec<u64>,
    pub text: String,
}

impl From<RawItem> for Story {
    fn from(raw: RawItem) -> Self {
        // A missing url is a valid shape (Ask HN, jobs); it must not produce
        // a domain label or an error downstream.
        let url = raw.url.unwrap_or_default();
        let domain = domain_of(&url).unwrap_or_default();
        Self {
            id: raw.id,
            title: raw.title.unwrap_or_default(),
            url,
            domain,
            by: raw.by.unwrap_or_default(),
            score: raw.score.unwrap_or(0),
            time: raw.time.unwrap_or(0),
            descendants: raw.descendants.unwrap_or(0),
            kids: raw.kids.unwrap_or_default(),
            text: raw.text.map(|t| clean_html(&t)).unwrap_or_default(),
        }
    }
}

/// A first-level comment on a story.
#[derive(Debug, Clone)]
pub struct Comment {
    pub id: u64,
    pub by: String,
    pub text: String,
    pub time: i64,
}

impl From<RawItem> for Comment {
    fn from(raw: RawItem) -> Self {
        Self {
            id: raw.id,
            by: raw.by.unwrap_or_default(),
            text: raw.text.map(|t| clean_html(&t)).unwrap_or_default(),
            time: raw.time.unwrap_or(0),
        }
    }
}

/// Extract the host part of a url for the "(example.com)" label next to a
/// story title. Returns None for empty or malformed urls so the caller can
/// simply omit the label.
pub fn domain_of(url: &str) -> Option<String> {
    if url.is_empty() {
        return None;
    }
    let rest = url.split_once("://").map(|(_, r)| r)?;
    let host = rest.split(['/', '?', '#']).next().unwrap_or_default();
    if host.is_empty() {
        return None;
    }
    let host = host.strip_prefix("www.").unwrap_or(host);
    Some(host.to_string())
}

/// Format an epoch-seconds timestamp as a relative age like "3 hours ago".
pub fn format_time_ago(epoch_secs: i64) -> String {
    let then = match Utc.timestamp_opt(epoch_secs, 0).single() {
        Some(t) => t,
        None => return String::new(),
    };
    let secs = (Utc::now() - then).num_seconds().max(0);
    if secs < 60 {
        "just now".to_string()
    } else if secs < 3600 {
        let m = secs / 60;
        format!("{} minute{} ago", m, if m == 1 { "" } else { "s" })
    } else if secs < 86_400 {
        let h = secs / 3600;
        format!("{} hour{} ago", h, if h == 1 { "" } else { "s" })
    } else {
        let d = secs / 86_400;
        format!("{} day{} ago", d, if d == 1 { "" } else { "s" })
    }
}

/// The child ids the detail view fetches: first level only, capped.
pub fn first_level_children(kids: &[u64]) -> &[u64] {
    &kids[..kids.len().min(MAX_COMMENTS)]
}

/// Strip HTML from comment bodies while keeping the text readable:
/// paragraph breaks become blank lines, entities are decoded, tags dropped.
pub fn clean_html(html: &str) -> String {
    static TAG_RE: OnceLock<regex::Regex> = OnceLock::new();
    let tag_re = TAG_RE.get_or_init(|| regex::Regex::new(r"<[^>]+>").unwrap());

    let text = html.replace("<p>", "\n\n");
    let text = tag_re.replace_all(&text, "");
    html_escape::decode_html_entities(&text).trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_of_plain_urls() {
        assert_eq!(
            domain_of("https://example.com/post/1"),
            Some("example.com".to_string())
        );
        assert_eq!(
            domain_of("http://blog.example.org"),
            Some("blog.example.org".to_string())
        );
    }

    #[test]
    fn domain_of_strips_www() {
        assert_eq!(
            domain_of("https://www.example.com/x"),
            Some("example.com".to_string())
        );
    }

    #[test]
    fn domain_of_empty_or_malformed() {
        assert_eq!(domain_of(""), None);
        assert_eq!(domain_of("not a url"), None);
        assert_eq!(domain_of("https://"), None);
    }

    #[test]
    fn story_without_url_has_no_domain() {
        let raw: RawItem = serde_json::from_str(
            r#"{"id": 123, "title": "Ask HN: Something", "score": 42,
                "by": "alice", "time": 1700000000, "descendants": 7}"#,
        )
        .unwrap();
        let story = Story::from(raw);
        assert_eq!(story.url, "");
        assert_eq!(story.domain, "");
        assert!(story.kids.is_empty());
    }

    #[test]
    fn story_with_url_derives_domain() {
        let raw: RawItem = serde_json::from_str(
            r#"{"id": 1, "title": "T", "url": "https://www.rust-lang.org/news",
                "score": 1, "by": "bob", "time": 1700000000}"#,
        )
        .unwrap();
        let story = Story::from(raw);
        assert_eq!(story.domain, "rust-lang.org");
    }

    #[test]
    fn comment_text_is_cleaned() {
        let raw: RawItem = serde_json::from_str(
            r#"{"id": 2, "by": "carol", "time": 1700000000,
                "text": "first<p>second &amp; <a href=\"x\">link</a>"}"#,
        )
        .unwrap();
        let comment = Comment::from(raw);
        assert_eq!(comment.text, "first\n\nsecond & link");
    }

    #[test]
    fn fifteen_children_are_capped_at_ten() {
        let kids: Vec<u64> = (1..=15).collect();
        assert_eq!(first_level_children(&kids), (1..=10).collect::<Vec<u64>>());
    }

    #[test]
    fn short_child_lists_are_kept_whole() {
        let kids = vec![4u64, 5, 6];
        assert_eq!(first_level_children(&kids), [4, 5, 6]);
        assert!(first_level_children(&[]).is_empty());
    }

    #[test]
    fn clean_html_reuses_tag_regex_across_calls() {
        assert_eq!(clean_html("<i>a</i><p>b &gt; c"), "a\n\nb > c");
        assert_eq!(clean_html("<code>x</code>"), "x");
    }

    #[test]
    fn format_time_ago_units() {
        let now = Utc::now().timestamp();
        assert_eq!(format_time_ago(now), "just now");
        assert_eq!(format_time_ago(now - 120), "2 minutes ago");
        assert_eq!(format_time_ago(now - 2 * 3600), "2 hours ago");
        assert_eq!(format_time_ago(now - 3 * 86_400), "3 days ago");
    }

    #[test]
    fn category_endpoints() {
        assert_eq!(Category::Top.endpoint(), "topstories");
        assert_eq!(Category::Job.endpoint(), "jobstories");
    }
}
