//! Readme resolution and relative-URL handling for rendered markdown.

use std::sync::OnceLock;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use regex::{Captures, Regex};

#[derive(Debug, Clone, PartialEq, Eq)]
/// Where an extension's readme points.
pub enum ReadmeTarget {
    /// Absolute URL or non-markdown file; shown as a plain link.
    Link(String),
    /// Relative `.md` file served from the nbextensions namespace.
    Markdown { url: String },
}

impl ReadmeTarget {
    pub fn url(&self) -> &str {
        match self {
            Self::Link(url) => url,
            Self::Markdown { url } => url,
        }
    }
}

fn absolute_src() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)^(f|ht)tps?://").expect("valid regex"))
}

fn absolute_href() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)^#|mailto:|(f|ht)tps?://").expect("valid regex"))
}

fn markdown_link() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // `[text](target "title")` and `![alt](target)`.
    PATTERN.get_or_init(|| {
        Regex::new(r#"(?P<bang>!?)\[(?P<text>[^\]]*)\]\((?P<target>[^)\s]+)(?P<title>\s+"[^"]*")?\)"#)
            .expect("valid regex")
    })
}

/// Bytes escaped in one URI path component; `/` is escaped too, so callers split first.
pub const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Percent-encodes every `/`-separated component of `path`, keeping the separators.
pub fn encode_uri_components(path: &str) -> String {
    path.split('/')
        .map(|component| utf8_percent_encode(component, URI_COMPONENT).to_string())
        .collect::<Vec<_>>()
        .join("/")
}

/// Resolves a descriptor's `readme` against the host base URL.
pub fn resolve_readme(readme: &str, base_url: &str) -> ReadmeTarget {
    let readme = readme.trim();
    let is_markdown = readme
        .rsplit('/')
        .next()
        .and_then(|file| file.rsplit_once('.'))
        .is_some_and(|(stem, extension)| !stem.is_empty() && extension == "md");
    if absolute_src().is_match(readme) || !is_markdown {
        return ReadmeTarget::Link(readme.to_string());
    }
    let base = base_url.trim_end_matches('/');
    let path = encode_uri_components(readme.trim_start_matches('/'));
    ReadmeTarget::Markdown {
        url: format!("{base}/nbextensions/{path}"),
    }
}

/// Joins relative URLs in order, each resolved against the previous one.
///
/// The last segment of the accumulated URL is treated as a resource and
/// dropped before each join; a fragment starting with `/` restarts from the root.
pub fn join_relative_urls(parts: &[&str]) -> String {
    let mut url: Vec<&str> = Vec::new();
    let mut root = "";
    for part in parts {
        if part.starts_with('/') {
            url.clear();
            root = "/";
        }
        url.pop();
        for segment in part.split('/') {
            match segment {
                "" | "." => {}
                ".." => {
                    url.pop();
                }
                other => url.push(other),
            }
        }
    }
    format!("{root}{}", url.join("/"))
}

/// Makes a link or image target absolute relative to `relative_url_root`.
///
/// Targets that are already absolute, and for links also `#anchors` and
/// `mailto:` targets, are left untouched.
pub fn absolutize_url(relative_url_root: &str, url: &str, is_image: bool) -> String {
    let absolute = if is_image {
        absolute_src()
    } else {
        absolute_href()
    };
    if relative_url_root.is_empty() || absolute.is_match(url) {
        return url.to_string();
    }
    join_relative_urls(&[relative_url_root, url])
}

/// Anchor id for a heading: its text with spaces replaced by `-`.
pub fn heading_anchor(text: &str) -> String {
    text.trim().replace(' ', "-")
}

/// Rewrites inline markdown link and image targets relative to `root`.
pub fn rewrite_markdown_links(markdown: &str, root: &str) -> String {
    markdown_link()
        .replace_all(markdown, |captures: &Captures<'_>| {
            let is_image = !captures["bang"].is_empty();
            let target = absolutize_url(root, &captures["target"], is_image);
            let title = captures.name("title").map_or("", |title| title.as_str());
            format!(
                "{}[{}]({target}{title})",
                &captures["bang"], &captures["text"]
            )
        })
        .into_owned()
}
