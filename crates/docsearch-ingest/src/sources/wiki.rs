//! Wiki page source.
//!
//! The HTTP client for the wiki API lives outside this crate; pages arrive
//! through the [`WikiSource`] trait as raw storage-format HTML plus a few
//! descriptive fields. [`DirectoryWikiSource`] serves pages exported to disk.

use std::fs;
use std::path::{Path, PathBuf};

use docsearch_types::{metadata_from_pairs, ConnectionStatus, WikiSettings, META_SOURCE, META_TITLE};
use scraper::Html;
use serde::Deserialize;
use tracing::debug;

use crate::error::IngestError;
use crate::sources::SourceDocument;

/// Value of the `source` metadata key for wiki chunks
pub const WIKI_SOURCE: &str = "wiki";

const MISSING_CREDENTIALS: &str = "Missing wiki credentials (URL, USERNAME, or API_TOKEN)";
const NOT_SET: &str = "Not set";

/// A single page as delivered by a wiki source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WikiPage {
    pub page_id: String,
    pub title: String,
    pub space_key: String,
    pub url: String,
    /// Raw page body in storage-format HTML
    pub body_html: String,
}

impl WikiPage {
    /// Convert to an ingestible document: `"Title: {title}\n\n{clean text}"`.
    pub fn into_document(self) -> SourceDocument {
        let text = format!("Title: {}\n\n{}", self.title, clean_html(&self.body_html));
        let metadata = metadata_from_pairs([
            (META_SOURCE, WIKI_SOURCE.to_string()),
            (META_TITLE, self.title),
            ("page_id", self.page_id),
            ("space_key", self.space_key),
            ("url", self.url),
        ]);
        SourceDocument::new(text, metadata)
    }
}

/// Extract readable text from HTML, dropping `script` and `style` content
/// and collapsing whitespace runs to single spaces.
pub fn clean_html(html: &str) -> String {
    if html.trim().is_empty() {
        return String::new();
    }

    let document = Html::parse_fragment(html);
    let mut words: Vec<&str> = Vec::new();
    for node in document.root_element().descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node.ancestors().any(|a| {
            a.value()
                .as_element()
                .is_some_and(|e| matches!(e.name(), "script" | "style"))
        });
        if !hidden {
            words.extend(text.split_whitespace());
        }
    }
    words.join(" ")
}

/// Wiki connection settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WikiCredentials {
    pub url: Option<String>,
    pub username: Option<String>,
    pub api_token: Option<String>,
}

impl WikiCredentials {
    pub fn from_settings(settings: &WikiSettings) -> Self {
        let non_empty = |v: &Option<String>| v.clone().filter(|s| !s.trim().is_empty());
        Self {
            url: non_empty(&settings.url),
            username: non_empty(&settings.username),
            api_token: non_empty(&settings.api_token),
        }
    }

    /// Available only when url, username and token are all set.
    pub fn connection_status(&self) -> ConnectionStatus {
        let url = self.url.as_deref().unwrap_or(NOT_SET);
        let username = self.username.as_deref().unwrap_or(NOT_SET);
        if self.url.is_some() && self.username.is_some() && self.api_token.is_some() {
            ConnectionStatus::available(url, username)
        } else {
            ConnectionStatus::unavailable(MISSING_CREDENTIALS, url, username)
        }
    }

    /// Browser URL of a page, when a base URL is configured
    pub fn page_url(&self, page_id: &str) -> Option<String> {
        self.url.as_ref().map(|base| {
            format!(
                "{}/pages/viewpage.action?pageId={}",
                base.trim_end_matches('/'),
                page_id
            )
        })
    }
}

/// Anything that can hand out wiki pages by id.
pub trait WikiSource: Send + Sync {
    fn status(&self) -> ConnectionStatus;

    fn fetch_page(&self, page_id: &str) -> Result<WikiPage, IngestError>;
}

/// Optional `<page_id>.json` next to an exported page
#[derive(Debug, Default, Deserialize)]
struct PageSidecar {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    space_key: Option<String>,
    #[serde(default)]
    url: Option<String>,
}

/// Serves pages exported as `<page_id>.html` files.
pub struct DirectoryWikiSource {
    dir: PathBuf,
    credentials: WikiCredentials,
}

impl DirectoryWikiSource {
    pub fn new(dir: impl Into<PathBuf>, credentials: WikiCredentials) -> Self {
        Self {
            dir: dir.into(),
            credentials,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn page_path(&self, page_id: &str, ext: &str) -> Result<PathBuf, IngestError> {
        let valid = !page_id.is_empty()
            && page_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(IngestError::PageNotFound(page_id.to_string()));
        }
        Ok(self.dir.join(format!("{}.{}", page_id, ext)))
    }
}

impl WikiSource for DirectoryWikiSource {
    fn status(&self) -> ConnectionStatus {
        let url = self.credentials.url.as_deref().unwrap_or(NOT_SET);
        let username = self.credentials.username.as_deref().unwrap_or(NOT_SET);
        if self.dir.is_dir() {
            ConnectionStatus::available(url, username)
        } else {
            ConnectionStatus::unavailable(
                format!("Export directory not found: {}", self.dir.display()),
                url,
                username,
            )
        }
    }

    fn fetch_page(&self, page_id: &str) -> Result<WikiPage, IngestError> {
        let html_path = self.page_path(page_id, "html")?;
        if !html_path.is_file() {
            return Err(IngestError::PageNotFound(page_id.to_string()));
        }
        let body_html = fs::read_to_string(&html_path)?;

        let sidecar_path = self.page_path(page_id, "json")?;
        let sidecar: PageSidecar = if sidecar_path.is_file() {
            serde_json::from_str(&fs::read_to_string(&sidecar_path)?)?
        } else {
            PageSidecar::default()
        };

        debug!(page_id = %page_id, bytes = body_html.len(), "Read exported wiki page");

        Ok(WikiPage {
            page_id: page_id.to_string(),
            title: sidecar.title.unwrap_or_else(|| page_id.to_string()),
            space_key: sidecar.space_key.unwrap_or_default(),
            url: sidecar
                .url
                .or_else(|| self.credentials.page_url(page_id))
                .unwrap_or_default(),
            body_html,
        })
    }
}
