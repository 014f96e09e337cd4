//! DOI resolution against the CrossRef REST API.

use super::AcquisitionError;
use regex::Regex;
use reqwest::Client;
use serde::Deserialize;
use std::sync::LazyLock;

static JATS_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"</?jats:[^>]*>").expect("valid JATS tag pattern"));

/// Descriptive fields pulled from a CrossRef work record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DoiMetadata {
    /// First title, or empty.
    pub title: String,
    /// First container title (journal), or empty.
    pub journal: String,
    /// Author family names, or organisation names.
    pub authors: Vec<String>,
    /// Abstract with JATS markup removed.
    pub abstract_text: String,
}

#[derive(Debug, Deserialize)]
struct WorkResponse {
    message: WorkMessage,
}

#[derive(Debug, Deserialize)]
struct WorkMessage {
    #[serde(default)]
    title: Vec<String>,
    #[serde(rename = "container-title", default)]
    container_title: Vec<String>,
    #[serde(default)]
    author: Vec<WorkAuthor>,
    #[serde(rename = "abstract", default)]
    abstract_text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WorkAuthor {
    family: Option<String>,
    name: Option<String>,
}

/// Remove `<jats:*>` wrapper tags and trim the result.
pub fn strip_jats_markup(raw: &str) -> String {
    JATS_TAG.replace_all(raw, "").trim().to_string()
}

/// Build the text blob that stands in for a paper body when only metadata is available.
pub fn compose_doi_text(metadata: &DoiMetadata) -> String {
    format!(
        "Title: {}\nJournal: {}\nAuthors: {}\n\nAbstract: {}",
        metadata.title,
        metadata.journal,
        metadata.authors.join(", "),
        metadata.abstract_text
    )
}

pub(super) async fn resolve_doi(
    http: &Client,
    base_url: &str,
    doi: &str,
) -> Result<DoiMetadata, AcquisitionError> {
    let url = format!(
        "{}/works/{}",
        base_url.trim_end_matches('/'),
        urlencoding::encode(doi)
    );
    let not_found = |reason: String| AcquisitionError::DoiNotFound {
        doi: doi.to_string(),
        reason,
    };

    let response = http
        .get(&url)
        .send()
        .await
        .map_err(|error| not_found(format!("registry request failed: {error}")))?;

    if !response.status().is_success() {
        return Err(not_found(format!(
            "registry returned {}",
            response.status()
        )));
    }

    let work: WorkResponse = response
        .json()
        .await
        .map_err(|error| not_found(format!("malformed registry record: {error}")))?;

    let message = work.message;
    let metadata = DoiMetadata {
        title: message.title.into_iter().next().unwrap_or_default(),
        journal: message.container_title.into_iter().next().unwrap_or_default(),
        authors: message
            .author
            .into_iter()
            .filter_map(|author| author.family.or(author.name))
            .collect(),
        abstract_text: message
            .abstract_text
            .as_deref()
            .map(strip_jats_markup)
            .unwrap_or_default(),
    };
    tracing::debug!(doi, title = %metadata.title, "Resolved DOI");
    Ok(metadata)
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::{Method::GET, MockServer};
    use serde_json::json;

    #[test]
    fn strip_jats_markup_removes_wrappers() {
        let raw = "<jats:title>Abstract</jats:title><jats:p>We study <jats:italic>things</jats:italic>.</jats:p>";
        assert_eq!(strip_jats_markup(raw), "AbstractWe study things.");
        assert_eq!(strip_jats_markup("  plain  "), "plain");
    }

    #[test]
    fn compose_doi_text_layout() {
        let metadata = DoiMetadata {
            title: "Attention".into(),
            journal: "NeurIPS".into(),
            authors: vec!["Vaswani".into(), "Shazeer".into()],
            abstract_text: "Transformers.".into(),
        };
        assert_eq!(
            compose_doi_text(&metadata),
            "Title: Attention\nJournal: NeurIPS\nAuthors: Vaswani, Shazeer\n\nAbstract: Transformers."
        );
    }

    #[tokio::test]
    async fn resolves_crossref_record() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path_contains("/works/")
                    .path_contains("xyz123");
                then.status(200).json_body(json!({
                    "status": "ok",
                    "message": {
                        "title": ["A Study of Things"],
                        "container-title": ["Journal of Stuff"],
                        "author": [
                            { "given": "Ada", "family": "Lovelace" },
                            { "name": "The Consortium" },
                            { "given": "Nobody" }
                        ],
                        "abstract": "<jats:p>Things were studied.</jats:p>"
                    }
                }));
            })
            .await;

        let metadata = resolve_doi(&Client::new(), &server.base_url(), "10.1000/xyz123")
            .await
            .expect("metadata");

        mock.assert_async().await;
        assert_eq!(metadata.title, "A Study of Things");
        assert_eq!(metadata.journal, "Journal of Stuff");
        assert_eq!(metadata.authors, vec!["Lovelace", "The Consortium"]);
        assert_eq!(metadata.abstract_text, "Things were studied.");
    }

    #[tokio::test]
    async fn missing_fields_default_to_empty() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path_contains("/works/");
                then.status(200).json_body(json!({ "message": {} }));
            })
            .await;

        let metadata = resolve_doi(&Client::new(), &server.base_url(), "10.1/empty")
            .await
            .expect("metadata");
        assert_eq!(metadata, DoiMetadata::default());
    }

    #[tokio::test]
    async fn non_success_status_is_not_found() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path_contains("/works/");
                then.status(404).body("Resource not found.");
            })
            .await;

        let error = resolve_doi(&Client::new(), &server.base_url(), "10.1/missing")
            .await
            .unwrap_err();
        assert!(matches!(
            error,
            AcquisitionError::DoiNotFound { ref doi, ref reason } if doi == "10.1/missing" && reason.contains("404")
        ));
    }
}
