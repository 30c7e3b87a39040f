//! External star-system directory.
//!
//! The directory maps a system name to a stable numeric id and a page
//! URL. [`SystemDirectory`] is the seam the resolver talks to;
//! [`EddbDirectory`] is the HTTP implementation against EDDB:
//!
//! ```text
//! GET {base}/system/search?system[multiname]=<name>
//! -> [{"id": 17072, "name": "Sol", ...}, ...]
//! ```
//!
//! Ids may arrive as numbers or as numeric strings. Entries that do not
//! fit the expected shape are skipped one by one, and a body that is not
//! a JSON array at all counts as "no entries".

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{trace, warn};

/// Errors from the directory service.
#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    /// The HTTP request could not be built, sent or read.
    #[error("directory request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("directory returned {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, for diagnostics.
        body: String,
    },
}

/// One search hit with a usable id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    /// Directory id.
    pub id: i64,
    /// System name as the directory spells it.
    pub name: String,
}

/// A service that can look systems up by name.
#[async_trait]
pub trait SystemDirectory: Send + Sync {
    /// Search for systems matching `name`.
    ///
    /// The result may contain partial matches; callers filter for the
    /// exact name themselves.
    async fn search(&self, name: &str) -> Result<Vec<DirectoryEntry>, DirectoryError>;

    /// Public page URL for a system id.
    fn system_url(&self, id: i64) -> String;
}

/// HTTP client for the EDDB system search.
#[derive(Debug, Clone)]
pub struct EddbDirectory {
    client: reqwest::Client,
    base_url: String,
}

impl EddbDirectory {
    /// Create a client for the directory at `base_url`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, DirectoryError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
        })
    }
}

#[async_trait]
impl SystemDirectory for EddbDirectory {
    async fn search(&self, name: &str) -> Result<Vec<DirectoryEntry>, DirectoryError> {
        let url = format!("{}/system/search", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[("system[multiname]", name)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unable to read error body".to_owned());
            return Err(DirectoryError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        Ok(parse_search_response(&body))
    }

    fn system_url(&self, id: i64) -> String {
        format!("{}/system/{id}", self.base_url)
    }
}

#[derive(Deserialize)]
struct RawEntry {
    id: RawId,
    name: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Number(i64),
    Text(String),
}

impl RawEntry {
    fn into_entry(self) -> Option<DirectoryEntry> {
        let id = match self.id {
            RawId::Number(id) => id,
            RawId::Text(text) => text.trim().parse().ok()?,
        };
        Some(DirectoryEntry {
            id,
            name: self.name,
        })
    }
}

/// Parse a search response body, dropping entries that do not fit.
pub fn parse_search_response(body: &str) -> Vec<DirectoryEntry> {
    let values: Vec<serde_json::Value> = match serde_json::from_str(body) {
        Ok(values) => values,
        Err(e) => {
            warn!(error = %e, "Directory response is not a JSON array");
            return Vec::new();
        }
    };

    values
        .into_iter()
        .filter_map(|value| match serde_json::from_value::<RawEntry>(value) {
            Ok(raw) => raw.into_entry(),
            Err(e) => {
                trace!(error = %e, "Skipping malformed directory entry");
                None
            }
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[test]
    fn numeric_and_string_ids_are_accepted() {
        let entries = parse_search_response(
            r#"[{"id": 17072, "name": "Sol"}, {"id": "42", "name": "Lave"}]"#,
        );
        assert_eq!(
            entries,
            vec![
                DirectoryEntry {
                    id: 17072,
                    name: String::from("Sol"),
                },
                DirectoryEntry {
                    id: 42,
                    name: String::from("Lave"),
                },
            ]
        );
    }

    #[test]
    fn malformed_entries_are_skipped() {
        let entries = parse_search_response(
            r#"[{"id": "abc", "name": "Bad"}, {"name": "NoId"}, 7, {"id": 3, "name": "Diso"}]"#,
        );
        assert_eq!(entries.len(), 1);
        assert_eq!(entries.first().unwrap().name, "Diso");
    }

    #[test]
    fn non_array_body_is_empty() {
        assert!(parse_search_response("<html>maintenance</html>").is_empty());
        assert!(parse_search_response(r#"{"error": "nope"}"#).is_empty());
    }

    #[tokio::test]
    async fn search_sends_multiname_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/system/search"))
            .and(query_param("system[multiname]", "Shinrarta Dezhra"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"[{"id": 12345, "name": "Shinrarta Dezhra"}]"#),
            )
            .expect(1)
            .mount(&server)
            .await;

        let directory = EddbDirectory::new(&server.uri(), Duration::from_secs(5)).unwrap();
        let entries = directory.search("Shinrarta Dezhra").await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries.first().unwrap().id, 12345);
    }

    #[tokio::test]
    async fn error_status_is_a_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/system/search"))
            .respond_with(ResponseTemplate::new(503).set_body_string("down"))
            .mount(&server)
            .await;

        let directory = EddbDirectory::new(&server.uri(), Duration::from_secs(5)).unwrap();
        let err = directory.search("Sol").await.unwrap_err();
        assert!(matches!(err, DirectoryError::Status { status: 503, .. }));
    }

    #[test]
    fn system_url_uses_base() {
        let directory = EddbDirectory::new("https://eddb.io/", Duration::from_secs(1)).unwrap();
        assert_eq!(directory.system_url(17072), "https://eddb.io/system/17072");
    }
}
