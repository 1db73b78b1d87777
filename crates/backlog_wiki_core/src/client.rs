use std::time::Duration;

use anyhow::{Context, Result, bail};
use reqwest::Method;
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::Value;

use crate::config::BacklogConfig;
use crate::credentials::ApiKey;

/// Wiki page CRUD against one Backlog space. Implemented by the HTTP
/// client and by in-memory doubles in tests.
pub trait WikiApi {
    fn create_wiki(
        &mut self,
        project_id: u64,
        name: &str,
        content: &str,
        notify: bool,
    ) -> Result<WikiPage>;
    fn update_wiki(
        &mut self,
        wiki_id: u64,
        name: &str,
        content: &str,
        notify: bool,
    ) -> Result<WikiPage>;
    fn delete_wiki(&mut self, wiki_id: u64, notify: bool) -> Result<WikiPage>;
    fn get_wiki(&mut self, wiki_id: u64) -> Result<WikiPage>;
    fn request_count(&self) -> usize;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WikiPage {
    pub id: u64,
    pub name: String,
    pub project_id: u64,
    /// Full response payload, kept for operator display.
    pub raw: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WikiPagePayload {
    id: u64,
    name: String,
    project_id: u64,
}

impl WikiPage {
    pub fn from_value(value: Value) -> Result<Self> {
        let payload: WikiPagePayload = serde_json::from_value(value.clone())
            .context("wiki payload is missing id, name or projectId")?;
        Ok(Self {
            id: payload.id,
            name: payload.name,
            project_id: payload.project_id,
            raw: value,
        })
    }
}

#[derive(Debug, Clone)]
pub struct BacklogClientConfig {
    pub base_url: String,
    pub api_key: ApiKey,
    pub user_agent: String,
    pub timeout_ms: u64,
}

impl BacklogClientConfig {
    pub fn from_config(config: &BacklogConfig, api_key: ApiKey) -> Result<Self> {
        Ok(Self {
            base_url: config.base_url()?,
            api_key,
            user_agent: config.user_agent(),
            timeout_ms: config.http_timeout_ms(),
        })
    }
}

pub struct BacklogClient {
    client: Client,
    config: BacklogClientConfig,
    request_count: usize,
}

impl BacklogClient {
    pub fn new(config: BacklogClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .context("failed to build the Backlog HTTP client")?;
        Ok(Self {
            client,
            config,
            request_count: 0,
        })
    }

    /// One attempt per call, no retries. The api key travels as a query
    /// parameter and stays out of the URL carried by error messages.
    fn request_json(
        &mut self,
        method: Method,
        endpoint: &str,
        form: Option<&[(&str, String)]>,
    ) -> Result<Value> {
        let url = format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            endpoint
        );
        self.request_count += 1;

        let mut request = self
            .client
            .request(method.clone(), &url)
            .header("User-Agent", self.config.user_agent.clone())
            .query(&[("apiKey", self.config.api_key.reveal())]);
        if let Some(pairs) = form {
            request = request.form(pairs);
        }

        let response = request
            .send()
            .with_context(|| format!("{method} {url} failed"))?;

        let status = response.status();
        let body = response
            .text()
            .with_context(|| format!("failed to read the response body of {method} {url}"))?;
        if !status.is_success() {
            bail!(
                "{method} {url} returned HTTP {status}\n{}",
                format_error_detail(&body)
            );
        }
        serde_json::from_str(&body)
            .with_context(|| format!("{method} {url} returned a body that is not valid JSON"))
    }
}

impl WikiApi for BacklogClient {
    fn create_wiki(
        &mut self,
        project_id: u64,
        name: &str,
        content: &str,
        notify: bool,
    ) -> Result<WikiPage> {
        let form = [
            ("projectId", project_id.to_string()),
            ("name", name.to_string()),
            ("content", content.to_string()),
            ("mailNotify", mail_notify_value(notify).to_string()),
        ];
        WikiPage::from_value(self.request_json(Method::POST, "wikis", Some(&form))?)
    }

    fn update_wiki(
        &mut self,
        wiki_id: u64,
        name: &str,
        content: &str,
        notify: bool,
    ) -> Result<WikiPage> {
        let form = [
            ("name", name.to_string()),
            ("content", content.to_string()),
            ("mailNotify", mail_notify_value(notify).to_string()),
        ];
        WikiPage::from_value(self.request_json(
            Method::PATCH,
            &format!("wikis/{wiki_id}"),
            Some(&form),
        )?)
    }

    fn delete_wiki(&mut self, wiki_id: u64, notify: bool) -> Result<WikiPage> {
        let form = [("mailNotify", mail_notify_value(notify).to_string())];
        WikiPage::from_value(self.request_json(
            Method::DELETE,
            &format!("wikis/{wiki_id}"),
            Some(&form),
        )?)
    }

    fn get_wiki(&mut self, wiki_id: u64) -> Result<WikiPage> {
        WikiPage::from_value(self.request_json(Method::GET, &format!("wikis/{wiki_id}"), None)?)
    }

    fn request_count(&self) -> usize {
        self.request_count
    }
}

/// Backlog expects the literal strings "true"/"false" for mailNotify.
fn mail_notify_value(notify: bool) -> &'static str {
    if notify { "true" } else { "false" }
}

fn format_error_detail(body: &str) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(detail) => serde_json::to_string_pretty(&detail).unwrap_or_else(|_| body.to_string()),
        Err(_) => body.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{WikiPage, format_error_detail, mail_notify_value};

    #[test]
    fn mail_notify_serializes_as_literal_text() {
        assert_eq!(mail_notify_value(true), "true");
        assert_eq!(mail_notify_value(false), "false");
    }

    #[test]
    fn wiki_page_parses_a_camel_case_payload() {
        let payload = json!({
            "id": 12345,
            "projectId": 1234567890,
            "name": "Release Notes",
            "content": "body",
            "tags": []
        });
        let page = WikiPage::from_value(payload.clone()).expect("parse");
        assert_eq!(page.id, 12345);
        assert_eq!(page.project_id, 1234567890);
        assert_eq!(page.name, "Release Notes");
        assert_eq!(page.raw, payload);
    }

    #[test]
    fn wiki_page_rejects_payloads_without_an_id() {
        let error = WikiPage::from_value(json!({"name": "x"})).expect_err("must fail");
        assert!(error.to_string().contains("missing id, name or projectId"));
    }

    #[test]
    fn error_detail_pretty_prints_json_bodies() {
        let detail = format_error_detail(r#"{"errors":[{"message":"No such project"}]}"#);
        assert!(detail.contains("No such project"));
        assert!(detail.contains('\n'));
    }

    #[test]
    fn error_detail_passes_plain_text_through() {
        assert_eq!(format_error_detail("Bad Gateway\n"), "Bad Gateway");
    }
}
