// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use protocolo_app::{
    LAST_UPDATE_SENTINEL, ProtocolId, ProtocolPage, QueryParams, RecordDetail,
};
use reqwest::StatusCode;
use reqwest::blocking::{Client as HttpClient, Response};
use reqwest::header::CONTENT_DISPOSITION;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;
use url::Url;

pub const DEFAULT_EXPORT_FILENAME: &str = "Exportados.txt";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct Client {
    base_url: String,
    timeout: Duration,
    http: HttpClient,
}

impl Client {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = base_url.trim().trim_end_matches('/').to_owned();
        if base_url.is_empty() {
            bail!("server.base_url must not be empty");
        }
        let parsed =
            Url::parse(&base_url).with_context(|| format!("parse server URL {base_url:?}"))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            bail!(
                "server URL {base_url:?} must use http or https, got {:?}",
                parsed.scheme()
            );
        }

        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .context("build HTTP client")?;

        Ok(Self {
            base_url,
            timeout,
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn list_protocols(&self, query: &QueryParams) -> Result<ProtocolPage> {
        let mut url = self.endpoint("/api/protocols")?;
        url.set_query(Some(&query.to_query_string()));
        debug!(%url, "fetch protocol list");

        let response = self.get(url)?;
        response.json().context("decode protocol list")
    }

    pub fn protocol_detail(&self, id: &ProtocolId, search: &str) -> Result<RecordDetail> {
        let mut url = self.endpoint("/protocolo")?;
        url.query_pairs_mut()
            .append_pair("id", id.as_str())
            .append_pair("search", search.trim());
        debug!(%url, "fetch protocol detail");

        let response = self.get(url)?;
        response
            .json()
            .with_context(|| format!("decode detail for protocol {id}"))
    }

    /// Returns `None` when the server has no timestamp to report.
    pub fn db_last_update(&self) -> Result<Option<String>> {
        let url = self.endpoint("/api/db_last_update")?;
        debug!(%url, "fetch database last update");

        let response = self.get(url)?;
        let parsed: LastUpdateResponse = response.json().context("decode last update")?;
        Ok(parsed
            .last_update
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty() && value != LAST_UPDATE_SENTINEL))
    }

    pub fn export(&self, ids: &[ProtocolId]) -> Result<ExportFile> {
        if ids.is_empty() {
            bail!("export needs at least one protocol id");
        }
        let url = self.endpoint("/exportar")?;
        debug!(%url, count = ids.len(), "export protocols");

        let response = self.post(url, &ExportRequest { ids })?;
        let filename = filename_from_disposition(
            response
                .headers()
                .get(CONTENT_DISPOSITION)
                .and_then(|value| value.to_str().ok()),
        );
        let bytes = response.bytes().context("read export body")?.to_vec();
        Ok(ExportFile { filename, bytes })
    }

    /// Asks the server to drop a protocol. `Ok(false)` means the server
    /// answered but refused.
    pub fn remove(&self, id: &ProtocolId) -> Result<bool> {
        let url = self.endpoint("/remover")?;
        debug!(%url, %id, "remove protocol");

        let response = self.post(url, &RemoveRequest { id })?;
        let parsed: RemoveResponse = response.json().context("decode removal response")?;
        Ok(parsed.success)
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        let raw = format!("{}{path}", self.base_url);
        Url::parse(&raw).with_context(|| format!("build endpoint URL {raw:?}"))
    }

    fn get(&self, url: Url) -> Result<Response> {
        let response = self
            .http
            .get(url)
            .send()
            .map_err(|error| connection_error(&self.base_url, error))?;
        check_status(response)
    }

    fn post<T: Serialize>(&self, url: Url, body: &T) -> Result<Response> {
        let response = self
            .http
            .post(url)
            .json(body)
            .send()
            .map_err(|error| connection_error(&self.base_url, error))?;
        check_status(response)
    }
}

/// Picks the download name out of a `Content-Disposition` header, falling
/// back to [`DEFAULT_EXPORT_FILENAME`]. Directory components are dropped.
pub fn filename_from_disposition(header: Option<&str>) -> String {
    header
        .and_then(parse_disposition_filename)
        .unwrap_or_else(|| DEFAULT_EXPORT_FILENAME.to_owned())
}

fn parse_disposition_filename(header: &str) -> Option<String> {
    for param in header.split(';') {
        let Some((name, value)) = param.split_once('=') else {
            continue;
        };
        if !name.trim().eq_ignore_ascii_case("filename") {
            continue;
        }
        let value = value
            .trim()
            .trim_matches(|ch| ch == '"' || ch == '\'' || ch == '|');
        let file_name = value.rsplit(['/', '\\']).next().unwrap_or_default().trim();
        if file_name.is_empty() || file_name == "." || file_name == ".." {
            return None;
        }
        return Some(file_name.to_owned());
    }
    None
}

fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().unwrap_or_default();
    Err(clean_error_response(status, &body))
}

fn connection_error(base_url: &str, error: reqwest::Error) -> anyhow::Error {
    anyhow!(
        "cannot reach {} -- is the protocol server running? ({})",
        base_url,
        error
    )
}

fn clean_error_response(status: StatusCode, body: &str) -> anyhow::Error {
    if let Ok(parsed) = serde_json::from_str::<ErrorEnvelope>(body)
        && let Some(error) = parsed.error
        && !error.is_empty()
    {
        return anyhow!("server error ({}): {}", status.as_u16(), error);
    }

    let trimmed = body.trim();
    if !trimmed.is_empty() && trimmed.len() < 100 && !trimmed.contains(['{', '<']) {
        return anyhow!("server error ({}): {}", status.as_u16(), trimmed);
    }

    anyhow!("server returned {}", status.as_u16())
}

#[derive(Debug, Deserialize)]
struct LastUpdateResponse {
    last_update: Option<String>,
}

#[derive(Debug, Serialize)]
struct ExportRequest<'a> {
    ids: &'a [ProtocolId],
}

#[derive(Debug, Serialize)]
struct RemoveRequest<'a> {
    id: &'a ProtocolId,
}

#[derive(Debug, Deserialize)]
struct RemoveResponse {
    #[serde(default)]
    success: bool,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::{
        Client, DEFAULT_EXPORT_FILENAME, clean_error_response, filename_from_disposition,
    };
    use reqwest::StatusCode;
    use std::time::Duration;

    #[test]
    fn disposition_filename_is_unquoted() {
        assert_eq!(
            filename_from_disposition(Some(
                "attachment; filename=\"Exportados 18-10-2026 09-30.txt\""
            )),
            "Exportados 18-10-2026 09-30.txt"
        );
        assert_eq!(
            filename_from_disposition(Some("attachment; filename=lista.txt")),
            "lista.txt"
        );
    }

    #[test]
    fn disposition_without_filename_falls_back() {
        assert_eq!(filename_from_disposition(None), DEFAULT_EXPORT_FILENAME);
        assert_eq!(
            filename_from_disposition(Some("attachment")),
            DEFAULT_EXPORT_FILENAME
        );
        assert_eq!(
            filename_from_disposition(Some("attachment; filename=\"\"")),
            DEFAULT_EXPORT_FILENAME
        );
    }

    #[test]
    fn disposition_filename_ignores_extended_form_and_paths() {
        assert_eq!(
            filename_from_disposition(Some(
                "attachment; filename*=UTF-8''x.txt; filename=\"../../etc/passwd\""
            )),
            "passwd"
        );
        assert_eq!(
            filename_from_disposition(Some("attachment; filename=\"..\"")),
            DEFAULT_EXPORT_FILENAME
        );
    }

    #[test]
    fn error_response_prefers_json_error_field() {
        let error = clean_error_response(StatusCode::BAD_REQUEST, r#"{"error":"ids vazio"}"#);
        assert_eq!(error.to_string(), "server error (400): ids vazio");
    }

    #[test]
    fn error_response_keeps_short_plain_text_and_hides_html() {
        let plain = clean_error_response(StatusCode::INTERNAL_SERVER_ERROR, "db locked\n");
        assert_eq!(plain.to_string(), "server error (500): db locked");

        let html = clean_error_response(
            StatusCode::NOT_FOUND,
            "<!doctype html><title>404 Not Found</title>",
        );
        assert_eq!(html.to_string(), "server returned 404");
    }

    #[test]
    fn client_rejects_empty_and_non_http_urls() {
        assert!(Client::new("  ", Duration::from_secs(1)).is_err());
        let error = Client::new("ftp://example.com", Duration::from_secs(1))
            .expect_err("ftp should be rejected");
        assert!(error.to_string().contains("http or https"));
    }

    #[test]
    fn client_trims_trailing_slashes() {
        let client =
            Client::new("http://localhost:5000///", Duration::from_secs(1)).expect("valid url");
        assert_eq!(client.base_url(), "http://localhost:5000");
        assert_eq!(client.timeout(), Duration::from_secs(1));
    }
}
