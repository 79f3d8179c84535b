// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow};
use serde_json::{Value, json};
use std::collections::BTreeSet;
use std::io::Read;
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use tiny_http::{Header, Method, Request, Response, Server};
use url::form_urlencoded;

use crate::MockRecord;

const NOT_FOUND_SENTINEL: &str = "Não encontrado";

#[derive(Debug, Default)]
struct MockState {
    records: Vec<MockRecord>,
    keywords: Vec<String>,
    removed: BTreeSet<String>,
    last_update: Option<String>,
    export_filename: Option<String>,
    requests: Vec<String>,
}

/// In-process stand-in for the protocol API, bound to an ephemeral port.
pub struct MockServer {
    base_url: String,
    server: Arc<Server>,
    state: Arc<Mutex<MockState>>,
    handle: Option<JoinHandle<()>>,
}

impl MockServer {
    pub fn start(records: Vec<MockRecord>, keywords: Vec<String>) -> Result<Self> {
        let server = Server::http("127.0.0.1:0")
            .map_err(|error| anyhow!("start mock server: {error}"))?;
        let base_url = format!("http://{}", server.server_addr());
        let server = Arc::new(server);
        let state = Arc::new(Mutex::new(MockState {
            records,
            keywords,
            ..MockState::default()
        }));

        let handle = {
            let server = Arc::clone(&server);
            let state = Arc::clone(&state);
            thread::spawn(move || {
                for request in server.incoming_requests() {
                    handle_request(&state, request);
                }
            })
        };

        Ok(Self {
            base_url,
            server,
            state,
            handle: Some(handle),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn set_last_update(&self, value: Option<&str>) {
        lock(&self.state).last_update = value.map(str::to_owned);
    }

    pub fn set_export_filename(&self, value: Option<&str>) {
        lock(&self.state).export_filename = value.map(str::to_owned);
    }

    /// Request lines seen so far, as `METHOD url`.
    pub fn requests(&self) -> Vec<String> {
        lock(&self.state).requests.clone()
    }

    pub fn removed(&self) -> Vec<String> {
        lock(&self.state).removed.iter().cloned().collect()
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        self.server.unblock();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn lock(state: &Mutex<MockState>) -> MutexGuard<'_, MockState> {
    match state.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

fn handle_request(state: &Mutex<MockState>, mut request: Request) {
    let url = request.url().to_owned();
    let (path, query) = url.split_once('?').unwrap_or((url.as_str(), ""));
    let params: Vec<(String, String)> = form_urlencoded::parse(query.as_bytes())
        .into_owned()
        .collect();
    let method = request.method().clone();

    let mut body = String::new();
    let body_result = request.as_reader().read_to_string(&mut body);

    let outcome = {
        let mut state = lock(state);
        state.requests.push(format!("{method} {url}"));
        match body_result {
            Err(error) => Err(anyhow!("read body: {error}")),
            Ok(_) => route(&mut state, &method, path, &params, &body),
        }
    };

    let response = match outcome {
        Ok(reply) => reply,
        Err(error) => Reply::text(400, error.to_string()),
    };
    let _ = request.respond(response.into_response());
}

struct Reply {
    status: u16,
    body: Vec<u8>,
    content_type: &'static str,
    disposition: Option<String>,
}

impl Reply {
    fn json(value: Value) -> Self {
        Self {
            status: 200,
            body: value.to_string().into_bytes(),
            content_type: "application/json",
            disposition: None,
        }
    }

    fn text(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into().into_bytes(),
            content_type: "text/plain; charset=utf-8",
            disposition: None,
        }
    }

    fn into_response(self) -> Response<std::io::Cursor<Vec<u8>>> {
        let mut response = Response::from_data(self.body).with_status_code(self.status);
        if let Ok(header) = Header::from_bytes("Content-Type", self.content_type) {
            response = response.with_header(header);
        }
        if let Some(disposition) = self.disposition
            && let Ok(header) = Header::from_bytes("Content-Disposition", disposition)
        {
            response = response.with_header(header);
        }
        response
    }
}

fn route(
    state: &mut MockState,
    method: &Method,
    path: &str,
    params: &[(String, String)],
    body: &str,
) -> Result<Reply> {
    match (method, path) {
        (Method::Get, "/api/protocols") => Ok(list_protocols(state, params)),
        (Method::Get, "/protocolo") => Ok(protocol_detail(state, params)),
        (Method::Get, "/api/db_last_update") => Ok(Reply::json(json!({
            "last_update": state.last_update.as_deref().unwrap_or(NOT_FOUND_SENTINEL),
        }))),
        (Method::Post, "/exportar") => export(state, body),
        (Method::Post, "/remover") => remove(state, body),
        _ => Ok(Reply::text(404, "not found")),
    }
}

fn param<'a>(params: &'a [(String, String)], key: &str) -> Option<&'a str> {
    params
        .iter()
        .find(|(name, _)| name == key)
        .map(|(_, value)| value.as_str())
}

fn list_protocols(state: &MockState, params: &[(String, String)]) -> Reply {
    let keyword_filter = param(params, "filter_keywords") == Some("true");
    let base: Vec<&MockRecord> = state
        .records
        .iter()
        .filter(|record| !state.removed.contains(&record.id()))
        .filter(|record| !keyword_filter || record.matches_any(&state.keywords))
        .collect();

    let all = base.len();
    let archived = base.iter().filter(|record| record.is_archived()).count();
    let amabre = base.iter().filter(|record| record.is_amabre()).count();

    let search = param(params, "search")
        .map(|value| value.trim().to_lowercase())
        .filter(|value| !value.is_empty());
    let status = param(params, "status");
    let amabre_only = param(params, "amabre") == Some("true");

    let mut selected: Vec<&MockRecord> = base
        .into_iter()
        .filter(|record| match &search {
            Some(term) => record.content.to_lowercase().contains(term),
            None => true,
        })
        .filter(|record| match status {
            Some("arch") => record.is_archived(),
            Some("notarch") => !record.is_archived(),
            _ => true,
        })
        .filter(|record| !amabre_only || record.is_amabre())
        .collect();

    selected.sort_by_key(|record| (record.year, record.number));
    if param(params, "sort_order") == Some("desc") {
        selected.reverse();
    }

    let protocols: Vec<Value> = selected
        .iter()
        .map(|record| {
            json!({
                "id": record.id(),
                "ano": record.year,
                "numero": format!("{:05}", record.number),
                "has_archivado": record.is_archived(),
            })
        })
        .collect();

    Reply::json(json!({
        "protocols": protocols,
        "totals": {
            "todos": all,
            "arch": archived,
            "notarch": all - archived,
            "amabre": amabre,
        },
    }))
}

fn protocol_detail(state: &MockState, params: &[(String, String)]) -> Reply {
    let id = param(params, "id").unwrap_or_default();
    let record = state
        .records
        .iter()
        .find(|record| record.id() == id && !state.removed.contains(id));
    let Some(record) = record else {
        return Reply::json(json!({ "html": "<em>Protocolo não encontrado.</em>" }));
    };

    let search = param(params, "search").unwrap_or_default().trim();
    let mut detail = json!({
        "html": highlight(&record.content, search),
        "arquivado": if record.is_archived() { "yes" } else { "no" },
    });
    if let Some(last_update) = &state.last_update {
        detail["last_update"] = json!(last_update);
    }
    Reply::json(detail)
}

fn export(state: &MockState, body: &str) -> Result<Reply> {
    let payload: Value = serde_json::from_str(body).context("decode export body")?;
    let mut ids: Vec<&str> = payload
        .get("ids")
        .and_then(Value::as_array)
        .map(|ids| ids.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();
    if ids.is_empty() {
        return Ok(Reply::text(400, ""));
    }
    ids.sort_unstable();
    ids.dedup();

    let blocks: Vec<String> = ids
        .iter()
        .filter_map(|id| {
            state
                .records
                .iter()
                .find(|record| record.id() == *id)
                .map(|record| format!("---{id}---{}", record.content))
        })
        .collect();

    let mut reply = Reply::text(200, blocks.join("\n\n"));
    reply.disposition = state
        .export_filename
        .as_ref()
        .map(|name| format!("attachment; filename=\"{name}\""));
    Ok(reply)
}

fn remove(state: &mut MockState, body: &str) -> Result<Reply> {
    let payload: Value = serde_json::from_str(body).context("decode removal body")?;
    let id = payload
        .get("id")
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty());
    let Some(id) = id else {
        return Ok(Reply::json(json!({ "success": false })));
    };
    state.removed.insert(id.to_owned());
    Ok(Reply::json(json!({ "success": true })))
}

/// Wraps whole-word matches of `term` in highlight spans.
fn highlight(content: &str, term: &str) -> String {
    let term = term.to_lowercase();
    if term.is_empty() {
        return content.to_owned();
    }

    let mut out = String::with_capacity(content.len());
    let mut word = String::new();
    let flush = |word: &mut String, out: &mut String| {
        if word.is_empty() {
            return;
        }
        if word.to_lowercase() == term {
            out.push_str("<span class=\"highlight\">");
            out.push_str(word);
            out.push_str("</span>");
        } else {
            out.push_str(word);
        }
        word.clear();
    };
    for ch in content.chars() {
        if ch.is_alphanumeric() {
            word.push(ch);
        } else {
            flush(&mut word, &mut out);
            out.push(ch);
        }
    }
    flush(&mut word, &mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::{MockServer, highlight};
    use crate::{MockRecord, keywords};
    use anyhow::Result;
    use protocolo_api::Client;
    use protocolo_app::{FilterState, ProtocolId, StatusFilter, build_query};
    use std::time::Duration;

    fn fixture() -> Vec<MockRecord> {
        vec![
            MockRecord::new(2024, 1, "Pedido de poda. Arquiva-se o protocolo."),
            MockRecord::new(2024, 2, "Relata enchente na rua."),
            MockRecord::new(2024, 3, "Encaminhado à AMABRE."),
        ]
    }

    #[test]
    fn highlight_wraps_whole_words_only() {
        assert_eq!(
            highlight("Multa e multas. MULTA!", "multa"),
            "<span class=\"highlight\">Multa</span> e multas. <span class=\"highlight\">MULTA</span>!"
        );
        assert_eq!(highlight("texto", ""), "texto");
    }

    #[test]
    fn list_honors_filters_and_totals() -> Result<()> {
        let server = MockServer::start(fixture(), keywords())?;
        let client = Client::new(server.base_url(), Duration::from_secs(2))?;

        let all = client.list_protocols(&build_query(&FilterState::default()))?;
        assert_eq!(all.protocols.len(), 3);
        assert_eq!(all.totals.all, 3);
        assert_eq!(all.totals.archived, 1);
        assert_eq!(all.totals.not_archived, 2);
        assert_eq!(all.totals.amabre, 1);

        let archived = client.list_protocols(&build_query(&FilterState {
            status: StatusFilter::Archived,
            ..FilterState::default()
        }))?;
        assert_eq!(archived.protocols.len(), 1);
        assert!(archived.protocols[0].archived);

        let keyword = client.list_protocols(&build_query(&FilterState {
            keyword_filter: true,
            ..FilterState::default()
        }))?;
        assert_eq!(keyword.totals.all, 1);
        assert_eq!(keyword.protocols[0].id, ProtocolId::parse("2024/00002")?);
        Ok(())
    }

    #[test]
    fn removal_hides_record_from_later_lists() -> Result<()> {
        let server = MockServer::start(fixture(), keywords())?;
        let client = Client::new(server.base_url(), Duration::from_secs(2))?;

        assert!(client.remove(&ProtocolId::parse("2024/00001")?)?);
        let page = client.list_protocols(&build_query(&FilterState::default()))?;
        assert_eq!(page.totals.all, 2);
        assert_eq!(page.totals.archived, 0);
        assert!(
            page.protocols
                .iter()
                .all(|record| record.id.as_str() != "2024/00001")
        );
        assert_eq!(server.removed(), vec!["2024/00001".to_owned()]);
        assert!(
            server
                .requests()
                .iter()
                .any(|line| line.starts_with("POST /remover"))
        );
        Ok(())
    }
}
