// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, anyhow};
use protocolo_api::{Client, DEFAULT_EXPORT_FILENAME};
use protocolo_app::{FilterState, ProtocolId, SortOrder, StatusFilter, build_query};
use std::io::Read;
use std::thread;
use std::time::Duration;
use tiny_http::{Header, Method, Response, Server};

fn json_header() -> Header {
    Header::from_bytes("Content-Type", "application/json").expect("valid content type header")
}

fn start_server() -> Result<(Server, String)> {
    let server =
        Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
    let addr = format!("http://{}", server.server_addr());
    Ok((server, addr))
}

#[test]
fn unreachable_server_error_names_base_url() {
    let client =
        Client::new("http://127.0.0.1:1", Duration::from_millis(50)).expect("client should build");

    let error = client
        .db_last_update()
        .expect_err("last update should fail for unreachable endpoint");
    let message = error.to_string();
    assert!(message.contains("cannot reach http://127.0.0.1:1"));
    assert!(message.contains("protocol server running"));
}

#[test]
fn list_protocols_sends_query_and_decodes_page() -> Result<()> {
    let (server, addr) = start_server()?;

    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        assert_eq!(request.method(), &Method::Get);
        assert_eq!(
            request.url(),
            "/api/protocols?search=taxa+de+lixo&status=notarch&sort_order=desc"
        );
        let body = r#"{
            "protocols": [{"id": "2023/00042", "ano": 2023, "numero": "00042", "has_archivado": false}],
            "totals": {"todos": 5, "arch": 2, "notarch": 3, "amabre": 0}
        }"#;
        let response = Response::from_string(body)
            .with_status_code(200)
            .with_header(json_header());
        request.respond(response).expect("response should succeed");
    });

    let client = Client::new(&addr, Duration::from_secs(1))?;
    let page = client.list_protocols(&build_query(&FilterState {
        search_text: " taxa de lixo ".to_owned(),
        status: StatusFilter::NotArchived,
        keyword_filter: false,
        sort_order: SortOrder::Desc,
    }))?;

    assert_eq!(page.protocols.len(), 1);
    assert_eq!(page.protocols[0].id, ProtocolId::parse("2023/00042")?);
    assert_eq!(page.totals.not_archived, 3);

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn list_protocols_surfaces_non_success_status() -> Result<()> {
    let (server, addr) = start_server()?;

    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        let response = Response::from_string("database is locked").with_status_code(503);
        request.respond(response).expect("response should succeed");
    });

    let client = Client::new(&addr, Duration::from_secs(1))?;
    let error = client
        .list_protocols(&build_query(&FilterState::default()))
        .expect_err("503 should fail");
    assert_eq!(error.to_string(), "server error (503): database is locked");

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn malformed_list_body_is_reported() -> Result<()> {
    let (server, addr) = start_server()?;

    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        let response = Response::from_string(r#"{"protocols": "nope"}"#)
            .with_status_code(200)
            .with_header(json_header());
        request.respond(response).expect("response should succeed");
    });

    let client = Client::new(&addr, Duration::from_secs(1))?;
    let error = client
        .list_protocols(&build_query(&FilterState::default()))
        .expect_err("malformed body should fail");
    assert!(error.to_string().contains("decode protocol list"));

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn detail_forwards_id_and_trimmed_search() -> Result<()> {
    let (server, addr) = start_server()?;

    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        assert_eq!(request.url(), "/protocolo?id=2024%2F00007&search=multa");
        let body = r#"{"html": "texto <span class=\"highlight\">multa</span>", "arquivado": "yes"}"#;
        let response = Response::from_string(body)
            .with_status_code(200)
            .with_header(json_header());
        request.respond(response).expect("response should succeed");
    });

    let client = Client::new(&addr, Duration::from_secs(1))?;
    let detail = client.protocol_detail(&ProtocolId::parse("2024/00007")?, "  multa ")?;
    assert!(detail.html.contains("highlight"));
    assert_eq!(detail.archived.map(|status| status.label()), Some("Sim"));
    assert_eq!(detail.last_update, None);

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn last_update_maps_sentinel_to_none() -> Result<()> {
    let (server, addr) = start_server()?;

    let handle = thread::spawn(move || {
        for body in [
            r#"{"last_update": "17/10/2026 22:15"}"#,
            r#"{"last_update": "Não encontrado"}"#,
        ] {
            let request = server.recv().expect("request expected");
            assert_eq!(request.url(), "/api/db_last_update");
            let response = Response::from_string(body)
                .with_status_code(200)
                .with_header(json_header());
            request.respond(response).expect("response should succeed");
        }
    });

    let client = Client::new(&addr, Duration::from_secs(1))?;
    assert_eq!(
        client.db_last_update()?.as_deref(),
        Some("17/10/2026 22:15")
    );
    assert_eq!(client.db_last_update()?, None);

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn export_posts_ids_and_reads_disposition() -> Result<()> {
    let (server, addr) = start_server()?;

    let handle = thread::spawn(move || {
        for disposition in [Some("attachment; filename=\"Exportados 01.txt\""), None] {
            let mut request = server.recv().expect("request expected");
            assert_eq!(request.method(), &Method::Post);
            assert_eq!(request.url(), "/exportar");
            let mut body = String::new();
            request
                .as_reader()
                .read_to_string(&mut body)
                .expect("body should read");
            assert_eq!(body, r#"{"ids":["2024/00001","2024/00002"]}"#);

            let mut response = Response::from_string("---2024/00001---texto").with_status_code(200);
            if let Some(value) = disposition {
                response = response.with_header(
                    Header::from_bytes("Content-Disposition", value)
                        .expect("valid disposition header"),
                );
            }
            request.respond(response).expect("response should succeed");
        }
    });

    let client = Client::new(&addr, Duration::from_secs(1))?;
    let ids = vec![
        ProtocolId::parse("2024/00001")?,
        ProtocolId::parse("2024/00002")?,
    ];

    let named = client.export(&ids)?;
    assert_eq!(named.filename, "Exportados 01.txt");
    assert_eq!(named.bytes, b"---2024/00001---texto");

    let fallback = client.export(&ids)?;
    assert_eq!(fallback.filename, DEFAULT_EXPORT_FILENAME);

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn export_without_ids_never_hits_the_network() -> Result<()> {
    let client = Client::new("http://127.0.0.1:1", Duration::from_millis(50))?;
    let error = client.export(&[]).expect_err("empty export should fail");
    assert!(error.to_string().contains("at least one"));
    Ok(())
}

#[test]
fn remove_reports_server_verdict() -> Result<()> {
    let (server, addr) = start_server()?;

    let handle = thread::spawn(move || {
        for body in [r#"{"success": true}"#, r#"{"success": false}"#] {
            let mut request = server.recv().expect("request expected");
            assert_eq!(request.url(), "/remover");
            let mut payload = String::new();
            request
                .as_reader()
                .read_to_string(&mut payload)
                .expect("body should read");
            assert_eq!(payload, r#"{"id":"2022/00310"}"#);
            let response = Response::from_string(body)
                .with_status_code(200)
                .with_header(json_header());
            request.respond(response).expect("response should succeed");
        }
    });

    let client = Client::new(&addr, Duration::from_secs(1))?;
    let id = ProtocolId::parse("2022/00310")?;
    assert!(client.remove(&id)?);
    assert!(!client.remove(&id)?);

    handle.join().expect("server thread should join");
    Ok(())
}
