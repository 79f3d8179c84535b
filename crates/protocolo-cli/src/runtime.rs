// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use protocolo_api::Client;
use protocolo_app::{ExportReceipt, ProtocolId, ProtocolPage, QueryParams, RecordDetail};
use protocolo_tui::{AppRuntime, InternalEvent};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use std::thread;
use tracing::debug;

/// Serves the UI from the protocol HTTP API. Requests issued through the
/// `spawn_*` hooks run on their own threads so the event loop never blocks.
pub struct ApiRuntime {
    client: Client,
    export_dir: PathBuf,
}

impl ApiRuntime {
    pub fn new(client: Client, export_dir: PathBuf) -> Self {
        Self { client, export_dir }
    }
}

fn save_export(client: &Client, export_dir: &Path, ids: &[ProtocolId]) -> Result<ExportReceipt> {
    let file = client.export(ids)?;
    fs::create_dir_all(export_dir)
        .with_context(|| format!("create export directory {}", export_dir.display()))?;

    let path = export_dir.join(&file.filename);
    fs::write(&path, &file.bytes).with_context(|| format!("write export {}", path.display()))?;
    debug!(path = %path.display(), bytes = file.bytes.len(), "export written");
    Ok(ExportReceipt {
        path,
        count: ids.len(),
    })
}

fn error_text(error: anyhow::Error) -> String {
    format!("{error:#}")
}

impl AppRuntime for ApiRuntime {
    fn load_last_update(&mut self) -> Result<Option<String>> {
        self.client.db_last_update()
    }

    fn load_protocols(&mut self, query: &QueryParams) -> Result<ProtocolPage> {
        self.client.list_protocols(query)
    }

    fn load_detail(&mut self, id: &ProtocolId, search: &str) -> Result<RecordDetail> {
        self.client.protocol_detail(id, search)
    }

    fn export_protocols(&mut self, ids: &[ProtocolId]) -> Result<ExportReceipt> {
        save_export(&self.client, &self.export_dir, ids)
    }

    fn remove_protocol(&mut self, id: &ProtocolId) -> Result<bool> {
        self.client.remove(id)
    }

    fn spawn_last_update(&mut self, tx: Sender<InternalEvent>) -> Result<()> {
        let client = self.client.clone();
        thread::spawn(move || {
            let result = client.db_last_update().map_err(error_text);
            let _ = tx.send(InternalEvent::LastUpdateLoaded(result));
        });
        Ok(())
    }

    fn spawn_protocols(
        &mut self,
        request_id: u64,
        query: &QueryParams,
        tx: Sender<InternalEvent>,
    ) -> Result<()> {
        let client = self.client.clone();
        let query = query.clone();
        thread::spawn(move || {
            let result = client.list_protocols(&query).map_err(error_text);
            let _ = tx.send(InternalEvent::ProtocolsLoaded { request_id, result });
        });
        Ok(())
    }

    fn spawn_detail(
        &mut self,
        request_id: u64,
        id: &ProtocolId,
        search: &str,
        tx: Sender<InternalEvent>,
    ) -> Result<()> {
        let client = self.client.clone();
        let id = id.clone();
        let search = search.to_owned();
        thread::spawn(move || {
            let result = client.protocol_detail(&id, &search).map_err(error_text);
            let _ = tx.send(InternalEvent::DetailLoaded {
                request_id,
                id,
                result,
            });
        });
        Ok(())
    }

    fn spawn_export(&mut self, ids: Vec<ProtocolId>, tx: Sender<InternalEvent>) -> Result<()> {
        let client = self.client.clone();
        let export_dir = self.export_dir.clone();
        thread::spawn(move || {
            let result = save_export(&client, &export_dir, &ids).map_err(error_text);
            let _ = tx.send(InternalEvent::ExportFinished(result));
        });
        Ok(())
    }

    fn spawn_remove(&mut self, id: ProtocolId, tx: Sender<InternalEvent>) -> Result<()> {
        let client = self.client.clone();
        thread::spawn(move || {
            let result = client.remove(&id).map_err(error_text);
            let _ = tx.send(InternalEvent::RemoveFinished { id, result });
        });
        Ok(())
    }
}
