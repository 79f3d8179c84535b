// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::ids::ProtocolId;

/// Server answers `/api/db_last_update` with this value when it has no
/// timestamp to report.
pub const LAST_UPDATE_SENTINEL: &str = "Não encontrado";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StatusFilter {
    #[default]
    All,
    Archived,
    NotArchived,
    Amabre,
}

impl StatusFilter {
    pub const ALL: [Self; 4] = [Self::All, Self::Archived, Self::NotArchived, Self::Amabre];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Archived => "arch",
            Self::NotArchived => "notarch",
            Self::Amabre => "amabre",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "all" => Some(Self::All),
            "arch" => Some(Self::Archived),
            "notarch" => Some(Self::NotArchived),
            "amabre" => Some(Self::Amabre),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::All => "Todos",
            Self::Archived => "Arquivados (+)",
            Self::NotArchived => "Não arquivados",
            Self::Amabre => "AMABRE",
        }
    }

    pub const fn count(self, totals: &Totals) -> u64 {
        match self {
            Self::All => totals.all,
            Self::Archived => totals.archived,
            Self::NotArchived => totals.not_archived,
            Self::Amabre => totals.amabre,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "asc" => Some(Self::Asc),
            "desc" => Some(Self::Desc),
            _ => None,
        }
    }

    pub const fn toggled(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Asc => "A-Z",
            Self::Desc => "Z-A",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterState {
    pub search_text: String,
    pub status: StatusFilter,
    pub keyword_filter: bool,
    pub sort_order: SortOrder,
}

impl FilterState {
    /// Search text as it is sent to the server.
    pub fn search_term(&self) -> &str {
        self.search_text.trim()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordSummary {
    pub id: ProtocolId,
    #[serde(rename = "ano")]
    pub year: i32,
    #[serde(rename = "numero")]
    pub number: String,
    #[serde(rename = "has_archivado", default)]
    pub archived: bool,
}

impl RecordSummary {
    pub fn label(&self) -> String {
        let mut label = format!("{}/{}", self.year, self.number);
        if self.archived {
            label.push_str(" +");
        }
        label
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchivedStatus {
    Yes,
    No,
}

impl ArchivedStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Yes => "Sim",
            Self::No => "Não",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RecordDetail {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_update: Option<String>,
    #[serde(rename = "arquivado", default, skip_serializing_if = "Option::is_none")]
    pub archived: Option<ArchivedStatus>,
    #[serde(default)]
    pub html: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Totals {
    #[serde(rename = "todos")]
    pub all: u64,
    #[serde(rename = "arch")]
    pub archived: u64,
    #[serde(rename = "notarch")]
    pub not_archived: u64,
    pub amabre: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProtocolPage {
    pub totals: Totals,
    pub protocols: Vec<RecordSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportReceipt {
    pub path: PathBuf,
    pub count: usize,
}
