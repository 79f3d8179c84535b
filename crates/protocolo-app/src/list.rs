// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::ids::ProtocolId;
use crate::model::RecordSummary;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavDirection {
    Next,
    Prev,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListEntry {
    pub record: RecordSummary,
    pub hidden: bool,
}

/// In-memory model of the protocol list pane. The rendered list is a
/// projection of the visible entries, in server order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ListModel {
    entries: Vec<ListEntry>,
    selected: Option<ProtocolId>,
}

impl ListModel {
    /// Replaces every entry and drops the selection. Returns the id that
    /// should be auto-selected, if any.
    pub fn replace(&mut self, records: Vec<RecordSummary>) -> Option<ProtocolId> {
        self.entries = records
            .into_iter()
            .map(|record| ListEntry {
                record,
                hidden: false,
            })
            .collect();
        self.selected = None;
        self.visible().next().map(|entry| entry.record.id.clone())
    }

    pub fn entries(&self) -> &[ListEntry] {
        &self.entries
    }

    pub fn visible(&self) -> impl Iterator<Item = &ListEntry> {
        self.entries.iter().filter(|entry| !entry.hidden)
    }

    pub fn visible_len(&self) -> usize {
        self.visible().count()
    }

    pub fn is_empty(&self) -> bool {
        self.visible_len() == 0
    }

    pub fn visible_ids(&self) -> Vec<ProtocolId> {
        self.visible().map(|entry| entry.record.id.clone()).collect()
    }

    pub fn contains(&self, id: &ProtocolId) -> bool {
        self.visible().any(|entry| &entry.record.id == id)
    }

    pub fn selected(&self) -> Option<&ProtocolId> {
        self.selected.as_ref()
    }

    /// Position of the selection among visible entries.
    pub fn selected_index(&self) -> Option<usize> {
        let selected = self.selected.as_ref()?;
        self.visible().position(|entry| &entry.record.id == selected)
    }

    /// Exclusive selection. Returns `false` when `id` is not a visible entry.
    pub fn select(&mut self, id: &ProtocolId) -> bool {
        if !self.contains(id) {
            return false;
        }
        self.selected = Some(id.clone());
        true
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    /// Entry reached by moving one step from the selection, wrapping at both
    /// ends. With no selection `Next` lands on the first entry and `Prev` on
    /// the last.
    pub fn neighbor(&self, direction: NavDirection) -> Option<ProtocolId> {
        let len = self.visible_len();
        if len == 0 {
            return None;
        }
        let target = match (self.selected_index(), direction) {
            (Some(index), NavDirection::Next) => (index + 1) % len,
            (Some(index), NavDirection::Prev) => (index + len - 1) % len,
            (None, NavDirection::Next) => 0,
            (None, NavDirection::Prev) => len - 1,
        };
        self.visible().nth(target).map(|entry| entry.record.id.clone())
    }

    pub fn remove(&mut self, id: &ProtocolId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| &entry.record.id != id);
        if self.selected.as_ref() == Some(id) {
            self.selected = None;
        }
        self.entries.len() != before
    }

    /// Hides an entry until the next [`ListModel::replace`].
    pub fn hide(&mut self, id: &ProtocolId) -> bool {
        let Some(entry) = self
            .entries
            .iter_mut()
            .find(|entry| &entry.record.id == id && !entry.hidden)
        else {
            return false;
        };
        entry.hidden = true;
        if self.selected.as_ref() == Some(id) {
            self.selected = None;
        }
        true
    }
}
