// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::model::{FilterState, SortOrder, StatusFilter};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    pub filter: FilterState,
    pub status_line: Option<String>,
}

impl AppState {
    pub fn with_sort_order(sort_order: SortOrder) -> Self {
        Self {
            filter: FilterState {
                sort_order,
                ..FilterState::default()
            },
            status_line: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    SubmitSearch(String),
    SelectStatus(StatusFilter),
    ToggleSort,
    ToggleKeywordFilter,
    SetStatus(String),
    ClearStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    SearchChanged(String),
    StatusFilterChanged(StatusFilter),
    SortOrderChanged(SortOrder),
    KeywordFilterChanged(bool),
    RefreshRequested,
    StatusUpdated(String),
    StatusCleared,
}

impl AppState {
    pub fn dispatch(&mut self, command: AppCommand) -> Vec<AppEvent> {
        match command {
            AppCommand::SubmitSearch(text) => {
                self.filter.search_text = text;
                self.filter.status = StatusFilter::All;
                vec![
                    AppEvent::SearchChanged(self.filter.search_text.clone()),
                    AppEvent::StatusFilterChanged(StatusFilter::All),
                    AppEvent::RefreshRequested,
                ]
            }
            AppCommand::SelectStatus(status) => {
                self.filter.status = status;
                vec![
                    AppEvent::StatusFilterChanged(status),
                    AppEvent::RefreshRequested,
                ]
            }
            AppCommand::ToggleSort => {
                self.filter.sort_order = self.filter.sort_order.toggled();
                vec![
                    AppEvent::SortOrderChanged(self.filter.sort_order),
                    AppEvent::RefreshRequested,
                ]
            }
            AppCommand::ToggleKeywordFilter => {
                self.filter.keyword_filter = !self.filter.keyword_filter;
                let label = if self.filter.keyword_filter {
                    "palavras-chave: ativado"
                } else {
                    "palavras-chave: desativado"
                };
                vec![
                    AppEvent::KeywordFilterChanged(self.filter.keyword_filter),
                    self.set_status(label),
                    AppEvent::RefreshRequested,
                ]
            }
            AppCommand::SetStatus(message) => vec![self.set_status(&message)],
            AppCommand::ClearStatus => {
                self.status_line = None;
                vec![AppEvent::StatusCleared]
            }
        }
    }

    fn set_status(&mut self, message: &str) -> AppEvent {
        self.status_line = Some(message.to_owned());
        AppEvent::StatusUpdated(message.to_owned())
    }
}

pub fn requests_refresh(events: &[AppEvent]) -> bool {
    events.contains(&AppEvent::RefreshRequested)
}

#[cfg(test)]
mod tests {
    use super::{AppCommand, AppEvent, AppState, requests_refresh};
    use crate::model::{SortOrder, StatusFilter};

    #[test]
    fn search_resets_status_filter_to_all() {
        let mut state = AppState::default();
        state.dispatch(AppCommand::SelectStatus(StatusFilter::Amabre));

        let events = state.dispatch(AppCommand::SubmitSearch("  multa ".to_owned()));
        assert_eq!(state.filter.status, StatusFilter::All);
        assert_eq!(state.filter.search_text, "  multa ");
        assert_eq!(state.filter.search_term(), "multa");
        assert!(requests_refresh(&events));
    }

    #[test]
    fn select_status_is_exclusive() {
        let mut state = AppState::default();
        state.dispatch(AppCommand::SelectStatus(StatusFilter::Archived));
        let events = state.dispatch(AppCommand::SelectStatus(StatusFilter::NotArchived));
        assert_eq!(state.filter.status, StatusFilter::NotArchived);
        assert_eq!(
            events,
            vec![
                AppEvent::StatusFilterChanged(StatusFilter::NotArchived),
                AppEvent::RefreshRequested,
            ]
        );
    }

    #[test]
    fn sort_toggle_flips_order() {
        let mut state = AppState::default();
        let events = state.dispatch(AppCommand::ToggleSort);
        assert_eq!(state.filter.sort_order, SortOrder::Desc);
        assert_eq!(events[0], AppEvent::SortOrderChanged(SortOrder::Desc));

        state.dispatch(AppCommand::ToggleSort);
        assert_eq!(state.filter.sort_order, SortOrder::Asc);
    }

    #[test]
    fn keyword_toggle_updates_status_and_refreshes() {
        let mut state = AppState::default();
        let events = state.dispatch(AppCommand::ToggleKeywordFilter);
        assert!(state.filter.keyword_filter);
        assert_eq!(
            events,
            vec![
                AppEvent::KeywordFilterChanged(true),
                AppEvent::StatusUpdated("palavras-chave: ativado".to_owned()),
                AppEvent::RefreshRequested,
            ]
        );

        state.dispatch(AppCommand::ToggleKeywordFilter);
        assert!(!state.filter.keyword_filter);
        assert_eq!(
            state.status_line.as_deref(),
            Some("palavras-chave: desativado")
        );
    }

    #[test]
    fn status_commands_do_not_refresh() {
        let mut state = AppState::with_sort_order(SortOrder::Desc);
        assert_eq!(state.filter.sort_order, SortOrder::Desc);

        let set = state.dispatch(AppCommand::SetStatus("ok".to_owned()));
        assert!(!requests_refresh(&set));
        assert_eq!(state.status_line.as_deref(), Some("ok"));

        let cleared = state.dispatch(AppCommand::ClearStatus);
        assert_eq!(cleared, vec![AppEvent::StatusCleared]);
        assert_eq!(state.status_line, None);
    }
}
