// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::collections::VecDeque;

use crate::model::EntityKind;

/// Which input the keyboard is feeding. Dialogs are owned by the list views
/// and take precedence over every mode here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
    Nav,
    Search,
    RatingFilter,
}

impl AppMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Nav => "nav",
            Self::Search => "search",
            Self::RatingFilter => "rating",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    pub mode: AppMode,
    pub active_tab: EntityKind,
    pub status_line: Option<String>,
    pub alerts: VecDeque<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            mode: AppMode::Nav,
            active_tab: EntityKind::Jobs,
            status_line: None,
            alerts: VecDeque::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    NextTab,
    PrevTab,
    SelectTab(EntityKind),
    EnterSearch,
    EnterRatingFilter,
    ExitToNav,
    SetStatus(String),
    ClearStatus,
    RaiseAlert(String),
    DismissAlert,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    ModeChanged(AppMode),
    TabChanged(EntityKind),
    StatusUpdated(String),
    StatusCleared,
    AlertRaised(String),
    AlertDismissed,
}

impl AppState {
    pub fn dispatch(&mut self, command: AppCommand) -> Vec<AppEvent> {
        match command {
            AppCommand::NextTab => self.rotate_tab(1),
            AppCommand::PrevTab => self.rotate_tab(-1),
            AppCommand::SelectTab(tab) => {
                if tab == self.active_tab {
                    return Vec::new();
                }
                self.active_tab = tab;
                self.mode = AppMode::Nav;
                vec![AppEvent::TabChanged(tab)]
            }
            AppCommand::EnterSearch => {
                if self.active_tab != EntityKind::Skills {
                    return vec![self.set_status("search is only on skills")];
                }
                self.mode = AppMode::Search;
                vec![AppEvent::ModeChanged(self.mode)]
            }
            AppCommand::EnterRatingFilter => {
                if self.active_tab != EntityKind::Skills {
                    return vec![self.set_status("rating filter is only on skills")];
                }
                self.mode = AppMode::RatingFilter;
                vec![AppEvent::ModeChanged(self.mode)]
            }
            AppCommand::ExitToNav => {
                self.mode = AppMode::Nav;
                vec![AppEvent::ModeChanged(self.mode)]
            }
            AppCommand::SetStatus(message) => vec![self.set_status(&message)],
            AppCommand::ClearStatus => {
                self.status_line = None;
                vec![AppEvent::StatusCleared]
            }
            AppCommand::RaiseAlert(message) => {
                self.alerts.push_back(message.clone());
                vec![AppEvent::AlertRaised(message)]
            }
            AppCommand::DismissAlert => match self.alerts.pop_front() {
                Some(_) => vec![AppEvent::AlertDismissed],
                None => Vec::new(),
            },
        }
    }

    /// The alert currently blocking input, oldest first.
    pub fn current_alert(&self) -> Option<&str> {
        self.alerts.front().map(String::as_str)
    }

    fn rotate_tab(&mut self, delta: isize) -> Vec<AppEvent> {
        let tabs = EntityKind::ALL;
        let current = tabs
            .iter()
            .position(|tab| *tab == self.active_tab)
            .unwrap_or(0) as isize;
        let len = tabs.len() as isize;
        let next = (current + delta).rem_euclid(len) as usize;
        self.active_tab = tabs[next];
        self.mode = AppMode::Nav;
        vec![AppEvent::TabChanged(self.active_tab)]
    }

    fn set_status(&mut self, message: &str) -> AppEvent {
        self.status_line = Some(message.to_owned());
        AppEvent::StatusUpdated(message.to_owned())
    }
}
