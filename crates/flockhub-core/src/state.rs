//! Client-side application state.
//!
//! Theme, navigation drawer and the active church live in one `AppState`
//! value that callers own and pass down explicitly.

use serde::{Deserialize, Serialize};

use crate::config::Config;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub enum ThemeMode {
    Light,
    Dark,
    #[default]
    System,
}

impl ThemeMode {
    pub fn label(&self) -> &'static str {
        match self {
            ThemeMode::Light => "Light",
            ThemeMode::Dark => "Dark",
            ThemeMode::System => "Match system",
        }
    }

    /// Resolve to a concrete scheme given the platform preference.
    pub fn is_dark(&self, system_prefers_dark: bool) -> bool {
        match self {
            ThemeMode::Light => false,
            ThemeMode::Dark => true,
            ThemeMode::System => system_prefers_dark,
        }
    }

    /// Cycle Light -> Dark -> System.
    pub fn next(&self) -> Self {
        match self {
            ThemeMode::Light => ThemeMode::Dark,
            ThemeMode::Dark => ThemeMode::System,
            ThemeMode::System => ThemeMode::Light,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppState {
    pub theme: ThemeMode,
    pub drawer_open: bool,
    active_church_id: Option<String>,
}

impl AppState {
    pub fn from_config(config: &Config) -> Self {
        Self {
            theme: config.theme,
            drawer_open: false,
            active_church_id: config.active_church_id.clone().filter(|id| !id.is_empty()),
        }
    }

    /// Scoping id for church-scoped queries.
    pub fn active_church(&self) -> Option<&str> {
        self.active_church_id.as_deref()
    }

    /// Switch church. Returns true if the selection changed.
    pub fn set_active_church(&mut self, church_id: Option<String>) -> bool {
        let church_id = church_id.filter(|id| !id.is_empty());
        if self.active_church_id == church_id {
            return false;
        }
        self.active_church_id = church_id;
        true
    }

    pub fn toggle_drawer(&mut self) {
        self.drawer_open = !self.drawer_open;
    }

    pub fn cycle_theme(&mut self) {
        self.theme = self.theme.next();
    }

    /// Write the persistent parts back into the configuration.
    pub fn store_in(&self, config: &mut Config) {
        config.theme = self.theme;
        config.active_church_id = self.active_church_id.clone();
    }
}
