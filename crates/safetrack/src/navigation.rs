//! Navigation state for a front end, kept as a plain value.
//!
//! The front end owns a [`Section`] and feeds user actions through
//! [`navigate`]; nothing here is global.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    /// Nothing selected yet, or after exit.
    #[default]
    Home,
    Inspections,
    SiteChecks,
    Organizations,
}

impl Section {
    /// Entries of the main menu, in display order.
    pub const MENU: [Section; 3] = [
        Section::Inspections,
        Section::SiteChecks,
        Section::Organizations,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Section::Home => "Главное меню",
            Section::Inspections => "Проверки ОТиПБ",
            Section::SiteChecks => "Проверки в СП",
            Section::Organizations => "Список ПО",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", content = "section", rename_all = "snake_case")]
pub enum NavAction {
    Open(Section),
    /// Redraw without changing the selection.
    Refresh,
    Exit,
}

/// Next section after `action`. Depends on nothing but its arguments.
pub fn navigate(current: Section, action: NavAction) -> Section {
    match action {
        NavAction::Open(section) => section,
        NavAction::Refresh => current,
        NavAction::Exit => Section::Home,
    }
}
