use std::{fmt, str::FromStr};

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Page {
    #[default]
    Login,
    Dashboard,
    Cars,
    AddCar,
}

impl Page {
    pub const ALL: [Page; 4] = [Page::Login, Page::Dashboard, Page::Cars, Page::AddCar];

    pub fn name(self) -> &'static str {
        match self {
            Page::Login => "login",
            Page::Dashboard => "dashboard",
            Page::Cars => "cars",
            Page::AddCar => "add-car",
        }
    }

    /// Pages that display the car list and refetch it on entry.
    pub fn shows_cars(self) -> bool {
        matches!(self, Page::Dashboard | Page::Cars)
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown page '{0}'")]
pub struct UnknownPage(pub String);

impl FromStr for Page {
    type Err = UnknownPage;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized = raw.trim().to_ascii_lowercase().replace('_', "-");
        Page::ALL
            .into_iter()
            .find(|page| page.name() == normalized)
            .ok_or_else(|| UnknownPage(raw.to_string()))
    }
}

/// Signals from the view state machine to whatever draws it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewEvent {
    Render { page: Page },
    CarsUpdated { count: usize },
    LoadingChanged(bool),
    Error(String),
    FormReset,
}
