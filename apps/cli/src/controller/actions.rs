//! Typed user actions parsed from interactive command lines.

use client_core::{events::UnknownPage, validation::UnknownCarField, CarField, Credentials, Page};
use shared::domain::{ConnectorType, UnknownConnectorType};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiAction {
    Navigate(Page),
    SubmitLogin(Credentials),
    SetField { field: CarField, value: String },
    ToggleConnector(ConnectorType),
    SubmitCar,
    Logout,
    Show,
    Help,
    Quit,
}

impl UiAction {
    pub fn name(&self) -> &'static str {
        match self {
            UiAction::Navigate(_) => "nav",
            UiAction::SubmitLogin(_) => "login",
            UiAction::SetField { .. } => "set",
            UiAction::ToggleConnector(_) => "toggle",
            UiAction::SubmitCar => "submit",
            UiAction::Logout => "logout",
            UiAction::Show => "show",
            UiAction::Help => "help",
            UiAction::Quit => "quit",
        }
    }
}

/// Command word, argument synopsis and help line for every interactive action.
pub const ACTION_TABLE: &[(&str, &str, &str)] = &[
    ("login", "<username> <password>", "sign in"),
    ("nav", "<login|dashboard|cars|add-car>", "switch page"),
    ("dashboard", "", "shortcut for nav dashboard"),
    ("cars", "", "shortcut for nav cars"),
    ("add-car", "", "shortcut for nav add-car"),
    ("set", "<field> <value>", "edit the add-car draft"),
    ("toggle", "<connector>", "check or uncheck a connector type"),
    ("submit", "", "submit the add-car draft"),
    ("logout", "", "sign out"),
    ("show", "", "redraw the current page"),
    ("help", "", "list commands"),
    ("quit", "", "exit"),
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ActionParseError {
    #[error("unknown command '{0}'; type 'help' for a list")]
    UnknownCommand(String),
    #[error("usage: {command} {usage}")]
    Usage {
        command: &'static str,
        usage: &'static str,
    },
    #[error(transparent)]
    Page(#[from] UnknownPage),
    #[error(transparent)]
    Field(#[from] UnknownCarField),
    #[error(transparent)]
    Connector(#[from] UnknownConnectorType),
}

fn usage(command: &str) -> ActionParseError {
    ACTION_TABLE
        .iter()
        .find(|(name, _, _)| *name == command)
        .map(|(name, synopsis, _)| ActionParseError::Usage {
            command: *name,
            usage: *synopsis,
        })
        .unwrap_or_else(|| ActionParseError::UnknownCommand(command.to_string()))
}

pub fn help_text() -> String {
    ACTION_TABLE
        .iter()
        .map(|(name, usage, about)| {
            let synopsis = if usage.is_empty() {
                name.to_string()
            } else {
                format!("{name} {usage}")
            };
            format!("  {synopsis:<44} {about}")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Blank lines parse to `None`.
pub fn parse_action(line: &str) -> Result<Option<UiAction>, ActionParseError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let (command, rest) = match line.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim()),
        None => (line, ""),
    };
    let command = command.to_ascii_lowercase();

    let action = match command.as_str() {
        "login" => {
            let mut parts = rest.split_whitespace();
            match (parts.next(), parts.next(), parts.next()) {
                (Some(username), Some(password), None) => {
                    UiAction::SubmitLogin(Credentials::new(username, password))
                }
                _ => return Err(usage("login")),
            }
        }
        "nav" | "go" => {
            if rest.is_empty() {
                return Err(usage("nav"));
            }
            UiAction::Navigate(rest.parse()?)
        }
        "dashboard" | "cars" | "add-car" | "add_car" => UiAction::Navigate(command.parse()?),
        "set" => {
            let Some((field, value)) = rest.split_once(char::is_whitespace) else {
                // `set name` with nothing after clears the field.
                if rest.is_empty() {
                    return Err(usage("set"));
                }
                return Ok(Some(UiAction::SetField {
                    field: rest.parse()?,
                    value: String::new(),
                }));
            };
            UiAction::SetField {
                field: field.parse()?,
                value: value.trim().to_string(),
            }
        }
        "toggle" => {
            if rest.is_empty() {
                return Err(usage("toggle"));
            }
            UiAction::ToggleConnector(rest.parse()?)
        }
        "submit" => UiAction::SubmitCar,
        "logout" => UiAction::Logout,
        "show" => UiAction::Show,
        "help" | "?" => UiAction::Help,
        "quit" | "exit" => UiAction::Quit,
        _ => return Err(ActionParseError::UnknownCommand(command.clone())),
    };
    Ok(Some(action))
}
