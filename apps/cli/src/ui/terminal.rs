use std::fmt::Write as _;

use client_core::{
    render::{CarRow, CarsTable, DashboardView, LoadingIndicator},
    CarField, CarForm, Frame, Page,
};
use shared::domain::ConnectorType;

const LOADING_TEXT: &str = "Loading...";
const CARS_EMPTY_BLOCK: &str = "No cars registered. Use 'nav add-car' to add one.";
const TABLE_HEADERS: [&str; 6] = ["Name", "Connectors", "Limit %", "Battery kWh", "AC kW", "DC kW"];

/// Formats the visible page of a frame; hidden pages contribute nothing.
pub fn render_frame(frame: &Frame) -> String {
    let mut out = String::new();

    match &frame.header {
        Some(username) => {
            let _ = writeln!(out, "== {} == signed in as {username}", frame.page);
        }
        None => {
            let _ = writeln!(out, "== {} ==", frame.page);
        }
    }
    if let Some(error) = &frame.error {
        let _ = writeln!(out, "! {error}");
    }

    match frame.page {
        Page::Login => {
            out.push_str("Sign in with: login <username> <password>\n");
            push_submit(&mut out, frame.loading, "Sign in");
        }
        Page::Dashboard => {
            push_loading(&mut out, frame.loading);
            match &frame.dashboard {
                DashboardView::Empty(message) => {
                    let _ = writeln!(out, "{message}");
                }
                DashboardView::Preview(names) => {
                    out.push_str("Your cars:\n");
                    for name in names {
                        let _ = writeln!(out, "  - {name}");
                    }
                }
            }
        }
        Page::Cars => {
            push_loading(&mut out, frame.loading);
            match &frame.cars_table {
                CarsTable::Empty => {
                    let _ = writeln!(out, "{CARS_EMPTY_BLOCK}");
                }
                CarsTable::Rows(rows) => out.push_str(&table(rows)),
            }
        }
        Page::AddCar => {
            out.push_str(&car_form(&frame.car_form));
            push_submit(&mut out, frame.loading, "Add car");
        }
    }

    out
}

fn push_loading(out: &mut String, loading: LoadingIndicator) {
    if loading.loading_text_visible {
        let _ = writeln!(out, "{LOADING_TEXT}");
    }
}

/// Submit label and loading text swap together.
fn push_submit(out: &mut String, loading: LoadingIndicator, label: &str) {
    if loading.submit_text_visible {
        let _ = writeln!(out, "[ {label} ]");
    }
    if loading.loading_text_visible {
        let _ = writeln!(out, "[ {LOADING_TEXT} ]");
    }
}

fn car_form(form: &CarForm) -> String {
    let mut out = String::new();
    for field in CarField::ALL {
        let _ = writeln!(out, "  {:<22} {}", field.key(), form.field(field));
    }
    let checkboxes = ConnectorType::ALL
        .into_iter()
        .map(|connector| {
            let mark = if form.connector_types.contains(&connector) {
                'x'
            } else {
                ' '
            };
            format!("[{mark}] {connector}")
        })
        .collect::<Vec<_>>()
        .join("  ");
    let _ = writeln!(out, "  {:<22} {checkboxes}", "connector_types");
    out
}

fn table(rows: &[CarRow]) -> String {
    let cells: Vec<[String; 6]> = rows
        .iter()
        .map(|row| {
            [
                row.name.clone(),
                row.connectors.clone(),
                row.battery_charge_limit.clone(),
                row.battery_size.clone(),
                row.max_kw_ac.clone(),
                row.max_kw_dc.clone(),
            ]
        })
        .collect();

    let mut widths = TABLE_HEADERS.map(str::len);
    for row in &cells {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let line = |values: &[&str]| -> String {
        values
            .iter()
            .zip(widths)
            .map(|(value, width)| format!("{value:<width$}"))
            .collect::<Vec<_>>()
            .join(" | ")
            .trim_end()
            .to_string()
    };

    let mut out = String::new();
    let _ = writeln!(out, "{}", line(&TABLE_HEADERS));
    let _ = writeln!(
        out,
        "{}",
        widths.map(|width| "-".repeat(width)).join("-+-")
    );
    for row in &cells {
        let values: Vec<&str> = row.iter().map(String::as_str).collect();
        let _ = writeln!(out, "{}", line(&values));
    }
    out
}
