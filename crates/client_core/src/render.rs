//! Pure projection of view state into what each UI region should show.

use shared::domain::{Car, User};

use crate::{events::Page, validation::CarForm, view_state::ViewState};

pub const DASHBOARD_PREVIEW_LEN: usize = 3;
pub const DASHBOARD_EMPTY_MESSAGE: &str = "No cars yet.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DashboardView {
    Empty(&'static str),
    Preview(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CarRow {
    pub name: String,
    pub connectors: String,
    pub battery_charge_limit: String,
    pub battery_size: String,
    pub max_kw_ac: String,
    pub max_kw_dc: String,
}

fn display_number(value: Option<i64>) -> String {
    value.map_or_else(|| "-".to_string(), |value| value.to_string())
}

impl From<&Car> for CarRow {
    fn from(car: &Car) -> Self {
        Self {
            name: car.name.clone(),
            connectors: car.connector_summary(),
            battery_charge_limit: display_number(car.battery_charge_limit),
            battery_size: display_number(car.battery_size),
            max_kw_ac: display_number(car.max_kw_ac),
            max_kw_dc: display_number(car.max_kw_dc),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CarsTable {
    Empty,
    Rows(Vec<CarRow>),
}

/// One flag drives every loading affordance at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadingIndicator {
    pub loading_text_visible: bool,
    pub submit_text_visible: bool,
}

impl LoadingIndicator {
    pub fn new(loading: bool) -> Self {
        Self {
            loading_text_visible: loading,
            submit_text_visible: !loading,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub page: Page,
    pub header: Option<String>,
    pub dashboard: DashboardView,
    pub cars_table: CarsTable,
    pub loading: LoadingIndicator,
    pub error: Option<String>,
    pub car_form: CarForm,
}

pub fn dashboard_view(cars: &[Car]) -> DashboardView {
    if cars.is_empty() {
        DashboardView::Empty(DASHBOARD_EMPTY_MESSAGE)
    } else {
        DashboardView::Preview(
            cars.iter()
                .take(DASHBOARD_PREVIEW_LEN)
                .map(|car| car.name.clone())
                .collect(),
        )
    }
}

pub fn cars_table(cars: &[Car]) -> CarsTable {
    if cars.is_empty() {
        CarsTable::Empty
    } else {
        CarsTable::Rows(cars.iter().map(CarRow::from).collect())
    }
}

pub fn project(state: &ViewState, user: Option<&User>) -> Frame {
    Frame {
        page: state.current_page,
        header: user.map(|user| user.username.clone()),
        dashboard: dashboard_view(&state.cars),
        cars_table: cars_table(&state.cars),
        loading: LoadingIndicator::new(state.loading),
        error: state.error.clone(),
        car_form: state.car_form.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::domain::{Connector, ConnectorKind};

    fn car(name: &str) -> Car {
        Car {
            name: name.to_string(),
            connectors: None,
            battery_charge_limit: Some(80),
            battery_size: Some(60),
            max_kw_ac: Some(11),
            max_kw_dc: Some(100),
        }
    }

    #[test]
    fn dashboard_previews_first_three_in_order() {
        let cars: Vec<Car> = ["a", "b", "c", "d"].into_iter().map(car).collect();
        assert_eq!(
            dashboard_view(&cars),
            DashboardView::Preview(vec!["a".into(), "b".into(), "c".into()])
        );
        assert_eq!(dashboard_view(&[]), DashboardView::Empty("No cars yet."));
    }

    #[test]
    fn cars_table_shows_every_car_with_connector_fallback() {
        let mut with_connectors = car("Ioniq");
        with_connectors.connectors = Some(vec![
            Connector {
                kind: Some(ConnectorKind::Plain("ccs".into())),
            },
            Connector {
                kind: Some(ConnectorKind::Tagged {
                    value: "type_2".into(),
                }),
            },
        ]);
        let cars = vec![with_connectors, car("Zoe")];

        let CarsTable::Rows(rows) = cars_table(&cars) else {
            panic!("expected rows");
        };
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].connectors, "ccs, type_2");
        assert_eq!(rows[1].connectors, "-");
        assert_eq!(rows[1].max_kw_dc, "100");

        let mut sparse = car("Kona");
        sparse.battery_size = None;
        assert_eq!(CarRow::from(&sparse).battery_size, "-");
        assert_eq!(cars_table(&[]), CarsTable::Empty);
    }

    #[test]
    fn loading_flag_swaps_every_affordance_together() {
        let on = LoadingIndicator::new(true);
        assert!(on.loading_text_visible && !on.submit_text_visible);
        let off = LoadingIndicator::new(false);
        assert!(!off.loading_text_visible && off.submit_text_visible);
    }

    #[test]
    fn header_follows_user_presence() {
        let state = ViewState::default();
        assert_eq!(project(&state, None).header, None);
        let alice = User::new("alice");
        assert_eq!(project(&state, Some(&alice)).header.as_deref(), Some("alice"));
    }
}
