use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use shared::domain::Car;
use tokio::{sync::broadcast, task::JoinHandle};
use tracing::{debug, info, warn};

use crate::{
    api::RemoteApi,
    error::{AuthError, CarError},
    events::{Page, ViewEvent},
    render::{self, Frame},
    session::SessionController,
    validation::CarForm,
};

const VIEW_EVENT_CAPACITY: usize = 256;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewState {
    pub current_page: Page,
    /// Server order, replaced wholesale on every successful fetch.
    pub cars: Vec<Car>,
    pub loading: bool,
    pub error: Option<String>,
    pub car_form: CarForm,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

/// Clears the loading flag however the enclosing scope is left.
struct LoadingGuard<'a> {
    machine: &'a ViewStateMachine,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.machine.set_loading(false);
    }
}

pub struct ViewStateMachine {
    session: Arc<SessionController>,
    api: Arc<dyn RemoteApi>,
    state: Mutex<ViewState>,
    events: broadcast::Sender<ViewEvent>,
    latest_refresh: Mutex<Option<JoinHandle<()>>>,
}

impl ViewStateMachine {
    pub fn new(session: Arc<SessionController>, api: Arc<dyn RemoteApi>) -> Arc<Self> {
        let (events, _) = broadcast::channel(VIEW_EVENT_CAPACITY);
        Arc::new(Self {
            session,
            api,
            state: Mutex::new(ViewState::default()),
            events,
            latest_refresh: Mutex::new(None),
        })
    }

    pub fn session(&self) -> &SessionController {
        &self.session
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ViewEvent> {
        self.events.subscribe()
    }

    fn state(&self) -> MutexGuard<'_, ViewState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: ViewEvent) {
        // No subscribers is fine; nothing is drawing yet.
        let _ = self.events.send(event);
    }

    pub fn snapshot(&self) -> ViewState {
        self.state().clone()
    }

    pub fn current_page(&self) -> Page {
        self.state().current_page
    }

    pub fn frame(&self) -> Frame {
        let user = self.session.user();
        render::project(&self.state(), user.as_ref())
    }

    /// Picks the first page: a stored token is verified before anything is shown
    /// as signed in; without one no request is made.
    pub async fn start(self: &Arc<Self>) {
        if !self.session.has_stored_token() {
            self.navigate(Page::Login);
            return;
        }

        match self.session.probe().await {
            Ok(_) => self.navigate(Page::Dashboard),
            Err(err) => {
                info!(%err, "startup session probe failed");
                self.logout();
            }
        }
    }

    pub fn navigate(self: &Arc<Self>, page: Page) {
        self.state().current_page = page;
        debug!(%page, "navigated");
        self.emit(ViewEvent::Render { page });

        if page.shows_cars() {
            let machine = Arc::clone(self);
            let task = tokio::spawn(async move {
                machine.refresh_cars().await;
            });
            // Replacing an older handle detaches that task; it still runs.
            *self
                .latest_refresh
                .lock()
                .unwrap_or_else(PoisonError::into_inner) = Some(task);
        }
    }

    /// Waits for the most recent navigation-triggered refresh, if any. Only
    /// callers that are about to exit need this; navigation never does.
    pub async fn settle(&self) {
        let task = self
            .latest_refresh
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(task) = task {
            if let Err(err) = task.await {
                warn!(%err, "car refresh task did not complete");
            }
        }
    }

    /// Best-effort reload of the car list; failures are logged, never shown.
    pub async fn refresh_cars(&self) {
        let Some(token) = self.session.token() else {
            debug!("no session token; skipping car refresh");
            return;
        };

        match self.api.list_cars(&token).await {
            Ok(cars) => {
                if self.session.token().as_deref() != Some(token.as_str()) {
                    debug!("session changed while fetching cars; discarding result");
                    return;
                }
                let count = cars.len();
                self.state().cars = cars;
                debug!(count, "car list refreshed");
                self.emit(ViewEvent::CarsUpdated { count });
            }
            Err(failure) => warn!(%failure, "failed to refresh car list"),
        }
    }

    fn set_loading(&self, loading: bool) {
        self.state().loading = loading;
        self.emit(ViewEvent::LoadingChanged(loading));
    }

    fn begin_loading(&self) -> LoadingGuard<'_> {
        self.set_loading(true);
        LoadingGuard { machine: self }
    }

    fn show_error(&self, message: impl Into<String>) {
        let message = message.into();
        self.state().error = Some(message.clone());
        self.emit(ViewEvent::Error(message));
    }

    pub async fn submit_login(self: &Arc<Self>, credentials: Credentials) -> Result<(), AuthError> {
        let _loading = self.begin_loading();

        match self
            .session
            .login(&credentials.username, &credentials.password)
            .await
        {
            Ok(_) => {
                self.navigate(Page::Dashboard);
                Ok(())
            }
            Err(err) => {
                warn!(%err, username = %credentials.username, "login failed");
                self.show_error(err.user_message());
                Err(err)
            }
        }
    }

    pub fn edit_car_form<R>(&self, edit: impl FnOnce(&mut CarForm) -> R) -> R {
        let (result, page) = {
            let mut state = self.state();
            (edit(&mut state.car_form), state.current_page)
        };
        self.emit(ViewEvent::Render { page });
        result
    }

    fn reset_car_form(&self) {
        self.state().car_form = CarForm::default();
        self.emit(ViewEvent::FormReset);
    }

    /// Submits whatever is currently in the add-car form draft.
    pub async fn submit_car_form(self: &Arc<Self>) -> Result<(), CarError> {
        let form = self.state().car_form.clone();
        self.submit_add_car(form).await
    }

    /// Validates, then POSTs the car with the session's bearer token. Without a
    /// session the request is never sent and the user sees "Failed to add car",
    /// the same message a server rejection produces.
    pub async fn submit_add_car(self: &Arc<Self>, form: CarForm) -> Result<(), CarError> {
        let car = match form.validate() {
            Ok(car) => car,
            Err(err) => {
                debug!(field = %err.field, %err, "add car blocked by validation");
                self.show_error(err.to_string());
                return Err(err.into());
            }
        };

        let Some(token) = self.session.token() else {
            let err = CarError::CreateFailed { status: None };
            warn!("add car attempted without a session");
            self.show_error(err.user_message());
            return Err(err);
        };

        let _loading = self.begin_loading();
        match self.api.create_car(&token, &car).await {
            Ok(()) => {
                info!(name = %car.name, "car created");
                self.reset_car_form();
                self.navigate(Page::Cars);
                Ok(())
            }
            Err(failure) => {
                let err = CarError::from_create_failure(failure);
                warn!(%err, "add car failed");
                self.show_error(err.user_message());
                Err(err)
            }
        }
    }

    pub fn logout(self: &Arc<Self>) {
        self.session.logout();
        self.state().cars.clear();
        info!("signed out");
        self.navigate(Page::Login);
    }
}

#[cfg(test)]
#[path = "tests/view_state_tests.rs"]
mod tests;
