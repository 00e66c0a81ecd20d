use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use async_trait::async_trait;
use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use shared::{
    domain::{Car, Connector, ConnectorKind, NewCar, User},
    protocol::{LoginRequest, LoginResponse, MeResponse},
};
use tokio::{
    net::TcpListener,
    sync::{broadcast, Notify},
};
use url::Url;

use crate::{
    ApiFailure, HttpApi, RemoteApi, SessionController, TokenStore, ViewEvent, ViewStateMachine,
};

pub(crate) const LOGIN: &str = "POST /api/v1/auth/login";
pub(crate) const ME: &str = "GET /api/v1/auth/me";
pub(crate) const LIST_CARS: &str = "GET /api/v1/cars/";
pub(crate) const CREATE_CAR: &str = "POST /api/v1/cars/";

/// In-process stand-in for the car service.
pub(crate) struct StubApi {
    pub login_status: Mutex<StatusCode>,
    pub me_status: Mutex<StatusCode>,
    pub list_status: Mutex<StatusCode>,
    pub create_status: Mutex<StatusCode>,
    pub issued_token: String,
    pub me_username: String,
    pub cars: Mutex<Vec<Car>>,
    pub created: Mutex<Vec<NewCar>>,
    pub bearer_tokens: Mutex<Vec<String>>,
    calls: Mutex<Vec<&'static str>>,
}

impl Default for StubApi {
    fn default() -> Self {
        Self {
            login_status: Mutex::new(StatusCode::OK),
            me_status: Mutex::new(StatusCode::OK),
            list_status: Mutex::new(StatusCode::OK),
            create_status: Mutex::new(StatusCode::CREATED),
            issued_token: "t1".to_string(),
            me_username: "alice".to_string(),
            cars: Mutex::new(Vec::new()),
            created: Mutex::new(Vec::new()),
            bearer_tokens: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl StubApi {
    pub(crate) fn with_login_status(status: StatusCode) -> Self {
        Self {
            login_status: Mutex::new(status),
            ..Self::default()
        }
    }

    pub(crate) fn with_me_status(status: StatusCode) -> Self {
        Self {
            me_status: Mutex::new(status),
            ..Self::default()
        }
    }

    pub(crate) fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn count(&self, call: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| **c == call).count()
    }

    fn record(&self, call: &'static str, headers: &HeaderMap) {
        self.calls.lock().unwrap().push(call);
        if let Some(token) = headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
        {
            self.bearer_tokens.lock().unwrap().push(token.to_string());
        }
    }
}

fn error_response(status: StatusCode) -> Response {
    (status, Json(json!({ "detail": "stubbed failure" }))).into_response()
}

async fn handle_login(
    State(stub): State<Arc<StubApi>>,
    headers: HeaderMap,
    Json(request): Json<LoginRequest>,
) -> Response {
    stub.record(LOGIN, &headers);
    let status = *stub.login_status.lock().unwrap();
    if !status.is_success() {
        return error_response(status);
    }
    let body = json!({
        "access_token": stub.issued_token,
        "user": { "username": request.username },
    });
    (status, Json(body)).into_response()
}

async fn handle_me(State(stub): State<Arc<StubApi>>, headers: HeaderMap) -> Response {
    stub.record(ME, &headers);
    let status = *stub.me_status.lock().unwrap();
    if !status.is_success() {
        return error_response(status);
    }
    (status, Json(json!({ "user": { "username": stub.me_username } }))).into_response()
}

async fn handle_list_cars(State(stub): State<Arc<StubApi>>, headers: HeaderMap) -> Response {
    stub.record(LIST_CARS, &headers);
    let status = *stub.list_status.lock().unwrap();
    if !status.is_success() {
        return error_response(status);
    }
    let cars = stub.cars.lock().unwrap().clone();
    (status, Json(cars)).into_response()
}

async fn handle_create_car(
    State(stub): State<Arc<StubApi>>,
    headers: HeaderMap,
    Json(car): Json<NewCar>,
) -> Response {
    stub.record(CREATE_CAR, &headers);
    let status = *stub.create_status.lock().unwrap();
    if !status.is_success() {
        return error_response(status);
    }
    stub.cars.lock().unwrap().push(Car {
        name: car.name.clone(),
        connectors: Some(
            car.connector_types
                .iter()
                .map(|kind| Connector {
                    kind: Some(ConnectorKind::Tagged {
                        value: kind.token().to_string(),
                    }),
                })
                .collect(),
        ),
        battery_charge_limit: Some(car.battery_charge_limit),
        battery_size: Some(car.battery_size),
        max_kw_ac: Some(car.max_kw_ac),
        max_kw_dc: Some(car.max_kw_dc),
    });
    stub.created.lock().unwrap().push(car);
    (status, Json(json!({}))).into_response()
}

pub(crate) async fn spawn_stub(stub: Arc<StubApi>) -> Url {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind stub");
    let addr = listener.local_addr().expect("stub addr");
    let app = Router::new()
        .route("/api/v1/auth/login", post(handle_login))
        .route("/api/v1/auth/me", get(handle_me))
        .route(
            "/api/v1/cars/",
            get(handle_list_cars).post(handle_create_car),
        )
        .with_state(stub);
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Url::parse(&format!("http://{addr}")).expect("stub url")
}

/// A base URL nothing is listening on.
pub(crate) async fn unreachable_url() -> Url {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);
    Url::parse(&format!("http://{addr}")).expect("url")
}

pub(crate) fn http_machine(
    base_url: Url,
    store: Arc<dyn TokenStore>,
) -> Arc<ViewStateMachine> {
    let api: Arc<dyn RemoteApi> = Arc::new(HttpApi::new(base_url));
    scripted_machine(api, store)
}

pub(crate) fn scripted_machine(
    api: Arc<dyn RemoteApi>,
    store: Arc<dyn TokenStore>,
) -> Arc<ViewStateMachine> {
    let session = Arc::new(SessionController::new(Arc::clone(&api), store));
    ViewStateMachine::new(session, api)
}

pub(crate) async fn wait_for(
    rx: &mut broadcast::Receiver<ViewEvent>,
    wanted: impl Fn(&ViewEvent) -> bool,
) -> ViewEvent {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            match rx.recv().await {
                Ok(event) if wanted(&event) => return event,
                Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(err) => panic!("view event channel closed: {err}"),
            }
        }
    })
    .await
    .expect("timed out waiting for view event")
}

pub(crate) fn drain(rx: &mut broadcast::Receiver<ViewEvent>) -> Vec<ViewEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

pub(crate) fn sample_car(name: &str) -> Car {
    Car {
        name: name.to_string(),
        connectors: None,
        battery_charge_limit: Some(80),
        battery_size: Some(64),
        max_kw_ac: Some(11),
        max_kw_dc: Some(100),
    }
}

/// Fake service with canned answers per endpoint, no sockets involved.
pub(crate) struct ScriptedApi {
    pub login: Mutex<Result<LoginResponse, ApiFailure>>,
    pub me: Mutex<Result<MeResponse, ApiFailure>>,
    pub list: Mutex<Result<Vec<Car>, ApiFailure>>,
    pub create: Mutex<Result<(), ApiFailure>>,
    /// When set, `list_cars` parks until the gate is notified.
    pub list_gate: Mutex<Option<Arc<Notify>>>,
    pub login_calls: AtomicUsize,
    pub me_calls: AtomicUsize,
    pub list_calls: AtomicUsize,
    pub create_calls: AtomicUsize,
}

impl ScriptedApi {
    pub(crate) fn ok(token: &str, username: &str) -> Self {
        Self {
            login: Mutex::new(Ok(LoginResponse {
                access_token: token.to_string(),
                user: User::new(username),
            })),
            me: Mutex::new(Ok(MeResponse {
                user: User::new(username),
            })),
            list: Mutex::new(Ok(Vec::new())),
            create: Mutex::new(Ok(())),
            list_gate: Mutex::new(None),
            login_calls: AtomicUsize::new(0),
            me_calls: AtomicUsize::new(0),
            list_calls: AtomicUsize::new(0),
            create_calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn total_calls(&self) -> usize {
        self.login_calls.load(Ordering::SeqCst)
            + self.me_calls.load(Ordering::SeqCst)
            + self.list_calls.load(Ordering::SeqCst)
            + self.create_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RemoteApi for ScriptedApi {
    async fn login(&self, _request: &LoginRequest) -> Result<LoginResponse, ApiFailure> {
        self.login_calls.fetch_add(1, Ordering::SeqCst);
        self.login.lock().unwrap().clone()
    }

    async fn me(&self, _token: &str) -> Result<MeResponse, ApiFailure> {
        self.me_calls.fetch_add(1, Ordering::SeqCst);
        self.me.lock().unwrap().clone()
    }

    async fn list_cars(&self, _token: &str) -> Result<Vec<Car>, ApiFailure> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.list_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.list.lock().unwrap().clone()
    }

    async fn create_car(&self, _token: &str, _car: &NewCar) -> Result<(), ApiFailure> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        self.create.lock().unwrap().clone()
    }
}
