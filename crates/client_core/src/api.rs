use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use shared::{
    domain::{Car, NewCar},
    error::ApiErrorBody,
    protocol::{LoginRequest, LoginResponse, MeResponse, CARS_PATH, LOGIN_PATH, ME_PATH},
};
use tracing::debug;
use url::Url;

use crate::error::ApiFailure;

/// The remote car service as seen by the client.
#[async_trait]
pub trait RemoteApi: Send + Sync {
    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, ApiFailure>;
    async fn me(&self, token: &str) -> Result<MeResponse, ApiFailure>;
    async fn list_cars(&self, token: &str) -> Result<Vec<Car>, ApiFailure>;
    async fn create_car(&self, token: &str, car: &NewCar) -> Result<(), ApiFailure>;
}

pub struct HttpApi {
    http: Client,
    base_url: Url,
}

impl HttpApi {
    pub fn new(base_url: Url) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(http: Client, base_url: Url) -> Self {
        Self {
            http,
            base_url: normalize_base_url(base_url),
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiFailure> {
        self.base_url
            .join(path)
            .map_err(|err| ApiFailure::Transport(format!("invalid endpoint '{path}': {err}")))
    }

    async fn send(&self, path: &str, request: RequestBuilder) -> Result<Response, ApiFailure> {
        let res = request
            .send()
            .await
            .map_err(|err| ApiFailure::Transport(err.to_string()))?;
        let status = res.status();
        if status.is_success() {
            return Ok(res);
        }

        let body = res.text().await.unwrap_or_default();
        let detail = ApiErrorBody::parse(&body).and_then(|parsed| parsed.summary());
        debug!(path, status = status.as_u16(), ?detail, "car service returned error status");
        Err(ApiFailure::Status {
            status: status.as_u16(),
            detail,
        })
    }

    async fn decode<T: DeserializeOwned>(res: Response) -> Result<T, ApiFailure> {
        res.json::<T>()
            .await
            .map_err(|err| ApiFailure::Decode(err.to_string()))
    }
}

/// `Url::join` replaces the last path segment unless the base ends in `/`.
pub fn normalize_base_url(mut base_url: Url) -> Url {
    if !base_url.path().ends_with('/') {
        let path = format!("{}/", base_url.path());
        base_url.set_path(&path);
    }
    base_url
}

#[async_trait]
impl RemoteApi for HttpApi {
    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, ApiFailure> {
        let url = self.endpoint(LOGIN_PATH)?;
        let res = self.send(LOGIN_PATH, self.http.post(url).json(request)).await?;
        Self::decode(res).await
    }

    async fn me(&self, token: &str) -> Result<MeResponse, ApiFailure> {
        let url = self.endpoint(ME_PATH)?;
        let res = self.send(ME_PATH, self.http.get(url).bearer_auth(token)).await?;
        Self::decode(res).await
    }

    async fn list_cars(&self, token: &str) -> Result<Vec<Car>, ApiFailure> {
        let url = self.endpoint(CARS_PATH)?;
        let res = self.send(CARS_PATH, self.http.get(url).bearer_auth(token)).await?;
        Self::decode(res).await
    }

    async fn create_car(&self, token: &str, car: &NewCar) -> Result<(), ApiFailure> {
        let url = self.endpoint(CARS_PATH)?;
        self.send(CARS_PATH, self.http.post(url).bearer_auth(token).json(car))
            .await?;
        Ok(())
    }
}
