use serde::{Deserialize, Serialize};

use crate::domain::User;

pub const LOGIN_PATH: &str = "api/v1/auth/login";
pub const ME_PATH: &str = "api/v1/auth/me";
pub const CARS_PATH: &str = "api/v1/cars/";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub user: User,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeResponse {
    pub user: User,
}
