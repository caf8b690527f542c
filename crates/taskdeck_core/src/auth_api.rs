use crate::error::AppError;
use crate::http::{self, ApiClient};
use crate::model::User;
use crate::session::SessionStore;
use serde::{Deserialize, Serialize};

const LOGIN_FALLBACK: &str = "Login failed";
const REGISTER_FALLBACK: &str = "Registration failed";

#[derive(Debug, Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct Registration<'a> {
    email: &'a str,
    password: &'a str,
    name: &'a str,
}

#[derive(Debug, Deserialize)]
struct AuthRecord {
    token: String,
    user: User,
}

/// Exchange credentials for a session.
///
/// The session store is only touched on success; a rejected attempt leaves
/// any existing session intact, in memory and on disk.
pub fn login(
    client: &ApiClient,
    store: &mut SessionStore,
    email: &str,
    password: &str,
) -> Result<(), AppError> {
    let email = email.trim();
    if email.is_empty() {
        return Err(AppError::invalid_input("email is required"));
    }
    if password.is_empty() {
        return Err(AppError::invalid_input("password is required"));
    }

    let response = http::send(
        client
            .post("/api/auth/login")
            .json(&Credentials { email, password }),
        LOGIN_FALLBACK,
    )?;

    establish(store, http::decode(response)?)
}

/// Create an account. The backend auto-establishes a session, so the store
/// is populated exactly as on login.
pub fn register(
    client: &ApiClient,
    store: &mut SessionStore,
    email: &str,
    password: &str,
    name: &str,
) -> Result<(), AppError> {
    let email = email.trim();
    if email.is_empty() {
        return Err(AppError::invalid_input("email is required"));
    }
    if password.is_empty() {
        return Err(AppError::invalid_input("password is required"));
    }
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::invalid_input("name is required"));
    }

    let response = http::send(
        client.post("/api/auth/register").json(&Registration {
            email,
            password,
            name,
        }),
        REGISTER_FALLBACK,
    )?;

    establish(store, http::decode(response)?)
}

fn establish(store: &mut SessionStore, auth: AuthRecord) -> Result<(), AppError> {
    if auth.token.trim().is_empty() {
        return Err(AppError::invalid_data("auth response is missing a token"));
    }
    store.set(auth.token, auth.user)
}
