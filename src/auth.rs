//! Bearer token authentication and the register/login handlers.

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts, State},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json, RequestPartsExt,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, TokenData, Validation};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{
    models::{Email, NewUser, RecordId, User},
    AppState, Error,
};

// Code in this module is adapted from https://github.com/tokio-rs/axum/blob/main/examples/jwt/src/main.rs

/// How long an issued token stays valid.
const TOKEN_DURATION_SECS: i64 = 1800;

/// The contents of a JSON Web Token.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// The expiry time of the token.
    pub exp: usize,
    /// The time the token was issued.
    pub iat: usize,
    /// Identifier of the authenticated user; every record the user touches is
    /// scoped to this id.
    pub id: RecordId,
    /// Email associated with the token.
    pub email: Email,
    /// First name associated with the token.
    pub name: String,
    /// Surname associated with the token.
    pub surname: String,
}

#[async_trait]
impl<S> FromRequestParts<S> for Claims
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|_| AuthError::TokenMissing)?;

        let state = AppState::from_ref(state);
        let token_data = decode_jwt(bearer.token(), state.decoding_key())?;

        Ok(token_data.claims)
    }
}

/// The ways the bearer token contract can be violated.
#[derive(Debug, PartialEq)]
pub enum AuthError {
    /// No `Authorization` header was sent with the request.
    TokenMissing,
    /// The token failed verification: expired, tampered with, or not a JWT.
    TokenInvalid,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthError::TokenMissing => (StatusCode::UNAUTHORIZED, "Token não informado."),
            AuthError::TokenInvalid => (StatusCode::FORBIDDEN, "Token expirado."),
        };

        let body = Json(json!({
            "message": message,
        }));

        (status, body).into_response()
    }
}

fn encode_jwt(user: &User, encoding_key: &EncodingKey) -> Result<String, Error> {
    let now = Utc::now();
    let claims = Claims {
        exp: (now + Duration::seconds(TOKEN_DURATION_SECS)).timestamp() as usize,
        iat: now.timestamp() as usize,
        id: user.id.clone(),
        email: user.email.clone(),
        name: user.name.clone(),
        surname: user.surname.clone(),
    };

    encode(&Header::default(), &claims, encoding_key).map_err(|_| Error::TokenCreation)
}

fn decode_jwt(token: &str, decoding_key: &DecodingKey) -> Result<TokenData<Claims>, AuthError> {
    decode(token, decoding_key, &Validation::default()).map_err(|_| AuthError::TokenInvalid)
}

/// The payload for registering a new user.
#[derive(Debug, Deserialize)]
pub struct RegisterData {
    pub email: Option<String>,
    pub name: Option<String>,
    pub surname: Option<String>,
    pub password: Option<String>,
}

/// The payload for logging in.
#[derive(Debug, Deserialize)]
pub struct Credentials {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// The response body for both register and login.
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub id: RecordId,
    pub email: Email,
    pub name: String,
    pub surname: String,
    pub token: String,
}

impl AuthResponse {
    fn new(user: User, token: String) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            surname: user.surname,
            token,
        }
    }
}

/// Handler for registration requests.
///
/// Responds with the created user and a fresh bearer token.
///
/// # Errors
///
/// This function will return an error if the email is already registered,
/// missing or invalid, or if the name or password is missing.
pub async fn register(
    State(state): State<AppState>,
    Json(data): Json<RegisterData>,
) -> Result<Response, Error> {
    let users = state.users();

    let raw_email = data.email.unwrap_or_default();
    if users.get_by_email(&raw_email)?.is_some() {
        return Err(Error::EmailTaken);
    }

    if raw_email.is_empty() {
        return Err(Error::EmailRequired);
    }
    let email = Email::new(&raw_email)?;

    let name = data.name.unwrap_or_default();
    if name.is_empty() {
        return Err(Error::NameRequired);
    }

    let password = data.password.unwrap_or_default();
    if password.is_empty() {
        return Err(Error::PasswordRequired);
    }

    let password_hash = bcrypt::hash(&password, bcrypt::DEFAULT_COST)?;

    let user = users.create(NewUser {
        email,
        name,
        surname: data.surname.unwrap_or_default(),
        password_hash,
    })?;

    let token = encode_jwt(&user, state.encoding_key())?;

    Ok((StatusCode::OK, Json(AuthResponse::new(user, token))).into_response())
}

/// Handler for login requests.
///
/// # Errors
///
/// This function will return an error in a few situations.
/// - The email is missing or invalid.
/// - The email does not belong to a registered user.
/// - The password is missing.
/// - The password is not correct.
pub async fn log_in(
    State(state): State<AppState>,
    Json(credentials): Json<Credentials>,
) -> Result<Response, Error> {
    let raw_email = credentials.email.unwrap_or_default();
    if raw_email.is_empty() {
        return Err(Error::EmailRequired);
    }
    Email::new(&raw_email)?;

    let password = credentials.password.unwrap_or_default();
    if password.is_empty() {
        return Err(Error::PasswordRequired);
    }

    let user = state
        .users()
        .get_by_email(&raw_email)?
        .ok_or(Error::EmailNotFound)?;

    if !bcrypt::verify(&password, &user.password_hash)? {
        return Err(Error::PasswordInvalid);
    }

    let token = encode_jwt(&user, state.encoding_key())?;

    Ok((StatusCode::OK, Json(AuthResponse::new(user, token))).into_response())
}
