//! API request handlers.

use axum::{
    Json,
    body::Bytes,
    extract::{Query, State, rejection::QueryRejection},
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::{debug, info, instrument};

use crate::auth::{Authorized, Claims, UnitGrant, accumulator};
use crate::store::{Questionnaire, Respondent, StoreError};

use super::error::{ApiError, ApiResult};
use super::state::AppState;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Parse a JSON body, reporting any failure as a malformed request.
fn parse_body<T: DeserializeOwned>(body: &[u8], hint: &str) -> ApiResult<T> {
    serde_json::from_slice(body).map_err(|e| {
        debug!("Rejected request body: {}", e);
        ApiError::malformed(hint)
    })
}

fn respondent_not_found(respondent_id: &str) -> ApiError {
    ApiError::not_found(format!("Respondent ID {} not found.", respondent_id))
}

/// Token response for credential exchanges.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

/// Login request.
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    #[serde(default)]
    pub password: Option<String>,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Exchange an email (and password, when the respondent has one) for a token.
#[instrument(skip(state, body))]
pub async fn login(State(state): State<AppState>, body: Bytes) -> ApiResult<Json<TokenResponse>> {
    let request: LoginRequest = parse_body(
        &body,
        "Please provide a Json message with 'email' and 'password' fields.",
    )?;

    let respondent = state
        .store
        .find_by_email(&request.email)
        .await?
        .filter(|r| r.verify_password(request.password.as_deref()))
        .ok_or_else(|| ApiError::access_denied("Access denied"))?;

    let token = state.auth.issue(&Claims::for_respondent(&respondent))?;
    info!(respondent_id = %respondent.respondent_id, "Respondent logged in");

    Ok(Json(TokenResponse { token }))
}

/// Access code request.
#[derive(Debug, Deserialize)]
pub struct CodeRequest {
    pub code: String,
}

/// Exchange an access code for a token.
#[instrument(skip(state, body))]
pub async fn code(State(state): State<AppState>, body: Bytes) -> ApiResult<Json<TokenResponse>> {
    let request: CodeRequest =
        parse_body(&body, "Please provide a Json message with a 'code' field.")?;

    let grant = state
        .store
        .find_by_code(&request.code)
        .await?
        .ok_or_else(|| ApiError::access_denied(format!("Access denied for code {}", request.code)))?;

    let token = state.auth.issue(&Claims::for_access_code(&grant))?;
    info!(response_id = %grant.response_id, "Access code exchanged");

    Ok(Json(TokenResponse { token }))
}

/// Get the profile of the respondent named in the token.
#[instrument(skip(state, claims))]
pub async fn get_profile(
    State(state): State<AppState>,
    Authorized(claims): Authorized,
) -> ApiResult<Json<Respondent>> {
    let respondent_id = claims.require_respondent()?;

    let respondent = state
        .store
        .find_by_id(respondent_id)
        .await?
        .ok_or_else(|| respondent_not_found(respondent_id))?;

    Ok(Json(respondent))
}

/// Profile update request. Only the name can change.
#[derive(Debug, Default, Deserialize)]
pub struct ProfileUpdate {
    #[serde(default)]
    pub name: Option<String>,
}

/// Update the name of the respondent named in the token.
///
/// An empty body or one without `name` leaves the profile unchanged.
#[instrument(skip(state, claims, body))]
pub async fn update_profile(
    State(state): State<AppState>,
    Authorized(claims): Authorized,
    body: Bytes,
) -> ApiResult<Json<Respondent>> {
    let respondent_id = claims.require_respondent()?;

    let update: ProfileUpdate = if body.iter().all(u8::is_ascii_whitespace) {
        ProfileUpdate::default()
    } else {
        parse_body(
            &body,
            "Please provide a Json message with an optional 'name' field.",
        )?
    };

    let respondent = match update.name {
        Some(name) => {
            let respondent = state
                .store
                .update_name(respondent_id, &name)
                .await
                .map_err(|e| match e {
                    StoreError::NotFound(_) => respondent_not_found(respondent_id),
                    other => other.into(),
                })?;
            info!(respondent_id, "Profile name updated");
            respondent
        }
        None => state
            .store
            .find_by_id(respondent_id)
            .await?
            .ok_or_else(|| respondent_not_found(respondent_id))?,
    };

    Ok(Json(respondent))
}

/// Units response with the re-issued token.
#[derive(Debug, Serialize)]
pub struct RespondentUnitsResponse {
    pub respondent_id: String,
    pub respondent_units: Vec<UnitGrant>,
    pub token: String,
}

/// Look up the respondent's units and re-issue the token with them.
#[instrument(skip(state, claims))]
pub async fn respondent_units(
    State(state): State<AppState>,
    Authorized(claims): Authorized,
) -> ApiResult<Json<RespondentUnitsResponse>> {
    let respondent_id = claims.require_respondent()?;

    let units = state.store.units_for_respondent(respondent_id).await?;
    let grants = units.iter().map(UnitGrant::from).collect();

    let enriched = accumulator::with_units(&claims, grants);
    let token = state.auth.issue(&enriched)?;
    info!(respondent_id, units = units.len(), "Issued token with respondent units");

    Ok(Json(RespondentUnitsResponse {
        respondent_id: respondent_id.to_string(),
        respondent_units: enriched.respondent_units.unwrap_or_default(),
        token,
    }))
}

/// `?reference=` query for unit-scoped endpoints.
#[derive(Debug, Deserialize)]
pub struct ReferenceQuery {
    pub reference: Option<String>,
}

impl ReferenceQuery {
    /// Unwrap the extracted query, reporting a rejection as a malformed request.
    fn from_extracted(query: Result<Query<Self>, QueryRejection>) -> ApiResult<Self> {
        query.map(|Query(query)| query).map_err(|e| {
            debug!("Rejected query string: {}", e);
            ApiError::malformed("Please provide a single ?reference= query parameter.")
        })
    }

    fn required(&self) -> ApiResult<&str> {
        self.reference
            .as_deref()
            .filter(|r| !r.is_empty())
            .ok_or_else(|| ApiError::malformed("Please provide a ?reference= query parameter."))
    }
}

/// Questionnaires response with the re-issued token.
#[derive(Debug, Serialize)]
pub struct QuestionnairesResponse {
    pub questionnaires: Vec<Questionnaire>,
    pub token: String,
}

/// List the questionnaires of a granted unit and re-issue the token with them.
#[instrument(skip(state, claims, query))]
pub async fn questionnaires(
    State(state): State<AppState>,
    Authorized(claims): Authorized,
    query: Result<Query<ReferenceQuery>, QueryRejection>,
) -> ApiResult<Json<QuestionnairesResponse>> {
    claims.require_units()?;
    let query = ReferenceQuery::from_extracted(query)?;
    let reference = query.required()?;
    accumulator::granted_unit(&claims, reference)?;

    let questionnaires = state.store.questionnaires_for_unit(reference).await?;
    let enriched = accumulator::with_questionnaires(&claims, reference, questionnaires.clone())?;
    let token = state.auth.issue(&enriched)?;
    info!(
        reference,
        questionnaires = questionnaires.len(),
        "Issued token with questionnaires"
    );

    Ok(Json(QuestionnairesResponse {
        questionnaires,
        token,
    }))
}

/// List the members of a granted unit.
#[instrument(skip(state, claims, query))]
pub async fn respondents(
    State(state): State<AppState>,
    Authorized(claims): Authorized,
    query: Result<Query<ReferenceQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<Respondent>>> {
    claims.require_units()?;
    let query = ReferenceQuery::from_extracted(query)?;
    let reference = query.required()?;
    accumulator::granted_unit(&claims, reference)?;

    let members = state.store.members_of_unit(reference).await?;
    Ok(Json(members))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_body() {
        let request: LoginRequest = parse_body(br#"{"email": "a@b.c"}"#, "hint").unwrap();
        assert_eq!(request.email, "a@b.c");
        assert!(request.password.is_none());

        let err = parse_body::<LoginRequest>(br#"{"mail": "a@b.c"}"#, "hint").unwrap_err();
        assert!(matches!(err, ApiError::MalformedRequest(ref m) if m == "hint"));

        assert!(parse_body::<CodeRequest>(b"not json", "hint").is_err());
    }

    #[test]
    fn test_reference_query() {
        let query = ReferenceQuery {
            reference: Some("223".to_string()),
        };
        assert_eq!(query.required().unwrap(), "223");

        for reference in [None, Some(String::new())] {
            let query = ReferenceQuery { reference };
            assert!(matches!(query.required(), Err(ApiError::MalformedRequest(_))));
        }
    }
}
