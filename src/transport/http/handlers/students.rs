use crate::app::ServiceError;
use crate::domain::directory::SubjectProfile;
use crate::transport::http::handlers::common::{ok, parse_address, required, required_text};
use crate::transport::http::types::{
    json_422, AddressRequest, ApiResponse, AppState, PaginationQuery, StudentRequest,
};
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

const DEFAULT_PAGE_SIZE: i64 = 10;

const STUDENT_BODY: &str =
    r#"{"address": "0x...", "name": "...", "surname": "...", "secondSurname": "...", "studies": "...", "privateKey": "..."}"#;
const ADDRESS_BODY: &str = r#"{"address": "0x...", "privateKey": "..."}"#;

fn page_bounds(
    query: Result<Query<PaginationQuery>, QueryRejection>,
) -> Result<(i64, i64), ServiceError> {
    let Query(query) =
        query.map_err(|e| ServiceError::Validation(format!("Invalid query: {}", e)))?;
    Ok((
        query.start_index.unwrap_or(0),
        query.count.unwrap_or(DEFAULT_PAGE_SIZE),
    ))
}

fn profile_from(request: &mut StudentRequest) -> Result<SubjectProfile, ServiceError> {
    Ok(SubjectProfile {
        name: required_text(request.name.take(), "name")?,
        surname: required_text(request.surname.take(), "surname")?,
        second_surname: request.second_surname.take().unwrap_or_default(),
        studies: required_text(request.studies.take(), "studies")?,
    })
}

#[utoipa::path(
    post,
    path = "/students/register",
    request_body = StudentRequest,
    responses(
        (status = 200, description = "Student registered", body = ApiResponse),
        (status = 400, description = "Missing or invalid field", body = ApiResponse),
        (status = 403, description = "Signer is not a directory admin", body = ApiResponse),
        (status = 409, description = "Address already registered", body = ApiResponse),
        (status = 422, description = "Invalid JSON body", body = ApiResponse)
    )
)]
pub async fn register_handler(
    State(state): State<AppState>,
    request: Result<Json<StudentRequest>, JsonRejection>,
) -> Response {
    let Json(mut request) = match request {
        Ok(v) => v,
        Err(e) => return json_422(e, STUDENT_BODY).into_response(),
    };
    let result = async {
        let address = parse_address(&required(request.address.take(), "address")?)?;
        let profile = profile_from(&mut request)?;
        let receipt = state
            .students
            .register(address, profile, request.private_key.as_ref())
            .await?;
        Ok::<_, ServiceError>(ok(&json!({ "address": address, "transaction": receipt })))
    }
    .await;
    result.unwrap_or_else(IntoResponse::into_response)
}

#[utoipa::path(
    put,
    path = "/students/update",
    request_body = StudentRequest,
    responses(
        (status = 200, description = "Student updated", body = ApiResponse),
        (status = 400, description = "Missing or invalid field", body = ApiResponse),
        (status = 403, description = "Signer is not a directory admin", body = ApiResponse),
        (status = 404, description = "Address not registered", body = ApiResponse)
    )
)]
pub async fn update_handler(
    State(state): State<AppState>,
    request: Result<Json<StudentRequest>, JsonRejection>,
) -> Response {
    let Json(mut request) = match request {
        Ok(v) => v,
        Err(e) => return json_422(e, STUDENT_BODY).into_response(),
    };
    let result = async {
        let address = parse_address(&required(request.address.take(), "address")?)?;
        let profile = profile_from(&mut request)?;
        let receipt = state
            .students
            .update(address, profile, request.private_key.as_ref())
            .await?;
        Ok::<_, ServiceError>(ok(&json!({ "address": address, "transaction": receipt })))
    }
    .await;
    result.unwrap_or_else(IntoResponse::into_response)
}

#[derive(Clone, Copy)]
enum Activation {
    Deactivate,
    Reactivate,
}

async fn set_activation(
    state: AppState,
    request: Result<Json<AddressRequest>, JsonRejection>,
    activation: Activation,
) -> Response {
    let Json(request) = match request {
        Ok(v) => v,
        Err(e) => return json_422(e, ADDRESS_BODY).into_response(),
    };
    let result = async {
        let address = parse_address(&required(request.address, "address")?)?;
        let key = request.private_key.as_ref();
        let receipt = match activation {
            Activation::Deactivate => state.students.deactivate(address, key).await?,
            Activation::Reactivate => state.students.reactivate(address, key).await?,
        };
        Ok::<_, ServiceError>(ok(&json!({
            "address": address,
            "active": matches!(activation, Activation::Reactivate),
            "transaction": receipt,
        })))
    }
    .await;
    result.unwrap_or_else(IntoResponse::into_response)
}

#[utoipa::path(
    put,
    path = "/students/deactivate",
    request_body = AddressRequest,
    responses(
        (status = 200, description = "Student deactivated", body = ApiResponse),
        (status = 404, description = "Address not registered", body = ApiResponse),
        (status = 409, description = "Already inactive", body = ApiResponse)
    )
)]
pub async fn deactivate_handler(
    State(state): State<AppState>,
    request: Result<Json<AddressRequest>, JsonRejection>,
) -> Response {
    set_activation(state, request, Activation::Deactivate).await
}

#[utoipa::path(
    put,
    path = "/students/reactivate",
    request_body = AddressRequest,
    responses(
        (status = 200, description = "Student reactivated", body = ApiResponse),
        (status = 404, description = "Address not registered", body = ApiResponse),
        (status = 409, description = "Already active", body = ApiResponse)
    )
)]
pub async fn reactivate_handler(
    State(state): State<AppState>,
    request: Result<Json<AddressRequest>, JsonRejection>,
) -> Response {
    set_activation(state, request, Activation::Reactivate).await
}

#[utoipa::path(
    post,
    path = "/students/admins",
    request_body = AddressRequest,
    responses(
        (status = 200, description = "Directory admin added", body = ApiResponse),
        (status = 403, description = "Signer is not a directory admin", body = ApiResponse),
        (status = 409, description = "Already an admin", body = ApiResponse)
    )
)]
pub async fn add_admin_handler(
    State(state): State<AppState>,
    request: Result<Json<AddressRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match request {
        Ok(v) => v,
        Err(e) => return json_422(e, ADDRESS_BODY).into_response(),
    };
    let result = async {
        let admin = parse_address(&required(request.address, "address")?)?;
        let receipt = state
            .students
            .add_admin(admin, request.private_key.as_ref())
            .await?;
        Ok::<_, ServiceError>(ok(&json!({ "admin": admin, "transaction": receipt })))
    }
    .await;
    result.unwrap_or_else(IntoResponse::into_response)
}

#[utoipa::path(
    get,
    path = "/students/student/{address}",
    params(("address" = String, Path, description = "Student address (0x + 40 hex)")),
    responses(
        (status = 200, description = "Student record", body = ApiResponse),
        (status = 400, description = "Malformed address", body = ApiResponse),
        (status = 404, description = "Student not found", body = ApiResponse)
    )
)]
pub async fn get_student_handler(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Response {
    let result = async {
        let subject = state.students.get(parse_address(&address)?).await?;
        Ok::<_, ServiceError>(ok(&subject))
    }
    .await;
    result.unwrap_or_else(IntoResponse::into_response)
}

#[utoipa::path(
    get,
    path = "/students/isRegistered/{address}",
    params(("address" = String, Path, description = "Student address (0x + 40 hex)")),
    responses(
        (status = 200, description = "Registration flag", body = ApiResponse),
        (status = 400, description = "Malformed address", body = ApiResponse)
    )
)]
pub async fn is_registered_handler(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Response {
    let result = async {
        let address = parse_address(&address)?;
        let registered = state.students.is_registered(address).await?;
        Ok::<_, ServiceError>(ok(&json!({ "address": address, "isRegistered": registered })))
    }
    .await;
    result.unwrap_or_else(IntoResponse::into_response)
}

#[utoipa::path(
    get,
    path = "/students/all",
    params(
        ("startIndex" = Option<i64>, Query, description = "Zero-based start position (default 0)"),
        ("count" = Option<i64>, Query, description = "Page size, 1..=100 (default 10)")
    ),
    responses(
        (status = 200, description = "Page of students with the total count", body = ApiResponse),
        (status = 400, description = "Out-of-bounds pagination", body = ApiResponse)
    )
)]
pub async fn list_students_handler(
    State(state): State<AppState>,
    query: Result<Query<PaginationQuery>, QueryRejection>,
) -> Response {
    let result = async {
        let (start, count) = page_bounds(query)?;
        let page = state.students.list_all_paginated(start, count).await?;
        Ok::<_, ServiceError>(ok(&page))
    }
    .await;
    result.unwrap_or_else(IntoResponse::into_response)
}

#[utoipa::path(
    get,
    path = "/students/count",
    responses(
        (status = 200, description = "Number of registered students", body = ApiResponse)
    )
)]
pub async fn count_handler(State(state): State<AppState>) -> Response {
    let result = async {
        let count = state.students.count().await?;
        Ok::<_, ServiceError>(ok(&json!({ "count": count })))
    }
    .await;
    result.unwrap_or_else(IntoResponse::into_response)
}

#[utoipa::path(
    get,
    path = "/students/range",
    params(
        ("startIndex" = Option<i64>, Query, description = "Zero-based start position (default 0)"),
        ("count" = Option<i64>, Query, description = "Number of addresses, 1..=100 (default 10)")
    ),
    responses(
        (status = 200, description = "Student addresses in registration order", body = ApiResponse),
        (status = 400, description = "Out-of-bounds range", body = ApiResponse)
    )
)]
pub async fn list_range_handler(
    State(state): State<AppState>,
    query: Result<Query<PaginationQuery>, QueryRejection>,
) -> Response {
    let result = async {
        let (start, count) = page_bounds(query)?;
        let addresses = state.students.list_range(start, count).await?;
        Ok::<_, ServiceError>(ok(&json!({ "startIndex": start, "addresses": addresses })))
    }
    .await;
    result.unwrap_or_else(IntoResponse::into_response)
}
