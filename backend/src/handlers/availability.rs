use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::{
    engine::{AvailabilityCoordinator, AvailabilityStore},
    error::{ApiError, ApiResult},
    models::{
        Availability, AvailabilityRole, AvailabilityUpdate, BatchAvailabilityRequest,
        NewAvailability, Principal,
    },
};

type SharedCoordinator<S> = Arc<AvailabilityCoordinator<S>>;

/// Availability endpoints plus a health check, bound to `coordinator`.
pub fn routes<S>(coordinator: SharedCoordinator<S>) -> Router
where
    S: AvailabilityStore + 'static,
{
    Router::new()
        .route("/health", get(health_check))
        .route(
            "/v1/users/{user_id}/availability",
            get(get_availability::<S>)
                .post(create_availability::<S>)
                .put(update_availability::<S>),
        )
        .route("/v1/availability/batch", post(get_batch_availability::<S>))
        .with_state(coordinator)
}

async fn health_check() -> &'static str {
    "OK"
}

fn parse_body<T>(payload: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| ApiError::InvalidRequest(rejection.body_text()))
}

pub async fn create_availability<S: AvailabilityStore>(
    State(coordinator): State<SharedCoordinator<S>>,
    principal: Principal,
    Path(user_id): Path<String>,
    payload: Result<Json<NewAvailability>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Availability>)> {
    principal.authorize_self_or_elevated(&user_id)?;

    let req = parse_body(payload)?;
    if req.user_id != user_id {
        return Err(ApiError::UserIdMismatch);
    }

    let availability = coordinator
        .create(
            &user_id,
            &principal.org_id,
            AvailabilityRole::from(principal.role),
            &req.available_time_intervals,
        )
        .await?;

    tracing::info!(user_id = %user_id, created_by = %principal.user_id, "Availability create request served");

    Ok((StatusCode::CREATED, Json(availability)))
}

pub async fn get_availability<S: AvailabilityStore>(
    State(coordinator): State<SharedCoordinator<S>>,
    principal: Principal,
    Path(user_id): Path<String>,
) -> ApiResult<Json<Availability>> {
    principal.authorize_self_or_elevated(&user_id)?;

    let availability = coordinator.get(&user_id).await?;
    Ok(Json(availability))
}

pub async fn update_availability<S: AvailabilityStore>(
    State(coordinator): State<SharedCoordinator<S>>,
    principal: Principal,
    Path(user_id): Path<String>,
    payload: Result<Json<AvailabilityUpdate>, JsonRejection>,
) -> ApiResult<Json<Availability>> {
    principal.authorize_self_or_elevated(&user_id)?;

    let req = parse_body(payload)?;
    if req.user_id != user_id {
        return Err(ApiError::UserIdMismatch);
    }

    let availability = coordinator
        .update(
            &user_id,
            &principal.org_id,
            AvailabilityRole::from(principal.role),
            &req.changes.add,
            &req.changes.remove,
        )
        .await?;

    tracing::info!(user_id = %user_id, updated_by = %principal.user_id, "Availability update request served");

    Ok(Json(availability))
}

pub async fn get_batch_availability<S: AvailabilityStore>(
    State(coordinator): State<SharedCoordinator<S>>,
    principal: Principal,
    payload: Result<Json<BatchAvailabilityRequest>, JsonRejection>,
) -> ApiResult<Json<Vec<Availability>>> {
    let req = parse_body(payload)?;

    let availability = coordinator.get_batch(&principal, &req.user_ids).await?;
    Ok(Json(availability))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{ORG_ID_HEADER, USER_ID_HEADER, USER_ROLE_HEADER};
    use crate::engine::InMemoryAvailabilityStore;
    use axum::{
        body::{to_bytes, Body},
        http::{header::CONTENT_TYPE, Method, Request},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app() -> Router {
        routes(Arc::new(AvailabilityCoordinator::new(InMemoryAvailabilityStore::new())))
    }

    fn request(method: Method, uri: &str, caller: Option<(&str, &str)>, body: Option<Value>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some((user_id, role)) = caller {
            builder = builder
                .header(USER_ID_HEADER, user_id)
                .header(ORG_ID_HEADER, "org1")
                .header(USER_ROLE_HEADER, role);
        }
        match body {
            Some(body) => builder
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, body)
    }

    #[tokio::test]
    async fn test_create_then_get_end_to_end() {
        let app = app();
        let body = json!({
            "user_id": "u1",
            "available_time_intervals": [["2024-01-01T09:00:00Z", "2024-01-01T09:30:00Z"]]
        });

        let (status, created) = send(
            &app,
            request(Method::POST, "/v1/users/u1/availability", Some(("u1", "tutor")), Some(body.clone())),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created, body);

        let (status, fetched) = send(
            &app,
            request(Method::GET, "/v1/users/u1/availability", Some(("u1", "tutor")), None),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched, body);
    }

    #[tokio::test]
    async fn test_update_end_to_end() {
        let app = app();
        send(
            &app,
            request(
                Method::POST,
                "/v1/users/u1/availability",
                Some(("u1", "student")),
                Some(json!({
                    "user_id": "u1",
                    "available_time_intervals": [["2024-01-01T09:00:00Z", "2024-01-01T10:00:00Z"]]
                })),
            ),
        )
        .await;

        let (status, updated) = send(
            &app,
            request(
                Method::PUT,
                "/v1/users/u1/availability",
                Some(("u1", "student")),
                Some(json!({
                    "user_id": "u1",
                    "changes": {
                        "remove": [["2024-01-01T09:15:00Z", "2024-01-01T09:45:00Z"]],
                        "add": [["2024-01-01T10:00:00Z", "2024-01-01T10:15:00Z"]]
                    }
                })),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            updated,
            json!({
                "user_id": "u1",
                "available_time_intervals": [
                    ["2024-01-01T09:00:00Z", "2024-01-01T09:15:00Z"],
                    ["2024-01-01T09:45:00Z", "2024-01-01T10:15:00Z"]
                ]
            })
        );
    }

    #[tokio::test]
    async fn test_missing_identity_is_401() {
        let (status, body) = send(&app(), request(Method::GET, "/v1/users/u1/availability", None, None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "unauthorized");
    }

    #[tokio::test]
    async fn test_foreign_user_is_403() {
        let (status, body) = send(
            &app(),
            request(Method::GET, "/v1/users/u2/availability", Some(("u1", "tutor")), None),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "forbidden");
    }

    #[tokio::test]
    async fn test_admin_may_read_other_users() {
        let (status, _) = send(
            &app(),
            request(Method::GET, "/v1/users/u2/availability", Some(("admin", "admin")), None),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_body_user_mismatch_is_400() {
        let (status, body) = send(
            &app(),
            request(
                Method::POST,
                "/v1/users/u1/availability",
                Some(("u1", "tutor")),
                Some(json!({
                    "user_id": "u2",
                    "available_time_intervals": [["2024-01-01T09:00:00Z", "2024-01-01T09:30:00Z"]]
                })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "user_id_mismatch");
    }

    #[tokio::test]
    async fn test_misaligned_interval_is_400() {
        let (status, body) = send(
            &app(),
            request(
                Method::POST,
                "/v1/users/u1/availability",
                Some(("u1", "tutor")),
                Some(json!({
                    "user_id": "u1",
                    "available_time_intervals": [["2024-01-01T09:07:00Z", "2024-01-01T09:30:00Z"]]
                })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "invalid_intervals");
    }

    #[tokio::test]
    async fn test_oversized_interval_is_400() {
        let (status, body) = send(
            &app(),
            request(
                Method::POST,
                "/v1/users/u1/availability",
                Some(("u1", "tutor")),
                Some(json!({
                    "user_id": "u1",
                    "available_time_intervals": [["2024-01-01T00:00:00Z", "2034-01-01T00:00:00Z"]]
                })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "too_many_blocks");
    }

    #[tokio::test]
    async fn test_empty_intervals_is_400() {
        let (status, body) = send(
            &app(),
            request(
                Method::POST,
                "/v1/users/u1/availability",
                Some(("u1", "tutor")),
                Some(json!({ "user_id": "u1", "available_time_intervals": [] })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "no_intervals");
    }

    #[tokio::test]
    async fn test_invalid_json_is_400() {
        let (status, body) = send(
            &app(),
            request(
                Method::POST,
                "/v1/users/u1/availability",
                Some(("u1", "tutor")),
                Some(json!({ "user_id": "u1" })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "invalid_request");
    }

    #[tokio::test]
    async fn test_batch_for_non_admin_is_all_or_nothing() {
        let app = app();
        let (status, body) = send(
            &app,
            request(
                Method::POST,
                "/v1/availability/batch",
                Some(("u1", "student")),
                Some(json!({ "user_ids": ["u1", "u2"] })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "forbidden");

        let (status, body) = send(
            &app,
            request(
                Method::POST,
                "/v1/availability/batch",
                Some(("u1", "student")),
                Some(json!({ "user_ids": ["u1"] })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([{ "user_id": "u1", "available_time_intervals": [] }]));
    }

    #[tokio::test]
    async fn test_health() {
        let response = app()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
