use axum::{extract::FromRequestParts, http::{request::Parts, HeaderMap}};

use crate::{
    constants::{ORG_ID_HEADER, USER_ID_HEADER, USER_ROLE_HEADER},
    error::ApiError,
    models::{AccountRole, Principal},
};

/// Reads the caller identity the authenticating gateway attached to the
/// request. Token verification happens upstream.
impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = required_header(&parts.headers, USER_ID_HEADER)?;
        let org_id = required_header(&parts.headers, ORG_ID_HEADER)?;
        let role = required_header(&parts.headers, USER_ROLE_HEADER)?
            .parse::<AccountRole>()
            .map_err(|e| ApiError::NotAuthenticated(e.to_string()))?;

        Ok(Principal::new(user_id, org_id, role))
    }
}

fn required_header(headers: &HeaderMap, name: &str) -> Result<String, ApiError> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .ok_or_else(|| ApiError::NotAuthenticated(format!("missing {name} header")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(request: Request<()>) -> Result<Principal, ApiError> {
        let (mut parts, _) = request.into_parts();
        Principal::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn test_principal_from_headers() {
        let request = Request::builder()
            .header(USER_ID_HEADER, "u1")
            .header(ORG_ID_HEADER, "org1")
            .header(USER_ROLE_HEADER, "tutor")
            .body(())
            .unwrap();

        let principal = extract(request).await.unwrap();
        assert_eq!(principal, Principal::new("u1", "org1", AccountRole::Tutor));
    }

    #[tokio::test]
    async fn test_missing_header_is_unauthenticated() {
        let request = Request::builder()
            .header(USER_ID_HEADER, "u1")
            .header(USER_ROLE_HEADER, "tutor")
            .body(())
            .unwrap();

        assert!(matches!(extract(request).await, Err(ApiError::NotAuthenticated(_))));
    }

    #[tokio::test]
    async fn test_unknown_role_is_unauthenticated() {
        let request = Request::builder()
            .header(USER_ID_HEADER, "u1")
            .header(ORG_ID_HEADER, "org1")
            .header(USER_ROLE_HEADER, "superuser")
            .body(())
            .unwrap();

        assert!(matches!(extract(request).await, Err(ApiError::NotAuthenticated(_))));
    }
}
