use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use service_core::error::AppError;

pub const OPERATOR_HEADER: &str = "x-user-id";
pub const DEFAULT_OPERATOR: &str = "system";

/// Operator recorded in `createdBy` / `updateBy`.
///
/// Taken from the `X-User-ID` header when present, otherwise `system`. The
/// value is an audit label only and grants nothing.
#[derive(Debug, Clone)]
pub struct Operator(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for Operator
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let operator = parts
            .headers
            .get(OPERATOR_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .unwrap_or(DEFAULT_OPERATOR);

        tracing::Span::current().record("operator", operator);

        Ok(Operator(operator.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(request: Request<()>) -> Operator {
        let (mut parts, _) = request.into_parts();
        Operator::from_request_parts(&mut parts, &()).await.unwrap()
    }

    #[tokio::test]
    async fn test_operator_from_header() {
        let request = Request::builder()
            .header(OPERATOR_HEADER, "alice")
            .body(())
            .unwrap();
        assert_eq!(extract(request).await.0, "alice");
    }

    #[tokio::test]
    async fn test_operator_defaults_to_system() {
        let request = Request::builder().body(()).unwrap();
        assert_eq!(extract(request).await.0, DEFAULT_OPERATOR);

        let blank = Request::builder()
            .header(OPERATOR_HEADER, "  ")
            .body(())
            .unwrap();
        assert_eq!(extract(blank).await.0, DEFAULT_OPERATOR);
    }
}
