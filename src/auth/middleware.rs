use crate::{error::AppError, models::User, AppState};
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};

/// The authenticated user, attached to the request by [`require_token`].
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

const SCHEMES: [&str; 2] = ["token", "bearer"];

/// Extract the key from `Authorization: Token <key>` (or `Bearer <key>`).
/// The scheme keyword is matched case-insensitively.
fn extract_token(headers: &HeaderMap) -> Result<String, AppError> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .ok_or(AppError::AuthenticationFailed)?
        .to_str()
        .map_err(|_| AppError::InvalidToken)?;

    let (scheme, token) = auth_header.split_once(' ').unwrap_or((auth_header, ""));
    if !SCHEMES.iter().any(|s| scheme.eq_ignore_ascii_case(s)) {
        return Err(AppError::AuthenticationFailed);
    }
    let token = token.trim();

    if token.is_empty() || token.contains(' ') {
        return Err(AppError::InvalidToken);
    }

    Ok(token.to_string())
}

/// Rejects requests without a valid token; otherwise attaches `CurrentUser`.
pub async fn require_token(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_token(request.headers())?;
    let user = state.auth_service.authenticate_token(&token).await?;

    request.extensions_mut().insert(CurrentUser(user));

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_extract_token_schemes() {
        assert_eq!(extract_token(&headers_with("Token abc123")).unwrap(), "abc123");
        assert_eq!(extract_token(&headers_with("Bearer abc123")).unwrap(), "abc123");
    }

    #[test]
    fn test_extract_token_scheme_is_case_insensitive() {
        assert_eq!(extract_token(&headers_with("token abc123")).unwrap(), "abc123");
        assert_eq!(extract_token(&headers_with("TOKEN abc123")).unwrap(), "abc123");
        assert_eq!(extract_token(&headers_with("bearer abc123")).unwrap(), "abc123");
        assert!(matches!(
            extract_token(&headers_with("Tokens abc123")),
            Err(AppError::AuthenticationFailed)
        ));
    }

    #[test]
    fn test_extract_token_missing_or_malformed() {
        assert!(matches!(
            extract_token(&HeaderMap::new()),
            Err(AppError::AuthenticationFailed)
        ));
        assert!(matches!(
            extract_token(&headers_with("Basic dXNlcjpwYXNz")),
            Err(AppError::AuthenticationFailed)
        ));
        assert!(matches!(
            extract_token(&headers_with("Token a b")),
            Err(AppError::InvalidToken)
        ));
        assert!(matches!(
            extract_token(&headers_with("Token ")),
            Err(AppError::InvalidToken)
        ));
        assert!(matches!(
            extract_token(&headers_with("Token")),
            Err(AppError::InvalidToken)
        ));
    }
}
