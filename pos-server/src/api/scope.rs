//! 请求所属餐厅
//!
//! 鉴权在上游完成，这里只读取已验证的 `X-Restaurant-Id` / `X-User-Id`。

use axum::extract::FromRequestParts;
use http::request::Parts;
use shared::error::{AppError, ErrorCode};

pub const RESTAURANT_HEADER: &str = "x-restaurant-id";
pub const USER_HEADER: &str = "x-user-id";

/// Restaurant (room) and acting user of a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestaurantScope {
    pub restaurant_id: String,
    pub user_id: Option<String>,
}

impl RestaurantScope {
    /// 从 header 解析；缺少餐厅时返回 `RestaurantNotSelected`
    pub fn from_headers(headers: &http::HeaderMap) -> Result<Self, AppError> {
        let restaurant_id = header_value(headers, RESTAURANT_HEADER)
            .ok_or_else(|| AppError::new(ErrorCode::RestaurantNotSelected))?;
        Ok(Self {
            restaurant_id,
            user_id: header_value(headers, USER_HEADER),
        })
    }
}

impl<S> FromRequestParts<S> for RestaurantScope
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Self::from_headers(&parts.headers)
    }
}

pub(crate) fn header_value(headers: &http::HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderMap;

    #[test]
    fn test_scope_from_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(RESTAURANT_HEADER, "r1".parse().unwrap());
        headers.insert(USER_HEADER, " waiter-7 ".parse().unwrap());

        let scope = RestaurantScope::from_headers(&headers).unwrap();
        assert_eq!(scope.restaurant_id, "r1");
        assert_eq!(scope.user_id.as_deref(), Some("waiter-7"));
    }

    #[test]
    fn test_missing_or_blank_restaurant_is_rejected() {
        let err = RestaurantScope::from_headers(&HeaderMap::new()).unwrap_err();
        assert_eq!(err.code, ErrorCode::RestaurantNotSelected);

        let mut headers = HeaderMap::new();
        headers.insert(RESTAURANT_HEADER, "  ".parse().unwrap());
        assert!(RestaurantScope::from_headers(&headers).is_err());
    }
}
