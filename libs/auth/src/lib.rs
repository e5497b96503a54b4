use std::{collections::HashSet, marker::PhantomData};

use http::{HeaderValue, Request, Response, StatusCode, header};
use tower_http::validate_request::ValidateRequest;

pub const API_KEY_HEADER: &str = "x-api-key";

const UNAUTHORIZED_BODY: &str = r#"{"error":"Unauthorized"}"#;

/// Shared-secret check on the `X-API-Key` header.
///
/// An empty key set leaves the routes open.
pub struct ApiKeyValidate<ResBody> {
    keys: HashSet<String>,
    _ty: PhantomData<fn() -> ResBody>,
}

impl<ResBody> ApiKeyValidate<ResBody> {
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keys: keys
                .into_iter()
                .map(Into::into)
                .filter(|k: &String| !k.is_empty())
                .collect(),
            _ty: PhantomData,
        }
    }

    pub fn is_open(&self) -> bool {
        self.keys.is_empty()
    }

    fn accepts(&self, value: Option<&HeaderValue>) -> bool {
        match value.and_then(|v| v.to_str().ok()) {
            Some(key) => self.keys.contains(key),
            None => false,
        }
    }
}

impl<ResBody> Clone for ApiKeyValidate<ResBody> {
    fn clone(&self) -> Self {
        Self {
            keys: self.keys.clone(),
            _ty: PhantomData,
        }
    }
}

impl<B, ResBody> ValidateRequest<B> for ApiKeyValidate<ResBody>
where
    ResBody: From<String>,
{
    type ResponseBody = ResBody;

    fn validate(&mut self, request: &mut Request<B>) -> Result<(), Response<Self::ResponseBody>> {
        if self.is_open() || self.accepts(request.headers().get(API_KEY_HEADER)) {
            return Ok(());
        }

        let mut res = Response::new(ResBody::from(UNAUTHORIZED_BODY.to_string()));
        *res.status_mut() = StatusCode::UNAUTHORIZED;
        res.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        Err(res)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(key: Option<&str>) -> Request<()> {
        let mut builder = Request::builder().uri("/start");
        if let Some(key) = key {
            builder = builder.header(API_KEY_HEADER, key);
        }
        builder.body(()).unwrap()
    }

    #[test]
    fn test_open_without_keys() {
        let mut v = ApiKeyValidate::<String>::new(Vec::<String>::new());
        assert!(v.validate(&mut request(None)).is_ok());

        let mut v = ApiKeyValidate::<String>::new(vec![""]);
        assert!(v.is_open());
    }

    #[test]
    fn test_matching_key() {
        let mut v = ApiKeyValidate::<String>::new(vec!["k1", "k2"]);
        assert!(v.validate(&mut request(Some("k2"))).is_ok());
    }

    #[test]
    fn test_rejects_missing_or_wrong_key() {
        let mut v = ApiKeyValidate::<String>::new(vec!["k1"]);

        let res = v.validate(&mut request(None)).unwrap_err();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(res.body(), UNAUTHORIZED_BODY);

        let res = v.validate(&mut request(Some("nope"))).unwrap_err();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }
}
