/// HTTP middleware for blog-service
///
/// Resolves the request's `Identity` from an optional Bearer token. Requests
/// without a token proceed anonymously; a token that is invalid, expired or
/// names an unknown author is rejected with 401.
pub mod jwt;

use actix_web::dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::{error::ErrorUnauthorized, Error, FromRequest, HttpMessage, HttpRequest};
use futures_util::future::LocalBoxFuture;
use std::future::{ready, Ready};
use std::rc::Rc;
use std::sync::Arc;
use tracing::debug;

use crate::domain::Identity;
use crate::error::AppError;
use crate::repository::BlogStore;

/// Actix middleware that attaches an `Identity` to every request.
pub struct IdentityMiddleware {
    store: Arc<dyn BlogStore>,
    secret: Arc<str>,
}

impl IdentityMiddleware {
    pub fn new(store: Arc<dyn BlogStore>, secret: impl Into<Arc<str>>) -> Self {
        Self {
            store,
            secret: secret.into(),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for IdentityMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = IdentityMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(IdentityMiddlewareService {
            service: Rc::new(service),
            store: self.store.clone(),
            secret: self.secret.clone(),
        }))
    }
}

pub struct IdentityMiddlewareService<S> {
    service: Rc<S>,
    store: Arc<dyn BlogStore>,
    secret: Arc<str>,
}

impl<S, B> Service<ServiceRequest> for IdentityMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let store = self.store.clone();
        let secret = self.secret.clone();

        Box::pin(async move {
            let identity = match bearer_token(req.request())? {
                None => Identity::Anonymous,
                Some(token) => {
                    let claims = jwt::decode_token(&token, &secret)
                        .map_err(|_| ErrorUnauthorized("Invalid or expired token"))?;
                    let author_id = claims
                        .author_id()
                        .ok_or_else(|| ErrorUnauthorized("Invalid author ID"))?;

                    // Loaded per request so a deleted author loses access at once.
                    match store.get_author(author_id).await {
                        Ok(author) => Identity::Authenticated(author),
                        Err(AppError::NotFound(_)) => {
                            debug!(%author_id, "Token names an unknown author");
                            return Err(ErrorUnauthorized("Unknown author"));
                        }
                        Err(e) => return Err(e.into()),
                    }
                }
            };

            req.extensions_mut().insert(identity);
            service.call(req).await
        })
    }
}

/// `None` when no Authorization header is sent.
fn bearer_token(req: &HttpRequest) -> Result<Option<String>, Error> {
    let Some(header) = req.headers().get("Authorization") else {
        return Ok(None);
    };

    let value = header
        .to_str()
        .map_err(|_| ErrorUnauthorized("Invalid Authorization header"))?;
    let token = value
        .strip_prefix("Bearer ")
        .ok_or_else(|| ErrorUnauthorized("Invalid Authorization scheme"))?;

    Ok(Some(token.trim().to_string()))
}

impl FromRequest for Identity {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(Ok(req
            .extensions()
            .get::<Identity>()
            .cloned()
            .unwrap_or_default()))
    }
}
