//! Authorization gate middleware.
//!
//! Each protected scope or route is wrapped with an [`AuthGate`] declaring
//! its required level at registration time. The gate resolves the caller's
//! level at most once per request (the result is cached in the request
//! extensions), applies the bypass rules, and rejects with a bare 401 when
//! the resolved level is insufficient.

use std::future::{Ready, ready};
use std::rc::Rc;
use std::sync::Arc;

use actix_web::body::EitherBody;
use actix_web::dev::{Payload, Service, ServiceRequest, ServiceResponse, Transform, forward_ready};
use actix_web::{Error, FromRequest, HttpMessage, HttpRequest, HttpResponse, web};
use futures_util::future::LocalBoxFuture;

use crate::auth::matcher::{MatchEvaluator, named_key_evaluator};
use crate::auth::{AuthorizationLevel, AuthorizationResult, resolver};
use crate::config::Config;
use crate::secrets::SecretStore;

/// Shared handle to the secret store, registered as app data.
#[derive(Clone)]
pub struct SecretStoreHandle(Arc<dyn SecretStore>);

impl SecretStoreHandle {
    pub fn new(store: impl SecretStore + 'static) -> Self {
        Self(Arc::new(store))
    }

    pub fn store(&self) -> &dyn SecretStore {
        self.0.as_ref()
    }
}

/// Deployment-wide gate settings, registered as app data.
///
/// Absent settings mean authorization is enabled: the gate fails closed.
#[derive(Debug, Clone, Copy, Default)]
pub struct GateSettings {
    /// When set, every gate allows unconditionally without resolving.
    pub auth_disabled: bool,
}

impl From<&Config> for GateSettings {
    fn from(config: &Config) -> Self {
        Self {
            auth_disabled: config.auth_disabled,
        }
    }
}

/// Authorization gate middleware factory.
///
/// ```ignore
/// web::scope("/admin").wrap(AuthGate::admin())
/// web::scope("/api/ping").wrap(AuthGate::function("ping"))
/// ```
pub struct AuthGate {
    inner: Rc<GateRule>,
}

struct GateRule {
    required: AuthorizationLevel,
    function_name: Option<String>,
    evaluator: Option<MatchEvaluator>,
    exempt: bool,
}

impl AuthGate {
    /// Gate requiring the given level, with the default match rule.
    pub fn new(required: AuthorizationLevel) -> Self {
        Self {
            inner: Rc::new(GateRule {
                required,
                function_name: None,
                evaluator: None,
                exempt: false,
            }),
        }
    }

    /// Gate requiring no authorization at all.
    pub fn anonymous() -> Self {
        Self::new(AuthorizationLevel::Anonymous)
    }

    /// Function-level gate bound to one function's key collection.
    pub fn function(function_name: &str) -> Self {
        Self {
            inner: Rc::new(GateRule {
                required: AuthorizationLevel::Function,
                function_name: Some(function_name.to_string()),
                evaluator: None,
                exempt: false,
            }),
        }
    }

    /// System-level gate with the default match rule.
    pub fn system() -> Self {
        Self::new(AuthorizationLevel::System)
    }

    /// System-level gate that only accepts the named system key.
    pub fn system_key(key_name: &str) -> Self {
        Self {
            inner: Rc::new(GateRule {
                required: AuthorizationLevel::System,
                function_name: None,
                evaluator: Some(named_key_evaluator(key_name)),
                exempt: false,
            }),
        }
    }

    /// Admin-level gate (master key only).
    pub fn admin() -> Self {
        Self::new(AuthorizationLevel::Admin)
    }

    /// Exempt the wrapped operations from the level check.
    ///
    /// Resolution still runs so handlers can observe the caller's level,
    /// but the outcome never blocks the request.
    pub fn allow_anonymous(self) -> Self {
        let rule = GateRule {
            required: self.inner.required,
            function_name: self.inner.function_name.clone(),
            evaluator: self.inner.evaluator.clone(),
            exempt: true,
        };
        Self {
            inner: Rc::new(rule),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthGate
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthGateMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthGateMiddleware {
            service: Rc::new(service),
            rule: Rc::clone(&self.inner),
        }))
    }
}

/// Authorization gate middleware service.
pub struct AuthGateMiddleware<S> {
    service: Rc<S>,
    rule: Rc<GateRule>,
}

impl<S, B> Service<ServiceRequest> for AuthGateMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let rule = Rc::clone(&self.rule);

        Box::pin(async move {
            // Deployment-wide disable switch: allow without ever resolving.
            let settings = req
                .app_data::<web::Data<GateSettings>>()
                .map(|s| *s.get_ref())
                .unwrap_or_default();
            if settings.auth_disabled {
                let res = service.call(req).await?;
                return Ok(res.map_into_left_body());
            }

            // At most one resolution per request: a cached result, whatever
            // its level, is reused as-is.
            let cached = req.extensions().get::<AuthorizationResult>().cloned();
            let resolved = match cached {
                Some(result) => Some(result),
                None => {
                    let Some(handle) = req.app_data::<web::Data<SecretStoreHandle>>().cloned()
                    else {
                        // Missing wiring is a programmer error; fail before
                        // any store I/O rather than guessing a default.
                        tracing::error!(
                            path = %req.path(),
                            "authorization gate has no SecretStoreHandle in app data"
                        );
                        let response =
                            HttpResponse::InternalServerError().finish().map_into_right_body();
                        return Ok(req.into_response(response));
                    };

                    let presented = resolver::presented_key(req.headers(), req.query_string());
                    match resolver::resolve(
                        handle.store(),
                        presented.as_ref(),
                        rule.function_name.as_deref(),
                        rule.evaluator.as_ref(),
                    )
                    .await
                    {
                        Ok(result) => {
                            req.extensions_mut().insert(result.clone());
                            Some(result)
                        }
                        Err(e) => {
                            // A store failure gates as Anonymous and caches
                            // nothing, so a later gate on this request may
                            // retry after a transient outage.
                            tracing::warn!(path = %req.path(), error = %e,
                                "authorization resolution failed, treating caller as anonymous");
                            None
                        }
                    }
                }
            };

            // Bypasses are independent of the resolved level.
            if rule.exempt || rule.required == AuthorizationLevel::Anonymous {
                let res = service.call(req).await?;
                return Ok(res.map_into_left_body());
            }

            let level = resolved
                .map(|r| r.level)
                .unwrap_or(AuthorizationLevel::Anonymous);

            if level >= rule.required {
                let res = service.call(req).await?;
                Ok(res.map_into_left_body())
            } else {
                // No body: nothing about which tier was checked may leak.
                let response = HttpResponse::Unauthorized().finish().map_into_right_body();
                Ok(req.into_response(response))
            }
        })
    }
}

/// Extractor handing the cached authorization result to handlers.
///
/// Use this in handlers behind a gate that need the matched key name:
/// ```ignore
/// async fn status(auth: Authorized) -> impl Responder {
///     // auth.0.key_name names the key that authorized the caller
/// }
/// ```
///
/// An empty cache slot (no gate ran) yields an Anonymous result.
pub struct Authorized(pub AuthorizationResult);

impl FromRequest for Authorized {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let result = req
            .extensions()
            .get::<AuthorizationResult>()
            .cloned()
            .unwrap_or_else(AuthorizationResult::anonymous);
        ready(Ok(Authorized(result)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[actix_rt::test]
    async fn test_authorized_extractor_defaults_to_anonymous() {
        let req = TestRequest::default().to_http_request();
        let auth = Authorized::extract(&req).await.unwrap();
        assert_eq!(auth.0, AuthorizationResult::anonymous());
    }

    #[actix_rt::test]
    async fn test_authorized_extractor_reads_cached_result() {
        let req = TestRequest::default().to_http_request();
        req.extensions_mut()
            .insert(AuthorizationResult::new(AuthorizationLevel::System, "sys1"));

        let auth = Authorized::extract(&req).await.unwrap();
        assert_eq!(auth.0.level, AuthorizationLevel::System);
        assert_eq!(auth.0.key_name.as_deref(), Some("sys1"));
    }
}
