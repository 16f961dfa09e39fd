use std::{future::Future, pin::Pin, sync::Arc};

use actix_web::{
    Error, HttpMessage,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
};
use futures::future::{Ready, ok};

use common::{error::AppError, jwt};

/// Gate for routes that need a caller. Valid claims are re-inserted as a
/// bare `JwtClaims` so handlers can take `web::ReqData<JwtClaims>`.
pub struct AuthMiddleware {
    admin_only: bool,
}

impl AuthMiddleware {
    pub fn authenticated() -> Self {
        Self { admin_only: false }
    }

    pub fn admin() -> Self {
        Self { admin_only: true }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: actix_web::body::MessageBody + 'static,
{
    type Response = ServiceResponse<actix_web::body::BoxBody>;
    type Error = Error;
    type Transform = AuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(AuthMiddlewareService {
            service: Arc::new(service),
            admin_only: self.admin_only,
        })
    }
}

pub struct AuthMiddlewareService<S> {
    service: Arc<S>,
    admin_only: bool,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: actix_web::body::MessageBody + 'static,
{
    type Response = ServiceResponse<actix_web::body::BoxBody>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let claims = match jwt::get_jwt_claims_or_error(&req) {
            Ok(claims) => claims,
            Err(response) => {
                return Box::pin(async move { Ok(req.into_response(response)) });
            }
        };

        if self.admin_only && !claims.is_admin() {
            log::warn!(
                "User {} denied access to admin route {}",
                claims.user_id,
                req.path()
            );
            let response =
                AppError::Forbidden("Admin role required".to_string()).to_http_response();
            return Box::pin(async move { Ok(req.into_response(response)) });
        }

        req.extensions_mut().insert(claims);
        let srv = Arc::clone(&self.service);

        Box::pin(async move { srv.call(req).await.map(|res| res.map_into_boxed_body()) })
    }
}
