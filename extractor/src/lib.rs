use middleware::{auth::AuthMiddleware, extractor::ExtractionMiddleware};

pub mod middleware {
    pub mod auth;
    pub mod extractor;
}

/// Parses bearer tokens for every request underneath it.
pub fn middleware(jwt_secret: String) -> ExtractionMiddleware {
    ExtractionMiddleware::new(jwt_secret)
}

/// Rejects requests without valid claims.
pub fn authenticated() -> AuthMiddleware {
    AuthMiddleware::authenticated()
}

/// Rejects requests whose claims do not carry the admin role.
pub fn admin() -> AuthMiddleware {
    AuthMiddleware::admin()
}
