use actix_web::web::{self};
use limiter::source::{PgQuotaSource, QuotaSource};

pub mod routes {
    pub mod limits;
}

mod dtos {
    pub(crate) mod limits;
}

pub fn mount_limits() -> actix_web::Scope {
    scope::<PgQuotaSource>()
}

/// `/limits` routes over any quota source.
pub fn scope<S: QuotaSource + 'static>() -> actix_web::Scope {
    web::scope("/limits")
        .route("", web::get().to(routes::limits::get_limits::<S>))
        .route("/check/{feature}", web::get().to(routes::limits::get_check::<S>))
        .route("/storage", web::get().to(routes::limits::get_storage::<S>))
        .route("/refresh", web::post().to(routes::limits::post_refresh::<S>))
}
