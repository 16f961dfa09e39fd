use actix_web::web::{self};
use services::billing::StripeBilling;
use store::PgSubscriptionStore;

pub mod routes {
    pub mod admin;
    pub mod sub;
}

pub mod services {
    pub mod admin;
    pub mod billing;
    pub mod cancel;
    pub mod status;
}

mod dtos {
    pub(crate) mod admin;
    pub(crate) mod sub;
}

pub mod store;

#[cfg(test)]
mod testing;

pub fn mount_subs() -> actix_web::Scope {
    scope::<PgSubscriptionStore, StripeBilling>()
}

/// `/sub` routes over any store and billing provider.
pub fn scope<S, P>() -> actix_web::Scope
where
    S: store::SubscriptionStore + 'static,
    P: services::billing::BillingProvider + 'static,
{
    web::scope("/sub")
        .route("/status", web::get().to(routes::sub::get_status::<S, P>))
        .route("/cancel", web::post().to(routes::sub::post_cancel::<S, P>))
        .route("/plans", web::get().to(routes::sub::get_plans))
}

pub fn mount_admin() -> actix_web::Scope {
    web::scope("/admin")
        .service(routes::admin::put_user_plan)
        .service(routes::admin::post_suspend)
        .service(routes::admin::post_reactivate)
        .service(routes::admin::post_clear_user_cache)
        .service(routes::admin::post_clear_cache)
}
