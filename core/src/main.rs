mod cors;

use std::sync::Arc;

use actix_web::{
    App, HttpServer,
    web::{self},
};
use api_subs::{
    services::{billing::StripeBilling, status::SubscriptionReconciler},
    store::PgSubscriptionStore,
};
use common::env_config::Config;
use limiter::{cache::LimitsCache, source::PgQuotaSource};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // get env vars
    let config = Config::from_env();
    let config_data = config.clone();
    let origin = config.cors_allowed_origin.clone();

    // init logger
    logger::setup(&config.log_file).expect("Failed to set up logger");

    // init db connection
    let pool = db::setup(&config.database_url, config.is_production())
        .await
        .expect("Failed to set up database");

    // billing provider is optional; without it subscriptions are judged locally
    let billing = common::stripe::create_client(&config.stripe_secret_key)
        .map(|client| StripeBilling::new(client, config.billing_timeout));
    if billing.is_none() {
        log::warn!("STRIPE_SECRET_KEY is not a secret key, Stripe checks are disabled");
    }

    // one cache shared by the evaluator, the reconciler and the admin routes
    let cache = Arc::new(LimitsCache::new(config.limits_cache_ttl));
    log::info!("Plan limits cached for {:?}", cache.ttl());

    let evaluator = web::Data::new(limiter::evaluator(
        PgQuotaSource::new(pool.clone()),
        cache.clone(),
    ));
    let reconciler = web::Data::new(SubscriptionReconciler::new(
        PgSubscriptionStore::new(pool.clone()),
        billing,
        cache.clone(),
    ));
    let cache_data = web::Data::from(cache);

    HttpServer::new(move || {
        let secret = config_data.jwt_config.secret.clone();
        App::new()
            .app_data(web::Data::new(pool.clone()))
            .app_data(evaluator.clone())
            .app_data(reconciler.clone())
            .app_data(cache_data.clone())
            .wrap(logger::middleware(config_data.console_logging_enabled)) // 3rd
            .wrap(extractor::middleware(secret)) // 2nd
            .wrap(cors::middleware(&origin)) // 1st
            .service(
                web::scope("/api")
                    .service(api_limits::mount_limits().wrap(extractor::authenticated()))
                    .service(api_subs::mount_subs().wrap(extractor::authenticated()))
                    .service(api_subs::mount_admin().wrap(extractor::admin())),
            )
    })
    .bind((config.server_host.as_str(), config.server_port))?
    .workers(config.num_workers)
    .run()
    .await
}
