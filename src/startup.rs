use std::net::TcpListener;
use std::sync::Arc;

use actix_web::{dev::Server, middleware::Logger, web, App, HttpServer};
use sqlx::PgPool;

use crate::{
    configuration::Settings,
    dal::{JobStore, PgStore},
    providers::ProviderRegistry,
    routes::{default_route, lead_route},
    services::{Enricher, LeadEnricher, RateLimitConfig, RateLimiter, SearchPipeline},
};

pub fn run(
    listener: TcpListener,
    db_pool: PgPool,
    settings: Settings,
) -> Result<Server, std::io::Error> {
    let store: Arc<dyn JobStore> = Arc::new(PgStore::new(db_pool));
    let registry = ProviderRegistry::from_configuration(&settings.api_keys);
    let enricher = settings
        .api_keys
        .openai
        .clone()
        .map(|key| Arc::new(Enricher::new(key)) as Arc<dyn LeadEnricher>);
    let rate_limiter = RateLimiter::new(RateLimitConfig {
        capacity: settings.rate_limit.capacity as f64,
        refill_rate_per_ms: settings.rate_limit.refill_rate_per_ms(),
    });

    let pipeline = web::Data::new(SearchPipeline::new(
        registry,
        enricher,
        rate_limiter,
        store,
        settings.compliance.kill_switch,
    ));

    let server = HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .service(default_route::health_check)
            .service(
                web::scope("/lead")
                    .service(lead_route::create_job)
                    .service(lead_route::run_job)
                    .service(lead_route::get_job)
                    .service(lead_route::list_results),
            )
            .app_data(pipeline.clone())
    })
    .listen(listener)?
    .run();

    Ok(server)
}
