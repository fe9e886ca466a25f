mod cors;

use std::sync::Arc;

use actix_web::{
    App, HttpServer,
    web::{self},
};
use api_gate::{GateRegistry, services::registry::spawn_idle_sweep};
use chrono::Duration;
use common::env_config::Config;
use db::{AccountStore, PgAccountStore};
use gate::TrialWindow;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // get env vars
    let config = Config::from_env();
    let config_data = config.clone();

    // get info
    let is_production = config.is_production();
    let origin = config.cors_allowed_origin.clone();

    // init logger
    if config.console_logging_enabled {
        logger::setup(&config.log_file).expect("Failed to set up logger");
    }

    // init db connection
    let pool = db::setup(&config.database_url, is_production)
        .await
        .expect("Failed to set up database");
    let store: Arc<dyn AccountStore> = Arc::new(PgAccountStore::new(pool));
    let store_data = web::Data::from(store);

    // one gate session per signed-in user, shared by all workers
    let window = TrialWindow::new(config.trial_length_days);
    let idle_timeout = Duration::minutes(config.session_idle_minutes);
    let registry = web::Data::new(GateRegistry::with_idle_timeout(window, idle_timeout));
    log::info!(
        "Trial window is {} days, idle sessions expire after {} minutes",
        window.days(),
        config.session_idle_minutes
    );
    spawn_idle_sweep(
        registry.clone(),
        std::time::Duration::from_secs(config.session_sweep_secs),
    );

    let console_logging_enabled = config.console_logging_enabled;

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(config_data.clone()))
            .app_data(store_data.clone())
            .app_data(registry.clone())
            .wrap(logger::middleware(console_logging_enabled)) // 3rd
            .wrap(extractor::middleware(config_data.jwt_config.clone())) // 2nd
            .wrap(cors::middleware(&origin)) // 1st
            .service(
                web::scope("/api")
                    .service(api_subs::mount_webhook())
                    .service(
                        web::scope("/dashboard")
                            .wrap(api_auth::auth_middleware())
                            .service(api_gate::mount_gate())
                            .service(api_gate::mount_entitlement())
                            .service(api_subs::mount_pay()),
                    ),
            )
    })
    .bind((config.server_host.as_str(), config.server_port))?
    .workers(config.num_workers)
    .run()
    .await
}
