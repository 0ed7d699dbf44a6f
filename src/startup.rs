use std::net::TcpListener;

use actix_web::{dev::Server, middleware::Logger, web, App, HttpServer};
use reqwest::Client;
use sqlx::PgPool;

use crate::{
    configuration::VersiumSettings,
    routes::{config_route, default_route, enrichment_route},
    services::RunControl,
};

pub fn run(
    listener: TcpListener,
    db_pool: PgPool,
    http_client: Client,
    versium: VersiumSettings,
) -> Result<Server, std::io::Error> {
    let db_pool = web::Data::new(db_pool);
    let http_client = web::Data::new(http_client);
    let versium = web::Data::new(versium);
    let run_control = web::Data::new(RunControl::default());

    let server = HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .service(default_route::default)
            .service(
                web::scope("/config")
                    .service(config_route::get_config)
                    .service(config_route::set_config),
            )
            .service(
                web::scope("/enrichment")
                    .service(enrichment_route::get_preview)
                    .service(enrichment_route::run)
                    .service(enrichment_route::cancel),
            )
            .app_data(db_pool.clone())
            .app_data(http_client.clone())
            .app_data(versium.clone())
            .app_data(run_control.clone())
    })
    .listen(listener)?
    .run();

    Ok(server)
}
