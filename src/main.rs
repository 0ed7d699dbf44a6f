use std::{net::TcpListener, time::Duration};

use enricher::{configuration::get_configuration, startup::run};
use env_logger::Env;
use sqlx::postgres::PgPoolOptions;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let configuration = get_configuration().map_err(|e| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("Failed to read configuration: {}", e),
        )
    })?;

    let pool_options = PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(10))
        .idle_timeout(Duration::from_secs(15 * 60)); // 15 minutes

    let connection_pool = pool_options.connect_lazy_with(configuration.database.with_db());

    sqlx::migrate!("./migrations")
        .run(&connection_pool)
        .await
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;

    let address = format!(
        "{}:{}",
        configuration.application.host, configuration.application.port
    );
    let listener = TcpListener::bind(address)?;
    log::info!("Listening on {}", listener.local_addr()?);

    // No request timeout: a hung lookup stalls the run rather than failing it.
    let http_client = reqwest::Client::new();

    run(listener, connection_pool, http_client, configuration.versium)?.await
}
