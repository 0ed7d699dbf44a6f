use actix_web::{get, post, web, HttpResponse};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::PgPool;

use crate::{
    configuration::VersiumSettings,
    dal::config_db,
    domain::{StoredConfig, API_KEY},
    services::VersiumClient,
};

#[derive(Serialize)]
struct ConfigView {
    api_key_set: bool,
    #[serde(flatten)]
    stored: StoredConfig,
    missing: Vec<String>,
}

#[get("")]
async fn get_config(pool: web::Data<PgPool>) -> HttpResponse {
    match config_db::get_stored_config(&pool).await {
        Ok(stored) => HttpResponse::Ok().json(ConfigView {
            api_key_set: stored.api_key_set(),
            missing: stored.missing(),
            stored,
        }),
        Err(e) => {
            log::error!("Error reading configuration: {:?}", e);
            HttpResponse::InternalServerError()
                .json(json!({ "error": "Could not read the configuration." }))
        }
    }
}

#[derive(Deserialize)]
struct SetConfigBody {
    key: String,
    value: String,
}

#[post("")]
async fn set_config(
    pool: web::Data<PgPool>,
    http_client: web::Data<Client>,
    versium: web::Data<VersiumSettings>,
    body: web::Json<SetConfigBody>,
) -> HttpResponse {
    let value = match config_db::normalize_config_value(&body.key, &body.value) {
        Ok(value) => value,
        Err(e) => return HttpResponse::BadRequest().json(json!({ "error": e.to_string() })),
    };

    if body.key == API_KEY {
        let client =
            VersiumClient::new(http_client.get_ref().clone(), &versium.base_url, value.clone());
        match client.validate_api_key().await {
            Ok(true) => {}
            Ok(false) => {
                return HttpResponse::Unauthorized().json(json!({
                    "error": "Invalid API Key provided. Please check your key and try again."
                }))
            }
            Err(e) => {
                log::error!("Error validating API key: {:?}", e);
                return HttpResponse::BadGateway()
                    .json(json!({ "error": "Could not reach Versium to validate the API key." }));
            }
        }
    }

    match config_db::set_config_value(&pool, &body.key, &value).await {
        Ok(cleared) => HttpResponse::Ok().json(json!({ "message": "Done!", "cleared": cleared })),
        Err(e) => {
            log::error!("Error saving configuration {}: {:?}", body.key, e);
            HttpResponse::InternalServerError()
                .json(json!({ "error": "Could not save the configuration." }))
        }
    }
}
