use actix_web::{get, post, web, HttpResponse};
use reqwest::Client;
use serde::Serialize;
use serde_json::json;
use sqlx::PgPool;

use crate::{
    configuration::VersiumSettings,
    dal::{config_db, record_db::PgRecordStore},
    domain::{EnrichmentConfig, EnrichmentError, RunSummary, ViewPreview},
    services::{pacer_from_settings, preview_enrichment, run_enrichment, RunControl, VersiumClient},
};

#[derive(Serialize)]
struct RunResponse {
    message: String,
    #[serde(flatten)]
    summary: RunSummary,
}

#[derive(Serialize)]
struct PreviewResponse {
    message: String,
    #[serde(flatten)]
    preview: ViewPreview,
}

async fn resolved_config(pool: &PgPool) -> Result<EnrichmentConfig, HttpResponse> {
    let stored = config_db::get_stored_config(pool).await.map_err(|e| {
        log::error!("Error reading configuration: {:?}", e);
        HttpResponse::InternalServerError()
            .json(json!({ "error": "Could not read the configuration." }))
    })?;

    stored
        .resolve()
        .map_err(|e| error_response(&EnrichmentError::from(e)))
}

#[get("")]
async fn get_preview(pool: web::Data<PgPool>) -> HttpResponse {
    let config = match resolved_config(&pool).await {
        Ok(config) => config,
        Err(response) => return response,
    };
    let store = PgRecordStore::new(pool.get_ref().clone());

    match preview_enrichment(&config, &store).await {
        Ok(view) => HttpResponse::Ok().json(PreviewResponse {
            message: view.message(),
            preview: view,
        }),
        Err(e) => error_response(&e),
    }
}

#[post("/run")]
async fn run(
    pool: web::Data<PgPool>,
    http_client: web::Data<Client>,
    versium: web::Data<VersiumSettings>,
    run_control: web::Data<RunControl>,
) -> HttpResponse {
    let guard = match run_control.try_start() {
        Some(guard) => guard,
        None => {
            return HttpResponse::Conflict()
                .json(json!({ "error": "An enrichment is already in progress." }))
        }
    };

    let config = match resolved_config(&pool).await {
        Ok(config) => config,
        Err(response) => return response,
    };

    let provider = VersiumClient::new(
        http_client.get_ref().clone(),
        &versium.base_url,
        config.api_key.clone(),
    );
    let store = PgRecordStore::new(pool.get_ref().clone());
    let pacer = pacer_from_settings(&versium.pacing);

    match run_enrichment(&config, &provider, &store, pacer.as_ref(), &guard.token).await {
        Ok(summary) => HttpResponse::Ok().json(RunResponse {
            message: summary.message(),
            summary,
        }),
        Err(e) => error_response(&e),
    }
}

#[post("/cancel")]
async fn cancel(run_control: web::Data<RunControl>) -> HttpResponse {
    let message = match run_control.cancel() {
        true => "Cancelling enrichment.",
        false => "No enrichment is running.",
    };
    HttpResponse::Accepted().json(json!({ "message": message }))
}

fn error_response(error: &EnrichmentError) -> HttpResponse {
    log::error!("Enrichment failed: {}", error);
    let message = error.to_string();

    match error {
        EnrichmentError::Configuration(_) => {
            HttpResponse::BadRequest().json(json!({ "error": message }))
        }
        EnrichmentError::Auth => HttpResponse::Unauthorized().json(json!({ "error": message })),
        EnrichmentError::Cancelled { processed, total } => HttpResponse::Conflict().json(json!({
            "error": message,
            "cancelled": true,
            "processed": processed,
            "total": total,
        })),
        EnrichmentError::Store(_) => {
            HttpResponse::InternalServerError().json(json!({ "error": message }))
        }
        EnrichmentError::Write(e) => HttpResponse::BadGateway().json(json!({
            "error": message,
            "written": e.written,
            "total": e.total,
        })),
    }
}

#[cfg(test)]
mod tests {
    use actix_web::{body::to_bytes, http::StatusCode, test, web, App};

    use super::{cancel, error_response};
    use crate::{
        domain::{ConfigurationError, EnrichmentError, StoreError, WriteError},
        services::RunControl,
    };

    #[actix_web::test]
    async fn write_error_reports_partial_progress() {
        let error = EnrichmentError::Write(WriteError {
            written: 50,
            total: 120,
            source: StoreError::Rejected {
                expected: 50,
                affected: 49,
            },
        });

        let response = error_response(&error);
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

        let body = to_bytes(response.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["written"], 50);
        assert_eq!(json["total"], 120);
    }

    #[actix_web::test]
    async fn statuses_follow_the_error_kind() {
        let cases = [
            (
                EnrichmentError::Configuration(ConfigurationError::Missing(vec![
                    "api-key".to_string()
                ])),
                StatusCode::BAD_REQUEST,
            ),
            (EnrichmentError::Auth, StatusCode::UNAUTHORIZED),
            (
                EnrichmentError::Cancelled {
                    processed: 3,
                    total: 9,
                },
                StatusCode::CONFLICT,
            ),
        ];

        for (error, status) in cases {
            assert_eq!(error_response(&error).status(), status);
        }
    }

    #[actix_web::test]
    async fn cancel_is_accepted_with_or_without_a_run() {
        let control = web::Data::new(RunControl::default());
        let app = test::init_service(App::new().app_data(control.clone()).service(cancel)).await;

        let response =
            test::call_service(&app, test::TestRequest::post().uri("/cancel").to_request()).await;
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        let idle: serde_json::Value = test::read_body_json(response).await;
        assert_eq!(idle["message"], "No enrichment is running.");

        let guard = control.try_start().unwrap();
        let response =
            test::call_service(&app, test::TestRequest::post().uri("/cancel").to_request()).await;
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert!(guard.token.is_cancelled());
    }
}
