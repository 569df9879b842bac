use actix_web::web;

use crate::error::ApiError;
use crate::handlers::{self, colivings, locations, users};

/// Every endpoint the service exposes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .route("/health", web::get().to(handlers::health_check))

        .route("/colivings", web::get().to(colivings::list_colivings))
        .route("/colivings", web::post().to(colivings::create_coliving))
        .route("/colivings/{id}", web::get().to(colivings::get_coliving))
        .route("/colivings/{id}", web::patch().to(colivings::update_coliving))
        .route("/colivings/{id}", web::delete().to(colivings::delete_coliving))
        .route("/colivings/{id}/images", web::post().to(colivings::add_image))

        .route("/users", web::post().to(users::create_or_get_user))
        .route("/users/{telegram_id}", web::get().to(users::get_user))
        .route("/users/{telegram_id}", web::patch().to(users::update_residence))

        .route("/locations", web::get().to(locations::list_locations))
        .route("/locations", web::post().to(locations::create_location));
}

fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        log::debug!("rejected request body: {}", err);
        ApiError::BadRequest(err.to_string()).into()
    })
}
