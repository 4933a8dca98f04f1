mod assets;
mod badges;
mod index;

use actix_web::{web, Scope};

use crate::cloudbuild::BuildSource;
use crate::config::AppConfig;

pub use badges::*;
pub use index::*;

/// Everything a request handler needs; built once in main
pub struct AppState {
    pub config: AppConfig,
    pub source: Box<dyn BuildSource>,
}

/// All badge routes, mounted under the configured path prefix
pub fn scope(prefix: &str) -> Scope {
    web::scope(prefix)
        .service(badge_image)
        .service(badge_json)
        .service(build_log)
        .route("", web::get().to(index))
        .route("/", web::get().to(index))
        .route("/generator.js", web::get().to(assets::generator_js))
}
