use actix_web::{HttpResponse, Responder};

pub async fn generator_js() -> impl Responder {
    HttpResponse::Ok()
        .content_type("application/javascript; charset=utf-8")
        .insert_header(("Cache-Control", "public, max-age=3600"))
        .body(include_str!("generator.js"))
}
