use actix_cors::Cors;
use actix_web::http::header;

/// Build the CORS layer from the configured origin list.
///
/// Entries that are empty, `"null"`, or not http(s) are ignored. With nothing
/// usable configured, only the local dev frontends are allowed.
pub fn cors_middleware(allowed: &[String]) -> Cors {
    let mut origins: Vec<&str> = allowed
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty() && *s != "null")
        .filter(|s| s.starts_with("http://") || s.starts_with("https://"))
        .collect();

    if origins.is_empty() {
        origins = vec!["http://localhost:3000", "http://127.0.0.1:3000"];
    }

    let mut cors = Cors::default()
        .allowed_methods(vec!["GET", "POST", "OPTIONS"])
        .allowed_headers(vec![
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::HeaderName::from_static("x-api-key"),
        ])
        .expose_headers(vec![
            header::HeaderName::from_static("x-trace-id"),
            header::HeaderName::from_static("x-request-id"),
            header::RETRY_AFTER,
        ])
        .max_age(3600);

    for origin in origins {
        cors = cors.allowed_origin(origin);
    }

    cors
}
