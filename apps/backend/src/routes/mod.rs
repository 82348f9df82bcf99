use actix_web::web;

pub mod finalize;
pub mod health;
pub mod state;

/// Register every route. `main.rs` wraps the same configuration in the
/// middleware stack; tests mount it bare.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(health::root));

    // /health
    cfg.service(web::scope("/health").configure(health::configure_routes));

    // /api/state/get, /api/state/put
    cfg.service(web::scope("/api/state").configure(state::configure_routes));

    // /api/finalize
    cfg.service(web::scope("/api/finalize").configure(finalize::configure_routes));
}
