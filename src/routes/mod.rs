use actix_web::web;

use crate::middleware::auth::AuthMiddleware;

pub mod collaboration;
pub mod health;
pub mod plans;
pub mod recommendations;
pub mod route;

/// Register every route. Write routes of the collaboration board and likes
/// require a bearer token signed with `jwt_secret`.
pub fn configure(cfg: &mut web::ServiceConfig, jwt_secret: &str) {
    cfg.route("/health", web::get().to(health::health_check))
        .service(
            web::scope("/api")
                .service(
                    web::scope("/plans/{key}")
                        .route("", web::get().to(plans::get_plan))
                        .route("", web::put().to(plans::put_plan))
                        .route("", web::delete().to(plans::delete_plan))
                        .route("/generate", web::post().to(plans::generate))
                        .route("/chat", web::post().to(plans::chat))
                        .route("/share", web::get().to(plans::share))
                        .route("/map", web::post().to(plans::map))
                        .route("/days", web::post().to(plans::add_day))
                        .route("/days/{day_id}", web::delete().to(plans::remove_day))
                        .route(
                            "/days/{day_id}/activities",
                            web::post().to(plans::add_activity),
                        )
                        .route(
                            "/days/{day_id}/activities/{activity_id}",
                            web::patch().to(plans::update_activity),
                        )
                        .route(
                            "/days/{day_id}/activities/{activity_id}",
                            web::delete().to(plans::delete_activity),
                        )
                        .route(
                            "/days/{day_id}/activities/{activity_id}/move",
                            web::post().to(plans::move_activity),
                        ),
                )
                .route("/route/optimize", web::post().to(route::optimize))
                .service(
                    web::scope("/recommendations")
                        .route("", web::get().to(recommendations::list))
                        .route("", web::post().to(recommendations::create))
                        .route("/facets", web::get().to(recommendations::facets))
                        .route(
                            "/{id}/use/{key}",
                            web::post().to(recommendations::use_recommendation),
                        )
                        // Protected routes
                        .service(
                            web::scope("")
                                .wrap(AuthMiddleware::new(jwt_secret))
                                .route("/{id}/like", web::post().to(recommendations::like)),
                        ),
                )
                .service(
                    web::scope("/templates")
                        .route("", web::get().to(recommendations::list_templates))
                        .route(
                            "/{id}/use/{key}",
                            web::post().to(recommendations::use_template),
                        ),
                )
                .service(
                    web::scope("/collaboration/{key}")
                        .route("", web::get().to(collaboration::get_board))
                        // Protected routes
                        .service(
                            web::scope("")
                                .wrap(AuthMiddleware::new(jwt_secret))
                                .route("/comments", web::post().to(collaboration::add_comment))
                                .route("/polls", web::post().to(collaboration::create_poll))
                                .route(
                                    "/polls/{poll_id}/vote",
                                    web::post().to(collaboration::vote),
                                )
                                .route(
                                    "/polls/{poll_id}/close",
                                    web::post().to(collaboration::close_poll),
                                )
                                .route(
                                    "/collaborators",
                                    web::post().to(collaboration::invite),
                                ),
                        ),
                ),
        );
}
