use actix_web::web::QueryConfig;
use paperclip::actix::web;

use crate::error::ApiError;
use crate::handlers;

pub fn config_app(cfg: &mut web::ServiceConfig) {
    let query_config = QueryConfig::default()
        .error_handler(|err, _| ApiError::BadRequest(format!("Invalid filter: {}", err)).into());

    cfg.service(web::resource("/health").route(web::get().to(handlers::health)))
        .service(
            web::scope("/books")
                .app_data(query_config)
                .service(
                    web::resource("")
                        .route(web::get().to(handlers::list_books))
                        .route(web::post().to(handlers::add_book)),
                )
                .service(
                    web::resource("/{isbn}")
                        .route(web::get().to(handlers::get_book))
                        .route(web::put().to(handlers::update_book))
                        .route(web::delete().to(handlers::remove_book)),
                ),
        );
}
