use actix::Actor;
use actix_cors::Cors;
use actix_web::{
    self, App, HttpServer,
    middleware::{Logger, from_fn},
    web,
};
use std::sync::{Arc, LazyLock};

use crate::{
    configs::{RedisCache, connect_database},
    middlewares::authentication,
    modules::{
        chat::{repository_pg::ChatRepositoryPg, service::ChatService},
        realtime::{delivery::HubDelivery, handler::websocket_handler, hub::RealtimeHub},
        user::{repository_pg::UserRepositoryPg, service::UserService},
    },
};

mod api;
mod configs;
mod constants;
mod middlewares;
mod modules;
mod test;
mod utils;

pub static ENV: LazyLock<constants::Env> = LazyLock::new(|| {
    dotenvy::dotenv().ok();
    env_logger::init();
    log::info!("Environment variables loaded from .env file");
    constants::Env::default()
});

#[actix_web::get("/")]
async fn health_check() -> &'static str {
    "Server is running"
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let db_pool =
        connect_database().await.map_err(|_| std::io::Error::other("Database connection error"))?;

    let redis_pool =
        RedisCache::new().await.map_err(|_| std::io::Error::other("Redis connection error"))?;
    let redis_pool = Arc::new(redis_pool);

    // Hub được construct một lần ở đây và inject xuống, không có
    // module-level connection global.
    let hub = RealtimeHub::new().start();
    let delivery = Arc::new(HubDelivery::new(hub.clone()));

    let chat_repo = Arc::new(ChatRepositoryPg::new(db_pool.clone()));
    let chat_service = ChatService::with_dependencies(chat_repo, delivery);

    let user_repo = UserRepositoryPg::new(db_pool.clone());
    let user_service = UserService::with_dependencies(Arc::new(user_repo), redis_pool.clone());

    println!("Starting server at http://{}:{}", ENV.ip.as_str(), ENV.port);
    HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin(ENV.frontend_url.as_str())
            .allow_any_method()
            .allow_any_header()
            .supports_credentials();

        App::new()
            .wrap(Logger::default())
            .wrap(cors)
            .app_data(web::Data::new(user_service.clone()))
            .app_data(web::Data::new(chat_service.clone()))
            .app_data(web::Data::new(hub.clone()))
            .service(health_check)
            .route("/ws", web::get().to(websocket_handler))
            .service(
                web::scope("/api")
                    .wrap(from_fn(authentication))
                    .configure(modules::user::route::configure)
                    .configure(modules::chat::route::configure),
            )
    })
    .bind((ENV.ip.as_str(), ENV.port))?
    .workers(2)
    .run()
    .await
}
