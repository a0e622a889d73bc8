use std::env;

use actix_files::Files;
use actix_web::cookie::Key;
use actix_web::middleware::Logger;
use actix_web::{App, HttpServer, web};
use actix_web_flash_messages::{FlashMessagesFramework, storage::CookieMessageStore};
use dotenvy::dotenv;
use tera::Tera;

use investor_forms::client::http::HttpInvestorApi;
use investor_forms::drafts::DraftStore;
use investor_forms::models::config::ServerConfig;
use investor_forms::routes::configure;

fn signing_key(server_config: &ServerConfig) -> Key {
    match server_config.secret_key.as_deref().map(str::as_bytes) {
        Some(secret) => Key::try_from(secret).unwrap_or_else(|e| {
            log::warn!("Configured secret key is unusable ({e}), generating a random one");
            Key::generate()
        }),
        None => {
            log::warn!("No secret key configured, flash messages will not survive a restart");
            Key::generate()
        }
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let server_config = match ServerConfig::load() {
        Ok(server_config) => server_config,
        Err(e) => {
            log::error!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    let api = match HttpInvestorApi::new(
        &server_config.api_base_url,
        &server_config.upload_url,
        server_config.request_timeout(),
    ) {
        Ok(api) => web::Data::new(api),
        Err(e) => {
            log::error!("Failed to build investor API client: {e}");
            std::process::exit(1);
        }
    };

    let tera = match Tera::new(&server_config.templates_dir) {
        Ok(tera) => web::Data::new(tera),
        Err(e) => {
            log::error!("Failed to parse templates: {e}");
            std::process::exit(1);
        }
    };

    let message_store = CookieMessageStore::builder(signing_key(&server_config)).build();
    let message_framework = FlashMessagesFramework::builder(message_store).build();

    let store = web::Data::new(DraftStore::new(server_config.draft_ttl()));
    let bind_address = server_config.bind_address();
    let assets_dir = env::var("ASSETS_DIR").unwrap_or_else(|_| "./assets".to_string());
    let server_config = web::Data::new(server_config);

    log::info!("Starting investor forms on {}:{}", bind_address.0, bind_address.1);

    HttpServer::new(move || {
        App::new()
            .wrap(message_framework.clone())
            .wrap(Logger::default())
            .service(Files::new("/assets", assets_dir.clone()))
            .configure(configure)
            .app_data(store.clone())
            .app_data(api.clone())
            .app_data(server_config.clone())
            .app_data(tera.clone())
    })
    .bind(bind_address)?
    .run()
    .await
}
