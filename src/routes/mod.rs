use actix_web::HttpResponse;
use actix_web::http::header;
use actix_web::web;
use actix_web_flash_messages::{IncomingFlashMessages, Level};
use tera::{Context, Tera};

pub mod investors;

pub fn render_template(tera: &Tera, template: &str, context: &Context) -> HttpResponse {
    HttpResponse::Ok().body(tera.render(template, context).unwrap_or_else(|e| {
        log::error!("Failed to render template '{template}': {e}");
        String::new()
    }))
}

pub fn alert_level_to_str(level: &Level) -> &'static str {
    match level {
        Level::Error => "danger",
        Level::Warning => "warning",
        Level::Success => "success",
        _ => "info",
    }
}

pub fn base_context(flash_messages: &IncomingFlashMessages, current_page: &str) -> Context {
    let alerts = flash_messages
        .iter()
        .map(|f| (f.content(), alert_level_to_str(&f.level())))
        .collect::<Vec<_>>();

    let mut context = Context::new();
    context.insert("alerts", &alerts);
    context.insert("current_page", current_page);
    context
}

pub fn redirect(location: &str) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, location))
        .finish()
}

/// Registers every page of the application.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(investors::index)
        .service(investors::new_investor)
        .service(investors::edit_investor)
        .service(investors::show_draft)
        .service(investors::set_field)
        .service(investors::toggle_tag)
        .service(investors::remove_tag)
        .service(investors::add_portfolio_company)
        .service(investors::remove_portfolio_company)
        .service(investors::set_portfolio_field)
        .service(investors::set_image_mode)
        .service(investors::set_image_url)
        .service(investors::upload_image)
        .service(investors::submit);
}
