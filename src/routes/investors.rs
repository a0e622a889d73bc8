use actix_multipart::form::MultipartForm;
use actix_web::{HttpResponse, Responder, get, post, web};
use actix_web_flash_messages::{FlashMessage, IncomingFlashMessages};
use tera::Tera;

use crate::client::http::HttpInvestorApi;
use crate::drafts::{DraftId, DraftStore};
use crate::forms::edits::{
    EditFormError, EntryFieldForm, ImageModeForm, ImageUrlForm, SetFieldForm, TagForm,
};
use crate::forms::investors::FormKind;
use crate::forms::uploads::UploadImageForm;
use crate::models::config::ServerConfig;
use crate::routes::{base_context, redirect, render_template};
use crate::services::ServiceError;
use crate::services::investors::{
    DraftEdit, edit_draft as edit_draft_service, open_create_form as open_create_form_service,
    open_update_form as open_update_form_service, show_form as show_form_service,
};
use crate::services::submission::{
    CREATED_MESSAGE, SubmitOutcome, UPDATED_MESSAGE, submit_draft as submit_draft_service,
};
use crate::services::uploads::upload_image as upload_image_service;

fn draft_url(draft_id: DraftId) -> String {
    format!("/drafts/{draft_id}")
}

fn form_not_found() -> HttpResponse {
    HttpResponse::NotFound().body("Form not found")
}

fn apply_edit(
    draft_id: &str,
    edit: Result<DraftEdit, EditFormError>,
    store: &DraftStore,
    server_config: &ServerConfig,
) -> HttpResponse {
    let Some(draft_id) = DraftId::parse(draft_id) else {
        return form_not_found();
    };

    let edit = match edit {
        Ok(edit) => edit,
        Err(err) => {
            log::warn!("Invalid edit posted for draft {draft_id}: {err}");
            FlashMessage::error(err.to_string()).send();
            return redirect(&draft_url(draft_id));
        }
    };

    match edit_draft_service(draft_id, edit, store, &server_config.vocabulary) {
        Ok(()) => redirect(&draft_url(draft_id)),
        Err(ServiceError::NotFound) => form_not_found(),
        Err(ServiceError::Form(message)) => {
            FlashMessage::error(message).send();
            redirect(&draft_url(draft_id))
        }
        Err(err) => {
            log::error!("Failed to edit draft {draft_id}: {err}");
            HttpResponse::InternalServerError().finish()
        }
    }
}

#[get("/")]
pub async fn index() -> impl Responder {
    redirect("/investors/new")
}

#[get("/investors/new")]
pub async fn new_investor(store: web::Data<DraftStore>) -> impl Responder {
    match open_create_form_service(store.get_ref()) {
        Ok(draft_id) => redirect(&draft_url(draft_id)),
        Err(err) => {
            log::error!("Failed to open create form: {err}");
            HttpResponse::InternalServerError().finish()
        }
    }
}

#[get("/investors/{investor_id}/edit")]
pub async fn edit_investor(
    investor_id: web::Path<String>,
    store: web::Data<DraftStore>,
    api: web::Data<HttpInvestorApi>,
) -> impl Responder {
    match open_update_form_service(&investor_id, store.get_ref(), api.get_ref()).await {
        Ok(draft_id) => redirect(&draft_url(draft_id)),
        Err(ServiceError::NotFound) => HttpResponse::NotFound().body("Investor not found"),
        Err(err) => {
            log::error!("Failed to open update form: {err}");
            HttpResponse::InternalServerError().finish()
        }
    }
}

#[get("/drafts/{draft_id}")]
pub async fn show_draft(
    draft_id: web::Path<String>,
    flash_messages: IncomingFlashMessages,
    store: web::Data<DraftStore>,
    server_config: web::Data<ServerConfig>,
    tera: web::Data<Tera>,
) -> impl Responder {
    let Some(draft_id) = DraftId::parse(&draft_id) else {
        return form_not_found();
    };

    let session = match show_form_service(draft_id, store.get_ref()) {
        Ok(session) => session,
        Err(ServiceError::NotFound) => return form_not_found(),
        Err(err) => {
            log::error!("Failed to load draft {draft_id}: {err}");
            return HttpResponse::InternalServerError().finish();
        }
    };

    let (current_page, investor_id) = match &session.kind {
        FormKind::Create => ("create", None),
        FormKind::Update(investor_id) => ("update", Some(investor_id.as_str())),
    };

    let mut context = base_context(&flash_messages, current_page);
    context.insert("draft_id", &draft_id);
    context.insert("investor_id", &investor_id);
    context.insert("draft", &session.draft);
    context.insert("message", &session.message);
    context.insert("submission", session.submission.as_str());
    context.insert("uploading", &session.draft.has_pending_uploads());
    context.insert("vocabulary", &server_config.vocabulary);
    context.insert("listing_url", &server_config.listing_url);

    render_template(&tera, "investors/form.html", &context)
}

#[post("/drafts/{draft_id}/field")]
pub async fn set_field(
    draft_id: web::Path<String>,
    store: web::Data<DraftStore>,
    server_config: web::Data<ServerConfig>,
    web::Form(form): web::Form<SetFieldForm>,
) -> impl Responder {
    apply_edit(&draft_id, form.try_into(), &store, &server_config)
}

#[post("/drafts/{draft_id}/tags/toggle")]
pub async fn toggle_tag(
    draft_id: web::Path<String>,
    store: web::Data<DraftStore>,
    server_config: web::Data<ServerConfig>,
    web::Form(form): web::Form<TagForm>,
) -> impl Responder {
    apply_edit(&draft_id, form.into_toggle(), &store, &server_config)
}

#[post("/drafts/{draft_id}/tags/remove")]
pub async fn remove_tag(
    draft_id: web::Path<String>,
    store: web::Data<DraftStore>,
    server_config: web::Data<ServerConfig>,
    web::Form(form): web::Form<TagForm>,
) -> impl Responder {
    apply_edit(&draft_id, form.into_remove(), &store, &server_config)
}

#[post("/drafts/{draft_id}/portfolio")]
pub async fn add_portfolio_company(
    draft_id: web::Path<String>,
    store: web::Data<DraftStore>,
    server_config: web::Data<ServerConfig>,
) -> impl Responder {
    apply_edit(&draft_id, Ok(DraftEdit::AddEntry), &store, &server_config)
}

#[post("/drafts/{draft_id}/portfolio/{index}/remove")]
pub async fn remove_portfolio_company(
    path: web::Path<(String, usize)>,
    store: web::Data<DraftStore>,
    server_config: web::Data<ServerConfig>,
) -> impl Responder {
    let (draft_id, entry_index) = path.into_inner();
    apply_edit(
        &draft_id,
        Ok(DraftEdit::RemoveEntry(entry_index)),
        &store,
        &server_config,
    )
}

#[post("/drafts/{draft_id}/portfolio/{index}/field")]
pub async fn set_portfolio_field(
    path: web::Path<(String, usize)>,
    store: web::Data<DraftStore>,
    server_config: web::Data<ServerConfig>,
    web::Form(form): web::Form<EntryFieldForm>,
) -> impl Responder {
    let (draft_id, entry_index) = path.into_inner();
    apply_edit(&draft_id, form.into_edit(entry_index), &store, &server_config)
}

#[post("/drafts/{draft_id}/image/mode")]
pub async fn set_image_mode(
    draft_id: web::Path<String>,
    store: web::Data<DraftStore>,
    server_config: web::Data<ServerConfig>,
    web::Form(form): web::Form<ImageModeForm>,
) -> impl Responder {
    apply_edit(&draft_id, form.try_into(), &store, &server_config)
}

#[post("/drafts/{draft_id}/image/url")]
pub async fn set_image_url(
    draft_id: web::Path<String>,
    store: web::Data<DraftStore>,
    server_config: web::Data<ServerConfig>,
    web::Form(form): web::Form<ImageUrlForm>,
) -> impl Responder {
    apply_edit(&draft_id, form.try_into(), &store, &server_config)
}

#[post("/drafts/{draft_id}/image/upload")]
pub async fn upload_image(
    draft_id: web::Path<String>,
    store: web::Data<DraftStore>,
    api: web::Data<HttpInvestorApi>,
    MultipartForm(mut form): MultipartForm<UploadImageForm>,
) -> impl Responder {
    let Some(draft_id) = DraftId::parse(&draft_id) else {
        return form_not_found();
    };

    let (slot, file) = match form.parse() {
        Ok(parsed) => parsed,
        Err(err) => {
            log::warn!("Rejected image upload for draft {draft_id}: {err}");
            FlashMessage::error(err.to_string()).send();
            return redirect(&draft_url(draft_id));
        }
    };

    match upload_image_service(draft_id, slot, file, store.get_ref(), api.get_ref()).await {
        // Upload outcomes are recorded as the form's message.
        Ok(_) | Err(ServiceError::Upload(_)) => redirect(&draft_url(draft_id)),
        Err(ServiceError::NotFound) => form_not_found(),
        Err(ServiceError::Form(message)) => {
            FlashMessage::error(message).send();
            redirect(&draft_url(draft_id))
        }
        Err(err) => {
            log::error!("Failed to upload image for draft {draft_id}: {err}");
            HttpResponse::InternalServerError().finish()
        }
    }
}

#[post("/drafts/{draft_id}/submit")]
pub async fn submit(
    draft_id: web::Path<String>,
    store: web::Data<DraftStore>,
    api: web::Data<HttpInvestorApi>,
    server_config: web::Data<ServerConfig>,
) -> impl Responder {
    let Some(draft_id) = DraftId::parse(&draft_id) else {
        return form_not_found();
    };

    match submit_draft_service(draft_id, store.get_ref(), api.get_ref()).await {
        Ok(SubmitOutcome::Created) => {
            FlashMessage::success(CREATED_MESSAGE).send();
            redirect(&server_config.listing_url)
        }
        Ok(SubmitOutcome::Updated) => {
            FlashMessage::success(UPDATED_MESSAGE).send();
            redirect(&server_config.listing_url)
        }
        Err(ServiceError::NotFound) => form_not_found(),
        Err(err @ (ServiceError::SubmissionInFlight | ServiceError::UploadInProgress)) => {
            FlashMessage::error(err.to_string()).send();
            redirect(&draft_url(draft_id))
        }
        Err(ServiceError::Internal) => HttpResponse::InternalServerError().finish(),
        // Validation and request failures are recorded as the form's message.
        Err(_) => redirect(&draft_url(draft_id)),
    }
}

