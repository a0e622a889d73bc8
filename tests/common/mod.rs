//! Helpers for integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use actix_multipart::Multipart;
use actix_web::dev::ServerHandle;
use actix_web::{App, HttpResponse, HttpServer, web};
use futures::StreamExt;
use serde_json::{Value, json};

/// What the fake investor API has received so far.
#[derive(Default)]
pub struct FakeApiState {
    pub investors: Mutex<HashMap<String, Value>>,
    pub created: Mutex<Vec<Value>>,
    pub updated: Mutex<Vec<(String, Value)>>,
    pub uploads: Mutex<Vec<(String, Vec<u8>)>>,
    pub create_error: Mutex<Option<(u16, Value)>>,
    pub reject_uploads: AtomicBool,
}

impl FakeApiState {
    pub fn with_investor(self, id: &str, investor: Value) -> Self {
        self.investors
            .lock()
            .unwrap()
            .insert(id.to_string(), investor);
        self
    }

    pub fn failing_creates(self, status: u16, body: Value) -> Self {
        *self.create_error.lock().unwrap() = Some((status, body));
        self
    }

    pub fn rejecting_uploads(self) -> Self {
        self.reject_uploads.store(true, Ordering::SeqCst);
        self
    }

    pub fn created(&self) -> Vec<Value> {
        self.created.lock().unwrap().clone()
    }

    pub fn updated(&self) -> Vec<(String, Value)> {
        self.updated.lock().unwrap().clone()
    }

    pub fn uploads(&self) -> Vec<(String, Vec<u8>)> {
        self.uploads.lock().unwrap().clone()
    }
}

async fn create_investor(state: web::Data<FakeApiState>, body: web::Json<Value>) -> HttpResponse {
    if let Some((status, error)) = state.create_error.lock().unwrap().clone() {
        let status = actix_web::http::StatusCode::from_u16(status).unwrap();
        return HttpResponse::build(status).json(error);
    }
    state.created.lock().unwrap().push(body.into_inner());
    HttpResponse::Ok().json(json!({ "message": "Investor created" }))
}

async fn get_investor(state: web::Data<FakeApiState>, id: web::Path<String>) -> HttpResponse {
    match state.investors.lock().unwrap().get(id.as_str()) {
        Some(investor) => HttpResponse::Ok().json(json!({ "investor": investor })),
        None => HttpResponse::NotFound().json(json!({ "message": "Investor not found" })),
    }
}

async fn update_investor(
    state: web::Data<FakeApiState>,
    id: web::Path<String>,
    body: web::Json<Value>,
) -> HttpResponse {
    if !state.investors.lock().unwrap().contains_key(id.as_str()) {
        return HttpResponse::NotFound().json(json!({ "message": "Investor not found" }));
    }
    state
        .updated
        .lock()
        .unwrap()
        .push((id.into_inner(), body.into_inner()));
    HttpResponse::Ok().json(json!({ "message": "Investor updated" }))
}

async fn upload_file(
    state: web::Data<FakeApiState>,
    mut payload: Multipart,
) -> actix_web::Result<HttpResponse> {
    let mut uploaded = Vec::new();
    while let Some(field) = payload.next().await {
        let mut field = field?;
        let file_name = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .unwrap_or("unnamed")
            .to_string();
        let mut bytes = Vec::new();
        while let Some(chunk) = field.next().await {
            bytes.extend_from_slice(&chunk?);
        }
        uploaded.push((file_name, bytes));
    }

    if state.reject_uploads.load(Ordering::SeqCst) {
        return Ok(HttpResponse::Ok().json(json!({ "status": false })));
    }

    let urls = uploaded
        .iter()
        .map(|(name, _)| json!({ "url": format!("https://cdn.test/{name}") }))
        .collect::<Vec<_>>();
    state.uploads.lock().unwrap().extend(uploaded);
    Ok(HttpResponse::Ok().json(json!({ "status": true, "data": urls })))
}

/// Investor API stand-in listening on an ephemeral local port.
pub struct FakeApi {
    pub state: web::Data<FakeApiState>,
    pub base_url: String,
    handle: ServerHandle,
}

impl FakeApi {
    pub async fn start(state: FakeApiState) -> Self {
        let state = web::Data::new(state);
        let app_state = state.clone();
        let server = HttpServer::new(move || {
            App::new()
                .app_data(app_state.clone())
                .route("/api/create-investor", web::post().to(create_investor))
                .route("/api/get-investor/{id}", web::get().to(get_investor))
                .route("/api/update-investor/{id}", web::put().to(update_investor))
                .route("/api/fileUpload", web::post().to(upload_file))
        })
        .workers(1)
        .bind(("127.0.0.1", 0))
        .expect("Failed to bind fake API");
        let address = server.addrs()[0];
        let server = server.run();
        let handle = server.handle();
        actix_web::rt::spawn(server);

        FakeApi {
            state,
            base_url: format!("http://{address}"),
            handle,
        }
    }

    pub fn upload_url(&self) -> String {
        format!("{}/api/fileUpload", self.base_url)
    }

    pub async fn stop(self) {
        self.handle.stop(false).await;
    }
}

/// Builds a `multipart/form-data` body with a `slot` text field and a `file`.
pub fn multipart_body(
    boundary: &str,
    slot: &str,
    file_name: &str,
    content_type: &str,
    bytes: &[u8],
) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"slot\"\r\n\r\n{slot}\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    body
}
