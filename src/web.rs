use actix_web::{web, App, HttpServer, HttpResponse, Result, HttpRequest, middleware};
use actix_files::Files;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Mutex;

use chrono::Utc;

use crate::history::{HistoryStore, store_path};
use crate::roster::RosterMember;
use crate::rotation::{self, HistoryEntry};
use crate::rules;

// In-memory handles to the per-environment stores (each store persists
// itself to its JSON file on every write)
pub struct AppState {
    pub roster: Vec<RosterMember>,
    pub production: Mutex<HistoryStore>,
    pub test: Mutex<HistoryStore>,
    pub admin_password: String,
}

fn store_for<'a>(state: &'a AppState, environment: &str) -> Option<&'a Mutex<HistoryStore>> {
    match environment {
        "production" => Some(&state.production),
        "test" => Some(&state.test),
        _ => None,
    }
}

fn bad_environment(environment: &str) -> HttpResponse {
    HttpResponse::BadRequest().json(serde_json::json!({
        "success": false,
        "error": format!("Unknown environment: {}", environment)
    }))
}

fn default_environment() -> String {
    "production".to_string()
}

#[derive(Deserialize)]
pub struct LoginRequest {
    password: String,
}

#[derive(Deserialize)]
pub struct EnvQuery {
    #[serde(default = "default_environment")]
    environment: String,
    group: Option<String>,
}

#[derive(Deserialize)]
pub struct SelectRequest {
    #[serde(rename = "presentBrothers")]
    present_brothers: Vec<String>,
    #[serde(default = "default_environment")]
    environment: String,
}

#[derive(Deserialize)]
pub struct ConfirmRequest {
    brother: String,
    group: String,
    #[serde(rename = "presentBrothers")]
    present_brothers: Vec<String>,
    #[serde(default = "default_environment")]
    environment: String,
}

#[derive(Deserialize)]
pub struct UpdateEntryRequest {
    #[serde(default = "default_environment")]
    environment: String,
    brother: String,
    date: String,
    group: String,
}

#[derive(Deserialize)]
pub struct RebuildStatsRequest {
    #[serde(default = "default_environment")]
    environment: String,
    group: String,
    targets: BTreeMap<String, u32>,
}

#[derive(Serialize)]
pub struct StatusResponse {
    #[serde(rename = "isFriday")]
    is_friday: bool,
    #[serde(rename = "hasRunToday")]
    has_run_today: bool,
    entries: usize,
}

#[derive(Serialize)]
pub struct HistoryResponse {
    entries: Vec<HistoryEntry>,
    groups: Vec<String>,
}

// Roster endpoint
async fn get_roster(state: web::Data<AppState>) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(&state.roster))
}

// Status endpoint, used by the frontend to gate the submit button
async fn get_status(
    query: web::Query<EnvQuery>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let Some(store) = store_for(&state, &query.environment) else {
        return Ok(bad_environment(&query.environment));
    };
    let store = store.lock().unwrap();
    Ok(HttpResponse::Ok().json(StatusResponse {
        is_friday: rules::is_friday(),
        has_run_today: rules::has_run_today(store.entries()),
        entries: store.entries().len(),
    }))
}

// Selection endpoint: runs the fair-rotation algorithm against the chosen
// environment's history snapshot. Nothing is recorded until /api/confirm.
async fn select_brother(
    req: web::Json<SelectRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let Some(store) = store_for(&state, &req.environment) else {
        return Ok(bad_environment(&req.environment));
    };

    if req.present_brothers.len() < 2 {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "success": false,
            "error": "Select at least two brothers"
        })));
    }

    let store = store.lock().unwrap();
    let test_mode = req.environment == "test";
    if let Err(e) = rules::selection_allowed(test_mode, store.entries()) {
        return Ok(HttpResponse::Conflict().json(serde_json::json!({
            "success": false,
            "error": e
        })));
    }

    match rotation::select(&req.present_brothers, store.entries()) {
        Ok(result) => Ok(HttpResponse::Ok().json(result)),
        Err(e) => Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "success": false,
            "error": e
        }))),
    }
}

// Confirmation endpoint: the timestamp is taken here, at the orchestration
// boundary, never inside the selector
async fn confirm_duty(
    req: web::Json<ConfirmRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let Some(store) = store_for(&state, &req.environment) else {
        return Ok(bad_environment(&req.environment));
    };

    if req.brother.trim().is_empty() || !req.present_brothers.contains(&req.brother) {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "success": false,
            "error": "Chosen brother must be one of the present brothers"
        })));
    }

    let entry = HistoryEntry {
        brother: req.brother.clone(),
        group: req.group.clone(),
        date: Utc::now().to_rfc3339(),
        present_brothers: req.present_brothers.clone(),
    };

    let mut store = store.lock().unwrap();
    match store.append(entry) {
        Ok(()) => Ok(HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "message": format!("{} will do the dishes tonight", req.brother)
        }))),
        Err(e) => Ok(HttpResponse::InternalServerError().json(serde_json::json!({
            "success": false,
            "error": format!("Failed to save: {}", e)
        }))),
    }
}

// History endpoint with optional exact-group filter, most recent first
async fn get_history(
    query: web::Query<EnvQuery>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let Some(store) = store_for(&state, &query.environment) else {
        return Ok(bad_environment(&query.environment));
    };
    let store = store.lock().unwrap();

    let mut entries: Vec<HistoryEntry> = store
        .entries()
        .iter()
        .filter(|e| match &query.group {
            Some(group) => e.group == *group,
            None => true,
        })
        .cloned()
        .collect();
    entries.reverse();

    Ok(HttpResponse::Ok().json(HistoryResponse {
        entries,
        groups: store.groups(),
    }))
}

// Admin login endpoint
async fn admin_login(
    req: web::Json<LoginRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    if req.password == state.admin_password {
        Ok(HttpResponse::Ok().json(serde_json::json!({"success": true})))
    } else {
        Ok(HttpResponse::Unauthorized().json(serde_json::json!({"success": false, "error": "Invalid password"})))
    }
}

fn is_admin(req: &HttpRequest, state: &AppState) -> bool {
    let password = req
        .headers()
        .get("X-Admin-Password")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    password == state.admin_password
}

fn unauthorized() -> HttpResponse {
    HttpResponse::Unauthorized().json(serde_json::json!({"success": false, "error": "Unauthorized"}))
}

// Admin edit endpoint: replaces one entry; the group key is re-normalized so
// hand-typed member lists stay canonical
async fn admin_update_entry(
    http: HttpRequest,
    index: web::Path<usize>,
    req: web::Json<UpdateEntryRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    if !is_admin(&http, &state) {
        return Ok(unauthorized());
    }
    let Some(store) = store_for(&state, &req.environment) else {
        return Ok(bad_environment(&req.environment));
    };

    let members: Vec<String> = req
        .group
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if members.is_empty() {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "success": false,
            "error": "Group must name at least one brother"
        })));
    }
    let group = rotation::normalize(&members);
    let entry = HistoryEntry {
        brother: req.brother.clone(),
        group: group.clone(),
        date: req.date.clone(),
        present_brothers: group.split(',').map(|s| s.to_string()).collect(),
    };

    let mut store = store.lock().unwrap();
    match store.update_entry(*index, entry) {
        Ok(()) => Ok(HttpResponse::Ok().json(serde_json::json!({"success": true}))),
        Err(e) => Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "success": false,
            "error": format!("{}", e)
        }))),
    }
}

// Admin delete endpoint
async fn admin_delete_entry(
    http: HttpRequest,
    index: web::Path<usize>,
    query: web::Query<EnvQuery>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    if !is_admin(&http, &state) {
        return Ok(unauthorized());
    }
    let Some(store) = store_for(&state, &query.environment) else {
        return Ok(bad_environment(&query.environment));
    };

    let mut store = store.lock().unwrap();
    match store.delete_entry(*index) {
        Ok(removed) => Ok(HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "removed": removed
        }))),
        Err(e) => Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "success": false,
            "error": format!("{}", e)
        }))),
    }
}

// Admin stats rebuild: set per-brother turn counts for one group directly
async fn admin_rebuild_stats(
    http: HttpRequest,
    req: web::Json<RebuildStatsRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    if !is_admin(&http, &state) {
        return Ok(unauthorized());
    }
    let Some(store) = store_for(&state, &req.environment) else {
        return Ok(bad_environment(&req.environment));
    };

    let mut store = store.lock().unwrap();
    let now = Utc::now().to_rfc3339();
    match store.rebuild_group_counts(&req.group, &req.targets, &now) {
        Ok(()) => Ok(HttpResponse::Ok().json(serde_json::json!({"success": true}))),
        Err(e) => Ok(HttpResponse::InternalServerError().json(serde_json::json!({
            "success": false,
            "error": format!("{}", e)
        }))),
    }
}

// HTML page handlers
async fn index() -> Result<HttpResponse> {
    let html = include_str!("../templates/index.html");
    Ok(HttpResponse::Ok().content_type("text/html").body(html))
}

async fn admin_page() -> Result<HttpResponse> {
    let html = include_str!("../templates/admin.html");
    Ok(HttpResponse::Ok().content_type("text/html").body(html))
}

pub async fn start_server(
    port: u16,
    admin_password: String,
    data_dir: &Path,
    roster: Vec<RosterMember>,
) -> std::io::Result<()> {
    let app_state = web::Data::new(AppState {
        roster,
        production: Mutex::new(HistoryStore::load(store_path(data_dir, "production"))),
        test: Mutex::new(HistoryStore::load(store_path(data_dir, "test"))),
        admin_password,
    });

    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .wrap(middleware::Logger::default())
            .service(Files::new("/static", "static"))
            .route("/", web::get().to(index))
            .route("/admin", web::get().to(admin_page))
            .route("/api/roster", web::get().to(get_roster))
            .route("/api/status", web::get().to(get_status))
            .route("/api/select", web::post().to(select_brother))
            .route("/api/confirm", web::post().to(confirm_duty))
            .route("/api/history", web::get().to(get_history))
            .route("/api/login", web::post().to(admin_login))
            .route("/api/admin/stats", web::post().to(admin_rebuild_stats))
            .service(
                web::resource("/api/admin/entry/{index}")
                    .route(web::put().to(admin_update_entry))
                    .route(web::delete().to(admin_delete_entry)),
            )
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}
