use axum::{
    Form, Json, Router,
    extract::{Path as AxumPath, Query, State},
    http::{StatusCode, Uri},
    response::{Html, Redirect},
    routing::{delete, get, patch, post},
};
use axum_extra::extract::cookie::CookieJar;
use chrono::Utc;
use log::info;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::net::TcpListener;
use uuid::Uuid;

use crate::board::{Board, NewQuickLink, NewQuickTask, QuickLink, QuickTask, QuickTaskPatch};
use crate::config::Config;
use crate::context::SpaceContext;
use crate::error::AppError;
use crate::events::{EventPatch, EventView, NewEvent};
use crate::projects::{NewProject, Project, ProjectPatch};
use crate::space::{Identity, SpaceLabel, resolve_space};
use crate::storage::{CookieStore, KeyValueStore};
use crate::theme::{Theme, load_theme, save_theme, space_color};

pub struct AppState {
    board: Mutex<Board>,
}

impl AppState {
    pub fn new(board: Board) -> Self {
        AppState {
            board: Mutex::new(board),
        }
    }

    fn board(&self) -> Result<MutexGuard<'_, Board>, AppError> {
        self.board
            .lock()
            .map_err(|_| AppError::Internal("Board lock poisoned".to_string()))
    }
}

/// Navigation path the client is currently on
#[derive(Deserialize)]
struct PathQuery {
    #[serde(default = "root_path")]
    path: String,
}

fn root_path() -> String {
    "/".to_string()
}

#[derive(Deserialize)]
struct CodeForm {
    #[serde(default)]
    code: String,
}

#[derive(Deserialize)]
struct SignOutForm {
    #[serde(default = "root_path")]
    path: String,
}

#[derive(Deserialize)]
struct VerifyRequest {
    path: String,
    code: String,
}

#[derive(Deserialize)]
struct ClearRequest {
    path: String,
}

#[derive(Serialize)]
struct SpaceResponse {
    identity: Option<Identity>,
    label: SpaceLabel,
    color: &'static str,
    verified: bool,
    theme: Theme,
}

#[derive(Serialize)]
struct VerifyResponse {
    verified: bool,
}

#[derive(Serialize)]
struct ThemeResponse {
    theme: Theme,
}

#[derive(Serialize)]
struct SpaceData {
    tasks: Vec<QuickTask>,
    links: Vec<QuickLink>,
    events: Vec<EventView>,
    projects: Vec<Project>,
}

/// Build the application router
///
/// # Arguments
/// * `state` - Shared application state holding the quick board
///
/// # Returns
/// * `Router` - Pages, the verification form and the JSON API
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(serve_space))
        .route("/hackathons", get(serve_space))
        .route("/projects", get(serve_space))
        .route("/macha", get(serve_space))
        .route("/veerendra", get(serve_space))
        .route("/verify/:identity", post(handle_verify))
        .route("/signout", post(handle_sign_out))
        .route("/api/space", get(get_space))
        .route("/api/verify", post(api_verify))
        .route("/api/clear", post(api_clear))
        .route("/api/theme/toggle", post(toggle_theme))
        .route("/api/tasks", get(list_tasks).post(create_task))
        .route("/api/tasks/:id", patch(update_task).delete(delete_task))
        .route("/api/links", get(list_links).post(create_link))
        .route("/api/links/:id", delete(delete_link))
        .route("/api/events", get(list_events).post(create_event))
        .route(
            "/api/events/:id",
            get(get_event).patch(update_event).delete(delete_event),
        )
        .route("/api/projects", get(list_projects).post(create_project))
        .route(
            "/api/projects/:id",
            get(get_project).patch(update_project).delete(delete_project),
        )
        .with_state(state)
}

/// Start the web server
pub async fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let board = Board::open(&config.data_dir)?;
    let app = router(Arc::new(AppState::new(board)));

    let listener = TcpListener::bind(config.addr).await?;
    info!("Listening on http://{}", config.addr);
    axum::serve(listener, app).await?;

    Ok(())
}

/// Whose board a request on `path` may read and write
///
/// A personal path stays locked until verified. Unscoped pages show the
/// shared board while the remembered identity is unverified.
fn board_space<S: KeyValueStore>(
    context: &SpaceContext<S>,
    path: &str,
) -> Result<SpaceLabel, AppError> {
    if context.is_verified() {
        return Ok(context.label());
    }
    if resolve_space(path, None).identity.is_some() {
        return Err(AppError::Locked);
    }
    Ok(SpaceLabel::Both)
}

fn unlocked_space(jar: CookieJar, path: &str) -> Result<SpaceLabel, AppError> {
    let context = SpaceContext::new(path, CookieStore::new(jar));
    board_space(&context, path)
}

/// JSON for inline `<script>` injection
fn script_json<T: Serialize>(value: &T) -> Result<String, AppError> {
    serde_json::to_string(value)
        .map(|json| json.replace('<', "\\u003c"))
        .map_err(|e| AppError::Internal(e.to_string()))
}

/// Serve the dashboard or a personal space
///
/// A locked `/macha` or `/veerendra` gets the security-code form instead of
/// its content. The dashboard pages are never gated.
async fn serve_space(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    uri: Uri,
) -> Result<Html<String>, AppError> {
    let path = uri.path();
    let context = SpaceContext::new(path, CookieStore::new(jar));
    let theme = load_theme(context.store());

    let named = resolve_space(path, None).identity;
    if let (Some(identity), false) = (named, context.is_verified()) {
        let page = include_str!("./static/verify.html")
            .replace("{{theme}}", theme.as_str())
            .replace("{{label}}", identity.label().as_str())
            .replace("{{identity}}", identity.as_str());
        return Ok(Html(page));
    }

    let label = board_space(&context, path)?;
    let color = space_color(label.identity(), theme);
    let data = {
        let board = state.board()?;
        let now = Utc::now();
        SpaceData {
            tasks: board.tasks(label),
            links: board.links(label),
            events: board
                .events(label)
                .into_iter()
                .map(|event| event.view(now))
                .collect(),
            projects: board.projects(label),
        }
    };

    let page = include_str!("./static/space.html")
        .replace("{{theme}}", theme.as_str())
        .replace("{{label}}", label.as_str())
        .replace("{{color}}", color)
        .replace("{{path}}", &attribute_safe_path(path))
        .replace(
            "</head>",
            &format!(
                "    <script>const SPACE_DATA = {};</script>\n</head>",
                script_json(&data)?
            ),
        );

    Ok(Html(page))
}

// Only route characters may land in the hidden form field.
fn attribute_safe_path(path: &str) -> String {
    path.chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '/' | '-' | '_'))
        .collect()
}

/// Handle the security-code form for a personal space
///
/// # Returns
/// * `Result<(CookieJar, Redirect), AppError>` - Verification cookies and a
///   redirect to the space, or 400/401 with the message to show
async fn handle_verify(
    jar: CookieJar,
    AxumPath(identity): AxumPath<String>,
    Form(form): Form<CodeForm>,
) -> Result<(CookieJar, Redirect), AppError> {
    let identity = Identity::parse(&identity).ok_or(AppError::NotFound)?;
    if form.code.trim().is_empty() {
        return Err(AppError::MissingCode);
    }

    let path = format!("/{identity}");
    let mut context = SpaceContext::new(&path, CookieStore::new(jar));
    if !context.check_code(&form.code) {
        return Err(AppError::InvalidCode);
    }

    Ok((context.into_store().into_jar(), Redirect::to(&path)))
}

async fn handle_sign_out(jar: CookieJar, Form(form): Form<SignOutForm>) -> (CookieJar, Redirect) {
    let mut context = SpaceContext::new(&form.path, CookieStore::new(jar));
    context.clear();
    (context.into_store().into_jar(), Redirect::to("/"))
}

async fn get_space(jar: CookieJar, Query(query): Query<PathQuery>) -> Json<SpaceResponse> {
    let context = SpaceContext::new(&query.path, CookieStore::new(jar));
    let theme = load_theme(context.store());

    Json(SpaceResponse {
        identity: context.identity(),
        label: context.label(),
        color: context.accent_color(),
        verified: context.is_verified(),
        theme,
    })
}

async fn api_verify(
    jar: CookieJar,
    Json(request): Json<VerifyRequest>,
) -> (CookieJar, Json<VerifyResponse>) {
    let mut context = SpaceContext::new(&request.path, CookieStore::new(jar));
    let verified = context.check_code(&request.code);
    (context.into_store().into_jar(), Json(VerifyResponse { verified }))
}

async fn api_clear(
    jar: CookieJar,
    Json(request): Json<ClearRequest>,
) -> (CookieJar, Json<VerifyResponse>) {
    let mut context = SpaceContext::new(&request.path, CookieStore::new(jar));
    context.clear();
    let verified = context.is_verified();
    (context.into_store().into_jar(), Json(VerifyResponse { verified }))
}

async fn toggle_theme(jar: CookieJar) -> (CookieJar, Json<ThemeResponse>) {
    let mut store = CookieStore::new(jar);
    let theme = load_theme(&store).toggle();
    save_theme(&mut store, theme);
    (store.into_jar(), Json(ThemeResponse { theme }))
}

async fn list_tasks(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(query): Query<PathQuery>,
) -> Result<Json<Vec<QuickTask>>, AppError> {
    let label = unlocked_space(jar, &query.path)?;
    Ok(Json(state.board()?.tasks(label)))
}

async fn create_task(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(query): Query<PathQuery>,
    Json(new): Json<NewQuickTask>,
) -> Result<(StatusCode, Json<QuickTask>), AppError> {
    let label = unlocked_space(jar, &query.path)?;
    let task = state.board()?.create_task(label, new)?;
    Ok((StatusCode::CREATED, Json(task)))
}

async fn update_task(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    AxumPath(id): AxumPath<Uuid>,
    Query(query): Query<PathQuery>,
    Json(patch): Json<QuickTaskPatch>,
) -> Result<Json<QuickTask>, AppError> {
    let label = unlocked_space(jar, &query.path)?;
    let task = state.board()?.update_task(label, id, patch)?;
    Ok(Json(task))
}

async fn delete_task(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    AxumPath(id): AxumPath<Uuid>,
    Query(query): Query<PathQuery>,
) -> Result<StatusCode, AppError> {
    let label = unlocked_space(jar, &query.path)?;
    state.board()?.delete_task(label, id)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_links(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(query): Query<PathQuery>,
) -> Result<Json<Vec<QuickLink>>, AppError> {
    let label = unlocked_space(jar, &query.path)?;
    Ok(Json(state.board()?.links(label)))
}

async fn create_link(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(query): Query<PathQuery>,
    Json(new): Json<NewQuickLink>,
) -> Result<(StatusCode, Json<QuickLink>), AppError> {
    let label = unlocked_space(jar, &query.path)?;
    let link = state.board()?.create_link(label, new)?;
    Ok((StatusCode::CREATED, Json(link)))
}

async fn delete_link(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    AxumPath(id): AxumPath<Uuid>,
    Query(query): Query<PathQuery>,
) -> Result<StatusCode, AppError> {
    let label = unlocked_space(jar, &query.path)?;
    state.board()?.delete_link(label, id)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_events(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(query): Query<PathQuery>,
) -> Result<Json<Vec<EventView>>, AppError> {
    let label = unlocked_space(jar, &query.path)?;
    let now = Utc::now();
    let events = state.board()?.events(label);
    Ok(Json(events.into_iter().map(|event| event.view(now)).collect()))
}

async fn get_event(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    AxumPath(id): AxumPath<Uuid>,
    Query(query): Query<PathQuery>,
) -> Result<Json<EventView>, AppError> {
    let label = unlocked_space(jar, &query.path)?;
    let event = state.board()?.event(label, id)?;
    Ok(Json(event.view(Utc::now())))
}

async fn create_event(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(query): Query<PathQuery>,
    Json(new): Json<NewEvent>,
) -> Result<(StatusCode, Json<EventView>), AppError> {
    let label = unlocked_space(jar, &query.path)?;
    let event = state.board()?.create_event(label, new)?;
    Ok((StatusCode::CREATED, Json(event.view(Utc::now()))))
}

async fn update_event(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    AxumPath(id): AxumPath<Uuid>,
    Query(query): Query<PathQuery>,
    Json(patch): Json<EventPatch>,
) -> Result<Json<EventView>, AppError> {
    let label = unlocked_space(jar, &query.path)?;
    let event = state.board()?.update_event(label, id, patch)?;
    Ok(Json(event.view(Utc::now())))
}

async fn delete_event(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    AxumPath(id): AxumPath<Uuid>,
    Query(query): Query<PathQuery>,
) -> Result<StatusCode, AppError> {
    let label = unlocked_space(jar, &query.path)?;
    state.board()?.delete_event(label, id)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_projects(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(query): Query<PathQuery>,
) -> Result<Json<Vec<Project>>, AppError> {
    let label = unlocked_space(jar, &query.path)?;
    Ok(Json(state.board()?.projects(label)))
}

async fn get_project(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    AxumPath(id): AxumPath<Uuid>,
    Query(query): Query<PathQuery>,
) -> Result<Json<Project>, AppError> {
    let label = unlocked_space(jar, &query.path)?;
    Ok(Json(state.board()?.project(label, id)?))
}

async fn create_project(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(query): Query<PathQuery>,
    Json(new): Json<NewProject>,
) -> Result<(StatusCode, Json<Project>), AppError> {
    let label = unlocked_space(jar, &query.path)?;
    let project = state.board()?.create_project(label, new)?;
    Ok((StatusCode::CREATED, Json(project)))
}

async fn update_project(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    AxumPath(id): AxumPath<Uuid>,
    Query(query): Query<PathQuery>,
    Json(patch): Json<ProjectPatch>,
) -> Result<Json<Project>, AppError> {
    let label = unlocked_space(jar, &query.path)?;
    Ok(Json(state.board()?.update_project(label, id, patch)?))
}

async fn delete_project(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    AxumPath(id): AxumPath<Uuid>,
    Query(query): Query<PathQuery>,
) -> Result<StatusCode, AppError> {
    let label = unlocked_space(jar, &query.path)?;
    state.board()?.delete_project(label, id)?;
    Ok(StatusCode::NO_CONTENT)
}
