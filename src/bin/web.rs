//! Single binary web server: JSON API over the tournament registry.
//! Run with: cargo run --bin web
//! Listens on 0.0.0.0:8080 by default. Override with env: HOST, PORT.
//! DATA_DIR enables JSON file persistence; IDENTITY_API_KEY enables captain verification.

use actix_web::{
    delete, get, post, put,
    web::{Data, Json, Path, Query},
    App, HttpResponse, HttpServer, Responder,
};
use bracket_cup::config::AppConfig;
use bracket_cup::{
    Captain, HttpIdentityVerifier, IdentityError, IdentityVerifier, JsonFileStore, MatchId,
    MemoryStore, Outcome, StateStore, TournamentError, TournamentId, TournamentRegistry,
    TournamentStatus,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Shared services handed to every handler.
struct AppState {
    registry: TournamentRegistry,
    verifier: Box<dyn IdentityVerifier>,
}

type State = Data<AppState>;

#[derive(Serialize)]
struct HealthResponse {
    ok: bool,
    service: &'static str,
}

#[derive(Deserialize)]
struct CreateTournamentBody {
    name: String,
    #[serde(default = "default_capacity")]
    capacity: usize,
}

fn default_capacity() -> usize {
    8
}

#[derive(Deserialize)]
struct RegisterTeamBody {
    name: String,
    captain_id: String,
    captain_name: String,
    /// Captain's in-game `name#tag`, verified before registering.
    riot_id: String,
}

#[derive(Deserialize)]
struct ReportResultBody {
    home_score: u32,
    away_score: u32,
}

#[derive(Deserialize)]
struct StatusQuery {
    status: Option<String>,
}

/// Path segment: owning group (e.g. /api/groups/{group}/tournaments)
#[derive(Deserialize)]
struct GroupPath {
    group: String,
}

/// Path segment: tournament id (e.g. /api/tournaments/{id})
#[derive(Deserialize)]
struct TournamentPath {
    id: TournamentId,
}

/// Path segments: tournament id and match id
#[derive(Deserialize)]
struct TournamentMatchPath {
    id: TournamentId,
    match_id: MatchId,
}

/// Map a domain error to a status code with `{ "error": message }`.
fn error_response(e: &TournamentError) -> HttpResponse {
    let body = serde_json::json!({ "error": e.to_string() });
    match e {
        TournamentError::TournamentNotFound(_)
        | TournamentError::MatchNotFound(_)
        | TournamentError::TeamNotFound(_) => HttpResponse::NotFound().json(body),
        TournamentError::InvalidState { .. }
        | TournamentError::CapacityExceeded { .. }
        | TournamentError::DuplicateTournamentName(_)
        | TournamentError::DuplicateTeamName(_)
        | TournamentError::IncompleteRoster { .. }
        | TournamentError::MatchAlreadyCompleted(_)
        | TournamentError::UnassignedMatch(_) => HttpResponse::Conflict().json(body),
        TournamentError::Identity(IdentityError::Malformed | IdentityError::NotFound(_)) => {
            HttpResponse::BadRequest().json(body)
        }
        TournamentError::Identity(_) => HttpResponse::BadGateway().json(body),
        TournamentError::Storage(_) => HttpResponse::ServiceUnavailable().json(body),
        TournamentError::InvalidCapacity(_)
        | TournamentError::InvalidName
        | TournamentError::InvalidScore(_) => HttpResponse::BadRequest().json(body),
    }
}

fn respond<T: Serialize>(result: Result<T, TournamentError>) -> HttpResponse {
    match result {
        Ok(value) => HttpResponse::Ok().json(value),
        Err(e) => error_response(&e),
    }
}

fn respond_outcome<T: Serialize>(result: Result<Outcome<T>, TournamentError>) -> HttpResponse {
    match result {
        Ok(outcome) => HttpResponse::Ok().json(outcome),
        Err(e) => error_response(&e),
    }
}

#[get("/api/health")]
async fn api_health() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        ok: true,
        service: "bracket-cup",
    })
}

/// Create a tournament in Draft for a group.
#[post("/api/groups/{group}/tournaments")]
async fn api_create_tournament(
    state: State,
    path: Path<GroupPath>,
    body: Json<CreateTournamentBody>,
) -> HttpResponse {
    respond_outcome(
        state
            .registry
            .create_tournament(&path.group, &body.name, body.capacity)
            .await,
    )
}

/// List a group's tournaments, optionally filtered by `?status=`.
#[get("/api/groups/{group}/tournaments")]
async fn api_list_tournaments(
    state: State,
    path: Path<GroupPath>,
    query: Query<StatusQuery>,
) -> HttpResponse {
    match query.status.as_deref() {
        None => respond(state.registry.list_by_group(&path.group).await),
        Some(raw) => match raw.parse::<TournamentStatus>() {
            Ok(status) => respond(state.registry.list_by_status(&path.group, status).await),
            Err(()) => HttpResponse::BadRequest()
                .json(serde_json::json!({ "error": format!("Unknown status {raw}") })),
        },
    }
}

#[get("/api/tournaments/{id}")]
async fn api_get_tournament(state: State, path: Path<TournamentPath>) -> HttpResponse {
    respond(state.registry.get(path.id).await)
}

#[delete("/api/tournaments/{id}")]
async fn api_delete_tournament(state: State, path: Path<TournamentPath>) -> HttpResponse {
    respond_outcome(state.registry.delete_tournament(path.id).await)
}

/// Open registration (Draft -> Registration).
#[post("/api/tournaments/{id}/registration")]
async fn api_start_registration(state: State, path: Path<TournamentPath>) -> HttpResponse {
    respond_outcome(state.registry.start_registration(path.id).await)
}

/// Check the tournament can take a team, verify the captain's account, then register the team.
#[post("/api/tournaments/{id}/teams")]
async fn api_register_team(
    state: State,
    path: Path<TournamentPath>,
    body: Json<RegisterTeamBody>,
) -> HttpResponse {
    if let Err(e) = state.registry.ensure_accepting_teams(path.id).await {
        return error_response(&e);
    }
    let account = match state.verifier.verify(&body.riot_id).await {
        Ok(account) => account,
        Err(e) => return error_response(&TournamentError::from(e)),
    };
    log::info!(
        "Verified {} as {} ({})",
        body.captain_name,
        account.riot_id(),
        account.region
    );
    let captain =
        Captain::new(body.captain_id.as_str(), body.captain_name.as_str()).with_account(account);
    respond_outcome(
        state
            .registry
            .register_team(path.id, &body.name, captain)
            .await,
    )
}

/// Start the tournament (Registration -> Active, bracket generated).
#[post("/api/tournaments/{id}/start")]
async fn api_start_tournament(state: State, path: Path<TournamentPath>) -> HttpResponse {
    respond_outcome(state.registry.start_tournament(path.id).await)
}

/// Report a final score for one match.
#[put("/api/tournaments/{id}/matches/{match_id}/result")]
async fn api_report_result(
    state: State,
    path: Path<TournamentMatchPath>,
    body: Json<ReportResultBody>,
) -> HttpResponse {
    respond_outcome(
        state
            .registry
            .report_match_result(path.id, path.match_id, body.home_score, body.away_score)
            .await,
    )
}

#[get("/api/tournaments/{id}/progress")]
async fn api_progress(state: State, path: Path<TournamentPath>) -> HttpResponse {
    respond(state.registry.assess(path.id).await)
}

/// Matches of the stage currently being played.
#[get("/api/tournaments/{id}/matches/current")]
async fn api_current_matches(state: State, path: Path<TournamentPath>) -> HttpResponse {
    respond(state.registry.current_stage_matches(path.id).await)
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = AppConfig::from_env()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()))?;

    let store: Arc<dyn StateStore> = match &config.data_dir {
        Some(dir) => {
            log::info!("Persisting tournaments under {}", dir.display());
            Arc::new(JsonFileStore::new(dir))
        }
        None => {
            log::warn!("DATA_DIR not set, tournaments are kept in memory only");
            Arc::new(MemoryStore::new())
        }
    };
    if config.identity.api_key.is_none() {
        log::warn!("IDENTITY_API_KEY not set, team registration will be refused");
    }

    let registry = TournamentRegistry::new(store);
    if let Err(e) = registry.initialize().await {
        log::error!("Could not load stored tournaments: {}", e);
    }
    let state = Data::new(AppState {
        registry,
        verifier: Box::new(HttpIdentityVerifier::new(config.identity.clone())),
    });

    let bind = (config.host.clone(), config.port);
    log::info!("Starting server at http://{}:{}", bind.0, bind.1);

    let app_state = state.clone();
    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .service(api_health)
            .service(api_create_tournament)
            .service(api_list_tournaments)
            .service(api_get_tournament)
            .service(api_delete_tournament)
            .service(api_start_registration)
            .service(api_register_team)
            .service(api_start_tournament)
            .service(api_report_result)
            .service(api_progress)
            .service(api_current_matches)
    })
    .bind(bind)?
    .run()
    .await?;

    for (group, persistence) in state.registry.shutdown().await {
        if !persistence.is_saved() {
            log::error!("Final save of group {} failed: {:?}", group, persistence);
        }
    }
    Ok(())
}
