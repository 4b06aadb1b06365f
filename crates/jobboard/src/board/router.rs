use std::str::FromStr;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::{get, patch, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use super::domain::{
    Application, ApplicationId, ApplicationStatus, NewUser, Principal, Role, User, UserId,
    Vacancy, VacancyDraft, VacancyId, VacancyPatch,
};
use super::error::BoardError;
use super::repository::JobBoardStore;
use super::service::{JobBoardService, Page, UserStatsView, VacancyQuery};
use super::stats::{
    CandidateStatsView, DashboardView, PopularVacancyView, VacancyApplicationCountView,
    VacancyStatsView, DEFAULT_POPULAR_LIMIT,
};

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";

type Shared<S> = State<Arc<JobBoardService<S>>>;
type Reply<T> = Result<Json<T>, BoardError>;

#[derive(Debug, Deserialize)]
pub struct ApplyRequest {
    pub vacancy_id: VacancyId,
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: ApplicationStatus,
}

#[derive(Debug, Deserialize)]
pub struct RoleChangeRequest {
    pub role: Role,
}

#[derive(Debug, Default, Deserialize)]
pub struct PopularQuery {
    #[serde(default)]
    pub limit: Option<usize>,
}

/// Router builder exposing the job-board operations over HTTP.
///
/// The caller identity comes from `x-user-id` / `x-user-role`, which an upstream gateway
/// sets after authenticating the request.
pub fn board_router<S>(service: Arc<JobBoardService<S>>) -> Router
where
    S: JobBoardStore + 'static,
{
    Router::new()
        .route(
            "/api/v1/applications",
            post(apply_handler::<S>).get(list_applications_handler::<S>),
        )
        .route(
            "/api/v1/applications/:application_id",
            get(get_application_handler::<S>)
                .patch(update_application_handler::<S>)
                .delete(remove_application_handler::<S>),
        )
        .route(
            "/api/v1/vacancies",
            post(create_vacancy_handler::<S>).get(list_vacancies_handler::<S>),
        )
        .route(
            "/api/v1/vacancies/:vacancy_id",
            get(get_vacancy_handler::<S>)
                .patch(update_vacancy_handler::<S>)
                .delete(remove_vacancy_handler::<S>),
        )
        .route(
            "/api/v1/vacancies/:vacancy_id/toggle-active",
            patch(toggle_vacancy_handler::<S>),
        )
        .route(
            "/api/v1/users",
            post(create_user_handler::<S>).get(list_users_handler::<S>),
        )
        .route("/api/v1/users/register", post(register_handler::<S>))
        .route(
            "/api/v1/users/:user_id",
            get(get_user_handler::<S>).delete(remove_user_handler::<S>),
        )
        .route("/api/v1/users/:user_id/role", patch(change_role_handler::<S>))
        .route(
            "/api/v1/stats/vacancies/:vacancy_id",
            get(vacancy_stats_handler::<S>),
        )
        .route(
            "/api/v1/stats/vacancies/:vacancy_id/count",
            get(vacancy_count_handler::<S>),
        )
        .route(
            "/api/v1/stats/candidates/:candidate_id",
            get(candidate_stats_handler::<S>),
        )
        .route("/api/v1/stats/popular", get(popular_handler::<S>))
        .route("/api/v1/stats/dashboard", get(dashboard_handler::<S>))
        .route("/api/v1/stats/users", get(user_stats_handler::<S>))
        .with_state(service)
}

/// Reads the gateway-supplied principal headers.
pub fn principal_from_headers(headers: &HeaderMap) -> Result<Principal, BoardError> {
    let raw_id = headers
        .get(USER_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or(BoardError::Unauthenticated("missing x-user-id header"))?;
    let raw_role = headers
        .get(USER_ROLE_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or(BoardError::Unauthenticated("missing x-user-role header"))?;

    let id = Uuid::from_str(raw_id.trim())
        .map_err(|_| BoardError::Unauthenticated("x-user-id must be a UUID"))?;
    let role = Role::from_str(raw_role)
        .map_err(|_| BoardError::Unauthenticated("x-user-role is not a known role"))?;

    Ok(Principal::new(UserId(id), role))
}

pub(crate) async fn apply_handler<S>(
    State(service): Shared<S>,
    headers: HeaderMap,
    Json(request): Json<ApplyRequest>,
) -> Result<(StatusCode, Json<Application>), BoardError>
where
    S: JobBoardStore + 'static,
{
    let principal = principal_from_headers(&headers)?;
    let application = service.apply(&principal, &request.vacancy_id)?;
    Ok((StatusCode::CREATED, Json(application)))
}

pub(crate) async fn list_applications_handler<S>(
    State(service): Shared<S>,
    headers: HeaderMap,
) -> Reply<Vec<Application>>
where
    S: JobBoardStore + 'static,
{
    let principal = principal_from_headers(&headers)?;
    Ok(Json(service.list_applications(&principal)?))
}

pub(crate) async fn get_application_handler<S>(
    State(service): Shared<S>,
    headers: HeaderMap,
    Path(application_id): Path<ApplicationId>,
) -> Reply<Application>
where
    S: JobBoardStore + 'static,
{
    let principal = principal_from_headers(&headers)?;
    Ok(Json(service.get_application(&principal, &application_id)?))
}

pub(crate) async fn update_application_handler<S>(
    State(service): Shared<S>,
    headers: HeaderMap,
    Path(application_id): Path<ApplicationId>,
    Json(request): Json<StatusUpdateRequest>,
) -> Reply<Application>
where
    S: JobBoardStore + 'static,
{
    let principal = principal_from_headers(&headers)?;
    Ok(Json(service.update_application_status(
        &principal,
        &application_id,
        request.status,
    )?))
}

pub(crate) async fn remove_application_handler<S>(
    State(service): Shared<S>,
    headers: HeaderMap,
    Path(application_id): Path<ApplicationId>,
) -> Reply<Value>
where
    S: JobBoardStore + 'static,
{
    let principal = principal_from_headers(&headers)?;
    service.remove_application(&principal, &application_id)?;
    Ok(Json(json!({ "message": "application deleted" })))
}

pub(crate) async fn create_vacancy_handler<S>(
    State(service): Shared<S>,
    headers: HeaderMap,
    Json(draft): Json<VacancyDraft>,
) -> Result<(StatusCode, Json<Vacancy>), BoardError>
where
    S: JobBoardStore + 'static,
{
    let principal = principal_from_headers(&headers)?;
    let vacancy = service.create_vacancy(&principal, draft)?;
    Ok((StatusCode::CREATED, Json(vacancy)))
}

pub(crate) async fn list_vacancies_handler<S>(
    State(service): Shared<S>,
    Query(query): Query<VacancyQuery>,
) -> Reply<Page<Vacancy>>
where
    S: JobBoardStore + 'static,
{
    Ok(Json(service.list_vacancies(&query)?))
}

pub(crate) async fn get_vacancy_handler<S>(
    State(service): Shared<S>,
    Path(vacancy_id): Path<VacancyId>,
) -> Reply<Vacancy>
where
    S: JobBoardStore + 'static,
{
    Ok(Json(service.get_vacancy(&vacancy_id)?))
}

pub(crate) async fn update_vacancy_handler<S>(
    State(service): Shared<S>,
    headers: HeaderMap,
    Path(vacancy_id): Path<VacancyId>,
    Json(patch): Json<VacancyPatch>,
) -> Reply<Vacancy>
where
    S: JobBoardStore + 'static,
{
    let principal = principal_from_headers(&headers)?;
    Ok(Json(service.update_vacancy(&principal, &vacancy_id, patch)?))
}

pub(crate) async fn toggle_vacancy_handler<S>(
    State(service): Shared<S>,
    headers: HeaderMap,
    Path(vacancy_id): Path<VacancyId>,
) -> Reply<Vacancy>
where
    S: JobBoardStore + 'static,
{
    let principal = principal_from_headers(&headers)?;
    Ok(Json(service.toggle_vacancy_active(&principal, &vacancy_id)?))
}

pub(crate) async fn remove_vacancy_handler<S>(
    State(service): Shared<S>,
    headers: HeaderMap,
    Path(vacancy_id): Path<VacancyId>,
) -> Reply<Value>
where
    S: JobBoardStore + 'static,
{
    let principal = principal_from_headers(&headers)?;
    service.remove_vacancy(&principal, &vacancy_id)?;
    Ok(Json(json!({ "message": "vacancy deleted" })))
}

pub(crate) async fn register_handler<S>(
    State(service): Shared<S>,
    Json(new_user): Json<NewUser>,
) -> Result<(StatusCode, Json<User>), BoardError>
where
    S: JobBoardStore + 'static,
{
    let user = service.register(new_user)?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub(crate) async fn create_user_handler<S>(
    State(service): Shared<S>,
    headers: HeaderMap,
    Json(new_user): Json<NewUser>,
) -> Result<(StatusCode, Json<User>), BoardError>
where
    S: JobBoardStore + 'static,
{
    let principal = principal_from_headers(&headers)?;
    let user = service.create_user(&principal, new_user)?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub(crate) async fn list_users_handler<S>(
    State(service): Shared<S>,
    headers: HeaderMap,
) -> Reply<Vec<User>>
where
    S: JobBoardStore + 'static,
{
    let principal = principal_from_headers(&headers)?;
    Ok(Json(service.list_users(&principal)?))
}

pub(crate) async fn get_user_handler<S>(
    State(service): Shared<S>,
    headers: HeaderMap,
    Path(user_id): Path<UserId>,
) -> Reply<User>
where
    S: JobBoardStore + 'static,
{
    let principal = principal_from_headers(&headers)?;
    Ok(Json(service.get_user(&principal, &user_id)?))
}

pub(crate) async fn change_role_handler<S>(
    State(service): Shared<S>,
    headers: HeaderMap,
    Path(user_id): Path<UserId>,
    Json(request): Json<RoleChangeRequest>,
) -> Reply<User>
where
    S: JobBoardStore + 'static,
{
    let principal = principal_from_headers(&headers)?;
    Ok(Json(service.change_role(&principal, &user_id, request.role)?))
}

pub(crate) async fn remove_user_handler<S>(
    State(service): Shared<S>,
    headers: HeaderMap,
    Path(user_id): Path<UserId>,
) -> Reply<Value>
where
    S: JobBoardStore + 'static,
{
    let principal = principal_from_headers(&headers)?;
    service.remove_user(&principal, &user_id)?;
    Ok(Json(json!({ "message": "user deleted" })))
}

pub(crate) async fn vacancy_stats_handler<S>(
    State(service): Shared<S>,
    headers: HeaderMap,
    Path(vacancy_id): Path<VacancyId>,
) -> Reply<VacancyStatsView>
where
    S: JobBoardStore + 'static,
{
    let principal = principal_from_headers(&headers)?;
    Ok(Json(service.vacancy_stats(&principal, &vacancy_id)?))
}

pub(crate) async fn vacancy_count_handler<S>(
    State(service): Shared<S>,
    headers: HeaderMap,
    Path(vacancy_id): Path<VacancyId>,
) -> Reply<VacancyApplicationCountView>
where
    S: JobBoardStore + 'static,
{
    let principal = principal_from_headers(&headers)?;
    Ok(Json(service.vacancy_application_count(&principal, &vacancy_id)?))
}

pub(crate) async fn candidate_stats_handler<S>(
    State(service): Shared<S>,
    headers: HeaderMap,
    Path(candidate_id): Path<UserId>,
) -> Reply<CandidateStatsView>
where
    S: JobBoardStore + 'static,
{
    let principal = principal_from_headers(&headers)?;
    Ok(Json(service.candidate_stats(&principal, &candidate_id)?))
}

pub(crate) async fn popular_handler<S>(
    State(service): Shared<S>,
    headers: HeaderMap,
    Query(query): Query<PopularQuery>,
) -> Reply<Vec<PopularVacancyView>>
where
    S: JobBoardStore + 'static,
{
    let principal = principal_from_headers(&headers)?;
    let limit = query.limit.unwrap_or(DEFAULT_POPULAR_LIMIT);
    Ok(Json(service.popular_vacancies(&principal, limit)?))
}

pub(crate) async fn dashboard_handler<S>(
    State(service): Shared<S>,
    headers: HeaderMap,
) -> Reply<DashboardView>
where
    S: JobBoardStore + 'static,
{
    let principal = principal_from_headers(&headers)?;
    Ok(Json(service.dashboard(&principal)?))
}

pub(crate) async fn user_stats_handler<S>(
    State(service): Shared<S>,
    headers: HeaderMap,
) -> Reply<UserStatsView>
where
    S: JobBoardStore + 'static,
{
    let principal = principal_from_headers(&headers)?;
    Ok(Json(service.user_stats(&principal)?))
}
