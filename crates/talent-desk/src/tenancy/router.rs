use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, put},
    Json, Router,
};
use serde_json::json;

use super::access::{Actor, Permission};
use super::applications::ApplicationService;
use super::companies::CompanyService;
use super::domain::{ApplicationId, CandidateId, CompanyId, PlanId, SkillId, UserId, VacancyId};
use super::error::ServiceError;
use super::extract::{parse_id, ApiJson, ApiQuery};
use super::lifecycle::{RemovalReport, ResourceLifecycleManager};
use super::payloads::{
    ApplicationUpdate, CandidateUpdate, CompanyUpdate, NewApplication, NewCandidate, NewCompany,
    NewPlan, NewSkill, NewUser, NewVacancy, PlanUpdate, SkillAssignment, UserUpdate,
    VacancyUpdate,
};
use super::plans::PlanService;
use super::skills::SkillCatalog;
use super::store::{
    ApplicationFilter, CandidateFilter, CompanyFilter, TenantStore, UserFilter, VacancyFilter,
};

/// Every tenancy service, built over one shared store handle.
pub struct TenancyServices<S> {
    pub plans: PlanService<S>,
    pub companies: CompanyService<S>,
    pub resources: ResourceLifecycleManager<S>,
    pub applications: ApplicationService<S>,
    pub skills: SkillCatalog<S>,
}

impl<S> TenancyServices<S>
where
    S: TenantStore + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self {
            plans: PlanService::new(Arc::clone(&store)),
            companies: CompanyService::new(Arc::clone(&store)),
            resources: ResourceLifecycleManager::new(Arc::clone(&store)),
            applications: ApplicationService::new(Arc::clone(&store)),
            skills: SkillCatalog::new(store),
        }
    }
}

type Services<S> = State<Arc<TenancyServices<S>>>;
type ApiResult = Result<Response, ServiceError>;

fn ok<T: serde::Serialize>(value: T) -> ApiResult {
    Ok((StatusCode::OK, Json(value)).into_response())
}

fn created<T: serde::Serialize>(value: T) -> ApiResult {
    Ok((StatusCode::CREATED, Json(value)).into_response())
}

/// Runs service work that hashes passwords on the blocking pool.
async fn blocking<T, F>(work: F) -> Result<T, ServiceError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, ServiceError> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|err| ServiceError::Task(err.to_string()))?
}

fn removed(report: RemovalReport) -> ApiResult {
    ok(json!({ "message": report.message() }))
}

/// Router builder exposing the CRUD surface for every tenant resource.
pub fn tenancy_router<S>(services: Arc<TenancyServices<S>>) -> Router
where
    S: TenantStore + 'static,
{
    Router::new()
        .route("/api/v1/plans", get(list_plans::<S>).post(create_plan::<S>))
        .route(
            "/api/v1/plans/:id",
            get(get_plan::<S>)
                .patch(update_plan::<S>)
                .delete(remove_plan::<S>),
        )
        .route(
            "/api/v1/companies",
            get(list_companies::<S>).post(create_company::<S>),
        )
        .route(
            "/api/v1/companies/:id",
            get(get_company::<S>)
                .patch(update_company::<S>)
                .delete(remove_company::<S>),
        )
        .route("/api/v1/companies/:id/usage", get(company_usage::<S>))
        .route("/api/v1/users", get(list_users::<S>).post(create_user::<S>))
        .route(
            "/api/v1/users/:id",
            get(get_user::<S>)
                .patch(update_user::<S>)
                .delete(remove_user::<S>),
        )
        .route(
            "/api/v1/candidates",
            get(list_candidates::<S>).post(create_candidate::<S>),
        )
        .route(
            "/api/v1/candidates/:id",
            get(get_candidate::<S>)
                .patch(update_candidate::<S>)
                .delete(remove_candidate::<S>),
        )
        .route(
            "/api/v1/candidates/:id/skills",
            put(replace_candidate_skills::<S>),
        )
        .route(
            "/api/v1/vacancies",
            get(list_vacancies::<S>).post(create_vacancy::<S>),
        )
        .route(
            "/api/v1/vacancies/:id",
            get(get_vacancy::<S>)
                .patch(update_vacancy::<S>)
                .delete(remove_vacancy::<S>),
        )
        .route(
            "/api/v1/vacancies/:id/skills",
            put(replace_vacancy_skills::<S>),
        )
        .route(
            "/api/v1/applications",
            get(list_applications::<S>).post(create_application::<S>),
        )
        .route(
            "/api/v1/applications/:id",
            get(get_application::<S>)
                .patch(update_application::<S>)
                .delete(remove_application::<S>),
        )
        .route("/api/v1/skills", get(list_skills::<S>).post(create_skill::<S>))
        .route("/api/v1/skills/:id", get(get_skill::<S>))
        .with_state(services)
}

async fn list_plans<S: TenantStore + 'static>(
    State(services): Services<S>,
    actor: Actor,
) -> ApiResult {
    actor.require(Permission::Read)?;
    ok(services.plans.list()?)
}

async fn create_plan<S: TenantStore + 'static>(
    State(services): Services<S>,
    actor: Actor,
    ApiJson(payload): ApiJson<NewPlan>,
) -> ApiResult {
    actor.require(Permission::ManagePlans)?;
    created(services.plans.create(payload)?)
}

async fn get_plan<S: TenantStore + 'static>(
    State(services): Services<S>,
    actor: Actor,
    Path(id): Path<String>,
) -> ApiResult {
    actor.require(Permission::Read)?;
    ok(services.plans.get(parse_id::<PlanId>("plan", &id)?)?)
}

async fn update_plan<S: TenantStore + 'static>(
    State(services): Services<S>,
    actor: Actor,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<PlanUpdate>,
) -> ApiResult {
    actor.require(Permission::ManagePlans)?;
    ok(services
        .plans
        .update(parse_id::<PlanId>("plan", &id)?, payload)?)
}

async fn remove_plan<S: TenantStore + 'static>(
    State(services): Services<S>,
    actor: Actor,
    Path(id): Path<String>,
) -> ApiResult {
    actor.require(Permission::ManagePlans)?;
    removed(services.plans.remove(parse_id::<PlanId>("plan", &id)?)?)
}

async fn list_companies<S: TenantStore + 'static>(
    State(services): Services<S>,
    actor: Actor,
    ApiQuery(filter): ApiQuery<CompanyFilter>,
) -> ApiResult {
    actor.require(Permission::Read)?;
    ok(services.companies.list(&filter)?)
}

async fn create_company<S: TenantStore + 'static>(
    State(services): Services<S>,
    actor: Actor,
    ApiJson(payload): ApiJson<NewCompany>,
) -> ApiResult {
    actor.require(Permission::ManageCompanies)?;
    created(services.companies.create(payload)?)
}

async fn get_company<S: TenantStore + 'static>(
    State(services): Services<S>,
    actor: Actor,
    Path(id): Path<String>,
) -> ApiResult {
    actor.require(Permission::Read)?;
    ok(services
        .companies
        .get(parse_id::<CompanyId>("company", &id)?)?)
}

async fn company_usage<S: TenantStore + 'static>(
    State(services): Services<S>,
    actor: Actor,
    Path(id): Path<String>,
) -> ApiResult {
    actor.require(Permission::Read)?;
    ok(services
        .companies
        .usage(parse_id::<CompanyId>("company", &id)?)?)
}

async fn update_company<S: TenantStore + 'static>(
    State(services): Services<S>,
    actor: Actor,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<CompanyUpdate>,
) -> ApiResult {
    actor.require(Permission::ManageCompanies)?;
    ok(services
        .companies
        .update(parse_id::<CompanyId>("company", &id)?, payload)?)
}

async fn remove_company<S: TenantStore + 'static>(
    State(services): Services<S>,
    actor: Actor,
    Path(id): Path<String>,
) -> ApiResult {
    actor.require(Permission::ManageCompanies)?;
    removed(
        services
            .companies
            .remove(parse_id::<CompanyId>("company", &id)?)?,
    )
}

async fn list_users<S: TenantStore + 'static>(
    State(services): Services<S>,
    actor: Actor,
    ApiQuery(filter): ApiQuery<UserFilter>,
) -> ApiResult {
    actor.require(Permission::Read)?;
    ok(services.resources.users(&filter)?)
}

async fn create_user<S: TenantStore + 'static>(
    State(services): Services<S>,
    actor: Actor,
    ApiJson(payload): ApiJson<NewUser>,
) -> ApiResult {
    actor.require(Permission::ManageUsers)?;
    created(blocking(move || services.resources.create_user(payload)).await?)
}

async fn get_user<S: TenantStore + 'static>(
    State(services): Services<S>,
    actor: Actor,
    Path(id): Path<String>,
) -> ApiResult {
    actor.require(Permission::Read)?;
    ok(services.resources.user(parse_id::<UserId>("user", &id)?)?)
}

async fn update_user<S: TenantStore + 'static>(
    State(services): Services<S>,
    actor: Actor,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<UserUpdate>,
) -> ApiResult {
    actor.require(Permission::ManageUsers)?;
    let id = parse_id::<UserId>("user", &id)?;
    ok(blocking(move || services.resources.update_user(id, payload)).await?)
}

async fn remove_user<S: TenantStore + 'static>(
    State(services): Services<S>,
    actor: Actor,
    Path(id): Path<String>,
) -> ApiResult {
    actor.require(Permission::ManageUsers)?;
    removed(
        services
            .resources
            .remove_user(parse_id::<UserId>("user", &id)?)?,
    )
}

async fn list_candidates<S: TenantStore + 'static>(
    State(services): Services<S>,
    actor: Actor,
    ApiQuery(filter): ApiQuery<CandidateFilter>,
) -> ApiResult {
    actor.require(Permission::Read)?;
    ok(services.resources.candidates(&filter)?)
}

async fn create_candidate<S: TenantStore + 'static>(
    State(services): Services<S>,
    actor: Actor,
    ApiJson(payload): ApiJson<NewCandidate>,
) -> ApiResult {
    actor.require(Permission::ManageTalent)?;
    created(services.resources.create_candidate(payload)?)
}

async fn get_candidate<S: TenantStore + 'static>(
    State(services): Services<S>,
    actor: Actor,
    Path(id): Path<String>,
) -> ApiResult {
    actor.require(Permission::Read)?;
    ok(services
        .resources
        .candidate_with_relations(parse_id::<CandidateId>("candidate", &id)?)?)
}

async fn update_candidate<S: TenantStore + 'static>(
    State(services): Services<S>,
    actor: Actor,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<CandidateUpdate>,
) -> ApiResult {
    actor.require(Permission::ManageTalent)?;
    ok(services
        .resources
        .update_candidate(parse_id::<CandidateId>("candidate", &id)?, payload)?)
}

async fn replace_candidate_skills<S: TenantStore + 'static>(
    State(services): Services<S>,
    actor: Actor,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<SkillAssignment>,
) -> ApiResult {
    actor.require(Permission::ManageTalent)?;
    ok(services
        .resources
        .update_candidate_skills(parse_id::<CandidateId>("candidate", &id)?, payload)?)
}

async fn remove_candidate<S: TenantStore + 'static>(
    State(services): Services<S>,
    actor: Actor,
    Path(id): Path<String>,
) -> ApiResult {
    actor.require(Permission::ManageTalent)?;
    removed(
        services
            .resources
            .remove_candidate(parse_id::<CandidateId>("candidate", &id)?)?,
    )
}

async fn list_vacancies<S: TenantStore + 'static>(
    State(services): Services<S>,
    actor: Actor,
    ApiQuery(filter): ApiQuery<VacancyFilter>,
) -> ApiResult {
    actor.require(Permission::Read)?;
    ok(services.resources.vacancies(&filter)?)
}

async fn create_vacancy<S: TenantStore + 'static>(
    State(services): Services<S>,
    actor: Actor,
    ApiJson(payload): ApiJson<NewVacancy>,
) -> ApiResult {
    actor.require(Permission::ManageTalent)?;
    created(services.resources.create_vacancy(payload)?)
}

async fn get_vacancy<S: TenantStore + 'static>(
    State(services): Services<S>,
    actor: Actor,
    Path(id): Path<String>,
) -> ApiResult {
    actor.require(Permission::Read)?;
    ok(services
        .resources
        .vacancy_with_relations(parse_id::<VacancyId>("vacancy", &id)?)?)
}

async fn update_vacancy<S: TenantStore + 'static>(
    State(services): Services<S>,
    actor: Actor,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<VacancyUpdate>,
) -> ApiResult {
    actor.require(Permission::ManageTalent)?;
    ok(services
        .resources
        .update_vacancy(parse_id::<VacancyId>("vacancy", &id)?, payload)?)
}

async fn replace_vacancy_skills<S: TenantStore + 'static>(
    State(services): Services<S>,
    actor: Actor,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<SkillAssignment>,
) -> ApiResult {
    actor.require(Permission::ManageTalent)?;
    ok(services
        .resources
        .update_vacancy_skills(parse_id::<VacancyId>("vacancy", &id)?, payload)?)
}

async fn remove_vacancy<S: TenantStore + 'static>(
    State(services): Services<S>,
    actor: Actor,
    Path(id): Path<String>,
) -> ApiResult {
    actor.require(Permission::ManageTalent)?;
    removed(
        services
            .resources
            .remove_vacancy(parse_id::<VacancyId>("vacancy", &id)?)?,
    )
}

async fn list_applications<S: TenantStore + 'static>(
    State(services): Services<S>,
    actor: Actor,
    ApiQuery(filter): ApiQuery<ApplicationFilter>,
) -> ApiResult {
    actor.require(Permission::Read)?;
    ok(services.applications.list(&filter)?)
}

async fn create_application<S: TenantStore + 'static>(
    State(services): Services<S>,
    actor: Actor,
    ApiJson(payload): ApiJson<NewApplication>,
) -> ApiResult {
    actor.require(Permission::ManageTalent)?;
    created(services.applications.create(payload)?)
}

async fn get_application<S: TenantStore + 'static>(
    State(services): Services<S>,
    actor: Actor,
    Path(id): Path<String>,
) -> ApiResult {
    actor.require(Permission::Read)?;
    ok(services
        .applications
        .get(parse_id::<ApplicationId>("application", &id)?)?)
}

async fn update_application<S: TenantStore + 'static>(
    State(services): Services<S>,
    actor: Actor,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<ApplicationUpdate>,
) -> ApiResult {
    actor.require(Permission::ManageTalent)?;
    ok(services
        .applications
        .update(parse_id::<ApplicationId>("application", &id)?, payload)?)
}

async fn remove_application<S: TenantStore + 'static>(
    State(services): Services<S>,
    actor: Actor,
    Path(id): Path<String>,
) -> ApiResult {
    actor.require(Permission::ManageTalent)?;
    removed(
        services
            .applications
            .remove(parse_id::<ApplicationId>("application", &id)?)?,
    )
}

async fn list_skills<S: TenantStore + 'static>(
    State(services): Services<S>,
    actor: Actor,
) -> ApiResult {
    actor.require(Permission::Read)?;
    ok(services.skills.list()?)
}

async fn create_skill<S: TenantStore + 'static>(
    State(services): Services<S>,
    actor: Actor,
    ApiJson(payload): ApiJson<NewSkill>,
) -> ApiResult {
    actor.require(Permission::ManageTalent)?;
    created(services.skills.create(payload)?)
}

async fn get_skill<S: TenantStore + 'static>(
    State(services): Services<S>,
    actor: Actor,
    Path(id): Path<String>,
) -> ApiResult {
    actor.require(Permission::Read)?;
    ok(services.skills.get(parse_id::<SkillId>("skill", &id)?)?)
}
