use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request};
use axum::response::Response;
use axum::Router;
use rust_decimal::Decimal;
use serde_json::Value;

use crate::tenancy::access::ACTOR_ROLE_HEADER;
use crate::tenancy::domain::{
    Application, Candidate, CandidateWithRelations, Company, CompanyId, Plan, PlanId, PlanType,
    Skill, UserRole, VacancyStatus, VacancyWithRelations,
};
use crate::tenancy::memory::MemoryStore;
use crate::tenancy::payloads::{
    NewApplication, NewCandidate, NewCompany, NewPlan, NewSkill, NewUser, NewVacancy,
};
use crate::tenancy::router::{tenancy_router, TenancyServices};

pub(super) struct Fixture {
    pub store: Arc<MemoryStore>,
    pub services: Arc<TenancyServices<MemoryStore>>,
    pub plan: Plan,
    pub company: Company,
}

impl Fixture {
    pub(super) fn router(&self) -> Router {
        tenancy_router(Arc::clone(&self.services))
    }

    pub(super) fn candidate(&self, email: &str) -> CandidateWithRelations {
        self.services
            .resources
            .create_candidate(new_candidate(self.company.id, email))
            .expect("candidate created")
    }

    pub(super) fn open_vacancy(&self, title: &str) -> VacancyWithRelations {
        self.services
            .resources
            .create_vacancy(new_vacancy(self.company.id, title))
            .expect("vacancy created")
    }

    pub(super) fn skill(&self, name: &str) -> Skill {
        self.services
            .skills
            .create(NewSkill {
                name: name.to_string(),
                category: Some("engineering".to_string()),
            })
            .expect("skill created")
    }

    pub(super) fn apply(&self, candidate: &Candidate, vacancy: &VacancyWithRelations) -> Application {
        self.services
            .applications
            .create(NewApplication {
                candidate_id: candidate.id,
                vacancy_id: vacancy.vacancy.id,
                notes: None,
            })
            .expect("application created")
    }
}

/// Tenant "Acme" on a BASIC plan allowing 2 users, 2 candidates, and 3 vacancies.
pub(super) fn fixture() -> Fixture {
    fixture_with_limits(2, 2, 3)
}

pub(super) fn fixture_with_limits(users: u32, candidates: u32, vacancies: u32) -> Fixture {
    let store = Arc::new(MemoryStore::new());
    let services = Arc::new(TenancyServices::new(Arc::clone(&store)));
    let plan = services
        .plans
        .create(new_plan("Starter", PlanType::Basic, users, candidates, vacancies))
        .expect("plan created");
    let company = services
        .companies
        .create(new_company("Acme", "acme.io", plan.id))
        .expect("company created");

    Fixture {
        store,
        services,
        plan,
        company,
    }
}

pub(super) fn new_plan(
    name: &str,
    plan_type: PlanType,
    users: u32,
    candidates: u32,
    vacancies: u32,
) -> NewPlan {
    NewPlan {
        name: name.to_string(),
        plan_type,
        max_users: users,
        max_candidates: candidates,
        max_vacancies: vacancies,
        price: Decimal::new(4990, 2),
        is_active: true,
    }
}

pub(super) fn new_company(name: &str, domain: &str, plan_id: PlanId) -> NewCompany {
    NewCompany {
        name: name.to_string(),
        domain: domain.to_string(),
        sector: Some("Technology".to_string()),
        status: None,
        plan_id,
    }
}

pub(super) fn new_candidate(company_id: CompanyId, email: &str) -> NewCandidate {
    NewCandidate {
        company_id,
        name: "Ada Lovelace".to_string(),
        email: email.to_string(),
        phone: None,
        state: Some("SP".to_string()),
        skill_ids: Vec::new(),
        experience: Vec::new(),
        education: Vec::new(),
    }
}

pub(super) fn new_vacancy(company_id: CompanyId, title: &str) -> NewVacancy {
    NewVacancy {
        company_id,
        title: title.to_string(),
        description: "Build and operate the hiring platform".to_string(),
        location: Some("Remote".to_string()),
        status: Some(VacancyStatus::Open),
        skill_ids: Vec::new(),
    }
}

pub(super) fn new_user(company_id: Option<CompanyId>, email: &str) -> NewUser {
    NewUser {
        name: "Grace Hopper".to_string(),
        email: email.to_string(),
        password: "correct-horse-battery".to_string(),
        role: UserRole::Recruiter,
        company_id,
    }
}

pub(super) fn request(method: Method, uri: &str, role: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(ACTOR_ROLE_HEADER, role);
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body).expect("serialize body")))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
