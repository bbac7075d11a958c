use std::str::FromStr;
use std::sync::Arc;

use talent_desk::tenancy::payloads::{ApplicationUpdate, NewCandidate, NewVacancy, NewUser};
use talent_desk::tenancy::{
    ApplicationId, ApplicationStatus, CandidateId, CandidateStatus, CompanyId, CompanyStatus,
    MemoryStore, PlanId, RemovalOutcome, ResourceKind, ResourceRef, ServiceError, TenancyServices,
    UserRole, VacancyId, VacancyStatus,
};

const ACME: &str = "10000000-0000-4000-8000-000000000001";
const GLOBEX: &str = "10000000-0000-4000-8000-000000000002";
const GROWTH_PLAN: &str = "00000000-0000-4000-8000-000000000002";
const ADA: &str = "40000000-0000-4000-8000-000000000001";
const LINUS: &str = "40000000-0000-4000-8000-000000000002";
const BACKEND_ENGINEER: &str = "50000000-0000-4000-8000-000000000001";
const RISK_ANALYST: &str = "50000000-0000-4000-8000-000000000003";
const ADA_APPLICATION: &str = "60000000-0000-4000-8000-000000000001";

fn seeded() -> TenancyServices<MemoryStore> {
    let data = include_bytes!("../fixtures/tenant_snapshot.json");
    let store = MemoryStore::from_json_reader(&data[..]).expect("fixture snapshot loads");
    TenancyServices::new(Arc::new(store))
}

fn id<T: FromStr>(raw: &str) -> T
where
    T::Err: std::fmt::Debug,
{
    raw.parse().expect("fixture id parses")
}

fn vacancy_for(company_id: CompanyId, title: &str) -> NewVacancy {
    NewVacancy {
        company_id,
        title: title.to_string(),
        description: format!("{title} role"),
        location: None,
        status: Some(VacancyStatus::Open),
        skill_ids: Vec::new(),
    }
}

#[test]
fn free_plan_vacancy_quota_blocks_until_a_slot_is_freed() {
    let services = seeded();
    let globex: CompanyId = id(GLOBEX);

    services
        .resources
        .create_vacancy(vacancy_for(globex, "Compliance Officer"))
        .expect("second vacancy fits the free plan");

    match services
        .resources
        .create_vacancy(vacancy_for(globex, "Auditor"))
    {
        Err(ServiceError::QuotaExceeded {
            plan,
            resource,
            limit,
            message,
        }) => {
            assert_eq!(plan, "Free");
            assert_eq!(resource, ResourceKind::Vacancies);
            assert_eq!(limit, 2);
            assert!(message.contains("Free"), "message names the plan: {message}");
        }
        other => panic!("expected quota denial, got {other:?}"),
    }

    let report = services
        .resources
        .remove(ResourceRef::Vacancy(id::<VacancyId>(RISK_ANALYST)))
        .expect("vacancy without applications is removable");
    assert_eq!(report.outcome, RemovalOutcome::HardDeleted);

    services
        .resources
        .create_vacancy(vacancy_for(globex, "Auditor"))
        .expect("hard delete released the slot");
}

#[test]
fn soft_deleted_candidate_keeps_history_and_counts_against_quota() {
    let services = seeded();
    let acme: CompanyId = id(ACME);
    let before = services.companies.usage(acme).expect("usage");

    let report = services
        .resources
        .remove(ResourceRef::Candidate(id::<CandidateId>(ADA)))
        .expect("candidate removal");
    assert!(report.is_soft());
    assert!(report.message().contains("INACTIVE"));

    let ada = services
        .resources
        .candidate_with_relations(id(ADA))
        .expect("soft-deleted candidate is still readable");
    assert_eq!(ada.candidate.status, CandidateStatus::Inactive);
    assert_eq!(ada.applications.len(), 1);
    assert_eq!(ada.skills.len(), 2);

    let after = services.companies.usage(acme).expect("usage");
    let used = |usage: &talent_desk::tenancy::QuotaUsage| {
        usage
            .entries
            .iter()
            .find(|entry| entry.resource == ResourceKind::Candidates)
            .map(|entry| entry.used)
            .expect("candidate entry")
    };
    assert_eq!(used(&before), used(&after));
}

#[test]
fn accepting_an_application_hires_the_candidate() {
    let services = seeded();
    let application_id: ApplicationId = id(ADA_APPLICATION);

    for status in [ApplicationStatus::Offered, ApplicationStatus::Accepted] {
        services
            .applications
            .update(
                application_id,
                ApplicationUpdate {
                    status: Some(status),
                    notes: None,
                },
            )
            .expect("forward transition");
    }

    let ada = services
        .resources
        .candidate_with_relations(id(ADA))
        .expect("candidate");
    assert_eq!(ada.candidate.status, CandidateStatus::Hired);

    let reopened = services.applications.update(
        application_id,
        ApplicationUpdate {
            status: Some(ApplicationStatus::Pending),
            notes: None,
        },
    );
    assert!(matches!(reopened, Err(ServiceError::Validation(_))));
}

#[test]
fn closing_a_vacancy_with_applicants_preserves_them() {
    let services = seeded();
    let report = services
        .resources
        .remove_vacancy(id(BACKEND_ENGINEER))
        .expect("vacancy removal");

    match &report.outcome {
        RemovalOutcome::SoftDeleted {
            status, dependents, ..
        } => {
            assert_eq!(*status, "CLOSED");
            assert_eq!(*dependents, 2);
        }
        other => panic!("expected soft delete, got {other:?}"),
    }

    let vacancy = services
        .resources
        .vacancy_with_relations(id(BACKEND_ENGINEER))
        .expect("vacancy kept");
    assert_eq!(vacancy.vacancy.status, VacancyStatus::Closed);
    assert_eq!(vacancy.applications.len(), 2);

    let linus = services
        .resources
        .candidate_with_relations(id(LINUS))
        .expect("candidate");
    assert_eq!(linus.applications.len(), 1);
}

#[test]
fn company_and_plan_removal_respect_owned_records() {
    let services = seeded();

    let plan_removal = services.plans.remove(id::<PlanId>(GROWTH_PLAN));
    match plan_removal {
        Err(ServiceError::Conflict(message)) => {
            assert!(message.contains("deactivate"), "{message}")
        }
        other => panic!("expected conflict, got {other:?}"),
    }

    let report = services
        .companies
        .remove(id(ACME))
        .expect("company removal");
    assert!(report.is_soft());
    let acme = services.companies.get(id(ACME)).expect("company kept");
    assert_eq!(acme.status, CompanyStatus::Inactive);
}

#[test]
fn users_without_company_skip_the_quota_check() {
    let services = seeded();
    let globex: CompanyId = id(GLOBEX);
    let user = |email: &str, company_id: Option<CompanyId>| NewUser {
        name: "Operator".to_string(),
        email: email.to_string(),
        password: "correct-horse-battery".to_string(),
        role: UserRole::Manager,
        company_id,
    };

    services
        .resources
        .create_user(user("one@globex.com", Some(globex)))
        .expect("first user");
    services
        .resources
        .create_user(user("two@globex.com", Some(globex)))
        .expect("second user");
    assert!(matches!(
        services
            .resources
            .create_user(user("three@globex.com", Some(globex))),
        Err(ServiceError::QuotaExceeded { .. })
    ));

    let platform = services
        .resources
        .create_user(user("ops@talent.desk", None))
        .expect("platform user");
    assert!(platform.company_id.is_none());
}

#[test]
fn candidate_email_is_unique_across_companies() {
    let services = seeded();
    let duplicate = services.resources.create_candidate(NewCandidate {
        company_id: id(GLOBEX),
        name: "Ada Again".to_string(),
        email: "ADA@example.com".to_string(),
        phone: None,
        state: None,
        skill_ids: Vec::new(),
        experience: Vec::new(),
        education: Vec::new(),
    });
    assert!(matches!(duplicate, Err(ServiceError::Conflict(_))));
}
