use super::common::*;
use crate::tenancy::domain::{ApplicationStatus, CandidateStatus, VacancyStatus};
use crate::tenancy::error::ServiceError;
use crate::tenancy::payloads::{ApplicationUpdate, NewApplication};
use crate::tenancy::store::ApplicationFilter;

fn advance(
    fixture: &Fixture,
    id: crate::tenancy::domain::ApplicationId,
    status: ApplicationStatus,
) -> Result<crate::tenancy::domain::Application, ServiceError> {
    fixture.services.applications.update(
        id,
        ApplicationUpdate {
            status: Some(status),
            notes: None,
        },
    )
}

#[test]
fn applying_moves_candidate_into_process() {
    let fixture = fixture();
    let candidate = fixture.candidate("ada@acme.io");
    let vacancy = fixture.open_vacancy("Backend Engineer");

    let application = fixture.apply(&candidate.candidate, &vacancy);
    assert_eq!(application.status, ApplicationStatus::Pending);

    let loaded = fixture
        .services
        .resources
        .candidate_with_relations(candidate.candidate.id)
        .expect("loaded");
    assert_eq!(loaded.candidate.status, CandidateStatus::InProcess);
}

#[test]
fn duplicate_application_conflicts() {
    let fixture = fixture();
    let candidate = fixture.candidate("ada@acme.io");
    let vacancy = fixture.open_vacancy("Backend Engineer");
    fixture.apply(&candidate.candidate, &vacancy);

    let err = fixture
        .services
        .applications
        .create(NewApplication {
            candidate_id: candidate.candidate.id,
            vacancy_id: vacancy.vacancy.id,
            notes: Some("second try".to_string()),
        })
        .expect_err("duplicate pair");
    assert!(matches!(err, ServiceError::Conflict(_)));
    assert_eq!(
        fixture
            .services
            .applications
            .list(&ApplicationFilter::default())
            .expect("list")
            .len(),
        1
    );
}

#[test]
fn draft_vacancies_do_not_accept_applications() {
    let fixture = fixture();
    let candidate = fixture.candidate("ada@acme.io");
    let mut draft = new_vacancy(fixture.company.id, "Staff Engineer");
    draft.status = Some(VacancyStatus::Draft);
    let vacancy = fixture
        .services
        .resources
        .create_vacancy(draft)
        .expect("draft");

    let err = fixture
        .services
        .applications
        .create(NewApplication {
            candidate_id: candidate.candidate.id,
            vacancy_id: vacancy.vacancy.id,
            notes: None,
        })
        .expect_err("not open");
    assert!(matches!(err, ServiceError::Conflict(_)));
}

#[test]
fn cross_tenant_applications_are_rejected() {
    let fixture = fixture();
    let candidate = fixture.candidate("ada@acme.io");
    let other = fixture
        .services
        .companies
        .create(new_company("Globex", "globex.com", fixture.plan.id))
        .expect("second tenant");
    let vacancy = fixture
        .services
        .resources
        .create_vacancy(new_vacancy(other.id, "Backend Engineer"))
        .expect("vacancy");

    let err = fixture
        .services
        .applications
        .create(NewApplication {
            candidate_id: candidate.candidate.id,
            vacancy_id: vacancy.vacancy.id,
            notes: None,
        })
        .expect_err("different companies");
    assert!(matches!(err, ServiceError::Validation(_)));
}

#[test]
fn accepting_an_offer_hires_the_candidate() {
    let fixture = fixture();
    let candidate = fixture.candidate("ada@acme.io");
    let vacancy = fixture.open_vacancy("Backend Engineer");
    let application = fixture.apply(&candidate.candidate, &vacancy);

    for status in [
        ApplicationStatus::Reviewing,
        ApplicationStatus::Interview,
        ApplicationStatus::Offered,
        ApplicationStatus::Accepted,
    ] {
        advance(&fixture, application.id, status).expect("pipeline step");
    }

    let loaded = fixture
        .services
        .resources
        .candidate_with_relations(candidate.candidate.id)
        .expect("loaded");
    assert_eq!(loaded.candidate.status, CandidateStatus::Hired);

    let err = advance(&fixture, application.id, ApplicationStatus::Rejected)
        .expect_err("accepted is terminal");
    assert!(matches!(err, ServiceError::Validation(_)));
}

#[test]
fn skipping_pipeline_steps_is_rejected() {
    let fixture = fixture();
    let candidate = fixture.candidate("ada@acme.io");
    let vacancy = fixture.open_vacancy("Backend Engineer");
    let application = fixture.apply(&candidate.candidate, &vacancy);

    let err = advance(&fixture, application.id, ApplicationStatus::Offered)
        .expect_err("skips review");
    assert!(matches!(err, ServiceError::Validation(_)));

    let rejected =
        advance(&fixture, application.id, ApplicationStatus::Rejected).expect("rejectable");
    assert_eq!(rejected.status, ApplicationStatus::Rejected);
}

#[test]
fn removing_the_last_application_allows_hard_delete() {
    let fixture = fixture();
    let candidate = fixture.candidate("ada@acme.io");
    let vacancy = fixture.open_vacancy("Backend Engineer");
    let application = fixture.apply(&candidate.candidate, &vacancy);

    fixture
        .services
        .applications
        .remove(application.id)
        .expect("application removed");
    let report = fixture
        .services
        .resources
        .remove_candidate(candidate.candidate.id)
        .expect("candidate removed");
    assert!(!report.is_soft());
}
