use std::sync::Arc;
use std::thread;

use super::common::*;
use crate::tenancy::domain::{CompanyId, ResourceKind};
use crate::tenancy::error::ServiceError;
use crate::tenancy::quota::{check_quota, QuotaDecision};
use crate::tenancy::store::{CandidateFilter, TenantStore};

#[test]
fn third_candidate_is_denied_with_plan_name_and_limit() {
    let fixture = fixture();
    fixture.candidate("first@acme.io");
    fixture.candidate("second@acme.io");

    let err = fixture
        .services
        .resources
        .create_candidate(new_candidate(fixture.company.id, "third@acme.io"))
        .expect_err("quota reached");

    match &err {
        ServiceError::QuotaExceeded {
            plan,
            resource,
            limit,
            ..
        } => {
            assert_eq!(plan, "Starter");
            assert_eq!(*resource, ResourceKind::Candidates);
            assert_eq!(*limit, 2);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    let message = err.to_string();
    assert!(message.contains("Starter"), "{message}");
    assert!(message.contains('2'), "{message}");

    let stored = fixture
        .services
        .resources
        .candidates(&CandidateFilter::default())
        .expect("list");
    assert_eq!(stored.len(), 2);
}

#[test]
fn hard_deleting_a_candidate_frees_quota() {
    let fixture = fixture();
    let first = fixture.candidate("first@acme.io");
    fixture.candidate("second@acme.io");

    let report = fixture
        .services
        .resources
        .remove_candidate(first.candidate.id)
        .expect("removed");
    assert!(!report.is_soft());

    fixture
        .services
        .resources
        .create_candidate(new_candidate(fixture.company.id, "third@acme.io"))
        .expect("slot freed by hard delete");
}

#[test]
fn soft_deleted_candidates_keep_occupying_quota() {
    let fixture = fixture();
    let first = fixture.candidate("first@acme.io");
    fixture.candidate("second@acme.io");
    let vacancy = fixture.open_vacancy("Backend Engineer");
    fixture.apply(&first.candidate, &vacancy);

    let report = fixture
        .services
        .resources
        .remove_candidate(first.candidate.id)
        .expect("removed");
    assert!(report.is_soft());

    let err = fixture
        .services
        .resources
        .create_candidate(new_candidate(fixture.company.id, "third@acme.io"))
        .expect_err("inactive rows still count");
    assert!(matches!(err, ServiceError::QuotaExceeded { .. }));
}

#[test]
fn check_reports_usage_when_allowed() {
    let fixture = fixture();
    fixture.open_vacancy("Backend Engineer");

    let decision = fixture
        .store
        .read(|tx| check_quota(tx, ResourceKind::Vacancies, fixture.company.id))
        .expect("decision");
    assert_eq!(decision, QuotaDecision::Allow { used: 1, limit: 3 });
    assert!(decision.is_allowed());
}

#[test]
fn check_fails_for_unknown_company() {
    let fixture = fixture();
    let err = fixture
        .store
        .read(|tx| check_quota(tx, ResourceKind::Users, CompanyId::generate()))
        .expect_err("missing company");
    assert!(matches!(err, ServiceError::NotFound { entity: "company", .. }));
}

#[test]
fn zero_limit_denies_every_create() {
    let fixture = fixture_with_limits(0, 2, 3);
    let err = fixture
        .services
        .resources
        .create_user(new_user(Some(fixture.company.id), "grace@acme.io"))
        .expect_err("no seats");
    assert!(matches!(
        err,
        ServiceError::QuotaExceeded {
            resource: ResourceKind::Users,
            limit: 0,
            ..
        }
    ));
}

#[test]
fn usage_lists_every_resource_kind() {
    let fixture = fixture();
    fixture.candidate("first@acme.io");

    let usage = fixture
        .services
        .companies
        .usage(fixture.company.id)
        .expect("usage");
    assert_eq!(usage.plan_name, "Starter");
    let candidates = usage
        .entries
        .iter()
        .find(|entry| entry.resource == ResourceKind::Candidates)
        .expect("candidate entry");
    assert_eq!((candidates.used, candidates.limit, candidates.remaining), (1, 2, 1));
    assert_eq!(usage.entries.len(), 3);
}

#[test]
fn concurrent_creates_never_exceed_the_limit() {
    let fixture = fixture_with_limits(2, 5, 3);
    let services = Arc::clone(&fixture.services);
    let company_id = fixture.company.id;

    let handles: Vec<_> = (0..16)
        .map(|n| {
            let services = Arc::clone(&services);
            thread::spawn(move || {
                services
                    .resources
                    .create_candidate(new_candidate(company_id, &format!("c{n}@acme.io")))
                    .is_ok()
            })
        })
        .collect();

    let created = handles
        .into_iter()
        .map(|handle| handle.join().expect("thread completes"))
        .filter(|ok| *ok)
        .count();
    assert_eq!(created, 5);

    let stored = services
        .resources
        .candidates(&CandidateFilter {
            company_id: Some(company_id),
            ..CandidateFilter::default()
        })
        .expect("list");
    assert_eq!(stored.len(), 5);
}
