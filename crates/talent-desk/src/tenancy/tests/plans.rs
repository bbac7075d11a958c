use rust_decimal::Decimal;

use super::common::*;
use crate::tenancy::domain::PlanType;
use crate::tenancy::error::ServiceError;
use crate::tenancy::payloads::PlanUpdate;

#[test]
fn plan_with_companies_cannot_be_removed() {
    let fixture = fixture();

    let err = fixture
        .services
        .plans
        .remove(fixture.plan.id)
        .expect_err("company subscribed");
    assert!(matches!(err, ServiceError::Conflict(_)));
    assert!(err.to_string().contains("used by 1 companies"));

    fixture
        .services
        .companies
        .remove(fixture.company.id)
        .expect("empty tenant removed");
    let report = fixture
        .services
        .plans
        .remove(fixture.plan.id)
        .expect("no subscribers left");
    assert!(!report.is_soft());
    assert!(fixture.services.plans.list().expect("list").is_empty());
}

#[test]
fn only_one_active_plan_per_type() {
    let fixture = fixture();

    let err = fixture
        .services
        .plans
        .create(new_plan("Starter 2", PlanType::Basic, 1, 1, 1))
        .expect_err("second active BASIC");
    assert!(matches!(err, ServiceError::Conflict(_)));

    let mut inactive = new_plan("Starter legacy", PlanType::Basic, 1, 1, 1);
    inactive.is_active = false;
    let legacy = fixture
        .services
        .plans
        .create(inactive)
        .expect("inactive duplicates are fine");

    let err = fixture
        .services
        .plans
        .update(
            legacy.id,
            PlanUpdate {
                is_active: Some(true),
                ..PlanUpdate::default()
            },
        )
        .expect_err("activation would clash");
    assert!(matches!(err, ServiceError::Conflict(_)));
}

#[test]
fn plan_type_is_immutable() {
    let fixture = fixture();
    let err = fixture
        .services
        .plans
        .update(
            fixture.plan.id,
            PlanUpdate {
                plan_type: Some(PlanType::Enterprise),
                ..PlanUpdate::default()
            },
        )
        .expect_err("type change");
    assert!(matches!(err, ServiceError::Validation(_)));
}

#[test]
fn lowering_a_limit_blocks_further_creates() {
    let fixture = fixture();
    fixture.candidate("first@acme.io");

    let plan = fixture
        .services
        .plans
        .update(
            fixture.plan.id,
            PlanUpdate {
                max_candidates: Some(1),
                price: Some(Decimal::new(1990, 2)),
                ..PlanUpdate::default()
            },
        )
        .expect("updated");
    assert_eq!(plan.max_candidates, 1);

    let err = fixture
        .services
        .resources
        .create_candidate(new_candidate(fixture.company.id, "second@acme.io"))
        .expect_err("limit lowered");
    assert!(matches!(err, ServiceError::QuotaExceeded { limit: 1, .. }));
}

#[test]
fn negative_price_is_rejected() {
    let fixture = fixture();
    let mut payload = new_plan("Pro", PlanType::Professional, 10, 10, 10);
    payload.price = Decimal::new(-1, 0);

    let err = fixture
        .services
        .plans
        .create(payload)
        .expect_err("negative price");
    assert!(matches!(err, ServiceError::Validation(_)));
}
