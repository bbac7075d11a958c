//! Explicit payload checks run before any store access.

use std::sync::OnceLock;

use regex::Regex;
use rust_decimal::Decimal;

use super::domain::{CandidateStatus, VacancyStatus};
use super::payloads::{
    ApplicationUpdate, CandidateUpdate, CompanyUpdate, NewApplication, NewCandidate, NewCompany,
    NewEducation, NewExperience, NewPlan, NewSkill, NewUser, NewVacancy, PlanUpdate, UserUpdate,
    VacancyUpdate,
};

const MIN_PASSWORD_LEN: usize = 8;
const MAX_NAME_LEN: usize = 200;
const MAX_NOTES_LEN: usize = 4000;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    Required { field: &'static str },
    #[error("{field} must be a valid email address")]
    Email { field: &'static str },
    #[error("domain '{0}' is not a valid hostname")]
    Domain(String),
    #[error("{field} {reason}")]
    Invalid { field: &'static str, reason: String },
    #[error("cannot move {entity} from {from} to {to}")]
    Transition {
        entity: &'static str,
        from: &'static str,
        to: &'static str,
    },
    #[error("malformed request: {0}")]
    Malformed(String),
}

impl ValidationError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// Shape checks for an incoming payload.
pub trait Validate {
    fn validate(&self) -> Result<(), ValidationError>;
}

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9-]+(\.[A-Za-z0-9-]+)*\.[A-Za-z]{2,}$")
            .expect("email pattern compiles")
    })
}

fn domain_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(?:[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?\.)+[a-z]{2,63}$")
            .expect("domain pattern compiles")
    })
}

pub fn required(field: &'static str, value: &str) -> Result<(), ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Required { field });
    }
    if trimmed.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::invalid(
            field,
            format!("must be at most {MAX_NAME_LEN} characters"),
        ));
    }
    Ok(())
}

pub fn email(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if email_pattern().is_match(value.trim()) {
        Ok(())
    } else {
        Err(ValidationError::Email { field })
    }
}

pub fn domain(value: &str) -> Result<(), ValidationError> {
    let normalized = normalize_domain(value);
    if domain_pattern().is_match(&normalized) {
        Ok(())
    } else {
        Err(ValidationError::Domain(value.trim().to_string()))
    }
}

fn password(value: &str) -> Result<(), ValidationError> {
    if value.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::invalid(
            "password",
            format!("must be at least {MIN_PASSWORD_LEN} characters"),
        ));
    }
    Ok(())
}

fn price(value: Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() {
        return Err(ValidationError::invalid("price", "must not be negative"));
    }
    Ok(())
}

fn optional<T: ?Sized>(
    value: Option<&T>,
    check: impl FnOnce(&T) -> Result<(), ValidationError>,
) -> Result<(), ValidationError> {
    value.map_or(Ok(()), check)
}

pub fn normalize_email(value: &str) -> String {
    value.trim().to_ascii_lowercase()
}

pub fn normalize_domain(value: &str) -> String {
    value.trim().trim_end_matches('.').to_ascii_lowercase()
}

impl Validate for NewPlan {
    fn validate(&self) -> Result<(), ValidationError> {
        required("name", &self.name)?;
        price(self.price)
    }
}

impl Validate for PlanUpdate {
    fn validate(&self) -> Result<(), ValidationError> {
        optional(self.name.as_deref(), |name| required("name", name))?;
        optional(self.price.as_ref(), |value| price(*value))
    }
}

impl Validate for NewCompany {
    fn validate(&self) -> Result<(), ValidationError> {
        required("name", &self.name)?;
        domain(&self.domain)
    }
}

impl Validate for CompanyUpdate {
    fn validate(&self) -> Result<(), ValidationError> {
        optional(self.name.as_deref(), |name| required("name", name))?;
        optional(self.domain.as_deref(), domain)
    }
}

impl Validate for NewUser {
    fn validate(&self) -> Result<(), ValidationError> {
        required("name", &self.name)?;
        email("email", &self.email)?;
        password(&self.password)
    }
}

impl Validate for UserUpdate {
    fn validate(&self) -> Result<(), ValidationError> {
        optional(self.name.as_deref(), |name| required("name", name))?;
        optional(self.email.as_deref(), |value| email("email", value))?;
        optional(self.password.as_deref(), password)
    }
}

impl Validate for NewExperience {
    fn validate(&self) -> Result<(), ValidationError> {
        required("experience.company", &self.company)?;
        required("experience.title", &self.title)?;
        match self.end_date {
            Some(end) if end < self.start_date => Err(ValidationError::invalid(
                "experience.endDate",
                "must not precede startDate",
            )),
            _ => Ok(()),
        }
    }
}

impl Validate for NewEducation {
    fn validate(&self) -> Result<(), ValidationError> {
        required("education.institution", &self.institution)?;
        required("education.degree", &self.degree)?;
        match self.graduation_year {
            Some(year) if !(1900..=2100).contains(&year) => Err(ValidationError::invalid(
                "education.graduationYear",
                "must be between 1900 and 2100",
            )),
            _ => Ok(()),
        }
    }
}

impl Validate for NewCandidate {
    fn validate(&self) -> Result<(), ValidationError> {
        required("name", &self.name)?;
        email("email", &self.email)?;
        for experience in &self.experience {
            experience.validate()?;
        }
        for education in &self.education {
            education.validate()?;
        }
        Ok(())
    }
}

impl Validate for CandidateUpdate {
    fn validate(&self) -> Result<(), ValidationError> {
        optional(self.name.as_deref(), |name| required("name", name))?;
        optional(self.email.as_deref(), |value| email("email", value))?;
        if self.status == Some(CandidateStatus::Inactive) {
            return Err(ValidationError::invalid(
                "status",
                "INACTIVE is set by deleting the candidate",
            ));
        }
        Ok(())
    }
}

impl Validate for NewVacancy {
    fn validate(&self) -> Result<(), ValidationError> {
        required("title", &self.title)?;
        required("description", &self.description)?;
        match self.status {
            None | Some(VacancyStatus::Draft) | Some(VacancyStatus::Open) => Ok(()),
            Some(other) => Err(ValidationError::invalid(
                "status",
                format!("a new vacancy cannot start as {}", other.label()),
            )),
        }
    }
}

impl Validate for VacancyUpdate {
    fn validate(&self) -> Result<(), ValidationError> {
        optional(self.title.as_deref(), |title| required("title", title))?;
        optional(self.description.as_deref(), |text| {
            required("description", text)
        })
    }
}

fn notes(value: &str) -> Result<(), ValidationError> {
    if value.chars().count() > MAX_NOTES_LEN {
        return Err(ValidationError::invalid(
            "notes",
            format!("must be at most {MAX_NOTES_LEN} characters"),
        ));
    }
    Ok(())
}

impl Validate for NewApplication {
    fn validate(&self) -> Result<(), ValidationError> {
        optional(self.notes.as_deref(), notes)
    }
}

impl Validate for ApplicationUpdate {
    fn validate(&self) -> Result<(), ValidationError> {
        optional(self.notes.as_deref(), notes)
    }
}

impl Validate for NewSkill {
    fn validate(&self) -> Result<(), ValidationError> {
        required("name", &self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_shapes() {
        assert!(email("email", "ana.silva+jobs@acme.com.br").is_ok());
        assert!(email("email", " recruiter@acme.io ").is_ok());
        assert_eq!(
            email("email", "not-an-email"),
            Err(ValidationError::Email { field: "email" })
        );
        assert!(email("email", "a@b").is_err());
    }

    #[test]
    fn domain_shapes() {
        assert!(domain("Acme.IO").is_ok());
        assert!(domain("careers.acme-group.com").is_ok());
        assert!(domain("acme").is_err());
        assert!(domain("-acme.com").is_err());
        assert!(domain("acme..com").is_err());
    }

    #[test]
    fn blank_required_fields_are_rejected() {
        assert_eq!(
            required("name", "   "),
            Err(ValidationError::Required { field: "name" })
        );
    }

    #[test]
    fn experience_dates_must_be_ordered() {
        let experience = NewExperience {
            company: "Globex".to_string(),
            title: "Engineer".to_string(),
            start_date: chrono::NaiveDate::from_ymd_opt(2024, 5, 1).expect("valid"),
            end_date: chrono::NaiveDate::from_ymd_opt(2023, 5, 1),
        };
        assert!(matches!(
            experience.validate(),
            Err(ValidationError::Invalid {
                field: "experience.endDate",
                ..
            })
        ));
    }

    #[test]
    fn vacancies_start_as_draft_or_open() {
        let vacancy = NewVacancy {
            company_id: crate::tenancy::domain::CompanyId::generate(),
            title: "Backend Engineer".to_string(),
            description: "Rust services".to_string(),
            location: None,
            status: Some(VacancyStatus::Closed),
            skill_ids: Vec::new(),
        };
        assert!(vacancy.validate().is_err());
    }
}
