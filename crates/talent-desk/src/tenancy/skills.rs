use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use super::domain::{Skill, SkillId};
use super::error::ServiceError;
use super::payloads::NewSkill;
use super::store::TenantStore;
use super::validation::Validate;

/// Shared skill vocabulary referenced by candidates and vacancies.
pub struct SkillCatalog<S> {
    store: Arc<S>,
}

impl<S> SkillCatalog<S>
where
    S: TenantStore + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Names are unique case-insensitively; the store rejects a second `Rust` after `rust`.
    pub fn create(&self, payload: NewSkill) -> Result<Skill, ServiceError> {
        payload.validate()?;

        let skill = self.store.write(|tx| {
            Ok::<_, ServiceError>(tx.insert_skill(Skill {
                id: SkillId::generate(),
                name: payload.name.trim().to_string(),
                category: payload.category.clone(),
                created_at: Utc::now(),
            })?)
        })?;

        info!(skill = %skill.id, name = %skill.name, "skill created");
        Ok(skill)
    }

    pub fn list(&self) -> Result<Vec<Skill>, ServiceError> {
        self.store.read(|tx| tx.skills().map_err(ServiceError::from))
    }

    pub fn get(&self, id: SkillId) -> Result<Skill, ServiceError> {
        self.store.read(|tx| {
            tx.skill(id)?
                .ok_or_else(|| ServiceError::not_found("skill", id))
        })
    }
}
