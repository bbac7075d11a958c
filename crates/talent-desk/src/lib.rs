//! Multi-tenant recruitment backend: plans, companies, users, candidates, vacancies, and
//! applications with per-tenant plan quotas, soft-delete aware lifecycle management, and
//! read-only reporting with CSV/Excel/PDF export.

pub mod config;
pub mod error;
pub mod reporting;
pub mod telemetry;
pub mod tenancy;
