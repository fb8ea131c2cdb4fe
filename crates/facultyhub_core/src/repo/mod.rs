//! Repository layer for faculty records.
//!
//! # Responsibility
//! - Define the data access contracts used by the reconciliation engine and
//!   the profile orchestrator.
//! - Keep SQL inside the persistence boundary.
//!
//! # Invariants
//! - Repositories never open transactions themselves; callers hand them a
//!   connection or a `rusqlite::Transaction` (which derefs to one), so a whole
//!   use-case commits or rolls back as one unit.
//! - Repository APIs return semantic errors (`NotFound`) in addition to
//!   transport errors.

pub mod assignment_repo;
pub mod catalog_repo;
pub mod faculty_repo;
