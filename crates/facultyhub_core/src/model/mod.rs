//! Domain model for faculty records.
//!
//! # Responsibility
//! - Define the canonical faculty, department, course and assignment shapes.
//! - Keep identity and validation rules next to the data they guard.
//!
//! # Invariants
//! - Surrogate ids are assigned by storage and never change.
//! - A course carries at most one assignment, and its `faculty_name` mirrors
//!   the display name of the assigned faculty.

pub mod course;
pub mod faculty;
