//! Domain model for notebook organization.
//!
//! # Responsibility
//! - Define canonical data structures used by the organization engine.
//! - Keep one record shape per domain object for engine and storage alike.
//!
//! # Invariants
//! - Every domain object is identified by a stable UUID.
//! - Containment is expressed only through `parent_id`, `folder_id` and
//!   `parent_page_id`; sections never contain anything.

pub mod notebook;
