//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts for notebook storage.
//! - Isolate SQLite query details from the organization engine and service.
//!
//! # Invariants
//! - Every multi-row mutation runs inside one immediate transaction; a
//!   failed call leaves storage at its pre-mutation state.
//! - Repository APIs return semantic errors (`*NotFound`) in addition to DB
//!   transport errors.

pub mod notebook_repo;
