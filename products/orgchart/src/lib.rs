//! Org chart core.
//!
//! Turns the flat employee list held by the record store into an ordered
//! forest of [`OrgNode`]s. Everything in this crate is pure: no I/O, no
//! shared state, so a build can run on any thread for any request.

mod error;
mod hierarchy;
mod name;
mod record;

pub use error::{HierarchyError, HierarchyResult};
pub use hierarchy::{Forest, MAX_REPORTING_DEPTH, OrphanReference, build_forest, build_hierarchy};
pub use name::{last_name_key, split_name};
pub use record::{EmployeeRecord, OrgNode};
