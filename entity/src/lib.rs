//! sea-orm entities for the org chart store.

pub mod employees;
