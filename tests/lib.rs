//! Integration tests against a live Postgres; see `store_postgres.rs`.
