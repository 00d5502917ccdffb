//! Postgres repository functions.
//!
//! Every query here is issued with the runtime `sqlx::query`/`query_as` API
//! rather than the `query!` compile-time macros, since there is no live
//! database at build time in this workspace; types are enforced by
//! `FromRow` on the model structs in `crate::models` instead.
//!
//! `config_entries` has no repository module here: it is owned end-to-end
//! by `crate::secret_store`, which is the only thing allowed to read or
//! write that table (every value in it is an encrypted envelope).

pub mod admins;
pub mod devices;
pub mod operation_log;
pub mod users;
