//! PostgreSQL E2E tests
//!
//! These need a scratch database named by `KITCHEN_SYNC_TEST_DB` and skip
//! themselves when it is unset. They create and drop the `users`, `posts`
//! and `_kitchensync` tables.

mod postgresql_sync_lib;
