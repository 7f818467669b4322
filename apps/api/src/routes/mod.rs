//! Route tables, one module per resource. Each `router()` is nested under
//! `/api/<resource>` by [`crate::create_router`].

pub mod products;
pub mod transactions;
pub mod users;
