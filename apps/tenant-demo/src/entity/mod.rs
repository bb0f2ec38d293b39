//! Tables of the smoke scenario. `account` is the tenant table; `user` and
//! `address` are bound to it through `account_id`.

pub mod account;
pub mod address;
pub mod user;
