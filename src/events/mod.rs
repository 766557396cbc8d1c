//! Event handlers for chat updates.
//!
//! - `join_request` - approve, welcome and queue new members
//! - `member_left` - farewell and queue cleanup

pub mod join_request;
pub mod member_left;
