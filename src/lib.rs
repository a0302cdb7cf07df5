//! Client-side core of the marketplace admin and vendor consoles.
//!
//! Each console page is a board ([`boards`]) over a locally held collection
//! ([`collection`]) that is updated optimistically ([`reconcile`]) and
//! reconciled with the REST backend ([`api`]) on behalf of the signed-in
//! session ([`auth`]).

pub mod api;
pub mod app_system;
pub mod auth;
pub mod boards;
pub mod collection;
pub mod config;
pub mod domain;
pub mod error;
pub mod notify;
pub mod query;
pub mod reconcile;
pub mod reorder;
pub mod wizard;

#[cfg(test)]
mod mock_framework;
