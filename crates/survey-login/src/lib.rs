//! Survey Login Library
//!
//! A token gateway for survey respondents. Credentials are exchanged for a
//! signed token that is re-issued with richer claims as the caller looks up
//! units and questionnaires.

pub mod api;
pub mod auth;
pub mod db;
pub mod store;
