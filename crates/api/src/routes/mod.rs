//! HTTP route handlers

pub mod model;
pub mod predict;
