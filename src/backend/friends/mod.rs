//! Friends Module
//!
//! Friend requests and the symmetric friendship graph.

pub mod db;
pub mod handlers;
pub mod service;
