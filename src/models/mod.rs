//! Modelos del sistema
//!
//! Este módulo contiene los modelos de datos que mapean al schema
//! PostgreSQL y los tipos transitorios de cotización.

pub mod address;
pub mod auth;
pub mod config;
pub mod order;
pub mod payment;
pub mod route;
