//! Domicilios y cobro de órdenes de un restaurante
//!
//! Cotiza domicilios (geocodificación, ruta y tarifa), registra órdenes y
//! lleva su ciclo de estados hasta el cobro.

pub mod config;
pub mod controllers;
pub mod database;
pub mod dto;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod state;
pub mod testing;
pub mod utils;
