//! Library crate for skills-queue-back, exposing modules for binaries and integration tests.

pub mod config;
pub mod dao;
mod dto;
pub mod error;
pub mod routes;
pub mod services;
pub mod state;
