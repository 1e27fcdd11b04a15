// src/lib.rs

pub mod records;
pub mod blobs;
pub mod util;
pub mod api;
pub mod service;
pub mod app_state;
pub mod config;
pub mod error;
