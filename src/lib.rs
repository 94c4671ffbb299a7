// src/lib.rs

//! threadwatch: incremental forum thread and comment monitor

pub mod error;
pub mod filter;
pub mod models;
pub mod notify;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;
