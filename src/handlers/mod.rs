//! HTTP 处理器模块

pub mod admin;
pub mod health;
pub mod medical_records;
pub mod metrics;
pub mod patient;
