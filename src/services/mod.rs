//! Business logic services layer

pub mod connection_service;
pub mod patient_service;

pub use connection_service::ConnectionService;
pub use patient_service::PatientService;
