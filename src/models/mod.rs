//! 数据模型模块
//! 患者档案与连接切换请求

pub mod connection;
pub mod patient;

pub use connection::ConnectionDetails;
pub use patient::{
    Coding, Condition, MedicalRecords, Medication, Observation, Patient, PatientCreatedResponse,
    RecordKind,
};
