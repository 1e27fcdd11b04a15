//service/mod.rs
pub mod credential_service;
pub mod record_service;

pub use credential_service::{AuthOutcome, CredentialService};
pub use record_service::{PatientFiles, RecordService, UploadOutcome};
