//! Resident account lifecycle managed from the admin console.

pub mod domain;
pub mod repository;
pub mod service;

pub use domain::{deletion_phrase, Resident, ResidentRole};
pub use repository::ResidentRepository;
pub use service::{DirectoryError, Registration, ResidentDirectory};
