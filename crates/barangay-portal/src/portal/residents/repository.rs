use super::domain::Resident;
pub use crate::portal::requests::repository::RepositoryError;

/// Storage abstraction for resident accounts.
pub trait ResidentRepository: Send + Sync {
    fn insert(&self, resident: Resident) -> Result<Resident, RepositoryError>;
    fn update(&self, resident: Resident) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &str) -> Result<Option<Resident>, RepositoryError>;
    fn fetch_by_email(&self, email: &str) -> Result<Option<Resident>, RepositoryError>;
    fn list(&self) -> Result<Vec<Resident>, RepositoryError>;
    /// Permanent removal; reachable only through the confirmed delete flow.
    fn delete(&self, id: &str) -> Result<(), RepositoryError>;
}
