use crate::application::persistence::PersistenceError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}
