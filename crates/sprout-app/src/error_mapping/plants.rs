use sprout_core::{AppError, DatabaseError, RusqliteErrorExt};
use sprout_services::PlantStoreError;

use super::IntoAppError;

impl IntoAppError for PlantStoreError {
    fn into_app_error(self) -> AppError {
        match self {
            PlantStoreError::NotFound(id) => {
                AppError::Database(DatabaseError::NotFound(format!("plant {}", id)))
            }
            PlantStoreError::Validation(message) => AppError::Validation(message),
            e @ PlantStoreError::InvalidTimestamp { .. } => {
                AppError::Database(DatabaseError::Corruption(e.to_string()))
            }
            PlantStoreError::Database(e) => AppError::Database(e.into_database_error()),
            PlantStoreError::Task(message) => AppError::Service(message),
        }
    }
}
