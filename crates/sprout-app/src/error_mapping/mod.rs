//! Maps crate-level errors to `sprout_core::AppError` for consistent user-facing messages.
//! Each source crate has its own module to keep mappings small and readable.

mod plants;
mod reminders;
mod weather;

use sprout_core::AppError;

/// Conversion of a crate error into the application hierarchy.
pub trait IntoAppError {
    fn into_app_error(self) -> AppError;
}
