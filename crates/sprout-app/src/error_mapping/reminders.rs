use sprout_core::AppError;
use sprout_reminders::ReminderError;

use super::IntoAppError;

impl IntoAppError for ReminderError {
    fn into_app_error(self) -> AppError {
        match self {
            e @ ReminderError::NoRuntime => AppError::Service(e.to_string()),
        }
    }
}
