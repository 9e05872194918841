//! Conversions from external infrastructure errors into domain errors.

use openslot_domain::SchedulingError;
use rusqlite::Error as SqlError;
use tokio::task::JoinError;

/// Error newtype that keeps conversions on the infrastructure side and can
/// be converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub SchedulingError);

impl From<InfraError> for SchedulingError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<SchedulingError> for InfraError {
    fn from(value: SchedulingError) -> Self {
        InfraError(value)
    }
}

impl std::fmt::Display for InfraError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::error::Error for InfraError {}

/// Extension trait to make the conversion logic explicit in tests and
/// within this module.
trait IntoSchedulingError {
    fn into_scheduling(self) -> SchedulingError;
}

/* -------------------------------------------------------------------------- */
/* rusqlite::Error → SchedulingError */
/* -------------------------------------------------------------------------- */

impl IntoSchedulingError for SqlError {
    fn into_scheduling(self) -> SchedulingError {
        use rusqlite::ffi::ErrorCode;
        use rusqlite::Error as RE;

        match self {
            RE::SqliteFailure(err, maybe_message) => {
                let message = maybe_message.unwrap_or_default();
                match (err.code, err.extended_code) {
                    (ErrorCode::DatabaseBusy, _) => {
                        SchedulingError::Backend("database is busy".into())
                    }
                    (ErrorCode::DatabaseLocked, _) => {
                        SchedulingError::Backend("database is locked".into())
                    }
                    (ErrorCode::ConstraintViolation, 2067) => {
                        SchedulingError::Backend("unique constraint violation".into())
                    }
                    (ErrorCode::ConstraintViolation, 787) => {
                        SchedulingError::Backend("foreign key constraint violation".into())
                    }
                    _ => SchedulingError::Backend(format!(
                        "sqlite failure {:?} (code {}): {}",
                        err.code, err.extended_code, message
                    )),
                }
            }
            RE::QueryReturnedNoRows => {
                SchedulingError::Backend("no rows returned by query".into())
            }
            RE::FromSqlConversionFailure(_, _, cause) => {
                SchedulingError::Backend(format!("failed to convert sqlite value: {cause}"))
            }
            RE::InvalidColumnType(_, _, ty) => {
                SchedulingError::Backend(format!("invalid column type: {ty}"))
            }
            RE::Utf8Error(_) => {
                SchedulingError::Backend("invalid UTF-8 returned from sqlite".into())
            }
            RE::InvalidParameterName(parameter_name) => {
                SchedulingError::Backend(format!("invalid parameter name: {parameter_name}"))
            }
            RE::InvalidPath(path) => SchedulingError::Backend(format!(
                "invalid database path: {}",
                path.to_string_lossy()
            )),
            RE::InvalidQuery => SchedulingError::Backend("invalid SQL query".into()),
            other => SchedulingError::Backend(other.to_string()),
        }
    }
}

impl From<SqlError> for InfraError {
    fn from(value: SqlError) -> Self {
        InfraError(value.into_scheduling())
    }
}

/* -------------------------------------------------------------------------- */
/* r2d2::Error → SchedulingError */
/* -------------------------------------------------------------------------- */

impl IntoSchedulingError for r2d2::Error {
    fn into_scheduling(self) -> SchedulingError {
        SchedulingError::Backend(format!("connection pool error: {self}"))
    }
}

impl From<r2d2::Error> for InfraError {
    fn from(value: r2d2::Error) -> Self {
        InfraError(value.into_scheduling())
    }
}

/* -------------------------------------------------------------------------- */
/* tokio::task::JoinError → SchedulingError */
/* -------------------------------------------------------------------------- */

impl IntoSchedulingError for JoinError {
    fn into_scheduling(self) -> SchedulingError {
        if self.is_cancelled() {
            SchedulingError::Backend("blocking database task cancelled".into())
        } else {
            SchedulingError::Backend(format!("blocking database task failed: {self}"))
        }
    }
}

impl From<JoinError> for InfraError {
    fn from(value: JoinError) -> Self {
        InfraError(value.into_scheduling())
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
