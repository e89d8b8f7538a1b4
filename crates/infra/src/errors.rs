//! Conversions from external infrastructure errors into domain errors.

use flexlog_domain::FlexLogError;
use reqwest::Error as HttpError;
use rusqlite::Error as SqlError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub FlexLogError);

impl From<InfraError> for FlexLogError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<FlexLogError> for InfraError {
    fn from(value: FlexLogError) -> Self {
        InfraError(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoFlexLogError {
    fn into_flexlog(self) -> FlexLogError;
}

/* -------------------------------------------------------------------------- */
/* rusqlite::Error → FlexLogError */
/* -------------------------------------------------------------------------- */

impl IntoFlexLogError for SqlError {
    fn into_flexlog(self) -> FlexLogError {
        use rusqlite::ffi::ErrorCode;
        use rusqlite::Error as RE;

        match self {
            RE::SqliteFailure(err, maybe_message) => {
                let message = maybe_message.unwrap_or_default();
                match err.code {
                    ErrorCode::DiskFull => {
                        FlexLogError::StorageFull("local database disk is full".into())
                    }
                    ErrorCode::DatabaseCorrupt | ErrorCode::NotADatabase => {
                        FlexLogError::StorageCorrupt(format!(
                            "local database is corrupt: {message}"
                        ))
                    }
                    ErrorCode::DatabaseBusy => FlexLogError::Database("database is busy".into()),
                    ErrorCode::DatabaseLocked => {
                        FlexLogError::Database("database is locked".into())
                    }
                    ErrorCode::ConstraintViolation => {
                        FlexLogError::Database(format!("constraint violation: {message}"))
                    }
                    _ => FlexLogError::Database(format!(
                        "sqlite failure {:?} (code {}): {}",
                        err.code, err.extended_code, message
                    )),
                }
            }
            RE::QueryReturnedNoRows => FlexLogError::NotFound("no rows returned by query".into()),
            RE::FromSqlConversionFailure(_, _, cause) => {
                FlexLogError::StorageCorrupt(format!("failed to convert sqlite value: {cause}"))
            }
            RE::InvalidColumnType(_, _, ty) => {
                FlexLogError::StorageCorrupt(format!("invalid column type: {ty}"))
            }
            RE::Utf8Error(_) => {
                FlexLogError::StorageCorrupt("invalid UTF-8 returned from sqlite".into())
            }
            RE::InvalidParameterName(parameter_name) => {
                FlexLogError::Database(format!("invalid parameter name: {parameter_name}"))
            }
            RE::InvalidPath(path) => FlexLogError::Database(format!(
                "invalid database path: {}",
                path.to_string_lossy()
            )),
            RE::InvalidQuery => FlexLogError::Database("invalid SQL query".into()),
            other => FlexLogError::Database(other.to_string()),
        }
    }
}

impl From<SqlError> for InfraError {
    fn from(value: SqlError) -> Self {
        InfraError(value.into_flexlog())
    }
}

/* -------------------------------------------------------------------------- */
/* r2d2::Error → FlexLogError */
/* -------------------------------------------------------------------------- */

impl From<r2d2::Error> for InfraError {
    fn from(value: r2d2::Error) -> Self {
        InfraError(FlexLogError::Database(format!("connection pool error: {value}")))
    }
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → FlexLogError */
/* -------------------------------------------------------------------------- */

impl IntoFlexLogError for HttpError {
    fn into_flexlog(self) -> FlexLogError {
        if self.is_timeout() {
            return FlexLogError::Network("HTTP request timed out".into());
        }

        if self.is_connect() {
            return FlexLogError::Network("HTTP connection failure".into());
        }

        if let Some(status) = self.status() {
            let code = status.as_u16();
            let message =
                format!("HTTP {} {}", code, status.canonical_reason().unwrap_or("unknown status"));

            return match code {
                404 => FlexLogError::NotFound(message),
                429 => FlexLogError::Network(message),
                400..=499 => FlexLogError::InvalidInput(message),
                500..=599 => FlexLogError::Network(message),
                _ => FlexLogError::Network(message),
            };
        }

        if self.is_decode() {
            return FlexLogError::Internal(format!("failed to decode HTTP response: {self}"));
        }

        FlexLogError::Network(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_flexlog())
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
