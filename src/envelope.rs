//! JSON result envelope printed for `--json`.
//!
//! Operations return `Result<T, AppError>`; this module only decides how that
//! result looks on stdout:
//!
//! ```json
//! { "finalresponse": { "success": true,  "data": { ... } } }
//! { "finalresponse": { "success": false, "reason": "..." } }
//! ```

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::error::AppError;

/// Success carrying data, or failure carrying a reason. Never both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Envelope<T> {
    Success(T),
    Failure(String),
}

impl<T> Envelope<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, Envelope::Success(_))
    }
}

impl<'a, T> From<&'a Result<T, AppError>> for Envelope<&'a T> {
    fn from(result: &'a Result<T, AppError>) -> Self {
        match result {
            Ok(data) => Envelope::Success(data),
            Err(e) => Envelope::Failure(e.reason()),
        }
    }
}

impl<T: Serialize> Serialize for Envelope<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        match self {
            Envelope::Success(data) => {
                map.serialize_entry("success", &true)?;
                map.serialize_entry("data", data)?;
            }
            Envelope::Failure(reason) => {
                map.serialize_entry("success", &false)?;
                map.serialize_entry("reason", reason)?;
            }
        }
        map.end()
    }
}

/// Top-level object returned by every command.
#[derive(Debug, Serialize)]
pub struct CommandOutput<T> {
    pub finalresponse: Envelope<T>,
}

impl<'a, T> From<&'a Result<T, AppError>> for CommandOutput<&'a T> {
    fn from(result: &'a Result<T, AppError>) -> Self {
        Self {
            finalresponse: Envelope::from(result),
        }
    }
}
