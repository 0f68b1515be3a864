use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use crate::error::AppError;

/// Media host backend types
///
/// Defined in core because it's used in configuration and by the host factory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaHostBackend {
    Cloudinary,
    Local,
}

impl FromStr for MediaHostBackend {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cloudinary" => Ok(MediaHostBackend::Cloudinary),
            "local" => Ok(MediaHostBackend::Local),
            _ => Err(AppError::Configuration(format!(
                "Invalid media host backend: {}",
                s
            ))),
        }
    }
}

impl Display for MediaHostBackend {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            MediaHostBackend::Cloudinary => write!(f, "cloudinary"),
            MediaHostBackend::Local => write!(f, "local"),
        }
    }
}
