//! Configuration module
//!
//! This module provides configuration structures for the API and the image
//! pipeline: server settings, the database, compression parameters, upload
//! behaviour and the media host credentials. Everything is read from the environment (optionally
//! through a `.env` file) with typed defaults.

use std::env;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use std::time::Duration;

use crate::error::AppError;
use crate::storage_types::MediaHostBackend;

// Common constants
const SERVER_PORT: u16 = 8000;
const MAX_BODY_SIZE_MB: usize = 50;
const DATABASE_URL: &str = "sqlite://vitrine.db";
const DB_MAX_CONNECTIONS: u32 = 5;
const DB_TIMEOUT_SECONDS: u64 = 30;

const MAX_BYTES: u64 = 10 * 1024 * 1024;
const TARGET_RATIO: f64 = 0.93;
const INITIAL_QUALITY: u8 = 82;
const JPEG_MIN_QUALITY: u8 = 50;
const WEBP_MIN_QUALITY: u8 = 45;
const QUALITY_STEP: u8 = 4;
const MAX_WIDTH: u32 = 5000;

const DEFAULT_FOLDER: &str = "vitrine/uploads";
const UPLOAD_TIMEOUT_SECS: u64 = 120;
const WEB_TRANSFORMATION: &str = "f_auto,q_auto";
const THUMB_TRANSFORMATION: &str = "c_fill,g_face,w_480,h_320";
const EAGER_MAX_WIDTH: u32 = 2400;

/// Resampling filter used when an image is wider than the configured maximum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResampleFilter {
    Nearest,
    Triangle,
    CatmullRom,
    Gaussian,
    #[default]
    Lanczos3,
}

impl FromStr for ResampleFilter {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "nearest" => Ok(ResampleFilter::Nearest),
            "triangle" | "bilinear" => Ok(ResampleFilter::Triangle),
            "catmullrom" | "catmull-rom" | "bicubic" => Ok(ResampleFilter::CatmullRom),
            "gaussian" => Ok(ResampleFilter::Gaussian),
            "lanczos" | "lanczos3" => Ok(ResampleFilter::Lanczos3),
            _ => Err(AppError::Configuration(format!(
                "Invalid resampling filter: {}",
                s
            ))),
        }
    }
}

impl Display for ResampleFilter {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            ResampleFilter::Nearest => write!(f, "nearest"),
            ResampleFilter::Triangle => write!(f, "triangle"),
            ResampleFilter::CatmullRom => write!(f, "catmullrom"),
            ResampleFilter::Gaussian => write!(f, "gaussian"),
            ResampleFilter::Lanczos3 => write!(f, "lanczos3"),
        }
    }
}

/// Parameters of the adaptive image compressor.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CompressionConfig {
    /// Uploads larger than this are compressed; smaller ones pass through untouched.
    pub max_bytes: u64,
    /// Size the quality search tries to get under.
    pub target_bytes: u64,
    pub initial_quality: u8,
    pub jpeg_min_quality: u8,
    pub webp_min_quality: u8,
    pub quality_step: u8,
    /// Images wider than this are downscaled to exactly this width.
    pub max_width: u32,
    pub resample_filter: ResampleFilter,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self::with_max_bytes(MAX_BYTES)
    }
}

impl CompressionConfig {
    /// Default parameters with the cap replaced and the ceiling kept at 93% of it.
    pub fn with_max_bytes(max_bytes: u64) -> Self {
        Self {
            max_bytes,
            target_bytes: (max_bytes as f64 * TARGET_RATIO) as u64,
            initial_quality: INITIAL_QUALITY,
            jpeg_min_quality: JPEG_MIN_QUALITY,
            webp_min_quality: WEBP_MIN_QUALITY,
            quality_step: QUALITY_STEP,
            max_width: MAX_WIDTH,
            resample_filter: ResampleFilter::Lanczos3,
        }
    }

    pub fn from_env() -> Result<Self, AppError> {
        let max_bytes = env_parse("IMAGE_MAX_BYTES", MAX_BYTES)?;
        let target_bytes = match env::var("IMAGE_TARGET_BYTES") {
            Ok(v) => v.trim().parse().map_err(|_| {
                AppError::Configuration("IMAGE_TARGET_BYTES must be a valid number".to_string())
            })?,
            Err(_) => {
                let ratio: f64 = env_parse("IMAGE_TARGET_RATIO", TARGET_RATIO)?;
                if !(0.0..=1.0).contains(&ratio) || ratio == 0.0 {
                    return Err(AppError::Configuration(
                        "IMAGE_TARGET_RATIO must be in (0, 1]".to_string(),
                    ));
                }
                (max_bytes as f64 * ratio) as u64
            }
        };

        let config = CompressionConfig {
            max_bytes,
            target_bytes,
            initial_quality: env_parse("IMAGE_INITIAL_QUALITY", INITIAL_QUALITY)?,
            jpeg_min_quality: env_parse("IMAGE_JPEG_MIN_QUALITY", JPEG_MIN_QUALITY)?,
            webp_min_quality: env_parse("IMAGE_WEBP_MIN_QUALITY", WEBP_MIN_QUALITY)?,
            quality_step: env_parse("IMAGE_QUALITY_STEP", QUALITY_STEP)?,
            max_width: env_parse("IMAGE_MAX_WIDTH", MAX_WIDTH)?,
            resample_filter: env::var("IMAGE_RESAMPLE_FILTER")
                .map(|s| s.parse())
                .unwrap_or(Ok(ResampleFilter::Lanczos3))?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject parameter sets for which the quality search could not terminate
    /// or would encode outside the 1..=100 quality range.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.quality_step == 0 {
            return Err(AppError::Configuration(
                "IMAGE_QUALITY_STEP must be greater than 0".to_string(),
            ));
        }
        if self.initial_quality == 0 || self.initial_quality > 100 {
            return Err(AppError::Configuration(
                "IMAGE_INITIAL_QUALITY must be between 1 and 100".to_string(),
            ));
        }
        for (name, floor) in [
            ("IMAGE_JPEG_MIN_QUALITY", self.jpeg_min_quality),
            ("IMAGE_WEBP_MIN_QUALITY", self.webp_min_quality),
        ] {
            if floor == 0 || floor > self.initial_quality {
                return Err(AppError::Configuration(format!(
                    "{} must be between 1 and IMAGE_INITIAL_QUALITY ({})",
                    name, self.initial_quality
                )));
            }
        }
        if self.max_width == 0 {
            return Err(AppError::Configuration(
                "IMAGE_MAX_WIDTH must be greater than 0".to_string(),
            ));
        }
        if self.target_bytes == 0 || self.target_bytes > self.max_bytes {
            return Err(AppError::Configuration(
                "Target size must be greater than 0 and not exceed IMAGE_MAX_BYTES".to_string(),
            ));
        }
        Ok(())
    }

    /// Whether an upload of `size` bytes goes through the compressor at all.
    pub fn should_compress(&self, size: u64) -> bool {
        size > self.max_bytes
    }
}

/// Upload endpoint behaviour.
#[derive(Clone, Debug)]
pub struct UploadConfig {
    pub default_folder: String,
    pub max_body_size_bytes: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            default_folder: DEFAULT_FOLDER.to_string(),
            max_body_size_bytes: MAX_BODY_SIZE_MB * 1024 * 1024,
        }
    }
}

/// Cloudinary account credentials.
#[derive(Clone)]
pub struct CloudinaryCredentials {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
}

impl std::fmt::Debug for CloudinaryCredentials {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("CloudinaryCredentials")
            .field("cloud_name", &self.cloud_name)
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .finish()
    }
}

impl CloudinaryCredentials {
    /// Parse `cloudinary://<api_key>:<api_secret>@<cloud_name>`.
    pub fn from_url(url: &str) -> Result<Self, AppError> {
        let rest = url.trim().strip_prefix("cloudinary://").ok_or_else(|| {
            AppError::Configuration("CLOUDINARY_URL must start with cloudinary://".to_string())
        })?;
        let (auth, cloud_name) = rest.rsplit_once('@').ok_or_else(|| {
            AppError::Configuration("CLOUDINARY_URL is missing the cloud name".to_string())
        })?;
        let (api_key, api_secret) = auth.split_once(':').ok_or_else(|| {
            AppError::Configuration("CLOUDINARY_URL is missing the API secret".to_string())
        })?;
        let cloud_name = cloud_name.split(['?', '/']).next().unwrap_or_default();

        let creds = Self {
            cloud_name: cloud_name.to_string(),
            api_key: api_key.to_string(),
            api_secret: api_secret.to_string(),
        };
        creds.validate()?;
        Ok(creds)
    }

    fn validate(&self) -> Result<(), AppError> {
        for (name, value) in [
            ("cloud name", &self.cloud_name),
            ("API key", &self.api_key),
            ("API secret", &self.api_secret),
        ] {
            if value.trim().is_empty() {
                return Err(AppError::Configuration(format!(
                    "Cloudinary {} must not be empty",
                    name
                )));
            }
        }
        Ok(())
    }
}

/// Media host selection and settings.
#[derive(Clone, Debug)]
pub struct MediaHostConfig {
    pub backend: MediaHostBackend,
    pub cloudinary: Option<CloudinaryCredentials>,
    /// Override for the Cloudinary API root (tests point this at a mock server).
    pub cloudinary_api_base: Option<String>,
    pub local_storage_path: Option<String>,
    pub local_storage_base_url: Option<String>,
    pub upload_timeout: Duration,
    pub web_transformation: String,
    pub thumb_transformation: String,
    pub eager_max_width: u32,
}

impl Default for MediaHostConfig {
    fn default() -> Self {
        Self {
            backend: MediaHostBackend::Cloudinary,
            cloudinary: None,
            cloudinary_api_base: None,
            local_storage_path: None,
            local_storage_base_url: None,
            upload_timeout: Duration::from_secs(UPLOAD_TIMEOUT_SECS),
            web_transformation: WEB_TRANSFORMATION.to_string(),
            thumb_transformation: THUMB_TRANSFORMATION.to_string(),
            eager_max_width: EAGER_MAX_WIDTH,
        }
    }
}

impl MediaHostConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let backend = match env::var("MEDIA_HOST_BACKEND") {
            Ok(s) => s.parse()?,
            Err(_) => MediaHostBackend::Cloudinary,
        };

        let cloudinary = match env::var("CLOUDINARY_URL") {
            Ok(url) if !url.trim().is_empty() => Some(CloudinaryCredentials::from_url(&url)?),
            _ => match (
                env::var("CLOUDINARY_CLOUD_NAME"),
                env::var("CLOUDINARY_API_KEY"),
                env::var("CLOUDINARY_API_SECRET"),
            ) {
                (Ok(cloud_name), Ok(api_key), Ok(api_secret)) => Some(CloudinaryCredentials {
                    cloud_name,
                    api_key,
                    api_secret,
                }),
                _ => None,
            },
        };

        let config = MediaHostConfig {
            backend,
            cloudinary,
            cloudinary_api_base: env::var("CLOUDINARY_API_BASE").ok().filter(|s| !s.is_empty()),
            local_storage_path: env::var("LOCAL_STORAGE_PATH").ok(),
            local_storage_base_url: env::var("LOCAL_STORAGE_BASE_URL").ok(),
            upload_timeout: Duration::from_secs(env_parse(
                "MEDIA_UPLOAD_TIMEOUT_SECS",
                UPLOAD_TIMEOUT_SECS,
            )?),
            web_transformation: env::var("MEDIA_WEB_TRANSFORMATION")
                .unwrap_or_else(|_| WEB_TRANSFORMATION.to_string()),
            thumb_transformation: env::var("MEDIA_THUMB_TRANSFORMATION")
                .unwrap_or_else(|_| THUMB_TRANSFORMATION.to_string()),
            eager_max_width: env_parse("MEDIA_EAGER_MAX_WIDTH", EAGER_MAX_WIDTH)?,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        match self.backend {
            MediaHostBackend::Cloudinary => match &self.cloudinary {
                Some(creds) => creds.validate(),
                None => Err(AppError::Configuration(
                    "CLOUDINARY_URL or CLOUDINARY_CLOUD_NAME, CLOUDINARY_API_KEY and CLOUDINARY_API_SECRET must be set when using the cloudinary media host".to_string(),
                )),
            },
            MediaHostBackend::Local => {
                if self.local_storage_path.is_none() {
                    return Err(AppError::Configuration(
                        "LOCAL_STORAGE_PATH must be set when using the local media host"
                            .to_string(),
                    ));
                }
                if self.local_storage_base_url.is_none() {
                    return Err(AppError::Configuration(
                        "LOCAL_STORAGE_BASE_URL must be set when using the local media host"
                            .to_string(),
                    ));
                }
                Ok(())
            }
        }
    }
}

/// SQLite database holding the asset registry and content documents.
#[derive(Clone, Debug, PartialEq)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_seconds: u64,
}

/// Defaults to a private in-memory database; `from_env` defaults to a file.
impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite::memory:".to_string(),
            max_connections: DB_MAX_CONNECTIONS,
            timeout_seconds: DB_TIMEOUT_SECONDS,
        }
    }
}

impl DatabaseConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let url = env::var("DATABASE_URL")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DATABASE_URL.to_string());
        if !url.starts_with("sqlite:") {
            return Err(AppError::Configuration(
                "DATABASE_URL must be a sqlite: connection string".to_string(),
            ));
        }

        let config = DatabaseConfig {
            url,
            max_connections: env_parse("DB_MAX_CONNECTIONS", DB_MAX_CONNECTIONS)?,
            timeout_seconds: env_parse("DB_TIMEOUT_SECONDS", DB_TIMEOUT_SECONDS)?,
        };
        if config.max_connections == 0 {
            return Err(AppError::Configuration(
                "DB_MAX_CONNECTIONS must be greater than 0".to_string(),
            ));
        }
        Ok(config)
    }

    /// In-memory databases disappear with their last connection.
    pub fn is_in_memory(&self) -> bool {
        self.url.contains(":memory:") || self.url.contains("mode=memory")
    }
}

/// Base configuration of the HTTP service
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_port: u16,
    pub environment: String,
    /// JSON file with the initial content documents
    pub content_seed_path: Option<String>,
    pub cors_origins: Vec<String>,
}

impl Default for BaseConfig {
    fn default() -> Self {
        Self {
            server_port: SERVER_PORT,
            environment: "development".to_string(),
            content_seed_path: None,
            cors_origins: vec!["*".to_string()],
        }
    }
}

/// Application configuration.
#[derive(Clone, Debug, Default)]
pub struct Config {
    pub base: BaseConfig,
    pub database: DatabaseConfig,
    pub compression: CompressionConfig,
    pub upload: UploadConfig,
    pub media_host: MediaHostConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let base = BaseConfig {
            server_port: env::var("PORT")
                .unwrap_or_else(|_| SERVER_PORT.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            environment,
            content_seed_path: env::var("CONTENT_SEED_PATH")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            cors_origins: env::var("CORS_ORIGINS")
                .unwrap_or_else(|_| "*".to_string())
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        };

        let upload = UploadConfig {
            default_folder: env::var("UPLOAD_DEFAULT_FOLDER")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_FOLDER.to_string()),
            max_body_size_bytes: env_parse("MAX_BODY_SIZE_MB", MAX_BODY_SIZE_MB)? * 1024 * 1024,
        };

        let config = Config {
            base,
            database: DatabaseConfig::from_env()?,
            compression: CompressionConfig::from_env()?,
            upload,
            media_host: MediaHostConfig::from_env()?,
        };

        tracing::debug!(
            environment = %config.base.environment,
            media_host = %config.media_host.backend,
            max_bytes = config.compression.max_bytes,
            target_bytes = config.compression.target_bytes,
            "Configuration loaded"
        );

        Ok(config)
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.base.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn server_port(&self) -> u16 {
        self.base.server_port
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.base.cors_origins
    }

    pub fn database_url(&self) -> &str {
        &self.database.url
    }

    pub fn db_max_connections(&self) -> u32 {
        self.database.max_connections
    }

    pub fn db_timeout_seconds(&self) -> u64 {
        self.database.timeout_seconds
    }
}

fn env_parse<T: FromStr>(name: &str, default: T) -> Result<T, AppError> {
    match env::var(name) {
        Ok(v) => v
            .trim()
            .parse()
            .map_err(|_| AppError::Configuration(format!("{} must be a valid number", name))),
        Err(_) => Ok(default),
    }
}
