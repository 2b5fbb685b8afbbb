use anyhow::{Context, Result};
use std::env;
use zeroize::Zeroizing;

/// Credentials for the external image hosting service.
#[derive(Clone)]
pub struct CloudinaryConfig {
    /// The cloud name identifying the upload endpoint.
    pub cloud_name: String,
    /// The API key sent with every upload.
    pub api_key: String,
    /// The API secret used to sign uploads.
    pub api_secret: Zeroizing<String>,
}

/// The application's configuration.
#[derive(Clone)]
pub struct Config {
    /// The URL of the PostgreSQL database.
    pub database_url: String,
    /// The secret used to sign session tokens.
    pub jwt_secret: Zeroizing<String>,
    /// The frontend origin allowed by CORS.
    pub frontend_origin: String,
    /// The hostname to bind to.
    pub hostname: String,
    /// The port to bind to.
    pub port: u16,
    /// Whether the server runs with production cookie/error hardening.
    pub production: bool,
    /// Image hosting credentials.
    pub cloudinary: CloudinaryConfig,
}

impl Config {
    /// Creates a new `Config` from environment variables.
    pub fn from_env() -> Result<Self> {
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET must be set")?;
        if jwt_secret.is_empty() {
            anyhow::bail!("JWT_SECRET must not be empty");
        }

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            jwt_secret: Zeroizing::new(jwt_secret),
            frontend_origin: env::var("FRONTEND_BASEURL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            hostname: env::var("SERVER_HOSTNAME").unwrap_or_else(|_| "localhost".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "5000".to_string())
                .parse()
                .context("Invalid PORT")?,
            production: env::var("APP_ENV").unwrap_or_else(|_| "development".to_string())
                == "production",
            cloudinary: CloudinaryConfig {
                cloud_name: env::var("CLOUDINARY_CLOUD_NAME").unwrap_or_default(),
                api_key: env::var("CLOUDINARY_API_KEY").unwrap_or_default(),
                api_secret: Zeroizing::new(env::var("CLOUDINARY_API_SECRET").unwrap_or_default()),
            },
        })
    }
}
