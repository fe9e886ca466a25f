use std::{env, sync::Arc};

#[derive(Clone, Debug)]
/// Configuration struct for the server.
///
/// Holds everything needed to run the gating service: database connection,
/// Supabase token validation, server binding, CORS, logging, trial length
/// and Stripe settings.
pub struct Config {
    // environment
    pub environment: String, // development or production
    /// The URL of the account database to connect to.
    pub database_url: String,
    /// Configuration for validating Supabase access tokens.
    pub jwt_config: JwtConfig,
    /// The hostname or IP address the server will bind to.
    pub server_host: String,
    /// The port number the server will listen on.
    pub server_port: u16,
    /// The number of worker threads to spawn for handling requests.
    pub num_workers: usize,
    /// The allowed origin for CORS (Cross-Origin Resource Sharing).
    pub cors_allowed_origin: String,
    /// A boolean indicating whether console logging is enabled.
    pub console_logging_enabled: bool,
    /// File the logger mirrors console output to.
    pub log_file: String,
    /// Length of the free trial in days.
    pub trial_length_days: i64,
    /// Minutes without a request before a gate session is dropped.
    pub session_idle_minutes: i64,
    /// How often idle sessions are swept, in seconds.
    pub session_sweep_secs: u64,
    /// Stripe secret key
    pub stripe_secret_key: String,
    /// Stripe webhook secret
    pub stripe_webhook_secret: String,
    /// Price the Upgrade action checks out
    pub stripe_price_id: String,
}

#[derive(Clone, Debug)]
/// Configuration for validating Supabase-issued JSON Web Tokens.
///
/// Supabase signs access tokens with the project's JWT secret (HS256) and
/// sets the audience to `authenticated` for signed-in users.
pub struct JwtConfig {
    /// The secret key used to verify JWTs.
    pub secret: String,
    /// Expected `aud` claim.
    pub audience: String,
}

impl JwtConfig {
    /// Creates a new `JwtConfig` instance from environment variables.
    ///
    /// - `SUPABASE_JWT_SECRET`: Required. The project's JWT secret.
    /// - `SUPABASE_JWT_AUDIENCE`: Optional. Defaults to `authenticated`.
    ///
    /// # Panics
    ///
    /// This function will panic if `SUPABASE_JWT_SECRET` is not set.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        JwtConfig {
            secret: env::var("SUPABASE_JWT_SECRET").expect("SUPABASE_JWT_SECRET must be set"),
            audience: env::var("SUPABASE_JWT_AUDIENCE")
                .unwrap_or_else(|_| "authenticated".to_string()),
        }
    }
}

impl Config {
    /// Creates a new `Config` instance from environment variables.
    ///
    /// # Environment Variables
    ///
    /// Required:
    /// - `ENVIRONMENT`: `development` or `production`
    /// - `DATABASE_URL`: Connection string for the account database
    /// - `SUPABASE_JWT_SECRET`: Secret for access token validation
    ///
    /// Optional (with defaults):
    /// - `IP`: Server host (default: "127.0.0.1")
    /// - `PORT`: Server port (default: 8080)
    /// - `WORKERS`: Number of worker threads (default: 4)
    /// - `CORS_ALLOWED_ORIGIN`: Allowed CORS origin (default: "http://localhost:3000")
    /// - `ENABLE_CONSOLE_LOGGING`: Whether to enable console logging (default: true)
    /// - `LOG_FILE`: Log file path (default: "gate.log")
    /// - `TRIAL_LENGTH_DAYS`: Trial window (default: 14)
    /// - `SESSION_IDLE_MINUTES`: Idle gate session lifetime (default: 120)
    /// - `SESSION_SWEEP_SECS`: Idle session sweep interval (default: 300)
    /// - `STRIPE_SECRET_KEY`, `STRIPE_WEBHOOK_SECRET`, `STRIPE_PRICE_ID`
    ///
    /// # Panics
    ///
    /// This function will panic if required environment variables are missing.
    pub fn from_env() -> Arc<Self> {
        dotenvy::dotenv().ok();

        Arc::new(Config {
            environment: env::var("ENVIRONMENT").expect("ENVIRONMENT must be set"),
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            jwt_config: JwtConfig::from_env(),
            server_host: env::var("IP").unwrap_or_else(|_| "127.0.0.1".to_string()),
            server_port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            num_workers: env::var("WORKERS")
                .unwrap_or_else(|_| "4".to_string())
                .parse()
                .unwrap_or(4),
            cors_allowed_origin: env::var("CORS_ALLOWED_ORIGIN")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            console_logging_enabled: env::var("ENABLE_CONSOLE_LOGGING")
                .unwrap_or_else(|_| "true".to_string())
                .to_lowercase()
                == "true",
            log_file: env::var("LOG_FILE").unwrap_or_else(|_| "gate.log".to_string()),
            trial_length_days: parse_trial_days(env::var("TRIAL_LENGTH_DAYS").ok().as_deref()),
            session_idle_minutes: env::var("SESSION_IDLE_MINUTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|minutes: &i64| *minutes > 0)
                .unwrap_or(120),
            session_sweep_secs: env::var("SESSION_SWEEP_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|secs: &u64| *secs > 0)
                .unwrap_or(300),
            stripe_secret_key: env::var("STRIPE_SECRET_KEY").unwrap_or_default(),
            stripe_webhook_secret: env::var("STRIPE_WEBHOOK_SECRET").unwrap_or_default(),
            stripe_price_id: env::var("STRIPE_PRICE_ID").unwrap_or_default(),
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

/// Trial length from `TRIAL_LENGTH_DAYS`. Missing, unparsable or negative
/// values fall back to 14.
fn parse_trial_days(raw: Option<&str>) -> i64 {
    raw.and_then(|v| v.trim().parse::<i64>().ok())
        .filter(|days| *days >= 0)
        .unwrap_or(14)
}
