use std::env;

/// Runtime configuration describing how to connect to CouchDB.
#[derive(Debug, Clone)]
pub struct CouchConfig {
    pub base_url: String,
    pub database: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Database name used when `COUCH_DB` is not set.
const DEFAULT_DATABASE: &str = "quiz";

impl CouchConfig {
    /// Construct a configuration from explicit base URL and database name.
    pub fn new(base_url: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            database: database.into(),
            username: None,
            password: None,
        }
    }

    /// Attach basic-auth credentials to the configuration.
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Build a configuration from the environment, or `None` when the
    /// endpoint variable is absent (which selects the in-memory backend).
    pub fn from_env() -> Option<Self> {
        let base_url = env::var("COUCH_BASE_URL").ok().filter(|v| !v.is_empty())?;
        let database = env::var("COUCH_DB").unwrap_or_else(|_| DEFAULT_DATABASE.into());

        let mut config = Self::new(base_url, database);

        if let (Some(username), Some(password)) = (
            env::var("COUCH_USERNAME").ok(),
            env::var("COUCH_PASSWORD").ok(),
        ) {
            config = config.with_credentials(username, password);
        }

        Some(config)
    }
}
