/// Forum API configuration, loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection string.
    pub database_url: String,
    /// Redis connection string for the shared session store. When unset,
    /// sessions live in process memory.
    pub redis_url: Option<String>,
    /// Maximum number of pooled database connections.
    pub db_pool_size: usize,
    /// Port the HTTP server binds to.
    pub port: u16,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Panics with a descriptive message if a required variable is missing.
    pub fn from_env() -> Self {
        Self {
            database_url: required_var("DATABASE_URL"),
            redis_url: std::env::var("REDIS_URL").ok().filter(|s| !s.is_empty()),
            db_pool_size: parsed_var("DB_POOL_SIZE").unwrap_or(20),
            port: parsed_var("PORT").unwrap_or(4000),
        }
    }
}

fn required_var(name: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| panic!("{name} env var is required"))
}

fn parsed_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}

/// Point a database URL at its `_test` sibling database.
///
/// `postgres://u:p@host/forum?sslmode=disable` becomes
/// `postgres://u:p@host/forum_test?sslmode=disable`. URLs already naming a
/// `_test` database are returned unchanged.
pub fn with_test_db_suffix(database_url: &str) -> String {
    let (base, query) = match database_url.split_once('?') {
        Some((base, query)) => (base, Some(query)),
        None => (database_url, None),
    };

    let Some((prefix, db_name)) = base.rsplit_once('/') else {
        return database_url.to_string();
    };

    if db_name.is_empty() || db_name.ends_with("_test") {
        return database_url.to_string();
    }

    let mut updated = format!("{prefix}/{db_name}_test");
    if let Some(query) = query {
        updated.push('?');
        updated.push_str(query);
    }
    updated
}
