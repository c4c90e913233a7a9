use super::parsing::{
    env_optional, env_or_default, parse_bool, parse_cors_origins, parse_environment, parse_u16,
    parse_u32, parse_usize, parse_utc_offset,
};
use super::secret::load_or_create_secret_key;
use super::types::{
    ApiSettings, ConfigError, CorsSettings, DatabaseSettings, ExamSettings, RuntimeSettings,
    SecuritySettings, ServerHost, ServerPort, ServerSettings, Settings, TelemetrySettings,
};

const DEFAULT_SNAPSHOT_MAX_BYTES: &str = "5242880";

impl Settings {
    pub(crate) fn load() -> Result<Self, ConfigError> {
        let host = env_or_default("LANEXAM_HOST", "0.0.0.0");
        let port = env_or_default("LANEXAM_PORT", "8000");

        let environment =
            parse_environment(env_optional("LANEXAM_ENV").or_else(|| env_optional("ENVIRONMENT")));
        let strict_config =
            env_optional("LANEXAM_STRICT_CONFIG").map(|value| parse_bool(&value)).unwrap_or(false)
                || environment.is_production();

        let project_name = env_or_default("PROJECT_NAME", "LAN Exam API");
        let version = env_or_default("VERSION", env!("CARGO_PKG_VERSION"));
        let api_prefix = env_or_default("API_PREFIX", "/api");

        let secret_key = match env_optional("SECRET_KEY") {
            Some(value) => value,
            None => load_or_create_secret_key(),
        };
        let algorithm = env_or_default("ALGORITHM", "HS256");

        let cors_origins = parse_cors_origins(env_optional("BACKEND_CORS_ORIGINS"))?;

        let postgres_server = env_or_default("POSTGRES_SERVER", "localhost");
        let postgres_port = parse_u16("POSTGRES_PORT", env_or_default("POSTGRES_PORT", "5432"))?;
        let postgres_user = env_or_default("POSTGRES_USER", "lanexam");
        let postgres_password = env_or_default("POSTGRES_PASSWORD", "");
        let postgres_db = env_or_default("POSTGRES_DB", "lanexam_db");
        let database_url = env_optional("DATABASE_URL");
        let max_connections = parse_u32(
            "DATABASE_MAX_CONNECTIONS",
            env_or_default("DATABASE_MAX_CONNECTIONS", "30"),
        )?;
        let acquire_timeout_secs = parse_u32(
            "DATABASE_ACQUIRE_TIMEOUT_SECS",
            env_or_default("DATABASE_ACQUIRE_TIMEOUT_SECS", "30"),
        )?;

        let utc_offset =
            parse_utc_offset("EXAM_UTC_OFFSET", env_or_default("EXAM_UTC_OFFSET", "+00:00"))?;
        let snapshot_max_bytes = parse_usize(
            "SNAPSHOT_MAX_BYTES",
            env_or_default("SNAPSHOT_MAX_BYTES", DEFAULT_SNAPSHOT_MAX_BYTES),
        )?;

        let log_level = env_or_default("LANEXAM_LOG_LEVEL", "info");
        let json = env_optional("LANEXAM_LOG_JSON").map(|value| parse_bool(&value)).unwrap_or(false);
        let prometheus_enabled =
            env_optional("PROMETHEUS_ENABLED").map(|value| parse_bool(&value)).unwrap_or(false);

        let settings = Self {
            server: ServerSettings {
                host: ServerHost::parse(host)?,
                port: ServerPort::parse(port)?,
            },
            runtime: RuntimeSettings { environment, strict_config },
            api: ApiSettings { project_name, version, api_prefix },
            security: SecuritySettings { secret_key, algorithm },
            cors: CorsSettings { origins: cors_origins },
            database: DatabaseSettings {
                postgres_server,
                postgres_port,
                postgres_user,
                postgres_password,
                postgres_db,
                database_url,
                max_connections,
                acquire_timeout_secs,
            },
            exam: ExamSettings { utc_offset, snapshot_max_bytes },
            telemetry: TelemetrySettings { log_level, json, prometheus_enabled },
        };

        settings.validate()?;
        Ok(settings)
    }

    pub(crate) fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host.0, self.server.port.0)
    }

    pub(crate) fn api(&self) -> &ApiSettings {
        &self.api
    }

    pub(crate) fn security(&self) -> &SecuritySettings {
        &self.security
    }

    pub(crate) fn cors(&self) -> &CorsSettings {
        &self.cors
    }

    pub(crate) fn database(&self) -> &DatabaseSettings {
        &self.database
    }

    pub(crate) fn exam(&self) -> &ExamSettings {
        &self.exam
    }

    pub(crate) fn telemetry(&self) -> &TelemetrySettings {
        &self.telemetry
    }

    pub(crate) fn runtime(&self) -> &RuntimeSettings {
        &self.runtime
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !self.api.api_prefix.starts_with('/') {
            return Err(ConfigError::InvalidValue {
                field: "API_PREFIX",
                value: self.api.api_prefix.clone(),
            });
        }

        if self.security.algorithm != "HS256" {
            return Err(ConfigError::InvalidValue {
                field: "ALGORITHM",
                value: self.security.algorithm.clone(),
            });
        }

        if self.database.max_connections == 0 {
            return Err(ConfigError::InvalidValue {
                field: "DATABASE_MAX_CONNECTIONS",
                value: "0".to_string(),
            });
        }

        if !self.runtime.strict_config {
            return Ok(());
        }

        if self.database.database_url.is_none() && self.database.postgres_password.is_empty() {
            return Err(ConfigError::MissingSecret("POSTGRES_PASSWORD"));
        }
        if env_optional("SECRET_KEY").is_none() {
            return Err(ConfigError::MissingSecret("SECRET_KEY"));
        }

        Ok(())
    }
}

#[cfg(test)]
impl Settings {
    /// Deterministic settings that never touch the environment.
    pub(crate) fn for_tests() -> Self {
        use super::types::Environment;

        Self {
            server: ServerSettings {
                host: ServerHost("127.0.0.1".to_string()),
                port: ServerPort(8000),
            },
            runtime: RuntimeSettings { environment: Environment::Test, strict_config: false },
            api: ApiSettings {
                project_name: "LAN Exam API".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                api_prefix: "/api".to_string(),
            },
            security: SecuritySettings {
                secret_key: "test-secret".to_string(),
                algorithm: "HS256".to_string(),
            },
            cors: CorsSettings { origins: vec!["http://localhost:5173".to_string()] },
            database: DatabaseSettings {
                postgres_server: "localhost".to_string(),
                postgres_port: 5432,
                postgres_user: "lanexam".to_string(),
                postgres_password: String::new(),
                postgres_db: "lanexam_test".to_string(),
                database_url: std::env::var("LANEXAM_TEST_DATABASE_URL").ok(),
                max_connections: 5,
                acquire_timeout_secs: 5,
            },
            exam: ExamSettings {
                utc_offset: time::UtcOffset::UTC,
                snapshot_max_bytes: 5 * 1024 * 1024,
            },
            telemetry: TelemetrySettings {
                log_level: "info".to_string(),
                json: false,
                prometheus_enabled: false,
            },
        }
    }

    pub(crate) fn with_snapshot_limit(mut self, bytes: usize) -> Self {
        self.exam.snapshot_max_bytes = bytes;
        self
    }

    pub(crate) fn with_utc_offset(mut self, offset: time::UtcOffset) -> Self {
        self.exam.utc_offset = offset;
        self
    }

    pub(crate) fn with_prometheus(mut self) -> Self {
        self.telemetry.prometheus_enabled = true;
        self
    }
}
