use std::time::Duration;
use secrecy::{ExposeSecret, Secret};
use serde_aux::field_attributes::deserialize_number_from_string;

#[derive(serde::Deserialize, Clone)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub email_client: EmailClientSettings,
    pub environment: Environment,
}

#[derive(serde::Deserialize, Clone)]
pub struct ApplicationSettings {
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
    pub host: String,
}

/// Mail transport settings.
///
/// Every transport field is optional on purpose: a deployment without SMTP
/// credentials still serves the contact route, it only answers with a
/// configuration error until the missing values are provided.
/// The password is kept in a [`Secret`] so it never ends up in a log line.
#[derive(serde::Deserialize, Clone)]
pub struct EmailClientSettings {
    #[serde(default)]
    pub host: Option<String>,
    #[serde(deserialize_with = "deserialize_number_from_string", default = "default_smtp_port")]
    pub port: u16,
    #[serde(default)]
    pub secure: bool,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<Secret<String>>,
    /// Recipient of the owner notification, falls back to `username`
    #[serde(default)]
    pub contact_email: Option<String>,
    pub sender_name: String,
    pub signature_name: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub timeout_milliseconds: u64,
}

/// Validated view over [`EmailClientSettings`], only obtainable when host, user
/// and credential are all present.
#[derive(Debug)]
pub struct SmtpSettings<'a> {
    pub host: &'a str,
    pub port: u16,
    pub secure: bool,
    pub username: &'a str,
    pub password: &'a Secret<String>,
    pub timeout: Duration,
}

fn default_smtp_port() -> u16 {
    587
}

// Empty or whitespace-only values count as absent, the same as unset variables
fn present(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

impl EmailClientSettings {
    /// Names of the required transport settings which are absent.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if present(&self.host).is_none() {
            missing.push("host");
        }
        if present(&self.username).is_none() {
            missing.push("username");
        }
        let has_password = self
            .password
            .as_ref()
            .map_or(false, |p| !p.expose_secret().trim().is_empty());
        if !has_password {
            missing.push("password");
        }
        missing
    }

    pub fn smtp(&self) -> Result<SmtpSettings<'_>, anyhow::Error> {
        let missing = self.missing_fields();
        match (present(&self.host), present(&self.username), self.password.as_ref()) {
            (Some(host), Some(username), Some(password)) if missing.is_empty() => {
                Ok(SmtpSettings {
                    host,
                    port: self.port,
                    secure: self.secure,
                    username,
                    password,
                    timeout: self.timeout(),
                })
            }
            _ => Err(anyhow::anyhow!("Missing SMTP settings: {}", missing.join(", "))),
        }
    }

    /// Address the owner notification is delivered to.
    pub fn contact_recipient(&self) -> Option<&str> {
        present(&self.contact_email).or_else(|| present(&self.username))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_milliseconds)
    }
}

/// The possible runtime environment for our application.
#[derive(serde::Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(try_from = "String")]
pub enum Environment {
    Local,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Production => "production",
        }
    }

    /// Diagnostic details of failed dispatches are only returned to callers
    /// outside production.
    pub fn exposes_error_details(&self) -> bool {
        *self != Environment::Production
    }
}

impl TryFrom<String> for Environment {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "local" | "development" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            other => Err(format!(
                "{} is not a supported environment. Use either `local` or `production`.",
                other
            )),
        }
    }
}

/// Conventional mail variables of the hosting platform, mapped onto our keys.
const SMTP_ENVIRONMENT: [(&str, &str); 4] = [
    ("SMTP_HOST", "email_client.host"),
    ("SMTP_USER", "email_client.username"),
    ("SMTP_PASS", "email_client.password"),
    ("CONTACT_EMAIL", "email_client.contact_email"),
];

pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    let mut settings = config::Config::default();
    let base_path = std::env::current_dir()
        .map_err(|e| config::ConfigError::Message(format!("Failed to determine the current directory: {}", e)))?;
    let configuration_directory = base_path.join("configuration");

    // Read the "default" configuration file
    settings.merge(config::File::from(configuration_directory.join("base")).required(true))?;

    // Detect the running environment, default to `local` if unspecified
    let environment: Environment = std::env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "local".into())
        .try_into()
        .map_err(config::ConfigError::Message)?;

    // Layer on the environment-specific values
    settings.merge(
        config::File::from(configuration_directory.join(environment.as_str())).required(true)
    )?;

    // Add in settings from environment variables (with a prefix of APP and '__' as separator)
    // E.g. `APP_APPLICATION__PORT=5001 would set `Settings.application.port`
    settings.merge(config::Environment::with_prefix("app").separator("__"))?;

    merge_smtp_environment(&mut settings)?;
    settings.set("environment", environment.as_str())?;

    settings.try_into()
}

fn merge_smtp_environment(settings: &mut config::Config) -> Result<(), config::ConfigError> {
    for (variable, key) in SMTP_ENVIRONMENT {
        if let Ok(value) = std::env::var(variable) {
            settings.set(key, value)?;
        }
    }
    // Unparsable ports keep the configured default
    if let Some(port) = std::env::var("SMTP_PORT").ok().and_then(|p| p.trim().parse::<u16>().ok()) {
        settings.set("email_client.port", i64::from(port))?;
    }
    if let Ok(secure) = std::env::var("SMTP_SECURE") {
        settings.set("email_client.secure", secure == "true")?;
    }
    Ok(())
}
