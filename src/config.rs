use std::{net::IpAddr, path::PathBuf, str::FromStr};

use tracing::level_filters::LevelFilter;

const DEFAULT_PUBLIC_URL: &str = "http://localhost:3001";
const DEFAULT_COMPLETION_BASE_URL: &str = "https://ark.cn-beijing.volces.com/api/v3";
const DEFAULT_COMPLETION_MODEL: &str = "ep-20250513000008-6hjfc";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
	#[error("{key} has an invalid value {value:?}")]
	Invalid { key: &'static str, value: String },
}

/// Where and how the storage backend is reached.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DatabaseConfig {
	Memory,
	Mongo { url: String, database: String },
}

/// Settings for the OpenAI-compatible chat completions provider.
#[derive(Clone, Debug)]
pub struct CompletionConfig {
	pub base_url: String,
	pub api_key: Option<String>,
	pub model: String,
}

/// Settings for uploaded media.
#[derive(Clone, Debug)]
pub struct MediaConfig {
	pub root: PathBuf,
	/// Prefix of the URLs returned for uploaded files.
	pub public_url: String,
	pub image_max_width: u32,
	pub image_quality: f32,
	pub max_upload_bytes: usize,
}

/// A moderator account created at startup by the memory backend.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AdminSeed {
	pub username: String,
	pub password: String,
}

#[derive(Clone, Debug)]
pub struct Config {
	pub host: IpAddr,
	pub port: u16,
	pub database: DatabaseConfig,
	pub media: MediaConfig,
	pub completion: CompletionConfig,
	pub admin: Option<AdminSeed>,
	pub log_level: LevelFilter,
	pub otlp_endpoint: Option<String>,
}

impl Config {
	/// Reads the configuration from the process environment.
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::from_lookup(|key| std::env::var(key).ok())
	}

	/// Reads the configuration through `lookup`, which returns the value of a variable if set.
	pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

		let database_url = var("DATABASE_URL").unwrap_or_else(|| "memory://".into());
		let database = if database_url.starts_with("memory:") {
			DatabaseConfig::Memory
		} else {
			DatabaseConfig::Mongo {
				url: database_url,
				database: var("DATABASE_NAME").unwrap_or_else(|| "travel_notes".into()),
			}
		};

		let image_quality = parse(&var, "IMAGE_QUALITY", 70.0_f32)?;
		if !(0.0..=100.0).contains(&image_quality) {
			return Err(ConfigError::Invalid {
				key: "IMAGE_QUALITY",
				value: image_quality.to_string(),
			});
		}

		let admin = match (var("ADMIN_USERNAME"), var("ADMIN_PASSWORD")) {
			(Some(username), Some(password)) => Some(AdminSeed { username, password }),
			(Some(username), None) => {
				return Err(ConfigError::Invalid {
					key: "ADMIN_PASSWORD",
					value: format!("unset for moderator {username}"),
				})
			}
			(None, _) => None,
		};

		Ok(Self {
			host: parse(&var, "HOST", IpAddr::from([127, 0, 0, 1]))?,
			port: parse(&var, "PORT", 3001)?,
			database,
			media: MediaConfig {
				root: var("MEDIA_ROOT").map_or_else(|| PathBuf::from("."), PathBuf::from),
				public_url: var("PUBLIC_URL")
					.unwrap_or_else(|| DEFAULT_PUBLIC_URL.into())
					.trim_end_matches('/')
					.to_owned(),
				image_max_width: parse(&var, "IMAGE_MAX_WIDTH", 400)?,
				image_quality,
				max_upload_bytes: parse(&var, "MAX_UPLOAD_BYTES", 100 * 1024 * 1024)?,
			},
			completion: CompletionConfig {
				base_url: var("COMPLETION_BASE_URL")
					.unwrap_or_else(|| DEFAULT_COMPLETION_BASE_URL.into())
					.trim_end_matches('/')
					.to_owned(),
				api_key: var("COMPLETION_API_KEY").or_else(|| var("ARK_API_KEY")),
				model: var("COMPLETION_MODEL").unwrap_or_else(|| DEFAULT_COMPLETION_MODEL.into()),
			},
			admin,
			log_level: parse(&var, "LOG_LEVEL", LevelFilter::INFO)?,
			otlp_endpoint: var("OTLP_ENDPOINT"),
		})
	}
}

fn parse<T, F>(var: F, key: &'static str, default: T) -> Result<T, ConfigError>
where
	T: FromStr,
	F: Fn(&str) -> Option<String>,
{
	match var(key) {
		Some(value) => value
			.trim()
			.parse()
			.map_err(|_| ConfigError::Invalid { key, value }),
		None => Ok(default),
	}
}

#[cfg(test)]
mod test {
	use std::collections::HashMap;

	use super::*;

	fn config(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
		let vars = vars
			.iter()
			.map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
			.collect::<HashMap<_, _>>();

		Config::from_lookup(|key| vars.get(key).cloned())
	}

	#[test]
	fn test_defaults() {
		let config = config(&[]).unwrap();

		assert_eq!(config.port, 3001);
		assert_eq!(config.database, DatabaseConfig::Memory);
		assert_eq!(config.media.public_url, "http://localhost:3001");
		assert_eq!(config.media.image_max_width, 400);
		assert!(config.completion.api_key.is_none());
		assert!(config.admin.is_none());
		assert_eq!(config.log_level, LevelFilter::INFO);
	}

	#[test]
	fn test_mongo_and_provider_settings() {
		let config = config(&[
			("DATABASE_URL", "mongodb://localhost:27017"),
			("PUBLIC_URL", "https://notes.example.com/"),
			("ARK_API_KEY", "secret"),
			("LOG_LEVEL", "debug"),
		])
		.unwrap();

		assert_eq!(
			config.database,
			DatabaseConfig::Mongo {
				url: "mongodb://localhost:27017".into(),
				database: "travel_notes".into(),
			}
		);
		assert_eq!(config.media.public_url, "https://notes.example.com");
		assert_eq!(config.completion.api_key.as_deref(), Some("secret"));
		assert_eq!(config.log_level, LevelFilter::DEBUG);
	}

	#[test]
	fn test_admin_seed() {
		let seeded = config(&[("ADMIN_USERNAME", "root"), ("ADMIN_PASSWORD", "secret")]).unwrap();

		assert_eq!(
			seeded.admin,
			Some(AdminSeed {
				username: "root".into(),
				password: "secret".into(),
			})
		);

		let error = config(&[("ADMIN_USERNAME", "root")]).unwrap_err();
		assert!(error.to_string().contains("ADMIN_PASSWORD"));
	}

	#[test]
	fn test_invalid_values() {
		let error = config(&[("PORT", "eighty")]).unwrap_err();
		assert!(error.to_string().contains("PORT"));

		assert!(config(&[("IMAGE_QUALITY", "120")]).is_err());
	}
}
