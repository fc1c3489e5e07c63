use std::env;

#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub classifier_url: String,
    pub max_upload_bytes: usize,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if it exists (for development)
        dotenvy::dotenv().ok();

        let port = env::var("PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid PORT value: {}", e))?;

        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite:./emotion_predictions.db".to_string());

        let classifier_url = env::var("CLASSIFIER_URL")
            .unwrap_or_else(|_| "http://localhost:5000/predict".to_string());

        let max_upload_bytes = env::var("MAX_UPLOAD_BYTES")
            .unwrap_or_else(|_| (10 * 1024 * 1024).to_string())
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid MAX_UPLOAD_BYTES value: {}", e))?;

        Ok(Config {
            port,
            database_url,
            classifier_url,
            max_upload_bytes,
        })
    }

    /// Filesystem path of the database, without the `sqlite:` scheme.
    pub fn database_path(&self) -> &str {
        self.database_url
            .strip_prefix("sqlite:")
            .unwrap_or(&self.database_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(database_url: &str) -> Config {
        Config {
            port: 8080,
            database_url: database_url.to_string(),
            classifier_url: "http://localhost:5000/predict".to_string(),
            max_upload_bytes: 1024,
        }
    }

    #[test]
    fn database_path_strips_scheme() {
        assert_eq!(
            config("sqlite:./data/predictions.db").database_path(),
            "./data/predictions.db"
        );
    }

    #[test]
    fn database_path_without_scheme_is_unchanged() {
        assert_eq!(config("predictions.db").database_path(), "predictions.db");
    }
}
