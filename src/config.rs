use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub directory_base_url: String,
    pub directory_api_key: String,
    pub registry_base_url: String,
    pub registry_cache_ttl_secs: u64,
    pub batch_item_delay_ms: u64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            directory_base_url: std::env::var("DIRECTORY_BASE_URL")
                .unwrap_or_else(|_| "https://maps.googleapis.com/maps/api/place".to_string())
                .trim_end_matches('/')
                .to_string(),
            directory_api_key: std::env::var("DIRECTORY_API_KEY")
                .map_err(|_| anyhow::anyhow!("DIRECTORY_API_KEY environment variable required"))
                .and_then(|key| {
                    if key.trim().is_empty() {
                        anyhow::bail!("DIRECTORY_API_KEY cannot be empty");
                    }
                    Ok(key)
                })?,
            registry_base_url: std::env::var("REGISTRY_BASE_URL")
                .unwrap_or_else(|_| "https://www.receitaws.com.br/v1/cnpj".to_string())
                .trim_end_matches('/')
                .to_string(),
            registry_cache_ttl_secs: std::env::var("REGISTRY_CACHE_TTL_SECS")
                .unwrap_or_else(|_| "3600".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("REGISTRY_CACHE_TTL_SECS must be a valid number"))?,
            batch_item_delay_ms: std::env::var("BATCH_ITEM_DELAY_MS")
                .unwrap_or_else(|_| "100".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("BATCH_ITEM_DELAY_MS must be a valid number"))?,
        };

        if !config.directory_base_url.starts_with("http://")
            && !config.directory_base_url.starts_with("https://")
        {
            anyhow::bail!("DIRECTORY_BASE_URL must start with http:// or https://");
        }
        if !config.registry_base_url.starts_with("http://")
            && !config.registry_base_url.starts_with("https://")
        {
            anyhow::bail!("REGISTRY_BASE_URL must start with http:// or https://");
        }

        // Log successful configuration load (without sensitive values)
        tracing::info!("Configuration loaded successfully");
        tracing::debug!("Directory Base URL: {}", config.directory_base_url);
        tracing::debug!("Registry Base URL: {}", config.registry_base_url);
        tracing::debug!("Batch item delay: {}ms", config.batch_item_delay_ms);

        Ok(config)
    }
}
