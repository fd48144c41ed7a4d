use crate::cnpj;
use crate::config::Config;
use crate::errors::AuditError;
use crate::models::*;
use async_trait::async_trait;
use moka::future::Cache;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::Duration;

/// Business-directory collaborator contract.
///
/// Either lookup may fail with a transient-unavailable condition
/// (`AuditError::ExternalApi`), which callers treat as "no record
/// resolved", not a hard error.
#[async_trait]
pub trait DirectoryLookup: Send + Sync {
    /// Resolves a listing by its opaque directory identifier.
    async fn resolve_by_id(&self, place_id: &str) -> Result<Option<MerchantRecord>, AuditError>;

    /// Resolves the single most relevant listing for a free-text query.
    async fn resolve_by_query(&self, query: &str) -> Result<Option<MerchantRecord>, AuditError>;
}

/// Company-registry collaborator contract.
#[async_trait]
pub trait RegistryLookup: Send + Sync {
    /// Fetches the registration record for a CNPJ. Invalid format, unknown
    /// identifiers and upstream unavailability all resolve to `Ok(None)`.
    async fn fetch(&self, cnpj: &str) -> Result<Option<RegistryRecord>, AuditError>;
}

// ============ Places Directory Client ============

pub struct PlacesService {
    client: Client,
    base_url: String,
    api_key: String,
}

impl PlacesService {
    pub fn new(config: &Config) -> Self {
        Self {
            client: Client::new(),
            base_url: config.directory_base_url.clone(),
            api_key: config.directory_api_key.clone(),
        }
    }

    async fn fetch_details(&self, place_id: &str) -> Result<Option<MerchantRecord>, AuditError> {
        // Build URL with proper parameter encoding
        let url = reqwest::Url::parse_with_params(
            &format!("{}/details/json", self.base_url),
            &[
                ("place_id", place_id),
                (
                    "fields",
                    "place_id,name,formatted_address,formatted_phone_number,website,rating,\
                     user_ratings_total,business_status,types,geometry,price_level,photos",
                ),
                ("key", self.api_key.as_str()),
            ],
        )
        .map_err(|e| AuditError::ExternalApi(format!("Failed to build URL: {}", e)))?;

        tracing::debug!("Fetching directory details for place_id: {}", place_id);

        let response = self
            .client
            .get(url)
            .timeout(Duration::from_secs(10))
            .send()
            .await
            .map_err(|e| {
                AuditError::ExternalApi(format!("Directory details request failed: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(AuditError::ExternalApi(format!(
                "Directory API returned status {}",
                status
            )));
        }

        let body: Value = response.json().await.map_err(|e| {
            AuditError::ExternalApi(format!("Failed to parse directory response: {}", e))
        })?;

        Ok(body.get("result").and_then(parse_merchant))
    }
}

#[async_trait]
impl DirectoryLookup for PlacesService {
    async fn resolve_by_id(&self, place_id: &str) -> Result<Option<MerchantRecord>, AuditError> {
        self.fetch_details(place_id).await
    }

    async fn resolve_by_query(&self, query: &str) -> Result<Option<MerchantRecord>, AuditError> {
        let url = reqwest::Url::parse_with_params(
            &format!("{}/textsearch/json", self.base_url),
            &[
                ("query", query),
                ("type", "establishment"),
                ("key", self.api_key.as_str()),
            ],
        )
        .map_err(|e| AuditError::ExternalApi(format!("Failed to build URL: {}", e)))?;

        tracing::debug!("Searching directory for: {}", query);

        let response = self
            .client
            .get(url)
            .timeout(Duration::from_secs(10))
            .send()
            .await
            .map_err(|e| {
                AuditError::ExternalApi(format!("Directory search request failed: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(AuditError::ExternalApi(format!(
                "Directory API returned status {}",
                status
            )));
        }

        let body: Value = response.json().await.map_err(|e| {
            AuditError::ExternalApi(format!("Failed to parse directory response: {}", e))
        })?;

        // Take the first (most relevant) search result and fetch its details.
        let place_id = body
            .get("results")
            .and_then(Value::as_array)
            .and_then(|results| results.first())
            .and_then(|place| place.get("place_id"))
            .and_then(Value::as_str)
            .map(String::from);

        match place_id {
            Some(place_id) => self.fetch_details(&place_id).await,
            None => {
                tracing::debug!("Directory search returned no results for: {}", query);
                Ok(None)
            }
        }
    }
}

/// Maps a directory details payload onto a `MerchantRecord`.
/// Returns `None` when the payload has no usable identifier.
fn parse_merchant(result: &Value) -> Option<MerchantRecord> {
    let place_id = result.get("place_id").and_then(Value::as_str)?.to_string();

    let location = result
        .get("geometry")
        .and_then(|g| g.get("location"))
        .map(|location| GeoPoint {
            lat: location.get("lat").and_then(Value::as_f64).unwrap_or(0.0),
            lng: location.get("lng").and_then(Value::as_f64).unwrap_or(0.0),
        })
        .unwrap_or(GeoPoint { lat: 0.0, lng: 0.0 });

    let types = result
        .get("types")
        .and_then(Value::as_array)
        .map(|types| {
            types
                .iter()
                .filter_map(Value::as_str)
                .map(String::from)
                .collect()
        })
        .unwrap_or_default();

    let photos = result
        .get("photos")
        .and_then(Value::as_array)
        .map(|photos| {
            photos
                .iter()
                .take(3)
                .filter_map(|photo| photo.get("photo_reference").and_then(Value::as_str))
                .map(String::from)
                .collect()
        })
        .unwrap_or_default();

    Some(MerchantRecord {
        place_id,
        name: result
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string(),
        address: result
            .get("formatted_address")
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string(),
        phone: non_empty(result, "formatted_phone_number"),
        website: non_empty(result, "website"),
        rating: result.get("rating").and_then(Value::as_f64),
        user_ratings_total: result
            .get("user_ratings_total")
            .and_then(Value::as_u64)
            .map(|total| total as u32),
        business_status: BusinessStatus::from_provider(
            result.get("business_status").and_then(Value::as_str),
        ),
        types,
        location,
        price_level: result
            .get("price_level")
            .and_then(Value::as_u64)
            .map(|level| level as u8),
        photos,
    })
}

// ============ Company Registry Client ============

pub struct RegistryService {
    client: Client,
    base_url: String,
    /// Successful lookups are cached to reduce external API calls; the
    /// registry rate-limits aggressively.
    cache: Cache<String, RegistryRecord>,
}

impl RegistryService {
    pub fn new(config: &Config) -> Self {
        Self {
            client: Client::new(),
            base_url: config.registry_base_url.clone(),
            cache: Cache::builder()
                .time_to_live(Duration::from_secs(config.registry_cache_ttl_secs))
                .max_capacity(10_000)
                .build(),
        }
    }
}

#[async_trait]
impl RegistryLookup for RegistryService {
    async fn fetch(&self, cnpj: &str) -> Result<Option<RegistryRecord>, AuditError> {
        let cleaned = cnpj::clean(cnpj);
        if !cnpj::is_valid_format(&cleaned) {
            tracing::warn!("Invalid CNPJ format: {}", cnpj);
            return Ok(None);
        }

        if let Some(cached) = self.cache.get(&cleaned).await {
            tracing::debug!("Registry cache HIT for CNPJ: {}", cleaned);
            return Ok(Some(cached));
        }

        let url = format!("{}/{}", self.base_url, cleaned);
        tracing::info!("Fetching registry record for CNPJ: {}", cleaned);

        let response = match self
            .client
            .get(&url)
            .timeout(Duration::from_secs(10))
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::error!("Registry request failed for {}: {}", cleaned, e);
                return Ok(None);
            }
        };

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            tracing::warn!("Registry API rate limit exceeded for {}", cleaned);
            return Ok(None);
        }
        if !status.is_success() {
            tracing::error!("Registry API returned status {} for {}", status, cleaned);
            return Ok(None);
        }

        let body: Value = match response.json().await {
            Ok(body) => body,
            Err(e) => {
                tracing::error!("Failed to parse registry response for {}: {}", cleaned, e);
                return Ok(None);
            }
        };

        if body.get("status").and_then(Value::as_str) == Some("ERROR") {
            tracing::warn!(
                "Registry API error for {}: {}",
                cleaned,
                body.get("message").and_then(Value::as_str).unwrap_or("")
            );
            return Ok(None);
        }

        let record = parse_registry_record(&body);
        self.cache.insert(cleaned, record.clone()).await;
        Ok(Some(record))
    }
}

/// Maps a registry payload onto a `RegistryRecord`.
fn parse_registry_record(body: &Value) -> RegistryRecord {
    let main_activity = body
        .get("atividade_principal")
        .and_then(Value::as_array)
        .and_then(|activities| activities.first())
        .and_then(|activity| activity.get("text"))
        .and_then(Value::as_str)
        .filter(|text| !text.is_empty())
        .map(String::from);

    let secondary_activities = body
        .get("atividades_secundarias")
        .and_then(Value::as_array)
        .map(|activities| {
            activities
                .iter()
                .filter_map(|activity| activity.get("text").and_then(Value::as_str))
                .map(String::from)
                .collect()
        })
        .unwrap_or_default();

    let partners = body
        .get("qsa")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    RegistryRecord {
        cnpj: body
            .get("cnpj")
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string(),
        company_name: body
            .get("nome")
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string(),
        trade_name: non_empty(body, "fantasia"),
        legal_nature: non_empty(body, "natureza_juridica"),
        main_activity,
        secondary_activities,
        registration_status: non_empty(body, "situacao"),
        registration_date: non_empty(body, "abertura"),
        address: RegistryAddress {
            street: non_empty(body, "logradouro"),
            number: non_empty(body, "numero"),
            complement: non_empty(body, "complemento"),
            neighborhood: non_empty(body, "bairro"),
            city: non_empty(body, "municipio"),
            state: non_empty(body, "uf"),
            zip_code: non_empty(body, "cep"),
        },
        phone: non_empty(body, "telefone"),
        email: non_empty(body, "email"),
        share_capital: non_empty(body, "capital_social"),
        company_size: non_empty(body, "porte"),
        partners,
    }
}

/// Extracts a string field, treating empty strings as absent.
fn non_empty(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(String::from)
}
