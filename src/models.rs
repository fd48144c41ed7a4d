use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============ Directory Models ============

/// Operating status reported by the business directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BusinessStatus {
    /// The business is open and operating.
    Operational,
    /// The business is temporarily closed.
    ClosedTemporarily,
    /// The business is permanently closed.
    ClosedPermanently,
    /// The directory reported no usable status.
    Unknown,
}

impl BusinessStatus {
    /// Maps the directory provider's status string onto the enum.
    /// Anything unrecognized (or absent) becomes `Unknown`.
    pub fn from_provider(status: Option<&str>) -> Self {
        match status {
            Some("OPERATIONAL") => BusinessStatus::Operational,
            Some("CLOSED_TEMPORARILY") => BusinessStatus::ClosedTemporarily,
            Some("CLOSED_PERMANENTLY") => BusinessStatus::ClosedPermanently,
            _ => BusinessStatus::Unknown,
        }
    }
}

/// Geographic coordinate of a directory listing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude.
    pub lat: f64,
    /// Longitude.
    pub lng: f64,
}

/// Canonical business listing returned by the directory collaborator.
///
/// Read-only input to the risk engine; never mutated by the core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MerchantRecord {
    /// Opaque directory identifier.
    pub place_id: String,
    /// Display name.
    pub name: String,
    /// Formatted address.
    pub address: String,
    /// Phone number, if listed.
    pub phone: Option<String>,
    /// Website, if listed.
    pub website: Option<String>,
    /// Average customer rating.
    pub rating: Option<f64>,
    /// Total number of customer reviews.
    pub user_ratings_total: Option<u32>,
    /// Operating status.
    pub business_status: BusinessStatus,
    /// Category tags (e.g. "restaurant", "atm").
    pub types: Vec<String>,
    /// Geocoordinate of the listing.
    pub location: GeoPoint,
    /// Price tier (0-4), if reported.
    pub price_level: Option<u8>,
    /// Photo references (at most 3).
    pub photos: Vec<String>,
}

// ============ Registry Models ============

/// Postal address from a company-registry record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistryAddress {
    /// Street name.
    pub street: Option<String>,
    /// Street number.
    pub number: Option<String>,
    /// Complement (apartment, suite, etc.).
    pub complement: Option<String>,
    /// Neighborhood.
    pub neighborhood: Option<String>,
    /// City.
    pub city: Option<String>,
    /// State.
    pub state: Option<String>,
    /// Postal code (CEP).
    pub zip_code: Option<String>,
}

impl RegistryAddress {
    /// Assembles the registry address into a single comparable line.
    ///
    /// Segments are joined with " - "; an empty record yields an empty
    /// string, which callers must treat as "no address on file".
    pub fn full_address(&self) -> String {
        let mut parts: Vec<String> = Vec::new();

        if let Some(ref street) = self.street {
            let mut street_part = street.clone();
            if let Some(ref number) = self.number {
                street_part.push_str(&format!(", {}", number));
            }
            if let Some(ref complement) = self.complement {
                street_part.push_str(&format!(", {}", complement));
            }
            parts.push(street_part);
        }

        if let Some(ref neighborhood) = self.neighborhood {
            parts.push(neighborhood.clone());
        }

        if let Some(ref city) = self.city {
            let mut city_part = city.clone();
            if let Some(ref state) = self.state {
                city_part.push_str(&format!(", {}", state));
            }
            parts.push(city_part);
        }

        if let Some(ref zip_code) = self.zip_code {
            parts.push(format!("CEP: {}", zip_code));
        }

        parts.join(" - ")
    }
}

/// Canonical company-registration record keyed by CNPJ.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryRecord {
    /// CNPJ document number as reported by the registry.
    pub cnpj: String,
    /// Legal (registered) company name.
    pub company_name: String,
    /// Trade name (fantasy name).
    pub trade_name: Option<String>,
    /// Legal-nature code and description.
    pub legal_nature: Option<String>,
    /// Primary activity description.
    pub main_activity: Option<String>,
    /// Secondary activity descriptions.
    pub secondary_activities: Vec<String>,
    /// Registration status string (e.g. "ATIVA", "BAIXADA").
    pub registration_status: Option<String>,
    /// Registration date in the registry's dd/mm/YYYY format.
    pub registration_date: Option<String>,
    /// Registered postal address.
    pub address: RegistryAddress,
    /// Registered phone number.
    pub phone: Option<String>,
    /// Registered email.
    pub email: Option<String>,
    /// Share capital figure.
    pub share_capital: Option<String>,
    /// Company size class (e.g. "MEI", "ME", "DEMAIS").
    pub company_size: Option<String>,
    /// Partner list (dynamic JSON from the registry).
    pub partners: Vec<serde_json::Value>,
}

// ============ Comparison Models ============

/// Result of comparing a provided address against a reference address.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddressComparison {
    /// The address as provided in the request.
    pub provided_address: String,
    /// The reference address being compared against.
    pub reference_address: String,
    /// Sequence similarity, 0-100.
    pub similarity_score: f64,
    /// Whether the similarity clears the match threshold (80).
    pub is_match: bool,
    /// Human-readable word-level differences.
    pub differences: Vec<String>,
}

/// Result of comparing a merchant name against registry names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NameComparison {
    /// Whether the legal company name clears the match threshold (0.8).
    pub company_name_match: bool,
    /// Whether the trade name clears the match threshold (0.8).
    pub trade_name_match: bool,
    /// Token-set similarity against the legal company name, 0-1.
    pub company_name_similarity: f64,
    /// Token-set similarity against the trade name, 0-1.
    pub trade_name_similarity: f64,
    /// Best of the two similarities.
    pub similarity_score: f64,
    /// Which field matched best ("company_name" or "trade_name").
    pub best_match: Option<String>,
    /// The raw registry name behind the best match.
    pub best_match_name: Option<String>,
}

/// Risk factors derived from a registry record in isolation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryRisk {
    /// Accumulated registry risk score, 0-100.
    pub risk_score: u32,
    /// Human-readable factors behind the score.
    pub risk_factors: Vec<String>,
    /// Recommendations derived from the score.
    pub recommendations: Vec<String>,
}

/// Bundle of registry-derived signals for one validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryComparison {
    /// Whether a CNPJ was found in the request text.
    pub cnpj_found: bool,
    /// The registry record, when one could be fetched.
    pub record: Option<RegistryRecord>,
    /// Name comparison against the registry names.
    pub name_comparison: Option<NameComparison>,
    /// Address comparison against the registered address.
    pub address_comparison: Option<AddressComparison>,
    /// Registry-specific risk assessment.
    pub registry_risk: Option<RegistryRisk>,
}

// ============ Risk Assessment ============

/// Risk level derived deterministically from the composite score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    /// Score below 30.
    Low,
    /// Score 30-59.
    Medium,
    /// Score 60-79.
    High,
    /// Score 80 and above.
    Critical,
}

impl RiskLevel {
    /// Maps a clamped 0-100 score onto its level band.
    pub fn from_score(score: u32) -> Self {
        if score >= 80 {
            RiskLevel::Critical
        } else if score >= 60 {
            RiskLevel::High
        } else if score >= 30 {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }
}

/// Composite risk assessment for one validation.
///
/// Built once per validation and never mutated afterwards; re-running the
/// engine produces a fresh value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// Composite risk score, clamped to 0-100.
    pub risk_score: u32,
    /// Level band derived from the score.
    pub risk_level: RiskLevel,
    /// Ordered human-readable risk factors.
    pub risk_factors: Vec<String>,
    /// Ordered recommendations.
    pub recommendations: Vec<String>,
}

// ============ Validation Models ============

/// Request to validate a single merchant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MerchantValidationRequest {
    /// Merchant name (required, non-empty).
    pub merchant_name: String,
    /// Address as known to the requester.
    pub address: Option<String>,
    /// Directory identifier, when already known.
    pub place_id: Option<String>,
    /// Phone number supplied by the requester.
    pub phone: Option<String>,
    /// Transaction amount under review.
    pub transaction_amount: Option<f64>,
    /// Transaction type under review.
    pub transaction_type: Option<String>,
}

/// Outcome classification for a single validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationStatus {
    /// Merchant resolved and risk level below High.
    Valid,
    /// Merchant resolved but risk level High or Critical.
    Suspicious,
    /// No directory record could be resolved.
    Invalid,
    /// An unrecovered fault occurred during assessment.
    Error,
}

/// Full result of validating one merchant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    /// The resolved directory listing, if any.
    pub merchant: Option<MerchantRecord>,
    /// Composite risk assessment.
    pub risk_assessment: RiskAssessment,
    /// Address comparison against the directory listing.
    pub address_comparison: Option<AddressComparison>,
    /// Registry comparison bundle.
    pub registry_comparison: Option<RegistryComparison>,
    /// Outcome classification.
    pub validation_status: ValidationStatus,
    /// When the validation was performed.
    pub timestamp: DateTime<Utc>,
    /// The lookup strategy and query text actually used.
    pub search_query: String,
}

// ============ Batch Models ============

/// Lifecycle state of a batch job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BatchStatus {
    /// Submitted, not yet claimed by the worker.
    Pending,
    /// The worker is iterating the request list.
    Processing,
    /// All items processed.
    Completed,
    /// An orchestration-level fault halted the job.
    Failed,
}

impl BatchStatus {
    /// Terminal jobs are immutable.
    pub fn is_terminal(&self) -> bool {
        matches!(self, BatchStatus::Completed | BatchStatus::Failed)
    }
}

/// Asynchronous batch of merchant validations, tracked by id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchJob {
    /// Globally unique job identifier.
    pub batch_id: Uuid,
    /// Lifecycle state.
    pub status: BatchStatus,
    /// Number of requests submitted.
    pub total_merchants: usize,
    /// Number of requests processed so far (monotonic while processing).
    pub processed_merchants: usize,
    /// Submission time.
    pub created_at: DateTime<Utc>,
    /// Completion time, once terminal.
    pub completed_at: Option<DateTime<Utc>>,
    /// Results in input order; grows as items are processed, so a failed
    /// job still exposes whatever was produced before the fault.
    pub results: Vec<ValidationResult>,
}

impl BatchJob {
    /// Creates a fresh pending job for `total_merchants` requests.
    pub fn new(total_merchants: usize) -> Self {
        Self {
            batch_id: Uuid::new_v4(),
            status: BatchStatus::Pending,
            total_merchants,
            processed_merchants: 0,
            created_at: Utc::now(),
            completed_at: None,
            results: Vec::new(),
        }
    }
}
