/// Per-merchant validation workflow.
///
/// For one request this module:
/// 1. Resolves a directory listing (by id, falling back to text search)
/// 2. Compares the provided address against the listing address
/// 3. Extracts a CNPJ and builds the registry comparison
/// 4. Runs the composite risk engine
/// 5. Classifies the outcome and stamps the result
use crate::cnpj;
use crate::errors::AuditError;
use crate::models::*;
use crate::risk::{assess_registry, assess_risk};
use crate::services::{DirectoryLookup, RegistryLookup};
use crate::similarity::{compare_addresses, compare_names};
use chrono::Utc;
use std::sync::Arc;

pub struct MerchantValidator {
    directory: Arc<dyn DirectoryLookup>,
    registry: Arc<dyn RegistryLookup>,
}

impl MerchantValidator {
    pub fn new(directory: Arc<dyn DirectoryLookup>, registry: Arc<dyn RegistryLookup>) -> Self {
        Self {
            directory,
            registry,
        }
    }

    /// Validates a single merchant request.
    ///
    /// Never propagates a fault to the caller: anything unrecovered inside
    /// the workflow is converted into an ERROR-status result carrying a
    /// critical assessment.
    pub async fn validate(&self, request: &MerchantValidationRequest) -> ValidationResult {
        match self.try_validate(request).await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!(
                    "Validation failed for merchant '{}': {}",
                    request.merchant_name,
                    e
                );
                error_result(request, &e)
            }
        }
    }

    async fn try_validate(
        &self,
        request: &MerchantValidationRequest,
    ) -> Result<ValidationResult, AuditError> {
        let mut merchant = None;
        let mut search_query = String::new();

        // Resolve by directory identifier first
        if let Some(ref place_id) = request.place_id {
            merchant = absorb_transient(self.directory.resolve_by_id(place_id).await)?;
            search_query = format!("place_id: {}", place_id);
        }

        // If no identifier or not found, search by name and address
        if merchant.is_none() && !request.merchant_name.is_empty() {
            let mut query = request.merchant_name.clone();
            if let Some(ref address) = request.address {
                query.push(' ');
                query.push_str(address);
            }

            merchant = absorb_transient(self.directory.resolve_by_query(&query).await)?;

            search_query = format!("name: {}", request.merchant_name);
            if let Some(ref address) = request.address {
                search_query.push_str(&format!(", address: {}", address));
            }
        }

        let address_comparison = match (&merchant, &request.address) {
            (Some(merchant), Some(address)) => Some(compare_addresses(address, &merchant.address)),
            _ => None,
        };

        // Registry signals are best-effort: a fault here degrades to
        // "comparison absent" instead of failing the whole validation.
        let registry_comparison = match self.build_registry_comparison(request).await {
            Ok(comparison) => comparison,
            Err(e) => {
                tracing::warn!(
                    "Registry comparison failed for '{}': {}",
                    request.merchant_name,
                    e
                );
                None
            }
        };

        let risk_assessment = assess_risk(
            merchant.as_ref(),
            request.transaction_amount,
            address_comparison.as_ref(),
            registry_comparison.as_ref(),
        );

        let validation_status = if merchant.is_none() {
            ValidationStatus::Invalid
        } else if matches!(
            risk_assessment.risk_level,
            RiskLevel::High | RiskLevel::Critical
        ) {
            ValidationStatus::Suspicious
        } else {
            ValidationStatus::Valid
        };

        Ok(ValidationResult {
            merchant,
            risk_assessment,
            address_comparison,
            registry_comparison,
            validation_status,
            timestamp: Utc::now(),
            search_query,
        })
    }

    async fn build_registry_comparison(
        &self,
        request: &MerchantValidationRequest,
    ) -> Result<Option<RegistryComparison>, AuditError> {
        let search_text = match request.address {
            Some(ref address) => format!("{} {}", request.merchant_name, address),
            None => request.merchant_name.clone(),
        };

        let cnpj = match cnpj::extract_from_text(&search_text) {
            Some(cnpj) => cnpj,
            None => {
                return Ok(Some(RegistryComparison {
                    cnpj_found: false,
                    record: None,
                    name_comparison: None,
                    address_comparison: None,
                    registry_risk: None,
                }));
            }
        };

        tracing::info!(
            "Found CNPJ {} for merchant '{}'",
            cnpj,
            request.merchant_name
        );

        let record = match self.registry.fetch(&cnpj).await? {
            Some(record) => record,
            None => {
                return Ok(Some(RegistryComparison {
                    cnpj_found: true,
                    record: None,
                    name_comparison: None,
                    address_comparison: None,
                    registry_risk: None,
                }));
            }
        };

        let name_comparison = Some(compare_names(&request.merchant_name, &record));

        let address_comparison = request.address.as_ref().and_then(|address| {
            let registered = record.address.full_address();
            if registered.is_empty() {
                None
            } else {
                Some(compare_addresses(address, &registered))
            }
        });

        let registry_risk = Some(assess_registry(Some(&record), Utc::now()));

        Ok(Some(RegistryComparison {
            cnpj_found: true,
            record: Some(record),
            name_comparison,
            address_comparison,
            registry_risk,
        }))
    }
}

/// Absorbs a transient directory outage as "no record resolved"; every
/// other failure keeps propagating.
fn absorb_transient(
    result: Result<Option<MerchantRecord>, AuditError>,
) -> Result<Option<MerchantRecord>, AuditError> {
    match result {
        Err(AuditError::ExternalApi(msg)) => {
            tracing::warn!("Directory lookup unavailable: {}", msg);
            Ok(None)
        }
        other => other,
    }
}

fn error_result(request: &MerchantValidationRequest, error: &AuditError) -> ValidationResult {
    ValidationResult {
        merchant: None,
        risk_assessment: RiskAssessment {
            risk_score: 100,
            risk_level: RiskLevel::Critical,
            risk_factors: vec![format!("Processing error: {}", error)],
            recommendations: vec!["Manual review required".to_string()],
        },
        address_comparison: None,
        registry_comparison: None,
        validation_status: ValidationStatus::Error,
        timestamp: Utc::now(),
        search_query: format!("name: {}", request.merchant_name),
    }
}
