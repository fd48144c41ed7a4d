//! Risk scoring: the registry-record assessor and the composite engine.
//!
//! Both are single accumulation passes over an ordered rule table; the
//! bands inside a rule (review counts, transaction amounts) are mutually
//! exclusive and evaluated in the order written here, which callers must
//! not reorder.

use chrono::{DateTime, NaiveDate, Utc};

use crate::models::{
    AddressComparison, BusinessStatus, MerchantRecord, RegistryComparison, RegistryRecord,
    RegistryRisk, RiskAssessment, RiskLevel,
};

/// Category tags that always add 10 points each.
pub const HIGH_RISK_TYPES: [&str; 5] = ["atm", "bank", "casino", "night_club", "liquor_store"];
/// Category tags that always add 5 points each.
pub const MEDIUM_RISK_TYPES: [&str; 3] = ["gas_station", "convenience_store", "jewelry_store"];

/// Registry contribution to the composite score is capped here, even though
/// the assessor itself can reach 100.
const REGISTRY_CONTRIBUTION_CAP: u32 = 40;

/// A registration younger than this counts as recently registered.
const RECENT_REGISTRATION_DAYS: i64 = 180;

/// Derives risk factors from a registry record in isolation.
///
/// An absent record is a terminal short-circuit: fixed score 20 with a
/// manual-verification recommendation, independent of every other rule.
pub fn assess_registry(record: Option<&RegistryRecord>, now: DateTime<Utc>) -> RegistryRisk {
    let record = match record {
        Some(record) => record,
        None => {
            return RegistryRisk {
                risk_score: 20,
                risk_factors: vec!["CNPJ data not available".to_string()],
                recommendations: vec!["Verify business registration manually".to_string()],
            };
        }
    };

    let mut risk_score: u32 = 0;
    let mut risk_factors = Vec::new();

    let status = record
        .registration_status
        .as_deref()
        .unwrap_or("")
        .to_uppercase();
    if status.contains("BAIXADA") || status.contains("SUSPENSA") {
        risk_factors.push(format!("Company status: {}", status));
        risk_score += 40;
    } else if status.contains("INAPTA") {
        risk_factors.push(format!("Company status: {}", status));
        risk_score += 25;
    }

    // The registry reports dates as dd/mm/YYYY; anything unparseable is an
    // upstream format drift, not a risk signal, and is skipped silently.
    if let Some(ref registration_date) = record.registration_date {
        if let Ok(date) = NaiveDate::parse_from_str(registration_date, "%d/%m/%Y") {
            let days = (now.date_naive() - date).num_days();
            if days < RECENT_REGISTRATION_DAYS {
                risk_factors.push("Recently registered company (< 6 months)".to_string());
                risk_score += 15;
            }
        }
    }

    if record.phone.as_deref().unwrap_or("").is_empty() {
        risk_factors.push("No phone number registered".to_string());
        risk_score += 10;
    }

    if record.email.as_deref().unwrap_or("").is_empty() {
        risk_factors.push("No email registered".to_string());
        risk_score += 5;
    }

    let company_size = record.company_size.as_deref().unwrap_or("").to_uppercase();
    if company_size.contains("MEI") {
        risk_factors.push("Micro Individual Entrepreneur (MEI)".to_string());
        risk_score += 5;
    }

    // Independent thresholds: both can fire.
    let mut recommendations = Vec::new();
    if risk_score > 30 {
        recommendations.push("Enhanced due diligence recommended".to_string());
    }
    if risk_score > 50 {
        recommendations.push("Consider additional verification steps".to_string());
    }
    if risk_factors.is_empty() {
        recommendations.push("CNPJ data appears normal".to_string());
    }

    RegistryRisk {
        risk_score: risk_score.min(100),
        risk_factors,
        recommendations,
    }
}

/// Merges directory, address-comparison and registry-comparison signals
/// into one composite risk assessment.
///
/// Missing optional inputs never fault a rule; absence skips its
/// contribution.
pub fn assess_risk(
    merchant: Option<&MerchantRecord>,
    transaction_amount: Option<f64>,
    address_comparison: Option<&AddressComparison>,
    registry_comparison: Option<&RegistryComparison>,
) -> RiskAssessment {
    let merchant = match merchant {
        Some(merchant) => merchant,
        None => {
            return RiskAssessment {
                risk_score: 100,
                risk_level: RiskLevel::Critical,
                risk_factors: vec!["Merchant not found in business directory".to_string()],
                recommendations: vec![
                    "Investigate merchant existence".to_string(),
                    "Verify transaction legitimacy".to_string(),
                ],
            };
        }
    };

    let mut risk_score: u32 = 0;
    let mut risk_factors = Vec::new();
    let mut recommendations = Vec::new();

    match merchant.business_status {
        BusinessStatus::ClosedPermanently => {
            risk_score += 40;
            risk_factors.push("Business permanently closed".to_string());
            recommendations
                .push("Verify if transaction is legitimate for closed business".to_string());
        }
        BusinessStatus::ClosedTemporarily => {
            risk_score += 20;
            risk_factors.push("Business temporarily closed".to_string());
        }
        BusinessStatus::Operational | BusinessStatus::Unknown => {}
    }

    if let Some(total) = merchant.user_ratings_total {
        if total == 0 {
            risk_score += 25;
            risk_factors.push("No customer reviews".to_string());
            recommendations.push("Verify business legitimacy due to lack of reviews".to_string());
        } else if total < 10 {
            risk_score += 15;
            risk_factors.push("Very few customer reviews".to_string());
        }
    }

    if let Some(rating) = merchant.rating {
        if rating < 3.0 {
            risk_score += 15;
            risk_factors.push("Low customer rating".to_string());
        }
    }

    for business_type in &merchant.types {
        if HIGH_RISK_TYPES.contains(&business_type.as_str()) {
            risk_score += 10;
            risk_factors.push(format!("High-risk business type: {}", business_type));
        } else if MEDIUM_RISK_TYPES.contains(&business_type.as_str()) {
            risk_score += 5;
            risk_factors.push(format!("Medium-risk business type: {}", business_type));
        }
    }

    if let Some(amount) = transaction_amount {
        if amount > 10000.0 {
            risk_score += 15;
            risk_factors.push("High-value transaction".to_string());
            recommendations.push("Enhanced due diligence for high-value transaction".to_string());
        } else if amount > 5000.0 {
            risk_score += 10;
            risk_factors.push("Medium-value transaction".to_string());
        }
    }

    if merchant.phone.as_deref().unwrap_or("").is_empty() {
        risk_score += 10;
        risk_factors.push("No phone number available".to_string());
    }

    if merchant.website.as_deref().unwrap_or("").is_empty() {
        risk_score += 5;
        risk_factors.push("No website available".to_string());
    }

    if let Some(comparison) = address_comparison {
        if !comparison.is_match {
            if comparison.similarity_score < 50.0 {
                risk_score += 30;
                risk_factors.push("Address mismatch - significant differences".to_string());
                recommendations.push("Verify correct merchant location".to_string());
            } else if comparison.similarity_score < 80.0 {
                risk_score += 15;
                risk_factors.push("Address mismatch - minor differences".to_string());
                recommendations.push("Confirm address details with merchant".to_string());
            }
        }
    }

    if let Some(comparison) = registry_comparison {
        if comparison.cnpj_found {
            match comparison.record {
                None => {
                    risk_score += 25;
                    risk_factors.push("CNPJ found but data unavailable".to_string());
                    recommendations.push("Verify CNPJ status manually".to_string());
                }
                Some(_) => {
                    if let Some(ref registry_risk) = comparison.registry_risk {
                        if registry_risk.risk_score > 0 {
                            risk_score += registry_risk.risk_score.min(REGISTRY_CONTRIBUTION_CAP);
                            risk_factors.extend(registry_risk.risk_factors.iter().cloned());
                            recommendations
                                .extend(registry_risk.recommendations.iter().cloned());
                        }
                    }

                    if let Some(ref name_comparison) = comparison.name_comparison {
                        if name_comparison.similarity_score < 0.6 {
                            risk_score += 20;
                            risk_factors
                                .push("Merchant name doesn't match CNPJ registration".to_string());
                            recommendations
                                .push("Verify business name with official registration".to_string());
                        }
                    }
                }
            }
        }
    }

    let risk_score = risk_score.min(100);
    let risk_level = RiskLevel::from_score(risk_score);
    recommendations.push(
        match risk_level {
            RiskLevel::Critical => "Immediate investigation required",
            RiskLevel::High => "Enhanced monitoring recommended",
            RiskLevel::Medium => "Standard monitoring sufficient",
            RiskLevel::Low => "Low risk - standard processing",
        }
        .to_string(),
    );

    RiskAssessment {
        risk_score,
        risk_level,
        risk_factors,
        recommendations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{GeoPoint, NameComparison, RegistryAddress};
    use chrono::TimeZone;

    fn merchant(status: BusinessStatus) -> MerchantRecord {
        MerchantRecord {
            place_id: "place-1".to_string(),
            name: "Padaria Central".to_string(),
            address: "123 Main Street".to_string(),
            phone: Some("+55 11 3333-4444".to_string()),
            website: Some("https://padariacentral.example".to_string()),
            rating: Some(4.5),
            user_ratings_total: Some(120),
            business_status: status,
            types: vec!["bakery".to_string()],
            location: GeoPoint { lat: -23.55, lng: -46.63 },
            price_level: Some(1),
            photos: vec![],
        }
    }

    fn registry_record() -> RegistryRecord {
        RegistryRecord {
            cnpj: "12345678000195".to_string(),
            company_name: "Padaria Central Ltda".to_string(),
            trade_name: Some("Padaria Central".to_string()),
            legal_nature: Some("206-2 - Sociedade Empresaria Limitada".to_string()),
            main_activity: Some("Padaria e confeitaria".to_string()),
            secondary_activities: vec![],
            registration_status: Some("ATIVA".to_string()),
            registration_date: Some("10/03/2010".to_string()),
            address: RegistryAddress::default(),
            phone: Some("(11) 3333-4444".to_string()),
            email: Some("contato@padariacentral.example".to_string()),
            share_capital: Some("100000.00".to_string()),
            company_size: Some("DEMAIS".to_string()),
            partners: vec![],
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn absent_registry_record_short_circuits() {
        let risk = assess_registry(None, now());
        assert_eq!(risk.risk_score, 20);
        assert_eq!(risk.risk_factors, vec!["CNPJ data not available"]);
        assert_eq!(
            risk.recommendations,
            vec!["Verify business registration manually"]
        );
    }

    #[test]
    fn clean_registry_record_scores_zero() {
        let risk = assess_registry(Some(&registry_record()), now());
        assert_eq!(risk.risk_score, 0);
        assert!(risk.risk_factors.is_empty());
        assert_eq!(risk.recommendations, vec!["CNPJ data appears normal"]);
    }

    #[test]
    fn deregistered_status_scores_40() {
        let mut record = registry_record();
        record.registration_status = Some("Baixada".to_string());
        let risk = assess_registry(Some(&record), now());
        assert_eq!(risk.risk_score, 40);
        assert_eq!(risk.risk_factors, vec!["Company status: BAIXADA"]);
        assert_eq!(risk.recommendations, vec!["Enhanced due diligence recommended"]);
    }

    #[test]
    fn inactive_status_scores_25() {
        let mut record = registry_record();
        record.registration_status = Some("INAPTA".to_string());
        let risk = assess_registry(Some(&record), now());
        assert_eq!(risk.risk_score, 25);
    }

    #[test]
    fn recent_registration_scores_15() {
        let mut record = registry_record();
        record.registration_date = Some("01/05/2024".to_string());
        let risk = assess_registry(Some(&record), now());
        assert_eq!(risk.risk_score, 15);
        assert_eq!(
            risk.risk_factors,
            vec!["Recently registered company (< 6 months)"]
        );
    }

    #[test]
    fn unparseable_registration_date_is_ignored() {
        let mut record = registry_record();
        record.registration_date = Some("2024-05-01".to_string());
        let risk = assess_registry(Some(&record), now());
        assert_eq!(risk.risk_score, 0);
        assert!(risk.risk_factors.is_empty());
    }

    #[test]
    fn missing_contacts_and_mei_accumulate() {
        let mut record = registry_record();
        record.phone = None;
        record.email = Some(String::new());
        record.company_size = Some("MEI - Microempreendedor Individual".to_string());
        let risk = assess_registry(Some(&record), now());
        // 10 (phone) + 5 (email) + 5 (MEI)
        assert_eq!(risk.risk_score, 20);
        assert_eq!(risk.risk_factors.len(), 3);
    }

    #[test]
    fn both_recommendation_thresholds_fire_together() {
        let mut record = registry_record();
        record.registration_status = Some("SUSPENSA".to_string());
        record.registration_date = Some("01/06/2024".to_string());
        record.phone = None;
        // 40 + 15 + 10 = 65 > 50 > 30
        let risk = assess_registry(Some(&record), now());
        assert_eq!(risk.risk_score, 65);
        assert_eq!(
            risk.recommendations,
            vec![
                "Enhanced due diligence recommended",
                "Consider additional verification steps"
            ]
        );
    }

    #[test]
    fn unresolved_merchant_is_terminal_critical() {
        let assessment = assess_risk(None, Some(50.0), None, None);
        assert_eq!(assessment.risk_score, 100);
        assert_eq!(assessment.risk_level, RiskLevel::Critical);
        assert_eq!(
            assessment.risk_factors,
            vec!["Merchant not found in business directory"]
        );
        assert_eq!(
            assessment.recommendations,
            vec![
                "Investigate merchant existence",
                "Verify transaction legitimacy"
            ]
        );
    }

    #[test]
    fn healthy_merchant_is_low_risk() {
        let assessment = assess_risk(Some(&merchant(BusinessStatus::Operational)), None, None, None);
        assert_eq!(assessment.risk_score, 0);
        assert_eq!(assessment.risk_level, RiskLevel::Low);
        assert!(assessment.risk_factors.is_empty());
        assert_eq!(
            assessment.recommendations,
            vec!["Low risk - standard processing"]
        );
    }

    #[test]
    fn closed_unreviewed_uncontactable_merchant_is_critical() {
        let mut record = merchant(BusinessStatus::ClosedPermanently);
        record.user_ratings_total = Some(0);
        record.phone = None;
        record.website = None;
        // 40 + 25 + 10 + 5 = 80
        let assessment = assess_risk(Some(&record), None, None, None);
        assert_eq!(assessment.risk_score, 80);
        assert_eq!(assessment.risk_level, RiskLevel::Critical);
        assert!(assessment
            .recommendations
            .contains(&"Immediate investigation required".to_string()));
    }

    #[test]
    fn review_bands_are_mutually_exclusive() {
        let mut record = merchant(BusinessStatus::Operational);
        record.user_ratings_total = Some(0);
        let zero_reviews = assess_risk(Some(&record), None, None, None);
        assert_eq!(zero_reviews.risk_score, 25);

        record.user_ratings_total = Some(5);
        let few_reviews = assess_risk(Some(&record), None, None, None);
        assert_eq!(few_reviews.risk_score, 15);

        record.user_ratings_total = None;
        let unknown_reviews = assess_risk(Some(&record), None, None, None);
        assert_eq!(unknown_reviews.risk_score, 0);
    }

    #[test]
    fn transaction_amount_bands_are_mutually_exclusive() {
        let record = merchant(BusinessStatus::Operational);
        assert_eq!(
            assess_risk(Some(&record), Some(15000.0), None, None).risk_score,
            15
        );
        assert_eq!(
            assess_risk(Some(&record), Some(7500.0), None, None).risk_score,
            10
        );
        assert_eq!(
            assess_risk(Some(&record), Some(1000.0), None, None).risk_score,
            0
        );
    }

    #[test]
    fn category_tags_compound() {
        let mut record = merchant(BusinessStatus::Operational);
        record.types = vec![
            "atm".to_string(),
            "casino".to_string(),
            "gas_station".to_string(),
            "bakery".to_string(),
        ];
        // 10 + 10 + 5
        let assessment = assess_risk(Some(&record), None, None, None);
        assert_eq!(assessment.risk_score, 25);
        assert_eq!(assessment.risk_factors.len(), 3);
    }

    #[test]
    fn address_mismatch_bands() {
        let record = merchant(BusinessStatus::Operational);
        let far = AddressComparison {
            provided_address: "a".to_string(),
            reference_address: "b".to_string(),
            similarity_score: 30.0,
            is_match: false,
            differences: vec![],
        };
        assert_eq!(assess_risk(Some(&record), None, Some(&far), None).risk_score, 30);

        let near = AddressComparison { similarity_score: 70.0, ..far.clone() };
        assert_eq!(assess_risk(Some(&record), None, Some(&near), None).risk_score, 15);

        let matching = AddressComparison {
            similarity_score: 95.0,
            is_match: true,
            ..far
        };
        assert_eq!(
            assess_risk(Some(&record), None, Some(&matching), None).risk_score,
            0
        );
    }

    #[test]
    fn registry_contribution_is_capped_at_40() {
        let record = merchant(BusinessStatus::Operational);
        let comparison = RegistryComparison {
            cnpj_found: true,
            record: Some(registry_record()),
            name_comparison: None,
            address_comparison: None,
            registry_risk: Some(RegistryRisk {
                risk_score: 75,
                risk_factors: vec!["Company status: BAIXADA".to_string()],
                recommendations: vec!["Enhanced due diligence recommended".to_string()],
            }),
        };

        let assessment = assess_risk(Some(&record), None, None, Some(&comparison));
        assert_eq!(assessment.risk_score, 40);
        assert!(assessment
            .risk_factors
            .contains(&"Company status: BAIXADA".to_string()));
        assert!(assessment
            .recommendations
            .contains(&"Enhanced due diligence recommended".to_string()));
    }

    #[test]
    fn cnpj_found_without_record_scores_25() {
        let record = merchant(BusinessStatus::Operational);
        let comparison = RegistryComparison {
            cnpj_found: true,
            record: None,
            name_comparison: None,
            address_comparison: None,
            registry_risk: None,
        };
        let assessment = assess_risk(Some(&record), None, None, Some(&comparison));
        assert_eq!(assessment.risk_score, 25);
        assert!(assessment
            .risk_factors
            .contains(&"CNPJ found but data unavailable".to_string()));
    }

    #[test]
    fn cnpj_not_found_contributes_nothing() {
        let record = merchant(BusinessStatus::Operational);
        let comparison = RegistryComparison {
            cnpj_found: false,
            record: None,
            name_comparison: None,
            address_comparison: None,
            registry_risk: None,
        };
        let assessment = assess_risk(Some(&record), None, None, Some(&comparison));
        assert_eq!(assessment.risk_score, 0);
    }

    #[test]
    fn registry_name_mismatch_adds_20() {
        let record = merchant(BusinessStatus::Operational);
        let comparison = RegistryComparison {
            cnpj_found: true,
            record: Some(registry_record()),
            name_comparison: Some(NameComparison {
                company_name_match: false,
                trade_name_match: false,
                company_name_similarity: 0.2,
                trade_name_similarity: 0.4,
                similarity_score: 0.4,
                best_match: Some("trade_name".to_string()),
                best_match_name: Some("Padaria Central".to_string()),
            }),
            address_comparison: None,
            registry_risk: None,
        };
        let assessment = assess_risk(Some(&record), None, None, Some(&comparison));
        assert_eq!(assessment.risk_score, 20);
        assert!(assessment
            .risk_factors
            .contains(&"Merchant name doesn't match CNPJ registration".to_string()));
    }

    #[test]
    fn composite_score_is_clamped_at_100() {
        let mut record = merchant(BusinessStatus::ClosedPermanently);
        record.user_ratings_total = Some(0);
        record.rating = Some(1.0);
        record.phone = None;
        record.website = None;
        record.types = vec!["atm".to_string(), "casino".to_string(), "bank".to_string()];

        let far = AddressComparison {
            provided_address: "a".to_string(),
            reference_address: "b".to_string(),
            similarity_score: 10.0,
            is_match: false,
            differences: vec![],
        };
        let comparison = RegistryComparison {
            cnpj_found: true,
            record: Some(registry_record()),
            name_comparison: Some(NameComparison {
                company_name_match: false,
                trade_name_match: false,
                company_name_similarity: 0.0,
                trade_name_similarity: 0.0,
                similarity_score: 0.0,
                best_match: None,
                best_match_name: None,
            }),
            address_comparison: None,
            registry_risk: Some(RegistryRisk {
                risk_score: 100,
                risk_factors: vec![],
                recommendations: vec![],
            }),
        };

        let assessment = assess_risk(Some(&record), Some(20000.0), Some(&far), Some(&comparison));
        assert_eq!(assessment.risk_score, 100);
        assert_eq!(assessment.risk_level, RiskLevel::Critical);
    }

    #[test]
    fn tier_recommendation_is_always_last() {
        let mut record = merchant(BusinessStatus::Operational);
        record.user_ratings_total = Some(0);
        record.phone = None;
        // 25 + 10 = 35 -> Medium
        let assessment = assess_risk(Some(&record), None, None, None);
        assert_eq!(assessment.risk_level, RiskLevel::Medium);
        assert_eq!(
            assessment.recommendations.last().map(String::as_str),
            Some("Standard monitoring sufficient")
        );
    }
}
