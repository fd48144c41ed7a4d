/// Property-based tests using proptest
/// Tests invariants that must hold for all inputs
use merchant_audit::cnpj;
use merchant_audit::models::{BusinessStatus, GeoPoint, MerchantRecord, RiskLevel};
use merchant_audit::normalize::{normalize_address, normalize_name};
use merchant_audit::risk::assess_risk;
use merchant_audit::similarity::{sequence_ratio, token_set_ratio};
use proptest::prelude::*;

// Property: normalization never panics and is idempotent
proptest! {
    #[test]
    fn address_normalization_never_panics(text in "\\PC*") {
        let _ = normalize_address(&text);
    }

    #[test]
    fn address_normalization_is_idempotent(text in "\\PC*") {
        let once = normalize_address(&text);
        prop_assert_eq!(normalize_address(&once), once.clone());
    }

    #[test]
    fn name_normalization_is_idempotent(text in "\\PC*") {
        let once = normalize_name(&text);
        prop_assert_eq!(normalize_name(&once), once.clone());
    }
}

// Property: sequence similarity is symmetric and bounded
proptest! {
    #[test]
    fn sequence_ratio_is_symmetric(a in "\\PC{0,40}", b in "\\PC{0,40}") {
        prop_assert_eq!(sequence_ratio(&a, &b), sequence_ratio(&b, &a));
    }

    #[test]
    fn sequence_ratio_is_bounded(a in "\\PC{0,40}", b in "\\PC{0,40}") {
        let score = sequence_ratio(&a, &b);
        prop_assert!((0.0..=100.0).contains(&score));
    }

    #[test]
    fn identical_nonempty_strings_score_100(a in "\\PC{1,40}") {
        prop_assert_eq!(sequence_ratio(&a, &a), 100.0);
    }

    #[test]
    fn empty_side_scores_zero(a in "\\PC{0,40}") {
        prop_assert_eq!(sequence_ratio(&a, ""), 0.0);
        prop_assert_eq!(sequence_ratio("", &a), 0.0);
    }
}

// Property: token-set similarity behaves like a Jaccard index
proptest! {
    #[test]
    fn token_set_self_similarity_is_one(text in "[a-z ]{0,60}") {
        let normalized = normalize_name(&text);
        if normalized.is_empty() {
            prop_assert_eq!(token_set_ratio(&normalized, &normalized), 0.0);
        } else {
            prop_assert_eq!(token_set_ratio(&normalized, &normalized), 1.0);
        }
    }

    #[test]
    fn token_set_ratio_is_symmetric(a in "[a-z ]{0,60}", b in "[a-z ]{0,60}") {
        prop_assert_eq!(token_set_ratio(&a, &b), token_set_ratio(&b, &a));
    }

    #[test]
    fn token_set_ratio_is_bounded(a in "[a-z ]{0,60}", b in "[a-z ]{0,60}") {
        let score = token_set_ratio(&a, &b);
        prop_assert!((0.0..=1.0).contains(&score));
    }
}

// Property: CNPJ extraction never panics, and formatting round-trips
proptest! {
    #[test]
    fn cnpj_extraction_never_panics(text in "\\PC*") {
        let _ = cnpj::extract_from_text(&text);
    }

    #[test]
    fn formatted_cnpj_is_recovered(digits in "[0-9]{14}") {
        let formatted = format!(
            "{}.{}.{}/{}-{}",
            &digits[0..2], &digits[2..5], &digits[5..8], &digits[8..12], &digits[12..14]
        );
        let text = format!("Empresa Exemplo CNPJ {}", formatted);
        prop_assert_eq!(cnpj::extract_from_text(&text), Some(digits.clone()));
    }

    #[test]
    fn clean_preserves_digit_order(digits in "[0-9]{14}") {
        let formatted = format!(
            "{}.{}.{}/{}-{}",
            &digits[0..2], &digits[2..5], &digits[5..8], &digits[8..12], &digits[12..14]
        );
        prop_assert_eq!(cnpj::clean(&formatted), digits.clone());
        prop_assert!(cnpj::is_valid_format(&formatted));
    }
}

// Property: composite score is always clamped regardless of rule firings
proptest! {
    #[test]
    fn composite_score_is_always_clamped(
        rating in proptest::option::of(0.0f64..5.0),
        reviews in proptest::option::of(0u32..500),
        closed in proptest::bool::ANY,
        has_phone in proptest::bool::ANY,
        has_website in proptest::bool::ANY,
        amount in proptest::option::of(0.0f64..50_000.0),
        tags in proptest::collection::vec(
            prop::sample::select(vec![
                "atm", "bank", "casino", "night_club", "liquor_store",
                "gas_station", "convenience_store", "jewelry_store", "bakery",
            ]),
            0..8,
        ),
    ) {
        let merchant = MerchantRecord {
            place_id: "place-prop".to_string(),
            name: "Prop Merchant".to_string(),
            address: "1 Test Street".to_string(),
            phone: has_phone.then(|| "+55 11 3333-4444".to_string()),
            website: has_website.then(|| "https://merchant.example".to_string()),
            rating,
            user_ratings_total: reviews,
            business_status: if closed {
                BusinessStatus::ClosedPermanently
            } else {
                BusinessStatus::Operational
            },
            types: tags.into_iter().map(String::from).collect(),
            location: GeoPoint { lat: 0.0, lng: 0.0 },
            price_level: None,
            photos: vec![],
        };

        let assessment = assess_risk(Some(&merchant), amount, None, None);
        prop_assert!(assessment.risk_score <= 100);

        let expected_level = match assessment.risk_score {
            score if score >= 80 => RiskLevel::Critical,
            score if score >= 60 => RiskLevel::High,
            score if score >= 30 => RiskLevel::Medium,
            _ => RiskLevel::Low,
        };
        prop_assert_eq!(assessment.risk_level, expected_level);

        // The tier recommendation is always present and always last
        prop_assert!(!assessment.recommendations.is_empty());
    }
}
