//! One-shot merchant validation from the command line.
//!
//! Usage: validate_merchant <merchant-name> [address] [transaction-amount]
//!
//! Resolves the merchant through the configured directory and registry
//! collaborators and prints the full validation result as JSON.

use merchant_audit::config::Config;
use merchant_audit::models::MerchantValidationRequest;
use merchant_audit::services::{PlacesService, RegistryService};
use merchant_audit::validation::MerchantValidator;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "merchant_audit=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut args = std::env::args().skip(1);
    let merchant_name = match args.next() {
        Some(name) => name,
        None => {
            eprintln!("Usage: validate_merchant <merchant-name> [address] [transaction-amount]");
            std::process::exit(2);
        }
    };
    let address = args.next();
    let transaction_amount = args.next().and_then(|amount| amount.parse().ok());

    let config = Config::from_env()?;

    let validator = MerchantValidator::new(
        Arc::new(PlacesService::new(&config)),
        Arc::new(RegistryService::new(&config)),
    );

    let request = MerchantValidationRequest {
        merchant_name,
        address,
        place_id: None,
        phone: None,
        transaction_amount,
        transaction_type: None,
    };

    let result = validator.validate(&request).await;

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
