//! Merchant Audit Library
//!
//! Core risk-assessment and comparison engine for merchant fraud/AML
//! validation. Combines business-directory lookups and Brazilian
//! company-registry (CNPJ) records into a composite risk score, and runs
//! many such assessments as asynchronous batch jobs tracked by id.
//!
//! # Modules
//!
//! - `batch`: Batch orchestration, job store, rate pacing.
//! - `cnpj`: CNPJ extraction and format validation.
//! - `config`: Configuration management.
//! - `errors`: Error handling types.
//! - `models`: Core data models.
//! - `normalize`: Address and name canonicalization.
//! - `risk`: Registry risk assessor and composite risk engine.
//! - `services`: Collaborator contracts and external API clients.
//! - `similarity`: Sequence and token-set similarity scoring.
//! - `validation`: Per-merchant validation workflow.

pub mod batch;
pub mod cnpj;
pub mod config;
pub mod errors;
pub mod models;
pub mod normalize;
pub mod risk;
pub mod services;
pub mod similarity;
pub mod validation;
