//! Applicant profile pipeline over an Airtable base: compress linked child
//! rows into one JSON document, expand it back, shortlist by fixed rules and
//! enrich shortlisted leads with a local LLM.

pub mod compression;
pub mod config;
pub mod dates;
pub mod enrichment;
pub mod errors;
pub mod llm_client;
pub mod models;
pub mod report;
pub mod runner;
pub mod shortlist;
pub mod store;
