//! # Aozora Index
//!
//! Harvests public-domain works from Aozora Bunko, decodes their Shift_JIS
//! archives, and makes them full-text searchable in SQLite.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────┐   ┌───────────┐   ┌───────────┐   ┌──────────┐
//! │ Discoverer │──▶│ Extractor │──▶│ Segmenter │──▶│  SQLite   │
//! │ list+cards │   │ zip+SJIS  │   │  IPADIC   │   │  FTS5     │
//! └────────────┘   └───────────┘   └───────────┘   └────┬─────┘
//!                                                       ▼
//!                                                 ┌──────────┐
//!                                                 │   CLI    │
//!                                                 │ (aozora) │
//!                                                 └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! aozora init                   # create database
//! aozora collect                # ingest the configured listing pages
//! aozora authors
//! aozora titles 000879
//! aozora content 000879 127
//! aozora query "羅生門"
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`error`] | Pipeline error taxonomy |
//! | [`fetch`] | HTTP fetch capability |
//! | [`resolve`] | Archive link resolution |
//! | [`discover`] | Listing and detail page scraping |
//! | [`extract`] | Archive text extraction and decoding |
//! | [`tokenizer`] | Japanese word segmentation |
//! | [`store`] | Author/work store and token index |
//! | [`ingest`] | Collection pipeline |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema creation |

pub mod config;
pub mod db;
pub mod discover;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod get;
pub mod ingest;
pub mod migrate;
pub mod models;
pub mod progress;
pub mod resolve;
pub mod search;
pub mod store;
pub mod tokenizer;
