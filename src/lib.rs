//! # cofid-loader
//!
//! Imports McCance and Widdowson's Composition of Foods Integrated Dataset
//! (CoFID) from a spreadsheet into a Cloud Firestore collection, one document
//! per food.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────┐   ┌──────────────┐   ┌───────────────┐
//! │ Worksheet  │──▶│    Loader    │──▶│ DocumentStore │
//! │ (calamine) │   │ filter/dedup │   │  Firestore /  │
//! └────────────┘   │  doc_id      │   │  in-memory    │
//!                  └──────────────┘   └───────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! cofid check                  # verify sheet and headers
//! cofid load --dry-run         # plan without writing
//! cofid load                   # upsert into `foods`
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Source rows, food records, load modes |
//! | [`doc_id`] | Document key normalization |
//! | [`source`] | Worksheet reading and column selection |
//! | [`loader`] | Planning and writing |
//! | [`store`] | Document store trait and backends |
//! | [`progress`] | Progress reporting |
//! | [`check`] | Workbook verification |

pub mod check;
pub mod config;
pub mod doc_id;
pub mod loader;
pub mod models;
pub mod progress;
pub mod source;
pub mod store;
