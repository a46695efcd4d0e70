//! albumgrab - browser-driven gallery scraper.
//!
//! Finds the gallery at a given position in a site's search results for a
//! model name, extracts its image URLs, caches them on disk and serves them
//! over HTTP.

pub mod cli;
pub mod config;
pub mod models;
pub mod scrapers;
pub mod server;
pub mod services;
pub mod storage;
pub mod utils;
