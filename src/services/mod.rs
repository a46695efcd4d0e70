//! Service layer for albumgrab business logic.
//!
//! Services are shared by the CLI and the web server.

pub mod album;
pub mod download;

pub use album::{AlbumError, AlbumLookup, AlbumService};
pub use download::{BulkDownloader, DownloadConfig, DownloadError, DownloadReport, FailedDownload};
