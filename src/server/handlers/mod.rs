//! HTTP request handlers for the web server.

mod album;
mod api;
mod download;
mod gallery;
mod helpers;
mod static_files;

// Re-export handlers for use by the router
pub use album::{delete_album, get_album};
pub use api::{health, list_cache};
pub use download::bulk_download;
pub use gallery::nsfw_gallery;
pub use static_files::{list_downloads, serve_css, serve_download};
