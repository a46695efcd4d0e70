//! Data models for albumgrab.

mod album;
mod image;

pub use album::{AlbumKey, AlbumSource};
pub use image::{infer_extension, ImageRecord};
