//! UIコンポーネント

pub mod auth_panel;
pub mod header;
pub mod photo_gallery;
pub mod upload_area;
