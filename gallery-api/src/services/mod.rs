//! External services

pub mod image_host;

pub use image_host::{CloudinaryClient, ImageHost, ImageHostError, UploadedImage};
