//! Pressroom - content management core
//!
//! Categories, tags and posts over SQLite, served as a JSON API where every
//! response shares one envelope shape.

pub mod api;
pub mod config;
pub mod db;
pub mod models;
pub mod services;
