//! joomla2cyclope - migrate a Joomla site into a Cyclope (Django CMS) database.
//!
//! Users, categories, articles and their images are read from the Joomla
//! MySQL tables and bulk inserted into Cyclope. Categories sharing a title are
//! given unique slugs and names before insertion.

pub mod cli;
pub mod config;
pub mod models;
pub mod repository;
pub mod schema;
pub mod services;
pub mod utils;
