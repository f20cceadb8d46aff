//! Data models for both ends of the migration.
//!
//! - `joomla`: typed rows read from the Joomla source tables
//! - `cyclope`: insertable records for the Cyclope database

mod cyclope;
mod joomla;

pub use cyclope::{
    NewArticle, NewCategorization, NewCategory, NewCollection, NewPicture, NewUser,
    EMPTY_VIEW_OPTIONS, FOLLOW_SITE,
};
pub use joomla::{
    parse_joomla_datetime, select_list, Column, ColumnKind, JoomlaCategory, JoomlaContent,
    JoomlaUser,
};
