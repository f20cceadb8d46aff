//! Typed rows read from the Joomla source tables.
//!
//! Each row type carries an explicit ordered column list. The list drives the
//! generated SELECT and tells the reader how each column must be decoded.

use chrono::NaiveDateTime;
use diesel::sql_types::{BigInt, Nullable, Text};

/// How a source column is decoded into its row field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// Any integer width, read as a signed 64-bit value.
    Integer,
    /// Character data.
    Text,
    /// DATETIME read as text so zero dates survive decoding.
    Timestamp,
}

/// Source column: name in the Joomla table plus its decoding.
pub type Column = (&'static str, ColumnKind);

/// Build the SELECT expression list for a set of columns.
///
/// Every name is backtick-quoted because Joomla uses reserved words
/// (`fulltext`) as column names.
pub fn select_list(columns: &[Column]) -> String {
    columns
        .iter()
        .map(|(name, kind)| match kind {
            ColumnKind::Integer => format!("CAST(`{name}` AS SIGNED) AS `{name}`"),
            ColumnKind::Text => format!("`{name}`"),
            ColumnKind::Timestamp => format!("CAST(`{name}` AS CHAR) AS `{name}`"),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse a Joomla DATETIME value.
///
/// Joomla stores "never" as `0000-00-00 00:00:00`, which is not a valid date
/// and comes back as `None` together with NULL and empty strings.
pub fn parse_joomla_datetime(value: Option<&str>) -> Option<NaiveDateTime> {
    let value = value?.trim();
    NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S"))
        .ok()
}

/// Row of `<prefix>users`.
#[derive(diesel::QueryableByName, Debug, Clone, Default)]
pub struct JoomlaUser {
    #[diesel(sql_type = BigInt)]
    pub id: i64,
    #[diesel(sql_type = Text)]
    pub username: String,
    #[diesel(sql_type = Text)]
    pub name: String,
    #[diesel(sql_type = Text)]
    pub email: String,
    #[diesel(sql_type = Nullable<Text>)]
    #[diesel(column_name = registerDate)]
    pub register_date: Option<String>,
    #[diesel(sql_type = Nullable<Text>)]
    #[diesel(column_name = lastvisitDate)]
    pub lastvisit_date: Option<String>,
}

impl JoomlaUser {
    pub const TABLE: &'static str = "users";
    pub const COLUMNS: &'static [Column] = &[
        ("id", ColumnKind::Integer),
        ("username", ColumnKind::Text),
        ("name", ColumnKind::Text),
        ("email", ColumnKind::Text),
        ("registerDate", ColumnKind::Timestamp),
        ("lastvisitDate", ColumnKind::Timestamp),
    ];
}

/// Row of `<prefix>content`.
#[derive(diesel::QueryableByName, Debug, Clone, Default)]
pub struct JoomlaContent {
    #[diesel(sql_type = BigInt)]
    pub id: i64,
    #[diesel(sql_type = Text)]
    pub title: String,
    #[diesel(sql_type = Text)]
    pub alias: String,
    #[diesel(sql_type = Nullable<Text>)]
    pub introtext: Option<String>,
    #[diesel(sql_type = Nullable<Text>)]
    pub fulltext: Option<String>,
    #[diesel(sql_type = Nullable<Text>)]
    pub created: Option<String>,
    #[diesel(sql_type = Nullable<Text>)]
    pub modified: Option<String>,
    #[diesel(sql_type = BigInt)]
    pub state: i64,
    #[diesel(sql_type = BigInt)]
    pub catid: i64,
    #[diesel(sql_type = BigInt)]
    pub created_by: i64,
    #[diesel(sql_type = Nullable<Text>)]
    pub images: Option<String>,
}

impl JoomlaContent {
    pub const TABLE: &'static str = "content";
    pub const COLUMNS: &'static [Column] = &[
        ("id", ColumnKind::Integer),
        ("title", ColumnKind::Text),
        ("alias", ColumnKind::Text),
        ("introtext", ColumnKind::Text),
        ("fulltext", ColumnKind::Text),
        ("created", ColumnKind::Timestamp),
        ("modified", ColumnKind::Timestamp),
        ("state", ColumnKind::Integer),
        ("catid", ColumnKind::Integer),
        ("created_by", ColumnKind::Integer),
        ("images", ColumnKind::Text),
    ];

    /// Full article body.
    ///
    /// With "Read More" enabled Joomla splits the body between `introtext`
    /// and `fulltext`; otherwise everything sits in `introtext`.
    pub fn body(&self) -> String {
        let mut text = self.introtext.clone().unwrap_or_default();
        if let Some(full) = self.fulltext.as_deref().filter(|f| !f.is_empty()) {
            text.push_str(full);
        }
        text
    }

    /// Whether the article is published (`state`: 1 published, 0 unpublished,
    /// -1 archived, -2 trashed).
    pub fn is_published(&self) -> bool {
        self.state == 1
    }
}

/// Row of `<prefix>categories`.
#[derive(diesel::QueryableByName, Debug, Clone, Default)]
pub struct JoomlaCategory {
    #[diesel(sql_type = BigInt)]
    pub id: i64,
    #[diesel(sql_type = Text)]
    pub path: String,
    #[diesel(sql_type = Text)]
    pub title: String,
    #[diesel(sql_type = Text)]
    pub alias: String,
    #[diesel(sql_type = Nullable<Text>)]
    pub description: Option<String>,
    #[diesel(sql_type = BigInt)]
    pub published: i64,
    #[diesel(sql_type = BigInt)]
    pub parent_id: i64,
    #[diesel(sql_type = BigInt)]
    pub lft: i64,
    #[diesel(sql_type = BigInt)]
    pub rgt: i64,
    #[diesel(sql_type = BigInt)]
    pub level: i64,
    #[diesel(sql_type = Text)]
    pub extension: String,
}

impl JoomlaCategory {
    pub const TABLE: &'static str = "categories";
    pub const COLUMNS: &'static [Column] = &[
        ("id", ColumnKind::Integer),
        ("path", ColumnKind::Text),
        ("title", ColumnKind::Text),
        ("alias", ColumnKind::Text),
        ("description", ColumnKind::Text),
        ("published", ColumnKind::Integer),
        ("parent_id", ColumnKind::Integer),
        ("lft", ColumnKind::Integer),
        ("rgt", ColumnKind::Integer),
        ("level", ColumnKind::Integer),
        ("extension", ColumnKind::Text),
    ];
}
