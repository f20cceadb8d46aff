//! Read access to the Joomla source database.

use std::collections::HashSet;

use async_trait::async_trait;
use diesel::sql_types::{BigInt, Text};
use diesel_async::{AsyncConnection, AsyncMysqlConnection, RunQueryDsl};
use tracing::debug;

use super::pool::DbError;
use super::util::to_diesel_error;
use crate::models::{select_list, Column, JoomlaCategory, JoomlaContent, JoomlaUser};

/// Read-only view of the Joomla tables the migration consumes.
#[async_trait]
pub trait JoomlaSource: Send {
    /// All rows of `<prefix>users`.
    async fn fetch_users(&mut self) -> Result<Vec<JoomlaUser>, DbError>;

    /// All rows of `<prefix>content`.
    async fn fetch_content(&mut self) -> Result<Vec<JoomlaContent>, DbError>;

    /// All rows of `<prefix>categories`, in table order.
    async fn fetch_categories(&mut self) -> Result<Vec<JoomlaCategory>, DbError>;

    /// Distinct category extensions (`com_content`, `com_newsfeeds`, ...).
    async fn fetch_category_extensions(&mut self) -> Result<Vec<String>, DbError>;

    /// Ids of categories whose title is shared with another category.
    async fn duplicate_category_ids(&mut self) -> Result<HashSet<i64>, DbError>;

    /// Release the connection. Later queries fail.
    async fn close(&mut self);
}

#[derive(diesel::QueryableByName)]
struct IdRow {
    #[diesel(sql_type = BigInt)]
    id: i64,
}

#[derive(diesel::QueryableByName)]
struct ExtensionRow {
    #[diesel(sql_type = Text)]
    extension: String,
}

/// Joomla source backed by a single MySQL connection held for the whole run.
pub struct MysqlJoomlaSource {
    conn: Option<AsyncMysqlConnection>,
    prefix: String,
}

impl MysqlJoomlaSource {
    /// Connect to the Joomla database.
    ///
    /// `prefix` is prepended to every table name (`jos_`, `wiphala_`, ...).
    pub async fn connect(database_url: &str, prefix: &str) -> Result<Self, diesel::ConnectionError> {
        let conn = AsyncMysqlConnection::establish(database_url).await?;
        Ok(Self {
            conn: Some(conn),
            prefix: prefix.to_string(),
        })
    }

    fn table(&self, name: &str) -> String {
        format!("`{}{}`", self.prefix, name)
    }

    fn select_all(&self, columns: &[Column], table: &str) -> String {
        format!("SELECT {} FROM {}", select_list(columns), self.table(table))
    }

    fn category_extensions_query(&self) -> String {
        format!(
            "SELECT DISTINCT(`extension`) AS `extension` FROM {}",
            self.table(JoomlaCategory::TABLE)
        )
    }

    /// Ids of every category whose title appears more than once.
    fn duplicate_ids_query(&self) -> String {
        let table = self.table(JoomlaCategory::TABLE);
        format!(
            "SELECT CAST(`id` AS SIGNED) AS `id` FROM {table} WHERE `title` IN \
             (SELECT `title` FROM {table} GROUP BY `title` HAVING COUNT(`title`) > 1)"
        )
    }

    fn conn(&mut self) -> Result<&mut AsyncMysqlConnection, DbError> {
        self.conn
            .as_mut()
            .ok_or_else(|| to_diesel_error("Joomla connection already closed"))
    }

    async fn load<T>(&mut self, query: String) -> Result<Vec<T>, DbError>
    where
        T: diesel::QueryableByName<diesel::mysql::Mysql> + Send + 'static,
    {
        debug!("Joomla query: {}", query);
        let conn = self.conn()?;
        diesel::sql_query(query).load::<T>(conn).await
    }
}

#[async_trait]
impl JoomlaSource for MysqlJoomlaSource {
    async fn fetch_users(&mut self) -> Result<Vec<JoomlaUser>, DbError> {
        let query = self.select_all(JoomlaUser::COLUMNS, JoomlaUser::TABLE);
        self.load(query).await
    }

    async fn fetch_content(&mut self) -> Result<Vec<JoomlaContent>, DbError> {
        let query = self.select_all(JoomlaContent::COLUMNS, JoomlaContent::TABLE);
        self.load(query).await
    }

    async fn fetch_categories(&mut self) -> Result<Vec<JoomlaCategory>, DbError> {
        let query = self.select_all(JoomlaCategory::COLUMNS, JoomlaCategory::TABLE);
        self.load(query).await
    }

    async fn fetch_category_extensions(&mut self) -> Result<Vec<String>, DbError> {
        let query = self.category_extensions_query();
        let rows: Vec<ExtensionRow> = self.load(query).await?;
        Ok(rows.into_iter().map(|row| row.extension).collect())
    }

    async fn duplicate_category_ids(&mut self) -> Result<HashSet<i64>, DbError> {
        let query = self.duplicate_ids_query();
        let rows: Vec<IdRow> = self.load(query).await?;
        Ok(rows.into_iter().map(|row| row.id).collect())
    }

    async fn close(&mut self) {
        if self.conn.take().is_some() {
            debug!("Closed Joomla connection");
        }
    }
}
