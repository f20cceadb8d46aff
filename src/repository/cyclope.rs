//! Write access to the Cyclope database.
//!
//! Records are written in chunks inside one transaction per call, bypassing
//! the per-object save hooks Cyclope runs through Django (automatic slugs,
//! MPTT bookkeeping). Callers are responsible for handing over consistent
//! records.
//!
//! Each row is its own INSERT: SQLite has no DEFAULT keyword, so Diesel
//! cannot run multi-row VALUES lists on it.

use diesel::prelude::*;
use diesel_async::{AsyncConnection, RunQueryDsl};
use tracing::debug;

use super::pool::{DbError, DbPool};
use crate::models::{
    NewArticle, NewCategorization, NewCategory, NewCollection, NewPicture, NewUser,
};
use crate::schema::{
    articles_article, auth_user, collections_categorization, collections_category,
    collections_collection, collections_collection_content_types, cyclope_sitesettings,
    django_content_type, django_site, medialibrary_picture,
};
use crate::with_conn;

/// Default number of rows per INSERT statement.
pub const DEFAULT_BATCH_SIZE: usize = 500;

/// Insert records chunk by chunk, one statement per row, returning the count.
macro_rules! insert_chunked {
    ($conn:expr, $table:expr, $records:expr, $batch:expr) => {{
        let mut inserted = 0usize;
        for chunk in $records.chunks($batch) {
            for record in chunk {
                inserted += diesel::insert_into($table)
                    .values(record)
                    .execute(&mut *$conn)
                    .await?;
            }
            debug!("Inserted chunk of {} rows", chunk.len());
        }
        inserted
    }};
}

/// Tables the migration writes and reports on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CyclopeTable {
    Users,
    Collections,
    Categories,
    Articles,
    Categorizations,
    Pictures,
}

impl CyclopeTable {
    pub fn as_str(&self) -> &'static str {
        match self {
            CyclopeTable::Users => "auth_user",
            CyclopeTable::Collections => "collections_collection",
            CyclopeTable::Categories => "collections_category",
            CyclopeTable::Articles => "articles_article",
            CyclopeTable::Categorizations => "collections_categorization",
            CyclopeTable::Pictures => "medialibrary_picture",
        }
    }
}

#[derive(diesel::QueryableByName)]
struct CountRow {
    #[diesel(sql_type = diesel::sql_types::BigInt)]
    count: i64,
}

/// Cyclope database context.
#[derive(Clone)]
pub struct CyclopeDb {
    pool: DbPool,
    batch_size: usize,
}

impl CyclopeDb {
    /// Create a context over an existing pool.
    pub fn new(pool: DbPool, batch_size: usize) -> Self {
        Self {
            pool,
            batch_size: batch_size.max(1),
        }
    }

    /// Create a context from a database URL (SQLite path or `postgres://`).
    pub fn from_url(database_url: &str, batch_size: usize) -> Result<Self, DbError> {
        Ok(Self::new(DbPool::from_url(database_url)?, batch_size))
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    /// Total rows currently in a table.
    pub async fn count(&self, table: CyclopeTable) -> Result<u64, DbError> {
        let query = format!("SELECT COUNT(*) AS count FROM {}", table.as_str());
        with_conn!(self.pool, conn => {
            let row: CountRow = diesel::sql_query(&query).get_result(&mut conn).await?;
            Ok(row.count as u64)
        })
    }

    /// Look up the id of a Django content type by model name.
    pub async fn content_type_id(&self, model: &str) -> Result<Option<i64>, DbError> {
        with_conn!(self.pool, conn => {
            django_content_type::table
                .filter(django_content_type::model.eq(model))
                .order(django_content_type::id.asc())
                .select(django_content_type::id)
                .first::<i64>(&mut conn)
                .await
                .optional()
        })
    }

    /// Point the site configured in Cyclope's site settings at `domain`.
    ///
    /// Returns false when Cyclope has no site settings row.
    pub async fn set_site_domain(&self, domain: &str) -> Result<bool, DbError> {
        with_conn!(self.pool, conn => {
            let site_id: Option<i64> = cyclope_sitesettings::table
                .order(cyclope_sitesettings::id.asc())
                .select(cyclope_sitesettings::site_id)
                .first(&mut conn)
                .await
                .optional()?;

            match site_id {
                Some(site_id) => {
                    diesel::update(django_site::table.find(site_id))
                        .set(django_site::domain.eq(domain))
                        .execute(&mut conn)
                        .await?;
                    debug!("Site {} now served from {}", site_id, domain);
                    Ok(true)
                }
                None => Ok(false),
            }
        })
    }

    /// Bulk insert users in a single transaction.
    pub async fn insert_users(&self, users: &[NewUser]) -> Result<usize, DbError> {
        let batch = self.batch_size;
        with_conn!(self.pool, conn => {
            conn.transaction(|conn| {
                Box::pin(async move { Ok(insert_chunked!(conn, auth_user::table, users, batch)) })
            })
            .await
        })
    }

    /// Insert a collection and link it to its content types.
    pub async fn insert_collection(
        &self,
        collection: &NewCollection,
        content_type_ids: &[i64],
    ) -> Result<(), DbError> {
        with_conn!(self.pool, conn => {
            conn.transaction(|conn| {
                Box::pin(async move {
                    diesel::insert_into(collections_collection::table)
                        .values(collection)
                        .execute(&mut *conn)
                        .await?;

                    for content_type_id in content_type_ids {
                        diesel::insert_into(collections_collection_content_types::table)
                            .values((
                                collections_collection_content_types::collection_id
                                    .eq(collection.id),
                                collections_collection_content_types::contenttype_id
                                    .eq(*content_type_id),
                            ))
                            .execute(&mut *conn)
                            .await?;
                    }
                    Ok(())
                })
            })
            .await
        })
    }

    /// Bulk insert categories in a single transaction.
    ///
    /// A unique violation on any chunk rolls back every chunk, leaving the
    /// table as it was so the caller can fix the batch and retry.
    pub async fn insert_categories(&self, categories: &[NewCategory]) -> Result<usize, DbError> {
        let batch = self.batch_size;
        with_conn!(self.pool, conn => {
            conn.transaction(|conn| {
                Box::pin(async move {
                    Ok(insert_chunked!(conn, collections_category::table, categories, batch))
                })
            })
            .await
        })
    }

    /// Build and insert articles inside one scoped transaction.
    ///
    /// `build` runs for every row inside the transaction; the first error it
    /// returns, like any insert error, rolls back every article written so far.
    pub async fn insert_articles_with<R, F, E>(&self, rows: &[R], mut build: F) -> Result<usize, E>
    where
        R: Sync,
        F: FnMut(&R) -> Result<NewArticle, E> + Send,
        E: From<DbError> + Send,
    {
        let batch = self.batch_size;
        with_conn!(self.pool, conn => {
            conn.transaction(|conn| {
                Box::pin(async move {
                    let mut inserted = 0usize;
                    for chunk in rows.chunks(batch) {
                        let articles = chunk
                            .iter()
                            .map(&mut build)
                            .collect::<Result<Vec<NewArticle>, E>>()?;
                        for article in &articles {
                            inserted += diesel::insert_into(articles_article::table)
                                .values(article)
                                .execute(&mut *conn)
                                .await?;
                        }
                    }
                    Ok(inserted)
                })
            })
            .await
        })
    }

    /// Bulk insert categorizations in a single transaction.
    pub async fn insert_categorizations(
        &self,
        categorizations: &[NewCategorization],
    ) -> Result<usize, DbError> {
        let batch = self.batch_size;
        with_conn!(self.pool, conn => {
            conn.transaction(|conn| {
                Box::pin(async move {
                    Ok(insert_chunked!(
                        conn,
                        collections_categorization::table,
                        categorizations,
                        batch
                    ))
                })
            })
            .await
        })
    }

    /// Bulk insert pictures in a single transaction.
    pub async fn insert_pictures(&self, pictures: &[NewPicture]) -> Result<usize, DbError> {
        let batch = self.batch_size;
        with_conn!(self.pool, conn => {
            conn.transaction(|conn| {
                Box::pin(async move {
                    Ok(insert_chunked!(conn, medialibrary_picture::table, pictures, batch))
                })
            })
            .await
        })
    }
}
