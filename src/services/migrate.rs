//! Joomla to Cyclope migration service.
//!
//! Runs the stages strictly in order against one source connection:
//! site domain, users, collections, categories, articles, categorizations and
//! pictures. Progress is reported over an event channel so the CLI can render
//! it without the service knowing about terminals.

use std::collections::HashSet;

use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::convert::{self, CollectionMapping};
use super::images::{content_images, ImageError, ImageRef};
use super::resolve::{resolve, sort_by_name};
use crate::config::MigrationConfig;
use crate::models::{JoomlaContent, NewArticle, NewCategorization, NewCategory};
use crate::repository::cyclope::{CyclopeDb, CyclopeTable};
use crate::repository::joomla::{JoomlaSource, MysqlJoomlaSource};
use crate::repository::pool::DbError;
use crate::repository::util::is_unique_violation;

/// Django model name of Cyclope articles.
const ARTICLE_MODEL: &str = "article";

/// Errors that abort a migration run.
#[derive(Debug, Error)]
pub enum MigrateError {
    #[error("Could not connect to the Joomla database: {0}")]
    Connect(#[from] diesel::ConnectionError),

    #[error("Joomla query failed: {0}")]
    Source(#[source] DbError),

    #[error("Cyclope database error: {0}")]
    Target(#[source] DbError),

    #[error(transparent)]
    Image(#[from] ImageError),

    #[error("Cyclope has no content type for model '{0}'")]
    MissingContentType(String),

    #[error("Cyclope has no site settings; run its initial setup first")]
    MissingSiteSettings,
}

impl From<DbError> for MigrateError {
    fn from(e: DbError) -> Self {
        MigrateError::Target(e)
    }
}

/// Migration stages, in the order they run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    SiteDomain,
    Users,
    Collections,
    Categories,
    Articles,
    Categorizations,
    Pictures,
}

impl Stage {
    pub fn label(&self) -> &'static str {
        match self {
            Stage::SiteDomain => "site domain",
            Stage::Users => "users",
            Stage::Collections => "collections",
            Stage::Categories => "categories",
            Stage::Articles => "articles",
            Stage::Categorizations => "categorizations",
            Stage::Pictures => "pictures",
        }
    }
}

/// Events emitted during a migration run.
#[derive(Debug, Clone)]
pub enum MigrationEvent {
    /// A stage started
    StageStarted { stage: Stage },
    /// Site settings now point at `domain`
    SiteDomainSet { domain: String },
    /// Category insert collided; `categories` migrated records were renamed
    /// before retrying
    DuplicatesResolved { categories: usize },
    /// A stage finished; `total` is the row count of its target table
    StageCompleted { stage: Stage, total: u64 },
    /// Every stage finished
    Complete(MigrationReport),
}

/// Row counts of the Cyclope tables after a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    pub users: u64,
    pub collections: u64,
    pub categories: u64,
    pub articles: u64,
    pub categorizations: u64,
    pub pictures: u64,
}

/// Records produced while migrating articles, inserted by later stages.
#[derive(Default)]
struct ArticleLinks {
    categorizations: Vec<NewCategorization>,
    images: Vec<ImageRef>,
}

/// One-shot migration from a Joomla source into a Cyclope database.
pub struct Migrator<S: JoomlaSource> {
    source: S,
    target: CyclopeDb,
    site_domain: String,
    default_password: Option<String>,
}

impl Migrator<MysqlJoomlaSource> {
    /// Connect to both databases described by `config`.
    pub async fn connect(config: &MigrationConfig) -> Result<Self, MigrateError> {
        let target = CyclopeDb::from_url(&config.target_url, config.batch_size)?;
        let source = MysqlJoomlaSource::connect(&config.source_url(), &config.prefix).await?;
        info!("Connected to Joomla database {}", config.database);
        Ok(Self::new(source, target, config))
    }
}

impl<S: JoomlaSource> Migrator<S> {
    pub fn new(source: S, target: CyclopeDb, config: &MigrationConfig) -> Self {
        Self {
            source,
            target,
            site_domain: config.site_domain().to_string(),
            default_password: config.default_password.clone(),
        }
    }

    /// Run every stage. The source connection is released on every exit path.
    pub async fn run(
        mut self,
        event_tx: mpsc::Sender<MigrationEvent>,
    ) -> Result<MigrationReport, MigrateError> {
        let result = self.run_stages(&event_tx).await;
        self.source.close().await;

        let report = result?;
        let _ = event_tx
            .send(MigrationEvent::Complete(report.clone()))
            .await;
        Ok(report)
    }

    async fn run_stages(
        &mut self,
        event_tx: &mpsc::Sender<MigrationEvent>,
    ) -> Result<MigrationReport, MigrateError> {
        let mut report = MigrationReport::default();

        self.migrate_site_domain(event_tx).await?;

        let user_ids = self.migrate_users(event_tx).await?;
        report.users = self.completed(event_tx, Stage::Users).await?;

        self.migrate_collections(event_tx).await?;
        report.collections = self.completed(event_tx, Stage::Collections).await?;

        let category_ids = self.migrate_categories(event_tx).await?;
        report.categories = self.completed(event_tx, Stage::Categories).await?;

        let links = self
            .migrate_articles(event_tx, &user_ids, &category_ids)
            .await?;
        report.articles = self.completed(event_tx, Stage::Articles).await?;

        started(event_tx, Stage::Categorizations).await;
        self.target
            .insert_categorizations(&links.categorizations)
            .await?;
        report.categorizations = self.completed(event_tx, Stage::Categorizations).await?;

        started(event_tx, Stage::Pictures).await;
        let now = chrono::Utc::now().naive_utc();
        let pictures = convert::pictures(&links.images, now);
        self.target.insert_pictures(&pictures).await?;
        report.pictures = self.completed(event_tx, Stage::Pictures).await?;

        Ok(report)
    }

    /// Report a finished stage with the row count of its table.
    async fn completed(
        &self,
        event_tx: &mpsc::Sender<MigrationEvent>,
        stage: Stage,
    ) -> Result<u64, MigrateError> {
        let table = match stage {
            Stage::SiteDomain => return Ok(0),
            Stage::Users => CyclopeTable::Users,
            Stage::Collections => CyclopeTable::Collections,
            Stage::Categories => CyclopeTable::Categories,
            Stage::Articles => CyclopeTable::Articles,
            Stage::Categorizations => CyclopeTable::Categorizations,
            Stage::Pictures => CyclopeTable::Pictures,
        };
        let total = self.target.count(table).await?;
        info!("{}: {} rows", table.as_str(), total);
        let _ = event_tx
            .send(MigrationEvent::StageCompleted { stage, total })
            .await;
        Ok(total)
    }

    async fn migrate_site_domain(
        &mut self,
        event_tx: &mpsc::Sender<MigrationEvent>,
    ) -> Result<(), MigrateError> {
        started(event_tx, Stage::SiteDomain).await;
        if !self.target.set_site_domain(&self.site_domain).await? {
            return Err(MigrateError::MissingSiteSettings);
        }
        info!("Site domain set to {}", self.site_domain);
        let _ = event_tx
            .send(MigrationEvent::SiteDomainSet {
                domain: self.site_domain.clone(),
            })
            .await;
        Ok(())
    }

    /// Returns the ids of the migrated users.
    async fn migrate_users(
        &mut self,
        event_tx: &mpsc::Sender<MigrationEvent>,
    ) -> Result<HashSet<i64>, MigrateError> {
        started(event_tx, Stage::Users).await;
        let rows = self.source.fetch_users().await.map_err(MigrateError::Source)?;
        debug!("Fetched {} Joomla users", rows.len());

        let now = chrono::Utc::now().naive_utc();
        let users: Vec<_> = rows
            .iter()
            .map(|row| convert::user(row, self.default_password.as_deref(), now))
            .collect();
        self.target.insert_users(&users).await?;

        Ok(users.iter().map(|user| user.id).collect())
    }

    async fn migrate_collections(
        &mut self,
        event_tx: &mpsc::Sender<MigrationEvent>,
    ) -> Result<(), MigrateError> {
        started(event_tx, Stage::Collections).await;
        let extensions = self
            .source
            .fetch_category_extensions()
            .await
            .map_err(MigrateError::Source)?;

        let mut mappings: Vec<CollectionMapping> = Vec::new();
        for extension in &extensions {
            match convert::extension_collection(extension) {
                Some(mapping) if !mappings.contains(&mapping) => mappings.push(mapping),
                Some(_) => {}
                None => debug!("Skipping categories of extension {}", extension),
            }
        }

        for mapping in &mappings {
            let mut content_type_ids = Vec::with_capacity(mapping.content_types.len());
            for model in mapping.content_types {
                content_type_ids.push(self.require_content_type(model).await?);
            }
            self.target
                .insert_collection(&convert::collection(mapping), &content_type_ids)
                .await?;
        }
        Ok(())
    }

    /// Insert categories, resolving duplicate names if the first insert collides.
    ///
    /// Returns the ids of the migrated categories.
    async fn migrate_categories(
        &mut self,
        event_tx: &mpsc::Sender<MigrationEvent>,
    ) -> Result<HashSet<i64>, MigrateError> {
        started(event_tx, Stage::Categories).await;
        let rows = self
            .source
            .fetch_categories()
            .await
            .map_err(MigrateError::Source)?;
        let categories = convert::categories(&rows);
        let ids: HashSet<i64> = categories.iter().map(|category| category.id).collect();

        match self.target.insert_categories(&categories).await {
            Ok(_) => {}
            Err(e) if is_unique_violation(&e) => {
                warn!("Duplicate categories found, renaming before retry: {}", e);
                let duplicates = self
                    .source
                    .duplicate_category_ids()
                    .await
                    .map_err(MigrateError::Source)?;
                let renamed = categories
                    .iter()
                    .filter(|category| duplicates.contains(&category.id))
                    .count();
                let categories = prepare_retry(categories, &duplicates);
                let _ = event_tx
                    .send(MigrationEvent::DuplicatesResolved {
                        categories: renamed,
                    })
                    .await;
                self.target.insert_categories(&categories).await?;
            }
            Err(e) => return Err(e.into()),
        }

        Ok(ids)
    }

    /// Insert articles and collect their categorizations and images.
    async fn migrate_articles(
        &mut self,
        event_tx: &mpsc::Sender<MigrationEvent>,
        user_ids: &HashSet<i64>,
        category_ids: &HashSet<i64>,
    ) -> Result<ArticleLinks, MigrateError> {
        started(event_tx, Stage::Articles).await;
        let article_type = self.require_content_type(ARTICLE_MODEL).await?;
        let content = self
            .source
            .fetch_content()
            .await
            .map_err(MigrateError::Source)?;
        debug!("Fetched {} Joomla content rows", content.len());

        let now = chrono::Utc::now().naive_utc();
        let mut links = ArticleLinks::default();
        self.target
            .insert_articles_with(
                &content,
                |row: &JoomlaContent| -> Result<NewArticle, MigrateError> {
                    if category_ids.contains(&row.catid) {
                        links.categorizations.push(convert::categorization(
                            row.catid,
                            article_type,
                            row.id,
                        ));
                    }
                    links.images.extend(content_images(row)?);
                    Ok(convert::article(row, user_ids, now))
                },
            )
            .await?;

        Ok(links)
    }

    async fn require_content_type(&self, model: &str) -> Result<i64, MigrateError> {
        self.target
            .content_type_id(model)
            .await?
            .ok_or_else(|| MigrateError::MissingContentType(model.to_string()))
    }
}

async fn started(event_tx: &mpsc::Sender<MigrationEvent>, stage: Stage) {
    info!("Migrating {}", stage.label());
    let _ = event_tx.send(MigrationEvent::StageStarted { stage }).await;
}

/// Prepare a category batch for a second insert after a unique violation.
///
/// Categories listed in `duplicates` are taken out, sorted by name, resolved
/// and appended after the untouched ones.
pub fn prepare_retry(categories: Vec<NewCategory>, duplicates: &HashSet<i64>) -> Vec<NewCategory> {
    let (mut conflicting, mut batch): (Vec<_>, Vec<_>) = categories
        .into_iter()
        .partition(|category| duplicates.contains(&category.id));

    sort_by_name(&mut conflicting);
    batch.extend(resolve(conflicting));
    batch
}
