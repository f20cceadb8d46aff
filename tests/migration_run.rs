//! End-to-end migration tests
//!
//! Runs the migrator against an in-memory Joomla source and a SQLite Cyclope
//! database, then inspects the written tables with rusqlite.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use rusqlite::Connection;
use tempfile::TempDir;
use tokio::sync::mpsc;

use joomla2cyclope::config::MigrationConfig;
use joomla2cyclope::models::{JoomlaCategory, JoomlaContent, JoomlaUser};
use joomla2cyclope::repository::{CyclopeDb, DbError, JoomlaSource};
use joomla2cyclope::services::password::check_password;
use joomla2cyclope::services::{MigrateError, MigrationEvent, MigrationReport, Migrator, Stage};

const CYCLOPE_SCHEMA: &str = include_str!("fixtures/cyclope_schema.sql");

/// Joomla source serving fixed rows.
#[derive(Default)]
struct FakeSource {
    users: Vec<JoomlaUser>,
    content: Vec<JoomlaContent>,
    categories: Vec<JoomlaCategory>,
    closed: Arc<AtomicBool>,
}

#[async_trait]
impl JoomlaSource for FakeSource {
    async fn fetch_users(&mut self) -> Result<Vec<JoomlaUser>, DbError> {
        Ok(self.users.clone())
    }

    async fn fetch_content(&mut self) -> Result<Vec<JoomlaContent>, DbError> {
        Ok(self.content.clone())
    }

    async fn fetch_categories(&mut self) -> Result<Vec<JoomlaCategory>, DbError> {
        Ok(self.categories.clone())
    }

    async fn fetch_category_extensions(&mut self) -> Result<Vec<String>, DbError> {
        let mut extensions: Vec<String> = Vec::new();
        for category in &self.categories {
            if !extensions.contains(&category.extension) {
                extensions.push(category.extension.clone());
            }
        }
        Ok(extensions)
    }

    async fn duplicate_category_ids(&mut self) -> Result<HashSet<i64>, DbError> {
        // MySQL's default collation groups titles case-insensitively
        let mut counts: HashMap<String, usize> = HashMap::new();
        for category in &self.categories {
            *counts.entry(category.title.to_lowercase()).or_default() += 1;
        }
        Ok(self
            .categories
            .iter()
            .filter(|category| counts[&category.title.to_lowercase()] > 1)
            .map(|category| category.id)
            .collect())
    }

    async fn close(&mut self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

fn user(id: i64, username: &str) -> JoomlaUser {
    JoomlaUser {
        id,
        username: username.to_string(),
        name: username.to_uppercase(),
        email: format!("{username}@example.com"),
        register_date: Some("2011-02-03 04:05:06".to_string()),
        lastvisit_date: Some("0000-00-00 00:00:00".to_string()),
    }
}

fn category(id: i64, parent_id: i64, title: &str, path: &str, extension: &str) -> JoomlaCategory {
    JoomlaCategory {
        id,
        path: path.to_string(),
        title: title.to_string(),
        alias: path.rsplit('/').next().unwrap_or(path).to_string(),
        description: None,
        published: 1,
        parent_id,
        lft: id * 2,
        rgt: id * 2 + 1,
        level: 1,
        extension: extension.to_string(),
    }
}

fn content(
    id: i64,
    catid: i64,
    created_by: i64,
    introtext: &str,
    images: Option<&str>,
) -> JoomlaContent {
    JoomlaContent {
        id,
        title: format!("Article {id}"),
        alias: format!("article-{id}"),
        introtext: Some(introtext.to_string()),
        fulltext: None,
        created: Some("2015-06-07 08:09:10".to_string()),
        modified: None,
        state: 1,
        catid,
        created_by,
        images: images.map(str::to_string),
    }
}

/// A Joomla site with two categories titled "Noticias" in the same collection.
fn joomla_site() -> FakeSource {
    FakeSource {
        users: vec![user(62, "admin"), user(63, "editor")],
        categories: vec![
            category(1, 0, "ROOT", "", "system"),
            category(2, 1, "Noticias", "noticias", "com_content"),
            category(3, 1, "Deportes", "deportes", "com_content"),
            category(4, 3, "noticias", "noticias", "com_content"),
            category(5, 1, "Feeds", "feeds", "com_newsfeeds"),
        ],
        content: vec![
            content(
                10,
                2,
                62,
                r#"<p>Hola <img src="images/stories/uno.jpg" alt="Uno"></p>"#,
                Some(
                    r#"{"image_intro":"images/intro.jpg","image_intro_alt":"Intro","image_fulltext":""}"#,
                ),
            ),
            content(11, 5, 99, "<p>Feed</p>", None),
            content(12, 4, 63, "<p>Local</p>", Some("")),
        ],
        ..Default::default()
    }
}

fn setup_target(dir: &TempDir) -> (CyclopeDb, std::path::PathBuf) {
    let db_path = dir.path().join("cyclope.db");
    let conn = Connection::open(&db_path).unwrap();
    conn.execute_batch(CYCLOPE_SCHEMA).unwrap();
    let db = CyclopeDb::from_url(db_path.to_str().unwrap(), 2).unwrap();
    (db, db_path)
}

fn config() -> MigrationConfig {
    MigrationConfig {
        database: "joomla".to_string(),
        user: "root".to_string(),
        target_url: "unused".to_string(),
        devel: true,
        ..Default::default()
    }
}

async fn run(
    source: FakeSource,
    db: CyclopeDb,
    config: &MigrationConfig,
) -> (Result<MigrationReport, MigrateError>, Vec<MigrationEvent>) {
    let (event_tx, mut event_rx) = mpsc::channel(100);
    let collector = tokio::spawn(async move {
        let mut events = Vec::new();
        while let Some(event) = event_rx.recv().await {
            events.push(event);
        }
        events
    });

    let result = Migrator::new(source, db, config).run(event_tx).await;
    let events = collector.await.unwrap();
    (result, events)
}

fn query_strings(path: &Path, sql: &str) -> Vec<String> {
    let conn = Connection::open(path).unwrap();
    let mut stmt = conn.prepare(sql).unwrap();
    stmt.query_map([], |row| row.get(0))
        .unwrap()
        .collect::<Result<Vec<String>, _>>()
        .unwrap()
}

fn query_ids(path: &Path, sql: &str) -> Vec<i64> {
    let conn = Connection::open(path).unwrap();
    let mut stmt = conn.prepare(sql).unwrap();
    stmt.query_map([], |row| row.get(0))
        .unwrap()
        .collect::<Result<Vec<i64>, _>>()
        .unwrap()
}

#[tokio::test]
async fn test_full_migration() {
    let dir = tempfile::tempdir().unwrap();
    let (db, db_path) = setup_target(&dir);
    let source = joomla_site();
    let closed = source.closed.clone();

    let (result, events) = run(source, db, &config()).await;
    let report = result.unwrap();

    assert_eq!(
        report,
        MigrationReport {
            users: 2,
            collections: 1,
            categories: 3,
            articles: 3,
            categorizations: 2,
            pictures: 2,
        }
    );
    assert!(closed.load(Ordering::SeqCst));

    // Stages complete in order
    let completed: Vec<Stage> = events
        .iter()
        .filter_map(|event| match event {
            MigrationEvent::StageCompleted { stage, .. } => Some(*stage),
            _ => None,
        })
        .collect();
    assert_eq!(
        completed,
        vec![
            Stage::Users,
            Stage::Collections,
            Stage::Categories,
            Stage::Articles,
            Stage::Categorizations,
            Stage::Pictures,
        ]
    );
    assert!(matches!(events.last(), Some(MigrationEvent::Complete(_))));

    assert_eq!(
        query_strings(&db_path, "SELECT domain FROM django_site"),
        vec!["localhost:8000"]
    );

    // The collection accepts articles
    assert_eq!(
        query_ids(
            &db_path,
            "SELECT contenttype_id FROM collections_collection_content_types"
        ),
        vec![12]
    );

    let passwords = query_strings(&db_path, "SELECT password FROM auth_user ORDER BY id");
    assert!(check_password("admin", &passwords[0]));
    assert!(check_password("editor", &passwords[1]));

    // Columns Django fills from model defaults are written explicitly
    assert_eq!(
        query_strings(
            &db_path,
            "SELECT allow_comments || ':' || show_author || ':' || show_date FROM articles_article ORDER BY id"
        ),
        vec!["SITE:SITE:1", "SITE:SITE:1", "SITE:SITE:1"]
    );
    assert_eq!(
        query_strings(
            &db_path,
            "SELECT view_options || ':' || navigation_root FROM collections_collection"
        ),
        vec!["{}:0"]
    );
    assert_eq!(
        query_strings(&db_path, "SELECT slug FROM medialibrary_picture ORDER BY id"),
        vec!["imagesintrojpg", "imagesstoriesunojpg"]
    );
}

#[tokio::test]
async fn test_duplicate_categories_are_renamed() {
    let dir = tempfile::tempdir().unwrap();
    let (db, db_path) = setup_target(&dir);

    // A feed category shares the title too, but it is never migrated
    let mut source = joomla_site();
    source
        .categories
        .push(category(6, 5, "Noticias", "feeds/noticias", "com_newsfeeds"));

    let (result, events) = run(source, db, &config()).await;
    result.unwrap();

    let resolved: Vec<usize> = events
        .iter()
        .filter_map(|event| match event {
            MigrationEvent::DuplicatesResolved { categories } => Some(*categories),
            _ => None,
        })
        .collect();
    assert_eq!(resolved, vec![2]);

    let categories = query_strings(
        &db_path,
        "SELECT id || ':' || name || ':' || slug FROM collections_category ORDER BY id",
    );
    assert_eq!(
        categories,
        vec![
            "2:Noticias:noticias",
            "3:Deportes:deportes",
            "4:noticias (1):noticias-2",
        ]
    );

    // The system root was not migrated, so its children are top-level
    assert_eq!(
        query_ids(
            &db_path,
            "SELECT COUNT(*) FROM collections_category WHERE parent_id IS NULL"
        ),
        vec![2]
    );
    assert_eq!(
        query_ids(&db_path, "SELECT parent_id FROM collections_category WHERE id = 4"),
        vec![3]
    );
}

#[tokio::test]
async fn test_categorizations_only_for_migrated_categories() {
    let dir = tempfile::tempdir().unwrap();
    let (db, db_path) = setup_target(&dir);

    let (result, _) = run(joomla_site(), db, &config()).await;
    result.unwrap();

    // Article 11 sits in a newsfeeds category
    assert_eq!(
        query_ids(
            &db_path,
            "SELECT object_id FROM collections_categorization ORDER BY object_id"
        ),
        vec![10, 12]
    );
    assert_eq!(
        query_ids(
            &db_path,
            "SELECT DISTINCT content_type_id FROM collections_categorization"
        ),
        vec![12]
    );

    // Unknown authors are dropped
    assert_eq!(
        query_ids(
            &db_path,
            "SELECT id FROM articles_article WHERE user_id IS NULL"
        ),
        vec![11]
    );

    assert_eq!(
        query_strings(&db_path, "SELECT image FROM medialibrary_picture ORDER BY id"),
        vec!["images/intro.jpg", "images/stories/uno.jpg"]
    );
}

#[tokio::test]
async fn test_default_password_and_site_override() {
    let dir = tempfile::tempdir().unwrap();
    let (db, db_path) = setup_target(&dir);
    let config = MigrationConfig {
        default_password: Some("cambiar".to_string()),
        site_domain: Some("cyclope.example.org".to_string()),
        ..config()
    };

    let (result, _) = run(joomla_site(), db, &config).await;
    result.unwrap();

    assert_eq!(
        query_strings(&db_path, "SELECT domain FROM django_site"),
        vec!["cyclope.example.org"]
    );
    for password in query_strings(&db_path, "SELECT password FROM auth_user") {
        assert!(check_password("cambiar", &password));
    }
}

#[tokio::test]
async fn test_missing_site_settings_aborts_and_closes_source() {
    let dir = tempfile::tempdir().unwrap();
    let (db, db_path) = setup_target(&dir);
    Connection::open(&db_path)
        .unwrap()
        .execute("DELETE FROM cyclope_sitesettings", [])
        .unwrap();

    let source = joomla_site();
    let closed = source.closed.clone();

    let (result, events) = run(source, db, &config()).await;
    assert!(matches!(result, Err(MigrateError::MissingSiteSettings)));
    assert!(closed.load(Ordering::SeqCst));
    assert!(!events
        .iter()
        .any(|event| matches!(event, MigrationEvent::Complete(_))));

    assert_eq!(
        query_ids(&db_path, "SELECT COUNT(*) FROM auth_user"),
        vec![0]
    );
}

#[tokio::test]
async fn test_invalid_images_json_rolls_back_articles() {
    let dir = tempfile::tempdir().unwrap();
    let (db, db_path) = setup_target(&dir);
    let mut source = joomla_site();
    source.content[1].images = Some("{not json".to_string());

    let (result, _) = run(source, db, &config()).await;
    assert!(matches!(result, Err(MigrateError::Image(_))));

    assert_eq!(
        query_ids(&db_path, "SELECT COUNT(*) FROM articles_article"),
        vec![0]
    );
    // Earlier stages were committed
    assert_eq!(
        query_ids(&db_path, "SELECT COUNT(*) FROM collections_category"),
        vec![3]
    );
}
