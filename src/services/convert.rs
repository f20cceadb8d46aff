//! Translation of Joomla rows into Cyclope records.

use std::collections::{HashMap, HashSet};

use chrono::NaiveDateTime;

use super::images::ImageRef;
use super::password::make_password;
use crate::models::{
    parse_joomla_datetime, JoomlaCategory, JoomlaContent, JoomlaUser, NewArticle,
    NewCategorization, NewCategory, NewCollection, NewPicture, NewUser, EMPTY_VIEW_OPTIONS,
    FOLLOW_SITE,
};
use crate::utils::slugify;

/// A Cyclope collection inferred from a Joomla category extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectionMapping {
    pub id: i64,
    pub name: &'static str,
    /// Django model names of the content types the collection accepts.
    pub content_types: &'static [&'static str],
}

/// Collection receiving `com_content` categories and articles.
pub const CONTENT_COLLECTION: CollectionMapping = CollectionMapping {
    id: 1,
    name: "Contenidos",
    content_types: &["article"],
};

/// Map a Joomla category extension to its Cyclope collection.
///
/// Only article categories are migrated; newsfeeds, contacts, banners and
/// the `system` root have no counterpart.
pub fn extension_collection(extension: &str) -> Option<CollectionMapping> {
    match extension {
        "com_content" => Some(CONTENT_COLLECTION),
        _ => None,
    }
}

/// Build the collection record for a mapping.
pub fn collection(mapping: &CollectionMapping) -> NewCollection {
    NewCollection {
        id: mapping.id,
        name: mapping.name.to_string(),
        slug: slugify(mapping.name),
        image: String::new(),
        visible: true,
        default_list_view: String::new(),
        view_options: EMPTY_VIEW_OPTIONS.to_string(),
        navigation_root: false,
    }
}

/// Build a Django user from a Joomla user row.
///
/// Every migrated user becomes an active superuser, since Joomla permissions
/// have no Cyclope equivalent. The password is `default_password` when given,
/// otherwise the user's own username.
pub fn user(row: &JoomlaUser, default_password: Option<&str>, now: NaiveDateTime) -> NewUser {
    let password = default_password.unwrap_or(row.username.as_str());
    NewUser {
        id: row.id,
        username: row.username.clone(),
        first_name: row.name.clone(),
        last_name: String::new(),
        email: row.email.clone(),
        password: make_password(password),
        is_staff: true,
        is_active: true,
        is_superuser: true,
        last_login: parse_joomla_datetime(row.lastvisit_date.as_deref()).unwrap_or(now),
        date_joined: parse_joomla_datetime(row.register_date.as_deref()).unwrap_or(now),
    }
}

/// Build Cyclope categories from Joomla category rows.
///
/// Rows whose extension has no collection are dropped. Parents pointing at a
/// dropped row (typically Joomla's `system` root) become top-level.
pub fn categories(rows: &[JoomlaCategory]) -> Vec<NewCategory> {
    let migrated: HashSet<i64> = rows
        .iter()
        .filter(|row| extension_collection(&row.extension).is_some())
        .map(|row| row.id)
        .collect();

    rows.iter()
        .filter_map(|row| {
            let mapping = extension_collection(&row.extension)?;
            let parent_id = Some(row.parent_id).filter(|id| migrated.contains(id));
            Some(NewCategory {
                id: row.id,
                collection_id: mapping.id,
                name: row.title.clone(),
                slug: row.path.clone(),
                description: row.description.clone().unwrap_or_default(),
                image: String::new(),
                active: row.published == 1,
                parent_id,
                lft: row.lft,
                rght: row.rgt,
                tree_id: 1,
                level: row.level,
            })
        })
        .collect()
}

/// Build a Cyclope article from a Joomla content row.
///
/// The Joomla id is kept so categorizations can point at the article.
/// Authors that were not migrated are dropped.
pub fn article(row: &JoomlaContent, user_ids: &HashSet<i64>, now: NaiveDateTime) -> NewArticle {
    let created = parse_joomla_datetime(row.created.as_deref());
    let creation_date = created.unwrap_or(now);
    NewArticle {
        id: row.id,
        name: row.title.clone(),
        slug: row.alias.clone(),
        pretitle: String::new(),
        summary: String::new(),
        text: row.body(),
        date: created,
        creation_date,
        modification_date: parse_joomla_datetime(row.modified.as_deref())
            .unwrap_or(creation_date),
        published: row.is_published(),
        user_id: Some(row.created_by).filter(|id| user_ids.contains(id)),
        allow_comments: FOLLOW_SITE.to_string(),
        show_author: FOLLOW_SITE.to_string(),
        show_date: true,
    }
}

/// Link an object to a category through its content type.
pub fn categorization(category_id: i64, content_type_id: i64, object_id: i64) -> NewCategorization {
    NewCategorization {
        category_id,
        content_type_id,
        object_id,
    }
}

/// Build a media library picture from an image reference.
pub fn picture(image: &ImageRef, now: NaiveDateTime) -> NewPicture {
    let name = slugify(&image.src);
    NewPicture {
        slug: name.clone(),
        name,
        image: image.src.clone(),
        description: image.alt.clone().unwrap_or_default(),
        creation_date: now,
        modification_date: now,
        published: true,
        allow_comments: FOLLOW_SITE.to_string(),
        show_author: FOLLOW_SITE.to_string(),
    }
}

/// Build the media library for a set of image references.
///
/// An image referenced by several articles becomes a single picture, the
/// first reference providing its description. Distinct sources that slugify
/// alike get `-2`, `-3`, ... so picture slugs stay unique.
pub fn pictures(images: &[ImageRef], now: NaiveDateTime) -> Vec<NewPicture> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut slug_uses: HashMap<String, u32> = HashMap::new();

    let mut records = Vec::new();
    for image in images {
        if !seen.insert(image.src.as_str()) {
            continue;
        }
        let mut record = picture(image, now);
        let uses = slug_uses.entry(record.slug.clone()).or_insert(0);
        *uses += 1;
        if *uses > 1 {
            record.slug = format!("{}-{}", record.slug, uses);
        }
        records.push(record);
    }
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::password::check_password;

    fn now() -> NaiveDateTime {
        parse_joomla_datetime(Some("2016-05-01 12:00:00")).unwrap()
    }

    fn category_row(id: i64, parent_id: i64, title: &str, extension: &str) -> JoomlaCategory {
        JoomlaCategory {
            id,
            path: format!("path/{}", slugify(title)),
            title: title.to_string(),
            alias: slugify(title),
            description: Some(format!("About {title}")),
            published: 1,
            parent_id,
            lft: id * 2,
            rgt: id * 2 + 1,
            level: 1,
            extension: extension.to_string(),
        }
    }

    #[test]
    fn test_extension_collection() {
        assert_eq!(extension_collection("com_content"), Some(CONTENT_COLLECTION));
        assert_eq!(extension_collection("com_newsfeeds"), None);
        assert_eq!(extension_collection("system"), None);
    }

    #[test]
    fn test_collection_record() {
        let record = collection(&CONTENT_COLLECTION);
        assert_eq!(record.id, 1);
        assert_eq!(record.name, "Contenidos");
        assert_eq!(record.slug, "contenidos");
    }

    #[test]
    fn test_user_password_defaults_to_username() {
        let row = JoomlaUser {
            id: 62,
            username: "editor".to_string(),
            name: "Editora".to_string(),
            email: "editor@example.com".to_string(),
            register_date: Some("2012-01-01 10:00:00".to_string()),
            lastvisit_date: Some("0000-00-00 00:00:00".to_string()),
        };

        let record = user(&row, None, now());
        assert_eq!(record.id, 62);
        assert_eq!(record.first_name, "Editora");
        assert!(record.is_superuser && record.is_staff && record.is_active);
        assert!(check_password("editor", &record.password));
        assert_eq!(record.last_login, now());
        assert_eq!(record.date_joined.to_string(), "2012-01-01 10:00:00");

        let record = user(&row, Some("cambiar"), now());
        assert!(check_password("cambiar", &record.password));
    }

    #[test]
    fn test_categories_filter_and_parents() {
        let rows = vec![
            category_row(1, 0, "ROOT", "system"),
            category_row(2, 1, "Noticias", "com_content"),
            category_row(3, 2, "Locales", "com_content"),
            category_row(4, 1, "Feeds", "com_newsfeeds"),
        ];

        let records = categories(&rows);
        assert_eq!(records.len(), 2);

        assert_eq!(records[0].id, 2);
        assert_eq!(records[0].parent_id, None);
        assert_eq!(records[0].slug, "path/noticias");
        assert_eq!(records[0].description, "About Noticias");
        assert_eq!(records[0].collection_id, CONTENT_COLLECTION.id);

        assert_eq!(records[1].id, 3);
        assert_eq!(records[1].parent_id, Some(2));
        assert_eq!(records[1].lft, 6);
        assert_eq!(records[1].rght, 7);
    }

    #[test]
    fn test_category_active_flag() {
        let mut row = category_row(2, 1, "Oculta", "com_content");
        row.published = 0;
        assert!(!categories(&[row])[0].active);
    }

    #[test]
    fn test_article_dates_and_author() {
        let row = JoomlaContent {
            id: 9,
            title: "Hola".to_string(),
            alias: "hola".to_string(),
            introtext: Some("<p>a</p>".to_string()),
            fulltext: Some("<p>b</p>".to_string()),
            created: Some("2014-03-03 08:00:00".to_string()),
            modified: Some("0000-00-00 00:00:00".to_string()),
            state: 1,
            catid: 2,
            created_by: 62,
            images: None,
        };

        let users: HashSet<i64> = [62].into_iter().collect();
        let record = article(&row, &users, now());
        assert_eq!(record.id, 9);
        assert_eq!(record.text, "<p>a</p><p>b</p>");
        assert_eq!(record.creation_date.to_string(), "2014-03-03 08:00:00");
        assert_eq!(record.modification_date, record.creation_date);
        assert_eq!(record.date, Some(record.creation_date));
        assert!(record.published);
        assert_eq!(record.user_id, Some(62));

        let record = article(&row, &HashSet::new(), now());
        assert_eq!(record.user_id, None);
    }

    #[test]
    fn test_article_without_created_date() {
        let row = JoomlaContent {
            created: None,
            state: 0,
            ..Default::default()
        };
        let record = article(&row, &HashSet::new(), now());
        assert_eq!(record.creation_date, now());
        assert_eq!(record.date, None);
        assert!(!record.published);
    }

    #[test]
    fn test_picture_from_image() {
        let image = ImageRef {
            src: "images/stories/Foto 1.jpg".to_string(),
            alt: None,
        };
        let record = picture(&image, now());
        assert_eq!(record.name, "imagesstoriesfoto-1jpg");
        assert_eq!(record.slug, "imagesstoriesfoto-1jpg");
        assert_eq!(record.image, "images/stories/Foto 1.jpg");
        assert_eq!(record.description, "");
        assert_eq!(record.allow_comments, "SITE");
        assert_eq!(record.show_author, "SITE");
    }

    #[test]
    fn test_pictures_dedupe_sources_and_unique_slugs() {
        let image = |src: &str, alt: Option<&str>| ImageRef {
            src: src.to_string(),
            alt: alt.map(str::to_string),
        };
        let images = vec![
            image("images/a b.jpg", Some("first")),
            image("images/a b.jpg", Some("again")),
            image("images/a-b.jpg", None),
            image("images/c.jpg", None),
        ];

        let records = pictures(&images, now());
        let slugs: Vec<&str> = records.iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(slugs, ["imagesa-bjpg", "imagesa-bjpg-2", "imagescjpg"]);
        assert_eq!(records[0].description, "first");
        assert_eq!(records[1].image, "images/a-b.jpg");
    }

    #[test]
    fn test_records_carry_model_defaults() {
        let record = collection(&CONTENT_COLLECTION);
        assert_eq!(record.image, "");
        assert_eq!(record.default_list_view, "");
        assert_eq!(record.view_options, "{}");
        assert!(record.visible && !record.navigation_root);

        let record = article(&JoomlaContent::default(), &HashSet::new(), now());
        assert_eq!(record.allow_comments, "SITE");
        assert_eq!(record.show_author, "SITE");
        assert!(record.show_date);

        let row = category_row(2, 1, "Noticias", "com_content");
        assert_eq!(categories(&[row])[0].image, "");
    }
}
