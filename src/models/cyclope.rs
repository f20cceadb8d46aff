//! Cyclope records built by the migration, ready for bulk insertion.

use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::schema;

/// Choice value of Cyclope's per-content flags meaning "use the site setting".
pub const FOLLOW_SITE: &str = "SITE";

/// Serialized view options of a collection with nothing customized.
pub const EMPTY_VIEW_OPTIONS: &str = "{}";

/// Django user.
#[derive(Insertable, Debug, Clone, PartialEq, Eq)]
#[diesel(table_name = schema::auth_user)]
pub struct NewUser {
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub is_staff: bool,
    pub is_active: bool,
    pub is_superuser: bool,
    pub last_login: NaiveDateTime,
    pub date_joined: NaiveDateTime,
}

/// Collection grouping content types under one taxonomy.
#[derive(Insertable, Debug, Clone, PartialEq, Eq)]
#[diesel(table_name = schema::collections_collection)]
pub struct NewCollection {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub image: String,
    pub visible: bool,
    pub default_list_view: String,
    pub view_options: String,
    pub navigation_root: bool,
}

/// Category inside a collection.
///
/// `id`, `parent_id` and the nested-set bounds are kept from Joomla, which
/// uses the same tree algorithm as django-mptt.
#[derive(Insertable, Debug, Clone, PartialEq, Eq)]
#[diesel(table_name = schema::collections_category)]
#[diesel(treat_none_as_default_value = false)]
pub struct NewCategory {
    pub id: i64,
    pub collection_id: i64,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub image: String,
    pub active: bool,
    pub parent_id: Option<i64>,
    pub lft: i64,
    pub rght: i64,
    pub tree_id: i64,
    pub level: i64,
}

/// Article.
#[derive(Insertable, Debug, Clone, PartialEq, Eq)]
#[diesel(table_name = schema::articles_article)]
#[diesel(treat_none_as_default_value = false)]
pub struct NewArticle {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub pretitle: String,
    pub summary: String,
    pub text: String,
    pub date: Option<NaiveDateTime>,
    pub creation_date: NaiveDateTime,
    pub modification_date: NaiveDateTime,
    pub published: bool,
    pub user_id: Option<i64>,
    pub allow_comments: String,
    pub show_author: String,
    pub show_date: bool,
}

/// Generic link between a category and any object, through its content type.
#[derive(Insertable, Debug, Clone, PartialEq, Eq)]
#[diesel(table_name = schema::collections_categorization)]
pub struct NewCategorization {
    pub category_id: i64,
    pub content_type_id: i64,
    pub object_id: i64,
}

/// Media library picture.
#[derive(Insertable, Debug, Clone, PartialEq, Eq)]
#[diesel(table_name = schema::medialibrary_picture)]
pub struct NewPicture {
    pub name: String,
    pub slug: String,
    pub image: String,
    pub description: String,
    pub creation_date: NaiveDateTime,
    pub modification_date: NaiveDateTime,
    pub published: bool,
    pub allow_comments: String,
    pub show_author: String,
}
