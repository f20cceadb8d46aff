// Cyclope (Django) tables written by the migration.
// Django keeps model defaults in the ORM, not in the database, so every NOT
// NULL column of a written table is declared. Nullable columns the migration
// never sets (authors, sources, ordering) are left out.

diesel::table! {
    auth_user (id) {
        id -> BigInt,
        username -> Text,
        first_name -> Text,
        last_name -> Text,
        email -> Text,
        password -> Text,
        is_staff -> Bool,
        is_active -> Bool,
        is_superuser -> Bool,
        last_login -> Timestamp,
        date_joined -> Timestamp,
    }
}

diesel::table! {
    django_content_type (id) {
        id -> BigInt,
        app_label -> Text,
        model -> Text,
    }
}

diesel::table! {
    django_site (id) {
        id -> BigInt,
        domain -> Text,
        name -> Text,
    }
}

diesel::table! {
    cyclope_sitesettings (id) {
        id -> BigInt,
        site_id -> BigInt,
    }
}

diesel::table! {
    collections_collection (id) {
        id -> BigInt,
        name -> Text,
        slug -> Text,
        image -> Text,
        visible -> Bool,
        default_list_view -> Text,
        view_options -> Text,
        navigation_root -> Bool,
    }
}

diesel::table! {
    collections_collection_content_types (id) {
        id -> BigInt,
        collection_id -> BigInt,
        contenttype_id -> BigInt,
    }
}

diesel::table! {
    collections_category (id) {
        id -> BigInt,
        collection_id -> BigInt,
        name -> Text,
        slug -> Text,
        description -> Text,
        image -> Text,
        active -> Bool,
        parent_id -> Nullable<BigInt>,
        lft -> BigInt,
        rght -> BigInt,
        tree_id -> BigInt,
        level -> BigInt,
    }
}

diesel::table! {
    collections_categorization (id) {
        id -> BigInt,
        category_id -> BigInt,
        content_type_id -> BigInt,
        object_id -> BigInt,
    }
}

diesel::table! {
    articles_article (id) {
        id -> BigInt,
        name -> Text,
        slug -> Text,
        pretitle -> Text,
        summary -> Text,
        text -> Text,
        date -> Nullable<Timestamp>,
        creation_date -> Timestamp,
        modification_date -> Timestamp,
        published -> Bool,
        user_id -> Nullable<BigInt>,
        allow_comments -> Text,
        show_author -> Text,
        show_date -> Bool,
    }
}

diesel::table! {
    medialibrary_picture (id) {
        id -> BigInt,
        name -> Text,
        slug -> Text,
        image -> Text,
        description -> Text,
        creation_date -> Timestamp,
        modification_date -> Timestamp,
        published -> Bool,
        allow_comments -> Text,
        show_author -> Text,
    }
}

diesel::allow_tables_to_appear_in_same_query!(
    auth_user,
    django_content_type,
    django_site,
    cyclope_sitesettings,
    collections_collection,
    collections_collection_content_types,
    collections_category,
    collections_categorization,
    articles_article,
    medialibrary_picture,
);
