//! Duplicate-name resolution for records bound for a uniqueness-constrained
//! table.
//!
//! Bulk inserts skip the per-record slug generation Cyclope runs on save, so
//! records sharing a name would collide on the unique slug column. Resolution
//! is deterministic: the same input order always yields the same slugs and
//! names.
//!
//! Two passes run over a batch sorted case-insensitively by name:
//!
//! 1. Slugs: the first record of each run of equal names gets the bare slug,
//!    later ones get `-2`, `-3`, ... appended.
//! 2. Names: a record whose name and group both match its immediate
//!    predecessor gets ` (1)` appended to its name. The comparison is against
//!    the predecessor as already renamed, so runs longer than two are not
//!    renumbered against the head of the run.

use crate::models::NewCategory;
use crate::utils::slugify;

/// A record whose slug and display name can be disambiguated.
pub trait Disambiguate {
    /// Grouping inside which display names must stay distinct.
    type Group: PartialEq + Clone;

    fn name(&self) -> &str;
    fn set_name(&mut self, name: String);
    fn set_slug(&mut self, slug: String);
    fn group(&self) -> &Self::Group;
}

impl Disambiguate for NewCategory {
    type Group = i64;

    fn name(&self) -> &str {
        &self.name
    }

    fn set_name(&mut self, name: String) {
        self.name = name;
    }

    fn set_slug(&mut self, slug: String) {
        self.slug = slug;
    }

    fn group(&self) -> &i64 {
        &self.collection_id
    }
}

/// Sort records case-insensitively by name. Ties keep their original order.
pub fn sort_by_name<T: Disambiguate>(records: &mut [T]) {
    records.sort_by_cached_key(|record| record.name().to_lowercase());
}

/// Resolve duplicate names in a batch already sorted with [`sort_by_name`].
///
/// Returns the same records in the same order; only slugs and names change.
pub fn resolve<T: Disambiguate>(mut records: Vec<T>) -> Vec<T> {
    assign_slugs(&mut records);
    rename_within_groups(&mut records);
    records
}

/// Slug pass state: the previous record's lowercased name and the next suffix.
struct SlugRun {
    previous: Option<String>,
    counter: u32,
}

fn assign_slugs<T: Disambiguate>(records: &mut [T]) {
    records.iter_mut().fold(
        SlugRun {
            previous: None,
            counter: 2,
        },
        |run, record| {
            let key = record.name().to_lowercase();
            let base = slugify(record.name());

            if run.previous.as_deref() == Some(key.as_str()) {
                record.set_slug(format!("{}-{}", base, run.counter));
                SlugRun {
                    previous: Some(key),
                    counter: run.counter + 1,
                }
            } else {
                record.set_slug(base);
                SlugRun {
                    previous: Some(key),
                    counter: 2,
                }
            }
        },
    );
}

/// Name pass state: the predecessor (as renamed) and the suffix counter.
struct NameRun<G> {
    previous: Option<(String, G)>,
    counter: u32,
}

fn rename_within_groups<T: Disambiguate>(records: &mut [T]) {
    records.iter_mut().fold(
        NameRun::<T::Group> {
            previous: None,
            counter: 1,
        },
        |run, record| {
            let key = record.name().to_lowercase();
            let mut counter = run.counter;

            match run.previous {
                Some((previous_key, previous_group)) if previous_key == key => {
                    if previous_group == *record.group() {
                        let renamed = format!("{} ({})", record.name(), counter);
                        record.set_name(renamed);
                    }
                }
                Some(_) => counter = 1,
                None => {}
            }

            NameRun {
                previous: Some((record.name().to_lowercase(), record.group().clone())),
                counter,
            }
        },
    );
}
