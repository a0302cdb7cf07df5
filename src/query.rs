//! Filter, search and sort over an in-memory list.
//!
//! [`ListQuery::apply`] always runs in the same order: field filters, then the
//! free-text search, then a stable sort. The input slice is never modified.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};

/// Filter value that matches every record.
pub const ALL: &str = "all";

/// A value a record exposes for sorting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SortValue<'a> {
    Text(&'a str),
    Number(f64),
    Time(DateTime<Utc>),
}

impl SortValue<'_> {
    fn compare(&self, other: &SortValue<'_>) -> Ordering {
        match (self, other) {
            (SortValue::Text(a), SortValue::Text(b)) => a.to_lowercase().cmp(&b.to_lowercase()),
            (SortValue::Number(a), SortValue::Number(b)) => {
                a.partial_cmp(b).unwrap_or(Ordering::Equal)
            }
            (SortValue::Time(a), SortValue::Time(b)) => a.cmp(b),
            _ => Ordering::Equal,
        }
    }
}

/// Implemented by records that can be listed in a table.
pub trait Queryable {
    /// Fields matched by the free-text search.
    fn search_fields(&self) -> Vec<&str>;

    /// Value compared exactly against a field filter.
    fn filter_value(&self, field: &str) -> Option<String>;

    fn sort_value(&self, key: &str) -> Option<SortValue<'_>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub key: String,
    pub direction: Direction,
}

impl SortSpec {
    pub fn new(key: impl Into<String>, direction: Direction) -> Self {
        Self {
            key: key.into(),
            direction,
        }
    }

    pub fn toggled(&self) -> Self {
        let direction = match self.direction {
            Direction::Ascending => Direction::Descending,
            Direction::Descending => Direction::Ascending,
        };
        Self {
            key: self.key.clone(),
            direction,
        }
    }
}

/// Accepted values for one field. Values are OR-ed; separate fields are AND-ed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldFilter {
    pub field: String,
    pub values: Vec<String>,
}

impl FieldFilter {
    fn matches<T: Queryable>(&self, item: &T) -> bool {
        if self.values.is_empty() || self.values.iter().any(|v| v == ALL) {
            return true;
        }
        match item.filter_value(&self.field) {
            Some(value) => self.values.iter().any(|v| *v == value),
            None => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ListQuery {
    pub search: String,
    pub filters: Vec<FieldFilter>,
    pub sort: Option<SortSpec>,
}

impl ListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn search(mut self, text: impl Into<String>) -> Self {
        self.search = text.into();
        self
    }

    pub fn filter(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        let field = field.into();
        let value = value.into();
        match self.filters.iter_mut().find(|f| f.field == field) {
            Some(existing) => existing.values.push(value),
            None => self.filters.push(FieldFilter {
                field,
                values: vec![value],
            }),
        }
        self
    }

    pub fn sort_by(mut self, key: impl Into<String>, direction: Direction) -> Self {
        self.sort = Some(SortSpec::new(key, direction));
        self
    }

    /// Column-header click: same key flips direction, a new key starts ascending.
    pub fn toggle_sort(&mut self, key: &str) {
        self.sort = Some(match &self.sort {
            Some(current) if current.key == key => current.toggled(),
            _ => SortSpec::new(key, Direction::Ascending),
        });
    }

    pub fn apply<T: Queryable + Clone>(&self, items: &[T]) -> Vec<T> {
        let needle = self.search.trim().to_lowercase();

        let mut result: Vec<T> = items
            .iter()
            .filter(|item| self.filters.iter().all(|filter| filter.matches(*item)))
            .filter(|item| {
                needle.is_empty()
                    || item
                        .search_fields()
                        .iter()
                        .any(|field| field.to_lowercase().contains(&needle))
            })
            .cloned()
            .collect();

        if let Some(sort) = &self.sort {
            result.sort_by(|a, b| {
                let ordering = compare_optional(a.sort_value(&sort.key), b.sort_value(&sort.key));
                match sort.direction {
                    Direction::Ascending => ordering,
                    Direction::Descending => ordering.reverse(),
                }
            });
        }
        result
    }
}

// Missing values sort after present ones.
fn compare_optional(a: Option<SortValue<'_>>, b: Option<SortValue<'_>>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.compare(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
