// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use time::Date;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub const fn flipped(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }

    pub const fn marker(self) -> &'static str {
        match self {
            Self::Asc => "▲",
            Self::Desc => "▼",
        }
    }
}

pub trait SortField: Copy + Eq + fmt::Debug + Send + Sync + 'static {
    const ALL: &'static [Self];

    fn label(self) -> &'static str;
}

pub trait Sortable {
    type Field: SortField;

    fn field(&self, field: Self::Field) -> FieldValue;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortCriteria<F> {
    pub field: F,
    pub direction: SortDirection,
}

impl<F: SortField> SortCriteria<F> {
    pub const fn ascending(field: F) -> Self {
        Self {
            field,
            direction: SortDirection::Asc,
        }
    }

    /// Repeating the active field flips direction; any other field starts
    /// ascending.
    pub fn toggle(current: Option<Self>, field: F) -> Self {
        match current {
            Some(active) if active.field == field => Self {
                field,
                direction: active.direction.flipped(),
            },
            _ => Self::ascending(field),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(Option<String>),
    Integer(Option<i64>),
    Date(Option<Date>),
}

impl FieldValue {
    /// Blank text counts as absent.
    pub fn text(value: &str) -> Self {
        if value.trim().is_empty() {
            Self::Text(None)
        } else {
            Self::Text(Some(value.to_owned()))
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Text(None) | Self::Integer(None) | Self::Date(None))
    }

    pub fn display(&self) -> String {
        match self {
            Self::Text(Some(value)) => value.clone(),
            Self::Integer(Some(value)) => value.to_string(),
            Self::Date(Some(value)) => value.to_string(),
            Self::Text(None) | Self::Integer(None) | Self::Date(None) => String::new(),
        }
    }

    fn cmp_present(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Integer(Some(left)), Self::Integer(Some(right))) => left.cmp(right),
            (Self::Date(Some(left)), Self::Date(Some(right))) => left.cmp(right),
            (Self::Text(Some(left)), Self::Text(Some(right))) => compare_text(left, right),
            _ => compare_text(&self.display(), &other.display()),
        }
    }
}

/// Case-folded comparison with a case-sensitive tie break, so "a" sorts
/// before "B" and the order is still total.
fn compare_text(left: &str, right: &str) -> Ordering {
    left.to_lowercase()
        .cmp(&right.to_lowercase())
        .then_with(|| left.cmp(right))
}

/// Absent values sort after present ones, and the whole comparison is
/// reversed for descending order, which moves them to the front.
pub fn compare_values(left: &FieldValue, right: &FieldValue, direction: SortDirection) -> Ordering {
    let ordering = match (left.is_null(), right.is_null()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => left.cmp_present(right),
    };
    match direction {
        SortDirection::Asc => ordering,
        SortDirection::Desc => ordering.reverse(),
    }
}

/// Display order for `items`. Without criteria the collection order is kept;
/// equal keys keep their relative order.
pub fn project_sorted<T: Sortable>(items: &[T], criteria: Option<SortCriteria<T::Field>>) -> Vec<&T> {
    let mut rows = items.iter().collect::<Vec<_>>();
    if let Some(criteria) = criteria {
        rows.sort_by(|left, right| {
            compare_values(
                &left.field(criteria.field),
                &right.field(criteria.field),
                criteria.direction,
            )
        });
    }
    rows
}
