// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, anyhow};
use url::Url;

use crate::ids::EntityId;
use crate::model::EntityKind;

/// Server-side filter for list requests. The client never filters locally.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ListQuery {
    pub search: String,
    pub min_rating: Option<u8>,
}

impl ListQuery {
    /// Query pairs in wire order; empty fields are left out entirely.
    pub fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if !self.search.is_empty() {
            pairs.push(("search", self.search.clone()));
        }
        if let Some(rating) = self.min_rating {
            pairs.push(("minRating", rating.to_string()));
        }
        pairs
    }
}

pub fn collection_url(base: &Url, kind: EntityKind, query: &ListQuery) -> Result<Url> {
    let mut url = join_segments(base, &[kind.as_str()])?;
    let pairs = query.pairs();
    if !pairs.is_empty() {
        let mut serializer = url.query_pairs_mut();
        for (key, value) in &pairs {
            serializer.append_pair(key, value);
        }
    }
    Ok(url)
}

pub fn item_url(base: &Url, kind: EntityKind, id: &EntityId) -> Result<Url> {
    join_segments(base, &[kind.as_str(), id.as_str()])
}

pub fn popularity_url(base: &Url) -> Result<Url> {
    join_segments(base, &[EntityKind::Skills.as_str(), "popular"])
}

fn join_segments(base: &Url, segments: &[&str]) -> Result<Url> {
    let mut url = base.clone();
    url.set_query(None);
    url.path_segments_mut()
        .map_err(|()| anyhow!("base URL {base} cannot carry a path"))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}
