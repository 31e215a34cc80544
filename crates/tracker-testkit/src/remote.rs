// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, anyhow};
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;
use tracker_app::{
    Entity, EntityId, Job, ListQuery, PopularSkill, RemoteCollection, Skill,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteCall {
    List(ListQuery),
    Popular,
    Create,
    Update(EntityId),
    Delete(EntityId),
}

struct Store<E> {
    records: Vec<E>,
    next_id: u64,
    calls: Vec<RemoteCall>,
    failures: VecDeque<String>,
}

type Matcher<E> = fn(&E, &ListQuery) -> bool;
type Aggregate<E> = fn(&[E]) -> Option<PopularSkill>;

/// A collection endpoint held in memory. Backs `--demo` and the UI tests;
/// behaves like the real server, including query filtering and the skills
/// aggregate.
pub struct InMemoryRemote<E> {
    store: Mutex<Store<E>>,
    matcher: Matcher<E>,
    aggregate: Option<Aggregate<E>>,
}

impl<E: Entity> InMemoryRemote<E> {
    pub fn new(records: Vec<E>, matcher: Matcher<E>) -> Self {
        let next_id = records
            .iter()
            .filter_map(|record| record.id().as_str().parse::<u64>().ok())
            .max()
            .unwrap_or(0)
            + 1;
        Self {
            store: Mutex::new(Store {
                records,
                next_id,
                calls: Vec::new(),
                failures: VecDeque::new(),
            }),
            matcher,
            aggregate: None,
        }
    }

    pub fn with_aggregate(mut self, aggregate: Aggregate<E>) -> Self {
        self.aggregate = Some(aggregate);
        self
    }

    /// The next call of any kind fails with `message`.
    pub fn fail_next(&self, message: &str) {
        if let Ok(mut store) = self.store.lock() {
            store.failures.push_back(message.to_owned());
        }
    }

    pub fn records(&self) -> Vec<E> {
        self.store
            .lock()
            .map(|store| store.records.clone())
            .unwrap_or_default()
    }

    pub fn calls(&self) -> Vec<RemoteCall> {
        self.store
            .lock()
            .map(|store| store.calls.clone())
            .unwrap_or_default()
    }

    fn begin(&self, call: RemoteCall) -> Result<MutexGuard<'_, Store<E>>> {
        let mut store = self
            .store
            .lock()
            .map_err(|_| anyhow!("in-memory {} store poisoned", E::KIND.as_str()))?;
        debug!(kind = E::KIND.as_str(), ?call, "in-memory call");
        store.calls.push(call);
        if let Some(message) = store.failures.pop_front() {
            return Err(anyhow!(message));
        }
        Ok(store)
    }
}

impl InMemoryRemote<Job> {
    pub fn jobs(records: Vec<Job>) -> Self {
        Self::new(records, job_matches)
    }
}

impl InMemoryRemote<Skill> {
    pub fn skills(records: Vec<Skill>) -> Self {
        Self::new(records, skill_matches).with_aggregate(most_popular)
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn job_matches(job: &Job, query: &ListQuery) -> bool {
    query.search.is_empty()
        || contains_ignore_case(&job.title, &query.search)
        || contains_ignore_case(&job.company, &query.search)
}

fn skill_matches(skill: &Skill, query: &ListQuery) -> bool {
    let search = query.search.is_empty() || contains_ignore_case(&skill.name, &query.search);
    let rating = match query.min_rating {
        None => true,
        Some(min) => skill.rating.is_some_and(|rating| rating >= i64::from(min)),
    };
    search && rating
}

/// The most frequent skill name with the mean of its known ratings. Ties go
/// to the name seen first.
pub fn most_popular(skills: &[Skill]) -> Option<PopularSkill> {
    let mut tallies: Vec<(&str, usize, i64, usize)> = Vec::new();
    for skill in skills {
        let name = skill.name.trim();
        if name.is_empty() {
            continue;
        }
        let position = match tallies.iter().position(|(seen, ..)| *seen == name) {
            Some(position) => position,
            None => {
                tallies.push((name, 0, 0, 0));
                tallies.len() - 1
            }
        };
        let tally = &mut tallies[position];
        tally.1 += 1;
        if let Some(rating) = skill.rating {
            tally.2 += rating;
            tally.3 += 1;
        }
    }

    let mut best: Option<(&str, usize, i64, usize)> = None;
    for tally in tallies {
        if best.is_none_or(|current| tally.1 > current.1) {
            best = Some(tally);
        }
    }
    best.map(|(name, _, sum, rated)| PopularSkill {
        name: name.to_owned(),
        average_rating: if rated == 0 {
            0.0
        } else {
            sum as f64 / rated as f64
        },
    })
}

impl<E: Entity> RemoteCollection<E> for InMemoryRemote<E> {
    fn list(&self, query: &ListQuery) -> Result<Vec<E>> {
        let store = self.begin(RemoteCall::List(query.clone()))?;
        Ok(store
            .records
            .iter()
            .filter(|record| (self.matcher)(record, query))
            .cloned()
            .collect())
    }

    fn create(&self, draft: &E::Draft) -> Result<()> {
        let mut store = self.begin(RemoteCall::Create)?;
        let id = EntityId::from(store.next_id.to_string());
        store.next_id += 1;
        store.records.push(E::from_draft(id, draft));
        Ok(())
    }

    fn update(&self, id: &EntityId, draft: &E::Draft) -> Result<()> {
        let mut store = self.begin(RemoteCall::Update(id.clone()))?;
        let record = store
            .records
            .iter_mut()
            .find(|record| record.id() == id)
            .ok_or_else(|| anyhow!("not found"))?;
        *record = E::from_draft(id.clone(), draft);
        Ok(())
    }

    fn delete(&self, id: &EntityId) -> Result<()> {
        let mut store = self.begin(RemoteCall::Delete(id.clone()))?;
        let before = store.records.len();
        store.records.retain(|record| record.id() != id);
        if store.records.len() == before {
            return Err(anyhow!("not found"));
        }
        Ok(())
    }

    fn popular(&self) -> Result<Option<PopularSkill>> {
        let store = self.begin(RemoteCall::Popular)?;
        Ok(self
            .aggregate
            .and_then(|aggregate| aggregate(&store.records)))
    }
}

#[cfg(test)]
mod tests {
    use super::{InMemoryRemote, RemoteCall, most_popular};
    use tracker_app::{
        Controller, EntityId, ListCommand, ListQuery, RemoteCollection, Skill, SkillDraft,
    };

    fn skill(id: &str, name: &str, rating: Option<i64>) -> Skill {
        Skill {
            id: EntityId::from(id),
            name: name.to_owned(),
            rating,
            reference: String::new(),
        }
    }

    #[test]
    fn most_popular_counts_names_and_averages_known_ratings() {
        let skills = vec![
            skill("1", "Go", Some(2)),
            skill("2", "Rust", Some(4)),
            skill("3", "Rust", None),
            skill("4", "Rust", Some(5)),
        ];
        let popular = most_popular(&skills).expect("aggregate");
        assert_eq!(popular.name, "Rust");
        assert!((popular.average_rating - 4.5).abs() < f64::EPSILON);
        assert_eq!(most_popular(&[]), None);
    }

    #[test]
    fn list_applies_search_and_min_rating() -> anyhow::Result<()> {
        let remote = InMemoryRemote::skills(vec![
            skill("1", "Java", Some(2)),
            skill("2", "JavaScript", Some(4)),
            skill("3", "Rust", Some(5)),
        ]);
        let query = ListQuery {
            search: "java".to_owned(),
            min_rating: Some(3),
        };
        let names = remote
            .list(&query)?
            .into_iter()
            .map(|skill| skill.name)
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["JavaScript"]);
        assert_eq!(remote.calls(), vec![RemoteCall::List(query)]);
        Ok(())
    }

    #[test]
    fn create_assigns_next_numeric_id() -> anyhow::Result<()> {
        let remote = InMemoryRemote::skills(vec![skill("7", "Go", None)]);
        remote.create(&SkillDraft {
            name: "Rust".to_owned(),
            rating: Some(5),
            reference: String::new(),
        })?;
        assert_eq!(remote.records()[1].id, EntityId::from(8));
        Ok(())
    }

    #[test]
    fn scripted_failure_reaches_the_view() {
        let remote = InMemoryRemote::skills(vec![skill("1", "Go", Some(3))]);
        let mut controller = Controller::new(remote);
        controller.mount();

        controller.remote().fail_next("not found");
        controller.dispatch(ListCommand::Delete(EntityId::from("1")));
        assert_eq!(controller.view().error(), Some("not found"));
        assert_eq!(controller.view().collection().len(), 1);
        assert_eq!(controller.remote().records().len(), 1);
    }

    #[test]
    fn missing_record_is_not_found() {
        let remote = InMemoryRemote::skills(Vec::new());
        let error = remote
            .delete(&EntityId::from("x"))
            .expect_err("delete of unknown id should fail");
        assert_eq!(error.to_string(), "not found");
    }
}
