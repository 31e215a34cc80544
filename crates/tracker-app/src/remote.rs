// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use std::collections::VecDeque;
use std::sync::Arc;

use crate::ids::EntityId;
use crate::list::{
    Completion, Effect, ListCommand, ListEvent, ListView, Outcome, RemoteRequest, Transition,
};
use crate::model::{Entity, PopularSkill};
use crate::query::ListQuery;

/// One REST collection. Mutations report success only; the list is re-read
/// afterwards, so response bodies are never trusted for state.
pub trait RemoteCollection<E: Entity> {
    fn list(&self, query: &ListQuery) -> Result<Vec<E>>;
    fn create(&self, draft: &E::Draft) -> Result<()>;
    fn update(&self, id: &EntityId, draft: &E::Draft) -> Result<()>;
    fn delete(&self, id: &EntityId) -> Result<()>;

    fn popular(&self) -> Result<Option<PopularSkill>> {
        Ok(None)
    }
}

impl<E: Entity, R: RemoteCollection<E> + ?Sized> RemoteCollection<E> for Arc<R> {
    fn list(&self, query: &ListQuery) -> Result<Vec<E>> {
        (**self).list(query)
    }

    fn create(&self, draft: &E::Draft) -> Result<()> {
        (**self).create(draft)
    }

    fn update(&self, id: &EntityId, draft: &E::Draft) -> Result<()> {
        (**self).update(id, draft)
    }

    fn delete(&self, id: &EntityId) -> Result<()> {
        (**self).delete(id)
    }

    fn popular(&self) -> Result<Option<PopularSkill>> {
        (**self).popular()
    }
}

/// Runs one request to completion. Errors become their display text, which
/// is what the view stores and alerts with.
pub fn execute<E, R>(remote: &R, request: &RemoteRequest<E>) -> Completion<E>
where
    E: Entity,
    R: RemoteCollection<E> + ?Sized,
{
    let outcome = match request {
        RemoteRequest::List { query, .. } => Outcome::Listed(remote.list(query).map_err(text)),
        RemoteRequest::Popularity { .. } => Outcome::Popularity(remote.popular().map_err(text)),
        RemoteRequest::Create { draft, .. } => Outcome::Mutated(remote.create(draft).map_err(text)),
        RemoteRequest::Update { id, draft, .. } => {
            Outcome::Mutated(remote.update(id, draft).map_err(text))
        }
        RemoteRequest::Delete { id, .. } => Outcome::Mutated(remote.delete(id).map_err(text)),
    };
    Completion {
        request: request.request_id(),
        outcome,
    }
}

fn text(error: anyhow::Error) -> String {
    error.to_string()
}

/// Drives a `ListView` against a remote on the calling thread. Debounce
/// windows settle immediately. Used by scripted callers and tests; the
/// terminal UI runs effects on worker threads instead.
pub struct Controller<E: Entity, R> {
    view: ListView<E>,
    remote: R,
    alerts: Vec<String>,
}

impl<E: Entity, R: RemoteCollection<E>> Controller<E, R> {
    pub fn new(remote: R) -> Self {
        Self {
            view: ListView::new(),
            remote,
            alerts: Vec::new(),
        }
    }

    pub fn view(&self) -> &ListView<E> {
        &self.view
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    pub fn alerts(&self) -> &[String] {
        &self.alerts
    }

    pub fn take_alerts(&mut self) -> Vec<String> {
        std::mem::take(&mut self.alerts)
    }

    pub fn mount(&mut self) -> Vec<ListEvent> {
        let transition = self.view.mount();
        self.drive(transition)
    }

    pub fn dispatch(&mut self, command: ListCommand<E>) -> Vec<ListEvent> {
        let transition = self.view.dispatch(command);
        self.drive(transition)
    }

    fn drive(&mut self, first: Transition<E>) -> Vec<ListEvent> {
        let mut events = Vec::new();
        let mut pending = VecDeque::new();
        self.absorb(first, &mut events, &mut pending);

        while let Some(effect) = pending.pop_front() {
            let next = match effect {
                Effect::Remote(request) => {
                    let completion = execute(&self.remote, &request);
                    self.view.dispatch(ListCommand::Complete(completion))
                }
                Effect::Debounce(token) => self.view.dispatch(ListCommand::SearchSettled(token)),
            };
            self.absorb(next, &mut events, &mut pending);
        }
        events
    }

    fn absorb(
        &mut self,
        transition: Transition<E>,
        events: &mut Vec<ListEvent>,
        pending: &mut VecDeque<Effect<E>>,
    ) {
        for event in &transition.events {
            if let ListEvent::Alert(message) = event {
                self.alerts.push(message.clone());
            }
        }
        events.extend(transition.events);
        pending.extend(transition.effects);
    }
}

#[cfg(test)]
mod tests {
    use super::{Controller, RemoteCollection};
    use crate::{
        EntityId, ListCommand, ListEvent, ListQuery, PopularSkill, Skill, SkillDraft,
    };
    use anyhow::{Result, anyhow};
    use std::cell::RefCell;

    #[derive(Default)]
    struct ScriptedSkills {
        records: RefCell<Vec<Skill>>,
        queries: RefCell<Vec<ListQuery>>,
        reject_deletes: bool,
    }

    impl RemoteCollection<Skill> for ScriptedSkills {
        fn list(&self, query: &ListQuery) -> Result<Vec<Skill>> {
            self.queries.borrow_mut().push(query.clone());
            Ok(self.records.borrow().clone())
        }

        fn create(&self, draft: &SkillDraft) -> Result<()> {
            let id = EntityId::from(self.records.borrow().len() as i64 + 1);
            self.records.borrow_mut().push(Skill {
                id,
                name: draft.name.clone(),
                rating: draft.rating,
                reference: draft.reference.clone(),
            });
            Ok(())
        }

        fn update(&self, _id: &EntityId, _draft: &SkillDraft) -> Result<()> {
            Err(anyhow!("failed to update the skill"))
        }

        fn delete(&self, id: &EntityId) -> Result<()> {
            if self.reject_deletes {
                return Err(anyhow!("not found"));
            }
            self.records.borrow_mut().retain(|skill| &skill.id != id);
            Ok(())
        }

        fn popular(&self) -> Result<Option<PopularSkill>> {
            Ok(self.records.borrow().first().map(|skill| PopularSkill {
                name: skill.name.clone(),
                average_rating: skill.rating.unwrap_or_default() as f64,
            }))
        }
    }

    #[test]
    fn create_then_resync_shows_server_state() {
        let mut controller = Controller::new(ScriptedSkills::default());
        controller.mount();
        controller.dispatch(ListCommand::Create(SkillDraft {
            name: "Rust".to_owned(),
            rating: Some(5),
            reference: String::new(),
        }));

        let view = controller.view();
        assert_eq!(view.collection().len(), 1);
        assert_eq!(view.popularity().map(|p| p.name.as_str()), Some("Rust"));
        assert!(!view.is_loading());
        assert!(controller.alerts().is_empty());
    }

    #[test]
    fn rejected_delete_alerts_and_keeps_rows() {
        let remote = ScriptedSkills {
            reject_deletes: true,
            ..ScriptedSkills::default()
        };
        remote.records.borrow_mut().push(Skill {
            id: EntityId::from("a"),
            name: "Go".to_owned(),
            rating: Some(3),
            reference: String::new(),
        });
        let mut controller = Controller::new(remote);
        controller.mount();

        controller.dispatch(ListCommand::Delete(EntityId::from("a")));
        assert_eq!(controller.view().collection().len(), 1);
        assert_eq!(controller.view().error(), Some("not found"));
        assert_eq!(controller.take_alerts(), vec!["not found".to_owned()]);
    }

    #[test]
    fn search_settles_into_one_filtered_fetch() {
        let mut controller = Controller::new(ScriptedSkills::default());
        let events = controller.dispatch(ListCommand::SetSearch("java".to_owned()));
        assert!(events.contains(&ListEvent::FilterChanged));

        let queries = controller.remote().queries.borrow();
        assert_eq!(queries.len(), 1);
        assert_eq!(queries[0].search, "java");
    }
}
