// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::collections::{BTreeMap, HashMap};
use tracing::debug;

use crate::forms::{FormInput, parse_rating_filter};
use crate::ids::{EntityId, RequestId, SearchToken};
use crate::model::{Entity, EntityKind, PopularSkill};
use crate::query::ListQuery;
use crate::sort::{SortCriteria, project_sorted};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Operation {
    List,
    Popularity,
    Create,
    Update,
    Delete,
}

impl Operation {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::List => "list",
            Self::Popularity => "popularity",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }

    const fn past_tense(self) -> &'static str {
        match self {
            Self::List | Self::Popularity => "loaded",
            Self::Create => "added",
            Self::Update => "updated",
            Self::Delete => "deleted",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ModalKind<E> {
    Add,
    Edit(E),
    Delete(E),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModalPhase {
    Editing,
    Pending(RequestId),
    Failed(String),
}

/// The one dialog that may be open. Edit and delete always carry their
/// target record.
#[derive(Debug, Clone, PartialEq)]
pub struct ModalSession<E> {
    pub kind: ModalKind<E>,
    pub phase: ModalPhase,
}

impl<E> ModalSession<E> {
    pub fn target(&self) -> Option<&E> {
        match &self.kind {
            ModalKind::Add => None,
            ModalKind::Edit(target) | ModalKind::Delete(target) => Some(target),
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.phase, ModalPhase::Pending(_))
    }

    pub fn failure(&self) -> Option<&str> {
        match &self.phase {
            ModalPhase::Failed(message) => Some(message),
            ModalPhase::Editing | ModalPhase::Pending(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RemoteRequest<E: Entity> {
    List {
        request: RequestId,
        query: ListQuery,
    },
    Popularity {
        request: RequestId,
    },
    Create {
        request: RequestId,
        draft: E::Draft,
    },
    Update {
        request: RequestId,
        id: EntityId,
        draft: E::Draft,
    },
    Delete {
        request: RequestId,
        id: EntityId,
    },
}

impl<E: Entity> RemoteRequest<E> {
    pub fn request_id(&self) -> RequestId {
        match self {
            Self::List { request, .. }
            | Self::Popularity { request }
            | Self::Create { request, .. }
            | Self::Update { request, .. }
            | Self::Delete { request, .. } => *request,
        }
    }

    pub fn operation(&self) -> Operation {
        match self {
            Self::List { .. } => Operation::List,
            Self::Popularity { .. } => Operation::Popularity,
            Self::Create { .. } => Operation::Create,
            Self::Update { .. } => Operation::Update,
            Self::Delete { .. } => Operation::Delete,
        }
    }
}

/// Work the host must carry out on behalf of the view.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect<E: Entity> {
    Remote(RemoteRequest<E>),
    /// Wait out the debounce window, then send back `SearchSettled(token)`.
    Debounce(SearchToken),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<E> {
    Listed(Result<Vec<E>, String>),
    Popularity(Result<Option<PopularSkill>, String>),
    Mutated(Result<(), String>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Completion<E> {
    pub request: RequestId,
    pub outcome: Outcome<E>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ListCommand<E: Entity> {
    Load,
    LoadPopularity,
    OpenAdd,
    OpenEdit(E),
    OpenDelete(EntityId),
    CloseModal,
    Submit(E::Form),
    ConfirmDelete,
    Create(E::Draft),
    Update(EntityId, E::Draft),
    Delete(EntityId),
    SetSort(E::Field),
    SetSearch(String),
    SetMinRating(String),
    SearchSettled(SearchToken),
    Complete(Completion<E>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ListEvent {
    RequestIssued(Operation, RequestId),
    CollectionReplaced { count: usize },
    PopularityChanged,
    ModalOpened,
    ModalClosed,
    ModalFailed(String),
    SortChanged,
    FilterChanged,
    Status(String),
    Alert(String),
    ErrorRecorded(String),
    Refused(String),
    StaleResponseDropped(RequestId),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transition<E: Entity> {
    pub events: Vec<ListEvent>,
    pub effects: Vec<Effect<E>>,
}

impl<E: Entity> Default for Transition<E> {
    fn default() -> Self {
        Self {
            events: Vec::new(),
            effects: Vec::new(),
        }
    }
}

impl<E: Entity> Transition<E> {
    pub fn extend(&mut self, other: Self) {
        self.events.extend(other.events);
        self.effects.extend(other.effects);
    }

    pub fn alerts(&self) -> impl Iterator<Item = &str> {
        self.events.iter().filter_map(|event| match event {
            ListEvent::Alert(message) => Some(message.as_str()),
            _ => None,
        })
    }

    fn refuse(&mut self, message: impl Into<String>) {
        self.events.push(ListEvent::Refused(message.into()));
    }
}

/// Client-side copy of one remote collection plus everything the list page
/// shows around it. Every network round trip is expressed as an `Effect`
/// tagged with a request id; only the latest id per operation is applied.
#[derive(Debug, Clone, PartialEq)]
pub struct ListView<E: Entity> {
    collection: Vec<E>,
    error: Option<String>,
    modal: Option<ModalSession<E>>,
    sort: Option<SortCriteria<E::Field>>,
    query: ListQuery,
    rating_input: String,
    popularity: Option<PopularSkill>,
    popularity_error: Option<String>,
    in_flight: BTreeMap<Operation, RequestId>,
    last_request: RequestId,
    search_token: SearchToken,
}

impl<E: Entity> Default for ListView<E> {
    fn default() -> Self {
        Self {
            collection: Vec::new(),
            error: None,
            modal: None,
            sort: None,
            query: ListQuery::default(),
            rating_input: String::new(),
            popularity: None,
            popularity_error: None,
            in_flight: BTreeMap::new(),
            last_request: RequestId::new(0),
            search_token: SearchToken::new(0),
        }
    }
}

impl<E: Entity> ListView<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn collection(&self) -> &[E] {
        &self.collection
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn modal(&self) -> Option<&ModalSession<E>> {
        self.modal.as_ref()
    }

    pub fn sort(&self) -> Option<SortCriteria<E::Field>> {
        self.sort
    }

    pub fn query(&self) -> &ListQuery {
        &self.query
    }

    pub fn search_input(&self) -> &str {
        &self.query.search
    }

    pub fn rating_input(&self) -> &str {
        &self.rating_input
    }

    pub fn popularity(&self) -> Option<&PopularSkill> {
        self.popularity.as_ref()
    }

    /// Why the last popularity fetch failed. Kept apart from `error` so a
    /// later list success does not hide it.
    pub fn popularity_error(&self) -> Option<&str> {
        self.popularity_error.as_deref()
    }

    /// True while a list fetch or a mutation is outstanding. The popularity
    /// fetch has its own flag.
    pub fn is_loading(&self) -> bool {
        self.in_flight
            .keys()
            .any(|operation| *operation != Operation::Popularity)
    }

    pub fn is_popularity_loading(&self) -> bool {
        self.is_busy(Operation::Popularity)
    }

    pub fn is_busy(&self, operation: Operation) -> bool {
        self.in_flight.contains_key(&operation)
    }

    pub fn find(&self, id: &EntityId) -> Option<&E> {
        self.collection.iter().find(|entity| entity.id() == id)
    }

    pub fn projected(&self) -> Vec<&E> {
        project_sorted(&self.collection, self.sort)
    }

    /// Initial fetch for a freshly shown page.
    pub fn mount(&mut self) -> Transition<E> {
        let mut transition = self.dispatch(ListCommand::Load);
        if E::KIND == EntityKind::Skills {
            transition.extend(self.dispatch(ListCommand::LoadPopularity));
        }
        transition
    }

    pub fn dispatch(&mut self, command: ListCommand<E>) -> Transition<E> {
        let mut transition = Transition::default();
        match command {
            ListCommand::Load => self.issue_load(&mut transition),
            ListCommand::LoadPopularity => {
                if E::KIND == EntityKind::Skills {
                    self.issue_popularity(&mut transition);
                } else {
                    transition.refuse("popularity is only tracked for skills");
                }
            }
            ListCommand::OpenAdd => self.open_modal(ModalKind::Add, &mut transition),
            ListCommand::OpenEdit(target) => {
                self.open_modal(ModalKind::Edit(target), &mut transition);
            }
            ListCommand::OpenDelete(id) => match self.find(&id).cloned() {
                Some(target) => self.open_modal(ModalKind::Delete(target), &mut transition),
                None => transition.refuse(format!("no {} with id {id}", E::KIND.singular())),
            },
            ListCommand::CloseModal => {
                if self.modal.take().is_some() {
                    transition.events.push(ListEvent::ModalClosed);
                }
            }
            ListCommand::Submit(form) => self.submit(&form, &mut transition),
            ListCommand::ConfirmDelete => self.confirm_delete(&mut transition),
            ListCommand::Create(draft) => self.issue_create(draft, &mut transition),
            ListCommand::Update(id, draft) => self.issue_update(id, draft, &mut transition),
            ListCommand::Delete(id) => self.issue_delete(id, &mut transition),
            ListCommand::SetSort(field) => {
                self.sort = Some(SortCriteria::toggle(self.sort, field));
                transition.events.push(ListEvent::SortChanged);
            }
            ListCommand::SetSearch(text) => {
                if text != self.query.search {
                    self.query.search = text;
                    self.schedule_search(&mut transition);
                }
            }
            ListCommand::SetMinRating(raw) => match parse_rating_filter(&raw) {
                Ok(rating) => {
                    self.rating_input = raw.trim().to_owned();
                    if rating != self.query.min_rating {
                        self.query.min_rating = rating;
                        self.schedule_search(&mut transition);
                    }
                }
                Err(error) => transition.refuse(error.to_string()),
            },
            ListCommand::SearchSettled(token) => {
                if token == self.search_token {
                    self.issue_load(&mut transition);
                } else {
                    debug!(kind = E::KIND.as_str(), %token, "superseded search dropped");
                }
            }
            ListCommand::Complete(completion) => self.complete(completion, &mut transition),
        }
        transition
    }

    fn next_request(&mut self) -> RequestId {
        self.last_request = self.last_request.next();
        self.last_request
    }

    fn track(&mut self, operation: Operation, transition: &mut Transition<E>) -> RequestId {
        let request = self.next_request();
        if let Some(previous) = self.in_flight.insert(operation, request) {
            debug!(
                kind = E::KIND.as_str(),
                operation = operation.as_str(),
                %previous,
                %request,
                "request superseded"
            );
        }
        transition
            .events
            .push(ListEvent::RequestIssued(operation, request));
        request
    }

    fn issue_load(&mut self, transition: &mut Transition<E>) {
        let request = self.track(Operation::List, transition);
        transition
            .effects
            .push(Effect::Remote(RemoteRequest::List {
                request,
                query: self.query.clone(),
            }));
    }

    fn issue_popularity(&mut self, transition: &mut Transition<E>) {
        let request = self.track(Operation::Popularity, transition);
        transition
            .effects
            .push(Effect::Remote(RemoteRequest::Popularity { request }));
    }

    fn schedule_search(&mut self, transition: &mut Transition<E>) {
        self.search_token = self.search_token.next();
        transition.events.push(ListEvent::FilterChanged);
        transition.effects.push(Effect::Debounce(self.search_token));
    }

    fn open_modal(&mut self, kind: ModalKind<E>, transition: &mut Transition<E>) {
        if self.modal.is_some() {
            transition.refuse("close the open dialog first");
            return;
        }
        self.modal = Some(ModalSession {
            kind,
            phase: ModalPhase::Editing,
        });
        transition.events.push(ListEvent::ModalOpened);
    }

    fn submit(&mut self, form: &E::Form, transition: &mut Transition<E>) {
        let Some(modal) = &self.modal else {
            transition.refuse("no dialog is open");
            return;
        };
        if modal.is_pending() {
            transition.refuse("request already in flight");
            return;
        }
        let target = match &modal.kind {
            ModalKind::Add => None,
            ModalKind::Edit(target) => Some(target.id().clone()),
            ModalKind::Delete(_) => {
                transition.refuse("delete dialogs confirm, they do not submit");
                return;
            }
        };

        let draft = match form.to_draft() {
            Ok(draft) => draft,
            Err(error) => {
                let message = error.to_string();
                self.fail_modal(None, &message, transition);
                return;
            }
        };

        match target {
            None => self.issue_create(draft, transition),
            Some(id) => self.issue_update(id, draft, transition),
        }
    }

    fn confirm_delete(&mut self, transition: &mut Transition<E>) {
        let Some(modal) = &self.modal else {
            transition.refuse("no dialog is open");
            return;
        };
        if modal.is_pending() {
            transition.refuse("request already in flight");
            return;
        }
        let ModalKind::Delete(target) = &modal.kind else {
            transition.refuse("no delete dialog is open");
            return;
        };
        let id = target.id().clone();
        self.issue_delete(id, transition);
    }

    fn issue_create(&mut self, draft: E::Draft, transition: &mut Transition<E>) {
        if let Err(error) = crate::forms::Draft::validate(&draft) {
            self.fail_modal(None, &error.to_string(), transition);
            return;
        }
        if !self.admit(Operation::Create, transition) {
            return;
        }
        let request = self.track(Operation::Create, transition);
        self.attach_modal(Operation::Create, None, request);
        transition
            .effects
            .push(Effect::Remote(RemoteRequest::Create { request, draft }));
    }

    fn issue_update(&mut self, id: EntityId, draft: E::Draft, transition: &mut Transition<E>) {
        if let Err(error) = crate::forms::Draft::validate(&draft) {
            self.fail_modal(None, &error.to_string(), transition);
            return;
        }
        if !self.admit(Operation::Update, transition) {
            return;
        }
        let request = self.track(Operation::Update, transition);
        self.attach_modal(Operation::Update, Some(&id), request);
        transition
            .effects
            .push(Effect::Remote(RemoteRequest::Update { request, id, draft }));
    }

    fn issue_delete(&mut self, id: EntityId, transition: &mut Transition<E>) {
        if !self.admit(Operation::Delete, transition) {
            return;
        }
        let request = self.track(Operation::Delete, transition);
        self.attach_modal(Operation::Delete, Some(&id), request);
        transition
            .effects
            .push(Effect::Remote(RemoteRequest::Delete { request, id }));
    }

    /// One mutation of each kind at a time.
    fn admit(&self, operation: Operation, transition: &mut Transition<E>) -> bool {
        if self.is_busy(operation) {
            transition.refuse(format!(
                "{} {} already in progress",
                E::KIND.singular(),
                operation.as_str()
            ));
            return false;
        }
        true
    }

    fn attach_modal(&mut self, operation: Operation, id: Option<&EntityId>, request: RequestId) {
        let Some(modal) = &mut self.modal else {
            return;
        };
        let matches = match (&modal.kind, operation) {
            (ModalKind::Add, Operation::Create) => true,
            (ModalKind::Edit(target), Operation::Update)
            | (ModalKind::Delete(target), Operation::Delete) => Some(target.id()) == id,
            _ => false,
        };
        if matches {
            modal.phase = ModalPhase::Pending(request);
        }
    }

    /// Moves the open dialog to `Failed`. With a request id, only the dialog
    /// waiting on that request is affected. A local failure with no dialog
    /// open is refused instead.
    fn fail_modal(
        &mut self,
        request: Option<RequestId>,
        message: &str,
        transition: &mut Transition<E>,
    ) {
        let Some(modal) = &mut self.modal else {
            if request.is_none() {
                transition.refuse(message);
            }
            return;
        };
        if request.is_some_and(|request| modal.phase != ModalPhase::Pending(request)) {
            return;
        }
        modal.phase = ModalPhase::Failed(message.to_owned());
        transition
            .events
            .push(ListEvent::ModalFailed(message.to_owned()));
    }

    fn complete(&mut self, completion: Completion<E>, transition: &mut Transition<E>) {
        let Completion { request, outcome } = completion;
        let Some(operation) = self
            .in_flight
            .iter()
            .find(|(_, latest)| **latest == request)
            .map(|(operation, _)| *operation)
        else {
            debug!(kind = E::KIND.as_str(), %request, "stale response dropped");
            transition
                .events
                .push(ListEvent::StaleResponseDropped(request));
            return;
        };
        self.in_flight.remove(&operation);

        match outcome {
            Outcome::Listed(Ok(items)) => {
                self.collection = dedupe_by_id(items);
                self.error = None;
                transition.events.push(ListEvent::CollectionReplaced {
                    count: self.collection.len(),
                });
            }
            Outcome::Popularity(Ok(popularity)) => {
                self.popularity = popularity;
                self.popularity_error = None;
                transition.events.push(ListEvent::PopularityChanged);
            }
            Outcome::Popularity(Err(message)) => {
                debug!(kind = E::KIND.as_str(), %message, "popularity fetch failed");
                self.popularity_error = Some(message.clone());
                transition.events.push(ListEvent::ErrorRecorded(message));
            }
            Outcome::Listed(Err(message)) => {
                debug!(
                    kind = E::KIND.as_str(),
                    operation = operation.as_str(),
                    %message,
                    "fetch failed"
                );
                self.error = Some(message.clone());
                transition.events.push(ListEvent::ErrorRecorded(message));
            }
            Outcome::Mutated(Ok(())) => {
                if self
                    .modal
                    .as_ref()
                    .is_some_and(|modal| modal.phase == ModalPhase::Pending(request))
                {
                    self.modal = None;
                    transition.events.push(ListEvent::ModalClosed);
                }
                transition.events.push(ListEvent::Status(format!(
                    "{} {}",
                    E::KIND.singular(),
                    operation.past_tense()
                )));
                self.issue_load(transition);
                if E::KIND == EntityKind::Skills {
                    self.issue_popularity(transition);
                }
            }
            Outcome::Mutated(Err(message)) => {
                debug!(
                    kind = E::KIND.as_str(),
                    operation = operation.as_str(),
                    %message,
                    "mutation failed"
                );
                self.error = Some(message.clone());
                transition
                    .events
                    .push(ListEvent::ErrorRecorded(message.clone()));
                transition.events.push(ListEvent::Alert(message.clone()));
                self.fail_modal(Some(request), &message, transition);
            }
        }
    }
}

/// Later records win when the server repeats an id; the first position is
/// kept.
fn dedupe_by_id<E: Entity>(items: Vec<E>) -> Vec<E> {
    let mut positions: HashMap<EntityId, usize> = HashMap::with_capacity(items.len());
    let mut unique: Vec<E> = Vec::with_capacity(items.len());
    for item in items {
        match positions.get(item.id()) {
            Some(&position) => unique[position] = item,
            None => {
                positions.insert(item.id().clone(), unique.len());
                unique.push(item);
            }
        }
    }
    unique
}

#[cfg(test)]
mod tests {
    use super::{
        Completion, Effect, ListCommand, ListEvent, ListView, ModalKind, ModalPhase, Operation,
        Outcome, RemoteRequest, Transition,
    };
    use crate::{
        EntityId, Job, JobFormInput, JobStatus, ListQuery, PopularSkill, RequestId, Skill,
        SkillField, SkillFormInput,
    };

    fn skill(id: &str, name: &str, rating: Option<i64>) -> Skill {
        Skill {
            id: EntityId::from(id),
            name: name.to_owned(),
            rating,
            reference: String::new(),
        }
    }

    fn job(id: &str, title: &str) -> Job {
        Job {
            id: EntityId::from(id),
            title: title.to_owned(),
            company: "Acme".to_owned(),
            location: String::new(),
            status: JobStatus::Applied,
            date_applied: None,
            link: String::new(),
            notes: String::new(),
        }
    }

    fn requests<E: crate::Entity>(transition: &Transition<E>) -> Vec<RemoteRequest<E>> {
        transition
            .effects
            .iter()
            .filter_map(|effect| match effect {
                Effect::Remote(request) => Some(request.clone()),
                Effect::Debounce(_) => None,
            })
            .collect()
    }

    fn only_request<E: crate::Entity>(transition: &Transition<E>) -> RemoteRequest<E> {
        let mut all = requests(transition);
        assert_eq!(all.len(), 1, "expected exactly one request: {all:?}");
        all.remove(0)
    }

    fn listed<E>(request: RequestId, items: Vec<E>) -> ListCommand<E>
    where
        E: crate::Entity,
    {
        ListCommand::Complete(Completion {
            request,
            outcome: Outcome::Listed(Ok(items)),
        })
    }

    fn mutated<E: crate::Entity>(request: RequestId, result: Result<(), &str>) -> ListCommand<E> {
        ListCommand::Complete(Completion {
            request,
            outcome: Outcome::Mutated(result.map_err(str::to_owned)),
        })
    }

    fn loaded_skills(items: Vec<Skill>) -> ListView<Skill> {
        let mut view = ListView::<Skill>::new();
        let transition = view.dispatch(ListCommand::Load);
        let request = only_request(&transition).request_id();
        view.dispatch(listed(request, items));
        view
    }

    #[test]
    fn mount_fetches_list_and_popularity_for_skills() {
        let mut skills = ListView::<Skill>::new();
        let transition = skills.mount();
        let operations = requests(&transition)
            .iter()
            .map(RemoteRequest::operation)
            .collect::<Vec<_>>();
        assert_eq!(operations, vec![Operation::List, Operation::Popularity]);
        assert!(skills.is_loading());
        assert!(skills.is_popularity_loading());

        let mut jobs = ListView::<Job>::new();
        let transition = jobs.mount();
        assert_eq!(only_request(&transition).operation(), Operation::List);
    }

    #[test]
    fn load_success_replaces_collection_and_clears_loading() {
        let view = loaded_skills(vec![skill("1", "Rust", Some(4))]);
        assert_eq!(view.collection().len(), 1);
        assert!(!view.is_loading());
        assert_eq!(view.error(), None);
    }

    #[test]
    fn superseded_list_response_is_dropped() {
        let mut view = ListView::<Skill>::new();
        let first = only_request(&view.dispatch(ListCommand::Load)).request_id();
        let second = only_request(&view.dispatch(ListCommand::Load)).request_id();

        let late = view.dispatch(listed(first, vec![skill("old", "Old", None)]));
        assert_eq!(late.events, vec![ListEvent::StaleResponseDropped(first)]);
        assert!(view.collection().is_empty());
        assert!(view.is_loading());

        view.dispatch(listed(second, vec![skill("new", "New", None)]));
        assert_eq!(view.collection()[0].name, "New");
        assert!(!view.is_loading());
    }

    #[test]
    fn list_failure_keeps_collection_and_raises_no_alert() {
        let mut view = loaded_skills(vec![skill("1", "Rust", Some(4))]);
        let request = only_request(&view.dispatch(ListCommand::Load)).request_id();
        let transition = view.dispatch(ListCommand::Complete(Completion {
            request,
            outcome: Outcome::Listed(Err("network response was not ok".to_owned())),
        }));

        assert_eq!(view.collection().len(), 1);
        assert_eq!(view.error(), Some("network response was not ok"));
        assert_eq!(transition.alerts().count(), 0);
        assert!(!view.is_loading());
    }

    #[test]
    fn successful_create_closes_modal_and_resyncs() {
        let mut view = ListView::<Job>::new();
        view.dispatch(ListCommand::OpenAdd);
        let form = JobFormInput {
            title: "X".to_owned(),
            company: "Acme".to_owned(),
            ..JobFormInput::default()
        };
        let submitted = view.dispatch(ListCommand::Submit(form));
        let request = only_request(&submitted);
        assert_eq!(request.operation(), Operation::Create);
        assert_eq!(
            view.modal().map(|modal| modal.phase.clone()),
            Some(ModalPhase::Pending(request.request_id()))
        );

        let done = view.dispatch(mutated(request.request_id(), Ok(())));
        assert!(view.modal().is_none());
        assert!(done.events.contains(&ListEvent::Status("job added".to_owned())));
        assert!(view.collection().is_empty(), "no optimistic append");
        assert_eq!(only_request(&done).operation(), Operation::List);
    }

    #[test]
    fn skill_mutation_refreshes_popularity_too() {
        let mut view = loaded_skills(vec![skill("1", "Rust", Some(4))]);
        let issued = view.dispatch(ListCommand::Delete(EntityId::from("1")));
        let request = only_request(&issued).request_id();
        let done = view.dispatch(mutated(request, Ok(())));
        let operations = requests(&done)
            .iter()
            .map(RemoteRequest::operation)
            .collect::<Vec<_>>();
        assert_eq!(operations, vec![Operation::List, Operation::Popularity]);
    }

    #[test]
    fn failed_delete_keeps_modal_open_and_alerts() {
        let mut view = loaded_skills(vec![skill("1", "Rust", Some(4))]);
        view.dispatch(ListCommand::OpenDelete(EntityId::from("1")));
        let request = only_request(&view.dispatch(ListCommand::ConfirmDelete)).request_id();

        let failed = view.dispatch(mutated(request, Err("not found")));
        assert_eq!(view.collection().len(), 1);
        assert_eq!(view.error(), Some("not found"));
        assert_eq!(failed.alerts().collect::<Vec<_>>(), vec!["not found"]);
        let modal = view.modal().expect("modal stays open");
        assert_eq!(modal.failure(), Some("not found"));

        let retry = view.dispatch(ListCommand::ConfirmDelete);
        assert_eq!(only_request(&retry).operation(), Operation::Delete);
    }

    #[test]
    fn duplicate_submit_is_refused_while_pending() {
        let mut view = loaded_skills(vec![skill("1", "Rust", Some(4))]);
        let target = view.collection()[0].clone();
        view.dispatch(ListCommand::OpenEdit(target));
        let form = SkillFormInput {
            name: "Rust".to_owned(),
            rating: "5".to_owned(),
            reference: String::new(),
        };
        let first = view.dispatch(ListCommand::Submit(form.clone()));
        assert!(matches!(
            only_request(&first),
            RemoteRequest::Update { ref id, .. } if id.as_str() == "1"
        ));

        let second = view.dispatch(ListCommand::Submit(form));
        assert!(requests(&second).is_empty());
        assert!(matches!(second.events.as_slice(), [ListEvent::Refused(_)]));
    }

    #[test]
    fn invalid_form_fails_modal_without_network() {
        let mut view = ListView::<Skill>::new();
        view.dispatch(ListCommand::OpenAdd);
        let transition = view.dispatch(ListCommand::Submit(SkillFormInput {
            name: String::new(),
            rating: "3".to_owned(),
            reference: String::new(),
        }));
        assert!(requests(&transition).is_empty());
        let modal = view.modal().expect("modal remains");
        assert_eq!(modal.failure(), Some("skill name is required"));
    }

    #[test]
    fn delete_intent_resolves_target_from_collection() {
        let mut view = loaded_skills(vec![skill("1", "Rust", Some(4))]);
        let missing = view.dispatch(ListCommand::OpenDelete(EntityId::from("9")));
        assert!(matches!(missing.events.as_slice(), [ListEvent::Refused(_)]));
        assert!(view.modal().is_none());

        view.dispatch(ListCommand::OpenDelete(EntityId::from("1")));
        let modal = view.modal().expect("delete modal");
        assert!(matches!(&modal.kind, ModalKind::Delete(target) if target.name == "Rust"));
    }

    #[test]
    fn only_one_modal_at_a_time() {
        let mut view = ListView::<Job>::new();
        view.dispatch(ListCommand::OpenAdd);
        let second = view.dispatch(ListCommand::OpenEdit(job("1", "Engineer")));
        assert!(matches!(second.events.as_slice(), [ListEvent::Refused(_)]));
        assert!(matches!(
            view.modal().map(|modal| &modal.kind),
            Some(ModalKind::Add)
        ));

        view.dispatch(ListCommand::CloseModal);
        assert!(view.modal().is_none());
    }

    #[test]
    fn search_changes_are_debounced_by_token() {
        let mut view = ListView::<Skill>::new();
        let first = view.dispatch(ListCommand::SetSearch("ja".to_owned()));
        let second = view.dispatch(ListCommand::SetSearch("java".to_owned()));
        let (Some(Effect::Debounce(old)), Some(Effect::Debounce(latest))) =
            (first.effects.first(), second.effects.first())
        else {
            panic!("search changes should schedule debounce");
        };

        assert!(requests(&view.dispatch(ListCommand::SearchSettled(*old))).is_empty());

        view.dispatch(ListCommand::SetMinRating("3".to_owned()));
        assert!(requests(&view.dispatch(ListCommand::SearchSettled(*latest))).is_empty());

        let settled = view.dispatch(ListCommand::SearchSettled(latest.next()));
        assert_eq!(
            only_request(&settled),
            RemoteRequest::List {
                request: RequestId::new(1),
                query: ListQuery {
                    search: "java".to_owned(),
                    min_rating: Some(3),
                },
            }
        );
    }

    #[test]
    fn invalid_min_rating_is_refused() {
        let mut view = ListView::<Skill>::new();
        let transition = view.dispatch(ListCommand::SetMinRating("7".to_owned()));
        assert!(transition.effects.is_empty());
        assert_eq!(view.query().min_rating, None);
        assert_eq!(view.rating_input(), "");
    }

    #[test]
    fn duplicate_ids_collapse_to_latest_record() {
        let view = loaded_skills(vec![
            skill("1", "Rust", Some(2)),
            skill("2", "Go", Some(3)),
            skill("1", "Rust", Some(5)),
        ]);
        assert_eq!(view.collection().len(), 2);
        assert_eq!(view.collection()[0].rating, Some(5));
    }

    #[test]
    fn loading_tracks_each_operation_separately() {
        let mut view = loaded_skills(vec![skill("1", "Rust", Some(4))]);
        let list = only_request(&view.dispatch(ListCommand::Load)).request_id();
        let delete =
            only_request(&view.dispatch(ListCommand::Delete(EntityId::from("1")))).request_id();

        view.dispatch(listed(list, vec![skill("1", "Rust", Some(4))]));
        assert!(view.is_loading(), "delete still in flight");

        view.dispatch(ListCommand::Complete(Completion {
            request: delete,
            outcome: Outcome::Mutated(Err("boom".to_owned())),
        }));
        assert!(!view.is_loading());
    }

    #[test]
    fn popularity_result_is_stored() {
        let mut view = ListView::<Skill>::new();
        let request = only_request(&view.dispatch(ListCommand::LoadPopularity)).request_id();
        view.dispatch(ListCommand::Complete(Completion {
            request,
            outcome: Outcome::Popularity(Ok(Some(PopularSkill {
                name: "Rust".to_owned(),
                average_rating: 4.5,
            }))),
        }));
        assert_eq!(view.popularity().map(|p| p.name.as_str()), Some("Rust"));
        assert!(!view.is_popularity_loading());

        let mut jobs = ListView::<Job>::new();
        let refused = jobs.dispatch(ListCommand::LoadPopularity);
        assert!(refused.effects.is_empty());
    }

    #[test]
    fn popularity_failure_is_recorded_without_alert() {
        let mut view = ListView::<Skill>::new();
        let mounted = view.mount();
        let popularity = requests(&mounted)
            .into_iter()
            .find(|request| request.operation() == Operation::Popularity)
            .expect("popularity request")
            .request_id();

        let failed = view.dispatch(ListCommand::Complete(Completion {
            request: popularity,
            outcome: Outcome::Popularity(Err("Service Unavailable".to_owned())),
        }));
        assert_eq!(view.popularity_error(), Some("Service Unavailable"));
        assert!(!view.is_popularity_loading());
        assert!(view.is_loading(), "list fetch still outstanding");
        assert_eq!(failed.alerts().count(), 0);
        assert!(failed
            .events
            .contains(&ListEvent::ErrorRecorded("Service Unavailable".to_owned())));
    }

    #[test]
    fn list_success_keeps_popularity_failure_visible() {
        let mut view = ListView::<Skill>::new();
        let mounted = view.mount();
        for request in requests(&mounted) {
            let outcome = match request.operation() {
                Operation::List => Outcome::Listed(Ok(vec![skill("1", "Rust", Some(4))])),
                _ => Outcome::Popularity(Err("Service Unavailable".to_owned())),
            };
            view.dispatch(ListCommand::Complete(Completion {
                request: request.request_id(),
                outcome,
            }));
        }
        assert_eq!(view.collection().len(), 1);
        assert_eq!(view.error(), None);
        assert_eq!(view.popularity_error(), Some("Service Unavailable"));

        let reload = view.dispatch(ListCommand::LoadPopularity);
        view.dispatch(ListCommand::Complete(Completion {
            request: only_request(&reload).request_id(),
            outcome: Outcome::Popularity(Ok(None)),
        }));
        assert_eq!(view.popularity_error(), None);
    }

    #[test]
    fn invalid_draft_without_dialog_is_refused() {
        let mut view = ListView::<Skill>::new();
        let transition = view.dispatch(ListCommand::Create(crate::SkillDraft {
            name: "  ".to_owned(),
            rating: None,
            reference: String::new(),
        }));
        assert!(transition.effects.is_empty());
        assert!(matches!(
            transition.events.as_slice(),
            [ListEvent::Refused(message)] if message.contains("name")
        ));

        let transition = view.dispatch(ListCommand::Update(
            EntityId::from("1"),
            crate::SkillDraft {
                name: "Rust".to_owned(),
                rating: Some(9),
                reference: String::new(),
            },
        ));
        assert!(transition.effects.is_empty());
        assert!(matches!(transition.events.as_slice(), [ListEvent::Refused(_)]));
    }

    #[test]
    fn sort_toggle_feeds_projection() {
        let mut view = loaded_skills(vec![
            skill("1", "b", Some(1)),
            skill("2", "a", Some(2)),
        ]);
        view.dispatch(ListCommand::SetSort(SkillField::Name));
        assert_eq!(view.projected()[0].name, "a");
        view.dispatch(ListCommand::SetSort(SkillField::Name));
        assert_eq!(view.projected()[0].name, "b");
        assert_eq!(view.collection()[0].name, "b", "collection order untouched");
    }
}
