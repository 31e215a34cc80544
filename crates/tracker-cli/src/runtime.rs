// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::sync::Arc;
use std::time::Duration;
use tracker_api::Client;
use tracker_app::{Job, Skill};
use tracker_tui::{AppRuntime, SharedRemote};

/// Remote endpoints for both tabs plus the UI timing knobs.
pub struct TrackerRuntime {
    jobs: SharedRemote<Job>,
    skills: SharedRemote<Skill>,
    search_debounce: Duration,
}

impl TrackerRuntime {
    pub fn connect(client: &Client, search_debounce: Duration) -> Self {
        Self {
            jobs: Arc::new(client.collection::<Job>()),
            skills: Arc::new(client.collection::<Skill>()),
            search_debounce,
        }
    }

    /// Seeded in-memory endpoints; nothing leaves the process.
    pub fn demo(seed: u64, search_debounce: Duration) -> Self {
        Self {
            jobs: Arc::new(tracker_testkit::demo_jobs(seed)),
            skills: Arc::new(tracker_testkit::demo_skills(seed)),
            search_debounce,
        }
    }
}

impl AppRuntime for TrackerRuntime {
    fn jobs(&self) -> SharedRemote<Job> {
        Arc::clone(&self.jobs)
    }

    fn skills(&self) -> SharedRemote<Skill> {
        Arc::clone(&self.skills)
    }

    fn search_debounce(&self) -> Duration {
        self.search_debounce
    }
}
