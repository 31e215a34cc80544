// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod remote;

pub use remote::{InMemoryRemote, RemoteCall, most_popular};

use time::macros::date;
use time::{Date, Duration};
use tracker_app::{Entity, EntityId, Job, JobDraft, JobStatus, Skill, SkillDraft};

const COMPANIES: [&str; 14] = [
    "Northwind",
    "Globex",
    "Initech",
    "Umbrella Labs",
    "Hooli",
    "Stark Industries",
    "Wayne Enterprises",
    "Cyberdyne",
    "Soylent",
    "Vandelay Industries",
    "Pied Piper",
    "Aperture Science",
    "Tyrell Corp",
    "Acme",
];

const TITLE_LEVELS: [&str; 5] = ["Junior", "", "Senior", "Staff", "Principal"];
const TITLE_ROLES: [&str; 10] = [
    "Backend Engineer",
    "Frontend Engineer",
    "Platform Engineer",
    "Data Engineer",
    "Site Reliability Engineer",
    "Security Engineer",
    "Mobile Developer",
    "Full Stack Developer",
    "Embedded Engineer",
    "Engineering Manager",
];

const LOCATIONS: [&str; 12] = [
    "Remote",
    "Austin, TX",
    "Seattle, WA",
    "Denver, CO",
    "Madison, WI",
    "Raleigh, NC",
    "Pittsburgh, PA",
    "Portland, OR",
    "Boise, ID",
    "Nashville, TN",
    "Columbus, OH",
    "Minneapolis, MN",
];

const SKILL_NAMES: [&str; 16] = [
    "Rust",
    "Go",
    "Python",
    "TypeScript",
    "SQL",
    "Kubernetes",
    "Terraform",
    "React",
    "PostgreSQL",
    "Kafka",
    "Java",
    "JavaScript",
    "Docker",
    "GraphQL",
    "Linux",
    "C++",
];

const SKILL_REFERENCES: [&str; 8] = [
    "",
    "side project",
    "current job",
    "online course",
    "conference talk",
    "open source contributions",
    "university coursework",
    "certification",
];

const LINK_HOSTS: [&str; 4] = [
    "jobs.example.com",
    "careers.example.org",
    "boards.example.net",
    "apply.example.io",
];

struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }
}

/// Reproducible job-hunt data. The same seed always yields the same drafts.
pub struct TrackerFaker {
    rng: DeterministicRng,
    seed: u64,
}

impl TrackerFaker {
    pub fn new(seed: u64) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
            seed: normalized,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn job(&mut self) -> JobDraft {
        let level = self.pick(&TITLE_LEVELS);
        let role = self.pick(&TITLE_ROLES);
        let title = if level.is_empty() {
            role.to_owned()
        } else {
            format!("{level} {role}")
        };
        let company = self.pick(&COMPANIES);
        let status = JobStatus::ALL[self.rng.int_n(JobStatus::ALL.len())];
        // Wishlist entries have not been sent anywhere yet.
        let date_applied = (status != JobStatus::Wishlist).then(|| self.date_in_last_days(120));
        let link = format!(
            "https://{}/{}/{}",
            self.pick(&LINK_HOSTS),
            slug(company),
            self.int_range(1000, 99_999)
        );

        JobDraft {
            title,
            company: company.to_owned(),
            location: self.pick(&LOCATIONS).to_owned(),
            status,
            date_applied,
            link,
            notes: String::new(),
        }
    }

    pub fn skill(&mut self) -> SkillDraft {
        let rating = self.int_range(1, 5);
        SkillDraft {
            name: self.pick(&SKILL_NAMES).to_owned(),
            rating: Some(rating),
            reference: self.pick(&SKILL_REFERENCES).to_owned(),
        }
    }

    /// Records with sequential ids starting at 1.
    pub fn jobs(&mut self, count: usize) -> Vec<Job> {
        (1..=count)
            .map(|index| {
                let draft = self.job();
                Job::from_draft(EntityId::from(index as i64), &draft)
            })
            .collect()
    }

    pub fn skills(&mut self, count: usize) -> Vec<Skill> {
        (1..=count)
            .map(|index| {
                let draft = self.skill();
                Skill::from_draft(EntityId::from(index as i64), &draft)
            })
            .collect()
    }

    pub fn date_in_last_days(&mut self, days: i64) -> Date {
        let offset = self.int_range(0, days.max(0));
        reference_date() - Duration::days(offset)
    }

    fn pick<'a>(&mut self, items: &'a [&'a str]) -> &'a str {
        items[self.rng.int_n(items.len())]
    }

    fn int_range(&mut self, min: i64, max: i64) -> i64 {
        if max <= min {
            return min;
        }
        let span = max - min + 1;
        min + (self.rng.next_u64() % (span as u64)) as i64
    }
}

fn slug(value: &str) -> String {
    value
        .split_whitespace()
        .map(str::to_ascii_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

/// Fixed "today" so generated dates never depend on the wall clock.
pub const fn reference_date() -> Date {
    date!(2026 - 03 - 02)
}

pub fn skill_names() -> &'static [&'static str] {
    &SKILL_NAMES
}

/// Demo endpoints preloaded with generated records.
pub fn demo_jobs(seed: u64) -> InMemoryRemote<Job> {
    InMemoryRemote::jobs(TrackerFaker::new(seed).jobs(18))
}

pub fn demo_skills(seed: u64) -> InMemoryRemote<Skill> {
    InMemoryRemote::skills(TrackerFaker::new(seed).skills(24))
}
