// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use time::Date;

use crate::forms::{Draft, FormInput, JobDraft, JobFormInput, SkillDraft, SkillFormInput};
use crate::ids::EntityId;
use crate::sort::{FieldValue, SortField, Sortable};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Jobs,
    Skills,
}

impl EntityKind {
    pub const ALL: [Self; 2] = [Self::Jobs, Self::Skills];

    /// Collection path segment on the backend.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Jobs => "jobs",
            Self::Skills => "skills",
        }
    }

    pub const fn singular(self) -> &'static str {
        match self {
            Self::Jobs => "job",
            Self::Skills => "skill",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "jobs" => Some(Self::Jobs),
            "skills" => Some(Self::Skills),
            _ => None,
        }
    }
}

impl<'de> Deserialize<'de> for JobStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        Ok(match Option::<wire::Loose>::deserialize(deserializer)? {
            None => Self::default(),
            Some(wire::Loose::Text(raw)) if raw.trim().is_empty() => Self::default(),
            Some(wire::Loose::Text(raw)) => Self::parse(&raw).unwrap_or(Self::Unknown),
            Some(_) => Self::Unknown,
        })
    }
}

/// One record of a tracked collection.
pub trait Entity:
    Sortable + Clone + fmt::Debug + PartialEq + DeserializeOwned + Send + Sync + 'static
{
    const KIND: EntityKind;
    type Draft: Draft;
    type Form: FormInput<Draft = Self::Draft>;

    fn id(&self) -> &EntityId;

    /// Short human label used by the delete confirmation.
    fn label(&self) -> String;

    /// Prefill for the edit modal.
    fn to_form(&self) -> Self::Form;

    fn from_draft(id: EntityId, draft: &Self::Draft) -> Self;
}

/// Decoding is lenient: case and surrounding space are ignored, `null` is the
/// default, and any other value becomes `Unknown` instead of failing the list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Wishlist,
    #[default]
    Applied,
    Interviewing,
    Offer,
    Rejected,
    Withdrawn,
    /// Sent by the server but not one of the states above. Never offered in
    /// forms; an edit has to pick a real state before it saves.
    Unknown,
}

impl JobStatus {
    pub const ALL: [Self; 6] = [
        Self::Wishlist,
        Self::Applied,
        Self::Interviewing,
        Self::Offer,
        Self::Rejected,
        Self::Withdrawn,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Wishlist => "wishlist",
            Self::Applied => "applied",
            Self::Interviewing => "interviewing",
            Self::Offer => "offer",
            Self::Rejected => "rejected",
            Self::Withdrawn => "withdrawn",
            Self::Unknown => "unknown",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "wishlist" => Some(Self::Wishlist),
            "applied" => Some(Self::Applied),
            "interviewing" => Some(Self::Interviewing),
            "offer" => Some(Self::Offer),
            "rejected" => Some(Self::Rejected),
            "withdrawn" => Some(Self::Withdrawn),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    #[serde(rename = "_id")]
    pub id: EntityId,
    #[serde(default, deserialize_with = "wire::nullable_string")]
    pub title: String,
    #[serde(default, deserialize_with = "wire::nullable_string")]
    pub company: String,
    #[serde(default, deserialize_with = "wire::nullable_string")]
    pub location: String,
    #[serde(default)]
    pub status: JobStatus,
    #[serde(default, with = "wire::optional_date")]
    pub date_applied: Option<Date>,
    #[serde(default, deserialize_with = "wire::nullable_string")]
    pub link: String,
    #[serde(default, deserialize_with = "wire::nullable_string")]
    pub notes: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobField {
    Company,
    Title,
    Location,
    Status,
    DateApplied,
}

impl SortField for JobField {
    const ALL: &'static [Self] = &[
        Self::Company,
        Self::Title,
        Self::Location,
        Self::Status,
        Self::DateApplied,
    ];

    fn label(self) -> &'static str {
        match self {
            Self::Company => "company",
            Self::Title => "title",
            Self::Location => "location",
            Self::Status => "status",
            Self::DateApplied => "applied",
        }
    }
}

impl Sortable for Job {
    type Field = JobField;

    fn field(&self, field: JobField) -> FieldValue {
        match field {
            JobField::Company => FieldValue::text(&self.company),
            JobField::Title => FieldValue::text(&self.title),
            JobField::Location => FieldValue::text(&self.location),
            JobField::Status => FieldValue::text(self.status.as_str()),
            JobField::DateApplied => FieldValue::Date(self.date_applied),
        }
    }
}

impl Entity for Job {
    const KIND: EntityKind = EntityKind::Jobs;
    type Draft = JobDraft;
    type Form = JobFormInput;

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn label(&self) -> String {
        match (self.title.trim(), self.company.trim()) {
            ("", "") => format!("job {}", self.id),
            (title, "") => title.to_owned(),
            ("", company) => company.to_owned(),
            (title, company) => format!("{title} at {company}"),
        }
    }

    fn to_form(&self) -> JobFormInput {
        JobFormInput {
            title: self.title.clone(),
            company: self.company.clone(),
            location: self.location.clone(),
            status: self.status.as_str().to_owned(),
            date_applied: self
                .date_applied
                .map(|date| date.to_string())
                .unwrap_or_default(),
            link: self.link.clone(),
            notes: self.notes.clone(),
        }
    }

    fn from_draft(id: EntityId, draft: &JobDraft) -> Self {
        Self {
            id,
            title: draft.title.clone(),
            company: draft.company.clone(),
            location: draft.location.clone(),
            status: draft.status,
            date_applied: draft.date_applied,
            link: draft.link.clone(),
            notes: draft.notes.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skill {
    #[serde(rename = "_id")]
    pub id: EntityId,
    #[serde(default, deserialize_with = "wire::nullable_string")]
    pub name: String,
    #[serde(default, deserialize_with = "wire::loose_rating")]
    pub rating: Option<i64>,
    #[serde(default, deserialize_with = "wire::nullable_string")]
    pub reference: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkillField {
    Name,
    Rating,
    Reference,
}

impl SortField for SkillField {
    const ALL: &'static [Self] = &[Self::Name, Self::Rating, Self::Reference];

    fn label(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Rating => "rating",
            Self::Reference => "reference",
        }
    }
}

impl Sortable for Skill {
    type Field = SkillField;

    fn field(&self, field: SkillField) -> FieldValue {
        match field {
            SkillField::Name => FieldValue::text(&self.name),
            SkillField::Rating => FieldValue::Integer(self.rating),
            SkillField::Reference => FieldValue::text(&self.reference),
        }
    }
}

impl Entity for Skill {
    const KIND: EntityKind = EntityKind::Skills;
    type Draft = SkillDraft;
    type Form = SkillFormInput;

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn label(&self) -> String {
        if self.name.trim().is_empty() {
            format!("skill {}", self.id)
        } else {
            self.name.clone()
        }
    }

    fn to_form(&self) -> SkillFormInput {
        SkillFormInput {
            name: self.name.clone(),
            rating: self.rating.map(|rating| rating.to_string()).unwrap_or_default(),
            reference: self.reference.clone(),
        }
    }

    fn from_draft(id: EntityId, draft: &SkillDraft) -> Self {
        Self {
            id,
            name: draft.name.clone(),
            rating: draft.rating,
            reference: draft.reference.clone(),
        }
    }
}

/// Server-computed summary of the most common skill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopularSkill {
    #[serde(rename = "_id")]
    pub name: String,
    #[serde(rename = "averageRating")]
    pub average_rating: f64,
}

impl PopularSkill {
    pub fn summary(&self) -> String {
        format!(
            "most popular: {} (avg {:.1})",
            self.name, self.average_rating
        )
    }
}

pub(crate) mod wire {
    use serde::de::IgnoredAny;
    use serde::{Deserialize, Deserializer};

    pub fn nullable_string<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
    }

    /// Any JSON scalar, for fields that tolerate the wrong type.
    #[derive(Deserialize)]
    #[serde(untagged)]
    pub(crate) enum Loose {
        Integer(i64),
        Float(f64),
        Text(String),
        Other(#[allow(dead_code)] IgnoredAny),
    }

    /// Integers, whole floats and numeric strings ("4") are ratings; any
    /// other value reads as unrated rather than failing the record.
    pub fn loose_rating<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<Loose>::deserialize(deserializer)? {
            Some(Loose::Integer(value)) => Some(value),
            Some(Loose::Float(value)) if value.fract() == 0.0 && value.abs() < 1e15 => {
                Some(value as i64)
            }
            Some(Loose::Text(text)) => text.trim().parse().ok(),
            Some(Loose::Float(_) | Loose::Other(_)) | None => None,
        })
    }

    /// `YYYY-MM-DD` on the wire. Full timestamps are accepted and truncated
    /// to their calendar date.
    pub mod optional_date {
        use serde::{Deserialize, Deserializer, Serializer};
        use time::Date;
        use time::macros::format_description;

        pub fn serialize<S>(value: &Option<Date>, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            match value {
                Some(date) => {
                    let text = date
                        .format(format_description!("[year]-[month]-[day]"))
                        .map_err(serde::ser::Error::custom)?;
                    serializer.serialize_some(&text)
                }
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Date>, D::Error>
        where
            D: Deserializer<'de>,
        {
            let Some(raw) = Option::<String>::deserialize(deserializer)? else {
                return Ok(None);
            };
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            let day = trimmed.get(..10).unwrap_or(trimmed);
            Date::parse(day, format_description!("[year]-[month]-[day]"))
                .map(Some)
                .map_err(serde::de::Error::custom)
        }
    }
}
