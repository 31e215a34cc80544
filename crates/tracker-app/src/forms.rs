// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, anyhow, bail};
use serde::Serialize;
use std::fmt;
use time::Date;
use time::macros::format_description;

use crate::model::JobStatus;

pub const MIN_RATING: i64 = 1;
pub const MAX_RATING: i64 = 5;

/// Request body for create and replace calls.
pub trait Draft: Clone + fmt::Debug + PartialEq + Serialize + Send + Sync + 'static {
    fn validate(&self) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormFieldSpec {
    pub label: &'static str,
    pub hint: &'static str,
}

/// Raw text a modal collects before it is parsed into a draft.
pub trait FormInput: Clone + fmt::Debug + PartialEq + Default + Send + 'static {
    type Draft: Draft;
    const FIELDS: &'static [FormFieldSpec];

    fn value(&self, index: usize) -> Option<&str>;
    fn value_mut(&mut self, index: usize) -> Option<&mut String>;
    fn to_draft(&self) -> Result<Self::Draft>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobDraft {
    pub title: String,
    pub company: String,
    pub location: String,
    pub status: JobStatus,
    #[serde(with = "crate::model::wire::optional_date")]
    pub date_applied: Option<Date>,
    pub link: String,
    pub notes: String,
}

impl Draft for JobDraft {
    fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            bail!("job title is required");
        }
        Ok(())
    }
}

/// Skills are replaced with exactly these three fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkillDraft {
    pub name: String,
    pub rating: Option<i64>,
    pub reference: String,
}

impl Draft for SkillDraft {
    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            bail!("skill name is required");
        }
        if let Some(rating) = self.rating
            && !(MIN_RATING..=MAX_RATING).contains(&rating)
        {
            bail!("rating must be between {MIN_RATING} and {MAX_RATING}, got {rating}");
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct JobFormInput {
    pub title: String,
    pub company: String,
    pub location: String,
    pub status: String,
    pub date_applied: String,
    pub link: String,
    pub notes: String,
}

impl FormInput for JobFormInput {
    type Draft = JobDraft;
    const FIELDS: &'static [FormFieldSpec] = &[
        FormFieldSpec {
            label: "title",
            hint: "required",
        },
        FormFieldSpec {
            label: "company",
            hint: "",
        },
        FormFieldSpec {
            label: "location",
            hint: "",
        },
        FormFieldSpec {
            label: "status",
            hint: "wishlist/applied/interviewing/offer/rejected/withdrawn",
        },
        FormFieldSpec {
            label: "applied",
            hint: "YYYY-MM-DD",
        },
        FormFieldSpec {
            label: "link",
            hint: "",
        },
        FormFieldSpec {
            label: "notes",
            hint: "",
        },
    ];

    fn value(&self, index: usize) -> Option<&str> {
        let value = match index {
            0 => &self.title,
            1 => &self.company,
            2 => &self.location,
            3 => &self.status,
            4 => &self.date_applied,
            5 => &self.link,
            6 => &self.notes,
            _ => return None,
        };
        Some(value.as_str())
    }

    fn value_mut(&mut self, index: usize) -> Option<&mut String> {
        match index {
            0 => Some(&mut self.title),
            1 => Some(&mut self.company),
            2 => Some(&mut self.location),
            3 => Some(&mut self.status),
            4 => Some(&mut self.date_applied),
            5 => Some(&mut self.link),
            6 => Some(&mut self.notes),
            _ => None,
        }
    }

    fn to_draft(&self) -> Result<JobDraft> {
        let status = if self.status.trim().is_empty() {
            JobStatus::default()
        } else {
            JobStatus::parse(&self.status).ok_or_else(|| {
                let choices = JobStatus::ALL
                    .iter()
                    .map(|status| status.as_str())
                    .collect::<Vec<_>>()
                    .join(", ");
                anyhow!("unknown status {:?}; use one of: {choices}", self.status)
            })?
        };

        let draft = JobDraft {
            title: self.title.trim().to_owned(),
            company: self.company.trim().to_owned(),
            location: self.location.trim().to_owned(),
            status,
            date_applied: parse_optional_date(&self.date_applied)?,
            link: self.link.trim().to_owned(),
            notes: self.notes.clone(),
        };
        draft.validate()?;
        Ok(draft)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SkillFormInput {
    pub name: String,
    pub rating: String,
    pub reference: String,
}

impl FormInput for SkillFormInput {
    type Draft = SkillDraft;
    const FIELDS: &'static [FormFieldSpec] = &[
        FormFieldSpec {
            label: "name",
            hint: "required",
        },
        FormFieldSpec {
            label: "rating",
            hint: "1-5",
        },
        FormFieldSpec {
            label: "reference",
            hint: "contact, course, link",
        },
    ];

    fn value(&self, index: usize) -> Option<&str> {
        let value = match index {
            0 => &self.name,
            1 => &self.rating,
            2 => &self.reference,
            _ => return None,
        };
        Some(value.as_str())
    }

    fn value_mut(&mut self, index: usize) -> Option<&mut String> {
        match index {
            0 => Some(&mut self.name),
            1 => Some(&mut self.rating),
            2 => Some(&mut self.reference),
            _ => None,
        }
    }

    fn to_draft(&self) -> Result<SkillDraft> {
        let draft = SkillDraft {
            name: self.name.trim().to_owned(),
            rating: parse_rating(&self.rating)?,
            reference: self.reference.trim().to_owned(),
        };
        draft.validate()?;
        Ok(draft)
    }
}

pub fn parse_rating(raw: &str) -> Result<Option<i64>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let rating: i64 = trimmed
        .parse()
        .map_err(|_| anyhow!("rating must be a whole number, got {trimmed:?}"))?;
    if !(MIN_RATING..=MAX_RATING).contains(&rating) {
        bail!("rating must be between {MIN_RATING} and {MAX_RATING}, got {rating}");
    }
    Ok(Some(rating))
}

/// Minimum-rating filter as typed by the user. Empty means no filter;
/// anything outside 1-5 never reaches the server.
pub fn parse_rating_filter(raw: &str) -> Result<Option<u8>> {
    Ok(parse_rating(raw)?.and_then(|rating| u8::try_from(rating).ok()))
}

pub fn parse_optional_date(raw: &str) -> Result<Option<Date>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    Date::parse(trimmed, format_description!("[year]-[month]-[day]"))
        .map(Some)
        .map_err(|_| anyhow!("invalid date {trimmed:?}; use YYYY-MM-DD"))
}
