// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, bail};
use reqwest::blocking::{Client as HttpClient, Response};
use reqwest::header::ACCEPT;
use reqwest::{Method, StatusCode};
use serde::Deserialize;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt;
use std::marker::PhantomData;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use tracker_app::{
    Entity, EntityId, EntityKind, ListQuery, PopularSkill, RemoteCollection, collection_url,
    item_url, popularity_url,
};

pub const LIST_FALLBACK: &str = "network response was not ok";

/// Where the bearer token comes from. Asked once per request so a rotated
/// token file is picked up without a restart.
pub trait TokenSource: fmt::Debug + Send + Sync {
    fn token(&self) -> Result<Option<String>>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoToken;

impl TokenSource for NoToken {
    fn token(&self) -> Result<Option<String>> {
        Ok(None)
    }
}

#[derive(Clone)]
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

impl fmt::Debug for StaticToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("StaticToken(..)")
    }
}

impl TokenSource for StaticToken {
    fn token(&self) -> Result<Option<String>> {
        Ok(non_blank(&self.0))
    }
}

#[derive(Debug, Clone)]
pub struct EnvToken {
    var: String,
}

impl EnvToken {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl TokenSource for EnvToken {
    fn token(&self) -> Result<Option<String>> {
        match std::env::var(&self.var) {
            Ok(value) => Ok(non_blank(&value)),
            Err(std::env::VarError::NotPresent) => Ok(None),
            Err(error) => Err(error).with_context(|| format!("read token from ${}", self.var)),
        }
    }
}

/// A missing file means "not signed in", not an error.
#[derive(Debug, Clone)]
pub struct FileToken {
    path: PathBuf,
}

impl FileToken {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl TokenSource for FileToken {
    fn token(&self) -> Result<Option<String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => Ok(non_blank(&contents)),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(error) => {
                Err(error).with_context(|| format!("read token file {}", self.path.display()))
            }
        }
    }
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_owned())
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("cannot reach {base_url} -- is the tracker server running? ({source})")]
    Transport {
        base_url: String,
        #[source]
        source: reqwest::Error,
    },
    /// Display is the server's own message, verbatim.
    #[error("{message}")]
    Rejected { status: u16, message: String },
    #[error("{fallback}")]
    Status { status: u16, fallback: String },
    #[error("decode {what}: {source}")]
    Decode {
        what: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("auth token: {message}")]
    Token { message: String },
}

impl ApiError {
    /// HTTP status for errors the server answered with.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Rejected { status, .. } | Self::Status { status, .. } => Some(*status),
            Self::Transport { .. } | Self::Decode { .. } | Self::Token { .. } => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Client {
    base_url: Url,
    timeout: Duration,
    http: HttpClient,
    token: Arc<dyn TokenSource>,
}

impl Client {
    pub fn new(base_url: &str, timeout: Duration, token: Arc<dyn TokenSource>) -> Result<Self> {
        let trimmed = base_url.trim();
        if trimmed.is_empty() {
            bail!("server.base_url must not be empty");
        }
        let base_url =
            Url::parse(trimmed).with_context(|| format!("parse server.base_url {trimmed:?}"))?;
        if base_url.cannot_be_a_base() {
            bail!("server.base_url {trimmed:?} cannot carry a path");
        }

        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .context("build HTTP client")?;

        Ok(Self {
            base_url,
            timeout,
            http,
            token,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn collection<E: Entity>(&self) -> CollectionClient<E> {
        CollectionClient {
            client: self.clone(),
            entity: PhantomData,
        }
    }

    fn send<B>(&self, method: Method, url: Url, body: Option<&B>) -> Result<Response, ApiError>
    where
        B: Serialize + ?Sized,
    {
        let started = Instant::now();
        let mut request = self
            .http
            .request(method.clone(), url.clone())
            .header(ACCEPT, "application/json");
        let token = self.token.token().map_err(|error| ApiError::Token {
            message: format!("{error:#}"),
        })?;
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().map_err(|source| {
            warn!(%method, path = url.path(), error = %source, "request failed");
            ApiError::Transport {
                base_url: self.base_url.to_string(),
                source,
            }
        })?;
        debug!(
            %method,
            path = url.path(),
            status = response.status().as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "request finished"
        );
        Ok(response)
    }

    fn read_json<T: DeserializeOwned>(&self, response: Response, what: &str) -> Result<T, ApiError> {
        let body = self.read_body(response)?;
        serde_json::from_str(&body).map_err(|source| ApiError::Decode {
            what: what.to_owned(),
            source,
        })
    }

    fn read_body(&self, response: Response) -> Result<String, ApiError> {
        response.text().map_err(|source| ApiError::Transport {
            base_url: self.base_url.to_string(),
            source,
        })
    }
}

/// Turns a non-2xx mutation response into an error, preferring the
/// server's `{message}` over the generic fallback.
fn rejection(response: Response, fallback: String) -> ApiError {
    let status = response.status();
    let body = response.text().unwrap_or_default();
    match serde_json::from_str::<ErrorEnvelope>(&body) {
        Ok(ErrorEnvelope {
            message: Some(message),
        }) if !message.trim().is_empty() => ApiError::Rejected {
            status: status.as_u16(),
            message,
        },
        _ => ApiError::Status {
            status: status.as_u16(),
            fallback,
        },
    }
}

fn status_text(status: StatusCode) -> String {
    status
        .canonical_reason()
        .map(str::to_owned)
        .unwrap_or_else(|| status.as_u16().to_string())
}

/// Typed handle on one collection endpoint.
#[derive(Debug, Clone)]
pub struct CollectionClient<E> {
    client: Client,
    entity: PhantomData<fn() -> E>,
}

impl<E: Entity> CollectionClient<E> {
    fn mutation_fallback(verb: &str) -> String {
        format!("failed to {verb} the {}", E::KIND.singular())
    }

    fn mutate(
        &self,
        method: Method,
        url: Url,
        draft: Option<&E::Draft>,
        verb: &str,
    ) -> Result<(), ApiError> {
        let response = self.client.send(method, url, draft)?;
        if !response.status().is_success() {
            let error = rejection(response, Self::mutation_fallback(verb));
            warn!(kind = E::KIND.as_str(), verb, status = ?error.status(), %error, "mutation rejected");
            return Err(error);
        }
        // Bodies vary by endpoint and are never used; the list is re-read.
        Ok(())
    }
}

impl<E: Entity> RemoteCollection<E> for CollectionClient<E> {
    fn list(&self, query: &ListQuery) -> Result<Vec<E>> {
        let url = collection_url(&self.client.base_url, E::KIND, query)?;
        let response = self.client.send::<()>(Method::GET, url, None)?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                fallback: LIST_FALLBACK.to_owned(),
            }
            .into());
        }
        let items = self
            .client
            .read_json::<Vec<E>>(response, &format!("{} list", E::KIND.singular()))?;
        Ok(items)
    }

    fn create(&self, draft: &E::Draft) -> Result<()> {
        let url = collection_url(&self.client.base_url, E::KIND, &ListQuery::default())?;
        self.mutate(Method::POST, url, Some(draft), "add")?;
        Ok(())
    }

    fn update(&self, id: &EntityId, draft: &E::Draft) -> Result<()> {
        let url = item_url(&self.client.base_url, E::KIND, id)?;
        self.mutate(Method::PUT, url, Some(draft), "update")?;
        Ok(())
    }

    fn delete(&self, id: &EntityId) -> Result<()> {
        let url = item_url(&self.client.base_url, E::KIND, id)?;
        self.mutate(Method::DELETE, url, None, "delete")?;
        Ok(())
    }

    fn popular(&self) -> Result<Option<PopularSkill>> {
        if E::KIND != EntityKind::Skills {
            return Ok(None);
        }
        let url = popularity_url(&self.client.base_url)?;
        let response = self.client.send::<()>(Method::GET, url, None)?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                fallback: status_text(status),
            }
            .into());
        }
        let body = self.client.read_body(response)?;
        if body.trim().is_empty() {
            return Ok(None);
        }
        let popular = serde_json::from_str::<Option<PopularSkill>>(&body).map_err(|source| {
            ApiError::Decode {
                what: "popular skill".to_owned(),
                source,
            }
        })?;
        Ok(popular)
    }
}
