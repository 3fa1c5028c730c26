#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::{
    collections::HashMap,
    io,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};
use updock::{
    errors::{ImageError, RuntimeError},
    image::RegistryReference,
    registry::{DigestLookup, DigestSource},
    runtime::RunningContainer,
    ContainerRuntime, ImageDescriptor, Resolver,
};

pub fn created_at(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap()
}

/// A runtime serving a fixed inventory from memory
#[derive(Default)]
pub struct StubRuntime {
    containers: Vec<RunningContainer>,
    images: HashMap<String, ImageDescriptor>,
    fail: bool,
}

impl StubRuntime {
    pub fn failing() -> Self {
        StubRuntime {
            fail: true,
            ..Default::default()
        }
    }

    /// Add a running container whose image has these tags and digests
    pub fn container(mut self, name: &str, repo_tags: &[&str], digests: &[&str]) -> Self {
        let n = self.containers.len();
        let image_id = format!("sha256:image{}", n);
        self.containers.push(RunningContainer {
            id: format!("container{}", n),
            name: format!("/{}", name),
            image: repo_tags.first().copied().unwrap_or("local-build").to_owned(),
            image_id: image_id.clone(),
            created: created_at(1_700_000_000 + n as i64),
            state: "running".to_owned(),
        });
        self.images.insert(
            image_id.clone(),
            ImageDescriptor::new(
                image_id,
                repo_tags.iter().map(|s| s.to_string()),
                digests.iter().map(|s| s.to_string()),
                "2023-11-01T00:00:00Z".to_owned(),
            ),
        );
        self
    }
}

#[async_trait]
impl ContainerRuntime for StubRuntime {
    async fn running_containers(&self) -> Result<Vec<RunningContainer>, RuntimeError> {
        if self.fail {
            return Err(io::Error::new(io::ErrorKind::Other, "daemon unavailable").into());
        }
        Ok(self.containers.clone())
    }

    async fn inspect_image(&self, image_id: &str) -> Result<ImageDescriptor, RuntimeError> {
        self.images
            .get(image_id)
            .cloned()
            .ok_or(RuntimeError::IncompleteContainer("an image"))
    }
}

/// Primary lookup answering from a table, with optional per-repository delay
#[derive(Default)]
pub struct StubSource {
    digests: HashMap<String, Option<String>>,
    delays: HashMap<String, Duration>,
    failing: Vec<String>,
    pub calls: AtomicUsize,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl StubSource {
    /// `reference` is the canonical `repository:tag` form
    pub fn digest(mut self, reference: &str, digest: Option<&str>) -> Self {
        self.digests
            .insert(reference.to_owned(), digest.map(str::to_owned));
        self
    }

    pub fn delay(mut self, reference: &str, delay: Duration) -> Self {
        self.delays.insert(reference.to_owned(), delay);
        self
    }

    pub fn fail(mut self, reference: &str) -> Self {
        self.failing.push(reference.to_owned());
        self
    }
}

#[async_trait]
impl DigestSource for StubSource {
    async fn manifest_digest(
        &self,
        reference: &RegistryReference,
    ) -> Result<Option<String>, ImageError> {
        let key = reference.to_string();
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let delay = self
            .delays
            .get(&key)
            .copied()
            .unwrap_or_else(|| Duration::from_millis(20));
        tokio::time::sleep(delay).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing.contains(&key) {
            return Err(ImageError::Lookup {
                image: key,
                message: "registry unreachable".to_owned(),
            });
        }
        Ok(self.digests.get(&key).cloned().flatten())
    }
}

/// Fallback lookup that remembers what it was asked for
#[derive(Default)]
pub struct StubLookup {
    digest: String,
    pub requests: Mutex<Vec<String>>,
}

impl StubLookup {
    pub fn answering(digest: &str) -> Self {
        StubLookup {
            digest: digest.to_owned(),
            ..Default::default()
        }
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl DigestLookup for StubLookup {
    async fn lookup_digest(&self, repo_tag: &str) -> Result<String, ImageError> {
        self.requests.lock().unwrap().push(repo_tag.to_owned());
        Ok(self.digest.clone())
    }
}

pub fn resolver(source: &Arc<StubSource>, lookup: &Arc<StubLookup>) -> Resolver {
    Resolver::new(source.clone(), lookup.clone())
}
