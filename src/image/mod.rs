//! Container images as seen by the local runtime, and their identity upstream


mod reference;
mod repository;
mod tag;

pub use reference::RegistryReference;
pub use repository::{Repository, RepositoryIter};
pub use tag::Tag;

use crate::errors::ImageError;
use chrono::{DateTime, Utc};

/// Metadata for the image a container is running
///
/// Repository tags are kept in `repository:tag` form. Digests are the
/// `repository@sha256:...` strings the runtime recorded when the image was
/// pulled; locally built images usually have none.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageDescriptor {
    pub id: String,
    pub repo_tags: Vec<String>,
    pub digests: Vec<String>,
    pub created: String,
}

impl ImageDescriptor {
    /// Build a descriptor from raw runtime data, normalizing repository tags
    ///
    /// Any `@digest` suffix is dropped from each tag, as is anything after a
    /// second colon. Entries with no tag separator at all are skipped.
    pub fn new<T, D>(id: String, repo_tags: T, digests: D, created: String) -> Self
    where
        T: IntoIterator<Item = String>,
        D: IntoIterator<Item = String>,
    {
        ImageDescriptor {
            id,
            repo_tags: repo_tags
                .into_iter()
                .filter_map(|tag| normalize_repo_tag(&tag))
                .collect(),
            digests: digests.into_iter().collect(),
            created,
        }
    }

    /// The tag used to look up this image upstream
    pub fn primary_tag(&self) -> Result<&str, ImageError> {
        self.repo_tags
            .first()
            .map(String::as_str)
            .ok_or_else(|| ImageError::MissingRepoTag(self.id.clone()))
    }
}

fn normalize_repo_tag(repo_tag: &str) -> Option<String> {
    let without_digest = repo_tag.splitn(2, '@').next().unwrap_or_default();
    let mut parts = without_digest.splitn(3, ':');
    match (parts.next(), parts.next()) {
        (Some(repository), Some(tag)) => Some(format!("{}:{}", repository, tag)),
        _ => None,
    }
}

/// One running container, read fresh from the runtime on every inventory pass
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContainerSnapshot {
    pub id: String,
    pub name: String,
    pub image: String,
    pub created: DateTime<Utc>,
    pub state: String,
    pub image_info: ImageDescriptor,
}

/// A container annotated with its update status
///
/// This is the record served to callers. `error` is only present when the
/// checker isolates per-container failures and this container's check failed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerInfo {
    pub id: String,
    pub name: String,
    pub image: String,
    pub latest_sha: String,
    pub updatable: bool,
    pub build_at: DateTime<Utc>,
    pub status: String,
    pub image_info: ImageDescriptor,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Status reported for a container whose update check failed
pub const STATUS_UNKNOWN: &str = "unknown";

impl ContainerInfo {
    pub(crate) fn checked(snapshot: ContainerSnapshot, latest_sha: String, updatable: bool) -> Self {
        ContainerInfo {
            id: snapshot.id,
            name: snapshot.name,
            image: snapshot.image,
            latest_sha,
            updatable,
            build_at: snapshot.created,
            status: snapshot.state,
            image_info: snapshot.image_info,
            error: None,
        }
    }

    pub(crate) fn failed(snapshot: ContainerSnapshot, err: &ImageError) -> Self {
        ContainerInfo {
            status: STATUS_UNKNOWN.to_owned(),
            error: Some(err.to_string()),
            ..ContainerInfo::checked(snapshot, String::new(), false)
        }
    }
}
