//! Reading the container inventory from the local container runtime

use crate::{
    errors::RuntimeError,
    image::{ContainerSnapshot, ImageDescriptor},
};
use async_trait::async_trait;
use bollard::{container::ListContainersOptions, models::ContainerSummary, Docker};
use chrono::{DateTime, Utc};

/// A running container as listed by the runtime, before image inspection
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunningContainer {
    pub id: String,
    pub name: String,
    pub image: String,
    pub image_id: String,
    pub created: DateTime<Utc>,
    pub state: String,
}

/// The two runtime queries an inventory pass needs
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// Every currently running container on this host
    async fn running_containers(&self) -> Result<Vec<RunningContainer>, RuntimeError>;

    /// Tags and recorded digests of a local image
    async fn inspect_image(&self, image_id: &str) -> Result<ImageDescriptor, RuntimeError>;
}

/// Take a fresh snapshot of all running containers and their images
///
/// Any runtime failure fails the whole inventory.
pub async fn snapshot_all(
    runtime: &dyn ContainerRuntime,
) -> Result<Vec<ContainerSnapshot>, RuntimeError> {
    let mut snapshots = Vec::new();
    for container in runtime.running_containers().await? {
        let image_info = runtime.inspect_image(&container.image_id).await?;
        snapshots.push(ContainerSnapshot {
            id: container.id,
            name: container.name,
            image: container.image,
            created: container.created,
            state: container.state,
            image_info,
        });
    }
    log::debug!("inventory has {} running containers", snapshots.len());
    Ok(snapshots)
}

/// [ContainerRuntime] backed by the Docker Engine API
#[derive(Clone)]
pub struct DockerRuntime {
    docker: Docker,
}

impl DockerRuntime {
    /// Connect using the platform defaults, honoring `DOCKER_HOST`
    pub fn connect() -> Result<Self, RuntimeError> {
        Ok(DockerRuntime::from_client(Docker::connect_with_local_defaults()?))
    }

    pub fn from_client(docker: Docker) -> Self {
        DockerRuntime { docker }
    }
}

#[async_trait]
impl ContainerRuntime for DockerRuntime {
    async fn running_containers(&self) -> Result<Vec<RunningContainer>, RuntimeError> {
        let options = ListContainersOptions::<String> {
            all: false,
            ..Default::default()
        };
        self.docker
            .list_containers(Some(options))
            .await?
            .into_iter()
            .map(running_container)
            .collect()
    }

    async fn inspect_image(&self, image_id: &str) -> Result<ImageDescriptor, RuntimeError> {
        let image = self.docker.inspect_image(image_id).await?;
        Ok(ImageDescriptor::new(
            image.id.unwrap_or_else(|| image_id.to_owned()),
            image.repo_tags.unwrap_or_default(),
            image.repo_digests.unwrap_or_default(),
            image.created.unwrap_or_default(),
        ))
    }
}

fn running_container(summary: ContainerSummary) -> Result<RunningContainer, RuntimeError> {
    Ok(RunningContainer {
        id: summary.id.ok_or(RuntimeError::IncompleteContainer("an id"))?,
        name: summary
            .names
            .and_then(|names| names.into_iter().next())
            .unwrap_or_default(),
        image: summary.image.unwrap_or_default(),
        image_id: summary
            .image_id
            .ok_or(RuntimeError::IncompleteContainer("an image id"))?,
        created: summary
            .created
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .ok_or(RuntimeError::IncompleteContainer("a creation time"))?,
        state: summary.state.unwrap_or_default(),
    })
}
