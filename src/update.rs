//! Comparing local digests against upstream, one task per container

use crate::{
    errors::{ImageError, RuntimeError},
    image::{ContainerInfo, ContainerSnapshot, ImageDescriptor},
    registry::Resolver,
    runtime::{self, ContainerRuntime},
};
use futures_util::future::join_all;
use std::{fmt, str::FromStr, sync::Arc};
use tokio::{sync::Semaphore, task};

/// How a latest digest is compared against an image's known digests
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DigestComparison {
    /// Updatable when no known digest contains the latest one
    NoneContains,
    /// Compare every known digest in order and keep the last result
    ///
    /// Matches older deployments, where an image pulled under several
    /// repositories was judged by whichever digest was listed last.
    LastWrite,
}

impl Default for DigestComparison {
    fn default() -> Self {
        DigestComparison::NoneContains
    }
}

impl DigestComparison {
    /// Decide whether an image with these known digests is out of date
    pub fn is_updatable(self, known_digests: &[String], latest: &str) -> bool {
        match self {
            DigestComparison::NoneContains => {
                !latest.is_empty()
                    && !known_digests.is_empty()
                    && !known_digests.iter().any(|d| d.contains(latest))
            }
            DigestComparison::LastWrite => {
                let mut updatable = false;
                for digest in known_digests {
                    updatable = !digest.contains(latest);
                }
                updatable
            }
        }
    }
}

impl FromStr for DigestComparison {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none-contains" => Ok(DigestComparison::NoneContains),
            "last-write" => Ok(DigestComparison::LastWrite),
            other => Err(format!("unknown digest comparison {:?}", other)),
        }
    }
}

/// What one failed container check does to the rest of the batch
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Fail the whole request
    AbortBatch,
    /// Report that container as `unknown` with an error, keep the others
    Isolate,
}

impl Default for FailurePolicy {
    fn default() -> Self {
        FailurePolicy::AbortBatch
    }
}

impl FromStr for FailurePolicy {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "abort" => Ok(FailurePolicy::AbortBatch),
            "isolate" => Ok(FailurePolicy::Isolate),
            other => Err(format!("unknown failure policy {:?}", other)),
        }
    }
}

/// Latest upstream digest and the resulting verdict for one image
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UpdateVerdict {
    pub latest_digest: String,
    pub updatable: bool,
}

/// Resolve and compare digests for a single image
///
/// Images with no recorded digests are never updatable, and cause no
/// registry traffic at all.
pub async fn evaluate(
    resolver: &Resolver,
    comparison: DigestComparison,
    image: &ImageDescriptor,
) -> Result<UpdateVerdict, ImageError> {
    if image.digests.is_empty() {
        return Ok(UpdateVerdict::default());
    }
    let latest_digest = resolver.resolve(image.primary_tag()?).await?;
    let updatable = comparison.is_updatable(&image.digests, &latest_digest);
    Ok(UpdateVerdict {
        latest_digest,
        updatable,
    })
}

/// Builder for [UpdateChecker]
#[derive(Clone, Debug, Default)]
pub struct UpdateCheckerBuilder {
    comparison: DigestComparison,
    policy: FailurePolicy,
    concurrency: Option<usize>,
}

impl UpdateCheckerBuilder {
    pub fn comparison(mut self, comparison: DigestComparison) -> Self {
        self.comparison = comparison;
        self
    }

    pub fn failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Limit how many containers are resolved at the same time
    ///
    /// By default every container gets its own task right away. A limit of
    /// zero is the same as no limit.
    pub fn concurrency(mut self, limit: Option<usize>) -> Self {
        self.concurrency = limit.filter(|&n| n > 0);
        self
    }

    pub fn build(self, runtime: Arc<dyn ContainerRuntime>, resolver: Resolver) -> UpdateChecker {
        UpdateChecker {
            runtime,
            resolver: Arc::new(resolver),
            comparison: self.comparison,
            policy: self.policy,
            limit: self.concurrency.map(|n| Arc::new(Semaphore::new(n))),
        }
    }
}

/// Annotates the container inventory with update status
pub struct UpdateChecker {
    runtime: Arc<dyn ContainerRuntime>,
    resolver: Arc<Resolver>,
    comparison: DigestComparison,
    policy: FailurePolicy,
    limit: Option<Arc<Semaphore>>,
}

impl fmt::Debug for UpdateChecker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpdateChecker")
            .field("comparison", &self.comparison)
            .field("policy", &self.policy)
            .field("limit", &self.limit.as_ref().map(|s| s.available_permits()))
            .finish()
    }
}

impl UpdateChecker {
    pub fn builder() -> UpdateCheckerBuilder {
        UpdateCheckerBuilder::default()
    }

    /// List all running containers annotated with update status
    ///
    /// The inventory is read fresh, and every container is resolved again;
    /// nothing is cached between calls.
    pub async fn check_all(&self) -> Result<Vec<ContainerInfo>, RuntimeError> {
        let snapshots = runtime::snapshot_all(self.runtime.as_ref()).await?;
        self.annotate(snapshots).await
    }

    /// Check each snapshot concurrently, returning results in input order
    ///
    /// One task is spawned per snapshot and owns that snapshot's result.
    /// This returns only after every task has finished, even when the
    /// failure policy ends up rejecting the batch.
    pub async fn annotate(
        &self,
        snapshots: Vec<ContainerSnapshot>,
    ) -> Result<Vec<ContainerInfo>, RuntimeError> {
        let tasks = snapshots.into_iter().map(|snapshot| {
            let resolver = self.resolver.clone();
            let limit = self.limit.clone();
            let comparison = self.comparison;
            task::spawn(async move {
                let _permit = match limit {
                    Some(semaphore) => semaphore.acquire_owned().await.ok(),
                    None => None,
                };
                let verdict = evaluate(&resolver, comparison, &snapshot.image_info).await;
                (snapshot, verdict)
            })
        });
        let finished = join_all(tasks).await;

        let mut results = Vec::with_capacity(finished.len());
        for joined in finished {
            let (snapshot, verdict) = joined?;
            results.push(match verdict {
                Ok(verdict) => {
                    log::info!(
                        "{} {} latest {:?}, updatable: {}",
                        snapshot.name,
                        snapshot.image,
                        verdict.latest_digest,
                        verdict.updatable
                    );
                    ContainerInfo::checked(snapshot, verdict.latest_digest, verdict.updatable)
                }
                Err(err) => match self.policy {
                    FailurePolicy::AbortBatch => {
                        log::error!("{} {} update check failed, {}", snapshot.name, snapshot.image, err);
                        return Err(err.into());
                    }
                    FailurePolicy::Isolate => {
                        log::warn!("{} {} update check failed, {}", snapshot.name, snapshot.image, err);
                        ContainerInfo::failed(snapshot, &err)
                    }
                },
            });
        }
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn digests(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn single_digest() {
        let known = digests(&["app@sha256:aaa"]);
        for &mode in &[DigestComparison::NoneContains, DigestComparison::LastWrite] {
            assert!(mode.is_updatable(&known, "sha256:bbb"));
            assert!(!mode.is_updatable(&known, "sha256:aaa"));
        }
    }

    #[test]
    fn empty_known_digests() {
        for &mode in &[DigestComparison::NoneContains, DigestComparison::LastWrite] {
            assert!(!mode.is_updatable(&[], "sha256:bbb"));
            assert!(!mode.is_updatable(&[], ""));
        }
    }

    #[test]
    fn empty_latest_digest() {
        let known = digests(&["app@sha256:aaa", "mirror/app@sha256:ccc"]);
        for &mode in &[DigestComparison::NoneContains, DigestComparison::LastWrite] {
            assert!(!mode.is_updatable(&known, ""));
        }
    }

    #[test]
    fn multi_digest_all_contain_latest() {
        let known = digests(&["app@sha256:aaa", "mirror.io/app@sha256:aaa"]);
        for &mode in &[DigestComparison::NoneContains, DigestComparison::LastWrite] {
            assert!(!mode.is_updatable(&known, "sha256:aaa"));
        }
    }

    #[test]
    fn multi_digest_only_first_matches() {
        let known = digests(&["app@sha256:aaa", "mirror.io/app@sha256:old"]);
        assert!(!DigestComparison::NoneContains.is_updatable(&known, "sha256:aaa"));
        assert!(DigestComparison::LastWrite.is_updatable(&known, "sha256:aaa"));
    }

    #[test]
    fn multi_digest_only_last_matches() {
        let known = digests(&["mirror.io/app@sha256:old", "app@sha256:aaa"]);
        assert!(!DigestComparison::NoneContains.is_updatable(&known, "sha256:aaa"));
        assert!(!DigestComparison::LastWrite.is_updatable(&known, "sha256:aaa"));
    }

    #[test]
    fn multi_digest_none_match() {
        let known = digests(&["app@sha256:aaa", "mirror.io/app@sha256:ccc"]);
        for &mode in &[DigestComparison::NoneContains, DigestComparison::LastWrite] {
            assert!(mode.is_updatable(&known, "sha256:bbb"));
        }
    }

    #[test]
    fn parse_settings() {
        assert_eq!("last-write".parse::<DigestComparison>(), Ok(DigestComparison::LastWrite));
        assert_eq!(
            "none-contains".parse::<DigestComparison>(),
            Ok(DigestComparison::NoneContains)
        );
        assert!("any".parse::<DigestComparison>().is_err());
        assert_eq!("isolate".parse::<FailurePolicy>(), Ok(FailurePolicy::Isolate));
        assert_eq!("abort".parse::<FailurePolicy>(), Ok(FailurePolicy::AbortBatch));
        assert!("retry".parse::<FailurePolicy>().is_err());
        assert_eq!(DigestComparison::default(), DigestComparison::NoneContains);
        assert_eq!(FailurePolicy::default(), FailurePolicy::AbortBatch);
    }

    #[test]
    fn zero_concurrency_is_unbounded() {
        let builder = UpdateChecker::builder().concurrency(Some(0));
        assert_eq!(builder.concurrency, None);
        let builder = UpdateChecker::builder().concurrency(Some(4));
        assert_eq!(builder.concurrency, Some(4));
    }
}
