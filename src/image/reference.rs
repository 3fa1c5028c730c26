use crate::{
    errors::ImageError,
    image::{Repository, Tag},
};
use std::{fmt, str::FromStr};

/// Canonical `(repository, tag)` pair used to query a registry
///
/// Repositories without a namespace are placed under the registry's library
/// prefix, so `nginx:1.25` becomes `library/nginx` at tag `1.25`.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct RegistryReference {
    repository: Repository,
    tag: Tag,
}

impl RegistryReference {
    /// The default namespace for single-segment repositories
    pub const LIBRARY: &'static str = "library";

    /// Parse `repository:tag`, prefixing single-segment repositories
    ///
    /// The string is split at its first colon. Anything without a colon, or
    /// with a repository or tag that isn't valid Docker syntax, is rejected.
    ///
    /// ```
    /// # use updock::image::{RegistryReference, Repository};
    /// let library = Repository::parse("library").unwrap();
    /// let r = RegistryReference::parse("redis:7", Some(&library)).unwrap();
    /// assert_eq!(r.repository().as_str(), "library/redis");
    /// assert_eq!(r.tag().as_str(), "7");
    /// ```
    pub fn parse(repo_tag: &str, library_prefix: Option<&Repository>) -> Result<Self, ImageError> {
        let (repository, tag) = repo_tag
            .split_once(':')
            .ok_or_else(|| ImageError::InvalidReferenceFormat(repo_tag.to_owned()))?;
        let repository = Repository::parse(repository)?;
        let repository = match library_prefix {
            Some(prefix) if !repository.has_namespace() => prefix.join(&repository),
            _ => repository,
        };
        Ok(RegistryReference {
            repository,
            tag: Tag::parse(tag)?,
        })
    }

    pub fn repository(&self) -> &Repository {
        &self.repository
    }

    pub fn tag(&self) -> &Tag {
        &self.tag
    }
}

impl FromStr for RegistryReference {
    type Err = ImageError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let library = Repository::parse(RegistryReference::LIBRARY)?;
        RegistryReference::parse(s, Some(&library))
    }
}

impl fmt::Display for RegistryReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.repository, self.tag)
    }
}

impl fmt::Debug for RegistryReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}
