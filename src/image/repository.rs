use crate::errors::ImageError;
use regex::Regex;
use std::{fmt, str::FromStr};

/// Name of a Docker-style image repository
///
/// Repository names are path-like groupings of lowercase alphanumeric
/// segments separated by slashes. Each segment may also contain internal
/// separator characters: single periods, single underscores, double
/// underscores, or any number of dashes. Registry hostnames such as
/// `ghcr.io` fit the same grammar and are kept as the first segment.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Repository {
    serialized: String,
}

/// Iterator over components of a Repository path
pub struct RepositoryIter<'a> {
    remaining: Option<&'a str>,
}

impl<'a> Iterator for RepositoryIter<'a> {
    type Item = &'a str;
    fn next(&mut self) -> Option<Self::Item> {
        let remaining = self.remaining?;
        match remaining.split_once('/') {
            Some((first, rest)) => {
                self.remaining = Some(rest);
                Some(first)
            }
            None => {
                self.remaining = None;
                Some(remaining)
            }
        }
    }
}

impl Repository {
    pub fn as_str(&self) -> &str {
        &self.serialized
    }

    /// Parse a [prim@str] as a [Repository]
    ///
    /// ```
    /// # use updock::image::Repository;
    /// let repo = Repository::parse("some/path").unwrap();
    /// let parts: Vec<&str> = repo.iter().collect();
    /// assert_eq!(parts, vec!["some", "path"])
    /// ```
    pub fn parse(s: &str) -> Result<Self, ImageError> {
        lazy_static! {
            static ref RE: Regex = Regex::new(concat!(
                "^",
                "[a-z0-9]+",                // first path segment
                "(?:(?:[._]|__|[-]*)[a-z0-9]+)*",
                "(?:",                      // additional path segments
                /* */ "/",
                /* */ "[a-z0-9]+",
                /* */ "(?:(?:[._]|__|[-]*)[a-z0-9]+)*",
                ")*",
                "$",
            ))
            .unwrap();
        }
        if RE.is_match(s) {
            Ok(Repository {
                serialized: s.to_owned(),
            })
        } else {
            Err(ImageError::InvalidReferenceFormat(s.to_owned()))
        }
    }

    /// Produce an iterator over the slash-separated parts of a repository path
    pub fn iter(&self) -> RepositoryIter<'_> {
        RepositoryIter {
            remaining: Some(&self.serialized),
        }
    }

    /// Does this path have a namespace, i.e. more than one segment?
    pub fn has_namespace(&self) -> bool {
        self.iter().nth(1).is_some()
    }

    /// Join this path to another with a slash, forming a new repository path
    pub fn join(&self, other: &Self) -> Self {
        Repository {
            serialized: format!("{}/{}", self.serialized, other.serialized),
        }
    }
}

impl FromStr for Repository {
    type Err = ImageError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Repository::parse(s)
    }
}

impl fmt::Display for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}
