//! Legacy component metadata resolution.
//!
//! # Responsibility
//! - Find the one legacy component row behind an element key.
//! - Retry ambiguous or missing keys with ordered key normalizations.
//! - Decode the matched row's `extra` settings.
//!
//! # Invariants
//! - Exactly one matching row is a success; zero or several rows are not.
//! - Fallback is single-shot: every pattern rewrites the original key and the
//!   retry itself runs with fallback disabled, so two normalizations are never
//!   chained (`fieldset_contact_2` does not resolve to `contact`).
//! - Only `NotFound` moves the loop to the next pattern; store failures abort.

use crate::codec::php_serialized::ExtraData;
use crate::codec::CodecError;
use crate::model::component::LegacyComponentRecord;
use crate::repo::component_repo::{LegacyComponentRepository, RepoError};
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;
use std::error::Error;
use std::fmt::{Display, Formatter};

static FIELDSET_SEGMENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"fieldset_").expect("valid fieldset segment regex"));
static DEPTH_SUFFIX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"_[0-9]+$").expect("valid depth suffix regex"));

pub type MigrateResult<T> = Result<T, MigrateError>;

/// Failure while migrating one document.
#[derive(Debug)]
pub enum MigrateError {
    /// No unique legacy component matched the key or any fallback key.
    NotFound {
        form_key: String,
        nid: i64,
        /// Rows matched by the original key.
        match_count: usize,
    },
    /// A legacy payload or the incoming tree could not be decoded.
    Deserialization(CodecError),
    /// The legacy store itself failed.
    Repo(RepoError),
}

impl Display for MigrateError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound {
                form_key,
                nid,
                match_count,
            } => write!(
                f,
                "failed to match form key `{form_key}` with nid {nid} in legacy webform_component table - found {match_count} rows"
            ),
            Self::Deserialization(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for MigrateError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::NotFound { .. } => None,
            Self::Deserialization(err) => Some(err),
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<RepoError> for MigrateError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<CodecError> for MigrateError {
    fn from(value: CodecError) -> Self {
        Self::Deserialization(value)
    }
}

/// Key rewrites tried, in order, when a form key has no unique match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackPattern {
    /// Legacy fieldsets were often keyed without the `fieldset_` marker.
    FieldsetSegment,
    /// The upgrade path appends `_<depth>` to keys to keep them unique.
    DepthSuffix,
}

impl FallbackPattern {
    pub const ORDERED: [Self; 2] = [Self::FieldsetSegment, Self::DepthSuffix];

    pub fn name(self) -> &'static str {
        match self {
            Self::FieldsetSegment => "fieldset_segment",
            Self::DepthSuffix => "depth_suffix",
        }
    }

    /// Rewrites `form_key`; borrowed output means nothing changed.
    pub fn normalize(self, form_key: &str) -> Cow<'_, str> {
        match self {
            Self::FieldsetSegment => FIELDSET_SEGMENT_RE.replace_all(form_key, ""),
            Self::DepthSuffix => DEPTH_SUFFIX_RE.replace(form_key, ""),
        }
    }
}

/// Resolves element keys against the legacy component store.
pub struct LegacyMetadataResolver<R: LegacyComponentRepository> {
    repo: R,
}

impl<R: LegacyComponentRepository> LegacyMetadataResolver<R> {
    /// Creates a resolver reading from `repo`.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Returns the unique component row for `form_key` on node `nid`.
    ///
    /// With `allow_fallback`, a missing or ambiguous key is retried once per
    /// [`FallbackPattern`], in order, stopping at the first unique match.
    ///
    /// # Errors
    /// - `NotFound` carrying the original key, `nid` and the original match
    ///   count when every attempt fails.
    /// - `Repo` as soon as the store fails.
    pub fn resolve_component_data(
        &self,
        nid: i64,
        form_key: &str,
        allow_fallback: bool,
    ) -> MigrateResult<LegacyComponentRecord> {
        let mut rows = self.repo.query_component(nid, form_key)?;
        if rows.len() == 1 {
            if let Some(record) = rows.pop() {
                return Ok(record);
            }
        }
        let match_count = rows.len();

        if allow_fallback {
            for pattern in FallbackPattern::ORDERED {
                let normalized = pattern.normalize(form_key);
                if normalized == form_key {
                    continue;
                }

                match self.resolve_component_data(nid, &normalized, false) {
                    Ok(record) => {
                        debug!(
                            "event=component_resolve module=resolver status=fallback nid={} form_key={} pattern={} matched_key={}",
                            nid,
                            form_key,
                            pattern.name(),
                            normalized
                        );
                        return Ok(record);
                    }
                    Err(MigrateError::NotFound { .. }) => continue,
                    Err(err) => return Err(err),
                }
            }
        }

        Err(MigrateError::NotFound {
            form_key: form_key.to_string(),
            nid,
            match_count,
        })
    }

    /// Resolves the component row and decodes its `extra` settings.
    pub fn resolve_extra_data(
        &self,
        nid: i64,
        form_key: &str,
        allow_fallback: bool,
    ) -> MigrateResult<ExtraData> {
        let record = self.resolve_component_data(nid, form_key, allow_fallback)?;
        Ok(ExtraData::from_blob(&record.extra)?)
    }
}
