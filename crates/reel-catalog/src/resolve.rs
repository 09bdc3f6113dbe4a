//! Dependent resolution and record staging.
//!
//! A record draft names up to three people. Each is either a reference to an
//! existing person (`id` set) or a person to create. They are resolved in a
//! fixed order, operator then director then screenwriter, inside the
//! caller's transaction, so people created for a record vanish with it on
//! rollback.

use core::fmt;

use chrono::{DateTime, Utc};
use reel_types::{NewRecord, PersonDraft, PersonId, Record, RecordDraft};

use crate::error::{CatalogError, ValidationError};
use crate::guard::{ensure_person_unique, ensure_record_unique};
use crate::store::CatalogTx;
use crate::validator::{ResolvedPeople, validate_person, validate_record};

/// The role a person plays for a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependentRole {
    /// Mandatory.
    Operator,
    /// Optional.
    Director,
    /// Optional.
    Screenwriter,
}

/// Order in which dependents are resolved.
pub const RESOLUTION_ORDER: [DependentRole; 3] = [
    DependentRole::Operator,
    DependentRole::Director,
    DependentRole::Screenwriter,
];

impl DependentRole {
    /// Field name in drafts and payloads.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Operator => "operator",
            Self::Director => "director",
            Self::Screenwriter => "screenwriter",
        }
    }

    /// The draft's person for this role, if any.
    pub const fn pick(self, draft: &RecordDraft) -> Option<&PersonDraft> {
        match self {
            Self::Operator => draft.operator.as_ref(),
            Self::Director => draft.director.as_ref(),
            Self::Screenwriter => draft.screenwriter.as_ref(),
        }
    }
}

impl fmt::Display for DependentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Resolve one dependent to an identity, creating the person if needed.
pub async fn resolve_person<T>(
    tx: &mut T,
    role: DependentRole,
    draft: &PersonDraft,
) -> Result<PersonId, CatalogError>
where
    T: CatalogTx + ?Sized,
{
    if let Some(id) = draft.id {
        return if tx.get_person(id).await?.is_some() {
            Ok(id)
        } else {
            Err(CatalogError::Reference(format!(
                "{role} references person {id}, which does not exist"
            )))
        };
    }

    let person = validate_person(draft)
        .map_err(|e| CatalogError::from(e).context(role.label()))?;
    ensure_person_unique(tx, &person, None)
        .await
        .map_err(|e| e.context(role.label()))?;
    let stored = tx
        .insert_person(&person)
        .await
        .map_err(|e| CatalogError::from(e).context(role.label()))?;

    tracing::debug!(%role, person_id = %stored.id, "created dependent person");
    Ok(stored.id)
}

/// Resolve every dependent of `draft` in [`RESOLUTION_ORDER`].
pub async fn resolve_people<T>(
    tx: &mut T,
    draft: &RecordDraft,
) -> Result<ResolvedPeople, CatalogError>
where
    T: CatalogTx + ?Sized,
{
    let mut resolved: [Option<PersonId>; 3] = [None; 3];
    for (slot, role) in resolved.iter_mut().zip(RESOLUTION_ORDER) {
        if let Some(person) = role.pick(draft) {
            *slot = Some(resolve_person(tx, role, person).await?);
        }
    }

    let [operator_id, director_id, screenwriter_id] = resolved;
    let operator_id =
        operator_id.ok_or_else(|| ValidationError::new("operator must be present"))?;

    Ok(ResolvedPeople {
        operator_id,
        director_id,
        screenwriter_id,
    })
}

/// Validate a record draft, resolve its people, and check uniqueness.
///
/// `existing` is the stored record when updating: its identity is excluded
/// from the uniqueness check and its creation timestamp is kept unless the
/// draft supplies one. New records without a timestamp get `now`.
pub async fn stage_record<T>(
    tx: &mut T,
    draft: &RecordDraft,
    existing: Option<&Record>,
    now: DateTime<Utc>,
) -> Result<NewRecord, CatalogError>
where
    T: CatalogTx + ?Sized,
{
    let fields = validate_record(draft)?;
    let people = resolve_people(tx, draft).await?;

    let fallback_date = existing.map_or(now, |r| r.creation_date);
    let record = fields.into_record(people, fallback_date);

    ensure_record_unique(tx, &record, existing.map(|r| r.id)).await?;
    Ok(record)
}
