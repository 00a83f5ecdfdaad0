//! Dense priority ordering for the secrets of one entry.
//!
//! Every entry with `k` secrets holds priorities exactly `0..k`.  The
//! functions here are pure: given a snapshot of an entry's secrets they
//! decide which rows move and by how much.  Applying the plan (inside
//! one transaction) is the lifecycle's job.

use std::collections::HashSet;

use crate::errors::{Result, VaultsError};
use crate::lifecycle::requests::NewSecret;
use crate::validation::{require_label, require_payload};

/// The ordering-relevant part of a stored secret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sibling {
    pub slug: String,
    pub priority: u32,
}

impl Sibling {
    pub fn new(slug: impl Into<String>, priority: u32) -> Self {
        Self {
            slug: slug.into(),
            priority,
        }
    }
}

/// A set of rows whose priority changes by the same `delta` (±1).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShiftPlan {
    pub slugs: Vec<String>,
    pub delta: i64,
}

impl ShiftPlan {
    fn collect<'a>(siblings: impl Iterator<Item = &'a Sibling>, delta: i64) -> Self {
        Self {
            slugs: siblings.map(|s| s.slug.clone()).collect(),
            delta,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.slugs.is_empty()
    }
}

/// Outcome of a move request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MovePlan {
    /// Target already sits at the (clamped) requested priority.
    Unchanged { priority: u32 },
    /// Shift `shift`, then put `slug` at `to`.
    Reorder {
        shift: ShiftPlan,
        slug: String,
        from: u32,
        to: u32,
    },
}

/// Priority for a secret appended to an entry that holds `count` secrets.
pub fn append_priority(count: usize) -> Result<u32> {
    u32::try_from(count)
        .map_err(|_| VaultsError::validation("secret_priority", "entry holds too many secrets"))
}

/// Validate the secrets supplied with a new entry, before anything is written.
///
/// Checks run in order: labels (bounds, then duplicates), payloads,
/// duplicate priorities, then priority range.  Unique priorities that are
/// all below the batch size are exactly `0..n`, so a valid batch is dense.
pub fn validate_batch(secrets: &[NewSecret]) -> Result<()> {
    let n = secrets.len();

    let mut labels = HashSet::with_capacity(n);
    for (i, secret) in secrets.iter().enumerate() {
        require_label(&secret.secret_label).map_err(|e| item_error(i, n, e))?;
        if !labels.insert(secret.secret_label.as_str()) {
            return Err(VaultsError::validation(
                "secrets",
                format!("duplicate secret_label '{}' at secrets[{i}]", secret.secret_label),
            ));
        }
    }

    for (i, secret) in secrets.iter().enumerate() {
        require_payload(&secret.secret_string).map_err(|e| item_error(i, n, e))?;
    }

    let mut priorities = HashSet::with_capacity(n);
    for (i, secret) in secrets.iter().enumerate() {
        if !priorities.insert(secret.secret_priority) {
            return Err(VaultsError::validation(
                "secrets",
                format!("duplicate secret_priority {} at secrets[{i}]", secret.secret_priority),
            ));
        }
    }

    for (i, secret) in secrets.iter().enumerate() {
        if secret.secret_priority as usize >= n {
            return Err(VaultsError::validation(
                "secrets",
                format!(
                    "secrets[{i}].secret_priority {} out of range 0..{n}",
                    secret.secret_priority
                ),
            ));
        }
    }

    Ok(())
}

fn item_error(index: usize, len: usize, err: VaultsError) -> VaultsError {
    VaultsError::validation("secrets", format!("secrets[{index}] of {len}: {err}"))
}

/// Rows to decrement when the secret at `removed` is deleted.
pub fn delete_plan(siblings: &[Sibling], removed: u32) -> ShiftPlan {
    ShiftPlan::collect(siblings.iter().filter(|s| s.priority > removed), -1)
}

/// Snap a requested priority onto `0..count`.
pub fn clamp_priority(requested: i64, count: usize) -> u32 {
    let max = i64::try_from(count.saturating_sub(1)).unwrap_or(i64::MAX);
    // Bounded by `count - 1`, which came from a `u32` priority space.
    u32::try_from(requested.clamp(0, max)).unwrap_or(u32::MAX)
}

/// Plan moving `target` to `requested` among `siblings` (the whole entry).
///
/// Out-of-range requests are clamped rather than rejected.  Moving up
/// (`to < from`) pushes `[to, from)` up by one; moving down (`to > from`)
/// pulls `(from, to]` down by one.
pub fn move_plan(siblings: &[Sibling], target: &str, requested: i64) -> Result<MovePlan> {
    let current = siblings
        .iter()
        .find(|s| s.slug == target)
        .ok_or_else(|| VaultsError::NotFound(format!("secret '{target}' in entry")))?;

    let from = current.priority;
    let to = if siblings.len() == 1 {
        0
    } else {
        clamp_priority(requested, siblings.len())
    };

    let shift = if to < from {
        ShiftPlan::collect(
            siblings.iter().filter(|s| s.priority >= to && s.priority < from),
            1,
        )
    } else if to > from {
        ShiftPlan::collect(
            siblings.iter().filter(|s| s.priority > from && s.priority <= to),
            -1,
        )
    } else {
        return Ok(MovePlan::Unchanged { priority: from });
    };

    Ok(MovePlan::Reorder {
        shift,
        slug: current.slug.clone(),
        from,
        to,
    })
}

/// Returns `true` if the priorities are exactly `0..len`.
pub fn is_dense(priorities: impl IntoIterator<Item = u32>) -> bool {
    let mut sorted: Vec<u32> = priorities.into_iter().collect();
    sorted.sort_unstable();
    sorted
        .iter()
        .enumerate()
        .all(|(i, &p)| usize::try_from(p).is_ok_and(|p| p == i))
}
