//! The migration chain engine.
//!
//! A [`MigrationChain`] holds registered [`MigrationStep`]s linked through
//! their `down_revision`, resolves the ordered path between two revisions,
//! and drives a [`SchemaExecutor`] along that path while recording progress
//! in a [`ChainStateStore`].
//!
//! `None` stands for *base*: the state before the root step is applied.

use crate::edit::SchemaEdit;
use crate::error::{ChainError, ChainResult, ExecutorError};
use crate::executor::SchemaExecutor;
use crate::revision::{display_revision, Revision};
use crate::state::ChainStateStore;
use crate::step::MigrationStep;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

/// Direction a path is walked in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Apply steps, oldest first
    Upgrade,
    /// Revert steps, newest first
    Downgrade,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Upgrade => write!(f, "upgrade"),
            Direction::Downgrade => write!(f, "downgrade"),
        }
    }
}

/// Ordered steps between two revisions
#[derive(Debug)]
pub struct MigrationPath<'a> {
    /// Whether the steps are to be applied or reverted
    pub direction: Direction,
    /// Steps in execution order
    pub steps: Vec<&'a MigrationStep>,
}

impl MigrationPath<'_> {
    /// True when source and target are the same revision
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Outcome of a completed [`MigrationChain::migrate`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationReport {
    /// Direction the path was walked in
    pub direction: Direction,
    /// Revisions applied or reverted, in execution order
    pub completed: Vec<Revision>,
    /// Revision the chain state ended at
    pub reached: Option<Revision>,
}

/// Ordered, singly-linked set of migration steps.
///
/// Steps are registered once at startup and read-only afterwards. The chain
/// is always a single list: one root, no branches, no cycles.
#[derive(Debug, Default)]
pub struct MigrationChain {
    steps: HashMap<Revision, MigrationStep>,
    /// parent revision -> its only child
    children: HashMap<Revision, Revision>,
    root: Option<Revision>,
}

impl MigrationChain {
    /// Create an empty chain
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a chain from an unordered set of steps.
    ///
    /// Steps are registered parents-first. Any error discards the whole set,
    /// so a chain is never left partially registered.
    pub fn from_steps<I>(steps: I) -> ChainResult<Self>
    where
        I: IntoIterator<Item = MigrationStep>,
    {
        let mut seen = HashSet::new();
        let mut pending: BTreeMap<Option<Revision>, Vec<MigrationStep>> = BTreeMap::new();
        for step in steps {
            if !seen.insert(step.revision().clone()) {
                return Err(ChainError::DuplicateRevision {
                    revision: step.revision().clone(),
                });
            }
            pending
                .entry(step.down_revision().cloned())
                .or_default()
                .push(step);
        }

        let mut chain = Self::new();
        let mut frontier: Vec<Option<Revision>> = vec![None];
        while let Some(parent) = frontier.pop() {
            let Some(mut children) = pending.remove(&parent) else {
                continue;
            };
            children.sort_by(|a, b| a.revision().cmp(b.revision()));
            for step in children {
                let revision = step.revision().clone();
                chain.register(step)?;
                frontier.push(Some(revision));
            }
        }

        // Whatever is left hangs off a revision that never got registered.
        let orphan = pending
            .into_values()
            .flatten()
            .min_by(|a, b| a.revision().cmp(b.revision()));
        if let Some(step) = orphan {
            chain.register(step)?;
        }

        Ok(chain)
    }

    /// Register one step.
    ///
    /// The step's `down_revision` must already be registered (or be `None`
    /// for the root), and must not already have a child. On error the chain
    /// is unchanged.
    pub fn register(&mut self, step: MigrationStep) -> ChainResult<()> {
        let revision = step.revision().clone();
        if self.steps.contains_key(&revision) {
            return Err(ChainError::DuplicateRevision { revision });
        }

        match step.down_revision() {
            None => {
                if let Some(existing) = &self.root {
                    return Err(ChainError::MultipleRoots {
                        revision,
                        existing: existing.clone(),
                    });
                }
                self.root = Some(revision.clone());
            }
            Some(parent) => {
                if !self.steps.contains_key(parent) {
                    return Err(ChainError::DanglingReference {
                        revision,
                        down_revision: parent.clone(),
                    });
                }
                if let Some(existing_child) = self.children.get(parent) {
                    return Err(ChainError::BranchedChain {
                        revision,
                        down_revision: parent.clone(),
                        existing_child: existing_child.clone(),
                    });
                }
                self.children.insert(parent.clone(), revision.clone());
            }
        }

        log::debug!(
            "Registered revision {} (down_revision: {})",
            revision,
            display_revision(step.down_revision())
        );
        self.steps.insert(revision, step);
        Ok(())
    }

    /// Number of registered steps
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether no steps are registered
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Look up a step
    pub fn get(&self, revision: &str) -> Option<&MigrationStep> {
        self.steps.get(revision)
    }

    /// Whether a revision is registered
    pub fn contains(&self, revision: &str) -> bool {
        self.steps.contains_key(revision)
    }

    /// The root step
    pub fn root(&self) -> Option<&MigrationStep> {
        self.root.as_ref().and_then(|r| self.steps.get(r))
    }

    /// The newest step
    pub fn head(&self) -> Option<&MigrationStep> {
        self.history().last().copied()
    }

    /// All steps from root to head
    pub fn history(&self) -> Vec<&MigrationStep> {
        let mut out = Vec::with_capacity(self.steps.len());
        let mut cursor = self.root.as_ref();
        while let Some(rev) = cursor {
            let Some(step) = self.steps.get(rev) else {
                break;
            };
            out.push(step);
            cursor = self.children.get(rev);
        }
        out
    }

    /// Resolve the ordered steps that take the schema from `from` to `to`.
    ///
    /// If `to` descends from `from`, returns the steps after `from` up to and
    /// including `to`, oldest first. If `to` is an ancestor, returns the
    /// steps from `from` down to (but excluding) `to`, newest first.
    pub fn resolve_path(
        &self,
        from: Option<&Revision>,
        to: Option<&Revision>,
    ) -> ChainResult<MigrationPath<'_>> {
        let no_path = || ChainError::NoPath {
            from: from.cloned(),
            to: to.cloned(),
        };
        for rev in [from, to].into_iter().flatten() {
            if !self.steps.contains_key(rev) {
                return Err(no_path());
            }
        }

        if let Some(mut steps) = self.walk_back(to, from) {
            steps.reverse();
            return Ok(MigrationPath {
                direction: Direction::Upgrade,
                steps,
            });
        }
        if let Some(steps) = self.walk_back(from, to) {
            return Ok(MigrationPath {
                direction: Direction::Downgrade,
                steps,
            });
        }
        Err(no_path())
    }

    /// Steps from `start` back to (excluding) `stop`, newest first, or
    /// `None` when `stop` is not an ancestor of `start`.
    fn walk_back(
        &self,
        start: Option<&Revision>,
        stop: Option<&Revision>,
    ) -> Option<Vec<&MigrationStep>> {
        let mut steps = Vec::new();
        let mut cursor = start;
        loop {
            if cursor == stop {
                return Some(steps);
            }
            let step = self.steps.get(cursor?)?;
            steps.push(step);
            cursor = step.down_revision();
        }
    }

    /// Apply one step's upgrade edits and advance the chain state to it.
    ///
    /// The state must currently be at the step's `down_revision`. A failing
    /// edit stops the step; earlier edits of the same step are not undone
    /// and the state is left where it was.
    pub fn apply<E, S>(
        &self,
        step: &MigrationStep,
        executor: &mut E,
        state: &mut S,
    ) -> ChainResult<()>
    where
        E: SchemaExecutor + ?Sized,
        S: ChainStateStore + ?Sized,
    {
        expect_state(state, step.down_revision())?;
        log::info!(
            "Running upgrade {} -> {}, {}",
            display_revision(step.down_revision()),
            step.revision(),
            step.message()
        );
        run_edits(step.upgrade(), executor).map_err(|source| ChainError::ApplyFailed {
            revision: step.revision().clone(),
            source,
        })?;
        state.set(Some(step.revision()))?;
        Ok(())
    }

    /// Run one step's downgrade edits and move the chain state back to its
    /// `down_revision`.
    ///
    /// The state must currently be at the step itself. Failure semantics
    /// match [`apply`](Self::apply).
    pub fn revert<E, S>(
        &self,
        step: &MigrationStep,
        executor: &mut E,
        state: &mut S,
    ) -> ChainResult<()>
    where
        E: SchemaExecutor + ?Sized,
        S: ChainStateStore + ?Sized,
    {
        expect_state(state, Some(step.revision()))?;
        log::info!(
            "Running downgrade {} -> {}, {}",
            step.revision(),
            display_revision(step.down_revision()),
            step.message()
        );
        run_edits(step.downgrade(), executor).map_err(|source| ChainError::RevertFailed {
            revision: step.revision().clone(),
            source,
        })?;
        state.set(step.down_revision())?;
        Ok(())
    }

    /// Move the schema from `from` to `to`, one step at a time.
    ///
    /// The chain state must currently be at `from`. Progress is persisted
    /// after every step; on failure the run stops and the error reports the
    /// revision the state was left at. Completed steps are not rolled back.
    ///
    /// The caller must hold an exclusive lock on the chain state for the
    /// whole call.
    pub fn migrate<E, S>(
        &self,
        from: Option<&Revision>,
        to: Option<&Revision>,
        executor: &mut E,
        state: &mut S,
    ) -> ChainResult<MigrationReport>
    where
        E: SchemaExecutor + ?Sized,
        S: ChainStateStore + ?Sized,
    {
        expect_state(state, from)?;
        let path = self.resolve_path(from, to)?;
        log::debug!(
            "Resolved {} path {} -> {} ({} steps, executor: {})",
            path.direction,
            display_revision(from),
            display_revision(to),
            path.steps.len(),
            executor.executor_type()
        );

        let mut report = MigrationReport {
            direction: path.direction,
            completed: Vec::with_capacity(path.steps.len()),
            reached: from.cloned(),
        };

        for step in path.steps {
            let outcome = match path.direction {
                Direction::Upgrade => self.apply(step, executor, state),
                Direction::Downgrade => self.revert(step, executor, state),
            };
            if let Err(err) = outcome {
                log::error!(
                    "Migration stopped at {}: {}",
                    display_revision(report.reached.as_ref()),
                    err
                );
                return Err(ChainError::MigrationHalted {
                    reached: report.reached,
                    completed: report.completed.len(),
                    source: Box::new(err),
                });
            }
            report.reached = match path.direction {
                Direction::Upgrade => Some(step.revision().clone()),
                Direction::Downgrade => step.down_revision().cloned(),
            };
            report.completed.push(step.revision().clone());
        }

        Ok(report)
    }

    /// Record `target` as the current revision without running any edits.
    pub fn stamp<S>(&self, target: Option<&Revision>, state: &mut S) -> ChainResult<()>
    where
        S: ChainStateStore + ?Sized,
    {
        if let Some(rev) = target {
            if !self.contains(rev) {
                return Err(ChainError::UnknownRevision {
                    spec: rev.to_string(),
                });
            }
        }
        log::warn!(
            "Stamping chain state to {} without running edits",
            display_revision(target)
        );
        state.set(target)?;
        Ok(())
    }

    /// Resolve a user-supplied target to a revision.
    ///
    /// Accepts `base`, `head`, a full revision id, a unique id prefix, or an
    /// offset `+N` / `-N` relative to `current`.
    pub fn resolve_target(
        &self,
        spec: &str,
        current: Option<&Revision>,
    ) -> ChainResult<Option<Revision>> {
        match spec {
            "" => {
                return Err(ChainError::UnknownRevision {
                    spec: spec.to_string(),
                })
            }
            "base" => return Ok(None),
            "head" => return Ok(self.head().map(|s| s.revision().clone())),
            _ => {}
        }

        if let Some(offset) = parse_offset(spec) {
            return self.resolve_relative(spec, offset, current);
        }

        if let Some(step) = self.steps.get(spec) {
            return Ok(Some(step.revision().clone()));
        }

        let mut candidates: Vec<&Revision> = self
            .steps
            .keys()
            .filter(|rev| rev.starts_with(spec))
            .collect();
        candidates.sort();
        match candidates.as_slice() {
            [] => Err(ChainError::UnknownRevision {
                spec: spec.to_string(),
            }),
            [only] => Ok(Some((*only).clone())),
            many => Err(ChainError::AmbiguousRevision {
                spec: spec.to_string(),
                candidates: many
                    .iter()
                    .map(|r| r.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
            }),
        }
    }

    fn resolve_relative(
        &self,
        spec: &str,
        offset: isize,
        current: Option<&Revision>,
    ) -> ChainResult<Option<Revision>> {
        // Position 0 is base; step i of the history sits at i + 1.
        let history = self.history();
        let position = match current {
            None => 0,
            Some(rev) => {
                history
                    .iter()
                    .position(|s| s.revision() == rev)
                    .ok_or_else(|| ChainError::UnknownRevision {
                        spec: rev.to_string(),
                    })?
                    + 1
            }
        };
        let out_of_range = || ChainError::RelativeOutOfRange {
            spec: spec.to_string(),
            current: current.cloned(),
        };
        let target = position
            .checked_add_signed(offset)
            .filter(|&p| p <= history.len())
            .ok_or_else(out_of_range)?;
        Ok(match target {
            0 => None,
            n => Some(history[n - 1].revision().clone()),
        })
    }
}

/// Parse `+N` / `-N`.
fn parse_offset(spec: &str) -> Option<isize> {
    let (sign, digits) = match spec.as_bytes().first().copied()? {
        b'+' => (1, &spec[1..]),
        b'-' => (-1, &spec[1..]),
        _ => return None,
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse::<isize>().ok().map(|n| sign * n)
}

/// Fail with `OutOfOrder` unless the store is at `expected`.
fn expect_state<S>(state: &S, expected: Option<&Revision>) -> ChainResult<()>
where
    S: ChainStateStore + ?Sized,
{
    let found = state.current()?;
    if found.as_ref() != expected {
        return Err(ChainError::OutOfOrder {
            expected: expected.cloned(),
            found,
        });
    }
    Ok(())
}

/// Run edits in order, stopping at the first failure.
fn run_edits<E>(edits: &[SchemaEdit], executor: &mut E) -> Result<(), ExecutorError>
where
    E: SchemaExecutor + ?Sized,
{
    for edit in edits {
        log::debug!("  {}", edit);
        executor.execute(edit)?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "chain_test.rs"]
mod tests;
