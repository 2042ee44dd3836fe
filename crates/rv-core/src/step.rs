//! Migration steps and their on-disk definition.

use crate::edit::SchemaEdit;
use crate::error::StepError;
use crate::revision::Revision;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Serialized form of a step, as written in a step file.
///
/// Edits are written as single-key maps (`- add_column: {...}`) rather than
/// YAML tags.
///
/// Turned into a validated [`MigrationStep`] with [`StepDefinition::build`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StepDefinition {
    /// Unique revision id
    pub revision: String,

    /// Revision this step builds on; `null` for the root
    #[serde(default)]
    pub down_revision: Option<String>,

    /// Human-readable description
    #[serde(default)]
    pub message: String,

    /// When the step was authored
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_date: Option<NaiveDateTime>,

    /// Forward edits, run in order
    #[serde(default, with = "serde_yaml::with::singleton_map_recursive")]
    pub upgrade: Vec<SchemaEdit>,

    /// Inverse edits; derived from `upgrade` when omitted
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "serde_yaml::with::singleton_map_recursive"
    )]
    pub downgrade: Option<Vec<SchemaEdit>>,
}

impl StepDefinition {
    /// Start a definition with no edits.
    pub fn new(revision: impl Into<String>, down_revision: Option<&str>) -> Self {
        Self {
            revision: revision.into(),
            down_revision: down_revision.map(String::from),
            message: String::new(),
            create_date: None,
            upgrade: Vec::new(),
            downgrade: None,
        }
    }

    /// Set the message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Set the creation timestamp.
    pub fn with_create_date(mut self, create_date: NaiveDateTime) -> Self {
        self.create_date = Some(create_date);
        self
    }

    /// Set the upgrade edits.
    pub fn with_upgrade(mut self, edits: Vec<SchemaEdit>) -> Self {
        self.upgrade = edits;
        self
    }

    /// Set an explicit downgrade.
    pub fn with_downgrade(mut self, edits: Vec<SchemaEdit>) -> Self {
        self.downgrade = Some(edits);
        self
    }

    /// Validate and build the step.
    pub fn build(self) -> Result<MigrationStep, StepError> {
        MigrationStep::new(self)
    }
}

/// A validated, immutable migration step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationStep {
    revision: Revision,
    down_revision: Option<Revision>,
    message: String,
    create_date: Option<NaiveDateTime>,
    upgrade: Vec<SchemaEdit>,
    downgrade: Vec<SchemaEdit>,
    derived_downgrade: bool,
}

impl MigrationStep {
    /// Validate a definition and build the step.
    ///
    /// Rejects empty ids, self-references, invalid edits (such as a NOT NULL
    /// column without a default), and a downgrade that drops a foreign key
    /// under a different name than the upgrade created. When no downgrade is
    /// given it is derived by inverting the upgrade in reverse order.
    pub fn new(def: StepDefinition) -> Result<Self, StepError> {
        let revision = Revision::try_new(def.revision).ok_or(StepError::EmptyRevision)?;
        let down_revision = match def.down_revision {
            Some(down) => Some(Revision::try_new(down).ok_or(StepError::EmptyRevision)?),
            None => None,
        };
        if down_revision.as_ref() == Some(&revision) {
            return Err(StepError::SelfReference {
                revision: revision.into_inner(),
            });
        }

        for edit in &def.upgrade {
            edit.validate()?;
        }

        let (downgrade, derived_downgrade) = match def.downgrade {
            Some(edits) => {
                for edit in &edits {
                    edit.validate()?;
                }
                (edits, false)
            }
            None => (derive_downgrade(&revision, &def.upgrade)?, true),
        };

        check_foreign_key_names(&revision, &def.upgrade, &downgrade)?;

        Ok(Self {
            revision,
            down_revision,
            message: def.message,
            create_date: def.create_date,
            upgrade: def.upgrade,
            downgrade,
            derived_downgrade,
        })
    }

    /// Unique revision id
    pub fn revision(&self) -> &Revision {
        &self.revision
    }

    /// Predecessor revision, `None` for the root
    pub fn down_revision(&self) -> Option<&Revision> {
        self.down_revision.as_ref()
    }

    /// Whether this is the root step
    pub fn is_root(&self) -> bool {
        self.down_revision.is_none()
    }

    /// Human-readable description
    pub fn message(&self) -> &str {
        &self.message
    }

    /// When the step was authored
    pub fn create_date(&self) -> Option<NaiveDateTime> {
        self.create_date
    }

    /// Forward edits
    pub fn upgrade(&self) -> &[SchemaEdit] {
        &self.upgrade
    }

    /// Inverse edits, already in execution order
    pub fn downgrade(&self) -> &[SchemaEdit] {
        &self.downgrade
    }

    /// Convert back to the serialized form.
    ///
    /// A derived downgrade is left out so the file stays as authored.
    pub fn to_definition(&self) -> StepDefinition {
        StepDefinition {
            revision: self.revision.to_string(),
            down_revision: self.down_revision.as_ref().map(|r| r.to_string()),
            message: self.message.clone(),
            create_date: self.create_date,
            upgrade: self.upgrade.clone(),
            downgrade: if self.derived_downgrade {
                None
            } else {
                Some(self.downgrade.clone())
            },
        }
    }
}

/// Invert each upgrade edit, last first.
fn derive_downgrade(
    revision: &Revision,
    upgrade: &[SchemaEdit],
) -> Result<Vec<SchemaEdit>, StepError> {
    upgrade
        .iter()
        .enumerate()
        .rev()
        .map(|(index, edit)| {
            edit.inverse().ok_or_else(|| StepError::Irreversible {
                revision: revision.to_string(),
                index,
                edit: edit.to_string(),
            })
        })
        .collect()
}

/// Reject a downgrade that drops a foreign key on a table where the upgrade
/// created foreign keys, none of them under the dropped name.
fn check_foreign_key_names(
    revision: &Revision,
    upgrade: &[SchemaEdit],
    downgrade: &[SchemaEdit],
) -> Result<(), StepError> {
    let mut created: HashMap<&str, BTreeSet<&str>> = HashMap::new();
    for edit in upgrade {
        if let SchemaEdit::AddForeignKey { name, table, .. } = edit {
            created.entry(table.as_str()).or_default().insert(name.as_str());
        }
    }

    for edit in downgrade {
        if let SchemaEdit::DropForeignKey { name, table } = edit {
            if let Some(names) = created.get(table.as_str()) {
                if !names.contains(name.as_str()) {
                    return Err(StepError::ConstraintNameMismatch {
                        revision: revision.to_string(),
                        table: table.clone(),
                        dropped: name.clone(),
                        created: names
                            .iter()
                            .map(|n| format!("'{n}'"))
                            .collect::<Vec<_>>()
                            .join(", "),
                    });
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "step_test.rs"]
mod tests;
