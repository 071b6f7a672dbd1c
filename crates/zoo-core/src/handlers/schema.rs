//! Declarative field rules for the standard handlers

use crate::error::FieldErrors;
use crate::kind::EntityKind;
use serde_json::Value;
use zoo_store::Record;

/// Allowed user roles
pub const USER_ROLES: &[&str] = &["visitor", "parent", "student", "educator", "zookeeper", "admin"];

/// Field rules for one entity kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntitySchema {
    /// Kind the rules apply to
    pub kind: EntityKind,
    /// Fields that must be present and non-empty on create
    pub required: &'static [&'static str],
    /// Groups where at least one field must be present on create
    pub any_of: &'static [&'static [&'static str]],
    /// Attributes no two live records may share
    pub unique: &'static [&'static str],
    /// Fields restricted to a fixed set of strings
    pub enums: &'static [(&'static str, &'static [&'static str])],
}

impl EntitySchema {
    /// Schema with no rules
    #[must_use]
    pub const fn bare(kind: EntityKind) -> Self {
        Self {
            kind,
            required: &[],
            any_of: &[],
            unique: &[],
            enums: &[],
        }
    }

    /// Built-in rules for a kind
    #[must_use]
    pub const fn for_kind(kind: EntityKind) -> Self {
        let bare = Self::bare(kind);
        match kind {
            EntityKind::User => Self {
                required: &["email"],
                unique: &["email"],
                enums: &[("role", USER_ROLES)],
                ..bare
            },
            EntityKind::Family => Self {
                required: &["familyName"],
                ..bare
            },
            EntityKind::Animal => Self {
                required: &["name", "species"],
                ..bare
            },
            EntityKind::Personality => Self {
                required: &["name", "systemPrompt"],
                ..bare
            },
            EntityKind::Guardrail => Self {
                required: &["name"],
                any_of: &[&["systemPrompt", "rules"]],
                ..bare
            },
            EntityKind::Conversation => Self {
                required: &["userId", "animalId"],
                ..bare
            },
            EntityKind::Assistant => Self {
                required: &["animalId", "personalityId", "guardrailId"],
                ..bare
            },
            EntityKind::Sandbox => bare,
        }
    }

    /// Check a full record before insert
    #[must_use]
    pub fn check_create(&self, body: &Record) -> FieldErrors {
        let mut errors = FieldErrors::new();
        for field in self.required {
            if !is_present(body.get(*field)) {
                errors.add(*field, "is required");
            }
        }
        for group in self.any_of {
            if !group.iter().any(|f| is_present(body.get(*f))) {
                errors.add(group.join("|"), format!("one of {} is required", group.join(", ")));
            }
        }
        self.check_enums(body, &mut errors);
        errors
    }

    /// Check a partial record before merge
    ///
    /// Fields absent from the partial are left alone; required fields that
    /// are present may not be blanked.
    #[must_use]
    pub fn check_update(&self, partial: &Record) -> FieldErrors {
        let mut errors = FieldErrors::new();
        for field in self.required {
            if partial.contains_key(*field) && !is_present(partial.get(*field)) {
                errors.add(*field, "cannot be empty");
            }
        }
        self.check_enums(partial, &mut errors);
        errors
    }

    fn check_enums(&self, body: &Record, errors: &mut FieldErrors) {
        for (field, allowed) in self.enums {
            match body.get(*field) {
                None | Some(Value::Null) => {}
                Some(Value::String(s)) if allowed.contains(&s.as_str()) => {}
                Some(_) => errors.add(*field, format!("must be one of: {}", allowed.join(", "))),
            }
        }
    }
}

fn is_present(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.trim().is_empty(),
        Some(Value::Array(items)) => !items.is_empty(),
        Some(_) => true,
    }
}
