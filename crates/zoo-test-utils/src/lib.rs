//! Testing utilities for the zoo admin workspace
//!
//! Shared test helpers and fixtures.

#![allow(missing_docs)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::sync::Arc;
use zoo_store::{Clock, Record};

/// Clock that only moves when told to
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// Clock fixed at 2026-01-01T00:00:00Z
    pub fn fixed() -> Arc<Self> {
        Arc::new(Self::new(epoch()))
    }

    pub fn advance(&self, by: Duration) {
        *self.now.lock() += by;
    }

    pub fn set(&self, at: DateTime<Utc>) {
        *self.now.lock() = at;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

pub fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()
}

/// Record from a JSON object literal
pub fn record(value: Value) -> Record {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a JSON object, got {other}"),
    }
}

pub fn family(id: &str) -> Record {
    record(json!({"familyId": id, "familyName": format!("Family {id}")}))
}

pub fn user(id: &str, family_id: &str) -> Record {
    record(json!({
        "userId": id,
        "email": format!("{id}@zoo.example"),
        "role": "parent",
        "familyId": family_id
    }))
}

pub fn animal(id: &str, name: &str, species: &str) -> Record {
    record(json!({"animalId": id, "name": name, "species": species}))
}

pub fn personality(id: &str, prompt: &str) -> Record {
    record(json!({"personalityId": id, "name": format!("Personality {id}"), "systemPrompt": prompt}))
}

pub fn guardrail(id: &str, rules: &[&str]) -> Record {
    record(json!({"guardrailId": id, "name": format!("Guardrail {id}"), "rules": rules}))
}

pub fn conversation(id: &str, user_id: &str, animal_id: &str) -> Record {
    record(json!({"conversationId": id, "userId": user_id, "animalId": animal_id}))
}

pub fn assistant(id: &str, animal_id: &str, personality_id: &str, guardrail_id: &str) -> Record {
    record(json!({
        "assistantId": id,
        "animalId": animal_id,
        "personalityId": personality_id,
        "guardrailId": guardrail_id
    }))
}
