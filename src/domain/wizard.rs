//! Registration wizard state kept in the visitor's session between steps.
//!
//! Steps run 1 through 5. `next` merges the validated fields of the submitted step into the
//! draft and moves forward; `back` moves backwards without touching the draft. Step 5
//! commits, so the draft must hold every required field by then.

use serde::{Deserialize, Serialize};

pub const FIRST_STEP: u8 = 1;
pub const LAST_STEP: u8 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardAction {
    Next,
    Back,
}

impl WizardAction {
    pub fn parse(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("back") {
            Self::Back
        } else {
            Self::Next
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WizardDraft {
    pub username: Option<String>,
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub age: Option<String>,
    pub date_of_birth: Option<String>,
}

/// Validated values of one step, ready to merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepData {
    Identity {
        username: String,
        display_name: String,
    },
    Email(String),
    Password {
        hash: String,
    },
    Birth {
        age: String,
        date_of_birth: String,
    },
}

/// Every field the commit step needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompleteDraft {
    pub username: String,
    pub display_name: String,
    pub email: String,
    pub password_hash: String,
    pub date_of_birth: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WizardState {
    pub step: u8,
    #[serde(default)]
    pub draft: WizardDraft,
}

impl Default for WizardState {
    fn default() -> Self {
        Self {
            step: FIRST_STEP,
            draft: WizardDraft::default(),
        }
    }
}

impl WizardState {
    pub fn clamp_step(step: u8) -> u8 {
        step.clamp(FIRST_STEP, LAST_STEP)
    }

    /// The posted step when it parses, else the stored one.
    pub fn submitted_step(&self, raw: &str) -> u8 {
        raw.trim()
            .parse::<u8>()
            .map(Self::clamp_step)
            .unwrap_or_else(|_| Self::clamp_step(self.step))
    }

    pub fn back(&mut self, from: u8) {
        self.step = Self::clamp_step(from.saturating_sub(1));
    }

    pub fn stay(&mut self, on: u8) {
        self.step = Self::clamp_step(on);
    }

    pub fn advance(&mut self, from: u8, data: StepData) {
        self.merge(data);
        self.step = Self::clamp_step(from.saturating_add(1));
    }

    pub fn merge(&mut self, data: StepData) {
        let draft = &mut self.draft;
        match data {
            StepData::Identity {
                username,
                display_name,
            } => {
                draft.username = Some(username);
                draft.display_name = Some(display_name);
            }
            StepData::Email(email) => draft.email = Some(email),
            StepData::Password { hash } => draft.password_hash = Some(hash),
            StepData::Birth { age, date_of_birth } => {
                draft.age = Some(age);
                draft.date_of_birth = Some(date_of_birth);
            }
        }
    }

    /// `None` when any required field is missing or blank.
    pub fn complete(&self) -> Option<CompleteDraft> {
        fn present(value: &Option<String>) -> Option<String> {
            value.as_ref().filter(|v| !v.trim().is_empty()).cloned()
        }

        Some(CompleteDraft {
            username: present(&self.draft.username)?,
            display_name: present(&self.draft.display_name)?,
            email: present(&self.draft.email)?,
            password_hash: present(&self.draft.password_hash)?,
            date_of_birth: present(&self.draft.date_of_birth)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> StepData {
        StepData::Identity {
            username: "alice01".to_string(),
            display_name: "Alice".to_string(),
        }
    }

    #[test]
    fn next_advances_and_stops_at_last_step() {
        let mut state = WizardState::default();
        state.advance(1, identity());
        assert_eq!(state.step, 2);
        assert_eq!(state.draft.username.as_deref(), Some("alice01"));

        state.advance(LAST_STEP, StepData::Email("a@b.co".to_string()));
        assert_eq!(state.step, LAST_STEP);
    }

    #[test]
    fn back_never_goes_below_first_step_and_keeps_draft() {
        let mut state = WizardState::default();
        state.advance(1, identity());
        state.back(2);
        assert_eq!(state.step, 1);
        state.back(1);
        assert_eq!(state.step, FIRST_STEP);
        assert_eq!(state.draft.display_name.as_deref(), Some("Alice"));
    }

    #[test]
    fn submitted_step_falls_back_to_stored_step() {
        let state = WizardState {
            step: 3,
            draft: WizardDraft::default(),
        };
        assert_eq!(state.submitted_step("2"), 2);
        assert_eq!(state.submitted_step("9"), LAST_STEP);
        assert_eq!(state.submitted_step("0"), FIRST_STEP);
        assert_eq!(state.submitted_step("x"), 3);
    }

    #[test]
    fn complete_requires_every_commit_field() {
        let mut state = WizardState::default();
        state.merge(identity());
        state.merge(StepData::Email("alice@example.com".to_string()));
        state.merge(StepData::Password {
            hash: "$argon2id$...".to_string(),
        });
        assert!(state.complete().is_none());

        state.merge(StepData::Birth {
            age: "26".to_string(),
            date_of_birth: "2000-01-01".to_string(),
        });
        let draft = state.complete().expect("draft is complete");
        assert_eq!(draft.email, "alice@example.com");

        state.draft.display_name = Some("  ".to_string());
        assert!(state.complete().is_none());
    }

    #[test]
    fn action_parsing_defaults_to_next() {
        assert_eq!(WizardAction::parse("back"), WizardAction::Back);
        assert_eq!(WizardAction::parse("BACK "), WizardAction::Back);
        assert_eq!(WizardAction::parse("next"), WizardAction::Next);
        assert_eq!(WizardAction::parse(""), WizardAction::Next);
    }

    #[test]
    fn state_survives_json_round_trip_through_session() {
        let mut state = WizardState::default();
        state.advance(1, identity());
        let json = serde_json::to_string(&state).expect("serialize");
        let back: WizardState = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, state);
    }
}
