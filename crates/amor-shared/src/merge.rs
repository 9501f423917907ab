//! Field-by-field merge of a [`PartialPreferences`] over a [`Preferences`].
//!
//! The server applies this policy before persisting a merge-write and the
//! client applies the very same function to compute its optimistic state,
//! so both sides agree on the outcome of every field-level fallback.

use crate::error::FieldViolation;
use crate::types::{default_couple_names, FieldValue, PartialPreferences, Preferences};

/// Result of a merge: the reconciled document plus every closed-value field
/// that was replaced by its default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOutcome {
    pub preferences: Preferences,
    pub violations: Vec<FieldViolation>,
}

impl Preferences {
    /// Merge `partial` over `self`. Present fields win; absent fields are
    /// left untouched. Closed-value fields that fail their check fall back
    /// to their default without failing the merge.
    pub fn merge(&self, partial: &PartialPreferences) -> MergeOutcome {
        let mut next = self.clone();
        let mut violations = Vec::new();

        if let Some(date) = &partial.anniversary_date {
            next.anniversary_date = date.clone();
        }
        if let Some(url) = &partial.playlist_url {
            next.playlist_url = url.clone();
        }
        if let Some(phrase) = &partial.defining_phrase {
            next.defining_phrase = phrase.clone().unwrap_or_default();
        }

        if let Some(names) = &partial.couple_names {
            next.couple_names = match names {
                FieldValue::Valid(names) if is_valid_pair(names) => {
                    [names[0].clone(), names[1].clone()]
                }
                FieldValue::Valid(names) => {
                    violations.push(FieldViolation {
                        field: "coupleNames",
                        reason: format!("expected two non-empty names, got {names:?}"),
                    });
                    default_couple_names()
                }
                FieldValue::Invalid(raw) => {
                    violations.push(FieldViolation {
                        field: "coupleNames",
                        reason: format!("unexpected value {raw}"),
                    });
                    default_couple_names()
                }
            };
        }

        if let Some(preference) = &partial.name_display_preference {
            next.name_display_preference =
                closed_value("nameDisplayPreference", preference, &mut violations);
        }
        if let Some(theme) = &partial.theme {
            next.theme = closed_value("theme", theme, &mut violations);
        }

        MergeOutcome {
            preferences: next,
            violations,
        }
    }

    /// [`Preferences::merge`] without the violation report.
    pub fn merged(&self, partial: &PartialPreferences) -> Preferences {
        self.merge(partial).preferences
    }

    /// Back-fill a sparse stored document over the defaults.
    pub fn from_partial(partial: &PartialPreferences) -> MergeOutcome {
        Self::default().merge(partial)
    }
}

fn is_valid_pair(names: &[String]) -> bool {
    names.len() == 2 && names.iter().all(|name| !name.is_empty())
}

fn closed_value<T: Copy + Default>(
    field: &'static str,
    value: &FieldValue<T>,
    violations: &mut Vec<FieldViolation>,
) -> T {
    match value {
        FieldValue::Valid(value) => *value,
        FieldValue::Invalid(raw) => {
            violations.push(FieldViolation {
                field,
                reason: format!("unexpected value {raw}"),
            });
            T::default()
        }
    }
}
