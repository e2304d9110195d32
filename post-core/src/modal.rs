use serde::{Deserialize, Serialize};

/// Prefixes of the codes that are always treated as modal, even when the
/// output is not condensed: canned cycles and interpolation.
const MODAL_FAMILIES: [&str; 4] = ["G8", "G1", "G2", "G3"];

/// Last-emitted memory used to suppress redundant modal words.
///
/// Owned by the session and passed explicitly to every dialect rendering call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModalState {
    last_code: String,
    last_r: String,
    last_q: String,
}

impl ModalState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Emit a primary code, or an empty fragment when it repeats the last one.
    ///
    /// Repeats are only suppressed when `condensed` is set or the code belongs
    /// to a modal family. A different code invalidates R and Q memory.
    pub fn code(&mut self, token: &str, condensed: bool) -> String {
        let mut emitted = token.to_string();
        let modal = condensed || MODAL_FAMILIES.iter().any(|family| token.starts_with(family));
        if token == self.last_code {
            if modal {
                emitted.clear();
            }
        } else {
            self.last_r.clear();
            self.last_q.clear();
        }
        self.last_code = token.to_string();
        emitted
    }

    /// Retract-plane word, suppressed when equal to the last one emitted.
    pub fn retract(&mut self, token: &str) -> String {
        remember(&mut self.last_r, token)
    }

    /// Peck-depth word, suppressed when equal to the last one emitted.
    pub fn peck(&mut self, token: &str) -> String {
        remember(&mut self.last_q, token)
    }

    pub fn last_code(&self) -> &str {
        &self.last_code
    }

    pub fn last_retract(&self) -> &str {
        &self.last_r
    }

    pub fn last_peck(&self) -> &str {
        &self.last_q
    }
}

fn remember(slot: &mut String, token: &str) -> String {
    if slot == token {
        return String::new();
    }
    *slot = token.to_string();
    token.to_string()
}
