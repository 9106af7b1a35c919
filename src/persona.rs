use serde::{Deserialize, Serialize};

/// Who the user is pretending to be, who they are talking to, and how the two
/// relate. All free text; empty fields just make the prompt less specific.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PersonaSettings {
    pub self_persona: String,
    pub counterpart_persona: String,
    pub relationship: String,
}

impl Default for PersonaSettings {
    fn default() -> Self {
        Self {
            self_persona: "卑微打工人".to_string(),
            counterpart_persona: "经常改需求的老板".to_string(),
            relationship: "紧张的上下级关系".to_string(),
        }
    }
}
