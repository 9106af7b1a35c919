use serde::Deserialize;

/// Style category of a generated reply. The wire value is the capitalized
/// English tag the model is asked to emit.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyCategory {
    Standard,
    Intense,
    Short,
}

impl ReplyCategory {
    /// Short tag shown on the card header.
    pub fn display_name(&self) -> &'static str {
        match self {
            ReplyCategory::Standard => "标准 Standard",
            ReplyCategory::Intense => "上头 Intense",
            ReplyCategory::Short => "敷衍 Short",
        }
    }
}

/// One generated reply candidate, exactly as decoded from the service
/// response. Never mutated after parse; a new request replaces the whole set.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ReplyOption {
    #[serde(rename = "type")]
    pub category: ReplyCategory,
    pub label: String,
    pub content: String,
    #[serde(default)]
    pub explanation: Option<String>,
}
