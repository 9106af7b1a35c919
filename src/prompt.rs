use crate::persona::PersonaSettings;

/// Fixed instruction describing output style and the three reply variants.
/// The structured-output schema is enforced separately in the request config;
/// the instruction still tells the model to emit JSON only so plain-text
/// fallbacks never leak through.
pub const SYSTEM_INSTRUCTION: &str = "\
You are a high-EQ, versatile chat reply assistant (Chat Copilot). Your task is \
to convert an incoming message into a polite, natural, and context-appropriate \
reply based on the user's current persona and reply strategy.

**Output Guidelines:**
1. **Human-like:** Use tone particles (哈、呢、哎呀), punctuation (~, ...), and \
emojis suitable for the persona. Avoid AI-translation style.
2. **Length:** Keep it concise, suitable for WeChat/messaging apps.
3. **Strictly JSON:** You must output JSON only, no prose wrapper.

**Structure:**
Provide exactly 3 options:
1. **Standard:** The safest, most balanced reply fitting the persona perfectly.
2. **Intense:** A version with stronger emotion (more enthusiastic or colder, \
depending on the relationship).
3. **Short:** A brief, lazy, or quick way to end the conversation or \
acknowledge.";

/// Build the (system instruction, user prompt) pair for one generation
/// request. Pure and deterministic; a blank intent omits the intent line
/// entirely rather than rendering an empty field.
pub fn build(persona: &PersonaSettings, incoming_message: &str, intent: &str) -> (&'static str, String) {
    let mut prompt = String::new();

    prompt.push_str("【设定人设】\n");
    prompt.push_str(&format!("1. 我的人设：{}\n", persona.self_persona));
    prompt.push_str(&format!("2. 对方是谁：{}\n", persona.counterpart_persona));
    prompt.push_str(&format!("3. 双方关系：{}\n", persona.relationship));

    prompt.push_str("\n对方发来的消息：\n");
    prompt.push_str(&format!("\"{}\"\n", incoming_message));

    if !intent.trim().is_empty() {
        prompt.push_str(&format!("\n我的回复思路/意图：({})\n", intent));
    }

    prompt.push_str("\n请生成3个不同风格的回复选项。");

    (SYSTEM_INSTRUCTION, prompt)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_persona() -> PersonaSettings {
        PersonaSettings {
            self_persona: "卑微打工人".to_string(),
            counterpart_persona: "经常改需求的老板".to_string(),
            relationship: "紧张的上下级关系".to_string(),
        }
    }

    #[test]
    fn test_prompt_contains_persona_and_message() {
        let (system, prompt) = build(&test_persona(), "这个方案要推翻重做", "");
        assert!(system.contains("Standard"));
        assert!(prompt.contains("卑微打工人"));
        assert!(prompt.contains("经常改需求的老板"));
        assert!(prompt.contains("紧张的上下级关系"));
        assert!(prompt.contains("\"这个方案要推翻重做\""));
    }

    #[test]
    fn test_intent_line_included_when_present() {
        let (_, prompt) = build(&test_persona(), "在吗", "想要委婉拒绝");
        assert!(prompt.contains("我的回复思路/意图：(想要委婉拒绝)"));
    }

    #[test]
    fn test_intent_line_omitted_when_blank() {
        let (_, empty) = build(&test_persona(), "在吗", "");
        let (_, whitespace) = build(&test_persona(), "在吗", "   ");
        assert!(!empty.contains("意图"));
        assert!(!whitespace.contains("意图"));
        // Exact omission: no empty-valued placeholder either
        assert!(!empty.contains("()"));
    }

    #[test]
    fn test_build_is_deterministic() {
        let a = build(&test_persona(), "在吗", "拖延一下");
        let b = build(&test_persona(), "在吗", "拖延一下");
        assert_eq!(a, b);
    }
}
