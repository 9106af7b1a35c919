use crate::gemini::GenerateError;
use crate::reply::ReplyOption;

/// Shown for any transport or parse failure. Deliberately generic so raw
/// errors (which may embed the request URL and key) never reach the screen.
pub const GENERATION_FAILED_MESSAGE: &str =
    "Failed to generate replies. Please try again or check your API key.";

pub const MISSING_KEY_MESSAGE: &str =
    "GEMINI_API_KEY is not set. Export it and restart to enable generation.";

/// Exactly one of these holds at any time. Entering `Loading` drops any
/// previous payload immediately, so stale cards are never shown next to a
/// spinner.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestState {
    Idle,
    Loading,
    Success(Vec<ReplyOption>),
    Error(String),
}

/// One-slot request state machine. The TUI spawns the actual network call;
/// this struct owns the transitions and their guards so they stay testable
/// without a terminal or a server.
pub struct RequestLifecycle {
    state: RequestState,
}

impl RequestLifecycle {
    pub fn new() -> Self {
        Self { state: RequestState::Idle }
    }

    pub fn state(&self) -> &RequestState {
        &self.state
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state, RequestState::Loading)
    }

    /// Options from the last successful request, empty in every other state.
    pub fn options(&self) -> &[ReplyOption] {
        match &self.state {
            RequestState::Success(options) => options,
            _ => &[],
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.state {
            RequestState::Error(message) => Some(message),
            _ => None,
        }
    }

    /// Try to enter `Loading`. A blank message is a no-op (not an error) and
    /// a re-entrant trigger while a request is in flight is ignored. Returns
    /// whether the caller should actually start a request.
    pub fn try_begin(&mut self, incoming_message: &str) -> bool {
        if incoming_message.trim().is_empty() {
            return false;
        }
        if self.is_loading() {
            return false;
        }
        self.state = RequestState::Loading;
        true
    }

    /// Resolve the in-flight request. All failure kinds collapse into one
    /// fixed user-facing message except the missing credential, which gets an
    /// actionable one. A result arriving in any state other than `Loading`
    /// belongs to a superseded request and is dropped.
    pub fn finish(&mut self, result: Result<Vec<ReplyOption>, GenerateError>) {
        if !self.is_loading() {
            return;
        }
        self.state = match result {
            Ok(options) => RequestState::Success(options),
            Err(GenerateError::MissingApiKey) => RequestState::Error(MISSING_KEY_MESSAGE.to_string()),
            Err(_) => RequestState::Error(GENERATION_FAILED_MESSAGE.to_string()),
        };
    }

    /// Back to a clean slate. An in-flight response resolving after this is
    /// ignored by `finish`.
    pub fn reset(&mut self) {
        self.state = RequestState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gemini;
    use crate::persona::PersonaSettings;
    use crate::prompt;
    use crate::reply::ReplyCategory;

    fn success_options() -> Vec<ReplyOption> {
        gemini::parse_reply_payload(
            r#"{"options":[{"type":"Standard","label":"稳","content":"好的收到"}]}"#,
        )
        .unwrap()
    }

    #[test]
    fn test_blank_message_never_leaves_idle() {
        let mut lifecycle = RequestLifecycle::new();
        assert!(!lifecycle.try_begin(""));
        assert!(!lifecycle.try_begin("   \t\n"));
        assert_eq!(*lifecycle.state(), RequestState::Idle);
    }

    #[test]
    fn test_reentrant_trigger_is_ignored() {
        let mut lifecycle = RequestLifecycle::new();
        let mut client_calls = 0;
        for _ in 0..3 {
            if lifecycle.try_begin("在吗") {
                client_calls += 1;
            }
        }
        assert_eq!(client_calls, 1);
        assert!(lifecycle.is_loading());
    }

    #[test]
    fn test_begin_clears_stale_results_before_resolution() {
        let mut lifecycle = RequestLifecycle::new();
        assert!(lifecycle.try_begin("first"));
        lifecycle.finish(Ok(success_options()));
        assert_eq!(lifecycle.options().len(), 1);

        // New trigger: previous options must be gone immediately, before any
        // result comes back.
        assert!(lifecycle.try_begin("second"));
        assert!(lifecycle.options().is_empty());
        assert!(lifecycle.error().is_none());
        assert!(lifecycle.is_loading());
    }

    #[test]
    fn test_begin_clears_stale_error() {
        let mut lifecycle = RequestLifecycle::new();
        assert!(lifecycle.try_begin("first"));
        lifecycle.finish(Err(GenerateError::Api {
            status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
            body: "boom".to_string(),
        }));
        assert!(lifecycle.error().is_some());

        assert!(lifecycle.try_begin("second"));
        assert!(lifecycle.error().is_none());
    }

    #[test]
    fn test_empty_result_is_success_not_error() {
        let mut lifecycle = RequestLifecycle::new();
        assert!(lifecycle.try_begin("在吗"));
        lifecycle.finish(Ok(Vec::new()));
        assert_eq!(*lifecycle.state(), RequestState::Success(Vec::new()));
        assert!(lifecycle.error().is_none());
    }

    #[test]
    fn test_failure_maps_to_fixed_message() {
        let mut lifecycle = RequestLifecycle::new();
        assert!(lifecycle.try_begin("在吗"));
        lifecycle.finish(Err(GenerateError::Api {
            status: reqwest::StatusCode::UNAUTHORIZED,
            body: "key=super-secret-key rejected".to_string(),
        }));
        let message = lifecycle.error().unwrap();
        assert_eq!(message, GENERATION_FAILED_MESSAGE);
        assert!(!message.contains("super-secret-key"));
    }

    #[test]
    fn test_malformed_body_reaches_generic_error() {
        let mut lifecycle = RequestLifecycle::new();
        assert!(lifecycle.try_begin("在吗"));
        lifecycle.finish(gemini::parse_reply_payload("<html>not json</html>"));
        assert_eq!(lifecycle.error(), Some(GENERATION_FAILED_MESSAGE));
    }

    #[test]
    fn test_missing_key_gets_actionable_message() {
        let mut lifecycle = RequestLifecycle::new();
        assert!(lifecycle.try_begin("在吗"));
        lifecycle.finish(Err(GenerateError::MissingApiKey));
        assert_eq!(lifecycle.error().unwrap(), MISSING_KEY_MESSAGE);
    }

    #[test]
    fn test_stale_result_after_reset_is_dropped() {
        let mut lifecycle = RequestLifecycle::new();
        assert!(lifecycle.try_begin("在吗"));
        lifecycle.reset();
        lifecycle.finish(Ok(success_options()));
        assert_eq!(*lifecycle.state(), RequestState::Idle);
        assert!(lifecycle.options().is_empty());
    }

    /// Full path: persona + message through the prompt builder, a stubbed
    /// 3-option service payload through the parser, and the result through
    /// the lifecycle.
    #[test]
    fn test_end_to_end_three_options() {
        let persona = PersonaSettings {
            self_persona: "卑微打工人".to_string(),
            counterpart_persona: "经常改需求的老板".to_string(),
            relationship: "紧张的上下级关系".to_string(),
        };
        let message = "这个方案要推翻重做";

        let (_, user_prompt) = prompt::build(&persona, message, "");
        assert!(user_prompt.contains("卑微打工人"));
        assert!(user_prompt.contains("经常改需求的老板"));
        assert!(user_prompt.contains("紧张的上下级关系"));
        assert!(user_prompt.contains(message));
        assert!(!user_prompt.contains("意图"));

        let stub_response = r#"{"options":[
            {"type":"Standard","label":"完美符合人设","content":"好的老板，我重新梳理一版~"},
            {"type":"Intense","label":"情绪更强烈","content":"啊？？又要重做吗…好吧😭"},
            {"type":"Short","label":"简短敷衍","content":"收到"}
        ]}"#;

        let mut lifecycle = RequestLifecycle::new();
        assert!(lifecycle.try_begin(message));
        lifecycle.finish(gemini::parse_reply_payload(stub_response));

        let options = lifecycle.options();
        assert_eq!(options.len(), 3);
        assert_eq!(options[0].category, ReplyCategory::Standard);
        assert_eq!(options[1].category, ReplyCategory::Intense);
        assert_eq!(options[2].category, ReplyCategory::Short);
    }
}
