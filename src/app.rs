use ratatui::widgets::ListState;
use tokio::task::JoinHandle;

use crate::gemini::{GeminiClient, GenerateError};
use crate::lifecycle::RequestLifecycle;
use crate::persona::PersonaSettings;
use crate::reply::ReplyOption;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

/// Which input box owns the cursor while editing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusField {
    Message,
    Intent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsField {
    SelfPersona,
    CounterpartPersona,
    Relationship,
}

impl SettingsField {
    pub fn next(self) -> Self {
        match self {
            SettingsField::SelfPersona => SettingsField::CounterpartPersona,
            SettingsField::CounterpartPersona => SettingsField::Relationship,
            SettingsField::Relationship => SettingsField::SelfPersona,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SettingsField::SelfPersona => "我的人设",
            SettingsField::CounterpartPersona => "对方是谁",
            SettingsField::Relationship => "双方关系",
        }
    }
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub input_mode: InputMode,
    pub focus: FocusField,

    // Persona session state (replaced wholesale on settings save)
    pub persona: PersonaSettings,

    // Settings editor state
    pub show_settings: bool,
    pub settings_field: SettingsField,
    pub settings_draft: PersonaSettings,
    pub settings_cursor: usize,

    // Input state (cursor positions are char indices, not byte offsets)
    pub message_input: String,
    pub message_cursor: usize,
    pub intent_input: String,
    pub intent_cursor: usize,

    // Request lifecycle (one in-flight slot)
    pub lifecycle: RequestLifecycle,
    pub generation: Option<JoinHandle<Result<Vec<ReplyOption>, GenerateError>>>,

    // Results navigation
    pub options_state: ListState,
    pub copied_index: Option<usize>,

    // Animation state (0-2 for ellipsis animation)
    pub animation_frame: u8,

    // Generation client; None when GEMINI_API_KEY is absent, in which case
    // submitting surfaces the configuration error without a network call.
    pub gemini: Option<GeminiClient>,
}

impl App {
    pub fn new() -> Self {
        Self {
            should_quit: false,
            input_mode: InputMode::Editing,
            focus: FocusField::Message,

            persona: PersonaSettings::default(),

            show_settings: false,
            settings_field: SettingsField::SelfPersona,
            settings_draft: PersonaSettings::default(),
            settings_cursor: 0,

            message_input: String::new(),
            message_cursor: 0,
            intent_input: String::new(),
            intent_cursor: 0,

            lifecycle: RequestLifecycle::new(),
            generation: None,

            options_state: ListState::default(),
            copied_index: None,

            animation_frame: 0,

            gemini: GeminiClient::from_env().ok(),
        }
    }

    /// Kick off one generation request. Blank message and in-flight requests
    /// are no-ops via the lifecycle guard; a missing credential resolves the
    /// request immediately without touching the network.
    pub fn submit(&mut self) {
        if !self.lifecycle.try_begin(&self.message_input) {
            return;
        }

        self.options_state.select(None);
        self.copied_index = None;

        let Some(client) = self.gemini.clone() else {
            self.lifecycle.finish(Err(GenerateError::MissingApiKey));
            return;
        };

        let persona = self.persona.clone();
        let message = self.message_input.clone();
        let intent = self.intent_input.clone();
        self.generation = Some(tokio::spawn(async move {
            client.generate_replies(&persona, &message, &intent).await
        }));
    }

    /// Resolve the generation task once it finishes. Called from the event
    /// loop on every tick so the UI never blocks on the network.
    pub async fn poll_generation(&mut self) {
        let finished = self
            .generation
            .as_ref()
            .map(|task| task.is_finished())
            .unwrap_or(false);
        if !finished {
            return;
        }

        if let Some(task) = self.generation.take() {
            let result = match task.await {
                Ok(result) => result,
                Err(_) => Err(GenerateError::Aborted),
            };
            self.lifecycle.finish(result);
            if !self.lifecycle.options().is_empty() {
                self.options_state.select(Some(0));
            }
        }
    }

    /// Clear inputs and results. An in-flight response resolving afterwards
    /// is dropped by the lifecycle.
    pub fn reset(&mut self) {
        self.message_input.clear();
        self.message_cursor = 0;
        self.intent_input.clear();
        self.intent_cursor = 0;
        self.lifecycle.reset();
        self.options_state.select(None);
        self.copied_index = None;
        self.focus = FocusField::Message;
        self.input_mode = InputMode::Editing;
    }

    // Results navigation
    pub fn select_next_option(&mut self) {
        let len = self.lifecycle.options().len();
        if len > 0 {
            let i = self.options_state.selected().unwrap_or(0);
            self.options_state.select(Some((i + 1).min(len - 1)));
        }
    }

    pub fn select_prev_option(&mut self) {
        let i = self.options_state.selected().unwrap_or(0);
        self.options_state.select(Some(i.saturating_sub(1)));
    }

    pub fn selected_option(&self) -> Option<&ReplyOption> {
        self.options_state
            .selected()
            .and_then(|i| self.lifecycle.options().get(i))
    }

    // Settings editor
    pub fn open_settings(&mut self) {
        self.settings_draft = self.persona.clone();
        self.settings_field = SettingsField::SelfPersona;
        self.settings_cursor = self.settings_draft.self_persona.chars().count();
        self.show_settings = true;
    }

    /// Replace the persona wholesale; partial edits never leak out before
    /// an explicit save.
    pub fn save_settings(&mut self) {
        self.persona = self.settings_draft.clone();
        self.show_settings = false;
    }

    pub fn cancel_settings(&mut self) {
        self.show_settings = false;
    }

    pub fn settings_next_field(&mut self) {
        self.settings_field = self.settings_field.next();
        self.settings_cursor = self.settings_active_field().chars().count();
    }

    pub fn settings_active_field(&self) -> &String {
        match self.settings_field {
            SettingsField::SelfPersona => &self.settings_draft.self_persona,
            SettingsField::CounterpartPersona => &self.settings_draft.counterpart_persona,
            SettingsField::Relationship => &self.settings_draft.relationship,
        }
    }

    pub fn settings_active_field_mut(&mut self) -> &mut String {
        match self.settings_field {
            SettingsField::SelfPersona => &mut self.settings_draft.self_persona,
            SettingsField::CounterpartPersona => &mut self.settings_draft.counterpart_persona,
            SettingsField::Relationship => &mut self.settings_draft.relationship,
        }
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.lifecycle.is_loading() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }
}
