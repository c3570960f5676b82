//! Conversation state and message dispatch.
//!
//! [`ChatController`] owns one continuous conversation. Sending a message is
//! split into [`ChatController::begin`], which mutates state synchronously
//! and hands back a [`PendingTurn`], and [`ChatController::complete`], which
//! applies the reply. [`ChatController::send`] does both around a single
//! backend call.
//!
//! Every turn carries a sequence number. A reply is applied unless the reply
//! to a newer turn has already been applied, in which case it is discarded.

use crate::backend::ChatBackend;
use crate::error::Result;
use crate::observability::{
    CHAT_EMPTY_INPUT, CHAT_FALLBACK_REPLIES, CHAT_STALE_REPLIES, CHAT_SUGGESTION_DECODE_ERRORS,
    CHAT_TURNS,
};
use crate::types::{ChatQuery, ChatReply, Message};

/// The assistant's opening message.
pub const DEFAULT_GREETING: &str = "Hey there! 👋 I'm Aurum AI, your personal gold investment assistant. Ask me anything about digital gold, ETFs, or SGBs! 💰";

/// The assistant message appended when a request fails.
pub const FALLBACK_REPLY: &str = "⚠️ Oops, couldn't connect. Pls try again in a bit.";

/// Everything the view renders for the conversation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConversationState {
    messages: Vec<Message>,
    loading: bool,
    suggestions: Vec<String>,
    show_buy: bool,
    show_dashboard: bool,
}

impl ConversationState {
    /// Messages in display order.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Whether a request is in flight.
    pub fn loading(&self) -> bool {
        self.loading
    }

    /// Suggested follow-ups from the latest applied reply.
    pub fn suggestions(&self) -> &[String] {
        &self.suggestions
    }

    /// Whether the buy call-to-action is offered.
    pub fn show_buy(&self) -> bool {
        self.show_buy
    }

    /// Whether the dashboard call-to-action is offered.
    pub fn show_dashboard(&self) -> bool {
        self.show_dashboard
    }

    fn reset_affordances(&mut self) {
        self.suggestions.clear();
        self.show_buy = false;
        self.show_dashboard = false;
    }
}

/// A dispatched turn awaiting its reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingTurn {
    seq: u64,
    query: ChatQuery,
}

impl PendingTurn {
    /// Dispatch order of this turn.
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// The request body for this turn.
    pub fn query(&self) -> &ChatQuery {
        &self.query
    }
}

/// How a completed turn changed the conversation.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// An assistant message was appended.
    Answered,
    /// The reply carried no answer; nothing was appended.
    Unanswered,
    /// The request failed and the fallback message was appended.
    Fallback,
    /// A newer turn's reply was already applied; this one was discarded.
    Stale,
}

/// Drives one conversation against a [`ChatBackend`].
#[derive(Debug)]
pub struct ChatController {
    state: ConversationState,
    input: String,
    next_seq: u64,
    last_applied: Option<u64>,
    in_flight: usize,
}

impl ChatController {
    /// Creates a conversation opened by [`DEFAULT_GREETING`].
    pub fn new() -> Self {
        Self::with_greeting(DEFAULT_GREETING)
    }

    /// Creates a conversation opened by `greeting`; an empty greeting opens
    /// an empty conversation.
    pub fn with_greeting(greeting: &str) -> Self {
        let mut state = ConversationState::default();
        if !greeting.is_empty() {
            state.messages.push(Message::assistant(greeting));
        }
        Self {
            state,
            input: String::new(),
            next_seq: 0,
            last_applied: None,
            in_flight: 0,
        }
    }

    /// The renderable conversation state.
    pub fn state(&self) -> &ConversationState {
        &self.state
    }

    /// The pending input.
    pub fn input(&self) -> &str {
        &self.input
    }

    /// Replaces the pending input.
    pub fn set_input(&mut self, input: impl Into<String>) {
        self.input = input.into();
    }

    /// Starts a turn for `text`.
    ///
    /// Returns `None` without touching any state when `text` is blank.
    /// Otherwise appends the user message, clears the pending input, marks
    /// the conversation as loading and clears suggestions and affordances.
    pub fn begin(&mut self, text: &str) -> Option<PendingTurn> {
        if text.trim().is_empty() {
            CHAT_EMPTY_INPUT.click();
            return None;
        }
        CHAT_TURNS.click();
        self.state.messages.push(Message::user(text));
        self.input.clear();
        self.in_flight += 1;
        self.state.loading = true;
        self.state.reset_affordances();

        let seq = self.next_seq;
        self.next_seq += 1;
        Some(PendingTurn {
            seq,
            query: ChatQuery::new(text),
        })
    }

    /// Applies the result of a turn started by [`ChatController::begin`].
    pub fn complete(&mut self, turn: PendingTurn, result: Result<ChatReply>) -> TurnOutcome {
        self.in_flight = self.in_flight.saturating_sub(1);
        self.state.loading = self.in_flight > 0;

        if self.last_applied.is_some_and(|applied| applied > turn.seq) {
            CHAT_STALE_REPLIES.click();
            tracing::debug!(seq = turn.seq, "discarding reply to superseded turn");
            return TurnOutcome::Stale;
        }
        self.last_applied = Some(turn.seq);
        self.state.reset_affordances();

        let reply = match result {
            Ok(reply) => reply,
            Err(err) => {
                CHAT_FALLBACK_REPLIES.click();
                tracing::warn!(error = %err, "chat request failed");
                self.state.messages.push(Message::assistant(FALLBACK_REPLY));
                return TurnOutcome::Fallback;
            }
        };

        let Some(answer) = reply.answer() else {
            return TurnOutcome::Unanswered;
        };
        self.state.messages.push(Message::assistant(answer));
        self.state.show_buy = reply.wants_buy();
        self.state.show_dashboard = reply.wants_dashboard();
        if let Some(payload) = reply.suggestion {
            self.state.suggestions = match payload.decode() {
                Ok(suggestions) => suggestions,
                Err(err) => {
                    CHAT_SUGGESTION_DECODE_ERRORS.click();
                    tracing::debug!(detail = %err.detail, "ignoring malformed suggestions");
                    Vec::new()
                }
            };
        }
        TurnOutcome::Answered
    }

    /// Sends `text` and applies the reply.
    ///
    /// Returns `None` when `text` is blank, in which case nothing is sent.
    pub async fn send<B: ChatBackend + ?Sized>(
        &mut self,
        backend: &B,
        text: &str,
    ) -> Option<TurnOutcome> {
        let turn = self.begin(text)?;
        let result = backend.chat(turn.query()).await;
        Some(self.complete(turn, result))
    }

    /// Sends the pending input.
    pub async fn send_input<B: ChatBackend + ?Sized>(&mut self, backend: &B) -> Option<TurnOutcome> {
        let text = self.input.clone();
        self.send(backend, &text).await
    }

    /// Sends a suggestion as if the user had typed it.
    pub async fn select_suggestion<B: ChatBackend + ?Sized>(
        &mut self,
        backend: &B,
        text: &str,
    ) -> Option<TurnOutcome> {
        self.send(backend, text).await
    }

    /// Sends the suggestion at `index` in the current list.
    ///
    /// Returns `None` when there is no such suggestion.
    pub async fn select_suggestion_at<B: ChatBackend + ?Sized>(
        &mut self,
        backend: &B,
        index: usize,
    ) -> Option<TurnOutcome> {
        let text = self.state.suggestions.get(index)?.clone();
        self.select_suggestion(backend, &text).await
    }
}

impl Default for ChatController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::types::Role;
    use serde_json::{Value, json};
    use std::sync::Mutex;

    /// Replies with a fixed JSON body, or fails, and records every query.
    struct ScriptedBackend {
        reply: Option<Value>,
        queries: Mutex<Vec<String>>,
    }

    impl ScriptedBackend {
        fn replying(reply: Value) -> Self {
            Self {
                reply: Some(reply),
                queries: Mutex::new(Vec::new()),
            }
        }

        fn failing() -> Self {
            Self {
                reply: None,
                queries: Mutex::new(Vec::new()),
            }
        }

        fn queries(&self) -> Vec<String> {
            self.queries.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl ChatBackend for ScriptedBackend {
        async fn chat(&self, query: &ChatQuery) -> Result<ChatReply> {
            self.queries.lock().unwrap().push(query.query.clone());
            match &self.reply {
                Some(reply) => Ok(serde_json::from_value(reply.clone())?),
                None => Err(Error::connection("connection refused", None)),
            }
        }
    }

    fn reply(value: Value) -> Result<ChatReply> {
        Ok(serde_json::from_value(value).unwrap())
    }

    #[test]
    fn starts_with_greeting() {
        let controller = ChatController::new();
        let messages = controller.state().messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0], Message::assistant(DEFAULT_GREETING));
        assert!(!controller.state().loading());

        assert!(ChatController::with_greeting("").state().messages().is_empty());
    }

    #[tokio::test]
    async fn blank_input_is_a_no_op() {
        let backend = ScriptedBackend::replying(json!({"answer": "X"}));
        let mut controller = ChatController::with_greeting("");
        controller.set_input("   ");
        let before = controller.state().clone();

        assert_eq!(controller.send(&backend, "").await, None);
        assert_eq!(controller.send(&backend, " \t\n").await, None);
        assert_eq!(controller.send_input(&backend).await, None);

        assert_eq!(controller.state(), &before);
        assert_eq!(controller.input(), "   ");
        assert!(backend.queries().is_empty());
    }

    #[test]
    fn begin_mutates_state_before_the_reply() {
        let mut controller = ChatController::with_greeting("hello");
        controller.set_input("  price of gold? ");
        let turn = controller.begin("  price of gold? ").unwrap();

        let state = controller.state();
        assert_eq!(state.messages().len(), 2);
        assert_eq!(state.messages()[1], Message::user("  price of gold? "));
        assert!(state.loading());
        assert_eq!(controller.input(), "");
        assert_eq!(turn.query().query, "  price of gold? ");
    }

    #[tokio::test]
    async fn answer_with_suggestion_list() {
        let backend = ScriptedBackend::replying(json!({
            "answer": "X",
            "suggestion": ["a", "b"],
            "showBuyButton": true,
            "intention": 1
        }));
        let mut controller = ChatController::with_greeting("");
        let outcome = controller.send(&backend, "hi").await;

        assert_eq!(outcome, Some(TurnOutcome::Answered));
        let state = controller.state();
        assert_eq!(
            state.messages(),
            &[Message::user("hi"), Message::assistant("X")]
        );
        assert_eq!(state.suggestions(), &["a".to_string(), "b".to_string()]);
        assert!(state.show_buy());
        assert!(state.show_dashboard());
        assert!(!state.loading());
        assert_eq!(backend.queries(), vec!["hi".to_string()]);
    }

    #[tokio::test]
    async fn answer_with_encoded_suggestions() {
        let backend = ScriptedBackend::replying(json!({
            "answer": "X",
            "suggestion": "[\"a\",\"b\"]"
        }));
        let mut controller = ChatController::with_greeting("");
        controller.send(&backend, "hi").await;
        assert_eq!(
            controller.state().suggestions(),
            &["a".to_string(), "b".to_string()]
        );
        assert!(!controller.state().show_buy());
        assert!(!controller.state().show_dashboard());
    }

    #[tokio::test]
    async fn malformed_suggestions_are_dropped() {
        let backend = ScriptedBackend::replying(json!({
            "answer": "X",
            "suggestion": "not json"
        }));
        let mut controller = ChatController::with_greeting("");
        let outcome = controller.send(&backend, "hi").await;
        assert_eq!(outcome, Some(TurnOutcome::Answered));
        assert!(controller.state().suggestions().is_empty());
        assert_eq!(
            controller.state().messages().last(),
            Some(&Message::assistant("X"))
        );
    }

    #[tokio::test]
    async fn reply_without_answer_appends_nothing() {
        let backend = ScriptedBackend::replying(json!({
            "suggestion": ["a"],
            "showBuyButton": true,
            "intention": 1
        }));
        let mut controller = ChatController::with_greeting("");
        let outcome = controller.send(&backend, "hi").await;

        assert_eq!(outcome, Some(TurnOutcome::Unanswered));
        let state = controller.state();
        assert_eq!(state.messages(), &[Message::user("hi")]);
        assert!(state.suggestions().is_empty());
        assert!(!state.show_buy());
        assert!(!state.show_dashboard());
        assert!(!state.loading());
    }

    #[tokio::test]
    async fn transport_failure_appends_fallback() {
        let backend = ScriptedBackend::failing();
        let mut controller = ChatController::with_greeting("");
        let outcome = controller.send(&backend, "hi").await;

        assert_eq!(outcome, Some(TurnOutcome::Fallback));
        let state = controller.state();
        let assistant: Vec<_> = state
            .messages()
            .iter()
            .filter(|m| m.role == Role::Assistant)
            .collect();
        assert_eq!(assistant.len(), 1);
        assert_eq!(assistant[0].content, FALLBACK_REPLY);
        assert!(!state.show_buy());
        assert!(!state.show_dashboard());
        assert!(!state.loading());
    }

    #[test]
    fn affordances_reset_when_a_new_turn_starts() {
        let mut controller = ChatController::with_greeting("");
        let turn = controller.begin("first").unwrap();
        controller.complete(
            turn,
            reply(json!({"answer": "A", "suggestion": ["s"], "showBuyButton": true, "intention": 1})),
        );
        assert!(controller.state().show_buy());

        controller.begin("second").unwrap();
        let state = controller.state();
        assert!(state.suggestions().is_empty());
        assert!(!state.show_buy());
        assert!(!state.show_dashboard());
    }

    #[test]
    fn affordances_do_not_carry_over() {
        let mut controller = ChatController::with_greeting("");
        let turn = controller.begin("first").unwrap();
        controller.complete(turn, reply(json!({"answer": "A", "intention": 1})));
        assert!(controller.state().show_dashboard());

        let turn = controller.begin("second").unwrap();
        controller.complete(turn, reply(json!({"answer": "B", "intention": 0})));
        assert!(!controller.state().show_dashboard());

        let turn = controller.begin("third").unwrap();
        controller.complete(turn, reply(json!({"answer": "C"})));
        assert!(!controller.state().show_dashboard());
    }

    #[test]
    fn overlapping_turns_in_order() {
        let mut controller = ChatController::with_greeting("");
        let first = controller.begin("one").unwrap();
        let second = controller.begin("two").unwrap();
        assert!(second.seq() > first.seq());

        assert_eq!(
            controller.complete(first, reply(json!({"answer": "1"}))),
            TurnOutcome::Answered
        );
        assert!(controller.state().loading());
        assert_eq!(
            controller.complete(second, reply(json!({"answer": "2", "suggestion": ["x"]}))),
            TurnOutcome::Answered
        );
        assert!(!controller.state().loading());
        let contents: Vec<_> = controller
            .state()
            .messages()
            .iter()
            .map(|m| m.content.as_str())
            .collect();
        assert_eq!(contents, vec!["one", "two", "1", "2"]);
        assert_eq!(controller.state().suggestions(), &["x".to_string()]);
    }

    #[test]
    fn older_reply_after_newer_is_discarded() {
        let mut controller = ChatController::with_greeting("");
        let first = controller.begin("one").unwrap();
        let second = controller.begin("two").unwrap();

        controller.complete(
            second,
            reply(json!({"answer": "2", "suggestion": ["x"], "showBuyButton": true})),
        );
        assert!(controller.state().loading());
        assert_eq!(
            controller.complete(first, reply(json!({"answer": "1", "intention": 1}))),
            TurnOutcome::Stale
        );

        let state = controller.state();
        assert!(!state.loading());
        assert_eq!(state.messages().len(), 3);
        assert_eq!(state.messages()[2], Message::assistant("2"));
        assert_eq!(state.suggestions(), &["x".to_string()]);
        assert!(state.show_buy());
        assert!(!state.show_dashboard());
    }

    #[tokio::test]
    async fn select_suggestion_sends_it() {
        let backend = ScriptedBackend::replying(json!({
            "answer": "X",
            "suggestion": ["What is an SGB?", "Gold ETF fees?"]
        }));
        let mut controller = ChatController::with_greeting("");
        controller.send(&backend, "hi").await;

        let outcome = controller.select_suggestion_at(&backend, 1).await;
        assert_eq!(outcome, Some(TurnOutcome::Answered));
        assert_eq!(
            backend.queries(),
            vec!["hi".to_string(), "Gold ETF fees?".to_string()]
        );
        assert_eq!(
            controller.state().messages()[2],
            Message::user("Gold ETF fees?")
        );

        assert_eq!(controller.select_suggestion_at(&backend, 9).await, None);
        assert_eq!(backend.queries().len(), 2);

        controller.select_suggestion(&backend, "direct").await;
        assert_eq!(backend.queries().last().map(String::as_str), Some("direct"));
    }

    #[tokio::test]
    async fn conversation_only_grows() {
        let backend = ScriptedBackend::replying(json!({"answer": "ok"}));
        let failing = ScriptedBackend::failing();
        let mut controller = ChatController::new();
        let mut previous = controller.state().messages().to_vec();
        for (i, text) in ["a", "b", "c"].into_iter().enumerate() {
            if i % 2 == 0 {
                controller.send(&backend, text).await;
            } else {
                controller.send(&failing, text).await;
            }
            let current = controller.state().messages();
            assert!(current.len() > previous.len());
            assert_eq!(&current[..previous.len()], previous.as_slice());
            previous = current.to_vec();
        }
    }
}
