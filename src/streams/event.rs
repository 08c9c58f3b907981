//! A single published event.

use axum::response::sse::Event;
use serde::{Deserialize, Serialize};

/// One event on a stream, written to the client as one SSE frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<String>,
    pub data: String,
}

impl StreamEvent {
    pub fn new(data: impl Into<String>) -> Self {
        Self {
            id: None,
            event: None,
            data: data.into(),
        }
    }

    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    #[must_use]
    pub fn with_event(mut self, event: impl Into<String>) -> Self {
        self.event = Some(event.into());
        self
    }

    /// SSE frame for this event.
    ///
    /// `id` and `event` values containing line breaks cannot be framed and
    /// are left out.
    pub fn to_sse(&self) -> Event {
        let mut frame = Event::default().data(&self.data);
        if let Some(id) = self.id.as_deref().filter(|v| is_single_line(v)) {
            frame = frame.id(id);
        }
        if let Some(event) = self.event.as_deref().filter(|v| is_single_line(v)) {
            frame = frame.event(event);
        }
        frame
    }
}

fn is_single_line(value: &str) -> bool {
    !value.contains(['\n', '\r', '\0'])
}

impl From<&str> for StreamEvent {
    fn from(data: &str) -> Self {
        Self::new(data)
    }
}

impl From<String> for StreamEvent {
    fn from(data: String) -> Self {
        Self::new(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_optional_fields() {
        let event = StreamEvent::new("hello").with_id("1").with_event("token");
        assert_eq!(event.id.as_deref(), Some("1"));
        assert_eq!(event.event.as_deref(), Some("token"));
        assert_eq!(event.data, "hello");
    }

    #[test]
    fn multi_line_names_are_not_framed() {
        assert!(is_single_line("token"));
        assert!(!is_single_line("a\nb"));
        // must not panic inside axum's Event builder
        let _ = StreamEvent::new("x").with_id("1\n2").with_event("e\r").to_sse();
    }

    #[test]
    fn serializes_without_absent_fields() {
        let json = serde_json::to_string(&StreamEvent::from("hi")).unwrap();
        assert_eq!(json, r#"{"data":"hi"}"#);
    }
}
