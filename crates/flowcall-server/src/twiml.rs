//! Minimal TwiML document builder.
//!
//! Only the verbs the voice routes answer with are supported. All text and
//! attribute values are XML-escaped on the way in.

use axum::{
    http::header,
    response::{IntoResponse, Response},
};
use std::borrow::Cow;

/// A `<Response>` document under construction.
#[derive(Debug, Clone, Default)]
pub struct Twiml {
    verbs: String,
}

impl Twiml {
    pub fn new() -> Self {
        Self::default()
    }

    /// `<Say>text</Say>`
    pub fn say(mut self, text: &str) -> Self {
        self.verbs.push_str("<Say>");
        self.verbs.push_str(&escape_xml(text));
        self.verbs.push_str("</Say>");
        self
    }

    /// A speech `<Gather>` posting its result to `action`, speaking `prompt`
    /// while it listens.
    pub fn gather_speech(mut self, action: &str, hints: &str, prompt: &str) -> Self {
        self.verbs.push_str(&format!(
            r#"<Gather input="speech" action="{}" method="POST" speechTimeout="auto""#,
            escape_xml(action)
        ));
        if !hints.trim().is_empty() {
            self.verbs
                .push_str(&format!(r#" hints="{}""#, escape_xml(hints)));
        }
        self.verbs.push('>');
        if !prompt.is_empty() {
            self.verbs.push_str("<Say>");
            self.verbs.push_str(&escape_xml(prompt));
            self.verbs.push_str("</Say>");
        }
        self.verbs.push_str("</Gather>");
        self
    }

    /// `<Redirect method="POST">url</Redirect>`
    pub fn redirect(mut self, url: &str) -> Self {
        self.verbs.push_str(r#"<Redirect method="POST">"#);
        self.verbs.push_str(&escape_xml(url));
        self.verbs.push_str("</Redirect>");
        self
    }

    pub fn hangup(mut self) -> Self {
        self.verbs.push_str("<Hangup/>");
        self
    }

    /// Hands the call to a ConversationRelay WebSocket session.
    pub fn conversation_relay(mut self, ws_url: &str, welcome_greeting: &str) -> Self {
        self.verbs.push_str(&format!(
            r#"<Connect><ConversationRelay url="{}" welcomeGreeting="{}"/></Connect>"#,
            escape_xml(ws_url),
            escape_xml(welcome_greeting)
        ));
        self
    }

    pub fn render(&self) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?><Response>{}</Response>"#,
            self.verbs
        )
    }
}

impl IntoResponse for Twiml {
    fn into_response(self) -> Response {
        ([(header::CONTENT_TYPE, "text/xml")], self.render()).into_response()
    }
}

/// Escapes the five XML special characters.
pub fn escape_xml(text: &str) -> Cow<'_, str> {
    if !text.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(text);
    }
    let mut escaped = String::with_capacity(text.len() + 16);
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            other => escaped.push(other),
        }
    }
    Cow::Owned(escaped)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_markup_in_spoken_text() {
        let doc = Twiml::new().say("Tom & Jerry's <deal>").render();
        assert_eq!(
            doc,
            r#"<?xml version="1.0" encoding="UTF-8"?><Response><Say>Tom &amp; Jerry&#x27;s &lt;deal&gt;</Say></Response>"#
        );
    }

    #[test]
    fn plain_text_is_borrowed() {
        assert!(matches!(escape_xml("hello there"), Cow::Borrowed(_)));
    }

    #[test]
    fn gather_wraps_prompt_and_hints() {
        let doc = Twiml::new()
            .gather_speech("/voice/respond", "sell car, \"trade in\"", "How can I help?")
            .render();
        assert!(doc.contains(r#"<Gather input="speech" action="/voice/respond" method="POST" speechTimeout="auto" hints="sell car, &quot;trade in&quot;">"#));
        assert!(doc.contains("<Say>How can I help?</Say></Gather>"));
    }

    #[test]
    fn gather_without_hints_omits_attribute() {
        let doc = Twiml::new().gather_speech("/voice/respond", " ", "").render();
        assert!(!doc.contains("hints="));
        assert!(doc.contains(r#"speechTimeout="auto"></Gather>"#));
    }

    #[test]
    fn verbs_render_in_order() {
        let doc = Twiml::new()
            .say("Goodbye.")
            .redirect("/voice")
            .hangup()
            .render();
        assert!(doc.ends_with(
            r#"<Response><Say>Goodbye.</Say><Redirect method="POST">/voice</Redirect><Hangup/></Response>"#
        ));
    }

    #[test]
    fn conversation_relay_document() {
        let doc = Twiml::new()
            .conversation_relay("wss://relay.example.com/ws/voice", "Ahoy!")
            .render();
        assert!(doc.contains(
            r#"<Connect><ConversationRelay url="wss://relay.example.com/ws/voice" welcomeGreeting="Ahoy!"/></Connect>"#
        ));
    }
}
