use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Router,
};
use serde::Deserialize;
use tracing::{error, instrument};

use crate::state::AppState;

use super::{replies, service};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/webhook", post(inbound_message))
        .route("/health", get(health))
}

/// Twilio posts inbound WhatsApp messages as form fields with capitalized
/// names.
#[derive(Debug, Deserialize)]
pub struct InboundForm {
    #[serde(rename = "From")]
    pub from: String,
    #[serde(rename = "Body")]
    pub body: String,
}

#[instrument(skip(state, form), fields(from = %form.from))]
pub async fn inbound_message(
    State(state): State<AppState>,
    Form(form): Form<InboundForm>,
) -> Response {
    let reply = match service::process_message(&state, &form.from, &form.body).await {
        Ok(reply) => reply,
        Err(e) => {
            error!(error = ?e, "message processing failed");
            replies::try_again()
        }
    };
    twiml(&reply)
}

pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

/// Webhook replies go back as TwiML so the transport delivers them in the
/// same round trip.
fn twiml(body: &str) -> Response {
    let xml = format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?><Response><Message>{}</Message></Response>",
        xml_escape(body)
    );
    ([(header::CONTENT_TYPE, "application/xml")], xml).into_response()
}

fn xml_escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_xml_metacharacters() {
        assert_eq!(
            xml_escape("100g de arroz & feijão <ok>"),
            "100g de arroz &amp; feijão &lt;ok&gt;"
        );
    }

    #[test]
    fn plain_text_passes_through() {
        assert_eq!(xml_escape("Olá! Tudo certo."), "Olá! Tudo certo.");
    }
}
