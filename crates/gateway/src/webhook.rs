//! Inbound SMS/MMS webhook.
//!
//! The transport calls the webhook with Twilio-style parameters, either in
//! the query string (`GET`) or as a url-encoded form (`POST`). Whatever
//! happens, the handler answers HTTP 200 with a TwiML document: malformed
//! calls and pipeline failures both get an empty `<Response>`.

use std::collections::HashMap;

use {
    axum::{
        extract::{
            Form, Query, State,
            rejection::{FormRejection, QueryRejection},
        },
        http::header,
        response::{IntoResponse, Response},
    },
    phoso_common::{InboundEvent, MediaAttachment, Reply},
    tracing::{debug, warn},
};

use crate::{server::AppState, twiml};

type Params = HashMap<String, String>;

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("missing webhook parameter {0}")]
    Missing(String),

    #[error("invalid NumMedia value {0:?}")]
    InvalidMediaCount(String),

    #[error("unreadable webhook payload: {0}")]
    Payload(String),
}

/// Build an [`InboundEvent`] from webhook parameters.
///
/// `To` and `From` are required. `Body` defaults to empty and a missing
/// `NumMedia` means no attachments. Every announced attachment must carry
/// both `MediaUrl{n}` and `MediaContentType{n}`.
pub fn parse_event(params: &Params) -> Result<InboundEvent, ParseError> {
    let required = |key: &str| {
        params
            .get(key)
            .cloned()
            .ok_or_else(|| ParseError::Missing(key.to_string()))
    };

    let mut event = InboundEvent::new(
        required("To")?,
        required("From")?,
        params.get("Body").cloned().unwrap_or_default(),
    );
    if let Some(sid) = params.get("SmsMessageSid").or_else(|| params.get("MessageSid")) {
        event = event.with_message_id(sid.clone());
    }

    let count = match params.get("NumMedia").map(|v| v.trim()) {
        None | Some("") => 0,
        Some(raw) => raw
            .parse::<usize>()
            .map_err(|_| ParseError::InvalidMediaCount(raw.to_string()))?,
    };
    for index in 0..count {
        let url = required(&format!("MediaUrl{index}"))?;
        let content_type = required(&format!("MediaContentType{index}"))?;
        event = event.with_attachment(MediaAttachment::new(url, content_type));
    }
    Ok(event)
}

pub async fn webhook_get(
    State(state): State<AppState>,
    params: Result<Query<Params>, QueryRejection>,
) -> Response {
    let params = params
        .map(|Query(params)| params)
        .map_err(|e| ParseError::Payload(e.body_text()));
    respond(&state, params).await
}

pub async fn webhook_post(
    State(state): State<AppState>,
    params: Result<Form<Params>, FormRejection>,
) -> Response {
    let params = params
        .map(|Form(params)| params)
        .map_err(|e| ParseError::Payload(e.body_text()));
    respond(&state, params).await
}

async fn respond(state: &AppState, params: Result<Params, ParseError>) -> Response {
    let reply = match params.and_then(|params| parse_event(&params)) {
        Ok(event) => {
            debug!(
                message_id = ?event.message_id,
                attachments = event.attachments.len(),
                "webhook call parsed"
            );
            state.pipeline.respond(&event).await
        },
        Err(e) => {
            warn!(error = %e, "rejecting malformed webhook call");
            Reply::Empty
        },
    };
    twiml_response(&reply)
}

fn twiml_response(reply: &Reply) -> Response {
    ([(header::CONTENT_TYPE, twiml::CONTENT_TYPE)], twiml::render(reply)).into_response()
}
