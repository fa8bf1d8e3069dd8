//! TwiML rendering of pipeline replies.

use phoso_common::Reply;

pub const CONTENT_TYPE: &str = "application/xml";

const DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

/// Render `reply` as a TwiML document.
///
/// [`Reply::Empty`] and blank texts produce a bare `<Response></Response>`,
/// which tells the transport not to answer the sender.
#[must_use]
pub fn render(reply: &Reply) -> String {
    match reply.text() {
        Some(text) if !text.is_empty() => format!(
            "{DECLARATION}<Response><Message>{}</Message></Response>",
            escape(text)
        ),
        _ => format!("{DECLARATION}<Response></Response>"),
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}
