//! Message bodies for photo notifications.

use serde_json::{Value, json};

fn link_markup(link: &str, filename: &str) -> String {
    format!("<{link}|{filename}> (Google Drive)")
}

/// Comment attached to an uploaded photo.
///
/// Without a link only the message text is used, or the filename when the
/// text is empty.
#[must_use]
pub fn upload_caption(text: &str, link: Option<&str>, filename: &str) -> String {
    match link {
        Some(link) => format!("{text}\n{}", link_markup(link, filename)),
        None if text.is_empty() => filename.to_string(),
        None => text.to_string(),
    }
}

/// Blocks for a message that references the photo by URL.
///
/// Order: the sender's text (when non-empty), the storage link (when the
/// upload succeeded), then the image itself.
#[must_use]
pub fn photo_blocks(text: &str, link: Option<&str>, filename: &str, image_url: &str) -> Vec<Value> {
    let mut blocks = Vec::with_capacity(3);
    if !text.is_empty() {
        blocks.push(json!({
            "type": "section",
            "text": { "type": "plain_text", "text": text },
        }));
    }
    if let Some(link) = link {
        blocks.push(json!({
            "type": "section",
            "text": { "type": "mrkdwn", "text": link_markup(link, filename) },
        }));
    }
    blocks.push(json!({
        "type": "image",
        "image_url": image_url,
        "alt_text": "Image from SMS sender",
    }));
    blocks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caption_with_link() {
        assert_eq!(
            upload_caption("at the park", Some("https://d/F1"), "a.jpg"),
            "at the park\n<https://d/F1|a.jpg> (Google Drive)"
        );
    }

    #[test]
    fn caption_without_link_falls_back() {
        assert_eq!(upload_caption("hi", None, "a.jpg"), "hi");
        assert_eq!(upload_caption("", None, "a.jpg"), "a.jpg");
    }

    #[test]
    fn blocks_include_text_link_and_image() {
        let blocks = photo_blocks("hello", Some("https://d/F1"), "a.jpg", "https://m/1");
        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[0]["text"]["type"], "plain_text");
        assert_eq!(blocks[1]["text"]["text"], "<https://d/F1|a.jpg> (Google Drive)");
        assert_eq!(blocks[2]["image_url"], "https://m/1");
    }

    #[test]
    fn blocks_skip_empty_text_and_missing_link() {
        let blocks = photo_blocks("", None, "a.jpg", "https://m/1");
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0]["type"], "image");
    }
}
