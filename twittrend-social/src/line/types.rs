use serde::Serialize;

/// Body of `POST /v2/bot/message/push`.
#[derive(Debug, Clone, Serialize)]
pub struct PushRequest<'a> {
    pub to: &'a str,
    pub messages: Vec<Message<'a>>,
}

impl<'a> PushRequest<'a> {
    /// The whole text as a single bubble.
    pub fn single_text(to: &'a str, text: &'a str) -> Self {
        Self {
            to,
            messages: vec![Message::Text { text }],
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Message<'a> {
    Text { text: &'a str },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serializes_to_push_shape() {
        let req = PushRequest::single_text("Cabc", "hello\nworld");
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({
                "to": "Cabc",
                "messages": [{ "type": "text", "text": "hello\nworld" }]
            })
        );
    }
}
