use crate::connection::ConnectionId;
use axum::response::sse::Event;
use domain::Item;

/// One meme as delivered on a connection's event stream.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub title: String,
    pub url: String,
    pub conn_id: String,
}

impl Message {
    pub fn new(item: Item, conn_id: &ConnectionId) -> Self {
        Self {
            title: item.title,
            url: item.url,
            conn_id: conn_id.to_string(),
        }
    }

    /// The `data:` payload: `{"title": <t>, "url": <u>, "connID": <id>}` with every
    /// value JSON-string-escaped.
    pub fn data(&self) -> String {
        format!(
            "{{\"title\": {}, \"url\": {}, \"connID\": {}}}",
            json_string(&self.title),
            json_string(&self.url),
            json_string(&self.conn_id)
        )
    }

    /// The full wire frame including the `data: ` prefix and terminating blank line.
    pub fn frame(&self) -> String {
        format!("data: {}\n\n", self.data())
    }
}

impl From<Message> for Event {
    fn from(message: Message) -> Self {
        Event::default().data(message.data())
    }
}

fn json_string(value: &str) -> String {
    // Serializing a str cannot fail.
    serde_json::to_string(value).unwrap_or_default()
}
