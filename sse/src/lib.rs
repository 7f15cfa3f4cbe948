//! Server-Sent Events (SSE) infrastructure for the meme stream.
//!
//! # Architecture
//!
//! - **One session per connection**: every `GET /memes` request gets its own
//!   `StreamSession`, driven on its own task. Sessions share nothing but the
//!   `ContentCache` and the `ConnectionRegistry`.
//! - **Bounded connection logs**: the registry keeps diagnostic logs for at most
//!   `capacity` connections and drops the oldest registration first.
//! - **Best-effort logging**: appending to an evicted connection's log is
//!   silently ignored and never affects the stream.
//!
//! # Message Flow
//!
//! 1. The web layer opens a session with the peer address and request headers
//! 2. The session registers itself, logs the headers, refreshes the cache
//! 3. The session is run on a task, pushing one `Message` per emit interval
//!    into a bounded channel
//! 4. The HTTP response body drains the channel as SSE `data:` frames
//! 5. When the client goes away the channel closes and the session logs it
//!
//! # Modules
//!
//! - `connection`: `ConnectionRegistry`, `ConnectionRecord` and `ConnectionId`
//! - `message`: the wire payload of one streamed meme
//! - `session`: the per-connection `StreamSession` state machine

pub mod connection;
pub mod message;
pub mod session;

pub use connection::{ConnectionId, ConnectionRecord, ConnectionRegistry, RequestHeaders};
pub use message::Message;
pub use session::{CloseReason, SessionState, StreamSession};
