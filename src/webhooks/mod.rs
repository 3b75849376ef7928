//! Webhook handling for GitHub events.
//!
//! - Signature verification for webhook payloads (HMAC-SHA256)
//! - Payload parsing into [`WebhookEvent`]
//! - Handlers that turn events into GitHub effects

pub mod events;
pub mod handlers;
pub mod parser;
pub mod signature;

pub use events::{IssueCommentEvent, PullRequestEvent, WebhookEvent};
pub use handlers::{HandlerOutcome, handle_event};
pub use parser::{DELIVERY_HEADER, EVENT_HEADER, ParseError, parse_webhook};
pub use signature::{
    SIGNATURE_HEADER, compute_signature, format_signature_header, parse_signature_header,
    sign_payload, verify_signature,
};
