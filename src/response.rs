//! Small JSON response bodies shared by several endpoints.

use serde::{Deserialize, Serialize};

/// A response that only carries a human readable message, e.g. after a delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    /// The message shown to the user.
    pub message: String,
}

impl MessageResponse {
    /// Create a response with `message`.
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_owned(),
        }
    }
}
