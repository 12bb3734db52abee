//! Opaque credentials attached to remote calls.

use std::fmt;

/// Credentials for the remote job service.
///
/// Both values are opaque: the core attaches them to requests and never
/// inspects them. `Debug` output is redacted so credentials stay out of logs.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credential {
    /// Per-user bearer token.
    pub bearer_token: Option<String>,
    /// Static service token for the processing node.
    pub service_token: Option<String>,
}

impl Credential {
    /// Creates a credential from a bearer token and service token.
    pub fn new(bearer_token: Option<String>, service_token: Option<String>) -> Self {
        Self {
            bearer_token: bearer_token.filter(|t| !t.trim().is_empty()),
            service_token: service_token.filter(|t| !t.trim().is_empty()),
        }
    }

    /// A credential that attaches nothing.
    pub fn anonymous() -> Self {
        Self::default()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |v: &Option<String>| if v.is_some() { "<redacted>" } else { "<none>" };
        f.debug_struct("Credential")
            .field("bearer_token", &redact(&self.bearer_token))
            .field("service_token", &redact(&self.service_token))
            .finish()
    }
}
