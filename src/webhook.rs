//! Push event payload sent by the source-control host

use serde::Deserialize;

const BRANCH_REF_PREFIX: &str = "refs/heads/";

/// Largest push payload accepted, matching GitHub's 25 MB delivery cap
pub const MAX_PAYLOAD_BYTES: usize = 25 * 1024 * 1024;

/// The part of a push event this server cares about.
/// Missing fields decode as empty strings, everything else is ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookPayload {
    #[serde(rename = "ref", default)]
    pub git_ref: String,
    #[serde(default)]
    pub repository: Repository,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Repository {
    #[serde(default)]
    pub name: String,
}

impl WebhookPayload {
    pub fn from_slice(body: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(body)
    }

    /// Branch name with `refs/heads/` stripped (refs/heads/master -> master).
    pub fn branch(&self) -> &str {
        self.git_ref
            .strip_prefix(BRANCH_REF_PREFIX)
            .unwrap_or(&self.git_ref)
    }

    pub fn repo_name(&self) -> &str {
        &self.repository.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_push_event_and_ignores_extra_fields() {
        let body = br#"{
            "ref": "refs/heads/master",
            "after": "0d1a26e67d8f5eaf1f6ba5c57fc3c7d91ac0fd1c",
            "repository": {"name": "agora", "full_name": "someone/agora"},
            "pusher": {"name": "someone"}
        }"#;
        let payload = WebhookPayload::from_slice(body).unwrap();
        assert_eq!(payload.branch(), "master");
        assert_eq!(payload.repo_name(), "agora");
    }

    #[test]
    fn branch_without_prefix_is_kept() {
        let payload = WebhookPayload {
            git_ref: "master".into(),
            ..Default::default()
        };
        assert_eq!(payload.branch(), "master");

        let tag = WebhookPayload {
            git_ref: "refs/tags/v1.0".into(),
            ..Default::default()
        };
        assert_eq!(tag.branch(), "refs/tags/v1.0");
    }

    #[test]
    fn prefix_is_stripped_once() {
        let payload = WebhookPayload {
            git_ref: "refs/heads/refs/heads/master".into(),
            ..Default::default()
        };
        assert_eq!(payload.branch(), "refs/heads/master");
    }

    #[test]
    fn missing_fields_are_empty() {
        let payload = WebhookPayload::from_slice(b"{}").unwrap();
        assert_eq!(payload.branch(), "");
        assert_eq!(payload.repo_name(), "");
    }

    #[test]
    fn malformed_bodies_are_rejected() {
        assert!(WebhookPayload::from_slice(b"").is_err());
        assert!(WebhookPayload::from_slice(b"not json").is_err());
        assert!(WebhookPayload::from_slice(b"[1, 2]").is_err());
        assert!(WebhookPayload::from_slice(br#"{"ref": 42}"#).is_err());
        assert!(WebhookPayload::from_slice(br#"{"repository": "agora"}"#).is_err());
    }
}
