//! Ordered keyword-to-resolution lookup table.

use serde::{Deserialize, Serialize};
use tracing::warn;

/// One known issue signature and its canned resolution.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct KnowledgeEntry {
    pub issue_type: String,
    pub keywords: Vec<String>,
    pub resolution: String,
}

impl KnowledgeEntry {
    pub fn new<I, S>(issue_type: impl Into<String>, keywords: I, resolution: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            issue_type: issue_type.into(),
            keywords: keywords.into_iter().map(Into::into).collect(),
            resolution: resolution.into(),
        }
    }

    /// Built-in table, in evaluation order.
    pub fn defaults() -> Vec<KnowledgeEntry> {
        vec![
            KnowledgeEntry::new(
                "PASSWORD_RESET",
                ["password", "reset", "forgot", "locked"],
                "Your password has been reset. Please follow these steps:\n\
                 1. Check your email for the password reset link\n\
                 2. Click the link and create a new password\n\
                 3. Use at least 8 characters with a mix of letters, numbers, and symbols\n\
                 4. Try logging in with your new password\n\n\
                 If you don't receive the email within 5 minutes, check your spam folder.",
            ),
            KnowledgeEntry::new(
                "WIFI_CONNECTION",
                ["wifi", "wireless", "connect", "network"],
                "To resolve WiFi connection issues:\n\
                 1. Restart your device\n\
                 2. Forget the network and reconnect\n\
                 3. Ensure you're using the correct password\n\
                 4. Check if other devices can connect\n\
                 5. Move closer to the access point\n\n\
                 Network: CompanyWiFi\n\
                 Password: [Check with IT if needed]",
            ),
            KnowledgeEntry::new(
                "SOFTWARE_CRASH",
                ["crash", "error", "stopped working", "not responding"],
                "To resolve application crashes:\n\
                 1. Close the application completely\n\
                 2. Restart your computer\n\
                 3. Check for software updates\n\
                 4. Clear application cache if possible\n\
                 5. Reinstall if the issue persists\n\n\
                 If this doesn't resolve the issue, we'll need to investigate further.",
            ),
        ]
    }
}

/// Read-only knowledge base. The first entry with any keyword present wins, so earlier
/// entries pre-empt later ones on overlapping keywords.
#[derive(Debug, Clone)]
pub struct KnowledgeBase {
    entries: Vec<KnowledgeEntry>,
}

impl Default for KnowledgeBase {
    fn default() -> Self {
        Self::new(KnowledgeEntry::defaults())
    }
}

impl KnowledgeBase {
    /// Normalizes keywords and drops entries that could never yield a usable answer
    /// (no keywords left, or a blank resolution).
    pub fn new(entries: Vec<KnowledgeEntry>) -> Self {
        let entries = entries
            .into_iter()
            .map(|mut entry| {
                entry.keywords = entry
                    .keywords
                    .iter()
                    .map(|k| k.trim().to_lowercase())
                    .filter(|k| !k.is_empty())
                    .collect();
                entry
            })
            .filter(|entry| {
                let usable = !entry.keywords.is_empty() && !entry.resolution.trim().is_empty();
                if !usable {
                    warn!("Skipping unusable knowledge base entry {}", entry.issue_type);
                }
                usable
            })
            .collect();
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Case-insensitive substring match of `ticket_text` against each entry in order.
    pub fn resolve(&self, ticket_text: &str) -> Option<&KnowledgeEntry> {
        let text = ticket_text.to_lowercase();
        self.entries
            .iter()
            .find(|entry| entry.keywords.iter().any(|k| text.contains(k.as_str())))
    }
}
