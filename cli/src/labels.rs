//! Display names for well-known claim topics.

use types::Topic;

/// Well-known topics and their names.
pub const WELL_KNOWN: &[(u64, &str)] = &[
    (1, "KYC (Know Your Customer)"),
    (2, "AML (Anti-Money Laundering)"),
    (3, "Accredited Investor"),
    (4, "Country Verification"),
    (5, "Age Verification"),
];

/// Label shown for any other topic.
pub const CUSTOM: &str = "Custom Topic";

/// Human-readable name for `topic`.
pub fn label(topic: Topic) -> &'static str {
    WELL_KNOWN.iter().find(|(id, _)| *id == topic.id()).map_or(CUSTOM, |&(_, name)| name)
}
