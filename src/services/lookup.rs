// Lookup policies on top of a metadata source
// Titles are retried with a fixed delay; channel names get a single attempt
// and fall back to a sentinel so a flaky lookup never blocks the batch.

use anyhow::Result;
use async_trait::async_trait;

use crate::pacing::{Pacer, PacingPolicy};

/// Label used when a channel name cannot be resolved
pub const UNKNOWN_CHANNEL: &str = "Unknown";

/// Remote pages keyed by video or channel id. Each call is one attempt.
#[async_trait]
pub trait MetadataSource: Send + Sync {
    /// Ok(None) when the page answered but had no usable title
    async fn video_title(&self, video_id: &str) -> Result<Option<String>>;

    async fn channel_name(&self, channel_id: &str) -> Result<Option<String>>;
}

/// Fetch a video title, retrying up to `policy.attempts()` times
///
/// Returns None once attempts are exhausted; a later run may retry the item.
pub async fn fetch_title(
    source: &dyn MetadataSource,
    pacer: &dyn Pacer,
    policy: &PacingPolicy,
    video_id: &str,
) -> Option<String> {
    let attempts = policy.attempts();

    for attempt in 1..=attempts {
        tracing::debug!("Title lookup for {}, attempt {}/{}", video_id, attempt, attempts);

        match source.video_title(video_id).await {
            Ok(Some(title)) => return Some(title),
            Ok(None) => {
                tracing::debug!("No title found for {} on attempt {}", video_id, attempt);
            }
            Err(e) => {
                tracing::debug!("Title lookup for {} failed: {:#}", video_id, e);
            }
        }

        if attempt < attempts {
            pacer.pause(policy.retry_delay).await;
        }
    }

    tracing::warn!(
        "Failed to fetch title for video ID {} after {} attempts",
        video_id,
        attempts
    );
    None
}

/// Resolve a channel id to a display name, never failing
pub async fn resolve_channel_name(source: &dyn MetadataSource, channel_id: &str) -> String {
    match source.channel_name(channel_id).await {
        Ok(Some(name)) => name,
        Ok(None) => {
            tracing::warn!("No channel name found for '{}', using '{}'", channel_id, UNKNOWN_CHANNEL);
            UNKNOWN_CHANNEL.to_string()
        }
        Err(e) => {
            tracing::warn!(
                "Channel lookup for '{}' failed: {:#}. Using '{}'",
                channel_id,
                e,
                UNKNOWN_CHANNEL
            );
            UNKNOWN_CHANNEL.to_string()
        }
    }
}
