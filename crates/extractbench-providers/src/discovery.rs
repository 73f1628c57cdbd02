//! Link discovery: collect the anchors of a seed page and let the crawler AI
//! pick the ones matching the case's instruction.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use extractbench_core::{CollaboratorError, CollaboratorResult, Fetcher, Link, LinkDiscovery};
use serde_json::Value;
use tracing::{debug, warn};

use crate::chat::ChatClient;
use crate::error::{ProviderError, Result};
use crate::markup::{extract_anchors, Anchor};

/// Anchors offered to the AI per seed page.
pub const MAX_ANCHORS: usize = 400;

const SYSTEM_PROMPT: &str = "You select links from a web page. Reply with a JSON array of link numbers only.";

pub struct ChatLinkDiscovery {
    fetcher: Arc<dyn Fetcher>,
    client: Arc<ChatClient>,
}

impl ChatLinkDiscovery {
    pub fn new(fetcher: Arc<dyn Fetcher>, client: Arc<ChatClient>) -> Self {
        Self { fetcher, client }
    }

    async fn choose(&self, anchors: &[Anchor], prompt: &str, limit: usize) -> Result<Vec<Link>> {
        let listed: String = anchors
            .iter()
            .enumerate()
            .map(|(i, a)| format!("{}. {} ({})\n", i + 1, a.text, a.url))
            .collect();
        let request = format!(
            "Pick at most {limit} links matching this instruction: {prompt}\n\
             Return their numbers as a JSON array, best matches first.\n\n{listed}"
        );
        let reply = self.client.complete(SYSTEM_PROMPT, &request).await?;
        select_links(&reply, anchors, limit)
    }
}

#[async_trait]
impl LinkDiscovery for ChatLinkDiscovery {
    async fn discover(&self, seed_url: &str, prompt: &str, limit: usize) -> CollaboratorResult<Vec<Link>> {
        let page = self.fetcher.fetch(seed_url).await?;
        let fail = |e: ProviderError| CollaboratorError::Discovery {
            url: seed_url.to_string(),
            reason: e.to_string(),
        };

        let mut anchors = extract_anchors(&page.body, seed_url).map_err(fail)?;
        if anchors.is_empty() {
            warn!(seed_url = %seed_url, "seed page has no links");
            return Ok(Vec::new());
        }
        anchors.truncate(MAX_ANCHORS);
        debug!(seed_url = %seed_url, anchors = anchors.len(), "asking crawler");

        self.choose(&anchors, prompt, limit).await.map_err(fail)
    }
}

/// Links named by a reply holding a JSON array of 1-based anchor numbers or
/// URLs. Unknown entries are ignored; the result is deduplicated, ordered as
/// in the reply and capped at `limit`.
pub fn select_links(reply: &str, anchors: &[Anchor], limit: usize) -> Result<Vec<Link>> {
    let (Some(start), Some(end)) = (reply.find('['), reply.rfind(']')) else {
        return Err(ProviderError::MalformedResponse("no JSON array in reply".to_string()));
    };
    if end < start {
        return Err(ProviderError::MalformedResponse("no JSON array in reply".to_string()));
    }
    let picks: Vec<Value> = serde_json::from_str(&reply[start..=end])?;

    let mut seen = HashSet::new();
    let links = picks
        .iter()
        .filter_map(|pick| match pick {
            Value::Number(n) => n
                .as_u64()
                .and_then(|i| (i as usize).checked_sub(1))
                .and_then(|i| anchors.get(i))
                .map(|a| a.url.clone()),
            Value::String(s) => anchors.iter().find(|a| a.url == *s).map(|a| a.url.clone()),
            _ => None,
        })
        .filter(|url| seen.insert(url.clone()))
        .take(limit)
        .map(Link::new)
        .collect();
    Ok(links)
}
