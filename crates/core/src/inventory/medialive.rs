//! MediaLive channel inventory.

use std::time::Instant;

use async_trait::async_trait;
use aws_sdk_medialive::error::DisplayErrorContext;
use aws_sdk_medialive::Client;
use tracing::{debug, warn};

use crate::fleet::{ActiveGroup, GroupId, LifecycleState};
use crate::metrics::record_external_call;

use super::{FleetInventory, InventoryError};

/// Lists active channels through the paginated `ListChannels` API.
#[derive(Debug, Clone)]
pub struct MediaLiveInventory {
    client: Client,
}

impl MediaLiveInventory {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl FleetInventory for MediaLiveInventory {
    fn name(&self) -> &str {
        "medialive"
    }

    async fn active_groups(&self) -> Result<Vec<ActiveGroup>, InventoryError> {
        let started = Instant::now();
        let mut pages = self.client.list_channels().into_paginator().send();
        let mut groups = Vec::new();

        while let Some(page) = pages.next().await {
            let page = match page {
                Ok(page) => page,
                Err(e) => {
                    record_external_call("medialive", "list_channels", started, false);
                    return Err(InventoryError::Api(DisplayErrorContext(&e).to_string()));
                }
            };

            for channel in page.channels.unwrap_or_default() {
                let state = channel.state.as_ref().map(|s| s.as_str());
                if let Some(group) = active_group_from_summary(
                    channel.id.as_deref(),
                    channel.arn.as_deref(),
                    state,
                    channel.pipelines_running_count,
                ) {
                    groups.push(group);
                }
            }
        }
        record_external_call("medialive", "list_channels", started, true);

        debug!(active = groups.len(), "Listed active channels");
        Ok(groups)
    }
}

/// Build an [`ActiveGroup`] from one channel summary, or `None` if the channel
/// is not in an active state or cannot be identified.
fn active_group_from_summary(
    id: Option<&str>,
    arn: Option<&str>,
    state: Option<&str>,
    pipelines_running: Option<i32>,
) -> Option<ActiveGroup> {
    let state = LifecycleState::parse(state?);
    if !state.is_active() {
        return None;
    }

    let group = match (id, arn) {
        (Some(id), _) if !id.trim().is_empty() => GroupId::new(id).ok(),
        (_, Some(arn)) => GroupId::from_arn(arn).ok(),
        _ => None,
    };
    let Some(group) = group else {
        warn!(?arn, "Skipping active channel without a usable identifier");
        return None;
    };

    Some(ActiveGroup {
        group,
        pipelines_running: pipelines_running.unwrap_or(0).max(0) as u32,
    })
}
