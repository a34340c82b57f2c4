//! Episode snapshot fetching from Neo4j via the GraphClient.

use vantage_core::types::EpisodeId;
use vantage_graph::GraphClient;

use crate::error::{AdvisorError, Result};
use crate::snapshot::EpisodeSnapshot;

/// Fetch one consistent image of an episode partition.
///
/// The Episode marker is read first; its absence means the partition is
/// EMPTY and the call fails with `NotInitialized` before any row query
/// runs. Mask and feature computation fold over the returned snapshot
/// in memory rather than issuing per-template queries.
pub async fn fetch_episode_snapshot(
    client: &GraphClient,
    episode: &EpisodeId,
) -> Result<EpisodeSnapshot> {
    let marker = client
        .episode_marker(episode)
        .await?
        .ok_or_else(|| AdvisorError::NotInitialized {
            episode: episode.clone(),
        })?;

    let postures = client.host_postures(episode).await?;
    let links = client.reachability_pairs(episode).await?;
    let exposures = client.exposure_rows(episode).await?;
    let credentials = client.credential_access_rows(episode).await?;

    Ok(EpisodeSnapshot::from_rows(
        episode.clone(),
        marker.step,
        postures,
        links,
        exposures,
        credentials,
    ))
}
