// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::collections::HashSet;

use crate::model::Episode;

/// Result of comparing a feed's episodes against the stored ones
#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeDiff {
    /// Remote episodes with no stored counterpart, in feed order
    pub new_episodes: Vec<Episode>,
    /// Remote episodes whose guid is already stored
    pub already_stored: Vec<Episode>,
    /// Total number of episodes in the feed
    pub total_episodes: usize,
}

/// Split remote episodes into new and already stored ones
///
/// Matching is by guid only. An episode whose metadata changed upstream but
/// whose guid did not is never reported as new.
pub fn diff_episodes(local: &[Episode], remote: &[Episode]) -> EpisodeDiff {
    let known: HashSet<&str> = local.iter().map(|e| e.guid.as_str()).collect();

    let (already_stored, new_episodes): (Vec<_>, Vec<_>) = remote
        .iter()
        .cloned()
        .partition(|episode| known.contains(episode.guid.as_str()));

    EpisodeDiff {
        new_episodes,
        already_stored,
        total_episodes: remote.len(),
    }
}

/// Episodes from `remote` whose guid does not appear in `local`, order preserved
pub fn find_new_episodes(local: &[Episode], remote: &[Episode]) -> Vec<Episode> {
    diff_episodes(local, remote).new_episodes
}
