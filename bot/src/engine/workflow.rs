//! The letsplay pipeline: resolve identities, fetch libraries, intersect,
//! classify, sort. Participants drop out step by step and every exclusion
//! is reported the moment it is discovered, not batched at the end.

use std::collections::HashSet;

use async_trait::async_trait;

use super::{GameCandidate, GameCatalog, IdentityStore, classifier};
use crate::steam::AppId;

/// Most players a single run will compare: the invoker plus four friends.
/// The command surface enforces this by arity; the assert documents it.
pub const MAX_GROUP_SIZE: usize = 5;

/// Intersections larger than this get progress reporting while they are
/// classified; smaller ones finish fast enough not to bother.
const PROGRESS_THRESHOLD: usize = 5;

/// Emit a progress update after this many classifications.
const PROGRESS_STRIDE: usize = 5;

/// One member of the group being compared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub discord_id: u64,
    pub name: String,
}

/// Incremental user-facing reporting while the workflow runs.
#[async_trait]
pub trait ProgressReporter: Send {
    /// Participants with no linked SteamID.
    async fn missing_links(&mut self, names: &[String]);

    /// A library fetch failed outright; the participant is excluded. This
    /// is not the same as a private profile.
    async fn library_fetch_failed(&mut self, name: &str, steam_id: &str);

    /// Participants whose profile is private or owns no games.
    async fn private_or_empty(&mut self, names: &[String]);

    /// Classification is starting over `total` common titles.
    async fn classification_started(&mut self, total: usize);

    /// `checked` of `total` titles classified so far.
    async fn classification_progress(&mut self, checked: usize, total: usize);
}

/// Result of a letsplay run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LetsPlayOutcome {
    /// Nobody in the group had a usable library.
    NoUsableLibraries,
    /// Only one usable library; there is nothing to intersect.
    NotEnoughLibraries,
    /// The group shares games, but none classified multiplayer-capable.
    NoCommonMultiplayer,
    /// Shared multiplayer titles, sorted by name.
    Found {
        /// How many libraries made it into the intersection.
        libraries: usize,
        games: Vec<GameCandidate>,
    },
}

/// Run the whole pipeline for one group.
///
/// Duplicate participants are deliberately not deduplicated here; that is
/// the caller's concern. A group that ends up with fewer than two usable
/// libraries aborts — every other failure only shrinks the group.
pub async fn find_common_games(
    store: &dyn IdentityStore,
    catalog: &dyn GameCatalog,
    participants: &[Participant],
    reporter: &mut dyn ProgressReporter,
) -> LetsPlayOutcome {
    debug_assert!(participants.len() <= MAX_GROUP_SIZE);

    // Resolve chat identities to SteamIDs.
    let mut resolved: Vec<(&Participant, String)> = Vec::new();
    let mut missing: Vec<String> = Vec::new();
    for participant in participants {
        match store.steam_id_for(participant.discord_id).await {
            Some(steam_id) => resolved.push((participant, steam_id)),
            None => missing.push(participant.name.clone()),
        }
    }
    if !missing.is_empty() {
        reporter.missing_links(&missing).await;
    }

    // Fetch libraries. A failed fetch excludes the participant; it never
    // counts as an empty library that would zero the intersection.
    let mut libraries: Vec<HashSet<AppId>> = Vec::new();
    let mut private: Vec<String> = Vec::new();
    for (participant, steam_id) in &resolved {
        match catalog.owned_games(steam_id).await {
            None => {
                reporter
                    .library_fetch_failed(&participant.name, steam_id)
                    .await;
            }
            Some(games) if games.is_empty() => private.push(participant.name.clone()),
            Some(games) => libraries.push(games.into_keys().collect()),
        }
    }
    if !private.is_empty() {
        reporter.private_or_empty(&private).await;
    }

    // An intersection needs at least two libraries to mean anything.
    if libraries.is_empty() {
        return LetsPlayOutcome::NoUsableLibraries;
    }
    if libraries.len() < 2 {
        return LetsPlayOutcome::NotEnoughLibraries;
    }

    let common = intersect_libraries(&libraries);

    // Classify each common title, reusing the same details fetch for name
    // and artwork. Sequential on purpose: every call goes through the
    // storefront cooldown, and this loop dominates the run time.
    let total = common.len();
    if total > PROGRESS_THRESHOLD {
        reporter.classification_started(total).await;
    }
    let mut games: Vec<GameCandidate> = Vec::new();
    for (index, appid) in common.iter().enumerate() {
        if let Some(details) = catalog.app_details(*appid).await
            && classifier::has_multiplayer_tag(&details)
        {
            games.push(GameCandidate {
                name: details.name,
                image_url: details.header_image,
            });
        }

        let checked = index + 1;
        if total > PROGRESS_THRESHOLD && checked % PROGRESS_STRIDE == 0 {
            reporter.classification_progress(checked, total).await;
        }
    }

    if games.is_empty() {
        return LetsPlayOutcome::NoCommonMultiplayer;
    }
    games.sort_by(|a, b| a.name.cmp(&b.name));
    LetsPlayOutcome::Found {
        libraries: libraries.len(),
        games,
    }
}

/// Set intersection across every library.
fn intersect_libraries(libraries: &[HashSet<AppId>]) -> Vec<AppId> {
    let Some((first, rest)) = libraries.split_first() else {
        return Vec::new();
    };
    first
        .iter()
        .filter(|appid| rest.iter().all(|library| library.contains(appid)))
        .copied()
        .collect()
}
