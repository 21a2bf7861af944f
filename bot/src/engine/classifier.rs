use super::GameCatalog;
use crate::steam::{AppId, GameDetails};

/// Category substrings that mark a title as playable together. Matched
/// case-insensitively against the storefront category descriptions.
const MULTIPLAYER_MARKERS: [&str; 4] = ["multiplayer", "multi-player", "co-op", "mmo"];

/// True iff any storefront category marks the title multiplayer-capable.
pub fn has_multiplayer_tag(details: &GameDetails) -> bool {
    details.categories.iter().any(|category| {
        let description = category.description.to_lowercase();
        MULTIPLAYER_MARKERS
            .iter()
            .any(|marker| description.contains(marker))
    })
}

/// Fetch a title's details and classify it. Missing details classify as
/// not multiplayer: when the storefront cannot be asked, the title is left
/// out rather than guessed in.
pub async fn is_multiplayer(catalog: &dyn GameCatalog, appid: AppId) -> bool {
    match catalog.app_details(appid).await {
        Some(details) => has_multiplayer_tag(&details),
        None => false,
    }
}
