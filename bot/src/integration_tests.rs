//! Cross-layer tests for the letsplay workflow: in-memory identity-store
//! and catalog doubles drive the full resolve → fetch → intersect →
//! classify pipeline, including its incremental progress reporting and the
//! handoff into a picker session.

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use async_trait::async_trait;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use crate::engine::picker::{PickerDenied, PickerSession, PickerState};
    use crate::engine::workflow::{
        LetsPlayOutcome, Participant, ProgressReporter, find_common_games,
    };
    use crate::engine::{GameCatalog, IdentityStore};
    use crate::steam::{AppId, GameDetails, StoreCategory};

    // ── Doubles ────────────────────────────────────────────────────

    struct MapStore {
        links: HashMap<u64, String>,
    }

    #[async_trait]
    impl IdentityStore for MapStore {
        async fn steam_id_for(&self, discord_id: u64) -> Option<String> {
            self.links.get(&discord_id).cloned()
        }
    }

    /// Catalog double: per-id libraries (absent entry = fetch failure) and
    /// per-appid details (absent entry = storefront failure).
    struct MapCatalog {
        libraries: HashMap<String, HashMap<AppId, String>>,
        details: HashMap<AppId, GameDetails>,
    }

    #[async_trait]
    impl GameCatalog for MapCatalog {
        async fn owned_games(&self, steam_id: &str) -> Option<HashMap<AppId, String>> {
            self.libraries.get(steam_id).cloned()
        }
        async fn app_details(&self, appid: AppId) -> Option<GameDetails> {
            self.details.get(&appid).cloned()
        }
    }

    /// Records every reporter call for assertions.
    #[derive(Default)]
    struct RecordingReporter {
        missing: Vec<String>,
        fetch_failed: Vec<String>,
        private: Vec<String>,
        started: Vec<usize>,
        progress: Vec<(usize, usize)>,
    }

    #[async_trait]
    impl ProgressReporter for RecordingReporter {
        async fn missing_links(&mut self, names: &[String]) {
            self.missing.extend_from_slice(names);
        }
        async fn library_fetch_failed(&mut self, name: &str, _steam_id: &str) {
            self.fetch_failed.push(name.to_string());
        }
        async fn private_or_empty(&mut self, names: &[String]) {
            self.private.extend_from_slice(names);
        }
        async fn classification_started(&mut self, total: usize) {
            self.started.push(total);
        }
        async fn classification_progress(&mut self, checked: usize, total: usize) {
            self.progress.push((checked, total));
        }
    }

    // ── Fixtures ───────────────────────────────────────────────────

    fn participant(discord_id: u64, name: &str) -> Participant {
        Participant {
            discord_id,
            name: name.to_string(),
        }
    }

    fn steam_id(n: u64) -> String {
        format!("7656119{n:010}")
    }

    fn multiplayer(name: &str) -> GameDetails {
        GameDetails {
            name: name.into(),
            header_image: Some(format!("https://cdn.example/{name}.jpg")),
            categories: vec![StoreCategory {
                description: "Multi-player".into(),
            }],
        }
    }

    fn single_player(name: &str) -> GameDetails {
        GameDetails {
            name: name.into(),
            header_image: None,
            categories: vec![StoreCategory {
                description: "Single-player".into(),
            }],
        }
    }

    fn library(games: &[(AppId, &str)]) -> HashMap<AppId, String> {
        games
            .iter()
            .map(|(appid, name)| (*appid, name.to_string()))
            .collect()
    }

    // ── Workflow scenarios ─────────────────────────────────────────

    #[tokio::test]
    async fn test_failed_fetch_excludes_participant_without_zeroing_intersection() {
        let store = MapStore {
            links: HashMap::from([
                (1, steam_id(1)),
                (2, steam_id(2)),
                (3, steam_id(3)),
            ]),
        };
        // Carol's library is absent entirely: her fetch fails outright.
        let catalog = MapCatalog {
            libraries: HashMap::from([
                (steam_id(1), library(&[(10, "SpaceWar"), (20, "Portal 2")])),
                (steam_id(2), library(&[(10, "SpaceWar")])),
            ]),
            details: HashMap::from([(10, multiplayer("SpaceWar")), (20, multiplayer("Portal 2"))]),
        };
        let participants = [
            participant(1, "alice"),
            participant(2, "bob"),
            participant(3, "carol"),
        ];
        let mut reporter = RecordingReporter::default();

        let outcome = find_common_games(&store, &catalog, &participants, &mut reporter).await;

        assert_eq!(
            outcome,
            LetsPlayOutcome::Found {
                libraries: 2,
                games: vec![crate::engine::GameCandidate {
                    name: "SpaceWar".into(),
                    image_url: Some("https://cdn.example/SpaceWar.jpg".into()),
                }],
            }
        );
        // Carol is a fetch failure, never "private or no games".
        assert_eq!(reporter.fetch_failed, vec!["carol"]);
        assert!(reporter.private.is_empty());
        assert!(reporter.missing.is_empty());
    }

    #[tokio::test]
    async fn test_private_profile_reported_separately_from_fetch_failure() {
        let store = MapStore {
            links: HashMap::from([(1, steam_id(1)), (2, steam_id(2)), (3, steam_id(3))]),
        };
        let catalog = MapCatalog {
            libraries: HashMap::from([
                (steam_id(1), library(&[(10, "SpaceWar")])),
                (steam_id(2), library(&[(10, "SpaceWar")])),
                (steam_id(3), HashMap::new()), // private or zero games
            ]),
            details: HashMap::from([(10, multiplayer("SpaceWar"))]),
        };
        let participants = [
            participant(1, "alice"),
            participant(2, "bob"),
            participant(3, "carol"),
        ];
        let mut reporter = RecordingReporter::default();

        let outcome = find_common_games(&store, &catalog, &participants, &mut reporter).await;

        assert!(matches!(outcome, LetsPlayOutcome::Found { libraries: 2, .. }));
        assert_eq!(reporter.private, vec!["carol"]);
        assert!(reporter.fetch_failed.is_empty());
    }

    #[tokio::test]
    async fn test_unlinked_participant_reported_missing() {
        let store = MapStore {
            links: HashMap::from([(1, steam_id(1)), (2, steam_id(2))]),
        };
        let catalog = MapCatalog {
            libraries: HashMap::from([
                (steam_id(1), library(&[(10, "SpaceWar")])),
                (steam_id(2), library(&[(10, "SpaceWar")])),
            ]),
            details: HashMap::from([(10, multiplayer("SpaceWar"))]),
        };
        let participants = [
            participant(1, "alice"),
            participant(2, "bob"),
            participant(9, "mallory"),
        ];
        let mut reporter = RecordingReporter::default();

        let outcome = find_common_games(&store, &catalog, &participants, &mut reporter).await;

        assert!(matches!(outcome, LetsPlayOutcome::Found { .. }));
        assert_eq!(reporter.missing, vec!["mallory"]);
    }

    #[tokio::test]
    async fn test_single_usable_library_aborts() {
        let store = MapStore {
            links: HashMap::from([(1, steam_id(1)), (2, steam_id(2))]),
        };
        let catalog = MapCatalog {
            libraries: HashMap::from([
                (steam_id(1), library(&[(10, "SpaceWar")])),
                (steam_id(2), HashMap::new()),
            ]),
            details: HashMap::new(),
        };
        let participants = [participant(1, "alice"), participant(2, "bob")];
        let mut reporter = RecordingReporter::default();

        let outcome = find_common_games(&store, &catalog, &participants, &mut reporter).await;

        assert_eq!(outcome, LetsPlayOutcome::NotEnoughLibraries);
        // Aborting means classification never starts.
        assert!(reporter.started.is_empty());
        assert!(reporter.progress.is_empty());
    }

    #[tokio::test]
    async fn test_no_usable_libraries_aborts() {
        let store = MapStore {
            links: HashMap::from([(1, steam_id(1)), (2, steam_id(2))]),
        };
        let catalog = MapCatalog {
            libraries: HashMap::from([(steam_id(1), HashMap::new())]),
            details: HashMap::new(),
        };
        let participants = [participant(1, "alice"), participant(2, "bob")];
        let mut reporter = RecordingReporter::default();

        let outcome = find_common_games(&store, &catalog, &participants, &mut reporter).await;

        assert_eq!(outcome, LetsPlayOutcome::NoUsableLibraries);
        assert_eq!(reporter.private, vec!["alice"]);
        assert_eq!(reporter.fetch_failed, vec!["bob"]);
    }

    #[tokio::test]
    async fn test_common_games_all_single_player_yields_empty_result() {
        // Seven shared titles, none of them multiplayer.
        let shared: Vec<(AppId, &str)> = vec![
            (1, "G1"),
            (2, "G2"),
            (3, "G3"),
            (4, "G4"),
            (5, "G5"),
            (6, "G6"),
            (7, "G7"),
        ];
        let store = MapStore {
            links: HashMap::from([(1, steam_id(1)), (2, steam_id(2))]),
        };
        let catalog = MapCatalog {
            libraries: HashMap::from([
                (steam_id(1), library(&shared)),
                (steam_id(2), library(&shared)),
            ]),
            details: shared
                .iter()
                .map(|(appid, name)| (*appid, single_player(name)))
                .collect(),
        };
        let participants = [participant(1, "alice"), participant(2, "bob")];
        let mut reporter = RecordingReporter::default();

        let outcome = find_common_games(&store, &catalog, &participants, &mut reporter).await;

        assert_eq!(outcome, LetsPlayOutcome::NoCommonMultiplayer);
        // Seven titles is over the threshold: one start, one update at 5/7.
        assert_eq!(reporter.started, vec![7]);
        assert_eq!(reporter.progress, vec![(5, 7)]);
    }

    #[tokio::test]
    async fn test_progress_cadence_for_larger_intersections() {
        let shared: Vec<(AppId, String)> =
            (1..=12).map(|n| (n as AppId, format!("Game {n:02}"))).collect();
        let shared_refs: Vec<(AppId, &str)> = shared
            .iter()
            .map(|(appid, name)| (*appid, name.as_str()))
            .collect();
        let store = MapStore {
            links: HashMap::from([(1, steam_id(1)), (2, steam_id(2))]),
        };
        let catalog = MapCatalog {
            libraries: HashMap::from([
                (steam_id(1), library(&shared_refs)),
                (steam_id(2), library(&shared_refs)),
            ]),
            details: shared
                .iter()
                .map(|(appid, name)| (*appid, multiplayer(name)))
                .collect(),
        };
        let participants = [participant(1, "alice"), participant(2, "bob")];
        let mut reporter = RecordingReporter::default();

        let outcome = find_common_games(&store, &catalog, &participants, &mut reporter).await;

        assert_eq!(reporter.started, vec![12]);
        assert_eq!(reporter.progress, vec![(5, 12), (10, 12)]);

        // Results come back sorted by name.
        let LetsPlayOutcome::Found { games, .. } = outcome else {
            panic!("expected games");
        };
        let names: Vec<&str> = games.iter().map(|g| g.name.as_str()).collect();
        let mut sorted = names.clone();
        sorted.sort_unstable();
        assert_eq!(names, sorted);
        assert_eq!(games.len(), 12);
    }

    #[tokio::test]
    async fn test_small_intersection_reports_no_progress() {
        let shared = [(10, "SpaceWar"), (20, "Portal 2")];
        let store = MapStore {
            links: HashMap::from([(1, steam_id(1)), (2, steam_id(2))]),
        };
        let catalog = MapCatalog {
            libraries: HashMap::from([
                (steam_id(1), library(&shared)),
                (steam_id(2), library(&shared)),
            ]),
            details: HashMap::from([(10, multiplayer("SpaceWar")), (20, multiplayer("Portal 2"))]),
        };
        let participants = [participant(1, "alice"), participant(2, "bob")];
        let mut reporter = RecordingReporter::default();

        find_common_games(&store, &catalog, &participants, &mut reporter).await;

        assert!(reporter.started.is_empty());
        assert!(reporter.progress.is_empty());
    }

    #[tokio::test]
    async fn test_title_with_unavailable_details_is_left_out() {
        let shared = [(10, "SpaceWar"), (20, "Lost Game")];
        let store = MapStore {
            links: HashMap::from([(1, steam_id(1)), (2, steam_id(2))]),
        };
        // Only appid 10 has storefront details; 20 fails to fetch and must
        // be dropped, not shown as an unknown entry.
        let catalog = MapCatalog {
            libraries: HashMap::from([
                (steam_id(1), library(&shared)),
                (steam_id(2), library(&shared)),
            ]),
            details: HashMap::from([(10, multiplayer("SpaceWar"))]),
        };
        let participants = [participant(1, "alice"), participant(2, "bob")];
        let mut reporter = RecordingReporter::default();

        let outcome = find_common_games(&store, &catalog, &participants, &mut reporter).await;

        let LetsPlayOutcome::Found { games, .. } = outcome else {
            panic!("expected games");
        };
        assert_eq!(games.len(), 1);
        assert_eq!(games[0].name, "SpaceWar");
    }

    // ── Workflow → picker handoff ──────────────────────────────────

    #[tokio::test]
    async fn test_found_outcome_drives_a_full_picker_session() {
        let shared = [(10, "SpaceWar"), (20, "Portal 2")];
        let store = MapStore {
            links: HashMap::from([(1, steam_id(1)), (2, steam_id(2))]),
        };
        let catalog = MapCatalog {
            libraries: HashMap::from([
                (steam_id(1), library(&shared)),
                (steam_id(2), library(&shared)),
            ]),
            details: HashMap::from([(10, multiplayer("SpaceWar")), (20, multiplayer("Portal 2"))]),
        };
        let participants = [participant(1, "alice"), participant(2, "bob")];
        let mut reporter = RecordingReporter::default();

        let outcome = find_common_games(&store, &catalog, &participants, &mut reporter).await;
        let LetsPlayOutcome::Found { games, .. } = outcome else {
            panic!("expected games");
        };

        let mut session = PickerSession::new(games);
        let mut rng = StdRng::seed_from_u64(42);
        session.pick(&mut rng).unwrap();
        for _ in 0..3 {
            session.reroll(&mut rng).unwrap();
        }
        assert_eq!(session.state(), PickerState::Exhausted);
        assert_eq!(session.reroll(&mut rng), Err(PickerDenied::OutOfRerolls));
    }
}
