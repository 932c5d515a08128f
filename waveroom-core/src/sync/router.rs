//! Role-Gated Command Router
//!
//! Single mutator of the playback state store. Local intents from the
//! presentation layer and inbound relay messages both land here; each call
//! mutates the state at most once and returns the side effects (outbound
//! messages, player commands, render/notice requests) for the session to
//! carry out. Nothing in this module blocks or performs I/O.

use rand::Rng;
use tracing::{debug, warn};

use super::protocol::{PlayPause, TrackSummary, WireMessage};
use super::state::{ClientRole, MediaHandle, SessionState, Track};

/// File extensions the host's picker may hand us
const SUPPORTED_EXTENSIONS: &[&str] = &["mp3", "wav", "m4a", "ogg"];

/// A file accepted by the host's file picker, tag already read by the
/// presentation glue
#[derive(Debug, Clone)]
pub struct NewFile {
    pub filename: String,
    /// Embedded metadata title, if present and readable
    pub tag_title: Option<String>,
    pub media: MediaHandle,
}

/// Which modifier flag a toggle intent refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagToggle {
    LoopQueue,
    LoopSong,
    Shuffle,
}

/// User intent forwarded by the presentation layer
#[derive(Debug, Clone)]
pub enum LocalIntent {
    AddFiles(Vec<NewFile>),
    RemoveTrack(usize),
    Reorder { from: usize, to: usize },
    PlayTrack(usize),
    TogglePlayPause,
    Next,
    Previous,
    /// Host seeked its own element; listeners get a resync trigger
    Seek(f64),
    SetVolume(f64),
    Toggle(FlagToggle),
    /// The local media element finished the active track
    TrackEnded,
    /// The listener adjusted their own output volume; host volume broadcasts
    /// are ignored from now on
    OutputVolumeChanged(f64),
}

/// Command for the local audio element (host playback or listener output)
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlayerCommand {
    /// Host: load and play the playlist entry at this index
    Load(usize),
    Play,
    Pause,
    /// Pause and drop the source (active track removed)
    Stop,
    SetVolume(f64),
    /// Listener: pause, then resume shortly after so the transport catches up
    /// with the host's new position
    Resync,
}

/// Side effects of one router call
#[derive(Debug, Default)]
pub struct Effects {
    /// Messages to send over the signaling channel
    pub outbound: Vec<WireMessage>,
    /// Commands for the local media element
    pub player: Vec<PlayerCommand>,
    /// Playlist/controls need re-rendering
    pub render: bool,
    /// Transient user-visible messages
    pub notices: Vec<String>,
}

fn playlist_update(state: &SessionState) -> WireMessage {
    WireMessage::PlaylistUpdate {
        playlist: state.playback.summaries(),
    }
}

/// Mutate `current`/`playing`, start local playback and broadcast the change
fn play_index(state: &mut SessionState, effects: &mut Effects, index: usize) {
    if index >= state.playback.playlist.len() {
        return;
    }
    state.playback.current = Some(index);
    state.playback.playing = true;
    effects.player.push(PlayerCommand::Load(index));
    effects.outbound.push(WireMessage::ControlTrack {
        index: index as i64,
    });
    effects.outbound.push(WireMessage::ControlPlayPause {
        state: PlayPause::Play,
    });
    effects.render = true;
}

/// Advance past the current track: shuffle pick, increment, wrap or stop
fn advance(state: &mut SessionState, effects: &mut Effects) {
    let len = state.playback.playlist.len();
    if state.playback.flags.shuffle {
        if len <= 1 {
            return;
        }
        let current = state.playback.current;
        let mut rng = rand::thread_rng();
        let next = loop {
            let candidate = rng.gen_range(0..len);
            if Some(candidate) != current {
                break candidate;
            }
        };
        play_index(state, effects, next);
        return;
    }

    let next = state.playback.current.map(|c| c + 1).unwrap_or(0);
    if next < len {
        play_index(state, effects, next);
    } else if state.playback.flags.loop_queue && len > 0 {
        play_index(state, effects, 0);
    } else {
        state.playback.current = None;
        state.playback.playing = false;
        effects.player.push(PlayerCommand::Pause);
        effects.render = true;
    }
}

fn file_display_name(filename: &str) -> String {
    filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(filename)
        .to_string()
}

fn supported_extension(filename: &str) -> bool {
    filename
        .rsplit('.')
        .next()
        .filter(|ext| *ext != filename)
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            SUPPORTED_EXTENSIONS.iter().any(|s| *s == ext)
        })
        .unwrap_or(false)
}

/// Apply a local user intent.
///
/// Mutating intents are accepted only from the host; a listener's presentation
/// layer disables those controls, but anything that slips through is ignored
/// here rather than acted on.
pub fn handle_intent(state: &mut SessionState, intent: LocalIntent) -> Effects {
    let mut effects = Effects::default();

    if let LocalIntent::OutputVolumeChanged(volume) = intent {
        state.volume_override = true;
        state.playback.volume = volume.clamp(0.0, 1.0);
        return effects;
    }

    if !state.role.is_host() {
        debug!("ignoring local intent {:?} in role {:?}", intent, state.role);
        return effects;
    }

    match intent {
        LocalIntent::AddFiles(files) => {
            let mut accepted = false;
            for file in files {
                if !supported_extension(&file.filename) {
                    effects
                        .notices
                        .push(format!("Unsupported type: {}", file.filename));
                    continue;
                }
                let candidate = file
                    .tag_title
                    .filter(|t| !t.is_empty())
                    .unwrap_or_else(|| file_display_name(&file.filename));
                let title = state.playback.unique_title(&candidate);
                state.playback.playlist.push(Track {
                    title,
                    filename: file.filename,
                    media: Some(file.media),
                });
                accepted = true;
            }
            if accepted {
                effects.render = true;
                effects.outbound.push(playlist_update(state));
            }
        }

        LocalIntent::RemoveTrack(index) => {
            if index >= state.playback.playlist.len() {
                return effects;
            }
            state.playback.playlist.remove(index);
            match state.playback.current {
                Some(current) if current == index => {
                    state.playback.current = None;
                    state.playback.playing = false;
                    effects.player.push(PlayerCommand::Stop);
                }
                Some(current) if current > index => {
                    state.playback.current = Some(current - 1);
                }
                _ => {}
            }
            effects.render = true;
            effects.outbound.push(playlist_update(state));
        }

        LocalIntent::Reorder { from, to } => {
            let len = state.playback.playlist.len();
            if from == to || from >= len || to >= len {
                return effects;
            }
            let track = state.playback.playlist.remove(from);
            state.playback.playlist.insert(to, track);
            if let Some(current) = state.playback.current {
                state.playback.current = Some(if current == from {
                    to
                } else if from < current && current <= to {
                    current - 1
                } else if to <= current && current < from {
                    current + 1
                } else {
                    current
                });
            }
            effects.render = true;
            effects.outbound.push(playlist_update(state));
        }

        LocalIntent::PlayTrack(index) => {
            play_index(state, &mut effects, index);
        }

        LocalIntent::TogglePlayPause => {
            if state.playback.playing {
                state.playback.playing = false;
                effects.player.push(PlayerCommand::Pause);
                effects.outbound.push(WireMessage::ControlPlayPause {
                    state: PlayPause::Pause,
                });
            } else if state.playback.current.is_some() {
                state.playback.playing = true;
                effects.player.push(PlayerCommand::Play);
                effects.outbound.push(WireMessage::ControlPlayPause {
                    state: PlayPause::Play,
                });
            }
        }

        LocalIntent::Next => {
            advance(state, &mut effects);
        }

        LocalIntent::Previous => {
            if let Some(current) = state.playback.current {
                if current > 0 {
                    play_index(state, &mut effects, current - 1);
                }
            }
        }

        LocalIntent::Seek(time) => {
            // The host's own element was already sought by the slider; the
            // broadcast lets listeners resynchronize.
            effects.outbound.push(WireMessage::ControlSeek { time });
        }

        LocalIntent::SetVolume(volume) => {
            let volume = volume.clamp(0.0, 1.0);
            state.playback.volume = volume;
            effects.player.push(PlayerCommand::SetVolume(volume));
            effects.outbound.push(WireMessage::ControlVolume { volume });
        }

        LocalIntent::Toggle(flag) => {
            let flags = &mut state.playback.flags;
            match flag {
                FlagToggle::LoopQueue => {
                    flags.loop_queue = !flags.loop_queue;
                    if flags.loop_queue {
                        flags.loop_song = false;
                    }
                }
                FlagToggle::LoopSong => {
                    flags.loop_song = !flags.loop_song;
                    if flags.loop_song {
                        flags.loop_queue = false;
                    }
                }
                FlagToggle::Shuffle => {
                    flags.shuffle = !flags.shuffle;
                }
            }
            effects.render = true;
            effects.outbound.push(WireMessage::ControlFlags {
                flags: state.playback.flags,
            });
        }

        LocalIntent::TrackEnded => {
            if state.playback.flags.loop_song {
                if let Some(current) = state.playback.current {
                    play_index(state, &mut effects, current);
                    return effects;
                }
            }
            advance(state, &mut effects);
        }

        LocalIntent::OutputVolumeChanged(_) => unreachable!("handled above"),
    }

    effects
}

/// Apply an inbound signaling message.
///
/// Host and listener subscribe to the same channel, so every arm checks the
/// local role before acting. `webrtc:*` messages are routed to the peer
/// negotiation manager before this function is reached.
pub fn handle_message(state: &mut SessionState, message: WireMessage) -> Effects {
    let mut effects = Effects::default();

    match message {
        WireMessage::Hello { client_id } => {
            state.client_id = Some(client_id);
        }

        WireMessage::Error { message } => {
            effects.notices.push(message);
        }

        WireMessage::RoomCreated => {
            state.role = ClientRole::Host;
            effects.render = true;
        }

        WireMessage::RoomJoined { host } => {
            state.role = ClientRole::from_joined(host);
            effects.render = true;
            if state.role.is_listener() {
                // A late joiner has no history; ask the host for a snapshot.
                match state.client_id.clone() {
                    Some(target_id) => {
                        effects
                            .outbound
                            .push(WireMessage::SyncRequest { target_id });
                    }
                    None => warn!("joined before hello, cannot request state sync"),
                }
            }
        }

        WireMessage::PlaylistUpdate { playlist } => {
            if state.role.is_listener() {
                state.playback.playlist = playlist
                    .into_iter()
                    .map(|t: TrackSummary| Track {
                        title: t.title,
                        filename: t.filename,
                        media: None,
                    })
                    .collect();
                // The index is kept as-is; a removal racing ahead of this
                // update corrects itself with the next control message.
                effects.render = true;
            }
        }

        WireMessage::ControlTrack { index } => {
            if state.role.is_listener() {
                state.playback.set_current_wire(index);
                effects.render = true;
            }
        }

        WireMessage::ControlPlayPause { state: play_pause } => {
            if state.role.is_listener() {
                match play_pause {
                    PlayPause::Play => {
                        state.playback.playing = true;
                        effects.player.push(PlayerCommand::Play);
                    }
                    PlayPause::Pause => {
                        state.playback.playing = false;
                        effects.player.push(PlayerCommand::Pause);
                    }
                }
            }
        }

        WireMessage::ControlSeek { .. } => {
            if state.role.is_listener() {
                // No seekable timeline on the transport; pause briefly and let
                // the stream catch up to the host's new position.
                effects.player.push(PlayerCommand::Resync);
            }
        }

        WireMessage::ControlVolume { volume } => {
            if state.role.is_listener() && !state.volume_override {
                state.playback.volume = volume.clamp(0.0, 1.0);
                effects
                    .player
                    .push(PlayerCommand::SetVolume(state.playback.volume));
            }
        }

        WireMessage::ControlFlags { flags } => {
            if state.role.is_listener() {
                state.playback.flags = flags;
                effects.render = true;
            }
        }

        WireMessage::SyncState { state: snapshot, .. } => {
            if state.role.is_listener() {
                state.playback.apply_snapshot(snapshot);
                effects
                    .player
                    .push(PlayerCommand::SetVolume(state.playback.volume));
                if state.playback.playing {
                    effects.player.push(PlayerCommand::Play);
                }
                effects.render = true;
            }
        }

        WireMessage::SyncRequest { target_id } => {
            if state.role.is_host() {
                effects.outbound.push(WireMessage::SyncState {
                    target_id: Some(target_id),
                    state: state.playback.snapshot(),
                });
            }
        }

        WireMessage::RoomCreate { .. } | WireMessage::RoomJoin { .. } => {
            warn!("ignoring relay-bound message echoed back to client");
        }

        WireMessage::NewPeer { .. } | WireMessage::Signal { .. } => {
            debug!("peer negotiation message reached the router, dropping");
        }
    }

    effects
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::RoomId;
    use crate::sync::protocol::{PlaybackFlags, StateSnapshot};

    fn state_with_role(role: ClientRole) -> SessionState {
        let mut state = SessionState::new(RoomId::parse("TEST").unwrap());
        state.role = role;
        state.client_id = Some("client-1".to_string());
        state
    }

    fn host_with_tracks(titles: &[&str]) -> SessionState {
        let mut state = state_with_role(ClientRole::Host);
        for title in titles {
            state.playback.playlist.push(Track {
                title: title.to_string(),
                filename: format!("{}.mp3", title.to_lowercase()),
                media: Some(MediaHandle::new(format!("/music/{}.mp3", title))),
            });
        }
        state
    }

    fn new_file(name: &str, tag: Option<&str>) -> NewFile {
        NewFile {
            filename: name.to_string(),
            tag_title: tag.map(String::from),
            media: MediaHandle::new(format!("/music/{}", name)),
        }
    }

    fn titles(state: &SessionState) -> Vec<&str> {
        state
            .playback
            .playlist
            .iter()
            .map(|t| t.title.as_str())
            .collect()
    }

    fn assert_titles_unique(state: &SessionState) {
        let titles = titles(state);
        let mut deduped = titles.clone();
        deduped.sort();
        deduped.dedup();
        assert_eq!(deduped.len(), titles.len(), "duplicate titles: {:?}", titles);
    }

    #[test]
    fn test_add_dedupes_embedded_title() {
        let mut state = host_with_tracks(&["Song"]);
        handle_intent(
            &mut state,
            LocalIntent::AddFiles(vec![new_file("song.mp3", Some("Song"))]),
        );
        assert_eq!(titles(&state), vec!["Song", "Song (2)"]);
    }

    #[test]
    fn test_titles_stay_unique_across_add_remove_reorder() {
        let mut state = state_with_role(ClientRole::Host);
        handle_intent(
            &mut state,
            LocalIntent::AddFiles(vec![
                new_file("a.mp3", Some("Tune")),
                new_file("b.mp3", Some("Tune")),
                new_file("c.mp3", Some("Tune")),
            ]),
        );
        assert_titles_unique(&state);

        handle_intent(&mut state, LocalIntent::RemoveTrack(1));
        handle_intent(
            &mut state,
            LocalIntent::AddFiles(vec![new_file("d.mp3", Some("Tune"))]),
        );
        assert_titles_unique(&state);

        handle_intent(&mut state, LocalIntent::Reorder { from: 0, to: 2 });
        handle_intent(
            &mut state,
            LocalIntent::AddFiles(vec![new_file("e.mp3", Some("Tune (2)"))]),
        );
        assert_titles_unique(&state);
    }

    #[test]
    fn test_unsupported_file_rejected_rest_of_batch_proceeds() {
        let mut state = state_with_role(ClientRole::Host);
        let effects = handle_intent(
            &mut state,
            LocalIntent::AddFiles(vec![
                new_file("notes.txt", None),
                new_file("take.ogg", None),
            ]),
        );
        assert_eq!(effects.notices, vec!["Unsupported type: notes.txt"]);
        assert_eq!(titles(&state), vec!["take.ogg"]);
        assert!(matches!(
            effects.outbound.as_slice(),
            [WireMessage::PlaylistUpdate { .. }]
        ));
    }

    #[test]
    fn test_remove_active_track_stops_playback() {
        let mut state = host_with_tracks(&["A", "B", "C"]);
        state.playback.current = Some(1);
        state.playback.playing = true;

        let effects = handle_intent(&mut state, LocalIntent::RemoveTrack(1));

        assert_eq!(state.playback.current, None);
        assert!(!state.playback.playing);
        assert!(effects.player.contains(&PlayerCommand::Stop));
    }

    #[test]
    fn test_remove_before_active_decrements_index() {
        let mut state = host_with_tracks(&["A", "B", "C"]);
        state.playback.current = Some(2);

        handle_intent(&mut state, LocalIntent::RemoveTrack(0));

        assert_eq!(state.playback.current, Some(1));
        assert_eq!(state.playback.active_track().unwrap().title, "C");
    }

    #[test]
    fn test_reorder_preserves_active_track_identity() {
        for (from, to) in [(0, 3), (3, 0), (1, 2), (2, 1), (0, 1)] {
            for active in 0..4 {
                let mut state = host_with_tracks(&["A", "B", "C", "D"]);
                state.playback.current = Some(active);
                let before = state.playback.active_track().unwrap().title.clone();

                handle_intent(&mut state, LocalIntent::Reorder { from, to });

                let after = state.playback.active_track().unwrap().title.clone();
                assert_eq!(
                    before, after,
                    "reorder {}->{} with active {} moved the active track",
                    from, to, active
                );
            }
        }
    }

    #[test]
    fn test_flags_never_both_loops() {
        let mut state = state_with_role(ClientRole::Host);
        let toggles = [
            FlagToggle::LoopQueue,
            FlagToggle::LoopSong,
            FlagToggle::LoopQueue,
            FlagToggle::LoopSong,
            FlagToggle::Shuffle,
            FlagToggle::LoopQueue,
        ];
        for toggle in toggles {
            handle_intent(&mut state, LocalIntent::Toggle(toggle));
            let flags = state.playback.flags;
            assert!(
                !(flags.loop_queue && flags.loop_song),
                "both loop flags set after {:?}",
                toggle
            );
        }
    }

    #[test]
    fn test_shuffle_advance_never_repeats_current() {
        for _ in 0..100 {
            let mut state = host_with_tracks(&["A", "B", "C"]);
            state.playback.current = Some(1);
            state.playback.flags.shuffle = true;

            handle_intent(&mut state, LocalIntent::Next);

            assert!(state.playback.current.is_some());
            assert_ne!(state.playback.current, Some(1));
        }
    }

    #[test]
    fn test_advance_past_end_clears_index() {
        let mut state = host_with_tracks(&["A", "B"]);
        state.playback.current = Some(1);
        state.playback.playing = true;

        let effects = handle_intent(&mut state, LocalIntent::Next);

        assert_eq!(state.playback.current, None);
        assert!(!state.playback.playing);
        assert!(effects.player.contains(&PlayerCommand::Pause));
    }

    #[test]
    fn test_loop_queue_wraps_and_broadcasts() {
        let mut state = host_with_tracks(&["A", "B", "C"]);
        state.playback.current = Some(2);
        state.playback.flags.loop_queue = true;

        let effects = handle_intent(&mut state, LocalIntent::TrackEnded);

        assert_eq!(state.playback.current, Some(0));
        assert!(effects
            .outbound
            .iter()
            .any(|m| matches!(m, WireMessage::ControlTrack { index: 0 })));
    }

    #[test]
    fn test_loop_song_replays_current() {
        let mut state = host_with_tracks(&["A", "B"]);
        state.playback.current = Some(1);
        state.playback.flags.loop_song = true;

        let effects = handle_intent(&mut state, LocalIntent::TrackEnded);

        assert_eq!(state.playback.current, Some(1));
        assert!(effects.player.contains(&PlayerCommand::Load(1)));
    }

    #[test]
    fn test_listener_intents_ignored() {
        let mut state = state_with_role(ClientRole::Listener);
        state.playback.playlist.push(Track {
            title: "A".to_string(),
            filename: "a.mp3".to_string(),
            media: None,
        });
        let before = state.clone();

        for intent in [
            LocalIntent::PlayTrack(0),
            LocalIntent::RemoveTrack(0),
            LocalIntent::Toggle(FlagToggle::Shuffle),
            LocalIntent::SetVolume(0.2),
        ] {
            let effects = handle_intent(&mut state, intent);
            assert!(effects.outbound.is_empty());
            assert!(effects.player.is_empty());
        }
        assert_eq!(state, before);
    }

    #[test]
    fn test_listener_applies_snapshot() {
        let mut state = state_with_role(ClientRole::Listener);
        let snapshot = StateSnapshot {
            playlist: vec![
                TrackSummary {
                    title: "A".to_string(),
                    filename: "a.mp3".to_string(),
                },
                TrackSummary {
                    title: "B".to_string(),
                    filename: "b.mp3".to_string(),
                },
            ],
            current: 1,
            flags: PlaybackFlags {
                loop_song: true,
                ..Default::default()
            },
            volume: 0.5,
            playing: true,
        };

        let effects = handle_message(
            &mut state,
            WireMessage::SyncState {
                target_id: Some("client-1".to_string()),
                state: snapshot,
            },
        );

        assert_eq!(titles(&state), vec!["A", "B"]);
        assert_eq!(state.playback.current, Some(1));
        assert!(state.playback.flags.loop_song);
        assert_eq!(state.playback.volume, 0.5);
        assert!(state.playback.playing);
        assert!(effects.player.contains(&PlayerCommand::SetVolume(0.5)));
        assert!(effects.player.contains(&PlayerCommand::Play));
    }

    #[test]
    fn test_host_answers_sync_requests_consistently() {
        let mut host = host_with_tracks(&["A", "B"]);
        host.playback.current = Some(0);
        host.playback.playing = true;

        let first = handle_message(
            &mut host,
            WireMessage::SyncRequest {
                target_id: "listener-1".to_string(),
            },
        );
        let second = handle_message(
            &mut host,
            WireMessage::SyncRequest {
                target_id: "listener-2".to_string(),
            },
        );

        let mut snapshots = Vec::new();
        for (effects, expected_target) in [(first, "listener-1"), (second, "listener-2")] {
            match effects.outbound.as_slice() {
                [WireMessage::SyncState { target_id, state }] => {
                    assert_eq!(target_id.as_deref(), Some(expected_target));
                    snapshots.push(state.clone());
                }
                other => panic!("expected one sync:state, got {:?}", other),
            }
        }
        assert_eq!(snapshots[0], snapshots[1]);

        // Both listeners converge to the same mirror regardless of order.
        let mut listener_a = state_with_role(ClientRole::Listener);
        let mut listener_b = state_with_role(ClientRole::Listener);
        handle_message(
            &mut listener_a,
            WireMessage::SyncState {
                target_id: None,
                state: snapshots[0].clone(),
            },
        );
        handle_message(
            &mut listener_b,
            WireMessage::SyncState {
                target_id: None,
                state: snapshots[1].clone(),
            },
        );
        assert_eq!(listener_a.playback, listener_b.playback);
    }

    #[test]
    fn test_join_as_listener_requests_sync() {
        let mut state = state_with_role(ClientRole::Unknown);

        let effects = handle_message(&mut state, WireMessage::RoomJoined { host: false });

        assert_eq!(state.role, ClientRole::Listener);
        assert!(effects.outbound.iter().any(|m| matches!(
            m,
            WireMessage::SyncRequest { target_id } if target_id == "client-1"
        )));
    }

    #[test]
    fn test_created_room_makes_host() {
        let mut state = state_with_role(ClientRole::Unknown);
        handle_message(&mut state, WireMessage::RoomCreated);
        assert_eq!(state.role, ClientRole::Host);
    }

    #[test]
    fn test_listener_tolerates_out_of_bounds_track_index() {
        let mut state = state_with_role(ClientRole::Listener);
        state.playback.playlist.push(Track {
            title: "A".to_string(),
            filename: "a.mp3".to_string(),
            media: None,
        });

        handle_message(&mut state, WireMessage::ControlTrack { index: 9 });

        assert_eq!(state.playback.current, Some(9));
        assert!(state.playback.active_track().is_none());
    }

    #[test]
    fn test_volume_override_is_sticky() {
        let mut state = state_with_role(ClientRole::Listener);

        let effects = handle_message(&mut state, WireMessage::ControlVolume { volume: 0.8 });
        assert!(effects.player.contains(&PlayerCommand::SetVolume(0.8)));

        handle_intent(&mut state, LocalIntent::OutputVolumeChanged(0.3));

        let effects = handle_message(&mut state, WireMessage::ControlVolume { volume: 0.9 });
        assert!(effects.player.is_empty());
        assert_eq!(state.playback.volume, 0.3);
    }

    #[test]
    fn test_listener_seek_triggers_resync() {
        let mut state = state_with_role(ClientRole::Listener);
        let effects = handle_message(&mut state, WireMessage::ControlSeek { time: 42.5 });
        assert_eq!(effects.player, vec![PlayerCommand::Resync]);
    }
}
