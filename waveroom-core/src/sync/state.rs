//! Playback State Store
//!
//! Authoritative on the host, mirrored on listeners. Only the command router
//! mutates these structs; everything else gets read-only snapshots.

use std::path::{Path, PathBuf};

use super::protocol::{PlaybackFlags, StateSnapshot, TrackSummary};
use crate::network::RoomId;

/// Opaque reference to the bytes of a locally loaded audio file.
///
/// Only the host ever holds one; listeners receive the stream over the media
/// transport and never touch host files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaHandle(PathBuf);

impl MediaHandle {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}

/// One playlist entry
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    /// Display title, unique within the playlist
    pub title: String,
    /// Original file name
    pub filename: String,
    /// Local media reference; `None` on listener-side projections
    pub media: Option<MediaHandle>,
}

impl Track {
    pub fn summary(&self) -> TrackSummary {
        TrackSummary {
            title: self.title.clone(),
            filename: self.filename.clone(),
        }
    }
}

/// Playlist, cursor and modifiers
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackState {
    pub playlist: Vec<Track>,
    /// Active index. `None` when nothing is selected. A listener mirror may
    /// transiently hold an index past the end of the playlist while messages
    /// are in flight; readers must bounds-check.
    pub current: Option<usize>,
    pub flags: PlaybackFlags,
    /// Output volume in `[0, 1]`
    pub volume: f64,
    pub playing: bool,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self {
            playlist: Vec::new(),
            current: None,
            flags: PlaybackFlags::default(),
            volume: 1.0,
            playing: false,
        }
    }
}

impl PlaybackState {
    /// Active track, if the current index is in bounds
    pub fn active_track(&self) -> Option<&Track> {
        self.current.and_then(|i| self.playlist.get(i))
    }

    /// Wire form of the current index (`-1` = nothing selected)
    pub fn current_wire(&self) -> i64 {
        self.current.map(|i| i as i64).unwrap_or(-1)
    }

    /// Set the current index from its wire form, preserving out-of-bounds
    /// values numerically
    pub fn set_current_wire(&mut self, index: i64) {
        self.current = usize::try_from(index).ok();
    }

    /// Listener projection of the playlist
    pub fn summaries(&self) -> Vec<TrackSummary> {
        self.playlist.iter().map(Track::summary).collect()
    }

    /// Authoritative snapshot for late-join reconciliation
    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            playlist: self.summaries(),
            current: self.current_wire(),
            flags: self.flags,
            volume: self.volume,
            playing: self.playing,
        }
    }

    /// Wholesale overwrite from a host snapshot (listener side)
    pub fn apply_snapshot(&mut self, snapshot: StateSnapshot) {
        self.playlist = snapshot
            .playlist
            .into_iter()
            .map(|t| Track {
                title: t.title,
                filename: t.filename,
                media: None,
            })
            .collect();
        self.set_current_wire(snapshot.current);
        self.flags = snapshot.flags;
        self.volume = snapshot.volume;
        self.playing = snapshot.playing;
    }

    /// Derive a playlist-unique title from a candidate by numeric suffixing:
    /// "Song", "Song (2)", "Song (3)", ...
    pub fn unique_title(&self, candidate: &str) -> String {
        let taken = |t: &str| self.playlist.iter().any(|track| track.title == t);
        if !taken(candidate) {
            return candidate.to_string();
        }
        let mut n = 2;
        loop {
            let suffixed = format!("{} ({})", candidate, n);
            if !taken(&suffixed) {
                return suffixed;
            }
            n += 1;
        }
    }
}

/// Which side of the room protocol this client is on
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ClientRole {
    /// Before the join handshake completes
    #[default]
    Unknown,
    /// Write authority over playlist and playback, source of the media stream
    Host,
    /// Mirrors host state, receives the relayed media stream
    Listener,
}

impl ClientRole {
    pub fn is_host(&self) -> bool {
        matches!(self, ClientRole::Host)
    }

    pub fn is_listener(&self) -> bool {
        matches!(self, ClientRole::Listener)
    }

    /// Role assigned by a `room:joined` response
    pub fn from_joined(host: bool) -> Self {
        if host {
            ClientRole::Host
        } else {
            ClientRole::Listener
        }
    }
}

/// Everything the command router reads and mutates for one room session
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    pub role: ClientRole,
    pub room_id: RoomId,
    /// Relay-assigned id, known once `hello` arrives
    pub client_id: Option<String>,
    pub playback: PlaybackState,
    /// Set once the listener adjusts their own output volume; host volume
    /// broadcasts are ignored from then on
    pub volume_override: bool,
}

impl SessionState {
    pub fn new(room_id: RoomId) -> Self {
        Self {
            role: ClientRole::Unknown,
            room_id,
            client_id: None,
            playback: PlaybackState::default(),
            volume_override: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(title: &str) -> Track {
        Track {
            title: title.to_string(),
            filename: format!("{}.mp3", title.to_lowercase()),
            media: None,
        }
    }

    #[test]
    fn test_unique_title_suffixing() {
        let mut state = PlaybackState::default();
        state.playlist.push(track("Song"));
        state.playlist.push(Track {
            title: "Song (2)".to_string(),
            filename: "song.mp3".to_string(),
            media: None,
        });

        assert_eq!(state.unique_title("Other"), "Other");
        assert_eq!(state.unique_title("Song"), "Song (3)");
    }

    #[test]
    fn test_snapshot_round_trip() {
        let mut host = PlaybackState::default();
        host.playlist = vec![track("A"), track("B")];
        host.current = Some(1);
        host.flags.loop_song = true;
        host.volume = 0.5;
        host.playing = true;

        let mut listener = PlaybackState::default();
        listener.apply_snapshot(host.snapshot());

        assert_eq!(listener.summaries(), host.summaries());
        assert_eq!(listener.current, Some(1));
        assert!(listener.flags.loop_song);
        assert_eq!(listener.volume, 0.5);
        assert!(listener.playing);
        assert!(listener.playlist.iter().all(|t| t.media.is_none()));
    }

    #[test]
    fn test_wire_index_tolerates_out_of_bounds() {
        let mut state = PlaybackState::default();
        state.set_current_wire(7);
        assert_eq!(state.current, Some(7));
        assert!(state.active_track().is_none());

        state.set_current_wire(-1);
        assert_eq!(state.current, None);
    }
}
