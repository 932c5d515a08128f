//! Room Registry
//!
//! Tracks which clients are in which room and who hosts each one. All
//! routing decisions live here so they can be tested without sockets; the
//! connection layer only moves frames.

use std::collections::HashMap;

use tokio::sync::mpsc;

/// Relay-assigned client identifier
pub type ClientId = String;

/// Serialized frames headed for one client
pub type Outbox = mpsc::UnboundedSender<String>;

/// Why a room operation was refused
#[derive(Debug, PartialEq, Eq)]
pub enum RegistryError {
    RoomExists,
    RoomNotFound,
    NotInRoom,
}

impl RegistryError {
    /// User-facing message for the `error` frame
    pub fn message(&self) -> &'static str {
        match self {
            RegistryError::RoomExists => "Room already exists",
            RegistryError::RoomNotFound => "Room not found",
            RegistryError::NotInRoom => "Not in a room",
        }
    }
}

/// Result of joining a room
#[derive(Debug)]
pub struct JoinOutcome {
    /// The joiner became host (the host slot was vacant)
    pub host: bool,
    /// Current host to notify about the new peer, if any
    pub host_outbox: Option<Outbox>,
}

impl PartialEq for JoinOutcome {
    fn eq(&self, other: &Self) -> bool {
        self.host == other.host
            && match (&self.host_outbox, &other.host_outbox) {
                (Some(a), Some(b)) => a.same_channel(b),
                (None, None) => true,
                _ => false,
            }
    }
}

/// What was left behind when a client disconnected
pub struct Departure {
    pub room_id: String,
    pub was_host: bool,
    /// Outboxes of the remaining room members
    pub remaining: Vec<Outbox>,
}

struct Room {
    host: Option<ClientId>,
    members: HashMap<ClientId, Outbox>,
}

/// Normalize a user-chosen room id: case-insensitive, alphanumeric only
pub fn normalize_room_id(input: &str) -> String {
    input
        .trim()
        .chars()
        .filter(|c| c.is_alphanumeric())
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// All rooms known to this relay
#[derive(Default)]
pub struct Registry {
    rooms: HashMap<String, Room>,
    memberships: HashMap<ClientId, String>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a room with `client` as host
    pub fn create_room(
        &mut self,
        room_id: &str,
        client: &str,
        outbox: Outbox,
    ) -> Result<(), RegistryError> {
        let room_id = normalize_room_id(room_id);
        if room_id.is_empty() {
            return Err(RegistryError::RoomNotFound);
        }
        if self.rooms.contains_key(&room_id) {
            return Err(RegistryError::RoomExists);
        }

        let mut members = HashMap::new();
        members.insert(client.to_string(), outbox);
        self.rooms.insert(
            room_id.clone(),
            Room {
                host: Some(client.to_string()),
                members,
            },
        );
        self.memberships.insert(client.to_string(), room_id);
        Ok(())
    }

    /// Add `client` to an existing room. The joiner inherits the host slot if
    /// it is vacant (creator reconnect), otherwise joins as listener.
    pub fn join_room(
        &mut self,
        room_id: &str,
        client: &str,
        outbox: Outbox,
    ) -> Result<JoinOutcome, RegistryError> {
        let room_id = normalize_room_id(room_id);
        let room = self
            .rooms
            .get_mut(&room_id)
            .ok_or(RegistryError::RoomNotFound)?;

        let host = room.host.is_none();
        if host {
            room.host = Some(client.to_string());
        }
        room.members.insert(client.to_string(), outbox);
        self.memberships.insert(client.to_string(), room_id);

        let host_outbox = if host {
            None
        } else {
            room.host
                .as_ref()
                .and_then(|h| room.members.get(h))
                .cloned()
        };

        Ok(JoinOutcome { host, host_outbox })
    }

    /// Drop a client from its room, deleting the room once empty
    pub fn remove_client(&mut self, client: &str) -> Option<Departure> {
        let room_id = self.memberships.remove(client)?;
        let room = self.rooms.get_mut(&room_id)?;

        room.members.remove(client);
        let was_host = room.host.as_deref() == Some(client);
        if was_host {
            room.host = None;
        }

        let remaining: Vec<Outbox> = room.members.values().cloned().collect();
        if room.members.is_empty() {
            self.rooms.remove(&room_id);
        }

        Some(Departure {
            room_id,
            was_host,
            remaining,
        })
    }

    /// Everyone in the sender's room except the sender (control multicasts)
    pub fn peers_of(&self, client: &str) -> Vec<Outbox> {
        self.room_of(client)
            .map(|room| {
                room.members
                    .iter()
                    .filter(|(id, _)| id.as_str() != client)
                    .map(|(_, outbox)| outbox.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// The host of the sender's room (`sync:request` routing)
    pub fn host_of(&self, client: &str) -> Option<Outbox> {
        let room = self.room_of(client)?;
        room.host.as_ref().and_then(|h| room.members.get(h)).cloned()
    }

    /// A specific member of the sender's room (`targetId` routing)
    pub fn member_of(&self, client: &str, target: &str) -> Option<Outbox> {
        self.room_of(client)?.members.get(target).cloned()
    }

    fn room_of(&self, client: &str) -> Option<&Room> {
        self.rooms.get(self.memberships.get(client)?)
    }
}
