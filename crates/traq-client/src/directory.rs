//! Name/id directory snapshots.
//!
//! Mention detection and stamp lookups need name-to-UUID maps for the whole
//! instance. Fetching those per message trips the API rate limit, so the
//! directory is built from three listing calls and treated as an immutable
//! snapshot; refreshing means fetching a new one and swapping it in, never
//! mutating a snapshot a dispatch pass may be reading.

use crate::client::TraqClient;
use crate::error::TraqError;
use crate::types::ChannelResponse;
use std::collections::HashMap;

/// Two-way map between a human-readable symbol and a UUID.
#[derive(Debug, Clone, Default)]
pub struct NameIndex {
    by_name: HashMap<String, String>,
    by_id: HashMap<String, String>,
}

impl NameIndex {
    fn insert(&mut self, name: String, id: String) {
        self.by_id.insert(id.clone(), name.clone());
        self.by_name.insert(name, id);
    }

    pub fn id(&self, name: &str) -> Option<&str> {
        self.by_name.get(name).map(String::as_str)
    }

    pub fn name(&self, id: &str) -> Option<&str> {
        self.by_id.get(id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

/// Immutable snapshot of the instance directory.
#[derive(Debug, Clone, Default)]
pub struct Directory {
    /// Stamp name <-> stamp UUID, e.g. "tada".
    pub stamps: NameIndex,
    /// Login name <-> user UUID, e.g. "kitsne".
    pub users: NameIndex,
    /// Full channel path <-> channel UUID, e.g. "team/sound/1dtm".
    pub channels: NameIndex,
}

impl Directory {
    /// Fetch a fresh snapshot.
    pub async fn fetch(client: &TraqClient) -> Result<Self, TraqError> {
        let mut stamps = NameIndex::default();
        for stamp in client.get_stamps().await? {
            stamps.insert(stamp.name, stamp.id);
        }

        let mut users = NameIndex::default();
        for user in client.get_users().await? {
            users.insert(user.name, user.id);
        }

        let channels = channel_paths(&client.get_channels().await?.public);

        Ok(Self {
            stamps,
            users,
            channels,
        })
    }
}

/// Build the path <-> UUID index from a single channel listing.
///
/// Each entry in the listing carries its own name and its parent's UUID.
/// Linking children to parents gives the channel tree, and inheriting names
/// down to each leaf gives the full path without one request per channel.
pub fn channel_paths(channels: &[ChannelResponse]) -> NameIndex {
    let mut parents: HashMap<&str, &str> = HashMap::new();
    let mut names: HashMap<&str, &str> = HashMap::new();

    for channel in channels {
        names.insert(&channel.id, &channel.name);
        if let Some(parent_id) = &channel.parent_id {
            parents.insert(&channel.id, parent_id);
        }
    }

    let mut index = NameIndex::default();
    for channel in channels {
        let mut path = channel.name.clone();
        let mut current: &str = &channel.id;
        while let Some(&parent_id) = parents.get(current) {
            match names.get(parent_id) {
                Some(name) => path = format!("{name}/{path}"),
                // Parent outside the listing (archived or private); the
                // visible prefix is the best path available.
                None => break,
            }
            current = parent_id;
        }
        index.insert(path, channel.id.clone());
    }

    index
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel(id: &str, parent: Option<&str>, name: &str) -> ChannelResponse {
        ChannelResponse {
            id: id.into(),
            parent_id: parent.map(String::from),
            name: name.into(),
            children: Vec::new(),
        }
    }

    #[test]
    fn builds_paths_from_parent_links() {
        let listing = vec![
            channel("a", None, "team"),
            channel("b", Some("a"), "sound"),
            channel("c", Some("b"), "1dtm"),
            channel("d", None, "random"),
        ];

        let index = channel_paths(&listing);
        assert_eq!(index.id("team"), Some("a"));
        assert_eq!(index.id("team/sound"), Some("b"));
        assert_eq!(index.id("team/sound/1dtm"), Some("c"));
        assert_eq!(index.id("random"), Some("d"));
        assert_eq!(index.name("c"), Some("team/sound/1dtm"));
    }

    #[test]
    fn missing_parent_keeps_visible_prefix() {
        let listing = vec![channel("b", Some("gone"), "orphan")];

        let index = channel_paths(&listing);
        assert_eq!(index.id("orphan"), Some("b"));
    }

    #[test]
    fn sibling_names_do_not_collide_across_parents() {
        let listing = vec![
            channel("a", None, "gps"),
            channel("b", Some("a"), "times"),
            channel("c", None, "times"),
        ];

        let index = channel_paths(&listing);
        assert_eq!(index.id("gps/times"), Some("b"));
        assert_eq!(index.id("times"), Some("c"));
    }
}
