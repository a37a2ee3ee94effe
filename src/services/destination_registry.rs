// src/services/destination_registry.rs
//
// Idempotent registration of the platform and channel publications go to.

use crate::domain::{Channel, ChannelId, ChannelKey, ChatRef, Platform};
use crate::error::{AppError, AppResult};
use crate::repositories::EntityStore;

/// Channel identity and description as configured by the operator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelSpec {
    pub chat_name: Option<String>,
    pub chat_id: Option<i64>,
    pub description: Option<String>,
}

impl ChannelSpec {
    /// Lookup key for the configured channel; the numeric id wins.
    pub fn chat_ref(&self) -> Option<ChatRef> {
        match (&self.chat_id, &self.chat_name) {
            (Some(id), _) => Some(ChatRef::Id(*id)),
            (None, Some(name)) => Some(ChatRef::Name(name.clone())),
            (None, None) => None,
        }
    }
}

pub struct DestinationRegistry {
    store: EntityStore,
}

impl DestinationRegistry {
    pub fn new(store: EntityStore) -> Self {
        Self { store }
    }

    /// Make sure the platform and channel exist, creating whichever is
    /// missing. Returns the stored rows.
    pub fn ensure(
        &self,
        platform_name: &str,
        spec: &ChannelSpec,
    ) -> AppResult<(Platform, Channel)> {
        let platform = self.ensure_platform(platform_name)?;
        let platform_id = platform
            .id
            .ok_or_else(|| AppError::NotFound(format!("platform '{}'", platform_name)))?;

        let channel = Channel::new(
            platform_id,
            spec.chat_name.clone(),
            spec.chat_id,
            spec.description.clone(),
        )?;

        let (channel_id, created) = match self.find_channel(&channel)? {
            Some(id) => {
                log::debug!("Channel {} already registered (id {})", describe(&channel), id);
                (id, false)
            }
            None => match self.store.channels.insert(&channel) {
                Ok(id) => {
                    log::info!("Registered channel {} on '{}'", describe(&channel), platform.name);
                    (id, true)
                }
                Err(AppError::AlreadyExists(_)) => {
                    let id = self.find_channel(&channel)?.ok_or_else(|| {
                        AppError::NotFound(format!("channel {}", describe(&channel)))
                    })?;
                    (id, false)
                }
                Err(err) => return Err(err),
            },
        };

        let stored = self
            .store
            .channels
            .get(channel_id)?
            .ok_or_else(|| AppError::NotFound(format!("channel {}", channel_id)))?;

        // Stored identity wins; differences are only reported
        if !created {
            for difference in identity_drift(&stored, &channel) {
                log::warn!(
                    "Channel {} is registered with {}; keeping the stored value",
                    channel_id,
                    difference
                );
            }
        }

        Ok((platform, stored))
    }

    fn ensure_platform(&self, name: &str) -> AppResult<Platform> {
        let platform = Platform::new(name)?;
        let key = platform.name.clone();

        let id = match self.store.platforms.find_by_natural_key(&key)? {
            Some(id) => id,
            None => match self.store.platforms.insert(&platform) {
                Ok(id) => {
                    log::info!("Registered platform '{}'", key);
                    id
                }
                Err(AppError::AlreadyExists(_)) => self
                    .store
                    .platforms
                    .find_by_natural_key(&key)?
                    .ok_or_else(|| AppError::NotFound(format!("platform '{}'", key)))?,
                Err(err) => return Err(err),
            },
        };

        self.store
            .platforms
            .get(id)?
            .ok_or_else(|| AppError::NotFound(format!("platform '{}'", key)))
    }

    /// A channel matches on either of its chat identities.
    fn find_channel(&self, channel: &Channel) -> AppResult<Option<ChannelId>> {
        let mut refs = Vec::new();
        if let Some(id) = channel.chat_id {
            refs.push(ChatRef::Id(id));
        }
        if let Some(name) = &channel.chat_name {
            refs.push(ChatRef::Name(name.clone()));
        }

        for chat in refs {
            let key = ChannelKey {
                platform_id: channel.platform_id,
                chat,
            };
            if let Some(id) = self.store.channels.find_by_natural_key(&key)? {
                return Ok(Some(id));
            }
        }
        Ok(None)
    }
}

/// Configured chat identities that disagree with the stored channel
fn identity_drift(stored: &Channel, configured: &Channel) -> Vec<String> {
    let mut drift = Vec::new();
    if let Some(id) = configured.chat_id {
        if stored.chat_id != Some(id) {
            drift.push(format!("chat id {:?}, configured {}", stored.chat_id, id));
        }
    }
    if let Some(name) = &configured.chat_name {
        if stored.chat_name.as_ref() != Some(name) {
            drift.push(format!("chat name {:?}, configured '{}'", stored.chat_name, name));
        }
    }
    drift
}

fn describe(channel: &Channel) -> String {
    channel
        .chat_ref()
        .map(|chat| chat.to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PlatformId;
    use crate::repositories::store::test_support::memory_store;

    fn spec() -> ChannelSpec {
        ChannelSpec {
            chat_name: Some("animestele".to_string()),
            chat_id: Some(-1002039517569),
            description: Some("New releases".to_string()),
        }
    }

    #[test]
    fn test_ensure_is_idempotent() {
        let store = memory_store();
        let registry = DestinationRegistry::new(store.clone());

        let (platform, channel) = registry.ensure("telegram", &spec()).unwrap();
        let (platform_again, channel_again) = registry.ensure("telegram", &spec()).unwrap();

        assert_eq!(platform.id, platform_again.id);
        assert_eq!(channel.id, channel_again.id);
        assert_eq!(channel.description.as_deref(), Some("New releases"));

        let stats = store.stats().unwrap();
        assert_eq!(stats.platform_count, 1);
        assert_eq!(stats.channel_count, 1);
    }

    #[test]
    fn test_channel_found_by_name_when_id_added_later() {
        let store = memory_store();
        let registry = DestinationRegistry::new(store);
        let by_name = ChannelSpec {
            chat_id: None,
            ..spec()
        };

        let (_, first) = registry.ensure("telegram", &by_name).unwrap();
        let (_, second) = registry.ensure("telegram", &spec()).unwrap();

        assert_eq!(first.id, second.id);
    }

    #[test]
    fn test_spec_without_identity_is_rejected() {
        let registry = DestinationRegistry::new(memory_store());
        let empty = ChannelSpec {
            chat_name: None,
            chat_id: None,
            description: None,
        };

        assert!(matches!(registry.ensure("telegram", &empty), Err(AppError::Domain(_))));
        assert_eq!(empty.chat_ref(), None);
    }

    #[test]
    fn test_changed_identity_keeps_stored_channel() {
        let store = memory_store();
        let registry = DestinationRegistry::new(store.clone());
        let (_, first) = registry.ensure("telegram", &spec()).unwrap();
        let renamed = ChannelSpec {
            chat_name: Some("animestele_v2".to_string()),
            ..spec()
        };

        let (_, second) = registry.ensure("telegram", &renamed).unwrap();

        assert_eq!(second, first);
        assert_eq!(second.chat_name.as_deref(), Some("animestele"));
        assert_eq!(store.stats().unwrap().channel_count, 1);
    }

    #[test]
    fn test_identity_drift_names_each_difference() {
        let stored =
            Channel::new(PlatformId(1), Some("animestele".to_string()), Some(-100), None).unwrap();
        let same =
            Channel::new(PlatformId(1), Some("animestele".to_string()), None, None).unwrap();
        let moved =
            Channel::new(PlatformId(1), Some("other".to_string()), Some(-200), None).unwrap();

        assert!(identity_drift(&stored, &same).is_empty());
        let drift = identity_drift(&stored, &moved);
        assert_eq!(drift.len(), 2);
        assert!(drift[0].contains("-200"));
        assert!(drift[1].contains("'other'"));
    }
}
