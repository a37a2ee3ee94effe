// src/services/publication_tracker.rs
//
// At-most-once publication of stored entities to registered channels.
//
// Per (entity, channel): Unpublished -> attempt -> Published | Unpublished.
// A PublicationRecord is written only after the platform confirms the send,
// and its presence is checked before every attempt. A failed attempt leaves
// no trace, so calling again later is always safe.

use std::sync::Arc;

use crate::domain::{
    AddedTo, Anime, Channel, ChannelId, ChannelKey, ChatRef, Entity, Episode, PublicationId,
    PublicationKey, PublicationRecord, PublicationTarget,
};
use crate::error::{AppError, AppResult};
use crate::events::{EntityPublished, EventBus};
use crate::ports::ChannelPublisher;
use crate::repositories::EntityStore;
use crate::services::message_format::{render_anime, render_episode};
use crate::services::report::ItemFailure;
use crate::services::retry::RetryPolicy;

/// What gets sent for one entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessagePayload {
    Text(String),
    /// URL of a video the platform fetches itself
    Video(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EpisodeDelivery {
    /// Rendered field list
    #[default]
    Text,
    /// The episode's download link as a video post
    Video,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PublishOptions {
    pub episode_delivery: EpisodeDelivery,
}

/// A stored entity that can be published
pub trait Publishable: Entity {
    /// `None` until the entity has a store identity
    fn publication_target(&self) -> Option<PublicationTarget>;

    fn payload(&self, options: &PublishOptions) -> MessagePayload;

    fn added_to_mut(&mut self) -> &mut AddedTo;

    /// Short description for logs
    fn label(&self) -> String;
}

impl Publishable for Anime {
    fn publication_target(&self) -> Option<PublicationTarget> {
        self.id.map(PublicationTarget::Anime)
    }

    fn payload(&self, _options: &PublishOptions) -> MessagePayload {
        MessagePayload::Text(render_anime(self))
    }

    fn added_to_mut(&mut self) -> &mut AddedTo {
        &mut self.added_to
    }

    fn label(&self) -> String {
        format!("anime {} '{}'", self.source_id, self.title)
    }
}

impl Publishable for Episode {
    fn publication_target(&self) -> Option<PublicationTarget> {
        self.id.map(PublicationTarget::Episode)
    }

    fn payload(&self, options: &PublishOptions) -> MessagePayload {
        match (options.episode_delivery, self.best_download_link()) {
            (EpisodeDelivery::Video, Some(url)) => MessagePayload::Video(url.to_string()),
            _ => MessagePayload::Text(render_episode(self)),
        }
    }

    fn added_to_mut(&mut self) -> &mut AddedTo {
        &mut self.added_to
    }

    fn label(&self) -> String {
        format!("episode {} of source {}", self.episode_number, self.source_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    /// Sent now; the stored record carries the platform's message id
    Published(PublicationRecord),
    /// A record already existed; nothing was sent
    AlreadyPublished(PublicationId),
}

/// Totals of a multi-entity publication pass
#[derive(Debug, Default)]
pub struct PublicationSummary {
    pub published: Vec<PublicationRecord>,
    pub already_published: usize,
    pub failures: Vec<ItemFailure>,
}

impl PublicationSummary {
    fn absorb(&mut self, label: String, result: AppResult<PublishOutcome>) -> AppResult<()> {
        match result {
            Ok(PublishOutcome::Published(record)) => self.published.push(record),
            Ok(PublishOutcome::AlreadyPublished(_)) => self.already_published += 1,
            Err(err) if err.is_fatal() => return Err(err),
            Err(err) => self.failures.push(ItemFailure::new(label, err)),
        }
        Ok(())
    }
}

pub struct PublicationTracker {
    store: EntityStore,
    publisher: Arc<dyn ChannelPublisher>,
    event_bus: Arc<EventBus>,
    retry: RetryPolicy,
    options: PublishOptions,
}

impl PublicationTracker {
    pub fn new(
        store: EntityStore,
        publisher: Arc<dyn ChannelPublisher>,
        event_bus: Arc<EventBus>,
        retry: RetryPolicy,
        options: PublishOptions,
    ) -> Self {
        Self {
            store,
            publisher,
            event_bus,
            retry,
            options,
        }
    }

    /// Publish `entity` to the channel unless a record says it already was.
    ///
    /// Errors: `NotFound` when the platform or channel is not registered or
    /// the entity was never stored; `Transport` when the send failed after
    /// retrying. Neither leaves a record behind.
    pub async fn publish_if_needed<E: Publishable>(
        &self,
        entity: &mut E,
        platform_name: &str,
        chat: &ChatRef,
    ) -> AppResult<PublishOutcome> {
        let channel = self.resolve_channel(platform_name, chat)?;
        self.publish_to_channel(entity, platform_name, &channel).await
    }

    /// Publish each entity independently; one failure does not stop the rest.
    pub async fn publish_all<E: Publishable>(
        &self,
        entities: &mut [E],
        platform_name: &str,
        chat: &ChatRef,
    ) -> AppResult<PublicationSummary> {
        let channel = self.resolve_channel(platform_name, chat)?;
        let mut summary = PublicationSummary::default();

        for entity in entities.iter_mut() {
            let result = self.publish_to_channel(entity, platform_name, &channel).await;
            summary.absorb(entity.label(), result)?;
        }

        Ok(summary)
    }

    /// Publish every stored anime, then every stored episode, that has no
    /// record for the channel yet. This is the retry pass for earlier
    /// failures.
    pub async fn publish_pending(
        &self,
        platform_name: &str,
        chat: &ChatRef,
    ) -> AppResult<PublicationSummary> {
        let channel = self.resolve_channel(platform_name, chat)?;
        let channel_id = stored_id(&channel)?;
        let mut summary = PublicationSummary::default();

        for mut anime in self.store.animes.list_unpublished(channel_id)? {
            let result = self.publish_to_channel(&mut anime, platform_name, &channel).await;
            summary.absorb(anime.label(), result)?;
        }

        for mut episode in self.store.episodes.list_unpublished(channel_id)? {
            let result = self
                .publish_to_channel(&mut episode, platform_name, &channel)
                .await;
            summary.absorb(episode.label(), result)?;
        }

        log::info!(
            "Pending pass on {}: {} published, {} already published, {} failed",
            chat,
            summary.published.len(),
            summary.already_published,
            summary.failures.len()
        );

        Ok(summary)
    }

    fn resolve_channel(&self, platform_name: &str, chat: &ChatRef) -> AppResult<Channel> {
        let platform_id = self
            .store
            .platforms
            .find_by_natural_key(&platform_name.trim().to_string())?
            .ok_or_else(|| AppError::NotFound(format!("platform '{}'", platform_name)))?;

        let key = ChannelKey {
            platform_id,
            chat: chat.clone(),
        };
        let channel_id = self
            .store
            .channels
            .find_by_natural_key(&key)?
            .ok_or_else(|| {
                AppError::NotFound(format!("channel {} on '{}'", chat, platform_name))
            })?;

        self.store
            .channels
            .get(channel_id)?
            .ok_or_else(|| AppError::NotFound(format!("channel {}", channel_id)))
    }

    async fn publish_to_channel<E: Publishable>(
        &self,
        entity: &mut E,
        destination: &str,
        channel: &Channel,
    ) -> AppResult<PublishOutcome> {
        let target = entity
            .publication_target()
            .ok_or_else(|| AppError::NotFound(format!("{} is not stored", entity.label())))?;
        let channel_id = stored_id(channel)?;
        let key = PublicationKey { target, channel_id };

        if let Some(existing) = self.store.publications.find_by_natural_key(&key)? {
            log::debug!("{} already published to channel {}", target, channel_id);
            return Ok(PublishOutcome::AlreadyPublished(existing));
        }

        let payload = entity.payload(&self.options);
        let operation = format!("publish {}", entity.label());
        let message_id = self
            .retry
            .run(&operation, || self.send(channel, &payload))
            .await?;

        let record = PublicationRecord::new(target, channel_id, message_id);
        let record = match self.store.publications.insert(&record) {
            Ok(id) => record.with_id(id),
            Err(AppError::AlreadyExists(_)) => {
                // Another run recorded this pair while we were sending
                log::warn!(
                    "{} was recorded concurrently; message {} is a duplicate",
                    target,
                    message_id
                );
                let existing = self
                    .store
                    .publications
                    .find_by_natural_key(&key)?
                    .ok_or_else(|| AppError::NotFound(format!("publication of {}", target)))?;
                return Ok(PublishOutcome::AlreadyPublished(existing));
            }
            Err(err) => {
                log::error!(
                    "{} sent as message {} but not recorded: {}",
                    target,
                    message_id,
                    err
                );
                return Err(err);
            }
        };

        entity.added_to_mut().push(destination, message_id);
        log::info!(
            "Published {} to channel {} (message {})",
            entity.label(),
            channel_id,
            message_id
        );
        self.event_bus
            .emit(EntityPublished::new(target, channel_id, message_id));

        Ok(PublishOutcome::Published(record))
    }

    async fn send(&self, channel: &Channel, payload: &MessagePayload) -> AppResult<i64> {
        match payload {
            MessagePayload::Text(text) => self.publisher.send_text(channel, text).await,
            MessagePayload::Video(url) => self.publisher.send_video(channel, url).await,
        }
    }
}

fn stored_id(channel: &Channel) -> AppResult<ChannelId> {
    channel
        .id
        .ok_or_else(|| AppError::NotFound("channel is not stored".to_string()))
}
