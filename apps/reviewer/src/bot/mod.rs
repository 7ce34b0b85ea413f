//! Bot Adapter: Discord events in, review embeds out.
//!
//! Listens for PDF attachments posted in allow-listed forum channels, runs each
//! through the [`ReviewPipeline`], and replies in the same thread.

pub mod embeds;

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::Context as _;
use async_trait::async_trait;
use bytes::Bytes;
use serenity::builder::CreateMessage;
use serenity::gateway::ShardManager;
use serenity::model::channel::{Attachment, Message as DiscordMessage};
use serenity::model::gateway::Ready;
use serenity::model::id::ChannelId;
use serenity::prelude::*;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::errors::ReviewError;
use crate::review::render::{failure_block, intro_block, progress_block};
use crate::review::models::ReviewResult;
use crate::review::{render_review, DisplayBlock, JobContext, ReviewPipeline};

/// Everything the bot needs at startup. Handlers never read the environment.
#[derive(Debug, Clone)]
pub struct BotConfig {
    pub token: String,
    /// Forum channels whose threads get reviewed.
    pub review_channels: HashSet<u64>,
    /// Job context used where a message carries no overrides.
    pub default_job: JobContext,
}

/// True when a thread's parent channel is allow-listed.
pub fn is_review_channel(parent_id: Option<u64>, review_channels: &HashSet<u64>) -> bool {
    parent_id.is_some_and(|id| review_channels.contains(&id))
}

pub fn is_pdf_attachment(filename: &str) -> bool {
    filename.to_ascii_lowercase().ends_with(".pdf")
}

/// Blocks that follow the progress and intro notices for one attachment.
///
/// A failed review still gets a reply: one failure block carrying the
/// user-facing message.
pub fn reply_blocks(outcome: &Result<ReviewResult, ReviewError>) -> Vec<DisplayBlock> {
    match outcome {
        Ok(result) => render_review(result),
        Err(e) => vec![failure_block(e)],
    }
}

struct Handler {
    pipeline: ReviewPipeline,
    review_channels: HashSet<u64>,
    default_job: JobContext,
}

#[async_trait]
impl EventHandler for Handler {
    async fn message(&self, ctx: Context, msg: DiscordMessage) {
        if msg.author.bot {
            return;
        }

        let pdfs: Vec<&Attachment> = msg
            .attachments
            .iter()
            .filter(|a| is_pdf_attachment(&a.filename))
            .collect();
        if pdfs.is_empty() {
            return;
        }

        let parent_id = match msg.channel(&ctx).await {
            Ok(channel) => channel
                .guild()
                .and_then(|c| c.parent_id)
                .map(|id| id.get()),
            Err(e) => {
                warn!("Could not resolve channel {}: {e}", msg.channel_id);
                return;
            }
        };
        if !is_review_channel(parent_id, &self.review_channels) {
            return;
        }
        info!(
            "Resume posted in review channel {:?} by {}",
            parent_id, msg.author.name
        );

        let job = JobContext::from_message(&msg.content).or(&self.default_job);
        for attachment in pdfs {
            self.review_attachment(&ctx, msg.channel_id, attachment, &job)
                .await;
        }
    }

    async fn ready(&self, _: Context, ready: Ready) {
        info!(
            "{} is connected and watching {} review channel(s)",
            ready.user.name,
            self.review_channels.len()
        );
    }
}

impl Handler {
    async fn review_attachment(
        &self,
        ctx: &Context,
        channel: ChannelId,
        attachment: &Attachment,
        job: &JobContext,
    ) {
        info!("Processing attachment: {}", attachment.filename);
        send_block(ctx, channel, &progress_block()).await;
        send_block(ctx, channel, &intro_block(self.pipeline.is_extended())).await;

        let outcome = match attachment.download().await {
            Ok(data) => self.pipeline.review(Bytes::from(data), job).await,
            Err(e) => Err(ReviewError::Internal(anyhow::anyhow!(
                "Failed to download attachment {}: {e}",
                attachment.filename
            ))),
        };

        match &outcome {
            Ok(_) => info!("Sending feedback for {}", attachment.filename),
            Err(e) => error!("Review of {} failed: {e}", attachment.filename),
        }
        for block in reply_blocks(&outcome) {
            send_block(ctx, channel, &block).await;
        }
    }
}

async fn send_block(ctx: &Context, channel: ChannelId, block: &DisplayBlock) {
    let message = CreateMessage::new().embed(embeds::to_embed(block));
    if let Err(e) = channel.send_message(&ctx.http, message).await {
        error!("Error sending embed '{}': {e:?}", block.title);
    }
}

/// The running Discord client, with an explicit start/stop lifecycle.
pub struct ReviewBot {
    pipeline: ReviewPipeline,
    shard_manager: Option<Arc<ShardManager>>,
    task: Option<JoinHandle<()>>,
}

impl ReviewBot {
    pub fn new(pipeline: ReviewPipeline) -> Self {
        Self {
            pipeline,
            shard_manager: None,
            task: None,
        }
    }

    /// Connects to the gateway and starts dispatching events in the background.
    pub async fn start(&mut self, config: BotConfig) -> anyhow::Result<()> {
        if self.task.is_some() {
            anyhow::bail!("Review bot is already running");
        }
        info!("Starting Discord bot");

        let intents = GatewayIntents::GUILD_MESSAGES | GatewayIntents::MESSAGE_CONTENT;
        let handler = Handler {
            pipeline: self.pipeline.clone(),
            review_channels: config.review_channels,
            default_job: config.default_job,
        };
        let mut client = Client::builder(&config.token, intents)
            .event_handler(handler)
            .await
            .context("Failed to build Discord client")?;

        self.shard_manager = Some(Arc::clone(&client.shard_manager));
        self.task = Some(tokio::spawn(async move {
            if let Err(why) = client.start().await {
                error!("Client error: {:?}", why);
            }
        }));
        Ok(())
    }

    /// Resolves when the client stops on its own (e.g. an invalid token).
    pub async fn wait(&mut self) {
        if let Some(task) = self.task.as_mut() {
            if let Err(e) = task.await {
                error!("Discord client task failed: {e}");
            }
            self.task = None;
        }
    }

    /// Disconnects every shard and waits for the client to exit.
    pub async fn stop(&mut self) {
        if let Some(shard_manager) = self.shard_manager.take() {
            info!("Shutting down Discord bot");
            shard_manager.shutdown_all().await;
        }
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                error!("Discord client task failed: {e}");
            }
        }
    }
}
