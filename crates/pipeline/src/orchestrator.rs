//! Top-level handling of one inbound message.

use std::{any::Any, panic::AssertUnwindSafe, sync::Arc, time::Instant};

use {
    chrono::{DateTime, Utc},
    futures::FutureExt,
    phoso_common::{InboundEvent, MediaAttachment, Reply},
    phoso_config::{DEFAULT_RESPONSE_TEXT, PhosoConfig},
    phoso_media::MediaRetriever,
    phoso_records::RecordStore,
    tracing::{debug, error, info, warn},
};

use crate::{
    Result,
    destination::DestinationSource,
    dispatch::{CallContext, DispatchReport, Dispatcher, PhotoContext},
    fields,
    filename::assemble_filename,
    identity::sender_id,
    throttle::{LastLongResponse, evaluate},
};

#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub long_response: String,
    pub short_response: String,
    pub threshold_minutes: i64,
    pub append_extension: bool,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            long_response: DEFAULT_RESPONSE_TEXT.into(),
            short_response: DEFAULT_RESPONSE_TEXT.into(),
            threshold_minutes: 60,
            append_extension: true,
        }
    }
}

impl PipelineSettings {
    #[must_use]
    pub fn from_config(config: &PhosoConfig) -> Self {
        Self {
            long_response: config.responses.long.clone(),
            short_response: config.responses.short.clone(),
            threshold_minutes: config.pipeline.long_response_threshold_minutes,
            append_extension: config.pipeline.append_extension,
        }
    }
}

/// Result of a fully processed call.
#[derive(Debug, Clone)]
pub struct CallSummary {
    pub sender_id: String,
    pub reply: Reply,
    /// One report per attachment, in arrival order.
    pub reports: Vec<DispatchReport>,
}

pub struct Pipeline {
    destinations: Arc<dyn DestinationSource>,
    records: Arc<dyn RecordStore>,
    media: MediaRetriever,
    dispatcher: Dispatcher,
    settings: PipelineSettings,
}

impl Pipeline {
    pub fn new(
        destinations: Arc<dyn DestinationSource>,
        records: Arc<dyn RecordStore>,
        media: MediaRetriever,
        dispatcher: Dispatcher,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            destinations,
            records,
            media,
            dispatcher,
            settings,
        }
    }

    /// Process `event` and return the reply to send back.
    ///
    /// Never fails: errors and panics are logged and become
    /// [`Reply::Empty`].
    pub async fn respond(&self, event: &InboundEvent) -> Reply {
        let started = Instant::now();
        #[cfg(feature = "metrics")]
        phoso_metrics::counter!(phoso_metrics::webhook::CALLS_TOTAL).increment(1);

        let reply = match AssertUnwindSafe(self.handle(event)).catch_unwind().await {
            Ok(Ok(summary)) => summary.reply,
            Ok(Err(e)) => {
                error!(message_id = ?event.message_id, error = %e, "inbound message failed");
                Reply::Empty
            },
            Err(panic) => {
                error!(
                    message_id = ?event.message_id,
                    panic = %panic_message(panic.as_ref()),
                    "inbound message handler panicked"
                );
                Reply::Empty
            },
        };

        #[cfg(feature = "metrics")]
        {
            use phoso_metrics::{counter, histogram, labels, webhook};
            if reply == Reply::Empty {
                counter!(webhook::FAILURES_TOTAL).increment(1);
            }
            counter!(webhook::REPLIES_TOTAL, labels::KIND => reply.kind()).increment(1);
            histogram!(webhook::PROCESSING_DURATION_SECONDS)
                .record(started.elapsed().as_secs_f64());
        }
        info!(
            kind = reply.kind(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "reply ready"
        );
        reply
    }

    /// Process `event` received now.
    pub async fn handle(&self, event: &InboundEvent) -> Result<CallSummary> {
        self.handle_at(event, Utc::now()).await
    }

    /// Process `event` as if it was received at `received`.
    pub async fn handle_at(
        &self,
        event: &InboundEvent,
        received: DateTime<Utc>,
    ) -> Result<CallSummary> {
        let sender = sender_id(&event.recipient, &event.sender);
        info!(
            sender = %sender,
            message_id = ?event.message_id,
            attachments = event.attachments.len(),
            "inbound message"
        );

        let destination = self.destinations.resolve(&event.recipient).await?;
        debug!(sender = %sender, destination = %destination.name, "destination resolved");

        let mut call = CallContext::new(sender.clone(), destination, received, &event.body);
        let mut long = false;
        let mut reports = Vec::with_capacity(event.attachments.len());

        for (index, attachment) in event.attachments.iter().enumerate() {
            info!(sender = %sender, index, url = %attachment.url, "handling attachment");
            let (attachment_long, report) = self.process_attachment(&mut call, attachment).await?;
            long |= attachment_long;
            let failed = report.failed_steps();
            if failed.is_empty() {
                info!(filename = %report.filename, "attachment delivered");
            } else {
                warn!(filename = %report.filename, failed = ?failed, "attachment partially delivered");
            }
            reports.push(report);
        }

        let reply = if long {
            info!(sender = %sender, "sending long response");
            Reply::Long(self.settings.long_response.clone())
        } else {
            info!(sender = %sender, "sending short response");
            Reply::Short(self.settings.short_response.clone())
        };

        Ok(CallSummary {
            sender_id: sender,
            reply,
            reports,
        })
    }

    /// A failed media fetch aborts the whole call; attachments already
    /// dispatched stay delivered.
    async fn process_attachment(
        &self,
        call: &mut CallContext,
        attachment: &MediaAttachment,
    ) -> Result<(bool, DispatchReport)> {
        let content_type = self
            .settings
            .append_extension
            .then_some(attachment.content_type.as_str());
        let filename = assemble_filename(call.received, &call.sender_id, &call.destination, content_type);

        let artifact = self
            .media
            .fetch(&attachment.url, &attachment.content_type)
            .await
            .inspect_err(|e| {
                error!(url = %attachment.url, filename = %filename, error = %e, "media fetch failed");
            })?;
        debug!(
            url = %attachment.url,
            final_url = %artifact.final_url,
            width = artifact.width,
            height = artifact.height,
            "media staged"
        );

        let sender_row = self
            .records
            .find(
                &self.dispatcher.tables().senders,
                fields::sender::ID,
                &call.sender_id,
            )
            .await?;
        let last = match &sender_row {
            None => LastLongResponse::FirstContact,
            Some(row) => LastLongResponse::Stored(row.str_field(fields::sender::LAST_LONG_RESPONSE)),
        };
        let decision = evaluate(last, call.received, self.settings.threshold_minutes);

        let photo = PhotoContext {
            filename,
            content_type: attachment.content_type.clone(),
            media_url: attachment.url.clone(),
            width: artifact.width,
            height: artifact.height,
            last_long_response: decision.last_long_response,
        };
        let report = self.dispatcher.dispatch(call, &photo, &artifact).await;
        drop(artifact);

        Ok((decision.long, report))
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
