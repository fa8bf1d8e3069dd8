//! Fan-out of one processed attachment to the record store, cloud storage and
//! chat.
//!
//! The three steps run in that order and each is attempted exactly once; a
//! failing step is logged and recorded in the [`DispatchReport`] without
//! stopping the others.

use std::{fmt, sync::Arc, time::Instant};

use {
    chrono::{DateTime, SecondsFormat, Utc},
    phoso_common::DestinationConfig,
    phoso_config::{SlackPostMode, TableNames},
    phoso_drive::{CloudFileStore, NewFile},
    phoso_media::Artifact,
    phoso_records::{Fields, RecordStore, upsert_with_merge},
    phoso_slack::{ChatNotifier, photo_blocks, upload_caption},
    serde_json::{Value, json},
    tracing::{error, info},
};

use crate::fields;

/// Per-call state shared by every attachment of one inbound message.
#[derive(Debug, Clone)]
pub struct CallContext {
    pub sender_id: String,
    pub destination: DestinationConfig,
    pub received: DateTime<Utc>,
    pub body: String,
    /// Message row created for this call, once the first attachment has
    /// reached the record step.
    pub message_row: Option<String>,
}

impl CallContext {
    #[must_use]
    pub fn new(
        sender_id: impl Into<String>,
        destination: DestinationConfig,
        received: DateTime<Utc>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            sender_id: sender_id.into(),
            destination,
            received,
            body: body.into(),
            message_row: None,
        }
    }
}

/// Per-attachment state handed to the dispatcher.
#[derive(Debug, Clone)]
pub struct PhotoContext {
    pub filename: String,
    pub content_type: String,
    /// Attachment URL as given by the transport, not the redirect target.
    pub media_url: String,
    pub width: u32,
    pub height: u32,
    /// Sender's last long response as decided by the throttle.
    pub last_long_response: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Records,
    Drive,
    Slack,
}

impl Step {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Records => "records",
            Self::Drive => "drive",
            Self::Slack => "slack",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Delivered,
    Failed(String),
    /// The collaborator is disabled in configuration.
    Skipped,
}

impl StepOutcome {
    #[must_use]
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// Outcome of every fan-out step for one attachment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchReport {
    pub filename: String,
    pub records: StepOutcome,
    pub drive: StepOutcome,
    pub slack: StepOutcome,
    /// Shareable cloud storage link, when the drive step delivered.
    pub link: Option<String>,
}

impl DispatchReport {
    pub fn outcomes(&self) -> [(Step, &StepOutcome); 3] {
        [
            (Step::Records, &self.records),
            (Step::Drive, &self.drive),
            (Step::Slack, &self.slack),
        ]
    }

    #[must_use]
    pub fn failed_steps(&self) -> Vec<Step> {
        self.outcomes()
            .into_iter()
            .filter(|(_, outcome)| outcome.is_failed())
            .map(|(step, _)| step)
            .collect()
    }
}

/// Runs the three fan-out steps against shared collaborator clients.
pub struct Dispatcher {
    records: Arc<dyn RecordStore>,
    drive: Option<Arc<dyn CloudFileStore>>,
    slack: Option<Arc<dyn ChatNotifier>>,
    tables: TableNames,
    make_public: bool,
    post_mode: SlackPostMode,
}

impl Dispatcher {
    pub fn new(
        records: Arc<dyn RecordStore>,
        drive: Option<Arc<dyn CloudFileStore>>,
        slack: Option<Arc<dyn ChatNotifier>>,
    ) -> Self {
        Self {
            records,
            drive,
            slack,
            tables: TableNames::default(),
            make_public: true,
            post_mode: SlackPostMode::default(),
        }
    }

    #[must_use]
    pub fn with_tables(mut self, tables: TableNames) -> Self {
        self.tables = tables;
        self
    }

    #[must_use]
    pub fn with_make_public(mut self, make_public: bool) -> Self {
        self.make_public = make_public;
        self
    }

    #[must_use]
    pub fn with_post_mode(mut self, post_mode: SlackPostMode) -> Self {
        self.post_mode = post_mode;
        self
    }

    #[must_use]
    pub fn tables(&self) -> &TableNames {
        &self.tables
    }

    pub async fn dispatch(
        &self,
        call: &mut CallContext,
        photo: &PhotoContext,
        artifact: &Artifact,
    ) -> DispatchReport {
        let started = Instant::now();
        let records = match self.write_records(call, photo).await {
            Ok(()) => StepOutcome::Delivered,
            Err(e) => failed(Step::Records, &photo.filename, e),
        };
        observe(Step::Records, &records, started);

        let started = Instant::now();
        let (drive, link) = match &self.drive {
            None => (StepOutcome::Skipped, None),
            Some(drive) => match self.upload(drive.as_ref(), call, photo, artifact).await {
                Ok(link) => (StepOutcome::Delivered, Some(link)),
                Err(e) => (failed(Step::Drive, &photo.filename, e), None),
            },
        };
        observe(Step::Drive, &drive, started);

        let started = Instant::now();
        let slack = match &self.slack {
            None => StepOutcome::Skipped,
            Some(slack) => match self
                .notify(slack.as_ref(), call, photo, artifact, link.as_deref())
                .await
            {
                Ok(()) => StepOutcome::Delivered,
                Err(e) => failed(Step::Slack, &photo.filename, e),
            },
        };
        observe(Step::Slack, &slack, started);

        DispatchReport {
            filename: photo.filename.clone(),
            records,
            drive,
            slack,
            link,
        }
    }

    async fn write_records(
        &self,
        call: &mut CallContext,
        photo: &PhotoContext,
    ) -> phoso_records::Result<()> {
        let store = self.records.as_ref();

        let sender_row = upsert_with_merge(
            store,
            &self.tables.senders,
            fields::sender::ID,
            &call.sender_id,
            field_map([
                (fields::sender::ID, json!(call.sender_id)),
                (
                    fields::sender::LAST_LONG_RESPONSE,
                    json!(timestamp(photo.last_long_response)),
                ),
            ]),
            fields::sender::WRITABLE,
        )
        .await?;

        let message_row = match &call.message_row {
            Some(id) => id.clone(),
            None => {
                let row = store
                    .insert(
                        &self.tables.messages,
                        field_map([
                            (fields::message::CHAPTER, json!(call.destination.name)),
                            (fields::message::DATE_RECEIVED, json!(timestamp(call.received))),
                            (fields::message::SENDER, json!([sender_row])),
                            (fields::message::TEXT, json!(call.body)),
                        ]),
                    )
                    .await?;
                call.message_row = Some(row.id.clone());
                row.id
            },
        };

        store
            .insert(
                &self.tables.photos,
                field_map([
                    (fields::photo::PHOTO, json!([{ "url": photo.media_url }])),
                    (fields::photo::WIDTH, json!(photo.width)),
                    (fields::photo::HEIGHT, json!(photo.height)),
                    (fields::photo::FILENAME, json!(photo.filename)),
                    (fields::photo::MESSAGE, json!([message_row])),
                ]),
            )
            .await?;
        Ok(())
    }

    async fn upload(
        &self,
        drive: &dyn CloudFileStore,
        call: &CallContext,
        photo: &PhotoContext,
        artifact: &Artifact,
    ) -> phoso_drive::Result<String> {
        let file = NewFile {
            title: photo.filename.clone(),
            content_type: photo.content_type.clone(),
            parent_folder: call.destination.drive_folder.clone(),
        };
        let stored = drive.upload(&file, artifact.path()).await?;
        if self.make_public {
            drive.set_public(&stored.id).await?;
        }
        info!(filename = %photo.filename, link = %stored.link, "stored in cloud folder");
        Ok(stored.link)
    }

    async fn notify(
        &self,
        slack: &dyn ChatNotifier,
        call: &CallContext,
        photo: &PhotoContext,
        artifact: &Artifact,
        link: Option<&str>,
    ) -> phoso_slack::Result<()> {
        let channel = &call.destination.slack_channel;
        match self.post_mode {
            SlackPostMode::Upload => {
                let caption = upload_caption(&call.body, link, &photo.filename);
                slack
                    .post_file(channel, artifact.path(), &photo.filename, &caption)
                    .await
            },
            SlackPostMode::Message => {
                let blocks = photo_blocks(&call.body, link, &photo.filename, &photo.media_url);
                slack.post_message(channel, blocks).await
            },
        }
    }
}

fn field_map<const N: usize>(pairs: [(&str, Value); N]) -> Fields {
    pairs
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect()
}

fn timestamp(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn failed(step: Step, filename: &str, error: impl fmt::Display) -> StepOutcome {
    error!(step = %step, filename, error = %error, "fan-out step failed");
    StepOutcome::Failed(error.to_string())
}

#[cfg_attr(not(feature = "metrics"), allow(unused_variables))]
fn observe(step: Step, outcome: &StepOutcome, started: Instant) {
    #[cfg(feature = "metrics")]
    {
        use phoso_metrics::{counter, dispatch, histogram, labels};

        let success = match outcome {
            StepOutcome::Delivered => "true",
            StepOutcome::Failed(_) => "false",
            StepOutcome::Skipped => return,
        };
        counter!(
            dispatch::STEPS_TOTAL,
            labels::STEP => step.as_str(),
            labels::SUCCESS => success
        )
        .increment(1);
        histogram!(dispatch::STEP_DURATION_SECONDS, labels::STEP => step.as_str())
            .record(started.elapsed().as_secs_f64());
    }
}
