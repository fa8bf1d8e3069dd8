//! Builds the pipeline and its collaborator clients from configuration.

use std::{sync::Arc, time::Duration};

use {
    anyhow::{Context, Result},
    phoso_config::{PhosoConfig, RecordBackend},
    phoso_drive::{CloudFileStore, GoogleDriveOptions, GoogleDriveStore, OAuthCredentials},
    phoso_media::{MediaRetriever, RetrieverOptions},
    phoso_pipeline::{
        DestinationSource, Dispatcher, Pipeline, PipelineSettings, RecordDestinations,
        StaticDestinations,
    },
    phoso_records::{AirtableOptions, AirtableStore, MemoryRecordStore, RecordStore},
    phoso_slack::{ChatNotifier, SlackNotifier, SlackOptions},
    tracing::{info, warn},
};

pub fn build_pipeline(config: &PhosoConfig) -> Result<Pipeline> {
    let records = record_store(config)?;
    let destinations = destination_source(config, Arc::clone(&records))?;
    let drive = cloud_store(config)?;
    let slack = chat_notifier(config)?;

    let media = MediaRetriever::new(RetrieverOptions {
        timeout: Duration::from_secs(config.media.fetch_timeout_secs),
        max_redirects: config.media.max_redirects,
        max_bytes: config.media.max_bytes,
    })?;

    let dispatcher = Dispatcher::new(Arc::clone(&records), drive, slack)
        .with_tables(config.records.tables.clone())
        .with_make_public(config.drive.make_public)
        .with_post_mode(config.slack.post_mode);

    Ok(Pipeline::new(
        destinations,
        records,
        media,
        dispatcher,
        PipelineSettings::from_config(config),
    ))
}

fn airtable(config: &PhosoConfig, base_id: &str) -> Result<AirtableStore> {
    let api_key = config
        .records
        .api_key
        .clone()
        .context("records.api_key (AIRTABLE_API_KEY) is required for the airtable backend")?;
    Ok(AirtableStore::new(AirtableOptions {
        api_url: config.records.api_url.clone(),
        api_key,
        base_id: base_id.to_string(),
        timeout: Duration::from_secs(config.records.http_timeout_secs),
    })?)
}

fn record_store(config: &PhosoConfig) -> Result<Arc<dyn RecordStore>> {
    match config.records.backend {
        RecordBackend::Airtable => {
            info!(base = %config.records.base_id, "using airtable record store");
            Ok(Arc::new(airtable(config, &config.records.base_id)?))
        },
        RecordBackend::Memory => {
            warn!("using in-memory record store; rows are lost on exit");
            Ok(Arc::new(MemoryRecordStore::new()))
        },
    }
}

fn destination_source(
    config: &PhosoConfig,
    records: Arc<dyn RecordStore>,
) -> Result<Arc<dyn DestinationSource>> {
    let entries = &config.destinations.entries;
    if !entries.is_empty() {
        info!(count = entries.len(), "using static destinations");
        return Ok(Arc::new(StaticDestinations::from_config(entries)?));
    }

    let table = config.destinations.table.clone();
    match (config.records.backend, &config.destinations.base_id) {
        (RecordBackend::Airtable, Some(base_id)) if *base_id != config.records.base_id => {
            info!(base = %base_id, table = %table, "resolving destinations from separate base");
            let store: Arc<dyn RecordStore> = Arc::new(airtable(config, base_id)?);
            Ok(Arc::new(RecordDestinations::new(store, table)))
        },
        _ => Ok(Arc::new(RecordDestinations::new(records, table))),
    }
}

fn cloud_store(config: &PhosoConfig) -> Result<Option<Arc<dyn CloudFileStore>>> {
    let drive = &config.drive;
    if !drive.enabled {
        info!("cloud storage upload disabled");
        return Ok(None);
    }

    let credentials = OAuthCredentials {
        client_id: drive
            .client_id
            .clone()
            .context("drive.client_id (GOOGLE_DRIVE_CLIENT_ID) is required")?,
        client_secret: drive
            .client_secret
            .clone()
            .context("drive.client_secret (GOOGLE_DRIVE_CLIENT_SECRET) is required")?,
        refresh_token: drive
            .refresh_token
            .clone()
            .context("drive.refresh_token (GOOGLE_DRIVE_REFRESH_TOKEN) is required")?,
        token_url: drive.token_url.clone(),
    };
    let store = GoogleDriveStore::new(GoogleDriveOptions {
        credentials,
        api_url: drive.api_url.clone(),
        upload_url: drive.upload_url.clone(),
        timeout: Duration::from_secs(drive.http_timeout_secs),
    })?;
    Ok(Some(Arc::new(store)))
}

fn chat_notifier(config: &PhosoConfig) -> Result<Option<Arc<dyn ChatNotifier>>> {
    let slack = &config.slack;
    if !slack.enabled {
        info!("chat notifications disabled");
        return Ok(None);
    }

    let notifier = SlackNotifier::new(SlackOptions {
        bot_token: slack
            .bot_token
            .clone()
            .context("slack.bot_token (SLACK_API_TOKEN) is required")?,
        api_url: slack.api_url.clone(),
        timeout: Duration::from_secs(slack.http_timeout_secs),
    })?;
    Ok(Some(Arc::new(notifier)))
}
