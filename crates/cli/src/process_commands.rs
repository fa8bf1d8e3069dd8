//! One-shot processing of a single attachment outside the webhook.

use {
    anyhow::Result,
    clap::Args,
    phoso_common::{InboundEvent, MediaAttachment},
    phoso_pipeline::{Pipeline, StepOutcome},
};

#[derive(Args, Debug)]
pub struct ProcessArgs {
    /// Destination number the message was sent to.
    #[arg(long, env = "TO_PHONE")]
    pub to: String,
    /// Number the message came from.
    #[arg(long, env = "FROM_PHONE")]
    pub from: String,
    /// Publicly reachable media URL.
    #[arg(long, env = "MEDIA_URL")]
    pub media_url: String,
    #[arg(long, default_value = "image/jpeg")]
    pub content_type: String,
    #[arg(long, env = "MESSAGE_BODY", default_value = "")]
    pub body: String,
}

impl ProcessArgs {
    fn event(&self) -> InboundEvent {
        InboundEvent::new(&self.to, &self.from, &self.body)
            .with_attachment(MediaAttachment::new(&self.media_url, &self.content_type))
    }
}

pub async fn handle_process(pipeline: &Pipeline, args: ProcessArgs) -> Result<()> {
    let summary = pipeline.handle(&args.event()).await?;

    println!("sender:  {}", summary.sender_id);
    println!("reply:   {} ({})", summary.reply.text().unwrap_or(""), summary.reply.kind());
    for report in &summary.reports {
        println!("file:    {}", report.filename);
        for (step, outcome) in report.outcomes() {
            let status = match outcome {
                StepOutcome::Delivered => "delivered".to_string(),
                StepOutcome::Skipped => "disabled".to_string(),
                StepOutcome::Failed(e) => format!("failed: {e}"),
            };
            println!("  {:<8} {status}", step.as_str());
        }
        if let Some(link) = &report.link {
            println!("  link     {link}");
        }
    }
    Ok(())
}
