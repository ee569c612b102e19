//! Migration report delivery.
//!
//! Reports are handed to a [`ReportDispatcher`], which queues them without
//! waiting. A single [`ReportWorker`] drains the queue and delivers every
//! report on each configured channel. Delivery is best effort: failures are
//! logged and never reach the request that triggered the migration.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::{Message, SmtpTransport, Transport};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::domain::models::MigrationReport;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportChannel {
    Log,
    Email,
    Webhook,
}

impl ReportChannel {
    pub fn name(&self) -> &'static str {
        match self {
            ReportChannel::Log => "log",
            ReportChannel::Email => "email",
            ReportChannel::Webhook => "webhook",
        }
    }
}

impl FromStr for ReportChannel {
    type Err = ReportError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "log" => Ok(ReportChannel::Log),
            "email" => Ok(ReportChannel::Email),
            "webhook" => Ok(ReportChannel::Webhook),
            other => Err(ReportError::UnknownChannel(other.to_string())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub smtp_host: Option<String>,
    pub smtp_port: u16,
    pub username: String,
    pub password: String,
    pub from_email: String,
    pub to_emails: Vec<String>,
    pub subject: String,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            smtp_host: None,
            smtp_port: 587,
            username: String::new(),
            password: String::new(),
            from_email: String::new(),
            to_emails: Vec::new(),
            subject: "Migration Report - Ledger API".to_string(),
        }
    }
}

impl EmailConfig {
    /// Real SMTP delivery needs a relay, credentials, a sender and at least one recipient.
    pub fn is_configured(&self) -> bool {
        self.smtp_host.as_deref().is_some_and(|host| !host.is_empty())
            && !self.username.is_empty()
            && !self.from_email.is_empty()
            && !self.to_emails.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct WebhookConfig {
    pub url: Option<String>,
    pub timeout: Duration,
    pub headers: Vec<(String, String)>,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            url: None,
            timeout: Duration::from_secs(10),
            headers: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReportConfig {
    pub channels: Vec<ReportChannel>,
    pub email: EmailConfig,
    pub webhook: WebhookConfig,
    /// Where error CSVs are exported; no export when unset
    pub error_directory: Option<PathBuf>,
    /// Always use the logging stand-in for email
    pub force_mock: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            channels: vec![ReportChannel::Log],
            email: EmailConfig::default(),
            webhook: WebhookConfig::default(),
            error_directory: None,
            force_mock: false,
        }
    }
}

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("unknown report channel '{0}'")]
    UnknownChannel(String),
    #[error("invalid email address: {0}")]
    Address(#[from] lettre::address::AddressError),
    #[error("failed to build email: {0}")]
    Email(#[from] lettre::error::Error),
    #[error("SMTP delivery failed: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
    #[error("webhook delivery failed: {0}")]
    Webhook(#[from] reqwest::Error),
    #[error("failed to write error file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to write error file: {0}")]
    Csv(#[from] csv::Error),
    #[error("delivery task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

pub type ReportReceiver = mpsc::UnboundedReceiver<MigrationReport>;

/// Create the queue between the migration service and the report worker.
pub fn report_queue() -> (ReportDispatcher, ReportReceiver) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (ReportDispatcher { sender }, receiver)
}

/// Sending half of the report queue. Never blocks and never fails the caller.
#[derive(Clone)]
pub struct ReportDispatcher {
    sender: mpsc::UnboundedSender<MigrationReport>,
}

impl ReportDispatcher {
    pub fn dispatch(&self, report: MigrationReport) {
        let report_id = report.id;
        match self.sender.send(report) {
            Ok(()) => info!("Queued migration report {}", report_id),
            Err(_) => warn!("Report worker is not running, dropping report {}", report_id),
        }
    }
}

/// Delivers reports over the configured channels
pub struct ReportService {
    config: ReportConfig,
    http: reqwest::Client,
}

impl ReportService {
    pub fn new(config: ReportConfig) -> Result<Self, ReportError> {
        let http = reqwest::Client::builder()
            .timeout(config.webhook.timeout)
            .build()?;
        Ok(Self { config, http })
    }

    pub fn config(&self) -> &ReportConfig {
        &self.config
    }

    /// Deliver one report on every configured channel. Failures are logged.
    pub async fn deliver(&self, mut report: MigrationReport) {
        match self.export_error_csv(&report) {
            Ok(Some(path)) => {
                info!("Exported {} row errors to {}", report.errors.len(), path.display());
                report.error_file_csv = Some(path.display().to_string());
            }
            Ok(None) => {}
            Err(e) => error!("Failed to export error file for report {}: {}", report.id, e),
        }

        for channel in &self.config.channels {
            let result = match channel {
                ReportChannel::Log => {
                    self.send_log_report(&report);
                    Ok(())
                }
                ReportChannel::Email => self.send_email_report(&report).await,
                ReportChannel::Webhook => self.send_webhook_report(&report).await,
            };

            if let Err(e) = result {
                error!(
                    "Failed to deliver report {} via {}: {}",
                    report.id,
                    channel.name(),
                    e
                );
            }
        }
    }

    /// Write the report's row errors to `errors_<timestamp>_<filename>` in the
    /// configured error directory. Returns `None` when there is nothing to write
    /// or no directory is configured.
    pub fn export_error_csv(&self, report: &MigrationReport) -> Result<Option<PathBuf>, ReportError> {
        let Some(directory) = &self.config.error_directory else {
            return Ok(None);
        };
        if report.errors.is_empty() {
            return Ok(None);
        }

        fs::create_dir_all(directory)?;

        // never let a client-supplied name escape the directory
        let base_name = Path::new(&report.filename)
            .file_name()
            .and_then(|name| name.to_str())
            .filter(|name| !name.is_empty())
            .unwrap_or("upload.csv");
        let path = directory.join(format!(
            "errors_{}_{}",
            report.generated_at.format("%Y%m%d_%H%M%S"),
            base_name
        ));

        let mut writer = csv::Writer::from_path(&path)?;
        writer.write_record(["line_number", "error_message"])?;
        for row_error in &report.errors {
            writer.write_record([row_error.line.to_string(), row_error.message.clone()])?;
        }
        writer.flush()?;

        Ok(Some(path))
    }

    fn send_log_report(&self, report: &MigrationReport) {
        info!(
            report_id = %report.id,
            filename = %report.filename,
            file_size = report.file_size,
            "=== MIGRATION REPORT ==="
        );
        info!(
            "Records: {} total, {} success, {} errors",
            report.total_records, report.success_records, report.error_records
        );
        info!("Users affected: {}", report.users_affected);
        info!(
            "Amount range: {:.2} to {:.2} (avg: {:.2})",
            report.smallest_amount, report.largest_amount, report.average_amount
        );
        info!("Processing time: {}ms", report.processing_time_ms);
        if !report.errors.is_empty() {
            let errors: Vec<String> = report.errors.iter().map(ToString::to_string).collect();
            info!("Errors: {:?}", errors);
        }
        info!("=== END REPORT ===");
    }

    async fn send_email_report(&self, report: &MigrationReport) -> Result<(), ReportError> {
        let email = &self.config.email;
        if self.config.force_mock || !email.is_configured() {
            self.send_mock_email_report(report);
            return Ok(());
        }

        let message = self.build_email(report)?;
        let transport = self.smtp_transport()?;
        tokio::task::spawn_blocking(move || transport.send(&message)).await??;

        info!(
            "Migration report {} emailed to {} recipients",
            report.id,
            email.to_emails.len()
        );
        Ok(())
    }

    fn send_mock_email_report(&self, report: &MigrationReport) {
        info!("=== MOCK EMAIL REPORT ===");
        info!("To: {:?}", self.config.email.to_emails);
        info!("Subject: {}", self.email_subject(report));
        info!("Body:\n{}", render_email_body(report));
        info!("=== END MOCK EMAIL ===");
    }

    fn email_subject(&self, report: &MigrationReport) -> String {
        format!("{} - {}", self.config.email.subject, report.filename)
    }

    fn build_email(&self, report: &MigrationReport) -> Result<Message, ReportError> {
        let email = &self.config.email;
        let mut builder = Message::builder()
            .from(email.from_email.parse::<Mailbox>()?)
            .subject(self.email_subject(report));

        for recipient in &email.to_emails {
            builder = builder.to(recipient.parse::<Mailbox>()?);
        }

        Ok(builder.body(render_email_body(report))?)
    }

    fn smtp_transport(&self) -> Result<SmtpTransport, ReportError> {
        let email = &self.config.email;
        let host = email.smtp_host.clone().unwrap_or_default();
        let tls_parameters = TlsParameters::new(host.clone())?;

        Ok(SmtpTransport::relay(&host)?
            .port(email.smtp_port)
            .tls(Tls::Required(tls_parameters))
            .credentials(Credentials::new(
                email.username.clone(),
                email.password.clone(),
            ))
            .build())
    }

    async fn send_webhook_report(&self, report: &MigrationReport) -> Result<(), ReportError> {
        let Some(url) = self.config.webhook.url.as_deref() else {
            warn!("Webhook channel enabled without a URL, skipping report {}", report.id);
            return Ok(());
        };

        let mut request = self.http.post(url).json(report);
        for (name, value) in &self.config.webhook.headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = request.send().await?.error_for_status()?;
        info!(
            "Migration report {} posted to webhook ({})",
            report.id,
            response.status()
        );
        Ok(())
    }
}

/// Plain-text body shared by the SMTP and mock email paths.
pub fn render_email_body(report: &MigrationReport) -> String {
    let mut body = String::new();

    // writing into a String cannot fail
    let _ = writeln!(body, "=== MIGRATION REPORT ===\n");
    let _ = writeln!(body, "File: {} ({} bytes)", report.filename, report.file_size);
    let _ = writeln!(body, "Timestamp: {}", report.generated_at.format("%Y-%m-%d %H:%M:%S"));
    let _ = writeln!(body, "Processing time: {}ms\n", report.processing_time_ms);

    let _ = writeln!(body, "=== STATISTICS ===");
    let _ = writeln!(body, "Total records: {}", report.total_records);
    let _ = writeln!(body, "Success records: {}", report.success_records);
    let _ = writeln!(body, "Error records: {}", report.error_records);
    let _ = writeln!(body, "Success rate: {:.2}%\n", report.success_rate());

    let _ = writeln!(body, "=== DATA ANALYSIS ===");
    let _ = writeln!(body, "Users affected: {}", report.users_affected);
    let _ = writeln!(body, "Total amount: {:.2}", report.total_amount);
    let _ = writeln!(body, "Average amount: {:.2}", report.average_amount);
    let _ = writeln!(body, "Largest amount: {:.2}", report.largest_amount);
    let _ = writeln!(body, "Smallest amount: {:.2}", report.smallest_amount);
    match &report.date_range {
        Some(range) => {
            let _ = writeln!(
                body,
                "Date range: {} to {}\n",
                range.from.format("%Y-%m-%d"),
                range.to.format("%Y-%m-%d")
            );
        }
        None => {
            let _ = writeln!(body, "Date range: n/a\n");
        }
    }

    if !report.errors.is_empty() {
        let _ = writeln!(body, "=== ERRORS ===");
        for (index, row_error) in report.errors.iter().enumerate() {
            let _ = writeln!(body, "{}. {}", index + 1, row_error);
        }
        let _ = writeln!(body);
    }

    if let Some(path) = &report.error_file_csv {
        let _ = writeln!(body, "=== ERROR FILE ===");
        let _ = writeln!(body, "Error records exported to: {}\n", path);
    }

    body.push_str("=== END REPORT ===");
    body
}

/// Owns the receiving half of the report queue and delivers reports one by one.
pub struct ReportWorker {
    receiver: ReportReceiver,
    service: Arc<ReportService>,
}

impl ReportWorker {
    pub fn new(receiver: ReportReceiver, service: ReportService) -> Self {
        Self {
            receiver,
            service: Arc::new(service),
        }
    }

    /// Run until every dispatcher has been dropped.
    pub async fn run(mut self) {
        info!(
            "Report worker started (channels: {:?})",
            self.service
                .config()
                .channels
                .iter()
                .map(ReportChannel::name)
                .collect::<Vec<_>>()
        );

        while let Some(report) = self.receiver.recv().await {
            self.service.deliver(report).await;
        }

        info!("Report worker stopped");
    }

    /// Spawn the worker onto the current Tokio runtime.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }
}
