//! Run status notifications.

use crate::config::NotifyConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub subject: String,
    pub body: String,
    pub success: bool,
}

impl Notification {
    pub fn success(subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self { subject: subject.into(), body: body.into(), success: true }
    }

    pub fn failure(subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self { subject: subject.into(), body: body.into(), success: false }
    }

    /// Subject line with a status marker, e.g. `✅ MNE Report Updated`.
    pub fn title(&self) -> String {
        let marker = if self.success { "✅" } else { "❌" };
        format!("{} {}", marker, self.subject)
    }
}

pub trait Notifier {
    fn notify(&self, notification: &Notification);
}

/// Writes notifications to the log.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier {
    recipients: Vec<String>,
}

impl LogNotifier {
    pub fn new(recipients: Vec<String>) -> Self {
        Self { recipients }
    }
}

impl Notifier for LogNotifier {
    fn notify(&self, notification: &Notification) {
        let to = self.recipients.join(", ");
        if notification.success {
            tracing::info!(to = %to, "{}\n{}", notification.title(), notification.body);
        } else {
            tracing::error!(to = %to, "{}\n{}", notification.title(), notification.body);
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify(&self, notification: &Notification) {
        tracing::debug!("Notifications disabled, dropping `{}`", notification.subject);
    }
}

/// Log-only delivery: enabled notifications are logged with their
/// recipients, never mailed.
pub fn notifier_from_config(config: &NotifyConfig) -> Box<dyn Notifier> {
    if config.enabled {
        Box::new(LogNotifier::new(config.recipients.clone()))
    } else {
        Box::new(NullNotifier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_marks_status() {
        assert_eq!(Notification::success("Done", "").title(), "✅ Done");
        assert_eq!(Notification::failure("Sync Failed", "boom").title(), "❌ Sync Failed");
    }

    #[test]
    fn disabled_config_builds_null_notifier() {
        // Both variants accept notifications without panicking.
        let note = Notification::success("x", "y");
        notifier_from_config(&NotifyConfig::default()).notify(&note);
        notifier_from_config(&NotifyConfig { enabled: true, recipients: vec!["a@b".into()] })
            .notify(&note);
    }
}
