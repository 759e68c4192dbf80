//! Print lifecycle notifications and periodic progress updates.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use jiff::{SignedDuration, Timestamp, Zoned};
use tokio::sync::watch;

use super::formatting::{
    UNKNOWN, file_name, file_stem, format_duration, format_eta, render_template,
};
use super::push_service::PushService;
use crate::config::{MessageTemplate, PluginSettings};

/// Print events forwarded by the host.
#[derive(Debug, Clone, PartialEq)]
pub enum PrintEvent {
    Started,
    Done {
        /// Path or name of the printed file
        name: String,
        /// Print duration in seconds
        elapsed: Option<i64>,
    },
}

/// Progress report forwarded by the host.
#[derive(Debug, Clone, PartialEq)]
pub struct PrintProgress {
    /// Completion in percent
    pub progress: u8,
    /// Seconds since the print started
    pub print_time: Option<i64>,
    /// Estimated seconds until the print finishes
    pub print_time_left: Option<i64>,
    /// Path of the file being printed
    pub path: String,
}

/// A rendered message ready to push.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrintMessage {
    pub title: String,
    pub body: String,
    pub filename: String,
}

fn render(template: &MessageTemplate, placeholders: &HashMap<&str, String>, filename: String) -> PrintMessage {
    PrintMessage {
        title: render_template(&template.title, placeholders),
        body: render_template(&template.body, placeholders),
        filename,
    }
}

fn duration_or_unknown(seconds: Option<i64>) -> String {
    seconds.map_or_else(|| UNKNOWN.to_string(), format_duration)
}

/// The "print done" message for `name`.
pub fn print_done_message(
    template: &MessageTemplate,
    name: &str,
    elapsed: Option<i64>,
) -> PrintMessage {
    let file = file_name(name);
    let placeholders = HashMap::from([
        ("file", file.to_string()),
        ("elapsed_time", duration_or_unknown(elapsed)),
    ]);
    render(template, &placeholders, format!("{}-done.jpg", file_stem(file)))
}

/// The periodic progress message for `update`, with the ETA relative to `now`.
pub fn progress_message(
    template: &MessageTemplate,
    update: &PrintProgress,
    now: &Zoned,
) -> PrintMessage {
    let placeholders = HashMap::from([
        ("progress", update.progress.to_string()),
        ("file", update.path.clone()),
        ("elapsed_time", duration_or_unknown(update.print_time)),
        ("remaining_time", duration_or_unknown(update.print_time_left)),
        (
            "eta",
            update
                .print_time_left
                .map_or_else(|| UNKNOWN.to_string(), |left| format_eta(left, now)),
        ),
    ]);
    // Basename stem only; directories in the upload path are dropped.
    let filename = format!("{}-{}.jpg", file_stem(&update.path), update.progress);
    render(template, &placeholders, filename)
}

/// Reacts to print events and sends progress messages on a schedule.
#[derive(Clone)]
pub struct PrintEventService {
    settings: watch::Receiver<PluginSettings>,
    push: PushService,
    next_message: Arc<Mutex<Option<Timestamp>>>,
}

impl PrintEventService {
    pub fn new(settings: watch::Receiver<PluginSettings>, push: PushService) -> Self {
        Self {
            settings,
            push,
            next_message: Arc::new(Mutex::new(None)),
        }
    }

    fn schedule(&self) -> MutexGuard<'_, Option<Timestamp>> {
        match self.next_message.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn after_interval(now: Timestamp, settings: &PluginSettings) -> Option<Timestamp> {
        now.checked_add(SignedDuration::from_secs(settings.periodic_interval_secs()))
            .ok()
    }

    /// When the next progress message is due, if one is scheduled.
    pub fn next_message(&self) -> Option<Timestamp> {
        *self.schedule()
    }

    /// Handle a print event. Returns whether a message was delivered.
    pub async fn handle_event(&self, event: PrintEvent, now: Timestamp) -> bool {
        let settings = self.settings.borrow().clone();

        match event {
            PrintEvent::Started => {
                if settings.periodic_updates {
                    let next = Self::after_interval(now, &settings);
                    *self.schedule() = next;
                    tracing::debug!(next = ?next, "Scheduled periodic progress updates");
                }
                false
            }
            PrintEvent::Done { name, elapsed } => {
                *self.schedule() = None;

                let message = print_done_message(&settings.print_done, &name, elapsed);
                tracing::info!(file = %name, "Print done, sending notification");
                self.push
                    .send_message_with_webcam_image(
                        &message.title,
                        &message.body,
                        Some(message.filename),
                        None,
                    )
                    .await
            }
        }
    }

    /// Decide whether `update` warrants a progress message now.
    ///
    /// Whenever the schedule is due it moves one interval ahead, even if
    /// the update is then skipped for lack of timing data or because the
    /// print ends before the next interval.
    pub fn due_progress_message(&self, update: &PrintProgress, now: &Zoned) -> Option<PrintMessage> {
        let settings = self.settings.borrow().clone();
        if !settings.periodic_updates {
            return None;
        }

        {
            let mut next = self.schedule();
            let due = (*next)?;
            if now.timestamp() < due {
                return None;
            }
            *next = Self::after_interval(now.timestamp(), &settings);
        }

        let (Some(_), Some(time_left)) = (update.print_time, update.print_time_left) else {
            tracing::debug!(progress = update.progress, "No print times yet, skipping progress message");
            return None;
        };

        let interval = settings.periodic_interval_secs();
        if time_left < interval {
            tracing::debug!(
                time_left,
                interval,
                "Skip trailing message since print is nearly done"
            );
            return None;
        }

        Some(progress_message(&settings.print_progress, update, now))
    }

    /// Handle a progress report. Returns whether a message was delivered.
    pub async fn on_print_progress(&self, update: &PrintProgress, now: &Zoned) -> bool {
        let Some(message) = self.due_progress_message(update, now) else {
            return false;
        };

        self.push
            .send_message_with_webcam_image(&message.title, &message.body, Some(message.filename), None)
            .await
    }

    /// Restart the interval from `now` when a schedule is active.
    pub fn reset_schedule(&self, now: Timestamp) {
        let settings = self.settings.borrow().clone();
        let mut next = self.schedule();
        if next.is_some() {
            *next = Self::after_interval(now, &settings);
            tracing::debug!(next = ?*next, "Periodic update timer reset");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PushbulletConfig, WebcamConfig};
    use crate::services::snapshot::Snapshotter;
    use jiff::tz::TimeZone;

    fn at(ts: i64) -> Zoned {
        Timestamp::from_second(ts).unwrap().to_zoned(TimeZone::UTC)
    }

    fn service(periodic: bool, interval_minutes: u64) -> (PrintEventService, watch::Sender<PluginSettings>) {
        let (tx, rx) = watch::channel(PluginSettings {
            periodic_updates: periodic,
            periodic_updates_interval: interval_minutes,
            ..PluginSettings::default()
        });
        let push = PushService::new(PushbulletConfig::default(), Snapshotter::new(WebcamConfig::default()));
        (PrintEventService::new(rx, push), tx)
    }

    fn update(time: Option<i64>, left: Option<i64>) -> PrintProgress {
        PrintProgress {
            progress: 42,
            print_time: time,
            print_time_left: left,
            path: "models/benchy.gcode".to_string(),
        }
    }

    #[test]
    fn test_print_done_message() {
        let message = print_done_message(&MessageTemplate::print_done(), "uploads/benchy.gcode", Some(3720));
        assert_eq!(message.title, "Print job finished");
        assert_eq!(message.body, "benchy.gcode finished printing in 1h 2min");
        assert_eq!(message.filename, "benchy-done.jpg");

        let unknown = print_done_message(&MessageTemplate::print_done(), "x.gcode", None);
        assert_eq!(unknown.body, "x.gcode finished printing in ?");
    }

    #[test]
    fn test_progress_message() {
        let message = progress_message(
            &MessageTemplate::print_progress(),
            &update(Some(600), Some(3600)),
            &at(0),
        );
        assert_eq!(message.title, "Print job 42% complete");
        assert_eq!(
            message.body,
            "42% on models/benchy.gcode\nTime elapsed: 0h 10min\nTime left: 1h 0min\nETA: 01:00"
        );
        assert_eq!(message.filename, "benchy-42.jpg");
    }

    #[tokio::test]
    async fn test_started_schedules_only_when_enabled() {
        let (disabled, _tx) = service(false, 15);
        disabled.handle_event(PrintEvent::Started, Timestamp::UNIX_EPOCH).await;
        assert!(disabled.next_message().is_none());

        let (enabled, _tx) = service(true, 15);
        enabled.handle_event(PrintEvent::Started, Timestamp::UNIX_EPOCH).await;
        assert_eq!(
            enabled.next_message(),
            Some(Timestamp::from_second(15 * 60).unwrap())
        );
    }

    #[tokio::test]
    async fn test_done_cancels_schedule() {
        let (service, _tx) = service(true, 1);
        service.handle_event(PrintEvent::Started, Timestamp::UNIX_EPOCH).await;
        assert!(service.next_message().is_some());

        // No sender is connected, so nothing is delivered
        let sent = service
            .handle_event(
                PrintEvent::Done {
                    name: "benchy.gcode".to_string(),
                    elapsed: Some(60),
                },
                Timestamp::UNIX_EPOCH,
            )
            .await;
        assert!(!sent);
        assert!(service.next_message().is_none());
    }

    #[tokio::test]
    async fn test_progress_waits_for_schedule() {
        let (service, _tx) = service(true, 10);
        // Nothing scheduled yet
        assert!(service.due_progress_message(&update(Some(0), Some(7200)), &at(10_000)).is_none());

        service.handle_event(PrintEvent::Started, Timestamp::UNIX_EPOCH).await;

        // Not due before the interval has passed
        assert!(service.due_progress_message(&update(Some(60), Some(7200)), &at(599)).is_none());

        let message = service
            .due_progress_message(&update(Some(600), Some(7200)), &at(600))
            .unwrap();
        assert_eq!(message.filename, "benchy-42.jpg");
        assert_eq!(service.next_message(), Some(Timestamp::from_second(1200).unwrap()));

        // Immediately after sending it is not due again
        assert!(service.due_progress_message(&update(Some(601), Some(7199)), &at(601)).is_none());
    }

    #[tokio::test]
    async fn test_progress_skipped_without_times_but_rescheduled() {
        let (service, _tx) = service(true, 1);
        service.handle_event(PrintEvent::Started, Timestamp::UNIX_EPOCH).await;

        assert!(service.due_progress_message(&update(None, Some(600)), &at(60)).is_none());
        assert_eq!(service.next_message(), Some(Timestamp::from_second(120).unwrap()));

        assert!(service.due_progress_message(&update(Some(120), None), &at(120)).is_none());
        assert_eq!(service.next_message(), Some(Timestamp::from_second(180).unwrap()));
    }

    #[tokio::test]
    async fn test_trailing_message_skipped_when_nearly_done() {
        let (service, _tx) = service(true, 5);
        service.handle_event(PrintEvent::Started, Timestamp::UNIX_EPOCH).await;

        assert!(service.due_progress_message(&update(Some(300), Some(299)), &at(300)).is_none());
        assert!(service.due_progress_message(&update(Some(600), Some(300)), &at(600)).is_some());
    }

    #[tokio::test]
    async fn test_disabling_periodic_updates_stops_messages() {
        let (service, tx) = service(true, 1);
        service.handle_event(PrintEvent::Started, Timestamp::UNIX_EPOCH).await;

        tx.send_modify(|s| s.periodic_updates = false);
        assert!(service.due_progress_message(&update(Some(60), Some(600)), &at(60)).is_none());
    }

    #[tokio::test]
    async fn test_huge_interval_never_fires() {
        let (service, _tx) = service(true, u64::MAX);
        service.handle_event(PrintEvent::Started, Timestamp::from_second(1000).unwrap()).await;

        for now in [1000, 1001, 1002, 100_000] {
            assert!(service.due_progress_message(&update(Some(now), Some(0)), &at(now)).is_none());
        }
    }

    #[tokio::test]
    async fn test_reset_schedule() {
        let (service, tx) = service(true, 10);
        service.reset_schedule(Timestamp::from_second(50).unwrap());
        assert!(service.next_message().is_none());

        service.handle_event(PrintEvent::Started, Timestamp::UNIX_EPOCH).await;
        tx.send_modify(|s| s.periodic_updates_interval = 2);
        service.reset_schedule(Timestamp::from_second(50).unwrap());
        assert_eq!(service.next_message(), Some(Timestamp::from_second(170).unwrap()));
    }
}
