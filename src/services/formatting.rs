//! Text helpers for print notifications.

use std::collections::HashMap;
use std::sync::LazyLock;

use jiff::{SignedDuration, Zoned};
use regex::{Captures, Regex};

const SECONDS_PER_DAY: i64 = 86_400;
const SECONDS_PER_HOUR: i64 = 3_600;
const SECONDS_PER_MINUTE: i64 = 60;

const ETA_FORMAT: &str = "%H:%M";
const ETA_DAYS_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Shown in place of a value that is not known.
pub const UNKNOWN: &str = "?";

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{|\}\}|\{(\w+)\}").unwrap());

/// Render a duration as `"{h}h {m}min"`, or `"{d}d {h}h {m}min"` from one
/// day on. Seconds are dropped; negative input counts as zero.
pub fn format_duration(seconds: i64) -> String {
    let seconds = seconds.max(0);
    let days = seconds / SECONDS_PER_DAY;
    let hours = (seconds % SECONDS_PER_DAY) / SECONDS_PER_HOUR;
    let minutes = (seconds % SECONDS_PER_HOUR) / SECONDS_PER_MINUTE;

    if days > 0 {
        format!("{}d {}h {}min", days, hours, minutes)
    } else {
        format!("{}h {}min", hours, minutes)
    }
}

/// Wall-clock time `seconds` after `now`, in `now`'s time zone.
///
/// `HH:MM` when within a day, `YYYY-MM-DD HH:MM` beyond that.
pub fn format_eta(seconds: i64, now: &Zoned) -> String {
    let target = match now.checked_add(SignedDuration::from_secs(seconds)) {
        Ok(target) => target,
        Err(e) => {
            tracing::debug!(seconds, error = %e, "ETA out of range");
            return UNKNOWN.to_string();
        }
    };

    let format = if seconds > SECONDS_PER_DAY {
        ETA_DAYS_FORMAT
    } else {
        ETA_FORMAT
    };
    target.strftime(format).to_string()
}

/// Substitute `{name}` placeholders.
///
/// Unknown placeholders are left as they are; `{{` and `}}` render as
/// literal braces.
pub fn render_template(template: &str, placeholders: &HashMap<&str, String>) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures<'_>| match caps.get(1) {
            Some(name) => placeholders
                .get(name.as_str())
                .cloned()
                .unwrap_or_else(|| caps[0].to_string()),
            None => caps[0][..1].to_string(),
        })
        .into_owned()
}

/// File name without its directory and final extension.
pub fn file_stem(path: &str) -> &str {
    let name = path.rsplit(['/', '\\']).next().unwrap_or(path);
    match name.rfind('.') {
        Some(0) | None => name,
        Some(idx) => &name[..idx],
    }
}

/// File name without its directory.
pub fn file_name(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}
