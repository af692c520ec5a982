// src/embed.rs
// Pure formatting: one CTFtime event in, one webhook message out. No IO.

use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;

use crate::source::CtfEvent;

pub const EMBED_COLOR: u32 = 5_814_783;
pub const FOOTER_TEXT: &str = "CTF Time Auto Notification | Data source: CTFtime.org";

// CTFtime renders timestamps as "2025-06-01T00:00:00+0000".
const SOURCE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%z";
const DISPLAY_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";
const DISPLAY_TZ_SUFFIX: &str = " (GMT+8 Taipei Time)";
const GMT8_SECS: i32 = 8 * 3600;

/// Body POSTed to the webhook: `{content, embeds: [..]}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WebhookMessage {
    pub content: String,
    pub embeds: Vec<Embed>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Embed {
    pub title: String,
    pub url: String,
    pub color: u32,
    pub description: String,
    pub fields: Vec<EmbedField>,
    pub footer: EmbedFooter,
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<EmbedThumbnail>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmbedFooter {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmbedThumbnail {
    pub url: String,
}

fn field(name: &str, value: String) -> EmbedField {
    EmbedField {
        name: name.to_string(),
        value,
        inline: true,
    }
}

fn display_time(dt: DateTime<FixedOffset>) -> String {
    let tz = FixedOffset::east_opt(GMT8_SECS).expect("static UTC+8 offset");
    format!(
        "{}{}",
        dt.with_timezone(&tz).format(DISPLAY_TIME_FORMAT),
        DISPLAY_TZ_SUFFIX
    )
}

fn duration_text(start: DateTime<FixedOffset>, finish: DateTime<FixedOffset>) -> String {
    let duration = finish.signed_duration_since(start);
    let days = duration.num_days();
    let hours = duration.num_hours() - days * 24;
    if days > 0 {
        format!("{days} days {hours} hours")
    } else {
        format!("{hours} hours")
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Build the full notification for one event.
///
/// Timestamp parse failures are an error for this event only; the caller
/// skips the event and carries on with the rest of the batch.
pub fn build_message(event: &CtfEvent, now: DateTime<Utc>) -> Result<WebhookMessage> {
    let start = DateTime::parse_from_str(&event.start, SOURCE_TIME_FORMAT)
        .with_context(|| format!("event {}: bad start timestamp {:?}", event.id, event.start))?;
    let finish = DateTime::parse_from_str(&event.finish, SOURCE_TIME_FORMAT)
        .with_context(|| format!("event {}: bad finish timestamp {:?}", event.id, event.finish))?;

    let start_display = display_time(start);

    let weight = event
        .weight
        .map(|w| format!("{w:.2}"))
        .unwrap_or_else(|| "Unknown".to_string());

    // Prefer the organizer's own site over the CTFtime page.
    let website = match non_empty(event.ctf_url.as_deref()) {
        Some(u) => format!("[Click to visit]({u})"),
        None => format!("[CTFtime page]({})", event.url),
    };

    let description = match non_empty(event.description.as_deref()) {
        Some(d) => d.to_string(),
        None => "No description".to_string(),
    };

    let thumbnail = non_empty(event.logo.as_deref()).map(|url| EmbedThumbnail {
        url: url.to_string(),
    });

    let embed = Embed {
        title: event.title.clone(),
        url: event.url.clone(),
        color: EMBED_COLOR,
        description,
        fields: vec![
            field("Start Time", start_display.clone()),
            field("End Time", display_time(finish)),
            field("Duration", duration_text(start, finish)),
            field("Weight", weight),
            field("Official Website", website),
            field(
                "Format",
                event.format.clone().unwrap_or_else(|| "Unknown".to_string()),
            ),
        ],
        footer: EmbedFooter {
            text: FOOTER_TEXT.to_string(),
        },
        timestamp: now.to_rfc3339(),
        thumbnail,
    };

    let content = format!(
        "**New CTF Event Notification** \n{} will start at {}",
        event.title, start_display
    );

    Ok(WebhookMessage {
        content,
        embeds: vec![embed],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_event() -> CtfEvent {
        CtfEvent {
            id: 42,
            title: "Example CTF".into(),
            url: "https://ctftime.org/event/42".into(),
            ctf_url: None,
            start: "2025-06-01T00:00:00+0000".into(),
            finish: "2025-06-02T00:00:00+0000".into(),
            weight: Some(35.5),
            format: Some("Jeopardy".into()),
            logo: None,
            description: None,
        }
    }

    fn field_value<'a>(msg: &'a WebhookMessage, name: &str) -> &'a str {
        msg.embeds[0]
            .fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.value.as_str())
            .unwrap_or_else(|| panic!("missing field {name}"))
    }

    #[test]
    fn whole_day_duration_renders_days_and_hours() {
        let msg = build_message(&sample_event(), Utc::now()).unwrap();
        assert_eq!(field_value(&msg, "Duration"), "1 days 0 hours");
    }

    #[test]
    fn sub_day_duration_renders_hours_only() {
        let mut ev = sample_event();
        ev.finish = "2025-06-01T08:30:00+0000".into();
        let msg = build_message(&ev, Utc::now()).unwrap();
        assert_eq!(field_value(&msg, "Duration"), "8 hours");
    }

    #[test]
    fn weight_renders_two_decimals_or_unknown() {
        let msg = build_message(&sample_event(), Utc::now()).unwrap();
        assert_eq!(field_value(&msg, "Weight"), "35.50");

        let mut ev = sample_event();
        ev.weight = None;
        let msg = build_message(&ev, Utc::now()).unwrap();
        assert_eq!(field_value(&msg, "Weight"), "Unknown");
    }

    #[test]
    fn times_are_shifted_to_gmt_plus_8() {
        let msg = build_message(&sample_event(), Utc::now()).unwrap();
        assert_eq!(
            field_value(&msg, "Start Time"),
            "2025-06-01 08:00 (GMT+8 Taipei Time)"
        );
        assert_eq!(
            field_value(&msg, "End Time"),
            "2025-06-02 08:00 (GMT+8 Taipei Time)"
        );
    }

    #[test]
    fn source_offset_is_respected_before_conversion() {
        let mut ev = sample_event();
        ev.start = "2025-06-01T10:00:00+0200".into();
        let msg = build_message(&ev, Utc::now()).unwrap();
        // 10:00+02:00 is 08:00 UTC, i.e. 16:00 in GMT+8.
        assert_eq!(
            field_value(&msg, "Start Time"),
            "2025-06-01 16:00 (GMT+8 Taipei Time)"
        );
    }

    #[test]
    fn organizer_url_wins_over_ctftime_page() {
        let mut ev = sample_event();
        ev.ctf_url = Some("https://example.ctf".into());
        let msg = build_message(&ev, Utc::now()).unwrap();
        assert_eq!(
            field_value(&msg, "Official Website"),
            "[Click to visit](https://example.ctf)"
        );

        ev.ctf_url = Some(String::new()); // blank counts as absent
        let msg = build_message(&ev, Utc::now()).unwrap();
        assert_eq!(
            field_value(&msg, "Official Website"),
            "[CTFtime page](https://ctftime.org/event/42)"
        );
    }

    #[test]
    fn missing_description_and_logo_get_no_placeholders() {
        let msg = build_message(&sample_event(), Utc::now()).unwrap();
        assert_eq!(msg.embeds[0].description, "No description");
        assert!(msg.embeds[0].thumbnail.is_none());

        let json = serde_json::to_value(&msg).unwrap();
        assert!(json["embeds"][0].get("thumbnail").is_none());
    }

    #[test]
    fn logo_becomes_thumbnail_when_present() {
        let mut ev = sample_event();
        ev.logo = Some("https://ctftime.org/logo/42.png".into());
        let msg = build_message(&ev, Utc::now()).unwrap();
        assert_eq!(
            msg.embeds[0].thumbnail.as_ref().unwrap().url,
            "https://ctftime.org/logo/42.png"
        );
    }

    #[test]
    fn content_leads_with_title_and_start_time() {
        let msg = build_message(&sample_event(), Utc::now()).unwrap();
        assert_eq!(
            msg.content,
            "**New CTF Event Notification** \nExample CTF will start at 2025-06-01 08:00 (GMT+8 Taipei Time)"
        );
    }

    #[test]
    fn unparseable_timestamp_is_an_error() {
        let mut ev = sample_event();
        ev.start = "next tuesday".into();
        assert!(build_message(&ev, Utc::now()).is_err());
    }
}
