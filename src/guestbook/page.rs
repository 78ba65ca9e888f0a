use crate::{
    include_res,
    res::escape_html,
    stats::{format_number, StatsRecorder},
};

use super::{Alert, Guestbook, Outcome};

pub async fn render_page(guestbook: &Guestbook, outcome: &Outcome, recorder: &StatsRecorder) -> String {
    let section = if guestbook.state.visible {
        render_section(guestbook, outcome).await
    } else {
        include_res!(str, "/pages/guestbook/closed.html").to_owned()
    };

    let stats = &recorder.stats;
    include_res!(str, "/pages/index.html")
        .replace("{scan_count}", &format_number(stats.total_scans))
        .replace("{visit_count}", &format_number(stats.total_visits))
        .replace("{message_count}", &format_number(stats.total_messages))
        .replace("{guestbook}", &section)
}

async fn render_section(guestbook: &Guestbook, outcome: &Outcome) -> String {
    let alert = match &outcome.alert {
        Some(Alert::Invalid(err)) => render_alert("error", &err.to_string()),
        Some(Alert::Notice(text)) => render_alert("info", text),
        None => String::new(),
    };
    let toast = outcome
        .toast
        .map(|text| include_res!(str, "/pages/guestbook/toast.html").replace("{text}", &escape_html(text)))
        .unwrap_or_default();
    let autofocus = if outcome.focus_message { " autofocus" } else { "" };

    include_res!(str, "/pages/guestbook/section.html")
        .replace("{alert}", &alert)
        .replace("{toast}", &toast)
        .replace("{autofocus}", autofocus)
        .replace("{name_draft}", &escape_html(&guestbook.state.name_draft))
        .replace("{content_draft}", &escape_html(&guestbook.state.content_draft))
        .replace("{threads}", &guestbook.threads_html().await)
}

fn render_alert(kind: &str, text: &str) -> String {
    include_res!(str, "/pages/guestbook/alert.html")
        .replace("{kind}", kind)
        .replace("{text}", &escape_html(text))
}
