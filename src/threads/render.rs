use pulldown_cmark::{Event, Parser, Tag, TagEnd};

use crate::{include_res, profiles::generate_avatar, res::escape_html};

use super::{Message, Reply};

pub fn render(messages: &[Message]) -> String {
    render_with_open_form(messages, None)
}

/// Newest first by id. Only top level messages get a reply button and form;
/// `open_form` picks the one form shown expanded.
pub fn render_with_open_form(messages: &[Message], open_form: Option<i64>) -> String {
    if messages.is_empty() {
        return include_res!(str, "/pages/guestbook/empty.html").to_owned();
    }

    let mut sorted: Vec<&Message> = messages.iter().collect();
    sorted.sort_by(|a, b| b.id.cmp(&a.id));

    let items: String = sorted
        .into_iter()
        .map(|msg| render_message(msg, open_form == Some(msg.id)))
        .collect();

    include_res!(str, "/pages/guestbook/list.html").replace("{messages}", &items)
}

fn render_message(msg: &Message, form_open: bool) -> String {
    let replies: String = msg.replies().iter().map(render_reply).collect();

    include_res!(str, "/pages/guestbook/message.html")
        .replace("{id}", &msg.id.to_string())
        .replace("{header}", &render_header(&msg.name, &msg.timestamp))
        .replace("{content}", &render_content(&msg.content))
        .replace("{reply_form}", &render_reply_form(msg.id, form_open))
        .replace("{replies}", &replies)
}

fn render_reply(reply: &Reply) -> String {
    include_res!(str, "/pages/guestbook/reply.html")
        .replace("{id}", &reply.id.to_string())
        .replace("{header}", &render_header(&reply.name, &reply.timestamp))
        .replace("{content}", &render_content(&reply.content))
}

fn render_header(name: &str, timestamp: &str) -> String {
    let name = if name.is_empty() { "Anonymous" } else { name };
    let avatar = generate_avatar(Some(name));

    include_res!(str, "/pages/guestbook/header.html")
        .replace("{avatar_color}", &escape_html(&avatar.color))
        .replace("{avatar_char}", &escape_html(&avatar.letter))
        .replace("{name}", &escape_html(name))
        .replace("{time}", &escape_html(timestamp))
}

fn render_reply_form(id: i64, open: bool) -> String {
    let (class, hidden, autofocus) = if open {
        (" show", "", " autofocus")
    } else {
        ("", " hidden", "")
    };

    include_res!(str, "/pages/guestbook/reply_form.html")
        .replace("{class}", class)
        .replace("{hidden}", hidden)
        .replace("{autofocus}", autofocus)
        .replace("{id}", &id.to_string())
}

/// Markdown with raw HTML shown as text and links/images reduced to their text.
fn render_content(content: &str) -> String {
    let parser = Parser::new(content).filter_map(|event| match event {
        Event::Html(html) | Event::InlineHtml(html) => Some(Event::Text(html)),
        Event::Start(Tag::Link { .. } | Tag::Image { .. }) => None,
        Event::End(TagEnd::Link | TagEnd::Image) => None,
        _ => Some(event),
    });

    let mut html = String::new();
    pulldown_cmark::html::push_html(&mut html, parser);
    html.replace('{', "&#123;").replace('}', "&#125;")
}
