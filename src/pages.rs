//! Server-rendered HTML for the browser routes. The pages are deliberately
//! plain; user-supplied text is escaped before interpolation.

use crate::models::{Message, User};

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

fn page(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>{title}</title></head>
<body>
{body}
</body>
</html>"#
    )
}

pub fn login_page(error: Option<&str>) -> String {
    let error_html = match error {
        Some(e) => format!(r#"<p class="error">{}</p>"#, escape(e)),
        None => String::new(),
    };
    page(
        "Login",
        &format!(
            r#"<h1>Login</h1>
{error_html}
<form method="post" action="/login">
  <input type="text" name="username" placeholder="username" autofocus>
  <button type="submit">Log in</button>
</form>"#
        ),
    )
}

pub fn welcome_page(users: &[User], current_user: &str) -> String {
    let mut items = String::new();
    for user in users {
        let name = escape(&user.username);
        if user.username == current_user {
            items.push_str(&format!("  <li>{name} (you)</li>\n"));
        } else {
            items.push_str(&format!("  <li><a href=\"/chat/{name}\">{name}</a></li>\n"));
        }
    }
    page(
        "Welcome",
        &format!(
            r#"<h1>Welcome, {}</h1>
<ul>
{items}</ul>
<p><a href="/logout">Log out</a></p>"#,
            escape(current_user)
        ),
    )
}

pub fn chat_page(
    messages: &[Message],
    current_user: &str,
    other_user: &str,
    error: Option<&str>,
) -> String {
    let mut thread = String::new();
    for message in messages {
        thread.push_str(&format!(
            "  <li><strong>{}</strong>: {}</li>\n",
            escape(&message.from_user),
            escape(&message.message_text)
        ));
    }
    let error_html = match error {
        Some(e) => format!(r#"<p class="error">{}</p>"#, escape(e)),
        None => String::new(),
    };
    let other = escape(other_user);
    page(
        &format!("Chat with {other}"),
        &format!(
            r#"<h1>{} &mdash; chat with {other}</h1>
<ul>
{thread}</ul>
{error_html}
<form method="post" action="/chat/{other}">
  <input type="text" name="message" placeholder="message" autofocus>
  <button type="submit">Send</button>
</form>
<p><a href="/welcome">Back to roster</a></p>"#,
            escape(current_user)
        ),
    )
}
