use std::env;
use std::fs;

const HOSTNAME_FILE: &str = "/etc/hostname";

pub fn local_hostname() -> Option<String> {
    fn non_empty(name: String) -> Option<String> {
        let name = name.trim();
        (!name.is_empty()).then(|| name.to_string())
    }

    env::var("HOSTNAME")
        .ok()
        .and_then(non_empty)
        .or_else(|| fs::read_to_string(HOSTNAME_FILE).ok().and_then(non_empty))
}

pub fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
