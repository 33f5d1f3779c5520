use include_dir::{include_dir, Dir};
use tally_shared::Tally;

use crate::utils::escape_html;

static VIEWS: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/views");

const INDEX_VIEW: &str = "index.html";

#[derive(Debug, thiserror::Error)]
pub enum ViewError {
    #[error("View {0} is not bundled")]
    Missing(&'static str),
    #[error("View {0} is not valid UTF-8")]
    Encoding(&'static str),
}

fn view(name: &'static str) -> Result<&'static str, ViewError> {
    VIEWS
        .get_file(name)
        .ok_or(ViewError::Missing(name))?
        .contents_utf8()
        .ok_or(ViewError::Encoding(name))
}

pub fn render_index(title: &str, tally: &Tally) -> Result<String, ViewError> {
    let mut rows = String::new();
    let mut buttons = String::new();

    for entry in tally.entries() {
        let choice = escape_html(&entry.choice);
        rows.push_str(&format!(
            "    <tr><td>{choice}</td><td class=\"count\">{}</td></tr>\n",
            entry.count
        ));
        buttons.push_str(&format!(
            "    <button type=\"submit\" name=\"vote\" value=\"{choice}\">{choice}</button>\n"
        ));
    }

    Ok(view(INDEX_VIEW)?
        .replace("{{title}}", &escape_html(title))
        .replace("{{rows}}", rows.trim_end())
        .replace("{{buttons}}", buttons.trim_end()))
}
