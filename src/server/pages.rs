use crate::builder::{ Notice, NoticeLevel, Session };
use crate::editor::RecentWindow;
use crate::models::chat::Role;
use maud::{ html, Markup, PreEscaped, DOCTYPE };

pub const TITLE: &str = "Dataset Creator and Manager for Fine-tuning Models";

const STYLE: &str = r#"
body { font-family: sans-serif; max-width: 960px; margin: 2em auto; }
.tab { margin-right: 1em; }
.tab.active { font-weight: bold; }
.notice { padding: .5em; margin: .5em 0; }
.success { background: #e6f4ea; }
.warning { background: #fff4e5; }
.error { background: #fdecea; }
label { display: block; margin-top: .5em; }
input[type=text], textarea { width: 100%; }
table { border-collapse: collapse; width: 100%; }
td, th { border: 1px solid #ccc; padding: .3em; text-align: left; vertical-align: top; }
"#;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Tab {
    Create,
    Manage,
}

fn tab_link(active: Tab, target: Tab, href: &str, label: &str) -> Markup {
    let class = if active == target { "tab active" } else { "tab" };
    html! {
        a class=(class) href=(href) { (label) }
    }
}

fn notice_class(level: NoticeLevel) -> &'static str {
    match level {
        NoticeLevel::Success => "notice success",
        NoticeLevel::Warning => "notice warning",
        NoticeLevel::Error => "notice error",
    }
}

fn layout(tab: Tab, repo: &str, notices: &[Notice], body: Markup) -> String {
    html! {
        (DOCTYPE)
        html {
            head {
                meta charset="utf-8";
                title { (TITLE) }
                style { (PreEscaped(STYLE)) }
            }
            body {
                h1 { (TITLE) }
                p { "Repository: " (repo) }
                nav {
                    (tab_link(tab, Tab::Create, "/create", "Create Conversation"))
                    (tab_link(tab, Tab::Manage, "/manage", "Manage Dataset"))
                }
                @for notice in notices {
                    div class=(notice_class(notice.level)) { (notice.text) }
                }
                (body)
            }
        }
    }.into_string()
}

pub fn create_page(repo: &str, session: &Session, notices: &[Notice]) -> String {
    let builder = &session.builder;
    let fields = [(Role::User, "User"), (Role::Assistant, "Assistant")];

    let body = html! {
        h2 { "Create Conversation" }
        p { "Conversation #" (session.conversation_count) }
        form method="post" action="/create" {
            label {
                "System message:"
                textarea name="system" rows="3" { (builder.system_message()) }
            }
            @for pair in 1..=builder.pair_count() {
                @for (role, label) in fields {
                    label {
                        (label) " message " (pair) ":"
                        input
                            type="text"
                            name=(format!("{}_{}", role, pair))
                            value=(builder.turn(pair, role).map(|t| t.content.as_str()).unwrap_or_default());
                    }
                }
            }
            p {
                button name="action" value="save" { "Save" }
                button name="action" value="add_pair" { "Add new message pair" }
                @if builder.pair_count() > 0 {
                    button name="action" value="clear" { "Clear all messages" }
                }
                button name="action" value="commit" { "Add Conversation to Dataset" }
            }
        }
    };

    layout(Tab::Create, repo, notices, body)
}

pub fn manage_page(
    repo: &str,
    window: Option<&RecentWindow>,
    window_size: usize,
    notices: &[Notice]
) -> String {
    let rows = window.map(|w| w.rows.as_slice()).unwrap_or_default();
    let newest = rows.len().min(window_size).saturating_sub(1);

    let body = html! {
        h2 { "Manage Dataset" }
        @if rows.is_empty() {
            p { "No data available." }
        } @else {
            @if let Some(w) = window {
                p { "Showing the last " (rows.len()) " of " (w.total) " records." }
            }
            form method="post" action="/manage/delete" {
                p { "Select rows to delete (0 is the oldest displayed, " (newest) " is the newest):" }
                table {
                    tr { th {} th { "#" } th { "System" } th { "User" } th { "Assistant" } }
                    @for (i, row) in rows.iter().enumerate() {
                        tr {
                            td { input type="checkbox" name="row" value=(i); }
                            td { (i) }
                            td { (row.system) }
                            td { (row.users) }
                            td { (row.assistants) }
                        }
                    }
                }
                p { button { "Delete Selected Rows" } }
            }
        }
    };

    layout(Tab::Manage, repo, notices, body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::chat::RecordRow;

    #[test]
    fn operator_text_is_escaped() {
        let session = Session::new("be <kind> & \"brief\"");
        let html = create_page("owner/<repo>", &session, &[Notice::error("<script>")]);
        assert!(html.contains("be &lt;kind&gt; &amp; &quot;brief&quot;"));
        assert!(html.contains("owner/&lt;repo&gt;"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn create_page_renders_one_field_pair_per_pair() {
        let mut session = Session::new("s");
        session.builder.add_pair();
        session.builder.add_pair();
        session.builder.set_turn(2, Role::Assistant, "a \"quoted\"").unwrap();
        let html = create_page("owner/repo", &session, &[]);

        assert!(html.contains("name=\"user_2\""));
        assert!(html.contains("name=\"assistant_2\" value=\"a &quot;quoted&quot;\""));
        assert!(!html.contains("name=\"user_3\""));
        assert!(html.contains("Clear all messages"));
    }

    #[test]
    fn fresh_session_has_no_clear_button() {
        let html = create_page("owner/repo", &Session::new("s"), &[]);
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(!html.contains("Clear all messages"));
        assert!(html.contains("Conversation #1"));
    }

    #[test]
    fn manage_page_lists_rows_and_notices() {
        let window = RecentWindow {
            rows: vec![RecordRow {
                system: "s".into(),
                users: "q1 | q2".into(),
                assistants: "a1 | a2".into(),
            }],
            total: 7,
            ..Default::default()
        };
        let html = manage_page("owner/repo", Some(&window), 10, &[Notice::success("done")]);
        assert!(html.contains("<td>q1 | q2</td>"));
        assert!(html.contains("name=\"row\" value=\"0\""));
        assert!(html.contains("Showing the last 1 of 7 records."));
        assert!(html.contains("class=\"notice success\""));
    }

    #[test]
    fn empty_manage_page() {
        let html = manage_page("owner/repo", None, 10, &[Notice::error("boom")]);
        assert!(html.contains("No data available."));
        assert!(html.contains("<div class=\"notice error\">boom</div>"));
        assert!(!html.contains("<table>"));
    }
}
