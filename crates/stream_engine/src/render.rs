use crate::Event;

/// Turns decoded events into rows for the viewer.
pub trait RowRenderer: Send + Sync {
    fn render(&self, event: &Event) -> String;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RowFormat {
    /// `<tr>` element with escaped cells.
    #[default]
    Html,
    /// Single terminal line.
    Text,
}

/// Date, summary, user, and connector/context/action columns.
#[derive(Debug, Clone, Copy, Default)]
pub struct TableRowRenderer {
    format: RowFormat,
}

impl TableRowRenderer {
    pub fn new(format: RowFormat) -> Self {
        Self { format }
    }

    fn cells(event: &Event) -> [String; 4] {
        let origin = ["connector", "context", "action"]
            .iter()
            .map(|field| event.text(field).unwrap_or_else(|| "-".to_string()))
            .collect::<Vec<_>>()
            .join(" / ");
        let user = match (event.text("user_id"), event.meta.get("user_login")) {
            (_, Some(serde_json::Value::String(login))) if !login.is_empty() => login.clone(),
            (Some(id), _) => format!("user {id}"),
            (None, _) => "-".to_string(),
        };
        [
            event.text("created").unwrap_or_default(),
            event.text("summary").unwrap_or_default(),
            user,
            origin,
        ]
    }
}

impl RowRenderer for TableRowRenderer {
    fn render(&self, event: &Event) -> String {
        let cells = Self::cells(event);
        match self.format {
            RowFormat::Html => {
                let mut row = String::from("<tr>");
                for cell in &cells {
                    row.push_str("<td>");
                    row.push_str(&html_escape::encode_text(cell));
                    row.push_str("</td>");
                }
                row.push_str("</tr>");
                row
            }
            RowFormat::Text => cells
                .iter()
                .map(|cell| cell.replace(['\n', '\r', '\t'], " "))
                .collect::<Vec<_>>()
                .join("\t"),
        }
    }
}
