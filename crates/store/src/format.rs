//! Human-readable renderings of store results, as returned by the tools.

use itembox_core::Item;

const SEPARATOR: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━";

/// Message returned when a listing is empty.
pub const NO_ITEMS: &str = "📭 No items found in database.";

/// Confirmation for a freshly inserted item.
pub fn format_inserted(id: i64, name: &str) -> String {
    format!("✅ Item added successfully!\nID: {}\nName: {}", id, name)
}

/// Render a listing. Empty description/value lines are omitted.
pub fn format_item_list(items: &[Item]) -> String {
    if items.is_empty() {
        return NO_ITEMS.to_string();
    }

    let mut lines = Vec::new();
    for item in items {
        lines.push(SEPARATOR.to_string());
        lines.push(format!("ID: {}", item.id));
        lines.push(format!("Name: {}", item.name));
        if let Some(description) = item.description() {
            lines.push(format!("Description: {}", description));
        }
        if let Some(value) = item.value() {
            lines.push(format!("Value: {}", value));
        }
        lines.push(format!("Created: {}", item.created_at));
    }
    lines.push(SEPARATOR.to_string());

    format!(
        "📋 Database Items (Total: {}):\n\n{}\n",
        items.len(),
        lines.join("\n")
    )
}

/// Render a single item. Missing description/value show as `N/A`.
pub fn format_item_detail(item: &Item) -> String {
    format!(
        "✅ Item Details:\n{sep}\nID: {}\nName: {}\nDescription: {}\nValue: {}\nCreated: {}\n{sep}",
        item.id,
        item.name,
        item.description().unwrap_or("N/A"),
        item.value().unwrap_or("N/A"),
        item.created_at,
        sep = SEPARATOR,
    )
}

pub fn format_not_found(id: i64) -> String {
    format!("❌ Item with ID {} not found.", id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn widget(id: i64, description: &str, value: &str) -> Item {
        Item {
            id,
            name: "Widget".to_string(),
            description: Some(description.to_string()),
            value: Some(value.to_string()),
            created_at: NaiveDateTime::parse_from_str("2025-03-01 12:00:00", "%Y-%m-%d %H:%M:%S")
                .unwrap(),
        }
    }

    #[test]
    fn empty_list_is_exactly_the_no_items_message() {
        assert_eq!(format_item_list(&[]), NO_ITEMS);
    }

    #[test]
    fn list_skips_empty_optional_fields() {
        let text = format_item_list(&[widget(1, "", "")]);
        assert!(text.starts_with("📋 Database Items (Total: 1):"));
        assert!(text.contains("ID: 1\nName: Widget\nCreated: 2025-03-01 12:00:00\n"));
        assert!(!text.contains("Description:"));
        assert!(!text.contains("Value:"));
        assert!(text.ends_with(&format!("{}\n", SEPARATOR)));
    }

    #[test]
    fn list_renders_the_full_block() {
        let text = format_item_list(&[widget(7, "Blue", "")]);
        let expected = format!(
            "📋 Database Items (Total: 1):\n\n{sep}\nID: 7\nName: Widget\nDescription: Blue\nCreated: 2025-03-01 12:00:00\n{sep}\n",
            sep = SEPARATOR
        );
        assert_eq!(text, expected);
    }

    #[test]
    fn list_counts_items() {
        let text = format_item_list(&[widget(2, "b", "2"), widget(1, "a", "1")]);
        assert!(text.contains("(Total: 2)"));
        assert_eq!(text.matches(SEPARATOR).count(), 3);
        assert!(text.find("ID: 2").unwrap() < text.find("ID: 1").unwrap());
    }

    #[test]
    fn detail_renders_all_fields() {
        let text = format_item_detail(&widget(1, "A small widget", "9.99"));
        assert!(text.contains("Name: Widget"));
        assert!(text.contains("Description: A small widget"));
        assert!(text.contains("Value: 9.99"));
        assert!(text.contains("Created: 2025-03-01 12:00:00"));
    }

    #[test]
    fn detail_uses_na_for_missing_fields() {
        let text = format_item_detail(&widget(3, "", ""));
        assert!(text.contains("Description: N/A"));
        assert!(text.contains("Value: N/A"));
    }

    #[test]
    fn inserted_and_not_found_messages() {
        assert_eq!(
            format_inserted(4, "Gadget"),
            "✅ Item added successfully!\nID: 4\nName: Gadget"
        );
        assert_eq!(format_not_found(99), "❌ Item with ID 99 not found.");
    }
}
