//! Text rendering shared by several commands.

use crate::entities::{DeliveryType, order_item};

/// Discord caps message content at this many characters.
pub const MAX_MESSAGE_LEN: usize = 2000;

/// Renders one delivered item as a single line.
#[must_use]
pub fn render_item(delivery_type: DeliveryType, item: &order_item::Model) -> String {
    let body = match delivery_type {
        DeliveryType::Code => format!("`{}`", item.code.as_deref().unwrap_or("-")),
        DeliveryType::Account => format!(
            "Email: `{}` / Password: `{}`",
            item.email.as_deref().unwrap_or("-"),
            item.password.as_deref().unwrap_or("-")
        ),
        DeliveryType::Text => format!("`{}`", item.text.as_deref().unwrap_or("-")),
    };
    match item.note.as_deref() {
        Some(note) => format!("{body} ({note})"),
        None => body,
    }
}

/// Room left for a header around one page of items.
pub const PAGE_RESERVE: usize = 200;

/// A run of numbered item lines that fits in one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemPage {
    /// Rendered lines, numbered across the whole order
    pub text: String,
    /// Number of items on this page
    pub count: usize,
}

/// Splits delivered items into pages of at most `budget` characters each.
///
/// Every item lands on exactly one page, in order. A single line longer than the
/// budget gets a page of its own.
#[must_use]
pub fn item_pages(
    delivery_type: DeliveryType,
    items: &[order_item::Model],
    budget: usize,
) -> Vec<ItemPage> {
    let mut pages = Vec::new();
    let mut current = ItemPage {
        text: String::new(),
        count: 0,
    };
    let mut current_len = 0;
    for (i, item) in items.iter().enumerate() {
        let line = format!("{}. {}\n", i + 1, render_item(delivery_type, item));
        let line_len = line.chars().count();
        if current.count > 0 && current_len + line_len > budget {
            pages.push(std::mem::replace(
                &mut current,
                ItemPage {
                    text: String::new(),
                    count: 0,
                },
            ));
            current_len = 0;
        }
        current.text.push_str(&line);
        current.count += 1;
        current_len += line_len;
    }
    if current.count > 0 {
        pages.push(current);
    }
    pages
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    fn item(code: &str, note: Option<&str>) -> order_item::Model {
        order_item::Model {
            id: 1,
            order_id: 1,
            code: Some(code.to_string()),
            email: None,
            password: None,
            text: None,
            note: note.map(ToString::to_string),
        }
    }

    #[test]
    fn test_render_item() {
        assert_eq!(
            render_item(DeliveryType::Code, &item("ABC", Some("EU"))),
            "`ABC` (EU)"
        );
        assert_eq!(render_item(DeliveryType::Text, &item("ABC", None)), "`-`");
    }

    fn account(n: usize) -> order_item::Model {
        order_item::Model {
            id: i64::try_from(n).unwrap(),
            order_id: 1,
            code: None,
            email: Some(format!("customer{n:02}@example.com")),
            password: Some(format!("Pw-{n:02}-secret")),
            text: None,
            note: None,
        }
    }

    #[test]
    fn test_item_pages_cover_large_account_order() {
        let items: Vec<_> = (1..=40).map(account).collect();
        let budget = MAX_MESSAGE_LEN - PAGE_RESERVE;
        let pages = item_pages(DeliveryType::Account, &items, budget);

        assert!(pages.len() > 1);
        assert!(pages.iter().all(|p| p.text.chars().count() <= budget));
        assert_eq!(pages.iter().map(|p| p.count).sum::<usize>(), 40);

        let all: String = pages.iter().map(|p| p.text.as_str()).collect();
        for n in 1..=40 {
            assert!(all.contains(&format!("customer{n:02}@example.com")));
            assert!(all.contains(&format!("Pw-{n:02}-secret")));
        }
        assert!(all.contains("40. Email:"));
    }

    #[test]
    fn test_item_pages_small_order_is_one_page() {
        let items: Vec<_> = (0..3).map(|i| item(&format!("CODE-{i}"), None)).collect();
        let pages = item_pages(DeliveryType::Code, &items, MAX_MESSAGE_LEN);
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].count, 3);
        assert!(item_pages(DeliveryType::Code, &[], MAX_MESSAGE_LEN).is_empty());
    }
}
