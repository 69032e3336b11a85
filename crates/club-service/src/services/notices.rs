//! Texts of the direct messages the services send

use chrono::{DateTime, Utc};

fn format_instant(instant: DateTime<Utc>) -> String {
    instant.format("%d.%m.%Y %H:%M UTC").to_string()
}

pub(crate) fn activation(display_name: &str, expires_at: DateTime<Utc>, invite_link: Option<&str>) -> String {
    let mut text = format!(
        "✅ Оплату підтверджено!\n\nПідписка на «{display_name}» активна до {}.",
        format_instant(expires_at)
    );
    match invite_link {
        Some(link) => {
            text.push_str("\n\nОдноразове посилання для входу в групу:\n");
            text.push_str(link);
        }
        None => text.push_str("\n\nНадішліть /start, щоб отримати посилання для входу."),
    }
    text
}

pub(crate) fn expiry_warning(display_name: &str, expires_at: DateTime<Utc>) -> String {
    format!(
        "⏳ Ваша підписка на «{display_name}» закінчується {}.\n\nПродовжте її на сайті, щоб залишитися в групі.",
        format_instant(expires_at)
    )
}

pub(crate) fn removal(display_name: &str) -> String {
    format!(
        "❌ Термін вашої підписки на «{display_name}» закінчився, доступ до групи припинено.\n\nВи можете оформити нову підписку на сайті."
    )
}
