//! Reply texts for bot commands

use std::fmt::Write;

use chrono::{DateTime, Utc};
use club_core::{PaymentStatus, SubscriptionState};
use club_service::dto::{CommunityResponse, DeliveredInvite, SubscriptionStatusResponse};

pub const GENERIC_ERROR: &str =
    "❌ Сталася помилка. Будь ласка, спробуйте пізніше або зверніться до підтримки.";

pub const MISSING_USERNAME: &str = "❌ У вас не встановлено username в Telegram.\n\n\
     Будь ласка, додайте username в налаштуваннях Telegram та спробуйте знову.";

pub const NOT_REGISTERED: &str =
    "❌ Вас не знайдено в системі.\n\n💡 Будь ласка, зареєструйтесь на нашому сайті.";

pub const HELP: &str = "🆘 Довідка по командам:\n\n\
     /start - отримати запрошення до спільноти (після оплати)\n\
     /check - перевірити статус підписки\n\
     /id - дізнатися свій Telegram ID\n\
     /help - ця довідка\n\n\
     💡 Для реєстрації у спільноті відвідайте наш сайт.";

pub const UNKNOWN_COMMAND: &str = "🤔 Невідома команда. Введіть /help, щоб побачити список команд.";

fn format_instant(instant: DateTime<Utc>) -> String {
    instant.format("%d.%m.%Y %H:%M UTC").to_string()
}

/// Greeting with the catalog for someone without an active subscription
pub fn onboarding(catalog: &[CommunityResponse]) -> String {
    let mut text = String::from(
        "🤖 Вітаю в боті спільнот \"Вільні - Залежні\"!\n\n\
         📋 Для отримання доступу:\n\
         1. Зареєструйтесь на нашому сайті\n\
         2. Оплатіть підписку на обрану спільноту\n\
         3. Після оплати ви отримаєте персональне запрошення\n\n\
         💡 Після успішної оплати поверніться до бота та введіть /start, щоб отримати запрошення.\n\n\
         🏷️ Доступні спільноти:\n",
    );
    for community in catalog {
        let _ = writeln!(text, "• {} - {} грн/міс", community.display_name, community.price);
    }
    text
}

/// Invites for every active subscription
pub fn invites(name: &str, delivered: &[DeliveredInvite], invite_ttl_hours: i64) -> String {
    let mut text = format!("🎉 Вітаємо, {name}!\n\n📋 Ваші активні підписки:\n\n");

    for invite in delivered {
        match &invite.invite_link {
            Some(link) => {
                let _ = writeln!(text, "✅ {}", invite.display_name);
                if let Some(expires_at) = invite.expires_at {
                    let _ = writeln!(text, "📅 Дійсна до: {}", format_instant(expires_at));
                }
                let _ = writeln!(text, "🔗 Запрошення: {link}\n");
            }
            None => {
                let _ = writeln!(
                    text,
                    "⚠️ {} - не вдалося створити запрошення, спробуйте /start пізніше\n",
                    invite.display_name
                );
            }
        }
    }

    let _ = write!(
        text,
        "📋 Характеристики посилань:\n\
         • ⏰ Дійсні до {invite_ttl_hours} год.\n\
         • 👤 Одноразові (тільки для вас)\n\n\
         💚 Натисніть на посилання, щоб приєднатися до спільноти!"
    );
    text
}

fn state_label(state: SubscriptionState) -> &'static str {
    match state {
        SubscriptionState::Active => "активна",
        SubscriptionState::Pending => "очікує оплати",
        SubscriptionState::Expired => "неактивна",
    }
}

fn payment_label(status: Option<PaymentStatus>) -> &'static str {
    match status {
        Some(PaymentStatus::Completed) => "оплачено",
        Some(PaymentStatus::Pending) => "очікується",
        Some(PaymentStatus::Failed) => "не пройшла",
        None => "немає",
    }
}

/// Latest state per community
pub fn status(statuses: &[SubscriptionStatusResponse]) -> String {
    if statuses.is_empty() {
        return NOT_REGISTERED.to_string();
    }

    let mut text = String::from("📊 Статус ваших підписок:\n\n");
    for status in statuses {
        let _ = writeln!(text, "🏷️ {}", status.display_name);
        let _ = writeln!(text, "✅ Статус: {}", state_label(status.state));
        if let Some(expires_at) = status.expires_at {
            let _ = writeln!(text, "📅 Дійсна до: {}", format_instant(expires_at));
        }
        let _ = writeln!(text, "💳 Оплата: {}", payment_label(status.latest_payment));
        if status.active {
            text.push_str("🔗 Запрошення: введіть /start\n");
        }
        text.push('\n');
    }
    text.trim_end().to_string()
}

/// Numeric identity to paste into the registration form
pub fn your_id(name: &str, user_id: i64) -> String {
    format!(
        "👋 Привіт, {name}!\n\n\
         🆔 Ваш Telegram ID: {user_id}\n\n\
         💡 Як використати:\n\
         1. Скопіюйте цей ID\n\
         2. Вставте його у відповідне поле форми реєстрації на сайті\n\
         3. Заповніть решту полів та завершіть реєстрацію"
    )
}
