//! Spanish relative-time labels ("hace 3 horas") for list and detail views.

const MINUTE_MS: i64 = 60 * 1000;
const HOUR_MS: i64 = 60 * MINUTE_MS;
const DAY_MS: i64 = 24 * HOUR_MS;
const MONTH_MS: i64 = 30 * DAY_MS;
const YEAR_MS: i64 = 365 * DAY_MS;

/// Describes how long ago `then_ms` was relative to `now_ms`.
///
/// Months are 30 days and years 365 days. Instants in the future render as
/// `justo ahora`.
pub fn format_relative(then_ms: i64, now_ms: i64) -> String {
    let elapsed = now_ms.saturating_sub(then_ms);
    if elapsed < 0 {
        return "justo ahora".to_string();
    }
    if elapsed < MINUTE_MS {
        return "hace un momento".to_string();
    }

    let (count, singular, plural) = if elapsed < HOUR_MS {
        (elapsed / MINUTE_MS, "minuto", "minutos")
    } else if elapsed < DAY_MS {
        (elapsed / HOUR_MS, "hora", "horas")
    } else if elapsed < MONTH_MS {
        (elapsed / DAY_MS, "día", "días")
    } else if elapsed < YEAR_MS {
        // 360..365 days would otherwise read as 12 months.
        ((elapsed / MONTH_MS).min(11), "mes", "meses")
    } else {
        (elapsed / YEAR_MS, "año", "años")
    };

    if count == 1 {
        format!("hace 1 {singular}")
    } else {
        format!("hace {count} {plural}")
    }
}
