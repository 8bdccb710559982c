//! Message bodies in Telegram's legacy Markdown subset (`*bold*`, newlines).

use chrono::{DateTime, FixedOffset, Utc};
use rust_decimal::{Decimal, RoundingStrategy};

use crate::alert::rules::{AlertLevel, Thresholds};
use crate::metrics::Assessment;

const SEPARATOR: &str = "━━━━━━━━━━━━━━━━";

pub fn format_timestamp(at: DateTime<Utc>, offset: FixedOffset) -> String {
    at.with_timezone(&offset)
        .format("%Y-%m-%d %H:%M:%S (UTC%:z)")
        .to_string()
}

/// Two decimals with thousands separators: `1234567.891` -> `1,234,567.89`.
pub fn format_amount(value: Decimal) -> String {
    let rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let text = format!("{:.2}", rounded.abs());
    let (whole, fraction) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (idx, ch) in whole.chars().enumerate() {
        if idx > 0 && (whole.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    format!("{sign}{grouped}.{fraction}")
}

pub fn format_percent(value: Decimal) -> String {
    format!(
        "{:.2}%",
        value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    )
}

pub fn escape_markdown(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        if matches!(ch, '_' | '*' | '`' | '[') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

pub fn alert_message(level: AlertLevel, assessment: &Assessment, timestamp: &str) -> String {
    let reading = &assessment.reading;
    format!(
        "{marker} *{level} ALERT*\n\n\
         🏦 *{name}*\n\
         ⏰ {timestamp}\n\
         📊 Utilization Rate: *{utilization}*\n\
         💹 Supply APY: *{apy}*\n\n\
         💰 {total_label}: {total}\n\
         ✅ Available: {available}\n\
         📈 {debt_label}: {debt}",
        marker = level.marker(),
        name = escape_markdown(&reading.display_name),
        utilization = format_percent(assessment.utilization_percent),
        apy = format_percent(reading.supply_apy_percent),
        total_label = reading.kind.total_label(),
        total = format_amount(reading.total_liquidity),
        available = format_amount(reading.available_liquidity),
        debt_label = reading.kind.debt_label(),
        debt = format_amount(reading.total_debt),
    )
}

/// One combined summary of every entity, independent of alert state.
/// `failures` holds `(display name, reason)` for entities without a reading.
pub fn digest_message(
    assessments: &[Assessment],
    failures: &[(String, String)],
    thresholds: &Thresholds,
    timestamp: &str,
) -> String {
    let mut message = format!("📋 *Daily Liquidity Report*\n⏰ {timestamp}\n");

    for assessment in assessments {
        let reading = &assessment.reading;
        let level = thresholds.classify(assessment.utilization_percent);
        message.push_str(&format!(
            "\n{SEPARATOR}\n\
             🏦 *{name}*\n\
             📊 Utilization: *{utilization}* {marker}\n\
             💹 Supply APY: *{apy}*\n\
             💰 {total_label}: {total}\n\
             ✅ Available: {available}\n\
             📈 {debt_label}: {debt}",
            name = escape_markdown(&reading.display_name),
            utilization = format_percent(assessment.utilization_percent),
            marker = level.marker(),
            apy = format_percent(reading.supply_apy_percent),
            total_label = reading.kind.total_label(),
            total = format_amount(reading.total_liquidity),
            available = format_amount(reading.available_liquidity),
            debt_label = reading.kind.debt_label(),
            debt = format_amount(reading.total_debt),
        ));
    }

    if !failures.is_empty() {
        message.push_str(&format!("\n{SEPARATOR}\n❌ *Unavailable*"));
        for (name, reason) in failures {
            message.push_str(&format!(
                "\n• {}: {}",
                escape_markdown(name),
                escape_markdown(reason)
            ));
        }
    }

    message
}

pub fn test_message(timestamp: &str) -> String {
    format!(
        "🧪 *Test Message*\n\n\
         This is a test message from the liquidity monitor.\n\n\
         ⏰ Time: {timestamp}\n\
         ✅ Bot configured correctly\n\
         📊 Ready to receive alerts\n\n\
         If you can see this message, the setup works!"
    )
}
