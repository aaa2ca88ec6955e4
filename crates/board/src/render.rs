//! Pure mapping from a [`LeaderboardRow`] to the cells shown in the table.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use thiserror::Error;

use crate::config::Badges;
use crate::types::{FlagKind, LeaderboardRow};

pub const LINK_TARGET: &str = "_blank";
pub const LINK_REL: &str = "noopener noreferrer";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RenderError {
    #[error("field {field} is not a finite number")]
    NonFinite { field: &'static str },

    #[error("rank must be a positive integer")]
    ZeroRank,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    Positive,
    Negative,
    Neutral,
}

impl Tone {
    pub fn of(value: f64) -> Self {
        if value > 0.0 {
            Self::Positive
        } else if value < 0.0 {
            Self::Negative
        } else {
            Self::Neutral
        }
    }

    /// CSS class for the cell; empty for neutral values.
    pub fn css_class(&self) -> &'static str {
        match self {
            Self::Positive => "number-positive",
            Self::Negative => "number-negative",
            Self::Neutral => "",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MoneyCell {
    pub text: String,
    pub tone: Tone,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TraderCell {
    pub name: String,
    pub address: String,
    pub href: String,
    pub target: &'static str,
    pub rel: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Badge {
    pub flag: FlagKind,
    pub label: String,
    pub tooltip: String,
    pub css_class: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedRow {
    pub rank: String,
    pub trader: TraderCell,
    pub portfolio: String,
    pub realized: MoneyCell,
    pub unrealized: MoneyCell,
    pub badges: Vec<Badge>,
}

/// `$` followed by the value fixed to two decimals, ties rounded away from
/// zero on the exact binary value. Negative zero prints as `$0.00`.
pub fn format_usd(value: f64) -> String {
    let sign = if value < 0.0 { "-" } else { "" };
    match Decimal::from_f64_retain(value.abs()) {
        Some(d) => {
            let cents = d.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
            format!("${sign}{cents:.2}")
        }
        // Beyond Decimal's range there is no fractional part left to round.
        None => format!("${sign}{:.2}", value.abs()),
    }
}

pub fn render_row(row: &LeaderboardRow, badges: &Badges) -> Result<RenderedRow, RenderError> {
    if row.rank == 0 {
        return Err(RenderError::ZeroRank);
    }
    let portfolio = finite("portfolio_value", row.portfolio_value)?;
    let realized = finite("pnl_realized", row.pnl_realized)?;
    let unrealized = finite("pnl_unrealized", row.pnl_unrealized)?;

    Ok(RenderedRow {
        rank: row.rank.to_string(),
        trader: TraderCell {
            name: row.display_name.clone(),
            address: row.address.clone(),
            href: row.polymarket_profile_url.clone(),
            target: LINK_TARGET,
            rel: LINK_REL,
        },
        portfolio: format_usd(portfolio),
        realized: money(realized),
        unrealized: money(unrealized),
        badges: row
            .flags
            .active()
            .map(|kind| badge(kind, badges))
            .collect(),
    })
}

/// Render every row in the given order, or none at all.
pub fn render_rows(
    rows: &[LeaderboardRow],
    badges: &Badges,
) -> Result<Vec<RenderedRow>, (usize, RenderError)> {
    rows.iter()
        .enumerate()
        .map(|(i, row)| render_row(row, badges).map_err(|e| (i, e)))
        .collect()
}

fn finite(field: &'static str, value: f64) -> Result<f64, RenderError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(RenderError::NonFinite { field })
    }
}

fn money(value: f64) -> MoneyCell {
    MoneyCell {
        text: format_usd(value),
        tone: Tone::of(value),
    }
}

fn badge(kind: FlagKind, badges: &Badges) -> Badge {
    let spec = badges.get(kind);
    Badge {
        flag: kind,
        label: spec.label.clone(),
        tooltip: spec.tooltip.clone(),
        css_class: spec.css_class.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RowFlags;

    fn alice() -> LeaderboardRow {
        LeaderboardRow {
            rank: 1,
            display_name: "Alice".to_string(),
            address: "0xabc".to_string(),
            polymarket_profile_url: "https://pm/abc".to_string(),
            portfolio_value: 100.5,
            pnl_realized: -2.345,
            pnl_unrealized: 0.0,
            flags: RowFlags {
                large_deposit: true,
                has_withdrawals: false,
                non_fresh: false,
            },
        }
    }

    #[test]
    fn test_render_reference_row() {
        let r = render_row(&alice(), &Badges::default()).unwrap();
        assert_eq!(r.rank, "1");
        assert_eq!(r.trader.name, "Alice");
        assert_eq!(r.trader.address, "0xabc");
        assert_eq!(r.trader.href, "https://pm/abc");
        assert_eq!(r.trader.target, "_blank");
        assert_eq!(r.trader.rel, "noopener noreferrer");
        assert_eq!(r.portfolio, "$100.50");
        assert_eq!(r.realized.text, "$-2.35");
        assert_eq!(r.realized.tone, Tone::Negative);
        assert_eq!(r.unrealized.text, "$0.00");
        assert_eq!(r.unrealized.tone, Tone::Neutral);
        assert_eq!(r.badges.len(), 1);
        assert_eq!(r.badges[0].flag, FlagKind::LargeDeposit);
        assert_eq!(r.badges[0].label, "D");
    }

    #[test]
    fn test_positive_pnl_and_all_flags() {
        let mut row = alice();
        row.pnl_realized = 12.0;
        row.flags = RowFlags {
            large_deposit: true,
            has_withdrawals: true,
            non_fresh: true,
        };
        let r = render_row(&row, &Badges::default()).unwrap();
        assert_eq!(r.realized.text, "$12.00");
        assert_eq!(r.realized.tone, Tone::Positive);
        let labels: Vec<&str> = r.badges.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, vec!["D", "W", "F"]);
    }

    #[test]
    fn test_no_flags_means_no_badges() {
        let mut row = alice();
        row.flags = RowFlags::default();
        let r = render_row(&row, &Badges::default()).unwrap();
        assert!(r.badges.is_empty());
    }

    #[test]
    fn test_negative_zero_is_neutral() {
        assert_eq!(format_usd(-0.0), "$0.00");
        assert_eq!(Tone::of(-0.0), Tone::Neutral);
        assert_eq!(format_usd(-0.001), "$-0.00");
        assert_eq!(Tone::of(-0.001), Tone::Negative);
    }

    #[test]
    fn test_ties_round_away_from_zero() {
        assert_eq!(format_usd(0.125), "$0.13");
        assert_eq!(format_usd(1.125), "$1.13");
        assert_eq!(format_usd(-0.125), "$-0.13");
        assert_eq!(format_usd(2.5), "$2.50");
        // 1.005 is stored just below the tie.
        assert_eq!(format_usd(1.005), "$1.00");
        assert_eq!(format_usd(-2.345), "$-2.35");
    }

    #[test]
    fn test_huge_values_still_format() {
        assert_eq!(format_usd(1e30), format!("${:.2}", 1e30));
        assert_eq!(format_usd(-1e30), format!("$-{:.2}", 1e30));
    }

    #[test]
    fn test_zero_rank_is_rejected() {
        let mut row = alice();
        row.rank = 0;
        assert_eq!(
            render_row(&row, &Badges::default()),
            Err(RenderError::ZeroRank)
        );
    }

    #[test]
    fn test_non_finite_value_is_rejected() {
        let mut row = alice();
        row.pnl_unrealized = f64::NAN;
        assert_eq!(
            render_row(&row, &Badges::default()),
            Err(RenderError::NonFinite {
                field: "pnl_unrealized"
            })
        );
    }

    #[test]
    fn test_render_rows_keeps_order_and_reports_index() {
        let mut second = alice();
        second.rank = 7;
        let mut third = alice();
        third.rank = 2;
        let rendered = render_rows(&[alice(), second.clone(), third.clone()], &Badges::default())
            .unwrap();
        let ranks: Vec<&str> = rendered.iter().map(|r| r.rank.as_str()).collect();
        assert_eq!(ranks, vec!["1", "7", "2"]);

        third.portfolio_value = f64::INFINITY;
        let err = render_rows(&[alice(), second, third], &Badges::default()).unwrap_err();
        assert_eq!(err.0, 2);
    }

    #[test]
    fn test_tone_css_classes() {
        assert_eq!(Tone::Positive.css_class(), "number-positive");
        assert_eq!(Tone::Negative.css_class(), "number-negative");
        assert_eq!(Tone::Neutral.css_class(), "");
    }
}
