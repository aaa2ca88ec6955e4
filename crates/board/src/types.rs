use serde::{Deserialize, Deserializer, Serialize};

/// One participant as returned by `GET {base}/leaderboard`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LeaderboardRow {
    pub rank: u64,
    #[serde(default, deserialize_with = "de_null_as_empty")]
    pub display_name: String,
    pub address: String,
    pub polymarket_profile_url: String,
    pub portfolio_value: f64,
    pub pnl_realized: f64,
    pub pnl_unrealized: f64,
    #[serde(default)]
    pub flags: RowFlags,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct RowFlags {
    pub large_deposit: bool,
    pub has_withdrawals: bool,
    pub non_fresh: bool,
}

impl RowFlags {
    /// Flags that are set, in display order.
    pub fn active(&self) -> impl Iterator<Item = FlagKind> + '_ {
        FlagKind::ALL.into_iter().filter(|kind| self.is_set(*kind))
    }

    pub fn is_set(&self, kind: FlagKind) -> bool {
        match kind {
            FlagKind::LargeDeposit => self.large_deposit,
            FlagKind::HasWithdrawals => self.has_withdrawals,
            FlagKind::NonFresh => self.non_fresh,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagKind {
    LargeDeposit,
    HasWithdrawals,
    NonFresh,
}

impl FlagKind {
    pub const ALL: [Self; 3] = [Self::LargeDeposit, Self::HasWithdrawals, Self::NonFresh];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LargeDeposit => "large_deposit",
            Self::HasWithdrawals => "has_withdrawals",
            Self::NonFresh => "non_fresh",
        }
    }
}

fn de_null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
