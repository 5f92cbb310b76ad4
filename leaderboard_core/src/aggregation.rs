use crate::session::TimeWindow;
use crate::types::{BurnEvent, LeaderboardEntry, WalletTotal};
use config_manager::{AggregationMode, AmountPolicy};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Inputs that shape how burn events collapse into totals
#[derive(Debug, Clone, Copy)]
pub struct AggregationOptions<'a> {
    /// Only events inside this window count; `None` means full history
    pub window: Option<TimeWindow>,
    /// Unix seconds used to close an open window
    pub now: i64,
    pub amount_policy: AmountPolicy,
    pub mode: AggregationMode,
    /// wallet -> user id, consulted in `Current` mode
    pub identities: Option<&'a HashMap<String, String>>,
}

impl<'a> AggregationOptions<'a> {
    pub fn new(now: i64) -> Self {
        Self {
            window: None,
            now,
            amount_policy: AmountPolicy::default(),
            mode: AggregationMode::default(),
            identities: None,
        }
    }

    pub fn with_window(mut self, window: Option<TimeWindow>) -> Self {
        self.window = window;
        self
    }

    pub fn with_amount_policy(mut self, policy: AmountPolicy) -> Self {
        self.amount_policy = policy;
        self
    }

    pub fn with_mode(mut self, mode: AggregationMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_identities(mut self, identities: &'a HashMap<String, String>) -> Self {
        self.identities = Some(identities);
        self
    }

    fn admits(&self, event: &BurnEvent) -> bool {
        if let Some(window) = &self.window {
            if !window.contains(event.timestamp, self.now) {
                return false;
            }
        }
        match self.amount_policy {
            AmountPolicy::ExcludeNonPositive => event.amount > 0,
            AmountPolicy::IncludeAll => true,
        }
    }
}

struct Group {
    wallet: String,
    user_id: Option<String>,
    total: i128,
}

/// Collapse burn events into per-wallet (or per-user) totals, ranked by total
/// descending with ties broken by group key ascending.
///
/// The result does not depend on the order of `events`.
pub fn aggregate_burns(events: &[BurnEvent], options: &AggregationOptions<'_>) -> Vec<WalletTotal> {
    let mut groups: HashMap<String, Group> = HashMap::new();
    let mut skipped = 0usize;

    for event in events {
        if !options.admits(event) {
            skipped += 1;
            continue;
        }

        let user_id = match options.mode {
            AggregationMode::Legacy => None,
            AggregationMode::Current => options
                .identities
                .and_then(|ids| ids.get(&event.wallet))
                .cloned(),
        };
        let key = user_id.clone().unwrap_or_else(|| event.wallet.clone());

        let group = groups.entry(key).or_insert_with(|| Group {
            wallet: event.wallet.clone(),
            user_id,
            total: 0,
        });
        // A user with several wallets is represented by the smallest one
        if event.wallet < group.wallet {
            group.wallet = event.wallet.clone();
        }
        group.total = group.total.saturating_add(event.amount);
    }

    debug!(
        "📊 Aggregated {} events into {} groups ({} filtered out)",
        events.len() - skipped,
        groups.len(),
        skipped
    );

    let mut totals: Vec<WalletTotal> = groups
        .into_values()
        .map(|group| WalletTotal {
            total: to_decimal(group.total, &group.wallet),
            wallet: group.wallet,
            user_id: group.user_id,
        })
        .collect();

    totals.sort_by(compare_totals);
    totals
}

/// Assign dense 1-based ranks and keep the first `limit` rows
pub fn rank_totals(mut totals: Vec<WalletTotal>, limit: usize) -> Vec<LeaderboardEntry> {
    totals.sort_by(compare_totals);
    totals
        .into_iter()
        .take(limit)
        .enumerate()
        .map(|(index, total)| LeaderboardEntry::from_total(index as u32 + 1, total))
        .collect()
}

fn compare_totals(a: &WalletTotal, b: &WalletTotal) -> Ordering {
    b.total
        .cmp(&a.total)
        .then_with(|| a.group_key().cmp(b.group_key()))
}

fn to_decimal(raw: i128, wallet: &str) -> Decimal {
    Decimal::from_i128(raw).unwrap_or_else(|| {
        warn!("⚠️ Burn total for {} exceeds decimal range, clamping", wallet);
        if raw.is_negative() {
            Decimal::MIN
        } else {
            Decimal::MAX
        }
    })
}
