//! Buying, selling and funding against the remote ledger.
//!
//! Each action validates its amount locally, issues one request, and on
//! success overwrites the session profile's balances with the values the
//! server returns. The outcome of every action is posted to a
//! [`NoticeBoard`] as a short-lived notice.

use std::time::Duration;

use tokio::time::Instant;

use crate::backend::LedgerBackend;
use crate::error::Error;
use crate::observability::{LEDGER_ACTIONS, LEDGER_FAILURES, LEDGER_REJECTED_AMOUNTS};
use crate::session::SessionStore;
use crate::storage::Storage;
use crate::types::{AddMoneyParams, GoldTradeParams, UserProfile};

/// How long a notice stays on screen.
pub const NOTICE_TTL: Duration = Duration::from_secs(3);

const SOMETHING_WENT_WRONG: &str = "❌ Something went wrong";
const NOT_LOGGED_IN: &str = "❌ Please log in first";

///////////////////////////////////////////// Notices //////////////////////////////////////////////

/// Whether a notice reports success or failure.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum NoticeKind {
    /// The action went through.
    Success,
    /// The action was rejected or failed.
    Failure,
}

/// A transient message with its own expiry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Position in posting order.
    pub id: u64,
    /// Success or failure.
    pub kind: NoticeKind,
    /// The text to display.
    pub text: String,
    /// When this notice was posted.
    pub posted_at: Instant,
    /// When this notice's timer clears the display.
    pub expires_at: Instant,
}

/// Transient notices, each with its own clearing timer.
///
/// Posting a notice replaces whatever is displayed but never cancels an
/// earlier notice's timer. Whenever any timer fires, the display is cleared,
/// so a notice posted shortly after another disappears when the earlier
/// notice's timer fires.
#[derive(Debug)]
pub struct NoticeBoard {
    ttl: Duration,
    next_id: u64,
    notices: Vec<Notice>,
}

impl NoticeBoard {
    /// Creates a board whose notices live for [`NOTICE_TTL`].
    pub fn new() -> Self {
        Self::with_ttl(NOTICE_TTL)
    }

    /// Creates a board with a custom notice lifetime.
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            ttl,
            next_id: 0,
            notices: Vec::new(),
        }
    }

    /// Posts a notice whose timer fires `ttl` from now.
    pub fn post(&mut self, kind: NoticeKind, text: impl Into<String>) -> Notice {
        let now = Instant::now();
        // Timers that already fired cannot clear anything posted from now on.
        self.notices.retain(|notice| notice.expires_at > now);
        let notice = Notice {
            id: self.next_id,
            kind,
            text: text.into(),
            posted_at: now,
            expires_at: now + self.ttl,
        };
        self.next_id += 1;
        self.notices.push(notice.clone());
        notice
    }

    /// The notice currently on display, if any.
    ///
    /// This is the latest notice, unless some notice's timer has fired since
    /// it was posted.
    pub fn current(&self) -> Option<&Notice> {
        let now = Instant::now();
        let latest = self.notices.last()?;
        let cleared = self.notices.iter().any(|notice| {
            notice.expires_at <= now
                && (notice.id == latest.id || notice.expires_at > latest.posted_at)
        });
        (!cleared).then_some(latest)
    }
}

impl Default for NoticeBoard {
    fn default() -> Self {
        Self::new()
    }
}

////////////////////////////////////////////// Actions /////////////////////////////////////////////

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum LedgerAction {
    Buy,
    Sell,
    AddMoney,
}

impl LedgerAction {
    fn name(self) -> &'static str {
        match self {
            LedgerAction::Buy => "buy",
            LedgerAction::Sell => "sell",
            LedgerAction::AddMoney => "addmoney",
        }
    }

    fn invalid_amount(self) -> &'static str {
        match self {
            LedgerAction::Buy | LedgerAction::Sell => "❌ Please enter a valid gold amount",
            LedgerAction::AddMoney => "❌ Please enter a valid amount",
        }
    }

    fn rejected(self) -> &'static str {
        match self {
            LedgerAction::Buy | LedgerAction::Sell => "Transaction failed",
            LedgerAction::AddMoney => "Adding money failed",
        }
    }

    fn succeeded(self) -> &'static str {
        match self {
            LedgerAction::Buy => "✅ Gold purchased successfully!",
            LedgerAction::Sell => "✅ Gold sold successfully!",
            LedgerAction::AddMoney => "✅ Money added successfully!",
        }
    }
}

/// The three ledger operations plus the notices they post.
#[derive(Debug, Default)]
pub struct Portfolio {
    notices: NoticeBoard,
}

impl Portfolio {
    /// Creates a portfolio with a fresh notice board.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a portfolio posting to the given board.
    pub fn with_notices(notices: NoticeBoard) -> Self {
        Self { notices }
    }

    /// The notice board.
    pub fn notices(&self) -> &NoticeBoard {
        &self.notices
    }

    /// Buys `amount` grams of gold.
    pub async fn buy_gold<B, S>(
        &mut self,
        backend: &B,
        session: &mut SessionStore<S>,
        amount: &str,
    ) -> Notice
    where
        B: LedgerBackend + ?Sized,
        S: Storage,
    {
        self.run(LedgerAction::Buy, backend, session, amount).await
    }

    /// Sells `amount` grams of gold.
    pub async fn sell_gold<B, S>(
        &mut self,
        backend: &B,
        session: &mut SessionStore<S>,
        amount: &str,
    ) -> Notice
    where
        B: LedgerBackend + ?Sized,
        S: Storage,
    {
        self.run(LedgerAction::Sell, backend, session, amount).await
    }

    /// Adds `amount` rupees to the wallet.
    pub async fn add_money<B, S>(
        &mut self,
        backend: &B,
        session: &mut SessionStore<S>,
        amount: &str,
    ) -> Notice
    where
        B: LedgerBackend + ?Sized,
        S: Storage,
    {
        self.run(LedgerAction::AddMoney, backend, session, amount)
            .await
    }

    async fn run<B, S>(
        &mut self,
        action: LedgerAction,
        backend: &B,
        session: &mut SessionStore<S>,
        amount: &str,
    ) -> Notice
    where
        B: LedgerBackend + ?Sized,
        S: Storage,
    {
        let Some(amount) = parse_amount(amount) else {
            LEDGER_REJECTED_AMOUNTS.click();
            return self
                .notices
                .post(NoticeKind::Failure, action.invalid_amount());
        };

        LEDGER_ACTIONS.click();
        let token = session.persisted_token();
        let token = token.as_deref();
        let outcome = match action {
            LedgerAction::Buy => backend
                .buy_gold(token, GoldTradeParams { gold_gram: amount })
                .await
                .map(|r| (r.wallet, Some(r.gold))),
            LedgerAction::Sell => backend
                .sell_gold(token, GoldTradeParams { gold_gram: amount })
                .await
                .map(|r| (r.wallet, Some(r.gold))),
            LedgerAction::AddMoney => backend
                .add_money(token, AddMoneyParams { amount })
                .await
                .map(|r| (r.user.user_wallet, r.gold)),
        };

        match outcome {
            Ok((wallet, gold)) => {
                let gold = gold
                    .or_else(|| session.user().map(|user| user.user_gold))
                    .unwrap_or(0.0);
                // The server has already applied the action, so it is reported
                // as done; the new balances stay in memory for this run.
                if let Err(err) = session.update_balances(wallet, gold) {
                    tracing::warn!(action = action.name(), error = %err, "failed to persist balances");
                }
                self.notices.post(NoticeKind::Success, action.succeeded())
            }
            Err(err) => {
                LEDGER_FAILURES.click();
                tracing::debug!(action = action.name(), error = %err, "ledger action failed");
                let text = match &err {
                    Error::Api { reason, .. } => {
                        format!("❌ {}", reason.as_deref().unwrap_or(action.rejected()))
                    }
                    Error::Authentication { .. } => NOT_LOGGED_IN.to_string(),
                    _ => SOMETHING_WENT_WRONG.to_string(),
                };
                self.notices.post(NoticeKind::Failure, text)
            }
        }
    }
}

/// Parses user input as a finite, strictly positive amount.
pub fn parse_amount(input: &str) -> Option<f64> {
    input
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite() && *value > 0.0)
}

///////////////////////////////////////////// Dashboard ////////////////////////////////////////////

/// What the dashboard shows for a profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardSummary {
    /// Full name, user name, or email, whichever is set first.
    pub name: String,
    /// Wallet balance, e.g. `₹ 1,25,000.00`.
    pub wallet: String,
    /// Gold holdings, e.g. `2.50 gm`.
    pub gold: String,
}

impl DashboardSummary {
    /// Builds the summary for `profile`.
    pub fn from_profile(profile: &UserProfile) -> Self {
        Self {
            name: profile.display_name().to_string(),
            wallet: format!("₹ {}", format_amount(profile.user_wallet)),
            gold: format!("{} gm", format_amount(profile.user_gold)),
        }
    }
}

/// Formats `value` with two decimals and Indian digit grouping.
///
/// ```
/// assert_eq!(aurum::format_amount(1234567.891), "12,34,567.89");
/// ```
pub fn format_amount(value: f64) -> String {
    let value = if value.is_finite() { value } else { 0.0 };
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut groups: Vec<&str> = Vec::new();
    let (mut head, tail) = int_part.split_at(int_part.len().saturating_sub(3));
    while head.len() > 2 {
        let (rest, group) = head.split_at(head.len() - 2);
        groups.push(group);
        head = rest;
    }
    if !head.is_empty() {
        groups.push(head);
    }
    groups.reverse();
    groups.push(tail);

    let sign = if value < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{sign}{}.{frac_part}", groups.join(","))
}
