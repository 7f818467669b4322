//! # Money Module
//!
//! Provides the `Money` type for monetary values and the `Currency` tag
//! that every transaction total carries.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In floating point:                                                     │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  OUR SOLUTION: Integer minor units                                      │
//! │    Every LRD and USD amount is stored as i64 cents.                     │
//! │    Sums over thousands of sales stay exact.                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Two Currencies, One Total
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  A transaction is denominated in exactly ONE currency.                 │
//! │                                                                         │
//! │  CurrencyAmount { currency: USD, amount: 300 }                          │
//! │       │                                                                 │
//! │       ▼  projected at the wire boundary                                 │
//! │  { "totalUSD": 300, "totalLRD": 0 }                                     │
//! │                                                                         │
//! │  Summing totalLRD + totalUSD of one transaction is never meaningful,   │
//! │  so the domain never stores them as two independent fields.            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use stockroom_core::money::{Currency, CurrencyAmount, Money};
//!
//! let price = Money::from_cents(1099);
//! let line = price.multiply_quantity(3);
//! assert_eq!(line.cents(), 3297);
//!
//! let total = CurrencyAmount::new(Currency::Usd, line);
//! assert_eq!(total.amount_in(Currency::Lrd), Money::zero());
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign};
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (cents).
///
/// ## Design Decisions
/// - **i64 (signed)**: arithmetic on differences stays representable
/// - **Single field tuple struct**: zero-cost abstraction over i64
/// - **No currency inside**: prices are stored per currency on the product,
///   totals carry their currency through [`CurrencyAmount`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    ///
    /// ## Example
    /// ```rust
    /// use stockroom_core::money::Money;
    ///
    /// let price = Money::from_cents(1099);
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit portion.
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn minor(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiplies money by a quantity, saturating at the `i64` bounds.
    ///
    /// ## User Workflow
    /// ```text
    /// Product: Rice 25kg, priceLRD 4500.00
    /// Quantity: 3
    ///      │
    ///      ▼
    /// multiply_quantity(3) ← THIS FUNCTION
    ///      │
    ///      ▼
    /// Line value: 13500.00 LRD
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0.saturating_mul(qty))
    }

    /// `None` if `self × qty` does not fit in an i64.
    #[inline]
    pub const fn checked_multiply_quantity(&self, qty: i64) -> Option<Self> {
        match self.0.checked_mul(qty) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// `None` on overflow.
    #[inline]
    pub const fn checked_add(&self, other: Money) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }
}

/// Shows money as `major.minor` without a currency symbol.
///
/// ## Note
/// Use [`CurrencyAmount`] when the currency must be displayed too.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, self.major().abs(), self.minor())
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

/// Report sums saturate instead of wrapping. Posting totals use
/// [`Money::checked_add`] and reject overflow.
impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0.saturating_add(other.0))
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        *self = *self + other;
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

// =============================================================================
// Currency
// =============================================================================

/// The currency a transaction is denominated in.
///
/// The wire and database form is the ISO code: `"LRD"` or `"USD"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "UPPERCASE"))]
#[serde(rename_all = "UPPERCASE")]
#[ts(export)]
pub enum Currency {
    /// Liberian dollar.
    Lrd,
    /// United States dollar.
    Usd,
}

impl Currency {
    /// ISO 4217 code.
    pub const fn code(&self) -> &'static str {
        match self {
            Currency::Lrd => "LRD",
            Currency::Usd => "USD",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "LRD" => Ok(Currency::Lrd),
            "USD" => Ok(Currency::Usd),
            _ => Err(ValidationError::NotAllowed {
                field: "currency".to_string(),
                allowed: vec!["LRD".to_string(), "USD".to_string()],
            }),
        }
    }
}

// =============================================================================
// Currency Amount
// =============================================================================

/// An amount tagged with the currency it is denominated in.
///
/// This is the internal form of a transaction total. The two-field
/// `totalLRD` / `totalUSD` shape only exists at the serialization boundary
/// (see [`CurrencyAmount::amount_in`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CurrencyAmount {
    pub currency: Currency,
    pub amount: Money,
}

impl CurrencyAmount {
    pub const fn new(currency: Currency, amount: Money) -> Self {
        CurrencyAmount { currency, amount }
    }

    /// Zero in the given currency.
    pub const fn zero(currency: Currency) -> Self {
        CurrencyAmount::new(currency, Money::zero())
    }

    /// Projects onto one currency: the amount if it matches, zero otherwise.
    ///
    /// ## Example
    /// ```rust
    /// use stockroom_core::money::{Currency, CurrencyAmount, Money};
    ///
    /// let total = CurrencyAmount::new(Currency::Lrd, Money::from_cents(500));
    /// assert_eq!(total.amount_in(Currency::Lrd).cents(), 500);
    /// assert_eq!(total.amount_in(Currency::Usd).cents(), 0);
    /// ```
    #[inline]
    pub fn amount_in(&self, currency: Currency) -> Money {
        if self.currency == currency {
            self.amount
        } else {
            Money::zero()
        }
    }
}

impl fmt::Display for CurrencyAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.currency, self.amount)
    }
}

// =============================================================================
// Dual-Currency Totals
// =============================================================================

/// Running LRD and USD sums kept side by side.
///
/// Report buckets hold one of these. Amounts enter only through
/// [`DualTotals::credit`], which routes each amount to its own currency.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DualTotals {
    #[serde(rename = "totalLRD")]
    pub total_lrd: Money,
    #[serde(rename = "totalUSD")]
    pub total_usd: Money,
}

impl DualTotals {
    /// Adds the amount to the sum of its own currency.
    #[inline]
    pub fn credit(&mut self, amount: CurrencyAmount) {
        match amount.currency {
            Currency::Lrd => self.total_lrd += amount.amount,
            Currency::Usd => self.total_usd += amount.amount,
        }
    }

    /// Returns the running sum for one currency.
    pub fn get(&self, currency: Currency) -> Money {
        match currency {
            Currency::Lrd => self.total_lrd,
            Currency::Usd => self.total_usd,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
