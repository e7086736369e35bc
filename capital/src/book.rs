//! Capital Book data model and the Capital Allocator, the single owning
//! worker for each tenant's book (`spec.md` §3, §4.8, §5).

use crate::error::CapitalError;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use titan_bus::{Bus, Payload};
use titan_namespace::{Key, TenantId};

/// Every strategy's allocation fraction is clamped into this range unless
/// explicitly overridden (`spec.md` §3).
pub const MIN_ALLOCATION: Decimal = dec!(0.05);
pub const MAX_ALLOCATION: Decimal = dec!(0.30);

const CAPITAL_BOOK_TTL_MS: i64 = 10 * 365 * 24 * 60 * 60 * 1000;

/// A (profitability, risk) pair the allocator scores one strategy by.
#[derive(Debug, Clone)]
pub struct StrategyScore {
    pub strategy: SmolStr,
    pub profitability: Decimal,
    pub risk: Decimal,
}

impl StrategyScore {
    pub fn new(strategy: impl Into<SmolStr>, profitability: Decimal, risk: Decimal) -> Self {
        Self { strategy: strategy.into(), profitability, risk }
    }
}

/// `{tenant_id} -> {strategy -> allocation_fraction}` plus the named
/// buckets, versioned for stale-read detection (`spec.md` §5).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapitalBook {
    pub tenant: SmolStr,
    pub allocations: BTreeMap<String, Decimal>,
    pub reserve_buffer: Decimal,
    pub commander_pool: Decimal,
    pub overnight_base: Decimal,
    pub profit_pool: Decimal,
    pub version: u64,
    pub updated_at: DateTime<Utc>,
}

impl CapitalBook {
    pub fn empty(tenant: &TenantId, now: DateTime<Utc>) -> Self {
        Self {
            tenant: tenant.0.clone(),
            allocations: BTreeMap::new(),
            reserve_buffer: Decimal::ZERO,
            commander_pool: Decimal::ZERO,
            overnight_base: Decimal::ZERO,
            profit_pool: Decimal::ZERO,
            version: 0,
            updated_at: now,
        }
    }

    /// `spec.md` §8 invariant (d): sum of strategy allocations per tenant
    /// never exceeds 1.0.
    pub fn allocation_sum(&self) -> Decimal {
        self.allocations.values().copied().sum()
    }
}

/// Scores each strategy's allocation proportional to `profitability /
/// risk`, clamps every fraction into `[MIN_ALLOCATION, MAX_ALLOCATION]`,
/// then rescales down if clamping pushed the total over 1.0 (`spec.md`
/// §4.8, §8 invariant (d)).
pub fn compute_allocations(inputs: &[StrategyScore]) -> BTreeMap<String, Decimal> {
    if inputs.is_empty() {
        return BTreeMap::new();
    }
    let raw_scores: Vec<Decimal> =
        inputs.iter().map(|input| input.profitability / input.risk.max(dec!(0.0001))).collect();
    let total: Decimal = raw_scores.iter().copied().sum();
    let even_share = Decimal::ONE / Decimal::from(inputs.len() as u64);

    let mut fractions = BTreeMap::new();
    for (input, score) in inputs.iter().zip(raw_scores.iter()) {
        let raw = if total > Decimal::ZERO { score / total } else { even_share };
        fractions.insert(input.strategy.to_string(), raw.clamp(MIN_ALLOCATION, MAX_ALLOCATION));
    }

    let sum: Decimal = fractions.values().copied().sum();
    if sum > Decimal::ONE {
        let scale = Decimal::ONE / sum;
        for fraction in fractions.values_mut() {
            *fraction *= scale;
        }
    }
    fractions
}

/// Single owning worker for every tenant's [`CapitalBook`]. Other
/// components (Drawdown Redirector, Capital Loop Optimizer, control
/// commands) propose changes through its methods rather than writing the
/// book directly (`spec.md` §5 single-writer-per-entity).
#[derive(Debug)]
pub struct CapitalAllocator {
    bus: Arc<dyn Bus>,
    books: Mutex<HashMap<String, CapitalBook>>,
}

impl CapitalAllocator {
    pub fn new(bus: Arc<dyn Bus>) -> Arc<Self> {
        Arc::new(Self { bus, books: Mutex::new(HashMap::new()) })
    }

    pub fn book_for(&self, tenant: &TenantId) -> Option<CapitalBook> {
        self.books.lock().get(tenant.0.as_str()).cloned()
    }

    /// Recomputes `tenant`'s allocations from `inputs` and publishes the
    /// new book. `spec.md` §4.8: "publishes the new Capital Book on
    /// change" — there is no dedicated capital-book channel in the
    /// normative table (`SPEC_FULL.md` §6), so the durable, versioned
    /// `titan:{tenant}:capital:book` key is the publication surface
    /// consumers poll, matching §5's "version counter so later consumers
    /// can detect stale reads".
    pub async fn reallocate(
        &self,
        tenant: &TenantId,
        inputs: &[StrategyScore],
    ) -> Result<CapitalBook, CapitalError> {
        let fractions = compute_allocations(inputs);
        let now = Utc::now();
        let mut books = self.books.lock();
        let previous = books.get(tenant.0.as_str()).cloned().unwrap_or_else(|| CapitalBook::empty(tenant, now));
        let book = CapitalBook {
            tenant: tenant.0.clone(),
            allocations: fractions,
            version: previous.version + 1,
            updated_at: now,
            ..previous
        };
        books.insert(tenant.0.to_string(), book.clone());
        drop(books);

        self.persist(&book).await?;
        Ok(book)
    }

    /// Moves `fraction` of `strategy`'s allocation evenly across
    /// `destinations`, used by the Drawdown Redirector (`spec.md` §4.8).
    /// Returns the updated book, or `None` if `tenant`/`strategy` has no
    /// book yet.
    pub async fn redirect(
        &self,
        tenant: &TenantId,
        strategy: &str,
        fraction_of_strategy: Decimal,
        destinations: &[&str],
    ) -> Result<Option<CapitalBook>, CapitalError> {
        let mut books = self.books.lock();
        let Some(previous) = books.get(tenant.0.as_str()).cloned() else {
            return Ok(None);
        };
        let Some(&current) = previous.allocations.get(strategy) else {
            return Ok(None);
        };

        let moved = current * fraction_of_strategy;
        let remaining = current - moved;
        let per_destination = if destinations.is_empty() {
            Decimal::ZERO
        } else {
            moved / Decimal::from(destinations.len() as u64)
        };

        let mut allocations = previous.allocations.clone();
        allocations.insert(strategy.to_string(), remaining);
        for destination in destinations {
            *allocations.entry(destination.to_string()).or_insert(Decimal::ZERO) += per_destination;
        }

        let book = CapitalBook {
            allocations,
            version: previous.version + 1,
            updated_at: Utc::now(),
            ..previous
        };
        books.insert(tenant.0.to_string(), book.clone());
        drop(books);

        self.persist(&book).await?;
        Ok(Some(book))
    }

    async fn persist(&self, book: &CapitalBook) -> Result<(), CapitalError> {
        let key = Key::capital_book(&TenantId::new(book.tenant.clone()));
        let payload = Payload::from(serde_json::to_vec(book).expect("CapitalBook is Serialize"));
        self.bus.set(&key, payload, CAPITAL_BOOK_TTL_MS).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use titan_bus::InMemoryBus;

    #[test]
    fn allocations_are_clamped_and_never_exceed_one() {
        let inputs = vec![
            StrategyScore::new("a", dec!(10), dec!(1)),
            StrategyScore::new("b", dec!(1), dec!(1)),
            StrategyScore::new("c", dec!(1), dec!(1)),
        ];
        let fractions = compute_allocations(&inputs);
        assert!(fractions.values().all(|f| *f >= MIN_ALLOCATION && *f <= MAX_ALLOCATION));
        let sum: Decimal = fractions.values().copied().sum();
        assert!(sum <= Decimal::ONE, "sum {sum} must not exceed 1.0");
    }

    #[test]
    fn empty_input_produces_empty_book() {
        assert!(compute_allocations(&[]).is_empty());
    }

    #[tokio::test]
    async fn reallocate_persists_and_bumps_version() {
        let bus: Arc<dyn Bus> = Arc::new(InMemoryBus::new());
        let allocator = CapitalAllocator::new(bus);
        let tenant = TenantId::new("acme");
        let inputs = vec![StrategyScore::new("momentum", dec!(5), dec!(1))];

        let first = allocator.reallocate(&tenant, &inputs).await.unwrap();
        assert_eq!(first.version, 1);
        let second = allocator.reallocate(&tenant, &inputs).await.unwrap();
        assert_eq!(second.version, 2);
    }

    #[tokio::test]
    async fn redirect_moves_fraction_to_destinations() {
        let bus: Arc<dyn Bus> = Arc::new(InMemoryBus::new());
        let allocator = CapitalAllocator::new(bus);
        let tenant = TenantId::new("acme");
        allocator
            .reallocate(&tenant, &[StrategyScore::new("momentum", dec!(1), dec!(1))])
            .await
            .unwrap();

        let book = allocator
            .redirect(&tenant, "momentum", dec!(0.70), &["neutral", "hedge"])
            .await
            .unwrap()
            .expect("book exists");

        assert_eq!(book.allocations["neutral"], book.allocations["hedge"]);
        assert!(book.allocations["momentum"] < dec!(0.30));
    }
}
