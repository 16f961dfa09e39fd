//! Plan-limit enforcement: normalized ceilings, the per-user limits cache and
//! the evaluator that turns them into allow / deny verdicts.

pub mod cache;
pub mod evaluator;
pub mod limits;
pub mod source;

use std::sync::Arc;

use cache::LimitsCache;
use evaluator::LimitEvaluator;
use source::PgQuotaSource;

pub type PgLimitEvaluator = LimitEvaluator<PgQuotaSource>;

pub fn evaluator(source: PgQuotaSource, cache: Arc<LimitsCache>) -> PgLimitEvaluator {
    LimitEvaluator::new(source, cache)
}
