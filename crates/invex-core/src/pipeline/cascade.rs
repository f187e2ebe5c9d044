//! Ordered, short-circuiting run over the heuristic extractors.

use tracing::{debug, trace};

use crate::extract::{LineItemExtractor, Strategy};
use crate::models::{ExtractedLineItem, ExtractionConfig};

/// Outcome of one cascade run.
#[derive(Debug, Clone, PartialEq)]
pub enum CascadeOutcome {
    /// The first strategy that produced items, with those items.
    Matched {
        strategy: Strategy,
        items: Vec<ExtractedLineItem>,
    },
    /// No strategy recognized the layout.
    NoMatch,
}

type Step = (Strategy, Box<dyn LineItemExtractor + Send + Sync>);

/// Heuristic extractors tried in order; the first non-empty result wins.
pub struct Cascade {
    steps: Vec<Step>,
}

impl Default for Cascade {
    /// Horizontal, then vertical.
    fn default() -> Self {
        Self::from_strategies(&Strategy::DEFAULT_ORDER)
    }
}

impl Cascade {
    /// An empty cascade; every run is a `NoMatch`.
    pub fn empty() -> Self {
        Self { steps: Vec::new() }
    }

    pub fn from_strategies(strategies: &[Strategy]) -> Self {
        Self {
            steps: strategies.iter().map(|s| (*s, s.extractor())).collect(),
        }
    }

    /// Default order, with the loose extractor appended when enabled.
    pub fn from_config(config: &ExtractionConfig) -> Self {
        let mut cascade = Self::default();
        if config.enable_loose_heuristics {
            cascade = cascade.with_step(Strategy::Loose, Strategy::Loose.extractor());
        }
        cascade
    }

    /// Append a step after the existing ones.
    pub fn with_step(
        mut self,
        strategy: Strategy,
        extractor: Box<dyn LineItemExtractor + Send + Sync>,
    ) -> Self {
        self.steps.push((strategy, extractor));
        self
    }

    pub fn strategies(&self) -> Vec<Strategy> {
        self.steps.iter().map(|(s, _)| *s).collect()
    }

    pub fn run(&self, text: &str) -> CascadeOutcome {
        for (strategy, extractor) in &self.steps {
            let items = extractor.extract(text);
            if items.is_empty() {
                trace!("Strategy {} found nothing", strategy);
                continue;
            }

            debug!("Strategy {} matched {} items", strategy, items.len());
            return CascadeOutcome::Matched {
                strategy: *strategy,
                items,
            };
        }

        debug!("No heuristic strategy matched");
        CascadeOutcome::NoMatch
    }
}

impl std::fmt::Debug for Cascade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cascade")
            .field("steps", &self.strategies())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counting {
        calls: Arc<AtomicUsize>,
        items: Vec<ExtractedLineItem>,
    }

    impl LineItemExtractor for Counting {
        fn extract(&self, _text: &str) -> Vec<ExtractedLineItem> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.items.clone()
        }
    }

    fn counting(items: Vec<ExtractedLineItem>) -> (Arc<AtomicUsize>, Box<Counting>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let extractor = Box::new(Counting {
            calls: Arc::clone(&calls),
            items,
        });
        (calls, extractor)
    }

    fn item() -> ExtractedLineItem {
        ExtractedLineItem::new("Widget", Decimal::ONE, Decimal::TEN)
    }

    #[test]
    fn test_first_match_short_circuits() {
        let (first, a) = counting(vec![item()]);
        let (second, b) = counting(vec![item(), item()]);
        let cascade = Cascade::empty()
            .with_step(Strategy::Horizontal, a)
            .with_step(Strategy::Vertical, b);

        let outcome = cascade.run("anything");

        assert_eq!(
            outcome,
            CascadeOutcome::Matched {
                strategy: Strategy::Horizontal,
                items: vec![item()],
            }
        );
        assert_eq!(first.load(Ordering::SeqCst), 1);
        assert_eq!(second.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_empty_result_advances() {
        let (first, a) = counting(Vec::new());
        let (second, b) = counting(vec![item()]);
        let cascade = Cascade::empty()
            .with_step(Strategy::Horizontal, a)
            .with_step(Strategy::Vertical, b);

        assert!(matches!(
            cascade.run(""),
            CascadeOutcome::Matched { strategy: Strategy::Vertical, .. }
        ));
        assert_eq!(first.load(Ordering::SeqCst), 1);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_no_match() {
        assert_eq!(Cascade::default().run("hello\nworld"), CascadeOutcome::NoMatch);
        assert_eq!(Cascade::empty().run("1 X 01/01/2024 1 1.00 1.00"), CascadeOutcome::NoMatch);
    }

    #[test]
    fn test_loose_is_opt_in() {
        assert_eq!(
            Cascade::default().strategies(),
            vec![Strategy::Horizontal, Strategy::Vertical]
        );

        let config = ExtractionConfig {
            enable_loose_heuristics: true,
        };
        assert_eq!(
            Cascade::from_config(&config).strategies(),
            vec![Strategy::Horizontal, Strategy::Vertical, Strategy::Loose]
        );
    }
}
