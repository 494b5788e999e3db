use common::{
    BookLevel, Candle, MarketContext, MarketTicker, OrderBook, Sentiment, SentimentReading,
};
use proptest::prelude::*;
use strategy::{filter, FilterConfig, ScoringConfig, Scorer, Verdict};

fn sentiment() -> impl Strategy<Value = Sentiment> {
    prop_oneof![Just(Sentiment::Bullish), Just(Sentiment::Neutral), Just(Sentiment::Bearish)]
}

prop_compose! {
    fn context()(
        price in 0.01f64..100_000.0,
        change in -7.9f64..7.9,
        steps in prop::collection::vec(-0.05f64..0.05, 2..30),
        funding in -0.01f64..0.01,
        oi in -20.0f64..20.0,
        bid_qty in 0.0f64..10_000.0,
        ask_qty in 0.0f64..10_000.0,
        liq_offsets in prop::collection::vec(-0.05f64..0.05, 0..4),
        label in sentiment(),
    ) -> MarketContext {
        let mut close = price;
        let candles = steps
            .iter()
            .map(|s| {
                close *= 1.0 + s;
                Candle { open: close, high: close * 1.01, low: close * 0.99, close }
            })
            .collect();
        MarketContext {
            ticker: MarketTicker {
                symbol: "PROP".into(),
                price,
                volume_usd: 50_000_000.0,
                price_change_percent: change,
                listed_days: None,
            },
            candles,
            funding_rate: funding,
            open_interest_change_pct: oi,
            order_book: OrderBook {
                bids: vec![BookLevel { price: price * 0.995, quantity: bid_qty }],
                asks: vec![BookLevel { price: price * 1.005, quantity: ask_qty }],
            },
            liquidation_levels: liq_offsets.iter().map(|o| price * (1.0 + o)).collect(),
            sentiment: SentimentReading { label, headline: None },
        }
    }
}

proptest! {
    /// The filter never admits a ticker at or below the volume threshold.
    #[test]
    fn filter_excludes_thin_volume(
        volume in 0.0f64..=25_000_000.0,
        change in -20.0f64..20.0,
    ) {
        let ticker = MarketTicker {
            symbol: "THIN".into(),
            price: 1.0,
            volume_usd: volume,
            price_change_percent: change,
            listed_days: None,
        };
        prop_assert!(!filter::passes(&FilterConfig::default(), &ticker));
    }

    /// Accepted candidates always clear the configured minimum.
    #[test]
    fn accepted_confidence_clears_minimum(
        ctx in context(),
        min_confidence in 60.0f64..100.0,
    ) {
        let scorer = Scorer::new(ScoringConfig { min_confidence, ..ScoringConfig::default() });
        if let Verdict::Accepted(c) = scorer.evaluate(&ctx) {
            prop_assert!(c.confidence >= min_confidence);
            prop_assert!(c.confidence <= 100.0);
            prop_assert!(c.atr > 0.0);
        }
    }

    /// Same input, same verdict.
    #[test]
    fn scorer_is_deterministic(ctx in context()) {
        let scorer = Scorer::new(ScoringConfig::default());
        prop_assert_eq!(scorer.evaluate(&ctx), scorer.evaluate(&ctx));
    }
}
