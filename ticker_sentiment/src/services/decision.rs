use crate::models::{AggregateResult, ArticleSentiment, SentimentLabel};

/// Нижние границы полос (включительно), проверяются сверху вниз.
/// Всё, что ниже `somewhat_bearish`, считается Bearish.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdPolicy {
    pub bullish: f64,
    pub somewhat_bullish: f64,
    pub neutral: f64,
    pub somewhat_bearish: f64,
}

impl ThresholdPolicy {
    /// Пороги для оценок FinBERT: и для отдельной статьи, и для среднего по тикеру
    pub const FINBERT: ThresholdPolicy = ThresholdPolicy {
        bullish: 0.5,
        somewhat_bullish: 0.2,
        neutral: -0.2,
        somewhat_bearish: -0.5,
    };

    /// Пороги для собственных оценок Alpha Vantage (ticker_sentiment_score)
    pub const ALPHA_VANTAGE: ThresholdPolicy = ThresholdPolicy {
        bullish: 0.35,
        somewhat_bullish: 0.15,
        neutral: -0.15,
        somewhat_bearish: -0.35,
    };

    pub fn label_for(&self, score: f64) -> SentimentLabel {
        // NaN не проходит ни одно сравнение и попадает в Bearish
        if score >= self.bullish {
            SentimentLabel::Bullish
        } else if score >= self.somewhat_bullish {
            SentimentLabel::SomewhatBullish
        } else if score >= self.neutral {
            SentimentLabel::Neutral
        } else if score >= self.somewhat_bearish {
            SentimentLabel::SomewhatBearish
        } else {
            SentimentLabel::Bearish
        }
    }
}

impl Default for ThresholdPolicy {
    fn default() -> Self {
        ThresholdPolicy::FINBERT
    }
}

pub fn threshold_label(score: f64) -> SentimentLabel {
    ThresholdPolicy::FINBERT.label_for(score)
}

pub fn aggregate(scores: &[f64], labels: &[SentimentLabel]) -> AggregateResult {
    aggregate_with(&ThresholdPolicy::FINBERT, scores, labels)
}

/// Сводит оценки статей в итог по тикеру.
///
/// `labels[i]` должна соответствовать `scores[i]`; метки здесь не пересчитываются.
/// Пустой вход даёт `AggregateResult::NoData`.
pub fn aggregate_with(
    policy: &ThresholdPolicy,
    scores: &[f64],
    labels: &[SentimentLabel],
) -> AggregateResult {
    debug_assert_eq!(scores.len(), labels.len(), "scores и labels разной длины");

    let most_common_label = match most_common_label(labels) {
        Some(label) if !scores.is_empty() => label,
        _ => return AggregateResult::NoData,
    };

    let average_score = scores.iter().sum::<f64>() / scores.len() as f64;

    AggregateResult::Computed {
        final_label: policy.label_for(average_score),
        average_score,
        most_common_label,
    }
}

pub fn aggregate_articles(articles: &[ArticleSentiment]) -> AggregateResult {
    let scores: Vec<f64> = articles.iter().map(|a| a.score).collect();
    let labels: Vec<SentimentLabel> = articles.iter().map(|a| a.label).collect();
    aggregate(&scores, &labels)
}

/// Самая частая метка. При равенстве побеждает метка, встреченная раньше.
pub fn most_common_label(labels: &[SentimentLabel]) -> Option<SentimentLabel> {
    // Счётчики в порядке первого появления
    let mut counts: Vec<(SentimentLabel, usize)> = Vec::with_capacity(SentimentLabel::ALL.len());
    for &label in labels {
        match counts.iter_mut().find(|(seen, _)| *seen == label) {
            Some((_, count)) => *count += 1,
            None => counts.push((label, 1)),
        }
    }

    counts
        .into_iter()
        .fold(None, |best: Option<(SentimentLabel, usize)>, (label, count)| match best {
            Some((_, best_count)) if best_count >= count => best,
            _ => Some((label, count)),
        })
        .map(|(label, _)| label)
}

pub fn round_score(score: f64, digits: i32) -> f64 {
    let factor = 10f64.powi(digits);
    (score * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NO_DATA, NO_SENTIMENT_DATA};
    use crate::models::SentimentLabel::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn threshold_boundaries_are_lower_inclusive() {
        assert_eq!(threshold_label(0.5), Bullish);
        assert_eq!(threshold_label(0.4999), SomewhatBullish);
        assert_eq!(threshold_label(0.2), SomewhatBullish);
        assert_eq!(threshold_label(0.1999), Neutral);
        assert_eq!(threshold_label(-0.2), Neutral);
        assert_eq!(threshold_label(-0.2001), SomewhatBearish);
        assert_eq!(threshold_label(-0.5), SomewhatBearish);
        assert_eq!(threshold_label(-0.5001), Bearish);
        assert_eq!(threshold_label(1.0), Bullish);
        assert_eq!(threshold_label(-1.0), Bearish);
        assert_eq!(threshold_label(0.0), Neutral);
    }

    #[test]
    fn threshold_bands_partition_the_line() {
        // Независимая таблица интервалов [low, high)
        let bands = [
            (0.5, f64::INFINITY, Bullish),
            (0.2, 0.5, SomewhatBullish),
            (-0.2, 0.2, Neutral),
            (-0.5, -0.2, SomewhatBearish),
            (f64::NEG_INFINITY, -0.5, Bearish),
        ];

        for step in -1500..=1500 {
            let score = step as f64 / 1000.0;
            let matching: Vec<SentimentLabel> = bands
                .iter()
                .filter(|(low, high, _)| score >= *low && score < *high)
                .map(|(_, _, label)| *label)
                .collect();
            assert_eq!(matching.len(), 1, "score {} попал в {:?}", score, matching);
            assert_eq!(threshold_label(score), matching[0], "score {}", score);
        }
    }

    #[test]
    fn threshold_is_total_for_non_finite_scores() {
        assert_eq!(threshold_label(f64::INFINITY), Bullish);
        assert_eq!(threshold_label(f64::NEG_INFINITY), Bearish);
        assert_eq!(threshold_label(f64::NAN), Bearish);
    }

    #[test]
    fn vendor_policy_uses_the_same_boundary_semantics() {
        let policy = ThresholdPolicy::ALPHA_VANTAGE;
        assert_eq!(policy.label_for(0.35), Bullish);
        assert_eq!(policy.label_for(0.15), SomewhatBullish);
        assert_eq!(policy.label_for(-0.15), Neutral);
        assert_eq!(policy.label_for(-0.35), SomewhatBearish);
        assert_eq!(policy.label_for(-0.36), Bearish);
        assert_eq!(ThresholdPolicy::default(), ThresholdPolicy::FINBERT);
    }

    #[test]
    fn empty_input_yields_no_data_sentinel() {
        let result = aggregate(&[], &[]);
        assert_eq!(result, AggregateResult::NoData);
        assert_eq!(result.as_triple(), (NO_SENTIMENT_DATA, 0.0, NO_DATA));
        assert!(aggregate_articles(&[]).is_no_data());
    }

    #[test]
    fn single_article_passes_through() {
        let result = aggregate(&[0.6], &[Bullish]);
        assert_eq!(
            result,
            AggregateResult::Computed {
                final_label: Bullish,
                average_score: 0.6,
                most_common_label: Bullish,
            }
        );
        assert_eq!(result.as_triple(), ("Bullish", 0.6, "Bullish"));
    }

    #[test]
    fn opposite_articles_average_to_neutral_and_first_label_wins_tie() {
        let result = aggregate(&[0.6, -0.6], &[Bullish, Bearish]);
        assert_eq!(result.final_label(), Some(Neutral));
        assert!(approx(result.average_score(), 0.0));
        assert_eq!(result.most_common_label(), Some(Bullish));

        let reversed = aggregate(&[-0.6, 0.6], &[Bearish, Bullish]);
        assert_eq!(reversed.most_common_label(), Some(Bearish));
    }

    #[test]
    fn majority_label_and_average_are_independent() {
        let result = aggregate(&[0.1, 0.1, -0.9], &[Neutral, Neutral, Bearish]);
        assert_eq!(result.most_common_label(), Some(Neutral));
        assert!(approx(result.average_score(), -0.7 / 3.0));
        assert_eq!(result.final_label(), Some(SomewhatBearish));
    }

    #[test]
    fn tie_goes_to_first_seen_label() {
        assert_eq!(most_common_label(&[Bullish, Bearish, Bearish, Bullish]), Some(Bullish));
        assert_eq!(most_common_label(&[Neutral, Bearish, Bullish]), Some(Neutral));
        assert_eq!(most_common_label(&[Neutral, Bearish, Bearish]), Some(Bearish));
        assert_eq!(
            most_common_label(&[SomewhatBullish, Neutral, Neutral, SomewhatBullish, Bearish]),
            Some(SomewhatBullish)
        );
        assert_eq!(most_common_label(&[]), None);
    }

    #[test]
    fn average_is_not_rounded_inside_aggregate() {
        let result = aggregate(&[0.1234, 0.5678, 0.0001], &[Neutral, Bullish, Neutral]);
        assert!(approx(result.average_score(), (0.1234 + 0.5678 + 0.0001) / 3.0));
        assert!(approx(round_score(result.average_score(), 3), 0.230));
    }

    #[test]
    fn final_label_comes_from_average_not_from_labels() {
        // Метки не пересчитываются, итог считается только по среднему
        let result = aggregate(&[0.9, 0.8], &[Bearish, Bearish]);
        assert_eq!(result.final_label(), Some(Bullish));
        assert_eq!(result.most_common_label(), Some(Bearish));
    }

    #[test]
    fn aggregate_is_idempotent() {
        let scores = [0.3, -0.1, 0.7, -0.4];
        let labels: Vec<SentimentLabel> = scores.iter().map(|s| threshold_label(*s)).collect();
        let first = aggregate(&scores, &labels);
        let second = aggregate(&scores, &labels);
        assert_eq!(first, second);
    }

    #[test]
    fn aggregate_articles_matches_parallel_slices() {
        let articles = [
            ArticleSentiment { score: 0.25, label: SomewhatBullish },
            ArticleSentiment { score: -0.6, label: Bearish },
            ArticleSentiment { score: 0.3, label: SomewhatBullish },
        ];
        let result = aggregate_articles(&articles);
        let labels = [SomewhatBullish, Bearish, SomewhatBullish];
        assert_eq!(result, aggregate(&[0.25, -0.6, 0.3], &labels));
        assert_eq!(result.most_common_label(), Some(SomewhatBullish));
        assert_eq!(result.final_label(), Some(Neutral));
    }

    #[test]
    fn round_score_keeps_three_digits() {
        assert!(approx(round_score(0.34567, 3), 0.346));
        assert!(approx(round_score(-0.23333, 3), -0.233));
        assert!(approx(round_score(0.0, 3), 0.0));
    }
}
