// src/scorer.rs
//! Trend scoring.
//!
//! Each raw signal is normalized against the batch maximum of that signal
//! (`value / max(1, batch_max)`), so a batch of small counts and a batch of
//! huge counts both land in [0,1]. Recency decays linearly to zero over the
//! configured horizon.
//!
//! score = 100 * (w_views*views + w_likes*likes + w_comments*comments
//!                + w_shares*shares + w_recency*recency)
//!
//! The reference time is an argument, never read from a clock here, so the
//! same batch always scores the same.

use chrono::{DateTime, Utc};

use crate::config::ScoreWeights;
use crate::record::TrendItem;

pub const DEFAULT_HORIZON_HOURS: f64 = 48.0;

/// Normalized signals in [0,1] for one record.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SignalInputs {
    pub views: f64,
    pub likes: f64,
    pub comments: f64,
    pub shares: f64,
    pub recency: f64,
}

/// Weighted sum of the signals, scaled to 0..100 per unit weight.
pub fn weighted_score(s: &SignalInputs, w: &ScoreWeights) -> f64 {
    let raw = s.views * w.views
        + s.likes * w.likes
        + s.comments * w.comments
        + s.shares * w.shares
        + s.recency * w.recency;
    let score = 100.0 * raw;
    if score.is_finite() {
        score.max(0.0)
    } else {
        0.0
    }
}

#[derive(Debug, Clone)]
pub struct TrendScorer {
    weights: ScoreWeights,
    horizon_hours: f64,
}

impl Default for TrendScorer {
    fn default() -> Self {
        Self::new(ScoreWeights::default(), DEFAULT_HORIZON_HOURS)
    }
}

impl TrendScorer {
    /// Negative or non-finite weights are treated as 0.
    pub fn new(weights: ScoreWeights, horizon_hours: f64) -> Self {
        fn c(x: f64) -> f64 {
            if x.is_finite() {
                x.max(0.0)
            } else {
                0.0
            }
        }
        Self {
            weights: ScoreWeights {
                views: c(weights.views),
                likes: c(weights.likes),
                comments: c(weights.comments),
                shares: c(weights.shares),
                recency: c(weights.recency),
            },
            horizon_hours,
        }
    }

    pub fn weights(&self) -> &ScoreWeights {
        &self.weights
    }

    /// `max(0, 1 - age_hours / horizon)`, age from `published_at` else `fetched_at`.
    pub fn recency(&self, item: &TrendItem, now: DateTime<Utc>) -> f64 {
        if self.horizon_hours.is_nan() || self.horizon_hours <= 0.0 {
            return 0.0;
        }
        let reference = item.published_at.unwrap_or(item.fetched_at);
        let age_ms = now.signed_duration_since(reference).num_milliseconds().max(0);
        let age_hours = age_ms as f64 / 3_600_000.0;
        (1.0 - age_hours / self.horizon_hours).max(0.0)
    }

    /// Score a batch and return it ordered by descending score.
    /// Equal scores keep their input order.
    pub fn score_all(&self, mut items: Vec<TrendItem>, now: DateTime<Utc>) -> Vec<TrendItem> {
        let maxima = BatchMax::of(&items);
        for it in items.iter_mut() {
            let inputs = SignalInputs {
                views: maxima.norm_views(it.views),
                likes: maxima.norm_likes(it.likes),
                comments: maxima.norm_comments(it.comments),
                shares: maxima.norm_shares(it.shares),
                recency: self.recency(it, now),
            };
            it.trend_score = weighted_score(&inputs, &self.weights);
        }
        items.sort_by(|a, b| b.trend_score.total_cmp(&a.trend_score));
        items
    }
}

#[derive(Debug, Default)]
struct BatchMax {
    views: u64,
    likes: u64,
    comments: u64,
    shares: u64,
}

impl BatchMax {
    fn of(items: &[TrendItem]) -> Self {
        items.iter().fold(Self::default(), |m, it| Self {
            views: m.views.max(it.views),
            likes: m.likes.max(it.likes),
            comments: m.comments.max(it.comments),
            shares: m.shares.max(it.shares),
        })
    }

    fn norm(value: u64, max: u64) -> f64 {
        value as f64 / max.max(1) as f64
    }

    fn norm_views(&self, v: u64) -> f64 {
        Self::norm(v, self.views)
    }
    fn norm_likes(&self, v: u64) -> f64 {
        Self::norm(v, self.likes)
    }
    fn norm_comments(&self, v: u64) -> f64 {
        Self::norm(v, self.comments)
    }
    fn norm_shares(&self, v: u64) -> f64 {
        Self::norm(v, self.shares)
    }
}
