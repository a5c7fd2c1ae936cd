//! Resolver strategies: reduce a field's candidates to one winner.

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::catalog::CompiledField;
use crate::models::config::PriorityConfig;

use super::collector::Candidate;

/// Which resolver decides a field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolverStrategy {
    /// First-match-wins by pattern rank.
    #[default]
    Priority,
    /// Plurality vote among raw values.
    Voting,
}

impl ResolverStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolverStrategy::Priority => "priority",
            ResolverStrategy::Voting => "voting",
        }
    }
}

impl std::str::FromStr for ResolverStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "priority" => Ok(ResolverStrategy::Priority),
            "voting" | "vote" => Ok(ResolverStrategy::Voting),
            other => Err(format!("unknown resolver strategy: {}", other)),
        }
    }
}

/// The resolver's pick for a field.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    /// Trimmed raw value.
    pub raw_value: String,
    /// Confidence in [0, 1].
    pub confidence: f64,
    /// Index of the pattern that produced the value.
    pub pattern_index: usize,
    /// Source of that pattern.
    pub matched_pattern: String,
    /// Byte offset of the value in the normalized text.
    pub position: usize,
}

/// Trait for candidate resolution strategies.
pub trait Resolver: Send + Sync {
    /// All distinct candidate values, best first.
    fn rank(&self, field: &CompiledField, candidates: &[Candidate]) -> Vec<Resolution>;

    /// The winning candidate, or `None` when there are no candidates.
    fn resolve(&self, field: &CompiledField, candidates: &[Candidate]) -> Option<Resolution> {
        self.rank(field, candidates).into_iter().next()
    }
}

fn resolution(field: &CompiledField, candidate: &Candidate, confidence: f64) -> Resolution {
    Resolution {
        raw_value: candidate.raw_value.trim().to_string(),
        confidence,
        pattern_index: candidate.pattern_index,
        matched_pattern: field
            .pattern_source(candidate.pattern_index)
            .unwrap_or_default()
            .to_string(),
        position: candidate.span.0,
    }
}

/// Priority strategy: trust decreases with pattern rank.
#[derive(Debug, Clone)]
pub struct PriorityResolver {
    base: f64,
    penalty: f64,
    floor: f64,
}

impl PriorityResolver {
    /// Create a resolver with the default constants (1.0 / 0.15 / 0.1).
    pub fn new() -> Self {
        Self::from_config(&PriorityConfig::default())
    }

    pub fn from_config(config: &PriorityConfig) -> Self {
        Self {
            base: config.base,
            penalty: config.penalty,
            floor: config.floor,
        }
    }

    /// Confidence assigned to a candidate from pattern `index`.
    pub fn confidence_for(&self, index: usize) -> f64 {
        (self.base - index as f64 * self.penalty)
            .max(self.floor)
            .clamp(0.0, 1.0)
    }
}

impl Default for PriorityResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl Resolver for PriorityResolver {
    fn rank(&self, field: &CompiledField, candidates: &[Candidate]) -> Vec<Resolution> {
        let mut ranked: Vec<Resolution> = candidates
            .iter()
            .filter(|c| !c.raw_value.trim().is_empty())
            .map(|c| resolution(field, c, self.confidence_for(c.pattern_index)))
            .collect();

        // Every candidate is scored, so a lower-ranked pattern that happens to
        // match earlier in the text never beats a higher-ranked one.
        ranked.sort_by(|a, b| {
            b.confidence
                .total_cmp(&a.confidence)
                .then(a.pattern_index.cmp(&b.pattern_index))
                .then(a.position.cmp(&b.position))
        });

        let mut seen = std::collections::HashSet::new();
        ranked.retain(|r| seen.insert(r.raw_value.clone()));
        ranked
    }
}

/// Voting strategy: the most frequent raw value wins.
#[derive(Debug, Clone, Default)]
pub struct VotingResolver;

impl VotingResolver {
    pub fn new() -> Self {
        Self
    }
}

struct Tally<'a> {
    first: &'a Candidate,
    votes: usize,
}

impl Resolver for VotingResolver {
    fn rank(&self, field: &CompiledField, candidates: &[Candidate]) -> Vec<Resolution> {
        let mut tallies: Vec<Tally> = Vec::new();
        let mut index: HashMap<&str, usize> = HashMap::new();
        let mut total = 0usize;

        for candidate in candidates {
            let value = candidate.raw_value.trim();
            if value.is_empty() {
                continue;
            }
            total += 1;
            match index.get(value) {
                Some(&i) => tallies[i].votes += 1,
                None => {
                    index.insert(value, tallies.len());
                    tallies.push(Tally {
                        first: candidate,
                        votes: 1,
                    });
                }
            }
        }

        tallies.sort_by(|a, b| match b.votes.cmp(&a.votes) {
            Ordering::Equal => a
                .first
                .pattern_index
                .cmp(&b.first.pattern_index)
                .then(a.first.span.0.cmp(&b.first.span.0)),
            other => other,
        });

        tallies
            .iter()
            .map(|t| resolution(field, t.first, t.votes as f64 / total as f64))
            .collect()
    }
}
