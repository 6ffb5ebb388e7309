//! Typed interaction rules
//!
//! `InteractionRuleTable` is a flattened `type_count x type_count` matrix of
//! [`InteractionRule`]s keyed by the ordered pair `(source, target)`:
//! `rule(source, target)` describes the force a `source` particle exerts on a
//! `target` particle. The table is not symmetric, `rule(a, b)` and `rule(b, a)`
//! are independent entries.
//!
//! `asymmetry` controls the reaction felt by the source:
//! - `0.0` -> only the target is pushed/pulled, the source feels nothing
//! - `1.0` -> the source gets the equal and opposite reaction

use std::fmt;
use std::str::FromStr;

use log::info;
use serde::Deserialize;

use crate::error::SimError;

/// Shape of the attraction part of a rule between `min_distance` and
/// `activation_distance`
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForceFalloff {
    #[serde(rename = "inverse_square")]
    InverseSquare,
    #[serde(rename = "linear")]
    Linear,
    #[serde(rename = "exponential")]
    Exponential,
    #[serde(rename = "constant")]
    Constant,
}

/// Decay rate of the exponential falloff over the active span
const EXPONENTIAL_DECAY: f64 = 3.0;

#[derive(Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct InteractionRule {
    pub attraction: f64, // signed, > 0 pulls the target toward the source
    pub repulsion: f64, // short range push, >= 0
    pub min_distance: f64, // below this the repulsion dominates
    pub activation_distance: f64, // beyond this there is no force
    pub falloff: ForceFalloff,
    pub asymmetry: f64, // [0, 1] share of the reaction felt by the source
}

impl InteractionRule {
    /// Mild self-repulsion, the default for same-type pairs
    pub fn self_default() -> Self {
        Self {
            attraction: -0.2,
            repulsion: 1.0,
            min_distance: 12.0,
            activation_distance: 40.0,
            falloff: ForceFalloff::Linear,
            asymmetry: 1.0,
        }
    }

    /// Weak attraction, the default for cross-type pairs
    pub fn cross_default() -> Self {
        Self {
            attraction: 0.3,
            repulsion: 0.5,
            min_distance: 10.0,
            activation_distance: 80.0,
            falloff: ForceFalloff::InverseSquare,
            asymmetry: 1.0,
        }
    }

    /// A rule that exerts no force at all
    pub fn inert() -> Self {
        Self {
            attraction: 0.0,
            repulsion: 0.0,
            min_distance: 1.0,
            activation_distance: 2.0,
            falloff: ForceFalloff::Constant,
            asymmetry: 0.0,
        }
    }

    pub fn default_for(source: usize, target: usize) -> Self {
        if source == target {
            Self::self_default()
        } else {
            Self::cross_default()
        }
    }

    /// Signed force magnitude at separation `d` (positive = toward the other
    /// particle). Zero beyond `activation_distance`.
    pub fn force(&self, d: f64) -> f64 {
        if d > self.activation_distance {
            return 0.0;
        }

        if d < self.min_distance {
            return -self.repulsion * (1.0 - d / self.min_distance);
        }

        let span = (self.activation_distance - self.min_distance).max(f64::EPSILON);
        let u = (d - self.min_distance) / span;

        match self.falloff {
            ForceFalloff::Constant => self.attraction,
            ForceFalloff::Linear => self.attraction * (1.0 - u),
            ForceFalloff::InverseSquare => {
                let ratio = self.min_distance / d;
                self.attraction * ratio * ratio
            }
            ForceFalloff::Exponential => self.attraction * (-EXPONENTIAL_DECAY * u).exp(),
        }
    }

    /// Clamp fields into their valid ranges
    pub fn sanitized(mut self) -> Self {
        self.repulsion = self.repulsion.max(0.0);
        self.min_distance = self.min_distance.max(f64::EPSILON);
        if self.activation_distance <= self.min_distance {
            self.activation_distance = self.min_distance * 2.0;
        }
        self.asymmetry = self.asymmetry.clamp(0.0, 1.0);
        self
    }
}

/// Built-in parameter sets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    /// Each type chases the next one around a cycle; orbiting clumps
    StableOrbits,
    /// Same-type cohesion, cross-type repulsion
    SegregatedClusters,
    /// Type `t` hunts `t + 1` which flees, without reaction on the hunter
    PredatorPrey,
    /// Every pair inert apart from short range repulsion
    Neutral,
}

impl Preset {
    pub const ALL: [Preset; 4] = [Preset::StableOrbits, Preset::SegregatedClusters, Preset::PredatorPrey, Preset::Neutral];

    pub fn name(self) -> &'static str {
        match self {
            Preset::StableOrbits => "stable_orbits",
            Preset::SegregatedClusters => "segregated_clusters",
            Preset::PredatorPrey => "predator_prey",
            Preset::Neutral => "neutral",
        }
    }

    fn rule(self, source: usize, target: usize, type_count: usize) -> InteractionRule {
        let next = (source + 1) % type_count;
        let prev = (source + type_count - 1) % type_count;

        match self {
            Preset::StableOrbits => {
                if source == target {
                    InteractionRule {
                        attraction: 0.6,
                        repulsion: 2.0,
                        min_distance: 8.0,
                        activation_distance: 50.0,
                        falloff: ForceFalloff::Linear,
                        asymmetry: 1.0,
                    }
                } else if target == next {
                    // source drags the next type along, no pull back
                    InteractionRule {
                        attraction: 0.8,
                        repulsion: 1.5,
                        min_distance: 10.0,
                        activation_distance: 90.0,
                        falloff: ForceFalloff::InverseSquare,
                        asymmetry: 0.0,
                    }
                } else if target == prev {
                    InteractionRule {
                        attraction: -0.3,
                        repulsion: 1.5,
                        min_distance: 10.0,
                        activation_distance: 60.0,
                        falloff: ForceFalloff::Linear,
                        asymmetry: 0.0,
                    }
                } else {
                    InteractionRule::cross_default()
                }
            }
            Preset::SegregatedClusters => {
                if source == target {
                    InteractionRule {
                        attraction: 1.0,
                        repulsion: 2.5,
                        min_distance: 8.0,
                        activation_distance: 70.0,
                        falloff: ForceFalloff::Linear,
                        asymmetry: 1.0,
                    }
                } else {
                    InteractionRule {
                        attraction: -0.8,
                        repulsion: 2.5,
                        min_distance: 10.0,
                        activation_distance: 60.0,
                        falloff: ForceFalloff::Exponential,
                        asymmetry: 1.0,
                    }
                }
            }
            Preset::PredatorPrey => {
                if source == target {
                    InteractionRule::self_default()
                } else if target == prev {
                    // prey pulls its predator in
                    InteractionRule {
                        attraction: 1.2,
                        repulsion: 1.0,
                        min_distance: 6.0,
                        activation_distance: 120.0,
                        falloff: ForceFalloff::Constant,
                        asymmetry: 0.0,
                    }
                } else if target == next {
                    // predator scares its prey away
                    InteractionRule {
                        attraction: -1.5,
                        repulsion: 1.0,
                        min_distance: 6.0,
                        activation_distance: 100.0,
                        falloff: ForceFalloff::Linear,
                        asymmetry: 0.0,
                    }
                } else {
                    InteractionRule::inert()
                }
            }
            Preset::Neutral => InteractionRule {
                attraction: 0.0,
                repulsion: 1.0,
                min_distance: 10.0,
                activation_distance: 20.0,
                falloff: ForceFalloff::Constant,
                asymmetry: 1.0,
            },
        }
    }
}

impl FromStr for Preset {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Preset::ALL
            .into_iter()
            .find(|p| p.name() == s)
            .ok_or_else(|| SimError::UnknownPreset(s.to_string()))
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone)]
pub struct InteractionRuleTable {
    rules: Vec<InteractionRule>, // [source * type_count + target]
    type_count: usize,
    reach: Vec<f64>, // per type, max activation over its row and column
}

impl InteractionRuleTable {
    pub fn new(type_count: usize) -> Self {
        let mut table = Self {
            rules: Vec::new(),
            type_count: 0,
            reach: Vec::new(),
        };
        table.resize(type_count);
        table
    }

    pub fn type_count(&self) -> usize {
        self.type_count
    }

    fn check(&self, kind: usize) -> Result<(), SimError> {
        if kind < self.type_count {
            Ok(())
        } else {
            Err(SimError::InvalidType { kind, type_count: self.type_count })
        }
    }

    pub fn get(&self, source: usize, target: usize) -> Result<InteractionRule, SimError> {
        self.check(source)?;
        self.check(target)?;
        Ok(self.rules[source * self.type_count + target])
    }

    /// Unchecked lookup for the hot loop; both types must be `< type_count`
    pub(crate) fn rule(&self, source: usize, target: usize) -> &InteractionRule {
        &self.rules[source * self.type_count + target]
    }

    /// Store `rule` for the pair. The rule is clamped with
    /// [`InteractionRule::sanitized`] first, so `get` returns the clamped
    /// values (e.g. an asymmetry of 1.5 reads back as 1.0).
    pub fn set(&mut self, source: usize, target: usize, rule: InteractionRule) -> Result<(), SimError> {
        self.check(source)?;
        self.check(target)?;
        self.rules[source * self.type_count + target] = rule.sanitized();
        self.update_reach();
        Ok(())
    }

    /// Resize to `type_count` types. Pairs present before and after keep
    /// their rule, every other pair gets the default.
    pub fn resize(&mut self, type_count: usize) {
        let old_count = self.type_count;
        let keep = old_count.min(type_count);

        let mut rules = Vec::with_capacity(type_count * type_count);
        for s in 0..type_count {
            for t in 0..type_count {
                if s < keep && t < keep {
                    rules.push(self.rules[s * old_count + t]);
                } else {
                    rules.push(InteractionRule::default_for(s, t));
                }
            }
        }

        self.rules = rules;
        self.type_count = type_count;
        self.update_reach();
    }

    /// Replace every entry with the named preset. Unknown names leave the
    /// table untouched.
    pub fn apply_preset(&mut self, name: &str) -> Result<(), SimError> {
        let preset: Preset = name.parse()?;
        let n = self.type_count;
        for s in 0..n {
            for t in 0..n {
                self.rules[s * n + t] = preset.rule(s, t, n);
            }
        }
        self.update_reach();
        info!("applied preset {preset} to {n} types");
        Ok(())
    }

    /// Largest activation distance that can affect a particle of `kind`,
    /// either as target (column) or as source receiving a reaction (row)
    pub fn max_reach(&self, kind: usize) -> f64 {
        self.reach.get(kind).copied().unwrap_or(0.0)
    }

    fn update_reach(&mut self) {
        let n = self.type_count;
        self.reach = (0..n)
            .map(|k| {
                (0..n)
                    .map(|o| {
                        let row = self.rules[k * n + o].activation_distance;
                        let col = self.rules[o * n + k].activation_distance;
                        row.max(col)
                    })
                    .fold(0.0, f64::max)
            })
            .collect();
    }
}
