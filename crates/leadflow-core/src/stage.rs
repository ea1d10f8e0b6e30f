// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Stage model: the two ordered stage sequences and their locked stages.
//!
//! Each sequence is a closed enum implementing [`Stage`]. Rank is the
//! position in the sequence's canonical order; the last stage of both
//! sequences is the failure stage `lost`.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Identifies which lifecycle a stage belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Sequence {
    /// Lead qualification funnel.
    Cold,
    /// Sale fulfillment funnel.
    Sale,
}

impl Sequence {
    /// Name of the entity that moves through this sequence.
    pub fn entity(self) -> &'static str {
        match self {
            Self::Cold => "lead",
            Self::Sale => "sale",
        }
    }
}

/// A stage within one ordered sequence.
///
/// Implementors supply the canonical order, the locked subset, and the
/// failure stage; rank, lock checks, and successor lookup derive from those.
pub trait Stage: Copy + Eq + fmt::Debug + fmt::Display + Send + Sync + 'static {
    /// Which sequence this stage type models.
    const SEQUENCE: Sequence;
    /// Every stage in rank order.
    const ORDER: &'static [Self];
    /// Stages whose outgoing transitions are forbidden.
    const LOCKED: &'static [Self];
    /// Terminal failure stage, reachable from any non-locked stage.
    const FAILURE: Self;
    /// Stage a freshly created entity starts in.
    const INITIAL: Self;

    /// Index of this stage in [`Stage::ORDER`].
    fn rank(self) -> usize;

    /// Whether transitions out of this stage are forbidden.
    fn is_locked(self) -> bool {
        Self::LOCKED.contains(&self)
    }

    /// The stage one rank above this one, if any.
    fn next(self) -> Option<Self> {
        Self::ORDER.get(self.rank() + 1).copied()
    }
}

/// Cold (qualification) sequence: `new → contacted → qualified → transferred → lost`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ColdStage {
    New,
    Contacted,
    Qualified,
    Transferred,
    Lost,
}

impl Stage for ColdStage {
    const SEQUENCE: Sequence = Sequence::Cold;
    const ORDER: &'static [Self] = &[
        Self::New,
        Self::Contacted,
        Self::Qualified,
        Self::Transferred,
        Self::Lost,
    ];
    const LOCKED: &'static [Self] = &[Self::Transferred];
    const FAILURE: Self = Self::Lost;
    const INITIAL: Self = Self::New;

    fn rank(self) -> usize {
        match self {
            Self::New => 0,
            Self::Contacted => 1,
            Self::Qualified => 2,
            Self::Transferred => 3,
            Self::Lost => 4,
        }
    }
}

/// Sale (fulfillment) sequence: `new → kyc → agreement → paid → lost`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SaleStage {
    New,
    Kyc,
    Agreement,
    Paid,
    Lost,
}

impl Stage for SaleStage {
    const SEQUENCE: Sequence = Sequence::Sale;
    const ORDER: &'static [Self] = &[
        Self::New,
        Self::Kyc,
        Self::Agreement,
        Self::Paid,
        Self::Lost,
    ];
    const LOCKED: &'static [Self] = &[Self::Paid];
    const FAILURE: Self = Self::Lost;
    const INITIAL: Self = Self::New;

    fn rank(self) -> usize {
        match self {
            Self::New => 0,
            Self::Kyc => 1,
            Self::Agreement => 2,
            Self::Paid => 3,
            Self::Lost => 4,
        }
    }
}
