//! Owner schedules: the raw published availability and the classified
//! visible schedule derived from it.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::block::AvailableBlock;
use crate::preferences::MeetingDurations;

/// Classification of a block in a [`VisibleSchedule`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AvailableStatus {
    /// Bookable by the visitor.
    Free,
    /// Covered by other calendar activity, or at capacity.
    Busy,
    /// The visitor already attends an appointment in this block.
    Attending,
}

/// The owner's published availability: an ordered set of non-overlapping
/// blocks. Never mutated after construction; derived views return new
/// values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailableSchedule {
    blocks: BTreeSet<AvailableBlock>,
}

impl AvailableSchedule {
    /// Build a schedule from a collection of blocks.
    pub fn new(blocks: impl IntoIterator<Item = AvailableBlock>) -> Self {
        Self { blocks: blocks.into_iter().collect() }
    }

    /// The published blocks, in time order.
    pub fn blocks(&self) -> impl Iterator<Item = &AvailableBlock> {
        self.blocks.iter()
    }

    /// True when no blocks are published.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Number of published blocks.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Start of the earliest block, if any.
    pub fn schedule_start(&self) -> Option<DateTime<Utc>> {
        self.blocks.first().map(AvailableBlock::start)
    }

    /// End of the latest block, if any.
    pub fn schedule_end(&self) -> Option<DateTime<Utc>> {
        self.blocks.iter().map(AvailableBlock::end).max()
    }

    /// New schedule keeping only blocks whose start lies in `[start, end)`.
    pub fn subset(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            blocks: self
                .blocks
                .iter()
                .filter(|b| b.start() >= start && b.start() < end)
                .cloned()
                .collect(),
        }
    }

    /// All blocks split into `minutes`-length slots, in time order.
    pub fn expand(&self, minutes: i64) -> Vec<AvailableBlock> {
        let mut slots: Vec<AvailableBlock> =
            self.blocks.iter().flat_map(|b| b.expand(minutes)).collect();
        slots.sort();
        slots.dedup();
        slots
    }

    /// New schedule with each run of adjacent equal-limit blocks merged
    /// into one. Reflection writes the consolidated form so repeat runs
    /// produce identical shadow entries.
    pub fn consolidated(&self) -> Self {
        let ordered: Vec<AvailableBlock> = self.blocks.iter().cloned().collect();
        Self::new(AvailableBlock::combine(&ordered))
    }
}

impl FromIterator<AvailableBlock> for AvailableSchedule {
    fn from_iter<I: IntoIterator<Item = AvailableBlock>>(iter: I) -> Self {
        Self::new(iter)
    }
}

/// The classified, display-ready merge of an owner's availability with
/// their calendar: one status per non-overlapping block.
///
/// Constructed fresh per request and never mutated afterwards; the
/// `set_*` methods exist for the builder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisibleSchedule {
    durations: MeetingDurations,
    blocks: BTreeMap<AvailableBlock, AvailableStatus>,
}

impl VisibleSchedule {
    /// Create an empty schedule that expands free blocks to the owner's
    /// preferred minimum duration.
    pub fn new(durations: MeetingDurations) -> Self {
        Self { durations, blocks: BTreeMap::new() }
    }

    /// The meeting durations this schedule was built with.
    pub fn durations(&self) -> MeetingDurations {
        self.durations
    }

    /// Add a free block, expanded into minimum-duration slots. An existing
    /// entry for the same slot is replaced so the stored key carries the
    /// freshest capacity information.
    pub fn add_free_block(&mut self, block: &AvailableBlock) {
        for slot in block.expand(i64::from(self.durations.min_minutes())) {
            self.blocks.remove(&slot);
            self.blocks.insert(slot, AvailableStatus::Free);
        }
    }

    /// Add every block in the collection as free.
    pub fn add_free_blocks<'a>(&mut self, blocks: impl IntoIterator<Item = &'a AvailableBlock>) {
        for block in blocks {
            self.add_free_block(block);
        }
    }

    /// Replace an existing free entry with `block`, keeping its status.
    /// Used to refresh the attendee count on a slot that stays free. Does
    /// nothing when the slot is not present.
    pub fn overwrite_free_block_if_present(&mut self, block: &AvailableBlock) {
        // relies on block identity ignoring capacity: the new key carries
        // the updated attendee count for the same slot
        if self.blocks.remove(block).is_some() {
            self.blocks.insert(block.clone(), AvailableStatus::Free);
        }
    }

    /// Mark the slot matching `block` busy, or every overlapping slot when
    /// no exact match exists. An attending slot never downgrades to busy:
    /// the actor's own appointment must not show as merely busy to them.
    pub fn set_busy_block(&mut self, block: &AvailableBlock) {
        if let Some(status) = self.blocks.get_mut(block) {
            if *status != AvailableStatus::Attending {
                *status = AvailableStatus::Busy;
            }
            return;
        }
        for conflict in self.locate_conflicting(block) {
            if let Some(status) = self.blocks.get_mut(&conflict) {
                if *status != AvailableStatus::Attending {
                    *status = AvailableStatus::Busy;
                }
            }
        }
    }

    /// Mark the slot matching `block` attending. When no exact match
    /// exists (a double-length appointment spanning two slots), the
    /// overlapping slots are replaced by the single attending block.
    pub fn set_attending_block(&mut self, block: &AvailableBlock) {
        if self.blocks.contains_key(block) {
            self.blocks.insert(block.clone(), AvailableStatus::Attending);
            return;
        }
        let conflicting = self.locate_conflicting(block);
        if !conflicting.is_empty() {
            for conflict in conflicting {
                self.blocks.remove(&conflict);
            }
            self.blocks.insert(block.clone(), AvailableStatus::Attending);
        }
    }

    fn locate_conflicting(&self, block: &AvailableBlock) -> Vec<AvailableBlock> {
        self.blocks.keys().filter(|k| k.overlaps(block)).cloned().collect()
    }

    /// The full block→status map.
    pub fn block_map(&self) -> &BTreeMap<AvailableBlock, AvailableStatus> {
        &self.blocks
    }

    /// Number of classified blocks.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// True when nothing is classified.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    fn list_for(&self, status: AvailableStatus) -> Vec<AvailableBlock> {
        self.blocks.iter().filter(|(_, s)| **s == status).map(|(b, _)| b.clone()).collect()
    }

    /// Blocks the visitor may book.
    pub fn free_list(&self) -> Vec<AvailableBlock> {
        self.list_for(AvailableStatus::Free)
    }

    /// Blocks covered by other calendar activity.
    pub fn busy_list(&self) -> Vec<AvailableBlock> {
        self.list_for(AvailableStatus::Busy)
    }

    /// Blocks the visitor already attends.
    pub fn attending_list(&self) -> Vec<AvailableBlock> {
        self.list_for(AvailableStatus::Attending)
    }

    /// Number of free blocks.
    pub fn free_count(&self) -> usize {
        self.free_list().len()
    }

    /// Number of busy blocks.
    pub fn busy_count(&self) -> usize {
        self.busy_list().len()
    }

    /// Number of attending blocks (per-owner meeting limits count these).
    pub fn attending_count(&self) -> usize {
        self.attending_list().len()
    }

    /// Start of the earliest classified block, if any.
    pub fn schedule_start(&self) -> Option<DateTime<Utc>> {
        self.blocks.keys().next().map(AvailableBlock::start)
    }

    /// End of the latest classified block, if any.
    pub fn schedule_end(&self) -> Option<DateTime<Utc>> {
        self.blocks.keys().map(AvailableBlock::end).max()
    }

    /// New schedule keeping only blocks whose start lies in `[start, end)`;
    /// classification is unchanged.
    pub fn subset(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            durations: self.durations,
            blocks: self
                .blocks
                .iter()
                .filter(|(b, _)| b.start() >= start && b.start() < end)
                .map(|(b, s)| (b.clone(), *s))
                .collect(),
        }
    }
}
