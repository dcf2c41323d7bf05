// SPDX-License-Identifier: Apache-2.0

//! Property-analysis attribute generation.
//!
//! Attributes are derived from a hash of the address rather than a live
//! data source, so resolving the same lead twice yields byte-identical
//! records. Real zoning data would slot in behind the same signature.

use backlot_model::PropertyAttributes;
use sha2::{Digest, Sha256};

const ZONING_TYPES: [&str; 4] = [
    "Residential R-1",
    "Residential R-2",
    "Mixed-Use",
    "Urban Residential",
];

const ELIGIBLE_NOTES: [&str; 4] = [
    "Property is eligible for ADU development",
    "Zoning allows for accessory dwelling units",
    "Check with local planning department for specific ADU requirements",
    "Consider consulting with an architect for ADU design options",
];

const INELIGIBLE_NOTES: [&str; 3] = [
    "Current zoning may not permit ADU construction",
    "Zoning variance might be required for ADU development",
    "Consider consulting with the planning department about ADU options",
];

const ADVISORY_NOTES: [&str; 5] = [
    "Property is in a neighborhood with growing property values",
    "Check for utility access for any ADU construction",
    "Consider solar orientation for optimal energy efficiency",
    "Verify if property is in a historic district or has special requirements",
    "Water and sewer connections may require upgrades for additional unit",
];

/// Deterministic draw stream seeded from the address.
struct AddressSeed {
    digest: [u8; 32],
    cursor: usize,
    round: u64,
}

impl AddressSeed {
    fn new(address: &str) -> Self {
        let digest: [u8; 32] = Sha256::digest(address.as_bytes()).into();
        Self {
            digest,
            cursor: 0,
            round: 0,
        }
    }

    fn draw(&mut self) -> u64 {
        if self.cursor + 8 > self.digest.len() {
            self.round += 1;
            let mut hasher = Sha256::new();
            hasher.update(self.digest);
            hasher.update(self.round.to_le_bytes());
            self.digest = hasher.finalize().into();
            self.cursor = 0;
        }
        let mut word = [0u8; 8];
        word.copy_from_slice(&self.digest[self.cursor..self.cursor + 8]);
        self.cursor += 8;
        u64::from_le_bytes(word)
    }

    fn in_range(&mut self, low: u64, high: u64) -> u64 {
        low + self.draw() % (high - low + 1)
    }

    fn pick<'a>(&mut self, options: &[&'a str]) -> &'a str {
        options[self.draw() as usize % options.len()]
    }
}

fn thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Fills the zoning attributes for a served address.
#[must_use]
pub fn generate_attributes(address: &str) -> PropertyAttributes {
    let mut seed = AddressSeed::new(address);

    let lot_size = format!("{} sq ft", thousands(seed.in_range(4_000, 10_000)));
    let zoning = seed.pick(&ZONING_TYPES).to_string();
    let allows_adu = seed.draw() % 10 < 8;
    let max_adu_size = if allows_adu {
        format!("{} sq ft", seed.in_range(600, 1_200))
    } else {
        "Not applicable".to_string()
    };
    let setback_front = format!("{} ft", seed.in_range(15, 30));
    let setback_back = format!("{} ft", seed.in_range(10, 20));
    let setback_sides = format!("{} ft", seed.in_range(5, 10));

    let mut notes = Vec::new();
    if allows_adu {
        notes.push(seed.pick(&ELIGIBLE_NOTES).to_string());
    } else {
        notes.push(seed.pick(&INELIGIBLE_NOTES).to_string());
    }
    let extra = seed.in_range(1, 3) as usize;
    for _ in 0..extra {
        let note = seed.pick(&ADVISORY_NOTES).to_string();
        if !notes.contains(&note) {
            notes.push(note);
        }
    }

    PropertyAttributes {
        lot_size: Some(lot_size),
        zoning: Some(zoning),
        allows_adu,
        max_adu_size: Some(max_adu_size),
        setback_front: Some(setback_front),
        setback_back: Some(setback_back),
        setback_sides: Some(setback_sides),
        additional_notes: notes,
    }
}
