use std::collections::BTreeMap;
use std::fmt;

use super::model::{CellValue, ColumnStore};
use super::schema::{MAX_THRESHOLD_DB, SUBJECT_ID};

/// Air-conduction test frequencies in Hz.
pub const AC_FREQUENCIES: [u32; 10] = [250, 500, 750, 1000, 1500, 2000, 3000, 4000, 6000, 8000];

/// Bone-conduction test frequencies in Hz.
pub const BC_FREQUENCIES: [u32; 4] = [500, 1000, 2000, 4000];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Ear {
    Right,
    Left,
}

impl Ear {
    pub const BOTH: [Ear; 2] = [Ear::Right, Ear::Left];
}

impl fmt::Display for Ear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ear::Right => write!(f, "Right"),
            Ear::Left => write!(f, "Left"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conduction {
    Air,
    Bone,
}

/// Column holding one audiogram point, e.g. `RightAC 1000`.
pub fn column_name(ear: Ear, conduction: Conduction, frequency: u32) -> String {
    let kind = match conduction {
        Conduction::Air => "AC",
        Conduction::Bone => "BC",
    };
    format!("{ear}{kind} {frequency}")
}

// ---------------------------------------------------------------------------
// AudiogramThresholds – one subject's measured points
// ---------------------------------------------------------------------------

/// Thresholds in dB HL keyed by `(ear, frequency)`. Absent points are simply
/// not in the map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AudiogramThresholds {
    pub air: BTreeMap<(Ear, u32), i32>,
    pub bone: BTreeMap<(Ear, u32), i32>,
}

impl AudiogramThresholds {
    pub fn air_at(&self, ear: Ear, frequency: u32) -> Option<i32> {
        self.air.get(&(ear, frequency)).copied()
    }

    pub fn bone_at(&self, ear: Ear, frequency: u32) -> Option<i32> {
        self.bone.get(&(ear, frequency)).copied()
    }

    /// `(frequency, threshold)` pairs for one ear, in frequency order.
    pub fn air_series(&self, ear: Ear) -> Vec<(u32, i32)> {
        series(&self.air, ear)
    }

    pub fn bone_series(&self, ear: Ear) -> Vec<(u32, i32)> {
        series(&self.bone, ear)
    }

    pub fn is_empty(&self) -> bool {
        self.air.is_empty() && self.bone.is_empty()
    }
}

fn series(points: &BTreeMap<(Ear, u32), i32>, ear: Ear) -> Vec<(u32, i32)> {
    points
        .iter()
        .filter(|((e, _), _)| *e == ear)
        .map(|((_, f), t)| (*f, *t))
        .collect()
}

/// Pull a subject's audiogram out of `store`.
///
/// Never fails: an unknown subject, a missing column or a non-numeric cell
/// just leaves that point out.
pub fn extract(store: &ColumnStore, subject_id: &CellValue) -> AudiogramThresholds {
    let mut thresholds = AudiogramThresholds::default();
    let Some(row) = store.find_row(SUBJECT_ID, subject_id) else {
        log::debug!("No subject {subject_id} in the current dataset");
        return thresholds;
    };

    for ear in Ear::BOTH {
        for freq in AC_FREQUENCIES {
            if let Some(t) = threshold_at(store, row, &column_name(ear, Conduction::Air, freq)) {
                thresholds.air.insert((ear, freq), t);
            }
        }
        for freq in BC_FREQUENCIES {
            if let Some(t) = threshold_at(store, row, &column_name(ear, Conduction::Bone, freq)) {
                thresholds.bone.insert((ear, freq), t);
            }
        }
    }
    thresholds
}

fn threshold_at(store: &ColumnStore, row: usize, column: &str) -> Option<i32> {
    // whole dB, truncated toward zero
    store.value(row, column).and_then(audiometer_db).map(|v| v.trunc() as i32)
}

/// A numeric cell within the audiometer's range. Filtered imports are not
/// cleaned, so out-of-range values count as absent here.
fn audiometer_db(value: &CellValue) -> Option<f64> {
    value
        .as_f64()
        .filter(|v| (-MAX_THRESHOLD_DB..=MAX_THRESHOLD_DB).contains(v))
}

// ---------------------------------------------------------------------------
// Group audiogram
// ---------------------------------------------------------------------------

/// Air-conduction curves of every ear in a store plus their per-frequency mean.
#[derive(Debug, Clone, Default)]
pub struct GroupAudiogram {
    /// One curve per (subject, ear); points are `(frequency, dB HL)`.
    pub curves: Vec<(Ear, Vec<(u32, f64)>)>,
    /// Mean over all ears, ignoring absent points. Frequencies nobody has a
    /// value for are left out.
    pub mean: Vec<(u32, f64)>,
    pub subjects: usize,
}

pub fn group_audiogram(store: &ColumnStore) -> GroupAudiogram {
    let mut group = GroupAudiogram {
        subjects: store.len(),
        ..Default::default()
    };
    let mut sums: BTreeMap<u32, (f64, usize)> = BTreeMap::new();

    for ear in Ear::BOTH {
        let cols: Vec<(u32, Option<usize>)> = AC_FREQUENCIES
            .iter()
            .map(|&f| (f, store.column_index(&column_name(ear, Conduction::Air, f))))
            .collect();
        for row in store.rows() {
            let curve: Vec<(u32, f64)> = cols
                .iter()
                .filter_map(|&(f, col)| Some((f, audiometer_db(&row[col?])?)))
                .collect();
            for &(f, v) in &curve {
                let entry = sums.entry(f).or_insert((0.0, 0));
                entry.0 += v;
                entry.1 += 1;
            }
            group.curves.push((ear, curve));
        }
    }

    group.mean = sums
        .into_iter()
        .map(|(f, (sum, n))| (f, sum / n as f64))
        .collect();
    group
}
