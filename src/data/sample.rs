//! Synthetic upstream exports for demos and tests.
//!
//! Writes the full 205-column layout with the fields the browser reads placed
//! at their real positions and filler everywhere else.

use std::io::Write;

use super::audiogram::{AC_FREQUENCIES, BC_FREQUENCIES};
use super::schema::{self, UPSTREAM_WIDTH};
use crate::error::Result;

// ---------------------------------------------------------------------------
// Upstream column positions
// ---------------------------------------------------------------------------

const POS_SUBJECT_ID: usize = 0;
const POS_STATUS: usize = 1;
const POS_EMAIL: usize = 2;
const POS_DATE_OF_BIRTH: usize = 3;
const POS_GOOD_CANDIDATE: usize = 4;
const POS_EMPLOYMENT: usize = 5;
const POS_SMARTPHONE: usize = 6;
const POS_LATEST_STUDY: usize = 7;
const POS_WILL_NOT_WEAR: usize = 8;
const POS_RIGHT_AC: usize = 9;
const POS_RIGHT_STYLE: usize = 19;
const POS_LEFT_STYLE: usize = 20;
const POS_RIGHT_EARMOLD: usize = 21;
const POS_LEFT_EARMOLD: usize = 22;
const POS_LEFT_AC: usize = 23;
const POS_HEARING_AID_USE: usize = 33;
const POS_MILES: usize = 38;
const POS_RIGHT_RIC: usize = 51;
const POS_RIGHT_BC: usize = 101;
const POS_LEFT_BC: [usize; 4] = [109, 113, 123, 124];
const POS_LEFT_RIC: usize = 132;

/// Header row of a full export.
pub fn upstream_headers() -> Vec<String> {
    let mut headers: Vec<String> = (0..UPSTREAM_WIDTH).map(|i| format!("Field {i}")).collect();
    let mut set = |pos: usize, name: &str| headers[pos] = name.to_string();

    set(POS_SUBJECT_ID, schema::SUBJECT_ID);
    set(POS_STATUS, schema::STATUS);
    set(POS_EMAIL, "Email");
    set(POS_DATE_OF_BIRTH, schema::DATE_OF_BIRTH);
    set(POS_GOOD_CANDIDATE, schema::GOOD_CANDIDATE);
    set(POS_EMPLOYMENT, schema::EMPLOYMENT_STATUS);
    set(POS_SMARTPHONE, schema::SMARTPHONE_TYPE);
    set(POS_LATEST_STUDY, schema::LATEST_STUDY);
    set(POS_WILL_NOT_WEAR, schema::WILL_NOT_WEAR);
    set(POS_RIGHT_STYLE, schema::RIGHT_STYLE);
    set(POS_LEFT_STYLE, schema::LEFT_STYLE);
    set(POS_RIGHT_EARMOLD, schema::RIGHT_EARMOLD_STYLE);
    set(POS_LEFT_EARMOLD, schema::LEFT_EARMOLD_STYLE);
    set(POS_HEARING_AID_USE, "Hearing AidUse");
    set(POS_MILES, schema::MILES_AWAY);
    set(POS_RIGHT_RIC, schema::RIGHT_RIC_CABLE);
    set(POS_LEFT_RIC, schema::LEFT_RIC_CABLE);

    for (i, freq) in AC_FREQUENCIES.iter().enumerate() {
        set(POS_RIGHT_AC + i, &format!("RightAC {freq}"));
        set(POS_LEFT_AC + i, &format!("LeftAC {freq}"));
    }
    // the upstream system spells most bone-conduction headers oddly
    for (i, freq) in BC_FREQUENCIES.iter().enumerate() {
        let right = if *freq == 500 {
            format!("RightBC {freq}")
        } else {
            format!("RightBC  {freq}")
        };
        set(POS_RIGHT_BC + i, &right);
        set(POS_LEFT_BC[i], &format!("L Pt Bc {freq}"));
    }
    headers
}

// ---------------------------------------------------------------------------
// UpstreamRecord – one raw row, kept as text
// ---------------------------------------------------------------------------

/// Raw cell text for the fields the browser reads. Tests overwrite fields
/// with malformed values to exercise cleaning.
#[derive(Debug, Clone)]
pub struct UpstreamRecord {
    pub subject_id: String,
    pub status: String,
    pub date_of_birth: String,
    pub good_candidate: String,
    pub employment_status: String,
    pub smartphone_type: String,
    pub latest_study: String,
    pub will_not_wear: String,
    pub right_style: String,
    pub left_style: String,
    pub right_earmold_style: String,
    pub left_earmold_style: String,
    pub hearing_aid_use: String,
    pub miles_away: String,
    pub right_ric_cable: String,
    pub left_ric_cable: String,
    pub right_ac: [String; 10],
    pub left_ac: [String; 10],
    pub right_bc: [String; 4],
    pub left_bc: [String; 4],
}

impl UpstreamRecord {
    /// A plausible active subject born 6/15/1954 with a sloping loss.
    pub fn example(subject_id: u32) -> Self {
        let ac = ["20", "25", "30", "35", "45", "50", "55", "60", "65", "70"].map(String::from);
        let bc = ["20", "30", "45", "55"].map(String::from);
        Self {
            subject_id: subject_id.to_string(),
            status: "Active".into(),
            date_of_birth: "6/15/1954".into(),
            good_candidate: "Good".into(),
            employment_status: "Retired".into(),
            smartphone_type: "iPhone".into(),
            latest_study: "Comfort Trial (01/2023 - 03/2023)".into(),
            will_not_wear: "%null%".into(),
            right_style: "RIC".into(),
            left_style: "RIC".into(),
            right_earmold_style: "Open Dome".into(),
            left_earmold_style: "Open Dome".into(),
            hearing_aid_use: "Yes".into(),
            miles_away: "12".into(),
            right_ric_cable: "2".into(),
            left_ric_cable: "2".into(),
            right_ac: ac.clone(),
            left_ac: ac,
            right_bc: bc.clone(),
            left_bc: bc,
        }
    }

    pub fn to_row(&self) -> Vec<String> {
        let mut row: Vec<String> = (0..UPSTREAM_WIDTH).map(|i| format!("x{i}")).collect();
        row[POS_SUBJECT_ID] = self.subject_id.clone();
        row[POS_STATUS] = self.status.clone();
        row[POS_EMAIL] = format!("subject{}@example.com", self.subject_id);
        row[POS_DATE_OF_BIRTH] = self.date_of_birth.clone();
        row[POS_GOOD_CANDIDATE] = self.good_candidate.clone();
        row[POS_EMPLOYMENT] = self.employment_status.clone();
        row[POS_SMARTPHONE] = self.smartphone_type.clone();
        row[POS_LATEST_STUDY] = self.latest_study.clone();
        row[POS_WILL_NOT_WEAR] = self.will_not_wear.clone();
        row[POS_RIGHT_STYLE] = self.right_style.clone();
        row[POS_LEFT_STYLE] = self.left_style.clone();
        row[POS_RIGHT_EARMOLD] = self.right_earmold_style.clone();
        row[POS_LEFT_EARMOLD] = self.left_earmold_style.clone();
        row[POS_HEARING_AID_USE] = self.hearing_aid_use.clone();
        row[POS_MILES] = self.miles_away.clone();
        row[POS_RIGHT_RIC] = self.right_ric_cable.clone();
        row[POS_LEFT_RIC] = self.left_ric_cable.clone();
        for i in 0..AC_FREQUENCIES.len() {
            row[POS_RIGHT_AC + i] = self.right_ac[i].clone();
            row[POS_LEFT_AC + i] = self.left_ac[i].clone();
        }
        for i in 0..BC_FREQUENCIES.len() {
            row[POS_RIGHT_BC + i] = self.right_bc[i].clone();
            row[POS_LEFT_BC[i]] = self.left_bc[i].clone();
        }
        row
    }
}

/// Write a full export (header plus records) to `writer`.
pub fn write_upstream<W: Write>(records: &[UpstreamRecord], writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(upstream_headers())?;
    for rec in records {
        csv_writer.write_record(rec.to_row())?;
    }
    csv_writer.flush()?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Random cohorts
// ---------------------------------------------------------------------------

/// Minimal deterministic PRNG (xoshiro256**)
pub struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    pub fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5)).rotate_left(7).wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    pub fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Uniform integer in `lo..=hi`.
    pub fn range(&mut self, lo: i64, hi: i64) -> i64 {
        lo + (self.next_f64() * (hi - lo + 1) as f64) as i64
    }

    pub fn pick<'a>(&mut self, items: &[&'a str]) -> &'a str {
        items[self.range(0, items.len() as i64 - 1) as usize]
    }
}

/// `n` subjects with sloping audiograms and the usual data-entry noise:
/// `%null%` cells, values above the audiometer ceiling, bad birthdates.
pub fn random_records(n: usize, seed: u64) -> Vec<UpstreamRecord> {
    let mut rng = SimpleRng::new(seed);
    (0..n)
        .map(|i| {
            let mut rec = UpstreamRecord::example(1000 + i as u32);
            rec.status = rng.pick(&["Active", "Active", "Active", "Inactive"]).into();
            rec.good_candidate = rng.pick(&["Excellent", "Good", "Fair", "Poor", "%null%"]).into();
            rec.employment_status = rng.pick(&["Retired", "Employed", "Employee", "%null%"]).into();
            rec.smartphone_type = rng.pick(&["iPhone", "Android", "None", "%null%"]).into();
            rec.right_style = rng.pick(&["RIC", "BTE", "ITE", "%null%"]).into();
            rec.left_style = rec.right_style.clone();
            rec.date_of_birth = if rng.next_f64() < 0.05 {
                "unknown".into()
            } else {
                format!(
                    "{}/{}/{}",
                    rng.range(1, 12),
                    rng.range(1, 28),
                    rng.range(1935, 1990)
                )
            };
            rec.miles_away = rng.range(1, 90).to_string();

            for ac in [&mut rec.right_ac, &mut rec.left_ac] {
                let base = rng.range(0, 40);
                let slope = rng.range(0, 8);
                for (k, cell) in ac.iter_mut().enumerate() {
                    let value = (base + slope * k as i64 + rng.range(-5, 5)).clamp(-10, 120);
                    // round to the audiometer's 5 dB step
                    *cell = (value / 5 * 5).to_string();
                }
                if rng.next_f64() < 0.1 {
                    ac[rng.range(0, 9) as usize] = "%null%".into();
                }
                if rng.next_f64() < 0.03 {
                    ac[rng.range(0, 9) as usize] = "999".into();
                }
            }
            for (ac, bc) in [
                (&rec.right_ac, &mut rec.right_bc),
                (&rec.left_ac, &mut rec.left_bc),
            ] {
                for (k, cell) in bc.iter_mut().enumerate() {
                    // 500, 1000, 2000 and 4000 Hz sit at AC indices 1, 3, 5, 7
                    let air: i64 = ac[2 * k + 1].parse().unwrap_or(40);
                    *cell = (air - rng.range(0, 2) * 5).max(-10).to_string();
                }
            }
            rec
        })
        .collect()
}
