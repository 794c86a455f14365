//! RIC matrix, acoustic coupling and vent size recommendations.
//!
//! Each ear's rules use only that ear's air-conduction thresholds at 250,
//! 500, 1000 and 2000 Hz.

use std::fmt;

use super::audiogram::{AudiogramThresholds, Ear};
use crate::error::{BrowserError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatrixPower {
    M,
    P,
    UP,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coupling {
    OpenDome,
    OccludedDome,
    Earmold,
    /// No rule matched.
    Uncategorized,
    /// A threshold the rules need was absent.
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VentSize {
    Large,
    Medium,
    Small,
    NotApplicable,
}

impl fmt::Display for MatrixPower {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatrixPower::M => write!(f, "M"),
            MatrixPower::P => write!(f, "P"),
            MatrixPower::UP => write!(f, "UP"),
        }
    }
}

impl fmt::Display for Coupling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Coupling::OpenDome => write!(f, "Open Dome"),
            Coupling::OccludedDome => write!(f, "Occluded Dome"),
            Coupling::Earmold => write!(f, "Earmold"),
            Coupling::Uncategorized => write!(f, "Error!"),
            Coupling::Unknown => write!(f, "-"),
        }
    }
}

impl fmt::Display for VentSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VentSize::Large => write!(f, "Large"),
            VentSize::Medium => write!(f, "Medium"),
            VentSize::Small => write!(f, "Small"),
            VentSize::NotApplicable => write!(f, "NA"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EarRecommendation {
    pub matrix: MatrixPower,
    pub coupling: Coupling,
    pub vent: VentSize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CouplingRecommendation {
    pub right: EarRecommendation,
    pub left: EarRecommendation,
}

impl CouplingRecommendation {
    pub fn ear(&self, ear: Ear) -> &EarRecommendation {
        match ear {
            Ear::Right => &self.right,
            Ear::Left => &self.left,
        }
    }
}

/// Recommend both ears. Fails when either ear lacks the 500 or 2000 Hz
/// threshold needed to pick a matrix; the subject then gets no recommendation
/// for either ear, even if the other ear alone could be computed.
pub fn recommend(thresholds: &AudiogramThresholds) -> Result<CouplingRecommendation> {
    Ok(CouplingRecommendation {
        right: recommend_ear(thresholds, Ear::Right)?,
        left: recommend_ear(thresholds, Ear::Left)?,
    })
}

pub fn recommend_ear(thresholds: &AudiogramThresholds, ear: Ear) -> Result<EarRecommendation> {
    let ac = |freq: u32| thresholds.air_at(ear, freq);
    let required = |freq: u32| ac(freq).ok_or(BrowserError::MissingData { ear, frequency: freq });

    let rec_threshold = recommendation_threshold(required(500)?, required(2000)?);
    let matrix = matrix_for(rec_threshold);

    let coupling = match (ac(250), ac(500), ac(1000)) {
        (Some(t250), Some(t500), Some(t1000)) => coupling_for(t250, t500, t1000, matrix),
        _ => Coupling::Unknown,
    };

    let vent = match (coupling, ac(500), ac(1000)) {
        (Coupling::Earmold, Some(t500), Some(t1000)) => vent_for(t500, t1000),
        _ => VentSize::NotApplicable,
    };

    Ok(EarRecommendation {
        matrix,
        coupling,
        vent,
    })
}

/// The higher of AC@2000 and AC@500 + 10, preferring AC@2000 on a tie.
pub fn recommendation_threshold(ac500: i32, ac2000: i32) -> i32 {
    if ac2000 >= ac500 {
        ac2000
    } else {
        ac500.saturating_add(10)
    }
}

pub fn matrix_for(rec_threshold: i32) -> MatrixPower {
    // 76..=80 is the custom-cased P receiver; same class as the stock one
    match rec_threshold {
        i32::MIN..=65 => MatrixPower::M,
        66..=75 => MatrixPower::P,
        76..=80 => MatrixPower::P,
        _ => MatrixPower::UP,
    }
}

fn coupling_for(ac250: i32, ac500: i32, ac1000: i32, matrix: MatrixPower) -> Coupling {
    let dome_matrix = matches!(matrix, MatrixPower::M | MatrixPower::P);

    if ac250 < 30 && ac500 < 30 && ac1000 <= 60 && dome_matrix {
        Coupling::OpenDome
    } else if (ac250 > 30 || ac500 > 30) && ac250 <= 50 && ac500 <= 50 && ac1000 <= 60 && dome_matrix
    {
        Coupling::OccludedDome
    } else if ac250 > 50 || ac500 > 50 || ac1000 > 60 {
        Coupling::Earmold
    } else {
        // TODO: confirm with audiology whether a UP matrix should force an earmold.
        Coupling::Uncategorized
    }
}

fn vent_for(ac500: i32, ac1000: i32) -> VentSize {
    let avg = (ac500 as f64 + ac1000 as f64) / 2.0;
    if avg <= 40.0 {
        VentSize::Large
    } else if avg < 55.0 {
        VentSize::Medium
    } else {
        VentSize::Small
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::audiogram::extract;
    use crate::data::loader::read_filtered;
    use crate::data::model::{CellValue, ColumnStore};

    fn ear(points: &[(u32, i32)]) -> AudiogramThresholds {
        let mut t = AudiogramThresholds::default();
        for &(f, v) in points {
            t.air.insert((Ear::Right, f), v);
            t.air.insert((Ear::Left, f), v);
        }
        t
    }

    fn right(points: &[(u32, i32)]) -> EarRecommendation {
        recommend_ear(&ear(points), Ear::Right).unwrap()
    }

    #[test]
    fn recommendation_threshold_prefers_2000_on_tie() {
        assert_eq!(recommendation_threshold(50, 50), 50);
        assert_eq!(recommendation_threshold(40, 55), 55);
        assert_eq!(recommendation_threshold(55, 50), 65);
    }

    #[test]
    fn matrix_boundaries() {
        assert_eq!(matrix_for(-10), MatrixPower::M);
        assert_eq!(matrix_for(65), MatrixPower::M);
        assert_eq!(matrix_for(66), MatrixPower::P);
        assert_eq!(matrix_for(75), MatrixPower::P);
        assert_eq!(matrix_for(80), MatrixPower::P);
        assert_eq!(matrix_for(81), MatrixPower::UP);
    }

    #[test]
    fn mild_loss_gets_open_dome() {
        let rec = right(&[(250, 20), (500, 20), (1000, 50), (2000, 40)]);
        assert_eq!(rec.matrix, MatrixPower::M);
        assert_eq!(rec.coupling, Coupling::OpenDome);
        assert_eq!(rec.vent, VentSize::NotApplicable);
        assert_eq!(rec.vent.to_string(), "NA");
    }

    #[test]
    fn moderate_low_frequencies_get_occluded_dome() {
        let rec = right(&[(250, 35), (500, 45), (1000, 55), (2000, 60)]);
        assert_eq!(rec.matrix, MatrixPower::M);
        assert_eq!(rec.coupling, Coupling::OccludedDome);
    }

    #[test]
    fn exactly_thirty_is_neither_dome() {
        // open needs < 30, occluded needs one side > 30
        let rec = right(&[(250, 30), (500, 30), (1000, 40), (2000, 40)]);
        assert_eq!(rec.coupling, Coupling::Uncategorized);
        assert_eq!(rec.coupling.to_string(), "Error!");
    }

    #[test]
    fn severe_loss_gets_earmold_and_vent() {
        let rec = right(&[(250, 55), (500, 60), (1000, 70), (2000, 75)]);
        assert_eq!(rec.matrix, MatrixPower::P);
        assert_eq!(rec.coupling, Coupling::Earmold);
        assert_eq!(rec.vent, VentSize::Small);

        let rec = right(&[(250, 20), (500, 20), (1000, 65), (2000, 70)]);
        assert_eq!(rec.coupling, Coupling::Earmold);
        // (20 + 65) / 2 = 42.5
        assert_eq!(rec.vent, VentSize::Medium);

        let rec = right(&[(250, 55), (500, 30), (1000, 50), (2000, 50)]);
        assert_eq!(rec.coupling, Coupling::Earmold);
        assert_eq!(rec.vent, VentSize::Large);
    }

    #[test]
    fn vent_boundaries() {
        assert_eq!(vent_for(40, 40), VentSize::Large);
        assert_eq!(vent_for(40, 41), VentSize::Medium);
        assert_eq!(vent_for(55, 54), VentSize::Medium);
        assert_eq!(vent_for(55, 55), VentSize::Small);
    }

    #[test]
    fn up_matrix_with_mild_low_frequencies_is_uncategorized() {
        let rec = right(&[(250, 20), (500, 20), (1000, 40), (2000, 90)]);
        assert_eq!(rec.matrix, MatrixPower::UP);
        assert_eq!(rec.coupling, Coupling::Uncategorized);
        assert_eq!(rec.vent, VentSize::NotApplicable);
    }

    #[test]
    fn missing_500_or_2000_is_missing_data() {
        let err = recommend_ear(&ear(&[(250, 20), (1000, 40), (2000, 40)]), Ear::Left).unwrap_err();
        assert!(matches!(
            err,
            BrowserError::MissingData { ear: Ear::Left, frequency: 500 }
        ));
        let err = recommend(&ear(&[(250, 20), (500, 20), (1000, 40)])).unwrap_err();
        assert!(matches!(err, BrowserError::MissingData { frequency: 2000, .. }));
    }

    #[test]
    fn missing_250_leaves_coupling_unknown() {
        let rec = right(&[(500, 20), (1000, 40), (2000, 40)]);
        assert_eq!(rec.matrix, MatrixPower::M);
        assert_eq!(rec.coupling, Coupling::Unknown);
        assert_eq!(rec.coupling.to_string(), "-");
        assert_eq!(rec.vent, VentSize::NotApplicable);
    }

    #[test]
    fn missing_1000_leaves_coupling_unknown() {
        let rec = right(&[(250, 20), (500, 20), (2000, 40)]);
        assert_eq!(rec.matrix, MatrixPower::M);
        assert_eq!(rec.coupling, Coupling::Unknown);
        assert_eq!(rec.vent, VentSize::NotApplicable);
    }

    #[test]
    fn recommendation_threshold_does_not_overflow() {
        assert_eq!(recommendation_threshold(i32::MAX, 0), i32::MAX);
        assert_eq!(matrix_for(recommendation_threshold(i32::MAX, 0)), MatrixPower::UP);
    }

    fn filtered(csv: &str) -> ColumnStore {
        read_filtered(csv.as_bytes()).unwrap()
    }

    #[test]
    fn huge_threshold_in_filtered_import_is_missing_data() {
        let store = filtered(
            "Subject Id,RightAC 250,RightAC 500,RightAC 1000,RightAC 2000\n\
             1,20,3000000000,40,30\n",
        );
        let t = extract(&store, &CellValue::Number(1.0));
        let err = recommend_ear(&t, Ear::Right).unwrap_err();
        assert!(matches!(
            err,
            BrowserError::MissingData { ear: Ear::Right, frequency: 500 }
        ));
    }

    #[test]
    fn vent_boundary_from_extracted_thresholds() {
        let store = filtered(
            "Subject Id,RightAC 250,RightAC 500,RightAC 1000,RightAC 2000\n\
             1,60,40.9,40,50\n\
             2,60,40,41,50\n",
        );
        let rec_for = |id: f64| {
            let t = extract(&store, &CellValue::Number(id));
            recommend_ear(&t, Ear::Right).unwrap()
        };
        // 40.9 truncates to 40, so the average sits exactly on 40
        let rec = rec_for(1.0);
        assert_eq!(rec.coupling, Coupling::Earmold);
        assert_eq!(rec.vent, VentSize::Large);
        assert_eq!(rec_for(2.0).vent, VentSize::Medium);
    }

    #[test]
    fn missing_right_ear_fails_the_whole_subject() {
        let mut t = AudiogramThresholds::default();
        for (f, v) in [(250, 20), (1000, 40)] {
            t.air.insert((Ear::Right, f), v);
        }
        for (f, v) in [(250, 20), (500, 20), (1000, 50), (2000, 40)] {
            t.air.insert((Ear::Left, f), v);
        }
        assert!(recommend_ear(&t, Ear::Left).is_ok());
        let err = recommend(&t).unwrap_err();
        assert!(matches!(
            err,
            BrowserError::MissingData { ear: Ear::Right, frequency: 500 }
        ));
    }

    #[test]
    fn ears_are_independent() {
        let mut t = AudiogramThresholds::default();
        for (f, v) in [(250, 20), (500, 20), (1000, 50), (2000, 40)] {
            t.air.insert((Ear::Right, f), v);
        }
        for (f, v) in [(250, 60), (500, 70), (1000, 80), (2000, 85)] {
            t.air.insert((Ear::Left, f), v);
        }
        let rec = recommend(&t).unwrap();
        assert_eq!(rec.ear(Ear::Right).coupling, Coupling::OpenDome);
        assert_eq!(rec.ear(Ear::Left).matrix, MatrixPower::UP);
        assert_eq!(rec.ear(Ear::Left).coupling, Coupling::Earmold);
        assert_eq!(rec.ear(Ear::Left).vent, VentSize::Small);
    }
}
