use std::collections::BTreeMap;

use crate::session::Session;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Stint {
    pub driver: String,
    pub stint: u32,
    pub compound: String,
    pub first_lap: u32,
    pub last_lap: u32,
}

impl Stint {
    /// Number of laps the stint spans, both ends included
    pub fn length(&self) -> u32 {
        self.last_lap - self.first_lap + 1
    }
}

/// Tyre stints per driver, grouped by stint number and compound.
///
/// `drivers` defaults to the session driver order. Laps without a stint number
/// or compound are ignored.
pub fn tyre_stints(session: &Session, drivers: Option<&[String]>) -> Vec<Stint> {
    let mut groups: BTreeMap<(&str, u32, &str), (u32, u32)> = BTreeMap::new();
    for lap in &session.laps {
        let (Some(stint), Some(compound)) = (lap.stint, lap.compound.as_deref()) else {
            continue;
        };
        groups
            .entry((lap.driver.as_str(), stint, compound))
            .and_modify(|(first, last)| {
                *first = (*first).min(lap.lap_number);
                *last = (*last).max(lap.lap_number);
            })
            .or_insert((lap.lap_number, lap.lap_number));
    }

    let drivers = match drivers {
        Some(drivers) => drivers.to_vec(),
        None => session.driver_abbreviations(),
    };
    drivers
        .iter()
        .flat_map(|driver| {
            groups
                .range((driver.as_str(), 0, "")..)
                .take_while(move |((d, _, _), _)| *d == driver.as_str())
                .map(|((d, stint, compound), (first, last))| Stint {
                    driver: d.to_string(),
                    stint: *stint,
                    compound: compound.to_string(),
                    first_lap: *first,
                    last_lap: *last,
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::test_support::constant_pace_race;

    fn one_stop_race() -> Session {
        let mut session = constant_pace_race(&[("VER", 90.), ("HAM", 91.)], 6);
        for lap in session.laps.iter_mut() {
            let (stint, compound) = match (lap.driver.as_str(), lap.lap_number) {
                ("VER", 1..=3) => (1, "MEDIUM"),
                ("VER", _) => (2, "HARD"),
                ("HAM", 1..=4) => (1, "SOFT"),
                _ => (2, "MEDIUM"),
            };
            lap.stint = Some(stint);
            lap.compound = Some(compound.to_string());
        }
        session
    }

    #[test]
    fn test_stints_grouped_per_driver() {
        let stints = tyre_stints(&one_stop_race(), None);
        assert_eq!(stints.len(), 4);
        assert_eq!(
            stints[0],
            Stint {
                driver: "VER".to_string(),
                stint: 1,
                compound: "MEDIUM".to_string(),
                first_lap: 1,
                last_lap: 3,
            }
        );
        assert_eq!(stints[1].compound, "HARD");
        assert_eq!(stints[1].length(), 3);
        assert_eq!(stints[2].driver, "HAM");
        assert_eq!(stints[2].length(), 4);
        assert_eq!(stints[3].first_lap, 5);
    }

    #[test]
    fn test_stints_for_selected_drivers() {
        let drivers = vec!["HAM".to_string()];
        let stints = tyre_stints(&one_stop_race(), Some(&drivers));
        assert_eq!(stints.len(), 2);
        assert!(stints.iter().all(|s| s.driver == "HAM"));
    }

    #[test]
    fn test_laps_without_compound_are_ignored() {
        let mut session = one_stop_race();
        for lap in session.laps.iter_mut().filter(|l| l.driver == "HAM") {
            lap.compound = None;
        }
        let stints = tyre_stints(&session, None);
        assert_eq!(stints.len(), 2);
    }

    #[test]
    fn test_driver_prefix_does_not_leak_into_other_driver() {
        let mut session = one_stop_race();
        for lap in session.laps.iter_mut().filter(|l| l.driver == "HAM") {
            lap.driver = "VERX".to_string();
        }
        let drivers = vec!["VER".to_string()];
        let stints = tyre_stints(&session, Some(&drivers));
        assert!(stints.iter().all(|s| s.driver == "VER"));
        assert_eq!(stints.len(), 2);
    }
}
