use crate::core::circuit::CircuitPars;
use crate::error::CircuitError;

const DEFAULT_CIRCUIT: &str = include_str!("../../input/circuits/default.json");

const BUILTIN_CIRCUITS: [(&str, &str); 6] = [
    ("monaco", include_str!("../../input/circuits/monaco.json")),
    ("silverstone", include_str!("../../input/circuits/silverstone.json")),
    ("spa", include_str!("../../input/circuits/spa.json")),
    ("monza", include_str!("../../input/circuits/monza.json")),
    ("suzuka", include_str!("../../input/circuits/suzuka.json")),
    ("cota", include_str!("../../input/circuits/cota.json")),
];

/// builtin_circuit_ids returns the identifiers of all circuits embedded into the library.
pub fn builtin_circuit_ids() -> Vec<&'static str> {
    BUILTIN_CIRCUITS.iter().map(|(id, _)| *id).collect()
}

fn parse_embedded(id: &str, raw: &str) -> Result<CircuitPars, CircuitError> {
    // the embedded files are checked by the tests below, a parse failure therefore means a broken
    // build rather than bad user input
    serde_json::from_str(raw).map_err(|_| CircuitError::UnknownCircuit(id.to_owned()))
}

impl CircuitPars {
    /// named looks up a built-in circuit by its identifier (case-insensitive). Without an
    /// identifier the embedded default loop is returned.
    pub fn named(id: Option<&str>) -> Result<CircuitPars, CircuitError> {
        let id = match id {
            Some(id) => id.trim().to_lowercase(),
            None => return parse_embedded("default", DEFAULT_CIRCUIT),
        };

        match BUILTIN_CIRCUITS.iter().find(|(name, _)| *name == id) {
            Some((name, raw)) => parse_embedded(name, raw),
            None => Err(CircuitError::UnknownCircuit(id)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::circuit::{Circuit, CircuitCategory};
    use approx::assert_abs_diff_eq;

    #[test]
    fn every_builtin_circuit_is_valid() {
        for id in builtin_circuit_ids() {
            let pars = CircuitPars::named(Some(id)).unwrap();
            let circuit = Circuit::new(&pars).unwrap();
            assert!(circuit.is_real_circuit(), "{}", id);
            assert!(!circuit.speed_zones().is_empty(), "{}", id);
            assert_eq!(circuit.info().unwrap().famous_corners.len(), 5, "{}", id);
        }
    }

    #[test]
    fn default_loop_has_no_metadata() {
        let circuit = Circuit::new(&CircuitPars::named(None).unwrap()).unwrap();
        assert_eq!(circuit.segment_count(), 65);
        assert!(circuit.speed_zones().is_empty());
        assert!(!circuit.is_real_circuit());
        assert_abs_diff_eq!(circuit.wear_multiplier(), 1.0);
    }

    #[test]
    fn monaco_zone_wraps_start_finish() {
        let circuit = Circuit::new(&CircuitPars::named(Some("Monaco")).unwrap()).unwrap();
        assert_abs_diff_eq!(circuit.wear_multiplier(), 0.7);
        assert!(circuit.in_speed_zone(0.04));
        assert!(!circuit.in_speed_zone(0.5));
        assert_eq!(circuit.info().unwrap().category, CircuitCategory::Street);
    }

    #[test]
    fn wear_multipliers_of_high_wear_circuits() {
        let silverstone = CircuitPars::named(Some("silverstone")).unwrap();
        assert_abs_diff_eq!(silverstone.wear_multiplier, 1.3);
        assert_eq!(silverstone.speed_zones.len(), 2);

        let suzuka = CircuitPars::named(Some("suzuka")).unwrap();
        assert_abs_diff_eq!(suzuka.wear_multiplier, 1.4);
    }

    #[test]
    fn unknown_circuit_is_an_error() {
        assert_eq!(
            CircuitPars::named(Some("nordschleife")).unwrap_err(),
            CircuitError::UnknownCircuit(String::from("nordschleife"))
        );
    }
}
