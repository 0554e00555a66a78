// Copyright Kani Contributors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Turn the assumptions of a witness into the tokens of a replay trace.

use crate::benchmark::PositionTypeMap;
use comfy_table::Table;
use polywit_metadata::Assumption;

/// Keep the assumptions recorded at a nondeterministic call, in witness order.
pub fn filter_assumptions(map: &PositionTypeMap, assumptions: Vec<Assumption>) -> Vec<Assumption> {
    assumptions.into_iter().filter(|assumption| map.contains_key(&assumption.position)).collect()
}

/// The trace tokens of filtered assumptions.
pub fn tokens(assumptions: &[Assumption]) -> Vec<String> {
    assumptions.iter().map(|assumption| assumption.value.clone()).collect()
}

/// Build the table printed by `--show-assumptions`.
///
/// ```text
/// +----------+-------+--------+
/// | Position | Value | Type   |
/// +==========+=======+========+
/// | Main:11  | 3     | int    |
/// +----------+-------+--------+
/// ```
pub fn assumptions_table(map: &PositionTypeMap, assumptions: &[Assumption]) -> Table {
    use comfy_table::*;

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Position", "Value", "Type"]);
    for assumption in assumptions {
        let ty = map.get(&assumption.position).map(ToString::to_string).unwrap_or_default();
        table.add_row(vec![assumption.position.to_string(), assumption.value.clone(), ty]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use polywit_metadata::{NondetType, Position};

    fn assumption(file: &str, line: u64, value: &str) -> Assumption {
        Assumption { position: Position::new(file, line), value: value.to_string() }
    }

    #[test]
    fn check_filter() {
        let map = PositionTypeMap::from([
            (Position::new("File1", 1), NondetType::Int),
            (Position::new("File1", 3), NondetType::String),
        ]);
        let assumptions = vec![
            assumption("File1", 3, "Juice"),
            assumption("File1", 2, "loop"),
            assumption("File1", 1, "3"),
            assumption("File2", 1, "4"),
            assumption("File1", 1, "5"),
        ];
        let filtered = filter_assumptions(&map, assumptions);
        assert_eq!(tokens(&filtered), vec!["Juice", "3", "5"]);

        assert!(filter_assumptions(&PositionTypeMap::new(), filtered).is_empty());
    }

    #[test]
    fn check_table() {
        let map = PositionTypeMap::from([(Position::new("File1", 1), NondetType::Int)]);
        let table = assumptions_table(&map, &[assumption("File1", 1, "3")]).to_string();
        assert!(table.contains("Position"));
        assert!(table.contains("Value"));
        assert!(table.contains("Type"));
        assert!(table.contains("File1:1"));
        assert!(table.contains("int"));
    }
}
