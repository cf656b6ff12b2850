use std::collections::HashMap;

use crate::parse::ParsedRow;

/// Aggregated need for one role at one address.
///
/// `count` sums across duplicate rows; `pay_rate` keeps the last-seen value
/// when duplicates disagree; `reference_number` keeps the first-seen value
/// (it is assumed constant for an address and only used for display).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleDemand {
    pub role: String,
    pub count: i64,
    pub pay_rate: i64,
    pub reference_number: i64,
}

/// One physical address with its per-role demand, in first-seen role order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub address: String,
    pub roles: Vec<RoleDemand>,
}

impl Location {
    /// Marks the address as resolved through the street-only fallback.
    pub fn mark_approximate(&mut self) {
        self.address.push_str(" (approximate)");
    }
}

/// Folds validated rows into one `Location` per distinct address.
///
/// Output order is first-seen address order; merging itself is keyed, so
/// duplicate (address, role) rows aggregate the same way wherever they
/// appear in the input. Cannot fail on parser output, and running it twice
/// on the same input yields structurally equal results.
pub fn aggregate(rows: &[ParsedRow]) -> Vec<Location> {
    let mut locations: Vec<Location> = Vec::new();
    let mut by_address: HashMap<&str, usize> = HashMap::new();

    for row in rows {
        let idx = match by_address.get(row.address.as_str()) {
            Some(&idx) => idx,
            None => {
                locations.push(Location {
                    address: row.address.clone(),
                    roles: Vec::new(),
                });
                by_address.insert(&row.address, locations.len() - 1);
                locations.len() - 1
            }
        };

        let roles = &mut locations[idx].roles;
        match roles.iter_mut().find(|r| r.role == row.position) {
            Some(demand) => {
                demand.count += row.count;
                demand.pay_rate = row.cash;
            }
            None => roles.push(RoleDemand {
                role: row.position.clone(),
                count: row.count,
                pay_rate: row.cash,
                reference_number: row.number,
            }),
        }
    }

    locations
}
