use crate::{
    models::{CashFlowTable, EstimationRecord, JoinKey, MutableField, ReconSummary},
    traits::Reconciling,
};
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};

/// Sign-based correction of present value and interest fields.
#[derive(Debug, Default)]
pub struct SignRules;

impl SignRules {
    pub fn new() -> Self {
        Self
    }
}

/// Field assignments an estimate produces for every row it matches.
///
/// The two payable branches cross-reference: payable present value takes the
/// magnitude of the flow amount and payable interest the magnitude of the
/// discounted flow change. A zero or absent driver leaves both of its fields
/// untouched. An absent cross-referenced amount still takes its branch and
/// clears the field (`None`).
pub fn planned_updates(estimate: &EstimationRecord) -> Vec<(MutableField, Option<Decimal>)> {
    let discounted = *estimate.discounted_flow_change();
    let flow = *estimate.flow_amount();
    let mut updates = Vec::with_capacity(2);

    match discounted {
        Some(d) if d > Decimal::ZERO => updates.push((MutableField::ReceivablePresentValue, Some(d))),
        Some(d) if d < Decimal::ZERO => {
            updates.push((MutableField::PayablePresentValue, flow.map(|f| f.abs())))
        }
        _ => (),
    }

    match flow {
        Some(f) if f > Decimal::ZERO => updates.push((MutableField::ReceivableInterest, Some(f))),
        Some(f) if f < Decimal::ZERO => {
            updates.push((MutableField::PayableInterest, discounted.map(|d| d.abs())))
        }
        _ => (),
    }

    updates
}

/// Renders an amount the way the extract writes floats: shortest digits,
/// always with a fractional part (`150` -> `150.0`, `12.50` -> `12.5`).
pub fn amount_text(amount: Decimal) -> String {
    let normalized = amount.normalize();
    if normalized.scale() == 0 {
        format!("{normalized}.0")
    } else {
        normalized.to_string()
    }
}

impl Reconciling for SignRules {
    fn reconcile(&self, table: &mut CashFlowTable, estimates: &[EstimationRecord]) -> ReconSummary {
        let mut index: HashMap<JoinKey, Vec<usize>> = HashMap::new();
        for row in 0..table.len() {
            index.entry(table.join_key(row)).or_default().push(row);
        }

        let mut summary = ReconSummary::default();
        let mut matched_rows = HashSet::new();

        for estimate in estimates {
            let Some(rows) = index.get(&estimate.join_key()) else {
                summary.estimates_skipped += 1;
                continue;
            };
            summary.estimates_matched += 1;

            let updates = planned_updates(estimate);
            for &row in rows {
                for (field, value) in &updates {
                    table.set_value(row, *field, value.map(amount_text).unwrap_or_default());
                    summary.fields_written += 1;
                }
                matched_rows.insert(row);
            }
        }

        summary.rows_matched = matched_rows.len();
        summary
    }
}
