//! Encoding feature rows into the numeric matrix the trees consume.

use std::collections::BTreeSet;

use nfe_model::{Encoding, FeatureContract, FeatureRow, FeatureValue};

use crate::error::InferenceError;

/// Encodes `rows` column by column in contract order.
///
/// Categorically encoded features are normalized with
/// [`FeatureValue::category_string`] and mapped onto `categories`, the
/// model's training-time lists (one per categorical feature). A value
/// absent from its list encodes as NaN. Without training lists the codes
/// are positions within the batch's own sorted distinct values.
pub fn encode_rows(
    rows: &[FeatureRow],
    contract: FeatureContract,
    categories: Option<&[Vec<String>]>,
) -> Result<Vec<Vec<f64>>, InferenceError> {
    let categorical = contract.categorical_positions();
    if let Some(lists) = categories
        && lists.len() != categorical.len()
    {
        return Err(InferenceError::CategoryListMismatch {
            expected: categorical.len(),
            found: lists.len(),
        });
    }

    let mut matrix = vec![vec![f64::NAN; contract.len()]; rows.len()];
    let mut categorical_index = 0;
    for (position, spec) in contract.features().iter().enumerate() {
        match spec.encoding {
            Encoding::Numeric => {
                for (row, encoded) in rows.iter().zip(matrix.iter_mut()) {
                    encoded[position] = numeric_code(spec.name, &row.values()[position])?;
                }
            }
            Encoding::Categorical => {
                let strings: Vec<String> = rows
                    .iter()
                    .map(|row| row.values()[position].category_string())
                    .collect();
                let domain: Vec<String> = match categories {
                    Some(lists) => lists[categorical_index].clone(),
                    None => strings
                        .iter()
                        .cloned()
                        .collect::<BTreeSet<_>>()
                        .into_iter()
                        .collect(),
                };
                for (value, encoded) in strings.iter().zip(matrix.iter_mut()) {
                    encoded[position] = domain
                        .iter()
                        .position(|category| category == value)
                        .map_or(f64::NAN, |code| code as f64);
                }
                categorical_index += 1;
            }
        }
    }
    Ok(matrix)
}

fn numeric_code(feature: &str, value: &FeatureValue) -> Result<f64, InferenceError> {
    match value {
        FeatureValue::Missing => Ok(f64::NAN),
        FeatureValue::Text(text) => Err(InferenceError::NonNumeric {
            feature: feature.to_string(),
            value: text.clone(),
        }),
        other => Ok(other.as_f64().unwrap_or(f64::NAN)),
    }
}
