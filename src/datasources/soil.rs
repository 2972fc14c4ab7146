use crate::error::{IrrSchedError, Result};
use std::path::Path;

/// Label of the available-water-content line in a SWAT `.sol` file.
const AWC_LABEL: &str = "Ave. AW";

/// Mean available-water-content coefficient (mm water / mm soil) across all
/// soil layers of one field unit's `.sol` file.
///
/// The threshold policies consume only this arithmetic mean; per-layer
/// detail is irrelevant to the depletion trigger.
pub fn mean_awc(path: &Path) -> Result<f64> {
    let text = std::fs::read_to_string(path)?;
    mean_awc_from_text(&text, path)
}

pub fn mean_awc_from_text(text: &str, path: &Path) -> Result<f64> {
    let line = text
        .lines()
        .find(|l| l.contains(AWC_LABEL))
        .ok_or_else(|| IrrSchedError::InvalidData(format!(
            "no '{}' line in {}",
            AWC_LABEL,
            path.display()
        )))?;
    let values_part = line
        .split(':')
        .next_back()
        .unwrap_or_default();
    let values: Vec<f64> = values_part
        .split_whitespace()
        .map(|t| {
            t.parse::<f64>().map_err(|_| {
                IrrSchedError::InvalidData(format!(
                    "unparseable AWC value '{}' in {}",
                    t,
                    path.display()
                ))
            })
        })
        .collect::<Result<_>>()?;
    if values.is_empty() {
        return Err(IrrSchedError::InvalidData(format!(
            "empty AWC line in {}",
            path.display()
        )));
    }
    Ok(values.iter().sum::<f64>() / values.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn averages_all_layers() {
        let text = "\
 Soil Name: BRADY
 Soil Hydrologic Group: B
 Ave. AW Incl. Rock Frag :       0.10      0.12      0.14      0.12      0.12
";
        let awc = mean_awc_from_text(text, Path::new("000010001.sol")).unwrap();
        assert_relative_eq!(awc, 0.12, epsilon = 1e-9);
    }

    #[test]
    fn missing_label_is_an_error() {
        let result = mean_awc_from_text("Soil Name: BRADY\n", Path::new("x.sol"));
        assert!(result.is_err());
    }

    #[test]
    fn garbage_value_is_an_error() {
        let text = " Ave. AW Incl. Rock Frag :   0.10  oops\n";
        assert!(mean_awc_from_text(text, Path::new("x.sol")).is_err());
    }
}
