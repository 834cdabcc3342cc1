use crate::error::SchemaMismatch;
use crate::schema::SheetLayout;
use crate::sheet::Cell;

/// Outcome of reading one value cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Revenue {
    /// No value printed; emits no record.
    Missing,
    /// Suppression marker, coerced to zero.
    Suppressed,
    /// Scaled to billions.
    Value(f64),
}

impl Revenue {
    pub fn amount(self) -> Option<f64> {
        match self {
            Revenue::Missing => None,
            Revenue::Suppressed => Some(0.0),
            Revenue::Value(v) => Some(v),
        }
    }
}

/// Convert a source cell (thousands of dollars) into billions.
pub fn parse_revenue(
    cell: &Cell,
    layout: &SheetLayout,
    row: usize,
    col: usize,
) -> Result<Revenue, SchemaMismatch> {
    match cell {
        Cell::Empty => Ok(Revenue::Missing),
        Cell::Number(n) => Ok(Revenue::Value(n * layout.value_scale)),
        Cell::Text(raw) if layout.is_suppressed(raw) => Ok(Revenue::Suppressed),
        Cell::Text(raw) => {
            let cleaned: String = raw.chars().filter(|c| *c != ',' && !c.is_whitespace()).collect();
            cleaned
                .parse::<f64>()
                .map(|v| Revenue::Value(v * layout.value_scale))
                .map_err(|_| SchemaMismatch::NonNumericCell {
                    row,
                    col,
                    value: raw.clone(),
                })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_revenue_units() {
        let layout = SheetLayout::default();
        let v = parse_revenue(&Cell::Number(2_500_000.0), &layout, 0, 0).unwrap();
        assert!(matches!(v, Revenue::Value(x) if (x - 2.5).abs() < 1e-12));

        let v = parse_revenue(&Cell::Text(" 1,250,000 ".into()), &layout, 0, 0).unwrap();
        assert!(matches!(v, Revenue::Value(x) if (x - 1.25).abs() < 1e-12));

        let v = parse_revenue(&Cell::Text("X".into()), &layout, 0, 0).unwrap();
        assert_eq!(v, Revenue::Suppressed);
        assert_eq!(v.amount(), Some(0.0));

        assert_eq!(
            parse_revenue(&Cell::Empty, &layout, 0, 0).unwrap().amount(),
            None
        );
    }

    #[test]
    fn test_parse_revenue_rejects_text() {
        let layout = SheetLayout::default();
        assert_eq!(
            parse_revenue(&Cell::Text("(NA)".into()), &layout, 7, 3),
            Err(SchemaMismatch::NonNumericCell {
                row: 7,
                col: 3,
                value: "(NA)".into()
            })
        );
    }
}
