use crate::schema::SheetLayout;

/// Forward-fill grouped column labels, left to right.
///
/// A placeholder inherits the last real label seen. Placeholders before the
/// first real label stay `None`; the caller decides whether that is an error.
pub fn forward_fill<'a, I>(labels: I, layout: &SheetLayout) -> Vec<Option<String>>
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    let mut last: Option<String> = None;
    labels
        .into_iter()
        .map(|label| {
            if !layout.is_placeholder(label) {
                last = label.map(|l| l.trim().to_string());
            }
            last.clone()
        })
        .collect()
}

/// Strip footnote asterisks and surrounding whitespace from a state label.
pub fn clean_state(raw: &str) -> String {
    raw.replace('*', "").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_fill_groups() {
        let layout = SheetLayout::default();
        let filled = forward_fill(
            [
                Some("Alabama"),
                None,
                Some("Unnamed: 4"),
                Some(" Alaska* "),
                Some(""),
            ],
            &layout,
        );
        assert_eq!(
            filled,
            vec![
                Some("Alabama".to_string()),
                Some("Alabama".to_string()),
                Some("Alabama".to_string()),
                Some("Alaska*".to_string()),
                Some("Alaska*".to_string()),
            ]
        );
    }

    #[test]
    fn test_forward_fill_every_group_member_resolves() {
        let layout = SheetLayout::default();
        let raw = [Some("A"), None, None, Some("B"), None, Some("C")];
        let filled = forward_fill(raw, &layout);
        // each column resolves to the label that opened its group
        let mut current = "";
        for (label, resolved) in raw.iter().zip(&filled) {
            if let Some(l) = *label {
                current = l;
            }
            assert_eq!(resolved.as_deref(), Some(current));
        }
    }

    #[test]
    fn test_forward_fill_leading_placeholder() {
        let layout = SheetLayout::default();
        let filled = forward_fill([None, Some("Ohio")], &layout);
        assert_eq!(filled, vec![None, Some("Ohio".to_string())]);
    }

    #[test]
    fn test_clean_state() {
        assert_eq!(clean_state("Texas*"), "Texas");
        assert_eq!(clean_state(" New York** "), "New York");
        assert_eq!(clean_state("Washington, D.C."), "Washington, D.C.");
    }
}
