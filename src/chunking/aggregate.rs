//! Merge per-chunk analyses into one document-level analysis.

use crate::evaluator::{Analysis, DimensionScore, SubCriterionResult, TcreiFlags, DIMENSION_NAMES};

/// Combine chunk analyses given in chunk order.
///
/// Scores are the token-weighted mean per dimension (an equal split when
/// every count is zero). Sub-criteria are unique by name, keeping the
/// longest detail. TCREI flags are OR-ed. A single analysis is returned
/// as-is and an empty input gives [`Analysis::empty`].
pub fn aggregate(mut results: Vec<Analysis>, token_counts: &[usize]) -> Analysis {
    if results.is_empty() {
        return Analysis::empty();
    }
    if results.len() == 1 {
        return results.swap_remove(0);
    }

    let total: usize = token_counts.iter().sum();
    let denominator = if total == 0 {
        results.len() as f64
    } else {
        total as f64
    };
    let weight_of = |i: usize| -> f64 {
        if total == 0 {
            1.0 / denominator
        } else {
            token_counts.get(i).copied().unwrap_or(0) as f64 / denominator
        }
    };

    let dimensions = DIMENSION_NAMES
        .iter()
        .map(|name| {
            let mut weighted = 0.0;
            let mut sub_criteria: Vec<SubCriterionResult> = Vec::new();

            for (i, result) in results.iter().enumerate() {
                let Some(dim) = result.dimension(name) else {
                    continue;
                };
                weighted += dim.score as f64 * weight_of(i);

                for sc in &dim.sub_criteria {
                    match sub_criteria.iter_mut().find(|kept| kept.name == sc.name) {
                        Some(kept) if sc.detail.len() > kept.detail.len() => *kept = sc.clone(),
                        Some(_) => {}
                        None => sub_criteria.push(sc.clone()),
                    }
                }
            }

            DimensionScore::new(*name, weighted.round_ties_even() as u32, sub_criteria)
        })
        .collect();

    let tcrei_flags = results
        .iter()
        .fold(TcreiFlags::default(), |acc, r| acc.union(r.tcrei_flags));

    Analysis {
        dimensions,
        tcrei_flags,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn analysis(task: u32, detail: &str) -> Analysis {
        let mut a = Analysis::empty();
        a.dimensions[0] = DimensionScore::new(
            "task",
            task,
            vec![SubCriterionResult {
                name: "clear_action".into(),
                found: true,
                detail: detail.into(),
            }],
        );
        a
    }

    #[test]
    fn test_single_chunk_is_returned_unchanged() {
        let single = analysis(42, "d");
        let buffer = single.dimensions.as_ptr();
        let expected = single.clone();
        let out = aggregate(vec![single], &[10]);
        assert_eq!(out, expected);
        assert_eq!(out.dimensions.as_ptr(), buffer);
    }

    #[test]
    fn test_equal_weights_average() {
        let out = aggregate(vec![analysis(80, "a"), analysis(40, "b")], &[100, 100]);
        assert_eq!(out.dimension("task").unwrap().score, 60);
    }

    #[test]
    fn test_token_weighting() {
        let out = aggregate(vec![analysis(100, "a"), analysis(0, "b")], &[300, 100]);
        assert_eq!(out.dimension("task").unwrap().score, 75);
    }

    #[test]
    fn test_zero_tokens_falls_back_to_count() {
        let out = aggregate(vec![analysis(90, "a"), analysis(30, "b")], &[0, 0]);
        assert_eq!(out.dimension("task").unwrap().score, 60);
    }

    #[test]
    fn test_sub_criteria_keep_longest_detail() {
        let out = aggregate(
            vec![analysis(10, "short"), analysis(10, "a much longer detail"), analysis(10, "mid size")],
            &[1, 1, 1],
        );
        let task = out.dimension("task").unwrap();
        assert_eq!(task.sub_criteria.len(), 1);
        assert_eq!(task.sub_criteria[0].detail, "a much longer detail");
    }

    #[test]
    fn test_flags_are_or_merged_and_all_dimensions_present() {
        let mut a = analysis(10, "x");
        a.tcrei_flags.references = true;
        let mut b = analysis(10, "y");
        b.tcrei_flags.iterate = true;
        b.dimensions.retain(|d| d.name != "constraints");
        let out = aggregate(vec![a, b], &[5, 5]);
        assert!(out.tcrei_flags.references && out.tcrei_flags.iterate);
        assert!(!out.tcrei_flags.task);
        let names: Vec<&str> = out.dimensions.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, DIMENSION_NAMES.to_vec());
    }

    #[test]
    fn test_empty_input_gives_zero_analysis() {
        assert_eq!(aggregate(Vec::new(), &[]), Analysis::empty());
    }
}
