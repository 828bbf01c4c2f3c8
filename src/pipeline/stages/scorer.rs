//! Weighted scoring stage.

use crate::evaluator::DIMENSION_NAMES;
use crate::pipeline::state::{EvaluationState, StatePatch};
use crate::scoring;

use super::RunContext;

pub fn score(state: &EvaluationState, ctx: &RunContext<'_>) -> StatePatch {
    let config = ctx.eval_config(state.task_type);
    let (overall, grade) = scoring::score(&config, &state.dimension_scores);

    let breakdown = DIMENSION_NAMES
        .iter()
        .map(|name| {
            let value = state
                .dimension_scores
                .iter()
                .find(|d| d.name == *name)
                .map_or(0, |d| d.score);
            format!("{}: {}", crate::improver::title_case(name), value)
        })
        .collect::<Vec<_>>()
        .join(" | ");
    log::info!("Scored {}/100 ({})", overall, grade);

    StatePatch {
        overall_score: Some(overall),
        grade: Some(grade),
        ..StatePatch::message(format!("Scores: {} → Overall: {}/100 ({})", breakdown, overall, grade))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::evaluator::{DimensionScore, Grade};
    use crate::llms::SettingsGatewayFactory;

    #[test]
    fn test_score_patch() {
        let factory = SettingsGatewayFactory::new(Settings::default());
        let ctx = RunContext::new(&factory);
        let mut state = EvaluationState::new("x");
        state.dimension_scores = vec![
            DimensionScore::zero("task"),
            DimensionScore::new("context", 80, vec![]),
        ];
        let patch = score(&state, &ctx);
        assert_eq!(patch.overall_score, Some(20));
        assert_eq!(patch.grade, Some(Grade::Weak));
        assert_eq!(
            patch.summary(),
            "Scores: Task: 0 | Context: 80 | References: 0 | Constraints: 0 → Overall: 20/100 (Weak)"
        );
    }

    #[test]
    fn test_empty_dimensions_score_zero() {
        let factory = SettingsGatewayFactory::new(Settings::default());
        let ctx = RunContext::new(&factory);
        let patch = score(&EvaluationState::new("x"), &ctx);
        assert_eq!(patch.overall_score, Some(0));
        assert_eq!(patch.grade, Some(Grade::Weak));
    }
}
