use super::domain::{
    CriteriaEntries, Criterion, CriterionEntry, Evaluation, EvaluationSubmission, Score, Stage,
};
use super::scoring::ScoreDisplay;

/// Local, unsaved edits to the current stage's evaluation.
///
/// A draft starts as a copy of whatever the server last returned. Once the reviewer touches a
/// score or note it becomes dirty and the score display switches to the local computation.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationDraft {
    stage: Stage,
    criteria: CriteriaEntries,
    dirty: bool,
}

impl EvaluationDraft {
    pub fn hydrate(stage: Stage, saved: Option<&Evaluation>) -> Self {
        let criteria = match saved.filter(|evaluation| evaluation.stage == stage) {
            Some(evaluation) => evaluation.criteria.clone(),
            None => Evaluation::blank(stage).criteria,
        };
        Self {
            stage,
            criteria,
            dirty: false,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn score(&self, criterion: Criterion) -> Option<Score> {
        self.criteria.get(&criterion).and_then(|entry| entry.score)
    }

    pub fn notes(&self, criterion: Criterion) -> &str {
        self.criteria
            .get(&criterion)
            .map(|entry| entry.notes.as_str())
            .unwrap_or("")
    }

    pub fn scores(&self) -> Vec<Option<Score>> {
        Criterion::ALL
            .into_iter()
            .map(|criterion| self.score(criterion))
            .collect()
    }

    pub fn set_score(&mut self, criterion: Criterion, score: Option<Score>) {
        self.entry(criterion).score = score;
        self.dirty = true;
    }

    pub fn set_notes(&mut self, criterion: Criterion, notes: impl Into<String>) {
        self.entry(criterion).notes = notes.into();
        self.dirty = true;
    }

    fn entry(&mut self, criterion: Criterion) -> &mut CriterionEntry {
        self.criteria.entry(criterion).or_default()
    }

    /// Server score while the draft mirrors the saved evaluation, local score once edited.
    pub fn score_display(&self, saved: Option<&Evaluation>) -> ScoreDisplay {
        let server = saved
            .filter(|evaluation| evaluation.stage == self.stage && !self.dirty)
            .and_then(|evaluation| evaluation.weighted_score);
        ScoreDisplay::resolve(server, self.scores())
    }

    pub fn to_submission(&self) -> EvaluationSubmission {
        EvaluationSubmission {
            stage: self.stage,
            criteria: self.criteria.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn saved(stage: Stage, weighted: f64, career: u8) -> Evaluation {
        let mut evaluation = Evaluation::blank(stage);
        evaluation.weighted_score = Some(weighted);
        evaluation
            .criteria
            .entry(Criterion::Career)
            .or_default()
            .score = Some(Score::new(career).expect("valid score"));
        evaluation
    }

    #[test]
    fn hydrated_draft_shows_server_score() {
        let evaluation = saved(Stage::Screening, 7.25, 2);
        let draft = EvaluationDraft::hydrate(Stage::Screening, Some(&evaluation));
        assert!(!draft.is_dirty());
        assert_eq!(draft.score(Criterion::Career).map(Score::value), Some(2));
        assert_eq!(draft.score_display(Some(&evaluation)).to_string(), "7.25 / 10");
    }

    #[test]
    fn edits_switch_to_local_score() {
        let evaluation = saved(Stage::Screening, 7.25, 2);
        let mut draft = EvaluationDraft::hydrate(Stage::Screening, Some(&evaluation));
        draft.set_score(Criterion::Career, Some(Score::new(3).expect("valid score")));
        assert!(draft.is_dirty());
        assert_eq!(draft.score_display(Some(&evaluation)).to_string(), "6.00 / 10");
    }

    #[test]
    fn evaluation_for_another_stage_is_ignored() {
        let evaluation = saved(Stage::Screening, 9.0, 5);
        let draft = EvaluationDraft::hydrate(Stage::Interview, Some(&evaluation));
        assert_eq!(draft.score(Criterion::Career), None);
        assert_eq!(draft.score_display(Some(&evaluation)).to_string(), "0.00 / 10");
    }

    #[test]
    fn submission_carries_notes_and_scores() {
        let mut draft = EvaluationDraft::hydrate(Stage::Interview, None);
        draft.set_score(Criterion::Skills, Some(Score::new(4).expect("valid score")));
        draft.set_notes(Criterion::Skills, "strong systems background");
        let submission = draft.to_submission();
        assert_eq!(submission.stage, Stage::Interview);
        let body = serde_json::to_value(&submission).expect("serializes");
        assert_eq!(body["skills_score"], 4);
        assert_eq!(body["skills_notes"], "strong systems background");
        assert_eq!(body["career_score"], serde_json::Value::Null);
    }
}
