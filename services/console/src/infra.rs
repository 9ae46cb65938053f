use chrono::{DateTime, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use recruitment_pipeline::workflows::recruitment::sandbox::parse_interview_date;
use recruitment_pipeline::workflows::recruitment::{
    Criterion, PipelineAction, PipelineFilter, Score, Status,
};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) fn parse_action(raw: &str) -> Result<PipelineAction, String> {
    raw.trim().parse::<PipelineAction>().map_err(|err| {
        let known: Vec<&str> = PipelineAction::ALL
            .iter()
            .map(|action| action.as_str())
            .collect();
        format!("{err} (expected one of: {})", known.join(", "))
    })
}

pub(crate) fn parse_score(raw: &str) -> Result<Score, String> {
    raw.parse::<Score>().map_err(|err| err.to_string())
}

pub(crate) fn parse_date(raw: &str) -> Result<DateTime<Utc>, String> {
    parse_interview_date(raw.trim()).ok_or_else(|| {
        format!("failed to parse '{raw}' as YYYY-MM-DD, YYYY-MM-DDTHH:MM or RFC 3339")
    })
}

pub(crate) fn parse_filter(raw: &str) -> Result<PipelineFilter, String> {
    raw.parse::<PipelineFilter>()
        .map_err(|err| format!("{err} (expected all, onboarding or a stage name)"))
}

pub(crate) fn parse_status(raw: &str) -> Result<Status, String> {
    raw.trim().parse::<Status>().map_err(|err| {
        let known: Vec<&str> = Status::ALL.iter().map(|status| status.label()).collect();
        format!("{err} (expected one of: {})", known.join(", "))
    })
}

/// `criterion=text`, e.g. `career=steady progression`.
pub(crate) fn parse_note(raw: &str) -> Result<(Criterion, String), String> {
    let (criterion, text) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected criterion=text, got '{raw}'"))?;
    let criterion = criterion
        .trim()
        .parse::<Criterion>()
        .map_err(|err| err.to_string())?;
    Ok((criterion, text.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use recruitment_pipeline::workflows::recruitment::Stage;

    #[test]
    fn actions_parse_by_wire_name() {
        assert_eq!(
            parse_action(" schedule_interview "),
            Ok(PipelineAction::ScheduleInterview)
        );
        let err = parse_action("hire").expect_err("unknown action");
        assert!(err.contains("start_screening"));
    }

    #[test]
    fn list_filters_parse_chip_and_status_names() {
        assert_eq!(parse_filter("onboarding"), Ok(PipelineFilter::Onboarding));
        assert_eq!(
            parse_filter("interview"),
            Ok(PipelineFilter::Stage(Stage::Interview))
        );
        assert!(parse_filter("hired").is_err());
        assert_eq!(parse_status("offer_extended"), Ok(Status::OfferExtended));
        let err = parse_status("archived").expect_err("unknown status");
        assert!(err.contains("hire_approved"));
    }

    #[test]
    fn notes_split_on_first_equals() {
        assert_eq!(
            parse_note("skills=sql = strong"),
            Ok((Criterion::Skills, "sql = strong".to_string()))
        );
        assert!(parse_note("skills").is_err());
        assert!(parse_note("charisma=high").is_err());
    }

    #[test]
    fn scores_outside_range_are_rejected() {
        assert_eq!(parse_score("4").map(Score::value), Ok(4));
        assert!(parse_score("6").is_err());
        assert!(parse_score("two").is_err());
    }
}
