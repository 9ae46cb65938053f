use super::common::*;

use crate::workflows::recruitment::domain::{Stage, Status};
use crate::workflows::recruitment::listing::{
    filter_applications, render_list, ListQuery, PipelineFilter,
};

#[test]
fn stage_filter_hides_closed_records() {
    let filter = PipelineFilter::Stage(Stage::Decision);
    assert!(filter.matches(&application(Stage::Decision, Status::Active)));
    assert!(filter.matches(&application(Stage::Decision, Status::OfferExtended)));
    for closed in [
        Status::HireApproved,
        Status::Rejected,
        Status::Withdrawn,
        Status::Closed,
    ] {
        assert!(!filter.matches(&application(Stage::Decision, closed)));
    }
    assert!(!filter.matches(&application(Stage::Interview, Status::Active)));
}

#[test]
fn onboarding_filter_keeps_approved_hires_only() {
    let filter = PipelineFilter::Onboarding;
    assert!(filter.matches(&application(Stage::Decision, Status::HireApproved)));
    assert!(!filter.matches(&application(Stage::Decision, Status::OfferExtended)));
    assert!(!filter.matches(&application(Stage::Decision, Status::Rejected)));
}

#[test]
fn all_filter_with_status_is_an_exact_status_match() {
    let query = ListQuery::default().with_status(Status::Rejected);
    let kept = filter_applications(
        [
            application(Stage::Screening, Status::Rejected),
            application(Stage::Interview, Status::Active),
            application(Stage::Decision, Status::Rejected),
        ],
        &query,
    );
    assert_eq!(
        kept.iter().map(|app| app.current_stage).collect::<Vec<_>>(),
        vec![Stage::Screening, Stage::Decision]
    );
}

#[test]
fn filter_names_parse_like_the_chips() {
    assert_eq!("all".parse::<PipelineFilter>(), Ok(PipelineFilter::All));
    assert_eq!("".parse::<PipelineFilter>(), Ok(PipelineFilter::All));
    assert_eq!("onboarding".parse::<PipelineFilter>(), Ok(PipelineFilter::Onboarding));
    assert_eq!(
        "final_review".parse::<PipelineFilter>(),
        Ok(PipelineFilter::Stage(Stage::FinalReview))
    );
    let err = "hired".parse::<PipelineFilter>().expect_err("unknown chip");
    assert_eq!(err.to_string(), "unknown filter 'hired'");
    assert_eq!(PipelineFilter::Stage(Stage::FinalReview).to_string(), "final_review");
}

#[test]
fn query_pairs_skip_defaults() {
    assert!(ListQuery::default().query_pairs().is_empty());
    assert_eq!(
        ListQuery::new(PipelineFilter::Stage(Stage::Interview))
            .with_status(Status::Active)
            .query_pairs(),
        vec![("stage", "interview"), ("status", "active")]
    );
}

#[test]
fn list_text_has_one_line_per_application() {
    let text = render_list(&[screening_application(false)]);
    assert_eq!(text.lines().count(), 1);
    assert!(text.starts_with("7 "));
    assert!(text.contains("Amara Okafor"));
    assert!(text.contains("Branch Operations Lead"));
    assert!(text.trim_end().ends_with("active"));

    assert_eq!(render_list(&[]), "no applications match\n");
}
