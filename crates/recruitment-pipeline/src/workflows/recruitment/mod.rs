//! Recruitment pipeline client: action table, evaluation scoring, screen model and the
//! controller that keeps one authoritative copy of an application in sync with the HR backend.
//!
//! The `sandbox` module carries an in-memory implementation of the backend endpoints so the
//! client can be driven end to end without the production service.

pub mod actions;
pub mod api;
pub mod controller;
pub mod domain;
pub mod draft;
pub mod http;
pub mod listing;
pub mod sandbox;
pub mod scoring;
pub mod view;

#[cfg(test)]
pub(crate) mod tests;

pub use actions::{
    build_request, compute_actions, is_enabled, ActionInput, ActionPayload, ActionSet,
    MissingPayload, PipelineAction, TransitionRequest,
};
pub use api::{ClientError, PipelineApi};
pub use controller::PipelineController;
pub use domain::{
    Application, ApplicationId, Criterion, CriterionEntry, Evaluation, EvaluationSubmission,
    Score, ScoreOutOfRange, Stage, Status, TransitionLogEntry, UnknownValue,
};
pub use draft::EvaluationDraft;
pub use http::{ApiRoutes, CsrfToken, HttpPipelineApi};
pub use listing::{filter_applications, render_list, ListQuery, PipelineFilter};
pub use scoring::{weighted_score, ScoreDisplay, ScoreSource, ScoreThresholds};
pub use view::{
    ActionArea, ActionControl, BindingError, ControlId, EvaluationPanel, Notice, NoticeLevel,
    PipelineRenderer, PipelineScreen, Region, RegionContent, RenderSurface, SegmentState,
    TextSurface,
};
