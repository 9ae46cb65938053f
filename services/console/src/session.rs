use crate::infra::{parse_action, parse_date, parse_filter, parse_note, parse_score, parse_status};
use chrono::{DateTime, Utc};
use clap::Args;
use recruitment_pipeline::config::PipelineConfig;
use recruitment_pipeline::error::AppError;
use recruitment_pipeline::telemetry;
use recruitment_pipeline::workflows::recruitment::{
    render_list, ActionInput, ApplicationId, ClientError, Criterion, HttpPipelineApi, ListQuery,
    PipelineAction, PipelineApi, PipelineController, PipelineFilter, Score, Status, TextSurface,
};
use std::sync::Arc;

type Console = PipelineController<HttpPipelineApi, TextSurface>;

#[derive(Args, Debug)]
pub(crate) struct ListArgs {
    /// Filter chip: all, onboarding, or a stage (submitted, screening, interview, final_review, decision)
    #[arg(long, default_value = "all", value_parser = parse_filter)]
    pub(crate) stage: PipelineFilter,
    /// Only applications with exactly this status, e.g. active or rejected
    #[arg(long, value_parser = parse_status)]
    pub(crate) status: Option<Status>,
}

impl ListArgs {
    fn query(&self) -> ListQuery {
        let query = ListQuery::new(self.stage);
        match self.status {
            Some(status) => query.with_status(status),
            None => query,
        }
    }
}

#[derive(Args, Debug)]
pub(crate) struct TransitionArgs {
    /// Application id
    pub(crate) id: String,
    /// Action name, e.g. start_screening or schedule_interview
    #[arg(value_parser = parse_action)]
    pub(crate) action: PipelineAction,
    /// Interview date for schedule_interview (YYYY-MM-DD, YYYY-MM-DDTHH:MM or RFC 3339)
    #[arg(long, value_parser = parse_date)]
    pub(crate) interview_date: Option<DateTime<Utc>>,
}

#[derive(Args, Debug)]
pub(crate) struct EvaluateArgs {
    /// Application id
    pub(crate) id: String,
    /// Career progression score (1-5)
    #[arg(long, value_parser = parse_score)]
    pub(crate) career: Option<Score>,
    /// Relevant experience score (1-5)
    #[arg(long, value_parser = parse_score)]
    pub(crate) experience: Option<Score>,
    /// Job stability score (1-5)
    #[arg(long, value_parser = parse_score)]
    pub(crate) stability: Option<Score>,
    /// Education score (1-5)
    #[arg(long, value_parser = parse_score)]
    pub(crate) education: Option<Score>,
    /// Skills score (1-5)
    #[arg(long, value_parser = parse_score)]
    pub(crate) skills: Option<Score>,
    /// Criterion notes as criterion=text; may be repeated
    #[arg(long = "notes", value_parser = parse_note)]
    pub(crate) notes: Vec<(Criterion, String)>,
    /// Finalize the evaluation once it is saved
    #[arg(long)]
    pub(crate) finalize: bool,
}

impl EvaluateArgs {
    fn scores(&self) -> [(Criterion, Option<Score>); 5] {
        [
            (Criterion::Career, self.career),
            (Criterion::Experience, self.experience),
            (Criterion::Stability, self.stability),
            (Criterion::Education, self.education),
            (Criterion::Skills, self.skills),
        ]
    }
}

pub(crate) async fn list(args: ListArgs) -> Result<(), AppError> {
    let api = http_api()?;
    let applications = api.list_applications(&args.query()).await?;
    print!("{}", render_list(&applications));
    Ok(())
}

pub(crate) async fn show(id: String) -> Result<(), AppError> {
    let mut console = connect()?;
    let outcome = console.load(&ApplicationId::new(id)).await.map(|_| ());
    finish(&console, outcome)
}

pub(crate) async fn transition(args: TransitionArgs) -> Result<(), AppError> {
    let mut console = connect()?;
    console.load(&ApplicationId::new(args.id)).await?;

    let input = ActionInput {
        interview_date: args.interview_date,
    };
    let outcome = console
        .perform_transition(args.action, &input)
        .await
        .map(|_| ());
    finish(&console, outcome)
}

pub(crate) async fn evaluate(args: EvaluateArgs) -> Result<(), AppError> {
    let mut console = connect()?;
    console.load(&ApplicationId::new(args.id.clone())).await?;

    let outcome = apply_evaluation(&mut console, &args).await;
    finish(&console, outcome)
}

pub(crate) async fn finalize(id: String) -> Result<(), AppError> {
    let mut console = connect()?;
    let stage = console.load(&ApplicationId::new(id)).await?.current_stage;
    let outcome = console.finalize_evaluation(stage).await.map(|_| ());
    finish(&console, outcome)
}

async fn apply_evaluation(console: &mut Console, args: &EvaluateArgs) -> Result<(), ClientError> {
    for (criterion, score) in args.scores() {
        if score.is_some() {
            console.set_score(criterion, score)?;
        }
    }
    for (criterion, text) in &args.notes {
        console.set_notes(*criterion, text.clone())?;
    }

    let saved = console.save_draft().await?;
    if args.finalize {
        console.finalize_evaluation(saved.stage).await?;
    }
    Ok(())
}

fn http_api() -> Result<HttpPipelineApi, AppError> {
    let config = PipelineConfig::load()?;
    telemetry::init(&config.telemetry)?;

    Ok(HttpPipelineApi::new(&config.api)?)
}

fn connect() -> Result<Console, AppError> {
    let api = http_api()?;
    Ok(PipelineController::new(Arc::new(api), TextSurface::new())?)
}

/// Prints the screen as it stands, including any error notice, then reports the outcome.
fn finish(console: &Console, outcome: Result<(), ClientError>) -> Result<(), AppError> {
    print!("{}", console.surface());
    outcome.map_err(AppError::from)
}
