use crate::infra::{parse_date, parse_score};
use chrono::{DateTime, Duration, Utc};
use clap::Args;
use recruitment_pipeline::config::{ApiConfig, PipelineConfig};
use recruitment_pipeline::error::AppError;
use recruitment_pipeline::telemetry;
use recruitment_pipeline::workflows::recruitment::sandbox::{
    applications_from_path, demo_applications, sandbox_router, InMemoryPipelineRepository,
    SandboxService, API_PREFIX,
};
use recruitment_pipeline::workflows::recruitment::{
    ActionInput, ApplicationId, ClientError, Criterion, HttpPipelineApi, PipelineAction,
    PipelineController, Score, ScoreThresholds, TextSurface,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::warn;

const DEMO_COOKIE: &str = "csrftoken=console-demo";
const DEMO_REVIEWER: &str = "Demo Reviewer";

type Console = PipelineController<HttpPipelineApi, TextSurface>;

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Application to walk through the pipeline
    #[arg(long, default_value = "1001")]
    pub(crate) id: String,
    /// Optional seed CSV; defaults to the built-in candidates
    #[arg(long)]
    pub(crate) seed: Option<PathBuf>,
    /// Score given to every criterion at each scored stage (1-5)
    #[arg(long, default_value = "4", value_parser = parse_score)]
    pub(crate) score: Score,
    /// Interview date (defaults to three days from now)
    #[arg(long, value_parser = parse_date)]
    pub(crate) interview_date: Option<DateTime<Utc>>,
    /// Have the candidate decline the offer instead of accepting it
    #[arg(long)]
    pub(crate) decline: bool,
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let config = PipelineConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let base_url = spawn_sandbox(args.seed.as_deref()).await?;
    let api = HttpPipelineApi::new(
        &ApiConfig::new(base_url)
            .with_cookie(DEMO_COOKIE)
            .with_actor(DEMO_REVIEWER),
    )?;
    let mut console = PipelineController::new(Arc::new(api), TextSurface::new())?;
    let mut screens = Screens::default();

    println!("Recruitment pipeline demo");
    console.load(&ApplicationId::new(args.id.clone())).await?;
    screens.print(&console, "Application loaded");

    let interview_date = args
        .interview_date
        .unwrap_or_else(|| Utc::now() + Duration::days(3));

    advance(&mut console, &mut screens, PipelineAction::StartScreening, ActionInput::none()).await?;
    score_stage(&mut console, &mut screens, args.score).await?;
    advance(
        &mut console,
        &mut screens,
        PipelineAction::ScheduleInterview,
        ActionInput::interview_on(interview_date),
    )
    .await?;
    score_stage(&mut console, &mut screens, args.score).await?;
    advance(&mut console, &mut screens, PipelineAction::CompleteInterview, ActionInput::none()).await?;
    score_stage(&mut console, &mut screens, args.score).await?;
    advance(&mut console, &mut screens, PipelineAction::SubmitFinalReview, ActionInput::none()).await?;
    advance(&mut console, &mut screens, PipelineAction::Approve, ActionInput::none()).await?;

    let outcome = if args.decline {
        PipelineAction::DeclineOffer
    } else {
        PipelineAction::AcceptOffer
    };
    advance(&mut console, &mut screens, outcome, ActionInput::none()).await?;

    Ok(())
}

#[derive(Default)]
struct Screens {
    shown: usize,
}

impl Screens {
    fn print(&mut self, console: &Console, title: &str) {
        self.shown += 1;
        println!("\n== {}. {title} ==", self.shown);
        print!("{}", console.surface());
    }
}

async fn advance(
    console: &mut Console,
    screens: &mut Screens,
    action: PipelineAction,
    input: ActionInput,
) -> Result<(), AppError> {
    match console.perform_transition(action, &input).await {
        Ok(_) => {
            screens.print(console, action.label());
            Ok(())
        }
        Err(err) => {
            screens.print(console, &format!("{} refused", action.label()));
            Err(err.into())
        }
    }
}

/// Rates every criterion, saves the draft and finalizes it.
async fn score_stage(
    console: &mut Console,
    screens: &mut Screens,
    score: Score,
) -> Result<(), AppError> {
    let result: Result<_, ClientError> = async {
        for criterion in Criterion::ALL {
            console.set_score(criterion, Some(score))?;
        }
        let saved = console.save_draft().await?;
        console.finalize_evaluation(saved.stage).await
    }
    .await;

    match result {
        Ok(evaluation) => {
            screens.print(console, &format!("{} evaluation finalized", evaluation.stage.title()));
            Ok(())
        }
        Err(err) => {
            screens.print(console, "Evaluation refused");
            Err(err.into())
        }
    }
}

/// Serves a seeded sandbox on an ephemeral local port and returns its API base URL.
async fn spawn_sandbox(seed: Option<&std::path::Path>) -> Result<String, AppError> {
    let applications = match seed {
        Some(path) => applications_from_path(path)?,
        None => demo_applications(),
    };
    let service = Arc::new(SandboxService::new(
        Arc::new(InMemoryPipelineRepository::new()),
        ScoreThresholds::default(),
    ));
    service.seed(applications)?;

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let app = sandbox_router(service);
    tokio::spawn(async move {
        if let Err(err) = axum::serve(listener, app).await {
            warn!(error = %err, "demo sandbox stopped");
        }
    });

    Ok(format!("http://{addr}{API_PREFIX}"))
}
