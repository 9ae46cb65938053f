use std::fmt::{self, Write as _};
use std::str::FromStr;

use super::domain::{Application, Stage, Status, UnknownValue};

/// Which slice of the pipeline a list view shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PipelineFilter {
    #[default]
    All,
    /// Approved hires waiting on onboarding.
    Onboarding,
    /// Open records sitting in one stage. Closed records never match.
    Stage(Stage),
}

impl PipelineFilter {
    pub fn matches(&self, application: &Application) -> bool {
        match self {
            PipelineFilter::All => true,
            PipelineFilter::Onboarding => application.status == Status::HireApproved,
            PipelineFilter::Stage(stage) => {
                application.current_stage == *stage && !application.is_terminal()
            }
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PipelineFilter::All => "all",
            PipelineFilter::Onboarding => "onboarding",
            PipelineFilter::Stage(stage) => stage.label(),
        }
    }
}

impl fmt::Display for PipelineFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for PipelineFilter {
    type Err = UnknownValue;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "" | "all" => Ok(PipelineFilter::All),
            "onboarding" => Ok(PipelineFilter::Onboarding),
            other => other
                .parse()
                .map(PipelineFilter::Stage)
                .map_err(|_| UnknownValue {
                    kind: "filter",
                    value: value.to_string(),
                }),
        }
    }
}

/// Filter chip plus an optional exact status match, as sent to `GET /applications`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ListQuery {
    pub filter: PipelineFilter,
    pub status: Option<Status>,
}

impl ListQuery {
    pub fn new(filter: PipelineFilter) -> Self {
        Self {
            filter,
            status: None,
        }
    }

    pub fn with_status(mut self, status: Status) -> Self {
        self.status = Some(status);
        self
    }

    pub fn matches(&self, application: &Application) -> bool {
        self.filter.matches(application)
            && self.status.map_or(true, |status| application.status == status)
    }

    /// Query-string pairs; the default filter and an absent status are omitted.
    pub fn query_pairs(&self) -> Vec<(&'static str, &'static str)> {
        let mut pairs = Vec::new();
        if self.filter != PipelineFilter::All {
            pairs.push(("stage", self.filter.label()));
        }
        if let Some(status) = self.status {
            pairs.push(("status", status.label()));
        }
        pairs
    }
}

/// Keeps the applications matching `query`, preserving their order.
pub fn filter_applications<I>(applications: I, query: &ListQuery) -> Vec<Application>
where
    I: IntoIterator<Item = Application>,
{
    applications
        .into_iter()
        .filter(|application| query.matches(application))
        .collect()
}

/// One line per application: id, candidate, role, stage badge and status.
pub fn render_list(applications: &[Application]) -> String {
    if applications.is_empty() {
        return "no applications match\n".to_string();
    }

    let mut out = String::new();
    for application in applications {
        let _ = writeln!(
            out,
            "{:<8} {:<24} {:<28} {:<13} {}",
            application.id.to_string(),
            application.full_name(),
            application.role_applied_for.as_deref().unwrap_or("-"),
            application.current_stage.title(),
            application.status
        );
    }
    out
}
