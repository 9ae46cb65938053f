use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use super::super::domain::{Application, ApplicationId};

/// Parsing errors surfaced when seeding the sandbox from CSV.
#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("failed to read seed file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid seed data: {0}")]
    Csv(#[from] csv::Error),
    #[error("row {row} is missing an id")]
    MissingId { row: usize },
}

#[derive(Debug, Deserialize)]
struct SeedRow {
    id: String,
    #[serde(default)]
    first_name: Option<String>,
    #[serde(default)]
    last_name: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    role_applied_for: Option<String>,
}

/// Read `id,first_name,last_name,email,role_applied_for` rows into fresh submitted applications.
pub fn applications_from_csv<R: Read>(reader: R) -> Result<Vec<Application>, SeedError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut applications = Vec::new();
    for (index, row) in csv_reader.deserialize::<SeedRow>().enumerate() {
        let row = row?;
        if row.id.is_empty() {
            return Err(SeedError::MissingId { row: index + 1 });
        }

        let mut application = Application::submitted(ApplicationId(row.id));
        application.first_name = non_empty(row.first_name);
        application.last_name = non_empty(row.last_name);
        application.email = non_empty(row.email);
        application.role_applied_for = non_empty(row.role_applied_for);
        applications.push(application);
    }

    Ok(applications)
}

pub fn applications_from_path(path: &Path) -> Result<Vec<Application>, SeedError> {
    let file = std::fs::File::open(path)?;
    applications_from_csv(file)
}

/// Built-in candidates used by the demo and by a sandbox started without a seed file.
pub fn demo_applications() -> Vec<Application> {
    const DEMO: &str = "\
id,first_name,last_name,email,role_applied_for
1001,Amara,Okafor,amara.okafor@example.com,Branch Operations Lead
1002,Jonas,Lindqvist,jonas.lindqvist@example.com,Payroll Specialist
1003,Priya,Raman,priya.raman@example.com,HR Business Partner
";
    applications_from_csv(DEMO.as_bytes()).unwrap_or_default()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::recruitment::domain::{Stage, Status};

    #[test]
    fn rows_become_submitted_applications() {
        let csv = "id,first_name,last_name,email,role_applied_for\n 7 , Dana , Reyes ,,Recruiter\n";
        let applications = applications_from_csv(csv.as_bytes()).expect("csv parses");
        assert_eq!(applications.len(), 1);

        let application = &applications[0];
        assert_eq!(application.id.as_str(), "7");
        assert_eq!(application.full_name(), "Dana Reyes");
        assert_eq!(application.email, None);
        assert_eq!(application.current_stage, Stage::Submitted);
        assert_eq!(application.status, Status::Active);
    }

    #[test]
    fn blank_id_is_rejected() {
        let csv = "id,first_name,last_name,email,role_applied_for\n,Dana,Reyes,d@example.com,Recruiter\n";
        let err = applications_from_csv(csv.as_bytes()).expect_err("missing id");
        assert!(matches!(err, SeedError::MissingId { row: 1 }));
    }

    #[test]
    fn demo_set_is_available() {
        assert_eq!(demo_applications().len(), 3);
    }
}
