//! CSV import of vacancy drafts for seeding an installation.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Deserializer};

use super::domain::{Modality, VacancyDraft};

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("failed to read vacancy export: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid vacancy CSV data: {0}")]
    Csv(#[from] csv::Error),
    #[error("row {row}: {reason}")]
    Row { row: usize, reason: String },
}

pub struct VacancyCsvImporter;

impl VacancyCsvImporter {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Vec<VacancyDraft>, ImportError> {
        let file = File::open(path)?;
        Self::from_reader(file)
    }

    /// Parses one draft per row. Rows are numbered from 1, excluding the header.
    pub fn from_reader<R: Read>(reader: R) -> Result<Vec<VacancyDraft>, ImportError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut drafts = Vec::new();

        for (index, record) in csv_reader.deserialize::<VacancyRow>().enumerate() {
            let row = record?;
            drafts.push(row.into_draft(index + 1)?);
        }

        Ok(drafts)
    }
}

#[derive(Debug, Deserialize)]
struct VacancyRow {
    title: String,
    description: String,
    technologies: String,
    seniority: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    soft_skills: Option<String>,
    location: String,
    modality: String,
    salary_range: String,
    company: String,
    max_applicants: u32,
}

impl VacancyRow {
    fn into_draft(self, row: usize) -> Result<VacancyDraft, ImportError> {
        let modality = self
            .modality
            .parse::<Modality>()
            .map_err(|reason| ImportError::Row { row, reason })?;
        if self.max_applicants == 0 {
            return Err(ImportError::Row {
                row,
                reason: "max_applicants must be at least 1".to_string(),
            });
        }

        Ok(VacancyDraft {
            title: self.title,
            description: self.description,
            technologies: self.technologies,
            seniority: self.seniority,
            soft_skills: self.soft_skills,
            location: self.location,
            modality,
            salary_range: self.salary_range,
            company: self.company,
            max_applicants: self.max_applicants,
        })
    }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}
