//! Create payloads for documents, deadlines and hearings, plus the
//! orchestrated "file a case" request.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

pub const MAX_PROCESS_ID_CHARS: usize = 100;
pub const ORCHESTRATION_PROCESS_ID: &str = "ORCH-01";
pub const ORCHESTRATION_DEADLINE_DAYS: u64 = 30;
pub const ORCHESTRATION_HEARING_DAYS: u64 = 15;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordInputError {
    #[error("Por favor, informe o ID do processo.")]
    EmptyProcessId,
    #[error("ID do processo muito longo (máximo {} caracteres).", MAX_PROCESS_ID_CHARS)]
    ProcessIdTooLong,
    #[error("Por favor, preencha todos os campos obrigatórios ({fields}).")]
    MissingFields { fields: &'static str },
    #[error("date {0} is out of range")]
    DateOutOfRange(NaiveDate),
}

pub fn validate_process_id(raw: &str) -> Result<String, RecordInputError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(RecordInputError::EmptyProcessId);
    }
    if trimmed.chars().count() > MAX_PROCESS_ID_CHARS {
        return Err(RecordInputError::ProcessIdTooLong);
    }
    Ok(trimmed.to_string())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDocument {
    pub title: String,
    pub content: String,
    pub author: String,
    pub process_id: String,
}

impl NewDocument {
    pub fn new(
        process_id: &str,
        title: &str,
        content: &str,
        author: &str,
    ) -> Result<Self, RecordInputError> {
        let process_id = validate_process_id(process_id)?;
        let (title, content, author) = (title.trim(), content.trim(), author.trim());
        if title.is_empty() || content.is_empty() || author.is_empty() {
            return Err(RecordInputError::MissingFields {
                fields: "título, conteúdo e autor",
            });
        }
        Ok(Self {
            title: title.to_string(),
            content: content.to_string(),
            author: author.to_string(),
            process_id,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDeadline {
    pub process_id: String,
    pub due_date: NaiveDate,
    pub description: String,
}

impl NewDeadline {
    pub fn new(
        process_id: &str,
        due_date: NaiveDate,
        description: &str,
    ) -> Result<Self, RecordInputError> {
        let process_id = validate_process_id(process_id)?;
        let description = description.trim();
        if description.is_empty() {
            return Err(RecordInputError::MissingFields {
                fields: "data e descrição",
            });
        }
        Ok(Self {
            process_id,
            due_date,
            description: description.to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewHearing {
    pub process_id: String,
    pub date: NaiveDate,
    pub courtroom: String,
    pub description: String,
}

impl NewHearing {
    pub fn new(
        process_id: &str,
        date: NaiveDate,
        courtroom: &str,
        description: &str,
    ) -> Result<Self, RecordInputError> {
        let process_id = validate_process_id(process_id)?;
        let (courtroom, description) = (courtroom.trim(), description.trim());
        if courtroom.is_empty() || description.is_empty() {
            return Err(RecordInputError::MissingFields {
                fields: "sala e descrição",
            });
        }
        Ok(Self {
            process_id,
            date,
            courtroom: courtroom.to_string(),
            description: description.to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NewRecord {
    Document(NewDocument),
    Deadline(NewDeadline),
    Hearing(NewHearing),
}

impl NewRecord {
    #[must_use]
    pub fn path(&self) -> &'static str {
        match self {
            Self::Document(_) => "/api/documents",
            Self::Deadline(_) => "/api/deadlines",
            Self::Hearing(_) => "/api/hearings",
        }
    }

    pub fn to_json(&self) -> Result<serde_json::Value, serde_json::Error> {
        match self {
            Self::Document(document) => serde_json::to_value(document),
            Self::Deadline(deadline) => serde_json::to_value(deadline),
            Self::Hearing(hearing) => serde_json::to_value(hearing),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrchestratedDocument {
    pub title: String,
    pub content: String,
    pub author: String,
}

/// Body of `POST /api/orchestrate/file-case`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileCaseRequest {
    pub document: OrchestratedDocument,
    pub deadline: NewDeadline,
    pub hearing: NewHearing,
}

impl FileCaseRequest {
    /// Initial petition with a response deadline in 30 days and the first
    /// hearing in 15, both counted from `today`.
    pub fn for_today(today: NaiveDate) -> Result<Self, RecordInputError> {
        let due_date = add_days(today, ORCHESTRATION_DEADLINE_DAYS)?;
        let hearing_date = add_days(today, ORCHESTRATION_HEARING_DAYS)?;
        Ok(Self {
            document: OrchestratedDocument {
                title: "Petição Inicial via Orquestração".to_string(),
                content: "Documento criado através da funcionalidade de orquestração automática."
                    .to_string(),
                author: "Sistema".to_string(),
            },
            deadline: NewDeadline {
                process_id: ORCHESTRATION_PROCESS_ID.to_string(),
                due_date,
                description: "Prazo para resposta - criado via orquestração".to_string(),
            },
            hearing: NewHearing {
                process_id: ORCHESTRATION_PROCESS_ID.to_string(),
                date: hearing_date,
                courtroom: "Sala 3".to_string(),
                description: "Audiência inicial - criada via orquestração".to_string(),
            },
        })
    }
}

fn add_days(date: NaiveDate, days: u64) -> Result<NaiveDate, RecordInputError> {
    date.checked_add_days(Days::new(days))
        .ok_or(RecordInputError::DateOutOfRange(date))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn date(raw: &str) -> NaiveDate {
        NaiveDate::parse_from_str(raw, "%Y-%m-%d").expect("valid date")
    }

    #[test]
    fn process_id_is_trimmed_and_bounded() {
        assert_eq!(validate_process_id("  PROC-1 "), Ok("PROC-1".to_string()));
        assert_eq!(validate_process_id("   "), Err(RecordInputError::EmptyProcessId));
        assert!(validate_process_id(&"x".repeat(MAX_PROCESS_ID_CHARS)).is_ok());
        assert_eq!(
            validate_process_id(&"x".repeat(MAX_PROCESS_ID_CHARS + 1)),
            Err(RecordInputError::ProcessIdTooLong)
        );
    }

    #[test]
    fn document_payload_shape() {
        let document =
            NewDocument::new("PROC-1", " Petição ", "Conteúdo", "Ana").expect("document");
        assert_eq!(
            NewRecord::Document(document).to_json().expect("json"),
            json!({
                "title": "Petição",
                "content": "Conteúdo",
                "author": "Ana",
                "process_id": "PROC-1"
            })
        );
    }

    #[test]
    fn document_requires_all_fields() {
        let error = NewDocument::new("PROC-1", "Petição", " ", "Ana").expect_err("missing content");
        assert!(matches!(error, RecordInputError::MissingFields { .. }));
    }

    #[test]
    fn deadline_and_hearing_serialize_iso_dates() {
        let deadline =
            NewDeadline::new("PROC-1", date("2026-03-01"), "Contestação").expect("deadline");
        let json = NewRecord::Deadline(deadline).to_json().expect("json");
        assert_eq!(json["due_date"], "2026-03-01");

        let hearing = NewHearing::new("PROC-1", date("2026-03-02"), "Sala 1", "Instrução")
            .expect("hearing");
        let record = NewRecord::Hearing(hearing);
        assert_eq!(record.path(), "/api/hearings");
        assert_eq!(record.to_json().expect("json")["date"], "2026-03-02");
    }

    #[test]
    fn hearing_requires_courtroom() {
        assert!(NewHearing::new("PROC-1", date("2026-03-02"), "", "Instrução").is_err());
    }

    #[test]
    fn file_case_dates_count_from_today() {
        let request = FileCaseRequest::for_today(date("2026-01-20")).expect("request");
        assert_eq!(request.deadline.due_date, date("2026-02-19"));
        assert_eq!(request.hearing.date, date("2026-02-04"));

        let json = serde_json::to_value(&request).expect("json");
        assert_eq!(json["deadline"]["process_id"], ORCHESTRATION_PROCESS_ID);
        assert_eq!(json["hearing"]["courtroom"], "Sala 3");
        assert_eq!(json["document"]["author"], "Sistema");
    }
}
