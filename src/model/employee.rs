use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use utoipa::ToSchema;

use crate::utils::validation::FieldErrors;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "organization_id": 1,
        "employee_code": "EMP-0001",
        "first_name": "John",
        "last_name": "Doe",
        "email": "john.doe@company.com",
        "phone": "+8801712345678",
        "department": "Engineering",
        "job_title": "Backend Developer",
        "hire_date": "2024-01-01",
        "status": "active"
    })
)]
pub struct Employee {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = 1)]
    pub organization_id: u64,

    #[schema(example = "EMP-0001")]
    pub employee_code: String,

    #[schema(example = "John")]
    pub first_name: String,

    #[schema(example = "Doe")]
    pub last_name: String,

    #[schema(example = "john.doe@company.com")]
    pub email: String,

    #[schema(example = "+8801712345678", nullable = true)]
    pub phone: Option<String>,

    #[schema(example = "Engineering", nullable = true)]
    pub department: Option<String>,

    #[schema(example = "Backend Developer", nullable = true)]
    pub job_title: Option<String>,

    #[schema(example = "2024-01-01", value_type = String, format = "date")]
    pub hire_date: NaiveDate,

    #[schema(example = "active")]
    pub status: String,

    #[schema(value_type = Option<String>, format = "date-time", nullable = true)]
    pub deleted_at: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Certification {
    #[schema(example = "AWS Solutions Architect")]
    pub name: String,
    #[schema(example = "Amazon", nullable = true)]
    pub authority: Option<String>,
    #[schema(example = "2024-03-01", value_type = String, format = "date")]
    pub issued_on: NaiveDate,
    #[schema(example = "2027-03-01", value_type = String, format = "date", nullable = true)]
    pub expires_on: Option<NaiveDate>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct WorkExperience {
    #[schema(example = "Acme Corp")]
    pub company: String,
    #[schema(example = "Software Engineer")]
    pub title: String,
    #[schema(example = "2020-05-01", value_type = String, format = "date")]
    pub start_date: NaiveDate,
    #[schema(example = "2023-12-31", value_type = String, format = "date", nullable = true)]
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Education {
    #[schema(example = "State University")]
    pub institution: String,
    #[schema(example = "BSc Computer Science")]
    pub degree: String,
    #[schema(example = "2015-09-01", value_type = String, format = "date")]
    pub start_date: NaiveDate,
    #[schema(example = "2019-06-30", value_type = String, format = "date", nullable = true)]
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct EmployeeProfile {
    #[schema(example = 1)]
    pub employee_id: u64,
    #[schema(value_type = Vec<String>)]
    pub skills: Json<Vec<String>>,
    #[schema(value_type = Vec<Certification>)]
    pub certifications: Json<Vec<Certification>>,
    #[schema(value_type = Vec<WorkExperience>)]
    pub work_experience: Json<Vec<WorkExperience>>,
    #[schema(value_type = Vec<Education>)]
    pub education: Json<Vec<Education>>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ProfilePayload {
    pub skills: Vec<String>,
    pub certifications: Vec<Certification>,
    pub work_experience: Vec<WorkExperience>,
    pub education: Vec<Education>,
}

impl ProfilePayload {
    /// Date-ordering constraints for every nested collection: an end date
    /// must never precede its start date.
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();

        for (i, cert) in self.certifications.iter().enumerate() {
            if let Some(expires) = cert.expires_on {
                if expires < cert.issued_on {
                    errors.push(
                        format!("certifications[{i}].expires_on"),
                        "must not be before issued_on",
                    );
                }
            }
        }

        for (i, exp) in self.work_experience.iter().enumerate() {
            if let Some(end) = exp.end_date {
                if end < exp.start_date {
                    errors.push(
                        format!("work_experience[{i}].end_date"),
                        "must not be before start_date",
                    );
                }
            }
        }

        for (i, edu) in self.education.iter().enumerate() {
            if let Some(end) = edu.end_date {
                if end < edu.start_date {
                    errors.push(
                        format!("education[{i}].end_date"),
                        "must not be before start_date",
                    );
                }
            }
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn valid_profile() -> ProfilePayload {
        ProfilePayload {
            skills: vec!["rust".into(), "sql".into()],
            certifications: vec![Certification {
                name: "Cert".into(),
                authority: None,
                issued_on: date(2024, 3, 1),
                expires_on: Some(date(2027, 3, 1)),
            }],
            work_experience: vec![WorkExperience {
                company: "Acme".into(),
                title: "Engineer".into(),
                start_date: date(2020, 5, 1),
                end_date: Some(date(2023, 12, 31)),
            }],
            education: vec![Education {
                institution: "State University".into(),
                degree: "BSc".into(),
                start_date: date(2015, 9, 1),
                end_date: None,
            }],
        }
    }

    #[test]
    fn well_ordered_profile_passes() {
        assert!(valid_profile().validate().is_empty());
    }

    #[test]
    fn experience_end_before_start_is_flagged() {
        let mut profile = valid_profile();
        profile.work_experience[0].end_date = Some(date(2019, 1, 1));
        let errors = profile.validate();
        assert!(errors.contains("work_experience[0].end_date"));
    }

    #[test]
    fn certification_expiry_before_issue_is_flagged() {
        let mut profile = valid_profile();
        profile.certifications[0].expires_on = Some(date(2023, 1, 1));
        let errors = profile.validate();
        assert!(errors.contains("certifications[0].expires_on"));
    }

    #[test]
    fn open_ended_spans_are_accepted() {
        let mut profile = valid_profile();
        profile.work_experience[0].end_date = None;
        profile.certifications[0].expires_on = None;
        assert!(profile.validate().is_empty());
    }

    #[test]
    fn errors_name_the_offending_index() {
        let mut profile = valid_profile();
        profile.education.push(Education {
            institution: "Other".into(),
            degree: "MSc".into(),
            start_date: date(2020, 1, 1),
            end_date: Some(date(2019, 1, 1)),
        });
        let errors = profile.validate();
        assert!(errors.contains("education[1].end_date"));
        assert!(!errors.contains("education[0].end_date"));
    }
}
