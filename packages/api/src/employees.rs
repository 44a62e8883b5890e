//! Employee CRUD and onboarding task assignment.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::client::ApiClient;
use crate::error::ApiError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Employee {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    /// First day on the job, e.g. 2026-09-01.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
}

/// Payload for creating or updating an employee.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NewEmployee {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
}

/// A required field was left empty on the employee form.
///
/// Raised locally, before any network call is made.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("missing required fields: {}", missing.join(", "))]
pub struct MissingFields {
    pub missing: Vec<&'static str>,
}

impl NewEmployee {
    /// Validate that every required field is filled in.
    pub fn validate(&self) -> Result<(), MissingFields> {
        let mut missing = Vec::new();
        if self.first_name.trim().is_empty() {
            missing.push("first_name");
        }
        if self.last_name.trim().is_empty() {
            missing.push("last_name");
        }
        if self.email.trim().is_empty() {
            missing.push("email");
        }
        if missing.is_empty() {
            Ok(())
        } else {
            Err(MissingFields { missing })
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct AssignTasksRequest<'a> {
    task_template_ids: &'a [Uuid],
}

impl ApiClient {
    pub async fn list_employees(&self) -> Result<Vec<Employee>, ApiError> {
        self.get_json("/employees").await
    }

    pub async fn get_employee(&self, id: Uuid) -> Result<Employee, ApiError> {
        self.get_json(&format!("/employees/{id}")).await
    }

    /// Create an employee. Validation failures never reach the network.
    pub async fn create_employee(&self, employee: &NewEmployee) -> Result<Employee, ApiError> {
        employee
            .validate()
            .map_err(|e| ApiError::Validation(e.to_string()))?;
        self.post_json("/employees", employee).await
    }

    pub async fn update_employee(
        &self,
        id: Uuid,
        employee: &NewEmployee,
    ) -> Result<Employee, ApiError> {
        employee
            .validate()
            .map_err(|e| ApiError::Validation(e.to_string()))?;
        self.put_json(&format!("/employees/{id}"), employee).await
    }

    pub async fn delete_employee(&self, id: Uuid) -> Result<(), ApiError> {
        self.delete_unit(&format!("/employees/{id}")).await
    }

    /// Attach onboarding task templates to an employee's checklist.
    pub async fn assign_onboarding_tasks(
        &self,
        employee_id: Uuid,
        task_template_ids: &[Uuid],
    ) -> Result<(), ApiError> {
        self.post_json_unit(
            &format!("/employees/{employee_id}/onboarding-tasks"),
            &AssignTasksRequest { task_template_ids },
        )
        .await
    }
}
