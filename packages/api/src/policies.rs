//! Policy e-signature endpoints.
//!
//! Employees receive a signing link containing an opaque token; the
//! client verifies the token to show the policy, then signs or declines
//! against the same token. No session credential is involved.

use serde::{Deserialize, Serialize};

use crate::client::ApiClient;
use crate::error::ApiError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SignatureStatus {
    Pending,
    Signed,
    Declined,
    Expired,
}

/// What a signing token resolves to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PolicySignatureRequest {
    pub policy_title: String,
    pub policy_body: String,
    pub employee_name: String,
    pub status: SignatureStatus,
}

#[derive(Debug, Clone, Serialize)]
struct SignRequest<'a> {
    signature_name: &'a str,
}

#[derive(Debug, Clone, Serialize)]
struct DeclineRequest<'a> {
    reason: &'a str,
}

impl ApiClient {
    /// Resolve a signing token into the policy awaiting signature.
    pub async fn verify_policy_token(
        &self,
        token: &str,
    ) -> Result<PolicySignatureRequest, ApiError> {
        self.get_json(&format!("/policies/sign/{token}")).await
    }

    /// Sign the policy addressed by `token` with the typed full name.
    pub async fn sign_policy(&self, token: &str, signature_name: &str) -> Result<(), ApiError> {
        self.post_json_unit(
            &format!("/policies/sign/{token}"),
            &SignRequest { signature_name },
        )
        .await
    }

    /// Decline to sign the policy addressed by `token`.
    pub async fn decline_policy(&self, token: &str, reason: &str) -> Result<(), ApiError> {
        self.post_json_unit(
            &format!("/policies/sign/{token}/decline"),
            &DeclineRequest { reason },
        )
        .await
    }
}
