//! Broker/agency administration endpoints.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::client::ApiClient;
use crate::error::ApiError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BrokerStatus {
    Pending,
    Active,
    Suspended,
}

/// How candidate submissions from a broker are routed internally.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BrokerRouting {
    /// User ids of the recruiters receiving this broker's submissions.
    pub recruiter_ids: Vec<Uuid>,
    /// Whether submissions also land in the shared triage queue.
    pub shared_queue: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Broker {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub status: BrokerStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub routing: Option<BrokerRouting>,
}

/// Payload for creating or updating a broker.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewBroker {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize)]
struct StatusRequest {
    status: BrokerStatus,
}

impl ApiClient {
    pub async fn list_brokers(&self) -> Result<Vec<Broker>, ApiError> {
        self.get_json("/brokers").await
    }

    pub async fn get_broker(&self, id: Uuid) -> Result<Broker, ApiError> {
        self.get_json(&format!("/brokers/{id}")).await
    }

    pub async fn create_broker(&self, broker: &NewBroker) -> Result<Broker, ApiError> {
        self.post_json("/brokers", broker).await
    }

    pub async fn update_broker(&self, id: Uuid, broker: &NewBroker) -> Result<Broker, ApiError> {
        self.put_json(&format!("/brokers/{id}"), broker).await
    }

    pub async fn delete_broker(&self, id: Uuid) -> Result<(), ApiError> {
        self.delete_unit(&format!("/brokers/{id}")).await
    }

    /// Activate, suspend, or park a broker.
    pub async fn set_broker_status(&self, id: Uuid, status: BrokerStatus) -> Result<(), ApiError> {
        self.post_json_unit(&format!("/brokers/{id}/status"), &StatusRequest { status })
            .await
    }

    /// Replace the broker's submission routing.
    pub async fn update_broker_routing(
        &self,
        id: Uuid,
        routing: &BrokerRouting,
    ) -> Result<Broker, ApiError> {
        self.put_json(&format!("/brokers/{id}/routing"), routing)
            .await
    }
}
