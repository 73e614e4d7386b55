//! Gateway JSON shapes.
//!
//! These mirror the gateway's REST payloads (camelCase) and are converted to
//! port types at the adapter boundary. Unknown fields are ignored.

use serde::{Deserialize, Serialize};

use crate::ports::{CreateScheduleRequest, PaymentDetail, ScheduleRecord};

// ════════════════════════════════════════════════════════════════════════════════
// Responses
// ════════════════════════════════════════════════════════════════════════════════

/// `GET /payments/{paymentId}` response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentResponse {
    pub id: String,
    #[serde(default)]
    pub payment_id: Option<String>,
    pub amount: AmountBody,
    #[serde(default)]
    pub order_name: String,
    #[serde(default)]
    pub billing_key: Option<String>,
    #[serde(default)]
    pub customer: CustomerBody,
}

impl From<PaymentResponse> for PaymentDetail {
    fn from(body: PaymentResponse) -> Self {
        PaymentDetail {
            id: body.id,
            gateway_payment_id: body.payment_id,
            amount_total: body.amount.total,
            order_name: body.order_name,
            billing_key: body.billing_key,
            customer_id: body.customer.id.filter(|id| !id.trim().is_empty()),
        }
    }
}

/// `GET /payment-schedules` response.
#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleListResponse {
    #[serde(default)]
    pub items: Vec<ScheduleItem>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleItem {
    pub id: String,
    pub payment_id: String,
}

impl From<ScheduleItem> for ScheduleRecord {
    fn from(item: ScheduleItem) -> Self {
        ScheduleRecord {
            id: item.id,
            payment_id: item.payment_id,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Requests
// ════════════════════════════════════════════════════════════════════════════════

/// `POST /payments/{scheduleId}/schedule` body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateScheduleBody {
    pub payment: ScheduledPaymentBody,
    pub time_to_pay: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledPaymentBody {
    pub billing_key: String,
    pub order_name: String,
    pub customer: CustomerBody,
    pub amount: AmountBody,
    pub currency: String,
}

impl From<&CreateScheduleRequest> for CreateScheduleBody {
    fn from(request: &CreateScheduleRequest) -> Self {
        CreateScheduleBody {
            payment: ScheduledPaymentBody {
                billing_key: request.billing_key.clone(),
                order_name: request.order_name.clone(),
                customer: CustomerBody {
                    id: Some(request.customer_id.clone()),
                },
                amount: AmountBody {
                    total: request.amount_total,
                },
                currency: request.currency.clone(),
            },
            time_to_pay: request.time_to_pay.to_rfc3339(),
        }
    }
}

/// `GET /payment-schedules` body.
#[derive(Debug, Clone, Serialize)]
pub struct ScheduleQueryBody {
    pub filter: ScheduleFilter,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleFilter {
    pub billing_key: String,
    pub from: String,
    pub until: String,
}

/// `DELETE /payment-schedules` body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelSchedulesBody {
    pub schedule_ids: Vec<String>,
}

// ════════════════════════════════════════════════════════════════════════════════
// Shared
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmountBody {
    pub total: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CustomerBody {
    #[serde(default)]
    pub id: Option<String>,
}
