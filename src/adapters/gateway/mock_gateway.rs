//! Mock payment gateway for testing.
//!
//! Configurable in-process stand-in for the gateway. Supports:
//! - Pre-configured payments
//! - A schedule store that `create_schedule` writes to and the
//!   query/cancel calls read from
//! - Per-method error injection and latency
//! - Call tracking

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::foundation::Timestamp;
use crate::ports::{
    CreateScheduleRequest, GatewayError, GatewayErrorCode, PaymentDetail, PaymentGateway,
    ScheduleRecord,
};

/// Mock payment gateway for testing.
///
/// # Example
///
/// ```ignore
/// let gateway = MockPaymentGateway::new();
/// gateway.add_payment(PaymentDetail { id: "pay_1".into(), ... });
/// gateway.set_method_error("create_schedule", GatewayError::network("down"));
///
/// handler.handle(cmd).await?;
/// assert_eq!(gateway.call_count("create_schedule"), 1);
/// ```
#[derive(Default)]
pub struct MockPaymentGateway {
    inner: Arc<Mutex<MockState>>,
}

#[derive(Default)]
struct MockState {
    /// Payments by webhook payment id.
    payments: HashMap<String, PaymentDetail>,

    /// Pending schedules.
    schedules: Vec<StoredSchedule>,

    /// Counter for generated schedule ids.
    next_schedule_seq: u32,

    /// Specific errors by method name.
    method_errors: HashMap<String, GatewayError>,

    /// Artificial latency by method name.
    method_delays: HashMap<String, Duration>,

    /// Track method calls for assertions.
    call_log: Vec<MethodCall>,

    /// Every schedule creation request received.
    created: Vec<CreateScheduleRequest>,

    /// Every cancellation batch received.
    cancelled: Vec<Vec<String>>,
}

/// A schedule as held by the mock.
#[derive(Debug, Clone)]
pub struct StoredSchedule {
    pub record: ScheduleRecord,
    pub billing_key: String,
    pub time_to_pay: Timestamp,
}

/// Recorded method call for assertions.
#[derive(Debug, Clone)]
pub struct MethodCall {
    pub method: String,
    pub args: Vec<String>,
}

impl MockPaymentGateway {
    pub fn new() -> Self {
        Self::default()
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Configuration Methods
    // ════════════════════════════════════════════════════════════════════════════

    /// Register a payment under the id a webhook will carry.
    pub fn add_payment(&self, webhook_payment_id: &str, payment: PaymentDetail) {
        self.inner
            .lock()
            .unwrap()
            .payments
            .insert(webhook_payment_id.to_string(), payment);
    }

    /// Seed a pending schedule.
    pub fn add_schedule(&self, schedule: StoredSchedule) {
        self.inner.lock().unwrap().schedules.push(schedule);
    }

    /// Set an error for a specific method.
    pub fn set_method_error(&self, method: &str, error: GatewayError) {
        self.inner
            .lock()
            .unwrap()
            .method_errors
            .insert(method.to_string(), error);
    }

    /// Delay every call to a method by `delay`. `Duration::ZERO` removes it.
    pub fn set_method_delay(&self, method: &str, delay: Duration) {
        let mut state = self.inner.lock().unwrap();
        if delay.is_zero() {
            state.method_delays.remove(method);
        } else {
            state.method_delays.insert(method.to_string(), delay);
        }
    }

    /// Clear all configured errors.
    pub fn clear_errors(&self) {
        self.inner.lock().unwrap().method_errors.clear();
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Call Tracking
    // ════════════════════════════════════════════════════════════════════════════

    /// Get all recorded method calls.
    pub fn calls(&self) -> Vec<MethodCall> {
        self.inner.lock().unwrap().call_log.clone()
    }

    /// Get count of calls to a method.
    pub fn call_count(&self, method: &str) -> usize {
        self.inner
            .lock()
            .unwrap()
            .call_log
            .iter()
            .filter(|c| c.method == method)
            .count()
    }

    /// Schedule creation requests received so far.
    pub fn created_schedules(&self) -> Vec<CreateScheduleRequest> {
        self.inner.lock().unwrap().created.clone()
    }

    /// Cancellation batches received so far.
    pub fn cancelled_schedules(&self) -> Vec<Vec<String>> {
        self.inner.lock().unwrap().cancelled.clone()
    }

    /// Schedules still pending.
    pub fn pending_schedules(&self) -> Vec<StoredSchedule> {
        self.inner.lock().unwrap().schedules.clone()
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Internal Helpers
    // ════════════════════════════════════════════════════════════════════════════

    fn record_call(&self, method: &str, args: Vec<String>) {
        self.inner.lock().unwrap().call_log.push(MethodCall {
            method: method.to_string(),
            args,
        });
    }

    async fn apply_delay(&self, method: &str) {
        let delay = self.inner.lock().unwrap().method_delays.get(method).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }

    fn check_error(&self, method: &str) -> Result<(), GatewayError> {
        match self.inner.lock().unwrap().method_errors.get(method) {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

impl Clone for MockPaymentGateway {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[async_trait]
impl PaymentGateway for MockPaymentGateway {
    async fn get_payment(&self, payment_id: &str) -> Result<PaymentDetail, GatewayError> {
        self.record_call("get_payment", vec![payment_id.to_string()]);
        self.apply_delay("get_payment").await;
        self.check_error("get_payment")?;

        self.inner
            .lock()
            .unwrap()
            .payments
            .get(payment_id)
            .cloned()
            .ok_or_else(|| {
                let mut err = GatewayError::new(
                    GatewayErrorCode::NotFound,
                    format!("Payment {} not found", payment_id),
                );
                err.status = Some(404);
                err
            })
    }

    async fn create_schedule(&self, request: CreateScheduleRequest) -> Result<(), GatewayError> {
        self.record_call(
            "create_schedule",
            vec![
                request.schedule_payment_id.clone(),
                request.billing_key.clone(),
                request.time_to_pay.to_rfc3339(),
            ],
        );
        self.apply_delay("create_schedule").await;
        self.check_error("create_schedule")?;

        let mut state = self.inner.lock().unwrap();
        state.next_schedule_seq += 1;
        let schedule = StoredSchedule {
            record: ScheduleRecord {
                id: format!("schedule_{}", state.next_schedule_seq),
                payment_id: request.schedule_payment_id.clone(),
            },
            billing_key: request.billing_key.clone(),
            time_to_pay: request.time_to_pay,
        };
        state.schedules.push(schedule);
        state.created.push(request);
        Ok(())
    }

    async fn query_payment_schedules(
        &self,
        billing_key: &str,
        from: Timestamp,
        until: Timestamp,
    ) -> Result<Vec<ScheduleRecord>, GatewayError> {
        self.record_call(
            "query_payment_schedules",
            vec![billing_key.to_string(), from.to_rfc3339(), until.to_rfc3339()],
        );
        self.apply_delay("query_payment_schedules").await;
        self.check_error("query_payment_schedules")?;

        Ok(self
            .inner
            .lock()
            .unwrap()
            .schedules
            .iter()
            .filter(|s| s.billing_key == billing_key && from <= s.time_to_pay && s.time_to_pay <= until)
            .map(|s| s.record.clone())
            .collect())
    }

    async fn cancel_schedules(&self, schedule_ids: &[String]) -> Result<(), GatewayError> {
        self.record_call("cancel_schedules", schedule_ids.to_vec());
        self.apply_delay("cancel_schedules").await;
        self.check_error("cancel_schedules")?;

        let mut state = self.inner.lock().unwrap();
        state
            .schedules
            .retain(|s| !schedule_ids.contains(&s.record.id));
        state.cancelled.push(schedule_ids.to_vec());
        Ok(())
    }
}
