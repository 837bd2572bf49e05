#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use rxpurge::schema::*;
use rxpurge::{EventSink, MaintenanceDb, PassReport, Value};
use std::sync::Mutex;
use uuid::Uuid;

/// Fixed clock so windows and retention math are deterministic.
pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap()
}

pub fn days_ago(days: i64) -> DateTime<Utc> {
    now() - Duration::days(days)
}

#[derive(Clone, Copy)]
pub struct OrderSeed {
    pub order_id: i64,
    pub hist_ts: DateTime<Utc>,
    pub patient_id: i64,
    pub prescriber_id: i64,
    pub group_no: Option<i64>,
}

impl OrderSeed {
    pub fn new(order_id: i64, hist_ts: DateTime<Utc>) -> Self {
        Self {
            order_id,
            hist_ts,
            patient_id: 1_000 + order_id,
            prescriber_id: 2_000 + order_id,
            group_no: None,
        }
    }

    pub fn patient(mut self, patient_id: i64) -> Self {
        self.patient_id = patient_id;
        self
    }

    pub fn prescriber(mut self, prescriber_id: i64) -> Self {
        self.prescriber_id = prescriber_id;
        self
    }

    pub fn group(mut self, group_no: i64) -> Self {
        self.group_no = Some(group_no);
        self
    }
}

/// Seeds a historical order: the root row, its shared people rows, a
/// couple of owned dependents and an id-only comment row.
pub async fn seed_order(db: &MaintenanceDb, seed: OrderSeed) {
    let group = match seed.group_no {
        Some(no) => Value::Integer(no),
        None => Value::Null,
    };
    db.insert(
        ORDER_HIST,
        vec![
            Value::Integer(seed.order_id),
            Value::Timestamp(seed.hist_ts),
            Value::Integer(seed.patient_id),
            Value::Integer(seed.prescriber_id),
            group,
            Value::Text("completed".into()),
        ],
    )
    .await
    .unwrap();

    db.insert_unique(
        PATIENT,
        PATIENT_ID,
        vec![
            Value::Integer(seed.patient_id),
            Value::Text(format!("patient-{}", seed.patient_id)),
        ],
    )
    .await
    .unwrap();
    db.insert_unique(
        PRESCRIBER,
        PRESCRIBER_ID,
        vec![
            Value::Integer(seed.prescriber_id),
            Value::Text(format!("prescriber-{}", seed.prescriber_id)),
        ],
    )
    .await
    .unwrap();
    if let Some(no) = seed.group_no {
        db.insert_unique(RX_GROUP, GROUP_NO, vec![Value::Integer(no), Value::Null])
            .await
            .unwrap();
    }

    for table in [ORDER_ATTR_HIST, ORDER_AUDIT_HIST, ORDER_ROUTE_HIST] {
        db.insert(
            table,
            vec![
                Value::Integer(seed.order_id),
                Value::Timestamp(seed.hist_ts),
                Value::Text("detail".into()),
            ],
        )
        .await
        .unwrap();
    }

    db.insert(
        ORDER_COMMENT,
        vec![
            Value::Integer(seed.order_id),
            Value::Text("call patient".into()),
        ],
    )
    .await
    .unwrap();
}

pub async fn seed_live_order(db: &MaintenanceDb, order_id: i64, patient_id: i64) {
    db.insert(
        ORDER_LIVE,
        vec![
            Value::Integer(order_id),
            Value::Integer(patient_id),
            Value::Integer(2_000 + order_id),
            Value::Null,
            Value::Text("open".into()),
        ],
    )
    .await
    .unwrap();
}

pub async fn seed_schedule(db: &MaintenanceDb, seed: &OrderSeed, schedule_id: i64) {
    db.insert(
        SCHEDULE_HIST,
        vec![
            Value::Integer(seed.order_id),
            Value::Timestamp(seed.hist_ts),
            Value::Integer(schedule_id),
        ],
    )
    .await
    .unwrap();
    db.insert(
        SCHEDULE_DOSE,
        vec![Value::Integer(schedule_id), Value::Text("10mg".into())],
    )
    .await
    .unwrap();
    db.insert(
        SCHEDULE_DAY,
        vec![Value::Integer(schedule_id), Value::Integer(3)],
    )
    .await
    .unwrap();
}

pub async fn seed_image(db: &MaintenanceDb, seed: &OrderSeed, image_id: Uuid, archived: bool) {
    db.insert(
        ORDER_IMAGE_HIST,
        vec![
            Value::Integer(seed.order_id),
            Value::Timestamp(seed.hist_ts),
            Value::Uuid(image_id),
        ],
    )
    .await
    .unwrap();
    db.insert_unique(
        IMAGE,
        IMAGE_ID,
        vec![
            Value::Uuid(image_id),
            Value::Boolean(archived),
            Value::Text("/img".into()),
        ],
    )
    .await
    .unwrap();
}

pub async fn seed_legacy_image(
    db: &MaintenanceDb,
    seed: &OrderSeed,
    image_no: i64,
    archived: bool,
) {
    db.insert(
        ORDER_IMAGE_LEGACY,
        vec![
            Value::Integer(seed.order_id),
            Value::Timestamp(seed.hist_ts),
            Value::Integer(image_no),
        ],
    )
    .await
    .unwrap();
    db.insert_unique(
        IMAGE_LEGACY,
        IMAGE_NO,
        vec![
            Value::Integer(image_no),
            Value::Boolean(archived),
            Value::Text("/img-legacy".into()),
        ],
    )
    .await
    .unwrap();
}

pub async fn seed_paperwork(db: &MaintenanceDb, seed: &OrderSeed, paperwork_id: i64) {
    db.insert(
        ORDER_PAPERWORK_HIST,
        vec![
            Value::Integer(seed.order_id),
            Value::Timestamp(seed.hist_ts),
            Value::Integer(paperwork_id),
        ],
    )
    .await
    .unwrap();
    db.insert_unique(
        PAPERWORK_SET,
        PAPERWORK_ID,
        vec![Value::Integer(paperwork_id), Value::Text("monograph".into())],
    )
    .await
    .unwrap();
}

pub async fn seed_replen(db: &MaintenanceDb, seed: &OrderSeed, replen_id: i64) {
    db.insert(
        ORDER_REPLEN_HIST,
        vec![
            Value::Integer(seed.order_id),
            Value::Timestamp(seed.hist_ts),
            Value::Integer(replen_id),
        ],
    )
    .await
    .unwrap();
    db.insert_unique(
        REPLEN_HIST,
        REPLEN_ID,
        vec![Value::Integer(replen_id), Value::Text("canister-7".into())],
    )
    .await
    .unwrap();
    db.insert(
        REPLEN_LOT_HIST,
        vec![Value::Integer(replen_id), Value::Text("LOT-42".into())],
    )
    .await
    .unwrap();
}

/// Attaches an image to a replenishment record (not to any order directly).
pub async fn seed_replen_image(db: &MaintenanceDb, replen_id: i64, image_id: Uuid, archived: bool) {
    db.insert(
        REPLEN_IMAGE,
        vec![Value::Integer(replen_id), Value::Uuid(image_id)],
    )
    .await
    .unwrap();
    db.insert_unique(
        IMAGE,
        IMAGE_ID,
        vec![
            Value::Uuid(image_id),
            Value::Boolean(archived),
            Value::Text("/img".into()),
        ],
    )
    .await
    .unwrap();
}

pub struct ShipmentChain {
    pub shipment_id: Uuid,
    pub manifest_id: Uuid,
    pub pallet_id: Uuid,
    pub load_id: Uuid,
}

impl ShipmentChain {
    pub fn new() -> Self {
        Self {
            shipment_id: Uuid::new_v4(),
            manifest_id: Uuid::new_v4(),
            pallet_id: Uuid::new_v4(),
            load_id: Uuid::new_v4(),
        }
    }
}

/// Seeds the full four-level chain: load <- pallet <- manifest <- shipment,
/// plus the order association and a label detail row.
pub async fn seed_shipment_chain(db: &MaintenanceDb, seed: &OrderSeed, chain: &ShipmentChain) {
    db.insert(
        ORDER_SHIPMENT_HIST,
        vec![
            Value::Integer(seed.order_id),
            Value::Timestamp(seed.hist_ts),
            Value::Uuid(chain.shipment_id),
        ],
    )
    .await
    .unwrap();
    db.insert_unique(
        SHIPMENT,
        SHIPMENT_ID,
        vec![Value::Uuid(chain.shipment_id), Value::Uuid(chain.manifest_id)],
    )
    .await
    .unwrap();
    db.insert_unique(
        MANIFEST,
        MANIFEST_ID,
        vec![Value::Uuid(chain.manifest_id), Value::Uuid(chain.pallet_id)],
    )
    .await
    .unwrap();
    db.insert_unique(
        PALLET,
        PALLET_ID,
        vec![Value::Uuid(chain.pallet_id), Value::Uuid(chain.load_id)],
    )
    .await
    .unwrap();
    db.insert_unique(
        LOAD,
        LOAD_ID,
        vec![Value::Uuid(chain.load_id), Value::Text("carrier-1".into())],
    )
    .await
    .unwrap();
    db.insert(
        SHIPMENT_LABEL,
        vec![Value::Uuid(chain.shipment_id), Value::Text("label".into())],
    )
    .await
    .unwrap();
}

pub async fn seed_audit_reject(db: &MaintenanceDb, reject_id: i64, logged_at: DateTime<Utc>) {
    db.insert(
        AUDIT_REJECT,
        vec![
            Value::Integer(reject_id),
            Value::Timestamp(logged_at),
            Value::Text("rejected".into()),
        ],
    )
    .await
    .unwrap();
}

/// Runs the engine with the fixed test clock and the default sink.
pub async fn run(db: &MaintenanceDb, params: &rxpurge::PurgeParams) -> rxpurge::PurgeOutcome {
    db.run_at(
        params,
        now(),
        &rxpurge::TracingSink,
        rxpurge::CancelFlag::new(),
    )
    .await
    .unwrap()
}

/// Window covering everything seeded by these fixtures.
pub fn whole_history() -> rxpurge::Retention {
    rxpurge::Retention::Window {
        from: days_ago(3_000),
        to: now(),
    }
}

/// Sink that records pass activity for assertions.
#[derive(Default)]
pub struct RecordingSink {
    pub started: Mutex<Vec<String>>,
    pub completed: Mutex<Vec<PassReport>>,
    pub failures: Mutex<Vec<(String, String)>>,
}

impl EventSink for RecordingSink {
    fn pass_started(&self, _run_id: Uuid, note: &str) {
        self.started.lock().unwrap().push(note.to_string());
    }

    fn pass_completed(&self, _run_id: Uuid, report: &PassReport) {
        self.completed.lock().unwrap().push(*report);
    }

    fn run_failed(&self, _run_id: Uuid, code: &str, message: &str) {
        self.failures
            .lock()
            .unwrap()
            .push((code.to_string(), message.to_string()));
    }
}
